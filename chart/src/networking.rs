//! TLS certificate and Ingress exposing the internal nginx.
use std::collections::BTreeMap;

use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, IngressTLS, ServiceBackendPort,
};

use crate::{
    crds::{Certificate, CertificateSpec},
    nginx::{NGINX_PORT, NGINX_SERVICE_NAME},
    spec::IssuerRef,
    utils::Context,
};

pub const TLS_SECRET_NAME: &str = "lemmy-https-cert";
pub const INGRESS_NAME: &str = "lemmy";

const CONFIGURATION_SNIPPET_ANNOTATION: &str = "nginx.ingress.kubernetes.io/configuration-snippet";

// HTTP2 and websockets are enabled by default in ingress-nginx.
// Adapted from https://github.com/LemmyNet/lemmy-ansible/blob/main/templates/nginx.conf
const CONFIGURATION_SNIPPET: &str = r#"
ssl_protocols TLSv1.2 TLSv1.3;
ssl_prefer_server_ciphers on;
ssl_ciphers 'ECDHE-ECDSA-AES256-GCM-SHA384:ECDHE-RSA-AES256-GCM-SHA384:ECDHE-ECDSA-CHACHA20-POLY1305:ECDHE-RSA-CHACHA20-POLY1305:ECDHE-ECDSA-AES128-GCM-SHA256:ECDHE-RSA-AES128-GCM-SHA256:ECDHE-ECDSA-AES256-SHA384:ECDHE-RSA-AES256-SHA384:ECDHE-ECDSA-AES128-SHA256:ECDHE-RSA-AES128-SHA256';
ssl_session_timeout  10m;
ssl_session_cache shared:SSL:10m;
ssl_session_tickets on;
ssl_stapling on;
ssl_stapling_verify on;
server_tokens off;
gzip on;
gzip_types text/css application/javascript image/svg+xml;
gzip_vary on;
add_header Referrer-Policy "same-origin";
add_header X-Content-Type-Options "nosniff";
add_header X-Frame-Options "DENY";
add_header X-XSS-Protection "1; mode=block";
proxy_set_header X-Real-IP $remote_addr;
proxy_set_header Host $host;
proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
"#;

pub struct NetworkingConfig {
    pub hostname: String,
    pub issuer: IssuerRef,
    pub ingress_class_name: Option<String>,
}

impl NetworkingConfig {
    pub fn certificate(&self, cx: &Context) -> Certificate {
        Certificate {
            metadata: cx.meta(TLS_SECRET_NAME),
            spec: CertificateSpec {
                secret_name: TLS_SECRET_NAME.to_owned(),
                issuer_ref: self.issuer.clone(),
                dns_names: vec![self.hostname.clone()],
            },
        }
    }

    pub fn ingress(&self, cx: &Context) -> Ingress {
        let mut metadata = cx.meta(INGRESS_NAME);
        metadata.annotations = Some(BTreeMap::from_iter([(
            CONFIGURATION_SNIPPET_ANNOTATION.to_owned(),
            CONFIGURATION_SNIPPET.to_owned(),
        )]));
        Ingress {
            metadata,
            spec: Some(IngressSpec {
                ingress_class_name: self.ingress_class_name.clone(),
                rules: Some(vec![IngressRule {
                    host: Some(self.hostname.clone()),
                    http: Some(HTTPIngressRuleValue {
                        paths: vec![HTTPIngressPath {
                            path: Some("/".to_owned()),
                            path_type: "Prefix".to_owned(),
                            backend: IngressBackend {
                                service: Some(IngressServiceBackend {
                                    name: NGINX_SERVICE_NAME.to_owned(),
                                    port: Some(ServiceBackendPort {
                                        number: Some(NGINX_PORT),
                                        ..Default::default()
                                    }),
                                }),
                                ..Default::default()
                            },
                        }],
                    }),
                }]),
                tls: Some(vec![IngressTLS {
                    hosts: Some(vec![self.hostname.clone()]),
                    secret_name: Some(TLS_SECRET_NAME.to_owned()),
                }]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}
