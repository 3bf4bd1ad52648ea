use lemmy_chart::LemmyProps;

fn main() -> anyhow::Result<()> {
    let schema = schemars::schema_for!(LemmyProps);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
