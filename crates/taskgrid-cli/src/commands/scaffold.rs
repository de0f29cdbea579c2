use crate::scenario::Scenario;

pub fn scaffold() -> anyhow::Result<()> {
    print!("{}", Scenario::scaffold().to_toml_string()?);
    Ok(())
}
