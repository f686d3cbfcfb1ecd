use anyapi_config::{FacadeConfig, ensure_default_dir};
use std::path::PathBuf;

/// Writes a starter definition, by default at `~/anyapi/definition.json`.
#[derive(Debug, Clone, Copy)]
pub struct InitStrategy;

impl super::CommandStrategy for InitStrategy {
    type Input = Option<PathBuf>;

    fn execute(&self, path: Self::Input) -> anyhow::Result<()> {
        let path = match path {
            Some(path) => path,
            None => ensure_default_dir()?.join("definition.json"),
        };
        FacadeConfig::create_template(&path)?;

        println!("✅ Created definition at: {}", path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Edit the settings of each part to name what you want extracted");
        println!(
            "   2. Run 'anyapi extract --definition {} --input <file>'",
            path.display()
        );
        println!();
        Ok(())
    }
}
