use std::path::PathBuf;

/// Lists the attribute names a definition exposes, one per line.
#[derive(Debug, Clone, Copy)]
pub struct AttributesStrategy;

impl super::CommandStrategy for AttributesStrategy {
    type Input = PathBuf;

    fn execute(&self, definition: Self::Input) -> anyhow::Result<()> {
        let factory = super::load_factory(&definition)?;
        for name in factory.attributes() {
            println!("{name}");
        }
        Ok(())
    }
}
