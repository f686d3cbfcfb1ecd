//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy type with its own input, dispatched
//! statically from `main`.

use anyapi_config::FacadeConfig;
use anyapi_core::Build;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

mod attributes;
mod extract;
mod init;
mod version;

pub use attributes::AttributesStrategy;
pub use extract::{ExtractInput, ExtractStrategy};
pub use init::InitStrategy;
pub use version::VersionStrategy;

/// Load a definition file and compile it into a factory.
fn load_factory(definition: &Path) -> anyhow::Result<Arc<dyn Build>> {
    let config = FacadeConfig::load(definition)?;
    info!("Building {} factory", config.format());
    config.build()
}

/// Contract shared by all command strategies.
///
/// Each strategy defines its own input type, so parameters are passed
/// without runtime casting or boxing.
pub trait CommandStrategy: Send + Sync + 'static {
    type Input;

    /// # Errors
    /// Returns an error if command execution fails.
    fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}
