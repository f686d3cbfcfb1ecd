use anyapi_core::Lookup;
use anyhow::Context;
use serde_json::{Map, Value};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Input for [`ExtractStrategy`].
#[derive(Debug, Clone)]
pub struct ExtractInput {
    pub definition: PathBuf,
    /// Content file; stdin when absent.
    pub input: Option<PathBuf>,
    pub attributes: Vec<String>,
    pub queries: Vec<String>,
    pub pretty: bool,
}

/// Runs a definition over content and prints the results as a JSON object.
///
/// With no attributes or queries requested, every declared result is
/// materialized.
#[derive(Debug, Clone, Copy)]
pub struct ExtractStrategy;

fn read_content(input: Option<&Path>) -> anyhow::Result<String> {
    if let Some(path) = input {
        info!("Reading content from: {}", path.display());
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        return Ok(String::from_utf8_lossy(&bytes).into_owned());
    }

    let mut bytes = Vec::new();
    std::io::stdin()
        .read_to_end(&mut bytes)
        .context("Failed to read stdin")?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn collect(facade: &dyn Lookup, input: &ExtractInput) -> anyhow::Result<Map<String, Value>> {
    if input.attributes.is_empty() && input.queries.is_empty() {
        return Ok(facade.parse_all()?);
    }

    let mut result = Map::new();
    for name in &input.attributes {
        let value = facade
            .get(name)
            .with_context(|| format!("Failed to extract {name}"))?;
        result.insert(name.clone(), value);
    }
    for query in &input.queries {
        let value = facade
            .evaluate(query)
            .with_context(|| format!("Failed to evaluate {query}"))?;
        result.insert(query.clone(), value);
    }
    Ok(result)
}

impl super::CommandStrategy for ExtractStrategy {
    type Input = ExtractInput;

    fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let factory = super::load_factory(&input.definition)?;
        let content = read_content(input.input.as_deref())?;
        debug!(bytes = content.len(), "content loaded");

        let facade = factory.build(&content);
        let result = Value::Object(collect(facade.as_ref(), &input)?);

        let output = if input.pretty {
            serde_json::to_string_pretty(&result)?
        } else {
            serde_json::to_string(&result)?
        };
        println!("{output}");
        Ok(())
    }
}
