use anyapi_core::{
    AjaxExtractor, Build, CombinedFacadeFactory, CsvDialect, CsvExtractor, Extractor,
    FacadeFactory, FactoryBuilder, HtmlExtractor, IndexOfExtractor, JsonExtractor,
    ObjectifyExtractor, Query, QuerySpec, RegexExtractor, RegexFlags, XmlExtractor, YamlExtractor,
};
use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Fields every single-format definition accepts.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Common {
    /// Ancestor layers, most-base first, merged before `settings`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extends: Vec<QuerySpec>,
    #[serde(default)]
    pub settings: QuerySpec,
    #[serde(default)]
    pub strip: bool,
}

impl Common {
    /// The effective spec after folding `extends` and `settings`.
    #[must_use]
    pub fn spec(&self) -> QuerySpec {
        QuerySpec::layered(
            self.extends
                .iter()
                .cloned()
                .chain(std::iter::once(self.settings.clone())),
        )
    }

    fn build<E: Extractor>(&self, builder: FactoryBuilder<E>) -> anyhow::Result<Arc<dyn Build>> {
        let factory = builder
            .settings(self.spec())
            .strip(self.strip)
            .build()?;
        debug!(attributes = ?factory.attributes(), "built factory from definition");
        Ok(Arc::new(factory))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NestedFormat {
    #[default]
    Html,
    Xml,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RegexFlag {
    IgnoreCase,
    Multiline,
    Dotall,
    Verbose,
}

impl From<RegexFlag> for RegexFlags {
    fn from(flag: RegexFlag) -> Self {
        match flag {
            RegexFlag::IgnoreCase => Self::IGNORE_CASE,
            RegexFlag::Multiline => Self::MULTILINE,
            RegexFlag::Dotall => Self::DOTALL,
            RegexFlag::Verbose => Self::VERBOSE,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DialectConfig {
    pub delimiter: char,
    pub quote: char,
    pub double_quote: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escape: Option<char>,
    pub trim: bool,
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote: '"',
            double_quote: true,
            escape: None,
            trim: false,
        }
    }
}

fn ascii_byte(field: &str, c: char) -> anyhow::Result<u8> {
    if !c.is_ascii() {
        bail!("CSV {field} must be a single ASCII character, got {c:?}");
    }
    Ok(u8::try_from(c)?)
}

impl TryFrom<&DialectConfig> for CsvDialect {
    type Error = anyhow::Error;

    fn try_from(config: &DialectConfig) -> anyhow::Result<Self> {
        Ok(Self {
            delimiter: ascii_byte("delimiter", config.delimiter)?,
            quote: ascii_byte("quote", config.quote)?,
            double_quote: config.double_quote,
            escape: config
                .escape
                .map(|c| ascii_byte("escape", c))
                .transpose()?,
            trim: config.trim,
        })
    }
}

/// A facade definition as written in a JSON or YAML file.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum FacadeConfig {
    Html(Common),
    Xml(Common),
    Objectify(Common),
    Json(Common),
    Yaml(Common),
    Ajax {
        #[serde(flatten)]
        common: Common,
        #[serde(default)]
        nested: NestedFormat,
    },
    Regex {
        #[serde(flatten)]
        common: Common,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        flags: Vec<RegexFlag>,
    },
    Csv {
        #[serde(flatten)]
        common: Common,
        #[serde(default)]
        dialect: DialectConfig,
    },
    IndexOf(Common),
    /// Earlier parts take precedence.
    Combined { parts: Vec<FacadeConfig> },
}

/// Serialization used for a definition file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionFormat {
    Json,
    Yaml,
}

impl DefinitionFormat {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            _ => bail!(
                "Unsupported definition file: {}. Use a .json, .yaml or .yml extension.",
                path.display()
            ),
        }
    }
}

/// `~/anyapi`, where definitions are looked up when not found as given.
pub fn default_dir() -> anyhow::Result<PathBuf> {
    Ok(dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
        .join("anyapi"))
}

pub fn ensure_default_dir() -> anyhow::Result<PathBuf> {
    let dir = default_dir()?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

impl FacadeConfig {
    /// Resolve a definition path: as given if it exists, otherwise relative
    /// to [`default_dir`].
    pub fn locate(path: &Path) -> anyhow::Result<PathBuf> {
        if path.exists() || path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        let fallback = default_dir()?.join(path);
        if fallback.exists() {
            Ok(fallback)
        } else {
            Ok(path.to_path_buf())
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let path = Self::locate(path)?;
        if !path.exists() {
            bail!(
                "Definition file not found at: {}. Please run 'anyapi init' to create one.",
                path.display()
            );
        }

        let format = DefinitionFormat::from_path(&path)?;
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read definition: {}", path.display()))?;
        let config = Self::from_str_with(format, &content)
            .with_context(|| format!("Invalid definition: {}", path.display()))?;

        info!("Loaded definition from: {}", path.display());
        Ok(config)
    }

    pub fn from_str_with(format: DefinitionFormat, text: &str) -> anyhow::Result<Self> {
        let config = match format {
            DefinitionFormat::Json => serde_json::from_str(text)?,
            DefinitionFormat::Yaml => serde_yaml::from_str(text)?,
        };
        Ok(config)
    }

    pub fn to_string_with(&self, format: DefinitionFormat) -> anyhow::Result<String> {
        let text = match format {
            DefinitionFormat::Json => serde_json::to_string_pretty(self)?,
            DefinitionFormat::Yaml => serde_yaml::to_string(self)?,
        };
        Ok(text)
    }

    /// Short name of the definition's format.
    #[must_use]
    pub const fn format(&self) -> &'static str {
        match self {
            Self::Html(_) => "html",
            Self::Xml(_) => "xml",
            Self::Objectify(_) => "objectify",
            Self::Json(_) => "json",
            Self::Yaml(_) => "yaml",
            Self::Ajax { .. } => "ajax",
            Self::Regex { .. } => "regex",
            Self::Csv { .. } => "csv",
            Self::IndexOf(_) => "index_of",
            Self::Combined { .. } => "combined",
        }
    }

    /// Compile the definition into a factory. Invalid queries are reported
    /// here, before any content is read.
    pub fn build(&self) -> anyhow::Result<Arc<dyn Build>> {
        let factory = match self {
            Self::Html(common) => common.build(FacadeFactory::builder(HtmlExtractor)),
            Self::Xml(common) => common.build(FacadeFactory::builder(XmlExtractor)),
            Self::Objectify(common) => common.build(FacadeFactory::builder(ObjectifyExtractor)),
            Self::Json(common) => common.build(FacadeFactory::builder(JsonExtractor)),
            Self::Yaml(common) => common.build(FacadeFactory::builder(YamlExtractor)),
            Self::Ajax { common, nested } => match nested {
                NestedFormat::Html => common.build(FacadeFactory::builder(
                    AjaxExtractor::with_nested(HtmlExtractor),
                )),
                NestedFormat::Xml => common.build(FacadeFactory::builder(
                    AjaxExtractor::with_nested(XmlExtractor),
                )),
            },
            Self::Regex { common, flags } => {
                let flags = flags
                    .iter()
                    .fold(RegexFlags::NONE, |all, flag| all | RegexFlags::from(*flag));
                common.build(FacadeFactory::builder(RegexExtractor::new(flags)))
            }
            Self::Csv { common, dialect } => {
                let dialect = CsvDialect::try_from(dialect)?;
                common.build(FacadeFactory::builder(CsvExtractor::new(dialect)))
            }
            Self::IndexOf(common) => common.build(FacadeFactory::builder(IndexOfExtractor)),
            Self::Combined { parts } => {
                if parts.is_empty() {
                    bail!("A combined definition needs at least one part");
                }
                let parts = parts
                    .iter()
                    .map(Self::build)
                    .collect::<anyhow::Result<Vec<_>>>()?;
                Ok(Arc::new(CombinedFacadeFactory::from_parts(parts)) as Arc<dyn Build>)
            }
        };
        factory.with_context(|| format!("Failed to build {} definition", self.format()))
    }

    /// A starter definition: JSON answers first, HTML as fallback.
    #[must_use]
    pub fn template() -> Self {
        let json = Common {
            settings: [("title", "title"), ("first_tag", "tags > 0")]
                .into_iter()
                .collect(),
            ..Common::default()
        };
        let html = Common {
            settings: [
                ("title", Query::from("string(//title)")),
                ("links", Query::structured("//a", Some("@href"))),
            ]
            .into_iter()
            .collect(),
            strip: true,
            ..Common::default()
        };
        Self::Combined {
            parts: vec![Self::Json(json), Self::Html(html)],
        }
    }

    /// Write [`Self::template`] to `path`, serialized by its extension.
    pub fn create_template(path: &Path) -> anyhow::Result<()> {
        if path.exists() {
            bail!(
                "Definition file already exists at: {}. Please edit it directly.",
                path.display()
            );
        }
        let format = DefinitionFormat::from_path(path)?;
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, Self::template().to_string_with(format)?)?;
        info!("Created definition at: {}", path.display());
        Ok(())
    }
}
