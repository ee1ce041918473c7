use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Top-level project configuration loaded from `zodgen.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ZodgenConfig {
    pub input: String,
    pub output: String,
    #[serde(flatten)]
    pub generate: GenerateOptions,
}

impl Default for ZodgenConfig {
    fn default() -> Self {
        Self {
            input: "openapi.yaml".to_string(),
            output: "src/generated".to_string(),
            generate: GenerateOptions::default(),
        }
    }
}

/// Options consumed by the generator. Passed in as a plain value; the
/// generator never reads configuration from anywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    /// Casing of schema identifiers.
    pub schema_casing: Casing,
    /// Put `export` on every schema declaration.
    pub export_schemas: bool,
    /// Put `export` on the type aliases of lazily bound schemas.
    pub export_types: bool,
    /// Prefix prepended to every route path, e.g. `/api/v1`.
    pub base_path: Option<String>,
    pub layout: OutputLayout,
    /// Also render a Markdown API reference.
    pub docs: bool,
    /// Also render vitest stubs, one per operation.
    pub tests: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            schema_casing: Casing::PascalCase,
            export_schemas: true,
            export_types: true,
            base_path: None,
            layout: OutputLayout::Single,
            docs: false,
            tests: false,
        }
    }
}

/// Identifier casing policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Casing {
    #[default]
    PascalCase,
    CamelCase,
}

/// How generated files are laid out on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputLayout {
    /// Everything in one `index.ts`.
    #[default]
    Single,
    /// One file per dependency cluster under `schemas/`, routes under `routes/`.
    Split,
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = "zodgen.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<ZodgenConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let config: ZodgenConfig =
        serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# zodgen configuration
input: openapi.yaml   # OpenAPI 3.x (.yaml/.json) or TypeSpec (.tsp)
output: src/generated

schema_casing: pascal_case   # pascal_case | camel_case
export_schemas: true
export_types: true
# base_path: /api/v1

layout: single        # single | split (one file per schema cluster)
docs: false           # also write docs.md
tests: false          # also write routes.test.ts (vitest)
"#
}
