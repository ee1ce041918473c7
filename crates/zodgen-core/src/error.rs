use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported OpenAPI version: {0}")]
    UnsupportedVersion(String),
}

/// Fatal reference failures. Any of these aborts generation of the whole
/// document, since declaration ordering is meaningless with dangling edges.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("unresolved reference: {pointer} (no component named '{name}')")]
    UnresolvedReference { pointer: String, name: String },

    #[error("invalid reference format: {0}")]
    InvalidRefFormat(String),

    #[error("circular component reference: {0}")]
    CircularComponentRef(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml_ng::Error,
    },
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),
}
