use indexmap::IndexMap;

use super::operation::Operation;
use super::schema::SchemaTable;

/// A parsed interface document, lowered to the schema IR.
#[derive(Debug, Clone)]
pub struct Document {
    pub info: Info,
    pub servers: Vec<Server>,
    pub schemas: SchemaTable,
    pub operations: Vec<Operation>,
    pub security_schemes: IndexMap<String, SecuritySchemeInfo>,
    pub security: Vec<IndexMap<String, Vec<String>>>,
}

/// API metadata.
#[derive(Debug, Clone)]
pub struct Info {
    pub title: String,
    pub description: Option<String>,
    pub version: String,
}

#[derive(Debug, Clone)]
pub struct Server {
    pub url: String,
    pub description: Option<String>,
}

/// What the reference docs show about a security scheme.
#[derive(Debug, Clone)]
pub struct SecuritySchemeInfo {
    pub scheme_type: String,
    pub description: Option<String>,
    pub detail: Option<String>,
}
