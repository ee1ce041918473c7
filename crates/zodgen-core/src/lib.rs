pub mod config;
pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod ir;
pub mod naming;
pub mod parse;
pub mod transform;

use diagnostics::Diagnostic;

/// A generated file with path and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
}

/// Everything one generation run produces.
#[derive(Debug, Clone, Default)]
pub struct GenerationOutput {
    pub files: Vec<GeneratedFile>,
    pub diagnostics: Vec<Diagnostic>,
}

impl GenerationOutput {
    pub fn file(&self, path: &str) -> Option<&GeneratedFile> {
        self.files.iter().find(|f| f.path == path)
    }
}

/// Trait for code generators that produce files from a resolved document.
pub trait CodeGenerator {
    type Options;
    type Error: std::error::Error;
    fn generate(
        &self,
        doc: &ir::Document,
        options: &Self::Options,
    ) -> Result<GenerationOutput, Self::Error>;
}
