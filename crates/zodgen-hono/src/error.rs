use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error(transparent)]
    Assemble(#[from] AssembleError),
}

/// Failures of the output assembler. Declarations computed before the
/// failure are unaffected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssembleError {
    #[error("output conflict: more than one generated file would be written to '{path}'")]
    OutputConflict { path: String },
}
