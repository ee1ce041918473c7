use std::fmt;

/// A recoverable finding produced while generating code. Diagnostics never
/// stop generation; they are returned next to the output and logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A composition keyword with no usable members was replaced by the
    /// permissive fallback.
    MalformedComposition { location: String, keyword: String },
    /// `not` cannot be expressed by the validator library; the permissive
    /// fallback was emitted instead, which accepts values `not` would reject.
    NegationFallback { location: String },
    /// A `const`/`enum` value that is not a scalar has no literal validator;
    /// the permissive fallback was emitted instead.
    UnsupportedLiteral { location: String },
    /// Two raw names mapped to the same identifier; the later one was renamed.
    NamingCollisionResolved { raw: String, identifier: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::MalformedComposition { .. }
            | Diagnostic::NegationFallback { .. }
            | Diagnostic::UnsupportedLiteral { .. } => Severity::Warning,
            Diagnostic::NamingCollisionResolved { .. } => Severity::Info,
        }
    }

    /// Emit this diagnostic through the `log` facade.
    pub fn log(&self) {
        match self.severity() {
            Severity::Warning => log::warn!("{self}"),
            Severity::Info => log::info!("{self}"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MalformedComposition { location, keyword } => write!(
                f,
                "{location}: `{keyword}` has no usable members; emitted a permissive schema"
            ),
            Diagnostic::NegationFallback { location } => write!(
                f,
                "{location}: `not` is not supported by the validator; emitted a permissive schema (the exclusion is not enforced)"
            ),
            Diagnostic::UnsupportedLiteral { location } => write!(
                f,
                "{location}: non-scalar literal cannot be validated exactly; emitted a permissive schema"
            ),
            Diagnostic::NamingCollisionResolved { raw, identifier } => {
                write!(f, "'{raw}' collides with an earlier name; renamed to {identifier}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity() {
        let negation = Diagnostic::NegationFallback {
            location: "Pet.tag".to_string(),
        };
        assert_eq!(negation.severity(), Severity::Warning);
        assert!(negation.to_string().starts_with("Pet.tag: `not`"));

        let renamed = Diagnostic::NamingCollisionResolved {
            raw: "pet".to_string(),
            identifier: "PetSchema2".to_string(),
        };
        assert_eq!(renamed.severity(), Severity::Info);
    }
}
