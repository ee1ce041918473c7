use std::collections::HashMap;

use heck::{ToLowerCamelCase, ToPascalCase};

use crate::config::Casing;
use crate::diagnostics::Diagnostic;

/// Suffix appended to every schema identifier.
pub const SCHEMA_SUFFIX: &str = "Schema";

/// Replace every character that may not appear in a JavaScript identifier
/// with `_`, and prefix `_` when the result would start with a digit.
pub fn sanitize_identifier(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len() + 1);
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' || ch == '$' {
            result.push(ch);
        } else {
            result.push('_');
        }
    }
    if result.starts_with(|c: char| c.is_ascii_digit()) {
        result.insert(0, '_');
    }
    if result.is_empty() {
        result.push('_');
    }
    result
}

/// Apply a casing policy to a raw component name.
pub fn apply_casing(raw: &str, casing: Casing) -> String {
    let sanitized = sanitize_identifier(raw);
    let cased = match casing {
        Casing::PascalCase => sanitized.to_pascal_case(),
        Casing::CamelCase => sanitized.to_lower_camel_case(),
    };
    // heck drops the guard underscore in front of a leading digit.
    if cased.is_empty() {
        "unnamed".to_string()
    } else if cased.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{cased}")
    } else {
        cased
    }
}

/// Base declaration identifier for a schema component, before collision
/// handling: `pet-store` → `PetStoreSchema` / `petStoreSchema`.
pub fn identifier_for(raw: &str, casing: Casing) -> String {
    format!("{}{SCHEMA_SUFFIX}", apply_casing(raw, casing))
}

/// Name of the TypeScript type alias emitted next to a lazily bound schema.
/// Types are always PascalCase, whatever the schema casing.
pub fn type_identifier_for(schema_identifier: &str) -> String {
    alias_for(schema_identifier, "Type")
}

/// Name of the alias for the input type of a lazily bound schema, when
/// defaults make it differ from the output type.
pub fn input_type_identifier_for(schema_identifier: &str) -> String {
    alias_for(schema_identifier, "Input")
}

fn alias_for(schema_identifier: &str, suffix: &str) -> String {
    let base = schema_identifier
        .strip_suffix(SCHEMA_SUFFIX)
        .unwrap_or(schema_identifier);
    let mut chars = base.chars();
    match chars.next() {
        Some(first) => format!("{}{}{suffix}", first.to_ascii_uppercase(), chars.as_str()),
        None => format!("Unnamed{suffix}"),
    }
}

/// Whether `name` can be used bare as an identifier or object key.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}

/// Object key for a property: bare when it is a valid identifier, otherwise
/// a quoted string. The original property name is never mangled.
pub fn property_key(name: &str) -> String {
    if is_valid_identifier(name) {
        name.to_string()
    } else {
        quote(name)
    }
}

/// Single-quoted JavaScript string literal.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Derive a camelCase operation name from HTTP method + path.
///
/// Examples:
/// - `GET /users` → `getUsers`
/// - `GET /users/{userId}` → `getUsersUserId`
/// - `POST /users/{userId}/messages` → `postUsersUserIdMessages`
pub fn route_to_name(method: &str, path: &str) -> String {
    let mut name = method.to_lowercase();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        let word = segment.trim_start_matches('{').trim_end_matches('}');
        name.push_str(&sanitize_identifier(word).to_pascal_case());
    }
    if name.is_empty() {
        "route".to_string()
    } else {
        name
    }
}

/// Collision-free identifier assignment for one document.
///
/// Passed explicitly through a generation run, so independent documents never
/// share naming state. The first claimant of an identifier keeps it; later
/// claimants get `2`, `3`, ... appended in the order they register.
#[derive(Debug, Default)]
pub struct NameRegistry {
    taken: HashMap<String, String>,
    diagnostics: Vec<Diagnostic>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve an identifier that must not be handed out (e.g. imports).
    pub fn reserve(&mut self, identifier: &str) {
        self.taken
            .entry(identifier.to_string())
            .or_insert_with(String::new);
    }

    /// Claim `candidate` for `raw`, disambiguating on collision.
    pub fn register(&mut self, raw: &str, candidate: &str) -> String {
        if !self.taken.contains_key(candidate) {
            self.taken.insert(candidate.to_string(), raw.to_string());
            return candidate.to_string();
        }

        let mut n = 2;
        let identifier = loop {
            let attempt = format!("{candidate}{n}");
            if !self.taken.contains_key(&attempt) {
                break attempt;
            }
            n += 1;
        };
        self.taken.insert(identifier.clone(), raw.to_string());
        self.diagnostics.push(Diagnostic::NamingCollisionResolved {
            raw: raw.to_string(),
            identifier: identifier.clone(),
        });
        identifier
    }

    pub fn is_taken(&self, identifier: &str) -> bool {
        self.taken.contains_key(identifier)
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}
