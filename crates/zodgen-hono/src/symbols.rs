use std::collections::{HashMap, HashSet};

use zodgen_core::config::Casing;
use zodgen_core::graph::DeclarationOrder;
use zodgen_core::ir::SchemaTable;
use zodgen_core::naming::{
    NameRegistry, identifier_for, input_type_identifier_for, type_identifier_for,
};

/// Identifiers assigned to the named schemas of one document.
#[derive(Debug, Default)]
pub struct Symbols {
    identifiers: HashMap<String, String>,
    lazy: HashSet<String>,
    /// Schemas whose parsed input type differs from their output type
    /// because a `default` is reachable from them.
    defaulted: HashSet<String>,
}

impl Symbols {
    /// Assign identifiers in document order so that collision suffixes do
    /// not depend on the declaration order.
    pub fn assign(
        schemas: &SchemaTable,
        order: &DeclarationOrder,
        casing: Casing,
        registry: &mut NameRegistry,
    ) -> Self {
        let mut identifiers = HashMap::with_capacity(schemas.len());
        for schema in schemas.iter() {
            let identifier = registry.register(&schema.name, &identifier_for(&schema.name, casing));
            identifiers.insert(schema.name.clone(), identifier);
        }
        let lazy = order
            .iter()
            .filter(|e| e.lazy)
            .map(|e| e.name.clone())
            .collect();
        Self {
            identifiers,
            lazy,
            defaulted: reaching_default(schemas),
        }
    }

    pub fn identifier(&self, raw: &str) -> Option<&str> {
        self.identifiers.get(raw).map(String::as_str)
    }

    /// Type alias name, only meaningful for lazily bound schemas.
    pub fn type_identifier(&self, raw: &str) -> Option<String> {
        self.identifier(raw).map(type_identifier_for)
    }

    /// Input type alias name, for lazily bound schemas whose input type
    /// differs from their output type.
    pub fn input_type_identifier(&self, raw: &str) -> Option<String> {
        self.identifier(raw)
            .filter(|_| self.is_lazy(raw) && self.has_default(raw))
            .map(input_type_identifier_for)
    }

    pub fn is_lazy(&self, raw: &str) -> bool {
        self.lazy.contains(raw)
    }

    /// Whether a `default` is reachable from the schema, through references.
    pub fn has_default(&self, raw: &str) -> bool {
        self.defaulted.contains(raw)
    }
}

fn reaching_default(schemas: &SchemaTable) -> HashSet<String> {
    let targets: Vec<Vec<&str>> = schemas
        .iter()
        .map(|schema| {
            let mut targets = Vec::new();
            schema.node.for_each_reference(&mut |r| {
                if let Some(target) = r.target.as_deref() {
                    targets.push(target);
                }
            });
            targets
        })
        .collect();

    let mut defaulted: HashSet<String> = schemas
        .iter()
        .filter(|schema| schema.node.has_default())
        .map(|schema| schema.name.clone())
        .collect();
    loop {
        let before = defaulted.len();
        for (schema, targets) in schemas.iter().zip(&targets) {
            if !defaulted.contains(&schema.name)
                && targets.iter().any(|t| defaulted.contains(*t))
            {
                defaulted.insert(schema.name.clone());
            }
        }
        if defaulted.len() == before {
            return defaulted;
        }
    }
}
