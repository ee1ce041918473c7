use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};

/// A node of the schema tree. Exactly one [`NodeKind`] is active; the
/// remaining fields are annotations every kind may carry.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub kind: NodeKind,
    pub nullable: bool,
    pub default: Option<serde_json::Value>,
    pub description: Option<String>,
}

impl SchemaNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            nullable: false,
            default: None,
            description: None,
        }
    }

    /// The unconstrained node (`{}`).
    pub fn unknown() -> Self {
        Self::new(NodeKind::Primitive(PrimitiveSchema::new(PrimitiveKind::Unknown)))
    }

    /// An unresolved reference to a named component.
    pub fn reference(pointer: impl Into<String>) -> Self {
        Self::new(NodeKind::Reference(Reference {
            pointer: pointer.into(),
            target: None,
        }))
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Visit every reference in this tree, at any depth.
    pub fn for_each_reference<'a>(&'a self, f: &mut impl FnMut(&'a Reference)) {
        match &self.kind {
            NodeKind::Reference(r) => f(r),
            NodeKind::Object(obj) => {
                for prop in obj.properties.values() {
                    prop.for_each_reference(f);
                }
                if let AdditionalProperties::Schema(value) = &obj.additional_properties {
                    value.for_each_reference(f);
                }
            }
            NodeKind::Array(arr) => arr.items.for_each_reference(f),
            NodeKind::Composition(comp) => {
                for member in &comp.members {
                    member.for_each_reference(f);
                }
            }
            NodeKind::Negation(excluded) => excluded.for_each_reference(f),
            NodeKind::Primitive(_) | NodeKind::Literal(_) | NodeKind::Enum(_) => {}
        }
    }

    /// Whether a `default` appears in this tree, not following references.
    pub fn has_default(&self) -> bool {
        if self.default.is_some() {
            return true;
        }
        match &self.kind {
            NodeKind::Object(obj) => {
                obj.properties.values().any(SchemaNode::has_default)
                    || matches!(
                        &obj.additional_properties,
                        AdditionalProperties::Schema(value) if value.has_default()
                    )
            }
            NodeKind::Array(arr) => arr.items.has_default(),
            NodeKind::Composition(comp) => comp.members.iter().any(SchemaNode::has_default),
            NodeKind::Reference(_)
            | NodeKind::Negation(_)
            | NodeKind::Primitive(_)
            | NodeKind::Literal(_)
            | NodeKind::Enum(_) => false,
        }
    }

    /// Rebuild this tree, replacing each reference with the result of `f`.
    /// Short-circuits on the first error.
    pub fn try_map_references<E>(
        &self,
        f: &mut impl FnMut(&Reference) -> Result<Reference, E>,
    ) -> Result<SchemaNode, E> {
        let kind = match &self.kind {
            NodeKind::Reference(r) => NodeKind::Reference(f(r)?),
            NodeKind::Object(obj) => {
                let mut properties = IndexMap::with_capacity(obj.properties.len());
                for (name, prop) in &obj.properties {
                    properties.insert(name.clone(), prop.try_map_references(f)?);
                }
                let additional_properties = match &obj.additional_properties {
                    AdditionalProperties::Schema(value) => {
                        AdditionalProperties::Schema(Box::new(value.try_map_references(f)?))
                    }
                    other => other.clone(),
                };
                NodeKind::Object(ObjectSchema {
                    properties,
                    required: obj.required.clone(),
                    additional_properties,
                })
            }
            NodeKind::Array(arr) => NodeKind::Array(ArraySchema {
                items: Box::new(arr.items.try_map_references(f)?),
                ..arr.clone()
            }),
            NodeKind::Composition(comp) => NodeKind::Composition(CompositionSchema {
                kind: comp.kind,
                members: comp
                    .members
                    .iter()
                    .map(|m| m.try_map_references(f))
                    .collect::<Result<Vec<_>, _>>()?,
                discriminator: comp.discriminator.clone(),
            }),
            NodeKind::Negation(excluded) => {
                NodeKind::Negation(Box::new(excluded.try_map_references(f)?))
            }
            other => other.clone(),
        };
        Ok(SchemaNode {
            kind,
            nullable: self.nullable,
            default: self.default.clone(),
            description: self.description.clone(),
        })
    }
}

/// The discriminated variant of a [`SchemaNode`].
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Reference(Reference),
    Primitive(PrimitiveSchema),
    Object(ObjectSchema),
    Array(ArraySchema),
    Composition(CompositionSchema),
    Negation(Box<SchemaNode>),
    Literal(serde_json::Value),
    Enum(Vec<serde_json::Value>),
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Reference(_) => "reference",
            NodeKind::Primitive(_) => "primitive",
            NodeKind::Object(_) => "object",
            NodeKind::Array(_) => "array",
            NodeKind::Composition(_) => "composition",
            NodeKind::Negation(_) => "negation",
            NodeKind::Literal(_) => "literal",
            NodeKind::Enum(_) => "enum",
        }
    }
}

/// A `$ref` pointer. `target` is the component name once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub pointer: String,
    pub target: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    String,
    Number,
    Integer,
    Boolean,
    Null,
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveSchema {
    pub kind: PrimitiveKind,
    pub format: Option<String>,
    pub constraints: Constraints,
}

impl PrimitiveSchema {
    pub fn new(kind: PrimitiveKind) -> Self {
        Self {
            kind,
            format: None,
            constraints: Constraints::default(),
        }
    }
}

/// String and numeric constraints. Exclusive bounds are normalized to the
/// numeric (3.1) form during IR construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    pub pattern: Option<String>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
    pub multiple_of: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum AdditionalProperties {
    #[default]
    Unspecified,
    Allowed,
    Forbidden,
    Schema(Box<SchemaNode>),
}

/// Invariant: `required` is a subset of the keys of `properties`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    pub properties: IndexMap<String, SchemaNode>,
    pub required: IndexSet<String>,
    pub additional_properties: AdditionalProperties,
}

impl ObjectSchema {
    pub fn is_required(&self, property: &str) -> bool {
        self.required.contains(property)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArraySchema {
    pub items: Box<SchemaNode>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositionKind {
    AllOf,
    OneOf,
    AnyOf,
}

impl CompositionKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            CompositionKind::AllOf => "allOf",
            CompositionKind::OneOf => "oneOf",
            CompositionKind::AnyOf => "anyOf",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositionSchema {
    pub kind: CompositionKind,
    pub members: Vec<SchemaNode>,
    /// Declared `discriminator.propertyName`, if any.
    pub discriminator: Option<String>,
}

/// A schema registered under `components.schemas`.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedSchema {
    pub name: String,
    pub node: SchemaNode,
}

/// All named schemas of one document, in document order, indexed by name.
#[derive(Debug, Clone, Default)]
pub struct SchemaTable {
    schemas: Vec<NamedSchema>,
    index: HashMap<String, usize>,
}

impl SchemaTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a schema. Names are unique per document, so a repeated name
    /// replaces the earlier node in place.
    pub fn insert(&mut self, schema: NamedSchema) {
        match self.index.get(&schema.name) {
            Some(&i) => self.schemas[i] = schema,
            None => {
                self.index.insert(schema.name.clone(), self.schemas.len());
                self.schemas.push(schema);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&NamedSchema> {
        self.index.get(name).map(|&i| &self.schemas[i])
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn by_index(&self, index: usize) -> &NamedSchema {
        &self.schemas[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedSchema> {
        self.schemas.iter()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl FromIterator<NamedSchema> for SchemaTable {
    fn from_iter<I: IntoIterator<Item = NamedSchema>>(iter: I) -> Self {
        let mut table = SchemaTable::new();
        for schema in iter {
            table.insert(schema);
        }
        table
    }
}
