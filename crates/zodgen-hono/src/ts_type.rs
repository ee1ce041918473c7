use serde_json::Value;
use zodgen_core::ir::{
    AdditionalProperties, CompositionKind, NodeKind, PrimitiveKind, SchemaNode, SchemaTable,
};
use zodgen_core::naming::property_key;

use crate::symbols::Symbols;

/// Maps schema nodes to TypeScript types for the aliases that annotate
/// lazily bound declarations (`z.ZodType<NodeType>`).
pub struct TypeMapper<'a> {
    schemas: &'a SchemaTable,
    symbols: &'a Symbols,
    /// Map the type accepted before defaults apply instead of the parsed one.
    input: bool,
}

impl<'a> TypeMapper<'a> {
    pub fn new(schemas: &'a SchemaTable, symbols: &'a Symbols) -> Self {
        Self {
            schemas,
            symbols,
            input: false,
        }
    }

    /// Mapper for input types: fields with a default are optional.
    pub fn input(schemas: &'a SchemaTable, symbols: &'a Symbols) -> Self {
        Self {
            input: true,
            ..Self::new(schemas, symbols)
        }
    }

    /// TypeScript type of the value `node` validates.
    pub fn map(&self, node: &SchemaNode) -> String {
        let mut ts = self.map_kind(node);
        if ts == "unknown" {
            return ts;
        }
        if (node.nullable || self.inherited_nullable(node))
            && ts != "null"
            && !ts.ends_with(" | null")
        {
            ts.push_str(" | null");
        }
        if self.input && node.default.is_some() {
            ts.push_str(" | undefined");
        }
        ts
    }

    fn map_kind(&self, node: &SchemaNode) -> String {
        match &node.kind {
            NodeKind::Reference(reference) => match reference.target.as_deref() {
                Some(target) if self.symbols.is_lazy(target) => self
                    .symbols
                    .input_type_identifier(target)
                    .filter(|_| self.input)
                    .or_else(|| self.symbols.type_identifier(target))
                    .unwrap_or_else(|| "unknown".to_string()),
                Some(target) => match self.symbols.identifier(target) {
                    Some(identifier) if self.input && self.symbols.has_default(target) => {
                        format!("z.input<typeof {identifier}>")
                    }
                    Some(identifier) => format!("z.infer<typeof {identifier}>"),
                    None => "unknown".to_string(),
                },
                None => "unknown".to_string(),
            },
            NodeKind::Primitive(p) => match p.kind {
                PrimitiveKind::String => "string".to_string(),
                PrimitiveKind::Number | PrimitiveKind::Integer => "number".to_string(),
                PrimitiveKind::Boolean => "boolean".to_string(),
                PrimitiveKind::Null => "null".to_string(),
                PrimitiveKind::Unknown => "unknown".to_string(),
            },
            NodeKind::Object(obj) => {
                let additional = match &obj.additional_properties {
                    AdditionalProperties::Schema(value) => {
                        Some(format!("Record<string, {}>", self.map(value)))
                    }
                    AdditionalProperties::Allowed => Some("Record<string, unknown>".to_string()),
                    AdditionalProperties::Forbidden | AdditionalProperties::Unspecified => None,
                };
                if obj.properties.is_empty() {
                    return additional.unwrap_or_else(|| "{}".to_string());
                }
                let fields: Vec<String> = obj
                    .properties
                    .iter()
                    .map(|(name, prop)| {
                        let ts = self.map(prop);
                        if obj.is_required(name) && !(self.input && prop.default.is_some()) {
                            format!("{}: {ts}", property_key(name))
                        } else {
                            format!("{}?: {ts}", property_key(name))
                        }
                    })
                    .collect();
                let fields = format!("{{ {} }}", fields.join("; "));
                match additional {
                    Some(record) => format!("{fields} & {record}"),
                    None => fields,
                }
            }
            NodeKind::Array(arr) => {
                let inner = self.map(&arr.items);
                if inner.contains('|') || inner.contains('&') {
                    format!("({inner})[]")
                } else {
                    format!("{inner}[]")
                }
            }
            NodeKind::Composition(comp) => {
                if comp.members.is_empty() {
                    return "unknown".to_string();
                }
                match comp.kind {
                    CompositionKind::AllOf => {
                        let parts: Vec<String> = comp
                            .members
                            .iter()
                            .map(|m| self.map_kind(m))
                            .map(|ts| if ts.contains('|') { format!("({ts})") } else { ts })
                            .collect();
                        parts.join(" & ")
                    }
                    CompositionKind::OneOf | CompositionKind::AnyOf => {
                        let parts: Vec<String> =
                            comp.members.iter().map(|m| self.map(m)).collect();
                        parts.join(" | ")
                    }
                }
            }
            NodeKind::Negation(_) => "unknown".to_string(),
            NodeKind::Literal(value) => literal_type(value),
            NodeKind::Enum(values) => {
                let parts: Vec<String> = values.iter().map(literal_type).collect();
                if parts.is_empty() {
                    "unknown".to_string()
                } else {
                    parts.join(" | ")
                }
            }
        }
    }

    /// Nullability an `allOf` takes from its branches, or a single-member
    /// union from its member.
    fn inherited_nullable(&self, node: &SchemaNode) -> bool {
        let NodeKind::Composition(comp) = &node.kind else {
            return false;
        };
        if comp.kind != CompositionKind::AllOf {
            return comp.members.len() == 1 && comp.members[0].nullable;
        }
        comp.members.iter().any(|m| {
            m.nullable
                || self.inherited_nullable(m)
                || matches!(&m.kind, NodeKind::Reference(r) if r
                    .target
                    .as_deref()
                    .and_then(|t| self.schemas.get(t))
                    .is_some_and(|named| named.node.nullable))
        })
    }
}

fn literal_type(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) | Value::Number(_) | Value::String(_) => value.to_string(),
        Value::Array(_) | Value::Object(_) => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zodgen_core::config::Casing;
    use zodgen_core::graph::{DependencyGraph, order_declarations};
    use zodgen_core::ir::NamedSchema;
    use zodgen_core::naming::NameRegistry;
    use zodgen_core::parse::schema::SchemaOrRef;
    use zodgen_core::transform::resolve_node;
    use zodgen_core::transform::schema_resolver::schema_or_ref_to_node;

    fn table(schemas: &[(&str, &str)]) -> SchemaTable {
        let raw: SchemaTable = schemas
            .iter()
            .map(|(name, yaml)| {
                let schema: SchemaOrRef = serde_yaml_ng::from_str(yaml).unwrap();
                NamedSchema {
                    name: name.to_string(),
                    node: schema_or_ref_to_node(&schema),
                }
            })
            .collect();
        raw.iter()
            .map(|s| NamedSchema {
                name: s.name.clone(),
                node: resolve_node(&s.node, &raw).unwrap(),
            })
            .collect()
    }

    fn map_all(schemas: &[(&str, &str)], name: &str) -> String {
        let table = table(schemas);
        let order = order_declarations(&DependencyGraph::build(&table));
        let symbols = Symbols::assign(&table, &order, Casing::PascalCase, &mut NameRegistry::new());
        TypeMapper::new(&table, &symbols).map(&table.get(name).unwrap().node)
    }

    #[test]
    fn test_primitives() {
        assert_eq!(map_all(&[("S", "type: string")], "S"), "string");
        assert_eq!(map_all(&[("I", "type: integer")], "I"), "number");
        assert_eq!(map_all(&[("B", "type: boolean")], "B"), "boolean");
        assert_eq!(map_all(&[("N", "type: [string, 'null']")], "N"), "string | null");
        assert_eq!(map_all(&[("U", "description: any")], "U"), "unknown");
    }

    #[test]
    fn test_self_reference_uses_type_alias() {
        let node = r#"
type: object
required: [value]
properties:
  value: { type: integer }
  children:
    type: array
    items: { $ref: '#/components/schemas/Node' }
"#;
        assert_eq!(
            map_all(&[("Node", node)], "Node"),
            "{ value: number; children?: NodeType[] }"
        );
    }

    #[test]
    fn test_non_lazy_reference_is_inferred() {
        let schemas = [
            ("Tag", "type: string"),
            (
                "Node",
                "type: object\nproperties:\n  tag: { $ref: '#/components/schemas/Tag' }\n  next: { $ref: '#/components/schemas/Node' }",
            ),
        ];
        assert_eq!(
            map_all(&schemas, "Node"),
            "{ tag?: z.infer<typeof TagSchema>; next?: NodeType }"
        );
    }

    #[test]
    fn test_input_type_makes_defaulted_fields_optional() {
        let schemas = [
            ("Tag", "type: object\nproperties:\n  color: { type: string, default: red }"),
            (
                "Node",
                r#"
type: object
required: [kind, tag]
properties:
  kind: { type: string, default: leaf }
  tag: { $ref: '#/components/schemas/Tag' }
  next: { $ref: '#/components/schemas/Node' }
"#,
            ),
        ];
        let table = table(&schemas);
        let order = order_declarations(&DependencyGraph::build(&table));
        let symbols = Symbols::assign(&table, &order, Casing::PascalCase, &mut NameRegistry::new());
        let node = &table.get("Node").unwrap().node;

        assert_eq!(
            TypeMapper::new(&table, &symbols).map(node),
            "{ kind: string; tag: z.infer<typeof TagSchema>; next?: NodeType }"
        );
        assert_eq!(
            TypeMapper::input(&table, &symbols).map(node),
            "{ kind?: string | undefined; tag: z.input<typeof TagSchema>; next?: NodeInput }"
        );
    }

    #[test]
    fn test_single_member_union_is_nullable_once() {
        assert_eq!(
            map_all(&[("A", "nullable: true\nanyOf: [{ type: string, nullable: true }]")], "A"),
            "string | null"
        );
    }

    #[test]
    fn test_unions_and_literals() {
        assert_eq!(
            map_all(&[("E", "enum: [a, 1, true]")], "E"),
            "\"a\" | 1 | true"
        );
        assert_eq!(
            map_all(&[("A", "type: array\nitems: { oneOf: [{ type: string }, { type: number }] }")], "A"),
            "(string | number)[]"
        );
        assert_eq!(
            map_all(&[("R", "additionalProperties: { type: number }")], "R"),
            "Record<string, number>"
        );
    }
}
