use std::collections::BTreeSet;

use zodgen_core::graph::DeclarationOrder;
use zodgen_core::ir::SchemaTable;
use zodgen_core::naming::quote;

use super::jsdoc_line;
use crate::expression::ExpressionGenerator;
use crate::symbols::Symbols;
use crate::ts_type::TypeMapper;

/// One generated schema declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Component name in the document.
    pub name: String,
    pub identifier: String,
    pub lazy: bool,
    /// Strongly connected component the schema belongs to.
    pub group: usize,
    /// Other schemas whose identifiers the declaration uses.
    pub depends_on: BTreeSet<String>,
    pub description: Option<String>,
    /// Type alias annotating a lazily bound schema.
    pub type_identifier: Option<String>,
    /// Alias of its input type, when defaults make it differ.
    pub input_type_identifier: Option<String>,
    /// `type XType = ...;` (and `type XInput = ...;`) for lazily bound
    /// schemas.
    pub type_sources: Vec<String>,
    /// `const XSchema = ...;`
    pub source: String,
}

impl Declaration {
    pub fn render(&self, export_schema: bool, export_type: bool) -> String {
        let mut out = String::new();
        for (i, type_source) in self.type_sources.iter().enumerate() {
            if export_type {
                out.push_str("export ");
            }
            out.push_str(type_source);
            out.push_str(if i + 1 == self.type_sources.len() { "\n\n" } else { "\n" });
        }
        if let Some(description) = &self.description {
            out.push_str(&format!("/** {} */\n", jsdoc_line(description)));
        }
        if export_schema {
            out.push_str("export ");
        }
        out.push_str(&self.source);
        out
    }
}

/// Emit one declaration per named schema, in declaration order.
pub fn emit_declarations(
    schemas: &SchemaTable,
    order: &DeclarationOrder,
    symbols: &Symbols,
    generator: &mut ExpressionGenerator<'_>,
) -> Vec<Declaration> {
    let types = TypeMapper::new(schemas, symbols);
    let input_types = TypeMapper::input(schemas, symbols);
    let mut declarations = Vec::with_capacity(order.len());

    for entry in order.iter() {
        let schema = schemas.by_index(entry.index);
        let Some(identifier) = symbols.identifier(&schema.name) else {
            continue;
        };

        let expr = generator.generate(&schema.node, &schema.name, 0);
        let body = format!("{expr}.openapi({})", quote(&schema.name));
        let mut depends_on = generator.take_references();
        depends_on.remove(&schema.name);

        let type_identifier = symbols
            .type_identifier(&schema.name)
            .filter(|_| entry.lazy);
        let input_type_identifier = symbols.input_type_identifier(&schema.name);
        let mut type_sources = Vec::new();
        let source = match &type_identifier {
            Some(type_identifier) => {
                type_sources.push(format!(
                    "type {type_identifier} = {};",
                    types.map(&schema.node)
                ));
                let annotation = match &input_type_identifier {
                    Some(input_identifier) => {
                        type_sources.push(format!(
                            "type {input_identifier} = {};",
                            input_types.map(&schema.node)
                        ));
                        format!("z.ZodType<{type_identifier}, z.ZodTypeDef, {input_identifier}>")
                    }
                    None => format!("z.ZodType<{type_identifier}>"),
                };
                format!("const {identifier}: {annotation} = z.lazy(() => {body});")
            }
            None => format!("const {identifier} = {body};"),
        };

        declarations.push(Declaration {
            name: schema.name.clone(),
            identifier: identifier.to_string(),
            lazy: entry.lazy,
            group: entry.group,
            depends_on,
            description: schema.node.description.clone(),
            type_identifier,
            input_type_identifier,
            type_sources,
            source,
        });
    }
    declarations
}

#[cfg(test)]
mod tests {
    use super::*;
    use zodgen_core::config::Casing;
    use zodgen_core::graph::{DependencyGraph, order_declarations};
    use zodgen_core::naming::NameRegistry;
    use zodgen_core::parse;
    use zodgen_core::transform;

    fn declarations(yaml: &str) -> Vec<Declaration> {
        let doc = transform::transform(&parse::from_yaml(yaml).unwrap()).unwrap();
        let order = order_declarations(&DependencyGraph::build(&doc.schemas));
        let symbols =
            Symbols::assign(&doc.schemas, &order, Casing::PascalCase, &mut NameRegistry::new());
        let mut generator = ExpressionGenerator::new(&doc.schemas, &symbols);
        emit_declarations(&doc.schemas, &order, &symbols, &mut generator)
    }

    #[test]
    fn test_dependency_declared_first() {
        let decls = declarations(
            r##"
openapi: "3.1.0"
info: { title: T, version: "1" }
components:
  schemas:
    A:
      type: object
      required: [a, b]
      properties:
        a: { type: string }
        b: { $ref: "#/components/schemas/B" }
    B:
      type: object
      required: [b]
      properties:
        b: { type: string }
"##,
        );
        let names: Vec<&str> = decls.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert!(decls[1].source.contains("BSchema"));
        assert_eq!(
            decls[1].depends_on.iter().collect::<Vec<_>>(),
            vec!["B"]
        );
        insta::assert_snapshot!(decls[0].render(true, true), @r"
        export const BSchema = z.object({
          b: z.string(),
        }).openapi('B');
        ");
    }

    #[test]
    fn test_self_reference_is_lazy() {
        let decls = declarations(
            r##"
openapi: "3.1.0"
info: { title: T, version: "1" }
components:
  schemas:
    Node:
      description: A tree node
      type: object
      required: [value]
      properties:
        value: { type: integer }
        children:
          type: array
          items: { $ref: "#/components/schemas/Node" }
"##,
        );
        assert_eq!(decls.len(), 1);
        let node = &decls[0];
        assert!(node.lazy);
        assert!(node.depends_on.is_empty());
        assert_eq!(node.type_identifier.as_deref(), Some("NodeType"));
        assert_eq!(node.input_type_identifier, None);
        insta::assert_snapshot!(node.render(true, false), @r"
        type NodeType = { value: number; children?: NodeType[] };

        /** A tree node */
        export const NodeSchema: z.ZodType<NodeType> = z.lazy(() => z.object({
          value: z.number().int(),
          children: z.array(NodeSchema).optional(),
        }).openapi('Node'));
        ");
    }

    #[test]
    fn test_defaults_get_an_input_alias() {
        let decls = declarations(
            r##"
openapi: "3.1.0"
info: { title: T, version: "1" }
components:
  schemas:
    Node:
      type: object
      required: [kind]
      properties:
        kind: { type: string, default: leaf }
        children:
          type: array
          items: { $ref: "#/components/schemas/Node" }
"##,
        );
        let node = &decls[0];
        assert_eq!(node.input_type_identifier.as_deref(), Some("NodeInput"));
        insta::assert_snapshot!(node.render(true, true), @r"
        export type NodeType = { kind: string; children?: NodeType[] };
        export type NodeInput = { kind?: string | undefined; children?: NodeInput[] };

        export const NodeSchema: z.ZodType<NodeType, z.ZodTypeDef, NodeInput> = z.lazy(() => z.object({
          kind: z.string().default('leaf'),
          children: z.array(NodeSchema).optional(),
        }).openapi('Node'));
        ");
    }
}
