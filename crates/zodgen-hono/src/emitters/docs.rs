use minijinja::{Environment, Value, context};
use zodgen_core::GeneratedFile;
use zodgen_core::ir::{CompositionKind, Document, NodeKind, PrimitiveKind, SchemaNode};

use super::declarations::Declaration;
use super::routes::RouteDeclaration;

/// Emit `docs.md`, a Markdown reference of schemas and operations.
pub fn emit_docs(
    env: &Environment<'_>,
    doc: &Document,
    declarations: &[Declaration],
    routes: &[RouteDeclaration],
) -> Result<GeneratedFile, minijinja::Error> {
    let tmpl = env.get_template("docs.md.j2")?;

    let servers: Vec<Value> = doc
        .servers
        .iter()
        .map(|s| context! { url => &s.url, description => &s.description })
        .collect();
    let security_schemes: Vec<Value> = doc
        .security_schemes
        .iter()
        .map(|(name, scheme)| {
            context! {
                name => name,
                scheme_type => &scheme.scheme_type,
                detail => cell(scheme.detail.as_deref().unwrap_or("")),
            }
        })
        .collect();
    let schemas: Vec<Value> = declarations
        .iter()
        .map(|d| context! { name => &d.name, identifier => &d.identifier, lazy => d.lazy })
        .collect();

    let operations: Vec<Value> = doc
        .operations
        .iter()
        .zip(routes)
        .map(|(op, route)| {
            let parameters: Vec<Value> = op
                .parameters
                .iter()
                .map(|p| {
                    context! {
                        name => &p.name,
                        location => p.location.as_str(),
                        kind => cell(&describe_node(&p.schema)),
                        required => p.required,
                        description => cell(p.description.as_deref().unwrap_or("")),
                    }
                })
                .collect();
            let body: Vec<Value> = op
                .request_body
                .iter()
                .flat_map(|b| b.content.iter())
                .map(|(content_type, schema)| {
                    context! { content_type => content_type, kind => describe_node(schema) }
                })
                .collect();
            let responses: Vec<Value> = op
                .responses
                .iter()
                .map(|(status, response)| {
                    let content: Vec<String> = response
                        .content
                        .iter()
                        .map(|(ct, schema)| format!("`{ct}`: {}", describe_node(schema)))
                        .collect();
                    context! {
                        status => status,
                        description => cell(&response.description),
                        content => cell(&content.join(", ")),
                    }
                })
                .collect();
            context! {
                method => op.method.as_str().to_uppercase(),
                path => &route.path,
                identifier => &route.identifier,
                deprecated => op.deprecated,
                summary => &op.summary,
                description => &op.description,
                parameters => parameters,
                body => body,
                body_required => op.request_body.as_ref().is_some_and(|b| b.required),
                responses => responses,
            }
        })
        .collect();

    let rendered = tmpl.render(context! {
        title => &doc.info.title,
        version => &doc.info.version,
        description => &doc.info.description,
        servers => servers,
        security_schemes => security_schemes,
        schemas => schemas,
        operations => operations,
    })?;
    let mut content = rendered.trim_end().to_string();
    content.push('\n');
    Ok(GeneratedFile {
        path: "docs.md".to_string(),
        content,
    })
}

/// Short human-readable type of a schema node.
pub fn describe_node(node: &SchemaNode) -> String {
    let base = match &node.kind {
        NodeKind::Reference(r) => match &r.target {
            Some(target) => format!("`{target}`"),
            None => "any".to_string(),
        },
        NodeKind::Primitive(p) => {
            let kind = match p.kind {
                PrimitiveKind::String => "string",
                PrimitiveKind::Number => "number",
                PrimitiveKind::Integer => "integer",
                PrimitiveKind::Boolean => "boolean",
                PrimitiveKind::Null => "null",
                PrimitiveKind::Unknown => "any",
            };
            match &p.format {
                Some(format) => format!("{kind} ({format})"),
                None => kind.to_string(),
            }
        }
        NodeKind::Object(_) => "object".to_string(),
        NodeKind::Array(arr) => format!("array of {}", describe_node(&arr.items)),
        NodeKind::Composition(comp) => {
            let separator = match comp.kind {
                CompositionKind::AllOf => " and ",
                CompositionKind::OneOf | CompositionKind::AnyOf => " or ",
            };
            let members: Vec<String> = comp.members.iter().map(describe_node).collect();
            if members.is_empty() {
                "any".to_string()
            } else {
                members.join(separator)
            }
        }
        NodeKind::Negation(_) => "any".to_string(),
        NodeKind::Literal(value) => format!("`{value}`"),
        NodeKind::Enum(values) => {
            let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            format!("one of `{}`", values.join("`, `"))
        }
    };
    if node.nullable {
        format!("{base} (nullable)")
    } else {
        base
    }
}

/// Single-line Markdown table cell.
fn cell(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use zodgen_core::parse::schema::SchemaOrRef;
    use zodgen_core::transform::schema_resolver::schema_or_ref_to_node;

    fn describe(yaml: &str) -> String {
        let schema: SchemaOrRef = serde_yaml_ng::from_str(yaml).unwrap();
        describe_node(&schema_or_ref_to_node(&schema))
    }

    #[test]
    fn test_describe_node() {
        assert_eq!(describe("type: string\nformat: uuid"), "string (uuid)");
        assert_eq!(
            describe("type: array\nitems: { type: integer }\nnullable: true"),
            "array of integer (nullable)"
        );
        assert_eq!(
            describe("oneOf: [{ type: string }, { type: boolean }]"),
            "string or boolean"
        );
        assert_eq!(describe("enum: [a, b]"), "one of `\"a\"`, `\"b\"`");
    }

    #[test]
    fn test_cell_escapes_pipes() {
        assert_eq!(cell("a | b\nc"), "a \\| b c");
    }
}
