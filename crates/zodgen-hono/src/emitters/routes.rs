use std::collections::BTreeSet;

use indexmap::IndexMap;
use log::debug;
use minijinja::{Environment, Value, context};
use zodgen_core::config::Casing;
use zodgen_core::ir::{Document, HttpMethod, Operation, ParameterLocation};
use zodgen_core::naming::{NameRegistry, apply_casing, property_key, quote, route_to_name};

use super::jsdoc_line;
use crate::expression::{ExpressionGenerator, list_expression, object_expression};

/// One generated `createRoute` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDeclaration {
    pub identifier: String,
    pub method: HttpMethod,
    /// Emitted path, base path included.
    pub path: String,
    /// `operationId`, or `METHOD path` when the operation has none.
    pub title: String,
    pub depends_on: BTreeSet<String>,
    pub source: String,
}

/// Emit one route per operation, in document order.
pub fn emit_routes(
    env: &Environment<'_>,
    doc: &Document,
    base_path: Option<&str>,
    registry: &mut NameRegistry,
    generator: &mut ExpressionGenerator<'_>,
) -> Result<Vec<RouteDeclaration>, minijinja::Error> {
    let tmpl = env.get_template("route.ts.j2")?;
    let mut routes = Vec::with_capacity(doc.operations.len());

    for op in &doc.operations {
        let title = match &op.operation_id {
            Some(id) => id.clone(),
            None => format!("{} {}", op.method.as_str().to_uppercase(), op.path),
        };
        let identifier = registry.register(&title, &route_identifier(op));
        let path = join_base_path(base_path, &op.path);
        debug!("emitting route {identifier} for {title}");

        let request = request_parts(op, &identifier, generator);
        let body = op.request_body.as_ref().map(|body| {
            let content: Vec<Value> = body
                .content
                .iter()
                .map(|(content_type, schema)| {
                    let location = format!("{identifier}.body.{content_type}");
                    context! {
                        key => quote(content_type),
                        schema => generator.generate(schema, &location, 5),
                    }
                })
                .collect();
            context! {
                description => body.description.as_deref().map(quote),
                content => content,
                required => body.required,
            }
        });

        let mut responses = Vec::with_capacity(op.responses.len());
        for (status, response) in &op.responses {
            let content: Vec<Value> = response
                .content
                .iter()
                .map(|(content_type, schema)| {
                    let location = format!("{identifier}.{status}.{content_type}");
                    context! {
                        key => quote(content_type),
                        schema => generator.generate(schema, &location, 5),
                    }
                })
                .collect();
            let headers = (!response.headers.is_empty()).then(|| {
                let fields: Vec<(String, String)> = response
                    .headers
                    .iter()
                    .map(|(name, header)| {
                        let location = format!("{identifier}.{status}.headers.{name}");
                        let mut expr = generator.generate(&header.schema, &location, 4);
                        if let Some(description) = &header.description {
                            expr.push_str(&format!(".describe({})", quote(description)));
                        }
                        if !header.required {
                            expr.push_str(".optional()");
                        }
                        (property_key(name), expr)
                    })
                    .collect();
                object_expression(&fields, 3)
            });
            responses.push(context! {
                key => property_key(status),
                description => quote(&response.description),
                content => content,
                headers => headers,
            });
        }

        let tags: Vec<String> = op.tags.iter().map(|t| quote(t)).collect();
        let source = tmpl.render(context! {
            identifier => &identifier,
            summary_doc => op.summary.as_deref().map(jsdoc_line),
            description_doc => op.description.as_deref().map(jsdoc_line),
            method => op.method.as_str(),
            path => quote(&path),
            operation_id => op.operation_id.as_deref().map(quote),
            summary => op.summary.as_deref().map(quote),
            description => op.description.as_deref().map(quote),
            tags => (!tags.is_empty()).then(|| list_expression(&tags, 1)),
            deprecated => op.deprecated,
            request => request,
            body => body,
            responses => responses,
            security => effective_security(op, doc).map(security_expression),
        })?;

        routes.push(RouteDeclaration {
            identifier,
            method: op.method,
            path,
            title,
            depends_on: generator.take_references(),
            source: source.trim_end().to_string(),
        });
    }
    Ok(routes)
}

/// `getPetRoute` from `operationId: get_pet`, or from method and path.
fn route_identifier(op: &Operation) -> String {
    let base = match &op.operation_id {
        Some(id) => apply_casing(id, Casing::CamelCase),
        None => route_to_name(op.method.as_str(), &op.path),
    };
    format!("{base}Route")
}

fn request_key(location: ParameterLocation) -> &'static str {
    match location {
        ParameterLocation::Path => "params",
        ParameterLocation::Query => "query",
        ParameterLocation::Header => "headers",
        ParameterLocation::Cookie => "cookies",
    }
}

fn request_parts(
    op: &Operation,
    identifier: &str,
    generator: &mut ExpressionGenerator<'_>,
) -> Vec<Value> {
    let mut parts = Vec::new();
    for location in ParameterLocation::ALL {
        let fields: Vec<(String, String)> = op
            .parameters_in(location)
            .map(|param| {
                let label = format!("{identifier}.{}.{}", location.as_str(), param.name);
                let mut expr = generator.generate_parameter(&param.schema, &label, 3);
                if let Some(description) = &param.description {
                    expr.push_str(&format!(".describe({})", quote(description)));
                }
                if !param.required {
                    expr.push_str(".optional()");
                }
                (property_key(&param.name), expr)
            })
            .collect();
        if fields.is_empty() {
            continue;
        }
        parts.push(context! {
            key => request_key(location),
            schema => object_expression(&fields, 2),
        });
    }
    parts
}

/// Prefix `path` with the configured base path.
pub fn join_base_path(base_path: Option<&str>, path: &str) -> String {
    let base = base_path.unwrap_or("").trim_end_matches('/');
    if base.is_empty() {
        return path.to_string();
    }
    let base = if base.starts_with('/') {
        base.to_string()
    } else {
        format!("/{base}")
    };
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// Operation security, else the document-level requirements. An explicit
/// empty list on the operation clears them.
fn effective_security<'d>(
    op: &'d Operation,
    doc: &'d Document,
) -> Option<&'d [IndexMap<String, Vec<String>>]> {
    match &op.security {
        Some(requirements) => Some(requirements.as_slice()),
        None if doc.security.is_empty() => None,
        None => Some(doc.security.as_slice()),
    }
}

/// `[{ api_key: [] }, { oauth: ['read'] }]`
fn security_expression(requirements: &[IndexMap<String, Vec<String>>]) -> String {
    let items: Vec<String> = requirements
        .iter()
        .map(|requirement| {
            if requirement.is_empty() {
                return "{}".to_string();
            }
            let entries: Vec<String> = requirement
                .iter()
                .map(|(scheme, scopes)| {
                    let scopes: Vec<String> = scopes.iter().map(|s| quote(s)).collect();
                    format!("{}: [{}]", property_key(scheme), scopes.join(", "))
                })
                .collect();
            format!("{{ {} }}", entries.join(", "))
        })
        .collect();
    format!("[{}]", items.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitters::environment;
    use crate::symbols::Symbols;
    use zodgen_core::graph::{DependencyGraph, order_declarations};
    use zodgen_core::parse;
    use zodgen_core::transform;

    const ITEMS: &str = r##"
openapi: "3.1.0"
info: { title: Items, version: "1" }
paths:
  /items/{id}:
    get:
      operationId: get_item
      summary: Fetch one item
      tags: [items]
      parameters:
        - { name: id, in: path, required: true, schema: { type: integer } }
        - { name: verbose, in: query, description: Include details, schema: { type: boolean } }
      responses:
        "200":
          description: The item
          content:
            application/json:
              schema: { $ref: "#/components/schemas/Item" }
        default:
          description: Failure
  /items:
    post:
      requestBody:
        required: true
        content:
          application/json:
            schema: { $ref: "#/components/schemas/Item" }
      responses:
        "201":
          description: Created
          headers:
            Location:
              required: true
              schema: { type: string }
      security:
        - oauth: [write]
components:
  schemas:
    Item:
      type: object
      required: [id]
      properties:
        id: { type: integer }
"##;

    fn routes(base_path: Option<&str>) -> Vec<RouteDeclaration> {
        let doc = transform::transform(&parse::from_yaml(ITEMS).unwrap()).unwrap();
        let order = order_declarations(&DependencyGraph::build(&doc.schemas));
        let mut registry = NameRegistry::new();
        let symbols = Symbols::assign(&doc.schemas, &order, Casing::PascalCase, &mut registry);
        let mut generator = ExpressionGenerator::new(&doc.schemas, &symbols);
        let env = environment().unwrap();
        emit_routes(&env, &doc, base_path, &mut registry, &mut generator).unwrap()
    }

    #[test]
    fn test_route_with_parameters_and_base_path() {
        let routes = routes(Some("/api/"));
        assert_eq!(routes.len(), 2);
        let get = &routes[0];
        assert_eq!(get.identifier, "getItemRoute");
        assert_eq!(get.path, "/api/items/{id}");
        assert_eq!(get.depends_on.iter().collect::<Vec<_>>(), vec!["Item"]);
        insta::assert_snapshot!(get.source, @r"
        /**
         * Fetch one item
         */
        export const getItemRoute = createRoute({
          method: 'get',
          path: '/api/items/{id}',
          operationId: 'get_item',
          summary: 'Fetch one item',
          tags: ['items'],
          request: {
            params: z.object({
              id: z.coerce.number().int(),
            }),
            query: z.object({
              verbose: z.preprocess((v) => (v === 'true' ? true : v === 'false' ? false : v), z.boolean()).describe('Include details').optional(),
            }),
          },
          responses: {
            '200': {
              description: 'The item',
              content: {
                'application/json': {
                  schema: ItemSchema,
                },
              },
            },
            default: {
              description: 'Failure',
            },
          },
        });
        ");
    }

    #[test]
    fn test_route_with_body_headers_and_security() {
        let routes = routes(None);
        let post = &routes[1];
        assert_eq!(post.identifier, "postItemsRoute");
        assert_eq!(post.title, "POST /items");
        insta::assert_snapshot!(post.source, @r"
        export const postItemsRoute = createRoute({
          method: 'post',
          path: '/items',
          request: {
            body: {
              content: {
                'application/json': {
                  schema: ItemSchema,
                },
              },
              required: true,
            },
          },
          responses: {
            '201': {
              description: 'Created',
              headers: z.object({
                Location: z.string(),
              }),
            },
          },
          security: [{ oauth: ['write'] }],
        });
        ");
    }

    #[test]
    fn test_document_security_is_inherited() {
        let yaml = r##"
openapi: "3.1.0"
info: { title: Secure, version: "1" }
security:
  - bearer: []
paths:
  /me:
    get:
      operationId: getMe
      responses:
        "204": { description: Nothing }
  /health:
    get:
      operationId: health
      security: []
      responses:
        "204": { description: Nothing }
"##;
        let doc = transform::transform(&parse::from_yaml(yaml).unwrap()).unwrap();
        let symbols = Symbols::default();
        let mut generator = ExpressionGenerator::new(&doc.schemas, &symbols);
        let env = environment().unwrap();
        let routes =
            emit_routes(&env, &doc, None, &mut NameRegistry::new(), &mut generator).unwrap();

        assert!(routes[0].source.contains("  security: [{ bearer: [] }],\n"));
        assert!(routes[1].source.contains("  security: [],\n"));
    }

    #[test]
    fn test_join_base_path() {
        assert_eq!(join_base_path(None, "/pets"), "/pets");
        assert_eq!(join_base_path(Some("/"), "/pets"), "/pets");
        assert_eq!(join_base_path(Some("v1"), "/pets"), "/v1/pets");
        assert_eq!(join_base_path(Some("/api/v1/"), "/pets"), "/api/v1/pets");
    }

    #[test]
    fn test_security_expression() {
        let mut requirement = IndexMap::new();
        requirement.insert("api_key".to_string(), vec![]);
        assert_eq!(security_expression(&[requirement]), "[{ api_key: [] }]");
        assert_eq!(security_expression(&[]), "[]");
    }
}
