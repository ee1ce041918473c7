use indexmap::IndexMap;
use log::debug;

use crate::error::{ResolveError, TransformError};
use crate::ir::*;
use crate::parse::RefOr;
use crate::parse::components::Components;
use crate::parse::operation::{
    self as raw, Header as RawHeader, MediaType, Parameter as RawParameter, PathItem,
    RequestBody as RawRequestBody, Response as RawResponse,
};
use crate::parse::spec::OpenApiSpec;

use super::ref_resolve::{lookup_component, resolve_document};
use super::schema_resolver::schema_or_ref_to_node;

/// Transform a parsed OpenAPI spec into the IR with every schema reference
/// resolved.
pub fn transform(spec: &OpenApiSpec) -> Result<Document, TransformError> {
    // Phase 1: Lower the raw document into the IR
    let doc = build_document(spec)?;

    // Phase 2: Annotate and validate every schema reference
    let resolved = resolve_document(&doc)?;

    debug!(
        "transformed '{}': {} schemas, {} operations",
        resolved.info.title,
        resolved.schemas.len(),
        resolved.operations.len()
    );
    Ok(resolved)
}

/// Lower a parsed spec into the IR. Non-schema component references
/// (parameters, request bodies, responses, headers) are inlined here; schema
/// references are kept for the resolver.
pub fn build_document(spec: &OpenApiSpec) -> Result<Document, ResolveError> {
    let components = spec.components.as_ref();

    let schemas: SchemaTable = components
        .map(|c| {
            c.schemas
                .iter()
                .map(|(name, schema)| NamedSchema {
                    name: name.clone(),
                    node: schema_or_ref_to_node(schema),
                })
                .collect()
        })
        .unwrap_or_default();

    let mut operations = Vec::new();
    for (path, item) in &spec.paths {
        collect_operations(path, item, components, &mut operations)?;
    }

    let security_schemes = components
        .map(|c| {
            c.security_schemes
                .iter()
                .map(|(name, scheme)| {
                    let detail = match (&scheme.scheme, &scheme.location, &scheme.name) {
                        (Some(http), _, _) => Some(match &scheme.bearer_format {
                            Some(format) => format!("{http} ({format})"),
                            None => http.clone(),
                        }),
                        (None, Some(location), Some(key)) => Some(format!("{key} in {location}")),
                        _ => None,
                    };
                    (
                        name.clone(),
                        SecuritySchemeInfo {
                            scheme_type: scheme.scheme_type.clone(),
                            description: scheme.description.clone(),
                            detail,
                        },
                    )
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(Document {
        info: Info {
            title: spec.info.title.clone(),
            description: spec.info.description.clone(),
            version: spec.info.version.clone(),
        },
        servers: spec
            .servers
            .iter()
            .map(|s| Server {
                url: s.url.clone(),
                description: s.description.clone(),
            })
            .collect(),
        schemas,
        operations,
        security_schemes,
        security: spec.security.clone().unwrap_or_default(),
    })
}

fn collect_operations(
    path: &str,
    item: &PathItem,
    components: Option<&Components>,
    out: &mut Vec<Operation>,
) -> Result<(), ResolveError> {
    let shared = resolve_parameters(&item.parameters, components)?;

    for (key, op) in item.operations() {
        let Some(method) = HttpMethod::from_path_item_key(key) else {
            continue;
        };
        out.push(build_operation(method, path, op, &shared, components)?);
    }
    Ok(())
}

fn build_operation(
    method: HttpMethod,
    path: &str,
    op: &raw::Operation,
    shared: &[Parameter],
    components: Option<&Components>,
) -> Result<Operation, ResolveError> {
    // Operation-level parameters override path-level ones with the same
    // name and location.
    let own = resolve_parameters(&op.parameters, components)?;
    let mut parameters: Vec<Parameter> = shared
        .iter()
        .filter(|p| {
            !own.iter()
                .any(|o| o.name == p.name && o.location == p.location)
        })
        .cloned()
        .collect();
    parameters.extend(own);

    let request_body = match &op.request_body {
        Some(body) => Some(build_request_body(body, components)?),
        None => None,
    };

    let mut responses = IndexMap::new();
    for (status, response) in &op.responses {
        responses.insert(status.clone(), build_response(response, components)?);
    }

    Ok(Operation {
        operation_id: op.operation_id.clone(),
        method,
        path: path.to_string(),
        summary: op.summary.clone(),
        description: op.description.clone(),
        tags: op.tags.clone(),
        deprecated: op.deprecated.unwrap_or(false),
        parameters,
        request_body,
        responses,
        security: op.security.clone(),
    })
}

fn resolve_parameters(
    params: &[RefOr<RawParameter>],
    components: Option<&Components>,
) -> Result<Vec<Parameter>, ResolveError> {
    params
        .iter()
        .map(|p| {
            let param = match p {
                RefOr::Item(param) => param,
                RefOr::Ref { ref_path } => {
                    lookup_component(ref_path, "parameters", components.map(|c| &c.parameters))?
                }
            };
            let location = match param.location {
                raw::ParameterLocation::Path => ParameterLocation::Path,
                raw::ParameterLocation::Query => ParameterLocation::Query,
                raw::ParameterLocation::Header => ParameterLocation::Header,
                raw::ParameterLocation::Cookie => ParameterLocation::Cookie,
            };
            Ok(Parameter {
                name: param.name.clone(),
                location,
                // Path parameters are always required.
                required: param.required || location == ParameterLocation::Path,
                description: param.description.clone(),
                schema: param
                    .schema
                    .as_ref()
                    .map(schema_or_ref_to_node)
                    .unwrap_or_else(SchemaNode::unknown),
            })
        })
        .collect()
}

fn build_request_body(
    body: &RefOr<RawRequestBody>,
    components: Option<&Components>,
) -> Result<RequestBody, ResolveError> {
    let body = match body {
        RefOr::Item(body) => body,
        RefOr::Ref { ref_path } => lookup_component(
            ref_path,
            "requestBodies",
            components.map(|c| &c.request_bodies),
        )?,
    };
    Ok(RequestBody {
        description: body.description.clone(),
        required: body.required,
        content: build_content(&body.content),
    })
}

fn build_response(
    response: &RefOr<RawResponse>,
    components: Option<&Components>,
) -> Result<ResponseSpec, ResolveError> {
    let response = match response {
        RefOr::Item(response) => response,
        RefOr::Ref { ref_path } => {
            lookup_component(ref_path, "responses", components.map(|c| &c.responses))?
        }
    };

    let mut headers = IndexMap::new();
    for (name, header) in &response.headers {
        let header: &RawHeader = match header {
            RefOr::Item(header) => header,
            RefOr::Ref { ref_path } => {
                lookup_component(ref_path, "headers", components.map(|c| &c.headers))?
            }
        };
        headers.insert(
            name.clone(),
            HeaderSpec {
                description: header.description.clone(),
                required: header.required,
                schema: header
                    .schema
                    .as_ref()
                    .map(schema_or_ref_to_node)
                    .unwrap_or_else(SchemaNode::unknown),
            },
        );
    }

    Ok(ResponseSpec {
        description: response.description.clone(),
        content: build_content(&response.content),
        headers,
    })
}

fn build_content(content: &IndexMap<String, MediaType>) -> IndexMap<String, SchemaNode> {
    content
        .iter()
        .map(|(content_type, media)| {
            let schema = media
                .schema
                .as_ref()
                .map(schema_or_ref_to_node)
                .unwrap_or_else(SchemaNode::unknown);
            (content_type.clone(), schema)
        })
        .collect()
}
