use std::collections::HashSet;

use indexmap::IndexMap;

use crate::error::ResolveError;
use crate::ir::{Document, Reference, SchemaNode, SchemaTable};
use crate::parse::RefOr;

const SCHEMAS_SECTION: &str = "schemas";

/// Parse a `$ref` path like `#/components/schemas/Foo` and extract the
/// (JSON-pointer decoded) name.
pub fn parse_ref_name(ref_path: &str, expected_section: &str) -> Result<String, ResolveError> {
    let stripped = ref_path
        .strip_prefix("#/components/")
        .ok_or_else(|| ResolveError::InvalidRefFormat(ref_path.to_string()))?;
    let (section, name) = stripped
        .split_once('/')
        .ok_or_else(|| ResolveError::InvalidRefFormat(ref_path.to_string()))?;
    if section != expected_section {
        return Err(ResolveError::InvalidRefFormat(format!(
            "expected section '{}', got '{}' in {}",
            expected_section, section, ref_path
        )));
    }
    if name.is_empty() || name.contains('/') {
        return Err(ResolveError::InvalidRefFormat(ref_path.to_string()));
    }
    Ok(decode_pointer_segment(name))
}

/// `~1` → `/`, then `~0` → `~` (RFC 6901 order).
fn decode_pointer_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// Annotate every reference in `node` with its target component name.
///
/// Fails with [`ResolveError::UnresolvedReference`] when a pointer names a
/// schema missing from `table`. Pure: the input tree is left untouched.
pub fn resolve_node(node: &SchemaNode, table: &SchemaTable) -> Result<SchemaNode, ResolveError> {
    node.try_map_references(&mut |reference: &Reference| {
        let name = parse_ref_name(&reference.pointer, SCHEMAS_SECTION)?;
        if !table.contains(&name) {
            return Err(ResolveError::UnresolvedReference {
                pointer: reference.pointer.clone(),
                name,
            });
        }
        Ok(Reference {
            pointer: reference.pointer.clone(),
            target: Some(name),
        })
    })
}

/// Resolve every schema tree of a document: components first, then each
/// operation's parameters, bodies, responses and headers.
pub fn resolve_document(doc: &Document) -> Result<Document, ResolveError> {
    let table = &doc.schemas;

    let schemas = table
        .iter()
        .map(|named| {
            Ok(crate::ir::NamedSchema {
                name: named.name.clone(),
                node: resolve_node(&named.node, table)?,
            })
        })
        .collect::<Result<SchemaTable, ResolveError>>()?;

    let mut operations = Vec::with_capacity(doc.operations.len());
    for op in &doc.operations {
        let mut op = op.clone();
        for param in &mut op.parameters {
            param.schema = resolve_node(&param.schema, table)?;
        }
        if let Some(body) = &mut op.request_body {
            resolve_content(&mut body.content, table)?;
        }
        for response in op.responses.values_mut() {
            resolve_content(&mut response.content, table)?;
            for header in response.headers.values_mut() {
                header.schema = resolve_node(&header.schema, table)?;
            }
        }
        operations.push(op);
    }

    Ok(Document {
        schemas,
        operations,
        ..doc.clone()
    })
}

fn resolve_content(
    content: &mut IndexMap<String, SchemaNode>,
    table: &SchemaTable,
) -> Result<(), ResolveError> {
    for schema in content.values_mut() {
        *schema = resolve_node(schema, table)?;
    }
    Ok(())
}

/// Look up a non-schema component (`parameters`, `responses`, ...), following
/// component-to-component references. Cycles among them are an error.
pub fn lookup_component<'a, T>(
    ref_path: &str,
    section: &str,
    components: Option<&'a IndexMap<String, RefOr<T>>>,
) -> Result<&'a T, ResolveError> {
    let mut visited = HashSet::new();
    let mut current = ref_path.to_string();
    loop {
        if !visited.insert(current.clone()) {
            return Err(ResolveError::CircularComponentRef(ref_path.to_string()));
        }
        let name = parse_ref_name(&current, section)?;
        match components.and_then(|c| c.get(&name)) {
            Some(RefOr::Item(item)) => return Ok(item),
            Some(RefOr::Ref { ref_path: next }) => current = next.clone(),
            None => {
                return Err(ResolveError::UnresolvedReference {
                    pointer: current,
                    name,
                });
            }
        }
    }
}
