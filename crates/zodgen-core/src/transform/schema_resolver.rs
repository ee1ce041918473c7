use indexmap::{IndexMap, IndexSet};
use log::debug;

use crate::ir::{
    AdditionalProperties as IrAdditional, ArraySchema, CompositionKind, CompositionSchema,
    Constraints, NodeKind, ObjectSchema, PrimitiveKind, PrimitiveSchema, SchemaNode,
};
use crate::parse::schema::{
    AdditionalProperties, ExclusiveBound, Schema, SchemaOrRef, SchemaType, TypeSet,
};

/// Convert a parsed `SchemaOrRef` into an IR node. References stay
/// references; the resolver annotates their targets later.
pub fn schema_or_ref_to_node(schema_or_ref: &SchemaOrRef) -> SchemaNode {
    match schema_or_ref {
        SchemaOrRef::Ref {
            ref_path,
            description,
            nullable,
            default_value,
        } => SchemaNode {
            nullable: *nullable == Some(true),
            default: default_value.clone(),
            description: description.clone(),
            ..SchemaNode::reference(ref_path.clone())
        },
        SchemaOrRef::Schema(schema) => schema_to_node(schema),
    }
}

/// Convert a parsed `Schema` into an IR node.
///
/// Precedence: `not`, then composition (`allOf` > `oneOf` > `anyOf`), then
/// `const`, then `enum`, then the declared or implied type.
pub fn schema_to_node(schema: &Schema) -> SchemaNode {
    let type_nullable = schema
        .schema_type
        .as_ref()
        .is_some_and(|t| t.contains_null() && t.types().len() > 1);

    let (kind, kind_nullable) = classify(schema);

    SchemaNode {
        kind,
        nullable: schema.nullable == Some(true) || type_nullable || kind_nullable,
        default: schema.default_value.clone(),
        description: schema.description.clone(),
    }
}

/// Returns the node kind plus whether the kind itself implies nullability
/// (an `enum` listing `null`).
fn classify(schema: &Schema) -> (NodeKind, bool) {
    if let Some(not) = &schema.not {
        return (
            NodeKind::Negation(Box::new(schema_or_ref_to_node(not))),
            false,
        );
    }

    if let Some(all_of) = &schema.all_of {
        let mut members: Vec<SchemaNode> = all_of.iter().map(schema_or_ref_to_node).collect();
        // Sibling properties next to `allOf` act as one more branch. Its
        // required names may be declared by another branch.
        if !schema.properties.is_empty() || !schema.required.is_empty() {
            members.push(SchemaNode::new(NodeKind::Object(build_object(schema, true))));
        }
        return (composition(CompositionKind::AllOf, members, schema), false);
    }
    if let Some(one_of) = &schema.one_of {
        let members = one_of.iter().map(schema_or_ref_to_node).collect();
        return (composition(CompositionKind::OneOf, members, schema), false);
    }
    if let Some(any_of) = &schema.any_of {
        let members = any_of.iter().map(schema_or_ref_to_node).collect();
        return (composition(CompositionKind::AnyOf, members, schema), false);
    }

    if let Some(value) = &schema.const_value {
        return (NodeKind::Literal(value.clone()), false);
    }

    if !schema.enum_values.is_empty() {
        return classify_enum(&schema.enum_values);
    }

    match &schema.schema_type {
        Some(type_set) => classify_types(schema, type_set),
        None => {
            if !schema.properties.is_empty() || schema.additional_properties.is_some() {
                (NodeKind::Object(build_object(schema, false)), false)
            } else if schema.items.is_some() {
                (NodeKind::Array(build_array(schema)), false)
            } else {
                (NodeKind::Primitive(build_primitive(schema, PrimitiveKind::Unknown)), false)
            }
        }
    }
}

fn composition(kind: CompositionKind, members: Vec<SchemaNode>, schema: &Schema) -> NodeKind {
    NodeKind::Composition(CompositionSchema {
        kind,
        members,
        discriminator: schema
            .discriminator
            .as_ref()
            .map(|d| d.property_name.clone()),
    })
}

fn classify_enum(values: &[serde_json::Value]) -> (NodeKind, bool) {
    let has_null = values.iter().any(|v| v.is_null());
    let non_null: Vec<serde_json::Value> =
        values.iter().filter(|v| !v.is_null()).cloned().collect();

    match non_null.len() {
        // `enum: [null]` admits only null.
        0 => (
            NodeKind::Primitive(PrimitiveSchema::new(PrimitiveKind::Null)),
            false,
        ),
        1 => (
            NodeKind::Literal(non_null.into_iter().next().unwrap_or_default()),
            has_null,
        ),
        _ => (NodeKind::Enum(non_null), has_null),
    }
}

fn classify_types(schema: &Schema, type_set: &TypeSet) -> (NodeKind, bool) {
    let non_null: Vec<SchemaType> = type_set
        .types()
        .into_iter()
        .filter(|t| *t != SchemaType::Null)
        .collect();

    match non_null.as_slice() {
        [] => (
            NodeKind::Primitive(PrimitiveSchema::new(PrimitiveKind::Null)),
            false,
        ),
        [single] => (classify_single(schema, *single), false),
        several => {
            debug!(
                "type array {:?} lowered to anyOf of {} members",
                several,
                several.len()
            );
            let members = several
                .iter()
                .map(|t| SchemaNode::new(classify_single(schema, *t)))
                .collect();
            (
                NodeKind::Composition(CompositionSchema {
                    kind: CompositionKind::AnyOf,
                    members,
                    discriminator: None,
                }),
                false,
            )
        }
    }
}

fn classify_single(schema: &Schema, schema_type: SchemaType) -> NodeKind {
    match schema_type {
        SchemaType::String => NodeKind::Primitive(build_primitive(schema, PrimitiveKind::String)),
        SchemaType::Number => NodeKind::Primitive(build_primitive(schema, PrimitiveKind::Number)),
        SchemaType::Integer => {
            NodeKind::Primitive(build_primitive(schema, PrimitiveKind::Integer))
        }
        SchemaType::Boolean => {
            NodeKind::Primitive(build_primitive(schema, PrimitiveKind::Boolean))
        }
        SchemaType::Null => NodeKind::Primitive(PrimitiveSchema::new(PrimitiveKind::Null)),
        SchemaType::Array => NodeKind::Array(build_array(schema)),
        SchemaType::Object => NodeKind::Object(build_object(schema, false)),
    }
}

fn build_primitive(schema: &Schema, kind: PrimitiveKind) -> PrimitiveSchema {
    let (minimum, exclusive_minimum) = normalize_bound(schema.minimum, schema.exclusive_minimum);
    let (maximum, exclusive_maximum) = normalize_bound(schema.maximum, schema.exclusive_maximum);

    PrimitiveSchema {
        kind,
        format: schema.format.clone(),
        constraints: Constraints {
            pattern: schema.pattern.clone(),
            min_length: schema.min_length,
            max_length: schema.max_length,
            minimum,
            maximum,
            exclusive_minimum,
            exclusive_maximum,
            multiple_of: schema.multiple_of,
        },
    }
}

/// Fold the OpenAPI 3.0 boolean form into the 3.1 numeric form:
/// `maximum: 5, exclusiveMaximum: true` becomes an exclusive bound of 5.
fn normalize_bound(
    inclusive: Option<f64>,
    exclusive: Option<ExclusiveBound>,
) -> (Option<f64>, Option<f64>) {
    match exclusive {
        Some(ExclusiveBound::Flag(true)) => (None, inclusive),
        Some(ExclusiveBound::Flag(false)) | None => (inclusive, None),
        Some(ExclusiveBound::Value(v)) => (inclusive, Some(v)),
    }
}

fn build_array(schema: &Schema) -> ArraySchema {
    ArraySchema {
        items: Box::new(
            schema
                .items
                .as_deref()
                .map(schema_or_ref_to_node)
                .unwrap_or_else(SchemaNode::unknown),
        ),
        min_items: schema.min_items,
        max_items: schema.max_items,
        unique_items: schema.unique_items.unwrap_or(false),
    }
}

fn build_object(schema: &Schema, keep_undeclared_required: bool) -> ObjectSchema {
    let properties: IndexMap<String, SchemaNode> = schema
        .properties
        .iter()
        .map(|(name, prop)| (name.clone(), schema_or_ref_to_node(prop)))
        .collect();

    let mut required = IndexSet::new();
    for name in &schema.required {
        if keep_undeclared_required || properties.contains_key(name) {
            required.insert(name.clone());
        } else {
            debug!("dropping required entry '{name}' with no matching property");
        }
    }

    let additional_properties = match &schema.additional_properties {
        None => IrAdditional::Unspecified,
        Some(AdditionalProperties::Bool(true)) => IrAdditional::Allowed,
        Some(AdditionalProperties::Bool(false)) => IrAdditional::Forbidden,
        Some(AdditionalProperties::Schema(s)) => {
            IrAdditional::Schema(Box::new(schema_or_ref_to_node(s)))
        }
    };

    ObjectSchema {
        properties,
        required,
        additional_properties,
    }
}
