use std::collections::{BTreeSet, HashSet};

use log::{debug, warn};
use serde_json::Value;
use zodgen_core::diagnostics::Diagnostic;
use zodgen_core::ir::{
    AdditionalProperties, ArraySchema, CompositionKind, CompositionSchema, Constraints, NodeKind,
    ObjectSchema, PrimitiveKind, PrimitiveSchema, Reference, SchemaNode, SchemaTable,
};
use zodgen_core::naming::{property_key, quote};

use crate::symbols::Symbols;

/// The permissive expression every unsupported construct degrades to.
pub const FALLBACK: &str = "z.any()";

pub const INDENT: &str = "  ";

/// Query and header values arrive as strings; only `true` and `false`
/// are accepted as booleans.
const BOOLEAN_PARAMETER: &str =
    "z.preprocess((v) => (v === 'true' ? true : v === 'false' ? false : v), z.boolean())";

const UNIQUE_ITEMS: &str =
    ".refine((items) => new Set(items).size === items.length, { message: 'Items must be unique' })";

/// Translates schema nodes into Zod expressions.
///
/// One generator serves a whole document. References are emitted as the
/// identifiers assigned in [`Symbols`] and recorded so callers can compute
/// imports; recoverable problems are collected as diagnostics.
pub struct ExpressionGenerator<'a> {
    schemas: &'a SchemaTable,
    symbols: &'a Symbols,
    references: BTreeSet<String>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> ExpressionGenerator<'a> {
    pub fn new(schemas: &'a SchemaTable, symbols: &'a Symbols) -> Self {
        Self {
            schemas,
            symbols,
            references: BTreeSet::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Expression for `node`. Continuation lines are indented `indent`
    /// levels; `location` names the node in diagnostics.
    pub fn generate(&mut self, node: &SchemaNode, location: &str, indent: usize) -> String {
        self.render(node, location, indent, false)
    }

    /// Expression for a request parameter. Raw parameter values arrive as
    /// strings, so numbers coerce and booleans are parsed, including array
    /// items.
    pub fn generate_parameter(
        &mut self,
        node: &SchemaNode,
        location: &str,
        indent: usize,
    ) -> String {
        self.render(node, location, indent, true)
    }

    /// Schema names referenced since the last call.
    pub fn take_references(&mut self) -> BTreeSet<String> {
        std::mem::take(&mut self.references)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    fn render(&mut self, node: &SchemaNode, location: &str, indent: usize, coerce: bool) -> String {
        let nullable = node.nullable || self.inherited_nullability(node);
        self.render_annotated(node, location, indent, coerce, nullable)
    }

    /// Kind expression, then `.default(...)`, then `.nullable()` at most once.
    fn render_annotated(
        &mut self,
        node: &SchemaNode,
        location: &str,
        indent: usize,
        coerce: bool,
        nullable: bool,
    ) -> String {
        let mut expr = match &node.kind {
            NodeKind::Reference(reference) => self.reference(reference, location),
            NodeKind::Primitive(primitive) => primitive_expression(primitive, coerce),
            NodeKind::Object(obj) => self.object(obj, location, indent),
            NodeKind::Array(arr) => self.array(arr, location, indent, coerce),
            NodeKind::Composition(comp) => self.composition(comp, location, indent, coerce),
            NodeKind::Negation(_) => self.fallback(Diagnostic::NegationFallback {
                location: location.to_string(),
            }),
            NodeKind::Literal(value) => self.literal(value, location),
            NodeKind::Enum(values) => self.enumeration(values, location),
        };
        if let Some(default) = &node.default {
            expr.push_str(&format!(".default({})", js_value(default)));
        }
        if nullable {
            expr.push_str(".nullable()");
        }
        expr
    }

    /// `allOf` is nullable when any of its branches is; a single-member
    /// union when its member is.
    fn inherited_nullability(&self, node: &SchemaNode) -> bool {
        match &node.kind {
            NodeKind::Composition(CompositionSchema {
                kind: CompositionKind::AllOf,
                members,
                ..
            }) => members.iter().any(|m| self.branch_nullable(m)),
            NodeKind::Composition(CompositionSchema { members, .. }) => match members.as_slice() {
                [single] => single.nullable || self.inherited_nullability(single),
                _ => false,
            },
            _ => false,
        }
    }

    fn branch_nullable(&self, node: &SchemaNode) -> bool {
        if node.nullable || self.inherited_nullability(node) {
            return true;
        }
        match &node.kind {
            NodeKind::Reference(reference) => reference
                .target
                .as_deref()
                .and_then(|t| self.schemas.get(t))
                .is_some_and(|named| named.node.nullable),
            _ => false,
        }
    }

    fn fallback(&mut self, diagnostic: Diagnostic) -> String {
        self.diagnostics.push(diagnostic);
        FALLBACK.to_string()
    }

    fn reference(&mut self, reference: &Reference, location: &str) -> String {
        let symbols: &'a Symbols = self.symbols;
        let target = reference.target.as_deref();
        match target.and_then(|t| symbols.identifier(t).map(|id| (t, id))) {
            Some((target, identifier)) => {
                self.references.insert(target.to_string());
                identifier.to_string()
            }
            None => {
                warn!("{location}: reference {} was never resolved", reference.pointer);
                FALLBACK.to_string()
            }
        }
    }

    fn object(&mut self, obj: &ObjectSchema, location: &str, indent: usize) -> String {
        if obj.properties.is_empty() {
            return match &obj.additional_properties {
                AdditionalProperties::Schema(value) => {
                    let value = self.render(value, &format!("{location}.*"), indent, false);
                    format!("z.record(z.string(), {value})")
                }
                AdditionalProperties::Allowed => format!("z.record(z.string(), {FALLBACK})"),
                AdditionalProperties::Forbidden => "z.object({}).strict()".to_string(),
                AdditionalProperties::Unspecified => "z.object({})".to_string(),
            };
        }

        let mut fields = Vec::with_capacity(obj.properties.len());
        for (name, prop) in &obj.properties {
            let mut expr = self.render(prop, &format!("{location}.{name}"), indent + 1, false);
            if !obj.is_required(name) {
                expr.push_str(".optional()");
            }
            fields.push((property_key(name), expr));
        }
        let body = object_expression(&fields, indent);

        match &obj.additional_properties {
            AdditionalProperties::Schema(value) => {
                let value = self.render(value, &format!("{location}.*"), indent, false);
                format!("{body}.catchall({value})")
            }
            AdditionalProperties::Allowed => format!("{body}.passthrough()"),
            AdditionalProperties::Forbidden => format!("{body}.strict()"),
            AdditionalProperties::Unspecified => body,
        }
    }

    fn array(&mut self, arr: &ArraySchema, location: &str, indent: usize, coerce: bool) -> String {
        let items = self.render(&arr.items, &format!("{location}[]"), indent, coerce);
        let mut expr = format!("z.array({items})");
        expr.push_str(&length_suffix(arr.min_items, arr.max_items));
        if arr.unique_items {
            expr.push_str(UNIQUE_ITEMS);
        }
        expr
    }

    fn literal(&mut self, value: &Value, location: &str) -> String {
        match value {
            Value::Null => "z.null()".to_string(),
            Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                format!("z.literal({})", js_value(value))
            }
            Value::Array(_) | Value::Object(_) => self.fallback(Diagnostic::UnsupportedLiteral {
                location: location.to_string(),
            }),
        }
    }

    fn enumeration(&mut self, values: &[Value], location: &str) -> String {
        match values {
            [] => self.fallback(Diagnostic::UnsupportedLiteral {
                location: location.to_string(),
            }),
            [single] => self.literal(single, location),
            _ if values.iter().all(Value::is_string) => {
                let variants: Vec<String> = values.iter().map(js_value).collect();
                format!("z.enum([{}])", variants.join(", "))
            }
            _ if values.iter().all(is_scalar) => {
                let variants: Vec<String> = values
                    .iter()
                    .map(|v| format!("z.literal({})", js_value(v)))
                    .collect();
                format!("z.union([{}])", variants.join(", "))
            }
            _ => self.fallback(Diagnostic::UnsupportedLiteral {
                location: location.to_string(),
            }),
        }
    }

    fn composition(
        &mut self,
        comp: &CompositionSchema,
        location: &str,
        indent: usize,
        coerce: bool,
    ) -> String {
        let keyword = comp.kind.keyword();
        if comp.members.is_empty() {
            return self.fallback(Diagnostic::MalformedComposition {
                location: location.to_string(),
                keyword: keyword.to_string(),
            });
        }
        match comp.kind {
            CompositionKind::AllOf => self.intersection(&comp.members, location, indent, coerce),
            CompositionKind::OneOf | CompositionKind::AnyOf => {
                self.union(comp, &format!("{location}.{keyword}"), indent, coerce)
            }
        }
    }

    /// Inline object branches are merged into one object; whatever remains
    /// is folded left with `.and(...)`. Nullability is stripped from each
    /// branch and reapplied once by the caller.
    ///
    /// Required names the merged object does not declare are applied to the
    /// referenced object branch declaring them, as `.required({ ... })`.
    fn intersection(
        &mut self,
        members: &[SchemaNode],
        location: &str,
        indent: usize,
        coerce: bool,
    ) -> String {
        let mut branches = merge_object_branches(members);
        let mut pending = take_undeclared_required(&mut branches);

        let mut result: Option<String> = None;
        for (i, branch) in branches.iter().enumerate() {
            let branch_location = format!("{location}.allOf[{i}]");
            let mut expr = self.render_annotated(branch, &branch_location, indent, coerce, false);
            let declared: Vec<String> = match self.plain_object(branch) {
                Some(obj) if matches!(branch.kind, NodeKind::Reference(_)) => pending
                    .iter()
                    .filter(|name| obj.properties.contains_key(*name))
                    .cloned()
                    .collect(),
                _ => Vec::new(),
            };
            if !declared.is_empty() {
                pending.retain(|name| !declared.contains(name));
                let mask: Vec<String> = declared
                    .iter()
                    .map(|name| format!("{}: true", property_key(name)))
                    .collect();
                expr.push_str(&format!(".required({{ {} }})", mask.join(", ")));
            }
            result = Some(match result {
                Some(acc) => format!("{acc}.and({expr})"),
                None => expr,
            });
        }
        for name in &pending {
            debug!("{location}: required property '{name}' is not declared by any allOf branch");
        }
        result.unwrap_or_else(|| FALLBACK.to_string())
    }

    fn union(
        &mut self,
        comp: &CompositionSchema,
        location: &str,
        indent: usize,
        coerce: bool,
    ) -> String {
        // The member's nullability is applied once by the caller.
        if let [single] = comp.members.as_slice() {
            let location = format!("{location}[0]");
            return self.render_annotated(single, &location, indent, coerce, false);
        }

        let discriminator = self.discriminator_for(comp);
        let members: Vec<String> = comp
            .members
            .iter()
            .enumerate()
            .map(|(i, m)| self.render(m, &format!("{location}[{i}]"), indent + 1, coerce))
            .collect();
        let members = list_expression(&members, indent);

        match discriminator {
            Some(property) => format!("z.discriminatedUnion({}, {members})", quote(&property)),
            None => format!("z.union({members})"),
        }
    }

    /// The discriminating property, when every member is a plain object
    /// carrying a distinct required literal under it. The declared
    /// discriminator is the only candidate when present.
    fn discriminator_for(&self, comp: &CompositionSchema) -> Option<String> {
        let objects = comp
            .members
            .iter()
            .map(|m| self.plain_object(m))
            .collect::<Option<Vec<&ObjectSchema>>>()?;

        let candidates: Vec<&str> = match &comp.discriminator {
            Some(property) => vec![property.as_str()],
            None => objects.first()?.properties.keys().map(String::as_str).collect(),
        };
        candidates
            .into_iter()
            .find(|property| discriminates(&objects, property))
            .map(str::to_string)
    }

    /// The object schema behind `node`, following references, provided the
    /// emitted expression is a bare `z.object(...)`. Lazily bound schemas
    /// are `ZodLazy` and never qualify.
    fn plain_object<'n>(&self, node: &'n SchemaNode) -> Option<&'n ObjectSchema>
    where
        'a: 'n,
    {
        if node.nullable || node.default.is_some() {
            return None;
        }
        match &node.kind {
            NodeKind::Object(obj) if !obj.properties.is_empty() => Some(obj),
            NodeKind::Reference(reference) => {
                let target = reference.target.as_deref()?;
                if self.symbols.is_lazy(target) {
                    return None;
                }
                let schemas: &'a SchemaTable = self.schemas;
                self.plain_object(&schemas.get(target)?.node)
            }
            _ => None,
        }
    }
}

fn discriminates(objects: &[&ObjectSchema], property: &str) -> bool {
    let mut seen = HashSet::new();
    objects.iter().all(|obj| {
        if !obj.is_required(property) {
            return false;
        }
        match obj.properties.get(property) {
            Some(SchemaNode {
                kind: NodeKind::Literal(value),
                nullable: false,
                ..
            }) if is_scalar(value) => seen.insert(value.to_string()),
            _ => false,
        }
    })
}

/// Merge every inline object branch of an `allOf` into the position of the
/// first one. Later properties win; required sets are united.
fn merge_object_branches(members: &[SchemaNode]) -> Vec<SchemaNode> {
    let mut branches: Vec<SchemaNode> = Vec::with_capacity(members.len());
    let mut merged_at: Option<usize> = None;

    for member in members {
        if let NodeKind::Object(obj) = &member.kind {
            if let Some(i) = merged_at {
                if let NodeKind::Object(target) = &mut branches[i].kind {
                    merge_object(target, obj);
                }
                continue;
            }
            merged_at = Some(branches.len());
        }
        branches.push(member.clone());
    }
    branches
}

/// Strip required names the merged inline object does not declare and
/// return them. The object is dropped when it carried nothing else.
fn take_undeclared_required(branches: &mut Vec<SchemaNode>) -> Vec<String> {
    let Some(i) = branches
        .iter()
        .position(|b| matches!(b.kind, NodeKind::Object(_)))
    else {
        return Vec::new();
    };
    let NodeKind::Object(obj) = &mut branches[i].kind else {
        return Vec::new();
    };
    let ObjectSchema {
        properties,
        required,
        additional_properties,
    } = obj;
    let undeclared: Vec<String> = required
        .iter()
        .filter(|name| !properties.contains_key(*name))
        .cloned()
        .collect();
    required.retain(|name| properties.contains_key(name));

    let empty =
        properties.is_empty() && *additional_properties == AdditionalProperties::Unspecified;
    if empty && branches.len() > 1 && branches[i].default.is_none() {
        branches.remove(i);
    }
    undeclared
}

fn merge_object(target: &mut ObjectSchema, source: &ObjectSchema) {
    for (name, prop) in &source.properties {
        target.properties.insert(name.clone(), prop.clone());
    }
    target.required.extend(source.required.iter().cloned());
    if source.additional_properties != AdditionalProperties::Unspecified {
        target.additional_properties = source.additional_properties.clone();
    }
}

/// `z.object({ ... })` over pre-rendered `(key, expression)` fields.
pub fn object_expression(fields: &[(String, String)], indent: usize) -> String {
    if fields.is_empty() {
        return "z.object({})".to_string();
    }
    let pad = INDENT.repeat(indent + 1);
    let mut out = String::from("z.object({\n");
    for (key, expr) in fields {
        out.push_str(&format!("{pad}{key}: {expr},\n"));
    }
    out.push_str(&INDENT.repeat(indent));
    out.push_str("})");
    out
}

/// Array literal, one element per line when any element spans lines.
pub fn list_expression(items: &[String], indent: usize) -> String {
    if !items.iter().any(|item| item.contains('\n')) {
        return format!("[{}]", items.join(", "));
    }
    let pad = INDENT.repeat(indent + 1);
    let mut out = String::from("[\n");
    for item in items {
        out.push_str(&format!("{pad}{item},\n"));
    }
    out.push_str(&INDENT.repeat(indent));
    out.push(']');
    out
}

/// Base expression plus constraint suffixes for a primitive, in the order
/// format, pattern, length, numeric bounds, `multipleOf`.
pub fn primitive_expression(primitive: &PrimitiveSchema, coerce: bool) -> String {
    let constraints = &primitive.constraints;
    match primitive.kind {
        PrimitiveKind::String => {
            let mut expr = String::from("z.string()");
            if let Some(suffix) = primitive.format.as_deref().and_then(format_suffix) {
                expr.push_str(suffix);
            }
            if let Some(pattern) = &constraints.pattern {
                expr.push_str(&format!(".regex({})", regex_literal(pattern)));
            }
            expr.push_str(&length_suffix(constraints.min_length, constraints.max_length));
            expr
        }
        PrimitiveKind::Number | PrimitiveKind::Integer => {
            let mut expr = String::from(if coerce {
                "z.coerce.number()"
            } else {
                "z.number()"
            });
            if primitive.kind == PrimitiveKind::Integer {
                expr.push_str(".int()");
            }
            expr.push_str(&numeric_suffix(constraints));
            expr
        }
        PrimitiveKind::Boolean if coerce => BOOLEAN_PARAMETER.to_string(),
        PrimitiveKind::Boolean => "z.boolean()".to_string(),
        PrimitiveKind::Null => "z.null()".to_string(),
        PrimitiveKind::Unknown => FALLBACK.to_string(),
    }
}

fn format_suffix(format: &str) -> Option<&'static str> {
    match format {
        "email" => Some(".email()"),
        "uuid" => Some(".uuid()"),
        "uri" | "url" => Some(".url()"),
        "date-time" => Some(".datetime()"),
        "date" => Some(".date()"),
        "time" => Some(".time()"),
        "ipv4" => Some(".ip({ version: 'v4' })"),
        "ipv6" => Some(".ip({ version: 'v6' })"),
        "byte" => Some(".base64()"),
        _ => None,
    }
}

fn length_suffix(min: Option<u64>, max: Option<u64>) -> String {
    match (min, max) {
        (Some(min), Some(max)) if min == max => format!(".length({min})"),
        _ => {
            let mut out = String::new();
            if let Some(min) = min {
                out.push_str(&format!(".min({min})"));
            }
            if let Some(max) = max {
                out.push_str(&format!(".max({max})"));
            }
            out
        }
    }
}

fn numeric_suffix(constraints: &Constraints) -> String {
    let bounds = simplify_bounds(constraints);
    let mut out = String::new();
    if let Some(lower) = bounds.lower {
        let method = if lower.exclusive { "gt" } else { "min" };
        out.push_str(&format!(".{method}({})", js_number(lower.value)));
    }
    if let Some(upper) = bounds.upper {
        let method = if upper.exclusive { "lt" } else { "max" };
        out.push_str(&format!(".{method}({})", js_number(upper.value)));
    }
    if let Some(step) = constraints.multiple_of {
        out.push_str(&format!(".multipleOf({})", js_number(step)));
    }
    out
}

/// One side of a numeric range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    pub value: f64,
    pub exclusive: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NumericBounds {
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
}

/// Reduce each side of a range to a single bound. When both an inclusive
/// and an exclusive bound are declared, the exclusive one is kept if it is
/// at least as tight; otherwise the inclusive one is.
pub fn simplify_bounds(constraints: &Constraints) -> NumericBounds {
    let lower = match (constraints.minimum, constraints.exclusive_minimum) {
        (Some(min), Some(excl)) if excl < min => Some(Bound {
            value: min,
            exclusive: false,
        }),
        (_, Some(excl)) => Some(Bound {
            value: excl,
            exclusive: true,
        }),
        (Some(min), None) => Some(Bound {
            value: min,
            exclusive: false,
        }),
        (None, None) => None,
    };
    let upper = match (constraints.maximum, constraints.exclusive_maximum) {
        (Some(max), Some(excl)) if excl > max => Some(Bound {
            value: max,
            exclusive: false,
        }),
        (_, Some(excl)) => Some(Bound {
            value: excl,
            exclusive: true,
        }),
        (Some(max), None) => Some(Bound {
            value: max,
            exclusive: false,
        }),
        (None, None) => None,
    };
    NumericBounds { lower, upper }
}

/// JavaScript regex literal; unescaped `/` is escaped.
pub fn regex_literal(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 2);
    out.push('/');
    let mut escaped = false;
    for ch in pattern.chars() {
        match ch {
            '/' if !escaped => out.push_str("\\/"),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
        escaped = ch == '\\' && !escaped;
    }
    out.push('/');
    out
}

/// Integral values print without a fractional part.
pub fn js_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// JavaScript source for a JSON value.
pub fn js_value(value: &Value) -> String {
    match value {
        Value::String(s) => quote(s),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(js_value).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) if map.is_empty() => "{}".to_string(),
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", property_key(k), js_value(v)))
                .collect();
            format!("{{ {} }}", entries.join(", "))
        }
        other => other.to_string(),
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::Bool(_) | Value::Number(_) | Value::String(_))
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

    fn node(yaml: &str) -> SchemaNode {
        let schema: SchemaOrRef = serde_yaml_ng::from_str(yaml).unwrap();
        schema_or_ref_to_node(&schema)
    }

    struct Fixture {
        table: SchemaTable,
        symbols: Symbols,
    }

    impl Fixture {
        fn new(schemas: &[(&str, &str)]) -> Self {
            let raw: SchemaTable = schemas
                .iter()
                .map(|(name, yaml)| NamedSchema {
                    name: name.to_string(),
                    node: node(yaml),
                })
                .collect();
            let table: SchemaTable = raw
                .iter()
                .map(|s| NamedSchema {
                    name: s.name.clone(),
                    node: resolve_node(&s.node, &raw).unwrap(),
                })
                .collect();
            let order = order_declarations(&DependencyGraph::build(&table));
            let mut registry = NameRegistry::new();
            let symbols = Symbols::assign(&table, &order, Casing::PascalCase, &mut registry);
            Self { table, symbols }
        }

        fn render(&self, name: &str) -> (String, Vec<Diagnostic>) {
            let mut generator = ExpressionGenerator::new(&self.table, &self.symbols);
            let expr = generator.generate(&self.table.get(name).unwrap().node, name, 0);
            (expr, generator.into_diagnostics())
        }
    }

    fn render(yaml: &str) -> String {
        Fixture::new(&[("Test", yaml)]).render("Test").0
    }

    #[test]
    fn test_string_suffix_order() {
        let yaml = "type: string\nformat: email\nminLength: 3\nmaxLength: 3\npattern: '^a/b$'";
        assert_eq!(render(yaml), "z.string().email().regex(/^a\\/b$/).length(3)");
    }

    #[test]
    fn test_string_lengths() {
        assert_eq!(
            render("type: string\nminLength: 1\nmaxLength: 64"),
            "z.string().min(1).max(64)"
        );
        assert_eq!(render("type: string\nformat: int64"), "z.string()");
    }

    #[test]
    fn test_exclusive_bound_drops_inclusive() {
        assert_eq!(
            render("type: number\nmaximum: 5\nexclusiveMaximum: 5"),
            "z.number().lt(5)"
        );
    }

    #[test]
    fn test_boolean_exclusive_form() {
        assert_eq!(
            render("type: integer\nminimum: 1\nexclusiveMinimum: true\nmultipleOf: 2"),
            "z.number().int().gt(1).multipleOf(2)"
        );
    }

    #[test]
    fn test_simplify_bounds_rule() {
        let tighter_exclusive = Constraints {
            minimum: Some(0.0),
            exclusive_minimum: Some(2.0),
            maximum: Some(10.0),
            exclusive_maximum: Some(10.0),
            ..Constraints::default()
        };
        assert_eq!(
            simplify_bounds(&tighter_exclusive),
            NumericBounds {
                lower: Some(Bound {
                    value: 2.0,
                    exclusive: true
                }),
                upper: Some(Bound {
                    value: 10.0,
                    exclusive: true
                }),
            }
        );

        let tighter_inclusive = Constraints {
            minimum: Some(3.0),
            exclusive_minimum: Some(2.0),
            maximum: Some(5.0),
            exclusive_maximum: Some(7.0),
            ..Constraints::default()
        };
        assert_eq!(
            simplify_bounds(&tighter_inclusive),
            NumericBounds {
                lower: Some(Bound {
                    value: 3.0,
                    exclusive: false
                }),
                upper: Some(Bound {
                    value: 5.0,
                    exclusive: false
                }),
            }
        );
    }

    #[test]
    fn test_default_then_nullable() {
        assert_eq!(
            render("type: string\nnullable: true\ndefault: hi"),
            "z.string().default('hi').nullable()"
        );
        assert_eq!(render("type: [number, 'null']"), "z.number().nullable()");
    }

    #[test]
    fn test_object_optional_and_quoted_keys() {
        let yaml = r#"
type: object
required: [id]
properties:
  id: { type: integer }
  content-type: { type: string }
additionalProperties: false
"#;
        assert_eq!(
            render(yaml),
            "z.object({\n  id: z.number().int(),\n  'content-type': z.string().optional(),\n}).strict()"
        );
    }

    #[test]
    fn test_additional_properties() {
        assert_eq!(
            render("additionalProperties: { type: string }"),
            "z.record(z.string(), z.string())"
        );
        assert_eq!(
            render("type: object\nadditionalProperties: true"),
            "z.record(z.string(), z.any())"
        );
        assert_eq!(
            render(
                "type: object\nrequired: [a]\nproperties:\n  a: { type: boolean }\nadditionalProperties: { type: number }"
            ),
            "z.object({\n  a: z.boolean(),\n}).catchall(z.number())"
        );
    }

    #[test]
    fn test_array_constraints() {
        assert_eq!(
            render("type: array\nitems: { type: string }\nminItems: 1\nuniqueItems: true"),
            format!("z.array(z.string()).min(1){UNIQUE_ITEMS}")
        );
        assert_eq!(
            render("type: array\nitems: { type: integer }\nminItems: 2\nmaxItems: 2"),
            "z.array(z.number().int()).length(2)"
        );
    }

    #[test]
    fn test_enums_and_literals() {
        assert_eq!(render("type: string\nenum: [a, b]"), "z.enum(['a', 'b'])");
        assert_eq!(
            render("enum: [1, two]"),
            "z.union([z.literal(1), z.literal('two')])"
        );
        assert_eq!(render("const: 42"), "z.literal(42)");
        assert_eq!(render("enum: [a, b, null]"), "z.enum(['a', 'b']).nullable()");
    }

    #[test]
    fn test_object_literal_falls_back() {
        let (expr, diagnostics) = Fixture::new(&[("C", "const: { a: 1 }")]).render("C");
        assert_eq!(expr, FALLBACK);
        assert_eq!(
            diagnostics,
            vec![Diagnostic::UnsupportedLiteral {
                location: "C".to_string()
            }]
        );
    }

    #[test]
    fn test_negation_is_permissive_with_diagnostic() {
        let (expr, diagnostics) = Fixture::new(&[("N", "not: { type: number }")]).render("N");
        assert_eq!(expr, "z.any()");
        assert_eq!(
            diagnostics,
            vec![Diagnostic::NegationFallback {
                location: "N".to_string()
            }]
        );
    }

    #[test]
    fn test_negation_with_enum_uses_same_fallback() {
        let (expr, diagnostics) =
            Fixture::new(&[("N", "type: string\nnot: { enum: [a, b] }")]).render("N");
        assert_eq!(expr, "z.any()");
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_empty_composition_is_permissive_with_diagnostic() {
        let (expr, diagnostics) = Fixture::new(&[("E", "oneOf: []")]).render("E");
        assert_eq!(expr, "z.any()");
        assert_eq!(
            diagnostics,
            vec![Diagnostic::MalformedComposition {
                location: "E".to_string(),
                keyword: "oneOf".to_string(),
            }]
        );
    }

    #[test]
    fn test_plain_union_of_primitives() {
        assert_eq!(
            render("oneOf: [{ type: string }, { type: number }]"),
            "z.union([z.string(), z.number()])"
        );
        assert_eq!(render("anyOf: [{ type: string }]"), "z.string()");
    }

    #[test]
    fn test_discriminated_union_through_references() {
        let fixture = Fixture::new(&[
            (
                "Cat",
                "type: object\nrequired: [kind]\nproperties:\n  kind: { const: cat }",
            ),
            (
                "Dog",
                "type: object\nrequired: [kind]\nproperties:\n  kind: { const: dog }",
            ),
            (
                "Pet",
                "oneOf:\n  - $ref: '#/components/schemas/Cat'\n  - $ref: '#/components/schemas/Dog'",
            ),
        ]);
        let (expr, diagnostics) = fixture.render("Pet");
        assert_eq!(
            expr,
            "z.discriminatedUnion('kind', [CatSchema, DogSchema])"
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_shared_literal_with_duplicate_values_is_plain_union() {
        let fixture = Fixture::new(&[(
            "Pet",
            r#"
oneOf:
  - type: object
    required: [kind]
    properties: { kind: { const: cat } }
  - type: object
    required: [kind]
    properties: { kind: { const: cat } }
"#,
        )]);
        assert!(fixture.render("Pet").0.starts_with("z.union([\n"));
    }

    #[test]
    fn test_lazy_member_prevents_discriminated_union() {
        let fixture = Fixture::new(&[
            (
                "Cat",
                "type: object\nrequired: [kind]\nproperties:\n  kind: { const: cat }\n  friend: { $ref: '#/components/schemas/Pet' }",
            ),
            (
                "Dog",
                "type: object\nrequired: [kind]\nproperties:\n  kind: { const: dog }",
            ),
            (
                "Pet",
                "oneOf:\n  - $ref: '#/components/schemas/Cat'\n  - $ref: '#/components/schemas/Dog'\ndiscriminator:\n  propertyName: kind",
            ),
        ]);
        assert_eq!(fixture.render("Pet").0, "z.union([CatSchema, DogSchema])");
    }

    #[test]
    fn test_all_of_merges_inline_objects() {
        let fixture = Fixture::new(&[
            ("Base", "type: object\nproperties:\n  id: { type: string }"),
            (
                "Named",
                r#"
allOf:
  - $ref: '#/components/schemas/Base'
  - type: object
    properties:
      name: { type: string }
properties:
  nickname: { type: string }
"#,
            ),
        ]);
        assert_eq!(
            fixture.render("Named").0,
            "BaseSchema.and(z.object({\n  name: z.string().optional(),\n  nickname: z.string().optional(),\n}))"
        );
    }

    #[test]
    fn test_all_of_single_branch_unwrapped_and_nullability_propagates() {
        let yaml = r#"
allOf:
  - type: object
    required: [a]
    properties: { a: { type: string } }
  - type: object
    nullable: true
    properties: { b: { type: string } }
"#;
        assert_eq!(
            render(yaml),
            "z.object({\n  a: z.string(),\n  b: z.string().optional(),\n}).nullable()"
        );
    }

    #[test]
    fn test_references_are_recorded() {
        let fixture = Fixture::new(&[
            ("B", "type: string"),
            ("A", "type: array\nitems: { $ref: '#/components/schemas/B' }"),
        ]);
        let mut generator = ExpressionGenerator::new(&fixture.table, &fixture.symbols);
        let expr = generator.generate(&fixture.table.get("A").unwrap().node, "A", 0);
        assert_eq!(expr, "z.array(BSchema)");
        assert_eq!(
            generator.take_references().into_iter().collect::<Vec<_>>(),
            vec!["B".to_string()]
        );
        assert!(generator.take_references().is_empty());
    }

    #[test]
    fn test_parameter_numbers_coerce() {
        let table = SchemaTable::new();
        let symbols = Symbols::default();
        let mut generator = ExpressionGenerator::new(&table, &symbols);
        assert_eq!(
            generator.generate_parameter(&node("type: integer\nmaximum: 100"), "limit", 0),
            "z.coerce.number().int().max(100)"
        );
        assert_eq!(
            generator.generate_parameter(&node("type: string"), "tag", 0),
            "z.string()"
        );
    }

    #[test]
    fn test_single_member_union_applies_nullable_once() {
        assert_eq!(
            render("nullable: true\nanyOf: [{ type: string, nullable: true }]"),
            "z.string().nullable()"
        );
        assert_eq!(
            render("oneOf: [{ type: string, nullable: true, default: x }]"),
            "z.string().default('x').nullable()"
        );
    }

    #[test]
    fn test_all_of_required_without_owning_branch_is_dropped() {
        let fixture = Fixture::new(&[
            ("Base", "type: object\nproperties:\n  id: { type: string }"),
            (
                "Item",
                "allOf:\n  - $ref: '#/components/schemas/Base'\nrequired: [id, ghost]",
            ),
        ]);
        let (expr, diagnostics) = fixture.render("Item");
        assert_eq!(expr, "BaseSchema.required({ id: true })");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_parameter_booleans_and_array_items() {
        let table = SchemaTable::new();
        let symbols = Symbols::default();
        let mut generator = ExpressionGenerator::new(&table, &symbols);
        assert_eq!(
            generator.generate_parameter(&node("type: boolean"), "active", 0),
            BOOLEAN_PARAMETER
        );
        assert_eq!(
            generator.generate_parameter(&node("type: array\nitems: { type: number }"), "ids", 0),
            "z.array(z.coerce.number())"
        );
        assert_eq!(generator.generate(&node("type: boolean"), "flag", 0), "z.boolean()");
    }

    #[test]
    fn test_js_helpers() {
        assert_eq!(js_number(5.0), "5");
        assert_eq!(js_number(0.5), "0.5");
        assert_eq!(js_number(-3.0), "-3");
        assert_eq!(regex_literal("^\\/ok/$"), "/^\\/ok\\/$/");
        assert_eq!(
            js_value(&serde_json::json!({"a": [1, "x"], "b-c": true})),
            "{ a: [1, 'x'], 'b-c': true }"
        );
    }
}
