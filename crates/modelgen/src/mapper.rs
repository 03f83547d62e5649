//! Schema to model projection.
//!
//! Walks a [`ResolvedGraph`] and produces a [`Model`]. Nodes that need a name
//! in the target language (objects, enumerations, definitions, reference
//! targets) become [`GeneratedType`]s; everything else is described inline by
//! a [`TypeDescriptor`].

use crate::error::{Error, Result};
use crate::ir::{
    Constraints, EnumMember, Field, GeneratedKind, GeneratedType, Model, Primitive, TypeDescriptor, TypeId,
    TypeRef,
};
use crate::naming::{NameRegistry, NamingRules, Scope, to_pascal_case};
use crate::node::{Additional, Items, NodeId, NodeKind, ObjectShape, SchemaGraph};
use crate::options::GeneratorOptions;
use crate::resolve::ResolvedGraph;
use serde_json::Value;
use std::collections::HashMap;

/// Project a resolved schema onto generated types.
///
/// The root schema is named `options.root_name`. Definitions are named in
/// document order before anything else, so their names do not depend on
/// where they are first used.
pub fn map_model(
    resolved: &ResolvedGraph<'_>,
    options: &GeneratorOptions,
    rules: NamingRules,
) -> Result<Model> {
    let graph = resolved.graph();
    check_constraints(graph)?;

    let mut mapper = Mapper {
        resolved,
        graph,
        options,
        names: NameRegistry::new(rules, options.snake_case_fields),
        types: Vec::new(),
        by_node: HashMap::new(),
        variants: HashMap::new(),
        merging: Vec::new(),
    };

    let root = graph.root();
    mapper
        .names
        .type_name(&graph.node(root).pointer, &options.root_name);
    for &definition in graph.definitions() {
        if !mapper.collapses(definition) && !mapper.forbidden(definition) {
            let candidate = mapper.candidate(definition, "");
            mapper
                .names
                .type_name(&graph.node(definition).pointer, &candidate);
        }
    }

    let root = mapper.named_type(root, &options.root_name)?;
    for &definition in graph.definitions() {
        if mapper.collapses(definition) {
            tracing::debug!(
                pointer = %graph.node(definition).pointer,
                "single-value enumeration collapsed to a literal"
            );
            continue;
        }
        if mapper.forbidden(definition) {
            continue;
        }
        mapper.named_type(definition, "")?;
    }

    tracing::debug!(types = mapper.types.len(), "mapped schema");
    Ok(Model {
        types: mapper.types,
        root,
        names: mapper.names,
    })
}

/// Constraints no projection can satisfy.
fn check_constraints(graph: &SchemaGraph) -> Result<()> {
    for (_, node) in graph.iter() {
        if let (NodeKind::Enum(values), Some(constant)) = (&node.kind, &node.constant) {
            if values.as_slice() != std::slice::from_ref(constant) {
                return Err(Error::conflict(
                    node.pointer.clone(),
                    format!(
                        "`const` {constant} conflicts with `enum` of {} value(s)",
                        values.len()
                    ),
                ));
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Object,
    Enumeration,
    Alias,
}

#[derive(Debug, PartialEq)]
enum EnumClass<'v> {
    NullOnly,
    Single(&'v Value),
    /// Two or more values of one scalar kind.
    Uniform,
    Mixed,
}

fn classify(values: &[Value]) -> EnumClass<'_> {
    let mut present = values.iter().filter(|v| !v.is_null());
    let Some(first) = present.next() else {
        return EnumClass::NullOnly;
    };
    let kind = scalar_kind(first);
    let mut count = 1;
    for value in present {
        if kind.is_none() || scalar_kind(value) != kind {
            return EnumClass::Mixed;
        }
        count += 1;
    }
    match (count, kind) {
        (1, _) => EnumClass::Single(first),
        (_, Some(_)) => EnumClass::Uniform,
        _ => EnumClass::Mixed,
    }
}

/// A `const` or enumeration value as a type. Arrays and objects have no
/// literal spelling in any target, so they widen to their structural type.
fn literal(value: &Value) -> TypeDescriptor {
    match value {
        Value::Array(_) => TypeDescriptor::Sequence(Box::new(TypeDescriptor::ANY)),
        Value::Object(_) => TypeDescriptor::Mapping(Box::new(TypeDescriptor::ANY)),
        scalar => TypeDescriptor::Literal(scalar.clone()),
    }
}

fn scalar_kind(value: &Value) -> Option<Primitive> {
    match value {
        Value::String(_) => Some(Primitive::String),
        Value::Number(_) => Some(Primitive::Number),
        Value::Bool(_) => Some(Primitive::Boolean),
        _ => None,
    }
}

/// One property contributing to an object type.
struct Property {
    wire_name: String,
    node: NodeId,
    ty: TypeDescriptor,
}

struct Mapper<'a, 'g> {
    resolved: &'a ResolvedGraph<'g>,
    graph: &'g SchemaGraph,
    options: &'a GeneratorOptions,
    names: NameRegistry,
    types: Vec<GeneratedType>,
    by_node: HashMap<NodeId, TypeId>,
    /// Union branches merged with the object keywords beside the union.
    variants: HashMap<(NodeId, NodeId), TypeId>,
    /// `allOf` nodes being merged, innermost last.
    merging: Vec<NodeId>,
}

impl Mapper<'_, '_> {
    fn candidate(&self, id: NodeId, hint: &str) -> String {
        let node = self.graph.node(id);
        node.title
            .clone()
            .or_else(|| node.definition_key.clone())
            .unwrap_or_else(|| hint.to_string())
    }

    /// Single-value enumerations and `const` schemas reduce to a literal.
    fn collapsed_literal(&self, id: NodeId) -> Option<TypeDescriptor> {
        match &self.graph.node(id).kind {
            NodeKind::Const(value) => Some(literal(value)),
            NodeKind::Enum(values) if self.options.collapse_single_enums => match classify(values) {
                EnumClass::Single(value) => Some(literal(value)),
                _ => None,
            },
            _ => None,
        }
    }

    fn collapses(&self, id: NodeId) -> bool {
        self.collapsed_literal(id).is_some()
    }

    fn forbidden(&self, id: NodeId) -> bool {
        self.graph.node(id).kind == NodeKind::Never
    }

    fn nullable(&self, id: NodeId) -> bool {
        let node = self.graph.node(id);
        node.nullable
            || matches!(&node.kind, NodeKind::Enum(values) if values.iter().any(Value::is_null))
    }

    /// The single constraining branch of an `allOf` that adds nothing else.
    fn transparent(&self, id: NodeId) -> Option<NodeId> {
        let NodeKind::AllOf { branches, own: None } = &self.graph.node(id).kind else {
            return None;
        };
        let mut constraining = branches
            .iter()
            .filter(|b| self.graph.node(**b).kind != NodeKind::Any);
        match (constraining.next(), constraining.next()) {
            (Some(only), None) => Some(*only),
            _ => None,
        }
    }

    fn shape(&self, id: NodeId) -> Shape {
        match &self.graph.node(id).kind {
            NodeKind::Object(shape) if !shape.is_open_map() => Shape::Object,
            NodeKind::AllOf { .. } if self.transparent(id).is_none() => Shape::Object,
            NodeKind::Enum(values) => match classify(values) {
                EnumClass::Uniform => Shape::Enumeration,
                EnumClass::Single(_) if !self.options.collapse_single_enums => Shape::Enumeration,
                _ => Shape::Alias,
            },
            _ => Shape::Alias,
        }
    }

    /// The type generated for node `id`, created on first request.
    fn named_type(&mut self, id: NodeId, hint: &str) -> Result<TypeId> {
        if let Some(&existing) = self.by_node.get(&id) {
            return Ok(existing);
        }
        let graph = self.graph;
        let node = graph.node(id);
        let candidate = self.candidate(id, hint);
        let name = self.names.type_name(&node.pointer, &candidate);

        let type_id = TypeId(self.types.len());
        self.types.push(GeneratedType {
            id: type_id,
            name: name.clone(),
            pointer: node.pointer.clone(),
            description: None,
            base: None,
            kind: GeneratedKind::Alias {
                target: TypeDescriptor::ANY,
            },
        });
        self.by_node.insert(id, type_id);

        let shape = self.shape(id);
        let kind = match shape {
            Shape::Object => GeneratedKind::Object {
                fields: self.fields(id)?,
            },
            Shape::Enumeration => GeneratedKind::Enumeration {
                members: self.members(id),
            },
            Shape::Alias => GeneratedKind::Alias {
                target: self.descriptor(id, &name)?,
            },
        };

        let generated = &mut self.types[type_id.0];
        generated.kind = kind;
        if self.options.include_docs {
            generated.description = node.description.clone();
        }
        if shape == Shape::Object {
            generated.base = self.options.base_class.clone();
        }
        Ok(type_id)
    }

    fn named_descriptor(&mut self, id: NodeId, hint: &str, back_reference: bool) -> Result<TypeDescriptor> {
        let r = TypeRef {
            id: self.named_type(id, hint)?,
            back_reference,
        };
        Ok(match self.shape(id) {
            Shape::Object => TypeDescriptor::Object(r),
            Shape::Enumeration => TypeDescriptor::Enumeration(r),
            Shape::Alias => TypeDescriptor::Alias(r),
        })
    }

    /// Descriptor for node `id` at a use site, nullability included.
    fn descriptor(&mut self, id: NodeId, hint: &str) -> Result<TypeDescriptor> {
        if let Some(branch) = self.transparent(id) {
            let inner = self.descriptor(branch, hint)?;
            let inner = self.constrained(id, inner);
            return Ok(if self.nullable(id) { inner.optional() } else { inner });
        }
        let graph = self.graph;
        let base = match (&graph.node(id).kind, self.shape(id)) {
            (NodeKind::Reference(_), _) => return self.reference(id),
            (_, Shape::Object | Shape::Enumeration) => self.named_descriptor(id, hint, false)?,
            (_, Shape::Alias) => self.structural(id, hint)?,
        };
        let base = self.constrained(id, base);
        Ok(if self.nullable(id) { base.optional() } else { base })
    }

    /// Attach the validation keywords of node `id` that apply to `ty`.
    fn constrained(&self, id: NodeId, ty: TypeDescriptor) -> TypeDescriptor {
        let constraints = &self.graph.node(id).constraints;
        if constraints.is_empty() {
            return ty;
        }
        let (base, existing) = ty.split_constraints();
        let kept = constraints.for_type(&base);
        if kept != *constraints {
            tracing::warn!(
                pointer = %self.graph.node(id).pointer,
                "validation keywords that do not apply to the mapped type are not rendered"
            );
        }
        let kept = match existing {
            Some(existing) => kept.intersect(existing),
            None => kept,
        };
        base.constrained(kept)
    }

    fn reference(&mut self, id: NodeId) -> Result<TypeDescriptor> {
        let graph = self.graph;
        let node = graph.node(id);
        if self.resolved.link(id).is_none() {
            let reference = match &node.kind {
                NodeKind::Reference(r) => r.clone(),
                _ => String::new(),
            };
            return Err(Error::UnresolvedReference {
                reference,
                pointer: node.pointer.clone(),
            });
        }
        let target = self.resolved.target(id);
        let back_reference = self.resolved.reaches_back(id);

        if let Some(literal) = self.collapsed_literal(target) {
            let nullable = node.nullable || self.nullable(target);
            return Ok(if nullable { literal.optional() } else { literal });
        }

        let hint = last_token(&graph.node(target).pointer);
        let described = self.named_descriptor(target, &hint, back_reference)?;
        let described = self.constrained(id, described);
        // Alias types carry their own nullability.
        let nullable = node.nullable || (self.shape(target) != Shape::Alias && self.nullable(target));
        Ok(if nullable { described.optional() } else { described })
    }

    /// Descriptor for a node that gets no type of its own.
    fn structural(&mut self, id: NodeId, hint: &str) -> Result<TypeDescriptor> {
        let graph = self.graph;
        Ok(match &graph.node(id).kind {
            NodeKind::String => TypeDescriptor::Primitive(Primitive::String),
            NodeKind::Integer => TypeDescriptor::Primitive(Primitive::Integer),
            NodeKind::Number => TypeDescriptor::Primitive(Primitive::Number),
            NodeKind::Boolean => TypeDescriptor::Primitive(Primitive::Boolean),
            NodeKind::Null => TypeDescriptor::Primitive(Primitive::Null),
            NodeKind::Any => TypeDescriptor::ANY,
            NodeKind::Never => {
                return Err(Error::conflict(
                    graph.node(id).pointer.clone(),
                    "the `false` schema admits no value",
                ));
            }
            NodeKind::Const(value) => literal(value),
            NodeKind::Enum(values) => match classify(values) {
                EnumClass::NullOnly => TypeDescriptor::Primitive(Primitive::Null),
                EnumClass::Single(value) => literal(value),
                EnumClass::Mixed => {
                    collapse_union(values.iter().filter(|v| !v.is_null()).map(literal).collect())
                }
                EnumClass::Uniform => self.named_descriptor(id, hint, false)?,
            },
            NodeKind::Array(items) => {
                let item_hint = format!("{hint}Item");
                let item = match items {
                    Items::Unspecified => TypeDescriptor::ANY,
                    // `items: false` admits only the empty array.
                    Items::Single(item) if self.forbidden(*item) => {
                        return Ok(TypeDescriptor::Sequence(Box::new(TypeDescriptor::ANY))
                            .constrained(Constraints {
                                max_items: Some(0),
                                ..Constraints::default()
                            }));
                    }
                    Items::Single(item) => self.descriptor(*item, &item_hint)?,
                    Items::Tuple(items) => {
                        let mut branches = Vec::with_capacity(items.len());
                        for (i, item) in items.iter().enumerate() {
                            branches.push(self.descriptor(*item, &format!("{item_hint}{}", i + 1))?);
                        }
                        collapse_union(branches)
                    }
                };
                TypeDescriptor::Sequence(Box::new(item))
            }
            NodeKind::Object(shape) if shape.is_open_map() => {
                let value = match shape.additional {
                    Additional::Schema(value) => self.descriptor(value, &format!("{hint}Value"))?,
                    _ => TypeDescriptor::ANY,
                };
                TypeDescriptor::Mapping(Box::new(value))
            }
            NodeKind::Object(_) | NodeKind::AllOf { .. } => match self.transparent(id) {
                Some(branch) => self.descriptor(branch, hint)?,
                None => self.named_descriptor(id, hint, false)?,
            },
            NodeKind::Union { branches, own: None } => self.union(branches, hint)?,
            NodeKind::Union {
                branches,
                own: Some(own),
            } => self.merged_union(id, branches, own, hint)?,
            NodeKind::Reference(_) => self.reference(id)?,
        })
    }

    /// Branches in schema order; null branches become optionality.
    fn union(&mut self, branches: &[NodeId], hint: &str) -> Result<TypeDescriptor> {
        let mut mapped = Vec::with_capacity(branches.len());
        let mut nullable = false;
        for (i, branch) in branches.iter().enumerate() {
            if self.graph.node(self.resolved.target(*branch)).kind == NodeKind::Never {
                continue;
            }
            match self.descriptor(*branch, &format!("{hint}{}", i + 1))? {
                TypeDescriptor::Primitive(Primitive::Null) | TypeDescriptor::Literal(Value::Null) => {
                    nullable = true;
                }
                TypeDescriptor::Optional(inner) => {
                    nullable = true;
                    mapped.push(*inner);
                }
                TypeDescriptor::Union(nested) => mapped.extend(nested),
                other => mapped.push(other),
            }
        }
        if mapped.is_empty() {
            return Ok(TypeDescriptor::Primitive(Primitive::Null));
        }
        let union = collapse_union(mapped);
        Ok(if nullable { union.optional() } else { union })
    }

    /// A union with object keywords beside it: every branch is merged with
    /// them into an object type of its own.
    fn merged_union(
        &mut self,
        id: NodeId,
        branches: &[NodeId],
        own: &ObjectShape,
        hint: &str,
    ) -> Result<TypeDescriptor> {
        let mut variants = Vec::with_capacity(branches.len());
        let mut nullable = false;
        for (i, &branch) in branches.iter().enumerate() {
            match self.graph.node(self.resolved.target(branch)).kind {
                NodeKind::Never => continue,
                NodeKind::Null => {
                    nullable = true;
                    continue;
                }
                _ => {}
            }
            let variant = self.merged_variant(id, branch, own, &format!("{hint}{}", i + 1))?;
            variants.push(TypeDescriptor::Object(TypeRef::new(variant)));
        }
        if variants.is_empty() {
            return Ok(TypeDescriptor::Primitive(Primitive::Null));
        }
        let union = collapse_union(variants);
        Ok(if nullable { union.optional() } else { union })
    }

    fn merged_variant(
        &mut self,
        union: NodeId,
        branch: NodeId,
        own: &ObjectShape,
        hint: &str,
    ) -> Result<TypeId> {
        if let Some(&existing) = self.variants.get(&(union, branch)) {
            return Ok(existing);
        }
        let graph = self.graph;
        let node = graph.node(branch);
        let candidate = self.candidate(branch, hint);
        let name = self
            .names
            .type_name(&format!("{}/merged", node.pointer), &candidate);

        let type_id = TypeId(self.types.len());
        self.types.push(GeneratedType {
            id: type_id,
            name,
            pointer: node.pointer.clone(),
            description: node.description.clone().filter(|_| self.options.include_docs),
            base: self.options.base_class.clone(),
            kind: GeneratedKind::Object { fields: Vec::new() },
        });
        self.variants.insert((union, branch), type_id);

        let mut properties = Vec::new();
        let mut required = Vec::new();
        self.collect_shape(own, &mut properties, &mut required)?;
        self.collect(branch, &mut properties, &mut required)?;
        let fields = self.build_fields(properties, &required);
        self.types[type_id.0].kind = GeneratedKind::Object { fields };
        Ok(type_id)
    }

    /// Properties of an object or merged `allOf`, plus its required names.
    fn collect(&mut self, id: NodeId, out: &mut Vec<Property>, required: &mut Vec<String>) -> Result<()> {
        let graph = self.graph;
        let id = self.resolved.target(id);
        let node = graph.node(id);
        match &node.kind {
            NodeKind::Object(shape) => self.collect_shape(shape, out, required)?,
            NodeKind::AllOf { branches, own } => {
                if self.merging.contains(&id) {
                    return Err(Error::conflict(node.pointer.clone(), "`allOf` includes itself"));
                }
                self.merging.push(id);
                for branch in branches {
                    self.collect(*branch, out, required)?;
                }
                if let Some(shape) = own {
                    self.collect_shape(shape, out, required)?;
                }
                self.merging.pop();
            }
            NodeKind::Any => {}
            _ => {
                return Err(Error::conflict(
                    node.pointer.clone(),
                    "merged branch is not an object schema",
                ));
            }
        }
        Ok(())
    }

    /// Declared properties of one object shape. A property whose schema is
    /// `false` is forbidden and gets no field.
    fn collect_shape(
        &mut self,
        shape: &ObjectShape,
        out: &mut Vec<Property>,
        required: &mut Vec<String>,
    ) -> Result<()> {
        for (name, property) in &shape.properties {
            if self.forbidden(*property) {
                tracing::debug!(property = %name, "forbidden property left out");
                continue;
            }
            let ty = self.descriptor(*property, &to_pascal_case(name))?;
            self.add_property(out, name, *property, ty)?;
        }
        required.extend(shape.required.iter().cloned());
        Ok(())
    }

    fn add_property(
        &self,
        out: &mut Vec<Property>,
        name: &str,
        node: NodeId,
        ty: TypeDescriptor,
    ) -> Result<()> {
        let Some(existing) = out.iter_mut().find(|p| p.wire_name == name) else {
            out.push(Property {
                wire_name: name.to_string(),
                node,
                ty,
            });
            return Ok(());
        };
        if existing.ty == ty || ty.is_any() {
            return Ok(());
        }
        if existing.ty.is_any() {
            existing.ty = ty;
            existing.node = node;
            return Ok(());
        }
        let (base, constraints) = ty.split_constraints();
        let (existing_base, existing_constraints) = existing.ty.split_constraints();
        if base == existing_base {
            let merged = match (existing_constraints, constraints) {
                (Some(a), Some(b)) => a.intersect(b),
                (a, b) => a.or(b).cloned().unwrap_or_default(),
            };
            existing.ty = base.constrained(merged);
            return Ok(());
        }
        Err(Error::conflict(
            self.graph.node(node).pointer.clone(),
            format!(
                "property `{name}` is also declared at {} with an incompatible type",
                self.graph.node(existing.node).pointer
            ),
        ))
    }

    fn fields(&mut self, id: NodeId) -> Result<Vec<Field>> {
        let mut properties = Vec::new();
        let mut required = Vec::new();
        self.collect(id, &mut properties, &mut required)?;
        Ok(self.build_fields(properties, &required))
    }

    fn build_fields(&mut self, properties: Vec<Property>, required: &[String]) -> Vec<Field> {
        let mut scope = Scope::default();
        let mut fields = Vec::with_capacity(properties.len());
        for Property { wire_name, node, ty } in properties {
            let schema = self.graph.node(node);
            let is_required = required.contains(&wire_name);
            let default = schema.default.clone().or_else(|| match &ty {
                TypeDescriptor::Literal(value) if self.options.collapse_single_enums => {
                    Some(value.clone())
                }
                _ => None,
            });
            // A title that named a generated type is not repeated on the field.
            let title = schema.title.clone().filter(|_| ty.named().is_none());
            let ty = if is_required { ty } else { ty.optional() };
            let docs = self.options.include_docs;
            fields.push(Field {
                name: self.names.field_name(&mut scope, &wire_name),
                wire_name,
                pointer: schema.pointer.clone(),
                ty,
                required: is_required,
                default,
                description: schema.description.clone().filter(|_| docs),
                title: title.filter(|_| docs),
                examples: if docs { schema.examples.clone() } else { Vec::new() },
            });
        }
        fields
    }

    fn members(&self, id: NodeId) -> Vec<EnumMember> {
        let NodeKind::Enum(values) = &self.graph.node(id).kind else {
            return Vec::new();
        };
        let mut scope = Scope::default();
        values
            .iter()
            .filter(|v| !v.is_null())
            .map(|value| EnumMember {
                name: self.names.member_name(&mut scope, value),
                value: value.clone(),
            })
            .collect()
    }
}

/// Drop repeated branches; a single branch is not a union.
fn collapse_union(branches: Vec<TypeDescriptor>) -> TypeDescriptor {
    let mut unique: Vec<TypeDescriptor> = Vec::with_capacity(branches.len());
    for branch in branches {
        if !unique.contains(&branch) {
            unique.push(branch);
        }
    }
    if unique.len() == 1 {
        unique.remove(0)
    } else {
        TypeDescriptor::Union(unique)
    }
}

fn last_token(pointer: &str) -> String {
    let token = pointer.rsplit('/').next().unwrap_or(pointer);
    to_pascal_case(&token.replace("~1", "/").replace("~0", "~"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::MemberCase;
    use crate::resolve::resolve;
    use serde_json::json;

    const RULES: NamingRules = NamingRules {
        keywords: &["in", "None"],
        reserved_types: &["Any"],
        reserved_fields: &[],
        member_case: MemberCase::Value,
        private_underscore: true,
        snake_case_fields: false,
    };

    fn map_with(doc: Value, options: &GeneratorOptions) -> Result<Model> {
        let graph = SchemaGraph::from_value(&doc)?;
        let resolved = resolve(&graph)?;
        map_model(&resolved, options, RULES)
    }

    fn map(doc: Value) -> Model {
        map_with(doc, &GeneratorOptions::default()).unwrap()
    }

    fn field<'m>(model: &'m Model, ty: &str, name: &str) -> &'m Field {
        model
            .find(ty)
            .unwrap_or_else(|| panic!("no type {ty}"))
            .fields()
            .iter()
            .find(|f| f.wire_name == name)
            .unwrap_or_else(|| panic!("no field {name} on {ty}"))
    }

    #[test]
    fn required_and_optional_fields() {
        let model = map(json!({
            "title": "Task",
            "type": "object",
            "properties": {
                "id": { "type": "string" },
                "retries": { "type": "integer", "default": 3 },
                "note": { "type": "string" }
            },
            "required": ["id"]
        }));
        let root = model.get(model.root());
        assert_eq!(root.name, "Model");

        let id = field(&model, "Model", "id");
        assert!(id.required);
        assert_eq!(id.ty, TypeDescriptor::Primitive(Primitive::String));

        let retries = field(&model, "Model", "retries");
        assert!(!retries.required);
        assert!(retries.ty.is_optional());
        assert_eq!(retries.default, Some(json!(3)));

        let note = field(&model, "Model", "note");
        assert_eq!(note.default, None);
        assert!(note.has_default());
    }

    #[test]
    fn single_value_enum_collapses_only_when_enabled() {
        let doc = json!({
            "type": "object",
            "properties": { "mode": { "$ref": "#/definitions/Mode" } },
            "required": ["mode"],
            "definitions": { "Mode": { "title": "Mode", "enum": ["chat"] } }
        });

        let collapsed = map(doc.clone());
        assert!(collapsed.find("Mode").is_none());
        let mode = field(&collapsed, "Model", "mode");
        assert_eq!(mode.ty, TypeDescriptor::Literal(json!("chat")));
        assert_eq!(mode.default, Some(json!("chat")));

        let options = GeneratorOptions {
            collapse_single_enums: false,
            ..GeneratorOptions::default()
        };
        let kept = map_with(doc, &options).unwrap();
        let GeneratedKind::Enumeration { members } = &kept.find("Mode").unwrap().kind else {
            panic!("expected enumeration");
        };
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name, "chat");
        let mode = field(&kept, "Model", "mode");
        assert!(matches!(mode.ty, TypeDescriptor::Enumeration(_)));
        assert_eq!(mode.default, None);
    }

    #[test]
    fn self_reference_is_named() {
        let model = map(json!({
            "definitions": {
                "Node": {
                    "type": "object",
                    "properties": {
                        "value": { "type": "integer" },
                        "next": { "$ref": "#/definitions/Node" }
                    },
                    "required": ["value"]
                }
            }
        }));
        let node = model.find("Node").unwrap();
        let next = field(&model, "Node", "next");
        let TypeDescriptor::Optional(inner) = &next.ty else {
            panic!("expected optional, got {:?}", next.ty);
        };
        let TypeDescriptor::Object(r) = inner.as_ref() else {
            panic!("expected object reference");
        };
        assert_eq!(r.id, node.id);
        assert!(r.back_reference);
    }

    #[test]
    fn union_keeps_order_and_lifts_null() {
        let model = map(json!({
            "type": "object",
            "properties": {
                "part": {
                    "oneOf": [
                        { "$ref": "#/definitions/Text" },
                        { "type": "null" },
                        { "$ref": "#/definitions/File" }
                    ]
                }
            },
            "required": ["part"],
            "definitions": {
                "Text": { "type": "object", "properties": { "text": { "type": "string" } } },
                "File": { "type": "object", "properties": { "uri": { "type": "string" } } }
            }
        }));
        let part = field(&model, "Model", "part");
        let TypeDescriptor::Optional(inner) = &part.ty else {
            panic!("null branch should make the union optional");
        };
        let TypeDescriptor::Union(branches) = inner.as_ref() else {
            panic!("expected union");
        };
        let names: Vec<_> = branches
            .iter()
            .map(|b| model.get(b.named().unwrap().id).name.as_str())
            .collect();
        assert_eq!(names, ["Text", "File"]);
    }

    #[test]
    fn all_of_merges_properties_and_required() {
        let model = map(json!({
            "definitions": {
                "Base": {
                    "type": "object",
                    "properties": { "id": { "type": "string" } },
                    "required": ["id"]
                },
                "Message": {
                    "allOf": [
                        { "$ref": "#/definitions/Base" },
                        {
                            "type": "object",
                            "properties": { "text": { "type": "string" }, "id": {} },
                            "required": ["text"]
                        }
                    ]
                }
            }
        }));
        let message = model.find("Message").unwrap();
        let names: Vec<_> = message.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["id", "text"]);
        assert!(message.fields().iter().all(|f| f.required));
        assert_eq!(
            field(&model, "Message", "id").ty,
            TypeDescriptor::Primitive(Primitive::String)
        );
    }

    #[test]
    fn all_of_conflict_names_the_property() {
        let err = map_with(
            json!({
                "allOf": [
                    { "properties": { "id": { "type": "string" } } },
                    { "properties": { "id": { "type": "integer" } } }
                ]
            }),
            &GeneratorOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::SchemaConflict { .. }));
        assert_eq!(err.location(), "#/allOf/1/properties/id");
    }

    #[test]
    fn const_and_enum_must_agree() {
        let err = map_with(
            json!({ "properties": { "kind": { "enum": ["a", "b"], "const": "a" } } }),
            &GeneratorOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.location(), "#/properties/kind");
    }

    #[test]
    fn arrays_and_maps() {
        let model = map(json!({
            "type": "object",
            "properties": {
                "tags": { "type": "array", "items": { "type": "string" } },
                "anything": { "type": "array" },
                "metadata": { "type": "object", "additionalProperties": true },
                "counts": { "type": "object", "additionalProperties": { "type": "integer" } }
            },
            "required": ["tags", "anything", "metadata", "counts"]
        }));
        assert_eq!(
            field(&model, "Model", "tags").ty,
            TypeDescriptor::Sequence(Box::new(TypeDescriptor::Primitive(Primitive::String)))
        );
        assert_eq!(
            field(&model, "Model", "anything").ty,
            TypeDescriptor::Sequence(Box::new(TypeDescriptor::ANY))
        );
        assert_eq!(
            field(&model, "Model", "metadata").ty,
            TypeDescriptor::Mapping(Box::new(TypeDescriptor::ANY))
        );
        assert_eq!(
            field(&model, "Model", "counts").ty,
            TypeDescriptor::Mapping(Box::new(TypeDescriptor::Primitive(Primitive::Integer)))
        );
    }

    #[test]
    fn inline_objects_are_named_from_their_property() {
        let model = map(json!({
            "type": "object",
            "properties": {
                "push-config": {
                    "type": "object",
                    "properties": { "url": { "type": "string" } }
                }
            }
        }));
        assert!(model.find("PushConfig").is_some());
        assert_eq!(field(&model, "Model", "push-config").name, "push_config");
    }

    #[test]
    fn mixed_enum_becomes_literal_union() {
        let model = map(json!({ "properties": { "v": { "enum": ["a", 1, null] } } }));
        assert_eq!(
            field(&model, "Model", "v").ty,
            TypeDescriptor::Union(vec![
                TypeDescriptor::Literal(json!("a")),
                TypeDescriptor::Literal(json!(1)),
            ])
            .optional()
        );
    }

    #[test]
    fn union_with_sibling_properties_merges_each_branch() {
        let model = map(json!({
            "type": "object",
            "properties": { "a": { "type": "string" }, "b": { "type": "string" } },
            "oneOf": [{ "required": ["a"] }, { "required": ["b"] }]
        }));
        let GeneratedKind::Alias {
            target: TypeDescriptor::Union(branches),
        } = &model.get(model.root()).kind
        else {
            panic!("expected a union alias");
        };
        let variants: Vec<_> = branches.iter().map(|b| model.get(b.named().unwrap().id)).collect();
        assert_eq!(variants[0].name, "Model1");
        assert_eq!(variants[1].name, "Model2");
        let required = |ty: &GeneratedType| -> Vec<(String, bool)> {
            ty.fields().iter().map(|f| (f.wire_name.clone(), f.required)).collect()
        };
        assert_eq!(required(variants[0]), [("a".into(), true), ("b".into(), false)]);
        assert_eq!(required(variants[1]), [("a".into(), false), ("b".into(), true)]);
    }

    #[test]
    fn reference_with_sibling_properties_extends_the_target() {
        let model = map(json!({
            "type": "object",
            "properties": {
                "task": {
                    "$ref": "#/definitions/Base",
                    "properties": { "extra": { "type": "integer" } },
                    "required": ["extra"]
                }
            },
            "definitions": {
                "Base": {
                    "type": "object",
                    "properties": { "id": { "type": "string" } },
                    "required": ["id"]
                }
            }
        }));
        let task = model.find("Task").unwrap();
        let names: Vec<_> = task.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["id", "extra"]);
        assert!(task.fields().iter().all(|f| f.required));
        assert_eq!(model.find("Base").unwrap().fields().len(), 1);
    }

    #[test]
    fn validation_keywords_ride_on_the_field_type() {
        let model = map(json!({
            "properties": {
                "code": { "type": "string", "maxLength": 3, "pattern": "^[A-Z]+$" },
                "tags": {
                    "type": "array",
                    "items": { "type": "string", "minLength": 1 },
                    "maxItems": 5
                }
            },
            "required": ["code"]
        }));
        let code = field(&model, "Model", "code");
        let (base, constraints) = code.ty.split_constraints();
        assert_eq!(base, TypeDescriptor::Primitive(Primitive::String));
        let constraints = constraints.unwrap();
        assert_eq!(constraints.max_length, Some(3));
        assert_eq!(constraints.pattern.as_deref(), Some("^[A-Z]+$"));

        let item = TypeDescriptor::Primitive(Primitive::String).constrained(Constraints {
            min_length: Some(1),
            ..Constraints::default()
        });
        let tags = TypeDescriptor::Sequence(Box::new(item)).constrained(Constraints {
            max_items: Some(5),
            ..Constraints::default()
        });
        assert_eq!(field(&model, "Model", "tags").ty, tags.optional());
    }

    #[test]
    fn merged_properties_intersect_their_keywords() {
        let model = map(json!({
            "allOf": [
                { "properties": { "n": { "type": "integer", "minimum": 0, "maximum": 10 } } },
                { "properties": { "n": { "type": "integer", "minimum": 5 } } }
            ]
        }));
        let (_, constraints) = field(&model, "Model", "n").ty.split_constraints();
        let constraints = constraints.unwrap();
        assert_eq!(constraints.minimum, Some(5.into()));
        assert_eq!(constraints.maximum, Some(10.into()));
    }

    #[test]
    fn structured_constants_widen_to_their_shape() {
        let model = map(json!({
            "properties": {
                "config": { "const": { "a": 1 } },
                "pair": { "const": [1, 2] },
                "v": { "enum": [{ "a": 1 }, [1], "x"] }
            }
        }));
        let map_any = TypeDescriptor::Mapping(Box::new(TypeDescriptor::ANY));
        let list_any = TypeDescriptor::Sequence(Box::new(TypeDescriptor::ANY));
        assert_eq!(field(&model, "Model", "config").ty, map_any.clone().optional());
        assert_eq!(field(&model, "Model", "pair").ty, list_any.clone().optional());
        assert_eq!(
            field(&model, "Model", "v").ty,
            TypeDescriptor::Union(vec![map_any, list_any, TypeDescriptor::Literal(json!("x"))])
                .optional()
        );
    }

    #[test]
    fn false_schemas_forbid_without_failing() {
        let model = map(json!({
            "properties": {
                "pair": {
                    "type": "array",
                    "prefixItems": [{ "type": "string" }, { "type": "integer" }],
                    "items": false
                },
                "legacy": false,
                "empty": { "type": "array", "items": false },
                "either": { "anyOf": [false, { "type": "string" }] }
            },
            "definitions": { "Nothing": false }
        }));
        let root = model.find("Model").unwrap();
        assert!(root.fields().iter().all(|f| f.wire_name != "legacy"));
        assert_eq!(
            field(&model, "Model", "pair").ty,
            TypeDescriptor::Sequence(Box::new(TypeDescriptor::Union(vec![
                TypeDescriptor::Primitive(Primitive::String),
                TypeDescriptor::Primitive(Primitive::Integer),
            ])))
            .optional()
        );
        let empty = TypeDescriptor::Sequence(Box::new(TypeDescriptor::ANY)).constrained(Constraints {
            max_items: Some(0),
            ..Constraints::default()
        });
        assert_eq!(field(&model, "Model", "empty").ty, empty.optional());
        assert_eq!(
            field(&model, "Model", "either").ty,
            TypeDescriptor::Primitive(Primitive::String).optional()
        );
        assert!(model.find("Nothing").is_none());
    }

    #[test]
    fn false_root_is_a_conflict() {
        let err = map_with(json!(false), &GeneratorOptions::default()).unwrap_err();
        assert!(matches!(err, Error::SchemaConflict { .. }), "{err}");
        assert_eq!(err.location(), "#");
    }

    #[test]
    fn shapeless_root_is_an_alias_to_any() {
        let model = map(json!({ "definitions": { "A": { "type": "string" } } }));
        let root = model.get(model.root());
        assert_eq!(root.name, "Model");
        assert_eq!(
            root.kind,
            GeneratedKind::Alias {
                target: TypeDescriptor::ANY
            }
        );
        assert_eq!(
            model.find("A").unwrap().kind,
            GeneratedKind::Alias {
                target: TypeDescriptor::Primitive(Primitive::String)
            }
        );
    }

    #[test]
    fn docs_follow_option() {
        let doc = json!({
            "description": "Top level.",
            "properties": { "a": { "type": "string", "description": "An a." } }
        });
        let with = map(doc.clone());
        assert_eq!(with.get(with.root()).description.as_deref(), Some("Top level."));
        assert_eq!(field(&with, "Model", "a").description.as_deref(), Some("An a."));

        let options = GeneratorOptions {
            include_docs: false,
            ..GeneratorOptions::default()
        };
        let without = map_with(doc, &options).unwrap();
        assert_eq!(without.get(without.root()).description, None);
        assert_eq!(field(&without, "Model", "a").description, None);
    }
}
