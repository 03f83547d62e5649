//! Intermediate representation for generated models.
//!
//! The mapper produces a [`Model`]: an arena of [`GeneratedType`]s whose
//! fields are described by [`TypeDescriptor`]s. Types refer to each other by
//! [`TypeId`], so recursive schemas need no recursive ownership. Backends only
//! ever see this representation.

use crate::naming::NameRegistry;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Index of a type in a [`Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub(crate) usize);

impl TypeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    String,
    Integer,
    Number,
    Boolean,
    Null,
    /// Any JSON value.
    Any,
}

/// Reference to a named type.
#[derive(Debug, Clone, Copy, Eq, Serialize, Deserialize)]
pub struct TypeRef {
    pub id: TypeId,
    /// The edge closes a cycle in the schema.
    pub back_reference: bool,
}

impl TypeRef {
    pub fn new(id: TypeId) -> Self {
        Self {
            id,
            back_reference: false,
        }
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Target-type projection of one schema node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeDescriptor {
    Primitive(Primitive),
    Enumeration(TypeRef),
    Object(TypeRef),
    /// A named non-object type (a root model).
    Alias(TypeRef),
    /// Branches in schema order; the first that accepts a value wins.
    Union(Vec<TypeDescriptor>),
    Sequence(Box<TypeDescriptor>),
    /// String keys to values of the inner type.
    Mapping(Box<TypeDescriptor>),
    Optional(Box<TypeDescriptor>),
    /// Exactly one JSON value.
    Literal(Value),
    /// The inner type, narrowed by validation keywords.
    Constrained(Box<TypeDescriptor>, Constraints),
}

impl TypeDescriptor {
    pub const ANY: TypeDescriptor = TypeDescriptor::Primitive(Primitive::Any);

    /// The named type this descriptor is, if any.
    pub fn named(&self) -> Option<TypeRef> {
        match self {
            TypeDescriptor::Enumeration(r)
            | TypeDescriptor::Object(r)
            | TypeDescriptor::Alias(r) => Some(*r),
            _ => None,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, TypeDescriptor::Optional(_))
    }

    pub fn is_any(&self) -> bool {
        matches!(self, TypeDescriptor::Primitive(Primitive::Any))
    }

    /// Wrap in `Optional` unless already optional or null.
    pub fn optional(self) -> Self {
        if self.is_optional() || self == TypeDescriptor::Primitive(Primitive::Null) {
            self
        } else {
            TypeDescriptor::Optional(Box::new(self))
        }
    }

    /// The type without its outermost validation keywords, and those keywords.
    ///
    /// Looks through one `Optional`, so `Optional(Constrained(T, c))` splits
    /// into `Optional(T)` and `c`.
    pub fn split_constraints(&self) -> (TypeDescriptor, Option<&Constraints>) {
        match self {
            TypeDescriptor::Constrained(inner, constraints) => ((**inner).clone(), Some(constraints)),
            TypeDescriptor::Optional(inner) => match inner.split_constraints() {
                (base, Some(constraints)) => (base.optional(), Some(constraints)),
                (_, None) => (self.clone(), None),
            },
            other => (other.clone(), None),
        }
    }

    /// Narrow by `constraints`, inside any `Optional`.
    pub fn constrained(self, constraints: Constraints) -> Self {
        if constraints.is_empty() {
            return self;
        }
        match self {
            TypeDescriptor::Optional(inner) => inner.constrained(constraints).optional(),
            other => TypeDescriptor::Constrained(Box::new(other), constraints),
        }
    }

    /// Every named type mentioned, in order of appearance.
    pub fn references(&self) -> Vec<TypeRef> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references(&self, out: &mut Vec<TypeRef>) {
        match self {
            TypeDescriptor::Enumeration(r)
            | TypeDescriptor::Object(r)
            | TypeDescriptor::Alias(r) => out.push(*r),
            TypeDescriptor::Union(branches) => {
                for branch in branches {
                    branch.collect_references(out);
                }
            }
            TypeDescriptor::Sequence(inner)
            | TypeDescriptor::Mapping(inner)
            | TypeDescriptor::Optional(inner)
            | TypeDescriptor::Constrained(inner, _) => inner.collect_references(out),
            TypeDescriptor::Primitive(_) | TypeDescriptor::Literal(_) => {}
        }
    }
}

/// Validation keywords of one schema.
///
/// Length and count keywords are kept per JSON type; [`Constraints::for_type`]
/// narrows them to the ones a mapped type can carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constraints {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    /// An annotation; no backend changes the type for it.
    pub format: Option<String>,
    pub minimum: Option<Number>,
    pub maximum: Option<Number>,
    pub exclusive_minimum: Option<Number>,
    pub exclusive_maximum: Option<Number>,
    pub multiple_of: Option<Number>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
    pub min_properties: Option<u64>,
    pub max_properties: Option<u64>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        *self == Constraints::default()
    }

    /// The keywords that apply to values of `ty`.
    ///
    /// String keywords only apply to strings, numeric bounds to numbers, and
    /// so on. Named types and unions carry none.
    pub fn for_type(&self, ty: &TypeDescriptor) -> Constraints {
        let mut kept = Constraints::default();
        match ty {
            TypeDescriptor::Primitive(Primitive::String) => {
                kept.min_length = self.min_length;
                kept.max_length = self.max_length;
                kept.pattern = self.pattern.clone();
                kept.format = self.format.clone();
            }
            TypeDescriptor::Primitive(Primitive::Integer | Primitive::Number) => {
                kept.minimum = self.minimum.clone();
                kept.maximum = self.maximum.clone();
                kept.exclusive_minimum = self.exclusive_minimum.clone();
                kept.exclusive_maximum = self.exclusive_maximum.clone();
                kept.multiple_of = self.multiple_of.clone();
                kept.format = self.format.clone();
            }
            TypeDescriptor::Sequence(_) => {
                kept.min_items = self.min_items;
                kept.max_items = self.max_items;
                kept.unique_items = self.unique_items;
            }
            TypeDescriptor::Mapping(_) => {
                kept.min_properties = self.min_properties;
                kept.max_properties = self.max_properties;
            }
            _ => {}
        }
        kept
    }

    /// Both sets at once: the tighter bound wins where both declare one.
    ///
    /// `pattern`, `format` and `multipleOf` cannot be combined; `self` wins.
    pub fn intersect(&self, other: &Constraints) -> Constraints {
        fn upper(a: Option<u64>, b: Option<u64>) -> Option<u64> {
            match (a, b) {
                (Some(x), Some(y)) => Some(x.min(y)),
                (x, y) => x.or(y),
            }
        }
        fn tighter(a: &Option<Number>, b: &Option<Number>, lower: bool) -> Option<Number> {
            match (a, b) {
                (Some(x), Some(y)) => {
                    let (fx, fy) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
                    let keep_x = if lower { fx >= fy } else { fx <= fy };
                    Some(if keep_x { x.clone() } else { y.clone() })
                }
                (x, y) => x.clone().or_else(|| y.clone()),
            }
        }
        Constraints {
            min_length: self.min_length.max(other.min_length),
            max_length: upper(self.max_length, other.max_length),
            pattern: self.pattern.clone().or_else(|| other.pattern.clone()),
            format: self.format.clone().or_else(|| other.format.clone()),
            minimum: tighter(&self.minimum, &other.minimum, true),
            maximum: tighter(&self.maximum, &other.maximum, false),
            exclusive_minimum: tighter(&self.exclusive_minimum, &other.exclusive_minimum, true),
            exclusive_maximum: tighter(&self.exclusive_maximum, &other.exclusive_maximum, false),
            multiple_of: self.multiple_of.clone().or_else(|| other.multiple_of.clone()),
            min_items: self.min_items.max(other.min_items),
            max_items: upper(self.max_items, other.max_items),
            unique_items: self.unique_items || other.unique_items,
            min_properties: self.min_properties.max(other.min_properties),
            max_properties: upper(self.max_properties, other.max_properties),
        }
    }

    /// Keyword/value pairs as written in a schema, in a fixed order.
    pub fn keywords(&self) -> Vec<(&'static str, Value)> {
        let count = |n: Option<u64>| n.map(Value::from);
        let number = |n: &Option<Number>| n.clone().map(Value::Number);
        let text = |s: &Option<String>| s.clone().map(Value::String);
        [
            ("minLength", count(self.min_length)),
            ("maxLength", count(self.max_length)),
            ("pattern", text(&self.pattern)),
            ("format", text(&self.format)),
            ("minimum", number(&self.minimum)),
            ("maximum", number(&self.maximum)),
            ("exclusiveMinimum", number(&self.exclusive_minimum)),
            ("exclusiveMaximum", number(&self.exclusive_maximum)),
            ("multipleOf", number(&self.multiple_of)),
            ("minItems", count(self.min_items)),
            ("maxItems", count(self.max_items)),
            ("uniqueItems", self.unique_items.then_some(Value::Bool(true))),
            ("minProperties", count(self.min_properties)),
            ("maxProperties", count(self.max_properties)),
        ]
        .into_iter()
        .filter_map(|(keyword, value)| value.map(|v| (keyword, v)))
        .collect()
    }

    /// Whether `value` satisfies every keyword but `pattern` and `format`.
    pub fn admits(&self, value: &Value) -> bool {
        let within = |n: usize, min: Option<u64>, max: Option<u64>| {
            let n = n as u64;
            min.is_none_or(|m| n >= m) && max.is_none_or(|m| n <= m)
        };
        match value {
            Value::String(s) => within(s.chars().count(), self.min_length, self.max_length),
            Value::Array(items) => {
                within(items.len(), self.min_items, self.max_items)
                    && (!self.unique_items
                        || items.iter().enumerate().all(|(i, x)| !items[..i].contains(x)))
            }
            Value::Object(map) => within(map.len(), self.min_properties, self.max_properties),
            Value::Number(n) => {
                let Some(x) = n.as_f64() else {
                    return false;
                };
                let bound = |b: &Option<Number>| b.as_ref().and_then(Number::as_f64);
                bound(&self.minimum).is_none_or(|m| x >= m)
                    && bound(&self.maximum).is_none_or(|m| x <= m)
                    && bound(&self.exclusive_minimum).is_none_or(|m| x > m)
                    && bound(&self.exclusive_maximum).is_none_or(|m| x < m)
                    && bound(&self.multiple_of).is_none_or(|m| m == 0.0 || (x / m).fract() == 0.0)
            }
            Value::Null | Value::Bool(_) => true,
        }
    }
}

/// A field of an object type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Identifier in generated code.
    pub name: String,
    /// Property name on the wire.
    pub wire_name: String,
    /// Schema pointer of the property.
    pub pointer: String,
    pub ty: TypeDescriptor,
    pub required: bool,
    pub default: Option<Value>,
    pub description: Option<String>,
    pub title: Option<String>,
    pub examples: Vec<Value>,
}

impl Field {
    /// Whether the generated constructor can omit this field.
    pub fn has_default(&self) -> bool {
        !self.required || self.default.is_some()
    }

    pub fn is_aliased(&self) -> bool {
        self.name != self.wire_name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumMember {
    pub name: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratedKind {
    Object { fields: Vec<Field> },
    Enumeration { members: Vec<EnumMember> },
    /// Named wrapper around another descriptor.
    Alias { target: TypeDescriptor },
}

/// A named, emittable type definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedType {
    pub id: TypeId,
    pub name: String,
    /// Schema pointer this type was generated from.
    pub pointer: String,
    /// Documentation text from the schema's `description`.
    pub description: Option<String>,
    /// Base every object model derives from, when not the backend default.
    pub base: Option<String>,
    pub kind: GeneratedKind,
}

impl GeneratedType {
    /// Descriptors of everything this type's definition mentions.
    pub fn descriptors(&self) -> Vec<&TypeDescriptor> {
        match &self.kind {
            GeneratedKind::Object { fields } => fields.iter().map(|f| &f.ty).collect(),
            GeneratedKind::Enumeration { .. } => Vec::new(),
            GeneratedKind::Alias { target } => vec![target],
        }
    }

    pub fn fields(&self) -> &[Field] {
        match &self.kind {
            GeneratedKind::Object { fields } => fields,
            _ => &[],
        }
    }
}

/// Every generated type of one run.
#[derive(Debug, Clone, Serialize)]
pub struct Model {
    pub(crate) types: Vec<GeneratedType>,
    pub(crate) root: TypeId,
    #[serde(skip)]
    pub(crate) names: NameRegistry,
}

impl Model {
    pub fn types(&self) -> &[GeneratedType] {
        &self.types
    }

    pub fn get(&self, id: TypeId) -> &GeneratedType {
        &self.types[id.0]
    }

    pub fn root(&self) -> TypeId {
        self.root
    }

    pub fn names(&self) -> &NameRegistry {
        &self.names
    }

    pub fn find(&self, name: &str) -> Option<&GeneratedType> {
        self.types.iter().find(|t| t.name == name)
    }

    /// Named types `id` mentions, first appearance order, without repeats.
    pub fn dependencies(&self, id: TypeId) -> Vec<TypeRef> {
        let mut seen: Vec<TypeRef> = Vec::new();
        for descriptor in self.get(id).descriptors() {
            for r in descriptor.references() {
                if !seen.contains(&r) {
                    seen.push(r);
                }
            }
        }
        seen
    }

    /// Whether `value` is an instance of `descriptor`.
    ///
    /// Undeclared object keys are accepted, as the generated models ignore
    /// them.
    pub fn matches(&self, descriptor: &TypeDescriptor, value: &Value) -> bool {
        match descriptor {
            TypeDescriptor::Primitive(p) => match p {
                Primitive::String => value.is_string(),
                Primitive::Integer => value.as_f64().is_some_and(|n| n.fract() == 0.0),
                Primitive::Number => value.is_number(),
                Primitive::Boolean => value.is_boolean(),
                Primitive::Null => value.is_null(),
                Primitive::Any => true,
            },
            TypeDescriptor::Literal(expected) => expected == value,
            TypeDescriptor::Constrained(inner, constraints) => {
                constraints.admits(value) && self.matches(inner, value)
            }
            TypeDescriptor::Optional(inner) => value.is_null() || self.matches(inner, value),
            TypeDescriptor::Sequence(item) => value
                .as_array()
                .is_some_and(|xs| xs.iter().all(|x| self.matches(item, x))),
            TypeDescriptor::Mapping(inner) => value
                .as_object()
                .is_some_and(|m| m.values().all(|v| self.matches(inner, v))),
            TypeDescriptor::Union(branches) => self.select_branch(branches, value).is_some(),
            TypeDescriptor::Enumeration(r) | TypeDescriptor::Object(r) | TypeDescriptor::Alias(r) => {
                self.matches_named(r.id, value)
            }
        }
    }

    fn matches_named(&self, id: TypeId, value: &Value) -> bool {
        match &self.get(id).kind {
            GeneratedKind::Enumeration { members } => members.iter().any(|m| m.value == *value),
            GeneratedKind::Alias { target } => self.matches(target, value),
            GeneratedKind::Object { fields } => {
                let Some(map) = value.as_object() else {
                    return false;
                };
                fields.iter().all(|field| match map.get(&field.wire_name) {
                    Some(v) => self.matches(&field.ty, v),
                    None => !field.required,
                })
            }
        }
    }

    /// Index of the branch that accepts `value`: the first, in schema order.
    pub fn select_branch(&self, branches: &[TypeDescriptor], value: &Value) -> Option<usize> {
        branches.iter().position(|b| self.matches(b, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(name: &str, ty: TypeDescriptor, required: bool) -> Field {
        Field {
            name: name.into(),
            wire_name: name.into(),
            pointer: format!("#/properties/{name}"),
            ty,
            required,
            default: None,
            description: None,
            title: None,
            examples: Vec::new(),
        }
    }

    fn object(id: usize, name: &str, fields: Vec<Field>) -> GeneratedType {
        GeneratedType {
            id: TypeId(id),
            name: name.into(),
            pointer: format!("#/definitions/{name}"),
            description: None,
            base: None,
            kind: GeneratedKind::Object { fields },
        }
    }

    fn model(types: Vec<GeneratedType>) -> Model {
        Model {
            types,
            root: TypeId(0),
            names: NameRegistry::default(),
        }
    }

    #[test]
    fn first_matching_branch_wins() {
        let text = TypeDescriptor::Primitive(Primitive::String);
        let m = model(vec![
            object(0, "A", vec![field("a", text.clone(), true)]),
            object(1, "B", vec![
                field("a", text.clone(), true),
                field("b", TypeDescriptor::Primitive(Primitive::Integer).optional(), false),
            ]),
        ]);
        let a = TypeDescriptor::Object(TypeRef::new(TypeId(0)));
        let b = TypeDescriptor::Object(TypeRef::new(TypeId(1)));

        let both = json!({ "a": "x" });
        assert_eq!(m.select_branch(&[a.clone(), b.clone()], &both), Some(0));
        assert_eq!(m.select_branch(&[b.clone(), a.clone()], &both), Some(0));
        assert_eq!(m.select_branch(&[a, b], &json!({ "b": 1 })), None);
    }

    #[test]
    fn required_fields_must_be_present() {
        let m = model(vec![object(
            0,
            "Task",
            vec![
                field("id", TypeDescriptor::Primitive(Primitive::String), true),
                field("note", TypeDescriptor::Primitive(Primitive::String).optional(), false),
            ],
        )]);
        let task = TypeDescriptor::Object(TypeRef::new(TypeId(0)));
        assert!(m.matches(&task, &json!({ "id": "1" })));
        assert!(m.matches(&task, &json!({ "id": "1", "note": null })));
        assert!(!m.matches(&task, &json!({ "note": "n" })));
    }

    #[test]
    fn integral_floats_are_integers() {
        let m = model(Vec::new());
        let integer = TypeDescriptor::Primitive(Primitive::Integer);
        assert!(m.matches(&integer, &json!(1)));
        assert!(m.matches(&integer, &json!(1.0)));
        assert!(m.matches(&integer, &json!(-3.0)));
        assert!(!m.matches(&integer, &json!(1.5)));
        assert!(!m.matches(&integer, &json!("1")));
    }

    #[test]
    fn constrained_values_are_checked() {
        let m = model(Vec::new());
        let code = TypeDescriptor::Constrained(
            Box::new(TypeDescriptor::Primitive(Primitive::String)),
            Constraints {
                max_length: Some(3),
                ..Constraints::default()
            },
        );
        assert!(m.matches(&code, &json!("ABC")));
        assert!(!m.matches(&code, &json!("ABCD")));

        let percent = TypeDescriptor::Constrained(
            Box::new(TypeDescriptor::Primitive(Primitive::Integer)),
            Constraints {
                minimum: Some(0.into()),
                exclusive_maximum: Some(100.into()),
                ..Constraints::default()
            },
        );
        assert!(m.matches(&percent, &json!(0)));
        assert!(!m.matches(&percent, &json!(100)));
        assert!(!m.matches(&percent, &json!(-1)));
    }

    #[test]
    fn constraints_narrow_to_the_mapped_type() {
        let all = Constraints {
            max_length: Some(3),
            minimum: Some(1.into()),
            min_items: Some(1),
            ..Constraints::default()
        };
        let string = all.for_type(&TypeDescriptor::Primitive(Primitive::String));
        assert_eq!(string.max_length, Some(3));
        assert_eq!(string.minimum, None);
        let list = all.for_type(&TypeDescriptor::Sequence(Box::new(TypeDescriptor::ANY)));
        assert_eq!(list.keywords(), [("minItems", json!(1))]);
        assert!(all.for_type(&TypeDescriptor::ANY).is_empty());
    }

    #[test]
    fn dependencies_are_deduplicated_in_order() {
        let r1 = TypeDescriptor::Object(TypeRef::new(TypeId(1)));
        let r2 = TypeDescriptor::Enumeration(TypeRef::new(TypeId(2)));
        let m = model(vec![
            object(0, "Root", vec![
                field("x", TypeDescriptor::Sequence(Box::new(r2.clone())), true),
                field("y", TypeDescriptor::Union(vec![r1.clone(), r2]), true),
                field("z", r1.optional(), false),
            ]),
            object(1, "A", vec![]),
            GeneratedType {
                id: TypeId(2),
                name: "E".into(),
                pointer: "#/definitions/E".into(),
                description: None,
                base: None,
                kind: GeneratedKind::Enumeration {
                    members: vec![EnumMember { name: "a".into(), value: json!("a") }],
                },
            },
        ]);
        let deps: Vec<_> = m.dependencies(TypeId(0)).iter().map(|r| r.id).collect();
        assert_eq!(deps, [TypeId(2), TypeId(1)]);
    }
}
