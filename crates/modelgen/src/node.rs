//! Parsed schema graph.
//!
//! A JSON Schema document is parsed once into an arena of [`SchemaNode`]s
//! addressed by [`NodeId`]. Later stages refer to nodes by id and never copy
//! them. Every node remembers the JSON pointer it was parsed from, which is
//! also the key `$ref` lookups use.

use crate::error::{Error, Result};
use crate::ir::Constraints;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;

/// Index of a node in a [`SchemaGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// The constraint a node expresses.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Object(ObjectShape),
    Array(Items),
    String,
    Number,
    Integer,
    Boolean,
    Null,
    Enum(Vec<Value>),
    Const(Value),
    /// `oneOf` or `anyOf`, branches in schema order, plus any object keywords
    /// declared beside it. Both keywords map to the same first-match union.
    Union {
        branches: Vec<NodeId>,
        own: Option<ObjectShape>,
    },
    /// `allOf`, plus any object keywords declared beside it.
    AllOf {
        branches: Vec<NodeId>,
        own: Option<ObjectShape>,
    },
    /// An unresolved `$ref` target, verbatim.
    Reference(String),
    /// No constraint: `{}`, `true`, or a schema with only annotations.
    Any,
    /// The `false` schema: no value is valid.
    Never,
}

/// Properties of an object schema, in declared order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectShape {
    pub properties: Vec<(String, NodeId)>,
    pub required: Vec<String>,
    pub additional: Additional,
}

impl ObjectShape {
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// No declared properties, and arbitrary keys are accepted.
    pub fn is_open_map(&self) -> bool {
        self.properties.is_empty() && !matches!(self.additional, Additional::Forbidden)
    }

    fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        let additional = match self.additional {
            Additional::Schema(id) => Some(id),
            _ => None,
        };
        self.properties.iter().map(|(_, id)| *id).chain(additional)
    }
}

/// The `additionalProperties` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Additional {
    #[default]
    Unspecified,
    Allowed,
    Forbidden,
    Schema(NodeId),
}

/// The `items` / `prefixItems` keywords.
#[derive(Debug, Clone, PartialEq)]
pub enum Items {
    Unspecified,
    Single(NodeId),
    Tuple(Vec<NodeId>),
}

/// One parsed schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    /// JSON pointer of this schema, `#` for the document root.
    pub pointer: String,
    pub kind: NodeKind,
    pub title: Option<String>,
    pub description: Option<String>,
    pub default: Option<Value>,
    /// The `const` keyword, kept even when `enum` decides the kind.
    pub constant: Option<Value>,
    pub examples: Vec<Value>,
    /// `type: [T, "null"]` or OpenAPI `nullable: true`.
    pub nullable: bool,
    /// Key under `definitions` / `$defs`, when this node is a definition.
    pub definition_key: Option<String>,
    pub constraints: Constraints,
}

impl SchemaNode {
    fn placeholder(pointer: String, definition_key: Option<String>) -> Self {
        Self {
            pointer,
            kind: NodeKind::Any,
            title: None,
            description: None,
            default: None,
            constant: None,
            examples: Vec::new(),
            nullable: false,
            definition_key,
            constraints: Constraints::default(),
        }
    }
}

/// Arena of every schema in a document.
#[derive(Debug, Clone)]
pub struct SchemaGraph {
    nodes: Vec<SchemaNode>,
    root: NodeId,
    definitions: Vec<NodeId>,
    pointers: HashMap<String, NodeId>,
    anchors: HashMap<String, NodeId>,
}

impl SchemaGraph {
    /// Parse a schema document.
    ///
    /// Nodes are allocated in document order (parents before children), so
    /// identical input always yields an identical graph.
    pub fn from_value(document: &Value) -> Result<Self> {
        let mut builder = Builder::default();
        let root = builder.schema(document, "#".to_string(), None)?;
        Ok(Self {
            nodes: builder.nodes,
            root,
            definitions: builder.definitions,
            pointers: builder.pointers,
            anchors: builder.anchors,
        })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SchemaNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Entries of every `definitions` / `$defs` block, in document order.
    pub fn definitions(&self) -> &[NodeId] {
        &self.definitions
    }

    /// Find the node parsed at a JSON pointer such as `#/definitions/Task`.
    pub fn lookup(&self, pointer: &str) -> Option<NodeId> {
        self.pointers.get(pointer).copied()
    }

    /// Find a node by plain-name fragment (`#name`), from `$anchor` or `$id`.
    pub fn anchor(&self, fragment: &str) -> Option<NodeId> {
        self.anchors.get(fragment).copied()
    }

    /// Structural children: properties, items, branches.
    ///
    /// References are not followed; definitions are listed separately.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match &self.node(id).kind {
            NodeKind::Object(shape) => shape.children().collect(),
            NodeKind::Array(Items::Single(item)) => vec![*item],
            NodeKind::Array(Items::Tuple(items)) => items.clone(),
            NodeKind::Union { branches, own } | NodeKind::AllOf { branches, own } => {
                let mut children = branches.clone();
                if let Some(shape) = own {
                    children.extend(shape.children());
                }
                children
            }
            _ => Vec::new(),
        }
    }
}

/// Append one reference token to a JSON pointer, escaping `~` and `/`.
pub(crate) fn child_pointer(base: &str, token: &str) -> String {
    let escaped = token.replace('~', "~0").replace('/', "~1");
    format!("{base}/{escaped}")
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn declares_object(object: &Map<String, Value>) -> bool {
    object.contains_key("properties")
        || object.contains_key("additionalProperties")
        || object.contains_key("required")
}

#[derive(Default)]
struct Builder {
    nodes: Vec<SchemaNode>,
    definitions: Vec<NodeId>,
    pointers: HashMap<String, NodeId>,
    anchors: HashMap<String, NodeId>,
}

impl Builder {
    fn reserve(&mut self, pointer: String, definition_key: Option<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.pointers.insert(pointer.clone(), id);
        self.nodes
            .push(SchemaNode::placeholder(pointer, definition_key));
        id
    }

    fn schema(
        &mut self,
        value: &Value,
        pointer: String,
        definition_key: Option<String>,
    ) -> Result<NodeId> {
        let id = self.reserve(pointer.clone(), definition_key);
        let object = match value {
            Value::Bool(true) => return Ok(id),
            Value::Bool(false) => {
                self.nodes[id.0].kind = NodeKind::Never;
                return Ok(id);
            }
            Value::Object(map) => map,
            other => {
                return Err(Error::parse(
                    pointer,
                    format!("expected a schema object, found {}", json_kind(other)),
                ));
            }
        };

        self.annotations(id, object, &pointer)?;
        self.nodes[id.0].constraints = constraints(object, &pointer)?;
        self.nested_definitions(object, &pointer)?;
        let (kind, nullable) = self.kind(object, &pointer)?;

        let node = &mut self.nodes[id.0];
        node.kind = kind;
        node.nullable |= nullable;
        Ok(id)
    }

    fn annotations(&mut self, id: NodeId, object: &Map<String, Value>, pointer: &str) -> Result<()> {
        let text = |key: &str| -> Result<Option<String>> {
            match object.get(key) {
                None => Ok(None),
                Some(Value::String(s)) => Ok(Some(s.clone())),
                Some(other) => Err(Error::parse(
                    child_pointer(pointer, key),
                    format!("`{key}` must be a string, found {}", json_kind(other)),
                )),
            }
        };
        let title = text("title")?;
        let description = text("description")?;

        if let Some(anchor) = text("$anchor")? {
            self.anchors.insert(format!("#{anchor}"), id);
        }
        if let Some(fragment) = text("$id")?.filter(|s| s.starts_with('#') && s.len() > 1) {
            self.anchors.insert(fragment, id);
        }

        let node = &mut self.nodes[id.0];
        node.title = title;
        node.description = description;
        node.default = object.get("default").cloned();
        node.constant = object.get("const").cloned();
        node.examples = match object.get("examples") {
            None => Vec::new(),
            Some(Value::Array(values)) => values.clone(),
            Some(single) => vec![single.clone()],
        };
        node.nullable = object.get("nullable") == Some(&Value::Bool(true));
        Ok(())
    }

    fn nested_definitions(&mut self, object: &Map<String, Value>, pointer: &str) -> Result<()> {
        for keyword in ["$defs", "definitions"] {
            let Some(block) = object.get(keyword) else {
                continue;
            };
            let base = child_pointer(pointer, keyword);
            let Value::Object(entries) = block else {
                return Err(Error::parse(base, format!("`{keyword}` must be an object")));
            };
            for (name, schema) in entries {
                let id = self.schema(schema, child_pointer(&base, name), Some(name.clone()))?;
                self.definitions.push(id);
            }
        }
        Ok(())
    }

    /// Decide the node kind. The flag reports a `null` member of `type`.
    fn kind(&mut self, object: &Map<String, Value>, pointer: &str) -> Result<(NodeKind, bool)> {
        if let Some(reference) = object.get("$ref") {
            let Value::String(reference) = reference else {
                return Err(Error::parse(
                    child_pointer(pointer, "$ref"),
                    "`$ref` must be a string",
                ));
            };
            let reference = NodeKind::Reference(reference.clone());
            if !declares_object(object) {
                return Ok((reference, false));
            }
            // Object keywords beside `$ref` apply too: merge like `allOf`.
            let target = self.reserve(child_pointer(pointer, "$ref"), None);
            self.nodes[target.0].kind = reference;
            let own = Some(self.object_shape(object, pointer)?);
            return Ok((
                NodeKind::AllOf {
                    branches: vec![target],
                    own,
                },
                false,
            ));
        }

        if let Some(values) = object.get("enum") {
            let at = child_pointer(pointer, "enum");
            let Value::Array(values) = values else {
                return Err(Error::parse(at, "`enum` must be an array"));
            };
            if values.is_empty() {
                return Err(Error::parse(at, "`enum` must not be empty"));
            }
            return Ok((NodeKind::Enum(values.clone()), false));
        }

        if let Some(value) = object.get("const") {
            return Ok((NodeKind::Const(value.clone()), false));
        }

        if let Some(branches) = object.get("allOf") {
            let branches = self.branches(branches, pointer, "allOf")?;
            let own = self.own_shape(object, pointer)?;
            return Ok((NodeKind::AllOf { branches, own }, false));
        }

        for keyword in ["oneOf", "anyOf"] {
            if let Some(branches) = object.get(keyword) {
                let branches = self.branches(branches, pointer, keyword)?;
                let own = self.own_shape(object, pointer)?;
                return Ok((NodeKind::Union { branches, own }, false));
            }
        }

        match object.get("type") {
            Some(Value::String(name)) => Ok((self.typed(name, object, pointer)?, false)),
            Some(Value::Array(entries)) => self.type_list(entries, object, pointer),
            Some(other) => Err(Error::parse(
                child_pointer(pointer, "type"),
                format!(
                    "`type` must be a string or an array of strings, found {}",
                    json_kind(other)
                ),
            )),
            None if declares_object(object) => {
                Ok((NodeKind::Object(self.object_shape(object, pointer)?), false))
            }
            None if object.contains_key("items") || object.contains_key("prefixItems") => {
                Ok((NodeKind::Array(self.items(object, pointer)?), false))
            }
            None => Ok((NodeKind::Any, false)),
        }
    }

    fn type_list(
        &mut self,
        entries: &[Value],
        object: &Map<String, Value>,
        pointer: &str,
    ) -> Result<(NodeKind, bool)> {
        let base = child_pointer(pointer, "type");
        let mut names = Vec::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            match entry {
                Value::String(name) => names.push(name.as_str()),
                other => {
                    return Err(Error::parse(
                        child_pointer(&base, &i.to_string()),
                        format!("type names must be strings, found {}", json_kind(other)),
                    ));
                }
            }
        }

        let nullable = names.contains(&"null");
        names.retain(|name| *name != "null");
        match names.as_slice() {
            [] => Ok((NodeKind::Null, false)),
            [single] => Ok((self.typed(single, object, pointer)?, nullable)),
            many => {
                let mut branches = Vec::with_capacity(many.len());
                for (i, name) in many.iter().enumerate() {
                    let id = self.reserve(child_pointer(&base, &i.to_string()), None);
                    let kind = self.typed(name, object, pointer)?;
                    self.nodes[id.0].kind = kind;
                    branches.push(id);
                }
                Ok((NodeKind::Union { branches, own: None }, nullable))
            }
        }
    }

    fn typed(&mut self, name: &str, object: &Map<String, Value>, pointer: &str) -> Result<NodeKind> {
        Ok(match name {
            "object" => NodeKind::Object(self.object_shape(object, pointer)?),
            "array" => NodeKind::Array(self.items(object, pointer)?),
            "string" => NodeKind::String,
            "number" => NodeKind::Number,
            "integer" => NodeKind::Integer,
            "boolean" => NodeKind::Boolean,
            "null" => NodeKind::Null,
            other => {
                return Err(Error::parse(
                    child_pointer(pointer, "type"),
                    format!("unknown type `{other}`"),
                ));
            }
        })
    }

    /// Object keywords declared beside a combinator.
    fn own_shape(&mut self, object: &Map<String, Value>, pointer: &str) -> Result<Option<ObjectShape>> {
        if declares_object(object) {
            Ok(Some(self.object_shape(object, pointer)?))
        } else {
            Ok(None)
        }
    }

    fn object_shape(&mut self, object: &Map<String, Value>, pointer: &str) -> Result<ObjectShape> {
        let mut shape = ObjectShape::default();

        if let Some(properties) = object.get("properties") {
            let base = child_pointer(pointer, "properties");
            let Value::Object(properties) = properties else {
                return Err(Error::parse(base, "`properties` must be an object"));
            };
            for (name, schema) in properties {
                let id = self.schema(schema, child_pointer(&base, name), None)?;
                shape.properties.push((name.clone(), id));
            }
        }

        if let Some(required) = object.get("required") {
            let base = child_pointer(pointer, "required");
            let Value::Array(required) = required else {
                return Err(Error::parse(base, "`required` must be an array"));
            };
            for (i, entry) in required.iter().enumerate() {
                let Value::String(name) = entry else {
                    return Err(Error::parse(
                        child_pointer(&base, &i.to_string()),
                        "required property names must be strings",
                    ));
                };
                shape.required.push(name.clone());
            }
        }

        shape.additional = match object.get("additionalProperties") {
            None => Additional::Unspecified,
            Some(Value::Bool(true)) => Additional::Allowed,
            Some(Value::Bool(false)) => Additional::Forbidden,
            Some(schema @ Value::Object(_)) => Additional::Schema(self.schema(
                schema,
                child_pointer(pointer, "additionalProperties"),
                None,
            )?),
            Some(other) => {
                return Err(Error::parse(
                    child_pointer(pointer, "additionalProperties"),
                    format!(
                        "`additionalProperties` must be a boolean or a schema, found {}",
                        json_kind(other)
                    ),
                ));
            }
        };

        Ok(shape)
    }

    fn items(&mut self, object: &Map<String, Value>, pointer: &str) -> Result<Items> {
        let mut tuple = match object.get("prefixItems") {
            None => None,
            Some(Value::Array(schemas)) => Some(self.indexed(schemas, pointer, "prefixItems")?),
            Some(_) => {
                return Err(Error::parse(
                    child_pointer(pointer, "prefixItems"),
                    "`prefixItems` must be an array",
                ));
            }
        };

        let items = match object.get("items") {
            None => None,
            Some(Value::Array(schemas)) => {
                let ids = self.indexed(schemas, pointer, "items")?;
                tuple.get_or_insert_with(Vec::new).extend(ids);
                None
            }
            Some(schema) => Some(self.schema(schema, child_pointer(pointer, "items"), None)?),
        };
        // `items: false` after a prefix closes the tuple.
        let items = items.filter(|id| tuple.is_none() || self.nodes[id.0].kind != NodeKind::Never);

        Ok(match (tuple, items) {
            (Some(mut ids), rest) => {
                ids.extend(rest);
                Items::Tuple(ids)
            }
            (None, Some(item)) => Items::Single(item),
            (None, None) => Items::Unspecified,
        })
    }

    fn branches(&mut self, value: &Value, pointer: &str, keyword: &str) -> Result<Vec<NodeId>> {
        let Value::Array(schemas) = value else {
            return Err(Error::parse(
                child_pointer(pointer, keyword),
                format!("`{keyword}` must be an array"),
            ));
        };
        if schemas.is_empty() {
            return Err(Error::parse(
                child_pointer(pointer, keyword),
                format!("`{keyword}` must not be empty"),
            ));
        }
        self.indexed(schemas, pointer, keyword)
    }

    fn indexed(&mut self, schemas: &[Value], pointer: &str, keyword: &str) -> Result<Vec<NodeId>> {
        let base = child_pointer(pointer, keyword);
        schemas
            .iter()
            .enumerate()
            .map(|(i, schema)| self.schema(schema, child_pointer(&base, &i.to_string()), None))
            .collect()
    }
}

/// Validation keywords. Draft 4 spells exclusive bounds as booleans beside
/// `minimum` / `maximum`.
fn constraints(object: &Map<String, Value>, pointer: &str) -> Result<Constraints> {
    let count = |key: &str| -> Result<Option<u64>> {
        match object.get(key) {
            None => Ok(None),
            Some(value) => value.as_u64().map(Some).ok_or_else(|| {
                Error::parse(
                    child_pointer(pointer, key),
                    format!("`{key}` must be a non-negative integer"),
                )
            }),
        }
    };
    let number = |key: &str| -> Result<Option<Number>> {
        match object.get(key) {
            None | Some(Value::Bool(_)) => Ok(None),
            Some(Value::Number(n)) => Ok(Some(n.clone())),
            Some(other) => Err(Error::parse(
                child_pointer(pointer, key),
                format!("`{key}` must be a number, found {}", json_kind(other)),
            )),
        }
    };
    let text = |key: &str| -> Result<Option<String>> {
        match object.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(Error::parse(
                child_pointer(pointer, key),
                format!("`{key}` must be a string, found {}", json_kind(other)),
            )),
        }
    };

    let mut constraints = Constraints {
        min_length: count("minLength")?,
        max_length: count("maxLength")?,
        pattern: text("pattern")?,
        format: text("format")?,
        minimum: number("minimum")?,
        maximum: number("maximum")?,
        exclusive_minimum: number("exclusiveMinimum")?,
        exclusive_maximum: number("exclusiveMaximum")?,
        multiple_of: number("multipleOf")?,
        min_items: count("minItems")?,
        max_items: count("maxItems")?,
        unique_items: object.get("uniqueItems") == Some(&Value::Bool(true)),
        min_properties: count("minProperties")?,
        max_properties: count("maxProperties")?,
    };
    if object.get("exclusiveMinimum") == Some(&Value::Bool(true)) {
        constraints.exclusive_minimum = constraints.minimum.take();
    }
    if object.get("exclusiveMaximum") == Some(&Value::Bool(true)) {
        constraints.exclusive_maximum = constraints.maximum.take();
    }
    Ok(constraints)
}
