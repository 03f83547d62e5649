//! Pydantic v2 backend.
//!
//! Objects become `BaseModel` subclasses (or the configured base), enumerations
//! `Enum` subclasses, and named non-object types `RootModel`s.

use crate::emit::{emission_order, forward_references, order_fields};
use crate::ir::{Constraints, Field, GeneratedKind, GeneratedType, Model, Primitive, TypeDescriptor};
use crate::naming::{MemberCase, NamingRules};
use crate::options::{CollectionStyle, DefaultStyle, EnumStyle, GeneratorOptions, UnionStyle};
use crate::traits::Backend;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Static instance of the Pydantic backend.
pub static PYDANTIC_BACKEND: PydanticBackend = PydanticBackend;

const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

const RESERVED_TYPES: &[&str] = &[
    "Annotated", "Any", "BaseModel", "Dict", "Enum", "False", "Field", "List", "Literal", "None",
    "Optional", "RootModel", "True", "Union",
];

const LEFT_TO_RIGHT: &str = "union_mode='left_to_right'";

/// Attributes of `pydantic.BaseModel` a field must not shadow.
const RESERVED_FIELDS: &[&str] = &[
    "construct", "copy", "dict", "from_orm", "json", "model_computed_fields", "model_config",
    "model_extra", "model_fields", "model_fields_set", "parse_file", "parse_obj", "parse_raw",
    "schema", "schema_json", "update_forward_refs", "validate",
];

/// Pydantic model backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct PydanticBackend;

impl Backend for PydanticBackend {
    fn name(&self) -> &'static str {
        "pydantic"
    }

    fn language(&self) -> &'static str {
        "python"
    }

    fn extension(&self) -> &'static str {
        "py"
    }

    fn naming_rules(&self) -> NamingRules {
        NamingRules {
            keywords: KEYWORDS,
            reserved_types: RESERVED_TYPES,
            reserved_fields: RESERVED_FIELDS,
            member_case: MemberCase::Value,
            private_underscore: true,
            snake_case_fields: false,
        }
    }

    fn default_base(&self) -> Option<&'static str> {
        Some("pydantic.BaseModel")
    }

    fn render(&self, model: &Model, options: &GeneratorOptions) -> String {
        generate_pydantic(model, options)
    }
}

/// Render `model` as a Python module of Pydantic models.
pub fn generate_pydantic(model: &Model, options: &GeneratorOptions) -> String {
    let order = emission_order(model);
    let forward = forward_references(model, &order);

    let mut position = vec![0; model.types().len()];
    for (i, id) in order.iter().enumerate() {
        position[id.index()] = i;
    }
    let mut renderer = Renderer {
        model,
        options,
        position,
        imports: Imports::default(),
    };

    let blocks: Vec<String> = order
        .iter()
        .enumerate()
        .map(|(pos, id)| renderer.class(model.get(*id), pos))
        .collect();

    let mut out = String::from("# generated by modelgen\n");
    if options.include_timestamp {
        let now = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        out.push_str(&format!("#   timestamp: {now}\n"));
    }
    out.push_str("\nfrom __future__ import annotations\n");
    out.push_str(&renderer.imports.render());
    for block in blocks {
        out.push_str("\n\n");
        out.push_str(&block);
    }
    if !forward.is_empty() {
        out.push_str("\n\n");
        for id in forward {
            out.push_str(&format!("{}.model_rebuild()\n", model.get(id).name));
        }
    }
    out
}

#[derive(Default)]
struct Imports {
    enumeration: bool,
    typing: BTreeSet<&'static str>,
    pydantic: BTreeSet<String>,
    /// Module → names, for configured base classes.
    modules: BTreeMap<String, BTreeSet<String>>,
}

impl Imports {
    /// Import a dotted path and return the name to use in code.
    fn dotted(&mut self, path: &str) -> String {
        match path.rsplit_once('.') {
            Some(("pydantic", name)) => {
                self.pydantic.insert(name.to_string());
                name.to_string()
            }
            Some((module, name)) => {
                self.modules
                    .entry(module.to_string())
                    .or_default()
                    .insert(name.to_string());
                name.to_string()
            }
            None => path.to_string(),
        }
    }

    fn render(&self) -> String {
        let mut out = String::new();
        let mut stdlib = Vec::new();
        if self.enumeration {
            stdlib.push("from enum import Enum".to_string());
        }
        if !self.typing.is_empty() {
            let names: Vec<&str> = self.typing.iter().copied().collect();
            stdlib.push(format!("from typing import {}", names.join(", ")));
        }
        if !stdlib.is_empty() {
            out.push('\n');
            for line in stdlib {
                out.push_str(&line);
                out.push('\n');
            }
        }
        if !self.pydantic.is_empty() {
            let names: Vec<&str> = self.pydantic.iter().map(String::as_str).collect();
            out.push_str(&format!("\nfrom pydantic import {}\n", names.join(", ")));
        }
        if !self.modules.is_empty() {
            out.push('\n');
            for (module, names) in &self.modules {
                let names: Vec<&str> = names.iter().map(String::as_str).collect();
                out.push_str(&format!("from {module} import {}\n", names.join(", ")));
            }
        }
        out
    }
}

struct Renderer<'a> {
    model: &'a Model,
    options: &'a GeneratorOptions,
    /// Index of each type in emission order.
    position: Vec<usize>,
    imports: Imports,
}

impl Renderer<'_> {
    fn class(&mut self, ty: &GeneratedType, pos: usize) -> String {
        match &ty.kind {
            GeneratedKind::Object { fields } => self.object(ty, fields),
            GeneratedKind::Enumeration { members } => {
                self.imports.enumeration = true;
                let values: Vec<&Value> = members.iter().map(|m| &m.value).collect();
                let mixin = match self.options.enum_style {
                    EnumStyle::StringBacked => value_mixin(&values),
                    EnumStyle::Plain => None,
                };
                let mut out = match mixin {
                    Some(mixin) => format!("class {}({mixin}, Enum):\n", ty.name),
                    None => format!("class {}(Enum):\n", ty.name),
                };
                if let Some(doc) = &ty.description {
                    out.push_str(&docstring(doc));
                    out.push('\n');
                }
                for member in members {
                    out.push_str(&format!("    {} = {}\n", member.name, py_literal(&member.value)));
                }
                out
            }
            GeneratedKind::Alias { target } => {
                self.imports.pydantic.insert("RootModel".to_string());
                let forward = target
                    .references()
                    .iter()
                    .any(|r| self.position[r.id.index()] >= pos);
                let (root, constraints) = target.split_constraints();
                let parameter = self.annotation(&root, forward.then_some(pos));
                let annotation = self.annotation(&root, None);
                let mut out = format!("class {}(RootModel[{parameter}]):\n", ty.name);
                if let Some(doc) = &ty.description {
                    out.push_str(&docstring(doc));
                    out.push('\n');
                }

                let mut arguments = constraints.map(constraint_arguments).unwrap_or_default();
                if is_union(&root) {
                    arguments.push(LEFT_TO_RIGHT.to_string());
                }
                if arguments.is_empty() {
                    out.push_str(&format!("    root: {annotation}\n"));
                } else {
                    self.imports.pydantic.insert("Field".to_string());
                    out.push_str(&format!(
                        "    root: {annotation} = Field(..., {})\n",
                        arguments.join(", ")
                    ));
                }
                out
            }
        }
    }

    fn object(&mut self, ty: &GeneratedType, fields: &[Field]) -> String {
        let base_path = ty
            .base
            .as_deref()
            .unwrap_or_else(|| PYDANTIC_BACKEND.default_base().unwrap_or("BaseModel"));
        let base = self.imports.dotted(base_path);

        let mut out = format!("class {}({base}):\n", ty.name);
        if let Some(doc) = &ty.description {
            out.push_str(&docstring(doc));
            if !fields.is_empty() {
                out.push('\n');
            }
        } else if fields.is_empty() {
            out.push_str("    pass\n");
        }

        let defaults_last = PYDANTIC_BACKEND.requires_defaults_last();
        for field in order_fields(fields, self.options.field_order, defaults_last) {
            let line = self.field(field);
            out.push_str(&format!("    {line}\n"));
        }
        out
    }

    fn field(&mut self, field: &Field) -> String {
        let (ty, constraints) = field.ty.split_constraints();
        let annotation = self.annotation(&ty, None);
        let default = match &field.default {
            Some(value) => Some(self.value(&ty, value)),
            None if !field.required => Some("None".to_string()),
            None => None,
        };

        let mut arguments = Vec::new();
        if field.is_aliased() {
            arguments.push(format!("alias={}", py_str(&field.wire_name)));
        }
        if let Some(title) = &field.title {
            arguments.push(format!("title={}", py_str(title)));
        }
        if let Some(description) = &field.description {
            arguments.push(format!("description={}", py_str(description)));
        }
        if !field.examples.is_empty() {
            arguments.push(format!("examples={}", py_literal(&Value::Array(field.examples.clone()))));
        }
        if let Some(constraints) = constraints {
            arguments.extend(constraint_arguments(constraints));
        }
        if is_union(&ty) {
            arguments.push(LEFT_TO_RIGHT.to_string());
        }

        if arguments.is_empty() {
            return match default {
                Some(default) => format!("{}: {annotation} = {default}", field.name),
                None => format!("{}: {annotation}", field.name),
            };
        }

        self.imports.pydantic.insert("Field".to_string());
        let first = match (default, self.options.default_style) {
            (None, _) => "...".to_string(),
            (Some(default), DefaultStyle::Keyword) => format!("default={default}"),
            (Some(default), DefaultStyle::Positional) => default,
        };
        format!(
            "{}: {annotation} = Field({first}, {})",
            field.name,
            arguments.join(", ")
        )
    }

    /// A default value; enumeration values are spelled as their member.
    fn value(&self, ty: &TypeDescriptor, value: &Value) -> String {
        let inner = match ty {
            TypeDescriptor::Optional(inner) => inner.as_ref(),
            other => other,
        };
        if let TypeDescriptor::Enumeration(r) = inner {
            let generated = self.model.get(r.id);
            if let GeneratedKind::Enumeration { members } = &generated.kind {
                if let Some(member) = members.iter().find(|m| m.value == *value) {
                    return format!("{}.{}", generated.name, member.name);
                }
            }
        }
        py_literal(value)
    }

    /// Type annotation for `ty`.
    ///
    /// With `quote_from`, names emitted at or after that position are quoted
    /// and unions use `Union[...]`/`Optional[...]`, since the result is
    /// evaluated while the class is being defined.
    fn annotation(&mut self, ty: &TypeDescriptor, quote_from: Option<usize>) -> String {
        let wrapper = quote_from.is_some() || self.options.union_style == UnionStyle::Wrapper;
        match ty {
            TypeDescriptor::Primitive(p) => match p {
                Primitive::String => "str".to_string(),
                Primitive::Integer => "int".to_string(),
                Primitive::Number => "float".to_string(),
                Primitive::Boolean => "bool".to_string(),
                Primitive::Null => "None".to_string(),
                Primitive::Any => {
                    self.imports.typing.insert("Any");
                    "Any".to_string()
                }
            },
            TypeDescriptor::Enumeration(r) | TypeDescriptor::Object(r) | TypeDescriptor::Alias(r) => {
                let name = &self.model.get(r.id).name;
                match quote_from {
                    Some(pos) if self.position[r.id.index()] >= pos => format!("'{name}'"),
                    _ => name.clone(),
                }
            }
            TypeDescriptor::Union(branches) => {
                let parts: Vec<String> = branches
                    .iter()
                    .map(|b| self.annotation(b, quote_from))
                    .collect();
                if wrapper {
                    self.imports.typing.insert("Union");
                    format!("Union[{}]", parts.join(", "))
                } else {
                    parts.join(" | ")
                }
            }
            TypeDescriptor::Optional(inner) => {
                let inner = self.annotation(inner, quote_from);
                if wrapper {
                    self.imports.typing.insert("Optional");
                    format!("Optional[{inner}]")
                } else {
                    format!("{inner} | None")
                }
            }
            TypeDescriptor::Sequence(item) => {
                let item = self.element(item, quote_from);
                match self.options.collection_style {
                    CollectionStyle::Builtin => format!("list[{item}]"),
                    CollectionStyle::Typing => {
                        self.imports.typing.insert("List");
                        format!("List[{item}]")
                    }
                }
            }
            TypeDescriptor::Mapping(value) => {
                let value = self.element(value, quote_from);
                match self.options.collection_style {
                    CollectionStyle::Builtin => format!("dict[str, {value}]"),
                    CollectionStyle::Typing => {
                        self.imports.typing.insert("Dict");
                        format!("Dict[str, {value}]")
                    }
                }
            }
            TypeDescriptor::Literal(value) => {
                self.imports.typing.insert("Literal");
                format!("Literal[{}]", py_literal(value))
            }
            TypeDescriptor::Constrained(inner, constraints) => {
                let inner = self.annotation(inner, quote_from);
                self.annotated(inner, constraint_arguments(constraints))
            }
        }
    }

    /// A list item or map value. Unions there get no `Field` of their own, so
    /// first-match validation is attached with `Annotated`.
    fn element(&mut self, ty: &TypeDescriptor, quote_from: Option<usize>) -> String {
        let annotation = self.annotation(ty, quote_from);
        if is_union(ty) {
            self.annotated(annotation, vec![LEFT_TO_RIGHT.to_string()])
        } else {
            annotation
        }
    }

    fn annotated(&mut self, annotation: String, arguments: Vec<String>) -> String {
        if arguments.is_empty() {
            return annotation;
        }
        self.imports.typing.insert("Annotated");
        self.imports.pydantic.insert("Field".to_string());
        format!("Annotated[{annotation}, Field({})]", arguments.join(", "))
    }
}

/// `Field` keyword arguments for validation keywords.
///
/// `format` is an annotation and `uniqueItems` has no pydantic 2 keyword;
/// neither is rendered.
fn constraint_arguments(constraints: &Constraints) -> Vec<String> {
    let mut out = Vec::new();
    let min = constraints
        .min_length
        .or(constraints.min_items)
        .or(constraints.min_properties);
    let max = constraints
        .max_length
        .or(constraints.max_items)
        .or(constraints.max_properties);
    if let Some(n) = min {
        out.push(format!("min_length={n}"));
    }
    if let Some(n) = max {
        out.push(format!("max_length={n}"));
    }
    if let Some(pattern) = &constraints.pattern {
        out.push(format!("pattern={}", py_str(pattern)));
    }
    let bounds = [
        ("gt", &constraints.exclusive_minimum),
        ("ge", &constraints.minimum),
        ("lt", &constraints.exclusive_maximum),
        ("le", &constraints.maximum),
        ("multiple_of", &constraints.multiple_of),
    ];
    for (keyword, bound) in bounds {
        if let Some(n) = bound {
            out.push(format!("{keyword}={n}"));
        }
    }
    out
}

fn is_union(ty: &TypeDescriptor) -> bool {
    match ty {
        TypeDescriptor::Union(_) => true,
        TypeDescriptor::Optional(inner) => is_union(inner),
        _ => false,
    }
}

/// `str`/`int`/`float` when every value has that type.
fn value_mixin(values: &[&Value]) -> Option<&'static str> {
    if values.iter().all(|v| v.is_string()) {
        Some("str")
    } else if values.iter().all(|v| v.is_i64() || v.is_u64()) {
        Some("int")
    } else if values.iter().all(|v| v.is_number()) {
        Some("float")
    } else {
        None
    }
}

fn docstring(text: &str) -> String {
    let mut out = String::from("    \"\"\"\n");
    for line in text.replace('\\', "\\\\").replace("\"\"\"", "\\\"\\\"\\\"").lines() {
        let line = line.trim_end();
        if line.is_empty() {
            out.push('\n');
        } else {
            out.push_str(&format!("    {line}\n"));
        }
    }
    out.push_str("    \"\"\"\n");
    out
}

fn py_str(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

fn py_literal(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => py_str(s),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(py_literal).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", py_str(k), py_literal(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Dialect;
    use serde_json::json;

    fn class_index(out: &str, name: &str) -> usize {
        out.find(&format!("class {name}("))
            .unwrap_or_else(|| panic!("class {name} not emitted:\n{out}"))
    }

    fn render(doc: Value, options: &GeneratorOptions) -> String {
        crate::generate_str(&doc.to_string(), Dialect::Auto, options, &PYDANTIC_BACKEND).unwrap()
    }

    #[test]
    fn small_model() {
        let out = render(
            json!({
                "title": "Pet",
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "kind": { "enum": ["cat", "dog"], "title": "Kind" },
                    "in": { "type": "integer", "default": 1 }
                },
                "required": ["name", "kind"]
            }),
            &GeneratorOptions::default(),
        );
        insta::assert_snapshot!(out, @r"
        # generated by modelgen

        from __future__ import annotations

        from enum import Enum

        from pydantic import BaseModel, Field


        class Kind(str, Enum):
            cat = 'cat'
            dog = 'dog'


        class Model(BaseModel):
            name: str
            kind: Kind
            in_: int | None = Field(default=1, alias='in')
        ");
    }

    #[test]
    fn wrapper_and_typing_styles() {
        let options = GeneratorOptions {
            union_style: UnionStyle::Wrapper,
            collection_style: CollectionStyle::Typing,
            default_style: DefaultStyle::Positional,
            ..GeneratorOptions::default()
        };
        let out = render(
            json!({
                "type": "object",
                "properties": {
                    "tags": { "type": "array", "items": { "type": "string" }, "description": "Tags." },
                    "extra": { "type": "object", "additionalProperties": { "type": "integer" } },
                    "value": { "anyOf": [{ "type": "string" }, { "type": "integer" }] }
                },
                "required": ["value"]
            }),
            &options,
        );
        assert!(out.contains("from typing import Dict, List, Optional, Union"), "{out}");
        assert!(
            out.contains("tags: Optional[List[str]] = Field(None, description='Tags.')"),
            "{out}"
        );
        assert!(out.contains("extra: Optional[Dict[str, int]] = None"), "{out}");
        assert!(
            out.contains("value: Union[str, int] = Field(..., union_mode='left_to_right')"),
            "{out}"
        );
    }

    #[test]
    fn literal_defaults_and_enum_members() {
        let out = render(
            json!({
                "type": "object",
                "properties": {
                    "kind": { "const": "task" },
                    "role": { "$ref": "#/definitions/Role" },
                    "code": { "$ref": "#/definitions/Code" }
                },
                "required": ["kind"],
                "definitions": {
                    "Role": { "enum": ["agent", "user"], "default": "user" },
                    "Code": { "enum": [1, 2], "description": "Error code." }
                }
            }),
            &GeneratorOptions::default(),
        );
        assert!(out.contains("kind: Literal['task'] = 'task'"), "{out}");
        assert!(out.contains("class Code(int, Enum):\n    \"\"\"\n    Error code.\n    \"\"\"\n\n    integer_1 = 1\n"), "{out}");
        assert!(out.contains("role: Role | None = None"), "{out}");
    }

    #[test]
    fn enum_default_uses_member() {
        let out = render(
            json!({
                "type": "object",
                "properties": { "role": { "enum": ["agent", "user"], "title": "Role", "default": "user" } }
            }),
            &GeneratorOptions::default(),
        );
        assert!(out.contains("role: Role | None = Role.user"), "{out}");
    }

    #[test]
    fn plain_enum_style() {
        let options = GeneratorOptions {
            enum_style: EnumStyle::Plain,
            ..GeneratorOptions::default()
        };
        let out = render(json!({ "title": "Color", "enum": ["red", "green"] }), &options);
        assert!(out.contains("class Model(Enum):"), "{out}");
    }

    #[test]
    fn configured_base_is_imported() {
        let options = GeneratorOptions {
            base_class: Some("a2a._base.A2ABaseModel".into()),
            root_name: "A2A".into(),
            ..GeneratorOptions::default()
        };
        let out = render(
            json!({
                "definitions": {
                    "Task": { "type": "object", "properties": { "id": { "type": "string" } } }
                }
            }),
            &options,
        );
        assert!(out.contains("from a2a._base import A2ABaseModel\n"), "{out}");
        assert!(out.contains("class Task(A2ABaseModel):"), "{out}");
        assert!(out.contains("class A2A(RootModel[Any]):\n    root: Any\n"), "{out}");
        assert!(!out.contains("BaseModel,"), "{out}");
    }

    #[test]
    fn recursive_types_are_rebuilt() {
        let out = render(
            json!({
                "definitions": {
                    "Node": {
                        "type": "object",
                        "properties": {
                            "children": { "type": "array", "items": { "$ref": "#/definitions/Node" } }
                        }
                    },
                    "Tree": { "anyOf": [{ "$ref": "#/definitions/Node" }, { "type": "null" }] }
                }
            }),
            &GeneratorOptions::default(),
        );
        assert!(out.contains("children: list[Node] | None = None"), "{out}");
        assert!(out.contains("\nNode.model_rebuild()\n"), "{out}");
        assert!(class_index(&out, "Node") < class_index(&out, "Tree"));
        assert!(out.contains("class Tree(RootModel[Node | None]):"), "{out}");
    }

    #[test]
    fn unions_validate_left_to_right_everywhere() {
        let out = render(
            json!({
                "type": "object",
                "properties": {
                    "direct": { "$ref": "#/definitions/Part" },
                    "parts": { "type": "array", "items": { "$ref": "#/definitions/Part" } },
                    "inline": {
                        "type": "array",
                        "items": { "anyOf": [{ "$ref": "#/definitions/A" }, { "$ref": "#/definitions/B" }] }
                    },
                    "byName": {
                        "type": "object",
                        "additionalProperties": { "anyOf": [{ "type": "string" }, { "type": "integer" }] }
                    }
                },
                "required": ["direct", "parts", "inline"],
                "definitions": {
                    "A": { "type": "object", "properties": { "a": { "type": "string" } }, "required": ["a"] },
                    "B": {
                        "type": "object",
                        "properties": { "a": { "type": "string" }, "b": { "type": "integer" } },
                        "required": ["a"]
                    },
                    "Part": { "anyOf": [{ "$ref": "#/definitions/A" }, { "$ref": "#/definitions/B" }] }
                }
            }),
            &GeneratorOptions::default(),
        );
        assert!(
            out.contains("class Part(RootModel[A | B]):\n    root: A | B = Field(..., union_mode='left_to_right')\n"),
            "{out}"
        );
        assert!(out.contains("    direct: Part\n"), "{out}");
        assert!(out.contains("    parts: list[Part]\n"), "{out}");
        assert!(
            out.contains("    inline: list[Annotated[A | B, Field(union_mode='left_to_right')]]\n"),
            "{out}"
        );
        assert!(
            out.contains("    byName: dict[str, Annotated[str | int, Field(union_mode='left_to_right')]] | None = None\n"),
            "{out}"
        );
        assert!(out.contains("from typing import Annotated\n"), "{out}");
    }

    #[test]
    fn validation_keywords_become_field_arguments() {
        let out = render(
            json!({
                "definitions": {
                    "Code": { "type": "string", "maxLength": 3, "pattern": "^[A-Z]+$" }
                },
                "type": "object",
                "properties": {
                    "code": { "type": "string", "maxLength": 3, "pattern": "^[A-Z]+$" },
                    "score": { "type": "number", "minimum": 0, "exclusiveMaximum": 1 },
                    "tags": {
                        "type": "array",
                        "items": { "type": "string", "minLength": 1 },
                        "minItems": 1
                    },
                    "ref": { "$ref": "#/definitions/Code" }
                },
                "required": ["code", "tags"]
            }),
            &GeneratorOptions::default(),
        );
        assert!(
            out.contains("    code: str = Field(..., max_length=3, pattern='^[A-Z]+$')\n"),
            "{out}"
        );
        assert!(out.contains("    score: float | None = Field(default=None, ge=0, lt=1)\n"), "{out}");
        assert!(
            out.contains("    tags: list[Annotated[str, Field(min_length=1)]] = Field(..., min_length=1)\n"),
            "{out}"
        );
        assert!(
            out.contains("class Code(RootModel[str]):\n    root: str = Field(..., max_length=3, pattern='^[A-Z]+$')\n"),
            "{out}"
        );
        assert!(out.contains("    ref: Code | None = None\n"), "{out}");
    }

    #[test]
    fn structured_constants_are_not_literals() {
        let out = render(
            json!({
                "properties": {
                    "config": { "const": { "a": 1 } },
                    "v": { "enum": [{ "a": 1 }, [1], "x"] }
                }
            }),
            &GeneratorOptions::default(),
        );
        assert!(out.contains("    config: dict[str, Any] | None = None\n"), "{out}");
        assert!(
            out.contains("    v: dict[str, Any] | list[Any] | Literal['x'] | None = Field(default=None, union_mode='left_to_right')\n"),
            "{out}"
        );
        assert!(!out.contains("Literal[{"), "{out}");
        assert!(!out.contains("Literal[["), "{out}");
    }

    #[test]
    fn timestamp_only_when_asked() {
        let doc = json!({ "type": "string" });
        assert!(!render(doc.clone(), &GeneratorOptions::default()).contains("timestamp"));
        let options = GeneratorOptions {
            include_timestamp: true,
            ..GeneratorOptions::default()
        };
        assert!(render(doc, &options).contains("#   timestamp: "));
    }

    #[test]
    fn python_literals() {
        assert_eq!(py_literal(&json!({"a": [1, true, null]})), "{'a': [1, True, None]}");
        assert_eq!(py_str("it's\n"), "'it\\'s\\n'");
    }
}
