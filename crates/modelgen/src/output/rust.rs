//! Rust backend: serde structs and enums.
//!
//! Unions become `#[serde(untagged)]` enums, which serde tries in declaration
//! order. String constants become one-variant enums, so an untagged union can
//! tell apart variants that differ only in a tag value. Edges that close a
//! cycle are boxed unless a collection already provides the indirection.

use crate::emit::{emission_order, order_fields};
use crate::ir::{Field, GeneratedKind, GeneratedType, Model, Primitive, TypeDescriptor};
use crate::naming::{MemberCase, NameRegistry, NamingRules, to_pascal_case};
use crate::options::GeneratorOptions;
use crate::traits::Backend;
use serde_json::Value;
use std::collections::HashSet;

/// Static instance of the Rust backend.
pub static RUST_BACKEND: RustBackend = RustBackend;

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl",
    "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "self", "Self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

const RESERVED_TYPES: &[&str] = &[
    "BTreeMap", "Box", "Deserialize", "Option", "Result", "Self", "Serialize", "String", "Value",
    "Vec",
];

/// Rust type backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustBackend;

impl Backend for RustBackend {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn language(&self) -> &'static str {
        "rust"
    }

    fn extension(&self) -> &'static str {
        "rs"
    }

    fn naming_rules(&self) -> NamingRules {
        NamingRules {
            keywords: KEYWORDS,
            reserved_types: RESERVED_TYPES,
            reserved_fields: &[],
            member_case: MemberCase::Pascal,
            private_underscore: false,
            snake_case_fields: true,
        }
    }

    fn render(&self, model: &Model, options: &GeneratorOptions) -> String {
        generate_rust_types(model, options)
    }
}

/// Render `model` as a Rust module of serde types.
pub fn generate_rust_types(model: &Model, options: &GeneratorOptions) -> String {
    let order = emission_order(model);
    let mut position = vec![0; model.types().len()];
    for (i, id) in order.iter().enumerate() {
        position[id.index()] = i;
    }
    let mut renderer = Renderer {
        model,
        options,
        position,
        names: model.names().clone(),
        uses_map: false,
    };
    let items: Vec<String> = order
        .iter()
        .enumerate()
        .map(|(pos, id)| renderer.item(model.get(*id), pos))
        .collect();

    let mut out = String::from("// generated by modelgen\n");
    if options.include_timestamp {
        let now = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        out.push_str(&format!("//   timestamp: {now}\n"));
    }
    out.push_str("\nuse serde::{Deserialize, Serialize};\n");
    if renderer.uses_map {
        out.push_str("use std::collections::BTreeMap;\n");
    }
    for item in items {
        out.push('\n');
        out.push_str(&item);
    }
    out
}

struct Renderer<'a> {
    model: &'a Model,
    options: &'a GeneratorOptions,
    position: Vec<usize>,
    /// Copy of the model's names, extended with auxiliary union enums.
    names: NameRegistry,
    uses_map: bool,
}

impl Renderer<'_> {
    fn item(&mut self, ty: &GeneratedType, pos: usize) -> String {
        let mut aux = Vec::new();
        let mut out = String::new();
        if let Some(doc) = &ty.description {
            doc_comment(&mut out, doc, "");
        }
        match &ty.kind {
            GeneratedKind::Object { fields } => self.structure(&mut out, ty, fields, pos, &mut aux),
            GeneratedKind::Enumeration { .. } => enumeration(&mut out, ty),
            GeneratedKind::Alias {
                target: TypeDescriptor::Union(branches),
            } => {
                let body = self.untagged(&ty.name, branches, pos, &ty.pointer, &mut aux);
                out.push_str(&body);
            }
            GeneratedKind::Alias { target } => {
                let inner = self.rust_type(target, pos, &ty.name, &ty.pointer, false, &mut aux);
                out.push_str("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]\n");
                out.push_str("#[serde(transparent)]\n");
                out.push_str(&format!("pub struct {}(pub {inner});\n", ty.name));
            }
        }
        // Numeric enumerations are plain aliases of a primitive.
        let nominal = !matches!(
            &ty.kind,
            GeneratedKind::Enumeration { members } if !members.iter().all(|m| m.value.is_string())
        );
        if let Some(base) = ty.base.as_ref().or(self.options.base_class.as_ref()) {
            if nominal {
                out.push_str(&format!("\nimpl {} for {} {{}}\n", base.replace('.', "::"), ty.name));
            }
        }
        aux.push(out);
        aux.join("\n")
    }

    fn structure(
        &mut self,
        out: &mut String,
        ty: &GeneratedType,
        fields: &[Field],
        pos: usize,
        aux: &mut Vec<String>,
    ) {
        out.push_str("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]\n");
        out.push_str(&format!("pub struct {} {{\n", ty.name));
        for field in order_fields(fields, self.options.field_order, false) {
            let hint = format!("{}{}", ty.name, to_pascal_case(&field.wire_name));
            let rust_type = self.rust_type(&field.ty, pos, &hint, &field.pointer, false, aux);

            if let Some(description) = &field.description {
                doc_comment(out, description, "    ");
            }
            if let (_, Some(constraints)) = field.ty.split_constraints() {
                let keywords: Vec<String> = constraints
                    .keywords()
                    .into_iter()
                    .map(|(keyword, value)| format!("`{keyword}: {value}`"))
                    .collect();
                out.push_str(&format!("    /// Constraints: {}.\n", keywords.join(", ")));
            }
            match literal_value(&field.ty) {
                Some(value) => out.push_str(&format!("    /// Always `{value}`.\n")),
                None => {
                    if let Some(default) = &field.default {
                        out.push_str(&format!("    /// Defaults to `{default}`.\n"));
                    }
                }
            }

            let mut attributes = Vec::new();
            if field.is_aliased() {
                attributes.push(format!("rename = {:?}", field.wire_name));
            }
            if field.ty.is_optional() {
                attributes.push("default".to_string());
                attributes.push("skip_serializing_if = \"Option::is_none\"".to_string());
            }
            if !attributes.is_empty() {
                out.push_str(&format!("    #[serde({})]\n", attributes.join(", ")));
            }
            out.push_str(&format!("    pub {}: {rust_type},\n", field.name));
        }
        out.push_str("}\n");
    }

    fn untagged(
        &mut self,
        name: &str,
        branches: &[TypeDescriptor],
        pos: usize,
        path: &str,
        aux: &mut Vec<String>,
    ) -> String {
        let mut out = String::from("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]\n");
        out.push_str("#[serde(untagged)]\n");
        out.push_str(&format!("pub enum {name} {{\n"));
        let mut used = HashSet::new();
        for (i, branch) in branches.iter().enumerate() {
            let variant = unique_variant(&mut used, self.variant_name(branch));
            let inner = self.rust_type(
                branch,
                pos,
                &format!("{name}{variant}"),
                &format!("{path}/{i}"),
                false,
                aux,
            );
            out.push_str(&format!("    {variant}({inner}),\n"));
        }
        out.push_str("}\n");
        out
    }

    /// Rust spelling of `ty` inside the type emitted at `pos`.
    fn rust_type(
        &mut self,
        ty: &TypeDescriptor,
        pos: usize,
        hint: &str,
        path: &str,
        in_collection: bool,
        aux: &mut Vec<String>,
    ) -> String {
        match ty {
            TypeDescriptor::Primitive(p) => primitive(*p).to_string(),
            TypeDescriptor::Enumeration(r) => self.model.get(r.id).name.clone(),
            TypeDescriptor::Object(r) | TypeDescriptor::Alias(r) => {
                let name = &self.model.get(r.id).name;
                if !in_collection && self.position[r.id.index()] >= pos {
                    format!("Box<{name}>")
                } else {
                    name.clone()
                }
            }
            TypeDescriptor::Optional(inner) => {
                let inner = self.rust_type(inner, pos, hint, path, in_collection, aux);
                format!("Option<{inner}>")
            }
            TypeDescriptor::Sequence(item) => {
                let item = self.rust_type(
                    item,
                    pos,
                    &format!("{hint}Item"),
                    &format!("{path}/items"),
                    true,
                    aux,
                );
                format!("Vec<{item}>")
            }
            TypeDescriptor::Mapping(value) => {
                self.uses_map = true;
                let value = self.rust_type(
                    value,
                    pos,
                    &format!("{hint}Value"),
                    &format!("{path}/additionalProperties"),
                    true,
                    aux,
                );
                format!("BTreeMap<String, {value}>")
            }
            TypeDescriptor::Literal(Value::String(value)) => {
                let name = self.names.type_name(&format!("{path}/const"), hint);
                aux.push(literal_enum(&name, value));
                name
            }
            TypeDescriptor::Literal(value) => literal_type(value).to_string(),
            TypeDescriptor::Constrained(inner, _) => {
                self.rust_type(inner, pos, hint, path, in_collection, aux)
            }
            TypeDescriptor::Union(branches) => {
                let name = self.names.type_name(&format!("{path}/union"), hint);
                let body = self.untagged(&name, branches, pos, path, aux);
                aux.push(body);
                name
            }
        }
    }

    fn variant_name(&self, ty: &TypeDescriptor) -> String {
        match ty {
            TypeDescriptor::Enumeration(r) | TypeDescriptor::Object(r) | TypeDescriptor::Alias(r) => {
                self.model.get(r.id).name.clone()
            }
            TypeDescriptor::Primitive(p) => match p {
                Primitive::String => "String",
                Primitive::Integer => "Integer",
                Primitive::Number => "Number",
                Primitive::Boolean => "Boolean",
                Primitive::Null => "Null",
                Primitive::Any => "Value",
            }
            .to_string(),
            TypeDescriptor::Literal(Value::String(s)) => literal_variant(s),
            TypeDescriptor::Literal(_) => "Literal".to_string(),
            TypeDescriptor::Optional(inner) | TypeDescriptor::Constrained(inner, _) => {
                self.variant_name(inner)
            }
            TypeDescriptor::Sequence(_) => "List".to_string(),
            TypeDescriptor::Mapping(_) => "Map".to_string(),
            TypeDescriptor::Union(_) => "Union".to_string(),
        }
    }
}

fn unique_variant(used: &mut HashSet<String>, base: String) -> String {
    let mut name = base.clone();
    let mut suffix = 2;
    while !used.insert(name.clone()) {
        name = format!("{base}{suffix}");
        suffix += 1;
    }
    name
}

fn literal_variant(value: &str) -> String {
    let name = to_pascal_case(value);
    if name.is_empty() {
        "Literal".to_string()
    } else if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("Literal{name}")
    } else {
        name
    }
}

fn literal_enum(name: &str, value: &str) -> String {
    let mut out = String::from(
        "#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]\n",
    );
    out.push_str(&format!("pub enum {name} {{\n"));
    out.push_str("    #[default]\n");
    out.push_str(&format!("    #[serde(rename = {value:?})]\n"));
    out.push_str(&format!("    {},\n", literal_variant(value)));
    out.push_str("}\n");
    out
}

fn enumeration(out: &mut String, ty: &GeneratedType) {
    let GeneratedKind::Enumeration { members } = &ty.kind else {
        return;
    };
    if members.iter().all(|m| m.value.is_string()) {
        out.push_str("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]\n");
        out.push_str(&format!("pub enum {} {{\n", ty.name));
        for member in members {
            if let Value::String(value) = &member.value {
                if *value != member.name {
                    out.push_str(&format!("    #[serde(rename = {value:?})]\n"));
                }
            }
            out.push_str(&format!("    {},\n", member.name));
        }
        out.push_str("}\n");
        return;
    }

    // serde derives only string-tagged unit variants.
    let values: Vec<String> = members.iter().map(|m| format!("`{}`", m.value)).collect();
    if ty.description.is_some() {
        out.push_str("///\n");
    }
    out.push_str(&format!("/// Allowed values: {}.\n", values.join(", ")));
    let underlying = members
        .first()
        .map(|m| literal_type(&m.value))
        .unwrap_or("serde_json::Value");
    out.push_str(&format!("pub type {} = {underlying};\n", ty.name));
}

fn primitive(p: Primitive) -> &'static str {
    match p {
        Primitive::String => "String",
        Primitive::Integer => "i64",
        Primitive::Number => "f64",
        Primitive::Boolean => "bool",
        Primitive::Null => "()",
        Primitive::Any => "serde_json::Value",
    }
}

fn literal_type(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "String",
        Value::Number(n) if n.is_f64() => "f64",
        Value::Number(_) => "i64",
        Value::Bool(_) => "bool",
        Value::Null => "()",
        Value::Array(_) | Value::Object(_) => "serde_json::Value",
    }
}

fn literal_value(ty: &TypeDescriptor) -> Option<&Value> {
    match ty {
        TypeDescriptor::Literal(value) => Some(value),
        TypeDescriptor::Optional(inner) => literal_value(inner),
        _ => None,
    }
}

fn doc_comment(out: &mut String, text: &str, indent: &str) {
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            out.push_str(&format!("{indent}///\n"));
        } else {
            out.push_str(&format!("{indent}/// {line}\n"));
        }
    }
}
