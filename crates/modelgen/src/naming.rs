//! Identifier assignment.
//!
//! [`NameRegistry`] hands out type names keyed by schema path: the first path
//! to ask for a name gets it, later paths asking for the same name get a
//! numeric suffix, and a path asking again gets its earlier answer. Field and
//! enum member names only need to be unique within their type, which a
//! [`Scope`] tracks.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashSet;

/// How enumeration member identifiers are spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemberCase {
    /// Derived from the value as written (`input_required`).
    #[default]
    Value,
    /// PascalCase (`InputRequired`).
    Pascal,
}

/// A backend's identifier policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct NamingRules {
    /// Words no field or member identifier may be.
    pub keywords: &'static [&'static str],
    /// Type names the target already uses.
    pub reserved_types: &'static [&'static str],
    /// Field names that would shadow members of the base type.
    pub reserved_fields: &'static [&'static str],
    pub member_case: MemberCase,
    /// A leading underscore makes an attribute private.
    pub private_underscore: bool,
    /// Field identifiers are always snake_case.
    pub snake_case_fields: bool,
}

/// Names already used inside one generated type.
#[derive(Debug, Default)]
pub struct Scope {
    taken: HashSet<String>,
}

impl Scope {
    fn unique(&mut self, base: String) -> String {
        let mut candidate = base.clone();
        let mut suffix = 2;
        while !self.taken.insert(candidate.clone()) {
            candidate = format!("{base}_{suffix}");
            suffix += 1;
        }
        candidate
    }
}

/// Schema path → type name, unique across the whole model.
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    rules: NamingRules,
    snake_case_fields: bool,
    by_path: IndexMap<String, String>,
    taken: HashSet<String>,
}

impl NameRegistry {
    pub fn new(rules: NamingRules, snake_case_fields: bool) -> Self {
        let taken = rules.reserved_types.iter().map(|s| s.to_string()).collect();
        Self {
            rules,
            snake_case_fields: snake_case_fields || rules.snake_case_fields,
            by_path: IndexMap::new(),
            taken,
        }
    }

    /// Name for the type generated at `path`.
    ///
    /// `candidate` is sanitized to PascalCase; on collision with another path
    /// the result is suffixed `2`, `3`, ... until free.
    pub fn type_name(&mut self, path: &str, candidate: &str) -> String {
        if let Some(existing) = self.by_path.get(path) {
            return existing.clone();
        }
        let base = type_identifier(candidate);
        let mut name = base.clone();
        let mut suffix = 2;
        loop {
            match self.claim(path, &name) {
                Ok(()) => return name,
                Err(collision) => {
                    tracing::trace!(%collision, "disambiguating type name");
                    name = format!("{base}{suffix}");
                    suffix += 1;
                }
            }
        }
    }

    fn claim(&mut self, path: &str, name: &str) -> Result<()> {
        if !self.taken.insert(name.to_string()) {
            return Err(Error::NameCollision {
                pointer: path.to_string(),
                name: name.to_string(),
            });
        }
        self.by_path.insert(path.to_string(), name.to_string());
        Ok(())
    }

    /// Identifier for a property, unique within `scope`.
    pub fn field_name(&self, scope: &mut Scope, wire_name: &str) -> String {
        let mut ident = sanitize(wire_name);
        if self.snake_case_fields {
            ident = to_snake_case(&ident);
        }
        if ident.is_empty() || ident.chars().all(|c| c == '_') {
            ident = format!("field{ident}");
        }
        ident = self.guard(ident);
        if self.rules.reserved_fields.contains(&ident.as_str()) {
            ident.push('_');
        }
        scope.unique(ident)
    }

    /// Identifier for an enumeration member, unique within `scope`.
    pub fn member_name(&self, scope: &mut Scope, value: &Value) -> String {
        let raw = match value {
            Value::String(s) => sanitize(s),
            Value::Number(n) => {
                let kind = if n.is_f64() { "number" } else { "integer" };
                let text = n.to_string().replace('-', "minus_");
                format!("{kind}_{}", sanitize(&text))
            }
            Value::Bool(b) => b.to_string(),
            Value::Null => "none".to_string(),
            other => sanitize(&other.to_string()),
        };
        let ident = match self.rules.member_case {
            MemberCase::Value => raw,
            MemberCase::Pascal => to_pascal_case(&raw),
        };
        let ident = if ident.is_empty() { "empty".to_string() } else { ident };
        scope.unique(self.guard(ident))
    }

    /// Leading digits, private underscores and keywords.
    fn guard(&self, mut ident: String) -> String {
        if ident.starts_with(|c: char| c.is_ascii_digit()) {
            ident.insert_str(0, "field_");
        } else if self.rules.private_underscore && ident.starts_with('_') {
            ident.insert_str(0, "field");
        }
        if self.rules.keywords.contains(&ident.as_str()) {
            ident.push('_');
        }
        ident
    }
}

/// Replace every character outside `[A-Za-z0-9_]` with `_`.
pub fn sanitize(input: &str) -> String {
    input
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn type_identifier(candidate: &str) -> String {
    let name = to_pascal_case(candidate);
    if name.is_empty() {
        "Model".to_string()
    } else if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("Model{name}")
    } else {
        name
    }
}

/// Split on separators and case changes: `HTTPServerV2` → `HTTP`, `Server`, `V2`.
fn words(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if !c.is_ascii_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_ascii_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_lower)
            {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

pub fn to_pascal_case(input: &str) -> String {
    words(input)
        .into_iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

pub fn to_snake_case(input: &str) -> String {
    let leading = input.len() - input.trim_start_matches('_').len();
    let body = words(input)
        .into_iter()
        .map(|w| w.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("_");
    format!("{}{body}", "_".repeat(leading))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PY: NamingRules = NamingRules {
        keywords: &["in", "class", "None", "from"],
        reserved_types: &["Any", "Enum"],
        reserved_fields: &["schema"],
        member_case: MemberCase::Value,
        private_underscore: true,
        snake_case_fields: false,
    };

    #[test]
    fn case_conversion() {
        assert_eq!(to_pascal_case("task status"), "TaskStatus");
        assert_eq!(to_pascal_case("input-required"), "InputRequired");
        assert_eq!(to_pascal_case("TaskStatusUpdateEvent"), "TaskStatusUpdateEvent");
        assert_eq!(to_pascal_case("A2A"), "A2A");
        assert_eq!(to_snake_case("taskId"), "task_id");
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
        assert_eq!(to_snake_case("_meta"), "_meta");
    }

    #[test]
    fn colliding_titles_get_suffixes() {
        let mut names = NameRegistry::new(PY, false);
        assert_eq!(names.type_name("#/definitions/TaskStatus", "Status"), "Status");
        assert_eq!(names.type_name("#/definitions/PushStatus", "Status"), "Status2");
        assert_eq!(names.type_name("#/definitions/Other", "Status"), "Status3");
        // Asking again for a path returns its original answer.
        assert_eq!(names.type_name("#/definitions/PushStatus", "Whatever"), "Status2");
    }

    #[test]
    fn reserved_type_names_are_avoided() {
        let mut names = NameRegistry::new(PY, false);
        assert_eq!(names.type_name("#/definitions/Any", "Any"), "Any2");
        assert_eq!(names.type_name("#/definitions/x", "1st"), "Model1st");
    }

    #[test]
    fn field_identifiers() {
        let names = NameRegistry::new(PY, false);
        let mut scope = Scope::default();
        assert_eq!(names.field_name(&mut scope, "in"), "in_");
        assert_eq!(names.field_name(&mut scope, "task-id"), "task_id");
        assert_eq!(names.field_name(&mut scope, "task_id"), "task_id_2");
        assert_eq!(names.field_name(&mut scope, "2fa"), "field_2fa");
        assert_eq!(names.field_name(&mut scope, "_meta"), "field_meta");
        assert_eq!(names.field_name(&mut scope, "schema"), "schema_");
    }

    #[test]
    fn snake_case_fields_option() {
        let names = NameRegistry::new(PY, true);
        let mut scope = Scope::default();
        assert_eq!(names.field_name(&mut scope, "contextId"), "context_id");
    }

    #[test]
    fn member_identifiers() {
        let names = NameRegistry::new(PY, false);
        let mut scope = Scope::default();
        assert_eq!(names.member_name(&mut scope, &json!("input-required")), "input_required");
        assert_eq!(names.member_name(&mut scope, &json!(1)), "integer_1");
        assert_eq!(names.member_name(&mut scope, &json!(1.5)), "number_1_5");
        assert_eq!(names.member_name(&mut scope, &json!(-2)), "integer_minus_2");
        assert_eq!(names.member_name(&mut scope, &json!("None")), "None_");

        let pascal = NameRegistry::new(
            NamingRules {
                member_case: MemberCase::Pascal,
                ..PY
            },
            false,
        );
        let mut scope = Scope::default();
        assert_eq!(pascal.member_name(&mut scope, &json!("input-required")), "InputRequired");
    }
}
