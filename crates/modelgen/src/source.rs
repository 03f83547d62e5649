//! Schema loading.
//!
//! Reads a schema document from a file, standard input, or an HTTP(S) URL,
//! checks it against the JSON Schema meta-schema of its dialect, and parses
//! it into a [`SchemaGraph`].

use crate::error::{Error, Result};
use crate::node::SchemaGraph;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

/// Where a schema document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    File(PathBuf),
    Url(String),
    Stdin,
}

impl SchemaSource {
    /// Interpret a locator: `-` is stdin, `http(s)://` a URL, anything else a path.
    pub fn parse(locator: &str) -> Self {
        if locator == "-" {
            SchemaSource::Stdin
        } else if locator.starts_with("http://") || locator.starts_with("https://") {
            SchemaSource::Url(locator.to_string())
        } else {
            SchemaSource::File(PathBuf::from(locator))
        }
    }

    pub fn locator(&self) -> String {
        match self {
            SchemaSource::File(path) => path.display().to_string(),
            SchemaSource::Url(url) => url.clone(),
            SchemaSource::Stdin => "-".to_string(),
        }
    }
}

/// JSON Schema dialect the document is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum Dialect {
    /// Use the document's `$schema`, or the latest draft when absent.
    #[default]
    Auto,
    Draft4,
    Draft6,
    Draft7,
    #[serde(rename = "draft2019-09")]
    #[cfg_attr(feature = "clap", value(name = "draft2019-09"))]
    Draft201909,
    #[serde(rename = "draft2020-12")]
    #[cfg_attr(feature = "clap", value(name = "draft2020-12"))]
    Draft202012,
}

impl Dialect {
    /// Canonical meta-schema URI, `None` for [`Dialect::Auto`].
    pub fn uri(self) -> Option<&'static str> {
        match self {
            Dialect::Auto => None,
            Dialect::Draft4 => Some("http://json-schema.org/draft-04/schema#"),
            Dialect::Draft6 => Some("http://json-schema.org/draft-06/schema#"),
            Dialect::Draft7 => Some("http://json-schema.org/draft-07/schema#"),
            Dialect::Draft201909 => Some("https://json-schema.org/draft/2019-09/schema"),
            Dialect::Draft202012 => Some("https://json-schema.org/draft/2020-12/schema"),
        }
    }

    /// Recognize a `$schema` value. Scheme and trailing `#` are ignored.
    pub fn from_uri(uri: &str) -> Option<Self> {
        let key = normalize_uri(uri);
        [
            Dialect::Draft4,
            Dialect::Draft6,
            Dialect::Draft7,
            Dialect::Draft201909,
            Dialect::Draft202012,
        ]
        .into_iter()
        .find(|d| d.uri().map(normalize_uri) == Some(key))
    }
}

fn normalize_uri(uri: &str) -> &str {
    let uri = uri
        .strip_prefix("https://")
        .or_else(|| uri.strip_prefix("http://"))
        .unwrap_or(uri);
    uri.trim_end_matches('#')
}

/// Network behavior for URL sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Extra attempts after a transient failure.
    pub retries: u32,
    /// Delay before the first retry; grows linearly per attempt.
    pub backoff: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retries: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadOptions {
    pub dialect: Dialect,
    pub fetch: FetchOptions,
}

/// Read, validate and parse a schema document.
pub fn load(source: &SchemaSource, options: &LoadOptions) -> Result<SchemaGraph> {
    let text = read_source(source, &options.fetch)?;
    tracing::debug!(locator = %source.locator(), bytes = text.len(), "read schema");
    load_str(&text, options.dialect)
}

/// Validate and parse a schema document held in memory.
pub fn load_str(text: &str, dialect: Dialect) -> Result<SchemaGraph> {
    let document: Value = serde_json::from_str(text).map_err(|e| {
        Error::parse(
            "#",
            format!("invalid JSON at line {}, column {}: {e}", e.line(), e.column()),
        )
    })?;
    load_value(document, dialect)
}

/// Validate and parse an already-decoded schema document.
pub fn load_value(mut document: Value, dialect: Dialect) -> Result<SchemaGraph> {
    check_dialect(&mut document, dialect)?;
    validate_meta(&document)?;
    let graph = SchemaGraph::from_value(&document)?;
    tracing::debug!(
        nodes = graph.len(),
        definitions = graph.definitions().len(),
        "parsed schema"
    );
    Ok(graph)
}

/// Reconcile `$schema` with the requested dialect.
fn check_dialect(document: &mut Value, dialect: Dialect) -> Result<()> {
    let Value::Object(map) = document else {
        // Boolean root schemas carry no `$schema`.
        return Ok(());
    };
    let declared = match map.get("$schema") {
        None => None,
        Some(Value::String(uri)) => Some(Dialect::from_uri(uri).ok_or_else(|| {
            Error::parse("#/$schema", format!("unknown JSON Schema dialect `{uri}`"))
        })?),
        Some(_) => return Err(Error::parse("#/$schema", "`$schema` must be a string")),
    };

    match (declared, dialect.uri()) {
        (Some(found), Some(_)) if found != dialect => Err(Error::parse(
            "#/$schema",
            format!("document declares {found:?} but {dialect:?} was requested"),
        )),
        (None, Some(uri)) => {
            map.insert("$schema".to_string(), Value::String(uri.to_string()));
            Ok(())
        }
        _ => Ok(()),
    }
}

fn validate_meta(document: &Value) -> Result<()> {
    jsonschema::meta::validate(document).map_err(|err| {
        let path = err.instance_path.to_string();
        Error::parse(format!("#{path}"), format!("not a valid schema: {err}"))
    })
}

fn read_source(source: &SchemaSource, fetch: &FetchOptions) -> Result<String> {
    let unavailable = |reason: String| Error::SourceUnavailable {
        locator: source.locator(),
        reason,
    };
    match source {
        SchemaSource::File(path) => {
            std::fs::read_to_string(path).map_err(|e| unavailable(e.to_string()))
        }
        SchemaSource::Stdin => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| unavailable(e.to_string()))?;
            Ok(text)
        }
        SchemaSource::Url(url) => fetch_url(url, fetch).map_err(unavailable),
    }
}

/// GET a URL, retrying transport failures, 429 and 5xx with linear backoff.
fn fetch_url(url: &str, fetch: &FetchOptions) -> std::result::Result<String, String> {
    let agent = ureq::AgentBuilder::new().timeout(fetch.timeout).build();
    let mut attempt = 0;
    loop {
        let failure = match agent.get(url).call() {
            Ok(response) => return response.into_string().map_err(|e| e.to_string()),
            Err(ureq::Error::Status(code, _)) if code == 429 || code >= 500 => {
                format!("HTTP {code}")
            }
            Err(ureq::Error::Status(code, response)) => {
                return Err(format!("HTTP {code} {}", response.status_text()));
            }
            Err(ureq::Error::Transport(transport)) => transport.to_string(),
        };

        if attempt >= fetch.retries {
            return Err(format!("{failure} (after {} attempts)", attempt + 1));
        }
        attempt += 1;
        let delay = fetch.backoff * attempt;
        tracing::warn!(url, attempt, ?delay, error = %failure, "retrying schema fetch");
        std::thread::sleep(delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_kinds() {
        assert_eq!(SchemaSource::parse("-"), SchemaSource::Stdin);
        assert_eq!(
            SchemaSource::parse("https://example.com/a.json"),
            SchemaSource::Url("https://example.com/a.json".into())
        );
        assert_eq!(
            SchemaSource::parse("schemas/a.json"),
            SchemaSource::File(PathBuf::from("schemas/a.json"))
        );
    }

    #[test]
    fn dialect_uri_matching_ignores_scheme_and_fragment() {
        assert_eq!(
            Dialect::from_uri("https://json-schema.org/draft-07/schema"),
            Some(Dialect::Draft7)
        );
        assert_eq!(
            Dialect::from_uri("http://json-schema.org/draft/2020-12/schema#"),
            Some(Dialect::Draft202012)
        );
        assert_eq!(Dialect::from_uri("https://example.com/custom"), None);
    }

    #[test]
    fn invalid_json_reports_position() {
        let err = load_str("{\n  \"type\": }", Dialect::Auto).unwrap_err();
        let Error::SchemaParse { message, .. } = &err else {
            panic!("expected parse error, got {err}");
        };
        assert!(message.contains("line 2"), "{message}");
    }

    #[test]
    fn meta_schema_violation_is_a_parse_error() {
        let err = load_str(r#"{"type": 12}"#, Dialect::Draft7).unwrap_err();
        assert!(matches!(err, Error::SchemaParse { .. }), "{err}");
    }

    #[test]
    fn declared_dialect_must_match_requested() {
        let text = r#"{"$schema": "http://json-schema.org/draft-07/schema#", "type": "string"}"#;
        assert!(load_str(text, Dialect::Draft7).is_ok());
        let err = load_str(text, Dialect::Draft4).unwrap_err();
        assert_eq!(err.location(), "#/$schema");
    }

    #[test]
    fn unknown_dialect_is_rejected() {
        let err = load_str(r#"{"$schema": "https://example.com/mine"}"#, Dialect::Auto)
            .unwrap_err();
        assert_eq!(err.location(), "#/$schema");
    }

    #[test]
    fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = SchemaSource::File(dir.path().join("absent.json"));
        let err = load(&source, &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable { .. }));
    }

    #[test]
    fn reads_schema_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        std::fs::write(&path, r#"{"type": "object", "properties": {"a": {"type": "string"}}}"#)
            .unwrap();
        let graph = load(&SchemaSource::File(path), &LoadOptions::default()).unwrap();
        assert!(graph.lookup("#/properties/a").is_some());
    }
}
