//! Generation options.
//!
//! These are the knobs shared by every backend. The CLI fills them from
//! flags and `modelgen.toml`; library callers build them directly.

use serde::{Deserialize, Serialize};

/// How enumerations are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum EnumStyle {
    /// Members subclass their value type (`class X(str, Enum)`).
    #[default]
    StringBacked,
    /// Plain enumeration.
    Plain,
}

/// How a field's default value is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum DefaultStyle {
    /// `Field(default=...)`
    #[default]
    Keyword,
    /// `Field(...)`
    Positional,
}

/// Spelling of sequences and mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum CollectionStyle {
    /// `list[T]`, `dict[str, T]`
    #[default]
    Builtin,
    /// `List[T]`, `Dict[str, T]`
    Typing,
}

/// Spelling of unions and optionals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum UnionStyle {
    /// `A | B`, `T | None`
    #[default]
    Operator,
    /// `Union[A, B]`, `Optional[T]`
    Wrapper,
}

/// Order of fields within a generated object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum FieldOrder {
    /// Schema declaration order.
    #[default]
    Declared,
    /// Required fields first, declaration order within each group.
    RequiredFirst,
}

/// Options for one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct GeneratorOptions {
    /// Name of the type generated for the document root.
    pub root_name: String,
    /// Dotted path of the base every object model extends. `None` uses the
    /// backend's own default.
    pub base_class: Option<String>,
    pub enum_style: EnumStyle,
    /// Replace single-value enumerations with a literal type.
    pub collapse_single_enums: bool,
    pub default_style: DefaultStyle,
    pub collection_style: CollectionStyle,
    pub union_style: UnionStyle,
    /// Carry titles, descriptions and examples into the output.
    pub include_docs: bool,
    /// Stamp the generation time into the header.
    pub include_timestamp: bool,
    pub field_order: FieldOrder,
    /// Convert property names to snake_case, keeping the wire name as alias.
    pub snake_case_fields: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            root_name: "Model".to_string(),
            base_class: None,
            enum_style: EnumStyle::default(),
            collapse_single_enums: true,
            default_style: DefaultStyle::default(),
            collection_style: CollectionStyle::default(),
            union_style: UnionStyle::default(),
            include_docs: true,
            include_timestamp: false,
            field_order: FieldOrder::default(),
            snake_case_fields: false,
        }
    }
}
