use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ScriptError, ScriptResult};
use crate::tag::AttrValue;

/// Parsed configuration consumed by scripts, statements and names.
///
/// Every section has defaults, so an empty TOML document is a valid
/// configuration. Keys are kebab-case:
///
/// ```toml
/// [script.patterns.core]
/// open-tag = "/*-"
/// close-tag = "-*/"
/// description-delimiter = "~"
/// description-index-prefix = "s"
///
/// [sql]
/// desc-is-simple = false
/// named-objects = ["transient table", "table", "view"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub script: ScriptConfig,
    pub sql: SqlConfig,
}

impl Config {
    pub fn from_toml_str(toml_str: &str) -> ScriptResult<Self> {
        let config: Config = toml::from_str(toml_str)?;
        log::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> ScriptResult<Self> {
        let path = path.as_ref();
        let toml_str = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&toml_str)
    }

    pub fn tags(&self) -> &CoreTags {
        &self.script.patterns.core
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScriptConfig {
    pub patterns: Patterns,
    #[serde(rename = "tag-to-type-xref")]
    pub types: TagTypes,
    /// Marker templates keyed by their `__name__` token.
    pub markers: IndexMap<String, MarkerTemplate>,
    /// Appended to executed sql as `limit N`; 0 or -1 disables it.
    pub result_limit: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Patterns {
    pub core: CoreTags,
    pub wildcards: Wildcards,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CoreTags {
    pub open_tag: String,
    pub close_tag: String,
    pub description_delimiter: String,
    pub description_index_prefix: String,
}

impl Default for CoreTags {
    fn default() -> Self {
        Self {
            open_tag: "/*-".to_owned(),
            close_tag: "-*/".to_owned(),
            description_delimiter: "~".to_owned(),
            description_index_prefix: "s".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Wildcards {
    pub wildcard_character: String,
}

impl Default for Wildcards {
    fn default() -> Self {
        Self {
            wildcard_character: "*".to_owned(),
        }
    }
}

impl Wildcards {
    /// Attribute name with any trailing wildcard flags removed (`results*_h3` → `results`).
    pub fn strip<'a>(&self, attr_name: &'a str) -> &'a str {
        if self.wildcard_character.is_empty() {
            return attr_name;
        }
        attr_name
            .split_once(self.wildcard_character.as_str())
            .map_or(attr_name, |(name, _)| name)
    }
}

/// Attribute names whose values are coerced away from plain strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TagTypes {
    pub list: Vec<String>,
    pub float: Vec<String>,
    pub bool: Vec<String>,
}

impl Default for TagTypes {
    fn default() -> Self {
        Self {
            list: vec![
                "tags".to_owned(),
                "ignore-patterns".to_owned(),
                "compare-patterns".to_owned(),
                "partition-on".to_owned(),
            ],
            float: vec!["relative-tolerance".to_owned(), "absolute-tolerance".to_owned()],
            bool: vec!["only-matching-rows".to_owned(), "include-sql".to_owned()],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MarkerTemplate {
    /// Display name used when the marker block does not declare one.
    pub name: Option<String>,
    pub attrs: IndexMap<String, AttrValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SqlConfig {
    pub provided_over_generated: bool,
    pub desc_is_simple: bool,
    /// Object terms searched for in a statement's first line, highest priority first.
    pub named_objects: Vec<String>,
    /// Anchor used for a keyword when no named object is found.
    pub generic_anchors: IndexMap<String, String>,
    /// Keyword synonyms (`with` → `select`).
    pub keyword_exceptions: IndexMap<String, String>,
}

impl Default for SqlConfig {
    fn default() -> Self {
        let named_objects = [
            "temporary table",
            "temp table",
            "transient table",
            "external table",
            "table",
            "materialized view",
            "secure view",
            "view",
            "schema",
            "database",
            "warehouse",
            "file format",
            "stage",
            "function",
            "procedure",
            "sequence",
            "stream",
            "task",
            "pipe",
            "role",
            "user",
            "integration",
        ];
        let generic_anchors = [
            ("select", "select data"),
            ("insert", "insert into"),
            ("update", "update table"),
            ("delete", "delete from"),
            ("merge", "merge into"),
            ("create", "create object"),
            ("drop", "drop object"),
            ("alter", "alter object"),
            ("truncate", "truncate table"),
            ("grant", "grant privileges"),
            ("revoke", "revoke privileges"),
            ("copy", "copy into"),
            ("comment", "comment on"),
            ("describe", "describe object"),
            ("show", "show objects"),
            ("use", "use object"),
            ("set", "set parameter"),
            ("unset", "unset parameter"),
            ("call", "call procedure"),
        ];
        Self {
            provided_over_generated: true,
            desc_is_simple: true,
            named_objects: named_objects.iter().map(|t| t.to_string()).collect(),
            generic_anchors: generic_anchors
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            keyword_exceptions: [("with", "select"), ("desc", "describe")]
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}
