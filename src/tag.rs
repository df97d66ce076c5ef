//! Tag and attribute grammar.
//!
//! A tag is the text between the configured open and close markers
//! (`/*-` and `-*/` by default). A single-line tag is a statement name;
//! a multi-line tag holds `__key: value` attributes, one per entry.

use std::fmt::Display;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::{Config, CoreTags, TagTypes, Wildcards};
use crate::error::{ScriptError, ScriptResult};

/// Typed tag attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Float(f64),
    List(Vec<String>),
    String(String),
}

impl Display for AttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttrValue::Bool(value) => write!(f, "{}", value),
            AttrValue::Float(value) => write!(f, "{}", value),
            AttrValue::List(values) => write!(f, "{}", values.join(", ")),
            AttrValue::String(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::String(value.to_owned())
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

/// Ordered attribute map parsed from a tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Attrs(IndexMap<String, AttrValue>);

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.0.get(key)
    }

    /// Sets a custom attribute, replacing any parsed value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        self.0.shift_remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttrValue)> {
        self.0.iter()
    }

    /// Fills in keys missing from `self` with those of `defaults`, keeping defaults' order first.
    pub fn with_defaults(self, defaults: &IndexMap<String, AttrValue>) -> Self {
        let mut merged = defaults.clone();
        merged.extend(self.0);
        Attrs(merged)
    }
}

impl FromIterator<(String, AttrValue)> for Attrs {
    fn from_iter<T: IntoIterator<Item = (String, AttrValue)>>(iter: T) -> Self {
        Attrs(iter.into_iter().collect())
    }
}

/// One open/close span found in a piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct TagBlock {
    /// Byte offset of the open tag.
    pub start: usize,
    /// Byte offset just past the close tag.
    pub end: usize,
    /// Text between the open and close tags, untrimmed.
    pub content: String,
}

/// Pairs the i-th open tag with the i-th close tag.
pub fn find_spans(text: &str, tags: &CoreTags) -> ScriptResult<Vec<(usize, usize)>> {
    let opens: Vec<usize> = text.match_indices(&tags.open_tag).map(|(i, _)| i).collect();
    let closes: Vec<usize> = text
        .match_indices(&tags.close_tag)
        .map(|(i, _)| i + tags.close_tag.len())
        .collect();
    if opens.len() != closes.len() {
        return Err(ScriptError::MismatchedTags {
            open: tags.open_tag.clone(),
            close: tags.close_tag.clone(),
            opens: opens.len(),
            closes: closes.len(),
        });
    }
    Ok(opens.into_iter().zip(closes).collect())
}

pub fn find_tags(text: &str, tags: &CoreTags) -> ScriptResult<Vec<TagBlock>> {
    let blocks = find_spans(text, tags)?
        .into_iter()
        .filter_map(|(start, end)| {
            let inner_start = start + tags.open_tag.len();
            let inner_end = end - tags.close_tag.len();
            // Close tag preceding its open tag, e.g. `-*/ ... /*-`
            (inner_start <= inner_end).then(|| TagBlock {
                start,
                end,
                content: text[inner_start..inner_end].to_owned(),
            })
        })
        .collect();
    Ok(blocks)
}

fn first_line(raw: &str) -> &str {
    raw.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
}

fn is_marker_token(line: &str) -> bool {
    line.split_once("__")
        .is_some_and(|(_, rest)| rest.contains("__"))
}

/// A block is a marker when its first non-empty line holds a `__name__` token.
pub fn is_marker(raw: &str) -> bool {
    is_marker_token(first_line(raw))
}

/// `__appendix__` → `appendix`.
pub fn name_from_marker(raw: &str) -> String {
    let line = first_line(raw);
    let inner = line.split_once("__").map_or(line, |(_, rest)| rest);
    inner
        .split_once("__")
        .map_or(inner, |(name, _)| name)
        .trim()
        .to_owned()
}

/// Splits a multi-line tag into entries on lines beginning with `__`.
pub fn split_args(raw: &str) -> Vec<String> {
    let mut pieces: Vec<String> = vec![String::new()];
    for line in raw.lines() {
        match line.strip_prefix("__") {
            Some(rest) => pieces.push(rest.to_owned()),
            None => {
                if let Some(current) = pieces.last_mut() {
                    if !current.is_empty() {
                        current.push('\n');
                    }
                    current.push_str(line);
                }
            }
        }
    }
    pieces
        .into_iter()
        .map(|piece| piece.trim().to_owned())
        .filter(|piece| !piece.is_empty())
        .collect()
}

fn strip_value(value: &str) -> &str {
    value.trim_matches(|c| c == '\'' || c == '"' || c == ' ')
}

/// Coerces a raw attribute value to the type configured for `key`.
pub fn parse_str(
    key: &str,
    value: &str,
    types: &TagTypes,
    wildcards: &Wildcards,
) -> ScriptResult<AttrValue> {
    let lookup = wildcards.strip(key);
    let is = |names: &[String]| names.iter().any(|name| name == lookup);

    if is(types.list.as_slice()) {
        let items = value
            .split(',')
            .map(|item| {
                item.trim_matches(|c: char| matches!(c, '"' | '\'' | '[' | ']') || c.is_whitespace())
            })
            .filter(|item| !item.is_empty())
            .map(str::to_owned)
            .collect();
        return Ok(AttrValue::List(items));
    }

    let stripped = strip_value(value);
    let invalid = |expected| ScriptError::InvalidAttribute {
        key: key.to_owned(),
        value: value.to_owned(),
        expected,
    };

    if is(types.float.as_slice()) {
        stripped
            .parse::<f64>()
            .map(AttrValue::Float)
            .map_err(|_| invalid("a float"))
    } else if is(types.bool.as_slice()) {
        match stripped.to_lowercase().as_str() {
            "true" => Ok(AttrValue::Bool(true)),
            "false" => Ok(AttrValue::Bool(false)),
            _ => Err(invalid("'true' or 'false'")),
        }
    } else {
        Ok(AttrValue::String(stripped.to_owned()))
    }
}

/// Parses one `key: value` entry; entries missing either side are skipped.
pub fn parse_arg(piece: &str, config: &Config) -> ScriptResult<Option<(String, AttrValue)>> {
    let Some((key, value)) = piece.split_once(':') else {
        return Ok(None);
    };
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return Ok(None);
    }
    let script = &config.script;
    let value = parse_str(key, value, &script.types, &script.patterns.wildcards)?;
    Ok(Some((key.to_owned(), value)))
}

pub fn parse_args(raw: &str, config: &Config) -> ScriptResult<Attrs> {
    let mut attrs = Attrs::new();
    for piece in split_args(raw) {
        if let Some((key, value)) = parse_arg(&piece, config)? {
            attrs.0.insert(key, value);
        }
    }
    Ok(attrs)
}

/// Name written on line `offset` of a multi-line tag.
///
/// Lines starting with `__` are attributes, not names: `silent` turns that
/// case into `None` instead of an `InvalidTags` error.
pub fn parse_name(raw: &str, offset: usize, silent: bool) -> ScriptResult<Option<String>> {
    let line = raw.trim().lines().nth(offset).map(str::trim);
    match line {
        Some(line) if !line.is_empty() && !line.starts_with("__") => Ok(Some(line.to_owned())),
        _ if silent => Ok(None),
        _ => Err(ScriptError::InvalidTags {
            raw: raw.to_owned(),
        }),
    }
}

/// Name and attributes of a statement tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTag {
    pub name: String,
    pub attrs: Attrs,
    pub is_multiline: bool,
}

/// Parses untrimmed tag content; any line break makes it a multi-line tag.
pub fn parse_tag(raw: &str, config: &Config) -> ScriptResult<ParsedTag> {
    let is_multiline = raw.contains('\n');
    let raw = raw.trim();
    if !is_multiline {
        return Ok(ParsedTag {
            name: raw.to_owned(),
            attrs: Attrs::new(),
            is_multiline: false,
        });
    }

    let mut attrs = parse_args(raw, config)?;
    let name = match attrs.remove("name") {
        Some(name) => name.to_string(),
        None => parse_name(raw, 0, false)?.unwrap_or_default(),
    };
    log::debug!("Parsed multi-line tag '{}' with {} attribute(s)", name, attrs.len());
    Ok(ParsedTag {
        name,
        attrs,
        is_multiline: true,
    })
}

/// Splits the text above a statement into its marker blocks and its tag.
///
/// The tag is the last block when it is not a marker and nothing but
/// whitespace, with at most one line break, separates it from the sql.
pub fn split_sub_blocks(leading: &str, tags: &CoreTags) -> ScriptResult<(Vec<String>, Option<String>)> {
    let blocks = find_tags(leading, tags)?;
    let markers = blocks
        .iter()
        .filter(|block| is_marker(&block.content))
        .map(|block| block.content.trim().to_owned())
        .collect();

    let tag = blocks.last().and_then(|block| {
        let gap = &leading[block.end..];
        let adjacent = gap.trim().is_empty() && gap.matches('\n').count() <= 1;
        (adjacent && !is_marker(&block.content)).then(|| block.content.clone())
    });
    Ok((markers, tag))
}

/// Re-wraps raw tag content in open/close tags.
pub fn as_parsable(raw: &str, multiline: bool, tags: &CoreTags) -> String {
    if multiline {
        format!("{}\n{}\n{}", tags.open_tag, raw, tags.close_tag)
    } else {
        format!("{}{}{}", tags.open_tag, raw, tags.close_tag)
    }
}
