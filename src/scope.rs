//! Include/exclude evaluation of name components.

use std::fmt::Display;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Serialize, Serializer};
use strum_macros::{AsRefStr, EnumIter};

use crate::error::{ScriptError, ScriptResult};

/// A component of a statement's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, AsRefStr, Serialize)]
pub enum Component {
    #[strum(serialize = "kw")]
    #[serde(rename = "kw")]
    Keyword,
    #[strum(serialize = "obj")]
    #[serde(rename = "obj")]
    Object,
    #[strum(serialize = "desc")]
    #[serde(rename = "desc")]
    Description,
    #[strum(serialize = "anchor")]
    #[serde(rename = "anchor")]
    Anchor,
    #[strum(serialize = "nm")]
    #[serde(rename = "nm")]
    Full,
}

impl Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr)]
pub enum Direction {
    #[strum(serialize = "incl")]
    Include,
    #[strum(serialize = "excl")]
    Exclude,
}

/// Filter argument key, displayed as `incl_kw`, `excl_nm`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeKey {
    pub direction: Direction,
    pub component: Component,
}

impl ScopeKey {
    pub fn new(direction: Direction, component: Component) -> Self {
        Self {
            direction,
            component,
        }
    }
}

impl Display for ScopeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.direction.as_ref(), self.component)
    }
}

impl Serialize for ScopeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A compiled filter pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> ScriptResult<Self> {
        let regex = Regex::new(source).map_err(|source_err| ScriptError::InvalidPattern {
            pattern: source.to_owned(),
            source: source_err,
        })?;
        Ok(Self {
            source: source.to_owned(),
            regex,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// True when `base` occurs literally in the pattern or the pattern matches `base`.
    ///
    /// An empty base occurs in every pattern, so it always matches.
    pub fn matches(&self, base: &str) -> bool {
        self.source.contains(base) || self.regex.is_match(base)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

/// Compiled filter arguments.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ScopeArgs(IndexMap<ScopeKey, Vec<Pattern>>);

impl ScopeArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ScopeKey) -> Option<&[Pattern]> {
        self.0.get(key).map(Vec::as_slice)
    }

    pub fn add(&mut self, key: ScopeKey, pattern: Pattern) {
        let patterns = self.0.entry(key).or_default();
        if !patterns.contains(&pattern) {
            patterns.push(pattern);
        }
    }

    /// Adds the patterns of `other` to those already held, key by key.
    pub fn union(&mut self, other: &ScopeArgs) {
        for (key, patterns) in &other.0 {
            for pattern in patterns {
                self.add(*key, pattern.clone());
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ScopeKey, &Vec<Pattern>)> {
        self.0.iter()
    }
}

/// Identifier a filter is stored under in a script's filter history.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterId {
    Index(usize),
    Name(String),
}

impl Display for FilterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterId::Index(index) => write!(f, "{}", index),
            FilterId::Name(name) => write!(f, "{}", name),
        }
    }
}

impl Serialize for FilterId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<usize> for FilterId {
    fn from(index: usize) -> Self {
        FilterId::Index(index)
    }
}

impl From<&str> for FilterId {
    fn from(name: &str) -> Self {
        FilterId::Name(name.to_owned())
    }
}

impl From<String> for FilterId {
    fn from(name: String) -> Self {
        FilterId::Name(name)
    }
}

/// Filter request built by callers and applied with `Script::filter`.
///
/// ```
/// use sqlscript::scope::{Component, Filter};
///
/// let filter = Filter::new()
///     .exclude(Component::Keyword, ["select", "drop"])
///     .as_id("no-reads");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Filter {
    patterns: Vec<(ScopeKey, String)>,
    pub(crate) as_id: Option<FilterId>,
    pub(crate) from_id: Option<FilterId>,
    pub(crate) last: bool,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<I, S>(mut self, direction: Direction, component: Component, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = ScopeKey::new(direction, component);
        self.patterns
            .extend(patterns.into_iter().map(|pattern| (key, pattern.into())));
        self
    }

    pub fn include<I, S>(self, component: Component, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(Direction::Include, component, patterns)
    }

    pub fn exclude<I, S>(self, component: Component, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(Direction::Exclude, component, patterns)
    }

    /// Stores the filter under `id`, merging with any filter already stored there.
    pub fn as_id(mut self, id: impl Into<FilterId>) -> Self {
        self.as_id = Some(id.into());
        self
    }

    /// Starts from a filter already stored under `id`.
    pub fn from_id(mut self, id: impl Into<FilterId>) -> Self {
        self.from_id = Some(id.into());
        self
    }

    /// Starts from the most recently stored filter and stores the result
    /// under its id; takes precedence over `from_id` and `as_id`.
    pub fn last(mut self) -> Self {
        self.last = true;
        self
    }

    pub fn compile(&self) -> ScriptResult<ScopeArgs> {
        let mut args = ScopeArgs::new();
        for (key, source) in &self.patterns {
            args.add(*key, Pattern::new(source)?);
        }
        Ok(args)
    }
}

/// Evaluates one name component against filter arguments.
#[derive(Debug, Clone, Serialize)]
pub struct Scope {
    pub component: Component,
    pub base: String,
    included: bool,
    excluded: bool,
}

impl Scope {
    pub fn new(component: Component, base: &str) -> Self {
        Self {
            component,
            base: base.to_lowercase(),
            included: true,
            excluded: false,
        }
    }

    /// Missing or empty include patterns include the base; missing exclude patterns exclude nothing.
    pub fn evaluate(&mut self, args: &ScopeArgs) -> bool {
        let matching = |direction| {
            args.get(&ScopeKey::new(direction, self.component))
                .filter(|patterns| !patterns.is_empty())
                .map(|patterns| patterns.iter().any(|pattern| pattern.matches(&self.base)))
        };
        let included = matching(Direction::Include).unwrap_or(true);
        let excluded = matching(Direction::Exclude).unwrap_or(false);
        self.included = included;
        self.excluded = excluded;
        self.is_included()
    }

    pub fn is_included(&self) -> bool {
        self.included && !self.excluded
    }

    pub fn reset(&mut self) {
        self.included = true;
        self.excluded = false;
    }
}
