//! Statement names.
//!
//! Every statement carries a name made of five components:
//!
//! - keyword (`create`)
//! - object (`table`)
//! - anchor (`create table`), the keyword and object together
//! - description (`s1`)
//! - full name (`create table~s1`), the anchor and description joined by the delimiter
//!
//! Names are *generated* from the statement's sql and position, and may be
//! *provided* through a tag above the statement. The resolved name takes
//! the provided component when it is present and provided names are
//! preferred, the generated one otherwise.

use regex::Regex;
use serde::Serialize;
use strum::IntoEnumIterator;

use crate::config::Config;
use crate::scanner;
use crate::scope::{Component, Scope, ScopeArgs};

/// Keywords that never name an object of their own.
const OBJECTLESS_KEYWORDS: [&str; 2] = ["set", "unset"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NameParts {
    #[serde(rename = "kw")]
    pub keyword: String,
    #[serde(rename = "obj")]
    pub object: String,
    #[serde(rename = "desc")]
    pub description: String,
    pub anchor: String,
    #[serde(rename = "nm")]
    pub full: String,
}

impl NameParts {
    pub fn get(&self, component: Component) -> &str {
        match component {
            Component::Keyword => &self.keyword,
            Component::Object => &self.object,
            Component::Description => &self.description,
            Component::Anchor => &self.anchor,
            Component::Full => &self.full,
        }
    }
}

/// Which form of a component to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resolution {
    /// Provided if non-empty and provided names are preferred, else generated.
    #[default]
    Default,
    Generated,
    Provided,
}

#[derive(Debug, Clone)]
pub struct NameSettings {
    pub delimiter: String,
    pub index_prefix: String,
    pub desc_is_simple: bool,
    pub provided_over_generated: bool,
}

impl From<&Config> for NameSettings {
    fn from(config: &Config) -> Self {
        let tags = config.tags();
        Self {
            delimiter: tags.description_delimiter.clone(),
            index_prefix: tags.description_index_prefix.clone(),
            desc_is_simple: config.sql.desc_is_simple,
            provided_over_generated: config.sql.provided_over_generated,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Name {
    settings: NameSettings,
    index: usize,
    include_index: bool,
    provided: NameParts,
    // Generated components that do not depend on the index
    keyword: String,
    object: String,
    anchor: String,
    identifier: String,
    scopes: Vec<Scope>,
    is_included: bool,
}

impl Name {
    /// Derives a name for `sql` at `index`; `tag_name` is the provided name, empty if untagged.
    pub fn new(sql: &str, tag_name: &str, index: usize, config: &Config) -> Self {
        let first_line = sql
            .trim()
            .lines()
            .next()
            .unwrap_or_default()
            .to_lowercase();
        let words: Vec<&str> = first_line
            .split_whitespace()
            .map(|word| word.trim_matches(|c| c == '"' || c == '\''))
            .collect();

        let first_word = words.first().copied().unwrap_or_default();
        let keyword = config
            .sql
            .keyword_exceptions
            .get(first_word)
            .map_or(first_word, String::as_str)
            .to_owned();

        let object_base = named_object(&first_line, &keyword, &config.sql.named_objects);
        let anchor = match config.sql.generic_anchors.get(&keyword) {
            Some(generic) if object_base.is_empty() => generic.clone(),
            _ => [keyword.as_str(), object_base.as_str()]
                .iter()
                .filter(|part| !part.is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join(" "),
        };
        let object = if !object_base.is_empty() {
            object_base
        } else {
            let anchor_words: Vec<&str> = anchor.split_whitespace().collect();
            match anchor_words.as_slice() {
                [_, .., last] => last.to_string(),
                _ => String::new(),
            }
        };

        let mut name = Self {
            settings: NameSettings::from(config),
            index,
            include_index: true,
            provided: parse_provided(tag_name, &config.tags().description_delimiter),
            keyword,
            object,
            anchor,
            identifier: description_identifier(&first_line),
            scopes: vec![],
            is_included: true,
        };
        let resolved = name.resolved();
        name.scopes = Component::iter()
            .map(|component| Scope::new(component, resolved.get(component)))
            .collect();
        log::debug!("Derived name '{}' for statement {}", resolved.full, index);
        name
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// Whether generated descriptions end in the statement's index.
    pub fn include_index_in_description(&mut self, include: bool) {
        self.include_index = include;
    }

    fn description(&self) -> String {
        let indexed = format!("{}{}", self.settings.index_prefix, self.index);
        match (self.settings.desc_is_simple, self.include_index) {
            (true, true) => indexed,
            (true, false) => "statement".to_owned(),
            (false, true) if self.identifier.is_empty() => indexed,
            (false, true) => format!("{}: {}", self.identifier, indexed),
            (false, false) => self.identifier.clone(),
        }
    }

    pub fn generated(&self) -> NameParts {
        let description = self.description();
        NameParts {
            keyword: self.keyword.clone(),
            object: self.object.clone(),
            full: format!("{}{}{}", self.anchor, self.settings.delimiter, description),
            anchor: self.anchor.clone(),
            description,
        }
    }

    pub fn provided(&self) -> &NameParts {
        &self.provided
    }

    pub fn resolve_with(&self, component: Component, resolution: Resolution) -> String {
        let provided = self.provided.get(component);
        match resolution {
            Resolution::Provided => provided.to_owned(),
            Resolution::Default if self.settings.provided_over_generated && !provided.is_empty() => {
                provided.to_owned()
            }
            Resolution::Default | Resolution::Generated => {
                self.generated().get(component).to_owned()
            }
        }
    }

    pub fn resolve(&self, component: Component) -> String {
        self.resolve_with(component, Resolution::Default)
    }

    pub fn resolved(&self) -> NameParts {
        let generated = self.generated();
        let pick = |component| {
            let provided = self.provided.get(component);
            if self.settings.provided_over_generated && !provided.is_empty() {
                provided.to_owned()
            } else {
                generated.get(component).to_owned()
            }
        };
        NameParts {
            keyword: pick(Component::Keyword),
            object: pick(Component::Object),
            description: pick(Component::Description),
            anchor: pick(Component::Anchor),
            full: pick(Component::Full),
        }
    }

    pub fn nm(&self) -> String {
        self.resolve(Component::Full)
    }

    pub fn kw(&self) -> String {
        self.resolve(Component::Keyword)
    }

    pub fn obj(&self) -> String {
        self.resolve(Component::Object)
    }

    pub fn desc(&self) -> String {
        self.resolve(Component::Description)
    }

    pub fn anchor(&self) -> String {
        self.resolve(Component::Anchor)
    }

    /// Evaluates every component's scope; included only if all of them are.
    pub fn scope(&mut self, args: &ScopeArgs) -> bool {
        let results: Vec<bool> = self
            .scopes
            .iter_mut()
            .map(|scope| scope.evaluate(args))
            .collect();
        self.is_included = results.into_iter().all(|included| included);
        self.is_included
    }

    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    pub fn is_included(&self) -> bool {
        self.is_included
    }

    pub(crate) fn reset_scope(&mut self) {
        self.scopes.iter_mut().for_each(Scope::reset);
        self.is_included = true;
    }
}

/// Highest priority configured object term found in `line`, other than the keyword itself.
fn named_object(line: &str, keyword: &str, named_objects: &[String]) -> String {
    if OBJECTLESS_KEYWORDS.contains(&keyword) {
        return String::new();
    }
    named_objects
        .iter()
        .filter(|term| term.as_str() != keyword)
        .find(|term| {
            Regex::new(&format!(r"\b{}\b", regex::escape(term)))
                .is_ok_and(|re| re.is_match(line))
        })
        .cloned()
        .unwrap_or_default()
}

/// Identifier naming what a statement operates on, empty when none is found.
///
/// `clone` statements keep the last three words (`t2 clone t1`); other
/// statements keep the first word of their last identifier group, so
/// `from sample_table s` gives `sample_table`.
fn description_identifier(first_line: &str) -> String {
    let Ok(identifiers) = scanner::identifiers(first_line, &["clone"]) else {
        return String::new();
    };
    if identifiers.iter().any(|ident| ident == "clone") {
        let words: Vec<&str> = identifiers
            .iter()
            .flat_map(|ident| ident.split_whitespace())
            .collect();
        return match words.len() {
            n if n >= 3 => words[n - 3..].join(" "),
            _ => String::new(),
        };
    }
    identifiers
        .iter()
        .rev()
        .find(|ident| ident.as_str() != "clone")
        .and_then(|ident| ident.split_whitespace().next())
        .unwrap_or_default()
        .to_owned()
}

/// Splits a provided name on the delimiter into its components.
///
/// The full name is the tag itself; the other components are only set
/// when both sides of the delimiter are non-empty.
fn parse_provided(tag_name: &str, delimiter: &str) -> NameParts {
    let full = tag_name.trim();
    let mut parts = NameParts {
        full: full.to_owned(),
        ..Default::default()
    };
    if delimiter.is_empty() {
        return parts;
    }
    let Some((anchor, description)) = full.split_once(delimiter) else {
        return parts;
    };
    let anchor_words: Vec<&str> = anchor.split_whitespace().collect();
    let description_words: Vec<&str> = description.split_whitespace().collect();
    if let [keyword, object @ ..] = anchor_words.as_slice() {
        if !description_words.is_empty() {
            parts.keyword = keyword.to_string();
            parts.object = object.join(" ");
            parts.anchor = anchor_words.join(" ");
            parts.description = description_words.join(" ");
        }
    }
    parts
}
