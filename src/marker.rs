use std::fmt::Display;

use serde::Serialize;

use crate::config::Config;
use crate::error::ScriptResult;
use crate::tag::{self, Attrs};

/// Where a marker sits relative to the statements of a script.
///
/// Markers above statement `i` are `i.1, i.2, ...`; markers after the
/// last statement use `depth + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MarkerPosition {
    pub statement: usize,
    pub ordinal: usize,
}

impl Display for MarkerPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.statement, self.ordinal)
    }
}

/// A `__name__` block structuring a script between statements.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub position: MarkerPosition,
    pub name: String,
    /// Token of the first line, `appendix` for `__appendix__`.
    pub marker_name: String,
    pub attrs: Attrs,
    pub raw: String,
}

impl Marker {
    pub fn parse(raw: &str, position: MarkerPosition, config: &Config) -> ScriptResult<Self> {
        let raw = raw.trim();
        let marker_name = tag::name_from_marker(raw);
        let template = config.script.markers.get(&format!("__{}__", marker_name));

        let mut attrs = tag::parse_args(raw, config)?;
        let explicit = attrs.remove("name").map(|name| name.to_string());
        attrs.remove("marker-name");

        let name = match explicit {
            Some(name) => name,
            None => tag::parse_name(raw, 1, true)?
                .or_else(|| template.and_then(|t| t.name.clone()))
                .unwrap_or_else(|| marker_name.clone()),
        };
        let attrs = match template {
            Some(template) => attrs.with_defaults(&template.attrs),
            None => attrs,
        };

        log::debug!("Parsed marker '{}' at {}", name, position);
        Ok(Marker {
            position,
            name,
            marker_name,
            attrs,
            raw: raw.to_owned(),
        })
    }

    pub fn trim(&self, config: &Config) -> String {
        tag::as_parsable(&self.raw, true, config.tags())
    }
}
