use std::sync::Arc;

use serde::Serialize;

use crate::config::Config;
use crate::context::ExceptionContext;
use crate::error::{ScriptError, ScriptResult};
use crate::executor::{Executor, ResultSet};
use crate::name::Name;
use crate::tag::{self, Attrs};

/// Anchor of statements asserting that their query returns no rows.
pub const QA_EMPTY_ANCHOR: &str = "qa-empty";

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum Outcome {
    #[default]
    Pending,
    Completed,
    Passed,
    Failed(String),
    Error(String),
}

/// What to do when a statement errors or a QA statement fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnError {
    #[default]
    Raise,
    Continue,
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub on_error: OnError,
    pub on_failure: OnError,
    /// Lower-case result column names.
    pub lower: bool,
}

#[derive(Debug, Clone)]
pub struct Statement {
    config: Arc<Config>,
    original_index: usize,
    sql: String,
    raw_tag: String,
    is_multiline: bool,
    attrs: Attrs,
    name: Name,
    outcome: Outcome,
    results: Option<ResultSet>,
    context: ExceptionContext,
}

impl Statement {
    /// Builds a statement from isolated sql and the untrimmed content of its tag.
    pub fn new(config: Arc<Config>, sql: &str, raw_tag: &str, index: usize) -> ScriptResult<Self> {
        let parsed = if raw_tag.trim().is_empty() {
            tag::ParsedTag::default()
        } else {
            tag::parse_tag(raw_tag, &config)?
        };
        let sql = sql.trim().trim_end_matches(';').trim_end().to_owned();
        let name = Name::new(&sql, &parsed.name, index, &config);
        Ok(Self {
            original_index: index,
            sql,
            raw_tag: raw_tag.trim().to_owned(),
            is_multiline: parsed.is_multiline,
            attrs: parsed.attrs,
            name,
            outcome: Outcome::Pending,
            results: None,
            context: ExceptionContext::new(),
            config,
        })
    }

    pub fn index(&self) -> usize {
        self.name.index()
    }

    /// Index at parse time, unaffected by filtering.
    pub fn original_index(&self) -> usize {
        self.original_index
    }

    pub(crate) fn reindex(&mut self, index: usize) {
        self.name.set_index(index);
    }

    pub(crate) fn restore_index(&mut self) {
        self.name.set_index(self.original_index);
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn raw_tag(&self) -> &str {
        &self.raw_tag
    }

    pub fn is_tagged(&self) -> bool {
        !self.raw_tag.is_empty()
    }

    pub fn is_multiline(&self) -> bool {
        self.is_multiline
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn attrs_mut(&mut self) -> &mut Attrs {
        &mut self.attrs
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn name_mut(&mut self) -> &mut Name {
        &mut self.name
    }

    pub fn nm(&self) -> String {
        self.name.nm()
    }

    pub fn kw(&self) -> String {
        self.name.kw()
    }

    pub fn obj(&self) -> String {
        self.name.obj()
    }

    pub fn desc(&self) -> String {
        self.name.desc()
    }

    pub fn anchor(&self) -> String {
        self.name.anchor()
    }

    pub fn is_included(&self) -> bool {
        self.name.is_included()
    }

    pub fn is_qa(&self) -> bool {
        self.anchor() == QA_EMPTY_ANCHOR
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn results(&self) -> Option<&ResultSet> {
        self.results.as_ref()
    }

    pub fn context(&self) -> &ExceptionContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ExceptionContext {
        &mut self.context
    }

    pub fn lines(&self) -> usize {
        self.sql.lines().count()
    }

    /// The statement with its resolved name as a single-line tag.
    pub fn trim(&self) -> String {
        format!(
            "{}\n{};\n",
            tag::as_parsable(&self.nm(), false, self.config.tags()),
            self.sql
        )
    }

    /// Sql to execute; selects get a `limit` when `result-limit` is positive.
    pub fn sql_with_limit(&self) -> String {
        let limit = self.config.script.result_limit;
        if limit > 0 && self.name.generated().keyword == "select" {
            format!("{}\nlimit {}", self.sql, limit)
        } else {
            self.sql.clone()
        }
    }

    pub fn run(&mut self, executor: &mut dyn Executor, options: &RunOptions) -> ScriptResult<&Outcome> {
        let nm = self.nm();
        log::info!("<{}> {}", self.index(), nm);

        match executor.query(&self.sql_with_limit()) {
            Ok(mut results) => {
                if options.lower {
                    results.lower_columns();
                }
                self.outcome = match (self.is_qa(), results.is_empty()) {
                    (true, true) => Outcome::Passed,
                    (true, false) => Outcome::Failed(format!("{} row(s) returned", results.len())),
                    (false, _) => Outcome::Completed,
                };
                self.results = Some(results);
            }
            Err(err) => {
                let message = err.to_string();
                let raise = options.on_error == OnError::Raise;
                self.context.collect(message.clone(), raise);
                self.outcome = Outcome::Error(message.clone());
                self.results = None;
                if raise {
                    return Err(ScriptError::Execution { name: nm, message });
                }
                log::warn!("<{}> {} errored: {}", self.index(), nm, message);
            }
        }

        if let Outcome::Failed(reason) = &self.outcome {
            let raise = options.on_failure == OnError::Raise;
            self.context.collect(reason.clone(), raise);
            if raise {
                return Err(ScriptError::QaFailure {
                    name: nm,
                    reason: reason.clone(),
                });
            }
            log::warn!("<{}> {} failed: {}", self.index(), nm, reason);
        }
        Ok(&self.outcome)
    }
}
