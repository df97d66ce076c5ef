//! Scripts: statements and markers parsed from sql source text, with
//! lookup by index or name and scoped filtering.
//!
//! A filter narrows the script to the statements whose names match it and
//! renumbers them `1..=depth`. The original indices and inclusion flags
//! are restored when the filter is dropped, on every exit path.

use std::collections::HashSet;
use std::fmt::Display;
use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::config::Config;
use crate::error::{ScriptError, ScriptResult};
use crate::executor::Executor;
use crate::marker::{Marker, MarkerPosition};
use crate::scanner;
use crate::scope::{Filter, FilterId, ScopeArgs};
use crate::statement::{RunOptions, Statement};
use crate::tag;

/// A statement's index in the current view (negative counts from the end) or its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementId {
    Index(isize),
    Name(String),
}

impl Display for StatementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatementId::Index(index) => write!(f, "{}", index),
            StatementId::Name(name) => write!(f, "{}", name),
        }
    }
}

impl From<isize> for StatementId {
    fn from(index: isize) -> Self {
        StatementId::Index(index)
    }
}

impl From<i32> for StatementId {
    fn from(index: i32) -> Self {
        StatementId::Index(index as isize)
    }
}

impl From<usize> for StatementId {
    fn from(index: usize) -> Self {
        // Out of range either way; lookup rejects it
        StatementId::Index(isize::try_from(index).unwrap_or(isize::MAX))
    }
}

impl From<&str> for StatementId {
    fn from(name: &str) -> Self {
        StatementId::Name(name.to_owned())
    }
}

impl From<String> for StatementId {
    fn from(name: String) -> Self {
        StatementId::Name(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    One(StatementId),
    /// Inclusive range of indices in the current view.
    Range(usize, usize),
    List(Vec<StatementId>),
}

/// An entry of a script's combined statement and marker contents.
#[derive(Debug, Clone, Copy)]
pub enum Content<'a> {
    Statement(&'a Statement),
    Marker(&'a Marker),
}

impl Content<'_> {
    pub fn name(&self) -> String {
        match self {
            Content::Statement(statement) => statement.nm(),
            Content::Marker(marker) => marker.name.clone(),
        }
    }

    pub fn is_marker(&self) -> bool {
        matches!(self, Content::Marker(_))
    }
}

#[derive(Debug)]
pub struct Script {
    name: String,
    source: String,
    config: Arc<Config>,
    /// Every statement in parse order.
    statements: Vec<Statement>,
    /// Positions in `statements` of the current view.
    view: Vec<usize>,
    markers: IndexMap<MarkerPosition, Marker>,
    filters: IndexMap<FilterId, ScopeArgs>,
    filtered: bool,
    contexts: usize,
}

impl Script {
    pub fn new(source: &str, config: Config) -> ScriptResult<Self> {
        Self::from_source("script.sql", source, config)
    }

    pub fn from_path(path: impl AsRef<Path>, config: Config) -> ScriptResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_source(&name, &source, config)
    }

    pub fn from_source(name: &str, source: &str, config: Config) -> ScriptResult<Self> {
        if !name.ends_with(".sql") {
            return Err(ScriptError::InvalidScriptName(name.to_owned()));
        }
        let config = Arc::new(config);
        let tags = config.tags();
        tag::find_spans(source, tags)?;

        let raw_statements = scanner::split_statements(source)?;
        let mut statements = Vec::with_capacity(raw_statements.len());
        let mut markers = IndexMap::new();
        let mut seen = HashSet::new();

        for (i, raw) in raw_statements.iter().enumerate() {
            let index = i + 1;
            let (marker_blocks, statement_tag) = tag::split_sub_blocks(&raw.leading(), tags)?;
            add_markers(&mut markers, &mut seen, marker_blocks, index, &config)?;
            statements.push(Statement::new(
                Arc::clone(&config),
                &raw.sql,
                statement_tag.as_deref().unwrap_or_default(),
                index,
            )?);
        }

        let trailing: String = source
            .chars()
            .skip(raw_statements.last().map_or(0, |raw| raw.end))
            .collect();
        let trailing_markers = tag::find_tags(&trailing, tags)?
            .into_iter()
            .filter(|block| tag::is_marker(&block.content))
            .map(|block| block.content.trim().to_owned())
            .collect();
        add_markers(
            &mut markers,
            &mut seen,
            trailing_markers,
            statements.len() + 1,
            &config,
        )?;

        log::info!(
            "Parsed '{}': {} statement(s), {} marker(s)",
            name,
            statements.len(),
            markers.len()
        );
        let mut filters = IndexMap::new();
        filters.insert(FilterId::Index(0), ScopeArgs::new());
        Ok(Self {
            name: name.to_owned(),
            source: source.to_owned(),
            view: (0..statements.len()).collect(),
            statements,
            markers,
            filters,
            filtered: false,
            contexts: 0,
            config,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn lines(&self) -> usize {
        self.source.lines().count()
    }

    /// Statements of the current view in ascending index order.
    pub fn statements(&self) -> impl Iterator<Item = &Statement> + '_ {
        self.view.iter().map(|&position| &self.statements[position])
    }

    /// Every statement, filtered or not, in parse order.
    pub fn statements_all(&self) -> &[Statement] {
        &self.statements
    }

    /// Statements left out of the current view.
    pub fn excluded(&self) -> impl Iterator<Item = &Statement> + '_ {
        self.statements.iter().filter(|statement| !statement.is_included())
    }

    /// Number of statements in the current view.
    pub fn depth(&self) -> usize {
        self.view.len()
    }

    pub fn is_filtered(&self) -> bool {
        self.filtered
    }

    pub fn markers(&self) -> &IndexMap<MarkerPosition, Marker> {
        &self.markers
    }

    pub fn filters(&self) -> &IndexMap<FilterId, ScopeArgs> {
        &self.filters
    }

    pub fn names(&self) -> Vec<String> {
        self.statements().map(Statement::nm).collect()
    }

    /// Names shared by more than one statement of the current view.
    pub fn duplicates(&self) -> Vec<String> {
        let mut counts: IndexMap<String, usize> = IndexMap::new();
        for name in self.names() {
            *counts.entry(name).or_default() += 1;
        }
        counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(name, _)| name)
            .collect()
    }

    fn position(&self, id: &StatementId) -> ScriptResult<usize> {
        match id {
            StatementId::Index(index) => {
                let depth = self.depth() as isize;
                let index = if *index > 0 { *index } else { depth + index + 1 };
                if (1..=depth).contains(&index) {
                    Ok(self.view[(index - 1) as usize])
                } else {
                    Err(ScriptError::not_found(id, self.names()))
                }
            }
            StatementId::Name(name) => {
                let duplicates = self.duplicates();
                if !duplicates.is_empty() {
                    return Err(ScriptError::DuplicateTag {
                        script: self.name.clone(),
                        duplicates,
                    });
                }
                self.view
                    .iter()
                    .copied()
                    .find(|&position| self.statements[position].nm() == *name)
                    .ok_or_else(|| ScriptError::not_found(id, self.names()))
            }
        }
    }

    pub fn statement(&self, id: impl Into<StatementId>) -> ScriptResult<&Statement> {
        let position = self.position(&id.into())?;
        Ok(&self.statements[position])
    }

    pub fn statement_mut(&mut self, id: impl Into<StatementId>) -> ScriptResult<&mut Statement> {
        let position = self.position(&id.into())?;
        Ok(&mut self.statements[position])
    }

    pub fn first(&self) -> ScriptResult<&Statement> {
        self.statement(1)
    }

    pub fn last(&self) -> ScriptResult<&Statement> {
        self.statement(-1)
    }

    /// Current indices of the selected statements.
    pub fn ids(&self, selection: &Selection) -> ScriptResult<Vec<usize>> {
        let depth = self.depth();
        match selection {
            Selection::All => Ok((1..=depth).collect()),
            Selection::One(id) => Ok(vec![self.statement(id.clone())?.index()]),
            Selection::Range(start, end) => {
                if *start < 1 || *end > depth {
                    return Err(ScriptError::not_found(
                        format!("{}..={}", start, end),
                        self.names(),
                    ));
                }
                Ok((*start..=*end).collect())
            }
            Selection::List(ids) => ids
                .iter()
                .map(|id| self.statement(id.clone()).map(Statement::index))
                .collect(),
        }
    }

    /// Appends a statement to the script, tagged with `name` when given.
    pub fn push_statement(&mut self, sql: &str, name: Option<&str>) -> ScriptResult<&Statement> {
        let index = self.statements.len() + 1;
        let mut statement = Statement::new(
            Arc::clone(&self.config),
            sql,
            name.unwrap_or_default(),
            index,
        )?;
        if self.filtered {
            statement.reindex(self.depth() + 1);
        }

        // Trailing markers stay after the last statement
        if self.markers.keys().any(|position| position.statement >= index) {
            self.markers = std::mem::take(&mut self.markers)
                .into_iter()
                .map(|(mut position, mut marker)| {
                    if position.statement >= index {
                        position.statement += 1;
                        marker.position = position;
                    }
                    (position, marker)
                })
                .collect();
        }

        if !self.source.is_empty() && !self.source.ends_with('\n') {
            self.source.push('\n');
        }
        self.source.push_str(&statement.trim());
        log::debug!("Added statement '{}' to '{}'", statement.nm(), self.name);

        self.statements.push(statement);
        let position = self.statements.len() - 1;
        self.view.push(position);
        Ok(&self.statements[position])
    }

    /// Narrows the script to the statements matching `filter` until the returned guard is dropped.
    ///
    /// ```
    /// use sqlscript::{Config, Script};
    /// use sqlscript::scope::{Component, Filter};
    ///
    /// let mut script = Script::new("create table t1 as select 1; select * from t1;", Config::default())?;
    /// {
    ///     let view = script.filter(Filter::new().exclude(Component::Keyword, ["select"]))?;
    ///     assert_eq!(view.depth(), 1);
    /// }
    /// assert_eq!(script.depth(), 2);
    /// # Ok::<(), sqlscript::ScriptError>(())
    /// ```
    pub fn filter(&mut self, filter: Filter) -> ScriptResult<FilteredScript<'_>> {
        if self.filtered {
            return Err(ScriptError::FilterActive(self.name.clone()));
        }
        let (id, args) = self.record_filter(&filter)?;
        self.apply(&args);
        Ok(FilteredScript { script: self, id })
    }

    /// Runs `body` against the filtered script; the script is restored before the body's result is returned.
    pub fn filtered<T>(
        &mut self,
        filter: Filter,
        body: impl FnOnce(&mut Script) -> ScriptResult<T>,
    ) -> ScriptResult<T> {
        let mut view = self.filter(filter)?;
        let result = body(&mut *view);
        drop(view);
        result
    }

    fn record_filter(&mut self, filter: &Filter) -> ScriptResult<(FilterId, ScopeArgs)> {
        if filter.from_id.is_some() && filter.as_id.is_some() {
            return Err(ScriptError::ConflictingFilterIds);
        }
        let (from_id, as_id) = if filter.last {
            (self.filters.keys().last().cloned(), None)
        } else {
            (filter.from_id.clone(), filter.as_id.clone())
        };

        let mut args = match &from_id {
            Some(id) => self
                .filters
                .get(id)
                .cloned()
                .ok_or_else(|| ScriptError::UnknownFilter {
                    id: id.to_string(),
                    known: self.filters.keys().map(ToString::to_string).collect(),
                })?,
            None => ScopeArgs::new(),
        };
        args.union(&filter.compile()?);

        let id = from_id
            .or(as_id)
            .unwrap_or(FilterId::Index(self.filters.len()));
        if let Some(mut stored) = self.filters.shift_remove(&id) {
            stored.union(&args);
            args = stored;
        }
        self.filters.insert(id.clone(), args.clone());
        Ok((id, args))
    }

    fn apply(&mut self, args: &ScopeArgs) {
        self.contexts += 1;
        for statement in &mut self.statements {
            statement.name_mut().scope(args);
            statement.context_mut().enter(self.contexts);
        }
        self.view = (0..self.statements.len())
            .filter(|&position| self.statements[position].is_included())
            .collect();
        for (i, &position) in self.view.iter().enumerate() {
            self.statements[position].reindex(i + 1);
        }
        self.filtered = true;
        log::info!(
            "Filtered '{}' to {} of {} statement(s)",
            self.name,
            self.view.len(),
            self.statements.len()
        );
    }

    fn restore(&mut self) {
        for statement in &mut self.statements {
            statement.restore_index();
            statement.name_mut().reset_scope();
            statement.context_mut().exit();
        }
        self.view = (0..self.statements.len()).collect();
        self.filtered = false;
        log::info!("Restored '{}' to {} statement(s)", self.name, self.view.len());
    }

    fn content_order(&self, include_markers: bool) -> Vec<Content<'_>> {
        let mut contents = vec![];
        let mut markers = self.markers.values().peekable();
        for statement in &self.statements {
            while let Some(marker) =
                markers.next_if(|marker| marker.position.statement <= statement.original_index())
            {
                if include_markers {
                    contents.push(Content::Marker(marker));
                }
            }
            if statement.is_included() {
                contents.push(Content::Statement(statement));
            }
        }
        if include_markers {
            contents.extend(markers.map(Content::Marker));
        }
        contents
    }

    /// Statements of the current view, optionally with markers, numbered in source order.
    pub fn contents(&self, include_markers: bool) -> IndexMap<usize, Content<'_>> {
        self.content_order(include_markers)
            .into_iter()
            .enumerate()
            .map(|(i, content)| (i + 1, content))
            .collect()
    }

    /// As `contents`, keyed by name; fails when statement names are not distinct.
    pub fn contents_by_name(&self, include_markers: bool) -> ScriptResult<IndexMap<String, Content<'_>>> {
        let duplicates = self.duplicates();
        if !duplicates.is_empty() {
            return Err(ScriptError::DuplicateTag {
                script: self.name.clone(),
                duplicates,
            });
        }
        Ok(self
            .content_order(include_markers)
            .into_iter()
            .map(|content| (content.name(), content))
            .collect())
    }

    /// Runs the selected statements of the current view in index order.
    pub fn run(
        &mut self,
        selection: &Selection,
        executor: &mut dyn Executor,
        options: &RunOptions,
    ) -> ScriptResult<()> {
        for index in self.ids(selection)? {
            let position = self.position(&StatementId::from(index))?;
            self.statements[position].run(executor, options)?;
        }
        Ok(())
    }
}

fn add_markers(
    markers: &mut IndexMap<MarkerPosition, Marker>,
    seen: &mut HashSet<String>,
    blocks: Vec<String>,
    statement: usize,
    config: &Config,
) -> ScriptResult<()> {
    let mut ordinal = 0;
    for raw in blocks {
        if !seen.insert(raw.clone()) {
            continue;
        }
        ordinal += 1;
        let position = MarkerPosition { statement, ordinal };
        markers.insert(position, Marker::parse(&raw, position, config)?);
    }
    Ok(())
}

/// A script narrowed by a filter; restores the script when dropped.
pub struct FilteredScript<'a> {
    script: &'a mut Script,
    id: FilterId,
}

impl FilteredScript<'_> {
    /// Id the applied filter is stored under.
    pub fn id(&self) -> &FilterId {
        &self.id
    }
}

impl Deref for FilteredScript<'_> {
    type Target = Script;

    fn deref(&self) -> &Script {
        self.script
    }
}

impl DerefMut for FilteredScript<'_> {
    fn deref_mut(&mut self) -> &mut Script {
        self.script
    }
}

impl Drop for FilteredScript<'_> {
    fn drop(&mut self) {
        self.script.restore();
    }
}
