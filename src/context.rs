use indexmap::IndexMap;
use serde::Serialize;

/// Context id errors are logged under while no context is active.
pub const OUTSIDE_CONTEXT: usize = 0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextEntry {
    pub message: String,
    /// Whether the error was propagated to the caller.
    pub raised: bool,
}

/// Errors encountered by a statement, grouped by the context they occurred in.
///
/// A script opens a context on each of its statements when a filter is
/// entered and closes it on exit, so errors raised while a filtered view
/// was active can be told apart from the rest.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExceptionContext {
    current: Option<usize>,
    entries: IndexMap<usize, Vec<ContextEntry>>,
}

impl ExceptionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&mut self, context_id: usize) {
        self.current = Some(context_id);
    }

    pub fn exit(&mut self) {
        self.current = None;
    }

    pub fn in_context(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_id(&self) -> usize {
        self.current.unwrap_or(OUTSIDE_CONTEXT)
    }

    pub fn collect(&mut self, message: impl Into<String>, raised: bool) {
        self.entries
            .entry(self.current_id())
            .or_default()
            .push(ContextEntry {
                message: message.into(),
                raised,
            });
    }

    pub fn by_context(&self, context_id: usize) -> &[ContextEntry] {
        self.entries
            .get(&context_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Entries of the active context, or of the outside log when none is active.
    pub fn current(&self) -> &[ContextEntry] {
        self.by_context(self.current_id())
    }

    /// Whether any error was seen, optionally only those raised (or not raised).
    pub fn seen(&self, raised: Option<bool>) -> bool {
        self.entries
            .values()
            .flatten()
            .any(|entry| raised.is_none_or(|raised| entry.raised == raised))
    }

    pub fn last(&self) -> Option<&ContextEntry> {
        self.entries.values().flatten().last()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
