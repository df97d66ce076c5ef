use serde::Serialize;

/// Rows returned by a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<serde_json::Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn lower_columns(&mut self) {
        self.columns
            .iter_mut()
            .for_each(|column| *column = column.to_lowercase());
    }
}

/// Runs sql against a warehouse connection.
pub trait Executor {
    fn query(&mut self, sql: &str) -> anyhow::Result<ResultSet>;
}
