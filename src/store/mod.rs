//! Graph store boundary: statement catalog, mutation executor, Neo4j adapter

pub mod executor;
pub mod neo4j;
pub mod statements;

pub use executor::MutationExecutor;
pub use neo4j::Neo4jStore;

use crate::error::StoreError;
use serde_json::Value;

/// One result row, keyed by the statement's return column names.
pub type Row = serde_json::Map<String, Value>;

/// Parameter value for a parametrized statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    StrList(Vec<String>),
}

/// Named statement parameters.
pub type Params = Vec<(&'static str, ParamValue)>;

/// Fully drained result of one statement.
///
/// Draining before returning is part of the contract: it forces server-side
/// errors to surface on the call that caused them.
#[derive(Debug, Clone, Default)]
pub struct ConsumedResult {
    pub rows: Vec<Row>,
}

impl ConsumedResult {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// The first row, if any.
    pub fn single(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// Integer field from the first row, if present.
    pub fn single_i64(&self, field: &str) -> Option<i64> {
        self.single().and_then(|row| row.get(field)).and_then(Value::as_i64)
    }
}

/// Capability to run one parametrized statement against the store.
///
/// Implementations open their own session per call and fully consume the
/// result before returning. `transactional = false` is for schema-definition
/// statements the store forbids wrapping in an explicit transaction.
pub trait GraphStore: Send + Sync {
    fn run(
        &self,
        statement: &str,
        params: &[(&'static str, ParamValue)],
        transactional: bool,
    ) -> Result<ConsumedResult, StoreError>;
}
