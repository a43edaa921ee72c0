//! Neo4j-backed store adapter
//!
//! Wraps a `neo4rs` connection pool behind the synchronous [`GraphStore`]
//! capability. The adapter owns a private tokio runtime and blocks on each
//! round trip, so callers see plain blocking calls and the rest of the crate
//! stays free of async plumbing.

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::store::{ConsumedResult, GraphStore, ParamValue, Row};
use anyhow::{Context, Result};
use neo4rs::{query, ConfigBuilder, Graph, Query};
use serde_json::Value;
use tokio::runtime::Runtime;

/// Message fragments that mark a driver error as retry-safe. Neo4j surfaces
/// its transient status codes in the error text.
const TRANSIENT_MARKERS: [&str; 5] = [
    "TransientError",
    "SessionExpired",
    "ServiceUnavailable",
    "connection",
    "broken pipe",
];

/// Synchronous Neo4j client implementing [`GraphStore`].
pub struct Neo4jStore {
    runtime: Runtime,
    graph: Graph,
}

impl Neo4jStore {
    /// Connect to the store and ping it.
    ///
    /// `neo4rs` pools lazily, so without the ping an unreachable server would
    /// only fail on the first real statement; the eager `RETURN 1` makes
    /// connection problems fail fast here instead.
    pub fn connect(config: &StoreConfig) -> Result<Self> {
        let runtime = Runtime::new().context("Failed to start store runtime")?;

        let neo4j_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .db(config.database.as_str())
            .build()
            .context("Failed to build Neo4j config")?;

        let graph = runtime
            .block_on(Graph::connect(neo4j_config))
            .context("Failed to create Neo4j connection pool")?;

        runtime
            .block_on(graph.run(query("RETURN 1")))
            .context("Neo4j is not responding to queries")?;

        log::debug!("Connected to graph store at {}", config.uri);

        Ok(Self { runtime, graph })
    }

    async fn run_auto_commit(
        graph: &Graph,
        statement: Query,
    ) -> Result<Vec<neo4rs::Row>, neo4rs::Error> {
        let mut stream = graph.execute(statement).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    async fn run_in_transaction(
        graph: &Graph,
        statement: Query,
    ) -> Result<Vec<neo4rs::Row>, neo4rs::Error> {
        let mut txn = graph.start_txn().await?;
        let mut stream = txn.execute(statement).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next(txn.handle()).await? {
            rows.push(row);
        }
        txn.commit().await?;
        Ok(rows)
    }
}

impl GraphStore for Neo4jStore {
    fn run(
        &self,
        statement: &str,
        params: &[(&'static str, ParamValue)],
        transactional: bool,
    ) -> Result<ConsumedResult, StoreError> {
        let built = build_query(statement, params);

        let outcome = if transactional {
            self.runtime
                .block_on(Self::run_in_transaction(&self.graph, built))
        } else {
            self.runtime
                .block_on(Self::run_auto_commit(&self.graph, built))
        };

        let raw = outcome.map_err(classify)?;
        let rows = raw
            .iter()
            .map(into_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ConsumedResult::new(rows))
    }
}

fn build_query(statement: &str, params: &[(&'static str, ParamValue)]) -> Query {
    let mut built = query(statement);
    for (name, value) in params {
        built = match value {
            ParamValue::Bool(v) => built.param(name, *v),
            ParamValue::Int(v) => built.param(name, *v),
            ParamValue::Float(v) => built.param(name, *v),
            ParamValue::Str(v) => built.param(name, v.as_str()),
            ParamValue::StrList(v) => built.param(name, v.clone()),
        };
    }
    built
}

/// Decode one driver row into a column-keyed JSON map.
fn into_row(row: &neo4rs::Row) -> Result<Row, StoreError> {
    let value: Value = row
        .to()
        .map_err(|err| StoreError::Permanent(format!("failed to decode result row: {err}")))?;
    match value {
        Value::Object(map) => Ok(map),
        other => {
            // Single unnamed column, e.g. the connect ping.
            let mut map = Row::new();
            map.insert("value".to_string(), other);
            Ok(map)
        }
    }
}

/// Split driver failures into the retry-safe and permanent halves of the
/// error taxonomy.
fn classify(err: neo4rs::Error) -> StoreError {
    let message = err.to_string();
    let lowered = message.to_ascii_lowercase();
    let transient = TRANSIENT_MARKERS
        .iter()
        .any(|marker| lowered.contains(&marker.to_ascii_lowercase()));

    if transient {
        StoreError::Transient(message)
    } else {
        StoreError::Permanent(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_failures_classify_as_permanent() {
        let err = classify(neo4rs::Error::UnsupportedVersion("5".to_string()));
        assert!(!err.is_transient());
    }
}
