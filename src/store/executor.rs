//! Resilient mutation execution
//!
//! Every store mutation in the pipeline funnels through `MutationExecutor` so
//! transient failures are retried with exponential backoff and destructive
//! bulk operations stay bounded. The executor holds no state across calls
//! beyond the store handle; callers may share one across threads.

use crate::config::RetryPolicy;
use crate::error::StoreError;
use crate::store::statements::{self, DeleteBatchParams};
use crate::store::{ConsumedResult, GraphStore, ParamValue};
use serde_json::Value;
use std::thread;

/// Index types we created and are allowed to drop during cleanup; anything
/// else (lookup, fulltext, vector) is left untouched.
const DROPPABLE_INDEX_TYPES: [&str; 4] = ["range", "point", "text", "btree"];

/// Node and relationship counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityCounts {
    pub nodes: i64,
    pub relationships: i64,
}

/// Retry-safe statement execution over a [`GraphStore`].
pub struct MutationExecutor<S> {
    store: S,
}

impl<S: GraphStore> MutationExecutor<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store handle.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one statement in one transaction and fully consume the result.
    ///
    /// `transactional = false` is reserved for schema statements the store
    /// refuses to run inside an explicit transaction.
    pub fn execute(
        &self,
        statement: &str,
        params: &[(&'static str, ParamValue)],
        transactional: bool,
    ) -> Result<ConsumedResult, StoreError> {
        self.store.run(statement, params, transactional)
    }

    /// `execute` with transparent retry of transient failures.
    ///
    /// Retry `n` sleeps `base_delay * 2^n` first. Permanent errors propagate
    /// immediately; once `max_retries` extra attempts are spent, the last
    /// transient error is returned unchanged.
    pub fn execute_with_retry(
        &self,
        statement: &str,
        params: &[(&'static str, ParamValue)],
        policy: &RetryPolicy,
    ) -> Result<ConsumedResult, StoreError> {
        let mut attempt = 0u32;
        loop {
            match self.execute(statement, params, true) {
                Ok(result) => return Ok(result),
                Err(err) if err.is_transient() && attempt < policy.max_retries => {
                    let delay = policy.base_delay * 2u32.saturating_pow(attempt);
                    log::warn!(
                        "Transient store error on attempt {}/{}: {} (retrying in {:?})",
                        attempt + 1,
                        policy.max_retries + 1,
                        err,
                        delay
                    );
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Clear all data and schema objects from the store.
    ///
    /// Four phases, in order: delete relationships in bounded batches until a
    /// batch reports 0, delete nodes the same way, then best-effort drop of
    /// indexes and constraints. Relationships go first because a node still
    /// carrying relationships cannot be deleted by a plain DELETE. A delete
    /// failure that survives retries is fatal and aborts before the schema
    /// phases; individual drop failures are only warnings.
    pub fn clear_store(&self, batch_size: i64, policy: &RetryPolicy) -> Result<(), StoreError> {
        log::info!("Starting store cleanup...");

        let deleted =
            self.drain_deletes(statements::DELETE_RELATIONSHIP_BATCH, batch_size, policy)?;
        log::info!("Deleted {} relationships.", deleted);

        let deleted = self.drain_deletes(statements::DELETE_NODE_BATCH, batch_size, policy)?;
        log::info!("Deleted {} nodes.", deleted);

        self.drop_indexes()?;
        self.drop_constraints()?;

        log::info!("Store cleanup complete.");
        Ok(())
    }

    /// Issue a bounded delete statement until it converges on 0 deleted.
    fn drain_deletes(
        &self,
        statement: &'static str,
        batch_size: i64,
        policy: &RetryPolicy,
    ) -> Result<i64, StoreError> {
        let params = DeleteBatchParams { batch_size }.params();
        let mut total = 0i64;

        loop {
            let result = self.execute_with_retry(statement, &params, policy)?;
            let deleted = result.single_i64("deleted").unwrap_or(0);
            total += deleted;
            if deleted == 0 {
                return Ok(total);
            }
        }
    }

    /// Drop every index whose type is in the allow-list, best-effort.
    fn drop_indexes(&self) -> Result<(), StoreError> {
        let listing = self.execute(statements::SHOW_INDEXES, &[], false)?;

        for entry in &listing.rows {
            let Some(name) = entry.get("name").and_then(Value::as_str) else {
                continue;
            };
            let index_type = entry
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_ascii_lowercase();
            if !DROPPABLE_INDEX_TYPES.contains(&index_type.as_str()) {
                continue;
            }

            match statements::drop_index(name) {
                Some(statement) => match self.execute(&statement, &[], false) {
                    Ok(_) => log::info!("Dropped index: {}", name),
                    Err(err) => log::warn!("Failed to drop index {}: {}", name, err),
                },
                None => log::warn!("Skipping index with unsafe name: {:?}", name),
            }
        }

        Ok(())
    }

    /// Drop every constraint, best-effort.
    fn drop_constraints(&self) -> Result<(), StoreError> {
        let listing = self.execute(statements::SHOW_CONSTRAINTS, &[], false)?;

        for entry in &listing.rows {
            let Some(name) = entry.get("name").and_then(Value::as_str) else {
                continue;
            };

            match statements::drop_constraint(name) {
                Some(statement) => match self.execute(&statement, &[], false) {
                    Ok(_) => log::info!("Dropped constraint: {}", name),
                    Err(err) => log::warn!("Failed to drop constraint {}: {}", name, err),
                },
                None => log::warn!("Skipping constraint with unsafe name: {:?}", name),
            }
        }

        Ok(())
    }

    /// Node and relationship counts, for post-mutation verification logging.
    pub fn count_entities(&self) -> Result<EntityCounts, StoreError> {
        let nodes = self
            .execute(statements::COUNT_NODES, &[], true)?
            .single_i64("count")
            .unwrap_or(0);
        let relationships = self
            .execute(statements::COUNT_RELATIONSHIPS, &[], true)?
            .single_i64("count")
            .unwrap_or(0);

        Ok(EntityCounts {
            nodes,
            relationships,
        })
    }
}
