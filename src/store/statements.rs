//! Statement catalog
//!
//! The literal Cypher text is part of the store contract, so every statement
//! the crate issues lives here, each with a typed parameter struct where it
//! takes parameters. Schema-object names cannot be parametrized by the query
//! language; the drop builders validate them against an allow-listed
//! identifier character set before interpolating.

use crate::store::{ParamValue, Params};

/// Artist nodes: id and display name.
pub const MATCH_ARTISTS: &str = "MATCH (a:Artist) RETURN a.id AS id, a.name AS name";

/// Genre nodes: id and display name.
pub const MATCH_GENRES: &str = "MATCH (g:Genre) RETURN g.id AS id, g.name AS name";

/// Artist-to-artist similarity edges.
pub const MATCH_SIMILAR_EDGES: &str =
    "MATCH (a1:Artist)-[:SIMILAR_TO]->(a2:Artist) RETURN a1.id AS source, a2.id AS target";

/// Artist-to-genre membership edges.
pub const MATCH_PLAYS_GENRE_EDGES: &str =
    "MATCH (a:Artist)-[:PLAYS_GENRE]->(g:Genre) RETURN a.id AS source, g.id AS target";

/// Delete up to `$batch_size` relationships, returning how many went.
pub const DELETE_RELATIONSHIP_BATCH: &str =
    "MATCH ()-[r]->() WITH r LIMIT $batch_size DELETE r RETURN count(r) AS deleted";

/// Delete up to `$batch_size` nodes, returning how many went. Only valid once
/// relationships are gone; a node still carrying relationships cannot be
/// deleted by a plain DELETE.
pub const DELETE_NODE_BATCH: &str =
    "MATCH (n) WITH n LIMIT $batch_size DELETE n RETURN count(n) AS deleted";

/// Enumerate index definitions (name and type columns are consumed).
pub const SHOW_INDEXES: &str = "SHOW INDEXES";

/// Enumerate constraint definitions.
pub const SHOW_CONSTRAINTS: &str = "SHOW CONSTRAINTS";

/// Node count paired with relationship count.
pub const COUNT_NODES: &str = "MATCH (n) RETURN count(n) AS count";
pub const COUNT_RELATIONSHIPS: &str = "MATCH ()-[r]->() RETURN count(r) AS count";

/// Parameters for the bounded delete statements.
#[derive(Debug, Clone, Copy)]
pub struct DeleteBatchParams {
    pub batch_size: i64,
}

impl DeleteBatchParams {
    pub fn params(&self) -> Params {
        vec![("batch_size", ParamValue::Int(self.batch_size))]
    }
}

/// Whether a schema-object name is safe to interpolate into statement text.
pub fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit())
}

/// `DROP INDEX` statement for a validated name; None when the name fails
/// validation.
pub fn drop_index(name: &str) -> Option<String> {
    is_valid_identifier(name).then(|| format!("DROP INDEX {name}"))
}

/// `DROP CONSTRAINT` statement for a validated name.
pub fn drop_constraint(name: &str) -> Option<String> {
    is_valid_identifier(name).then(|| format!("DROP CONSTRAINT {name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        assert!(is_valid_identifier("artist_id_idx"));
        assert!(is_valid_identifier("Index2"));
        assert!(is_valid_identifier("_internal"));
    }

    #[test]
    fn rejects_unsafe_identifiers() {
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("2fast"));
        assert!(!is_valid_identifier("drop index"));
        assert!(!is_valid_identifier("x; MATCH (n) DETACH DELETE n"));
        assert!(!is_valid_identifier("name-with-dash"));
    }

    #[test]
    fn builds_drop_statements_for_valid_names() {
        assert_eq!(
            drop_index("artist_idx").as_deref(),
            Some("DROP INDEX artist_idx")
        );
        assert_eq!(
            drop_constraint("artist_unique").as_deref(),
            Some("DROP CONSTRAINT artist_unique")
        );
        assert_eq!(drop_index("bad name"), None);
        assert_eq!(drop_constraint(""), None);
    }

    #[test]
    fn delete_batch_params_serialize() {
        let params = DeleteBatchParams { batch_size: 500 }.params();
        assert_eq!(params, vec![("batch_size", ParamValue::Int(500))]);
    }
}
