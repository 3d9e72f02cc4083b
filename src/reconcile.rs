use indexmap::IndexMap;
use rand::Rng;
use serde_json::Value;
use tracing::debug;

use crate::constants::DOCUMENT_ID_FIELD;
use crate::error::VaultError;
use crate::key::ConcealKey;
use crate::node::{ListResponse, NodeMap, ObjectResponse};
use crate::sss::SecretSharer;
use crate::transform::reveal;

/// How one canonical answer is chosen from N structurally-identical
/// plaintext node responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionStrategy {
    /// Pick the first node's response in cluster order. Deterministic.
    #[default]
    First,
    /// Pick a uniformly random node's response.
    Random,
}

/// Selects one canonical response from the per-node result map.
///
/// For non-confidential reads all nodes are assumed to hold identical data,
/// so any one's answer is "the" answer; no cross-node consistency check is
/// performed.
///
/// # Errors
///
/// [`VaultError::EmptyResponseSet`] if the map is empty.
pub fn canonical_response<T>(
    mut responses: NodeMap<T>,
    strategy: SelectionStrategy,
) -> Result<T, VaultError> {
    if responses.is_empty() {
        return Err(VaultError::EmptyResponseSet);
    }
    let index = match strategy {
        SelectionStrategy::First => 0,
        SelectionStrategy::Random => rand::thread_rng().gen_range(0..responses.len()),
    };
    let (node, value) = responses
        .swap_remove_index(index)
        .ok_or(VaultError::EmptyResponseSet)?;
    debug!(%node, ?strategy, "selected canonical response");
    Ok(value)
}

/// Reconciles a confidential list response (`find`, `query`).
///
/// Every node's document array is flattened into one stream, entries are
/// grouped strictly by their `_id`, and each group is revealed into one
/// logical document. Documents without an `_id` cannot be correlated across
/// nodes and are revealed individually.
pub fn unify_list_response(
    sharer: &dyn SecretSharer,
    key: &ConcealKey,
    responses: NodeMap<ListResponse>,
) -> Result<Vec<Value>, VaultError> {
    let mut groups: IndexMap<String, Vec<Value>> = IndexMap::new();
    let mut uncorrelated: Vec<Value> = Vec::new();

    for (_, response) in responses {
        for doc in response.data {
            match doc.get(DOCUMENT_ID_FIELD).map(Value::to_string) {
                Some(id) => groups.entry(id).or_default().push(doc),
                None => uncorrelated.push(doc),
            }
        }
    }
    debug!(
        groups = groups.len(),
        uncorrelated = uncorrelated.len(),
        "reconciling list response"
    );

    let mut revealed = Vec::with_capacity(groups.len() + uncorrelated.len());
    for (_, group) in groups {
        revealed.push(reveal(sharer, key, &group)?);
    }
    for doc in uncorrelated {
        revealed.push(reveal(sharer, key, std::slice::from_ref(&doc))?);
    }

    Ok(revealed)
}

/// Reconciles a confidential single-object response.
///
/// The logical document is already identified (collection + document id), so
/// no grouping is needed: each node contributes exactly one share-bearing
/// variant and a single reveal reconstructs the document.
pub fn unify_object_response(
    sharer: &dyn SecretSharer,
    key: &ConcealKey,
    responses: NodeMap<ObjectResponse>,
) -> Result<Value, VaultError> {
    let docs: Vec<Value> = responses
        .into_iter()
        .map(|(_, response)| response.data)
        .collect();
    reveal(sharer, key, &docs)
}
