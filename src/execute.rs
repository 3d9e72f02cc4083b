use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::error::{NodeFailure, VaultError};
use crate::node::{NodeClient, NodeError, NodeMap};

/// Invokes `operation(client, index)` against every configured node
/// concurrently and waits for all outcomes to settle.
///
/// This is an all-settle fan-out, never a fail-fast race: a slow or erroring
/// node does not starve the others, and no partial success is returned
/// early. On full success the per-node results come back keyed by node
/// identity, in cluster order. If any node rejects, the whole call fails
/// with one [`NodeFailure`] per rejecting node and the successful nodes'
/// results are discarded: callers get all-or-nothing semantics per logical
/// operation.
///
/// No timeout or cancellation exists at this layer; a logical call's
/// latency is bounded by the slowest responding node.
pub async fn execute_on_cluster<F, Fut, T>(
    clients: &[Arc<dyn NodeClient>],
    operation: F,
) -> Result<NodeMap<T>, VaultError>
where
    F: Fn(Arc<dyn NodeClient>, usize) -> Fut,
    Fut: Future<Output = Result<T, NodeError>>,
{
    debug!(nodes = clients.len(), "fanning out cluster operation");

    let calls = clients
        .iter()
        .enumerate()
        .map(|(index, client)| operation(Arc::clone(client), index));
    let settled = join_all(calls).await;

    let mut results = NodeMap::with_capacity(clients.len());
    let mut failures = Vec::new();
    for (client, outcome) in clients.iter().zip(settled) {
        match outcome {
            Ok(value) => {
                results.insert(client.id().clone(), value);
            }
            Err(error) => failures.push(NodeFailure {
                node: client.id().clone(),
                error,
            }),
        }
    }

    if failures.is_empty() {
        Ok(results)
    } else {
        for failure in &failures {
            warn!(node = %failure.node, error = %failure.error, "node operation rejected");
        }
        Err(VaultError::Cluster(failures))
    }
}
