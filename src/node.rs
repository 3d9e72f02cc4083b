use core::fmt;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable identity of one cluster member, derived from the node's public
/// credential. Unique within a cluster and used as the map key throughout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        NodeId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        NodeId(id.to_string())
    }
}

/// A map from node identity to a per-node value, preserving the cluster's
/// configured node order. "Share index i corresponds to node i" and the
/// "first" canonical-selection strategy both lean on this ordering.
pub type NodeMap<T> = IndexMap<NodeId, T>;

/// Identity and credentials a node reports about itself at discovery time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    pub id: NodeId,
    pub public_key: String,
    pub url: String,
}

/// Normalized error extracted from a failed per-node call: a message plus,
/// when the transport surfaced them, the HTTP status and response body.
#[derive(Debug, Clone, thiserror::Error)]
#[error("node request failed: {message}")]
pub struct NodeError {
    pub message: String,
    pub status: Option<u16>,
    pub body: Option<Value>,
}

impl NodeError {
    pub fn new(message: impl Into<String>) -> Self {
        NodeError {
            message: message.into(),
            status: None,
            body: None,
        }
    }

    pub fn with_status(message: impl Into<String>, status: u16, body: Option<Value>) -> Self {
        NodeError {
            message: message.into(),
            status: Some(status),
            body,
        }
    }
}

/// A list-shaped node response (`find`, `query`): zero or more documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    pub data: Vec<Value>,
}

/// An object-shaped node response (single-document reads, profile reads).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectResponse {
    pub data: Value,
}

/// One cluster member's typed client: a thin wrapper around that node's
/// fixed REST endpoints, one async method per logical operation.
///
/// Implementations own transport concerns (per-request timeouts, retry with
/// backoff for transient network errors); the orchestration layer above
/// never retries. Every data-bearing method takes a node-scoped bearer token
/// because each node is a distinct token audience.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// The node's stable identity.
    fn id(&self) -> &NodeId;

    /// Discovery call used at construction to learn the node's identity and
    /// public key.
    async fn about_node(&self) -> Result<NodeInfo, NodeError>;

    async fn register(&self, token: &str, body: Value) -> Result<Value, NodeError>;

    async fn create_collection(&self, token: &str, body: Value) -> Result<Value, NodeError>;

    async fn delete_collection(&self, token: &str, collection: &str) -> Result<Value, NodeError>;

    async fn create_data(&self, token: &str, body: Value) -> Result<Value, NodeError>;

    async fn find_data(&self, token: &str, body: Value) -> Result<ListResponse, NodeError>;

    async fn update_data(&self, token: &str, body: Value) -> Result<Value, NodeError>;

    async fn delete_data(&self, token: &str, body: Value) -> Result<Value, NodeError>;

    async fn read_data(
        &self,
        token: &str,
        collection: &str,
        document: &str,
    ) -> Result<ObjectResponse, NodeError>;

    async fn run_query(&self, token: &str, body: Value) -> Result<ListResponse, NodeError>;

    async fn grant_access(&self, token: &str, body: Value) -> Result<Value, NodeError>;

    async fn revoke_access(&self, token: &str, body: Value) -> Result<Value, NodeError>;

    async fn read_profile(&self, token: &str) -> Result<ObjectResponse, NodeError>;
}
