use core::fmt;

use crate::auth::AuthError;
use crate::node::{NodeError, NodeId};

/// One node's contribution to an aggregated cluster failure.
///
/// Carries the node identity alongside the normalized per-node error so
/// callers can tell "all nodes failed the same way" apart from "nodes
/// disagree".
#[derive(Debug, Clone)]
pub struct NodeFailure {
    /// Identity of the node whose operation rejected.
    pub node: NodeId,
    /// The normalized error reported by that node's client.
    pub error: NodeError,
}

impl fmt::Display for NodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error.status {
            Some(status) => write!(f, "{}: [{}] {}", self.node, status, self.error.message),
            None => write!(f, "{}: {}", self.node, self.error.message),
        }
    }
}

/// Errors produced by the cluster orchestration and secret-sharing pipeline.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// A `%allot` marker was found in an outbound body while no
    /// confidentiality key is configured. Programming error, not retried.
    #[error("confidentiality marker present but no key is configured")]
    MarkerWithoutKey,

    /// The confidentiality key was derived for a different cluster size than
    /// the one being addressed.
    #[error("key is configured for {expected} nodes but the cluster has {actual}")]
    ShareCountMismatch { expected: usize, actual: usize },

    /// Canonical-response selection was handed an empty per-node result map.
    #[error("failed to select a canonical response: no node responses")]
    EmptyResponseSet,

    /// At least one node rejected the logical operation. Successful nodes'
    /// results are discarded; only the failing nodes are listed.
    #[error("cluster operation failed on {} node(s)", .0.len())]
    Cluster(Vec<NodeFailure>),

    /// A share group carried fewer shares than the key's threshold requires.
    #[error("share group holds {got} share(s) but the key requires {needed}")]
    IncompleteShareGroup { needed: usize, got: usize },

    /// A `%share` value could not be decoded back into share bytes.
    #[error("invalid share encoding: {0}")]
    InvalidShare(String),

    /// A mutually exclusive key-derivation parameter combination was given.
    #[error("a key seed forces a single-party key and cannot be combined with a cluster key request")]
    KeyConfigConflict,

    /// The requested Shamir threshold cannot be satisfied by the cluster.
    #[error("invalid threshold {threshold} for a cluster of {nodes} node(s)")]
    InvalidThreshold { threshold: usize, nodes: usize },

    /// A recorded concealment path no longer resolves inside a body.
    #[error("no value at path {0}")]
    PathNotFound(String),

    /// Two configured nodes reported the same identity.
    #[error("duplicate node identity in cluster: {0}")]
    DuplicateNode(NodeId),

    /// A client was constructed with no nodes at all.
    #[error("cluster has no configured nodes")]
    EmptyCluster,

    /// Failure inside the secret-sharing primitive.
    #[error("crypto failure: {0}")]
    Crypto(String),

    /// Token minting failed for one of the node audiences.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A body or response could not be (de)serialized.
    #[error("serialization failure: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file or environment parsing failed.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
