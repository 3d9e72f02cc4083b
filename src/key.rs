use rand::Rng;
use sha2::{Digest, Sha256};

use crate::error::VaultError;

/// The operation kind a confidentiality key is derived for.
///
/// Only `Store` is implemented by the reference sharer; the other kinds are
/// carried so callers interoperating with primitives that support them can
/// still express the intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyOperation {
    /// Encrypt-then-split storage of a confidential field.
    #[default]
    Store,
    /// Matching (deterministic) concealment.
    Match,
    /// Additive aggregation over concealed numerics.
    Sum,
}

/// Key material for a single-party key: one secret held by one writer,
/// shares distributed N-of-N across the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretKeyMaterial {
    material: [u8; 32],
    nodes: usize,
    operation: KeyOperation,
}

/// Key material for a cluster-party key: shares recombine with a
/// configurable threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterKeyMaterial {
    material: [u8; 32],
    nodes: usize,
    threshold: usize,
    operation: KeyOperation,
}

/// A confidentiality key, opaque to the orchestration pipeline beyond its
/// node count and threshold.
///
/// The key's node count is fixed at derivation time and must equal the size
/// of the cluster it is used against; the mismatch is a fatal precondition
/// failure raised before any network call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConcealKey {
    Single(SecretKeyMaterial),
    Cluster(ClusterKeyMaterial),
}

impl ConcealKey {
    /// The number of nodes this key produces shares for.
    pub fn node_count(&self) -> usize {
        match self {
            ConcealKey::Single(key) => key.nodes,
            ConcealKey::Cluster(key) => key.nodes,
        }
    }

    /// The minimum number of shares required to recombine a concealed value.
    ///
    /// Single-party keys are N-of-N; cluster keys honor their configured
    /// threshold.
    pub fn threshold(&self) -> usize {
        match self {
            ConcealKey::Single(key) => key.nodes,
            ConcealKey::Cluster(key) => key.threshold,
        }
    }

    /// The operation kind this key was derived for.
    pub fn operation(&self) -> KeyOperation {
        match self {
            ConcealKey::Single(key) => key.operation,
            ConcealKey::Cluster(key) => key.operation,
        }
    }

    pub(crate) fn material(&self) -> &[u8; 32] {
        match self {
            ConcealKey::Single(key) => &key.material,
            ConcealKey::Cluster(key) => &key.material,
        }
    }
}

/// How a client derives (or accepts) its confidentiality key.
///
/// Validity is a property of which variant was constructed, not a runtime
/// shape check: a seed only appears on the single-party variant, a threshold
/// only on the cluster variant.
#[derive(Debug, Clone)]
pub enum KeyConfig {
    /// Use a ready-made key as-is. Its node count must match the cluster.
    UseExistingKey(ConcealKey),
    /// Derive a single-party key, deterministically when a seed is given.
    DeriveKey {
        operation: KeyOperation,
        seed: Option<String>,
    },
    /// Derive a random cluster-party key with an optional recombination
    /// threshold (defaults to N-of-N).
    DeriveClusterKey {
        operation: KeyOperation,
        threshold: Option<usize>,
    },
}

impl KeyConfig {
    /// Maps the loose parameter form (seed?, cluster flag, threshold?) onto a
    /// concrete variant, honoring the mutual-exclusivity rules: a seed forces
    /// a single-party key, an explicit cluster request forces a cluster key,
    /// and with neither set a cluster of more than one node defaults to a
    /// cluster key.
    pub fn from_parameters(
        operation: KeyOperation,
        seed: Option<String>,
        cluster: bool,
        threshold: Option<usize>,
        node_count: usize,
    ) -> Result<Self, VaultError> {
        match (seed, cluster) {
            (Some(_), true) => Err(VaultError::KeyConfigConflict),
            (Some(_), false) if threshold.is_some() => Err(VaultError::KeyConfigConflict),
            (Some(seed), false) => Ok(KeyConfig::DeriveKey {
                operation,
                seed: Some(seed),
            }),
            (None, true) => Ok(KeyConfig::DeriveClusterKey {
                operation,
                threshold,
            }),
            (None, false) if node_count > 1 => Ok(KeyConfig::DeriveClusterKey {
                operation,
                threshold,
            }),
            (None, false) => Ok(KeyConfig::DeriveKey {
                operation,
                seed: None,
            }),
        }
    }

    /// Resolves this configuration into key material for a cluster of
    /// `node_count` nodes.
    pub fn resolve(self, node_count: usize) -> Result<ConcealKey, VaultError> {
        if node_count == 0 {
            return Err(VaultError::EmptyCluster);
        }
        match self {
            KeyConfig::UseExistingKey(key) => {
                if key.node_count() != node_count {
                    return Err(VaultError::ShareCountMismatch {
                        expected: key.node_count(),
                        actual: node_count,
                    });
                }
                Ok(key)
            }
            KeyConfig::DeriveKey { operation, seed } => {
                let material = match seed {
                    Some(seed) => seeded_material(&seed),
                    None => random_material(),
                };
                Ok(ConcealKey::Single(SecretKeyMaterial {
                    material,
                    nodes: node_count,
                    operation,
                }))
            }
            KeyConfig::DeriveClusterKey {
                operation,
                threshold,
            } => {
                let threshold = threshold.unwrap_or(node_count);
                if threshold == 0 || threshold > node_count {
                    return Err(VaultError::InvalidThreshold {
                        threshold,
                        nodes: node_count,
                    });
                }
                Ok(ConcealKey::Cluster(ClusterKeyMaterial {
                    material: random_material(),
                    nodes: node_count,
                    threshold,
                    operation,
                }))
            }
        }
    }
}

fn seeded_material(seed: &str) -> [u8; 32] {
    let digest = Sha256::digest(seed.as_bytes());
    let mut material = [0u8; 32];
    material.copy_from_slice(&digest);
    material
}

fn random_material() -> [u8; 32] {
    let mut material = [0u8; 32];
    rand::thread_rng().fill(&mut material[..]);
    material
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_derivation_is_deterministic() {
        let a = KeyConfig::DeriveKey {
            operation: KeyOperation::Store,
            seed: Some("my seed".to_string()),
        }
        .resolve(3)
        .unwrap();
        let b = KeyConfig::DeriveKey {
            operation: KeyOperation::Store,
            seed: Some("my seed".to_string()),
        }
        .resolve(3)
        .unwrap();

        assert_eq!(a, b);
        assert_eq!(a.node_count(), 3);
        assert_eq!(a.threshold(), 3);
    }

    #[test]
    fn test_seed_and_cluster_request_conflict() {
        let err = KeyConfig::from_parameters(
            KeyOperation::Store,
            Some("seed".to_string()),
            true,
            None,
            3,
        )
        .unwrap_err();
        assert!(matches!(err, VaultError::KeyConfigConflict));
    }

    #[test]
    fn test_multi_node_defaults_to_cluster_key() {
        let config =
            KeyConfig::from_parameters(KeyOperation::Store, None, false, None, 3).unwrap();
        let key = config.resolve(3).unwrap();
        assert!(matches!(key, ConcealKey::Cluster(_)));
    }

    #[test]
    fn test_single_node_defaults_to_single_party_key() {
        let config =
            KeyConfig::from_parameters(KeyOperation::Store, None, false, None, 1).unwrap();
        let key = config.resolve(1).unwrap();
        assert!(matches!(key, ConcealKey::Single(_)));
        assert_eq!(key.threshold(), 1);
    }

    #[test]
    fn test_cluster_threshold_is_honored_and_validated() {
        let key = KeyConfig::DeriveClusterKey {
            operation: KeyOperation::Store,
            threshold: Some(2),
        }
        .resolve(3)
        .unwrap();
        assert_eq!(key.threshold(), 2);

        let err = KeyConfig::DeriveClusterKey {
            operation: KeyOperation::Store,
            threshold: Some(4),
        }
        .resolve(3)
        .unwrap_err();
        assert!(matches!(err, VaultError::InvalidThreshold { .. }));
    }

    #[test]
    fn test_existing_key_node_count_must_match() {
        let key = KeyConfig::DeriveClusterKey {
            operation: KeyOperation::Store,
            threshold: None,
        }
        .resolve(3)
        .unwrap();

        let err = KeyConfig::UseExistingKey(key).resolve(5).unwrap_err();
        assert!(matches!(
            err,
            VaultError::ShareCountMismatch {
                expected: 3,
                actual: 5
            }
        ));
    }
}
