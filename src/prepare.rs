use serde_json::Value;
use tracing::debug;

use crate::error::VaultError;
use crate::key::ConcealKey;
use crate::node::{NodeId, NodeMap};
use crate::sss::SecretSharer;
use crate::transform::conceal;
use crate::value::find_allotted;

/// Produces the per-node request bodies for one logical operation.
///
/// With no key configured every node receives an independent deep copy of
/// `body`, so later mutation of one node's prepared body cannot affect
/// another's; any concealment marker in the body is then a programming
/// error. With a key configured, marked fields are concealed and node `i`
/// receives the variant carrying its shares.
///
/// # Errors
///
/// * [`VaultError::MarkerWithoutKey`] if `body` carries a `%allot` marker
///   and `key` is `None`.
/// * [`VaultError::ShareCountMismatch`] if the key was derived for a
///   different cluster size than `node_ids`.
pub fn prepare_request(
    sharer: &dyn SecretSharer,
    key: Option<&ConcealKey>,
    node_ids: &[NodeId],
    body: &Value,
) -> Result<NodeMap<Value>, VaultError> {
    match key {
        None => {
            if !find_allotted(body).is_empty() {
                return Err(VaultError::MarkerWithoutKey);
            }
            debug!(nodes = node_ids.len(), "preparing plaintext fan-out");
            Ok(node_ids
                .iter()
                .map(|id| (id.clone(), body.clone()))
                .collect())
        }
        Some(key) => {
            if key.node_count() != node_ids.len() {
                return Err(VaultError::ShareCountMismatch {
                    expected: key.node_count(),
                    actual: node_ids.len(),
                });
            }
            let variants = conceal(sharer, key, body)?;
            Ok(node_ids.iter().cloned().zip(variants).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{KeyConfig, KeyOperation};
    use crate::sss::ShamirSharer;
    use serde_json::json;

    fn ids(n: usize) -> Vec<NodeId> {
        (0..n).map(|i| NodeId::new(format!("node-{i}"))).collect()
    }

    fn cluster_key(nodes: usize) -> ConcealKey {
        KeyConfig::DeriveClusterKey {
            operation: KeyOperation::Store,
            threshold: None,
        }
        .resolve(nodes)
        .unwrap()
    }

    #[test]
    fn test_plaintext_bodies_are_independent_copies() {
        let body = json!({ "name": "collection", "nested": { "x": [1, 2] } });
        let mut prepared = prepare_request(&ShamirSharer, None, &ids(3), &body).unwrap();

        assert_eq!(prepared.len(), 3);
        let first = prepared.get_index_mut(0).unwrap().1;
        first["nested"]["x"][0] = json!(99);

        let second = &prepared[&NodeId::new("node-1")];
        assert_eq!(second["nested"]["x"][0], json!(1));
    }

    #[test]
    fn test_marker_without_key_is_fatal() {
        let body = json!({ "ssn": { "%allot": "123-45-6789" } });
        let err = prepare_request(&ShamirSharer, None, &ids(3), &body).unwrap_err();
        assert!(matches!(err, VaultError::MarkerWithoutKey));
    }

    #[test]
    fn test_key_node_count_mismatch_is_fatal() {
        let key = cluster_key(3);
        let body = json!({ "ssn": { "%allot": "123-45-6789" } });
        let err = prepare_request(&ShamirSharer, Some(&key), &ids(5), &body).unwrap_err();
        assert!(matches!(
            err,
            VaultError::ShareCountMismatch {
                expected: 3,
                actual: 5
            }
        ));
    }

    #[test]
    fn test_keyed_bodies_carry_distinct_shares() {
        let key = cluster_key(3);
        let body = json!({ "ssn": { "%allot": "123-45-6789" }, "plan": "basic" });
        let prepared = prepare_request(&ShamirSharer, Some(&key), &ids(3), &body).unwrap();

        assert_eq!(prepared.len(), 3);
        let shares: Vec<&str> = prepared
            .values()
            .map(|body| body["ssn"]["%share"].as_str().unwrap())
            .collect();
        assert_ne!(shares[0], shares[1]);
        assert_ne!(shares[1], shares[2]);
        assert!(prepared.values().all(|body| body["plan"] == json!("basic")));
    }

    #[test]
    fn test_keyed_body_without_markers_is_plain_copies() {
        let key = cluster_key(2);
        let body = json!({ "plan": "basic" });
        let prepared = prepare_request(&ShamirSharer, Some(&key), &ids(2), &body).unwrap();

        assert!(prepared.values().all(|b| *b == body));
    }
}
