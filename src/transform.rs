use serde_json::Value;
use tracing::debug;

use crate::error::VaultError;
use crate::key::ConcealKey;
use crate::sss::SecretSharer;
use crate::value::{find_allotted, find_shares, splice_plain, splice_share, JsonPath};

/// Conceals a logical document for distribution across a cluster.
///
/// Every `%allot`-marked value is encrypted and split independently, then N
/// node-specific variants of the document are materialized, each carrying
/// that node's share under a `%share` key where the marker was. Unmarked
/// fields are copied through identically into every variant.
///
/// # Errors
///
/// Fails if the sharer does not produce exactly `key.node_count()` shares
/// for a marked value, or if a recorded marker path cannot be spliced.
pub fn conceal(
    sharer: &dyn SecretSharer,
    key: &ConcealKey,
    doc: &Value,
) -> Result<Vec<Value>, VaultError> {
    let marked = find_allotted(doc);
    let node_count = key.node_count();
    debug!(
        fields = marked.len(),
        nodes = node_count,
        "concealing document"
    );

    let mut variants = vec![doc.clone(); node_count];
    for (path, value) in &marked {
        let shares = sharer.conceal_value(key, value)?;
        if shares.len() != node_count {
            return Err(VaultError::ShareCountMismatch {
                expected: node_count,
                actual: shares.len(),
            });
        }
        for (variant, share) in variants.iter_mut().zip(shares) {
            splice_share(variant, path, share)?;
        }
    }

    Ok(variants)
}

/// Reveals a logical document from per-node share-bearing variants.
///
/// `%share` fragments are grouped by their structural path across the given
/// documents, recombined and decrypted, and the plaintext spliced into the
/// first document's skeleton (non-shared fields are expected identical
/// across inputs, so first-seen wins).
///
/// # Errors
///
/// Fails on an empty input, on a share group below the key's threshold, or
/// on undecodable shares.
pub fn reveal(
    sharer: &dyn SecretSharer,
    key: &ConcealKey,
    docs: &[Value],
) -> Result<Value, VaultError> {
    let first = docs.first().ok_or(VaultError::EmptyResponseSet)?;

    let mut groups: Vec<(JsonPath, Vec<String>)> = Vec::new();
    for doc in docs {
        for (path, share) in find_shares(doc)? {
            match groups.iter_mut().find(|(existing, _)| *existing == path) {
                Some((_, shares)) => shares.push(share),
                None => groups.push((path, vec![share])),
            }
        }
    }
    debug!(fields = groups.len(), docs = docs.len(), "revealing document");

    let mut out = first.clone();
    for (path, shares) in groups {
        let plain = sharer.reveal_value(key, &shares)?;
        splice_plain(&mut out, &path, plain)?;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{KeyConfig, KeyOperation};
    use crate::sss::ShamirSharer;
    use serde_json::json;

    fn cluster_key(nodes: usize) -> ConcealKey {
        KeyConfig::DeriveClusterKey {
            operation: KeyOperation::Store,
            threshold: None,
        }
        .resolve(nodes)
        .unwrap()
    }

    #[test]
    fn test_conceal_three_node_scenario() {
        let key = cluster_key(3);
        let doc = json!({
            "patientId": { "%allot": "P12345" },
            "hospital": "General Hospital"
        });

        let variants = conceal(&ShamirSharer, &key, &doc).unwrap();
        assert_eq!(variants.len(), 3);

        let mut seen = Vec::new();
        for variant in &variants {
            assert_eq!(variant["hospital"], json!("General Hospital"));
            let share = variant["patientId"]["%share"]
                .as_str()
                .expect("share key present")
                .to_string();
            assert!(!seen.contains(&share));
            seen.push(share);
        }
    }

    #[test]
    fn test_reveal_inverts_conceal() {
        let key = cluster_key(3);
        let doc = json!({
            "patientId": { "%allot": "P12345" },
            "hospital": "General Hospital"
        });

        let variants = conceal(&ShamirSharer, &key, &doc).unwrap();
        let revealed = reveal(&ShamirSharer, &key, &variants).unwrap();

        assert_eq!(
            revealed,
            json!({ "patientId": "P12345", "hospital": "General Hospital" })
        );
    }

    #[test]
    fn test_round_trip_nested_and_numeric_fields() {
        let key = cluster_key(2);
        let doc = json!({
            "_id": "doc1",
            "vitals": [
                { "pulse": { "%allot": 72 }, "taken": "2026-01-01" },
                { "pulse": { "%allot": 91 }, "taken": "2026-01-02" }
            ],
            "note": { "text": { "%allot": "stable" } }
        });

        let variants = conceal(&ShamirSharer, &key, &doc).unwrap();
        let revealed = reveal(&ShamirSharer, &key, &variants).unwrap();

        assert_eq!(
            revealed,
            json!({
                "_id": "doc1",
                "vitals": [
                    { "pulse": 72, "taken": "2026-01-01" },
                    { "pulse": 91, "taken": "2026-01-02" }
                ],
                "note": { "text": "stable" }
            })
        );
    }

    #[test]
    fn test_big_integer_round_trip_is_exact() {
        let key = cluster_key(3);
        let doc: Value =
            serde_json::from_str(r#"{"balance": {"%allot": 987654321098765432109876543210}}"#)
                .unwrap();

        let variants = conceal(&ShamirSharer, &key, &doc).unwrap();
        let revealed = reveal(&ShamirSharer, &key, &variants).unwrap();

        assert_eq!(
            revealed["balance"].to_string(),
            "987654321098765432109876543210"
        );
    }

    #[test]
    fn test_document_without_markers_passes_through() {
        let key = cluster_key(3);
        let doc = json!({ "a": 1, "b": "plain" });

        let variants = conceal(&ShamirSharer, &key, &doc).unwrap();
        assert_eq!(variants.len(), 3);
        assert!(variants.iter().all(|v| *v == doc));

        let revealed = reveal(&ShamirSharer, &key, &variants).unwrap();
        assert_eq!(revealed, doc);
    }

    #[test]
    fn test_reveal_rejects_incomplete_group() {
        let key = cluster_key(3);
        let doc = json!({ "secret": { "%allot": "x" } });

        let variants = conceal(&ShamirSharer, &key, &doc).unwrap();
        let err = reveal(&ShamirSharer, &key, &variants[..1]).unwrap_err();
        assert!(matches!(err, VaultError::IncompleteShareGroup { .. }));
    }

    #[test]
    fn test_reveal_rejects_empty_input() {
        let key = cluster_key(3);
        let err = reveal(&ShamirSharer, &key, &[]).unwrap_err();
        assert!(matches!(err, VaultError::EmptyResponseSet));
    }
}
