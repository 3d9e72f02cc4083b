use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use gf256::gf256;
use rand::Rng;
use serde_json::Value;

use crate::error::VaultError;
use crate::key::{ConcealKey, KeyOperation};

/// Byte length of the AES-GCM nonce prepended to every ciphertext.
const NONCE_LEN: usize = 12;

/// Represents a polynomial over the Galois field GF(2^8).
///
/// Each polynomial is represented by its coefficients, stored in a vector.
/// Coefficients are elements of the GF(2^8) field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polynomial {
    /// The coefficients of the polynomial, where each coefficient is an
    /// element of GF(2^8).
    pub coefficients: Vec<gf256>,
}

impl Polynomial {
    /// Constructs a new polynomial of a given degree with random
    /// coefficients, where the constant term is the provided secret.
    pub fn new(degree: usize, secret: gf256) -> Self {
        let mut rng = rand::thread_rng();
        let mut coefficients = vec![secret; degree + 1];

        for coeff in coefficients.iter_mut().skip(1) {
            *coeff = gf256::new(rng.gen());
        }

        Polynomial { coefficients }
    }

    /// Evaluates the polynomial at a given point.
    pub fn evaluate(&self, x: gf256) -> gf256 {
        let mut result = gf256::new(0);
        let mut term = gf256::new(1);

        for &coeff in &self.coefficients {
            result += coeff * term;
            term *= x;
        }

        result
    }
}

/// One node's share of a split secret: the evaluation point paired with the
/// per-byte polynomial evaluations.
pub type Share = (u8, Vec<u8>);

/// Splits a secret into `shares` shares, any `threshold` of which
/// reconstruct it.
///
/// Shares are returned in evaluation-point order (x = 1..=shares), so share
/// index `i` belongs to node `i`. A threshold of 1 degenerates to replication
/// and is only meaningful for a single-node cluster.
///
/// # Errors
///
/// Returns an error if `threshold` is zero or exceeds `shares`, or if more
/// shares are requested than GF(2^8) has non-zero evaluation points.
pub fn split_secret(
    secret: &[u8],
    threshold: usize,
    shares: usize,
) -> Result<Vec<Share>, VaultError> {
    if threshold == 0 || threshold > shares {
        return Err(VaultError::InvalidThreshold {
            threshold,
            nodes: shares,
        });
    }
    if shares > u8::MAX as usize {
        return Err(VaultError::InvalidShare(format!(
            "cannot split into {shares} shares, the field supports at most {}",
            u8::MAX
        )));
    }

    let mut out: Vec<Share> = (1..=shares as u8)
        .map(|x| (x, Vec::with_capacity(secret.len())))
        .collect();

    for &byte in secret {
        let poly = Polynomial::new(threshold - 1, gf256::new(byte));

        for (x, bytes) in out.iter_mut() {
            let y = poly.evaluate(gf256::new(*x));
            bytes.push(y.into());
        }
    }

    Ok(out)
}

/// Combines shares to reconstruct a secret via Lagrange interpolation.
///
/// # Errors
///
/// Returns an error if no shares are given, the shares disagree on length,
/// or two shares carry the same evaluation point. Repeated evaluation
/// points would divide by zero inside the interpolation, so they are
/// rejected up front; response data is remote-controlled and must never
/// panic this library.
pub fn combine_shares(shares: &[Share]) -> Result<Vec<u8>, VaultError> {
    let secret_length = shares
        .first()
        .map(|(_, bytes)| bytes.len())
        .ok_or(VaultError::IncompleteShareGroup { needed: 1, got: 0 })?;

    if shares.iter().any(|(_, bytes)| bytes.len() != secret_length) {
        return Err(VaultError::InvalidShare(
            "shares disagree on secret length".to_string(),
        ));
    }

    let mut seen = [false; 256];
    for (x, _) in shares {
        if seen[*x as usize] {
            return Err(VaultError::InvalidShare(format!(
                "duplicate share index {x}"
            )));
        }
        seen[*x as usize] = true;
    }

    let mut secret = vec![0; secret_length];
    let mut points = Vec::with_capacity(shares.len());

    for i in 0..secret_length {
        points.clear();
        for (x, bytes) in shares {
            points.push((gf256::new(*x), gf256::new(bytes[i])));
        }
        secret[i] = interpolate(&points, gf256::new(0)).into();
    }

    Ok(secret)
}

/// Performs Lagrange interpolation on a set of points to find the value of
/// the polynomial at a specific point.
fn interpolate(points: &[(gf256, gf256)], x: gf256) -> gf256 {
    let mut value = gf256::new(0);

    for (i, &(a_x, a_y)) in points.iter().enumerate() {
        let mut weight = gf256::new(1);

        for (j, &(b_x, _)) in points.iter().enumerate() {
            if i != j {
                let top = x + b_x; // XOR in GF(2^8) is equivalent to addition
                let bottom = a_x + b_x;
                weight *= top / bottom;
            }
        }

        value += weight * a_y;
    }

    value
}

/// The boundary to the secret-sharing primitive: encrypt-then-split one
/// logical value into per-node shares, and the inverse.
///
/// The orchestration pipeline treats the implementation as opaque and
/// correctness-critical. [`ShamirSharer`] is the reference implementation;
/// callers integrating a different scheme implement this trait.
pub trait SecretSharer: Send + Sync {
    /// Encrypts one logical value under `key` and splits the ciphertext into
    /// exactly `key.node_count()` encoded shares, in node order.
    fn conceal_value(&self, key: &ConcealKey, value: &Value) -> Result<Vec<String>, VaultError>;

    /// Recombines encoded shares of one logical value and decrypts it back
    /// to its original JSON form.
    ///
    /// Fails if fewer than `key.threshold()` shares are provided.
    fn reveal_value(&self, key: &ConcealKey, shares: &[String]) -> Result<Value, VaultError>;
}

/// Reference sharer: AES-256-GCM encryption followed by GF(2^8) Shamir
/// splitting of the ciphertext.
///
/// Plaintext is a type-tagged byte encoding, so concealed values keep their
/// JSON type across the round trip; concealed integers travel as decimal
/// strings and survive at arbitrary precision.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShamirSharer;

impl SecretSharer for ShamirSharer {
    fn conceal_value(&self, key: &ConcealKey, value: &Value) -> Result<Vec<String>, VaultError> {
        if key.operation() != KeyOperation::Store {
            return Err(VaultError::Crypto(format!(
                "operation {:?} is not supported by the reference sharer",
                key.operation()
            )));
        }

        let plaintext = encode_plain(value)?;
        let ciphertext = aes_encrypt(key.material(), &plaintext)?;
        let shares = split_secret(&ciphertext, key.threshold(), key.node_count())?;

        Ok(shares.iter().map(encode_share).collect())
    }

    fn reveal_value(&self, key: &ConcealKey, shares: &[String]) -> Result<Value, VaultError> {
        if shares.len() < key.threshold() {
            return Err(VaultError::IncompleteShareGroup {
                needed: key.threshold(),
                got: shares.len(),
            });
        }

        let parsed: Vec<Share> = shares
            .iter()
            .map(|share| decode_share(share))
            .collect::<Result<_, _>>()?;
        let ciphertext = combine_shares(&parsed)?;
        let plaintext = aes_decrypt(key.material(), &ciphertext)?;
        decode_plain(&plaintext)
    }
}

fn encode_share(share: &Share) -> String {
    let (x, bytes) = share;
    let mut buf = Vec::with_capacity(bytes.len() + 1);
    buf.push(*x);
    buf.extend_from_slice(bytes);
    hex::encode(buf)
}

fn decode_share(share: &str) -> Result<Share, VaultError> {
    let bytes = hex::decode(share).map_err(|err| VaultError::InvalidShare(err.to_string()))?;
    match bytes.split_first() {
        Some((&x, rest)) if !rest.is_empty() => Ok((x, rest.to_vec())),
        _ => Err(VaultError::InvalidShare("share is too short".to_string())),
    }
}

// Plaintext tag bytes. Integers use their decimal string form so values
// beyond the i64/u64 range round-trip exactly.
const TAG_STRING: u8 = b's';
const TAG_INTEGER: u8 = b'i';
const TAG_FLOAT: u8 = b'f';
const TAG_BOOL: u8 = b'b';
const TAG_JSON: u8 = b'j';

fn encode_plain(value: &Value) -> Result<Vec<u8>, VaultError> {
    let mut buf = Vec::new();
    match value {
        Value::String(s) => {
            buf.push(TAG_STRING);
            buf.extend_from_slice(s.as_bytes());
        }
        Value::Number(n) => {
            let rendered = n.to_string();
            if rendered.bytes().any(|b| b == b'.' || b == b'e' || b == b'E') {
                buf.push(TAG_FLOAT);
            } else {
                buf.push(TAG_INTEGER);
            }
            buf.extend_from_slice(rendered.as_bytes());
        }
        Value::Bool(b) => {
            buf.push(TAG_BOOL);
            buf.push(u8::from(*b));
        }
        other => {
            buf.push(TAG_JSON);
            buf.extend_from_slice(&serde_json::to_vec(other)?);
        }
    }
    Ok(buf)
}

fn decode_plain(bytes: &[u8]) -> Result<Value, VaultError> {
    let (&tag, payload) = bytes
        .split_first()
        .ok_or_else(|| VaultError::Crypto("empty plaintext".to_string()))?;

    match tag {
        TAG_STRING => {
            let s = String::from_utf8(payload.to_vec())
                .map_err(|err| VaultError::Crypto(err.to_string()))?;
            Ok(Value::String(s))
        }
        TAG_INTEGER | TAG_FLOAT => {
            let rendered = String::from_utf8(payload.to_vec())
                .map_err(|err| VaultError::Crypto(err.to_string()))?;
            Ok(serde_json::from_str(&rendered)?)
        }
        TAG_BOOL => match payload.first() {
            Some(0) => Ok(Value::Bool(false)),
            Some(1) => Ok(Value::Bool(true)),
            _ => Err(VaultError::Crypto("malformed boolean plaintext".to_string())),
        },
        TAG_JSON => Ok(serde_json::from_slice(payload)?),
        other => Err(VaultError::Crypto(format!(
            "unknown plaintext tag {other:#04x}"
        ))),
    }
}

fn aes_encrypt(material: &[u8; 32], plaintext: &[u8]) -> Result<Vec<u8>, VaultError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(material));
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill(&mut nonce[..]);

    let sealed = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|err| VaultError::Crypto(err.to_string()))?;

    let mut out = nonce.to_vec();
    out.extend(sealed);
    Ok(out)
}

fn aes_decrypt(material: &[u8; 32], ciphertext: &[u8]) -> Result<Vec<u8>, VaultError> {
    if ciphertext.len() <= NONCE_LEN {
        return Err(VaultError::Crypto("ciphertext is too short".to_string()));
    }
    let (nonce, sealed) = ciphertext.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(material));
    cipher
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|err| VaultError::Crypto(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyConfig;
    use rand::seq::IteratorRandom;
    use serde_json::json;

    fn cluster_key(nodes: usize, threshold: Option<usize>) -> ConcealKey {
        KeyConfig::DeriveClusterKey {
            operation: KeyOperation::Store,
            threshold,
        }
        .resolve(nodes)
        .unwrap()
    }

    #[test]
    fn test_split_and_combine_secret() {
        let secret = "test secret";
        let shares = split_secret(secret.as_bytes(), 3, 5).unwrap();
        let recovered = combine_shares(&shares).unwrap();

        assert_eq!(secret.as_bytes(), recovered.as_slice());
    }

    #[test]
    fn test_invalid_threshold_and_share_count() {
        let secret = "invalid params";
        assert!(split_secret(secret.as_bytes(), 0, 5).is_err());
        assert!(split_secret(secret.as_bytes(), 6, 5).is_err());
    }

    #[test]
    fn test_split_rejects_more_than_255_shares() {
        let err = split_secret(b"too wide", 2, 256).unwrap_err();
        assert!(matches!(err, VaultError::InvalidShare(_)));
    }

    #[test]
    fn test_combine_rejects_repeated_share_index() {
        let shares = split_secret(b"no repeats", 2, 3).unwrap();
        let doubled = vec![shares[0].clone(), shares[0].clone(), shares[1].clone()];

        let err = combine_shares(&doubled).unwrap_err();
        assert!(matches!(err, VaultError::InvalidShare(_)));
    }

    #[test]
    fn test_share_uniqueness() {
        let shares = split_secret(b"unique shares", 3, 5).unwrap();
        let all_unique = shares
            .iter()
            .all(|(_, v)| shares.iter().filter(|(_, x)| x == v).count() == 1);

        assert!(all_unique);
    }

    #[test]
    fn test_share_subset_combination() {
        let secret = b"subset test";
        let threshold = 3;
        let shares = split_secret(secret, threshold, 5).unwrap();

        let mut rng = rand::thread_rng();
        let subset: Vec<Share> = shares.iter().cloned().choose_multiple(&mut rng, threshold);

        let recovered = combine_shares(&subset).unwrap();
        assert_eq!(secret, recovered.as_slice());
    }

    #[test]
    fn test_below_threshold_yields_garbage() {
        let secret = b"Remember what the dormouse said.";
        let shares = split_secret(secret, 12, 30).unwrap();

        let mut rng = rand::thread_rng();
        let subset: Vec<Share> = shares.iter().cloned().choose_multiple(&mut rng, 11);

        let recovered = combine_shares(&subset).unwrap();
        assert_ne!(recovered.as_slice(), secret);
    }

    #[test]
    fn test_sharer_round_trip_string() {
        let key = cluster_key(3, None);
        let shares = ShamirSharer.conceal_value(&key, &json!("P12345")).unwrap();
        assert_eq!(shares.len(), 3);

        let revealed = ShamirSharer.reveal_value(&key, &shares).unwrap();
        assert_eq!(revealed, json!("P12345"));
    }

    #[test]
    fn test_sharer_round_trip_big_integer() {
        let key = cluster_key(3, None);
        let big: Value = serde_json::from_str("123456789012345678901234567890123456789").unwrap();

        let shares = ShamirSharer.conceal_value(&key, &big).unwrap();
        let revealed = ShamirSharer.reveal_value(&key, &shares).unwrap();

        assert_eq!(revealed, big);
        assert_eq!(
            revealed.to_string(),
            "123456789012345678901234567890123456789"
        );
    }

    #[test]
    fn test_sharer_round_trip_non_primitives_keep_type() {
        let key = cluster_key(2, None);
        for original in [json!(true), json!([1, 2, 3]), json!({ "a": 1 }), json!(2.5)] {
            let shares = ShamirSharer.conceal_value(&key, &original).unwrap();
            let revealed = ShamirSharer.reveal_value(&key, &shares).unwrap();
            assert_eq!(revealed, original);
        }
    }

    #[test]
    fn test_sharer_enforces_threshold() {
        let key = cluster_key(3, None);
        let shares = ShamirSharer.conceal_value(&key, &json!("secret")).unwrap();

        let err = ShamirSharer.reveal_value(&key, &shares[..2]).unwrap_err();
        assert!(matches!(
            err,
            VaultError::IncompleteShareGroup { needed: 3, got: 2 }
        ));
    }

    #[test]
    fn test_sharer_honors_cluster_threshold_subset() {
        let key = cluster_key(5, Some(3));
        let shares = ShamirSharer.conceal_value(&key, &json!("quorum")).unwrap();

        let revealed = ShamirSharer.reveal_value(&key, &shares[1..4]).unwrap();
        assert_eq!(revealed, json!("quorum"));
    }

    #[test]
    fn test_wrong_key_fails_to_decrypt() {
        let key = cluster_key(3, None);
        let other = cluster_key(3, None);
        let shares = ShamirSharer.conceal_value(&key, &json!("secret")).unwrap();

        assert!(ShamirSharer.reveal_value(&other, &shares).is_err());
    }
}
