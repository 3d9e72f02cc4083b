//! # shardvault: cluster secret-sharing orchestration
//!
//! This library is a client-side SDK for storing confidential JSON data
//! across a cluster of independent storage nodes. No single node ever holds
//! a complete secret: confidential fields are encrypted, split into shares
//! with Shamir's Secret Sharing (SSS), and fanned out so each node stores a
//! different share. Reading the data back collects the shares and
//! recombines them into the original plaintext.
//!
//! ## Shamir's Secret Sharing (SSS)
//!
//! Shamir's Secret Sharing is a cryptographic algorithm created by Adi
//! Shamir. A secret is divided into parts, giving each participant its own
//! unique part, with the property that a certain number of these parts (the
//! threshold) are needed to reconstruct the secret.
//!
//! The idea is based on polynomial interpolation in finite fields. Given a
//! secret `S`, the algorithm chooses a random polynomial of degree `t-1`
//! (where `t` is the threshold):
//!
//! ```ignore
//! f(x) = a0 + a1*x + a2*x^2 + ... + a(t-1)*x^(t-1)
//! ```
//!
//! where `a0 = S` and `a1, ..., a(t-1)` are randomly chosen coefficients.
//! Each share corresponds to a point `(x, f(x))` on this polynomial. With at
//! least `t` points, the polynomial and hence the secret can be
//! reconstructed using Lagrange interpolation. This library works byte-wise
//! over GF(2^8), so secrets of any length split into equal-length shares.
//!
//! ## The pipeline
//!
//! Writers mark confidential fields with a `%allot` wrapper object; the
//! pipeline encrypts each marked value, splits the ciphertext, and produces
//! one document variant per node with a `%share` wrapper in the marked
//! field's place. Readers run the pipeline in reverse: per-node responses
//! are correlated by document identity, the shares are collected and
//! recombined, and one logical document comes back out.
//!
//! ### Example: concealing and revealing a document
//!
//! ```rust
//! use serde_json::json;
//! use shardvault::key::{KeyConfig, KeyOperation};
//! use shardvault::sss::ShamirSharer;
//! use shardvault::transform::{conceal, reveal};
//!
//! let key = KeyConfig::DeriveClusterKey {
//!     operation: KeyOperation::Store,
//!     threshold: None,
//! }
//! .resolve(3)
//! .unwrap();
//!
//! let doc = json!({ "_id": "doc1", "ssn": { "%allot": "123-45-6789" } });
//!
//! // One variant per node, each carrying a different share.
//! let variants = conceal(&ShamirSharer, &key, &doc).unwrap();
//! assert_eq!(variants.len(), 3);
//! assert!(variants[0]["ssn"]["%share"].is_string());
//!
//! // Collecting the variants restores the plaintext.
//! let restored = reveal(&ShamirSharer, &key, &variants).unwrap();
//! assert_eq!(restored, json!({ "_id": "doc1", "ssn": "123-45-6789" }));
//! ```
//!
//! ## Modules
//!
//! - `client`: the two cluster facades, `BuilderClient` and `UserClient`.
//! - `sss`: Shamir's Secret Sharing and the reference encrypt-then-split
//!   sharer.
//! - `transform`: document-level conceal/reveal over marked fields.
//! - `node`: the per-node client trait and response shapes.
//! - `execute`: concurrent all-settle fan-out across the cluster.
//! - `reconcile`: turning N per-node responses into one logical response.
//!
//! [More detailed documentation and examples are provided in each module.]

/// The `auth` module defines the authorization boundary: the `TokenMinter`
/// trait minting node-scoped bearer tokens, and the capability vocabulary
/// those tokens are scoped to.
pub mod auth;

/// The `client` module provides the two high-level cluster facades. A
/// `BuilderClient` owns collections and queries; a `UserClient` owns data
/// and access grants. Both run every logical operation against all nodes
/// and reconcile the responses.
pub mod client;

/// The `config` module loads and persists client configuration (node list
/// and key-derivation parameters) from TOML files with environment
/// overrides.
pub mod config;

/// The `constants` module defines the marker strings and other fixed
/// vocabulary used across the library.
pub mod constants;

/// The `error` module defines the library-wide error type and the per-node
/// failure records that cluster errors aggregate.
pub mod error;

/// The `execute` module implements the concurrent fan-out primitive: run
/// one async operation against every node, let all of them settle, and
/// report either a complete per-node result map or the full set of
/// failures.
pub mod execute;

/// The `key` module defines confidentiality keys and their derivation:
/// single-party keys (optionally seed-derived) and cluster-party keys with
/// a recombination threshold.
pub mod key;

/// The `node` module defines one cluster member's typed client interface,
/// its identity, and the response shapes node operations return.
pub mod node;

/// The `prepare` module turns one request body into per-node bodies,
/// splitting marked confidential fields when a key is configured.
pub mod prepare;

/// The `reconcile` module merges per-node responses back into one logical
/// response, by share recombination for concealed data or canonical
/// selection for plaintext.
pub mod reconcile;

/// The `sss` (Shamir's Secret Sharing) module implements byte-wise secret
/// splitting and recombination over GF(2^8), plus the `SecretSharer` trait
/// and the reference encrypt-then-split implementation.
pub mod sss;

/// The `transform` module applies the secret-sharing primitive to whole
/// JSON documents: walking marker fields, producing per-node variants, and
/// reassembling plaintext from collected shares.
pub mod transform;

/// The `value` module provides the JSON traversal utilities: marker
/// recognition, path tracking, and in-place splicing of shares and revealed
/// values.
pub mod value;
