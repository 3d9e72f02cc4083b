/// The reserved object key marking a value as confidential in an outbound
/// logical body. Matched case-insensitively.
pub const ALLOT_MARKER: &str = "%allot";

/// The reserved object key holding one node's share of a concealed value in a
/// node-specific body or response. Matched case-insensitively.
pub const SHARE_MARKER: &str = "%share";

/// The field used to correlate per-node fragments of the same logical
/// document when reconciling list responses.
pub const DOCUMENT_ID_FIELD: &str = "_id";

/// Environment variable prefix recognized by [`crate::config::VaultConfig`].
pub const ENV_PREFIX: &str = "SHARDVAULT";
