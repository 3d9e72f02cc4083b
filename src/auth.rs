use async_trait::async_trait;

use crate::node::NodeId;

/// The capability a facade mints a token for. One variant per logical
/// operation exposed by the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Register,
    CreateCollection,
    DeleteCollection,
    CreateData,
    FindData,
    UpdateData,
    DeleteData,
    ReadData,
    RunQuery,
    GrantAccess,
    RevokeAccess,
    ReadProfile,
}

impl Command {
    /// The capability name carried inside the minted token.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Register => "register",
            Command::CreateCollection => "create-collection",
            Command::DeleteCollection => "delete-collection",
            Command::CreateData => "create-data",
            Command::FindData => "find-data",
            Command::UpdateData => "update-data",
            Command::DeleteData => "delete-data",
            Command::ReadData => "read-data",
            Command::RunQuery => "run-query",
            Command::GrantAccess => "grant-access",
            Command::RevokeAccess => "revoke-access",
            Command::ReadProfile => "read-profile",
        }
    }
}

/// Errors surfaced by the token-minting subsystem.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("token minting failed for audience {audience}: {message}")]
    Mint { audience: NodeId, message: String },

    #[error("signing credential rejected: {0}")]
    Credential(String),
}

/// The boundary to the authorization-token subsystem.
///
/// Given a target audience (a node identity, since tokens are node-scoped)
/// and the capability being exercised, an implementation returns a signed,
/// time-bounded bearer token. Token lifetime, delegation chains, and any
/// in-flight token caching are the implementation's concern.
#[async_trait]
pub trait TokenMinter: Send + Sync {
    async fn mint(&self, audience: &NodeId, command: Command) -> Result<String, AuthError>;
}
