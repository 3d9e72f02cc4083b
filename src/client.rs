use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;
use tracing::debug;

use crate::auth::{Command, TokenMinter};
use crate::error::VaultError;
use crate::execute::execute_on_cluster;
use crate::key::{ConcealKey, KeyConfig};
use crate::node::{NodeClient, NodeId, NodeMap};
use crate::prepare::prepare_request;
use crate::reconcile::{
    canonical_response, unify_list_response, unify_object_response, SelectionStrategy,
};
use crate::sss::{SecretSharer, ShamirSharer};

/// Construction parameters shared by both facades.
pub struct ClientOptions {
    /// Pre-built per-node clients, in cluster order.
    pub clients: Vec<Arc<dyn NodeClient>>,
    /// The authorization-token subsystem minting node-scoped bearer tokens.
    pub minter: Arc<dyn TokenMinter>,
    /// Optional confidentiality configuration; absent means fully plaintext
    /// operation.
    pub key: Option<KeyConfig>,
    /// Canonical-selection policy for plaintext reads.
    pub strategy: SelectionStrategy,
    /// The secret-sharing primitive; defaults to [`ShamirSharer`].
    pub sharer: Option<Arc<dyn SecretSharer>>,
}

impl ClientOptions {
    pub fn new(clients: Vec<Arc<dyn NodeClient>>, minter: Arc<dyn TokenMinter>) -> Self {
        ClientOptions {
            clients,
            minter,
            key: None,
            strategy: SelectionStrategy::default(),
            sharer: None,
        }
    }

    pub fn with_key(mut self, key: KeyConfig) -> Self {
        self.key = Some(key);
        self
    }

    pub fn with_strategy(mut self, strategy: SelectionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_sharer(mut self, sharer: Arc<dyn SecretSharer>) -> Self {
        self.sharer = Some(sharer);
        self
    }
}

/// The state both facades share: the fixed node set, the resolved key, and
/// the collaborator boundaries. Immutable after construction; correctness
/// under concurrent logical operations rests on each node call being
/// independent.
struct ClusterCore {
    clients: Vec<Arc<dyn NodeClient>>,
    node_ids: Vec<NodeId>,
    minter: Arc<dyn TokenMinter>,
    key: Option<ConcealKey>,
    strategy: SelectionStrategy,
    sharer: Arc<dyn SecretSharer>,
}

impl ClusterCore {
    /// Discovers every node's identity, fixes the cluster ordering, and
    /// resolves the key configuration against the cluster size.
    async fn connect(options: ClientOptions) -> Result<Self, VaultError> {
        if options.clients.is_empty() {
            return Err(VaultError::EmptyCluster);
        }
        let mut configured = HashSet::new();
        for client in &options.clients {
            if !configured.insert(client.id().clone()) {
                return Err(VaultError::DuplicateNode(client.id().clone()));
            }
        }

        let infos = execute_on_cluster(&options.clients, |client, _| async move {
            client.about_node().await
        })
        .await?;

        // The cluster ordering is fixed from what the nodes report about
        // themselves, not from the locally configured identities.
        let mut node_ids = Vec::with_capacity(infos.len());
        let mut discovered = HashSet::new();
        for (_, info) in infos {
            if !discovered.insert(info.id.clone()) {
                return Err(VaultError::DuplicateNode(info.id));
            }
            debug!(node = %info.id, public_key = %info.public_key, "discovered cluster node");
            node_ids.push(info.id);
        }
        let key = options
            .key
            .map(|config| config.resolve(node_ids.len()))
            .transpose()?;
        debug!(
            nodes = node_ids.len(),
            keyed = key.is_some(),
            "cluster client connected"
        );

        Ok(ClusterCore {
            clients: options.clients,
            node_ids,
            minter: options.minter,
            key,
            strategy: options.strategy,
            sharer: options.sharer.unwrap_or_else(|| Arc::new(ShamirSharer)),
        })
    }

    /// Mints one node-scoped token per cluster member, in cluster order.
    async fn mint_tokens(&self, command: Command) -> Result<Vec<String>, VaultError> {
        let mints = self.node_ids.iter().map(|id| self.minter.mint(id, command));
        let tokens = join_all(mints).await;
        Ok(tokens.into_iter().collect::<Result<_, _>>()?)
    }

    /// Prepares per-node bodies for `body`, in cluster order.
    fn prepare_bodies(&self, body: &Value) -> Result<Vec<Value>, VaultError> {
        let prepared = prepare_request(
            self.sharer.as_ref(),
            self.key.as_ref(),
            &self.node_ids,
            body,
        )?;
        Ok(prepared.into_values().collect())
    }
}

macro_rules! raw_body_op {
    ($(#[$doc:meta])* $name:ident, $command:expr) => {
        $(#[$doc])*
        pub async fn $name(&self, body: Value) -> Result<NodeMap<Value>, VaultError> {
            let tokens = self.core.mint_tokens($command).await?;
            let bodies = self.core.prepare_bodies(&body)?;
            execute_on_cluster(&self.core.clients, |client, i| {
                let token = tokens[i].clone();
                let body = bodies[i].clone();
                async move { client.$name(&token, body).await }
            })
            .await
        }
    };
}

/// The builder-role facade: owns collections and queries and writes data
/// into builder-owned collections.
///
/// Every method follows the same template: mint node-scoped tokens, prepare
/// per-node bodies (splitting confidential fields when a key is configured),
/// fan out to the cluster, then reconcile or return the raw per-node map
/// where per-node status differs meaningfully.
pub struct BuilderClient {
    core: ClusterCore,
}

impl BuilderClient {
    /// Async factory: discovers node identities and resolves the key
    /// configuration before any operation runs.
    pub async fn connect(options: ClientOptions) -> Result<Self, VaultError> {
        Ok(BuilderClient {
            core: ClusterCore::connect(options).await?,
        })
    }

    /// The cluster's node identities, in configured order.
    pub fn node_ids(&self) -> &[NodeId] {
        &self.core.node_ids
    }

    raw_body_op!(
        /// Registers this builder with every node. Returns the raw per-node
        /// map: nodes legitimately disagree here (already-registered vs
        /// newly-registered).
        register,
        Command::Register
    );

    raw_body_op!(
        /// Creates a collection on every node.
        create_collection,
        Command::CreateCollection
    );

    raw_body_op!(
        /// Writes documents into a builder-owned collection, splitting
        /// confidential fields into per-node shares when a key is
        /// configured.
        create_data,
        Command::CreateData
    );

    raw_body_op!(
        /// Updates documents on every node.
        update_data,
        Command::UpdateData
    );

    raw_body_op!(
        /// Deletes documents on every node.
        delete_data,
        Command::DeleteData
    );

    /// Drops a collection on every node.
    pub async fn delete_collection(&self, collection: &str) -> Result<NodeMap<Value>, VaultError> {
        let tokens = self.core.mint_tokens(Command::DeleteCollection).await?;
        let collection = collection.to_string();
        execute_on_cluster(&self.core.clients, |client, i| {
            let token = tokens[i].clone();
            let collection = collection.clone();
            async move { client.delete_collection(&token, &collection).await }
        })
        .await
    }

    /// Finds documents and reconciles them into one logical list: grouped
    /// share recombination when a key is configured, canonical selection
    /// otherwise.
    pub async fn find_data(&self, filter: Value) -> Result<Vec<Value>, VaultError> {
        let tokens = self.core.mint_tokens(Command::FindData).await?;
        let bodies = self.core.prepare_bodies(&filter)?;
        let responses = execute_on_cluster(&self.core.clients, |client, i| {
            let token = tokens[i].clone();
            let body = bodies[i].clone();
            async move { client.find_data(&token, body).await }
        })
        .await?;

        match &self.core.key {
            Some(key) => unify_list_response(self.core.sharer.as_ref(), key, responses),
            None => Ok(canonical_response(responses, self.core.strategy)?.data),
        }
    }

    /// Runs a stored query and selects one canonical result set. Query
    /// outputs are node-local aggregates, so share recombination does not
    /// apply here.
    pub async fn run_query(&self, body: Value) -> Result<Vec<Value>, VaultError> {
        let tokens = self.core.mint_tokens(Command::RunQuery).await?;
        let bodies = self.core.prepare_bodies(&body)?;
        let responses = execute_on_cluster(&self.core.clients, |client, i| {
            let token = tokens[i].clone();
            let body = bodies[i].clone();
            async move { client.run_query(&token, body).await }
        })
        .await?;

        Ok(canonical_response(responses, self.core.strategy)?.data)
    }
}

/// The user-role facade: owns data, reads it back, and manages access
/// grants on individual documents.
pub struct UserClient {
    core: ClusterCore,
}

impl UserClient {
    /// Async factory: discovers node identities and resolves the key
    /// configuration before any operation runs.
    pub async fn connect(options: ClientOptions) -> Result<Self, VaultError> {
        Ok(UserClient {
            core: ClusterCore::connect(options).await?,
        })
    }

    /// The cluster's node identities, in configured order.
    pub fn node_ids(&self) -> &[NodeId] {
        &self.core.node_ids
    }

    raw_body_op!(
        /// Registers this user with every node. Returns the raw per-node
        /// map, since nodes may report different registration statuses.
        register,
        Command::Register
    );

    raw_body_op!(
        /// Writes user-owned documents, splitting confidential fields into
        /// per-node shares when a key is configured.
        create_data,
        Command::CreateData
    );

    raw_body_op!(
        /// Deletes user-owned documents on every node.
        delete_data,
        Command::DeleteData
    );

    raw_body_op!(
        /// Grants another party access to a user-owned document.
        grant_access,
        Command::GrantAccess
    );

    raw_body_op!(
        /// Revokes a previously granted access.
        revoke_access,
        Command::RevokeAccess
    );

    /// Reads one document and reconciles it into its logical form:
    /// share recombination when a key is configured, canonical selection
    /// otherwise.
    pub async fn read_data(&self, collection: &str, document: &str) -> Result<Value, VaultError> {
        let tokens = self.core.mint_tokens(Command::ReadData).await?;
        let collection = collection.to_string();
        let document = document.to_string();
        let responses = execute_on_cluster(&self.core.clients, |client, i| {
            let token = tokens[i].clone();
            let collection = collection.clone();
            let document = document.clone();
            async move { client.read_data(&token, &collection, &document).await }
        })
        .await?;

        match &self.core.key {
            Some(key) => unify_object_response(self.core.sharer.as_ref(), key, responses),
            None => Ok(canonical_response(responses, self.core.strategy)?.data),
        }
    }

    /// Finds user-owned documents and reconciles them into one logical
    /// list.
    pub async fn find_data(&self, filter: Value) -> Result<Vec<Value>, VaultError> {
        let tokens = self.core.mint_tokens(Command::FindData).await?;
        let bodies = self.core.prepare_bodies(&filter)?;
        let responses = execute_on_cluster(&self.core.clients, |client, i| {
            let token = tokens[i].clone();
            let body = bodies[i].clone();
            async move { client.find_data(&token, body).await }
        })
        .await?;

        match &self.core.key {
            Some(key) => unify_list_response(self.core.sharer.as_ref(), key, responses),
            None => Ok(canonical_response(responses, self.core.strategy)?.data),
        }
    }

    /// Reads this user's profile, canonically selected: profiles are
    /// plaintext and assumed identical across nodes.
    pub async fn read_profile(&self) -> Result<Value, VaultError> {
        let tokens = self.core.mint_tokens(Command::ReadProfile).await?;
        let responses = execute_on_cluster(&self.core.clients, |client, i| {
            let token = tokens[i].clone();
            async move { client.read_profile(&token).await }
        })
        .await?;

        Ok(canonical_response(responses, self.core.strategy)?.data)
    }
}
