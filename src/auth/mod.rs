//! Authentication of the calling node against the trust registry.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    err::{AuthError, MatchError},
    matching::schema::ClientIdentity,
};

pub mod auth0;
pub mod token;

pub use auth0::Auth0Registry;
pub use token::{parse_authorization, TokenValidator};

/// A secret configuration value that is not shown in `Debug` output.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: &str) -> Self {
        Self(value.to_string())
    }

    /// The secret value.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl std::str::FromStr for Secret {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

/// Client record in the trust registry.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ClientRecord {
    /// Human readable name of the client.
    #[serde(default)]
    pub name: Option<String>,
}

/// Registry of the nodes allowed to query the gateway.
#[async_trait]
pub trait TrustRegistry: Send + Sync {
    /// Obtain an access credential with the gateway's own client credentials.
    ///
    /// Returns `Ok(None)` if the registry rejected the credentials.
    async fn fetch_credential(&self) -> Result<Option<String>, anyhow::Error>;

    /// Fetch the record of `client_id`, `Ok(None)` if it is unknown.
    async fn fetch_client(
        &self,
        credential: &str,
        client_id: &str,
    ) -> Result<Option<ClientRecord>, anyhow::Error>;
}

/// Time-bounded cache of resolved client identities.
#[derive(Debug)]
pub struct ClientCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, ClientIdentity)>>,
}

impl ClientCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The cached identity for `client_id` unless expired.
    pub fn get(&self, client_id: &str) -> Option<ClientIdentity> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(client_id) {
            Some((inserted, identity)) if inserted.elapsed() < self.ttl => Some(identity.clone()),
            Some(_) => {
                entries.remove(client_id);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, identity: ClientIdentity) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(identity.id.clone(), (Instant::now(), identity));
    }
}

/// Resolves the `Authorization` header of a request to the calling node.
pub struct Authenticator {
    validator: TokenValidator,
    registry: Arc<dyn TrustRegistry>,
    cache: Option<ClientCache>,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("validator", &self.validator)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl Authenticator {
    /// Construct; a zero `cache_ttl` disables caching of client lookups.
    pub fn new(
        validator: TokenValidator,
        registry: Arc<dyn TrustRegistry>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            validator,
            registry,
            cache: (!cache_ttl.is_zero()).then(|| ClientCache::new(cache_ttl)),
        }
    }

    /// Authenticate the caller given the raw `Authorization` header value.
    pub async fn authenticate(&self, header: Option<&str>) -> Result<ClientIdentity, MatchError> {
        let token = parse_authorization(header)?;
        let client_id = self.validator.authorized_party(token)?;

        if let Some(identity) = self.cache.as_ref().and_then(|cache| cache.get(&client_id)) {
            tracing::debug!("client {} found in cache", &client_id);
            return Ok(identity);
        }

        let credential = self
            .registry
            .fetch_credential()
            .await?
            .ok_or(AuthError::CredentialCheck)?;
        let record = self
            .registry
            .fetch_client(&credential, &client_id)
            .await?
            .ok_or_else(|| AuthError::InvalidClientId(client_id.clone()))?;

        let identity = ClientIdentity {
            id: client_id,
            display_name: record.name,
        };
        if let Some(cache) = &self.cache {
            cache.insert(identity.clone());
        }
        Ok(identity)
    }
}
