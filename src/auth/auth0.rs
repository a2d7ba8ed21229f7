//! Trust registry client for an Auth0-style identity provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ClientRecord, Secret, TrustRegistry};

/// Body of the client credentials grant.
#[derive(Serialize, Debug)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    audience: &'a str,
    grant_type: &'a str,
}

/// Response of the client credentials grant.
#[derive(Deserialize, Debug)]
struct TokenResponse {
    #[serde(alias = "accessToken")]
    access_token: String,
}

/// Looks up registered clients with the management API of the identity provider.
#[derive(Debug, Clone)]
pub struct Auth0Registry {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: Secret,
    audience: String,
}

impl Auth0Registry {
    /// Construct for the identity provider at `base_url`, authenticating with
    /// this gateway's own client credentials.
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        client_id: &str,
        client_secret: Secret,
        audience: &str,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            client_secret,
            audience: audience.to_string(),
        }
    }

    fn client_url(&self, client_id: &str) -> Result<reqwest::Url, anyhow::Error> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| anyhow::anyhow!("invalid identity provider URL {}: {}", &self.base_url, e))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("identity provider URL {} cannot be a base", &self.base_url))?
            .pop_if_empty()
            .extend(&["api", "v2", "clients", client_id]);
        Ok(url)
    }
}

#[async_trait]
impl TrustRegistry for Auth0Registry {
    async fn fetch_credential(&self) -> Result<Option<String>, anyhow::Error> {
        let response = self
            .client
            .post(format!("{}/oauth/token", &self.base_url))
            .json(&TokenRequest {
                client_id: &self.client_id,
                client_secret: self.client_secret.expose(),
                audience: &self.audience,
                grant_type: "client_credentials",
            })
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("problem requesting access token: {}", e))?;
        if !response.status().is_success() {
            tracing::warn!("access token request failed with {}", response.status());
            return Ok(None);
        }
        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("problem decoding access token response: {}", e))?;
        Ok(Some(body.access_token))
    }

    async fn fetch_client(
        &self,
        credential: &str,
        client_id: &str,
    ) -> Result<Option<ClientRecord>, anyhow::Error> {
        let response = self
            .client
            .get(self.client_url(client_id)?)
            .bearer_auth(credential)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("problem requesting client {}: {}", client_id, e))?;
        if !response.status().is_success() {
            tracing::debug!(
                "lookup of client {} failed with {}",
                client_id,
                response.status()
            );
            return Ok(None);
        }
        let record = response
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("problem decoding client {}: {}", client_id, e))?;
        Ok(Some(record))
    }
}
