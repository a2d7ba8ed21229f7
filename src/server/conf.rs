//! Configuration of the `server match` sub command.

use std::time::Duration;

use clap::{ArgAction, Parser};

use crate::{
    auth::Secret,
    counts::{CountStoreKind, StoreScope, DEFAULT_DATASET_TYPE, DEFAULT_NAMESPACE},
    liftover::ensembl,
    matching::MatchSettings,
};

/// Command line arguments for `server match` sub command.
///
/// Each option can also be given with the environment variable shown in `--help`.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Run the beacon match gateway", long_about = None)]
pub struct Args {
    /// IP to listen on.
    #[arg(long, env = "VLM_LISTEN_HOST", default_value = "127.0.0.1")]
    pub listen_host: String,
    /// Port to listen on.
    #[arg(long, env = "VLM_LISTEN_PORT", default_value_t = 8081)]
    pub listen_port: u16,

    /// Identifier of this node in handovers and result sets.
    #[arg(long, env = "VLM_NODE_ID", default_value = "seqr")]
    pub node_id: String,
    /// Base URL of the human readable variant record.
    #[arg(long, env = "SEQR_BASE_URL")]
    pub base_url: String,
    /// Static contact address used as handover instead of the variant record.
    #[arg(long, env = "VLM_DEFAULT_CONTACT_EMAIL")]
    pub contact_email: Option<String>,

    /// Domain of the identity provider, e.g., `example.eu.auth0.com`, or its URL.
    #[arg(long, env = "VLM_AUTH0_DOMAIN")]
    pub idp_domain: String,
    /// Client ID of the gateway at the identity provider.
    #[arg(long, env = "VLM_AUTH0_CLIENT_ID")]
    pub idp_client_id: String,
    /// Client secret of the gateway at the identity provider.
    #[arg(long, env = "VLM_AUTH0_CLIENT_SECRET", hide_env_values = true)]
    pub idp_client_secret: Secret,
    /// Audience of the management API, defaults to `https://<domain>/api/v2/`.
    #[arg(long, env = "VLM_AUTH0_AUDIENCE")]
    pub idp_audience: Option<String>,
    /// Expected issuer of bearer tokens, defaults to `https://<domain>/`.
    #[arg(long, env = "VLM_AUTH0_ISSUER")]
    pub idp_issuer: Option<String>,
    /// Seconds to cache client lookups, 0 disables the cache.
    #[arg(long, env = "VLM_CLIENT_CACHE_TTL_SECS", default_value_t = 0)]
    pub client_cache_ttl_secs: u64,

    /// Implementation of the count store.
    #[arg(long, env = "VLM_COUNT_STORE", value_enum, default_value_t = CountStoreKind::Rocksdb)]
    pub count_store: CountStoreKind,
    /// Path to the counts RocksDB or TSV file.
    #[arg(long, env = "VLM_PATH_COUNTS")]
    pub path_counts: String,
    /// Dataset namespace to read counts from.
    #[arg(long, env = "VLM_COUNT_NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    pub count_namespace: String,
    /// Dataset type to read counts from.
    #[arg(long, env = "VLM_COUNT_DATASET_TYPE", default_value = DEFAULT_DATASET_TYPE)]
    pub count_dataset_type: String,

    /// Base URL of the Ensembl REST API used for liftover.
    #[arg(long, env = "VLM_LIFTOVER_URL", default_value = ensembl::DEFAULT_BASE_URL)]
    pub liftover_url: String,

    /// Send error chain and backtrace in the body of 500 responses.
    #[arg(long, env = "VLM_VERBOSE_ERRORS", default_value_t = true, action = ArgAction::Set)]
    pub verbose_errors: bool,
}

/// Access to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdpConfig {
    /// Base URL, e.g., `https://example.eu.auth0.com`.
    pub base_url: String,
    pub client_id: String,
    pub client_secret: Secret,
    pub audience: String,
    pub issuer: String,
}

/// Configuration of the gateway, built once at start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub listen_host: String,
    pub listen_port: u16,
    pub settings: MatchSettings,
    pub idp: IdpConfig,
    pub client_cache_ttl: Duration,
    pub count_store: CountStoreKind,
    pub path_counts: String,
    pub scope: StoreScope,
    pub liftover_url: String,
    pub verbose_errors: bool,
}

/// Base URL of the identity provider at `domain`, `https` unless a scheme is given.
fn idp_base_url(domain: &str) -> String {
    let domain = domain.trim_end_matches('/');
    if domain.starts_with("http://") || domain.starts_with("https://") {
        domain.to_string()
    } else {
        format!("https://{}", domain)
    }
}

impl Config {
    pub fn from_args(args: &Args) -> Self {
        let base_url = idp_base_url(&args.idp_domain);
        Self {
            listen_host: args.listen_host.clone(),
            listen_port: args.listen_port,
            settings: MatchSettings {
                node_id: args.node_id.clone(),
                base_url: args.base_url.clone(),
                contact_email: args
                    .contact_email
                    .as_ref()
                    .filter(|email| !email.trim().is_empty())
                    .cloned(),
            },
            idp: IdpConfig {
                client_id: args.idp_client_id.clone(),
                client_secret: args.idp_client_secret.clone(),
                audience: args
                    .idp_audience
                    .clone()
                    .unwrap_or_else(|| format!("{}/api/v2/", &base_url)),
                issuer: args
                    .idp_issuer
                    .clone()
                    .unwrap_or_else(|| format!("{}/", &base_url)),
                base_url,
            },
            client_cache_ttl: Duration::from_secs(args.client_cache_ttl_secs),
            count_store: args.count_store,
            path_counts: args.path_counts.clone(),
            scope: StoreScope {
                namespace: args.count_namespace.clone(),
                dataset_type: args.count_dataset_type.clone(),
            },
            liftover_url: args.liftover_url.clone(),
            verbose_errors: args.verbose_errors,
        }
    }
}
