//! Code supporting the `server match` sub command.

use std::{sync::Arc, time::Instant};

use actix_web::web::Data;
use tracing::info;

use crate::{
    auth::{Auth0Registry, Authenticator, TokenValidator},
    counts::open_count_store,
    liftover::{ContigLengths, EnsemblLiftover},
    matching::Matcher,
};

pub mod actix_server;
pub mod conf;

pub use conf::{Args, Config};

/// Shared state of the request handlers.
#[derive(Debug)]
pub struct WebServerData {
    pub authenticator: Authenticator,
    pub matcher: Matcher,
    /// Whether 500 responses carry the error chain and backtrace.
    pub verbose_errors: bool,
}

impl WebServerData {
    /// Connect to the backends described in `config`.
    pub fn from_config(config: &Config) -> Result<Self, anyhow::Error> {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "vlm-beacon-gateway/{}",
                crate::common::worker_version()
            ))
            .build()
            .map_err(|e| anyhow::anyhow!("problem building HTTP client: {}", e))?;

        let registry = Auth0Registry::new(
            client.clone(),
            &config.idp.base_url,
            &config.idp.client_id,
            config.idp.client_secret.clone(),
            &config.idp.audience,
        );
        let authenticator = Authenticator::new(
            TokenValidator::new(&config.idp.issuer),
            Arc::new(registry),
            config.client_cache_ttl,
        );

        let matcher = Matcher {
            settings: config.settings.clone(),
            oracle: Arc::new(ContigLengths::from_assemblies()),
            counts: open_count_store(
                config.count_store,
                &config.path_counts,
                config.scope.clone(),
            )?,
            liftover: Arc::new(EnsemblLiftover::new(client, &config.liftover_url)),
        };

        Ok(Self {
            authenticator,
            matcher,
            verbose_errors: config.verbose_errors,
        })
    }
}

/// Main entry point for `server match` sub command.
pub fn run(args_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    info!("args_common = {:?}", &args_common);
    info!("args = {:?}", &args);

    let config = Config::from_args(args);
    if config.verbose_errors && std::env::var_os("RUST_LIB_BACKTRACE").is_none() {
        std::env::set_var("RUST_LIB_BACKTRACE", "1");
    }

    info!("Opening backends...");
    let before_loading = Instant::now();
    let data = Data::new(WebServerData::from_config(&config)?);
    info!("...done opening backends in {:?}", before_loading.elapsed());

    info!(
        "Launching server on {}:{} ...",
        &config.listen_host, config.listen_port
    );
    actix_server::main(&config, data)?;

    info!("All done. Have a nice day!");
    Ok(())
}
