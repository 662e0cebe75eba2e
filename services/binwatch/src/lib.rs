//! Binwatch - admin API for air-quality monitored bins
//!
//! Serves a single JSON endpoint that dispatches on an `action` parameter
//! against a relational store of bins, sensors and readings.

pub mod action;
pub mod air_quality;
pub mod api;
pub mod bins;
pub mod config;
pub mod contact;
pub mod envelope;
pub mod error;
pub mod models;
pub mod sensors;
pub mod store;

pub use config::{load_config, Config};
pub use error::{ApiError, BinwatchError, Result};

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::api::ApiState;
use crate::config::{AirQualityConfig, MapConfig};
use crate::store::Store;

/// Settings the action handlers read; fixed for the life of the server
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub air_quality: AirQualityConfig,
    pub map: MapConfig,
}

impl From<&Config> for Settings {
    fn from(config: &Config) -> Self {
        Self {
            air_quality: config.air_quality.clone(),
            map: config.map.clone(),
        }
    }
}

/// Assembles a [`Binwatch`] server, with optional injected collaborators
pub struct BinwatchBuilder {
    config: Config,
    store: Option<Store>,
    cancel: Option<CancellationToken>,
}

impl BinwatchBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            store: None,
            cancel: None,
        }
    }

    /// Use an existing store instead of connecting from config
    pub fn with_store(mut self, store: Store) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Connect the store, prepare the schema and bind the listener
    pub async fn build(self) -> Result<Binwatch> {
        let store = match self.store {
            Some(store) => store,
            None => Store::connect_lazy(&self.config.database)?,
        };

        if self.config.database.init_schema {
            store.init_schema().await?;
        }

        let addr = format!(
            "{}:{}",
            self.config.server.bind_address, self.config.server.port
        );
        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            BinwatchError::Server(format!("Failed to bind {}: {}", addr, e))
        })?;

        Ok(Binwatch {
            state: ApiState {
                store,
                settings: Arc::new(Settings::from(&self.config)),
            },
            listener,
            cancel: self.cancel.unwrap_or_default(),
        })
    }
}

/// A bound, ready-to-serve binwatch server
pub struct Binwatch {
    state: ApiState,
    listener: TcpListener,
    cancel: CancellationToken,
}

impl Binwatch {
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Serve requests until the cancellation token fires
    pub async fn start(self) -> Result<()> {
        let addr = self.local_addr()?;
        let store = self.state.store.clone();
        let router = api::build_router(self.state);
        let cancel = self.cancel;

        tracing::info!("Binwatch API listening on http://{}{}", addr, api::API_PATH);

        axum::serve(self.listener, router)
            .with_graceful_shutdown(async move {
                cancel.cancelled().await;
            })
            .await?;

        store.close().await;
        tracing::info!("Binwatch API stopped");
        Ok(())
    }
}

/// Run the service until ctrl-c
pub async fn run(config: Config) -> Result<()> {
    let server = BinwatchBuilder::new(config).build().await?;

    let cancel = server.cancellation_token();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received"),
            Err(e) => tracing::error!("Failed to listen for ctrl-c: {}", e),
        }
        cancel.cancel();
    });

    server.start().await
}
