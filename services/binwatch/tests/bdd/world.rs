//! BDD test world for binwatch service

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::http::StatusCode;
use cucumber::World;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use binwatch::api::ApiState;

#[derive(Debug, Default, World)]
pub struct BinwatchWorld {
    // In-process API
    pub state: Option<ApiState>,
    pub last_status: Option<StatusCode>,
    pub last_body: Option<serde_json::Value>,

    // Bin identifier -> row id, for steps that refer to bins by label
    pub bins: HashMap<String, i64>,
    // Sensor name -> row id
    pub sensors: HashMap<String, i64>,

    // Row counts captured before an action, keyed by table
    pub counts_before: HashMap<String, i64>,

    // Lifecycle testing
    pub server_addr: Option<SocketAddr>,
    pub server_cancel: Option<CancellationToken>,
    pub server_handle: Option<JoinHandle<binwatch::Result<()>>>,
}
