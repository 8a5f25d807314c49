#![deny(missing_docs)]

//! # Shared Arguments
//!
//! Document locations, overridable through the environment.

use std::path::PathBuf;

/// Default location of the REST document.
pub const DEFAULT_REST_SPEC: &str = "ouroboros/rest/ourorest.yml";

/// Default location of the WebSocket document.
pub const DEFAULT_WS_SPEC: &str = "ouroboros/websocket/ourowebsocket.yml";

/// Location of the persisted REST document.
#[derive(clap::Args, Debug, Clone)]
pub struct RestSpecArg {
    /// Path to the OpenAPI YAML file.
    #[clap(long, env = "OUROBOROS_REST_SPEC", default_value = DEFAULT_REST_SPEC)]
    pub rest_spec: PathBuf,
}

/// Location of the persisted WebSocket document.
#[derive(clap::Args, Debug, Clone)]
pub struct WsSpecArg {
    /// Path to the AsyncAPI YAML file.
    #[clap(long, env = "OUROBOROS_WS_SPEC", default_value = DEFAULT_WS_SPEC)]
    pub ws_spec: PathBuf,
}
