//! OpsDeck - operator dashboard backend
//!
//! Credential verification against a keyed digest, a CSV registry of
//! monitored endpoints with HTTP liveness probing, and start/stop control for
//! the servers those endpoints front.

pub mod auth;
pub mod config;
pub mod error;
pub mod registry;
pub mod servers;
pub mod utils;

pub use auth::{AuthOutcome, CredentialDigest, CredentialVerifier};
pub use config::Config;
pub use error::{DeckError, ErrorKind, Result};
pub use registry::{HttpProber, Mutation, Prober, Record, RegistryStore, Status};
pub use servers::{ActionExecutor, ActionOutcome, ScriptExecutor, ServerController};
