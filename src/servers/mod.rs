//! Process lifecycle control for registered servers.
//!
//! [`ServerController`] resolves a caller-supplied id against registry record
//! names (case-insensitively) and hands the canonical name to an
//! [`ActionExecutor`]. Every call ends in an [`ActionOutcome`]; errors never
//! escape the controller.

pub mod script;

pub use script::ScriptExecutor;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{DeckError, ErrorKind, Result};
use crate::registry::RegistryStore;

// ============================================================================
// Executor seam
// ============================================================================

/// Captured output of a start/stop action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn new(stdout: String, stderr: String, exit_code: Option<i32>) -> Self {
        Self {
            stdout,
            stderr,
            exit_code,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs the start/stop action for a resolved server name.
///
/// A failed action returns [`DeckError::External`] with the action's own
/// error output as the message.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn start(&self, name: &str) -> Result<CommandOutput>;
    async fn stop(&self, name: &str) -> Result<CommandOutput>;
}

// ============================================================================
// Outcome
// ============================================================================

/// Structured result of a start/stop request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl ActionOutcome {
    fn succeeded(message: &str, output: String) -> Self {
        Self {
            success: true,
            message: Some(message.to_string()),
            output: Some(output),
            error: None,
            kind: None,
        }
    }

    fn failed(kind: ErrorKind, error: String) -> Self {
        Self {
            success: false,
            message: None,
            output: None,
            error: Some(error),
            kind: Some(kind),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Start,
    Stop,
}

impl Action {
    fn verb(self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Stop => "stop",
        }
    }

    fn done(self) -> &'static str {
        match self {
            Action::Start => "Server started successfully",
            Action::Stop => "Server stopped successfully",
        }
    }
}

// ============================================================================
// Controller
// ============================================================================

/// Starts and stops servers named in the registry.
pub struct ServerController {
    store: Arc<RegistryStore>,
    executor: Arc<dyn ActionExecutor>,
}

impl ServerController {
    pub fn new(store: Arc<RegistryStore>, executor: Arc<dyn ActionExecutor>) -> Self {
        Self { store, executor }
    }

    pub async fn start(&self, id: &str) -> ActionOutcome {
        self.dispatch(Action::Start, id).await
    }

    pub async fn stop(&self, id: &str) -> ActionOutcome {
        self.dispatch(Action::Stop, id).await
    }

    async fn dispatch(&self, action: Action, id: &str) -> ActionOutcome {
        let name = match self.resolve(action, id) {
            Ok(name) => name,
            Err(e) => return Self::failure(action, e),
        };

        let result = match action {
            Action::Start => self.executor.start(&name).await,
            Action::Stop => self.executor.stop(&name).await,
        };
        match result {
            Ok(output) => {
                info!(name = %name, action = action.verb(), "Server action succeeded");
                ActionOutcome::succeeded(action.done(), output.stdout)
            }
            Err(e) => {
                warn!(name = %name, action = action.verb(), error = %e, "Server action failed");
                Self::failure(action, e)
            }
        }
    }

    /// Canonical registry name for `id`.
    fn resolve(&self, action: Action, id: &str) -> Result<String> {
        if id.is_empty() {
            return Err(DeckError::Validation("No ID provided".to_string()));
        }
        self.store.find_by_name_ci(id).ok_or_else(|| {
            info!(id = %id, action = action.verb(), "Unknown server id");
            DeckError::NotFound(format!("ID '{}' not found in registry", id))
        })
    }

    fn failure(action: Action, error: DeckError) -> ActionOutcome {
        let kind = error.kind();
        let message = match (kind, error) {
            (_, DeckError::Validation(msg)) | (_, DeckError::NotFound(msg)) => msg,
            (ErrorKind::External, DeckError::External(stderr)) => {
                format!("Failed to {} server: {}", action.verb(), stderr)
            }
            (ErrorKind::External, other) => {
                format!("Failed to {} server: {}", action.verb(), other)
            }
            (_, other @ DeckError::Unexpected(_)) => other.to_string(),
            (_, other) => DeckError::Unexpected(other.to_string()).to_string(),
        };
        ActionOutcome::failed(kind, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Prober;
    use mockall::predicate::eq;

    struct Down;

    #[async_trait]
    impl Prober for Down {
        async fn probe(&self, _endpoint: &str) -> bool {
            false
        }
    }

    fn store_with(rows: &str) -> (Arc<RegistryStore>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("websites.csv");
        std::fs::write(&path, format!("name,url,status\n{}", rows)).unwrap();
        (Arc::new(RegistryStore::new(path, Arc::new(Down))), dir)
    }

    fn ok_output(stdout: &str) -> CommandOutput {
        CommandOutput::new(stdout.to_string(), String::new(), Some(0))
    }

    #[tokio::test]
    async fn test_empty_id_is_validation_failure() {
        let (store, _d) = store_with("");
        let mut executor = MockActionExecutor::new();
        executor.expect_start().never();
        let controller = ServerController::new(store, Arc::new(executor));

        let outcome = controller.start("").await;
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("No ID provided"));
        assert_eq!(outcome.kind, Some(ErrorKind::Validation));
    }

    #[tokio::test]
    async fn test_unknown_id_never_invokes_executor() {
        let (store, _d) = store_with("Minecraft,https://m.com,active\n");
        let mut executor = MockActionExecutor::new();
        executor.expect_start().never();
        executor.expect_stop().never();
        let controller = ServerController::new(store, Arc::new(executor));

        let outcome = controller.start("unknown-id").await;
        assert_eq!(
            outcome.error.as_deref(),
            Some("ID 'unknown-id' not found in registry")
        );
        assert_eq!(outcome.kind, Some(ErrorKind::NotFound));
        assert!(!controller.stop("unknown-id").await.success);
    }

    #[tokio::test]
    async fn test_start_passes_canonical_name() {
        let (store, _d) = store_with("Minecraft,https://m.com,active\n");
        let mut executor = MockActionExecutor::new();
        executor
            .expect_start()
            .with(eq("Minecraft"))
            .times(1)
            .returning(|_| Ok(ok_output("up\n")));
        let controller = ServerController::new(store, Arc::new(executor));

        let outcome = controller.start("minecraft").await;
        assert!(outcome.success);
        assert_eq!(
            outcome.message.as_deref(),
            Some("Server started successfully")
        );
        assert_eq!(outcome.output.as_deref(), Some("up\n"));
        assert_eq!(outcome.kind, None);
    }

    #[tokio::test]
    async fn test_stop_failure_propagates_stderr() {
        let (store, _d) = store_with("alpha,https://a.com,active\n");
        let mut executor = MockActionExecutor::new();
        executor
            .expect_stop()
            .with(eq("alpha"))
            .returning(|_| Err(DeckError::External("no such screen\n".to_string())));
        let controller = ServerController::new(store, Arc::new(executor));

        let outcome = controller.stop("ALPHA").await;
        assert!(!outcome.success);
        assert_eq!(
            outcome.error.as_deref(),
            Some("Failed to stop server: no such screen\n")
        );
        assert_eq!(outcome.kind, Some(ErrorKind::External));
    }

    #[tokio::test]
    async fn test_other_errors_become_unexpected() {
        let (store, _d) = store_with("alpha,https://a.com,active\n");
        let mut executor = MockActionExecutor::new();
        executor
            .expect_start()
            .returning(|_| Err(DeckError::Config("start script is not configured".into())));
        let controller = ServerController::new(store, Arc::new(executor));

        let outcome = controller.start("alpha").await;
        assert_eq!(outcome.kind, Some(ErrorKind::Unexpected));
        assert_eq!(
            outcome.error.as_deref(),
            Some("Unexpected error: Configuration error: start script is not configured")
        );
    }

    #[tokio::test]
    async fn test_io_errors_keep_their_kind() {
        let (store, _d) = store_with("alpha,https://a.com,active\n");
        let mut executor = MockActionExecutor::new();
        executor.expect_stop().returning(|_| {
            Err(DeckError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "stop.sh missing",
            )))
        });
        let controller = ServerController::new(store, Arc::new(executor));

        let outcome = controller.stop("alpha").await;
        assert_eq!(outcome.kind, Some(ErrorKind::Io));
        assert_eq!(
            outcome.error.as_deref(),
            Some("Unexpected error: IO error: stop.sh missing")
        );
    }

    #[tokio::test]
    async fn test_outcome_json_shape() {
        let (store, _d) = store_with("");
        let controller = ServerController::new(store, Arc::new(MockActionExecutor::new()));
        let json = serde_json::to_value(controller.start("").await).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["kind"], "validation");
        assert!(json.get("message").is_none());
    }
}
