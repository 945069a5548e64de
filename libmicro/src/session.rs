//! Scripted sessions shared by the host binaries
//!
//! Both binaries do the same work around a different host: load the
//! configuration and fixtures, read the script, compose the store, run
//! the script and render the report. Only the host differs.
//!
//! # Example
//!
//! ```no_run
//! use libmicro::session::{run_session, HostKind, SessionOptions};
//! use libmicro::script::OutputFormat;
//!
//! # async fn example() -> libmicro::Result<()> {
//! let mut options = SessionOptions::new(HostKind::Support);
//! options.script = Some("session.json".into());
//! options.fixtures = Some("fixtures.json".into());
//! options.format = OutputFormat::Json;
//!
//! print!("{}", run_session(&options).await?);
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::{MockTransport, Transport};
use crate::config::Config;
use crate::error::Result;
use crate::features::support;
use crate::hosts::{compose_main_app, compose_support_app, Host};
use crate::script::{self, OutputFormat, Script};

/// Which store a session runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    /// Root store with every module
    Main,
    /// Support module alone
    Support,
}

impl HostKind {
    pub fn compose(self, config: &Config, transport: Arc<dyn Transport>) -> Result<Host> {
        match self {
            HostKind::Main => compose_main_app(config, transport),
            HostKind::Support => compose_support_app(config, transport),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub host: HostKind,
    /// Script file; read from stdin when `None`
    pub script: Option<PathBuf>,
    /// Mock transport fixtures; every request fails with "No route" when
    /// `None`
    pub fixtures: Option<PathBuf>,
    /// Configuration file; [`Config::load`] rules apply when `None`
    pub config: Option<PathBuf>,
    pub format: OutputFormat,
}

impl SessionOptions {
    pub fn new(host: HostKind) -> Self {
        Self {
            host,
            script: None,
            fixtures: None,
            config: None,
            format: OutputFormat::Text,
        }
    }
}

/// Run one session and return the rendered report
///
/// # Errors
///
/// Returns an error if:
/// - The configuration or fixtures cannot be loaded
/// - The script cannot be read or parsed
/// - The store fails to compose
/// - A step names an unknown API, endpoint or main app tag
pub async fn run_session(options: &SessionOptions) -> Result<String> {
    let config = match &options.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    let transport = match &options.fixtures {
        Some(path) => MockTransport::from_fixtures(path)?,
        None => MockTransport::new(),
    };

    let script = match &options.script {
        Some(path) => Script::from_path(path)?,
        None => Script::from_reader(std::io::stdin().lock())?,
    };
    debug!(host = ?options.host, steps = script.steps.len(), "Starting session");

    let host = options.host.compose(&config, Arc::new(transport))?;
    let outcomes = script.run(&host).await?;

    match support::welcome_message(host.accessor.as_ref()) {
        Some(greeting) => info!("{}", greeting),
        None => info!("No signed-in main app user"),
    }

    let state = host.store.snapshot().to_json();
    script::render(&outcomes, &state, options.format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MicroError;
    use serde_json::Value;
    use std::fs;
    use tempfile::TempDir;

    const FIXTURES: &str = r#"{
        "routes": [
            { "method": "GET", "url": "/api/user/me",
              "response": { "id": "u-1", "email": "ada@example.com", "name": "Ada",
                            "preferences": { "language": "en", "notifications": true } } },
            { "method": "POST", "url": "/api/support/tickets", "echo": true }
        ]
    }"#;

    const SCRIPT: &str = r#"[
        { "step": "query", "api": "mainApi", "endpoint": "getCurrentUser" },
        { "step": "mutate", "api": "supportApi", "endpoint": "createTicket",
          "args": { "title": "Card declined", "description": "At checkout" } }
    ]"#;

    fn session_files(temp_dir: &TempDir, host: HostKind) -> SessionOptions {
        let script = temp_dir.path().join("session.json");
        let fixtures = temp_dir.path().join("fixtures.json");
        let config = temp_dir.path().join("config.toml");
        fs::write(&script, SCRIPT).unwrap();
        fs::write(&fixtures, FIXTURES).unwrap();
        fs::write(&config, "[store]\nlog_actions = false\n").unwrap();

        let mut options = SessionOptions::new(host);
        options.script = Some(script);
        options.fixtures = Some(fixtures);
        options.config = Some(config);
        options.format = OutputFormat::Json;
        options
    }

    #[tokio::test]
    async fn test_main_session_report() {
        let temp_dir = TempDir::new().unwrap();
        let options = session_files(&temp_dir, HostKind::Main);

        let report: Value = serde_json::from_str(&run_session(&options).await.unwrap()).unwrap();

        assert_eq!(report["steps"][0]["result"]["status"], "fulfilled");
        assert_eq!(report["state"]["user"]["user"]["name"], "Ada");
        // Echoed create body carries the signed-in reporter
        assert_eq!(report["steps"][1]["result"]["data"]["reporter"], "ada@example.com");
    }

    #[tokio::test]
    async fn test_support_session_rejects_main_api() {
        let temp_dir = TempDir::new().unwrap();
        let options = session_files(&temp_dir, HostKind::Support);

        let err = run_session(&options).await.unwrap_err();
        assert!(matches!(err, MicroError::InvalidInput(_)));
        assert!(err.to_string().contains("Unknown API 'mainApi'"));
        assert_eq!(err.exit_code(), 3);
    }

    #[tokio::test]
    async fn test_missing_script_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut options = session_files(&temp_dir, HostKind::Support);
        options.script = Some(temp_dir.path().join("missing.json"));

        assert!(matches!(run_session(&options).await, Err(MicroError::InvalidInput(_))));
    }
}
