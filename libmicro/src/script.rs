//! Scripted store sessions
//!
//! Host binaries drive a composed store from a JSON list of steps, the way
//! a UI would: dispatch actions, read through the caches, run mutations
//! and invalidate tags. Each step yields an outcome for reporting.
//!
//! ```json
//! [
//!   { "step": "query", "api": "supportApi", "endpoint": "getTickets" },
//!   { "step": "mutate", "api": "supportApi", "endpoint": "updateTicketStatus",
//!     "args": { "id": "1", "status": "closed" } },
//!   { "step": "dispatch",
//!     "action": { "slice": "mobile", "action": { "type": "setTheme", "payload": "dark" } } },
//!   { "step": "invalidate", "api": "supportApi", "tags": ["Ticket"] }
//! ]
//! ```

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::bridge::MainTag;
use crate::cache::{ApiClient, Tag};
use crate::error::{MicroError, Result};
use crate::hosts::Host;
use crate::store::Action;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum Step {
    Dispatch {
        action: Action,
    },
    Query {
        api: String,
        endpoint: String,
        #[serde(default)]
        args: Value,
    },
    Refetch {
        api: String,
        endpoint: String,
        #[serde(default)]
        args: Value,
    },
    Mutate {
        api: String,
        endpoint: String,
        #[serde(default)]
        args: Value,
    },
    Invalidate {
        api: String,
        tags: Vec<String>,
    },
    /// Invalidate main app tags through the host's accessor
    InvalidateMain {
        tags: Vec<String>,
    },
}

impl Step {
    pub fn describe(&self) -> String {
        match self {
            Step::Dispatch { action } => format!("dispatch {}", action.kind()),
            Step::Query { api, endpoint, .. } => format!("query {}/{}", api, endpoint),
            Step::Refetch { api, endpoint, .. } => format!("refetch {}/{}", api, endpoint),
            Step::Mutate { api, endpoint, .. } => format!("mutate {}/{}", api, endpoint),
            Step::Invalidate { api, tags } => format!("invalidate {} [{}]", api, tags.join(", ")),
            Step::InvalidateMain { tags } => format!("invalidate main app [{}]", tags.join(", ")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    pub index: usize,
    pub step: String,
    pub result: Value,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Script {
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MicroError::InvalidInput(format!("Failed to read script {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .map_err(|e| MicroError::InvalidInput(format!("Failed to read script: {}", e)))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| MicroError::InvalidInput(format!("Invalid script: {}", e)))
    }

    /// Run every step in order, stopping at the first invalid one
    pub async fn run(&self, host: &Host) -> Result<Vec<StepOutcome>> {
        let mut outcomes = Vec::with_capacity(self.steps.len());
        for (index, step) in self.steps.iter().enumerate() {
            debug!(index, step = %step.describe(), "Running step");
            let result = run_step(host, step).await?;
            outcomes.push(StepOutcome {
                index,
                step: step.describe(),
                result,
            });
        }
        Ok(outcomes)
    }
}

fn client(host: &Host, api: &str) -> Result<ApiClient> {
    host.store.api(api).ok_or_else(|| {
        MicroError::InvalidInput(format!(
            "Unknown API '{}' (available: {})",
            api,
            host.store.api_paths().join(", ")
        ))
    })
}

fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| MicroError::InvalidInput(format!("Failed to serialize outcome: {}", e)))
}

async fn run_step(host: &Host, step: &Step) -> Result<Value> {
    match step {
        Step::Dispatch { action } => {
            host.store.dispatch(action.clone());
            Ok(Value::from(host.store.version()))
        }
        Step::Query { api, endpoint, args } => {
            let result = client(host, api)?.query(endpoint, args.clone()).await?;
            to_value(&result)
        }
        Step::Refetch { api, endpoint, args } => {
            let result = client(host, api)?.refetch(endpoint, args.clone()).await?;
            to_value(&result)
        }
        Step::Mutate { api, endpoint, args } => {
            let result = client(host, api)?.mutate(endpoint, args.clone()).await?;
            to_value(&result)
        }
        Step::Invalidate { api, tags } => {
            client(host, api)?.invalidate_tags(tags.iter().map(|t| Tag::parse(t)));
            Ok(Value::Null)
        }
        Step::InvalidateMain { tags } => {
            let tags = tags
                .iter()
                .map(|t| t.parse::<MainTag>().map_err(MicroError::InvalidInput))
                .collect::<Result<Vec<_>>>()?;
            host.accessor.invalidate_main_tags(&tags);
            Ok(Value::Null)
        }
    }
}

/// How a session report is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = MicroError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(MicroError::InvalidInput(format!(
                "Invalid output format '{}'. Valid formats: text, json",
                other
            ))),
        }
    }
}

/// Render step outcomes and the final state tree
pub fn render(outcomes: &[StepOutcome], state: &Value, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let report = serde_json::json!({ "steps": outcomes, "state": state });
            serde_json::to_string_pretty(&report)
                .map_err(|e| MicroError::InvalidInput(format!("Failed to serialize report: {}", e)))
        }
        OutputFormat::Text => {
            let mut out = String::new();
            for outcome in outcomes {
                out.push_str(&format!("[{}] {}", outcome.index, outcome.step));
                let status = outcome.result.get("status").map(|s| s.as_str().unwrap_or_default());
                match (status, outcome.result.get("error")) {
                    (Some(status), Some(Value::String(error))) => {
                        out.push_str(&format!(": {} ({})", status, error))
                    }
                    (Some(status), _) => out.push_str(&format!(": {}", status)),
                    _ => {}
                }
                out.push('\n');
            }
            let state = serde_json::to_string_pretty(state).map_err(|e| {
                MicroError::InvalidInput(format!("Failed to serialize state: {}", e))
            })?;
            out.push_str(&state);
            out.push('\n');
            Ok(out)
        }
    }
}
