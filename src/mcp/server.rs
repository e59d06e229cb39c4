//! MCP Server implementation
//!
//! Implements the `make` tool using rmcp SDK.

use std::sync::Arc;

use rmcp::model::{Implementation, ServerCapabilities, ServerInfo, ToolsCapability};
use rmcp::{tool, ServerHandler};
use serde::Serialize;

use crate::config::Config;
use crate::error::{ErrorInfo, ExecError};
use crate::executor::{serialize_result, CallContext, Execution, Executor, MakeParams, MakeResult};
use crate::help::{compose_description, format_help_preamble};

/// MCP Server exposing a single `make` tool
#[derive(Clone)]
pub struct MakeServer {
    executor: Executor,
    /// Parent of every tool call's context; cancelled on shutdown
    ctx: CallContext,
    name: String,
    preamble: String,
    help_target: Option<String>,
    description: Arc<String>,
}

impl MakeServer {
    /// Create a server from loaded configuration
    ///
    /// The description starts as the preamble alone; call [`MakeServer::with_help`]
    /// to append the Makefile's own help listing.
    pub fn new(config: &Config) -> Result<Self, ExecError> {
        let executor = Executor::new(config.executor_config()?)?;
        Ok(Self::with_executor(executor, config))
    }

    /// Create a server around an existing executor
    pub fn with_executor(executor: Executor, config: &Config) -> Self {
        Self {
            executor,
            ctx: CallContext::new(),
            name: config.server.name.clone(),
            preamble: config.make.preamble.clone(),
            help_target: config.make.help_target().map(str::to_string),
            description: Arc::new(format_help_preamble(&config.make.preamble)),
        }
    }

    /// Run the help target and publish its output as the server description
    pub async fn with_help(mut self) -> Self {
        self.description = Arc::new(self.describe().await);
        self
    }

    /// Compose the preamble with the processed output of the help target
    ///
    /// Falls back to the preamble alone when help discovery is disabled or fails.
    pub async fn describe(&self) -> String {
        let Some(target) = self.help_target.as_deref() else {
            return format_help_preamble(&self.preamble);
        };

        let execution = self
            .executor
            .execute(&self.ctx.child(), &MakeParams::new(target))
            .await;

        match execution.error {
            None => compose_description(&self.preamble, &execution.result.stdout),
            Some(e) => {
                tracing::warn!("help target '{}' failed: {}", target, e);
                format_help_preamble(&self.preamble)
            }
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Cancel every in-flight make invocation
    pub fn shutdown(&self) {
        self.ctx.cancel();
    }
}

/// Tool response: the result fields plus error details on failure
#[derive(Debug, Serialize)]
struct MakeResponse<'a> {
    #[serde(flatten)]
    result: &'a MakeResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorInfo>,
}

/// Render an execution as the tool's JSON body
fn render_execution(execution: &Execution) -> String {
    let rendered = match &execution.error {
        None => serialize_result(&execution.result),
        Some(error) => serde_json::to_string(&MakeResponse {
            result: &execution.result,
            error: Some(ErrorInfo::from(error)),
        })
        .map_err(ExecError::from),
    };
    rendered.unwrap_or_else(|e| render_fallback(&execution.result, &e))
}

/// Same shape as [`MakeResponse`], assembled from individually escaped fields
fn render_fallback(result: &MakeResult, error: &ExecError) -> String {
    let quote = |s: &str| serde_json::Value::from(s).to_string();
    format!(
        r#"{{"stdout":{},"stderr":{},"exit_code":{},"duration_ms":{},"error":{{"message":{},"error_type":{}}}}}"#,
        quote(&result.stdout),
        quote(&result.stderr),
        result.exit_code,
        result.duration_ms,
        quote(&error.to_string()),
        quote(error.kind()),
    )
}

// === MCP Tool Implementations ===

#[tool(tool_box)]
impl MakeServer {
    /// Run a make target in the configured project directory
    #[tool(
        description = "Run a make target in the configured project directory. Returns JSON with stdout, stderr, exit_code and duration_ms; failures add an error object."
    )]
    pub async fn make(&self, #[tool(aggr)] params: MakeParams) -> String {
        let execution = self.executor.execute(&self.ctx.child(), &params).await;

        match &execution.error {
            None => tracing::info!(
                make_target = %params.target,
                duration_ms = execution.result.duration_ms,
                "make target succeeded"
            ),
            Some(e) => tracing::info!(
                make_target = %params.target,
                exit_code = execution.result.exit_code,
                "make target failed: {}",
                e
            ),
        }

        render_execution(&execution)
    }
}

#[tool(tool_box)]
impl ServerHandler for MakeServer {
    fn get_info(&self) -> ServerInfo {
        let instructions = if self.description.is_empty() {
            "Runs targets of the project Makefile through the `make` tool.".to_string()
        } else {
            self.description.to_string()
        };

        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(false),
                }),
                ..Default::default()
            },
            server_info: Implementation {
                name: self.name.clone(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(instructions),
        }
    }
}
