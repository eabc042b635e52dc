//! Text-generation backends.
//!
//! The pipeline only sees the [`Generator`] trait: a prompt, a model name
//! and a timeout go in, generated text or a [`GenerationError`] comes out.
//! Both bundled backends talk to Ollama, one through its CLI and one
//! through its HTTP API. Each call runs on a private current-thread
//! runtime so callers stay synchronous.

use std::{future::Future, process::Stdio, time::Duration};

use serde::{Deserialize, Serialize};

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "llama2";

/// Default per-call timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default Ollama HTTP endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Number of prompt characters echoed back in a failure diagnostic.
pub const PROMPT_PREVIEW_CHARS: usize = 2000;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation backend not found: {0}")]
    BackendMissing(String),

    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("backend error ({status}): {stderr}")]
    Failed { status: String, stderr: String },

    #[error("call timed out after {}s", .0.as_secs_f32())]
    TimedOut(Duration),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("invalid backend response: {0}")]
    InvalidResponse(String),

    #[error("could not start runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// A text-in/text-out generation backend.
pub trait Generator {
    /// Short backend name used in diagnostics.
    fn name(&self) -> &str;

    /// Generate a completion for `prompt`, giving up after `timeout`.
    fn generate(
        &self,
        prompt: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<String, GenerationError>;
}

/// Run `generator`, turning any failure into a readable answer string.
///
/// The diagnostic names the backend and the failure, followed by the first
/// [`PROMPT_PREVIEW_CHARS`] characters of the prompt.
pub fn generate_or_diagnostic(
    generator: &dyn Generator,
    prompt: &str,
    model: &str,
    timeout: Duration,
) -> String {
    match generator.generate(prompt, model, timeout) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(
                backend = generator.name(),
                model,
                error = %err,
                "generation failed"
            );
            failure_diagnostic(generator.name(), &err, prompt)
        }
    }
}

/// Format a generation failure together with a truncated prompt.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use finqa::generation::{failure_diagnostic, GenerationError};
///
/// let text = failure_diagnostic(
///     "ollama",
///     &GenerationError::TimedOut(Duration::from_secs(30)),
///     "PROMPT",
/// );
/// assert!(text.contains("timed out"));
/// assert!(text.ends_with("PROMPT"));
/// ```
pub fn failure_diagnostic(
    backend: &str,
    err: &GenerationError,
    prompt: &str,
) -> String {
    let preview: String = prompt.chars().take(PROMPT_PREVIEW_CHARS).collect();
    format!("ERROR calling {backend}: {err}\n\nPrompt sent (truncated):\n{preview}")
}

fn block_on<F: Future>(future: F) -> Result<F::Output, GenerationError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(GenerationError::Runtime)?;
    Ok(runtime.block_on(future))
}

/// Ollama through its command-line client: `<program> run <model> <prompt>`.
///
/// The child is killed when the timeout expires.
#[derive(Debug, Clone)]
pub struct OllamaCli {
    program: String,
    subcommand: String,
}

impl OllamaCli {
    pub fn new() -> Self {
        Self::with_command("ollama", "run")
    }

    /// Use a different executable and subcommand; the model and prompt are
    /// still passed as the two trailing arguments.
    pub fn with_command(
        program: impl Into<String>,
        subcommand: impl Into<String>,
    ) -> Self {
        Self {
            program: program.into(),
            subcommand: subcommand.into(),
        }
    }
}

impl Default for OllamaCli {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for OllamaCli {
    fn name(&self) -> &str {
        &self.program
    }

    fn generate(
        &self,
        prompt: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<String, GenerationError> {
        tracing::debug!(
            program = %self.program,
            model,
            prompt_chars = prompt.len(),
            "invoking generation CLI"
        );

        let output = block_on(async {
            let child = tokio::process::Command::new(&self.program)
                .arg(&self.subcommand)
                .arg(model)
                .arg(prompt)
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output();
            tokio::time::timeout(timeout, child).await
        })?;

        let output = match output {
            Err(_) => return Err(GenerationError::TimedOut(timeout)),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(GenerationError::BackendMissing(format!(
                    "`{}` is not installed; install Ollama (https://ollama.ai/) and pull a model",
                    self.program
                )));
            }
            Ok(Err(source)) => {
                return Err(GenerationError::Spawn {
                    program: self.program.clone(),
                    source,
                });
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            return Err(GenerationError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Ollama through its HTTP API (`POST /api/generate`, non-streaming).
#[derive(Debug, Clone)]
pub struct OllamaHttp {
    base_url: String,
}

impl OllamaHttp {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }
}

impl Default for OllamaHttp {
    fn default() -> Self {
        Self::new(DEFAULT_OLLAMA_URL)
    }
}

impl Generator for OllamaHttp {
    fn name(&self) -> &str {
        "ollama-http"
    }

    fn generate(
        &self,
        prompt: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<String, GenerationError> {
        let url = self.endpoint();
        tracing::debug!(%url, model, "requesting generation over HTTP");

        let classify = |e: reqwest::Error| {
            if e.is_timeout() {
                GenerationError::TimedOut(timeout)
            } else if e.is_connect() {
                GenerationError::BackendMissing(format!(
                    "no Ollama server reachable at {}",
                    self.base_url
                ))
            } else {
                GenerationError::Http(e.to_string())
            }
        };

        block_on(async {
            let response = reqwest::Client::new()
                .post(&url)
                .timeout(timeout)
                .json(&GenerateRequest {
                    model,
                    prompt,
                    stream: false,
                })
                .send()
                .await
                .map_err(classify)?;

            let status = response.status();
            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
                return Err(GenerationError::Failed {
                    status: status.to_string(),
                    stderr: body.trim().to_string(),
                });
            }

            let body: GenerateResponse = response.json().await.map_err(|e| {
                if e.is_timeout() {
                    GenerationError::TimedOut(timeout)
                } else {
                    GenerationError::InvalidResponse(e.to_string())
                }
            })?;
            Ok(body.response.trim().to_string())
        })?
    }
}
