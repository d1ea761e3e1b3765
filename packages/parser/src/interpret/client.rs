use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ParserError, Result};
use crate::interpret::config::InterpreterConfig;

/// User agent string identifying this parser.
const USER_AGENT: &str = concat!("ussg-parser/", env!("CARGO_PKG_VERSION"));

/// Role of a message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// One interpretation call: a system prompt plus the section prompt.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub system: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f64,
}

/// Model output with token usage for logging.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Seam between the interpreter and the model service.
///
/// Calls are blocking; the parser runs one section at a time.
pub trait LlmClient {
    fn complete(&self, request: &LlmRequest) -> Result<LlmResponse>;
}

/// Blocking client for the Anthropic Messages API.
///
/// NOTE: Do NOT derive `Debug` on this struct, `api_key` would be exposed.
pub struct AnthropicClient {
    http: reqwest::blocking::Client,
    api_key: String,
    api_base_url: String,
    model: String,
    base_delays: Vec<Duration>,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    system: &'a str,
    messages: &'a [Message],
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

#[derive(Deserialize)]
struct AnthropicErrorResponse {
    error: Option<AnthropicErrorDetail>,
}

#[derive(Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}

/// Seconds to wait after a 429 without a usable `retry-after` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Outcome of a single HTTP attempt.
enum Attempt {
    Done(LlmResponse),
    /// Worth another try; `wait` overrides the backoff when longer.
    Retry {
        error: ParserError,
        wait: Option<Duration>,
    },
    Fail(ParserError),
}

/// `retry-after` in whole seconds, falling back to a minute.
fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> u64 {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

/// `error.message` of an API error body, or the raw body.
fn api_error_message(body: String) -> String {
    match serde_json::from_str::<AnthropicErrorResponse>(&body) {
        Ok(AnthropicErrorResponse {
            error: Some(detail),
        }) => detail.message,
        _ => body,
    }
}

impl AnthropicClient {
    pub fn new(config: &InterpreterConfig) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(ParserError::LlmApiRequest)?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            base_delays: vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
            ],
        })
    }

    /// Override the retry backoff schedule; one retry per entry.
    #[must_use]
    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.base_delays = delays;
        self
    }

    fn attempt(&self, url: &str, body: &AnthropicRequest<'_>) -> Attempt {
        let resp = match self
            .http
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(body)
            .send()
        {
            Ok(resp) => resp,
            Err(e) if e.is_connect() || e.is_timeout() => {
                return Attempt::Retry {
                    error: ParserError::LlmApiRequest(e),
                    wait: None,
                }
            }
            Err(e) => return Attempt::Fail(ParserError::LlmApiRequest(e)),
        };

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = retry_after_secs(resp.headers());
            return Attempt::Retry {
                error: ParserError::LlmRateLimited { retry_after_secs },
                wait: Some(Duration::from_secs(retry_after_secs)),
            };
        }

        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            let error = ParserError::LlmApiError {
                status: status.as_u16(),
                message: if status.is_server_error() {
                    body
                } else {
                    api_error_message(body)
                },
            };
            return if status.is_server_error() {
                Attempt::Retry { error, wait: None }
            } else {
                Attempt::Fail(error)
            };
        }

        let parsed: AnthropicResponse = match resp.json() {
            Ok(parsed) => parsed,
            Err(e) => return Attempt::Fail(ParserError::InterpretationParse(e.to_string())),
        };
        let content: String = parsed
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect();

        if content.is_empty() {
            return Attempt::Retry {
                error: ParserError::LlmEmptyResponse,
                wait: None,
            };
        }

        Attempt::Done(LlmResponse {
            content,
            input_tokens: parsed.usage.input_tokens,
            output_tokens: parsed.usage.output_tokens,
        })
    }
}

impl LlmClient for AnthropicClient {
    /// Send the request, retrying connection failures, timeouts, rate limits,
    /// server errors and empty answers along the backoff schedule.
    fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let url = format!("{}/v1/messages", self.api_base_url);
        let body = AnthropicRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: &request.system,
            messages: &request.messages,
        };

        let mut attempt = 0;
        loop {
            let (error, wait) = match self.attempt(&url, &body) {
                Attempt::Done(response) => return Ok(response),
                Attempt::Fail(error) => return Err(error),
                Attempt::Retry { error, wait } => (error, wait),
            };

            let Some(&backoff) = self.base_delays.get(attempt) else {
                warn!(attempts = attempt + 1, error = %error, "giving up on LLM request");
                return Err(error);
            };
            let delay = wait.map_or(backoff, |wait| wait.max(backoff));
            warn!(attempt, error = %error, ?delay, "LLM request will be retried");
            thread::sleep(delay);
            attempt += 1;
            debug!(attempt, "retrying LLM request");
        }
    }
}

/// Scripted client for interpreter tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Answers interpretation requests from a fixed script, first entry
    /// first, and keeps every request so tests can inspect the prompts sent.
    /// Once the script runs out it answers with `LlmEmptyResponse`.
    pub struct MockLlmClient {
        script: Mutex<Vec<Result<LlmResponse>>>,
        requests: Mutex<Vec<LlmRequest>>,
    }

    impl MockLlmClient {
        pub fn new(mut script: Vec<Result<LlmResponse>>) -> Self {
            script.reverse();
            Self {
                script: Mutex::new(script),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// A client that answers one section prompt with `content`.
        pub fn with_response(content: &str) -> Self {
            Self::with_responses(vec![content])
        }

        /// A client that answers successive section prompts in order.
        pub fn with_responses(contents: Vec<&str>) -> Self {
            Self::new(
                contents
                    .into_iter()
                    .map(|content| {
                        Ok(LlmResponse {
                            content: content.to_string(),
                            input_tokens: content.len() as u64,
                            output_tokens: 0,
                        })
                    })
                    .collect(),
            )
        }

        /// Requests received so far, oldest first.
        pub fn requests(&self) -> Vec<LlmRequest> {
            self.requests
                .lock()
                .map(|r| r.clone())
                .unwrap_or_default()
        }
    }

    impl LlmClient for MockLlmClient {
        fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(request.clone());
            }
            let mut script = self.script.lock().map_err(|e| {
                ParserError::InterpretationParse(format!("mock client lock poisoned: {e}"))
            })?;
            script.pop().unwrap_or(Err(ParserError::LlmEmptyResponse))
        }
    }
}
