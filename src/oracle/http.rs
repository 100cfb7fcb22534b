//! HTTP client for a Workers AI style `run` endpoint.
//!
//! `POST {base_url}/run/{model}` with a bearer token and a chat `messages`
//! body. The answer text is read from `result.response`, `response` or `text`,
//! whichever is present first.

use super::{ClassificationOracle, OracleError, PromptRole};
use crate::config::OracleConfig;
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    messages: [Message<'a>; 2],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

pub struct HttpOracle {
    client: reqwest::Client,
    endpoint: String,
    api_token: String,
    timeout: Duration,
    circuit_breaker: CircuitBreaker,
}

impl HttpOracle {
    pub fn new(config: &OracleConfig) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| OracleError::Request(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/run/{}",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
            api_token: config.api_token.clone(),
            timeout: config.timeout(),
            circuit_breaker: CircuitBreaker::new(
                "classification_oracle",
                CircuitBreakerConfig::from(config.circuit_breaker.clone()),
            ),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }

    async fn run(&self, system_instruction: &str, user_text: &str) -> Result<String, OracleError> {
        let request = RunRequest {
            messages: [
                Message {
                    role: "system",
                    content: system_instruction,
                },
                Message {
                    role: "user",
                    content: user_text,
                },
            ],
        };

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if !self.api_token.is_empty() {
            builder = builder.bearer_auth(&self.api_token);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                OracleError::Timeout(self.timeout)
            } else {
                OracleError::Request(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Status { status, body });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| OracleError::Malformed(e.to_string()))?;

        extract_answer(&body)
    }
}

/// Pull the answer text out of a run response, treating blank text as no answer
pub fn extract_answer(body: &Value) -> Result<String, OracleError> {
    let text = body
        .pointer("/result/response")
        .or_else(|| body.get("response"))
        .or_else(|| body.get("text"))
        .ok_or_else(|| OracleError::Malformed("no response text field".to_string()))?
        .as_str()
        .ok_or_else(|| OracleError::Malformed("response text is not a string".to_string()))?;

    if text.trim().is_empty() {
        return Err(OracleError::EmptyResponse);
    }
    Ok(text.to_string())
}

#[async_trait]
impl ClassificationOracle for HttpOracle {
    async fn classify(
        &self,
        role: PromptRole,
        system_instruction: &str,
        user_text: &str,
    ) -> Result<String, OracleError> {
        debug!(role = %role, endpoint = %self.endpoint, "Calling classification oracle");

        self.circuit_breaker
            .call(|| self.run(system_instruction, user_text))
            .await
            .map_err(|e| match e {
                CircuitBreakerError::CircuitOpen { component } => {
                    OracleError::CircuitOpen(component)
                }
                CircuitBreakerError::OperationFailed(inner) => inner,
            })
    }

    fn name(&self) -> &str {
        "http"
    }
}
