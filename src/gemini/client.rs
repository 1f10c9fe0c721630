// Gemini API client with API-key authentication

use crate::config::GeminiConfig;
use crate::error::{Result, TriageError};
use crate::models::gemini::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
    SystemInstruction,
};
use crate::utils::logging;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

/// Client for the Gemini Generative Language API.
///
/// Handles authentication via the `x-goog-api-key` header and unary
/// `generateContent` calls with structured JSON replies. There is no retry,
/// backoff, or queueing; a failed call surfaces immediately and the user may
/// resubmit.
pub struct GeminiClient {
    http_client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a new Gemini client with a pooled HTTP transport.
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(TriageError::Config(
                "No API key configured. Set GEMINI_API_KEY in the environment.".to_string(),
            ));
        }

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .tcp_nodelay(true)
            .use_rustls_tls()
            .build()
            .map_err(|e| TriageError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        debug!("Created HTTP client with connection pooling and keep-alive");

        Ok(Self {
            http_client,
            config: config.clone(),
        })
    }

    /// Get the configured model name
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Get the API base URL
    pub fn base_url(&self) -> &str {
        &self.config.api_base_url
    }

    /// Call `generateContent` with a fixed instruction, one user part, and a
    /// required JSON response schema. Returns the raw reply text of the first
    /// candidate; binding happens at the caller.
    pub async fn generate(
        &self,
        system_instruction: &str,
        part: Part,
        response_schema: &Value,
        temperature: f32,
    ) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![part],
            }],
            system_instruction: Some(SystemInstruction {
                parts: vec![Part::Text {
                    text: system_instruction.to_string(),
                }],
            }),
            generation_config: Some(GenerationConfig {
                temperature: Some(temperature),
                max_output_tokens: Some(8192),
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(response_schema.clone()),
            }),
        };

        let url = self.generate_url();
        debug!("Calling generateContent API for model: {}", self.config.model);

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| TriageError::Upstream(format!("HTTP error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let error_msg =
                Self::extract_error_message(&error_text).unwrap_or_else(|| error_text.clone());
            // Upstream error bodies can echo request details, key included.
            error!(
                "Gemini API error: HTTP {} - {}",
                status,
                logging::sanitize(&error_msg)
            );
            return Err(TriageError::Upstream(format!("HTTP {}: {}", status, error_msg)));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| TriageError::Upstream(format!("Failed to read response body: {}", e)))?;

        debug!(
            "Raw Gemini response (first 500 chars): {}",
            response_text.chars().take(500).collect::<String>()
        );

        let reply: GenerateContentResponse = serde_json::from_str(&response_text).map_err(|e| {
            error!("Failed to parse Gemini envelope: {}", e);
            TriageError::MalformedReply(format!("envelope parsing error: {}", e))
        })?;

        Ok(reply.reply_text())
    }

    /// Check connectivity to the Gemini API.
    ///
    /// Sends a minimal `generateContent` request ("hi") to verify the endpoint
    /// is reachable and the key is accepted.
    pub async fn check_connectivity(&self) -> Result<Duration> {
        let url = self.generate_url();
        debug!("Checking connectivity via {}", url);

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part::Text {
                    text: "hi".to_string(),
                }],
            }],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                temperature: None,
                max_output_tokens: Some(1),
                response_mime_type: None,
                response_schema: None,
            }),
        };

        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .timeout(Duration::from_secs(5)) // Short timeout for health checks
            .send()
            .await
            .map_err(|e| TriageError::Upstream(format!("Connectivity check failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TriageError::Upstream(format!(
                "API check failed: HTTP {}: {}",
                status, error_text
            )));
        }

        Ok(start.elapsed())
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Extract error message from API response JSON
    fn extract_error_message(response_text: &str) -> Option<String> {
        #[derive(serde::Deserialize)]
        struct ErrorResponse {
            error: Option<ErrorDetail>,
        }

        #[derive(serde::Deserialize)]
        struct ErrorDetail {
            message: Option<String>,
            status: Option<String>,
        }

        if let Ok(error_resp) = serde_json::from_str::<ErrorResponse>(response_text) {
            if let Some(error) = error_resp.error {
                return error.message.or(error.status);
            }
        }
        None
    }
}
