//! Ollama HTTP backend.
//!
//! Uses the non-streaming `/api/generate` endpoint:
//!
//! ```text
//! POST {base_url}/api/generate
//! { "model": "...", "prompt": "...", "system": "...", "stream": false,
//!   "options": { "num_predict": 80, "temperature": 0.0 } }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{GenerationConfig, GenerationParams};
use crate::error::{ModelError, ModelResult};
use crate::TextGenerator;

/// Request body for `/api/generate`.
#[derive(Debug, Serialize)]
pub(crate) struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct GenerateOptions {
    num_predict: u32,
    temperature: f32,
}

/// Response body for a non-streaming `/api/generate` call.
#[derive(Debug, Deserialize)]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Text generator backed by an Ollama server.
#[derive(Debug)]
pub struct OllamaGenerator {
    client: reqwest::blocking::Client,
    endpoint: String,
    model_id: String,
    system_prompt: String,
    defaults: GenerationParams,
}

impl OllamaGenerator {
    /// Build a generator. No network traffic happens until [`TextGenerator::generate`].
    pub fn new(config: &GenerationConfig) -> ModelResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ModelError::InvalidConfig {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/generate", config.base_url.trim_end_matches('/')),
            model_id: config.model_id.clone(),
            system_prompt: config.system_prompt.clone(),
            defaults: config.defaults,
        })
    }

    /// Full URL requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub(crate) fn build_request<'a>(
        &'a self,
        prompt: &'a str,
        params: &GenerationParams,
    ) -> GenerateRequest<'a> {
        let resolved = params.merged_with(&self.defaults).resolved();
        // Greedy decoding has no temperature; Ollama expresses that as 0.
        let temperature = if resolved.do_sample {
            resolved.temperature
        } else {
            0.0
        };

        GenerateRequest {
            model: &self.model_id,
            prompt,
            system: &self.system_prompt,
            stream: false,
            options: GenerateOptions {
                num_predict: resolved.max_new_tokens,
                temperature,
            },
        }
    }

    pub(crate) fn parse_response(&self, body: &str) -> ModelResult<String> {
        let parsed: GenerateResponse = serde_json::from_str(body)
            .map_err(|e| ModelError::invalid_response(&self.model_id, e.to_string()))?;

        if let Some(error) = parsed.error {
            return Err(ModelError::generation_failed(&self.model_id, error));
        }

        parsed
            .response
            .map(|text| text.trim().to_string())
            .ok_or_else(|| ModelError::invalid_response(&self.model_id, "missing `response` field"))
    }
}

impl TextGenerator for OllamaGenerator {
    fn generate(&self, prompt: &str, params: &GenerationParams) -> ModelResult<String> {
        let request = self.build_request(prompt, params);
        tracing::debug!(
            model = %self.model_id,
            num_predict = request.options.num_predict,
            prompt_chars = prompt.len(),
            "Sending generation request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(|e| ModelError::unreachable(&self.endpoint, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| ModelError::invalid_response(&self.model_id, e.to_string()))?;

        if !status.is_success() {
            return Err(ModelError::BadStatus {
                model_id: self.model_id.clone(),
                status: status.as_u16(),
                body,
            });
        }

        self.parse_response(&body)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> OllamaGenerator {
        OllamaGenerator::new(&GenerationConfig::default().with_base_url("http://localhost:11434/"))
            .unwrap()
    }

    #[test]
    fn test_endpoint_normalized() {
        assert_eq!(generator().endpoint(), "http://localhost:11434/api/generate");
    }

    #[test]
    fn test_request_uses_call_params() {
        let gen = generator();
        let params = GenerationParams::new()
            .with_max_new_tokens(180)
            .with_temperature(0.7)
            .with_do_sample(true);
        let request = gen.build_request("hello", &params);

        assert_eq!(
            request.options,
            GenerateOptions {
                num_predict: 180,
                temperature: 0.7
            }
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["prompt"], "hello");
        assert_eq!(json["model"], "tinyllama");
    }

    #[test]
    fn test_greedy_request_sends_zero_temperature() {
        let gen = generator();
        let params = GenerationParams::new().with_temperature(0.1);
        let request = gen.build_request("hello", &params);
        assert_eq!(request.options.temperature, 0.0);
        assert_eq!(request.options.num_predict, 80);
    }

    #[test]
    fn test_parse_response_trims() {
        let text = generator()
            .parse_response(r#"{"model":"tinyllama","response":"  Parses config.\n","done":true}"#)
            .unwrap();
        assert_eq!(text, "Parses config.");
    }

    #[test]
    fn test_parse_response_error_field() {
        let err = generator()
            .parse_response(r#"{"error":"model 'tinyllama' not found"}"#)
            .unwrap_err();
        assert!(matches!(err, ModelError::GenerationFailed { .. }));
    }

    #[test]
    fn test_parse_response_garbage() {
        let err = generator().parse_response("<html>").unwrap_err();
        assert!(matches!(err, ModelError::InvalidResponse { .. }));
    }
}
