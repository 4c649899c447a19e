//! Text generation backends.
//!
//! Inference runs in a separate text-generation server; this module only
//! speaks its HTTP protocol (`POST /generate`).

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Sampling settings for one generation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationParams {
    pub do_sample: bool,
    pub temperature: f32,
    pub max_new_tokens: usize,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            do_sample: true,
            temperature: 0.7,
            max_new_tokens: 512,
        }
    }
}

/// A fully prepared prompt.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    /// Prompt text after the chat template.
    pub prompt: &'a str,
    /// The same prompt encoded by the model tokenizer.
    pub input_ids: &'a [u32],
    pub params: &'a GenerationParams,
}

/// One generated continuation, excluding the prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedSequence {
    /// Token ids when the backend reports them.
    pub tokens: Vec<u32>,
    /// Text as rendered by the backend.
    pub text: String,
}

/// Produces continuations for a prompt.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<Vec<GeneratedSequence>, ModelError>;
}

#[derive(Serialize)]
struct TgiRequest<'a> {
    inputs: &'a str,
    parameters: TgiParameters,
}

#[derive(Serialize)]
struct TgiParameters {
    do_sample: bool,
    temperature: f32,
    max_new_tokens: usize,
    details: bool,
    return_full_text: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TgiResponse {
    Single(TgiOutput),
    Batch(Vec<TgiOutput>),
}

#[derive(Deserialize)]
struct TgiOutput {
    generated_text: String,
    #[serde(default)]
    details: Option<TgiDetails>,
}

#[derive(Deserialize)]
struct TgiDetails {
    #[serde(default)]
    tokens: Vec<TgiToken>,
}

#[derive(Deserialize)]
struct TgiToken {
    id: u32,
}

/// Client for a text-generation-inference compatible server.
#[derive(Debug, Clone)]
pub struct TgiGenerator {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl TgiGenerator {
    pub fn new(
        endpoint: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ModelError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl TextGenerator for TgiGenerator {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<Vec<GeneratedSequence>, ModelError> {
        let body = TgiRequest {
            inputs: request.prompt,
            parameters: TgiParameters {
                do_sample: request.params.do_sample,
                temperature: request.params.temperature,
                max_new_tokens: request.params.max_new_tokens,
                details: true,
                return_full_text: false,
            },
        };

        let url = format!("{}/generate", self.endpoint);
        tracing::debug!(
            target: "model",
            "POST {url} ({} prompt tokens, max_new_tokens={})",
            request.input_ids.len(),
            request.params.max_new_tokens
        );

        let mut req_builder = self.client.post(&url).json(&body);
        if let Some(ref token) = self.token {
            req_builder = req_builder.bearer_auth(token);
        }

        let response = req_builder.send()?;
        let status = response.status().as_u16();
        let text = response.text()?;

        if !(200..300).contains(&status) {
            return Err(ModelError::Server { status, body: text });
        }

        parse_response(&text)
    }
}

/// Decode a `/generate` response body.
pub fn parse_response(body: &str) -> Result<Vec<GeneratedSequence>, ModelError> {
    let response: TgiResponse =
        serde_json::from_str(body).map_err(|e| ModelError::Server {
            status: 200,
            body: format!("unexpected response ({e}): {body}"),
        })?;

    let outputs = match response {
        TgiResponse::Single(output) => vec![output],
        TgiResponse::Batch(outputs) => outputs,
    };

    if outputs.is_empty() {
        return Err(ModelError::EmptyGeneration);
    }

    Ok(outputs
        .into_iter()
        .map(|output| GeneratedSequence {
            tokens: output
                .details
                .map(|d| d.tokens.into_iter().map(|t| t.id).collect())
                .unwrap_or_default(),
            text: output.generated_text,
        })
        .collect())
}
