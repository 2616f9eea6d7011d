use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GeminiConfig;

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("request to Gemini failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Gemini API error ({status}): {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("could not decode Gemini response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The generative-search collaborator. One call per submission, grounding always on.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GenerateContentResponse, GeminiError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    tools: Vec<Tool>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

// Every level below is optional in the wire format, so every field is an Option.

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    pub candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CandidateContent {
    pub parts: Option<Vec<Part>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Part {
    pub text: Option<String>,
    pub thought: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    pub grounding_chunks: Option<Vec<GroundingChunk>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GroundingChunk {
    pub web: Option<WebChunk>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WebChunk {
    pub title: Option<String>,
    pub uri: Option<String>,
}

impl GenerateContentResponse {
    pub fn first_candidate(&self) -> Option<&Candidate> {
        self.candidates.as_deref().and_then(<[Candidate]>::first)
    }

    /// Text parts of the first candidate joined together, thought parts skipped.
    /// `None` when there is no text part at all.
    pub fn text(&self) -> Option<String> {
        let parts = self
            .first_candidate()
            .and_then(|candidate| candidate.content.as_ref())
            .and_then(|content| content.parts.as_deref())?;

        let mut text = None::<String>;
        for part in parts.iter().filter(|part| part.thought != Some(true)) {
            if let Some(chunk) = part.text.as_deref() {
                text.get_or_insert_with(String::new).push_str(chunk);
            }
        }
        text
    }

    /// `candidates[0].groundingMetadata.groundingChunks`, empty if any level is missing.
    pub fn grounding_chunks(&self) -> &[GroundingChunk] {
        self.first_candidate()
            .and_then(|candidate| candidate.grounding_metadata.as_ref())
            .and_then(|metadata| metadata.grounding_chunks.as_deref())
            .unwrap_or_default()
    }
}

pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn with_config(config: &GeminiConfig, api_key: Option<String>) -> Result<Self, GeminiError> {
        let api_key = api_key.unwrap_or_else(|| {
            log::warn!(
                "No Gemini API key found in ${}; requests will be rejected upstream",
                config.api_key_env
            );
            String::new()
        });

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(GeminiClient {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            client,
        })
    }

    pub fn get_model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl SearchBackend for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<GenerateContentResponse, GeminiError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![RequestPart {
                    text: prompt.to_string(),
                }],
            }],
            tools: vec![Tool {
                google_search: GoogleSearch {},
            }],
        };

        log::debug!("POST {} ({} prompt bytes)", self.endpoint(), prompt.len());

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(GeminiError::Status { status, body });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
