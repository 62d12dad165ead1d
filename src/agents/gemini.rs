use crate::agents::{AudioClip, CompletionClient};
use crate::config::GeminiConfig;
use color_eyre::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Gemini `generateContent` client. One request per call: no retry,
/// no streaming.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.resolve_api_key()?,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    async fn send(&self, parts: Vec<Part>) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
        };

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
            return Err(color_eyre::eyre::eyre!(
                "Gemini request failed ({}): {}",
                status,
                error_message(&body)
            ));
        }

        let payload: GenerateContentResponse = serde_json::from_str(&body)?;
        extract_text(payload)
    }
}

impl CompletionClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "gemini request");
        self.send(vec![Part::Text {
            text: prompt.to_string(),
        }])
        .await
    }

    async fn generate_with_audio(&self, prompt: &str, audio: &AudioClip) -> Result<String> {
        tracing::debug!(
            model = %self.model,
            prompt_chars = prompt.len(),
            mime_type = %audio.mime_type,
            "gemini request with audio"
        );
        self.send(vec![
            Part::Text {
                text: prompt.to_string(),
            },
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: audio.mime_type.clone(),
                    data: audio.data.clone(),
                },
            },
        ])
        .await
    }
}

/// Concatenates the text parts of the first candidate
fn extract_text(payload: GenerateContentResponse) -> Result<String> {
    let text = payload
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(color_eyre::eyre::eyre!(
            "Gemini returned no text in the response candidates"
        ));
    }
    Ok(text)
}

/// Pulls `STATUS: message` out of a Gemini error body, falling back to the raw body
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorWrapper>(body) {
        Ok(wrapper) => {
            let message = wrapper
                .error
                .message
                .unwrap_or_else(|| body.to_string());
            match wrapper.error.status {
                Some(status) if !status.is_empty() => format!("{status}: {message}"),
                _ => message,
            }
        }
        Err(_) => body.to_string(),
    }
}
