pub mod gemini;

pub use gemini::GeminiClient;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use color_eyre::{Result, eyre::eyre};
use std::path::Path;

/// A text-completion endpoint. The assistant loop is generic over this so
/// it can run against Gemini or a scripted client.
#[allow(async_fn_in_trait)]
pub trait CompletionClient {
    /// Sends one prompt and returns the raw text completion
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Same as [`generate`](Self::generate) with a recorded voice message attached
    async fn generate_with_audio(&self, prompt: &str, audio: &AudioClip) -> Result<String>;
}

/// Recorded speech sent inline with a prompt
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub mime_type: String,
    /// Base64 of the raw recording
    pub data: String,
}

impl AudioClip {
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: BASE64_STANDARD.encode(bytes),
        }
    }

    /// Reads a recording from disk, inferring the MIME type from its extension
    pub fn from_file(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let mime_type = audio_mime_type(&extension)
            .ok_or_else(|| eyre!("Unsupported audio format: '{}'", path.display()))?;
        let bytes = std::fs::read(path)?;
        if bytes.is_empty() {
            return Err(eyre!("Audio file '{}' is empty", path.display()));
        }
        Ok(Self::from_bytes(mime_type, &bytes))
    }
}

fn audio_mime_type(extension: &str) -> Option<&'static str> {
    match extension {
        "wav" => Some("audio/wav"),
        "mp3" => Some("audio/mp3"),
        "ogg" | "oga" => Some("audio/ogg"),
        "webm" => Some("audio/webm"),
        "flac" => Some("audio/flac"),
        "aac" => Some("audio/aac"),
        "m4a" => Some("audio/mp4"),
        _ => None,
    }
}
