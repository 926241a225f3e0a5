//! Speech synthesis backends.
//!
//! [`Synthesizer`] is the seam between the narration pipeline and the
//! actual speech service. The production backend calls the Google Cloud
//! Text-to-Speech REST endpoint: one JSON request per text chunk, audio
//! returned base64-encoded in the response body.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::{AudioEncoding, AudioOutputConfig, SsmlGender, VoiceConfig};

const SYNTHESIZE_URL: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {status}: {body}")]
    Service {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("audio content is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("response carried no audio content")]
    MissingAudio,
}

/// A speech backend: text chunk in, encoded audio bytes out.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceConfig,
        audio: &AudioOutputConfig,
    ) -> Result<Vec<u8>, SynthesisError>;
}

// --- Wire format of v1/text:synthesize ---

#[derive(Serialize)]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    #[serde(rename = "audioConfig")]
    audio_config: RequestAudioConfig,
}

#[derive(Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    name: &'a str,
    ssml_gender: SsmlGender,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestAudioConfig {
    audio_encoding: AudioEncoding,
    speaking_rate: f32,
}

#[derive(Deserialize)]
struct SynthesizeResponse {
    #[serde(rename = "audioContent")]
    audio_content: Option<String>,
}

/// Google Cloud TTS REST backend, authenticated with an API key.
pub struct GoogleSynthesizer {
    client: Client,
    api_key: String,
}

impl GoogleSynthesizer {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, api_key }
    }
}

#[async_trait]
impl Synthesizer for GoogleSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceConfig,
        audio: &AudioOutputConfig,
    ) -> Result<Vec<u8>, SynthesisError> {
        let request = SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code: &voice.language,
                name: &voice.name,
                ssml_gender: voice.gender,
            },
            audio_config: RequestAudioConfig {
                audio_encoding: audio.encoding,
                speaking_rate: audio.speaking_rate,
            },
        };

        debug!(
            "Synthesizing {} chars with voice '{}'",
            text.chars().count(),
            voice.name
        );

        let response = self
            .client
            .post(SYNTHESIZE_URL)
            .header("X-Goog-Api-Key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Service { status, body });
        }

        let parsed: SynthesizeResponse = response.json().await?;
        let encoded = parsed.audio_content.ok_or(SynthesisError::MissingAudio)?;
        Ok(BASE64.decode(encoded.as_bytes())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_matches_the_wire_format() {
        let request = SynthesizeRequest {
            input: SynthesisInput { text: "Hello" },
            voice: VoiceSelection {
                language_code: "en-US",
                name: "en-US-Wavenet-B",
                ssml_gender: SsmlGender::Male,
            },
            audio_config: RequestAudioConfig {
                audio_encoding: AudioEncoding::Mp3,
                speaking_rate: 1.0,
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["input"]["text"], "Hello");
        assert_eq!(json["voice"]["languageCode"], "en-US");
        assert_eq!(json["voice"]["ssmlGender"], "MALE");
        assert_eq!(json["audioConfig"]["audioEncoding"], "MP3");
        assert_eq!(json["audioConfig"]["speakingRate"], 1.0);
    }

    #[test]
    fn response_audio_content_is_optional() {
        let with: SynthesizeResponse = serde_json::from_str(r#"{"audioContent":"aGk="}"#).unwrap();
        assert_eq!(with.audio_content.as_deref(), Some("aGk="));

        let without: SynthesizeResponse = serde_json::from_str("{}").unwrap();
        assert!(without.audio_content.is_none());
    }
}
