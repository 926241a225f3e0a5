//! Configuration management for narrator-rs.
//!
//! Loads config from YAML files in standard locations. Voice and encoding
//! defaults match the Google Cloud TTS free-tier setup the tool was built
//! around.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Voice gender sent to the service. Serialized names match the
/// `SsmlVoiceGender` wire enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SsmlGender {
    Neutral,
    Male,
    Female,
}

/// Output audio container. Serialized names match the `AudioEncoding`
/// wire enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioEncoding {
    Mp3,
    Linear16,
    OggOpus,
}

impl AudioEncoding {
    /// File extension used for artifacts in this encoding.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Linear16 => "wav",
            Self::OggOpus => "ogg",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub language: String,
    pub name: String,
    pub gender: SsmlGender,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            // https://cloud.google.com/text-to-speech/docs/voices
            language: "en-US".into(),
            name: "en-US-Wavenet-B".into(),
            gender: SsmlGender::Male,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioOutputConfig {
    pub encoding: AudioEncoding,
    pub speaking_rate: f32,
}

impl Default for AudioOutputConfig {
    fn default() -> Self {
        Self {
            encoding: AudioEncoding::Mp3,
            speaking_rate: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// Free-tier monthly character budget.
    pub month_char_limit: u64,
    /// Per-request character cap enforced by the service.
    pub request_char_limit: usize,
    /// JSON file tracking characters spent per calendar month.
    pub ledger_file: PathBuf,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            month_char_limit: 1_000_000,
            request_char_limit: 5_000,
            ledger_file: PathBuf::from("usage_statistics.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding source .txt files and narrated output.
    pub data_dir: PathBuf,
    /// File holding the Google Cloud API key.
    pub api_key_file: PathBuf,
    pub voice: VoiceConfig,
    pub audio: AudioOutputConfig,
    pub quota: QuotaConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            api_key_file: PathBuf::from("api_key.txt"),
            voice: VoiceConfig::default(),
            audio: AudioOutputConfig::default(),
            quota: QuotaConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from YAML file.
    ///
    /// Searches standard locations if no path is provided:
    /// 1. ./narrator.yaml
    /// 2. ~/.config/narrator/config.yaml
    /// 3. /etc/narrator/config.yaml
    pub fn load(path: Option<&Path>) -> Self {
        let resolved = path.map(PathBuf::from).or_else(|| {
            let candidates = [
                std::env::current_dir().ok().map(|d| d.join("narrator.yaml")),
                dirs::home_dir().map(|h| h.join(".config/narrator/config.yaml")),
                Some(PathBuf::from("/etc/narrator/config.yaml")),
            ];
            candidates.into_iter().flatten().find(|p| p.exists())
        });

        let Some(config_path) = resolved else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match serde_yml::from_str(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {e}, using defaults", config_path.display());
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}, using defaults", config_path.display());
                Self::default()
            }
        }
    }

    /// API key for the cloud TTS service: the `GOOGLE_TTS_API_KEY`
    /// environment variable, or the contents of `api_key_file`.
    pub fn load_api_key(&self) -> Option<String> {
        if let Ok(key) = std::env::var("GOOGLE_TTS_API_KEY") {
            let key = key.trim().to_string();
            if !key.is_empty() {
                return Some(key);
            }
        }
        std::fs::read_to_string(&self.api_key_file)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_extensions() {
        assert_eq!(AudioEncoding::Mp3.extension(), "mp3");
        assert_eq!(AudioEncoding::Linear16.extension(), "wav");
        assert_eq!(AudioEncoding::OggOpus.extension(), "ogg");
    }

    #[test]
    fn parses_partial_yaml() {
        let config: Config = serde_yml::from_str(
            "voice:\n  language: de-DE\n  name: de-DE-Wavenet-A\nquota:\n  month_char_limit: 500\n",
        )
        .unwrap();
        assert_eq!(config.voice.language, "de-DE");
        assert_eq!(config.quota.month_char_limit, 500);
        // Unset sections keep their defaults
        assert_eq!(config.quota.request_char_limit, 5_000);
        assert_eq!(config.audio.encoding, AudioEncoding::Mp3);
    }

    #[test]
    fn wire_enum_names() {
        assert_eq!(serde_json::to_string(&SsmlGender::Male).unwrap(), "\"MALE\"");
        assert_eq!(
            serde_json::to_string(&AudioEncoding::Linear16).unwrap(),
            "\"LINEAR16\""
        );
        assert_eq!(
            serde_json::to_string(&AudioEncoding::OggOpus).unwrap(),
            "\"OGG_OPUS\""
        );
    }
}
