use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::errors::{AppError, Result};

const DEFAULT_CONFIG_PATH: &str = "config/prompt_forge.toml";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_CHAT_MODEL: &str = "gpt-4";
const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";
const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub chat_model: String,
    pub image_model: String,
    /// `None` leaves the HTTP client's own default in place.
    pub request_timeout: Option<Duration>,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub openai: OpenAiConfig,
    pub artifacts_dir: PathBuf,
}

impl AppConfig {
    /// Layers the optional TOML file, `PROMPT_FORGE__*` variables and the
    /// usual `OPENAI_*` variables, later layers winning. An explicit
    /// `config_path` must exist; the default location may be absent.
    pub fn load(config_path: Option<&Path>, api_key_override: Option<String>) -> Result<Self> {
        Ok(Self::resolve(
            read_layers(config_path)?,
            |key| env::var(key).ok(),
            api_key_override,
        ))
    }

    fn resolve(
        file_config: FileConfig,
        lookup_env: impl Fn(&str) -> Option<String>,
        api_key_override: Option<String>,
    ) -> Self {
        let openai = file_config.openai.unwrap_or_default();

        let api_key = api_key_override
            .or_else(|| lookup_env("OPENAI_API_KEY"))
            .or(openai.api_key)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        let base_url = lookup_env("OPENAI_BASE_URL")
            .or(openai.base_url)
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let artifacts_dir = file_config
            .artifacts_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACTS_DIR));

        Self {
            openai: OpenAiConfig {
                api_key,
                base_url,
                chat_model: openai
                    .chat_model
                    .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
                image_model: openai
                    .image_model
                    .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
                request_timeout: openai
                    .request_timeout_seconds
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs),
            },
            artifacts_dir,
        }
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.openai
            .api_key
            .as_deref()
            .ok_or(AppError::MissingConfig(
                "openai.api_key (set OPENAI_API_KEY or pass --api-key)",
            ))
    }
}

fn read_layers(config_path: Option<&Path>) -> Result<FileConfig> {
    let (path, required) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (
            env::var("PROMPT_FORGE_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH)),
            false,
        ),
    };

    let file_config = Config::builder()
        .add_source(
            File::from(path.as_path())
                .format(FileFormat::Toml)
                .required(required),
        )
        .add_source(
            Environment::with_prefix("PROMPT_FORGE")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?
        .try_deserialize()?;
    Ok(file_config)
}

#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    artifacts_dir: Option<String>,
    #[serde(default)]
    openai: Option<FileOpenAiConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct FileOpenAiConfig {
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    chat_model: Option<String>,
    #[serde(default)]
    image_model: Option<String>,
    #[serde(default)]
    request_timeout_seconds: Option<u64>,
}
