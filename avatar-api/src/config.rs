use std::{collections::HashMap, path::PathBuf, str::FromStr, time::Duration};

use serde::Deserialize;
use serde_with::serde_as;
use strum::{Display, EnumString};

use crate::domain::models::ImageFormat;

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub images: ImageSettings,
}

#[serde_as]
#[derive(Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    #[serde_as(as = "serde_with::DisplayFromStr")]
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_base_path")]
    pub base_path: String,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

#[derive(Deserialize, Clone, Debug)]
pub struct StorageSettings {
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    #[serde(default = "default_image_path")]
    pub default_image_path: PathBuf,
    #[serde(default = "default_originals_dir")]
    pub originals_dir: PathBuf,
}

#[serde_as]
#[derive(Deserialize, Clone, Debug)]
pub struct ImageSettings {
    #[serde_as(as = "serde_with::DisplayFromStr")]
    #[serde(default = "default_size")]
    pub default_size: u32,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    #[serde(default = "default_max_size")]
    pub max_size: u32,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
    /// Response content types that differ from what the artifact suffix implies.
    #[serde(default = "default_mime_overrides")]
    pub mime_overrides: HashMap<ImageFormat, String>,
    #[serde(default = "default_converter_binary")]
    pub converter_binary: String,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    #[serde(default = "default_convert_timeout_secs")]
    pub convert_timeout_secs: u64,
}

/// The part of the configuration that format/size negotiation depends on.
#[derive(Clone, Debug)]
pub struct NegotiationSettings {
    pub default_size: u32,
    pub max_size: u32,
    pub mime_overrides: HashMap<ImageFormat, String>,
}

impl Settings {
    pub fn negotiation(&self) -> NegotiationSettings {
        NegotiationSettings {
            default_size: self.images.default_size,
            max_size: self.images.max_size,
            mime_overrides: self.images.mime_overrides.clone(),
        }
    }
}

impl ApplicationSettings {
    /// Base path without the trailing slash, as `Router::nest` expects it.
    /// An empty string means the avatar routes live at the root.
    pub fn normalized_base_path(&self) -> String {
        let trimmed = self.base_path.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        }
    }
}

impl ImageSettings {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn convert_timeout(&self) -> Duration {
        Duration::from_secs(self.convert_timeout_secs)
    }
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            base_path: default_base_path(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            default_image_path: default_image_path(),
            originals_dir: default_originals_dir(),
        }
    }
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            default_size: default_size(),
            max_size: default_max_size(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_capacity: default_cache_capacity(),
            mime_overrides: default_mime_overrides(),
            converter_binary: default_converter_binary(),
            convert_timeout_secs: default_convert_timeout_secs(),
        }
    }
}

fn default_port() -> u16 {
    3011
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_base_path() -> String {
    "/u/".to_string()
}

fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("avatar-api")
}

fn default_image_path() -> PathBuf {
    PathBuf::from("data/default-image.jpg")
}

fn default_originals_dir() -> PathBuf {
    PathBuf::from("data/originals")
}

fn default_size() -> u32 {
    32
}

fn default_max_size() -> u32 {
    512
}

fn default_cache_ttl_secs() -> u64 {
    600
}

fn default_cache_capacity() -> u64 {
    10_000
}

fn default_mime_overrides() -> HashMap<ImageFormat, String> {
    HashMap::from([(ImageFormat::Apng, "image/png".to_string())])
}

fn default_converter_binary() -> String {
    "convert".to_string()
}

fn default_convert_timeout_secs() -> u64 {
    30
}

pub fn read_config() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| {
        config::ConfigError::Message(format!("failed to determine the current directory: {e}"))
    })?;
    let config_directory = base_path.join("config");

    let environment = Environment::from_str(
        std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .as_str(),
    )
    .map_err(|e| config::ConfigError::Message(format!("failed to parse APP_ENVIRONMENT: {e}")))?;
    let environment_filename = format!("{}.yaml", environment);

    let settings = config::Config::builder()
        .add_source(config::File::from(config_directory.join("base.yaml")).required(false))
        .add_source(
            config::File::from(config_directory.join(environment_filename)).required(false),
        )
        .add_source(
            config::Environment::with_prefix("AVATAR")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[derive(Display, Debug, EnumString)]
pub enum Environment {
    #[strum(ascii_case_insensitive, serialize = "local")]
    Local,
    #[strum(ascii_case_insensitive, serialize = "production")]
    Production,
}
