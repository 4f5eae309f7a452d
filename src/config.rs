use std::path::Path;
use std::{env, fmt, fs};

use dotenvy::dotenv;
use error_stack::{IntoReport, Report, ResultExt};
use serde::{Deserialize, Serialize};

/// `AppConfig` holds static configuration values for the application,
/// such as API endpoints shared by every adapter instance.
pub struct AppConfig;

impl AppConfig {
    pub const SPOTIFY_ACCOUNTS_URL: &'static str = "https://accounts.spotify.com/api/token";
    pub const SPOTIFY_API_URL: &'static str = "https://api.spotify.com/v1";
    pub const APPLE_MUSIC_API_URL: &'static str = "https://api.music.apple.com/v1";
    pub const YOUTUBE_MUSIC_API_URL: &'static str = "https://music.youtube.com/youtubei/v1";
    /// Upstream calls used to block indefinitely; every adapter client is
    /// built with this timeout instead.
    pub const HTTP_TIMEOUT_SECS: u64 = 30;
}

#[derive(Debug, Clone)]
pub struct ConfigError;
impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Config error")
    }
}
impl std::error::Error for ConfigError {}

pub type ConfigResult<T> = error_stack::Result<T, ConfigError>;

/// Per-user credentials for the three platforms. Loaded from the config file
/// under `$HOME` when it exists, otherwise from environment variables (a
/// `.env` file in the working directory is honored).
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Credentials {
    #[serde(default)]
    pub spotify_client_id: String,
    #[serde(default)]
    pub spotify_client_secret: String,
    #[serde(default)]
    pub spotify_user_token: String,
    #[serde(default)]
    pub apple_developer_token: String,
    #[serde(default)]
    pub apple_user_token: String,
    #[serde(default)]
    pub apple_storefront: String,
    #[serde(default)]
    pub youtube_auth_file: String,
    #[serde(default)]
    pub export_dir: String,
}

impl Credentials {
    pub fn load() -> ConfigResult<Self> {
        if Self::config_file_exists()? {
            let mut credentials = Self::default();
            credentials.read_config_file()?;
            Ok(credentials)
        } else {
            Self::from_env()
        }
    }

    pub fn from_env() -> ConfigResult<Self> {
        dotenv().ok();
        Ok(Self {
            spotify_client_id: env::var("SPOTIFY_CLIENT_ID").unwrap_or_default(),
            spotify_client_secret: env::var("SPOTIFY_CLIENT_SECRET").unwrap_or_default(),
            spotify_user_token: env::var("SPOTIFY_USER_TOKEN").unwrap_or_default(),
            apple_developer_token: env::var("APPLE_DEVELOPER_TOKEN").unwrap_or_default(),
            apple_user_token: env::var("APPLE_USER_TOKEN").unwrap_or_default(),
            apple_storefront: env::var("APPLE_STOREFRONT").unwrap_or_else(|_| "us".to_string()),
            youtube_auth_file: env::var("YOUTUBE_AUTH_FILE").unwrap_or_default(),
            export_dir: env::var("PLAYSYNC_EXPORT_DIR").unwrap_or_else(|_| ".".to_string()),
        })
    }

    pub fn read_config_file(&mut self) -> ConfigResult<()> {
        let config_path =
            Self::get_config_file_path().attach_printable("Failed to get the config file path")?;
        if !Self::config_file_exists()? {
            return Err(Report::new(ConfigError).attach_printable(format!(
                "Config file not found at: {}. Please create a config file first.",
                config_path
            )));
        }

        let config_content = fs::read_to_string(&config_path)
            .into_report()
            .attach_printable(format!("Failed to read config file at {}", config_path))
            .change_context(ConfigError)?;
        let config: Credentials = serde_json::from_str(&config_content)
            .into_report()
            .attach_printable("Failed to parse the config file. Ensure it is valid JSON.")
            .change_context(ConfigError)?;
        self.clone_from(&config);
        Ok(())
    }

    pub fn save_config_file(&self) -> ConfigResult<()> {
        let serialized = serde_json::to_string_pretty(self)
            .into_report()
            .attach_printable("Failed to serialize the credentials to JSON")
            .change_context(ConfigError)?;
        let config_path =
            Self::get_config_file_path().attach_printable("Failed to get the config file path")?;
        let folder_path = config_path.trim_end_matches("/config.json");
        if !Path::new(folder_path).exists() {
            fs::create_dir(folder_path)
                .into_report()
                .attach_printable(format!("Failed to create directory at {}", folder_path))
                .change_context(ConfigError)?;
        }
        fs::write(config_path.clone(), serialized)
            .into_report()
            .attach_printable(format!("Failed to write config file at {}", config_path))
            .change_context(ConfigError)?;
        Ok(())
    }

    pub fn get_config_file_path() -> ConfigResult<String> {
        env::var("HOME")
            .into_report()
            .attach_printable("Failed to retrieve the HOME environment variable")
            .change_context(ConfigError)
            .map(|home_path| format!("{}/.playsync_config/config.json", home_path))
    }

    pub fn config_file_exists() -> ConfigResult<bool> {
        let config_path =
            Self::get_config_file_path().attach_printable("Failed to get the config file path")?;
        Ok(Path::new(&config_path).exists())
    }
}
