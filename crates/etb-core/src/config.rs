use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

/// Typed configuration for the bot.
///
/// Everything comes from environment variables (with `.env` support); the
/// loaded value is passed to components at construction, never read as
/// ambient state afterwards.
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,
    pub spreadsheet_id: String,
    pub google_credentials_json: String,
    pub timezone_offset_hours: i32,

    // Optional blob store; photo uploads are disabled when absent.
    pub cloudinary: Option<CloudinaryConfig>,

    // Transport: long-polling unless a webhook URL is configured.
    pub webhook_url: Option<String>,
    pub port: u16,

    // Runtime constants
    pub http_timeout: Duration,
    pub temp_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        // Required env vars
        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN").and_then(non_empty).ok_or_else(|| {
            Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
        })?;
        let spreadsheet_id = env_str("GOOGLE_SHEETS_KEY").and_then(non_empty).ok_or_else(|| {
            Error::Config("GOOGLE_SHEETS_KEY environment variable is required".to_string())
        })?;
        let google_credentials_json =
            env_str("GOOGLE_CREDENTIALS_JSON").and_then(non_empty).ok_or_else(|| {
                Error::Config("GOOGLE_CREDENTIALS_JSON environment variable is required".to_string())
            })?;

        let timezone_offset_hours = env_i32("TIMEZONE_OFFSET").unwrap_or(3);
        if !(-23..=23).contains(&timezone_offset_hours) {
            return Err(Error::Config(format!(
                "TIMEZONE_OFFSET must be a whole-hour offset between -23 and 23, got {timezone_offset_hours}"
            )));
        }

        // Optional blob store credentials: all three or none.
        let cloudinary = match (
            env_str("CLOUDINARY_CLOUD_NAME").and_then(non_empty),
            env_str("CLOUDINARY_API_KEY").and_then(non_empty),
            env_str("CLOUDINARY_API_SECRET").and_then(non_empty),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudinaryConfig {
                cloud_name,
                api_key,
                api_secret,
            }),
            (None, None, None) => None,
            _ => {
                return Err(Error::Config(
                    "CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET must be set together"
                        .to_string(),
                ))
            }
        };

        let webhook_url = env_str("WEBHOOK_URL").and_then(non_empty);
        let port = env_u16("PORT").unwrap_or(10_000);

        let http_timeout = Duration::from_secs(env_u64("HTTP_TIMEOUT_SECS").unwrap_or(60));
        let temp_dir = PathBuf::from(env_str("TEMP_DIR").unwrap_or("/tmp/etb".to_string()));
        fs::create_dir_all(&temp_dir)?;

        Ok(Self {
            telegram_bot_token,
            spreadsheet_id,
            google_credentials_json,
            timezone_offset_hours,
            cloudinary,
            webhook_url,
            port,
            http_timeout,
            temp_dir,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_i32(key: &str) -> Option<i32> {
    env_str(key).and_then(|s| s.trim().parse::<i32>().ok())
}

fn env_u16(key: &str) -> Option<u16> {
    env_str(key).and_then(|s| s.trim().parse::<u16>().ok())
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
