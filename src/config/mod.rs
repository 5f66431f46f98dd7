use std::{env, path::PathBuf, time::Duration};

use anyhow::Result;
use config::{Config as config_config, File as config_file};
use serde::{de, Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::logging;

const CONFIG_FILE_NAME: &str = "appsettings.json";
const DEFAULT_UPDATE_FREQUENCY_MS: u64 = 1000;
const DEFAULT_BASE_CURRENCY: &str = "BTC";

const TICKER_SETTINGS_PATH: &str = "TICKER_SETTINGS_PATH";
const TICKER_API_KEY: &str = "TICKER_API_KEY";
const TICKER_CURRENCY: &str = "TICKER_CURRENCY";
const TICKER_API_URL: &str = "TICKER_API_URL";
const TICKER_UPDATE_FREQUENCY: &str = "TICKER_UPDATE_FREQUENCY";
const TICKER_BASE_CURRENCY: &str = "TICKER_BASE_CURRENCY";
const TICKER_FONT_PATH: &str = "TICKER_FONT_PATH";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing configuration in appsettings.json ({0})")]
    Missing(&'static str),
}

/// Raw settings as they come out of `appsettings.json` and the environment.
#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct Settings {
    #[serde(rename = "ApiKey", alias = "apikey", default)]
    pub api_key: String,
    #[serde(rename = "Currency", alias = "currency", default)]
    pub currency: String,
    #[serde(rename = "ApiUrl", alias = "apiurl", default)]
    pub api_url: String,
    /// 毫秒；數字或數字字串皆可，其餘一律視為未設定
    #[serde(
        rename = "UpdateFrequency",
        alias = "updatefrequency",
        default,
        deserialize_with = "deserialize_frequency"
    )]
    pub update_frequency: Option<u64>,
    #[serde(rename = "BaseCurrency", alias = "basecurrency", default)]
    pub base_currency: Option<String>,
    #[serde(rename = "FontPath", alias = "fontpath", default)]
    pub font_path: Option<String>,
}

/// Settings that passed the startup gate. Only this type can start the ticker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerConfig {
    pub api_key: String,
    pub currency: String,
    pub api_url: String,
    pub update_frequency: Duration,
    pub base_currency: String,
    pub font_path: Option<PathBuf>,
}

impl Settings {
    /// 讀取設定檔，再以 env 覆蓋
    ///
    /// A missing file is not an error: env vars alone may configure the ticker.
    pub fn load() -> Self {
        Self::read(config_path()).override_with_env()
    }

    /// 設定檔壞掉時先在 console 說明原因，再以空設定繼續，交給 validate 擋下
    fn read(path: PathBuf) -> Self {
        match Self::from_file(path.clone()) {
            Ok(settings) => settings,
            Err(why) => {
                let message = format!("I can't read {} because {}", path.display(), why);
                logging::error_file_async(message.clone());
                logging::error_console(message);
                Default::default()
            }
        }
    }

    fn from_file(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            logging::warn_file_async(format!("{} not found", path.display()));
            return Ok(Default::default());
        }

        let settings: Settings = config_config::builder()
            .add_source(config_file::from(path))
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }

    /// 將來至於 env 的設定值覆蓋掉 json 上的設定值
    fn override_with_env(mut self) -> Self {
        if let Ok(api_key) = env::var(TICKER_API_KEY) {
            self.api_key = api_key;
        }

        if let Ok(currency) = env::var(TICKER_CURRENCY) {
            self.currency = currency;
        }

        if let Ok(api_url) = env::var(TICKER_API_URL) {
            self.api_url = api_url;
        }

        if let Ok(frequency) = env::var(TICKER_UPDATE_FREQUENCY) {
            self.update_frequency = parse_frequency(&frequency);
        }

        if let Ok(base) = env::var(TICKER_BASE_CURRENCY) {
            self.base_currency = Some(base);
        }

        if let Ok(font_path) = env::var(TICKER_FONT_PATH) {
            self.font_path = Some(font_path);
        }

        self
    }

    /// The startup gate: every required key must be present and non-empty.
    pub fn validate(self) -> Result<TickerConfig, ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("ApiKey"));
        }

        if self.currency.trim().is_empty() {
            return Err(ConfigError::Missing("Currency"));
        }

        if self.api_url.trim().is_empty() {
            return Err(ConfigError::Missing("ApiUrl"));
        }

        let base_currency = self
            .base_currency
            .filter(|base| !base.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_CURRENCY.to_string());

        Ok(TickerConfig {
            api_key: self.api_key,
            currency: self.currency,
            api_url: self.api_url,
            update_frequency: Duration::from_millis(
                self.update_frequency.unwrap_or(DEFAULT_UPDATE_FREQUENCY_MS),
            ),
            base_currency,
            font_path: self
                .font_path
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

/// Accepts `1500`, `"1500"` or garbage; garbage and negatives fall back to the default.
fn deserialize_frequency<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Float(f64),
        Text(String),
        Other(de::IgnoredAny),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) if n >= 0 => Some(n as u64),
        Some(Raw::Float(f)) if f >= 0.0 && f.fract() == 0.0 => Some(f as u64),
        Some(Raw::Text(s)) => parse_frequency(&s),
        _ => None,
    })
}

fn parse_frequency(s: &str) -> Option<u64> {
    s.trim().parse::<u64>().ok()
}

/// 回傳設定檔的路徑
///
/// `TICKER_SETTINGS_PATH` wins; otherwise the file next to the executable,
/// then the working directory.
fn config_path() -> PathBuf {
    if let Ok(path) = env::var(TICKER_SETTINGS_PATH) {
        return PathBuf::from(path);
    }

    let beside_exe = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(CONFIG_FILE_NAME)));

    match beside_exe {
        Some(path) if path.exists() => path,
        _ => PathBuf::from(CONFIG_FILE_NAME),
    }
}
