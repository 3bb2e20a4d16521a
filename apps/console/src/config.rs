use std::collections::HashMap;
use std::fs;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub api_url: String,
    pub credentials_path: String,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:5000".into(),
            credentials_path: "./data/credentials.json".into(),
            request_timeout_secs: 10,
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("client.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("api_url") {
                settings.api_url = v.clone();
            }
            if let Some(v) = file_cfg.get("credentials_path") {
                settings.credentials_path = v.clone();
            }
            if let Some(v) = file_cfg.get("request_timeout_secs") {
                if let Ok(parsed) = v.parse::<u64>() {
                    settings.request_timeout_secs = parsed;
                }
            }
        }
    }

    if let Ok(v) = std::env::var("API_URL") {
        settings.api_url = v;
    }
    if let Ok(v) = std::env::var("APP__API_URL") {
        settings.api_url = v;
    }

    if let Ok(v) = std::env::var("APP__CREDENTIALS_PATH") {
        settings.credentials_path = v;
    }

    if let Ok(v) = std::env::var("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }

    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_a_local_service() {
        let settings = Settings::default();
        assert_eq!(settings.api_url, "http://127.0.0.1:5000");
        assert_eq!(settings.request_timeout_secs, 10);
    }
}
