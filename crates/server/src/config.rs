use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use server_api::{
    extractor::{DEFAULT_CHAT_COMPLETION_BASE_URL, DEFAULT_CHAT_COMPLETION_MODEL},
    ChatCompletionConfig,
};

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_bind: String,
    pub database_url: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub template_path: PathBuf,
    pub contract_output_path: PathBuf,
    pub static_dir: PathBuf,
    pub templates_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8080".into(),
            database_url: "sqlite://./data/contracts.db".into(),
            openai_api_key: String::new(),
            openai_base_url: DEFAULT_CHAT_COMPLETION_BASE_URL.into(),
            openai_model: DEFAULT_CHAT_COMPLETION_MODEL.into(),
            template_path: "solidity_template.json".into(),
            contract_output_path: "contract.sol".into(),
            static_dir: "static".into(),
            templates_dir: "templates".into(),
        }
    }
}

impl Settings {
    pub fn chat_completion(&self) -> ChatCompletionConfig {
        ChatCompletionConfig {
            base_url: self.openai_base_url.clone(),
            api_key: self.openai_api_key.clone(),
            model: self.openai_model.clone(),
        }
    }
}

/// Defaults, then `server.toml` in the working directory, then the
/// environment. Later layers win.
pub fn load_settings() -> Settings {
    let file_cfg = fs::read_to_string("server.toml")
        .ok()
        .and_then(|raw| toml::from_str::<HashMap<String, String>>(&raw).ok())
        .unwrap_or_default();

    let settings = apply_file_settings(Settings::default(), &file_cfg);
    apply_env_settings(settings, |key| std::env::var(key).ok())
}

pub(crate) fn apply_file_settings(
    mut settings: Settings,
    file_cfg: &HashMap<String, String>,
) -> Settings {
    if let Some(v) = file_cfg.get("bind_addr") {
        settings.server_bind = v.clone();
    }
    if let Some(v) = file_cfg.get("database_url") {
        settings.database_url = v.clone();
    }
    if let Some(v) = file_cfg.get("openai_base_url") {
        settings.openai_base_url = v.clone();
    }
    if let Some(v) = file_cfg.get("openai_model") {
        settings.openai_model = v.clone();
    }
    if let Some(v) = file_cfg.get("template_path") {
        settings.template_path = v.into();
    }
    if let Some(v) = file_cfg.get("contract_output_path") {
        settings.contract_output_path = v.into();
    }
    if let Some(v) = file_cfg.get("static_dir") {
        settings.static_dir = v.into();
    }
    if let Some(v) = file_cfg.get("templates_dir") {
        settings.templates_dir = v.into();
    }
    settings
}

pub(crate) fn apply_env_settings(
    mut settings: Settings,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = env("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    // the API key is only ever read from the environment
    if let Some(v) = env("OPENAI_API_KEY") {
        settings.openai_api_key = v;
    }
    if let Some(v) = env("APP__OPENAI_BASE_URL") {
        settings.openai_base_url = v;
    }
    if let Some(v) = env("APP__OPENAI_MODEL") {
        settings.openai_model = v;
    }

    if let Some(v) = env("APP__TEMPLATE_PATH") {
        settings.template_path = v.into();
    }
    if let Some(v) = env("APP__CONTRACT_OUTPUT_PATH") {
        settings.contract_output_path = v.into();
    }
    if let Some(v) = env("APP__STATIC_DIR") {
        settings.static_dir = v.into();
    }
    if let Some(v) = env("APP__TEMPLATES_DIR") {
        settings.templates_dir = v.into();
    }

    settings
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:") {
        return raw_database_url.to_string();
    }

    // sqlx wants drive-letter paths after a single colon: `sqlite:C:/...`
    if let Some(path) = raw_database_url.strip_prefix("sqlite://") {
        if is_windows_drive_path(path) {
            return format!("sqlite:{}", path.replace('\\', "/"));
        }
        return raw_database_url.to_string();
    }

    if raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    let path = raw_database_url
        .strip_prefix("sqlite:")
        .unwrap_or(raw_database_url)
        .replace('\\', "/");
    if is_windows_drive_path(&path) {
        format!("sqlite:{path}")
    } else {
        format!("sqlite://{path}")
    }
}

fn is_windows_drive_path(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && matches!(bytes.get(2), None | Some(b'/') | Some(b'\\'))
}

fn ensure_parent_dir_exists(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
