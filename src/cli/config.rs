use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub url: String,
    pub description: String,
    pub added_at: DateTime<Utc>,
    pub last_ping: Option<DateTime<Utc>>,
    pub status: ServerStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Up,
    Down,
    Unknown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub servers: BTreeMap<String, ServerInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub current_server: Option<String>,
    pub token: Option<String>,
    pub user: Option<String>,
}

impl ServerInfo {
    pub fn new(url: String, description: String) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            description,
            added_at: Utc::now(),
            last_ping: None,
            status: ServerStatus::Unknown,
        }
    }

    pub fn update_ping(&mut self, status: ServerStatus) {
        self.last_ping = Some(Utc::now());
        self.status = status;
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("FLOCK_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("flock").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

fn load_json<T: Default + for<'de> Deserialize<'de>>(file_name: &str) -> anyhow::Result<T> {
    let path = get_config_dir()?.join(file_name);
    if !path.exists() {
        return Ok(T::default());
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn save_json<T: Serialize>(file_name: &str, value: &T) -> anyhow::Result<()> {
    let path = get_config_dir()?.join(file_name);
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

pub fn load_server_config() -> anyhow::Result<ServerConfig> {
    load_json("server.json")
}

pub fn save_server_config(config: &ServerConfig) -> anyhow::Result<()> {
    save_json("server.json", config)
}

pub fn load_environment_config() -> anyhow::Result<EnvironmentConfig> {
    load_json("env.json")
}

pub fn save_environment_config(config: &EnvironmentConfig) -> anyhow::Result<()> {
    save_json("env.json", config)
}

/// URL of the selected portal server.
pub fn current_server_url() -> anyhow::Result<String> {
    let env_config = load_environment_config()?;
    let name = env_config
        .current_server
        .ok_or_else(|| anyhow::anyhow!("No current server set. Use 'flock server use <name>' first"))?;
    let servers = load_server_config()?;
    servers
        .servers
        .get(&name)
        .map(|s| s.url.clone())
        .ok_or_else(|| anyhow::anyhow!("Current server '{}' not found in configuration", name))
}

pub fn current_token() -> anyhow::Result<String> {
    load_environment_config()?
        .token
        .ok_or_else(|| anyhow::anyhow!("Not logged in. Use 'flock auth login --token <jwt>' first"))
}

pub async fn ping_server(server_info: &ServerInfo) -> ServerStatus {
    let client = reqwest::Client::new();
    let url = format!("{}/health", server_info.url);

    match client.get(&url).timeout(std::time::Duration::from_secs(5)).send().await {
        Ok(response) if response.status().is_success() => ServerStatus::Up,
        _ => ServerStatus::Down,
    }
}
