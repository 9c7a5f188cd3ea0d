use clap::Subcommand;
use serde_json::json;

use crate::cli::config::{
    load_environment_config, load_server_config, ping_server, save_environment_config,
    save_server_config, ServerInfo, ServerStatus,
};
use crate::cli::utils::{format_table, output_empty_collection, output_success, switch_current_item};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Register a portal server")]
    Add {
        #[arg(help = "Server URL")]
        url: String,
        #[arg(help = "Server name (defaults to the URL host)")]
        name: Option<String>,
        #[arg(long, default_value = "", help = "Free-form description")]
        description: String,
    },

    #[command(about = "List registered servers with last known status")]
    List,

    #[command(about = "Show currently selected server")]
    Current,

    #[command(about = "Switch to server (persistent selection) or show current server")]
    Use {
        #[arg(help = "Server name to switch to")]
        name: Option<String>,
    },

    #[command(about = "Remove server from registry")]
    Delete {
        #[arg(help = "Server name to delete")]
        name: String,
    },

    #[command(about = "Health check specific server (defaults to current server)")]
    Ping {
        #[arg(help = "Server name to ping")]
        name: Option<String>,
    },
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Add { url, name, description } => add(url, name, description, &output_format),
        ServerCommands::List => list(&output_format),
        ServerCommands::Current => current(&output_format),
        ServerCommands::Use { name: Some(name) } => switch_current_item(
            &name,
            "server",
            |n| Ok(load_server_config()?.servers.contains_key(n)),
            |n| {
                let mut env_config = load_environment_config()?;
                env_config.current_server = Some(n.to_string());
                save_environment_config(&env_config)
            },
            &output_format,
        ),
        ServerCommands::Use { name: None } => current(&output_format),
        ServerCommands::Delete { name } => delete(&name, &output_format),
        ServerCommands::Ping { name } => ping(name, &output_format).await,
    }
}

fn add(
    url: String,
    name: Option<String>,
    description: String,
    output_format: &OutputFormat,
) -> anyhow::Result<()> {
    let parsed = url::Url::parse(&url).map_err(|e| anyhow::anyhow!("Invalid server URL '{}': {}", url, e))?;
    let name = match name {
        Some(name) => name,
        None => parsed
            .host_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("Cannot derive a name from '{}'; pass one explicitly", url))?,
    };

    let mut config = load_server_config()?;
    if config.servers.contains_key(&name) {
        anyhow::bail!("Server '{}' already exists", name);
    }
    let info = ServerInfo::new(url, description);
    let stored_url = info.url.clone();
    config.servers.insert(name.clone(), info);
    save_server_config(&config)?;

    // The first server registered becomes the current one.
    let mut env_config = load_environment_config()?;
    if env_config.current_server.is_none() {
        env_config.current_server = Some(name.clone());
        save_environment_config(&env_config)?;
    }

    output_success(
        output_format,
        &format!("Added server '{}' ({})", name, stored_url),
        Some(json!({ "name": name, "url": stored_url })),
    )
}

fn list(output_format: &OutputFormat) -> anyhow::Result<()> {
    let config = load_server_config()?;
    if config.servers.is_empty() {
        return output_empty_collection(output_format, "servers", "No servers registered");
    }
    let current = load_environment_config()?.current_server;

    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "servers": config.servers, "current": current }))?);
        }
        OutputFormat::Text => {
            let titles = ["", "Name", "URL", "Status", "Last ping"].map(String::from);
            let rows: Vec<Vec<String>> = config
                .servers
                .iter()
                .map(|(name, info)| {
                    vec![
                        if current.as_deref() == Some(name) { "*".into() } else { String::new() },
                        name.clone(),
                        info.url.clone(),
                        status_label(info.status).into(),
                        info.last_ping
                            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_else(|| "never".into()),
                    ]
                })
                .collect();
            print!("{}", format_table(&titles, &rows));
        }
    }
    Ok(())
}

fn current(output_format: &OutputFormat) -> anyhow::Result<()> {
    let env_config = load_environment_config()?;
    let Some(name) = env_config.current_server else {
        return output_success(output_format, "No current server set", None);
    };
    let config = load_server_config()?;
    let url = config.servers.get(&name).map(|s| s.url.clone());

    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "name": name, "url": url }))?);
        }
        OutputFormat::Text => match url {
            Some(url) => println!("{} ({})", name, url),
            None => println!("{} (missing from registry)", name),
        },
    }
    Ok(())
}

fn delete(name: &str, output_format: &OutputFormat) -> anyhow::Result<()> {
    let mut config = load_server_config()?;
    if config.servers.remove(name).is_none() {
        anyhow::bail!("Server '{}' not found", name);
    }
    save_server_config(&config)?;

    let mut env_config = load_environment_config()?;
    if env_config.current_server.as_deref() == Some(name) {
        env_config.current_server = None;
        save_environment_config(&env_config)?;
    }

    output_success(output_format, &format!("Deleted server '{}'", name), None)
}

async fn ping(name: Option<String>, output_format: &OutputFormat) -> anyhow::Result<()> {
    let name = match name {
        Some(name) => name,
        None => load_environment_config()?
            .current_server
            .ok_or_else(|| anyhow::anyhow!("No current server set. Use 'flock server use <name>' first"))?,
    };

    let mut config = load_server_config()?;
    let info = config
        .servers
        .get_mut(&name)
        .ok_or_else(|| anyhow::anyhow!("Server '{}' not found", name))?;
    let status = ping_server(info).await;
    info.update_ping(status);
    let url = info.url.clone();
    save_server_config(&config)?;

    output_success(
        output_format,
        &format!("{} ({}) is {}", name, url, status_label(status)),
        Some(json!({ "name": name, "status": status })),
    )
}

fn status_label(status: ServerStatus) -> &'static str {
    match status {
        ServerStatus::Up => "up",
        ServerStatus::Down => "down",
        ServerStatus::Unknown => "unknown",
    }
}
