use clap::Subcommand;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde_json::json;

use crate::auth::{generate_jwt, Claims};
use crate::cli::config::{load_environment_config, save_environment_config};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::config;
use crate::types::{Role, UserScope};

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Mint a portal token signed with the configured secret")]
    Issue {
        #[arg(help = "Subject (user name)")]
        user: String,
        #[arg(long, default_value = "other", help = "Role: admin, pastor, church_pastor, fellowship_leader, cell_leader")]
        role: String,
        #[arg(long, help = "Church id the user belongs to")]
        church: Option<String>,
        #[arg(long, help = "Fellowship id the user belongs to")]
        fellowship: Option<String>,
        #[arg(long, help = "Cell id the user belongs to")]
        cell: Option<String>,
        #[arg(long, help = "Store the token as the current login")]
        login: bool,
    },

    #[command(about = "Store a token for subsequent requests")]
    Login {
        #[arg(long, help = "JWT issued by the portal")]
        token: String,
    },

    #[command(about = "Forget the stored token")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Issue { user, role, church, fellowship, cell, login } => {
            let role: Role = role.parse().unwrap_or(Role::Other);
            let scope = UserScope { church, fellowship, cell };
            let settings = config();
            let claims = Claims::new(user.clone(), role, scope, settings.security.jwt_expiry_hours);
            let token = generate_jwt(&claims, &settings.security.jwt_secret)?;

            if login {
                store_login(&token, &claims)?;
            }

            match output_format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({ "token": token, "claims": claims }))?
                ),
                OutputFormat::Text => println!("{}", token),
            }
            Ok(())
        }
        AuthCommands::Login { token } => {
            let claims = peek_claims(&token)?;
            store_login(&token, &claims)?;
            output_success(
                &output_format,
                &format!("Logged in as {} ({})", claims.sub, claims.role()),
                Some(json!({ "user": claims.sub, "role": claims.role() })),
            )
        }
        AuthCommands::Logout => {
            let mut env_config = load_environment_config()?;
            env_config.token = None;
            env_config.user = None;
            save_environment_config(&env_config)?;
            output_success(&output_format, "Logged out", None)
        }
        AuthCommands::Status => {
            let env_config = load_environment_config()?;
            let Some(token) = env_config.token else {
                return output_success(&output_format, "Not logged in", Some(json!({ "authenticated": false })));
            };
            let claims = peek_claims(&token)?;
            let expired = claims.exp < chrono::Utc::now().timestamp();
            let expires = chrono::DateTime::from_timestamp(claims.exp, 0)
                .map(|t| t.to_rfc3339())
                .unwrap_or_default();

            match output_format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "authenticated": !expired,
                        "expired": expired,
                        "expires_at": expires,
                        "claims": claims,
                    }))?
                ),
                OutputFormat::Text => {
                    println!("user:       {}", claims.sub);
                    println!("role:       {}", claims.role());
                    let scope = claims.scope();
                    for (label, id) in [("church", scope.church), ("fellowship", scope.fellowship), ("cell", scope.cell)] {
                        if let Some(id) = id {
                            println!("{:<12}{}", format!("{}:", label), id);
                        }
                    }
                    println!("expires:    {}{}", expires, if expired { " (expired)" } else { "" });
                }
            }
            Ok(())
        }
    }
}

/// Decode claims without checking the signature; the portal verifies it.
fn peek_claims(token: &str) -> anyhow::Result<Claims> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| anyhow::anyhow!("Token is not a portal JWT: {}", e))?;
    Ok(data.claims)
}

fn store_login(token: &str, claims: &Claims) -> anyhow::Result<()> {
    let mut env_config = load_environment_config()?;
    env_config.token = Some(token.to_string());
    env_config.user = Some(claims.sub.clone());
    save_environment_config(&env_config)
}
