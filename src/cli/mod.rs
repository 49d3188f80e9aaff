use clap::Parser;

use crate::config::AppConfig;

/// Command-line overrides; anything left unset falls back to the environment
#[derive(Debug, Default, Parser)]
#[command(name = "money-manager")]
#[command(about = "Money Manager - users, spending and income over HTTP")]
#[command(version)]
pub struct Args {
    #[arg(long, help = "Address to bind (default 0.0.0.0)")]
    pub host: Option<String>,

    #[arg(long, help = "Port to listen on (default 8080)")]
    pub port: Option<u16>,

    #[arg(long, env = "DATABASE_URL", hide_env_values = true, help = "PostgreSQL connection string")]
    pub database_url: Option<String>,
}

impl Args {
    /// Layer these flags over `config`
    pub fn apply(self, mut config: AppConfig) -> AppConfig {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(url) = self.database_url.filter(|s| !s.trim().is_empty()) {
            config.database.url = Some(url);
        }
        config
    }
}
