use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::{
    app::{init_config, load_config, load_config_from, Config},
    chat::ConversationController,
    cli::{clear_sessions, list_sessions, send_message, show_session, Cli, Commands},
    constants::LOG_FILE_NAME,
    generation::{GenerationClient, HttpGenerationClient},
    session::SessionStore,
    storage::FileStorage,
    tui::{run_ui, App, TuiView},
    utils::{init_file_logger, init_logger},
};

/// Main runtime orchestrator
pub struct Orchestrator {
    cli: Cli,
    config: Config,
}

impl Orchestrator {
    /// Create a new orchestrator from CLI args
    pub fn new(cli: Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => load_config_from(path)?,
            None => match load_config() {
                Ok(cfg) => cfg,
                Err(e) => {
                    eprintln!("Failed to load config: {}. Using defaults.", e);
                    Config::default()
                }
            },
        };

        Ok(Self {
            config: apply_overrides(config, &cli),
            cli,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the requested command; returns the process exit code
    pub async fn run(self) -> Result<i32> {
        let command = self.cli.command.clone().unwrap_or(Commands::Chat);

        if command == Commands::Chat {
            return self.run_chat().await;
        }

        init_logger(self.cli.verbose);

        if command == Commands::Init {
            init_config()?;
            return Ok(0);
        }

        let store = self.open_store()?;
        match command {
            Commands::List => list_sessions(&store),
            Commands::Show { id } => show_session(&store, &id),
            Commands::Send {
                message,
                session,
                new,
            } => {
                let client = self.client()?;
                let ok = send_message(store, client, &message, session.as_deref(), new).await?;
                if !ok {
                    return Ok(1);
                }
            }
            Commands::Clear { yes } => {
                clear_sessions(store, self.client()?, yes)?;
            }
            Commands::Chat | Commands::Init => {}
        }

        Ok(0)
    }

    async fn run_chat(&self) -> Result<i32> {
        let data_dir = self.config.storage.resolve_data_dir()?;
        // The TUI owns the terminal, so logs go to a file
        init_file_logger(&data_dir.join(LOG_FILE_NAME), self.cli.verbose)
            .with_context(|| format!("Failed to open log file in {}", data_dir.display()))?;

        let store = self.open_store()?;
        let client = self.client()?;
        info!("Starting chat against {}", self.config.endpoint.url);

        let controller = ConversationController::open(store, client, TuiView::default());
        let app = App::new(
            controller,
            self.config.endpoint.url.clone(),
            self.config.ui.show_history,
            Duration::from_millis(self.config.ui.tick_ms.max(1)),
        );

        run_ui(app).await?;
        Ok(0)
    }

    fn open_store(&self) -> Result<SessionStore> {
        let data_dir = self.config.storage.resolve_data_dir()?;
        let storage = FileStorage::new(&data_dir)
            .with_context(|| format!("Failed to open chat storage at {}", data_dir.display()))?;
        Ok(SessionStore::new(Arc::new(storage)))
    }

    fn client(&self) -> Result<Arc<dyn GenerationClient>> {
        let client = HttpGenerationClient::new(
            self.config.endpoint.url.clone(),
            self.config.endpoint.timeout(),
        )?;
        debug!("Generation endpoint {}", client.endpoint());
        Ok(Arc::new(client))
    }
}

/// Command line flags take precedence over every config source
fn apply_overrides(mut config: Config, cli: &Cli) -> Config {
    if let Some(url) = &cli.endpoint {
        config.endpoint.url = url.clone();
    }
    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir = Some(dir.clone());
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_cli_overrides_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[endpoint]\nurl = \"http://from-file/api/generate\"\ntimeout_secs = 5\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "parley",
            "--config",
            path.to_str().unwrap(),
            "--endpoint",
            "http://from-cli/api/generate",
            "--data-dir",
            "/tmp/chats",
            "list",
        ])
        .unwrap();

        let orchestrator = Orchestrator::new(cli).unwrap();
        let config = orchestrator.config();
        assert_eq!(config.endpoint.url, "http://from-cli/api/generate");
        assert_eq!(config.endpoint.timeout_secs, 5);
        assert_eq!(config.storage.data_dir, Some(PathBuf::from("/tmp/chats")));
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let cli = Cli::try_parse_from(["parley", "--config", "/nonexistent/parley.toml", "list"])
            .unwrap();
        assert!(Orchestrator::new(cli).is_err());
    }

    #[tokio::test]
    async fn test_list_runs_against_data_dir() {
        let temp_dir = TempDir::new().unwrap();
        let cli = Cli::try_parse_from([
            "parley",
            "--data-dir",
            temp_dir.path().to_str().unwrap(),
            "list",
        ])
        .unwrap();

        let code = Orchestrator::new(cli).unwrap().run().await.unwrap();
        assert_eq!(code, 0);
    }
}
