use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use voidcity_core::config::AppConfig;

mod commands;
mod error;

use error::CliError;

#[derive(Parser)]
#[command(name = "voidcity", version)]
#[command(about = "Admin client for the VOID CITY serial catalog", long_about = None)]
struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and store the session token
    ///
    /// The interactive password prompt echoes what is typed. Use
    /// --password-stdin to pipe the password in instead.
    Login {
        #[arg(short, long)]
        username: Option<String>,
        /// Read the password from the first line of stdin
        #[arg(long, requires = "username")]
        password_stdin: bool,
    },
    /// Forget the stored session token
    Logout,
    /// Show the configured API and session state
    Status,
    /// List the public catalog without logging in
    Browse {
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Open an episode's external link in the browser
    Open { episode_id: String },
    /// List serials
    Serials {
        #[arg(short, long)]
        search: Option<String>,
    },
    /// List episodes across serials
    Episodes {
        /// Match against episode titles and serial names
        #[arg(short, long)]
        search: Option<String>,
        /// Serial id, or "all"
        #[arg(long)]
        serial: Option<String>,
    },
    /// Add, edit or delete a serial
    Serial {
        #[command(subcommand)]
        action: SerialAction,
    },
    /// Add, edit or delete an episode
    Episode {
        #[command(subcommand)]
        action: EpisodeAction,
    },
}

#[derive(Subcommand)]
pub enum SerialAction {
    Add(SerialArgs),
    Edit {
        id: String,
        #[command(flatten)]
        fields: SerialArgs,
    },
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum EpisodeAction {
    Add(EpisodeArgs),
    Edit {
        id: String,
        #[command(flatten)]
        fields: EpisodeArgs,
    },
    Delete {
        id: String,
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Args, Default)]
pub struct SerialArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub genre: Option<String>,
    /// active, inactive or completed
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub blog_url: Option<String>,
    /// Cover image to upload
    #[arg(long)]
    pub image: Option<PathBuf>,
}

#[derive(Args, Default)]
pub struct EpisodeArgs {
    /// Owning serial id; defaults to the first serial when adding
    #[arg(long)]
    pub serial: Option<String>,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub episode_no: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub redirect_url: Option<String>,
    #[arg(long)]
    pub duration: Option<String>,
    /// dd/mm/yyyy; defaults to today when adding
    #[arg(long)]
    pub date: Option<String>,
    /// Episode image to upload
    #[arg(long)]
    pub image: Option<PathBuf>,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "voidcity=debug" } else { "voidcity=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(command: Command) -> Result<ExitCode, CliError> {
    let config = AppConfig::load()?;
    tracing::debug!(base_url = %config.api.base_url, "Config loaded");

    match command {
        Command::Login {
            username,
            password_stdin,
        } => commands::auth::login(&config, username, password_stdin).await,
        Command::Logout => commands::auth::logout(&config),
        Command::Status => commands::auth::status(&config),
        Command::Browse { search } => commands::browse::browse(&config, search.as_deref()).await,
        Command::Open { episode_id } => commands::browse::open(&config, &episode_id).await,
        Command::Serials { search } => {
            commands::admin::list_serials(&config, search.as_deref()).await
        }
        Command::Episodes { search, serial } => {
            commands::admin::list_episodes(&config, search.as_deref(), serial.as_deref()).await
        }
        Command::Serial { action } => commands::admin::serial(&config, action).await,
        Command::Episode { action } => commands::admin::episode(&config, action).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_episode_add() {
        let cli = Cli::try_parse_from([
            "voidcity", "episode", "add", "--serial", "s1", "--title", "Pilot", "--episode-no", "1",
        ])
        .unwrap();
        let Command::Episode {
            action: EpisodeAction::Add(fields),
        } = cli.command
        else {
            panic!("expected episode add");
        };
        assert_eq!(fields.serial.as_deref(), Some("s1"));
        assert_eq!(fields.title.as_deref(), Some("Pilot"));
        assert_eq!(fields.episode_no.as_deref(), Some("1"));
    }

    #[test]
    fn test_password_stdin_needs_username() {
        assert!(Cli::try_parse_from(["voidcity", "login", "--password-stdin"]).is_err());
        let cli =
            Cli::try_parse_from(["voidcity", "login", "-u", "admin", "--password-stdin"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Login {
                password_stdin: true,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_serial_delete_with_yes() {
        let cli = Cli::try_parse_from(["voidcity", "-v", "serial", "delete", "s1", "--yes"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Command::Serial {
                action: SerialAction::Delete { yes: true, .. }
            }
        ));
    }
}
