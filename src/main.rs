use clap::{
    ArgAction, CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use radiosync::{cli, config, error, types::ProviderKind};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize radiosync with a provider
    Auth(AuthOptions),

    /// Mirror station playlists onto provider playlists
    Sync(SyncOptions),

    /// Show managed playlists, cached tracks and token state
    Status,

    /// List the built-in stations
    Stations,

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct AuthOptions {
    /// Provider to authorize
    #[clap(value_enum)]
    provider: ProviderKind,

    /// Delete the stored authorization and authorize again
    #[clap(long)]
    reset: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct SyncOptions {
    /// Station to sync; can be repeated (default: all)
    #[clap(long = "station", action = ArgAction::Append, num_args = 1)]
    stations: Vec<String>,

    /// Provider to sync to; can be repeated (default: all configured)
    #[clap(long = "provider", value_enum, action = ArgAction::Append, num_args = 1)]
    providers: Vec<ProviderKind>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match &cli.command {
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
            return;
        }
        Command::Stations => {
            cli::stations();
            return;
        }
        _ => {}
    }

    let settings = match config::Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => error!("Invalid configuration: {}", e),
    };

    match cli.command {
        Command::Auth(opt) => cli::auth(settings, opt.provider, opt.reset).await,
        Command::Sync(opt) => cli::sync(settings, opt.stations, opt.providers).await,
        Command::Status => cli::status(settings).await,
        Command::Stations | Command::Completions(_) => {}
    }
}
