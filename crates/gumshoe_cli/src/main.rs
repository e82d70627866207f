mod collect;
mod connection;
mod error;
mod menu;
mod parse;
mod render;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use gumshoe::ArtifactType;
use tracing_subscriber::EnvFilter;

use crate::{
    collect::{AppsArgs, Target},
    connection::ConnectionArgs,
    error::CliError,
    render::OutputFormat,
};

#[derive(Debug, Parser)]
#[command(name = "atv-gumshoe", version)]
#[command(about = "Logical forensic collection for jailbroken Apple TV devices")]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    format: OutputFormat,

    /// Log debug detail to stderr. `RUST_LOG` takes precedence.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serial number, hardware model, OS version and build, device ID.
    DeviceInfo,
    /// Keychain trust circle: this device, trusted peers, excluded peers.
    TrustPeers,
    /// Wi-Fi networks synced to the device.
    Wifi,
    /// Apple IDs, phone numbers and e-mail addresses from the identity-services cache.
    Ids,
    /// Recently used locations.
    Locations,
    /// Installed applications.
    Apps(AppsArgs),
    /// Every artifact in one session.
    All,
    /// Interactive numbered menu.
    Menu,
    /// Run the normalization pipeline on captured output offline.
    Parse(parse::ParseArgs),
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "error" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let single = |artifact| vec![Target::Artifact(artifact)];
    let targets = match &cli.command {
        Command::Menu => return menu::run(cli.connection, cli.format).await,
        Command::Parse(args) => return parse::run(args, cli.format).await,
        Command::DeviceInfo => vec![Target::DeviceInfo],
        Command::TrustPeers => single(ArtifactType::TrustPeers),
        Command::Wifi => single(ArtifactType::WifiHistory),
        Command::Ids => single(ArtifactType::IdentityCache),
        Command::Locations => single(ArtifactType::LocationHistory),
        Command::Apps(args) => args.targets(),
        Command::All => collect::everything(),
    };
    collect::run(&cli.connection, cli.format, &targets).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
