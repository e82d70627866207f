//! Interactive numbered menu over one device session.

use std::io::{self, Write};

use gumshoe::{ArtifactType, DeviceClient};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::info;

use crate::{
    collect::{self, Target},
    connection::ConnectionArgs,
    error::CliError,
    render::{self, OutputFormat},
};

type Input = Lines<BufReader<Stdin>>;

const BANNER: &str = "ATV Gumshoe: Apple TV logical forensic tool (jailbroken devices)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Exit,
    Connect,
    Collect(&'static [Target]),
}

const DEVICE_INFO: &[Target] = &[Target::DeviceInfo];
const TRUST_PEERS: &[Target] = &[Target::Artifact(ArtifactType::TrustPeers)];
const WIFI: &[Target] = &[Target::Artifact(ArtifactType::WifiHistory)];
const IDS: &[Target] = &[Target::Artifact(ArtifactType::IdentityCache)];
const LOCATIONS: &[Target] = &[Target::Artifact(ArtifactType::LocationHistory)];
const APPS: &[Target] = &[
    Target::Artifact(ArtifactType::InstalledAppsApple),
    Target::Artifact(ArtifactType::InstalledAppsUser),
];

fn parse_choice(input: &str) -> Option<Choice> {
    let choice = match input.trim() {
        "0" => Choice::Exit,
        "1" => Choice::Connect,
        "2" => Choice::Collect(DEVICE_INFO),
        "3" => Choice::Collect(TRUST_PEERS),
        "4" => Choice::Collect(WIFI),
        "5" => Choice::Collect(IDS),
        "6" => Choice::Collect(LOCATIONS),
        "7" => Choice::Collect(APPS),
        _ => return None,
    };
    Some(choice)
}

struct Menu {
    connection: ConnectionArgs,
    format: OutputFormat,
    client: Option<DeviceClient>,
}

pub async fn run(connection: ConnectionArgs, format: OutputFormat) -> Result<(), CliError> {
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut menu = Menu {
        connection,
        format,
        client: None,
    };

    loop {
        menu.print_options()?;
        let Some(line) = prompt(&mut input, "\nEnter your choice : ").await? else {
            break;
        };
        match parse_choice(&line) {
            Some(Choice::Exit) => break,
            Some(Choice::Connect) => menu.connect(&mut input).await?,
            Some(Choice::Collect(targets)) => menu.collect(targets).await?,
            None => println!("Unknown option {:?}.", line.trim()),
        }
    }

    if let Some(mut client) = menu.client.take() {
        info!(host = %client.host(), "closing ssh session");
        client.disconnect().await;
    }
    println!("Bye!");
    Ok(())
}

/// Prints `text` without a newline and reads one line; `None` at end of input.
async fn prompt(input: &mut Input, text: &str) -> Result<Option<String>, CliError> {
    print!("{text}");
    io::stdout().flush()?;
    Ok(input.next_line().await?)
}

/// Like [`prompt`], but an empty answer keeps `default`.
async fn prompt_default(
    input: &mut Input,
    label: &str,
    default: &str,
) -> Result<Option<String>, CliError> {
    let answer = prompt(input, &format!("{label} [{default}]: ")).await?;
    Ok(answer.map(|line| {
        let line = line.trim();
        if line.is_empty() {
            default.to_string()
        } else {
            line.to_string()
        }
    }))
}

impl Menu {
    fn connected(&self) -> Option<&DeviceClient> {
        self.client.as_ref().filter(|client| client.is_connected())
    }

    fn print_options(&self) -> Result<(), CliError> {
        let mut out = io::stdout().lock();
        writeln!(out, "\n{BANNER}\n")?;
        writeln!(out, "Please select an option")?;
        match self.connected() {
            Some(client) => writeln!(
                out,
                "\t1 : Connect (Already connected to {}:{})",
                client.host(),
                client.port()
            )?,
            None => writeln!(out, "\t1 : Connect")?,
        }
        writeln!(out, "\t2 : Device Info")?;
        writeln!(out, "\t3 : Keychain Trusted Peers")?;
        writeln!(out, "\t4 : User Wifi information")?;
        writeln!(out, "\t5 : User ID information")?;
        writeln!(out, "\t6 : User Location History")?;
        writeln!(out, "\t7 : Installed Applications")?;
        writeln!(out, "\t0 : Exit")?;
        Ok(())
    }

    async fn connect(&mut self, input: &mut Input) -> Result<(), CliError> {
        let Some(host) = prompt_default(input, "Apple TV IP address", &self.connection.host).await?
        else {
            return Ok(());
        };
        let port_default = self.connection.port.to_string();
        let Some(port) = prompt_default(input, "Apple TV ssh port", &port_default).await? else {
            return Ok(());
        };
        let Some(user) = prompt_default(input, "Apple TV username", &self.connection.user).await?
        else {
            return Ok(());
        };
        let Ok(port) = port.parse::<u16>() else {
            println!("Invalid port {port:?}.");
            return Ok(());
        };

        if let Some(mut previous) = self.client.take() {
            previous.disconnect().await;
        }
        self.connection.host = host;
        self.connection.port = port;
        self.connection.user = user;

        match self.connection.connect().await {
            Ok(client) => {
                println!("ssh connection to {} opened.", client.host());
                self.client = Some(client);
            }
            Err(err) => println!("ssh connection failed: {err}"),
        }
        Ok(())
    }

    async fn collect(&self, targets: &[Target]) -> Result<(), CliError> {
        let Some(client) = self.connected() else {
            println!("No device connected.");
            return Ok(());
        };
        let gathered = collect::gather(client, targets).await;
        render::print(&gathered.output, self.format)?;
        for (target, err) in &gathered.failures {
            println!("Getting {target} failed: {err}");
        }
        Ok(())
    }
}
