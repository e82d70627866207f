use std::{path::PathBuf, time::Duration};

use clap::Args;
use gumshoe::{DeviceClient, DeviceClientBuilder, DEFAULT_PORT, DEFAULT_USER};

use crate::error::CliError;

pub const DEFAULT_HOST: &str = "192.168.1.151";

/// How to reach the device's ssh daemon.
#[derive(Debug, Clone, Args)]
pub struct ConnectionArgs {
    /// Apple TV IP address or hostname.
    #[arg(long, env = "GUMSHOE_HOST", default_value = DEFAULT_HOST, global = true)]
    pub host: String,

    /// ssh port on the device.
    #[arg(long, env = "GUMSHOE_PORT", default_value_t = DEFAULT_PORT, global = true)]
    pub port: u16,

    #[arg(long, env = "GUMSHOE_USER", default_value = DEFAULT_USER, global = true)]
    pub user: String,

    /// Private key passed to ssh with `-i`.
    #[arg(long, global = true)]
    pub identity: Option<PathBuf>,

    /// ssh client to run (otherwise `GUMSHOE_SSH_BINARY`, then `ssh` on PATH).
    #[arg(long, global = true)]
    pub ssh_binary: Option<PathBuf>,

    /// Extra `-o key=value` ssh option; repeatable.
    #[arg(long = "ssh-option", value_name = "KEY=VALUE", global = true)]
    pub ssh_options: Vec<String>,

    /// Per-command timeout in seconds; 0 waits indefinitely.
    #[arg(long, default_value_t = 60, global = true)]
    pub timeout_secs: u64,
}

impl ConnectionArgs {
    pub fn builder(&self) -> DeviceClientBuilder {
        let timeout = (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs));
        let mut builder = DeviceClient::builder(self.host.clone())
            .port(self.port)
            .user(self.user.clone())
            .timeout(timeout);
        if let Some(identity) = self.identity.as_ref() {
            builder = builder.identity_file(identity);
        }
        if let Some(binary) = self.ssh_binary.as_ref() {
            builder = builder.ssh_binary(binary);
        }
        for option in &self.ssh_options {
            builder = builder.ssh_option(option.clone());
        }
        builder
    }

    /// Builds a client and opens its ssh session.
    pub async fn connect(&self) -> Result<DeviceClient, CliError> {
        let mut client = self.builder().build();
        client.connect().await?;
        Ok(client)
    }
}
