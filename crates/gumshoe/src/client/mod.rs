use std::{collections::BTreeMap, path::PathBuf, time::Duration};

use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::{
    builder::{DeviceClientBuilder, DEFAULT_CONTROL_PERSIST},
    paths, pipeline, process, AppSource, ArtifactReport, ArtifactType, CommandOutput,
    DeviceDocuments, DeviceReport, FetchedDocument, GumshoeError, RemoteCommand,
};

/// Runs the fixed forensic commands on a device through the system `ssh` client.
///
/// Commands share one multiplexed ssh session, opened by [`DeviceClient::connect`], so the
/// device password (if any) is asked once. Every artifact operation requires a connection.
#[derive(Debug)]
pub struct DeviceClient {
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) user: String,
    pub(crate) ssh_binary: Option<PathBuf>,
    pub(crate) identity_file: Option<PathBuf>,
    pub(crate) ssh_options: Vec<String>,
    pub(crate) env: BTreeMap<String, String>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) mirror_stderr: bool,
    pub(crate) control_dir: Option<TempDir>,
}

impl DeviceClient {
    pub fn builder(host: impl Into<String>) -> DeviceClientBuilder {
        DeviceClientBuilder::new(host)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    pub fn is_connected(&self) -> bool {
        self.control_dir.is_some()
    }

    /// Starts a backgrounded ssh control master that later commands multiplex through.
    ///
    /// Authentication happens here, once; the master's stdio is not captured so it cannot
    /// keep our pipes open after it forks.
    pub async fn connect(&mut self) -> Result<(), GumshoeError> {
        if self.is_connected() {
            return Ok(());
        }
        let dir = tempfile::Builder::new()
            .prefix("gumshoe-")
            .tempdir()
            .map_err(GumshoeError::ControlDir)?;
        self.control_dir = Some(dir);

        let binary = self.resolve_binary();
        let mut cmd = Command::new(&binary);
        cmd.args(self.master_argv());
        process::apply_env(&mut cmd, &self.env);

        info!(host = %self.host, port = self.port, "opening ssh session");
        let outcome = match process::run_detached(cmd, &binary, self.timeout, self.mirror_stderr)
            .await
        {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(GumshoeError::ConnectFailed {
                destination: self.destination(),
                status,
            }),
            Err(err) => Err(err),
        };
        match outcome {
            Ok(()) => info!(host = %self.host, "ssh session opened"),
            Err(ref err) => {
                warn!(host = %self.host, error = %err, "ssh connection failed");
                self.control_dir = None;
            }
        }
        outcome
    }

    /// Asks the control master to exit. Failures are logged, not returned.
    pub async fn disconnect(&mut self) {
        if !self.is_connected() {
            return;
        }
        let binary = self.resolve_binary();
        let mut cmd = Command::new(&binary);
        cmd.args(self.connection_args(false))
            .arg("-O")
            .arg("exit")
            .arg(self.destination());
        process::apply_env(&mut cmd, &self.env);

        info!(host = %self.host, "closing ssh session");
        match process::run_command(cmd, &binary, self.timeout, false).await {
            Ok(output) if !output.status.success() => {
                debug!(
                    stderr = %output.stderr_lossy(),
                    "ssh control master did not exit cleanly"
                );
            }
            Ok(_) => {}
            Err(err) => debug!(error = %err, "failed to stop ssh control master"),
        }
        self.control_dir = None;
    }

    /// Full ssh argument vector for `command`, excluding the ssh binary itself.
    pub fn ssh_argv(&self, command: &RemoteCommand) -> Vec<String> {
        let mut argv = self.connection_args(false);
        argv.push(self.destination());
        argv.push(command.command_line());
        argv
    }

    fn master_argv(&self) -> Vec<String> {
        let mut argv = self.connection_args(true);
        argv.extend(["-f".to_string(), "-N".to_string(), self.destination()]);
        argv
    }

    fn connection_args(&self, master: bool) -> Vec<String> {
        let mut args = vec!["-p".to_string(), self.port.to_string()];
        if let Some(dir) = self.control_dir.as_ref() {
            args.extend([
                "-o".to_string(),
                format!("ControlPath={}", dir.path().join("%C").display()),
            ]);
            if master {
                args.extend([
                    "-o".to_string(),
                    "ControlMaster=yes".to_string(),
                    "-o".to_string(),
                    format!("ControlPersist={}", DEFAULT_CONTROL_PERSIST.as_secs()),
                ]);
            } else {
                args.extend(["-o".to_string(), "ControlMaster=no".to_string()]);
            }
        }
        if let Some(identity) = self.identity_file.as_ref() {
            args.push("-i".to_string());
            args.push(identity.display().to_string());
        }
        for option in &self.ssh_options {
            args.push("-o".to_string());
            args.push(option.clone());
        }
        args
    }

    fn resolve_binary(&self) -> PathBuf {
        if let Some(b) = self.ssh_binary.as_ref() {
            return b.clone();
        }
        if let Ok(v) = std::env::var("GUMSHOE_SSH_BINARY") {
            if !v.trim().is_empty() {
                return PathBuf::from(v);
            }
        }
        PathBuf::from("ssh")
    }

    async fn execute(&self, command: &RemoteCommand) -> Result<CommandOutput, GumshoeError> {
        if command.program.trim().is_empty() {
            return Err(GumshoeError::InvalidRequest(
                "remote program must not be empty".to_string(),
            ));
        }
        let binary = self.resolve_binary();
        let mut cmd = Command::new(&binary);
        cmd.args(self.ssh_argv(command));
        process::apply_env(&mut cmd, &self.env);

        debug!(host = %self.host, command = %command.command_line(), "running remote command");
        process::run_command(cmd, &binary, self.timeout, self.mirror_stderr).await
    }

    /// Runs `command` and returns its stdout, failing on a non-zero exit.
    pub async fn capture(&self, command: RemoteCommand) -> Result<String, GumshoeError> {
        self.ensure_connected()?;
        let output = self.execute(&command).await?;
        if !output.stderr.is_empty() {
            debug!(
                command = %command.command_line(),
                stderr = %output.stderr_lossy(),
                "remote stderr"
            );
        }
        if !output.status.success() {
            return Err(GumshoeError::NonZeroExit {
                command: command.command_line(),
                status: output.status,
                stderr: output.stderr_lossy(),
            });
        }
        Ok(String::from_utf8(output.stdout)?)
    }

    fn ensure_connected(&self) -> Result<(), GumshoeError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(GumshoeError::NotConnected)
        }
    }

    pub async fn plist_json(&self, path: &str) -> Result<String, GumshoeError> {
        self.capture(RemoteCommand::plist_json(path)).await
    }

    pub async fn trust_status(&self) -> Result<String, GumshoeError> {
        self.capture(RemoteCommand::trust_status()).await
    }

    /// Entry names of a remote directory, one per non-empty `ls` line.
    pub async fn list_dir(&self, dir: &str) -> Result<Vec<String>, GumshoeError> {
        let listing = self.capture(RemoteCommand::list_dir(dir)).await?;
        Ok(listing
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn fetch(&self, identifier: &str, command: RemoteCommand) -> FetchedDocument {
        match self.capture(command).await {
            Ok(text) => FetchedDocument::ok(identifier, text),
            Err(err) => FetchedDocument::failed(identifier, err.to_string()),
        }
    }

    /// Fetches and normalizes one artifact.
    pub async fn collect_artifact(
        &self,
        artifact: ArtifactType,
    ) -> Result<ArtifactReport, GumshoeError> {
        let raw = match (artifact.app_source(), artifact.source_path()) {
            (Some(source), _) => return self.collect_installed_apps(source).await,
            (None, Some(path)) => self.plist_json(path).await?,
            (None, None) => self.trust_status().await?,
        };
        Ok(pipeline::collect(artifact, &raw)?)
    }

    /// Lists `source`'s directory, then fetches one metadata document per entry.
    ///
    /// Only the listing itself can fail the call; per-entry failures become diagnostics.
    pub async fn collect_installed_apps(
        &self,
        source: AppSource,
    ) -> Result<ArtifactReport, GumshoeError> {
        let identifiers = self.list_dir(source.listing_dir()).await?;
        debug!(?source, count = identifiers.len(), "discovered app entries");

        let mut documents = Vec::with_capacity(identifiers.len());
        for identifier in &identifiers {
            let command = RemoteCommand::plist_json(source.document_path(identifier));
            documents.push(self.fetch(identifier, command).await);
        }
        Ok(pipeline::collect_installed_apps(source, documents))
    }

    /// Device summary; only a missing connection is an error.
    pub async fn collect_device_info(&self) -> Result<DeviceReport, GumshoeError> {
        self.ensure_connected()?;
        let documents = DeviceDocuments {
            trust_status: self
                .fetch("otctl status -j", RemoteCommand::trust_status())
                .await,
            system_version: self
                .fetch(
                    paths::SYSTEM_VERSION,
                    RemoteCommand::plist_json(paths::SYSTEM_VERSION),
                )
                .await,
            tv_settings: self
                .fetch(paths::TV_SETTINGS, RemoteCommand::plist_json(paths::TV_SETTINGS))
                .await,
            app_store: self
                .fetch(
                    paths::APP_STORE_DAEMON,
                    RemoteCommand::plist_json(paths::APP_STORE_DAEMON),
                )
                .await,
        };
        Ok(pipeline::collect_device_info(documents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argv_without_session_has_no_control_options() {
        let client = DeviceClient::builder("10.0.0.5")
            .port(2222)
            .user("mobile")
            .identity_file("/keys/atv")
            .ssh_option("StrictHostKeyChecking=no")
            .build();
        let argv = client.ssh_argv(&RemoteCommand::trust_status());
        assert_eq!(
            argv,
            [
                "-p",
                "2222",
                "-i",
                "/keys/atv",
                "-o",
                "StrictHostKeyChecking=no",
                "mobile@10.0.0.5",
                "otctl status -j",
            ]
        );
    }

    #[test]
    fn defaults_match_the_jailbreak_ssh_setup() {
        let client = DeviceClient::builder("192.168.1.151").build();
        assert_eq!(client.port(), 44);
        assert_eq!(client.destination(), "root@192.168.1.151");
        assert!(!client.is_connected());
    }

    #[test]
    fn session_commands_multiplex_through_the_master() {
        let mut client = DeviceClient::builder("10.0.0.5").build();
        client.control_dir = Some(tempfile::tempdir().unwrap());
        let control_path = format!(
            "ControlPath={}",
            client.control_dir.as_ref().unwrap().path().join("%C").display()
        );

        let master = client.master_argv();
        assert!(master.contains(&control_path));
        assert!(master.contains(&"ControlMaster=yes".to_string()));
        assert!(master.contains(&"ControlPersist=300".to_string()));
        assert_eq!(&master[master.len() - 3..], ["-f", "-N", "root@10.0.0.5"]);

        let argv = client.ssh_argv(&RemoteCommand::list_dir("/Applications"));
        assert!(argv.contains(&control_path));
        assert!(argv.contains(&"ControlMaster=no".to_string()));
        assert_eq!(argv.last().unwrap(), "ls /Applications");
    }

    #[tokio::test]
    async fn operations_require_a_session() {
        let client = DeviceClient::builder("192.0.2.1").build();
        let err = client
            .collect_artifact(ArtifactType::WifiHistory)
            .await
            .unwrap_err();
        assert!(matches!(err, GumshoeError::NotConnected));
        assert!(matches!(
            client.collect_device_info().await,
            Err(GumshoeError::NotConnected)
        ));
    }
}
