use std::{collections::BTreeMap, path::PathBuf, time::Duration};

use crate::client::DeviceClient;

pub const DEFAULT_PORT: u16 = 44;
pub const DEFAULT_USER: &str = "root";
/// How long the ssh control master lingers after the last command.
pub const DEFAULT_CONTROL_PERSIST: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct DeviceClientBuilder {
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) user: String,
    pub(crate) ssh_binary: Option<PathBuf>,
    pub(crate) identity_file: Option<PathBuf>,
    pub(crate) ssh_options: Vec<String>,
    pub(crate) env: BTreeMap<String, String>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) mirror_stderr: bool,
}

impl DeviceClientBuilder {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            user: DEFAULT_USER.to_string(),
            ssh_binary: None,
            identity_file: None,
            ssh_options: Vec::new(),
            env: BTreeMap::new(),
            timeout: Some(Duration::from_secs(60)),
            mirror_stderr: false,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Overrides the `ssh` client; otherwise `GUMSHOE_SSH_BINARY` or `ssh` on `PATH`.
    pub fn ssh_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.ssh_binary = Some(binary.into());
        self
    }

    pub fn identity_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.identity_file = Some(path.into());
        self
    }

    /// Extra `-o key=value` option passed to every ssh invocation.
    pub fn ssh_option(mut self, option: impl Into<String>) -> Self {
        self.ssh_options.push(option.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Per-command timeout; `None` waits indefinitely.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Echo remote stderr to the local terminal while capturing it.
    pub fn mirror_stderr(mut self, enabled: bool) -> Self {
        self.mirror_stderr = enabled;
        self
    }

    pub fn build(self) -> DeviceClient {
        DeviceClient {
            host: self.host,
            port: self.port,
            user: self.user,
            ssh_binary: self.ssh_binary,
            identity_file: self.identity_file,
            ssh_options: self.ssh_options,
            env: self.env,
            timeout: self.timeout,
            mirror_stderr: self.mirror_stderr,
            control_dir: None,
        }
    }
}
