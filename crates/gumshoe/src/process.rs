use std::{
    collections::BTreeMap,
    io,
    path::Path,
    process::ExitStatus,
    time::Duration,
};

use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWriteExt},
    process::Command,
    time,
};

use crate::GumshoeError;

/// Everything a remote command wrote, captured in full.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    /// Kept for diagnostics only; never parsed for data.
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// Buffers `reader` to the end, optionally echoing each chunk to our stderr.
pub(crate) async fn tee_stream<R>(mut reader: R, mirror_stderr: bool) -> Result<Vec<u8>, io::Error>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        if mirror_stderr {
            let mut out = tokio::io::stderr();
            out.write_all(&chunk[..n]).await?;
            out.flush().await?;
        }
        buffer.extend_from_slice(&chunk[..n]);
    }
    Ok(buffer)
}

pub(crate) fn spawn_with_retry(
    command: &mut Command,
    binary: &Path,
) -> Result<tokio::process::Child, GumshoeError> {
    let mut backoff = Duration::from_millis(2);
    for attempt in 0..5 {
        match command.spawn() {
            Ok(child) => return Ok(child),
            Err(source) => {
                let is_busy = matches!(source.kind(), std::io::ErrorKind::ExecutableFileBusy)
                    || source.raw_os_error() == Some(26);
                if is_busy && attempt < 4 {
                    std::thread::sleep(backoff);
                    backoff = std::cmp::min(backoff * 2, Duration::from_millis(50));
                    continue;
                }
                return Err(GumshoeError::Spawn {
                    binary: binary.to_path_buf(),
                    source,
                });
            }
        }
    }

    unreachable!("spawn_with_retry should return before exhausting retries")
}

pub(crate) async fn run_command(
    mut command: Command,
    binary: &Path,
    timeout: Option<Duration>,
    mirror_stderr: bool,
) -> Result<CommandOutput, GumshoeError> {
    command.stdin(std::process::Stdio::null());
    command.stdout(std::process::Stdio::piped());
    command.stderr(std::process::Stdio::piped());
    command.kill_on_drop(true);

    let mut child = spawn_with_retry(&mut command, binary)?;

    let stdout = child.stdout.take().ok_or(GumshoeError::MissingStdout)?;
    let stderr = child.stderr.take().ok_or(GumshoeError::MissingStderr)?;

    let stdout_task = tokio::spawn(tee_stream(stdout, false));
    let stderr_task = tokio::spawn(tee_stream(stderr, mirror_stderr));

    let wait_fut = child.wait();
    let status = if let Some(dur) = timeout {
        time::timeout(dur, wait_fut)
            .await
            .map_err(|_| GumshoeError::Timeout { timeout: dur })?
            .map_err(GumshoeError::Wait)?
    } else {
        wait_fut.await.map_err(GumshoeError::Wait)?
    };

    let stdout = stdout_task
        .await
        .map_err(|e| GumshoeError::Join(e.to_string()))?
        .map_err(GumshoeError::StdoutRead)?;
    let stderr = stderr_task
        .await
        .map_err(|e| GumshoeError::Join(e.to_string()))?
        .map_err(GumshoeError::StderrRead)?;

    Ok(CommandOutput {
        status,
        stdout,
        stderr,
    })
}

/// Waits for a command whose output is not captured, such as an ssh master that forks into
/// the background and would otherwise hold our pipes open.
pub(crate) async fn run_detached(
    mut command: Command,
    binary: &Path,
    timeout: Option<Duration>,
    mirror_stderr: bool,
) -> Result<ExitStatus, GumshoeError> {
    command.stdin(std::process::Stdio::null());
    command.stdout(std::process::Stdio::null());
    if mirror_stderr {
        command.stderr(std::process::Stdio::inherit());
    } else {
        command.stderr(std::process::Stdio::null());
    }
    command.kill_on_drop(true);

    let mut child = spawn_with_retry(&mut command, binary)?;
    let wait_fut = child.wait();
    match timeout {
        Some(dur) => time::timeout(dur, wait_fut)
            .await
            .map_err(|_| GumshoeError::Timeout { timeout: dur })?
            .map_err(GumshoeError::Wait),
        None => wait_fut.await.map_err(GumshoeError::Wait),
    }
}

pub(crate) fn apply_env(command: &mut Command, env: &BTreeMap<String, String>) {
    for (k, v) in env {
        command.env(k, v);
    }
}
