#[cfg(unix)]
mod unix {
    use std::{fs, path::Path, time::Duration};

    use gumshoe::{AppSource, ArtifactType, DeviceClient, GumshoeError, NOT_AVAILABLE};
    use tempfile::TempDir;

    const FAKE_DEVICE: &str = r#"#!/bin/sh
set -eu
printf '%s\n' "$*" >> "$FAKE_SSH_LOG"
for last; do :; done
case " $* " in
  *" -N "*) exit "${FAKE_SSH_MASTER_STATUS:-0}" ;;
  *" -O exit "*) exit 0 ;;
esac
case "$last" in
  "plutil -showjson /private/var/mobile/Library/SyncedPreferences/com.apple.wifid.plist")
    printf '%s\n' '{"values":{"HomeNet":{"value":{"added_by":"iPhone","added_by_os_ver":"16.0","meta":},"timestamp":631152000}}}'
    ;;
  "ls /Applications")
    printf 'TVMusic.app\nBroken.app\n\n'
    ;;
  "plutil -showjson /Applications/TVMusic.app/Info.plist")
    printf '%s\n' '{"CFBundleName":"Music","CFBundleVersion":"1.0","CFBundleIdentifier":"com.apple.TVMusic","UIDeviceFamily":[3,]}'
    ;;
  "plutil -showjson /Applications/Broken.app/Info.plist")
    echo "Broken.app/Info.plist: file does not exist" >&2
    exit 1
    ;;
  "otctl status -j")
    printf '%s\n' '{"contextDump":{"self":{"peerID":"SPID:self","stableInfo":{"serial_number":"DY3XSELF"}}}}'
    ;;
  "plutil -showjson /System/Library/CoreServices/SystemVersion.plist")
    printf '%s\n' '{"ProductName":"Apple TVOS","ProductVersion":"17.1","ProductBuildVersion":"21K69"}'
    ;;
  *)
    echo "unexpected command: $last" >&2
    exit 127
    ;;
esac
"#;

    fn install_fake_ssh(dir: &Path) -> std::path::PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script_path = dir.join("fake-ssh");
        fs::write(&script_path, FAKE_DEVICE).expect("write script");
        let mut perms = fs::metadata(&script_path).expect("metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&script_path, perms).expect("chmod");
        script_path
    }

    fn client(dir: &TempDir) -> DeviceClient {
        let script_path = install_fake_ssh(dir.path());
        DeviceClient::builder("192.0.2.10")
            .ssh_binary(&script_path)
            .env(
                "FAKE_SSH_LOG",
                dir.path().join("ssh.log").display().to_string(),
            )
            .timeout(Some(Duration::from_secs(5)))
            .build()
    }

    fn invocations(dir: &TempDir) -> Vec<String> {
        fs::read_to_string(dir.path().join("ssh.log"))
            .expect("ssh log")
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn session_collects_wifi_and_closes() {
        let dir = TempDir::new().expect("temp dir");
        let mut client = client(&dir);

        client.connect().await.expect("connect");
        assert!(client.is_connected());

        let report = client
            .collect_artifact(ArtifactType::WifiHistory)
            .await
            .expect("wifi report");
        let record = report.records().next().expect("one network");
        assert_eq!(
            record.fields(),
            [
                "HomeNet",
                "iPhone",
                "16.0",
                "Jan 01 2021 00:00:00  (Estimate)"
            ]
        );

        client.disconnect().await;
        assert!(!client.is_connected());

        let log = invocations(&dir);
        assert!(log[0].contains("-N"), "first call opens the master: {log:?}");
        assert!(log[0].contains("ControlMaster=yes"), "{log:?}");
        assert!(log[1].contains("ControlMaster=no"), "{log:?}");
        assert!(log[1].ends_with("root@192.0.2.10 plutil -showjson /private/var/mobile/Library/SyncedPreferences/com.apple.wifid.plist"));
        assert!(log.last().unwrap().contains("-O exit"), "{log:?}");
    }

    #[tokio::test]
    async fn installed_apps_survive_a_failed_fetch() {
        let dir = TempDir::new().expect("temp dir");
        let mut client = client(&dir);
        client.connect().await.expect("connect");

        let report = client
            .collect_installed_apps(AppSource::System)
            .await
            .expect("listing succeeds");
        let rows: Vec<_> = report
            .records()
            .map(|record| record.fields().to_vec())
            .collect();
        assert_eq!(rows, vec![vec!["Music", "1.0", "com.apple.TVMusic"]]);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].subject, "Broken.app");
        assert!(
            report.diagnostics[0].message.contains("file does not exist"),
            "{}",
            report.diagnostics[0]
        );

        client.disconnect().await;
    }

    #[tokio::test]
    async fn device_info_reports_what_answered() {
        let dir = TempDir::new().expect("temp dir");
        let mut client = client(&dir);
        client.connect().await.expect("connect");

        let report = client.collect_device_info().await.expect("device info");
        assert_eq!(report.info.serial_number, "DY3XSELF");
        assert_eq!(report.info.os_version, "Apple TVOS 17.1");
        assert_eq!(report.info.os_build, "21K69");
        assert_eq!(report.info.hardware_model, NOT_AVAILABLE);
        assert_eq!(report.info.device_id, NOT_AVAILABLE);
        assert_eq!(report.diagnostics.len(), 2);

        client.disconnect().await;
    }

    #[tokio::test]
    async fn remote_failure_carries_stderr() {
        let dir = TempDir::new().expect("temp dir");
        let mut client = client(&dir);
        client.connect().await.expect("connect");

        let err = client
            .collect_artifact(ArtifactType::IdentityCache)
            .await
            .unwrap_err();
        match err {
            GumshoeError::NonZeroExit { status, stderr, .. } => {
                assert_eq!(status.code(), Some(127));
                assert!(stderr.contains("unexpected command"), "{stderr}");
            }
            other => panic!("expected NonZeroExit, got {other:?}"),
        }

        client.disconnect().await;
    }

    #[tokio::test]
    async fn mirrored_stderr_keeps_collection_working() {
        let dir = TempDir::new().expect("temp dir");
        let script_path = install_fake_ssh(dir.path());
        let mut client = DeviceClient::builder("192.0.2.10")
            .ssh_binary(&script_path)
            .env(
                "FAKE_SSH_LOG",
                dir.path().join("ssh.log").display().to_string(),
            )
            .timeout(Some(Duration::from_secs(5)))
            .mirror_stderr(true)
            .build();
        client.connect().await.expect("connect");

        let report = client
            .collect_artifact(ArtifactType::WifiHistory)
            .await
            .expect("wifi report");
        assert_eq!(report.records().count(), 1);

        let apps = client
            .collect_installed_apps(AppSource::System)
            .await
            .expect("listing succeeds");
        assert_eq!(apps.records().count(), 1);
        assert!(
            apps.diagnostics[0].message.contains("file does not exist"),
            "{}",
            apps.diagnostics[0]
        );

        client.disconnect().await;
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn failed_authentication_leaves_client_disconnected() {
        let dir = TempDir::new().expect("temp dir");
        let script_path = install_fake_ssh(dir.path());
        let mut client = DeviceClient::builder("192.0.2.10")
            .ssh_binary(&script_path)
            .env(
                "FAKE_SSH_LOG",
                dir.path().join("ssh.log").display().to_string(),
            )
            .env("FAKE_SSH_MASTER_STATUS", "255")
            .timeout(Some(Duration::from_secs(5)))
            .build();

        let err = client.connect().await.unwrap_err();
        assert!(matches!(err, GumshoeError::ConnectFailed { .. }), "{err:?}");
        assert!(!client.is_connected());
        assert!(matches!(
            client.trust_status().await,
            Err(GumshoeError::NotConnected)
        ));
    }
}
