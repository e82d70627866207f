//! Fixed device paths and command templates.
//!
//! Nothing here is parsed; the constants only feed [`crate::RemoteCommand`] construction.

pub const WIFI_SYNC_STATE: &str =
    "/private/var/mobile/Library/SyncedPreferences/com.apple.wifid.plist";
pub const IDENTITY_CACHE: &str =
    "/private/var/mobile/Library/Preferences/com.apple.identityservices.idstatuscache.plist";
pub const LOCATION_CACHE: &str = "/private/var/mobile/Library/SyncedPreferences/com.apple.cloudrecents.CloudRecentsAgent-com.apple.eventkit.locations.plist";
pub const APP_STORE_DAEMON: &str =
    "/private/var/mobile/Library/Preferences/com.apple.appstored.plist";
pub const TV_SETTINGS: &str = "/private/var/mobile/Library/Preferences/com.apple.TVSettings.plist";
pub const SYSTEM_VERSION: &str = "/System/Library/CoreServices/SystemVersion.plist";

/// `APPNAME` is replaced by a bundle folder name listed under [`SYSTEM_APPS_DIR`].
pub const SYSTEM_APP_INFO: &str = "/Applications/APPNAME/Info.plist";
pub const SYSTEM_APPS_DIR: &str = "/Applications";
pub const SYSTEM_APP_PLACEHOLDER: &str = "APPNAME";

/// `UUID` is replaced by a container name listed under [`USER_APPS_DIR`].
pub const USER_APP_METADATA: &str =
    "/private/var/containers/Bundle/Application/UUID/iTunesMetadata.plist";
pub const USER_APPS_DIR: &str = "/private/var/containers/Bundle/Application";
pub const USER_APP_PLACEHOLDER: &str = "UUID";

/// Renders a property list as (quasi-)JSON.
pub const PLIST_JSON_PROGRAM: &str = "plutil";
pub const PLIST_JSON_FLAG: &str = "-showjson";

/// Octagon trust status dump; emits well-formed JSON.
pub const TRUST_STATUS_PROGRAM: &str = "otctl";
pub const TRUST_STATUS_ARGS: [&str; 2] = ["status", "-j"];

pub const LIST_DIR_PROGRAM: &str = "ls";

/// Fills a path template with one directory entry name.
pub fn fill_template(template: &str, placeholder: &str, entry: &str) -> String {
    template.replacen(placeholder, entry, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_sit_under_their_listing_dirs() {
        let system = fill_template(SYSTEM_APP_INFO, SYSTEM_APP_PLACEHOLDER, "TVMusic.app");
        assert_eq!(system, "/Applications/TVMusic.app/Info.plist");
        assert!(system.starts_with(SYSTEM_APPS_DIR));

        let user = fill_template(USER_APP_METADATA, USER_APP_PLACEHOLDER, "0A1B-2C3D");
        assert_eq!(
            user,
            "/private/var/containers/Bundle/Application/0A1B-2C3D/iTunesMetadata.plist"
        );
        assert!(user.starts_with(USER_APPS_DIR));
    }
}
