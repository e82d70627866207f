use crate::paths;

/// One command line to run on the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommand {
    pub(crate) program: String,
    pub(crate) args: Vec<String>,
}

impl RemoteCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// `plutil -showjson <path>`
    pub fn plist_json(path: impl Into<String>) -> Self {
        Self::new(paths::PLIST_JSON_PROGRAM)
            .arg(paths::PLIST_JSON_FLAG)
            .arg(path)
    }

    /// `otctl status -j`
    pub fn trust_status() -> Self {
        Self::new(paths::TRUST_STATUS_PROGRAM).args(paths::TRUST_STATUS_ARGS)
    }

    /// `ls <dir>`
    pub fn list_dir(dir: impl Into<String>) -> Self {
        Self::new(paths::LIST_DIR_PROGRAM).arg(dir)
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The command as the remote shell will receive it, with arguments quoted as needed.
    pub fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|word| shell_quote(word))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn is_shell_safe(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
        || matches!(ch, '/' | '.' | '_' | '-' | '+' | ':' | ',' | '@' | '%' | '=')
}

/// Single-quotes `word` for a POSIX shell unless every character is inert.
pub fn shell_quote(word: &str) -> String {
    if !word.is_empty() && word.chars().all(is_shell_safe) {
        return word.to_string();
    }
    format!("'{}'", word.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_commands_render_unquoted() {
        assert_eq!(
            RemoteCommand::plist_json(paths::WIFI_SYNC_STATE).command_line(),
            "plutil -showjson /private/var/mobile/Library/SyncedPreferences/com.apple.wifid.plist"
        );
        assert_eq!(RemoteCommand::trust_status().command_line(), "otctl status -j");
        assert_eq!(
            RemoteCommand::list_dir(paths::SYSTEM_APPS_DIR).command_line(),
            "ls /Applications"
        );
    }

    #[test]
    fn quotes_spaces_and_single_quotes() {
        assert_eq!(shell_quote("TV Provider.app"), "'TV Provider.app'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("$(reboot)"), "'$(reboot)'");
    }
}
