//! Bulk configuration of a command.
//!
//! Settings come from a YAML file, then `CMDRELAY_*` environment variables,
//! then explicit `apply_setting` calls. Every key is bound to a field at
//! compile time; anything else is rejected.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cmdrelay_common::{paths, Locale, Platform};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::CommandError;

/// Environment variables consulted by [`CommandConfig::apply_env`], paired
/// with the setting each one feeds.
pub const ENV_BINDINGS: &[(&str, &str)] = &[
    ("CMDRELAY_COMMAND", "command"),
    ("CMDRELAY_ESCAPE_ARGS", "escape_args"),
    ("CMDRELAY_ESCAPE_COMMAND", "escape_command"),
    ("CMDRELAY_LOCALE", "locale"),
    ("CMDRELAY_PLATFORM", "platform"),
    ("CMDRELAY_TIMEOUT", "timeout"),
    ("CMDRELAY_OUTPUT", "output"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CommandConfig {
    /// Base command: a program path, or the base URL of a conversion service.
    pub command: Option<String>,
    /// Escape argument keys and values unless a call overrides it.
    pub escape_args: bool,
    /// Neutralize shell metacharacters in the base command itself.
    pub escape_command: bool,
    /// Locale applied while escaping.
    pub locale: Option<Locale>,
    /// Target shell family; the host platform when unset.
    pub platform: Option<Platform>,
    /// Advisory timeout in seconds, handed to the transport.
    pub timeout: Option<u64>,
    /// Payload for the command's standard input.
    pub stdin: Option<String>,
    /// File that receives the artifact of a successful execution.
    pub output: Option<PathBuf>,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            command: None,
            escape_args: true,
            escape_command: false,
            locale: None,
            platform: None,
            timeout: None,
            stdin: None,
            output: None,
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl CommandConfig {
    pub fn from_yaml_str(raw: &str) -> Result<Self, CommandError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn load_file(path: &Path) -> Result<Self, CommandError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CommandError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    /// Load `$CMDRELAY_HOME/config.yaml` when present, then apply
    /// environment overrides.
    pub fn load() -> Result<Self, CommandError> {
        let path =
            paths::config_file().map_err(|err| CommandError::ConfigLocation(err.to_string()))?;
        let mut config = if path.exists() {
            debug!(target: "cmdrelay::config", path = %path.display(), "loading config file");
            Self::load_file(&path)?
        } else {
            Self::default()
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Apply every `CMDRELAY_*` variable listed in [`ENV_BINDINGS`] that is
    /// set and non-empty.
    pub fn apply_env(&mut self) -> Result<(), CommandError> {
        for (var, key) in ENV_BINDINGS {
            if let Ok(value) = std::env::var(var) {
                if value.trim().is_empty() {
                    continue;
                }
                self.apply_setting(key, &value)?;
            }
        }
        Ok(())
    }

    /// Apply one named setting.
    ///
    /// Both `snake_case` names and the camelCase spellings used by bulk
    /// option maps (`escapeArgs`, `stdIn`, ...) are accepted.
    pub fn apply_setting(&mut self, key: &str, value: &str) -> Result<(), CommandError> {
        let invalid = || CommandError::InvalidSetting {
            key: key.to_string(),
            value: value.to_string(),
        };
        match key {
            "command" => self.command = non_empty(value),
            "escape_args" | "escapeArgs" => {
                self.escape_args = parse_bool(value).ok_or_else(invalid)?
            }
            "escape_command" | "escapeCommand" => {
                self.escape_command = parse_bool(value).ok_or_else(invalid)?
            }
            "locale" => self.locale = non_empty(value).map(Locale::new),
            "platform" => self.platform = Some(Platform::parse(value).ok_or_else(invalid)?),
            "timeout" => self.timeout = Some(value.trim().parse().map_err(|_| invalid())?),
            "stdin" | "stdIn" => self.stdin = Some(value.to_string()),
            "output" => self.output = non_empty(value).map(PathBuf::from),
            _ => return Err(CommandError::UnknownOption(key.to_string())),
        }
        Ok(())
    }

    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    struct EnvGuard {
        previous: Vec<(String, Option<std::ffi::OsString>)>,
    }

    impl EnvGuard {
        fn set(vars: &[(&str, Option<&str>)]) -> Self {
            let previous = vars
                .iter()
                .map(|(key, _)| (key.to_string(), std::env::var_os(key)))
                .collect::<Vec<_>>();

            for (key, value) in vars {
                match value {
                    Some(v) => std::env::set_var(key, v),
                    None => std::env::remove_var(key),
                }
            }

            Self { previous }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in self.previous.drain(..) {
                match value {
                    Some(v) => std::env::set_var(&key, v),
                    None => std::env::remove_var(&key),
                }
            }
        }
    }

    fn cleared_env<'a>() -> Vec<(&'a str, Option<&'a str>)> {
        ENV_BINDINGS.iter().map(|(var, _)| (*var, None)).collect()
    }

    #[test]
    fn defaults_escape_args_only() {
        let config = CommandConfig::default();
        assert!(config.escape_args);
        assert!(!config.escape_command);
        assert!(config.command.is_none());
        assert!(config.timeout_duration().is_none());
    }

    #[test]
    fn apply_setting_binds_known_keys() {
        let mut config = CommandConfig::default();
        config.apply_setting("command", "http://render:3000").unwrap();
        config.apply_setting("escapeArgs", "no").unwrap();
        config.apply_setting("escape_command", "1").unwrap();
        config.apply_setting("locale", "en_US.UTF-8").unwrap();
        config.apply_setting("platform", "windows").unwrap();
        config.apply_setting("timeout", "30").unwrap();
        config.apply_setting("stdIn", "<html/>").unwrap();
        config.apply_setting("output", "/tmp/out.pdf").unwrap();

        assert_eq!(config.command.as_deref(), Some("http://render:3000"));
        assert!(!config.escape_args);
        assert!(config.escape_command);
        assert_eq!(config.locale, Some(Locale::new("en_US.UTF-8")));
        assert_eq!(config.platform, Some(Platform::Windows));
        assert_eq!(config.timeout_duration(), Some(Duration::from_secs(30)));
        assert_eq!(config.stdin.as_deref(), Some("<html/>"));
        assert_eq!(config.output, Some(PathBuf::from("/tmp/out.pdf")));
    }

    #[test]
    fn unknown_setting_is_rejected() {
        let mut config = CommandConfig::default();
        let err = config.apply_setting("procEnv", "x").unwrap_err();
        assert!(matches!(err, CommandError::UnknownOption(ref key) if key == "procEnv"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut config = CommandConfig::default();
        assert!(matches!(
            config.apply_setting("timeout", "soon"),
            Err(CommandError::InvalidSetting { .. })
        ));
        assert!(matches!(
            config.apply_setting("escapeArgs", "maybe"),
            Err(CommandError::InvalidSetting { .. })
        ));
        assert!(matches!(
            config.apply_setting("platform", "amiga"),
            Err(CommandError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn yaml_rejects_unknown_fields() {
        let config = CommandConfig::from_yaml_str("command: wkhtmltopdf\ntimeout: 5\n").unwrap();
        assert_eq!(config.command.as_deref(), Some("wkhtmltopdf"));
        assert_eq!(config.timeout, Some(5));
        assert!(config.escape_args);

        let err = CommandConfig::from_yaml_str("comand: typo\n").unwrap_err();
        assert!(matches!(err, CommandError::ConfigParse(_)));
        assert_eq!(
            CommandConfig::from_yaml_str("  \n").unwrap(),
            CommandConfig::default()
        );
    }

    #[test]
    #[serial]
    fn load_reads_file_then_env() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.yaml"),
            "command: http://file:3000\nplatform: unix\ntimeout: 10\n",
        )
        .unwrap();

        let mut vars = cleared_env();
        vars.push(("CMDRELAY_HOME", dir.path().to_str()));
        vars.retain(|(var, _)| *var != "CMDRELAY_TIMEOUT");
        vars.push(("CMDRELAY_TIMEOUT", Some("45")));
        let _guard = EnvGuard::set(&vars);

        let config = CommandConfig::load().unwrap();
        assert_eq!(config.command.as_deref(), Some("http://file:3000"));
        assert_eq!(config.platform, Some(Platform::Unix));
        assert_eq!(config.timeout, Some(45));
    }

    #[test]
    #[serial]
    fn load_without_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let mut vars = cleared_env();
        vars.push(("CMDRELAY_HOME", dir.path().to_str()));
        let _guard = EnvGuard::set(&vars);

        assert_eq!(CommandConfig::load().unwrap(), CommandConfig::default());
    }

    #[test]
    #[serial]
    fn env_with_unparseable_value_fails() {
        let mut vars = cleared_env();
        vars.retain(|(var, _)| *var != "CMDRELAY_ESCAPE_ARGS");
        vars.push(("CMDRELAY_ESCAPE_ARGS", Some("sometimes")));
        let _guard = EnvGuard::set(&vars);

        let mut config = CommandConfig::default();
        assert!(config.apply_env().is_err());
    }
}
