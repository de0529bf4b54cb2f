//! Command construction and dispatch.
//!
//! A [`CommandSpec`] collects a base command and escaped argument tokens,
//! assembles them into one invocation string, and executes it exactly once.
//! When the base command is the URL of a conversion service, execution posts
//! the argument line to that service and writes the returned artifact into a
//! caller-owned [`OutputSink`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use cmdrelay_common::{
    escape_command, redact_command_line, rewrite_absolute_command, FileSink, Locale,
    OutputSink, Platform,
};
use relay_api_client::{Connector, TransportConfig};
use tracing::{debug, warn};

pub mod args;
pub mod config;
pub mod dispatch;
mod error;
pub mod options;
pub mod result;

pub use args::{ArgValue, ArgumentBuilder, ArgumentToken, Separator};
pub use config::CommandConfig;
pub use dispatch::{is_remote_url, plan_request, DispatchOutcome, Dispatcher};
pub use error::CommandError;
pub use options::{ListItem, OptionEntry, OptionValue, Options};
pub use result::{ExecutionResult, ExecutionState};

/// A command invocation under construction.
pub struct CommandSpec {
    command: Option<String>,
    args: ArgumentBuilder,
    escape_command: bool,
    stdin: Option<String>,
    timeout: Option<Duration>,
    remote_target: Option<String>,
    output: Option<PathBuf>,
    result: ExecutionResult,
    connector: Option<Arc<dyn Connector>>,
}

impl Default for CommandSpec {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSpec")
            .field("command", &self.command)
            .field("args", &self.args)
            .field("escape_command", &self.escape_command)
            .field("timeout", &self.timeout)
            .field("remote_target", &self.remote_target)
            .field("output", &self.output)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

impl CommandSpec {
    /// An unconfigured command for the host platform.
    pub fn new() -> Self {
        Self {
            command: None,
            args: ArgumentBuilder::default(),
            escape_command: false,
            stdin: None,
            timeout: None,
            remote_target: None,
            output: None,
            result: ExecutionResult::default(),
            connector: None,
        }
    }

    /// Build a command from a configuration.
    ///
    /// Platform, locale and escaping flags are applied before the base
    /// command so that path rewriting sees the final platform.
    pub fn from_config(config: &CommandConfig) -> Self {
        let mut spec = Self::new();
        if let Some(platform) = config.platform {
            spec.set_platform(platform);
        }
        spec.set_locale(config.locale.clone())
            .set_escape_args(config.escape_args)
            .set_escape_command(config.escape_command);
        spec.timeout = config.timeout_duration();
        spec.stdin = config.stdin.clone();
        spec.output = config.output.clone();
        if let Some(command) = &config.command {
            spec.set_command(command);
        }
        spec
    }

    /// Build a command from `(key, value)` settings such as
    /// `[("command", "http://render:3000"), ("escapeArgs", "false")]`.
    ///
    /// Fails on the first unknown key or unparseable value.
    pub fn with_settings(settings: &[(&str, &str)]) -> Result<Self, CommandError> {
        let mut config = CommandConfig::default();
        for (key, value) in settings {
            config.apply_setting(key, value)?;
        }
        Ok(Self::from_config(&config))
    }

    /// Route dispatch through `connector` instead of the default HTTP client.
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Set the base command.
    ///
    /// With base-command escaping on, shell metacharacters are neutralized
    /// first. On Windows an absolute program path is then rewritten to
    /// switch drive and directory before running the program.
    pub fn set_command(&mut self, command: &str) -> &mut Self {
        let platform = self.args.platform();
        let mut command = if self.escape_command {
            escape_command(command, platform)
        } else {
            command.to_string()
        };
        if platform.rewrites_absolute_paths() {
            command = rewrite_absolute_command(&command);
        }
        self.command = Some(command);
        self
    }

    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    pub fn is_configured(&self) -> bool {
        self.command.is_some()
    }

    pub fn platform(&self) -> Platform {
        self.args.platform()
    }

    pub fn set_platform(&mut self, platform: Platform) -> &mut Self {
        self.args.set_platform(platform);
        self
    }

    pub fn set_locale(&mut self, locale: Option<Locale>) -> &mut Self {
        self.args.set_locale(locale);
        self
    }

    pub fn set_escape_args(&mut self, escape: bool) -> &mut Self {
        self.args.set_escape_default(escape);
        self
    }

    pub fn set_escape_command(&mut self, escape: bool) -> &mut Self {
        self.escape_command = escape;
        self
    }

    pub fn stdin(&self) -> Option<&str> {
        self.stdin.as_deref()
    }

    pub fn set_stdin(&mut self, stdin: impl Into<String>) -> &mut Self {
        self.stdin = Some(stdin.into());
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    pub fn set_output<P: AsRef<Path>>(&mut self, path: P) -> &mut Self {
        self.output = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn remote_target(&self) -> Option<&str> {
        self.remote_target.as_deref()
    }

    /// Set the dispatch target directly: a URL to convert, or HTML content.
    pub fn set_remote_target(&mut self, target: impl Into<String>) -> &mut Self {
        self.remote_target = Some(target.into());
        self
    }

    pub fn add_arg(&mut self, key: &str, value: impl Into<ArgValue>) -> &mut Self {
        self.args.add_arg(key, value);
        self
    }

    pub fn add_flag(&mut self, key: &str) -> &mut Self {
        self.args.add_flag(key);
        self
    }

    pub fn add_arg_with(
        &mut self,
        key: &str,
        value: Option<ArgValue>,
        escape: Option<bool>,
    ) -> &mut Self {
        self.args.add_arg_with(key, value, escape);
        self
    }

    /// Flatten an option set into argument tokens.
    ///
    /// `input` becomes a leading positional token. `inputArg` becomes the
    /// remote target when it is a URL and an always-escaped positional token
    /// otherwise. Remaining entries follow in order: flags as `--name`,
    /// scalars as `--key value`, list values as one `--key value` per item
    /// and `--key name value` per pair.
    pub fn add_args(&mut self, mut options: Options) -> &mut Self {
        if let Some(input) = options.remove(options::INPUT_KEY) {
            self.args.add_flag(&input.to_plain_string());
        }

        if let Some(input_arg) = options.remove(options::INPUT_ARG_KEY) {
            let target = input_arg.to_plain_string();
            if is_remote_url(&target) {
                debug!(target: "cmdrelay::command", remote_target = %target, "captured remote target");
                self.remote_target = Some(target);
            } else {
                self.args.add_arg_with(&target, None, Some(true));
            }
        }

        for entry in options {
            match entry {
                OptionEntry::Flag(name) => {
                    self.args.add_flag(&format!("--{name}"));
                }
                OptionEntry::Named(key, OptionValue::Scalar(value)) => {
                    self.args.add_arg(&format!("--{key}"), value);
                }
                OptionEntry::Named(key, OptionValue::List(items)) => {
                    let flag = format!("--{key}");
                    for item in items {
                        match item {
                            ListItem::Value(value) => {
                                self.args.add_arg(&flag, value);
                            }
                            ListItem::Pair(name, value) => {
                                self.args.add_arg(&flag, vec![name, value]);
                            }
                        }
                    }
                }
            }
        }
        self
    }

    pub fn tokens(&self) -> &[ArgumentToken] {
        self.args.tokens()
    }

    /// All argument tokens joined by single spaces.
    pub fn args_line(&self) -> String {
        self.args.line()
    }

    /// The full invocation string.
    ///
    /// Returns `None` and records a configuration error when no base command
    /// is set.
    pub fn exec_command(&mut self) -> Option<String> {
        let Some(command) = self.command.as_deref() else {
            self.result
                .record_error(CommandError::NotConfigured.to_string());
            return None;
        };
        if self.args.is_empty() {
            Some(command.to_string())
        } else {
            Some(format!("{command} {}", self.args.line()))
        }
    }

    /// Execute once, writing the artifact to the configured output file.
    pub fn execute(&mut self) -> bool {
        match self.output.clone() {
            Some(path) => self.execute_into(&mut FileSink::new(path)),
            None => {
                if self.result.state().is_terminal() {
                    return self.result.executed();
                }
                self.result
                    .record_error(CommandError::NoOutputSink.to_string());
                false
            }
        }
    }

    /// Execute once, writing the artifact to `sink`.
    ///
    /// Returns `true` only when the service answered `200 OK` and the body was
    /// written. A rejected request leaves the sink untouched and records no
    /// error message. A command runs at most once; later calls report the
    /// first outcome without dispatching again.
    pub fn execute_into(&mut self, sink: &mut dyn OutputSink) -> bool {
        if self.result.state().is_terminal() {
            debug!(target: "cmdrelay::command", "command already executed; not dispatching again");
            return self.result.executed();
        }

        let Some(command) = self.exec_command() else {
            return false;
        };
        let Some(base_url) = self.command.clone() else {
            return false;
        };
        debug!(
            target: "cmdrelay::command",
            command = %redact_command_line(&command),
            sink = %sink.describe(),
            "executing command"
        );

        self.result.begin();
        let dispatcher = self.dispatcher();

        let request = plan_request(self.remote_target.as_deref(), self.args.line());
        match dispatcher.dispatch(&base_url, &request) {
            Ok(DispatchOutcome::Succeeded(body)) => match sink.write_artifact(&body) {
                Ok(()) => {
                    debug!(
                        target: "cmdrelay::command",
                        bytes = body.len(),
                        "artifact written"
                    );
                    self.result.succeed();
                    true
                }
                Err(err) => {
                    self.result.record_error(format!(
                        "Failed to write output to {}: {err}",
                        sink.describe()
                    ));
                    self.result.fail();
                    false
                }
            },
            Ok(DispatchOutcome::Rejected(status)) => {
                warn!(
                    target: "cmdrelay::command",
                    status = status.as_u16(),
                    "conversion service rejected the request"
                );
                self.result.fail();
                false
            }
            Err(err) => {
                self.result.record_error(format!("{err:#}"));
                self.result.fail();
                false
            }
        }
    }

    fn dispatcher(&self) -> Dispatcher {
        match &self.connector {
            Some(connector) => Dispatcher::with_connector(Arc::clone(connector)),
            None => Dispatcher::new(TransportConfig {
                connect_timeout: self.timeout,
            }),
        }
    }

    pub fn result(&self) -> &ExecutionResult {
        &self.result
    }

    pub fn get_output(&self) -> &str {
        self.result.output()
    }

    pub fn get_error(&self) -> &str {
        self.result.error()
    }

    pub fn get_stderr(&self) -> &str {
        self.result.stderr()
    }

    pub fn get_exit_code(&self) -> Option<i32> {
        self.result.exit_code()
    }

    pub fn get_executed(&self) -> bool {
        self.result.executed()
    }
}
