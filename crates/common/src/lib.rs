//! Shared utilities for cmdrelay components

pub mod escape;
pub mod io;
pub mod paths;
pub mod platform;
pub mod win_path;

pub use escape::{escape_arg, escape_command, escape_key, Locale};
pub use io::{FileSink, InputSource, OutputSink};
pub use platform::Platform;
pub use win_path::rewrite_absolute_command;

/// Standard log schema constants
pub mod log_schema {
    pub const COMMAND: &str = "command";
    pub const ENDPOINT: &str = "endpoint";
    pub const SINK: &str = "sink";
    pub const COMPONENT: &str = "component";
    pub const DURATION_MS: &str = "duration_ms";
    pub const EXECUTED: &str = "executed";
    pub const ERROR: &str = "error";
}

const SENSITIVE_FLAGS: &[&str] = &["--token", "--password", "-p", "-H", "--header", "--cookie"];

fn raw_log_opts() -> bool {
    std::env::var("CMDRELAY_LOG_OPTS").as_deref() == Ok("raw")
}

/// Redact sensitive information from command arguments
pub fn redact_sensitive(arg: &str) -> String {
    if raw_log_opts() {
        return arg.to_string();
    }

    // --flag=value form of a sensitive flag
    if let Some((flag, _)) = arg.split_once('=') {
        if SENSITIVE_FLAGS.contains(&flag) {
            return format!("{flag}=***");
        }
    }

    // Token/password patterns
    if arg.contains("token=") || arg.contains("password=") || arg.contains("SECRET=") {
        let parts: Vec<&str> = arg.splitn(2, '=').collect();
        if parts.len() == 2 {
            return format!("{}=***", parts[0]);
        }
    }

    // Flag-based redaction
    if SENSITIVE_FLAGS.contains(&arg) {
        return "***".to_string();
    }
    arg.to_string()
}

/// Redact an assembled command line word by word.
///
/// The line is split with shell quoting rules, so a quoted value following a
/// sensitive flag is masked whole: `--password 'hunter 2'` becomes `*** ***`.
/// A line that cannot be split keeps only its first word.
pub fn redact_command_line(line: &str) -> String {
    if raw_log_opts() {
        return line.to_string();
    }
    let tokens = match shell_words::split(line) {
        Ok(tokens) => tokens,
        Err(_) => {
            let program = line.split_whitespace().next().unwrap_or_default();
            return format!("{program} ***");
        }
    };

    let mut out = Vec::with_capacity(tokens.len());
    let mut mask_next = false;
    for token in &tokens {
        if mask_next {
            out.push("***".to_string());
            mask_next = false;
            continue;
        }
        mask_next = SENSITIVE_FLAGS.contains(&token.as_str());
        let redacted = redact_sensitive(token);
        if redacted == *token {
            out.push(shell_words::quote(token).into_owned());
        } else {
            out.push(redacted);
        }
    }
    out.join(" ")
}
