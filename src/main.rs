//! cmdrelay binary: assemble one command and relay it to a conversion service.

use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use cmdrelay_command::{plan_request, CommandConfig, CommandSpec, OptionValue, Options};
use cmdrelay_common::{log_schema, redact_command_line, Locale, Platform};
use serde_json::json;
use tracing::{debug, info};
use tracing_subscriber::prelude::*;

mod cli;

use cli::Cli;

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let mut spec = CommandSpec::from_config(&config);
    spec.add_args(collect_options(&cli)?);

    if let Some(html) = &cli.html {
        let content = std::fs::read_to_string(html)
            .with_context(|| format!("Failed to read HTML input {}", html.display()))?;
        spec.set_remote_target(content);
    }

    let command = spec
        .exec_command()
        .ok_or_else(|| anyhow!("{}", spec.get_error()))?;

    if cli.print_command {
        println!("{command}");
        return Ok(());
    }

    let endpoint = plan_request(spec.remote_target(), spec.args_line())
        .endpoint()
        .path();
    info!(command = %redact_command_line(&command), endpoint, "relaying command");

    let started = Instant::now();
    let executed = spec.execute();

    if cli.json {
        let summary = json!({
            log_schema::COMPONENT: "cmdrelay",
            log_schema::COMMAND: redact_command_line(&command),
            log_schema::ENDPOINT: endpoint,
            log_schema::SINK: spec.output().map(|p| p.display().to_string()),
            log_schema::EXECUTED: executed,
            log_schema::ERROR: spec.get_error(),
            log_schema::DURATION_MS: started.elapsed().as_millis() as u64,
        });
        println!("{summary}");
    }

    if !executed {
        if spec.get_error().is_empty() {
            bail!("Conversion service rejected the request");
        }
        bail!("{}", spec.get_error());
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<CommandConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = CommandConfig::load_file(path)?;
            config.apply_env()?;
            config
        }
        None => CommandConfig::load()?,
    };

    if let Some(base) = &cli.base {
        config.command = Some(base.clone());
    }
    if let Some(output) = &cli.output {
        config.output = Some(output.clone());
    }
    if let Some(platform) = &cli.platform {
        config.platform = Some(
            Platform::parse(platform)
                .ok_or_else(|| anyhow!("Unknown platform '{platform}'; expected unix or windows"))?,
        );
    }
    if let Some(locale) = &cli.locale {
        config.locale = Some(Locale::new(locale.as_str()));
    }
    if cli.no_escape {
        config.escape_args = false;
    }

    debug!(
        command = %config.command.as_deref().map(redact_command_line).unwrap_or_default(),
        platform = ?config.platform,
        locale = ?config.locale,
        timeout = ?config.timeout,
        output = ?config.output,
        escape_args = config.escape_args,
        stdin_bytes = config.stdin.as_ref().map_or(0, String::len),
        "configuration loaded"
    );
    Ok(config)
}

fn collect_options(cli: &Cli) -> Result<Options> {
    let mut options = Options::new();
    for (key, value) in &cli.opts {
        let merged = match options.remove(key) {
            None => OptionValue::from(value.as_str()),
            Some(OptionValue::Scalar(previous)) => {
                OptionValue::from(vec![previous, value.clone()])
            }
            Some(OptionValue::List(mut items)) => {
                items.push(cmdrelay_command::ListItem::Value(value.clone()));
                OptionValue::List(items)
            }
        };
        options.insert(key.as_str(), merged);
    }
    for flag in &cli.flags {
        if flag.trim().is_empty() {
            bail!("Empty --flag name");
        }
        options = options.flag(flag.trim_start_matches('-'));
    }
    if let Some(url) = &cli.url {
        options = options.input_arg(url.as_str());
    }
    Ok(options)
}
