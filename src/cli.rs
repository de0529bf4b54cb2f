use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cmdrelay")]
#[command(version, about = "Build an escaped command and relay it to a conversion service", long_about = None)]
pub struct Cli {
    /// Read settings from this YAML file instead of ~/.cmdrelay/config.yaml
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Base URL of the conversion service (overrides `command`)
    #[arg(long = "base", value_name = "URL")]
    pub base: Option<String>,

    /// File that receives the converted artifact
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Convert the page at this address
    #[arg(long = "url", value_name = "URL", conflicts_with = "html")]
    pub url: Option<String>,

    /// Convert the HTML content of this file
    #[arg(long = "html", value_name = "FILE", conflicts_with = "url")]
    pub html: Option<PathBuf>,

    /// Option passed through as `--KEY VALUE`; repeat a key to send it twice
    #[arg(long = "opt", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub opts: Vec<(String, String)>,

    /// Flag passed through as `--NAME`
    #[arg(long = "flag", value_name = "NAME")]
    pub flags: Vec<String>,

    /// Shell family used for escaping (unix or windows)
    #[arg(long = "platform", value_name = "PLATFORM")]
    pub platform: Option<String>,

    /// Locale applied while escaping arguments
    #[arg(long = "locale", value_name = "LOCALE")]
    pub locale: Option<String>,

    /// Pass arguments through without quoting
    #[arg(long = "no-escape")]
    pub no_escape: bool,

    /// Print the assembled command and exit without dispatching
    #[arg(long = "print-command")]
    pub print_command: bool,

    /// Print a one-line JSON summary of the outcome
    #[arg(long = "json")]
    pub json: bool,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}
