use std::path::PathBuf;

use clap::{ArgAction, Parser};
use url::Url;

#[derive(Clone, Debug, Parser)]
#[command(name = "rangefetch", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
/// Download a file over HTTP as concurrent byte ranges.
pub struct Args {
    /// URL to download
    #[arg(
        value_name = "URL",
        value_parser = parse_url,
        required_unless_present = "url_flag",
        conflicts_with = "url_flag"
    )]
    pub url: Option<Url>,

    /// URL to download (same as the positional argument)
    #[arg(long = "url", id = "url_flag", value_name = "URL", value_parser = parse_url)]
    pub url_flag: Option<Url>,

    /// Output file, created or truncated
    #[arg(short, long, value_name = "PATH")]
    pub out: PathBuf,

    /// Number of concurrent range requests
    #[arg(short, long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Extra request header, repeatable
    #[arg(short = 'H', long = "header", value_name = "NAME: VALUE", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// TOML config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Do not draw a progress bar
    #[arg(long)]
    pub no_progress: bool,
}

impl Args {
    pub fn target(&self) -> Option<&Url> { self.url.as_ref().or(self.url_flag.as_ref()) }
}

/// Accept only absolute `http`/`https` URLs.
pub fn parse_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("invalid URL `{raw}`: {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(format!("unsupported scheme `{scheme}`, expected http or https")),
    }
}

/// Parse `Name: value` into a header pair.
pub fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected `Name: value`, got `{raw}`"))?;
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(format!("invalid header name in `{raw}`"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
