//! Layered configuration: built-in defaults, an optional TOML file,
//! `RANGEFETCH_*` environment variables, then command-line flags.

use std::collections::BTreeMap;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use rangefetch::{DEFAULT_CONCURRENCY, DownloadOptions, ReqwestClient};
use serde::{Deserialize, Serialize};

use crate::cli::Args;

pub const ENV_PREFIX: &str = "RANGEFETCH_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub concurrency: usize,
    pub connect_timeout_secs: Option<u64>,
    pub read_timeout_secs: Option<u64>,
    pub user_agent: String,
    /// Extra headers sent with every request.
    pub headers: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            connect_timeout_secs: Some(30),
            read_timeout_secs: None,
            user_agent: concat!("rangefetch/", env!("CARGO_PKG_VERSION")).to_string(),
            headers: BTreeMap::new(),
        }
    }
}

/// Values given explicitly on the command line. Unset flags are left out
/// so they never shadow lower layers.
#[derive(Debug, Default, Serialize)]
struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    concurrency: Option<usize>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    headers: BTreeMap<String, String>,
}

impl From<&Args> for Overrides {
    fn from(args: &Args) -> Self {
        Self {
            concurrency: args.concurrency,
            headers: args.headers.iter().cloned().collect(),
        }
    }
}

impl Config {
    pub fn figment(args: &Args) -> Figment {
        let mut fig = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = &args.config {
            fig = fig.merge(Toml::file(path));
        }
        fig.merge(Env::prefixed(ENV_PREFIX).ignore(&["log"]))
            .merge(Serialized::defaults(Overrides::from(args)))
    }

    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        // a missing optional TOML file is silently empty to figment
        if let Some(path) = &args.config
            && !path.is_file()
        {
            return Err(format!("config file {} not found", path.display()).into());
        }
        Self::figment(args).extract()
    }

    pub fn download_options(&self) -> DownloadOptions {
        DownloadOptions::default()
            .concurrency(self.concurrency)
            .headers(
                self.headers
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            )
    }

    pub fn client(&self) -> rangefetch::Result<ReqwestClient> {
        let mut builder = ReqwestClient::builder().user_agent(&self.user_agent);
        if let Some(secs) = self.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.read_timeout_secs {
            builder = builder.read_timeout(Duration::from_secs(secs));
        }
        builder.build()
    }
}
