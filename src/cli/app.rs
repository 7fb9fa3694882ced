use clap::Parser;
use gtm_clone::config::ConfigOverrides;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gtm-clone", version)]
#[command(about = "Clone a Google Tag Manager container's tags, triggers and variables into another container")]
pub struct Cli {
    /// Account that owns the source container
    #[arg(long, value_name = "ID")]
    pub account_id: Option<String>,

    /// Public ID of the container to copy, e.g. GTM-PR4BRDT
    #[arg(long = "source", value_name = "PUBLIC_ID")]
    pub source_public_id: Option<String>,

    /// Name of the destination container; created if it does not exist
    #[arg(long = "destination", value_name = "NAME")]
    pub destination_name: Option<String>,

    /// Account for the destination container (defaults to --account-id)
    #[arg(long, value_name = "ID")]
    pub destination_account_id: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write logs to this file (truncated on each run) instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Exit with an error if any entity could not be copied
    #[arg(long)]
    pub strict: bool,

    /// Attempts per API call before giving up
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: Option<u32>,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            account_id: self.account_id.clone(),
            source_public_id: self.source_public_id.clone(),
            destination_name: self.destination_name.clone(),
            destination_account_id: self.destination_account_id.clone(),
            max_attempts: self.max_attempts,
        }
    }
}
