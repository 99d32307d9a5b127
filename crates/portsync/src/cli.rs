use std::{path::PathBuf, time::Duration};

use clap::{ArgAction, Parser};
use portsync_qbittorrent::Credentials;

use portsync::SyncConfiguration;

/// Top-level CLI struct for the binary. Every flag can also be set from the environment.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub(crate) struct Cli {
    /// Path to the file which contains only the VPN's forwarded port.
    #[arg(long, env = "QBITTORRENT_PORT_PLUGIN_PORT_FILE")]
    pub port_file: PathBuf,

    /// Seconds between refreshes of the port file and syncs of the torrent port.
    #[arg(
        long,
        env = "QBITTORRENT_PORT_PLUGIN_REFRESH_INTERVAL_SECONDS",
        default_value_t = 5
    )]
    pub refresh_interval_seconds: u64,

    /// Network location of the qBittorrent WebUI API, e.g. http://localhost:8080.
    #[arg(long, env = "QBITTORRENT_PORT_PLUGIN_QBITTORRENT_API_NETLOC")]
    pub qbittorrent_api_netloc: String,

    /// Username used to authenticate with the qBittorrent API.
    #[arg(
        long,
        env = "QBITTORRENT_PORT_PLUGIN_QBITTORRENT_USERNAME",
        default_value = "admin"
    )]
    pub qbittorrent_username: String,

    /// Password used to authenticate with the qBittorrent API.
    #[arg(
        long,
        env = "QBITTORRENT_PORT_PLUGIN_QBITTORRENT_PASSWORD",
        hide_env_values = true
    )]
    pub qbittorrent_password: String,

    /// Whether the port file may not exist yet. If false a missing port file is fatal.
    #[arg(
        long,
        env = "QBITTORRENT_PORT_PLUGIN_ALLOW_PORT_FILE_NOT_EXIST",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub allow_port_file_not_exist: bool,
}

impl From<Cli> for SyncConfiguration {
    fn from(cli: Cli) -> Self {
        Self {
            port_file: cli.port_file,
            allow_port_file_not_exist: cli.allow_port_file_not_exist,
            refresh_interval: Duration::from_secs(cli.refresh_interval_seconds),
            api_url: cli.qbittorrent_api_netloc,
            credentials: Credentials::new(cli.qbittorrent_username, cli.qbittorrent_password),
        }
    }
}
