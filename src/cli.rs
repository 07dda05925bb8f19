//! Command-line interface.
//!
//! A configuration file drives everything when present; otherwise the
//! listen/remote flags describe a single ad-hoc service.

use clap::{ArgAction, Parser};

use crate::config::{
    self, Config, ConfigError, ConfigResult, NetworkSection, ServiceSection,
};
use crate::net::TransportField;

/// TCP/UDP port forwarder with PROXY protocol v1 support.
#[derive(Debug, Parser)]
#[command(name = "pfw", version, disable_version_flag = true)]
pub struct Cli {
    /// Path to a YAML or JSON configuration file.
    #[arg(short, long)]
    pub config: Option<std::path::PathBuf>,

    /// Listen address (host:port or a bare interface name).
    #[arg(short, long)]
    pub listen: Option<String>,

    /// Remote address to forward to (host:port).
    #[arg(short, long)]
    pub remote: Option<String>,

    /// Transport selection: tcp, udp, or both.
    #[arg(short = 'n', long = "type", value_name = "TYPE")]
    pub transport: Option<String>,

    /// Send a PROXY protocol v1 header to the remote.
    #[arg(long = "send_proxy")]
    pub send_proxy: bool,

    /// Expect a PROXY protocol v1 header from inbound clients.
    #[arg(long = "accept_proxy")]
    pub accept_proxy: bool,

    /// Enable debug logging regardless of the configured level.
    #[arg(short, long)]
    pub debug: bool,

    /// Print version information.
    #[arg(
        short = 'v',
        long = "version",
        action = ArgAction::Version,
        value_parser = clap::value_parser!(bool)
    )]
    version: Option<bool>,
}

impl Cli {
    /// Produce the effective configuration.
    ///
    /// A config file takes precedence over the service flags. Without
    /// one, both `--listen` and `--remote` are required.
    ///
    /// # Errors
    ///
    /// Returns an error if the file fails to load, or if neither a
    /// file nor a complete listen/remote pair was given.
    pub fn into_config(self) -> ConfigResult<Config> {
        if let Some(path) = &self.config {
            return config::load(path);
        }

        let (Some(listen), Some(remote)) = (self.listen, self.remote) else {
            return Err(ConfigError::MissingListenRemote);
        };

        Ok(Config {
            services: vec![ServiceSection {
                name: None,
                listen,
                remote,
                network: NetworkSection {
                    transport: self.transport.map(TransportField::Single),
                    send_proxy: self.send_proxy.then_some(true),
                    accept_proxy: self.accept_proxy.then_some(true),
                },
            }],
            ..Config::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{select_transports, Transport};

    #[test]
    fn test_flags_build_single_service() {
        let cli = Cli::parse_from([
            "pfw",
            "--listen",
            "127.0.0.1:9000",
            "--remote",
            "127.0.0.1:9001",
            "--type",
            "both",
            "--send_proxy",
        ]);
        let debug = cli.debug;
        let config = cli.into_config().unwrap();

        assert!(!debug);
        assert_eq!(config.services.len(), 1);
        let resolved = config.resolved_services();
        assert_eq!(resolved[0].listen, "127.0.0.1:9000");
        assert!(resolved[0].send_proxy);
        assert!(!resolved[0].accept_proxy);
        assert_eq!(
            select_transports(resolved[0].transport.as_ref()).unwrap(),
            vec![Transport::Tcp, Transport::Udp]
        );
    }

    #[test]
    fn test_missing_listen_remote_is_an_error() {
        let cli = Cli::parse_from(["pfw", "--listen", "127.0.0.1:9000"]);
        assert!(matches!(
            cli.into_config(),
            Err(ConfigError::MissingListenRemote)
        ));
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::parse_from([
            "pfw", "-l", "0.0.0.0:8080", "-r", "10.0.0.1:80", "-n", "udp", "-d",
        ]);
        assert!(cli.debug);
        let config = cli.into_config().unwrap();
        let resolved = config.resolved_services();
        assert_eq!(
            select_transports(resolved[0].transport.as_ref()).unwrap(),
            vec![Transport::Udp]
        );
    }
}
