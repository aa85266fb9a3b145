use clap::Parser;
use snmp_trapgen::emitter::{self, EmitterConfig};
use std::ffi::OsString;
use std::net::Ipv4Addr;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Sends SNMPv2c coldStart traps to a receiver at a fixed rate.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// The IP address or hostname of the SNMP trap receiver.
    #[arg(long, default_value = "127.0.0.1")]
    target: String,

    /// The source IP address to carry as the trap's agent address.
    #[arg(long, default_value_t = Ipv4Addr::LOCALHOST)]
    source_ip: Ipv4Addr,

    /// The port number of the SNMP trap receiver.
    #[arg(long, default_value_t = 162)]
    port: u16,

    /// The SNMP community string.
    #[arg(long, default_value = "public")]
    community: String,

    /// The number of traps to send.
    #[arg(long, default_value_t = 1)]
    count: u32,

    /// The number of traps to send per second.
    #[arg(long, default_value_t = 1)]
    rate: u32,
}

impl From<Cli> for EmitterConfig {
    fn from(cli: Cli) -> Self {
        EmitterConfig {
            target: cli.target,
            port: cli.port,
            community: cli.community,
            source_ip: cli.source_ip,
            count: cli.count,
            rate: cli.rate,
        }
    }
}

const LONG_FLAGS: [&str; 6] = ["target", "source-ip", "port", "community", "count", "rate"];

/// Rewrites Go-style single-dash long flags (`-count 5`, `-rate=10`) to the
/// double-dash form clap expects.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            let Some(flag) = arg.to_str().and_then(|s| s.strip_prefix('-')) else {
                return arg;
            };
            let name = flag.split_once('=').map_or(flag, |(name, _)| name);
            if LONG_FLAGS.contains(&name) {
                OsString::from(format!("--{flag}"))
            } else {
                arg
            }
        })
        .collect()
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = EmitterConfig::from(Cli::parse_from(normalize_args(std::env::args_os())));
    if let Err(err) = config.validate() {
        error!("{err}");
        return ExitCode::FAILURE;
    }

    let announce = |config: &EmitterConfig| {
        println!("Sending {} SNMP v2c ColdStart traps...", config.count);
    };

    match emitter::run(&config, announce).await {
        Ok(summary) => {
            println!(
                "Finished sending {} traps ({} failed) with {} traps per second in {:?} to {}:{} using community {}",
                config.count,
                summary.failed,
                config.rate,
                summary.elapsed,
                config.target,
                config.port,
                config.community
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> EmitterConfig {
        let args = normalize_args(args.iter().map(OsString::from));
        Cli::try_parse_from(args).unwrap().into()
    }

    #[test]
    fn defaults() {
        assert_eq!(parse(&["snmp-trapgen"]), EmitterConfig::default());
    }

    #[test]
    fn single_dash_flags_are_accepted() {
        let config = parse(&[
            "snmp-trapgen",
            "-target",
            "10.0.0.5",
            "-count=20",
            "-rate",
            "5",
            "-source-ip",
            "192.168.1.10",
        ]);
        assert_eq!(config.target, "10.0.0.5");
        assert_eq!(config.count, 20);
        assert_eq!(config.rate, 5);
        assert_eq!(config.source_ip, Ipv4Addr::new(192, 168, 1, 10));
    }

    #[test]
    fn double_dash_flags_are_untouched() {
        let config = parse(&["snmp-trapgen", "--port", "1162", "--community", "private"]);
        assert_eq!(config.port, 1162);
        assert_eq!(config.community, "private");
    }

    #[test]
    fn negative_values_are_not_rewritten() {
        let args = normalize_args(["snmp-trapgen", "--count", "-1"].map(OsString::from));
        assert_eq!(args[2], OsString::from("-1"));
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn zero_rate_parses_but_fails_validation() {
        assert!(parse(&["snmp-trapgen", "--rate", "0"]).validate().is_err());
    }
}
