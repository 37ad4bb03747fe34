use clap::{ArgAction, Parser};
use std::time::Duration;
use tls_posture::model::{Config, OutputConfig, OutputFormat};

#[derive(Debug, Parser)]
#[command(author, version, about = "TLS posture and certificate expiry probe", long_about = None)]
pub struct Cli {
    /// Single host to probe
    #[arg(short = 'H', long = "host", value_name = "HOST")]
    pub host: Option<String>,

    /// Port for --host
    #[arg(short = 'p', long = "port", value_name = "PORT", default_value_t = 443)]
    pub port: u16,

    /// Target config (JSON) or a list of host[:port] lines
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<String>,

    /// Maximum concurrent probes
    #[arg(long = "concurrency", default_value_t = 32)]
    pub concurrency: usize,

    /// Connect and handshake timeout per attempt, in milliseconds
    #[arg(long = "timeout", default_value_t = 5000)]
    pub timeout_ms: u64,

    /// Deadline for the whole run, in milliseconds
    #[arg(long = "deadline", value_name = "MS")]
    pub deadline_ms: Option<u64>,

    /// Alert when a certificate has this many days left or fewer
    #[arg(long = "alert-days", value_name = "DAYS", allow_negative_numbers = true)]
    pub alert_days: Option<i64>,

    /// Skip the legacy and obsolete fallback attempts
    #[arg(long = "no-legacy", action = ArgAction::SetTrue)]
    pub no_legacy: bool,

    /// Output format
    #[arg(long = "output", default_value_t = OutputFormat::Jsonl)]
    pub output: OutputFormat,

    /// Shorthand for --output pretty
    #[arg(long = "pretty", action = ArgAction::SetTrue)]
    pub pretty: bool,
}

impl Cli {
    pub fn into_config(self) -> anyhow::Result<Config> {
        if self.host.is_none() && self.config.is_none() {
            anyhow::bail!("either --host or --config is required");
        }

        if self.host.is_some() && self.config.is_some() {
            anyhow::bail!("--host and --config are mutually exclusive");
        }

        if self.concurrency == 0 {
            anyhow::bail!("concurrency must be greater than zero");
        }

        if self.timeout_ms == 0 {
            anyhow::bail!("timeout must be greater than zero");
        }

        if self.deadline_ms == Some(0) {
            anyhow::bail!("deadline must be greater than zero");
        }

        let format = if self.pretty {
            OutputFormat::Pretty
        } else {
            self.output
        };

        Ok(Config {
            input: self.config,
            target: self.host.map(|h| (h, self.port)),
            concurrency: self.concurrency,
            timeout: Duration::from_millis(self.timeout_ms),
            deadline: self.deadline_ms.map(Duration::from_millis),
            alert_days: self.alert_days,
            legacy_probing: !self.no_legacy,
            output: OutputConfig { format },
        })
    }
}
