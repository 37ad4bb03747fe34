use crate::certificate::CertificateRecord;
use crate::probe::{FailureState, Tier};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 443;
pub const DEFAULT_ALERT_DAYS: i64 = 15;

/// One endpoint to probe, with its alert threshold already resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub host: String,
    pub port: u16,
    pub service_label: Option<String>,
    pub alert_days: i64,
}

impl Target {
    pub fn new(host: impl Into<String>, port: u16, alert_days: i64) -> Self {
        Self {
            host: host.into(),
            port,
            service_label: None,
            alert_days,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.service_label = Some(label.into());
        self
    }

    pub fn view(&self) -> TargetView {
        TargetView {
            service: self.service_label.clone().unwrap_or_default(),
            host: self.host.clone(),
            port: Some(self.port),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// A configured entry that could not become a `Target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTarget {
    pub view: TargetView,
    pub reason: String,
}

pub type TargetEntry = Result<Target, InvalidTarget>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetView {
    pub service: String,
    pub host: String,
    pub port: Option<u16>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub input: Option<String>,
    pub target: Option<(String, u16)>,
    pub concurrency: usize,
    pub timeout: Duration,
    pub deadline: Option<Duration>,
    pub alert_days: Option<i64>,
    pub legacy_probing: bool,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jsonl,
    Pretty,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Jsonl => write!(f, "jsonl"),
            OutputFormat::Pretty => write!(f, "pretty"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Certificate {
        record: CertificateRecord,
        tier: Tier,
        alert: bool,
    },
    Failure {
        state: FailureState,
        message: String,
    },
}

/// Final per-target result of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub target: TargetView,
    pub verdict: Verdict,
}

impl CheckResult {
    pub fn is_success(&self) -> bool {
        matches!(self.verdict, Verdict::Certificate { .. })
    }

    pub fn days_left(&self) -> Option<i64> {
        match &self.verdict {
            Verdict::Certificate { record, .. } => Some(record.days_left),
            Verdict::Failure { .. } => None,
        }
    }

    pub fn alert(&self) -> bool {
        matches!(self.verdict, Verdict::Certificate { alert: true, .. })
    }

    pub fn state_label(&self) -> &'static str {
        match &self.verdict {
            Verdict::Certificate { tier, .. } => tier.as_str(),
            Verdict::Failure { state, .. } => state.as_str(),
        }
    }

    /// Flat view handed to renderers and notifiers.
    pub fn record(&self) -> CheckRecord {
        let base = CheckRecord {
            service: self.target.service.clone(),
            domain: self.target.host.clone(),
            port: self.target.port,
            state: self.state_label().to_string(),
            expires: None,
            days_left: None,
            issuer: None,
            san: Vec::new(),
            chain_incomplete: None,
            alert: false,
            error: None,
        };

        match &self.verdict {
            Verdict::Certificate { record, alert, .. } => CheckRecord {
                expires: Some(record.not_after.date_naive()),
                days_left: Some(record.days_left),
                issuer: Some(record.issuer.clone()),
                san: record.subject_alt_names.clone(),
                chain_incomplete: Some(record.chain_incomplete),
                alert: *alert,
                ..base
            },
            Verdict::Failure { message, .. } => CheckRecord {
                error: Some(message.clone()),
                ..base
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRecord {
    pub service: String,
    pub domain: String,
    pub port: Option<u16>,
    pub state: String,
    pub expires: Option<NaiveDate>,
    pub days_left: Option<i64>,
    pub issuer: Option<String>,
    pub san: Vec<String>,
    pub chain_incomplete: Option<bool>,
    pub alert: bool,
    pub error: Option<String>,
}
