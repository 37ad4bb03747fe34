//! Expiry alert digests.
//!
//! Delivery (SMTP, webhooks) lives outside this crate; implement [`Notifier`]
//! to plug one in. [`LogNotifier`] writes the digest to the log.

use crate::model::CheckResult;
use async_trait::async_trait;
use tracing::{info, warn};

pub const ALERT_SUBJECT: &str = "TLS certificate expiry warning";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertDigest {
    pub subject: String,
    pub lines: Vec<String>,
}

impl AlertDigest {
    /// `None` when no result is alerting.
    pub fn from_results(results: &[CheckResult]) -> Option<Self> {
        let lines: Vec<String> = results
            .iter()
            .filter(|r| r.alert())
            .map(|r| {
                let record = r.record();
                let days = record.days_left.unwrap_or_default();
                let expires = record
                    .expires
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                format!("- {} expires in {} days ({})", record.domain, days, expires)
            })
            .collect();

        if lines.is_empty() {
            return None;
        }

        Some(Self {
            subject: ALERT_SUBJECT.to_string(),
            lines,
        })
    }

    pub fn body(&self) -> String {
        let mut body = String::from("The following certificates are about to expire:\n\n");
        for line in &self.lines {
            body.push_str(line);
            body.push('\n');
        }
        body
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, digest: &AlertDigest) -> anyhow::Result<()>;
}

#[derive(Clone, Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, digest: &AlertDigest) -> anyhow::Result<()> {
        warn!(count = digest.lines.len(), subject = %digest.subject, "certificates near expiry");
        for line in &digest.lines {
            warn!("{line}");
        }
        Ok(())
    }
}

/// Builds the digest and passes it on; logs when nothing needs attention.
pub async fn notify_alerts<N: Notifier + ?Sized>(
    notifier: &N,
    results: &[CheckResult],
) -> anyhow::Result<bool> {
    match AlertDigest::from_results(results) {
        Some(digest) => {
            notifier.notify(&digest).await?;
            Ok(true)
        }
        None => {
            info!("no certificates near expiry");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificate::CertificateRecord;
    use crate::model::{Target, Verdict};
    use crate::probe::{FailureState, Tier};
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    fn expiring(host: &str, days: i64, alert: bool) -> CheckResult {
        CheckResult {
            target: Target::new(host, 443, 15).view(),
            verdict: Verdict::Certificate {
                record: CertificateRecord {
                    issuer: "Example CA".into(),
                    subject_alt_names: vec![],
                    not_after: Utc.with_ymd_and_hms(2030, 4, 9, 0, 0, 0).unwrap(),
                    days_left: days,
                    chain_incomplete: true,
                },
                tier: Tier::Modern,
                alert,
            },
        }
    }

    #[derive(Default)]
    struct Recording(Mutex<Vec<AlertDigest>>);

    #[async_trait]
    impl Notifier for Recording {
        async fn notify(&self, digest: &AlertDigest) -> anyhow::Result<()> {
            self.0.lock().unwrap().push(digest.clone());
            Ok(())
        }
    }

    #[test]
    fn digest_lists_only_alerts() {
        let results = vec![
            expiring("soon.example", 3, true),
            expiring("later.example", 90, false),
            CheckResult {
                target: Target::new("down.example", 443, 15).view(),
                verdict: Verdict::Failure {
                    state: FailureState::Refused,
                    message: "refused".into(),
                },
            },
        ];
        let digest = AlertDigest::from_results(&results).unwrap();
        assert_eq!(
            digest.lines,
            vec!["- soon.example expires in 3 days (2030-04-09)".to_string()]
        );
        assert!(digest.body().contains("soon.example"));
    }

    #[tokio::test]
    async fn skips_notifier_without_alerts() {
        let notifier = Recording::default();
        let sent = notify_alerts(&notifier, &[expiring("later.example", 90, false)])
            .await
            .unwrap();
        assert!(!sent);
        assert!(notifier.0.lock().unwrap().is_empty());

        let sent = notify_alerts(&notifier, &[expiring("soon.example", 1, true)])
            .await
            .unwrap();
        assert!(sent);
        assert_eq!(notifier.0.lock().unwrap().len(), 1);
    }
}
