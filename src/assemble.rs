use crate::certificate::{extract_at, CertificateRecord};
use crate::model::{CheckResult, InvalidTarget, Target, Verdict};
use crate::probe::{FailureState, ProbeOutcome, Tier};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

pub fn assemble(target: &Target, outcome: ProbeOutcome) -> CheckResult {
    assemble_at(target, outcome, Utc::now())
}

pub fn assemble_at(target: &Target, outcome: ProbeOutcome, now: DateTime<Utc>) -> CheckResult {
    let verdict = match outcome {
        ProbeOutcome::Success {
            raw_certificate,
            tier,
            ..
        } => match extract_at(&raw_certificate, now) {
            Ok(record) => certificate_verdict(record, tier, target.alert_days),
            Err(err) => Verdict::Failure {
                state: FailureState::NoTls,
                message: format!("certificate parse error: {err}"),
            },
        },
        ProbeOutcome::Failure { state, message } => Verdict::Failure { state, message },
    };

    CheckResult {
        target: target.view(),
        verdict,
    }
}

pub fn assemble_invalid(invalid: InvalidTarget) -> CheckResult {
    CheckResult {
        target: invalid.view,
        verdict: Verdict::Failure {
            state: FailureState::InvalidTarget,
            message: invalid.reason,
        },
    }
}

fn certificate_verdict(record: CertificateRecord, tier: Tier, alert_days: i64) -> Verdict {
    // Expired certificates always alert, even with a negative threshold.
    let alert = record.days_left < 0 || record.days_left <= alert_days;
    Verdict::Certificate {
        record,
        tier,
        alert,
    }
}

/// Successes by ascending days left, then every failure; ties by host then
/// service label.
pub fn sort_all(mut results: Vec<CheckResult>) -> Vec<CheckResult> {
    results.sort_by(compare);
    results
}

fn compare(a: &CheckResult, b: &CheckResult) -> Ordering {
    let group = |r: &CheckResult| if r.is_success() { 0u8 } else { 1u8 };

    group(a)
        .cmp(&group(b))
        .then_with(|| match (a.days_left(), b.days_left()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => Ordering::Equal,
        })
        .then_with(|| a.target.host.cmp(&b.target.host))
        .then_with(|| a.target.service.cmp(&b.target.service))
}
