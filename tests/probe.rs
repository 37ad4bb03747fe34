mod common;

use chrono::{Duration as ChronoDuration, Utc};
use std::time::Duration;
use tls_posture::assemble::assemble;
use tls_posture::engine::Engine;
use tls_posture::model::{Config, OutputConfig, OutputFormat, Target, Verdict};
use tls_posture::probe::{probe, FailureState, ProbeAttemptPlan, ProbeOutcome, Tier};

fn local(port: u16) -> Target {
    Target::new("127.0.0.1", port, 15)
}

#[tokio::test]
async fn modern_handshake_yields_certificate() {
    let not_after = Utc::now() + ChronoDuration::days(40);
    let (cert, key) = common::self_signed(
        "Example Org",
        "example.com",
        &["example.com", "www.example.com"],
        not_after,
    );
    let addr = common::tls_server(cert, key).await;
    let target = local(addr.port());

    let outcome = probe(&target, &ProbeAttemptPlan::standard(), Duration::from_secs(5)).await;
    match &outcome {
        ProbeOutcome::Success {
            tier,
            used_fallback_no_sni,
            negotiated_version,
            ..
        } => {
            assert_eq!(*tier, Tier::Modern, "negotiated {negotiated_version}");
            assert!(!used_fallback_no_sni);
        }
        other => panic!("expected success, got {other:?}"),
    }

    let result = assemble(&target, outcome);
    match result.verdict {
        Verdict::Certificate {
            record,
            tier,
            alert,
        } => {
            assert_eq!(tier, Tier::Modern);
            assert!(record.chain_incomplete);
            assert_eq!(record.issuer, "Example Org, example.com");
            assert_eq!(
                record.subject_alt_names,
                vec!["example.com".to_string(), "www.example.com".to_string()]
            );
            assert!((38..=40).contains(&record.days_left), "{}", record.days_left);
            assert!(!alert);
        }
        other => panic!("expected certificate, got {other:?}"),
    }
}

#[tokio::test]
async fn refused_port_reports_refused() {
    let addr = common::closed_port().await;
    let target = local(addr.port());

    let outcome = probe(&target, &ProbeAttemptPlan::standard(), Duration::from_secs(2)).await;
    assert_eq!(outcome.failure_state(), Some(FailureState::Refused));

    let record = assemble(&target, outcome).record();
    assert_eq!(record.state, "refused");
    assert!(record.expires.is_none());
    assert!(record.days_left.is_none());
    assert!(record.issuer.is_none());
    assert!(record.san.is_empty());
    assert!(record.chain_incomplete.is_none());
    assert!(record.error.is_some());
}

#[tokio::test]
async fn plain_http_is_not_tls() {
    let addr = common::http_server().await;
    let target = local(addr.port());

    for plan in [ProbeAttemptPlan::standard(), ProbeAttemptPlan::modern_only()] {
        let outcome = probe(&target, &plan, Duration::from_secs(2)).await;
        assert_eq!(
            outcome.failure_state(),
            Some(FailureState::TcpOpenNotTls),
            "unexpected {outcome:?}"
        );
    }
}

#[tokio::test]
async fn silent_server_times_out_on_full_plan() {
    let addr = common::silent_server().await;
    let target = local(addr.port());

    let outcome = probe(&target, &ProbeAttemptPlan::standard(), Duration::from_millis(200)).await;
    assert_eq!(
        outcome.failure_state(),
        Some(FailureState::Timeout),
        "unexpected {outcome:?}"
    );
}

#[tokio::test]
async fn silent_server_times_out_deterministically() {
    let addr = common::silent_server().await;
    let target = local(addr.port());
    let plan = ProbeAttemptPlan::modern_only();

    let first = probe(&target, &plan, Duration::from_millis(200)).await;
    let second = probe(&target, &plan, Duration::from_millis(200)).await;
    assert_eq!(first.failure_state(), Some(FailureState::Timeout));
    assert_eq!(first.failure_state(), second.failure_state());
}

#[tokio::test]
async fn batch_run_orders_results() {
    let (soon_cert, soon_key) = common::self_signed(
        "Example Org",
        "soon.example",
        &["soon.example"],
        Utc::now() + ChronoDuration::days(3),
    );
    let (later_cert, later_key) = common::self_signed(
        "Example Org",
        "later.example",
        &["later.example"],
        Utc::now() + ChronoDuration::days(200),
    );
    let soon = common::tls_server(soon_cert, soon_key).await;
    let later = common::tls_server(later_cert, later_key).await;
    let closed = common::closed_port().await;

    let cfg = Config {
        input: None,
        target: None,
        concurrency: 4,
        timeout: Duration::from_secs(2),
        deadline: Some(Duration::from_secs(30)),
        alert_days: None,
        legacy_probing: false,
        output: OutputConfig {
            format: OutputFormat::Jsonl,
        },
    };
    let engine = Engine::new(&cfg).unwrap();
    let results = engine
        .run(vec![
            Ok(local(later.port()).with_label("later")),
            Ok(local(closed.port()).with_label("closed")),
            Ok(local(soon.port()).with_label("soon")),
        ])
        .await
        .unwrap();

    let labels: Vec<&str> = results.iter().map(|r| r.target.service.as_str()).collect();
    assert_eq!(labels, vec!["soon", "later", "closed"]);
    assert!(results[0].alert());
    assert!(!results[1].alert());
    assert_eq!(results[2].state_label(), "refused");
}
