pub mod failure;
pub mod handshake;
pub mod plan;
pub mod tier;

pub use failure::{classify_error, AttemptError, FailureState};
pub use handshake::{Handshake, Handshaker, OpensslHandshaker};
pub use plan::{CipherPolicy, PlanError, ProbeAttempt, ProbeAttemptPlan, ProtocolVersion};
pub use tier::{classify, Tier};

use crate::model::Target;
use crate::util::now_millis;
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Success {
        raw_certificate: Vec<u8>,
        negotiated_version: String,
        tier: Tier,
        used_fallback_no_sni: bool,
    },
    Failure {
        state: FailureState,
        message: String,
    },
}

impl ProbeOutcome {
    pub fn failure_state(&self) -> Option<FailureState> {
        match self {
            ProbeOutcome::Success { .. } => None,
            ProbeOutcome::Failure { state, .. } => Some(*state),
        }
    }
}

/// Where a probe stands within its plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    NotStarted,
    AttemptInProgress(usize),
    Succeeded,
    ExhaustedFailed,
}

impl ProbeState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProbeState::Succeeded | ProbeState::ExhaustedFailed)
    }
}

/// Probes `target` over real TCP/TLS.
pub async fn probe(target: &Target, plan: &ProbeAttemptPlan, timeout: Duration) -> ProbeOutcome {
    probe_with(&OpensslHandshaker, target, plan, timeout).await
}

/// Walks the plan strictly in order and stops at the first certificate. When
/// every attempt fails the last classified failure is reported.
#[instrument(skip_all, fields(endpoint = %target))]
pub async fn probe_with<H: Handshaker + ?Sized>(
    handshaker: &H,
    target: &Target,
    plan: &ProbeAttemptPlan,
    timeout: Duration,
) -> ProbeOutcome {
    let attempts = plan.attempts();
    let mut state = ProbeState::NotStarted;
    let mut peer_failed = false;
    let mut outcome = ProbeOutcome::Failure {
        state: FailureState::Unknown,
        message: "probe plan has no attempts".into(),
    };

    while !state.is_terminal() {
        state = match state {
            ProbeState::NotStarted if attempts.is_empty() => ProbeState::ExhaustedFailed,
            ProbeState::NotStarted => ProbeState::AttemptInProgress(0),
            ProbeState::AttemptInProgress(index) => {
                let attempt = &attempts[index];
                let started = now_millis();
                let result = handshaker.attempt(target, attempt, timeout).await;
                let elapsed_ms = now_millis() - started;

                match result {
                    Ok(handshake) => {
                        let tier = classify(&handshake.version);
                        debug!(
                            attempt = %attempt,
                            version = %handshake.version,
                            %tier,
                            elapsed_ms,
                            "handshake succeeded"
                        );
                        outcome = ProbeOutcome::Success {
                            raw_certificate: handshake.certificate_der,
                            negotiated_version: handshake.version,
                            tier,
                            used_fallback_no_sni: !attempt.use_sni,
                        };
                        ProbeState::Succeeded
                    }
                    Err(err) if err.is_local() => {
                        debug!(attempt = %attempt, error = %err, "attempt skipped");
                        // Keep the peer's last answer; fall back to this only if none exists.
                        if !peer_failed {
                            outcome = ProbeOutcome::Failure {
                                state: classify_error(&err),
                                message: format!("[{attempt}] {err}"),
                            };
                        }
                        next_attempt(index, attempts.len())
                    }
                    Err(err) => {
                        let failure = classify_error(&err);
                        debug!(
                            attempt = %attempt,
                            state = %failure,
                            error = %err,
                            elapsed_ms,
                            "attempt failed"
                        );
                        peer_failed = true;
                        outcome = ProbeOutcome::Failure {
                            state: failure,
                            message: format!("[{attempt}] {err}"),
                        };
                        next_attempt(index, attempts.len())
                    }
                }
            }
            terminal => terminal,
        };
    }

    outcome
}

fn next_attempt(index: usize, total: usize) -> ProbeState {
    if index + 1 < total {
        ProbeState::AttemptInProgress(index + 1)
    } else {
        ProbeState::ExhaustedFailed
    }
}
