use crate::assemble::{assemble, assemble_invalid, sort_all};
use crate::model::{CheckResult, Config, Target, TargetEntry, Verdict};
use crate::probe::{probe_with, FailureState, Handshaker, OpensslHandshaker, ProbeAttemptPlan};
use crate::util::{human_duration, now_millis};
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, instrument, warn};

/// Runs one probe per target across a bounded pool and returns the sorted
/// results.
pub struct Engine {
    plan: Arc<ProbeAttemptPlan>,
    handshaker: Arc<dyn Handshaker>,
    sem: Arc<Semaphore>,
    timeout: Duration,
    deadline: Option<Duration>,
}

impl Engine {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let plan = if cfg.legacy_probing {
            ProbeAttemptPlan::standard()
        } else {
            ProbeAttemptPlan::modern_only()
        };
        Self::with_handshaker(cfg, plan, Arc::new(OpensslHandshaker))
    }

    pub fn with_handshaker(
        cfg: &Config,
        plan: ProbeAttemptPlan,
        handshaker: Arc<dyn Handshaker>,
    ) -> anyhow::Result<Self> {
        if cfg.concurrency == 0 {
            anyhow::bail!("concurrency must be greater than zero");
        }
        if cfg.timeout.is_zero() {
            anyhow::bail!("timeout must be greater than zero");
        }

        Ok(Self {
            plan: Arc::new(plan),
            handshaker,
            sem: Arc::new(Semaphore::new(cfg.concurrency)),
            timeout: cfg.timeout,
            deadline: cfg.deadline,
        })
    }

    pub fn plan(&self) -> &ProbeAttemptPlan {
        &self.plan
    }

    #[instrument(skip_all, fields(targets = entries.len()))]
    pub async fn run(&self, entries: Vec<TargetEntry>) -> anyhow::Result<Vec<CheckResult>> {
        let started = now_millis();
        let deadline = self.deadline.map(|d| Instant::now() + d);
        let mut results = Vec::with_capacity(entries.len());
        let mut tasks = FuturesUnordered::new();

        for entry in entries {
            let target = match entry {
                Ok(target) => target,
                Err(invalid) => {
                    warn!(host = %invalid.view.host, reason = %invalid.reason, "skipping invalid target");
                    results.push(assemble_invalid(invalid));
                    continue;
                }
            };

            let permit = self.sem.clone().acquire_owned().await?;
            let plan = self.plan.clone();
            let handshaker = self.handshaker.clone();
            let step_timeout = self.timeout;
            let batch_deadline = self.deadline;
            let task_target = target.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                let probe = probe_with(handshaker.as_ref(), &task_target, &plan, step_timeout);
                let outcome = match deadline {
                    Some(at) => match timeout_at(at, probe).await {
                        Ok(outcome) => outcome,
                        Err(_) => {
                            return deadline_exceeded(&task_target, batch_deadline);
                        }
                    },
                    None => probe.await,
                };
                assemble(&task_target, outcome)
            });
            tasks.push(async move { (target, handle.await) });
        }

        while let Some((target, joined)) = tasks.next().await {
            let result = match joined {
                Ok(result) => result,
                Err(err) => {
                    warn!(endpoint = %target, error = %err, "probe task failed");
                    CheckResult {
                        target: target.view(),
                        verdict: Verdict::Failure {
                            state: FailureState::Unknown,
                            message: format!("probe task failed: {err}"),
                        },
                    }
                }
            };
            debug!(endpoint = %target, state = result.state_label(), "target finished");
            results.push(result);
        }

        let results = sort_all(results);
        let alerts = results.iter().filter(|r| r.alert()).count();
        let failures = results.iter().filter(|r| !r.is_success()).count();
        info!(
            total = results.len(),
            alerts,
            failures,
            ms = now_millis() - started,
            "run complete"
        );
        Ok(results)
    }
}

fn deadline_exceeded(target: &Target, deadline: Option<Duration>) -> CheckResult {
    let limit = deadline
        .map(|d| format!(" of {}", human_duration(&d)))
        .unwrap_or_default();
    CheckResult {
        target: target.view(),
        verdict: Verdict::Failure {
            state: FailureState::Timeout,
            message: format!("batch deadline{limit} exceeded"),
        },
    }
}
