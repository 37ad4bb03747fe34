//! Live TLS posture probing for a fleet of endpoints.
//!
//! Each target is walked through a [`probe::ProbeAttemptPlan`] (strongest
//! protocol first, falling back to weaker ones) until a handshake yields a
//! certificate. The leaf certificate is parsed without any trust validation
//! and folded into a [`model::CheckResult`].

pub mod assemble;
pub mod certificate;
pub mod engine;
pub mod input;
pub mod model;
pub mod notify;
pub mod output;
pub mod probe;
pub mod util;
