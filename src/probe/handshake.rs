use super::failure::AttemptError;
use super::plan::ProbeAttempt;
use crate::model::Target;
use async_trait::async_trait;
use openssl::ssl::{SslConnector, SslMethod, SslVerifyMode};
use std::pin::Pin;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_openssl::SslStream;

/// What a completed handshake yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub certificate_der: Vec<u8>,
    pub version: String,
}

#[async_trait]
pub trait Handshaker: Send + Sync {
    /// Runs one attempt on a fresh connection. The connection must be closed
    /// before this returns, whatever the result.
    async fn attempt(
        &self,
        target: &Target,
        attempt: &ProbeAttempt,
        timeout: Duration,
    ) -> Result<Handshake, AttemptError>;
}

/// Real TCP + OpenSSL client.
#[derive(Clone, Debug, Default)]
pub struct OpensslHandshaker;

#[async_trait]
impl Handshaker for OpensslHandshaker {
    async fn attempt(
        &self,
        target: &Target,
        attempt: &ProbeAttempt,
        step_timeout: Duration,
    ) -> Result<Handshake, AttemptError> {
        let tcp = match timeout(
            step_timeout,
            TcpStream::connect((target.host.as_str(), target.port)),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(err)) => return Err(AttemptError::Connect(err)),
            Err(_) => return Err(AttemptError::ConnectTimeout(step_timeout)),
        };

        let connector = connector_for(attempt)?;
        let ssl = connector
            .configure()
            .map_err(|e| AttemptError::Setup(e.to_string()))?
            .use_server_name_indication(attempt.use_sni)
            .verify_hostname(false)
            .into_ssl(&target.host)
            .map_err(|e| AttemptError::Setup(e.to_string()))?;

        // Dropping the stream closes the socket on every path below.
        let mut stream = SslStream::new(ssl, tcp).map_err(|e| AttemptError::Setup(e.to_string()))?;
        match timeout(step_timeout, Pin::new(&mut stream).connect()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => return Err(handshake_error(err.to_string())),
            Err(_) => return Err(AttemptError::HandshakeTimeout(step_timeout)),
        }

        let ssl = stream.ssl();
        let certificate = ssl.peer_certificate().ok_or(AttemptError::NoCertificate)?;
        let certificate_der = certificate
            .to_der()
            .map_err(|e| AttemptError::Handshake(e.to_string()))?;

        Ok(Handshake {
            certificate_der,
            version: ssl.version_str().to_string(),
        })
    }
}

/// OpenSSL raises this before sending a byte when every version in the
/// configured range is compiled out or disabled.
const NO_LOCAL_PROTOCOLS: &str = "no protocols available";

fn handshake_error(message: String) -> AttemptError {
    if message.to_ascii_lowercase().contains(NO_LOCAL_PROTOCOLS) {
        AttemptError::Unsupported(message)
    } else {
        AttemptError::Handshake(message)
    }
}

/// Builds a fresh context per attempt so no session cache outlives it.
fn connector_for(attempt: &ProbeAttempt) -> Result<SslConnector, AttemptError> {
    let setup = |e: openssl::error::ErrorStack| AttemptError::Setup(e.to_string());
    let unsupported = |e: openssl::error::ErrorStack| AttemptError::Unsupported(e.to_string());

    let mut builder = SslConnector::builder(SslMethod::tls()).map_err(setup)?;
    // Posture probing only: trust and hostname are never checked.
    builder.set_verify(SslVerifyMode::NONE);
    if let Some(ciphers) = attempt.cipher_policy.cipher_list() {
        builder.set_cipher_list(ciphers).map_err(setup)?;
    }
    builder
        .set_min_proto_version(Some(attempt.min_version.to_openssl()))
        .map_err(unsupported)?;
    builder
        .set_max_proto_version(Some(attempt.max_version.to_openssl()))
        .map_err(unsupported)?;
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::plan::ProbeAttemptPlan;

    #[test]
    fn builds_connectors_for_every_standard_attempt() {
        for attempt in ProbeAttemptPlan::standard().attempts() {
            // SSLv3 may be compiled out; that must surface as a value, not a panic.
            let _ = connector_for(attempt);
        }
        let plan = ProbeAttemptPlan::standard();
        let modern = &plan.attempts()[0];
        assert!(connector_for(modern).is_ok());
    }

    #[test]
    fn missing_local_protocols_are_unsupported() {
        let err = handshake_error(
            "error:0A0000BF:SSL routines:tls_setup_handshake:no protocols available".into(),
        );
        assert!(matches!(err, AttemptError::Unsupported(_)));

        let err = handshake_error(
            "error:0A00010B:SSL routines:ssl3_get_record:wrong version number".into(),
        );
        assert!(matches!(err, AttemptError::Handshake(_)));
    }
}
