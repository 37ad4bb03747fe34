use super::tier::Tier;
use openssl::ssl::SslVersion;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProtocolVersion {
    Ssl3,
    Tls1,
    Tls1_1,
    Tls1_2,
    Tls1_3,
}

impl ProtocolVersion {
    pub fn to_openssl(self) -> SslVersion {
        match self {
            ProtocolVersion::Ssl3 => SslVersion::SSL3,
            ProtocolVersion::Tls1 => SslVersion::TLS1,
            ProtocolVersion::Tls1_1 => SslVersion::TLS1_1,
            ProtocolVersion::Tls1_2 => SslVersion::TLS1_2,
            ProtocolVersion::Tls1_3 => SslVersion::TLS1_3,
        }
    }
}

/// Cipher selection for one attempt.
///
/// `PermitLegacy` drops OpenSSL's security level to zero so export-grade and
/// RC4/3DES suites can still be offered. It exists only to fingerprint old
/// servers and must be opted into per attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherPolicy {
    Standard,
    PermitLegacy,
}

impl CipherPolicy {
    pub fn cipher_list(&self) -> Option<&'static str> {
        match self {
            CipherPolicy::Standard => None,
            CipherPolicy::PermitLegacy => Some("ALL:@SECLEVEL=0"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeAttempt {
    pub label: Tier,
    pub min_version: ProtocolVersion,
    pub max_version: ProtocolVersion,
    pub use_sni: bool,
    pub cipher_policy: CipherPolicy,
}

impl ProbeAttempt {
    pub fn new(
        label: Tier,
        min_version: ProtocolVersion,
        max_version: ProtocolVersion,
        use_sni: bool,
        cipher_policy: CipherPolicy,
    ) -> Self {
        Self {
            label,
            min_version,
            max_version,
            use_sni,
            cipher_policy,
        }
    }
}

impl fmt::Display for ProbeAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tier = match self.label {
            Tier::Modern => "modern",
            Tier::Legacy => "legacy",
            Tier::Obsolete => "obsolete",
            Tier::Unknown => "unknown",
        };
        let sni = if self.use_sni { "sni" } else { "no-sni" };
        write!(f, "{tier} {sni}")
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("probe plan has no attempts")]
    Empty,
    #[error("attempt {index} has no tier label")]
    UnlabelledAttempt { index: usize },
    #[error("attempt {index} has min version above max version")]
    InvertedBounds { index: usize },
    #[error("attempt {index} ({label}) is stronger than the attempt before it")]
    OutOfOrder { index: usize, label: Tier },
}

/// Ordered handshake configurations, strongest first.
///
/// Built once and shared read-only by every probe in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeAttemptPlan {
    attempts: Vec<ProbeAttempt>,
}

impl ProbeAttemptPlan {
    /// Validates a custom ordering. Attempts of the same tier may appear in any
    /// order, which lets callers try SNI-less first for servers known to choke
    /// on the extension.
    pub fn new(attempts: Vec<ProbeAttempt>) -> Result<Self, PlanError> {
        if attempts.is_empty() {
            return Err(PlanError::Empty);
        }

        let mut previous: Option<Tier> = None;
        for (index, attempt) in attempts.iter().enumerate() {
            if attempt.label == Tier::Unknown {
                return Err(PlanError::UnlabelledAttempt { index });
            }
            if attempt.min_version > attempt.max_version {
                return Err(PlanError::InvertedBounds { index });
            }
            if let Some(prev) = previous {
                if attempt.label.rank() > prev.rank() {
                    return Err(PlanError::OutOfOrder {
                        index,
                        label: attempt.label,
                    });
                }
            }
            previous = Some(attempt.label);
        }

        Ok(Self { attempts })
    }

    pub fn standard() -> Self {
        use CipherPolicy::*;
        use ProtocolVersion::*;

        Self {
            attempts: vec![
                ProbeAttempt::new(Tier::Modern, Tls1_2, Tls1_3, true, Standard),
                ProbeAttempt::new(Tier::Modern, Tls1_2, Tls1_3, false, Standard),
                ProbeAttempt::new(Tier::Legacy, Tls1, Tls1_1, true, PermitLegacy),
                ProbeAttempt::new(Tier::Legacy, Tls1, Tls1_1, false, PermitLegacy),
                // SSLv3 predates SNI.
                ProbeAttempt::new(Tier::Obsolete, Ssl3, Ssl3, false, PermitLegacy),
            ],
        }
    }

    /// The standard plan without any permissive attempt.
    pub fn modern_only() -> Self {
        let attempts = Self::standard()
            .attempts
            .into_iter()
            .filter(|a| a.cipher_policy == CipherPolicy::Standard)
            .collect();
        Self { attempts }
    }

    pub fn attempts(&self) -> &[ProbeAttempt] {
        &self.attempts
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }
}

impl Default for ProbeAttemptPlan {
    fn default() -> Self {
        Self::standard()
    }
}
