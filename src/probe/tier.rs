use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse strength of a negotiated protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    #[serde(rename = "tls_modern")]
    Modern,
    #[serde(rename = "tls_legacy")]
    Legacy,
    #[serde(rename = "ssl_obsolete")]
    Obsolete,
    #[serde(rename = "unknown")]
    Unknown,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Modern => "tls_modern",
            Tier::Legacy => "tls_legacy",
            Tier::Obsolete => "ssl_obsolete",
            Tier::Unknown => "unknown",
        }
    }

    /// Higher is stronger. `Unknown` ranks below everything.
    pub fn rank(&self) -> u8 {
        match self {
            Tier::Modern => 3,
            Tier::Legacy => 2,
            Tier::Obsolete => 1,
            Tier::Unknown => 0,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Maps an OpenSSL version string (`TLSv1.3`, `TLSv1`, `SSLv3`, ...) to a tier.
pub fn classify(version: &str) -> Tier {
    let version = version.trim();
    if version.contains("1.3") || version.contains("1.2") {
        Tier::Modern
    } else if version.contains("1.1") || version == "TLSv1" || version == "TLSv1.0" {
        Tier::Legacy
    } else if version.starts_with("SSL") {
        Tier::Obsolete
    } else {
        Tier::Unknown
    }
}
