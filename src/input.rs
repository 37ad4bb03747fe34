use crate::model::{
    Config, InvalidTarget, Target, TargetEntry, TargetView, DEFAULT_ALERT_DAYS, DEFAULT_PORT,
};
use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

/// Monitoring config file as written for the dashboard and notifier.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TargetFile {
    #[serde(default)]
    pub notify_before_days: Option<i64>,
    #[serde(default)]
    pub domains: Vec<DomainSlot>,
}

/// A `domains` element. Anything that does not fit [`DomainEntry`] is kept as
/// raw JSON so only that target fails.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DomainSlot {
    Entry(DomainEntry),
    Malformed(Value),
}

#[derive(Debug, Clone, Deserialize)]
pub struct DomainEntry {
    #[serde(alias = "host", default)]
    pub url: Option<String>,
    #[serde(default)]
    pub port: Option<i64>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub alert_days: Option<i64>,
}

/// Collects every configured target. Broken entries come back as `Err` so the
/// run can report them alongside real results.
pub async fn load_targets(cfg: &Config) -> anyhow::Result<Vec<TargetEntry>> {
    let mut entries = Vec::new();

    let default_days = cfg.alert_days.unwrap_or(DEFAULT_ALERT_DAYS);

    if let Some((host, port)) = cfg.target.clone() {
        entries.push(validate(Some(host), Some(i64::from(port)), None, default_days));
    }

    if let Some(path) = cfg.input.as_deref() {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("cannot open input {path}"))?;
        if is_json(path, &content) {
            let file = serde_json::from_str::<TargetFile>(&content)
                .with_context(|| format!("invalid target config {path}"))?;
            entries.extend(resolve(file, cfg.alert_days));
        } else {
            entries.extend(parse_lines(&content, default_days));
        }
    }

    Ok(entries)
}

fn is_json(path: &str, content: &str) -> bool {
    Path::new(path)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
        || content.trim_start().starts_with('{')
}

/// Applies the global threshold (CLI override, then file, then built-in).
pub fn resolve(file: TargetFile, cli_alert_days: Option<i64>) -> Vec<TargetEntry> {
    let default_days = cli_alert_days
        .or(file.notify_before_days)
        .unwrap_or(DEFAULT_ALERT_DAYS);

    file.domains
        .into_iter()
        .map(|slot| match slot {
            DomainSlot::Entry(entry) => validate(
                entry.url,
                entry.port,
                entry.service_name,
                entry.alert_days.unwrap_or(default_days),
            ),
            DomainSlot::Malformed(value) => Err(malformed(&value)),
        })
        .collect()
}

const ENTRY_FIELDS: &[&str] = &["url", "host", "port", "service_name", "alert_days"];

fn field_accepts(name: &str, value: &Value) -> bool {
    match name {
        "port" | "alert_days" => value.is_i64(),
        _ => value.is_string(),
    }
}

/// Keeps whatever identifies the entry and names the first offending field.
fn malformed(value: &Value) -> InvalidTarget {
    let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
    let view = TargetView {
        service: text("service_name").unwrap_or_default(),
        host: text("url").or_else(|| text("host")).unwrap_or_default(),
        port: value
            .get("port")
            .and_then(Value::as_u64)
            .and_then(|p| u16::try_from(p).ok()),
    };

    let reason = match value.as_object() {
        None => format!("entry {value} is not an object"),
        Some(fields) => ENTRY_FIELDS
            .iter()
            .find_map(|name| {
                fields
                    .get(*name)
                    .filter(|v| !v.is_null() && !field_accepts(name, v))
                    .map(|v| format!("field {name:?} has an unusable value {v}"))
            })
            .unwrap_or_else(|| "entry could not be read".to_string()),
    };

    InvalidTarget { view, reason }
}

fn validate(
    host: Option<String>,
    port: Option<i64>,
    service: Option<String>,
    alert_days: i64,
) -> TargetEntry {
    let host = host.map(|h| h.trim().to_string()).unwrap_or_default();
    let service = service.filter(|s| !s.trim().is_empty());
    let view = |port: Option<u16>| TargetView {
        service: service.clone().unwrap_or_default(),
        host: host.clone(),
        port,
    };
    let invalid = |port: Option<u16>, reason: String| InvalidTarget {
        view: view(port),
        reason,
    };

    let port = match port {
        None => DEFAULT_PORT,
        Some(p) => match u16::try_from(p) {
            Ok(p) if p != 0 => p,
            _ => return Err(invalid(None, format!("port {p} is out of range"))),
        },
    };

    if host.is_empty() {
        return Err(invalid(Some(port), "host is missing".into()));
    }
    if host.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err(invalid(Some(port), format!("host {host:?} is not a hostname")));
    }

    Ok(Target {
        host: host.clone(),
        port,
        service_label: service.clone(),
        alert_days,
    })
}

/// Plain lists: one `host[:port]` per line, `#` comments allowed.
fn parse_lines(content: &str, alert_days: i64) -> Vec<TargetEntry> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            let (host, port) = split_host_port(line);
            match port.map(str::parse::<i64>).transpose() {
                Ok(port) => validate(Some(host), port, None, alert_days),
                Err(_) => Err(InvalidTarget {
                    view: TargetView {
                        service: String::new(),
                        host,
                        port: None,
                    },
                    reason: format!("port {:?} is not a number", port.unwrap_or_default()),
                }),
            }
        })
        .collect()
}

fn split_host_port(line: &str) -> (String, Option<&str>) {
    if let Some(rest) = line.strip_prefix('[') {
        if let Some((host, tail)) = rest.split_once(']') {
            return (host.to_string(), tail.strip_prefix(':'));
        }
    }
    match line.rsplit_once(':') {
        // A bare IPv6 literal has more than one colon and no port.
        Some((host, port)) if !host.contains(':') => (host.to_string(), Some(port)),
        _ => (line.to_string(), None),
    }
}
