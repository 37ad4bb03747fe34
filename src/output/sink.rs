use crate::model::{CheckResult, OutputConfig, OutputFormat};
use std::io::{BufWriter, Write};

pub struct OutputSink {
    cfg: OutputConfig,
    writer: BufWriter<Box<dyn Write + Send>>,
}

impl OutputSink {
    pub fn new(cfg: OutputConfig, writer: Box<dyn Write + Send>) -> Self {
        Self {
            cfg,
            writer: BufWriter::new(writer),
        }
    }

    pub fn stdout(cfg: OutputConfig) -> Self {
        Self::new(cfg, Box::new(std::io::stdout()))
    }

    pub fn write_result(&mut self, result: &CheckResult) -> anyhow::Result<()> {
        match self.cfg.format {
            OutputFormat::Jsonl => {
                let line = serde_json::to_string(&result.record())?;
                writeln!(self.writer, "{line}")?;
            }
            OutputFormat::Pretty => {
                let line = pretty_line(result);
                writeln!(self.writer, "{line}")?;
            }
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn flush(&mut self) {
        let _ = self.writer.flush();
    }
}

fn pretty_line(result: &CheckResult) -> String {
    let record = result.record();
    let port = record
        .port
        .map(|p| p.to_string())
        .unwrap_or_else(|| "-".into());
    let service = if record.service.is_empty() {
        String::new()
    } else {
        format!("[{}] ", record.service)
    };
    let head = format!("{service}{}:{} -> {}", record.domain, port, record.state);

    if let Some(error) = &record.error {
        return format!("{head}\n  error: {error}");
    }

    let expires = record
        .expires
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    let days = record.days_left.unwrap_or_default();
    let flag = if record.alert { "  ALERT" } else { "" };
    let mut text = format!("{head}  expires {expires} ({days} days){flag}");
    if let Some(issuer) = &record.issuer {
        text.push_str(&format!("\n  issuer: {issuer}"));
    }
    if !record.san.is_empty() {
        text.push_str(&format!("\n  san: {}", record.san.join(", ")));
    }
    if record.chain_incomplete == Some(true) {
        text.push_str("\n  chain: unverified");
    }
    text
}
