use std::sync::OnceLock;
use std::time::Instant;

pub fn now_millis() -> u128 {
    static START: OnceLock<Instant> = OnceLock::new();
    let start = START.get_or_init(Instant::now);
    Instant::now().duration_since(*start).as_millis()
}

/// `1.5s`-style text for log lines and failure messages.
pub fn human_duration(duration: &std::time::Duration) -> String {
    let millis = duration.as_millis();
    if millis % 1000 == 0 {
        return format!("{}s", millis / 1000);
    }
    let fraction = format!("{:03}", millis % 1000);
    format!("{}.{}s", millis / 1000, fraction.trim_end_matches('0'))
}
