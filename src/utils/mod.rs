use chrono::Local;
use std::time::Instant;
use tracing::info;

/// Wall-clock timer that logs its label and elapsed time when dropped.
pub struct Timer {
    label: String,
    start: Instant,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        let label = label.into();
        info!("⏱  {} …", label);
        Self {
            label,
            start: Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        info!("⏱  {} done ({:.2?})", self.label, self.start.elapsed());
    }
}

/// Today's trading date in the local timezone, `YYYY-MM-DD`. The dashboards
/// prefill today when no date is given.
pub fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Format a large integer with thousands separators.
pub fn fmt_number(n: i64) -> String {
    let digits = n.abs().to_string();
    let mut out = String::new();
    for (i, ch) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if n < 0 {
        out.push('-');
    }
    out.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_number() {
        assert_eq!(fmt_number(1_234_567), "1,234,567");
        assert_eq!(fmt_number(0), "0");
        assert_eq!(fmt_number(-42_000), "-42,000");
        assert_eq!(fmt_number(999), "999");
    }

    #[test]
    fn today_is_iso_shaped() {
        let d = today();
        assert_eq!(d.len(), 10);
        assert_eq!(&d[4..5], "-");
        assert_eq!(&d[7..8], "-");
    }
}
