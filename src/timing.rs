use log::debug;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct RequestTimer {
    start: Instant,
    first_byte: Option<Duration>,
    total: Option<Duration>,
}

impl RequestTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
            first_byte: None,
            total: None,
        }
    }

    pub fn record_first_byte(&mut self) {
        self.first_byte = Some(self.start.elapsed());
    }

    pub fn finish(&mut self) {
        self.total = Some(self.start.elapsed());
    }

    pub fn total_time(&self) -> Option<Duration> {
        self.total
    }

    /// One-line summary, e.g. `ttfb 120.00 ms, total 131.52 ms`.
    pub fn summary(&self) -> Option<String> {
        let total = self.total?;
        Some(match self.first_byte {
            Some(ttfb) => format!("ttfb {}, total {}", format_duration(ttfb), format_duration(total)),
            None => format!("total {}", format_duration(total)),
        })
    }

    pub fn log_summary(&self, label: &str) {
        if let Some(summary) = self.summary() {
            debug!("{}: {}", label, summary);
        }
    }
}

pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_secs_f64() * 1000.0;

    if total_ms < 1.0 {
        format!("{:.2} µs", total_ms * 1000.0)
    } else if total_ms < 1000.0 {
        format!("{:.2} ms", total_ms)
    } else {
        format!("{:.2} s", total_ms / 1000.0)
    }
}
