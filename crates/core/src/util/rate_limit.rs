use std::time::{Duration, Instant};

/// Gate for warnings that would otherwise repeat every tick.
#[derive(Debug)]
pub struct RateLimitedWarn {
    interval: Duration,
    last: Option<Instant>,
    suppressed: u64,
}

impl RateLimitedWarn {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
            suppressed: 0,
        }
    }

    /// Returns the number of warnings swallowed since the last one logged, or
    /// `None` if this one should be swallowed too.
    pub fn should_log(&mut self, now: Instant) -> Option<u64> {
        match self.last {
            Some(prev) if now.saturating_duration_since(prev) < self.interval => {
                self.suppressed += 1;
                None
            }
            _ => {
                self.last = Some(now);
                Some(std::mem::take(&mut self.suppressed))
            }
        }
    }

    pub fn reset(&mut self) {
        self.last = None;
        self.suppressed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_is_rate_limited() {
        let t0 = Instant::now();
        let mut limiter = RateLimitedWarn::new(Duration::from_secs(5));

        assert_eq!(limiter.should_log(t0), Some(0));
        assert_eq!(limiter.should_log(t0 + Duration::from_secs(1)), None);
        assert_eq!(limiter.should_log(t0 + Duration::from_secs(2)), None);
        assert_eq!(limiter.should_log(t0 + Duration::from_secs(5)), Some(2));
    }

    #[test]
    fn reset_logs_next_immediately() {
        let t0 = Instant::now();
        let mut limiter = RateLimitedWarn::new(Duration::from_secs(5));
        assert!(limiter.should_log(t0).is_some());
        limiter.reset();
        assert_eq!(limiter.should_log(t0), Some(0));
    }
}
