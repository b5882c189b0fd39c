#[cfg(test)]
#[path = "throttle_test.rs"]
mod tests;

use std::time::Duration;

use tokio::time::Instant;

pub const MIN_REQUEST_DELAY: Duration = Duration::from_millis(3000);

/// Client-side admission control: one accepted request per `min_delay`.
pub struct RequestThrottle {
    min_delay: Duration,
    last_request: Option<Instant>,
}

impl Default for RequestThrottle {
    fn default() -> RequestThrottle {
        return RequestThrottle::new(MIN_REQUEST_DELAY);
    }
}

impl RequestThrottle {
    pub fn new(min_delay: Duration) -> RequestThrottle {
        return RequestThrottle {
            min_delay,
            last_request: None,
        };
    }

    /// Records `now` as the last request when admitted. Otherwise returns how
    /// long the caller still has to wait, leaving the state untouched.
    pub fn admit(&mut self, now: Instant) -> Result<(), Duration> {
        if let Some(last_request) = self.last_request {
            let elapsed = now.saturating_duration_since(last_request);
            if elapsed < self.min_delay {
                return Err(self.min_delay - elapsed);
            }
        }

        self.last_request = Some(now);
        return Ok(());
    }
}

pub fn whole_seconds(wait: Duration) -> u64 {
    let millis = wait.as_millis() as u64;
    return millis.div_ceil(1000);
}
