use serde::Serialize;

/// Minimum interval between accepted submissions, in milliseconds.
pub const THROTTLE_WINDOW_MS: i64 = 10_000;

pub const THROTTLE_ALERT: &str = "Please wait for 10 seconds between requests.";

/// Client-side cooldown between accepted submissions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubmissionThrottle {
    /// Milliseconds since the Unix epoch; 0 until the first accepted submission.
    pub last_submit_ms: i64,
}

impl SubmissionThrottle {
    /// Accepts the submission and records `now_ms`, or returns the milliseconds
    /// left in the window. A rejected attempt leaves the timestamp unchanged.
    pub fn try_acquire(&mut self, now_ms: i64) -> Result<(), i64> {
        let elapsed = now_ms - self.last_submit_ms;
        if elapsed < THROTTLE_WINDOW_MS {
            return Err(THROTTLE_WINDOW_MS - elapsed);
        }
        self.last_submit_ms = now_ms;
        Ok(())
    }
}
