use crate::types::PostureStatus;

/// Decides when a sustained bad stretch should actually notify. A bad status
/// must hold for the configured delay before firing, and fires are rate
/// limited by a cooldown so consecutive stretches cannot spam.
#[derive(Debug, Default)]
pub struct AlertScheduler {
    bad_since_ms: Option<i64>,
    last_alert_ms: Option<i64>,
}

impl AlertScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one status tick and returns whether an alert fires now.
    ///
    /// Reaching the delay restarts the timer whether or not the cooldown
    /// allowed the fire, so a stretch suppressed by cooldown still has to
    /// sustain another full delay before the next attempt.
    pub fn on_status(
        &mut self,
        status: PostureStatus,
        now_ms: i64,
        delay_secs: u64,
        cooldown_ms: i64,
    ) -> bool {
        if status.is_good() {
            self.bad_since_ms = None;
            return false;
        }

        let since = *self.bad_since_ms.get_or_insert(now_ms);
        if now_ms - since < delay_secs as i64 * 1000 {
            return false;
        }
        self.bad_since_ms = Some(now_ms);

        let cooled = self
            .last_alert_ms
            .map_or(true, |last| now_ms - last >= cooldown_ms);
        if cooled {
            self.last_alert_ms = Some(now_ms);
        }
        cooled
    }

    pub fn clear(&mut self) {
        self.bad_since_ms = None;
        self.last_alert_ms = None;
    }
}
