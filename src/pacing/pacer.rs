//! Human pacing between processed records

use rand::Rng;
use std::time::Duration;
use tracing::info;

use crate::config::PacingConfig;
use crate::leads::LeadKind;
use crate::session::{Flow, ScrapeController};

/// Uniform random duration in `[min_ms, max_ms]`
#[must_use]
pub fn random_between(min_ms: u64, max_ms: u64) -> Duration {
    if max_ms <= min_ms {
        return Duration::from_millis(min_ms);
    }
    Duration::from_millis(rand::rng().random_range(min_ms..=max_ms))
}

#[derive(Debug, Clone)]
pub struct Pacer {
    config: PacingConfig,
}

impl Pacer {
    #[must_use]
    pub fn new(config: PacingConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn item_delay(&self) -> Duration {
        random_between(self.config.item_delay_min_ms, self.config.item_delay_max_ms)
    }

    /// Cooldown length if `processed` lands on a cooldown boundary
    #[must_use]
    pub fn cooldown_due(&self, processed: u64) -> Option<Duration> {
        let every = self.config.cooldown_every;
        (every > 0 && processed > 0 && processed % every == 0)
            .then(|| random_between(self.config.cooldown_min_ms, self.config.cooldown_max_ms))
    }

    /// Delay after one record, plus the periodic cooldown for kinds that need it
    ///
    /// Both waits end early with `Flow::Stop` if the session is stopped.
    pub async fn after_record(
        &self,
        controller: &ScrapeController,
        kind: LeadKind,
        processed: u64,
    ) -> Flow {
        if controller.sleep_unless_stopped(self.item_delay()).await.is_stop() {
            return Flow::Stop;
        }
        if kind.needs_cooldown()
            && let Some(cooldown) = self.cooldown_due(processed)
        {
            info!(processed, secs = cooldown.as_secs(), "Cooling down to mimic human pacing");
            return controller.sleep_unless_stopped(cooldown).await;
        }
        Flow::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leads::Platform;

    fn config() -> PacingConfig {
        PacingConfig {
            item_delay_min_ms: 0,
            item_delay_max_ms: 0,
            cooldown_every: 3,
            cooldown_min_ms: 30_000,
            cooldown_max_ms: 60_000,
            ..PacingConfig::default()
        }
    }

    #[test]
    fn cooldown_every_nth_record() {
        let pacer = Pacer::new(config());
        assert!(pacer.cooldown_due(0).is_none());
        assert!(pacer.cooldown_due(2).is_none());
        let d = pacer.cooldown_due(3).expect("due");
        assert!(d >= Duration::from_secs(30) && d <= Duration::from_secs(60));
        assert!(pacer.cooldown_due(6).is_some());
    }

    #[test]
    fn random_between_stays_in_range() {
        for _ in 0..100 {
            let d = random_between(1_000, 4_000);
            assert!(d >= Duration::from_secs(1) && d <= Duration::from_secs(4));
        }
        assert_eq!(random_between(5, 5), Duration::from_millis(5));
    }

    #[tokio::test]
    async fn cooldown_is_interruptible_by_stop() {
        let controller = std::sync::Arc::new(
            ScrapeController::new(Platform::LinkedIn, LeadKind::Reaction)
                .with_poll_interval(Duration::from_millis(5)),
        );
        controller.start().expect("start");
        let pacer = Pacer::new(config());
        let task = {
            let controller = std::sync::Arc::clone(&controller);
            tokio::spawn(async move { pacer.after_record(&controller, LeadKind::Reaction, 3).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        controller.stop();
        let flow = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("cooldown interrupted")
            .expect("join");
        assert_eq!(flow, Flow::Stop);
    }

    #[tokio::test]
    async fn comments_skip_cooldown() {
        let controller = ScrapeController::new(Platform::LinkedIn, LeadKind::Comment);
        controller.start().expect("start");
        let pacer = Pacer::new(config());
        let flow = tokio::time::timeout(
            Duration::from_millis(500),
            pacer.after_record(&controller, LeadKind::Comment, 3),
        )
        .await
        .expect("no cooldown for comments");
        assert_eq!(flow, Flow::Continue);
    }
}
