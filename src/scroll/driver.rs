//! Scroll-until-exhausted loop for virtualized lists
//!
//! Each iteration harvests the rendered rows, then scrolls. Growth is the
//! number of new identities the sink accepted. Two independent stagnation
//! signals end a pass:
//!
//! - growth stalls: no new identities for `stagnation_limit` iterations,
//!   with escalation tactics from `escalate_after` stalls onward;
//! - pinned stalls: no growth and neither `scrollTop` nor `scrollHeight`
//!   moved. A non-scrollable container ends on the first one; otherwise one
//!   escalation is attempted and the next pinned stall ends the pass.
//!
//! When the page advertises a total, the iteration budget grows to
//! `ceil(total / 2)` and a short pass is followed by an aggressive final
//! pass of up to `aggressive_passes` bottom-jumps.

use async_trait::async_trait;
use rand::Rng;
use tracing::{debug, info};

use super::surface::{ListSelectors, ScrollAction, ScrollMetrics, ScrollSurface, SurfaceError};
use crate::config::ScrollConfig;
use crate::pacing::random_between;
use crate::session::ScrapeController;

/// Consecutive empty aggressive passes before giving up on the expected total
const AGGRESSIVE_EMPTY_LIMIT: u32 = 3;

/// Wheel delta bands as fractions of the viewport, cycled during escalation
const WHEEL_BANDS: [(f64, f64); 3] = [(0.18, 0.25), (0.35, 0.47), (0.70, 0.90)];

/// Viewport height assumed when the container reports zero
const FALLBACK_VIEWPORT: f64 = 600.0;

/// What the sink did with one batch of rendered rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkFlow {
    /// Newly accepted records
    pub added: usize,
    /// Stop the pass now (stopped, limit reached, navigated away)
    pub halt: bool,
}

/// Consumer of rendered row HTML
#[async_trait]
pub trait ItemSink: Send {
    async fn accept(&mut self, items: Vec<String>) -> SinkFlow;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Stagnation ceiling hit; the list is considered fully loaded
    Exhausted,
    /// Accepted as many records as the page advertised
    ReachedExpected,
    /// The sink asked to stop
    Halted,
    /// The controller was stopped
    Stopped,
    /// Iteration budget used up while still growing
    BudgetSpent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollOutcome {
    pub termination: Termination,
    pub iterations: u32,
    pub accepted: u64,
    pub expected_total: Option<u64>,
}

/// Drives one list to exhaustion through a [`ScrollSurface`]
pub struct VirtualizedScrollDriver<'a, S: ScrollSurface + ?Sized> {
    surface: &'a S,
    list: ListSelectors,
    config: ScrollConfig,
    expected_total: Option<u64>,
}

struct Stagnation {
    growth_stalls: u32,
    escalated_since_growth: bool,
    escalations: u32,
    force_escalation: bool,
}

impl<'a, S: ScrollSurface + ?Sized> VirtualizedScrollDriver<'a, S> {
    #[must_use]
    pub fn new(surface: &'a S, list: ListSelectors, config: ScrollConfig) -> Self {
        Self {
            surface,
            list,
            config,
            expected_total: None,
        }
    }

    #[must_use]
    pub fn with_expected_total(mut self, total: Option<u64>) -> Self {
        self.expected_total = total.filter(|t| *t > 0);
        self
    }

    /// Iteration budget, extended for large advertised totals
    #[must_use]
    pub fn budget(&self) -> u32 {
        let base = self.config.max_iterations;
        match self.expected_total {
            Some(total) => base.max(u32::try_from(total.div_ceil(2)).unwrap_or(u32::MAX)),
            None => base,
        }
    }

    pub async fn run<K: ItemSink + ?Sized>(
        &self,
        controller: &ScrapeController,
        sink: &mut K,
    ) -> Result<ScrollOutcome, SurfaceError> {
        let budget = self.budget();
        let mut accepted: u64 = 0;
        let mut iterations: u32 = 0;
        let mut previous: Option<ScrollMetrics> = None;
        let mut state = Stagnation {
            growth_stalls: 0,
            escalated_since_growth: false,
            escalations: 0,
            force_escalation: false,
        };

        let mut termination = loop {
            if controller.wait_if_paused().await.is_stop() {
                break Termination::Stopped;
            }
            if iterations >= budget {
                break Termination::BudgetSpent;
            }
            iterations += 1;

            let items = self.surface.rendered_items(&self.list).await?;
            let flow = sink.accept(items).await;
            accepted += flow.added as u64;
            if flow.halt {
                break Termination::Halted;
            }
            if self.reached_expected(accepted) {
                break Termination::ReachedExpected;
            }

            let metrics = self.surface.metrics(&self.list).await?;
            if flow.added > 0 {
                state.growth_stalls = 0;
                state.escalated_since_growth = false;
                state.force_escalation = false;
            } else if let Some(before) = previous {
                state.growth_stalls += 1;
                let pinned = metrics.same_position(&before);
                debug!(
                    iteration = iterations,
                    stalls = state.growth_stalls,
                    pinned,
                    scroll_top = metrics.scroll_top,
                    "No list growth"
                );
                if pinned && !metrics.is_scrollable() {
                    break Termination::Exhausted;
                }
                if pinned {
                    if state.escalated_since_growth {
                        break Termination::Exhausted;
                    }
                    state.force_escalation = true;
                }
                if state.growth_stalls >= self.config.stagnation_limit {
                    break Termination::Exhausted;
                }
            }
            previous = Some(metrics);

            if state.force_escalation || state.growth_stalls >= self.config.escalate_after.max(1) {
                self.escalate(&metrics, &mut state).await?;
            } else {
                self.surface
                    .apply(&self.list, self.step_action(&metrics))
                    .await?;
            }
            self.surface.click_load_more(&self.list).await?;
            if controller.sleep_unless_stopped(self.settle_delay()).await.is_stop() {
                break Termination::Stopped;
            }
        };

        if matches!(termination, Termination::Exhausted | Termination::BudgetSpent)
            && self.expected_total.is_some_and(|t| accepted < t)
        {
            let (extra, outcome) = self.aggressive_pass(controller, sink, accepted).await?;
            accepted += extra;
            if let Some(outcome) = outcome {
                termination = outcome;
            }
        }

        info!(
            ?termination,
            iterations,
            accepted,
            expected = ?self.expected_total,
            "Scroll pass finished"
        );
        Ok(ScrollOutcome {
            termination,
            iterations,
            accepted,
            expected_total: self.expected_total,
        })
    }

    fn reached_expected(&self, accepted: u64) -> bool {
        self.expected_total.is_some_and(|t| accepted >= t)
    }

    fn step_action(&self, metrics: &ScrollMetrics) -> ScrollAction {
        let viewport = viewport(metrics);
        if self.config.human {
            let fraction = rand::rng().random_range(
                self.config.human_fraction_min..=self.config.human_fraction_max,
            );
            ScrollAction::ScrollBy {
                dy: viewport * fraction,
                smooth: true,
            }
        } else {
            ScrollAction::ScrollBy {
                dy: viewport * self.config.fast_fraction,
                smooth: false,
            }
        }
    }

    async fn escalate(
        &self,
        metrics: &ScrollMetrics,
        state: &mut Stagnation,
    ) -> Result<(), SurfaceError> {
        let (lo, hi) = WHEEL_BANDS[state.escalations as usize % WHEEL_BANDS.len()];
        let delta = viewport(metrics) * rand::rng().random_range(lo..=hi);
        debug!(escalation = state.escalations, delta, "Escalating scroll tactics");

        for action in [
            ScrollAction::Wheel { delta },
            ScrollAction::LastIntoView,
            ScrollAction::PageDown,
            ScrollAction::JumpToBottom,
        ] {
            self.surface.apply(&self.list, action).await?;
        }
        state.escalations += 1;
        state.escalated_since_growth = true;
        state.force_escalation = false;
        Ok(())
    }

    /// Bottom-jumps until the expected total is reached or passes come up empty
    async fn aggressive_pass<K: ItemSink + ?Sized>(
        &self,
        controller: &ScrapeController,
        sink: &mut K,
        mut accepted: u64,
    ) -> Result<(u64, Option<Termination>), SurfaceError> {
        let start = accepted;
        let mut empty = 0;
        info!(
            accepted,
            expected = ?self.expected_total,
            "Short of expected total, running aggressive final pass"
        );
        for _ in 0..self.config.aggressive_passes {
            if controller.wait_if_paused().await.is_stop() {
                return Ok((accepted - start, Some(Termination::Stopped)));
            }
            self.surface
                .apply(&self.list, ScrollAction::JumpToBottom)
                .await?;
            self.surface.click_load_more(&self.list).await?;
            if controller.sleep_unless_stopped(self.settle_delay()).await.is_stop() {
                return Ok((accepted - start, Some(Termination::Stopped)));
            }
            let flow = sink.accept(self.surface.rendered_items(&self.list).await?).await;
            accepted += flow.added as u64;
            if flow.halt {
                return Ok((accepted - start, Some(Termination::Halted)));
            }
            if self.reached_expected(accepted) {
                return Ok((accepted - start, Some(Termination::ReachedExpected)));
            }
            if flow.added == 0 {
                empty += 1;
                if empty >= AGGRESSIVE_EMPTY_LIMIT {
                    break;
                }
            } else {
                empty = 0;
            }
        }
        Ok((accepted - start, None))
    }

    fn settle_delay(&self) -> std::time::Duration {
        random_between(self.config.settle_min_ms, self.config.settle_max_ms)
    }
}

fn viewport(metrics: &ScrollMetrics) -> f64 {
    if metrics.client_height > 0.0 {
        metrics.client_height
    } else {
        FALLBACK_VIEWPORT
    }
}
