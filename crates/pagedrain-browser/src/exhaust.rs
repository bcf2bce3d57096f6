//! Scroll exhaustion for infinite-scroll and "load more" pages.
//!
//! [`ScrollExhauster`] advances a loaded page in discrete steps, either by
//! scrolling the window to the bottom of the body or by clicking a
//! "load more" control, and re-measures the document height after each
//! step. The session ends when an advance stops growing the page, or when
//! the page budget, iteration cap or deadline is reached.

use crate::actions::PageActions;
use crate::error::{BrowserError, Result};
use chrono::Utc;
use pagedrain_core::{BackoffMode, CssSelector, ExhaustOutcome, ScrollConfig, TerminationReason};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Loop-scoped state of one exhaustion run.
///
/// Created when a run starts and dropped when it ends; nothing carries
/// over between runs or navigations.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ScrollSession {
    height: u64,
    delay: Duration,
    pages_visited: u32,
    iterations: u32,
    stalls: u32,
}

impl ScrollSession {
    fn new(initial_delay: Duration) -> Self {
        Self {
            height: 0,
            delay: initial_delay,
            pages_visited: 0,
            iterations: 0,
            stalls: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wake {
    Elapsed,
    Deadline,
}

/// Drives a page until no further content loads.
#[derive(Debug, Clone)]
pub struct ScrollExhauster {
    control: Option<CssSelector>,
    max_pages: Option<u32>,
    max_iterations: Option<u32>,
    initial_delay: Duration,
    stall_delay: Duration,
    delay_increment: Duration,
    max_delay: Option<Duration>,
    deadline: Option<Duration>,
    backoff: BackoffMode,
}

impl ScrollExhauster {
    /// Build an exhauster from a validated policy.
    pub fn new(config: ScrollConfig) -> Result<Self> {
        config.validate()?;

        let control = config
            .control_selector
            .as_deref()
            .map(CssSelector::new)
            .transpose()?;

        Ok(Self {
            control,
            max_pages: config.max_pages,
            max_iterations: config.max_iterations,
            initial_delay: config.initial_delay(),
            stall_delay: config.stall_delay(),
            delay_increment: config.delay_increment(),
            max_delay: config.max_delay(),
            deadline: config.deadline(),
            backoff: config.backoff,
        })
    }

    /// Advance `page` until it stops growing or a cap is reached.
    ///
    /// Caps end the run with `Ok`; the returned outcome names which one.
    ///
    /// # Errors
    /// - [`BrowserError::Cancelled`] if `cancel` fires
    /// - any error raised by `page` while measuring, scrolling or clicking
    pub async fn exhaust<P>(&self, page: &P, cancel: &CancellationToken) -> Result<ExhaustOutcome>
    where
        P: PageActions + ?Sized,
    {
        let started = Instant::now();
        // A deadline beyond the clock's range never fires
        let deadline = self.deadline.and_then(|d| started.checked_add(d));
        let mut session = ScrollSession::new(self.initial_delay);

        loop {
            if cancel.is_cancelled() {
                return Err(BrowserError::Cancelled);
            }
            if let Some(reason) = self.limit_reached(&session, deadline) {
                return Ok(Self::finish(&session, reason, started));
            }

            let before = until_cancelled(cancel, page.content_height()).await?;
            session.height = before;
            until_cancelled(cancel, self.advance(page, before)).await?;
            session.iterations += 1;

            if Self::suspend(session.delay, cancel, deadline).await? == Wake::Deadline {
                return Ok(Self::finish(&session, TerminationReason::DeadlineExceeded, started));
            }

            let after = until_cancelled(cancel, page.content_height()).await?;
            if after > before {
                self.record_growth(&mut session, after);
                tracing::debug!(
                    "Page grew {} -> {} (page {}, delay {:?})",
                    before,
                    after,
                    session.pages_visited,
                    session.delay
                );
                continue;
            }

            self.record_stall(&mut session);
            tracing::debug!(
                "Stall at height {} (stall {}, next delay {:?}), waiting {:?} grace",
                before,
                session.stalls,
                session.delay,
                self.stall_delay
            );

            if Self::suspend(self.stall_delay, cancel, deadline).await? == Wake::Deadline {
                return Ok(Self::finish(&session, TerminationReason::DeadlineExceeded, started));
            }

            let settled = until_cancelled(cancel, page.content_height()).await?;
            if settled > before {
                tracing::debug!(
                    "Content arrived during grace period ({} -> {}), continuing",
                    before,
                    settled
                );
                session.height = settled;
                continue;
            }

            return Ok(Self::finish(&session, TerminationReason::Stalled, started));
        }
    }

    fn limit_reached(
        &self,
        session: &ScrollSession,
        deadline: Option<Instant>,
    ) -> Option<TerminationReason> {
        if self.max_pages.is_some_and(|max| session.pages_visited >= max) {
            return Some(TerminationReason::BudgetReached);
        }
        if self.max_iterations.is_some_and(|max| session.iterations >= max) {
            return Some(TerminationReason::IterationLimit);
        }
        if deadline.is_some_and(|at| Instant::now() >= at) {
            return Some(TerminationReason::DeadlineExceeded);
        }
        None
    }

    /// Click the control if it is still on the page, otherwise scroll.
    async fn advance<P>(&self, page: &P, bottom: u64) -> Result<()>
    where
        P: PageActions + ?Sized,
    {
        if let Some(control) = &self.control {
            if page.click_first(control.as_str()).await? {
                return Ok(());
            }
            tracing::debug!("Control {} not found, scrolling instead", control);
        }
        page.scroll_to(bottom).await
    }

    fn record_growth(&self, session: &mut ScrollSession, height: u64) {
        session.height = height;
        session.pages_visited += 1;
        if self.backoff == BackoffMode::ResetOnGrowth {
            session.delay = self.initial_delay;
        }
    }

    fn record_stall(&self, session: &mut ScrollSession) {
        session.stalls += 1;
        let grown = session.delay.saturating_add(self.delay_increment);
        session.delay = match self.max_delay {
            Some(max) => grown.min(max),
            None => grown,
        };
    }

    /// Sleep for `wait`, cut short by the deadline or cancellation.
    async fn suspend(
        wait: Duration,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
    ) -> Result<Wake> {
        let wake_at = Instant::now().checked_add(wait);
        let (until, wake) = match (wake_at, deadline) {
            (Some(at), Some(limit)) if limit < at => (Some(limit), Wake::Deadline),
            (None, Some(limit)) => (Some(limit), Wake::Deadline),
            (at, _) => (at, Wake::Elapsed),
        };

        // Past the clock's range only cancellation can end the wait
        let Some(until) = until else {
            cancel.cancelled().await;
            return Err(BrowserError::Cancelled);
        };

        tokio::select! {
            () = cancel.cancelled() => Err(BrowserError::Cancelled),
            () = tokio::time::sleep_until(until) => Ok(wake),
        }
    }

    fn finish(
        session: &ScrollSession,
        reason: TerminationReason,
        started: Instant,
    ) -> ExhaustOutcome {
        let outcome = ExhaustOutcome {
            pages_visited: session.pages_visited,
            reason,
            iterations: session.iterations,
            stalls: session.stalls,
            final_height: session.height,
            final_delay_ms: millis(session.delay),
            elapsed_ms: millis(started.elapsed()),
            finished_at: Utc::now(),
        };

        if reason.is_exhausted() || reason == TerminationReason::BudgetReached {
            tracing::info!(
                "Scroll session finished ({}): {} pages, {} iterations, height {}",
                reason,
                outcome.pages_visited,
                outcome.iterations,
                outcome.final_height
            );
        } else {
            tracing::warn!(
                "Scroll session cut off ({}) after {} iterations, {} pages",
                reason,
                outcome.iterations,
                outcome.pages_visited
            );
        }

        outcome
    }
}

/// Run a page call, abandoning it if `cancel` fires first.
async fn until_cancelled<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        () = cancel.cancelled() => Err(BrowserError::Cancelled),
        result = call => result,
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
