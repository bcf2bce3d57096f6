//! Scroll sessions against an in-memory page whose height follows a script.

use pagedrain_browser::{BrowserError, PageAction, PageActions, Result, ScrollExhauster};
use pagedrain_core::{CssSelector, ScrollConfig, TerminationReason};
use std::sync::Mutex;
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

/// `heights[n]` is the document height after `n` advances.
struct FakeFeed {
    heights: Vec<u64>,
    controls: Vec<bool>,
    advances: Mutex<usize>,
    clicks: Mutex<Vec<String>>,
}

impl FakeFeed {
    fn new(heights: &[u64]) -> Self {
        Self {
            heights: heights.to_vec(),
            controls: Vec::new(),
            advances: Mutex::new(0),
            clicks: Mutex::new(Vec::new()),
        }
    }

    fn with_controls(mut self, present: &[bool]) -> Self {
        self.controls = present.to_vec();
        self
    }

    fn advances(&self) -> usize {
        *self.advances.lock().unwrap()
    }

    fn clicks(&self) -> Vec<String> {
        self.clicks.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl PageActions for FakeFeed {
    async fn content_height(&self) -> Result<u64> {
        let n = *self.advances.lock().unwrap();
        Ok(self.heights[n.min(self.heights.len() - 1)])
    }

    async fn scroll_to(&self, _y: u64) -> Result<()> {
        *self.advances.lock().unwrap() += 1;
        Ok(())
    }

    async fn click_first(&self, selector: &str) -> Result<bool> {
        let mut advances = self.advances.lock().unwrap();
        if self.controls.get(*advances).copied().unwrap_or(false) {
            *advances += 1;
            self.clicks.lock().unwrap().push(selector.to_string());
            return Ok(true);
        }
        Ok(false)
    }
}

fn policy() -> ScrollConfig {
    ScrollConfig::default()
        .with_deadline(None)
        .with_max_iterations(None)
}

#[tokio::test(start_paused = true)]
async fn test_unbounded_feed_grows_once() {
    let feed = FakeFeed::new(&[0, 500, 500]);
    let exhauster = assert_ok!(ScrollExhauster::new(policy()));

    let outcome = assert_ok!(exhauster.exhaust(&feed, &CancellationToken::new()).await);

    assert_eq!(outcome.reason, TerminationReason::Stalled);
    assert_eq!(outcome.pages_visited, 1);
}

#[tokio::test(start_paused = true)]
async fn test_budget_of_two_pages() {
    let feed = FakeFeed::new(&[0, 400, 800, 800, 1200]);
    let exhauster = assert_ok!(ScrollExhauster::new(policy().with_max_pages(2)));

    let outcome = assert_ok!(exhauster.exhaust(&feed, &CancellationToken::new()).await);

    assert_eq!(outcome.reason, TerminationReason::BudgetReached);
    assert_eq!(outcome.pages_visited, 2);
    assert_eq!(feed.advances(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_load_more_control_then_fallback() {
    let feed = FakeFeed::new(&[0, 300, 600, 600]).with_controls(&[true, true, false]);
    let exhauster = assert_ok!(ScrollExhauster::new(
        policy().with_control_selector("#loadMore")
    ));

    let outcome = assert_ok!(exhauster.exhaust(&feed, &CancellationToken::new()).await);

    assert_eq!(outcome.reason, TerminationReason::Stalled);
    assert_eq!(outcome.pages_visited, 2);
    assert_eq!(feed.clicks(), vec!["#loadMore", "#loadMore"]);
    assert_eq!(feed.advances(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_exhauster_is_reusable_across_pages() {
    let exhauster = assert_ok!(ScrollExhauster::new(policy()));

    let first = FakeFeed::new(&[0, 100, 200, 200]);
    let second = FakeFeed::new(&[50]);

    let a = assert_ok!(exhauster.exhaust(&first, &CancellationToken::new()).await);
    let b = assert_ok!(exhauster.exhaust(&second, &CancellationToken::new()).await);

    assert_eq!(a.pages_visited, 2);
    assert_eq!(b.pages_visited, 0);
    assert_eq!(b.final_delay_ms, 1000);
}

#[tokio::test(start_paused = true)]
async fn test_action_list_runs_in_order() {
    let feed = FakeFeed::new(&[0, 100, 200, 200]).with_controls(&[true]);
    let actions = [
        PageAction::Click {
            element: assert_ok!(CssSelector::new("#accept")),
        },
        PageAction::Wait { ms: 100 },
        PageAction::Scroll(policy()),
    ];

    let cancel = CancellationToken::new();
    let mut outcomes = Vec::new();
    for action in &actions {
        if let Some(outcome) = assert_ok!(action.run(&feed, &cancel).await) {
            outcomes.push(outcome);
        }
    }

    assert_eq!(feed.clicks(), vec!["#accept"]);
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].pages_visited, 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_scroll_action() {
    let feed = FakeFeed::new(&[0, 100]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = assert_err!(PageAction::Scroll(policy()).run(&feed, &cancel).await);
    assert!(matches!(err, BrowserError::Cancelled));
}
