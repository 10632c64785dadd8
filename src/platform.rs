use crate::dom::NodeId;
use crate::error::Result;
use crate::events::EventCallback;

/// DOM and event-loop primitives a scenario needs from a browser.
///
/// Navigation outcomes arrive as events on the clicked element, possibly
/// from a task queued behind `click`. Waiting code drives the queue through
/// `next_task_due_at` and `run_next_task`.
pub trait Platform {
    fn create_element(&mut self, tag_name: &str) -> Result<NodeId>;

    fn set_href(&mut self, node: NodeId, url: &str) -> Result<()>;

    fn append_to_body(&mut self, node: NodeId) -> Result<()>;

    fn add_event_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        callback: EventCallback,
    ) -> Result<()>;

    /// Runs the element's activation behavior, as a user click would.
    fn click(&mut self, node: NodeId) -> Result<()>;

    fn now_ms(&self) -> i64;

    fn next_task_due_at(&self) -> Option<i64>;

    fn pending_task_count(&self) -> usize;

    /// Runs the earliest queued task, moving the clock forward to its due
    /// time. Returns `false` when the queue is empty.
    fn run_next_task(&mut self) -> Result<bool>;

    /// Moves the clock forward without running anything due later.
    fn advance_time_to(&mut self, target_ms: i64) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Allow,
    Block,
}

/// The link-interception logic under test.
pub trait NavigationFilter {
    fn check(&self, url: &str) -> Verdict;
}

impl<F> NavigationFilter for F
where
    F: Fn(&str) -> Verdict,
{
    fn check(&self, url: &str) -> Verdict {
        self(url)
    }
}
