use std::cell::RefCell;
use std::rc::Rc;

use crate::dom::{Dom, NodeId};
use crate::error::{Error, Result};
use crate::events::{DomEvent, EventCallback, Listener, ListenerStore};
use crate::filter::StaticFilter;
use crate::location::{Authority, LocationParts};
use crate::outcome::NavigationOutcome;
use crate::platform::{NavigationFilter, Platform, Verdict};

pub const DEFAULT_DOCUMENT_URL: &str = "https://app.local/";

/// How the browser reports the verdict of an intercepted navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeDelivery {
    /// Queue the outcome event `latency_ms` after the click.
    Deferred { latency_ms: i64 },
    /// Dispatch the outcome event before `click` returns.
    Synchronous,
    /// Never report anything.
    Suppressed,
    /// Report the verdict, then the opposite outcome as well.
    Both,
}

impl Default for OutcomeDelivery {
    fn default() -> Self {
        Self::Deferred { latency_ms: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRecord {
    pub from: String,
    pub to: String,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTask {
    pub id: i64,
    pub due_at: i64,
    pub order: i64,
}

#[derive(Debug, Clone)]
struct ScheduledTask {
    id: i64,
    due_at: i64,
    order: i64,
    target: NodeId,
    outcome: NavigationOutcome,
    url: String,
}

/// Single-document browser double with a virtual clock.
///
/// Clicking a connected `<a href>` consults the installed
/// [`NavigationFilter`] and reports the verdict as a `navigation-succeeded`
/// or `navigation-blocked` event on the anchor.
pub struct MockBrowser {
    dom: Dom,
    listeners: ListenerStore,
    location: LocationParts,
    filter: Box<dyn NavigationFilter>,
    delivery: OutcomeDelivery,
    navigations: Vec<NavigationRecord>,
    task_queue: Vec<ScheduledTask>,
    now_ms: i64,
    next_task_id: i64,
    next_task_order: i64,
    task_step_limit: usize,
    trace: bool,
    trace_events: bool,
    trace_timers: bool,
    trace_logs: Vec<String>,
    trace_log_limit: usize,
    trace_emit: bool,
}

impl Default for MockBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBrowser {
    pub fn new() -> Self {
        Self {
            dom: Dom::new(),
            listeners: ListenerStore::default(),
            location: default_location(),
            filter: Box::new(StaticFilter(Verdict::Allow)),
            delivery: OutcomeDelivery::default(),
            navigations: Vec::new(),
            task_queue: Vec::new(),
            now_ms: 0,
            next_task_id: 1,
            next_task_order: 0,
            task_step_limit: 10_000,
            trace: false,
            trace_events: true,
            trace_timers: true,
            trace_logs: Vec::new(),
            trace_log_limit: 10_000,
            trace_emit: true,
        }
    }

    pub fn with_filter(filter: impl NavigationFilter + 'static) -> Self {
        let mut browser = Self::new();
        browser.set_navigation_filter(filter);
        browser
    }

    pub fn set_navigation_filter(&mut self, filter: impl NavigationFilter + 'static) {
        self.filter = Box::new(filter);
    }

    pub fn set_outcome_delivery(&mut self, delivery: OutcomeDelivery) -> Result<()> {
        if let OutcomeDelivery::Deferred { latency_ms } = delivery {
            if latency_ms < 0 {
                return Err(Error::Configuration(
                    "outcome latency requires non-negative milliseconds".into(),
                ));
            }
        }
        self.delivery = delivery;
        Ok(())
    }

    pub fn set_document_url(&mut self, url: &str) -> Result<()> {
        self.location = LocationParts::parse(url)
            .ok_or_else(|| Error::Configuration(format!("invalid document url: {url}")))?;
        Ok(())
    }

    pub fn document_url(&self) -> String {
        self.location.href()
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut Dom {
        &mut self.dom
    }

    pub fn take_navigations(&mut self) -> Vec<NavigationRecord> {
        std::mem::take(&mut self.navigations)
    }

    pub fn listener_count(&self, node: NodeId, event_type: &str) -> usize {
        self.listeners.count(node, event_type)
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.trace_logs)
    }

    pub fn set_trace_emit(&mut self, enabled: bool) {
        self.trace_emit = enabled;
    }

    pub fn set_trace_events(&mut self, enabled: bool) {
        self.trace_events = enabled;
    }

    pub fn set_trace_timers(&mut self, enabled: bool) {
        self.trace_timers = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::Configuration(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.trace_log_limit = max_entries;
        if self.trace_logs.len() > max_entries {
            let excess = self.trace_logs.len() - max_entries;
            self.trace_logs.drain(..excess);
        }
        Ok(())
    }

    pub fn set_task_step_limit(&mut self, max_steps: usize) -> Result<()> {
        if max_steps == 0 {
            return Err(Error::Configuration(
                "set_task_step_limit requires at least 1 step".into(),
            ));
        }
        self.task_step_limit = max_steps;
        Ok(())
    }

    pub fn pending_tasks(&self) -> Vec<PendingTask> {
        let mut tasks = self
            .task_queue
            .iter()
            .map(|task| PendingTask {
                id: task.id,
                due_at: task.due_at,
                order: task.order,
            })
            .collect::<Vec<_>>();
        tasks.sort_by_key(|task| (task.due_at, task.order));
        tasks
    }

    /// Runs every queued task regardless of due time.
    pub fn flush(&mut self) -> Result<usize> {
        let from = self.now_ms;
        let mut steps = 0usize;
        while !self.task_queue.is_empty() {
            steps += 1;
            if steps > self.task_step_limit {
                return Err(Error::TaskStepLimit {
                    limit: self.task_step_limit,
                    now_ms: self.now_ms,
                    pending: self.task_queue.len(),
                });
            }
            self.run_next_task()?;
        }
        self.trace_timer_line(format!(
            "[timer] flush from={} to={} ran={}",
            from, self.now_ms, steps
        ));
        Ok(steps)
    }

    pub fn dispatch(&mut self, target: NodeId, event_type: &str) -> Result<DomEvent> {
        self.dispatch_event(DomEvent::new(event_type, target, self.now_ms))
    }

    fn dispatch_event(&mut self, mut event: DomEvent) -> Result<DomEvent> {
        let path = self.dom.propagation_path(event.target);
        let Some((&target, ancestors)) = path.split_last() else {
            self.trace_event_done(&event, "empty_path");
            return Ok(event);
        };

        // Capture phase, then both listener kinds at the target, then bubble.
        for node in ancestors {
            event.current_target = *node;
            self.invoke_listeners(*node, &mut event, true);
            if event.propagation_stopped {
                self.trace_event_done(&event, "propagation_stopped");
                return Ok(event);
            }
        }

        event.current_target = target;
        for capture in [true, false] {
            self.invoke_listeners(target, &mut event, capture);
            if event.propagation_stopped {
                self.trace_event_done(&event, "propagation_stopped");
                return Ok(event);
            }
        }

        for node in ancestors.iter().rev() {
            event.current_target = *node;
            self.invoke_listeners(*node, &mut event, false);
            if event.propagation_stopped {
                self.trace_event_done(&event, "propagation_stopped");
                return Ok(event);
            }
        }

        self.trace_event_done(&event, "completed");
        Ok(event)
    }

    fn invoke_listeners(&mut self, node_id: NodeId, event: &mut DomEvent, capture: bool) {
        let listeners = self.listeners.get(node_id, &event.event_type, capture);
        for listener in listeners {
            if self.trace {
                let phase = if capture { "capture" } else { "bubble" };
                let line = format!(
                    "[event] {} target={} current={} phase={} default_prevented={}",
                    event.event_type,
                    self.dom.node_label(event.target),
                    self.dom.node_label(event.current_target),
                    phase,
                    event.default_prevented
                );
                self.trace_event_line(line);
            }
            let mut callback = listener.callback.borrow_mut();
            (*callback)(event);
            if event.immediate_propagation_stopped {
                break;
            }
        }
    }

    fn follow_hyperlink(&mut self, anchor: NodeId, href: &str) -> Result<()> {
        let from = self.location.href();
        let to = self.location.resolve(href);
        let verdict = self.filter.check(&to);
        self.trace_line(format!("[nav] from={from} to={to} verdict={verdict:?}"));
        self.navigations.push(NavigationRecord {
            from,
            to: to.clone(),
            verdict,
        });

        let outcome = match verdict {
            Verdict::Allow => NavigationOutcome::Succeeded,
            Verdict::Block => NavigationOutcome::Blocked,
        };
        match self.delivery {
            OutcomeDelivery::Deferred { latency_ms } => {
                self.schedule_outcome(anchor, outcome, &to, latency_ms);
            }
            OutcomeDelivery::Synchronous => {
                self.dispatch_outcome(anchor, outcome, &to)?;
            }
            OutcomeDelivery::Suppressed => {
                self.trace_line(format!("[nav] suppressed outcome={outcome} to={to}"));
            }
            OutcomeDelivery::Both => {
                let opposite = match outcome {
                    NavigationOutcome::Succeeded => NavigationOutcome::Blocked,
                    NavigationOutcome::Blocked => NavigationOutcome::Succeeded,
                };
                self.schedule_outcome(anchor, outcome, &to, 1);
                self.schedule_outcome(anchor, opposite, &to, 1);
            }
        }
        Ok(())
    }

    fn schedule_outcome(
        &mut self,
        target: NodeId,
        outcome: NavigationOutcome,
        url: &str,
        delay_ms: i64,
    ) {
        let id = self.next_task_id;
        self.next_task_id += 1;
        let order = self.next_task_order;
        self.next_task_order += 1;
        let due_at = self.now_ms.saturating_add(delay_ms.max(0));
        self.task_queue.push(ScheduledTask {
            id,
            due_at,
            order,
            target,
            outcome,
            url: url.to_string(),
        });
        self.trace_timer_line(format!(
            "[timer] schedule id={id} due_at={due_at} outcome={outcome}"
        ));
    }

    fn dispatch_outcome(
        &mut self,
        target: NodeId,
        outcome: NavigationOutcome,
        url: &str,
    ) -> Result<()> {
        let mut event = DomEvent::new(outcome.event_type(), target, self.now_ms);
        event.url = Some(url.to_string());
        self.dispatch_event(event)?;
        Ok(())
    }

    fn next_task_index(&self) -> Option<usize> {
        self.task_queue
            .iter()
            .enumerate()
            .min_by_key(|(_, task)| (task.due_at, task.order))
            .map(|(idx, _)| idx)
    }

    fn trace_event_done(&mut self, event: &DomEvent, outcome: &str) {
        if !self.trace {
            return;
        }
        let line = format!(
            "[event] done {} target={} current={} outcome={} default_prevented={} propagation_stopped={}",
            event.event_type,
            self.dom.node_label(event.target),
            self.dom.node_label(event.current_target),
            outcome,
            event.default_prevented,
            event.propagation_stopped
        );
        self.trace_event_line(line);
    }

    fn trace_event_line(&mut self, line: String) {
        if self.trace && self.trace_events {
            self.trace_line(line);
        }
    }

    fn trace_timer_line(&mut self, line: String) {
        if self.trace && self.trace_timers {
            self.trace_line(line);
        }
    }

    fn trace_line(&mut self, line: String) {
        if !self.trace {
            return;
        }
        if self.trace_emit {
            tracing::debug!(target: "safe_links_tester::trace", "{line}");
        }
        if self.trace_logs.len() >= self.trace_log_limit {
            self.trace_logs.remove(0);
        }
        self.trace_logs.push(line);
    }
}

impl Platform for MockBrowser {
    fn create_element(&mut self, tag_name: &str) -> Result<NodeId> {
        self.dom.create_detached_element(tag_name)
    }

    fn set_href(&mut self, node: NodeId, url: &str) -> Result<()> {
        self.dom.set_attr(node, "href", url)
    }

    fn append_to_body(&mut self, node: NodeId) -> Result<()> {
        let body = self.dom.body();
        self.dom.append_child(body, node)
    }

    fn add_event_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        callback: EventCallback,
    ) -> Result<()> {
        if self.dom.tag_name(node).is_none() {
            return Err(Error::Dom(format!(
                "addEventListener target {} is not an element",
                node.index()
            )));
        }
        self.listeners.add(
            node,
            event_type,
            Listener {
                capture: false,
                callback: Rc::new(RefCell::new(callback)),
            },
        );
        Ok(())
    }

    fn click(&mut self, node: NodeId) -> Result<()> {
        if self.dom.tag_name(node).is_none() {
            return Err(Error::Dom(format!(
                "click target {} is not an element",
                node.index()
            )));
        }
        let click = self.dispatch(node, "click")?;
        if click.default_prevented {
            return Ok(());
        }

        let is_anchor = self
            .dom
            .tag_name(node)
            .is_some_and(|tag| tag.eq_ignore_ascii_case("a"));
        if !is_anchor {
            return Ok(());
        }
        let Some(href) = self.dom.attr(node, "href").map(str::to_string) else {
            return Ok(());
        };
        if !self.dom.is_connected(node) {
            self.trace_line(format!(
                "[nav] skipped detached anchor {}",
                self.dom.node_label(node)
            ));
            return Ok(());
        }
        self.follow_hyperlink(node, &href)
    }

    fn now_ms(&self) -> i64 {
        self.now_ms
    }

    fn next_task_due_at(&self) -> Option<i64> {
        self.next_task_index()
            .and_then(|idx| self.task_queue.get(idx))
            .map(|task| task.due_at)
    }

    fn pending_task_count(&self) -> usize {
        self.task_queue.len()
    }

    fn run_next_task(&mut self) -> Result<bool> {
        let Some(next_idx) = self.next_task_index() else {
            self.trace_timer_line("[timer] run_next none".into());
            return Ok(false);
        };
        let task = self.task_queue.remove(next_idx);
        if task.due_at > self.now_ms {
            self.now_ms = task.due_at;
        }
        self.trace_timer_line(format!(
            "[timer] run id={} due_at={} now_ms={}",
            task.id, task.due_at, self.now_ms
        ));
        self.dispatch_outcome(task.target, task.outcome, &task.url)?;
        Ok(true)
    }

    fn advance_time_to(&mut self, target_ms: i64) -> Result<()> {
        if target_ms < self.now_ms {
            return Err(Error::Configuration(format!(
                "advance_time_to requires target >= now_ms (target={target_ms}, now_ms={})",
                self.now_ms
            )));
        }
        let from = self.now_ms;
        self.now_ms = target_ms;
        self.trace_timer_line(format!("[timer] advance_to from={from} to={target_ms}"));
        Ok(())
    }
}

fn default_location() -> LocationParts {
    LocationParts {
        scheme: "https".into(),
        authority: Some(Authority {
            userinfo: None,
            hostname: "app.local".into(),
            port: None,
        }),
        path: "/".into(),
        query: String::new(),
        fragment: String::new(),
    }
}
