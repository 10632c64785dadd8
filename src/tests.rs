use super::*;

use std::cell::RefCell;
use std::rc::Rc;

mod outcome_signal;
mod rule_filter;

fn suite_with(filter: impl NavigationFilter + Clone + 'static, delivery: OutcomeDelivery) -> TestSuite {
    TestSuite::new(move || {
        let mut browser = MockBrowser::with_filter(filter.clone());
        browser.set_outcome_delivery(delivery)?;
        Ok(Box::new(browser) as Box<dyn Platform>)
    })
}

/// Wraps a [`MockBrowser`] and records every platform call in order.
struct RecordingPlatform {
    inner: MockBrowser,
    calls: Rc<RefCell<Vec<String>>>,
}

impl RecordingPlatform {
    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

impl Platform for RecordingPlatform {
    fn create_element(&mut self, tag_name: &str) -> Result<NodeId> {
        self.record(format!("create:{tag_name}"));
        self.inner.create_element(tag_name)
    }

    fn set_href(&mut self, node: NodeId, url: &str) -> Result<()> {
        self.record(format!("href:{url}"));
        self.inner.set_href(node, url)
    }

    fn append_to_body(&mut self, node: NodeId) -> Result<()> {
        self.record("append".into());
        self.inner.append_to_body(node)
    }

    fn add_event_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        callback: EventCallback,
    ) -> Result<()> {
        self.record(format!("listen:{event_type}"));
        self.inner.add_event_listener(node, event_type, callback)
    }

    fn click(&mut self, node: NodeId) -> Result<()> {
        self.record("click".into());
        self.inner.click(node)
    }

    fn now_ms(&self) -> i64 {
        self.inner.now_ms()
    }

    fn next_task_due_at(&self) -> Option<i64> {
        self.inner.next_task_due_at()
    }

    fn pending_task_count(&self) -> usize {
        self.inner.pending_task_count()
    }

    fn run_next_task(&mut self) -> Result<bool> {
        self.inner.run_next_task()
    }

    fn advance_time_to(&mut self, target_ms: i64) -> Result<()> {
        self.inner.advance_time_to(target_ms)
    }
}

#[test]
fn safe_url_scenario_passes_through_bundled_browser() -> Result<()> {
    let mut suite = suite_with(StaticFilter(Verdict::Allow), OutcomeDelivery::default());
    let scenario = Scenario::new("https://safe.example/", Expectation::Allowed, "safe url")?;
    ScenarioTestCase::new(scenario).start(&mut suite);

    let report = suite.run();
    assert!(report.all_passed(), "unexpected report: {report:?}");
    assert_eq!(report.reports[0].description, "safe url");
    assert_eq!(report.reports[0].assertions, 1);
    Ok(())
}

#[test]
fn platform_calls_happen_in_arm_then_trigger_order() -> Result<()> {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let factory_calls = calls.clone();
    let mut suite = TestSuite::new(move || {
        Ok(Box::new(RecordingPlatform {
            inner: MockBrowser::new(),
            calls: factory_calls.clone(),
        }) as Box<dyn Platform>)
    });
    let scenario = Scenario::new("https://safe.example/", Expectation::Allowed, "ordering")?;
    ScenarioTestCase::new(scenario).start(&mut suite);
    assert!(suite.run().all_passed());

    assert_eq!(
        calls.borrow().as_slice(),
        [
            "create:a",
            "href:https://safe.example/",
            "append",
            "listen:navigation-succeeded",
            "listen:navigation-blocked",
            "click",
        ]
    );
    Ok(())
}
