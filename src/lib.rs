//! Deterministic conformance harness for browser "safe links" navigation
//! filtering.
//!
//! A [`ScenarioTestCase`] clicks one hyperlink and checks whether the
//! platform reported the navigation as allowed or blocked. The test
//! framework and the platform are injected, and [`TestSuite`] plus
//! [`MockBrowser`] are bundled so scenarios run inside `cargo test`.
//!
//! ```no_run
//! use safe_links_tester::{
//!     Expectation, MockBrowser, Platform, RuleFilter, Scenario, ScenarioTestCase, TestSuite,
//! };
//!
//! # fn main() -> safe_links_tester::Result<()> {
//! let mut suite = TestSuite::new(|| {
//!     let filter = RuleFilter::new().block(r"^https://malicious\.example/")?;
//!     Ok(Box::new(MockBrowser::with_filter(filter)) as Box<dyn Platform>)
//! });
//! let scenario = Scenario::new("https://malicious.example/", Expectation::Blocked, "malicious url")?;
//! ScenarioTestCase::new(scenario).start(&mut suite);
//! assert!(suite.run().all_passed());
//! # Ok(())
//! # }
//! ```

mod dom;
mod error;
mod events;
mod filter;
mod framework;
mod location;
mod mock_browser;
mod outcome;
mod platform;
mod scenario;
mod scenario_spec;
mod test_case;

pub use dom::{Dom, NodeId};
pub use error::{Error, Result};
pub use events::{DomEvent, EventCallback};
pub use filter::{RuleFilter, StaticFilter, canonicalize_url};
pub use framework::{
    PlatformFactory, SuiteConfig, SuiteReport, TestBody, TestContext, TestFramework, TestReport,
    TestStatus, TestSuite,
};
pub use location::{Authority, LocationParts};
pub use mock_browser::{
    DEFAULT_DOCUMENT_URL, MockBrowser, NavigationRecord, OutcomeDelivery, PendingTask,
};
pub use outcome::{
    NAVIGATION_BLOCKED_EVENT, NAVIGATION_SUCCEEDED_EVENT, NavigationOutcome, OutcomeSignal,
    SignalState,
};
pub use platform::{NavigationFilter, Platform, Verdict};
pub use scenario::{EXPECTATION_VALUES, Expectation, Scenario};
pub use scenario_spec::{
    ScenarioSpec, SpecExpansion, SpecGroup, parse_json, register_scenarios,
};
pub use test_case::{
    ALLOWED_MESSAGE, ArmedLink, BLOCKED_MESSAGE, LinkProbe, ScenarioTestCase, TriggeredLink,
};

#[cfg(test)]
mod tests;
