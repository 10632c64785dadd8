use crate::dom::NodeId;
use crate::error::{Error, Result};
use crate::events::DomEvent;
use crate::framework::{TestContext, TestFramework};
use crate::outcome::{NavigationOutcome, OutcomeSignal};
use crate::platform::Platform;
use crate::scenario::{Expectation, Scenario};

pub const ALLOWED_MESSAGE: &str = "The request to the URL should be allowed.";
pub const BLOCKED_MESSAGE: &str = "The request to the URL should be blocked.";

/// Binds one [`Scenario`] to a single link click and one assertion.
///
/// `start` consumes the test case, so a scenario is registered and run at
/// most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioTestCase {
    scenario: Scenario,
}

impl ScenarioTestCase {
    pub fn new(scenario: Scenario) -> Self {
        Self { scenario }
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn start(self, framework: &mut dyn TestFramework) {
        let Self { scenario } = self;
        let description = scenario.description().to_string();
        tracing::debug!(test = %description, url = %scenario.url(), "registering scenario");
        framework.test(
            Box::new(move |ctx: &mut TestContext<'_>| run_scenario(&scenario, ctx)),
            &description,
        );
    }
}

fn run_scenario(scenario: &Scenario, ctx: &mut TestContext<'_>) -> Result<()> {
    let probe = LinkProbe::create(ctx.platform(), scenario.url())?;
    let armed = probe.arm(ctx.platform())?;
    let triggered = armed.trigger(ctx.platform())?;

    let outcome = ctx.wait_for(triggered.signal())?;
    ctx.settle()?;
    triggered.ensure_single_outcome()?;
    tracing::debug!(test = %ctx.description(), %outcome, "navigation resolved");

    let expected = scenario.expectation();
    let message = match expected {
        Expectation::Allowed => ALLOWED_MESSAGE,
        Expectation::Blocked => BLOCKED_MESSAGE,
    };
    ctx.assert_equals(Expectation::observed(outcome), expected, message)
}

/// An anchor attached to the document body, not yet observed.
#[derive(Debug)]
pub struct LinkProbe {
    node: NodeId,
}

impl LinkProbe {
    pub fn create(platform: &mut dyn Platform, url: &str) -> Result<Self> {
        let node = platform.create_element("a")?;
        platform.set_href(node, url)?;
        platform.append_to_body(node)?;
        Ok(Self { node })
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Registers both outcome listeners against one shared signal.
    pub fn arm(self, platform: &mut dyn Platform) -> Result<ArmedLink> {
        let signal = OutcomeSignal::new();
        for outcome in [NavigationOutcome::Succeeded, NavigationOutcome::Blocked] {
            let listener_signal = signal.clone();
            platform.add_event_listener(
                self.node,
                outcome.event_type(),
                Box::new(move |event: &mut DomEvent| {
                    if !listener_signal.resolve(outcome, event.time_ms) {
                        tracing::warn!(%outcome, at_ms = event.time_ms, "outcome signal already resolved");
                    }
                }),
            )?;
        }
        Ok(ArmedLink {
            node: self.node,
            signal,
        })
    }
}

/// Both listeners are in place; the only thing left to do is click.
#[derive(Debug)]
pub struct ArmedLink {
    node: NodeId,
    signal: OutcomeSignal,
}

impl ArmedLink {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn trigger(self, platform: &mut dyn Platform) -> Result<TriggeredLink> {
        tracing::debug!(node = self.node.index(), at_ms = platform.now_ms(), "clicking link");
        platform.click(self.node)?;
        Ok(TriggeredLink {
            node: self.node,
            signal: self.signal,
        })
    }
}

#[derive(Debug)]
pub struct TriggeredLink {
    node: NodeId,
    signal: OutcomeSignal,
}

impl TriggeredLink {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn signal(&self) -> &OutcomeSignal {
        &self.signal
    }

    /// Fails if the platform reported more than one outcome for the click.
    pub fn ensure_single_outcome(&self) -> Result<()> {
        let (Some(first), Some(second)) = (
            self.signal.outcome(),
            self.signal.conflicts().first().copied(),
        ) else {
            return Ok(());
        };
        tracing::warn!(%first, %second, "platform reported conflicting outcomes");
        Err(Error::ConflictingOutcomes { first, second })
    }
}
