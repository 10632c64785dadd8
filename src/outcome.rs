use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub const NAVIGATION_SUCCEEDED_EVENT: &str = "navigation-succeeded";
pub const NAVIGATION_BLOCKED_EVENT: &str = "navigation-blocked";

/// Result of one attempted navigation, as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationOutcome {
    Succeeded,
    Blocked,
}

impl NavigationOutcome {
    pub fn event_type(self) -> &'static str {
        match self {
            Self::Succeeded => NAVIGATION_SUCCEEDED_EVENT,
            Self::Blocked => NAVIGATION_BLOCKED_EVENT,
        }
    }

    pub fn from_event_type(event_type: &str) -> Option<Self> {
        match event_type {
            NAVIGATION_SUCCEEDED_EVENT => Some(Self::Succeeded),
            NAVIGATION_BLOCKED_EVENT => Some(Self::Blocked),
            _ => None,
        }
    }
}

impl fmt::Display for NavigationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => f.write_str("succeeded"),
            Self::Blocked => f.write_str("blocked"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalState {
    Pending,
    Resolved {
        outcome: NavigationOutcome,
        at_ms: i64,
    },
}

#[derive(Debug)]
struct SignalInner {
    state: SignalState,
    conflicts: Vec<NavigationOutcome>,
}

/// Single-resolution slot shared by the two outcome listeners of one link.
///
/// The first `resolve` settles the signal. Every later call is kept as a
/// conflict instead of overwriting the settled outcome.
#[derive(Debug, Clone)]
pub struct OutcomeSignal {
    inner: Rc<RefCell<SignalInner>>,
}

impl Default for OutcomeSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl OutcomeSignal {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SignalInner {
                state: SignalState::Pending,
                conflicts: Vec::new(),
            })),
        }
    }

    /// Returns `true` when this call settled the signal.
    pub fn resolve(&self, outcome: NavigationOutcome, at_ms: i64) -> bool {
        let mut inner = self.inner.borrow_mut();
        match inner.state {
            SignalState::Pending => {
                inner.state = SignalState::Resolved { outcome, at_ms };
                true
            }
            SignalState::Resolved { .. } => {
                inner.conflicts.push(outcome);
                false
            }
        }
    }

    pub fn state(&self) -> SignalState {
        self.inner.borrow().state.clone()
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.inner.borrow().state, SignalState::Resolved { .. })
    }

    pub fn outcome(&self) -> Option<NavigationOutcome> {
        match self.inner.borrow().state {
            SignalState::Resolved { outcome, .. } => Some(outcome),
            SignalState::Pending => None,
        }
    }

    pub fn conflicts(&self) -> Vec<NavigationOutcome> {
        self.inner.borrow().conflicts.clone()
    }
}
