use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::outcome::NavigationOutcome;

pub const EXPECTATION_VALUES: [&str; 2] = ["allowed", "blocked"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expectation {
    Allowed,
    Blocked,
}

impl Expectation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allowed => "allowed",
            Self::Blocked => "blocked",
        }
    }

    pub fn expected_outcome(self) -> NavigationOutcome {
        match self {
            Self::Allowed => NavigationOutcome::Succeeded,
            Self::Blocked => NavigationOutcome::Blocked,
        }
    }

    /// The expectation an observed outcome would satisfy.
    pub fn observed(outcome: NavigationOutcome) -> Self {
        match outcome {
            NavigationOutcome::Succeeded => Self::Allowed,
            NavigationOutcome::Blocked => Self::Blocked,
        }
    }

    pub fn matches(self, outcome: NavigationOutcome) -> bool {
        self.expected_outcome() == outcome
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Expectation {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "allowed" => Ok(Self::Allowed),
            "blocked" => Ok(Self::Blocked),
            other => Err(Error::Configuration(format!(
                "unknown expectation \"{other}\": must be from: {}",
                expectation_choices()
            ))),
        }
    }
}

impl Serialize for Expectation {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Expectation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

fn expectation_choices() -> String {
    let quoted = EXPECTATION_VALUES
        .iter()
        .map(|value| format!("'{value}'"))
        .collect::<Vec<_>>();
    format!("[{}]", quoted.join(", "))
}

/// One declarative check: navigate to `url` and expect `expectation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawScenario")]
pub struct Scenario {
    url: String,
    expectation: Expectation,
    description: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScenario {
    url: String,
    expectation: Expectation,
    description: String,
}

impl TryFrom<RawScenario> for Scenario {
    type Error = Error;

    fn try_from(raw: RawScenario) -> Result<Self> {
        Scenario::new(raw.url, raw.expectation, raw.description)
    }
}

impl Scenario {
    pub fn new(
        url: impl Into<String>,
        expectation: Expectation,
        description: impl Into<String>,
    ) -> Result<Self> {
        let url = url.into();
        let description = description.into();
        if url.trim().is_empty() {
            return Err(Error::Configuration(
                "scenario url must not be empty".into(),
            ));
        }
        if description.trim().is_empty() {
            return Err(Error::Configuration(format!(
                "scenario description for {url} must not be empty"
            )));
        }
        Ok(Self {
            url,
            expectation,
            description,
        })
    }

    /// Like [`Scenario::new`] but takes the expectation as text.
    pub fn parse(url: &str, expectation: &str, description: &str) -> Result<Self> {
        Self::new(url, expectation.parse()?, description)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn expectation(&self) -> Expectation {
        self.expectation
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}
