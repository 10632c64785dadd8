//! JSON scenario files: validation against the fixed schema and expansion
//! into [`Scenario`] values.
//!
//! ```json
//! {
//!   "specification": [{
//!     "name": "safe-links",
//!     "description": "navigation filtering for hyperlinks",
//!     "test_expansion": [
//!       { "name": "safe url", "urls": "https://safe.example/", "expectation": "allowed" }
//!     ]
//!   }]
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::framework::TestFramework;
use crate::scenario::{EXPECTATION_VALUES, Expectation, Scenario};
use crate::test_case::ScenarioTestCase;

const ROOT_FIELDS: [&str; 1] = ["specification"];
const GROUP_FIELDS: [&str; 3] = ["name", "description", "test_expansion"];
const EXPANSION_FIELDS: [&str; 3] = ["name", "urls", "expectation"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecExpansion {
    pub name: String,
    pub urls: Vec<String>,
    pub expectation: Expectation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecGroup {
    pub name: String,
    pub description: String,
    pub expansions: Vec<SpecExpansion>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioSpec {
    groups: Vec<SpecGroup>,
}

impl ScenarioSpec {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|err| Error::Io(format!("{}: {err}", path.display())))?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let value = parse_json(text)?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let root = as_object(value, "/")?;
        assert_contains_only_fields(root, &ROOT_FIELDS, "/")?;
        let groups = assert_non_empty_list(root, "specification", "/")?;

        let mut seen_names = HashSet::new();
        let mut seen_descriptions = HashSet::new();
        let mut parsed = Vec::with_capacity(groups.len());
        for (idx, group) in groups.iter().enumerate() {
            let path = format!("/specification/{idx}");
            let group = parse_group(group, &path)?;
            if !seen_names.insert(group.name.clone()) {
                return Err(Error::spec(
                    path,
                    format!("Duplicate value \"{}\"!", group.name),
                ));
            }
            // Expanded tests are reported by description, so those must be unique too.
            for (expansion_idx, expansion) in group.expansions.iter().enumerate() {
                for (description, _) in described_urls(&group, expansion) {
                    if !seen_descriptions.insert(description.clone()) {
                        return Err(Error::spec(
                            format!("{path}/test_expansion/{expansion_idx}"),
                            format!("Duplicate value \"{description}\"!"),
                        ));
                    }
                }
            }
            parsed.push(group);
        }
        Ok(Self { groups: parsed })
    }

    /// Checks `value` against the scenario file schema without keeping it.
    pub fn validate(value: &Value) -> Result<()> {
        Self::from_value(value).map(|_| ())
    }

    pub fn groups(&self) -> &[SpecGroup] {
        &self.groups
    }

    /// One scenario per group, expansion and url, in document order.
    pub fn expand(&self) -> Result<Vec<Scenario>> {
        let mut scenarios = Vec::new();
        for group in &self.groups {
            for expansion in &group.expansions {
                for (description, url) in described_urls(group, expansion) {
                    scenarios.push(Scenario::new(url, expansion.expectation, description)?);
                }
            }
        }
        tracing::debug!(count = scenarios.len(), "expanded scenario spec");
        Ok(scenarios)
    }

    /// Starts one [`ScenarioTestCase`] per expanded scenario.
    pub fn register(&self, framework: &mut dyn TestFramework) -> Result<usize> {
        let scenarios = self.expand()?;
        let count = scenarios.len();
        register_scenarios(framework, scenarios);
        Ok(count)
    }
}

pub fn register_scenarios(
    framework: &mut dyn TestFramework,
    scenarios: impl IntoIterator<Item = Scenario>,
) {
    for scenario in scenarios {
        ScenarioTestCase::new(scenario).start(framework);
    }
}

/// Test description and url for every url of `expansion`.
fn described_urls<'a>(
    group: &'a SpecGroup,
    expansion: &'a SpecExpansion,
) -> impl Iterator<Item = (String, &'a str)> + 'a {
    let base = format!("{}: {}", group.name, expansion.name);
    let suffixed = expansion.urls.len() > 1;
    expansion.urls.iter().map(move |url| {
        let description = if suffixed {
            format!("{base} [{url}]")
        } else {
            base.clone()
        };
        (description, url.as_str())
    })
}

fn parse_group(value: &Value, path: &str) -> Result<SpecGroup> {
    let group = as_object(value, path)?;
    assert_contains_only_fields(group, &GROUP_FIELDS, path)?;
    let name = assert_non_empty_string(group, "name", path)?;
    let description = assert_non_empty_string(group, "description", path)?;
    let expansions = assert_non_empty_list(group, "test_expansion", path)?
        .iter()
        .enumerate()
        .map(|(idx, expansion)| parse_expansion(expansion, &format!("{path}/test_expansion/{idx}")))
        .collect::<Result<Vec<_>>>()?;
    Ok(SpecGroup {
        name,
        description,
        expansions,
    })
}

fn parse_expansion(value: &Value, path: &str) -> Result<SpecExpansion> {
    let expansion = as_object(value, path)?;
    assert_contains_only_fields(expansion, &EXPANSION_FIELDS, path)?;
    let name = assert_non_empty_string(expansion, "name", path)?;
    let urls = string_or_list(expansion, "urls", path)?;
    let expectation = assert_string_from(expansion, "expectation", &EXPECTATION_VALUES, path)?;
    Ok(SpecExpansion {
        name,
        urls,
        expectation: expectation.parse()?,
    })
}

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| Error::spec(path, format!("Value at path \"{path}\" must be a dict")))
}

fn assert_contains_only_fields(
    obj: &Map<String, Value>,
    expected_fields: &[&str],
    path: &str,
) -> Result<()> {
    if let Some(missing) = expected_fields.iter().find(|field| !obj.contains_key(**field)) {
        return Err(Error::spec(
            path,
            format!("Must contain field \"{missing}\""),
        ));
    }
    if let Some(extra) = obj
        .keys()
        .find(|key| !expected_fields.contains(&key.as_str()))
    {
        return Err(Error::spec(path, format!("Unexpected field \"{extra}\".")));
    }
    Ok(())
}

fn assert_non_empty_string(obj: &Map<String, Value>, field: &str, path: &str) -> Result<String> {
    let value = obj
        .get(field)
        .ok_or_else(|| Error::spec(path, format!("Missing field \"{field}\"")))?;
    let Some(text) = value.as_str() else {
        return Err(Error::spec(
            path,
            format!("Field \"{field}\" must be a string"),
        ));
    };
    if text.is_empty() {
        return Err(Error::spec(
            path,
            format!("Field \"{field}\" must not be empty"),
        ));
    }
    Ok(text.to_string())
}

fn assert_non_empty_list<'a>(
    obj: &'a Map<String, Value>,
    field: &str,
    path: &str,
) -> Result<&'a Vec<Value>> {
    let Some(items) = obj.get(field).and_then(Value::as_array) else {
        return Err(Error::spec(path, format!("{field} must be a list")));
    };
    if items.is_empty() {
        return Err(Error::spec(path, format!("{field} list must not be empty")));
    }
    Ok(items)
}

fn assert_string_from(
    obj: &Map<String, Value>,
    field: &str,
    items: &[&str],
    path: &str,
) -> Result<String> {
    match obj.get(field).and_then(Value::as_str) {
        Some(value) if items.contains(&value) => Ok(value.to_string()),
        _ => Err(Error::spec(
            path,
            format!("Field \"{field}\" must be from: {}", quoted_list(items)),
        )),
    }
}

fn quoted_list(items: &[&str]) -> String {
    let quoted = items
        .iter()
        .map(|item| format!("'{item}'"))
        .collect::<Vec<_>>();
    format!("[{}]", quoted.join(", "))
}

fn string_or_list(obj: &Map<String, Value>, field: &str, path: &str) -> Result<Vec<String>> {
    if obj.get(field).is_some_and(Value::is_string) {
        return Ok(vec![assert_non_empty_string(obj, field, path)?]);
    }
    let items = assert_non_empty_list(obj, field, path)?;
    items
        .iter()
        .map(|item| match item.as_str() {
            Some(text) if !text.is_empty() => Ok(text.to_string()),
            Some(_) => Err(Error::spec(
                path,
                format!("Field \"{field}\" must not contain empty strings"),
            )),
            None => Err(Error::spec(
                path,
                format!("Field \"{field}\" must contain only strings"),
            )),
        })
        .collect()
}

/// Parses JSON, pointing at the offending character on failure.
pub fn parse_json(text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|err| {
        let line = err.line();
        let column = err.column();
        let source_line = text
            .lines()
            .nth(line.saturating_sub(1))
            .unwrap_or_default()
            .trim_end();
        let snippet = format!(
            "{source_line}\n{}^",
            " ".repeat(column.saturating_sub(1))
        );
        Error::Json {
            message: err.to_string(),
            line,
            column,
            snippet,
        }
    })
}
