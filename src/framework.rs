use std::fmt;

use crate::error::{Error, Result};
use crate::outcome::{NavigationOutcome, OutcomeSignal};
use crate::platform::Platform;

pub type TestBody = Box<dyn FnOnce(&mut TestContext<'_>) -> Result<()>>;

pub type PlatformFactory = Box<dyn FnMut() -> Result<Box<dyn Platform>>>;

/// Registration side of a test harness.
pub trait TestFramework {
    fn test(&mut self, body: TestBody, description: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuiteConfig {
    timeout_ms: i64,
    task_step_limit: usize,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            task_step_limit: 10_000,
        }
    }
}

impl SuiteConfig {
    pub fn timeout_ms(&self) -> i64 {
        self.timeout_ms
    }

    pub fn task_step_limit(&self) -> usize {
        self.task_step_limit
    }

    pub fn with_timeout_ms(mut self, timeout_ms: i64) -> Result<Self> {
        if timeout_ms <= 0 {
            return Err(Error::Configuration(format!(
                "timeout requires a positive number of milliseconds, got {timeout_ms}"
            )));
        }
        self.timeout_ms = timeout_ms;
        Ok(self)
    }

    pub fn with_task_step_limit(mut self, max_steps: usize) -> Result<Self> {
        if max_steps == 0 {
            return Err(Error::Configuration(
                "task step limit requires at least 1 step".into(),
            ));
        }
        self.task_step_limit = max_steps;
        Ok(self)
    }
}

/// What a running test body sees: the platform, the assertion primitive
/// and a deadline it cannot wait past.
pub struct TestContext<'a> {
    platform: &'a mut dyn Platform,
    description: String,
    timeout_ms: i64,
    deadline_ms: i64,
    task_step_limit: usize,
    assertions: usize,
}

impl<'a> TestContext<'a> {
    pub fn new(platform: &'a mut dyn Platform, description: &str, config: SuiteConfig) -> Self {
        let deadline_ms = platform.now_ms().saturating_add(config.timeout_ms);
        Self {
            platform,
            description: description.to_string(),
            timeout_ms: config.timeout_ms,
            deadline_ms,
            task_step_limit: config.task_step_limit,
            assertions: 0,
        }
    }

    pub fn platform(&mut self) -> &mut dyn Platform {
        &mut *self.platform
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn deadline_ms(&self) -> i64 {
        self.deadline_ms
    }

    pub fn assertion_count(&self) -> usize {
        self.assertions
    }

    pub fn assert_equals<T>(&mut self, actual: T, expected: T, message: &str) -> Result<()>
    where
        T: PartialEq + fmt::Display,
    {
        self.assertions += 1;
        if actual != expected {
            return Err(Error::AssertionFailed {
                expected: expected.to_string(),
                actual: actual.to_string(),
                message: message.to_string(),
            });
        }
        Ok(())
    }

    /// Pumps the platform until `signal` resolves or the deadline passes.
    pub fn wait_for(&mut self, signal: &OutcomeSignal) -> Result<NavigationOutcome> {
        let mut steps = 0usize;
        loop {
            if let Some(outcome) = signal.outcome() {
                return Ok(outcome);
            }
            if !self.run_one_due_task(&mut steps)? {
                if self.platform.now_ms() < self.deadline_ms {
                    self.platform.advance_time_to(self.deadline_ms)?;
                }
                return Err(Error::Timeout {
                    description: self.description.clone(),
                    timeout_ms: self.timeout_ms,
                });
            }
        }
    }

    /// Runs the tasks still queued before the deadline.
    pub fn settle(&mut self) -> Result<usize> {
        let mut steps = 0usize;
        while self.run_one_due_task(&mut steps)? {}
        Ok(steps)
    }

    fn run_one_due_task(&mut self, steps: &mut usize) -> Result<bool> {
        match self.platform.next_task_due_at() {
            Some(due_at) if due_at <= self.deadline_ms => {
                *steps += 1;
                if *steps > self.task_step_limit {
                    return Err(Error::TaskStepLimit {
                        limit: self.task_step_limit,
                        now_ms: self.platform.now_ms(),
                        pending: self.platform.pending_task_count(),
                    });
                }
                self.platform.run_next_task()
            }
            _ => Ok(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestStatus {
    Passed,
    Failed(Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestReport {
    pub description: String,
    pub status: TestStatus,
    pub assertions: usize,
}

impl TestReport {
    pub fn passed(&self) -> bool {
        self.status == TestStatus::Passed
    }

    pub fn timed_out(&self) -> bool {
        matches!(&self.status, TestStatus::Failed(err) if err.is_timeout())
    }

    pub fn error(&self) -> Option<&Error> {
        match &self.status {
            TestStatus::Failed(err) => Some(err),
            TestStatus::Passed => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteReport {
    pub reports: Vec<TestReport>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.reports.iter().filter(|report| report.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.reports.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.reports.iter().all(TestReport::passed)
    }

    pub fn get(&self, description: &str) -> Option<&TestReport> {
        self.reports
            .iter()
            .find(|report| report.description == description)
    }
}

struct RegisteredTest {
    description: String,
    body: TestBody,
}

/// Sequential runner: every registered body gets its own platform.
pub struct TestSuite {
    platform_factory: PlatformFactory,
    config: SuiteConfig,
    tests: Vec<RegisteredTest>,
}

impl TestSuite {
    pub fn new<F>(platform_factory: F) -> Self
    where
        F: FnMut() -> Result<Box<dyn Platform>> + 'static,
    {
        Self::with_config(platform_factory, SuiteConfig::default())
    }

    pub fn with_config<F>(platform_factory: F, config: SuiteConfig) -> Self
    where
        F: FnMut() -> Result<Box<dyn Platform>> + 'static,
    {
        Self {
            platform_factory: Box::new(platform_factory),
            config,
            tests: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    pub fn descriptions(&self) -> Vec<&str> {
        self.tests
            .iter()
            .map(|test| test.description.as_str())
            .collect()
    }

    pub fn run(&mut self) -> SuiteReport {
        let tests = std::mem::take(&mut self.tests);
        let mut report = SuiteReport::default();
        for test in tests {
            let outcome = self.run_one(test);
            match &outcome.status {
                TestStatus::Passed => {
                    tracing::info!(test = %outcome.description, "passed");
                }
                TestStatus::Failed(err) => {
                    tracing::warn!(test = %outcome.description, "failed: {err}");
                }
            }
            report.reports.push(outcome);
        }
        tracing::info!(
            passed = report.passed(),
            failed = report.failed(),
            "suite finished"
        );
        report
    }

    fn run_one(&mut self, test: RegisteredTest) -> TestReport {
        let RegisteredTest { description, body } = test;
        let mut platform = match (self.platform_factory)() {
            Ok(platform) => platform,
            Err(err) => {
                return TestReport {
                    description,
                    status: TestStatus::Failed(err),
                    assertions: 0,
                };
            }
        };
        let mut ctx = TestContext::new(platform.as_mut(), &description, self.config);
        let status = match body(&mut ctx) {
            Ok(()) => TestStatus::Passed,
            Err(err) => TestStatus::Failed(err),
        };
        let assertions = ctx.assertion_count();
        TestReport {
            description,
            status,
            assertions,
        }
    }
}

impl TestFramework for TestSuite {
    fn test(&mut self, body: TestBody, description: &str) {
        tracing::debug!(test = %description, "registered");
        self.tests.push(RegisteredTest {
            description: description.to_string(),
            body,
        });
    }
}
