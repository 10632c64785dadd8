use safe_links_tester::{
    Error, Expectation, MockBrowser, OutcomeDelivery, Platform, Result, RuleFilter, Scenario,
    ScenarioSpec, ScenarioTestCase, SuiteConfig, TestSuite, register_scenarios,
};

const BLOCK_PATTERN: &str = r"^https?://([^/]+\.)?malicious\.example/";

fn filtered_suite(delivery: OutcomeDelivery, config: SuiteConfig) -> TestSuite {
    TestSuite::with_config(
        move || {
            let filter = RuleFilter::new().block(BLOCK_PATTERN)?;
            let mut browser = MockBrowser::with_filter(filter);
            browser.set_outcome_delivery(delivery)?;
            Ok(Box::new(browser) as Box<dyn Platform>)
        },
        config,
    )
}

#[test]
fn allowed_and_blocked_scenarios_pass_against_matching_filter() -> Result<()> {
    let mut suite = filtered_suite(OutcomeDelivery::default(), SuiteConfig::default());
    register_scenarios(
        &mut suite,
        [
            Scenario::new("https://safe.example/", Expectation::Allowed, "safe url")?,
            Scenario::new(
                "https://malicious.example/",
                Expectation::Blocked,
                "malicious url",
            )?,
        ],
    );
    assert_eq!(suite.descriptions(), ["safe url", "malicious url"]);

    let report = suite.run();
    assert_eq!(report.passed(), 2);
    for description in ["safe url", "malicious url"] {
        let Some(test) = report.get(description) else {
            panic!("missing report for {description}");
        };
        assert_eq!(test.assertions, 1);
    }
    Ok(())
}

#[test]
fn mismatched_expectations_fail_naming_the_expected_outcome() -> Result<()> {
    let mut suite = filtered_suite(OutcomeDelivery::default(), SuiteConfig::default());
    ScenarioTestCase::new(Scenario::new(
        "https://safe.example/",
        Expectation::Blocked,
        "safe url expected blocked",
    )?)
    .start(&mut suite);
    ScenarioTestCase::new(Scenario::new(
        "https://cdn.malicious.example/",
        Expectation::Allowed,
        "malicious url expected allowed",
    )?)
    .start(&mut suite);

    let report = suite.run();
    assert_eq!(report.failed(), 2);

    let Some(safe) = report.get("safe url expected blocked") else {
        panic!("missing safe url report");
    };
    assert_eq!(
        safe.error().map(ToString::to_string).as_deref(),
        Some(
            "assertion failed: The request to the URL should be blocked. (expected blocked, actual allowed)"
        )
    );

    let Some(malicious) = report.get("malicious url expected allowed") else {
        panic!("missing malicious url report");
    };
    assert_eq!(
        malicious.error(),
        Some(&Error::AssertionFailed {
            expected: "allowed".into(),
            actual: "blocked".into(),
            message: "The request to the URL should be allowed.".into(),
        })
    );
    Ok(())
}

#[test]
fn silent_platform_times_out_without_assertion() -> Result<()> {
    let config = SuiteConfig::default().with_timeout_ms(500)?;
    let mut suite = filtered_suite(OutcomeDelivery::Suppressed, config);
    ScenarioTestCase::new(Scenario::new(
        "https://safe.example/",
        Expectation::Allowed,
        "no outcome",
    )?)
    .start(&mut suite);

    let report = suite.run();
    let Some(test) = report.get("no outcome") else {
        panic!("missing report");
    };
    assert!(test.timed_out());
    assert_eq!(test.assertions, 0);
    assert_eq!(
        test.error(),
        Some(&Error::Timeout {
            description: "no outcome".into(),
            timeout_ms: 500,
        })
    );
    Ok(())
}

#[test]
fn latency_past_the_deadline_counts_as_timeout() -> Result<()> {
    let config = SuiteConfig::default().with_timeout_ms(100)?;
    let mut suite = filtered_suite(OutcomeDelivery::Deferred { latency_ms: 250 }, config);
    ScenarioTestCase::new(Scenario::new(
        "https://malicious.example/",
        Expectation::Blocked,
        "slow platform",
    )?)
    .start(&mut suite);

    let report = suite.run();
    assert!(report.reports[0].timed_out());
    Ok(())
}

#[test]
fn json_spec_drives_a_full_suite() -> Result<()> {
    let spec = ScenarioSpec::from_json_str(
        r#"{
          "specification": [{
            "name": "hyperlinks",
            "description": "anchor clicks are filtered",
            "test_expansion": [
              { "name": "safe", "urls": ["https://safe.example/", "/relative/page"], "expectation": "allowed" },
              { "name": "malicious", "urls": "http://login.malicious.example/", "expectation": "blocked" }
            ]
          }]
        }"#,
    )?;
    let mut suite = filtered_suite(OutcomeDelivery::Synchronous, SuiteConfig::default());
    assert_eq!(spec.register(&mut suite)?, 3);
    assert_eq!(
        suite.descriptions(),
        [
            "hyperlinks: safe [https://safe.example/]",
            "hyperlinks: safe [/relative/page]",
            "hyperlinks: malicious",
        ]
    );

    let report = suite.run();
    assert!(report.all_passed(), "unexpected report: {report:?}");
    assert!(suite.is_empty());
    Ok(())
}

#[test]
fn failing_platform_factory_is_reported_per_test() -> Result<()> {
    let mut suite = TestSuite::new(|| {
        RuleFilter::new().block("(")?;
        Ok(Box::new(MockBrowser::new()) as Box<dyn Platform>)
    });
    ScenarioTestCase::new(Scenario::parse(
        "https://safe.example/",
        "allowed",
        "bad filter",
    )?)
    .start(&mut suite);

    let report = suite.run();
    assert!(matches!(
        report.reports[0].error(),
        Some(Error::Configuration(_))
    ));
    assert_eq!(report.reports[0].assertions, 0);
    Ok(())
}
