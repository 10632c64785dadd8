use proptest::prelude::*;
use proptest::test_runner::{FileFailurePersistence, TestCaseResult};
use safe_links_tester::{
    Expectation, MockBrowser, OutcomeDelivery, Platform, Scenario, ScenarioTestCase,
    StaticFilter, SuiteConfig, TestSuite, Verdict,
};

const OUTCOME_PROPTEST_REGRESSION_FILE: &str =
    "tests/proptest-regressions/outcome_property_test.txt";
const DEFAULT_OUTCOME_PROPTEST_CASES: u32 = 128;
const TIMEOUT_MS: i64 = 1_000;

fn outcome_proptest_cases() -> u32 {
    std::env::var("SAFE_LINKS_PROPTEST_CASES")
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_OUTCOME_PROPTEST_CASES)
}

fn verdict_strategy() -> BoxedStrategy<Verdict> {
    prop_oneof![Just(Verdict::Allow), Just(Verdict::Block)].boxed()
}

fn expectation_strategy() -> BoxedStrategy<Expectation> {
    prop_oneof![Just(Expectation::Allowed), Just(Expectation::Blocked)].boxed()
}

fn delivery_strategy() -> BoxedStrategy<OutcomeDelivery> {
    prop_oneof![
        4 => (0i64..=2 * TIMEOUT_MS)
            .prop_map(|latency_ms| OutcomeDelivery::Deferred { latency_ms }),
        2 => Just(OutcomeDelivery::Synchronous),
        1 => Just(OutcomeDelivery::Suppressed),
        1 => Just(OutcomeDelivery::Both),
    ]
    .boxed()
}

fn url_strategy() -> BoxedStrategy<String> {
    prop_oneof![
        Just("https://safe.example/".to_string()),
        Just("https://malicious.example/login".to_string()),
        Just("/relative/path?q=1".to_string()),
        Just("#fragment".to_string()),
        Just("javascript:void(0)".to_string()),
        "[a-z]{1,8}".prop_map(|host| format!("http://{host}.example/")),
    ]
    .boxed()
}

fn assert_single_scenario_outcome(
    url: &str,
    expectation: Expectation,
    verdict: Verdict,
    delivery: OutcomeDelivery,
) -> TestCaseResult {
    let config = SuiteConfig::default()
        .with_timeout_ms(TIMEOUT_MS)
        .map_err(|err| TestCaseError::fail(format!("{err:?}")))?;
    let mut suite = TestSuite::with_config(
        move || {
            let mut browser = MockBrowser::with_filter(StaticFilter(verdict));
            browser.set_outcome_delivery(delivery)?;
            Ok(Box::new(browser) as Box<dyn Platform>)
        },
        config,
    );
    let scenario = Scenario::new(url, expectation, "generated")
        .map_err(|err| TestCaseError::fail(format!("{err:?}")))?;
    ScenarioTestCase::new(scenario).start(&mut suite);

    let report = suite.run();
    prop_assert_eq!(report.reports.len(), 1);
    let test = &report.reports[0];
    prop_assert!(test.assertions <= 1, "more than one assertion: {test:?}");

    let reported = match delivery {
        OutcomeDelivery::Deferred { latency_ms } => latency_ms <= TIMEOUT_MS,
        OutcomeDelivery::Synchronous | OutcomeDelivery::Both => true,
        OutcomeDelivery::Suppressed => false,
    };
    if !reported {
        prop_assert!(test.timed_out(), "expected timeout: {test:?}");
        prop_assert_eq!(test.assertions, 0);
        return Ok(());
    }
    if delivery == OutcomeDelivery::Both {
        prop_assert!(!test.passed(), "conflicting outcomes must fail: {test:?}");
        prop_assert_eq!(test.assertions, 0);
        return Ok(());
    }

    let expected_pass = matches!(
        (verdict, expectation),
        (Verdict::Allow, Expectation::Allowed) | (Verdict::Block, Expectation::Blocked)
    );
    prop_assert_eq!(test.passed(), expected_pass, "report: {:?}", test);
    prop_assert_eq!(test.assertions, 1);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: outcome_proptest_cases(),
        failure_persistence: Some(Box::new(
            FileFailurePersistence::Direct(OUTCOME_PROPTEST_REGRESSION_FILE),
        )),
        .. ProptestConfig::default()
    })]

    #[test]
    fn scenario_passes_exactly_when_verdict_matches_expectation(
        url in url_strategy(),
        expectation in expectation_strategy(),
        verdict in verdict_strategy(),
        delivery in delivery_strategy(),
    ) {
        assert_single_scenario_outcome(&url, expectation, verdict, delivery)?;
    }
}
