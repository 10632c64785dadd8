use super::*;

#[test]
fn block_rules_apply_and_allow_rules_override() -> Result<()> {
    let filter = RuleFilter::new()
        .block(r"^https?://[^/]*malicious\.example/")?
        .block(r"^javascript:")?
        .allow(r"^https://safe\.malicious\.example/")?;

    assert_eq!(filter.check("https://malicious.example/"), Verdict::Block);
    assert_eq!(filter.check("http://cdn.malicious.example/x.js"), Verdict::Block);
    assert_eq!(filter.check("javascript:alert(1)"), Verdict::Block);
    assert_eq!(filter.check("https://safe.malicious.example/"), Verdict::Allow);
    assert_eq!(filter.check("https://safe.example/"), Verdict::Allow);
    assert_eq!(filter.block_patterns().len(), 2);
    Ok(())
}

#[test]
fn default_verdict_covers_unmatched_urls() -> Result<()> {
    let filter = RuleFilter::new()
        .allow(r"^https://intranet\.example/")?
        .with_default(Verdict::Block);
    assert_eq!(filter.check("https://intranet.example/home"), Verdict::Allow);
    assert_eq!(filter.check("https://elsewhere.example/"), Verdict::Block);
    Ok(())
}

#[test]
fn lookalike_spellings_are_canonicalized_before_matching() -> Result<()> {
    let filter = RuleFilter::new().block(r"^https://malicious\.example/")?;
    // Fullwidth letters fold to ASCII under NFKC.
    assert_eq!(filter.check("https://ｍａｌｉｃｉｏｕｓ.example/"), Verdict::Block);
    assert_eq!(filter.check("HTTPS://MALICIOUS.EXAMPLE"), Verdict::Block);
    assert_eq!(filter.check("  https://Malicious.Example/path  "), Verdict::Block);
    assert_eq!(
        canonicalize_url("HTTPS://Ｅxample.COM/Path"),
        "https://example.com/Path"
    );
    Ok(())
}

#[test]
fn lookaround_patterns_are_supported() -> Result<()> {
    let filter = RuleFilter::new().block(r"^https://(?!safe\.)[^/]+\.example/")?;
    assert_eq!(filter.check("https://phish.example/"), Verdict::Block);
    assert_eq!(filter.check("https://safe.example/"), Verdict::Allow);
    Ok(())
}

#[test]
fn invalid_pattern_is_a_configuration_error() {
    match RuleFilter::new().block("(unclosed") {
        Err(Error::Configuration(message)) => {
            assert!(message.contains("(unclosed"), "unexpected message: {message}");
        }
        other => panic!("expected configuration error, got: {other:?}"),
    }
}

#[test]
fn closures_and_static_filters_are_navigation_filters() {
    let by_scheme = |url: &str| {
        if url.starts_with("data:") {
            Verdict::Block
        } else {
            Verdict::Allow
        }
    };
    assert_eq!(by_scheme.check("data:text/html,hi"), Verdict::Block);
    assert_eq!(StaticFilter(Verdict::Block).check("https://safe.example/"), Verdict::Block);
}
