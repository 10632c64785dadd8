use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use safe_links_tester::{Error, MockBrowser, Platform, RuleFilter, ScenarioSpec, TestSuite};

#[derive(Parser)]
#[command(name = "safe-links-lint")]
#[command(about = "Validate safe-links scenario files and dry-run them against block rules", long_about = None)]
struct Cli {
    /// Scenario file describing the tests to generate
    #[arg(short, long)]
    spec: PathBuf,

    /// Print every expanded scenario
    #[arg(long, default_value_t = false)]
    list: bool,

    /// Run the scenarios against a mock browser blocking these URL patterns
    #[arg(long = "check-against", value_name = "REGEX")]
    check_against: Vec<String>,

    /// Enable debug logging
    #[arg(short, long, default_value_t = false)]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so `--list` output on stdout stays tab-separated.
    let level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(Error::ScenarioSpec { path, message }) => {
            println!("Spec Error: {message}");
            println!("  at {path}");
            ExitCode::FAILURE
        }
        Err(err) => {
            println!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> safe_links_tester::Result<bool> {
    let spec = ScenarioSpec::load(&cli.spec)?;
    let scenarios = spec.expand()?;
    tracing::info!(
        groups = spec.groups().len(),
        scenarios = scenarios.len(),
        "scenario file is valid"
    );

    if cli.list {
        for scenario in &scenarios {
            println!(
                "{}\t{}\t{}",
                scenario.expectation(),
                scenario.url(),
                scenario.description()
            );
        }
    }

    if cli.check_against.is_empty() {
        return Ok(true);
    }

    let mut filter = RuleFilter::new();
    for pattern in &cli.check_against {
        filter = filter.block(pattern)?;
    }
    let mut suite = TestSuite::new(move || {
        Ok(Box::new(MockBrowser::with_filter(filter.clone())) as Box<dyn Platform>)
    });
    spec.register(&mut suite)?;
    let report = suite.run();
    for test in &report.reports {
        match test.error() {
            None => println!("PASS {}", test.description),
            Some(err) => println!("FAIL {}: {err}", test.description),
        }
    }
    println!("{} passed, {} failed", report.passed(), report.failed());
    Ok(report.all_passed())
}
