use super::*;
use crate::diagnostics::error_codes::ALL_CODES;
use crate::testing::{RunResults, RunSummary, ScenarioResult, ScenarioStatus};
use crate::diagnostics::Finding;
use clap::Parser;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_every_code_has_an_explanation() {
    for code in ALL_CODES {
        let text = explain_cmd::get_error_explanation(code)
            .unwrap_or_else(|| panic!("no explanation for {}", code));
        assert!(text.starts_with(*code), "{}", code);
    }
    assert!(explain_cmd::get_error_explanation("E9999").is_none());
}

#[test]
fn test_parse_run_command() {
    let cli = Cli::try_parse_from([
        "deferred",
        "run",
        "tests/scenarios",
        "--filter",
        "race",
        "--fail-fast",
        "--json",
    ])
    .unwrap();
    assert!(cli.json);
    match cli.command {
        Command::Run {
            paths,
            filter,
            fail_fast,
        } => {
            assert_eq!(paths, vec![PathBuf::from("tests/scenarios")]);
            assert_eq!(filter.as_deref(), Some("race"));
            assert!(fail_fast);
        }
        other => panic!("unexpected command {:?}", other),
    }
}

#[test]
fn test_parse_defaults_to_current_directory() {
    let cli = Cli::try_parse_from(["deferred", "--log-level", "debug", "check"]).unwrap();
    assert_eq!(cli.log_level.as_deref(), Some("debug"));
    match cli.command {
        Command::Check { paths } => assert_eq!(paths, vec![PathBuf::from(".")]),
        other => panic!("unexpected command {:?}", other),
    }
}

#[test]
fn test_collect_scenarios_skips_config_and_sorts() {
    let tmp = TempDir::new().unwrap();
    let nested = tmp.path().join("nested");
    std::fs::create_dir_all(&nested).unwrap();
    for path in [
        tmp.path().join("b.toml"),
        tmp.path().join("a.toml"),
        tmp.path().join(CONFIG_FILE),
        tmp.path().join("notes.md"),
        nested.join("c.toml"),
    ] {
        std::fs::write(path, "").unwrap();
    }

    let files = collect_scenarios(&[tmp.path().to_path_buf()]).unwrap();
    let names: Vec<_> = files
        .iter()
        .map(|p| p.strip_prefix(tmp.path()).unwrap().to_path_buf())
        .collect();
    assert_eq!(
        names,
        vec![
            PathBuf::from("a.toml"),
            PathBuf::from("b.toml"),
            PathBuf::from("nested").join("c.toml"),
        ]
    );
}

#[test]
fn test_render_report() {
    let results = RunResults {
        summary: RunSummary {
            total: 2,
            passed: 1,
            failed: 1,
            errored: 0,
            duration: Duration::ZERO,
        },
        scenarios: vec![
            ScenarioResult {
                name: "race_delay".to_string(),
                file: "race_delay.toml".to_string(),
                status: ScenarioStatus::Passed,
                duration: Duration::ZERO,
                elapsed_ms: 100,
                failures: Vec::new(),
                unhandled_rejections: Vec::new(),
            },
            ScenarioResult {
                name: "all_order".to_string(),
                file: "all_order.toml".to_string(),
                status: ScenarioStatus::Failed,
                duration: Duration::ZERO,
                elapsed_ms: 300,
                failures: vec![Finding::error("E2002", "`all`: expected fulfilled with [2, 5, 3], found [2, 3, 5]")],
                unhandled_rejections: Vec::new(),
            },
        ],
    };
    insta::assert_snapshot!(run_cmd::render(&results), @r"
    PASS  race_delay (100ms virtual)
    FAIL  all_order (300ms virtual)
          error[E2002]: `all`: expected fulfilled with [2, 5, 3], found [2, 3, 5]

    2 scenario(s): 1 passed, 1 failed, 0 errored (0ms)
    ");
}
