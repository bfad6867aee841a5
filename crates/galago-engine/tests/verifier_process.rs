//! Verifier oracle against fake verifier scripts.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use galago_engine::config::{
    EngineOptions, OracleChoice, ScoringPolicy, TaskSpec, VerifierCommand, VerifierTemplates,
};
use galago_engine::oracle::report::ReportError;
use galago_engine::oracle::{oracle_for_task, OracleError, OracleOutcome};
use galago_expr::parse;
use galago_ice::ObligationKind;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn fake_verifier(dir: &TempDir, body: &str) -> Result<PathBuf, std::io::Error> {
    let path = dir.path().join("verifier.sh");
    fs::write(&path, format!("#!/bin/sh\n{body}\n"))?;
    let mut perms = fs::metadata(&path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms)?;
    Ok(path)
}

fn verifier_options(program: &Path) -> EngineOptions {
    EngineOptions {
        oracle: OracleChoice::Verifier,
        verifier: VerifierCommand {
            program: program.to_string_lossy().into_owned(),
            args: Vec::new(),
        },
        ..EngineOptions::default()
    }
}

fn templated_task() -> TaskSpec {
    TaskSpec::new("proc").with_verifier(VerifierTemplates {
        prelude: "invariant := ".to_string(),
        pre_suffix: "; check entry".to_string(),
        inductive_suffix: "; check step".to_string(),
        combined_suffix: "; check all".to_string(),
    })
}

#[test]
fn all_clear_report_verifies_the_candidate() -> TestResult {
    let dir = TempDir::new()?;
    let script = fake_verifier(&dir, r#"echo "Verifier finished with 3 verified, 0 errors""#)?;
    let options = verifier_options(&script);
    let task = templated_task();

    let mut oracle = oracle_for_task(&options, &task, None)?;
    let outcome = oracle.check(&parse("x >= 0", "cand.inv")?)?;
    assert_eq!(outcome, OracleOutcome::Verified);
    Ok(())
}

#[test]
fn entry_failure_report_yields_a_pre_witness() -> TestResult {
    let dir = TempDir::new()?;
    let script = fake_verifier(
        &dir,
        r#"echo "prog(3,1): Error BP5004: entry condition violated"
echo "T:{x=0,y=1}""#,
    )?;
    let options = verifier_options(&script);
    let task = templated_task();

    let mut oracle = oracle_for_task(&options, &task, None)?;
    match oracle.check(&parse("x >= 1", "cand.inv")?)? {
        OracleOutcome::Refuted { kind, witness } => {
            assert_eq!(kind, ObligationKind::Pre);
            assert_eq!(witness.key(), "T:{x=0,y=1}");
        }
        other => panic!("expected a pre refutation, got {other:?}"),
    }
    Ok(())
}

#[test]
fn step_failure_report_yields_an_inductive_witness() -> TestResult {
    let dir = TempDir::new()?;
    let script = fake_verifier(
        &dir,
        r#"echo "prog(7,1): Error BP5005: step violated"
echo "I:{x=1;x=2}""#,
    )?;
    let options = verifier_options(&script);
    let task = templated_task();

    let mut oracle = oracle_for_task(&options, &task, None)?;
    match oracle.check(&parse("x <= 1", "cand.inv")?)? {
        OracleOutcome::Refuted { kind, witness } => {
            assert_eq!(kind, ObligationKind::Inductive);
            assert_eq!(witness.key(), "I:{x=1;x=2}");
        }
        other => panic!("expected an inductive refutation, got {other:?}"),
    }
    Ok(())
}

#[test]
fn exit_failure_report_yields_a_post_witness() -> TestResult {
    let dir = TempDir::new()?;
    let script = fake_verifier(
        &dir,
        r#"echo "prog(9,1): Error BP5001: exit assertion violated"
echo "F:{n=-2}""#,
    )?;
    let options = verifier_options(&script);
    let task = templated_task();

    let mut oracle = oracle_for_task(&options, &task, None)?;
    match oracle.check(&parse("n >= 0", "cand.inv")?)? {
        OracleOutcome::Refuted { kind, witness } => {
            assert_eq!(kind, ObligationKind::Post);
            assert_eq!(witness.key(), "F:{n=-2}");
        }
        other => panic!("expected a post refutation, got {other:?}"),
    }
    Ok(())
}

#[test]
fn syntax_rejection_is_a_report_error() -> TestResult {
    let dir = TempDir::new()?;
    let script = fake_verifier(&dir, r#"echo "prog(1,1): 2 parse errors detected""#)?;
    let options = verifier_options(&script);
    let task = templated_task();

    let mut oracle = oracle_for_task(&options, &task, None)?;
    match oracle.check(&parse("x >= 0", "cand.inv")?) {
        Err(OracleError::Report(ReportError::SyntaxRejected)) => {}
        other => panic!("expected a syntax rejection, got {other:?}"),
    }
    Ok(())
}

#[test]
fn unclassifiable_output_is_a_report_error() -> TestResult {
    let dir = TempDir::new()?;
    let script = fake_verifier(&dir, r#"echo "segmentation fault""#)?;
    let options = verifier_options(&script);
    let task = templated_task();

    let mut oracle = oracle_for_task(&options, &task, None)?;
    match oracle.check(&parse("x >= 0", "cand.inv")?) {
        Err(OracleError::Report(ReportError::Unrecognized { .. })) => {}
        other => panic!("expected an unrecognized report, got {other:?}"),
    }
    Ok(())
}

#[test]
fn missing_verifier_binary_is_a_process_error() -> TestResult {
    let options = verifier_options(Path::new("/nonexistent/galago-verifier"));
    let task = templated_task();

    let mut oracle = oracle_for_task(&options, &task, None)?;
    match oracle.check(&parse("x >= 0", "cand.inv")?) {
        Err(OracleError::Process(message)) => {
            assert!(message.contains("failed to launch"), "message: {message}");
        }
        other => panic!("expected a process error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn non_zero_exit_is_a_process_error() -> TestResult {
    let dir = TempDir::new()?;
    let script = fake_verifier(
        &dir,
        r#"echo "internal crash" >&2
exit 3"#,
    )?;
    let options = verifier_options(&script);
    let task = templated_task();

    let mut oracle = oracle_for_task(&options, &task, None)?;
    match oracle.check(&parse("x >= 0", "cand.inv")?) {
        Err(OracleError::Process(message)) => {
            assert!(message.contains("internal crash"), "message: {message}");
        }
        other => panic!("expected a process error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn ordered_query_submits_three_rendered_programs() -> TestResult {
    let dir = TempDir::new()?;
    let args_file = dir.path().join("args.txt");
    let body = format!(
        r#"printf '%s\n' "$@" > "{}"
echo "Verifier finished with 3 verified, 0 errors""#,
        args_file.display()
    );
    let script = fake_verifier(&dir, &body)?;
    let options = verifier_options(&script);
    let task = templated_task();

    let mut oracle = oracle_for_task(&options, &task, None)?;
    oracle.check(&parse("x >= 0", "cand.inv")?)?;

    let recorded = fs::read_to_string(&args_file)?;
    let args: Vec<&str> = recorded.lines().collect();
    assert_eq!(
        args,
        vec![
            "invariant := x >= 0; check entry",
            "invariant := x >= 0; check step",
            "invariant := x >= 0; check all",
        ]
    );
    Ok(())
}

#[test]
fn any_policy_submits_fixed_args_then_the_combined_program() -> TestResult {
    let dir = TempDir::new()?;
    let args_file = dir.path().join("args.txt");
    let body = format!(
        r#"printf '%s\n' "$@" > "{}"
echo "Verifier finished with 1 verified, 0 errors""#,
        args_file.display()
    );
    let script = fake_verifier(&dir, &body)?;

    let mut options = verifier_options(&script);
    options.scoring = ScoringPolicy::Any;
    options.verifier.args = vec!["/nologo".to_string()];
    let task = templated_task();

    let mut oracle = oracle_for_task(&options, &task, None)?;
    oracle.check(&parse("x >= 0", "cand.inv")?)?;

    let recorded = fs::read_to_string(&args_file)?;
    let args: Vec<&str> = recorded.lines().collect();
    assert_eq!(args, vec!["/nologo", "invariant := x >= 0; check all"]);
    Ok(())
}
