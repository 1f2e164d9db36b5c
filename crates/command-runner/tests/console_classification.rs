//! Tests for classifying console output of real processes

#![cfg(unix)]

use command_runner::{
    CapturedOutput, Error, ErrorCategory, ErrorCategoryMapping, ErrorCategoryState, Runner,
};

fn runner_with(
    mapping: ErrorCategoryMapping,
    state: &ErrorCategoryState,
) -> (Runner, CapturedOutput) {
    let stderr = CapturedOutput::new();
    let runner = Runner::new()
        .with_stdout(CapturedOutput::new())
        .with_stderr(stderr.clone())
        .with_error_categories(mapping)
        .with_category_state(state.clone());
    (runner, stderr)
}

#[test]
fn test_successful_run_with_matching_line() {
    futures::executor::block_on(async {
        let state = ErrorCategoryState::new();
        let (mut runner, _stderr) = runner_with(
            ErrorCategoryMapping::new().with("config", ["command echo"]),
            &state,
        );

        let outcome = runner
            .run_executable("/bin/sh", ["-c", "echo foo; echo 'Stderr: command echo' >&2"])
            .await
            .unwrap();

        assert_eq!(outcome.exit_code(), Some(0));
        assert_eq!(outcome.category, ErrorCategory::Configuration);
        assert_eq!(state.get(), ErrorCategory::Configuration);
    });
}

#[test]
fn test_long_line_is_not_classified() {
    futures::executor::block_on(async {
        let state = ErrorCategoryState::new();
        let (mut runner, stderr) =
            runner_with(ErrorCategoryMapping::new().with("config", ["aaaa"]), &state);

        let script = "i=0; while [ $i -lt 1000 ]; do printf '%064d' 0; i=$((i+1)); done \
                      | tr 0 a >&2";
        let outcome = runner
            .run_executable("/bin/sh", ["-c", script])
            .await
            .unwrap();

        assert_eq!(stderr.bytes().len(), 64_000);
        assert!(stderr.bytes().iter().all(|&b| b == b'a'));
        assert_eq!(outcome.exit_code(), Some(0));
        assert!(outcome.category.is_undefined());
        assert!(state.get().is_undefined());
    });
}

#[test]
fn test_failed_run_keeps_category() {
    futures::executor::block_on(async {
        let state = ErrorCategoryState::new();
        let (mut runner, _stderr) = runner_with(
            ErrorCategoryMapping::new()
                .with("config", ["configuration error *"])
                .with("build", ["build failed"]),
            &state,
        );

        let err = runner
            .run_executable("/bin/sh", ["-c", "echo 'the build failed'; exit 1"])
            .await
            .unwrap_err();

        match &err {
            Error::ExitFailure { code, category, .. } => {
                assert_eq!(*code, 1);
                assert_eq!(*category, ErrorCategory::Build);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.category(), Some(&ErrorCategory::Build));
        assert_eq!(state.get(), ErrorCategory::Build);
    });
}

#[test]
fn test_non_zero_exit_alone_sets_no_category() {
    futures::executor::block_on(async {
        let state = ErrorCategoryState::new();
        let (mut runner, _stderr) = runner_with(
            ErrorCategoryMapping::new().with("build", ["build failed"]),
            &state,
        );

        let result = runner
            .run_executable("/bin/sh", ["-c", "echo 'all fine'; exit 4"])
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.category(), Some(&ErrorCategory::Undefined));
        assert_eq!(runner.exit_code(), Some(4));
        assert!(state.get().is_undefined());
    });
}

#[test]
fn test_state_is_not_reset_between_runs() {
    futures::executor::block_on(async {
        let state = ErrorCategoryState::new();
        let (mut runner, _stderr) = runner_with(
            ErrorCategoryMapping::new().with("build", ["build failed"]),
            &state,
        );

        runner
            .run_shell("/bin/sh", "echo 'build failed'")
            .await
            .unwrap();
        let outcome = runner.run_shell("/bin/sh", "echo clean").await.unwrap();

        // The shared state remembers the earlier match, the outcome does not
        assert_eq!(state.get(), ErrorCategory::Build);
        assert!(outcome.category.is_undefined());

        state.reset();
        runner.run_shell("/bin/sh", "echo clean").await.unwrap();
        assert!(state.get().is_undefined());
    });
}

#[test]
fn test_repeated_runs_classify_identically() {
    futures::executor::block_on(async {
        let mapping = ErrorCategoryMapping::new().with("test", ["* tests failed"]);
        let mut categories = Vec::new();

        for _ in 0..2 {
            let state = ErrorCategoryState::new();
            let (mut runner, _stderr) = runner_with(mapping.clone(), &state);
            let outcome = runner
                .run_shell("/bin/sh", "echo '3 tests failed' >&2")
                .await
                .unwrap();
            categories.push((outcome.category, state.get(), runner.exit_code()));
        }

        assert_eq!(categories[0], categories[1]);
        assert_eq!(categories[0].0, ErrorCategory::Test);
    });
}

#[test]
fn test_failed_runs_report_their_own_category() {
    futures::executor::block_on(async {
        let state = ErrorCategoryState::new();
        let (mut runner, _stderr) = runner_with(
            ErrorCategoryMapping::new().with("build", ["build failed"]),
            &state,
        );

        let first = runner
            .run_shell("/bin/sh", "echo 'build failed'; exit 1")
            .await
            .unwrap_err();
        let second = runner
            .run_shell("/bin/sh", "echo 'tests pending'; exit 2")
            .await
            .unwrap_err();

        assert_eq!(first.category(), Some(&ErrorCategory::Build));
        // The shared state still remembers the first run
        assert_eq!(second.category(), Some(&ErrorCategory::Undefined));
        assert_eq!(state.get(), ErrorCategory::Build);
        assert_eq!(runner.exit_code(), Some(2));
    });
}
