//! Tests for the foundry-agent command dispatcher

mod support;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use foundry_agent::application::services::EnvSource;
use foundry_agent::cli::commands::execute;
use foundry_agent::cli::{Cli, CliError};
use foundry_agent::config::Settings;
use foundry_agent::exitcode;
use foundry_agent::util::testing;

use support::{container, settings_with_endpoint, FakeAz, FakeBackend, MemoryEnv, ScriptedPrompter};

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

struct Run {
    result: Result<(), CliError>,
    stdout: String,
    backend: Arc<FakeBackend>,
}

fn dispatch_with(args: &[&str], settings: Settings, az: Arc<FakeAz>, lines: &[&str]) -> Run {
    let mut argv = vec!["foundry-agent"];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();

    let backend = Arc::new(FakeBackend::new());
    let services = container(
        settings,
        az,
        MemoryEnv::with(&[]),
        ScriptedPrompter::new(lines),
        backend.clone(),
    );
    let source = EnvSource {
        loaded: Some(PathBuf::from("/repo/.env")),
        searched: vec![PathBuf::from("/repo/.env")],
    };

    let mut out = Vec::new();
    let result = execute(&cli, &services, &source, &mut out);
    Run {
        result,
        stdout: String::from_utf8(out).unwrap(),
        backend,
    }
}

fn dispatch(args: &[&str]) -> Run {
    dispatch_with(args, settings_with_endpoint(), FakeAz::new(true, true), &[])
}

#[test]
fn given_missing_endpoint_when_dispatching_then_exit_1_and_no_backend_call() {
    // Arrange
    let az = FakeAz::new(true, true);

    // Act
    let run = dispatch_with(&["hello"], Settings::default(), az.clone(), &[]);

    // Assert
    let err = run.result.unwrap_err();
    assert!(matches!(err, CliError::MissingEndpoint { .. }));
    assert_eq!(err.exit_code(), exitcode::FAILURE);
    assert_eq!(err.kind(), "ConfigurationError");
    assert_eq!(run.backend.call_count(), 0);
    assert!(az.calls().is_empty(), "gate must not run without an endpoint");
}

#[test]
fn given_failed_auth_when_dispatching_then_exit_1_and_no_backend_call() {
    let run = dispatch_with(&["hello"], settings_with_endpoint(), FakeAz::new(true, false), &[]);

    let err = run.result.unwrap_err();
    assert!(matches!(err, CliError::AuthenticationFailed { .. }));
    assert_eq!(err.exit_code(), 1);
    assert_eq!(run.backend.call_count(), 0);
}

#[test]
fn given_quiet_mode_and_failed_auth_when_dispatching_then_gate_still_enforced() {
    let run = dispatch_with(&["-q", "hello"], settings_with_endpoint(), FakeAz::new(false, false), &[]);

    assert!(matches!(run.result, Err(CliError::AuthenticationFailed { .. })));
    assert!(run.stdout.is_empty());
    assert_eq!(run.backend.call_count(), 0);
}

#[test]
fn given_message_when_dispatching_single_then_prints_headers_and_response() {
    let run = dispatch(&["Rate", "my", "task"]);

    run.result.unwrap();
    assert_eq!(
        run.stdout,
        "Loaded config from: /repo/.env\n\
         Agent: ratemytask\n\
         Message: Rate my task\n\
         Response:\n\
         Score: 8/10\n"
    );
}

#[test]
fn given_quiet_single_when_dispatching_then_prints_only_response() {
    let run = dispatch(&["-q", "-a", "reviewer", "hello"]);

    run.result.unwrap();
    assert_eq!(run.stdout, "Score: 8/10\n");
    assert_eq!(run.backend.calls(), vec!["get_agent:reviewer", "create:1"]);
}

#[test]
fn given_stream_when_dispatching_then_output_equals_single_shot() {
    let single = dispatch(&["-q", "hello"]);
    let streamed = dispatch(&["-q", "-s", "hello"]);

    single.result.unwrap();
    streamed.result.unwrap();
    assert_eq!(streamed.stdout, single.stdout);
    assert_eq!(streamed.backend.calls(), vec!["get_agent:ratemytask", "stream"]);
}

#[test]
fn given_no_message_when_dispatching_single_then_missing_message_error() {
    let run = dispatch(&[]);

    let err = run.result.unwrap_err();
    assert!(matches!(err, CliError::MissingMessage));
    assert_eq!(err.exit_code(), 1);
    assert_eq!(run.backend.call_count(), 0);
}

#[test]
fn given_list_flag_when_dispatching_then_needs_no_message() {
    let run = dispatch(&["-l"]);

    run.result.unwrap();
    assert!(run.stdout.contains("Available agents:\nratemytask\nreviewer\n"));
    assert_eq!(run.backend.calls(), vec!["list:50"]);
}

#[test]
fn given_list_and_interactive_when_dispatching_then_list_wins() {
    let run = dispatch(&["-l", "-i", "-s", "ignored"]);

    run.result.unwrap();
    assert_eq!(run.backend.calls(), vec!["list:50"]);
}

#[test]
fn given_interactive_hello_then_exit_when_dispatching_then_one_exchange() {
    let run = dispatch_with(
        &["-i"],
        settings_with_endpoint(),
        FakeAz::new(true, true),
        &["hello", "exit"],
    );

    run.result.unwrap();
    assert_eq!(run.backend.calls(), vec!["get_agent:ratemytask", "create:1"]);
    assert!(run.stdout.contains("Agent: Score: 8/10"));
    assert!(run.stdout.contains("Ending session."));
}

#[test]
fn given_interactive_exit_alone_when_dispatching_then_no_response_request() {
    let run = dispatch_with(&["-i"], settings_with_endpoint(), FakeAz::new(true, true), &["exit"]);

    run.result.unwrap();
    assert_eq!(run.backend.calls(), vec!["get_agent:ratemytask"]);
}
