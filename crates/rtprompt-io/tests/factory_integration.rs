//! Integration tests for the console factory functions and the mock backend
//! driving a real session.

use rtprompt_core::{Key, Outcome, PromptConfig, PromptError, Session};
use rtprompt_io::mock::{MockConsoleInput, MockConsoleOutput};
use rtprompt_io::{create_console_output, create_mock_console_io, platform_info};
use std::sync::{Arc, Mutex};

#[cfg(unix)]
#[test]
fn test_create_console_output() {
    let output = create_console_output().expect("unix output is always available");
    output.flush().unwrap();
    assert!(platform_info().starts_with("Unix platform"));
}

#[cfg(not(unix))]
#[test]
fn test_unsupported_platform() {
    assert!(matches!(
        create_console_output(),
        Err(rtprompt_io::ConsoleError::UnsupportedFeature { .. })
    ));
}

fn run(input: &Arc<MockConsoleInput>, output: &MockConsoleOutput, config: PromptConfig) -> Result<Outcome, PromptError> {
    Session::new(config, input.clone(), Box::new(output.clone())).run()
}

#[test]
fn test_mock_session_submit() {
    let (input, output) = create_mock_console_io();
    input.queue_text_input("hello");
    input.queue_key(Key::Enter);

    let outcome = run(&input, &output, PromptConfig::new("> ")).unwrap();

    assert_eq!(outcome, Outcome::Submitted("hello".to_string()));
    assert_eq!(input.raw_mode_enters(), 1);
    assert_eq!(input.raw_mode_restores(), 1);
    assert!(output.output_string().starts_with("> h"));
}

#[test]
fn test_mock_session_from_raw_bytes() {
    let (input, output) = create_mock_console_io();
    // "ab", Left, Ctrl-A, "x", Ctrl-E, CR
    input.queue_bytes(b"ab\x1b[D\x01x\x05\r");

    let outcome = run(&input, &output, PromptConfig::new("")).unwrap();

    assert_eq!(outcome, Outcome::Submitted("xab".to_string()));
}

#[test]
fn test_mock_session_escape_cancels() {
    let (input, output) = create_mock_console_io();
    input.queue_text_input("abc");
    input.queue_bytes(b"\x1b");

    let outcome = run(&input, &output, PromptConfig::new("")).unwrap();

    assert_eq!(outcome, Outcome::Cancelled);
    assert_eq!(input.raw_mode_restores(), 1);
}

#[test]
fn test_mock_session_interrupt() {
    let (input, output) = create_mock_console_io();
    input.queue_text_input("abc");
    input.queue_key(Key::ControlC);

    let outcome = run(&input, &output, PromptConfig::new("")).unwrap();

    assert_eq!(outcome, Outcome::Interrupted);
    assert_eq!(input.raw_mode_restores(), 1);
    assert_eq!(input.interrupts_raised(), 1);
}

#[test]
fn test_mock_session_raw_mode_failure() {
    let (input, output) = create_mock_console_io();
    input.fail_raw_mode();
    input.queue_key(Key::Enter);

    let err = run(&input, &output, PromptConfig::new("> ")).unwrap_err();

    assert!(matches!(err, PromptError::TerminalMode(_)));
    assert!(output.output().is_empty());
    assert_eq!(input.queued_event_count(), 1);
}

#[test]
fn test_mock_session_end_of_input() {
    let (input, output) = create_mock_console_io();
    input.queue_text_input("abc");

    let err = run(&input, &output, PromptConfig::new("")).unwrap_err();

    assert!(matches!(err, PromptError::Disconnected));
    assert_eq!(input.raw_mode_restores(), 1);
}

#[test]
fn test_mock_session_callback_output_is_painted() {
    let (input, output) = create_mock_console_io();
    input.queue_text_input("ab");
    input.queue_key(Key::Enter);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = Arc::clone(&seen);
    let callback = move |text: &str, _: bool, enter: bool| {
        if enter {
            record.lock().unwrap().push(text.to_string());
            return String::new();
        }
        format!("len={}", text.len())
    };

    let outcome = Session::new(PromptConfig::new("> "), input.clone(), Box::new(output.clone()))
        .with_callback(Box::new(callback))
        .run()
        .unwrap();

    assert_eq!(outcome, Outcome::Submitted("ab".to_string()));
    assert_eq!(*seen.lock().unwrap(), vec!["ab".to_string()]);
    assert!(output.flush_count() > 0);
}
