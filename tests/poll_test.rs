//! Poll-loop behavior under transient failure.

use std::collections::VecDeque;
use std::time::Duration;

use pretty_assertions::assert_eq;
use sqlshift::prelude::*;

/// Progress sink that records what the loop reported.
#[derive(Default)]
struct Recorder {
    transients: Vec<(String, u32)>,
    finished: usize,
}

impl Progress for Recorder {
    fn tick(&mut self, _frame: &str) {}

    fn transient(&mut self, error: &PollError, consecutive: u32) {
        self.transients.push((error.kind.clone(), consecutive));
    }

    fn finished(&mut self, _result: &JobResult) {
        self.finished += 1;
    }
}

fn options(max_consecutive_errors: u32) -> PollOptions {
    PollOptions {
        interval: Duration::ZERO,
        max_consecutive_errors,
    }
}

fn timeout() -> ShiftError {
    ShiftError::Transport {
        kind: TransportErrorKind::Timeout,
        message: "deadline exceeded".into(),
    }
}

fn pending() -> JobRecord {
    JobRecord {
        status: JobStatus::Pending,
        translated_models: Vec::new(),
    }
}

fn done() -> JobRecord {
    JobRecord {
        status: JobStatus::Done,
        translated_models: vec![TranslatedModel {
            source_filename: Some("query_1.sql".into()),
            asset_name: "query_1".into(),
            source_text: "SELECT 1".into(),
            target_text: Some("SELECT 1".into()),
            outcome: TranslationOutcome::Valid,
            failure_detail: None,
        }],
    }
}

fn scripted(
    script: Vec<ShiftResult<JobRecord>>,
) -> impl FnMut() -> ShiftResult<JobRecord> {
    let mut script: VecDeque<ShiftResult<JobRecord>> = script.into();
    move || script.pop_front().expect("poll script exhausted")
}

#[test]
fn three_transient_failures_are_absorbed_and_logged() {
    let check = scripted(vec![
        Err(timeout()),
        Err(timeout()),
        Err(timeout()),
        Ok(done()),
    ]);
    let mut recorder = Recorder::default();

    let result = poll_until_terminal(check, &options(5), &mut recorder).unwrap();

    assert_eq!(result.status, JobStatus::Done);
    assert_eq!(result.models.len(), 1);
    // The wait succeeded, but the full log is still attached.
    assert_eq!(result.polling_errors.len(), 3);
    assert_eq!(
        recorder.transients,
        vec![
            ("timeout".to_string(), 1),
            ("timeout".to_string(), 2),
            ("timeout".to_string(), 3),
        ]
    );
    assert_eq!(recorder.finished, 1);
}

#[test]
fn reaching_the_bound_raises_the_last_error() {
    let check = scripted(vec![
        Err(timeout()),
        Err(timeout()),
        Err(timeout()),
        Err(timeout()),
        Err(timeout()),
    ]);
    let mut recorder = Recorder::default();

    let err = poll_until_terminal(check, &options(5), &mut recorder).unwrap_err();

    assert!(err.is_transient());
    // All five entries were surfaced before the failure.
    assert_eq!(recorder.transients.len(), 5);
    assert_eq!(recorder.transients.last().map(|(_, n)| *n), Some(5));
    assert_eq!(recorder.finished, 0);
}

#[test]
fn a_successful_check_resets_the_consecutive_counter() {
    let check = scripted(vec![
        Err(timeout()),
        Err(timeout()),
        Ok(pending()),
        Err(timeout()),
        Err(timeout()),
        Err(timeout()),
        Err(timeout()),
        Ok(done()),
    ]);
    let mut recorder = Recorder::default();

    let result = poll_until_terminal(check, &options(5), &mut recorder).unwrap();

    assert_eq!(result.status, JobStatus::Done);
    // The log never resets, only the consecutive counter does.
    assert_eq!(result.polling_errors.len(), 6);
    assert_eq!(
        recorder
            .transients
            .iter()
            .map(|(_, n)| *n)
            .collect::<Vec<_>>(),
        vec![1, 2, 1, 2, 3, 4]
    );
}

#[test]
fn http_errors_are_retryable_while_polling() {
    let check = scripted(vec![
        Err(ShiftError::Http {
            status: 503,
            body: "service unavailable".into(),
        }),
        Ok(done()),
    ]);
    let mut recorder = Recorder::default();

    let result = poll_until_terminal(check, &options(5), &mut recorder).unwrap();

    assert_eq!(result.polling_errors.len(), 1);
    assert_eq!(result.polling_errors[0].kind, "http 503");
}

#[test]
fn unexpected_errors_propagate_immediately() {
    let check = scripted(vec![Err(ShiftError::UnexpectedResponse(
        "missing status".into(),
    ))]);
    let mut recorder = Recorder::default();

    let err = poll_until_terminal(check, &options(5), &mut recorder).unwrap_err();

    assert!(!err.is_transient());
    assert!(recorder.transients.is_empty());
}

#[test]
fn a_failed_job_is_a_terminal_result_not_an_error() {
    let check = scripted(vec![Ok(JobRecord {
        status: JobStatus::Failed,
        translated_models: Vec::new(),
    })]);

    let result = poll_until_terminal(check, &options(5), &mut Silent).unwrap();

    assert_eq!(result.status, JobStatus::Failed);
    assert!(result.polling_errors.is_empty());
}

#[test]
fn pending_statuses_keep_the_loop_alive() {
    let check = scripted(vec![Ok(pending()), Ok(pending()), Ok(done())]);

    let result = poll_until_terminal(check, &options(5), &mut Silent).unwrap();

    assert_eq!(result.status, JobStatus::Done);
    assert!(result.polling_errors.is_empty());
}
