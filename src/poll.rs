//! Poll a translation job until it reaches a terminal status.
//!
//! Single logical thread of control: the loop blocks the caller,
//! checking the job no more often than the configured interval and
//! refreshing a cosmetic spinner in between. Transient network
//! failures are absorbed up to a bound of consecutive occurrences;
//! anything else propagates immediately.

use std::thread;
use std::time::{Duration, Instant};

use crate::client::Client;
use crate::error::ShiftResult;
use crate::model::{JobRecord, JobRef, JobResult, PollError};

/// Braille spinner frames, advanced once per tick.
pub const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Spinner refresh period. Much shorter than any sane poll interval;
/// purely cosmetic and never affects when status checks happen.
const SPINNER_TICK: Duration = Duration::from_millis(100);

/// How long to wait and how much transience to tolerate.
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Minimum time between status requests.
    pub interval: Duration,
    /// Consecutive transient failures tolerated before giving up.
    /// There is no cap on total elapsed time: a service that keeps
    /// answering but never terminates keeps the loop alive.
    pub max_consecutive_errors: u32,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_consecutive_errors: 5,
        }
    }
}

/// Observer for poll progress. The loop reports incrementally so a
/// long-running wait stays observable; implementations must not block.
pub trait Progress {
    /// A spinner refresh while the loop is waiting.
    fn tick(&mut self, frame: &str);

    /// A status check failed with a retryable error; `consecutive` is
    /// the current run length of such failures.
    fn transient(&mut self, error: &PollError, consecutive: u32);

    /// The job reached a terminal status.
    fn finished(&mut self, result: &JobResult);
}

/// Progress sink that ignores everything.
pub struct Silent;

impl Progress for Silent {
    fn tick(&mut self, _frame: &str) {}
    fn transient(&mut self, _error: &PollError, _consecutive: u32) {}
    fn finished(&mut self, _result: &JobResult) {}
}

/// Drive `check` until it reports a terminal status.
///
/// On success the returned [`JobResult`] carries the full transient
/// error log accumulated along the way, even though the wait ultimately
/// succeeded, so the caller can audit what happened. When the
/// consecutive-failure bound is hit the last error is propagated; every
/// entry of the log was already surfaced through `progress`.
pub fn poll_until_terminal<F>(
    mut check: F,
    options: &PollOptions,
    progress: &mut dyn Progress,
) -> ShiftResult<JobResult>
where
    F: FnMut() -> ShiftResult<JobRecord>,
{
    let mut polling_errors: Vec<PollError> = Vec::new();
    let mut consecutive = 0u32;
    let mut last_check: Option<Instant> = None;
    let mut frame = 0usize;

    loop {
        let due = match last_check {
            None => true,
            Some(at) => at.elapsed() >= options.interval,
        };

        if due {
            last_check = Some(Instant::now());
            match check() {
                Ok(record) => {
                    consecutive = 0;
                    if record.status.is_terminal() {
                        let result = JobResult {
                            status: record.status,
                            models: record.translated_models,
                            polling_errors,
                        };
                        progress.finished(&result);
                        return Ok(result);
                    }
                    log::debug!("job still {}, waiting", record.status);
                }
                Err(err) if err.is_transient() => {
                    consecutive += 1;
                    let entry = PollError::from_error(&err);
                    progress.transient(&entry, consecutive);
                    polling_errors.push(entry);
                    if consecutive >= options.max_consecutive_errors {
                        log::warn!(
                            "giving up after {consecutive} consecutive transient errors"
                        );
                        return Err(err);
                    }
                }
                Err(err) => return Err(err),
            }
        }

        progress.tick(SPINNER_FRAMES[frame % SPINNER_FRAMES.len()]);
        frame += 1;
        thread::sleep(SPINNER_TICK);
    }
}

impl Client {
    /// Block until `job` reaches a terminal status, tolerating up to
    /// `options.max_consecutive_errors` transient failures in a row.
    pub fn wait_for_completion(
        &self,
        job: &JobRef,
        options: &PollOptions,
        progress: &mut dyn Progress,
    ) -> ShiftResult<JobResult> {
        log::debug!("waiting for {job}");
        poll_until_terminal(|| self.fetch_job(job), options, progress)
    }
}
