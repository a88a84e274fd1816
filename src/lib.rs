//! # sqlshift — SQL translation client
//!
//! > Move your SQL to a new dialect without babysitting the job.
//!
//! sqlshift drives a remote SQL-translation service end to end: it
//! provisions a workspace, uploads queries, starts a translation job,
//! polls until the job finishes (tolerating a bounded run of transient
//! network failures), and renders the result as a side-by-side HTML
//! diff report.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use sqlshift::prelude::*;
//!
//! let client = Client::new(DEFAULT_HOST, "api-key")?;
//!
//! // Submit queries end to end and wait for the job.
//! let job = client.translate(&queries, None, None)?;
//! let result = client.wait_for_completion(&job, &PollOptions::default(), &mut Silent)?;
//!
//! // Render the diff report.
//! let report = render_report(&result, "snowflake", "databricks");
//! report.write_to(Path::new("report.html"))?;
//! ```
//!
//! Everything is blocking and single-threaded: one client, one job,
//! one wait. The only suspension point is the spinner sleep inside the
//! poll loop.

pub mod client;
pub mod config;
pub mod diff;
pub mod error;
pub mod model;
pub mod poll;
pub mod report;
pub mod transport;

pub mod prelude {
    pub use crate::client::{Client, DEFAULT_TARGET_KIND};
    pub use crate::config::{Config, DEFAULT_HOST, State};
    pub use crate::diff::{DiffLine, LineKind, SideBySide, side_by_side};
    pub use crate::error::{ShiftError, ShiftResult, TransportErrorKind};
    pub use crate::model::{
        DataSource, FailureDetail, JobRecord, JobRef, JobResult, JobStatus, PollError, Project,
        TranslatedModel, TranslationOutcome,
    };
    pub use crate::poll::{PollOptions, Progress, SPINNER_FRAMES, Silent, poll_until_terminal};
    pub use crate::report::{ReportDocument, render_report, title_case};
    pub use crate::transport::{HttpTransport, Transport};
}
