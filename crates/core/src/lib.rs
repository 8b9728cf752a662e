//! Domain types for the RunningHub generation client.
//!
//! Everything in this crate is pure data and decision logic: job requests,
//! the job state machine, status-token classification, output artifact
//! selection, the progress heuristic, and the poll/retry budgets. All I/O
//! lives in `mediagen-runninghub`.

pub mod artifact;
pub mod error;
pub mod failure;
pub mod feature;
pub mod job;
pub mod polling;
pub mod progress;
pub mod request;
pub mod status;
pub mod types;
