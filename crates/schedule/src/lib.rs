//! Schedule rule parsing and next-occurrence computation.
//!
//! A schedule rule is a small textual DSL mapping a weekday set and a
//! time-of-day to a replica count and/or side-effect settings, e.g.
//! `"Mon-Fri 8:00 replicas=1"` or `"Sat,Sun 14:00 replicas=0 trigger=backup"`.
//! Rules are parsed once (from configuration or workload annotations) and are
//! immutable afterwards.

mod attribute;
mod error;
mod parse;
mod schedule;

pub use error::ScheduleError;
pub use schedule::{Schedule, StateDirective};
