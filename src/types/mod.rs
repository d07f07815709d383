pub(crate) mod calendar;
pub mod error;
pub mod query;
pub mod report;
