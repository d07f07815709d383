pub mod error;
pub mod extractor;
pub mod reader;
pub mod time_axis;
pub mod variables;
