pub mod config;
pub mod data;
pub mod diagnostics;
pub mod error;
pub mod math;
pub mod pipeline;
pub mod prelude;
pub mod report;
