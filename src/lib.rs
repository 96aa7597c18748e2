pub mod config;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod source;
