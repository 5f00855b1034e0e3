pub mod aggregate;
pub mod cli;
pub mod error;
pub mod github;
pub mod model;
pub mod report;
