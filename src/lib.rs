//! Posts the day's lunch menu from Noon CPH to Slack.
//!
//! A run resolves which menu pages today needs, finds this week's PDF on the
//! restaurant's listing page, cuts those pages out, optionally renders them to
//! images, uploads the result and posts a message linking the uploads.

pub mod calendar;
pub mod config;
pub mod error;
pub mod images;
pub mod links;
pub mod pdf;
pub mod run;
pub mod slack;

pub use config::Config;
pub use error::MenuError;
pub use run::{RunReport, run, run_with};
