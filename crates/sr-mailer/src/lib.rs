//! Notification dispatcher that turns a batch of product events into one
//! summary email over SMTP.

pub mod email;
pub mod summary;

pub use email::{EmailNotifier, MailError, SmtpConfig};
