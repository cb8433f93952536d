//! Model-based test runner for REST APIs.
//!
//! A suite is an ordered list of abstract action labels paired with
//! expected-outcome labels. Each action resolves to a request template,
//! responses are checked by a per-outcome oracle, and values seen in
//! responses (created ids, search results) feed later requests.

pub mod binder;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod oracle;
pub mod report;
pub mod runner;
pub mod suite;
