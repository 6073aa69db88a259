#![doc = "submit-cgap-core: core logic for submitting metadata bundles to a CGAP portal."]

//! This crate holds everything the client does apart from talking HTTP, reading
//! the terminal and running the cloud copy tool. Those three concerns sit behind
//! the traits in [`contract`] and are implemented by the `submit-cgap` CLI crate.
//!
//! # Usage
//! Resolve a server with [`server::resolve_server`], build a [`Session`] around
//! real or mock collaborators, then call [`submission::submit_metadata_bundle`]
//! or one of the functions in [`uploads`].

pub mod config;
pub mod contract;
pub mod error;
pub mod fastq;
pub mod keys;
pub mod profile;
pub mod report;
pub mod server;
pub mod session;
pub mod submission;
pub mod uploads;

#[cfg(any(test, feature = "test-export-mocks"))]
pub mod testing;

pub use error::{Result, SubmitError};
pub use session::Session;
