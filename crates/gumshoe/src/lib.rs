#![forbid(unsafe_code)]
//! Forensic artifact collection for jailbroken Apple TV devices.
//!
//! The crate has two halves:
//! - A pure normalization pipeline ([`collect`], [`collect_installed_apps`],
//!   [`collect_device_info`]) that repairs the quasi-JSON emitted by `plutil -showjson`,
//!   parses it, and extracts fixed-schema rows per artifact type. It never performs I/O.
//! - A thin transport ([`DeviceClient`]) that runs the fixed remote commands over the system
//!   `ssh` client and hands the captured text to the pipeline.

mod artifact;
mod builder;
mod client;
mod commands;
mod error;
pub mod extract;
pub mod paths;
mod pipeline;
mod process;
pub mod repair;
pub mod timestamp;

pub use artifact::{
    AppSource, ArtifactRecord, ArtifactReport, ArtifactTable, ArtifactType, Diagnostic,
    UnknownArtifactType, NOT_AVAILABLE,
};
pub use builder::{DeviceClientBuilder, DEFAULT_PORT, DEFAULT_USER};
pub use client::DeviceClient;
pub use commands::remote::{shell_quote, RemoteCommand};
pub use error::{ExtractionError, GumshoeError};
pub use extract::device_info::DeviceInfo;
pub use pipeline::{
    collect, collect_device_info, collect_installed_apps, parse_document, DeviceDocuments,
    DeviceReport, FetchedDocument,
};
pub use process::CommandOutput;
