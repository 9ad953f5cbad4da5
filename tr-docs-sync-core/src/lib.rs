#![doc = "tr-docs-sync-core: core pipeline for tr-docs-sync."]

//! This crate holds the stages of a run and the traits they talk through:
//! clearing the local download folder, driving the external `pytr` tool for
//! the document download and the CSV export, and mirroring the local tree
//! into remote storage.
//!
//! The real Nextcloud client and the console prompt live in the CLI crate;
//! everything here can be exercised with the `mockall` doubles exported under
//! the `test-export-mocks` feature.

pub mod config;
pub mod contract;
pub mod download;
pub mod error;
pub mod export;
pub mod folders;
pub mod reconcile;
pub mod stages;
pub mod synchronise;
pub mod tool;
pub mod tree;
pub mod uploader;
