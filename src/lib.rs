//! Core library for the vm-sizer command line application.
//!
//! The library turns virtual machine inventory exports into sizer requests.
//! Spreadsheet adapters live under [`io`], the canonical data representations
//! inside [`model`], export normalisation in [`mapping`] and [`units`], the
//! workload partitioning in [`grouping`], request assembly in [`payload`],
//! and the end-to-end orchestration in [`pipeline`].

pub mod error;
pub mod grouping;
pub mod io;
pub mod logging;
pub mod mapping;
pub mod model;
pub mod payload;
pub mod pipeline;
pub mod summary;
pub mod units;

pub use error::{Result, ToolError};
