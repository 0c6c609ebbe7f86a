//! `flamlog` - Record and browse flammability-test results for materials
//!
//! This library holds the record store, its delimited-file codec, HTML
//! rendering and the axum router that ties them together.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod html;
pub mod logging;
pub mod predict;
pub mod record;
pub mod store;
pub mod web;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use predict::{predict, Prediction};
pub use record::{Record, COLUMNS};
pub use store::{Match, RecordStore};
