//! Common test utilities and fixtures for clipqa integration tests
//!
//! This module provides:
//! - `TestWorkspace` for temp corpus/config files and running the binaries
//! - `RecordingSink`, a display sink that keeps everything it receives
//! - Helpers for starting a display server on an ephemeral port

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod fixtures;

pub use fixtures::*;
