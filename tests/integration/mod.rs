//! Integration tests for the relay
//!
//! These tests drive the full router (or the relay directly, where chunk
//! boundaries matter) against fake and mocked providers.

pub mod streaming;
