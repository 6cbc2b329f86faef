//! Test modules for the tern-http crate

pub mod server_tests;
