//! Protocol Tests
//!
//! Payload codec and match evaluator.

mod payload_tests;
