//! Network Tests
//!
//! Client script driver, server session matcher and the TCP server.

mod session_tests;
