//! Consolidated test modules.
//!
//! This module contains end-to-end tests that wire the scheduler to a mocked
//! remote API through the real HTTP client.
