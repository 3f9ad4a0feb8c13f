//! Periodic retention agent for a user's posts on a social API.
//!
//! The agent keeps an in-memory view of the account's posts, refreshed from
//! the remote API every hour, and deletes every post older than a configured
//! age once a minute. A tiny HTTP listener answers health checks, and a
//! keep-alive ping stops idle-suspending hosts from putting the process to
//! sleep.

pub mod clock;
pub mod config;
pub mod keepalive;
pub mod observability;
pub mod remote;
pub mod resources;
pub mod scheduler;
pub mod server;

#[cfg(test)]
mod tests;
