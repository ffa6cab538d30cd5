//! Types shared between the explorer server and its clients.
//!
//! The wire protocol is plain text, one message per line, so anything that
//! speaks TCP can be an explorer client.

pub mod config;
pub mod protocol;
