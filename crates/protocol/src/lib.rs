//! Wire types for the inspector protocol.
//!
//! This crate contains the serde-serializable types exchanged with a debugging
//! frontend. The protocol is CDP-shaped: numbered requests addressed to
//! `Domain.method` names, one response per numbered request, and unprompted
//! notifications.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! - **Pure data**: No behavior beyond parsing and (de)serialization
//! - **1:1 with the wire**: Field names match what frontends send and expect
//! - **Stable**: Changes only when the wire protocol changes
//!
//! Routing, sessions and targets live in the `jsinspector` crate.

pub mod error;
pub mod message;
pub mod types;

pub use error::{ErrorCode, ErrorObject, ProtocolError};
pub use message::{Notification, ParseFailure, Request, RequestId, Response};
pub use types::*;
