//! Error types returned to the embedding host.
//!
//! Frontend-facing failures never surface here; they are answered as JSON
//! error responses. These variants cover misuse of the host API.

use thiserror::Error;

use crate::target::{TargetId, TargetKind};

/// Result type alias for host-facing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported to the host integration.
#[derive(Debug, Error)]
pub enum Error {
	/// A frontend is already connected and the page rejects a second one.
	#[error("Page {page} already has an active session")]
	SessionActive { page: TargetId },

	/// The instance already owns a live runtime; unregister it first.
	#[error("Instance {instance} already has runtime {runtime} registered")]
	RuntimeAlreadyRegistered {
		instance: TargetId,
		runtime: TargetId,
	},

	/// The target is not (or no longer) registered with the given parent.
	#[error("{kind} {id} is not registered")]
	NotRegistered { kind: TargetKind, id: TargetId },
}
