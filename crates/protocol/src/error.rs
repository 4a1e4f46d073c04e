//! Error taxonomy surfaced to the frontend.
//!
//! Every request that cannot be serviced is answered with an [`ErrorObject`]
//! carrying one of the well-known [`ErrorCode`]s. The JSON-RPC codes are used
//! where they exist; `TargetUnavailable` lives in the implementation-defined
//! server error range.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Numeric error codes understood by frontends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", from = "i32")]
pub enum ErrorCode {
	/// The message was not valid JSON, or its method had no domain prefix.
	ParseError,
	/// The message was JSON but not a well-formed request.
	InvalidRequest,
	/// No target level recognized the method.
	MethodNotFound,
	/// The method exists but its params could not be understood.
	InvalidParams,
	/// A handler failed while servicing the request.
	InternalError,
	/// The addressed sub-target is not currently registered (e.g. mid-reload).
	TargetUnavailable,
	/// Any other code, typically produced by an engine delegate.
	Other(i32),
}

impl ErrorCode {
	/// Returns the numeric wire value.
	pub const fn code(self) -> i32 {
		match self {
			ErrorCode::ParseError => -32700,
			ErrorCode::InvalidRequest => -32600,
			ErrorCode::MethodNotFound => -32601,
			ErrorCode::InvalidParams => -32602,
			ErrorCode::InternalError => -32603,
			ErrorCode::TargetUnavailable => -32000,
			ErrorCode::Other(code) => code,
		}
	}
}

impl From<ErrorCode> for i32 {
	fn from(code: ErrorCode) -> Self {
		code.code()
	}
}

impl From<i32> for ErrorCode {
	fn from(code: i32) -> Self {
		match code {
			-32700 => ErrorCode::ParseError,
			-32600 => ErrorCode::InvalidRequest,
			-32601 => ErrorCode::MethodNotFound,
			-32602 => ErrorCode::InvalidParams,
			-32603 => ErrorCode::InternalError,
			-32000 => ErrorCode::TargetUnavailable,
			other => ErrorCode::Other(other),
		}
	}
}

/// Error payload as it appears inside an error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
	pub code: ErrorCode,
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
}

/// A request-scoped failure that is reported to the frontend, never to the host.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} (code {})", code.code())]
pub struct ProtocolError {
	pub code: ErrorCode,
	pub message: String,
	pub data: Option<Value>,
}

impl ProtocolError {
	pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
		Self {
			code,
			message: message.into(),
			data: None,
		}
	}

	pub fn parse_error(message: impl Into<String>) -> Self {
		Self::new(ErrorCode::ParseError, message)
	}

	pub fn invalid_request(message: impl Into<String>) -> Self {
		Self::new(ErrorCode::InvalidRequest, message)
	}

	pub fn method_not_found(method: &str) -> Self {
		Self::new(
			ErrorCode::MethodNotFound,
			format!("'{method}' wasn't found"),
		)
	}

	pub fn invalid_params(message: impl Into<String>) -> Self {
		Self::new(ErrorCode::InvalidParams, message)
	}

	pub fn internal(message: impl Into<String>) -> Self {
		Self::new(ErrorCode::InternalError, message)
	}

	pub fn target_unavailable(method: &str) -> Self {
		Self::new(
			ErrorCode::TargetUnavailable,
			format!("Cannot handle '{method}': no JavaScript runtime is currently registered"),
		)
	}

}

impl From<&ProtocolError> for ErrorObject {
	fn from(error: &ProtocolError) -> Self {
		Self {
			code: error.code,
			message: error.message.clone(),
			data: error.data.clone(),
		}
	}
}

impl From<ProtocolError> for ErrorObject {
	fn from(error: ProtocolError) -> Self {
		Self {
			code: error.code,
			message: error.message,
			data: error.data,
		}
	}
}
