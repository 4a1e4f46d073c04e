//! Request, response and notification shapes.
//!
//! Incoming text is turned into a [`Request`] by [`Request::parse`], which
//! validates the envelope once so routing code can rely on a `Domain.method`
//! shaped method name. Outgoing traffic is either a [`Response`] (echoing a
//! request id) or a [`Notification`] (no id, never answered).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::{ErrorObject, ProtocolError};

/// Numeric request identifier chosen by the frontend.
pub type RequestId = i64;

/// A parsed request or client notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
	/// Present for requests, absent for notifications.
	pub id: Option<RequestId>,
	/// Fully-qualified method name, e.g. `Runtime.evaluate`.
	pub method: String,
	/// Method parameters (`Value::Null` when omitted).
	pub params: Value,
}

/// Failure to turn incoming text into a [`Request`].
///
/// Carries the request id when it could be recovered so the error response
/// can still be correlated.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{error}")]
pub struct ParseFailure {
	pub id: Option<RequestId>,
	pub error: ProtocolError,
	/// The message was a JSON object without an id, so it must not be answered.
	pub notification: bool,
}

impl ParseFailure {
	fn new(id: Option<RequestId>, error: ProtocolError) -> Self {
		Self {
			id,
			error,
			notification: false,
		}
	}

	/// Failure of a message whose id (or lack of one) is already known.
	fn with_id(id: Option<RequestId>, error: ProtocolError) -> Self {
		Self {
			id,
			error,
			notification: id.is_none(),
		}
	}
}

impl Request {
	/// Creates a request directly, bypassing text parsing.
	pub fn new(id: Option<RequestId>, method: impl Into<String>, params: Value) -> Self {
		Self {
			id,
			method: method.into(),
			params,
		}
	}

	/// Parses a UTF-8 JSON message received from the frontend.
	pub fn parse(text: &str) -> Result<Self, ParseFailure> {
		let value: Value = serde_json::from_str(text)
			.map_err(|e| ParseFailure::new(None, ProtocolError::parse_error(e.to_string())))?;

		let Value::Object(mut object) = value else {
			return Err(ParseFailure::new(
				None,
				ProtocolError::invalid_request("Message must be a JSON object"),
			));
		};

		let id = match object.remove("id") {
			None | Some(Value::Null) => None,
			Some(Value::Number(n)) => match n.as_i64() {
				Some(id) => Some(id),
				None => {
					return Err(ParseFailure::new(
						None,
						ProtocolError::invalid_request("Request id must be an integer"),
					));
				}
			},
			Some(_) => {
				return Err(ParseFailure::new(
					None,
					ProtocolError::invalid_request("Request id must be an integer"),
				));
			}
		};

		let method = match object.remove("method") {
			Some(Value::String(method)) => method,
			Some(_) => {
				return Err(ParseFailure::with_id(
					id,
					ProtocolError::invalid_request("Request method must be a string"),
				));
			}
			None => {
				return Err(ParseFailure::with_id(
					id,
					ProtocolError::invalid_request("Request is missing a method"),
				));
			}
		};

		if split_method(&method).is_none() {
			return Err(ParseFailure::with_id(
				id,
				ProtocolError::parse_error(format!(
					"Method '{method}' is missing a domain prefix"
				)),
			));
		}

		let params = object.remove("params").unwrap_or(Value::Null);

		Ok(Self { id, method, params })
	}

	/// Returns the domain prefix, e.g. `Runtime` for `Runtime.evaluate`.
	pub fn domain(&self) -> &str {
		split_method(&self.method).map_or("", |(domain, _)| domain)
	}

	/// Returns the method name without its domain prefix.
	pub fn method_name(&self) -> &str {
		split_method(&self.method).map_or(self.method.as_str(), |(_, name)| name)
	}

	/// Returns true if this message expects no response.
	pub fn is_notification(&self) -> bool {
		self.id.is_none()
	}

	/// Deserializes the params, treating omitted params as an empty object.
	pub fn params_as<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
		let params = match &self.params {
			Value::Null => Value::Object(Map::new()),
			other => other.clone(),
		};
		serde_json::from_value(params).map_err(|e| {
			ProtocolError::invalid_params(format!("Invalid params for '{}': {e}", self.method))
		})
	}
}

/// Splits `Domain.method` into its parts; both must be non-empty.
fn split_method(method: &str) -> Option<(&str, &str)> {
	method
		.split_once('.')
		.filter(|(domain, name)| !domain.is_empty() && !name.is_empty())
}

/// Response to a numbered request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
	/// Id of the request being answered; `null` when it could not be recovered.
	pub id: Option<RequestId>,
	/// Success result (mutually exclusive with error).
	#[serde(skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	/// Error result (mutually exclusive with result).
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<ErrorObject>,
}

impl Response {
	pub fn success(id: RequestId, result: Value) -> Self {
		Self {
			id: Some(id),
			result: Some(result),
			error: None,
		}
	}

	pub fn failure(id: Option<RequestId>, error: impl Into<ErrorObject>) -> Self {
		Self {
			id,
			result: None,
			error: Some(error.into()),
		}
	}
}

/// Unprompted message emitted by any target level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
	pub method: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub params: Option<Value>,
}

impl Notification {
	pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
		Self {
			method: method.into(),
			params,
		}
	}
}
