//! Domain payloads the inspector core produces or consumes itself.
//!
//! Engine delegates are free to answer with arbitrary JSON; these types only
//! cover what the core emits (execution contexts, fallback log entries) and
//! the helpers engines commonly need (remote objects).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Method and notification names used by the core.
pub mod methods {
	pub const PAGE_ENABLE: &str = "Page.enable";
	pub const PAGE_DISABLE: &str = "Page.disable";
	pub const PAGE_RELOAD: &str = "Page.reload";
	pub const RUNTIME_ENABLE: &str = "Runtime.enable";
	pub const RUNTIME_DISABLE: &str = "Runtime.disable";
	pub const LOG_ENABLE: &str = "Log.enable";
	pub const EXECUTION_CONTEXT_CREATED: &str = "Runtime.executionContextCreated";
	pub const EXECUTION_CONTEXTS_CLEARED: &str = "Runtime.executionContextsCleared";
	pub const LOG_ENTRY_ADDED: &str = "Log.entryAdded";
}

/// Params of `Page.reload`, handed to the host's reload callback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageReloadRequest {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub ignore_cache: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub script_to_evaluate_on_load: Option<String>,
}

/// Frontend-visible description of one JavaScript global scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContextDescription {
	pub id: i64,
	pub origin: String,
	pub name: String,
	pub unique_id: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub aux_data: Option<Value>,
}

/// Params of `Runtime.executionContextCreated`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContextCreated {
	pub context: ExecutionContextDescription,
}

/// Mirror of a JavaScript value as reported by `Runtime.evaluate` and friends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
	#[serde(rename = "type")]
	pub kind: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub subtype: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub value: Option<Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
}

impl RemoteObject {
	/// The `undefined` value.
	pub fn undefined() -> Self {
		Self {
			kind: "undefined".to_string(),
			subtype: None,
			value: None,
			description: None,
		}
	}

	/// Describes a JSON-representable value by its JavaScript type.
	pub fn from_value(value: &Value) -> Self {
		let (kind, subtype) = match value {
			Value::Null => ("object", Some("null")),
			Value::Bool(_) => ("boolean", None),
			Value::Number(_) => ("number", None),
			Value::String(_) => ("string", None),
			Value::Array(_) => ("object", Some("array")),
			Value::Object(_) => ("object", None),
		};
		Self {
			kind: kind.to_string(),
			subtype: subtype.map(str::to_string),
			value: Some(value.clone()),
			description: None,
		}
	}
}

/// One entry of the `Log` domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
	pub source: String,
	pub level: String,
	pub text: String,
	pub timestamp: f64,
}

/// Params of `Log.entryAdded`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntryAdded {
	pub entry: LogEntry,
}
