//! Per-session debugger state that outlives runtime reloads.
//!
//! A [`SessionState`] belongs to the session, not to any target, so domain
//! toggles and breakpoints survive when the host swaps the JavaScript
//! runtime underneath. Runtime agents receive it by `&mut` while handling a
//! request; code running elsewhere schedules changes through a
//! [`SessionStateUpdater`].

use std::collections::BTreeMap;

use jsinspector_runtime::ScopedExecutor;
use serde_json::{Map, Value};

use crate::session::Session;

/// Enablement and options of one protocol domain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DomainState {
	pub enabled: bool,
	/// Params of the last `enable` call, when it carried any.
	pub options: Map<String, Value>,
}

/// Mutable record of everything a session has asked for.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
	domains: BTreeMap<String, DomainState>,
	breakpoints: BTreeMap<String, Value>,
	last_execution_context_id: i64,
}

impl SessionState {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_domain_enabled(&self, domain: &str) -> bool {
		self.domains.get(domain).is_some_and(|d| d.enabled)
	}

	pub fn set_domain_enabled(&mut self, domain: &str, enabled: bool) {
		self.domains.entry(domain.to_string()).or_default().enabled = enabled;
	}

	pub fn domain(&self, domain: &str) -> Option<&DomainState> {
		self.domains.get(domain)
	}

	pub fn domain_option(&self, domain: &str, key: &str) -> Option<&Value> {
		self.domains.get(domain).and_then(|d| d.options.get(key))
	}

	pub fn set_domain_option(&mut self, domain: &str, key: impl Into<String>, value: Value) {
		self.domains
			.entry(domain.to_string())
			.or_default()
			.options
			.insert(key.into(), value);
	}

	/// Replaces all options of `domain`.
	pub fn set_domain_options(&mut self, domain: &str, options: Map<String, Value>) {
		self.domains.entry(domain.to_string()).or_default().options = options;
	}

	/// Names of enabled domains, in sorted order.
	pub fn enabled_domains(&self) -> impl Iterator<Item = &str> {
		self.domains
			.iter()
			.filter(|(_, d)| d.enabled)
			.map(|(name, _)| name.as_str())
	}

	/// Allocates the next execution context id. Ids start at 1 and are never
	/// reused within a session.
	pub fn next_execution_context_id(&mut self) -> i64 {
		self.last_execution_context_id += 1;
		self.last_execution_context_id
	}

	pub fn last_execution_context_id(&self) -> i64 {
		self.last_execution_context_id
	}

	/// Records a breakpoint so a future runtime can re-apply it.
	pub fn add_breakpoint(&mut self, id: impl Into<String>, params: Value) {
		self.breakpoints.insert(id.into(), params);
	}

	pub fn remove_breakpoint(&mut self, id: &str) -> Option<Value> {
		self.breakpoints.remove(id)
	}

	pub fn breakpoints(&self) -> impl Iterator<Item = (&str, &Value)> {
		self.breakpoints.iter().map(|(id, params)| (id.as_str(), params))
	}
}

/// Schedules [`SessionState`] mutations onto the page executor.
///
/// Mutations posted after the session has ended are dropped.
#[derive(Clone)]
pub struct SessionStateUpdater {
	executor: ScopedExecutor<Session>,
}

impl SessionStateUpdater {
	pub(crate) fn new(executor: ScopedExecutor<Session>) -> Self {
		Self { executor }
	}

	pub fn update<F>(&self, f: F)
	where
		F: FnOnce(&mut SessionState) + Send + 'static,
	{
		self.executor.execute(move |session| session.with_state_mut(f));
	}
}
