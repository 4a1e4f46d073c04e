// Shared harness for inspector integration tests.
//
// A `Fixture` owns a page whose host side registers one instance with one
// runtime. The page reload callback tears that instance down and registers a
// fresh one, the way an app host reacts to a JS bundle reload.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once, OnceLock, Weak};

use jsinspector::protocol::{ErrorCode, PageReloadRequest, ProtocolError, RemoteObject, Request};
use jsinspector::{
	AgentContext, ConnectOptions, FallbackRuntimeTargetDelegate, FrontendChannel, InstanceTarget,
	InstanceTargetDelegate, LocalConnection, PageConnection, PageOptions, PageTarget,
	PageTargetDelegate, QueuedImmediateExecutor, RemoteConnection, RuntimeAgentDelegate,
	RuntimeTarget, RuntimeTargetDelegate, SessionState, VoidExecutor,
};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{Value, json};

/// Installs a test-writer subscriber once per test binary.
pub fn init_tracing() {
	static INIT: Once = Once::new();
	INIT.call_once(|| {
		let _ = tracing_subscriber::fmt()
			.with_test_writer()
			.with_max_level(tracing::Level::DEBUG)
			.try_init();
	});
}

// ---------------------------------------------------------------------------
// Frontend side
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Recorded {
	messages: Mutex<Vec<String>>,
	disconnects: AtomicUsize,
}

/// Records everything the inspector sends to the frontend.
#[derive(Clone, Default)]
pub struct MockFrontend {
	recorded: Arc<Recorded>,
}

struct RecordingRemote(Arc<Recorded>);

impl RemoteConnection for RecordingRemote {
	fn on_message(&self, message: String) {
		self.0.messages.lock().push(message);
	}

	fn on_disconnect(&self) {
		self.0.disconnects.fetch_add(1, Ordering::SeqCst);
	}
}

impl MockFrontend {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn remote(&self) -> Box<dyn RemoteConnection> {
		Box::new(RecordingRemote(Arc::clone(&self.recorded)))
	}

	/// Raw messages received so far.
	pub fn messages(&self) -> Vec<String> {
		self.recorded.messages.lock().clone()
	}

	/// Removes and returns all messages received so far, parsed.
	pub fn take(&self) -> Vec<Value> {
		self.recorded
			.messages
			.lock()
			.drain(..)
			.map(|m| serde_json::from_str(&m).expect("inspector sent invalid JSON"))
			.collect()
	}

	/// Removes and returns the raw messages received so far.
	pub fn take_raw(&self) -> Vec<String> {
		self.recorded.messages.lock().drain(..).collect()
	}

	pub fn disconnects(&self) -> usize {
		self.recorded.disconnects.load(Ordering::SeqCst)
	}
}

/// Method names of the notifications in `messages`, in order.
pub fn notification_methods(messages: &[Value]) -> Vec<String> {
	messages
		.iter()
		.filter_map(|m| m.get("method").and_then(Value::as_str))
		.map(str::to_string)
		.collect()
}

/// Ids carried by `Runtime.executionContextCreated` notifications.
pub fn created_context_ids(messages: &[Value]) -> Vec<i64> {
	messages
		.iter()
		.filter(|m| m["method"] == "Runtime.executionContextCreated")
		.filter_map(|m| m["params"]["context"]["id"].as_i64())
		.collect()
}

// ---------------------------------------------------------------------------
// Engine side
// ---------------------------------------------------------------------------

type Hook = Box<dyn Fn() + Send>;

/// Counters and hooks shared by every engine a host creates.
#[derive(Default)]
pub struct EngineShared {
	reapplied_breakpoints: AtomicUsize,
	dropped_agents: AtomicUsize,
	/// Invoked by `Test.hook` while the session is routing.
	hook: Mutex<Option<Hook>>,
}

/// A runtime delegate with just enough of an engine to exercise routing.
///
/// `Runtime.evaluate` parses its expression as a JSON literal.
pub struct GenericEngine {
	name: String,
	shared: Arc<EngineShared>,
	evaluations: AtomicUsize,
}

impl GenericEngine {
	pub fn new(name: &str, shared: Arc<EngineShared>) -> Self {
		Self {
			name: name.to_string(),
			shared,
			evaluations: AtomicUsize::new(0),
		}
	}

	pub fn evaluations(&self) -> usize {
		self.evaluations.load(Ordering::SeqCst)
	}
}

impl RuntimeTargetDelegate for GenericEngine {
	fn create_agent_delegate(
		&self,
		context: AgentContext,
		state: &SessionState,
	) -> Box<dyn RuntimeAgentDelegate> {
		self.shared
			.reapplied_breakpoints
			.fetch_add(state.breakpoints().count(), Ordering::SeqCst);
		Box::new(GenericAgent {
			context,
			shared: Arc::clone(&self.shared),
		})
	}

	fn execution_context_name(&self) -> String {
		self.name.clone()
	}
}

struct GenericAgent {
	context: AgentContext,
	shared: Arc<EngineShared>,
}

impl Drop for GenericAgent {
	fn drop(&mut self) {
		self.shared.dropped_agents.fetch_add(1, Ordering::SeqCst);
	}
}

#[derive(Deserialize)]
struct EvaluateParams {
	expression: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetBreakpointParams {
	url: String,
	line_number: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoveBreakpointParams {
	breakpoint_id: String,
}

impl GenericAgent {
	fn reply(&self, request: &Request, result: Value) {
		if let Some(id) = request.id {
			self.context.frontend.send_result(id, result);
		}
	}
}

impl RuntimeAgentDelegate for GenericAgent {
	fn handle_request(
		&mut self,
		request: &Request,
		state: &mut SessionState,
	) -> Result<bool, ProtocolError> {
		match request.method.as_str() {
			"Runtime.enable" if request.params.get("reject").is_some() => Err(ProtocolError::new(
				ErrorCode::Other(-32001),
				"engine refused",
			)),
			"Runtime.evaluate" => {
				let params: EvaluateParams = request.params_as()?;
				let id = request.id;
				let frontend = self.context.frontend.clone();
				self.context.executor.execute(move |runtime: &RuntimeTarget| {
					if let Some(engine) = runtime.delegate_as::<GenericEngine>() {
						engine.evaluations.fetch_add(1, Ordering::SeqCst);
					}
					let result = serde_json::from_str::<Value>(&params.expression)
						.map(|value| RemoteObject::from_value(&value))
						.unwrap_or_else(|_| RemoteObject::undefined());
					if let Some(id) = id {
						frontend.send_result(id, json!({ "result": result }));
					}
				});
				Ok(true)
			}
			"Debugger.enable" => {
				self.reply(request, json!({ "debuggerId": "generic" }));
				Ok(true)
			}
			"Debugger.disable" => {
				self.reply(request, json!({}));
				Ok(true)
			}
			"Debugger.setBreakpointByUrl" => {
				let params: SetBreakpointParams = request.params_as()?;
				let breakpoint_id = format!("{}:{}", params.line_number, params.url);
				state.add_breakpoint(breakpoint_id.clone(), request.params.clone());
				self.reply(
					request,
					json!({ "breakpointId": breakpoint_id, "locations": [] }),
				);
				Ok(true)
			}
			"Debugger.removeBreakpoint" => {
				let params: RemoveBreakpointParams = request.params_as()?;
				state.remove_breakpoint(&params.breakpoint_id);
				self.reply(request, json!({}));
				Ok(true)
			}
			"Test.state" => {
				let enabled: Vec<&str> = state.enabled_domains().collect();
				let breakpoints: Vec<&str> = state.breakpoints().map(|(id, _)| id).collect();
				self.reply(
					request,
					json!({
						"enabledDomains": enabled,
						"breakpoints": breakpoints,
						"updated": state.domain_option("Test", "updated"),
						"lastContextId": state.last_execution_context_id(),
					}),
				);
				Ok(true)
			}
			"Test.updateLater" => {
				self.context.session.update(|state| {
					state.set_domain_option("Test", "updated", json!(true));
				});
				self.reply(request, json!({}));
				Ok(true)
			}
			"Test.hook" => {
				if let Some(hook) = self.shared.hook.lock().as_ref() {
					hook();
				}
				self.reply(request, json!({}));
				Ok(true)
			}
			"Test.panic" => panic!("engine exploded"),
			"Test.fail" => Err(ProtocolError::new(ErrorCode::Other(-32001), "engine refused")),
			_ => Ok(false),
		}
	}
}

/// Instance delegate answering `Instance.describe`.
pub struct TestInstance {
	generation: usize,
}

impl InstanceTargetDelegate for TestInstance {
	fn handle_request(
		&self,
		request: &Request,
		frontend: &FrontendChannel,
	) -> Result<bool, ProtocolError> {
		if request.method != "Instance.describe" {
			return Ok(false);
		}
		if let Some(id) = request.id {
			frontend.send_result(id, json!({ "generation": self.generation }));
		}
		Ok(true)
	}
}

// ---------------------------------------------------------------------------
// Host side
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
	Generic,
	Fallback,
}

/// The embedding application: registers instances and runtimes on a page.
pub struct Host {
	page: OnceLock<Weak<PageTarget>>,
	engine: Engine,
	runtime_executor: VoidExecutor,
	instance: Mutex<Option<Arc<InstanceTarget>>>,
	runtime: Mutex<Option<Arc<RuntimeTarget>>>,
	generation: AtomicUsize,
	reloads: AtomicUsize,
	shared: Arc<EngineShared>,
	last_reload: Mutex<Option<PageReloadRequest>>,
}

impl Host {
	fn page(&self) -> Arc<PageTarget> {
		self.page
			.get()
			.and_then(Weak::upgrade)
			.expect("page dropped before host")
	}

	/// Registers a fresh instance and runtime.
	pub fn load(&self) {
		let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
		let instance = self.page().register_instance(Box::new(TestInstance { generation }));
		let delegate: Box<dyn RuntimeTargetDelegate> = match self.engine {
			Engine::Generic => Box::new(GenericEngine::new("main", Arc::clone(&self.shared))),
			Engine::Fallback => Box::new(FallbackRuntimeTargetDelegate::new("TestEngine")),
		};
		let runtime = instance
			.register_runtime(delegate, Arc::clone(&self.runtime_executor))
			.expect("fresh instance accepts a runtime");
		*self.runtime.lock() = Some(runtime);
		*self.instance.lock() = Some(instance);
	}

	/// Unregisters the current instance (and with it, its runtime).
	pub fn unload(&self) {
		let instance = self.instance.lock().take();
		self.runtime.lock().take();
		if let Some(instance) = instance {
			self.page()
				.unregister_instance(&instance)
				.expect("instance was registered");
		}
	}

	/// Unregisters only the runtime, leaving the instance runtime-less.
	pub fn unload_runtime(&self) {
		let runtime = self.runtime.lock().take();
		let instance = self.instance.lock().clone();
		if let (Some(instance), Some(runtime)) = (instance, runtime) {
			instance
				.unregister_runtime(&runtime)
				.expect("runtime was registered");
		}
	}

	/// Registers a runtime on the current instance.
	pub fn load_runtime(&self) -> jsinspector::Result<Arc<RuntimeTarget>> {
		let instance = self
			.instance
			.lock()
			.clone()
			.expect("no instance registered");
		let runtime = instance.register_runtime(
			Box::new(GenericEngine::new("main", Arc::clone(&self.shared))),
			Arc::clone(&self.runtime_executor),
		)?;
		*self.runtime.lock() = Some(Arc::clone(&runtime));
		Ok(runtime)
	}

	pub fn reload(&self) {
		self.unload();
		self.load();
	}

	pub fn instance(&self) -> Option<Arc<InstanceTarget>> {
		self.instance.lock().clone()
	}

	pub fn runtime(&self) -> Option<Arc<RuntimeTarget>> {
		self.runtime.lock().clone()
	}

	pub fn reloads(&self) -> usize {
		self.reloads.load(Ordering::SeqCst)
	}

	pub fn reapplied_breakpoints(&self) -> usize {
		self.shared.reapplied_breakpoints.load(Ordering::SeqCst)
	}

	/// Number of generic runtime agents released so far.
	pub fn dropped_agents(&self) -> usize {
		self.shared.dropped_agents.load(Ordering::SeqCst)
	}

	/// Installs the callback run by `Test.hook`.
	pub fn set_hook(&self, hook: impl Fn() + Send + 'static) {
		*self.shared.hook.lock() = Some(Box::new(hook));
	}

	pub fn last_reload(&self) -> Option<PageReloadRequest> {
		self.last_reload.lock().clone()
	}
}

struct HostPageDelegate(Arc<Host>);

impl PageTargetDelegate for HostPageDelegate {
	fn on_reload(&self, request: &PageReloadRequest) {
		self.0.reloads.fetch_add(1, Ordering::SeqCst);
		*self.0.last_reload.lock() = Some(request.clone());
		self.0.reload();
	}
}

/// A page with one loaded instance, on a single-threaded queued executor.
pub struct Fixture {
	pub page: Arc<PageTarget>,
	pub host: Arc<Host>,
}

impl Fixture {
	pub fn new() -> Self {
		Self::build(PageOptions::default(), Engine::Generic, QueuedImmediateExecutor::shared())
	}

	pub fn with_options(options: PageOptions) -> Self {
		Self::build(options, Engine::Generic, QueuedImmediateExecutor::shared())
	}

	pub fn with_engine(engine: Engine) -> Self {
		Self::build(PageOptions::default(), engine, QueuedImmediateExecutor::shared())
	}

	pub fn build(options: PageOptions, engine: Engine, executor: VoidExecutor) -> Self {
		init_tracing();
		let host = Arc::new(Host {
			page: OnceLock::new(),
			engine,
			runtime_executor: Arc::clone(&executor),
			instance: Mutex::new(None),
			runtime: Mutex::new(None),
			generation: AtomicUsize::new(0),
			reloads: AtomicUsize::new(0),
			shared: Arc::new(EngineShared::default()),
			last_reload: Mutex::new(None),
		});
		let page = PageTarget::create_with_options(
			Box::new(HostPageDelegate(Arc::clone(&host))),
			executor,
			options,
		);
		let _ = host.page.set(Arc::downgrade(&page));
		host.load();
		Self { page, host }
	}

	/// Connects a new recording frontend.
	pub fn connect(&self) -> (MockFrontend, PageConnection) {
		let frontend = MockFrontend::new();
		let connection = self
			.page
			.connect(frontend.remote(), ConnectOptions::default().integration_name("tests"))
			.expect("connect failed");
		(frontend, connection)
	}
}

/// Sends a JSON value as one protocol message.
pub fn send(connection: &PageConnection, message: Value) {
	connection.send_message(message.to_string());
}
