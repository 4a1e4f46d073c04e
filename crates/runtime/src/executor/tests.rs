use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use super::*;

fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) + Clone + Send + Sync) {
	let log = Arc::new(Mutex::new(Vec::new()));
	let sink = Arc::clone(&log);
	(log, move |entry| sink.lock().push(entry))
}

#[test]
fn test_immediate_executor_runs_inline() {
	let (log, record) = recorder();

	QueuedImmediateExecutor.execute(Box::new(move || record("ran")));

	assert_eq!(*log.lock(), vec!["ran"]);
}

#[test]
fn test_immediate_executor_queues_nested_tasks() {
	let (log, record) = recorder();
	let executor = QueuedImmediateExecutor::shared();

	let inner_executor = Arc::clone(&executor);
	executor.execute(Box::new(move || {
		record("outer start");
		let first = record.clone();
		inner_executor.execute(Box::new(move || first("nested 1")));
		let second = record.clone();
		inner_executor.execute(Box::new(move || second("nested 2")));
		record("outer end");
	}));

	assert_eq!(
		*log.lock(),
		vec!["outer start", "outer end", "nested 1", "nested 2"]
	);
}

#[test]
fn test_immediate_executor_recovers_after_panic() {
	let result = std::panic::catch_unwind(|| {
		QueuedImmediateExecutor.execute(Box::new(|| panic!("boom")));
	});
	assert!(result.is_err());

	let (log, record) = recorder();
	QueuedImmediateExecutor.execute(Box::new(move || record("after")));
	assert_eq!(*log.lock(), vec!["after"]);
}

#[test]
fn test_closure_executor() {
	let count = Arc::new(AtomicUsize::new(0));
	let executor: VoidExecutor = Arc::new(|task: Task| task());

	let c = Arc::clone(&count);
	executor.execute(Box::new(move || {
		c.fetch_add(1, Ordering::SeqCst);
	}));

	assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_manual_executor_defers_until_pumped() {
	let (log, record) = recorder();
	let executor = ManualExecutor::new();

	let nested = Arc::clone(&executor);
	let inner_record = record.clone();
	executor.execute(Box::new(move || {
		record("first");
		nested.execute(Box::new(move || inner_record("second")));
	}));

	assert!(log.lock().is_empty());
	assert_eq!(executor.pending(), 1);

	assert_eq!(executor.run_until_idle(), 2);
	assert_eq!(*log.lock(), vec!["first", "second"]);
	assert_eq!(executor.pending(), 0);
}

#[tokio::test]
async fn test_serial_executor_preserves_order() {
	let executor = SerialExecutor::spawn();
	let seen = Arc::new(Mutex::new(Vec::new()));
	let (done_tx, done_rx) = tokio::sync::oneshot::channel();

	for i in 0..50 {
		let seen = Arc::clone(&seen);
		executor.execute(Box::new(move || seen.lock().push(i)));
	}
	executor.execute(Box::new(move || {
		let _ = done_tx.send(());
	}));

	tokio::time::timeout(Duration::from_secs(5), done_rx)
		.await
		.expect("executor did not drain")
		.unwrap();

	assert_eq!(*seen.lock(), (0..50).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_serial_executor_survives_panicking_task() {
	let executor = SerialExecutor::spawn();
	let (done_tx, done_rx) = tokio::sync::oneshot::channel();

	executor.execute(Box::new(|| panic!("task failure")));
	executor.execute(Box::new(move || {
		let _ = done_tx.send(());
	}));

	tokio::time::timeout(Duration::from_secs(5), done_rx)
		.await
		.expect("executor stopped after panic")
		.unwrap();
}
