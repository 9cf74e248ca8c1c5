//! Start/stop across the whole tree.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use command_tree::{App, Lifecycle, LifecycleError, Module, ModuleExt, Service};

use crate::support;

/// Counts how often it was started and stopped.
#[derive(Default)]
struct Tracker {
    lifecycle: Lifecycle,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

#[async_trait]
impl Module for Tracker {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    async fn on_start(&self) -> anyhow::Result<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn on_stop(&self) -> anyhow::Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Fails its first start, then starts normally.
#[derive(Default)]
struct Broken {
    lifecycle: Lifecycle,
    attempts: AtomicUsize,
}

#[async_trait]
impl Module for Broken {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    async fn on_start(&self) -> anyhow::Result<()> {
        if self.attempts.fetch_add(1, Ordering::SeqCst) == 0 {
            anyhow::bail!("port already in use")
        }
        Ok(())
    }
}

#[tokio::test]
async fn start_reaches_nested_modules() {
    let tracker = Arc::new(Tracker::default());
    let nested = Service::new().use_arc(tracker.clone());
    let app = App::new(support::tree().use_service("/nested", nested)).unwrap();

    app.start().await.unwrap();
    assert!(app.is_active());
    assert!(tracker.is_active());
    assert_eq!(tracker.starts.load(Ordering::SeqCst), 1);

    app.stop().await.unwrap();
    assert!(!app.is_active());
    assert!(!tracker.is_active());
    assert_eq!(tracker.stops.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn starting_twice_is_already_started() {
    let app = support::server_app();
    app.start().await.unwrap();

    let err = app.start().await.unwrap_err();
    assert!(matches!(err, LifecycleError::AlreadyStarted(_)));
    assert!(app.is_active());
}

#[tokio::test]
async fn stopping_first_is_not_started() {
    let app = support::server_app();
    let err = app.stop().await.unwrap_err();
    assert!(matches!(err, LifecycleError::NotStarted(_)));
}

#[tokio::test]
async fn a_module_can_restart() {
    let tracker = Tracker::default();
    tracker.start().await.unwrap();
    tracker.stop().await.unwrap();
    tracker.start().await.unwrap();
    assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
    assert_eq!(tracker.stops.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failing_child_fails_the_start() {
    let tracker = Arc::new(Tracker::default());
    let app = App::new(
        support::tree()
            .use_arc(tracker.clone())
            .use_module(Broken::default()),
    )
    .unwrap();

    let err = app.start().await.unwrap_err();
    match err {
        LifecycleError::Failed { module, source } => {
            assert_eq!(module, "Broken");
            assert!(source.to_string().contains("port already in use"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!app.is_active());

    // Siblings that did start are stopped again
    assert!(!tracker.is_active());
    assert_eq!(tracker.stops.load(Ordering::SeqCst), 1);
    let todos = app.root().get_service("/todos").unwrap();
    assert!(!todos.is_active());
    assert!(todos.children().iter().all(|c| !c.is_active()));

    assert!(matches!(app.stop().await, Err(LifecycleError::NotStarted(_))));
    app.start().await.unwrap();
    assert!(app.is_active());
    assert!(tracker.is_active());
    assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
}
