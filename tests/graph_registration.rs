use std::sync::Arc;

use futures::FutureExt;

use sluice::errors::SluiceError;
use sluice::graph::{RunContext, TaskAction, TaskGraph};

fn noop() -> TaskAction {
    Arc::new(|_ctx: RunContext| async { Ok(()) }.boxed())
}

#[test]
fn duplicate_registration_is_rejected() {
    let mut graph = TaskGraph::new();
    graph.register("build", vec![], noop()).unwrap();

    let err = graph.register("build", vec![], noop()).unwrap_err();
    assert!(matches!(err, SluiceError::DuplicateTask(name) if name == "build"));
    assert_eq!(graph.len(), 1);
}

#[test]
fn self_dependency_is_rejected() {
    let mut graph = TaskGraph::new();
    let err = graph
        .register("loop", vec!["loop".into()], noop())
        .unwrap_err();

    assert!(matches!(err, SluiceError::CyclicDependency(name) if name == "loop"));
    assert!(!graph.contains("loop"));
}

#[test]
fn cycle_is_rejected_and_graph_left_unchanged() {
    let mut graph = TaskGraph::new();
    // Forward reference: "a" waits on "b" which is not registered yet.
    graph.register("a", vec!["b".into()], noop()).unwrap();

    // Registering "b" after "a" would close the cycle.
    let err = graph.register("b", vec!["a".into()], noop()).unwrap_err();
    assert!(matches!(err, SluiceError::CyclicDependency(_)));

    assert!(graph.contains("a"));
    assert!(!graph.contains("b"), "failed registration must roll back");
    assert_eq!(graph.len(), 1);

    // A cycle-free retry of the same id succeeds.
    graph.register("b", vec![], noop()).unwrap();
    assert_eq!(graph.len(), 2);
}

#[test]
fn longer_cycle_is_detected() {
    let mut graph = TaskGraph::new();
    graph.register("a", vec!["c".into()], noop()).unwrap();
    graph.register("b", vec!["a".into()], noop()).unwrap();

    let err = graph.register("c", vec!["b".into()], noop()).unwrap_err();
    assert!(matches!(err, SluiceError::CyclicDependency(_)));
    assert_eq!(graph.len(), 2);
}
