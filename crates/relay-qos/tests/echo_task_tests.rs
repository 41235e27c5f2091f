//! Relay echo ticks end to end, against fake gatekeeper services.

mod common;

use common::*;
use relay_qos::crypto::generate_keypair;
use relay_qos::{CandidateSelector, EchoContext, EchoError, MemoryCatalog, RelayEchoTask, TickOutcome};
use std::sync::Arc;

fn secure_context() -> EchoContext {
    EchoContext { standalone: false, secure_mode: true, keypair: Some(Arc::new(generate_keypair())) }
}

fn task(topology: StaticTopology, gatekeeper: Arc<RecordingGatekeeper>, context: EchoContext) -> RelayEchoTask {
    let selector = CandidateSelector::new(Arc::new(topology), Arc::new(MemoryCatalog::new()));
    RelayEchoTask::new(selector, gatekeeper, context)
}

#[tokio::test]
async fn test_tick_submits_signed_proposal() {
    let _ = tracing_subscriber::fmt::try_init();

    let relay = gatekeeper_relay("10.0.1.1");
    let topology = StaticTopology::new(vec![own_cloud("c0"), neighbor_cloud("c1", vec![relay.clone()])], &[]);
    let gatekeeper = Arc::new(RecordingGatekeeper::default());
    let context = secure_context();
    let public_key = context.keypair.as_ref().unwrap().public_key_base64();

    let outcome = task(topology, gatekeeper.clone(), context).run().await.unwrap();
    assert!(matches!(outcome, TickOutcome::Submitted(_)));

    let proposals = gatekeeper.proposals.lock().unwrap();
    assert_eq!(proposals.len(), 1);
    let proposal = &proposals[0];
    assert_eq!(proposal.requester_cloud.name, "c0");
    assert_eq!(proposal.target_cloud.name, "c1");
    assert_eq!(proposal.relay, relay);
    assert_eq!(proposal.sender_public_key, public_key);
    assert!(proposal.verify().is_ok());
}

#[tokio::test]
async fn test_no_candidate_means_no_submission() {
    let topology = StaticTopology::new(
        vec![own_cloud("c0"), neighbor_cloud("c1", vec![gatekeeper_relay("10.0.1.1")])],
        &["c1"],
    );
    let gatekeeper = Arc::new(RecordingGatekeeper::default());

    let outcome = task(topology, gatekeeper.clone(), secure_context()).run().await.unwrap();
    assert!(matches!(outcome, TickOutcome::NoCandidate));
    assert!(gatekeeper.proposals.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_delivery_is_not_retried_within_tick() {
    let topology = StaticTopology::new(
        vec![own_cloud("c0"), neighbor_cloud("c1", vec![gatekeeper_relay("10.0.1.1")])],
        &[],
    );
    let gatekeeper = Arc::new(RecordingGatekeeper { fail: true, ..Default::default() });
    let task = task(topology, gatekeeper.clone(), secure_context());

    let outcome = task.run().await.unwrap();
    assert!(matches!(outcome, TickOutcome::SubmissionFailed { .. }));
    assert_eq!(gatekeeper.proposals.lock().unwrap().len(), 1);

    // The next tick picks the same pair again
    let outcome = task.run().await.unwrap();
    match outcome {
        TickOutcome::SubmissionFailed { proposal, .. } => assert_eq!(proposal.target_cloud.name, "c1"),
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn test_preconditions_skip_topology() {
    let mut topology = StaticTopology::new(vec![], &[]);
    topology.unavailable = true;
    let gatekeeper = Arc::new(RecordingGatekeeper::default());

    let standalone = EchoContext { standalone: true, ..secure_context() };
    let outcome = task(topology, gatekeeper.clone(), standalone).run().await.unwrap();
    assert!(matches!(outcome, TickOutcome::Standalone));

    let mut topology = StaticTopology::new(vec![], &[]);
    topology.unavailable = true;
    let insecure = EchoContext { secure_mode: false, ..secure_context() };
    let outcome = task(topology, gatekeeper.clone(), insecure).run().await.unwrap();
    assert!(matches!(outcome, TickOutcome::InsecureMode));
}

#[tokio::test]
async fn test_missing_own_cloud_fails_tick() {
    let topology = StaticTopology::new(vec![neighbor_cloud("c1", vec![gatekeeper_relay("10.0.1.1")])], &[]);
    let gatekeeper = Arc::new(RecordingGatekeeper::default());

    let result = task(topology, gatekeeper.clone(), secure_context()).run().await;
    assert!(matches!(result, Err(EchoError::MissingOwnCloud)));
    assert!(gatekeeper.proposals.lock().unwrap().is_empty());
}
