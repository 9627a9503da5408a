use crate::fixtures::{coordination, parties, SlowCheck, TestNetwork, ALICE, BOB, CAROL, FAST_TIMEOUT_MS, TEST_ADDRESS, TEST_AREA};
use estate_core::application::NodeHooks;
use estate_core::foundation::EstateError;
use estate_core::infrastructure::storage::RecordStore;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn silent_counterparty_times_out() {
    let network = TestNetwork::builder(&[ALICE, BOB]).coordination(coordination(FAST_TIMEOUT_MS)).offline(BOB).start();
    let err = network
        .node(ALICE)
        .create(parties(&[ALICE]), parties(&[BOB]), TEST_AREA, TEST_ADDRESS)
        .await
        .expect_err("bob never answers");
    match &err {
        EstateError::Timeout { operation, timeout_ms } => {
            assert!(operation.contains(BOB));
            assert_eq!(*timeout_ms, FAST_TIMEOUT_MS);
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert!(err.is_retryable());
    assert!(network.store(ALICE).list_current().expect("list").is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn unregistered_counterparty_fails_before_signing() {
    let network = TestNetwork::start(&[ALICE]);
    let err = network
        .node(ALICE)
        .create(parties(&[ALICE]), parties(&[BOB]), TEST_AREA, TEST_ADDRESS)
        .await
        .expect_err("bob is unreachable");
    assert!(matches!(err, EstateError::TransportError { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn slow_notary_times_out_without_consuming_the_input() {
    let network = TestNetwork::builder(&[ALICE, BOB]).coordination(coordination(FAST_TIMEOUT_MS)).start();
    let alice = network.node(ALICE);
    let v1 = alice.create(parties(&[ALICE]), Vec::new(), TEST_AREA, TEST_ADDRESS).await.expect("create");

    network.notary.set_response_delay(Some(Duration::from_millis(FAST_TIMEOUT_MS * 3))).expect("delay");
    let err = alice.sell(v1.record_id(), parties(&[BOB])).await.expect_err("notary too slow");
    assert!(matches!(err, EstateError::Timeout { ref operation, .. } if operation == "finality"));
    assert_eq!(network.notary.consumed_by(&v1.state_ref).expect("lookup"), None);
    assert!(network.store(BOB).list_current().expect("list").is_empty());
    assert!(!alice.locks().is_locked(&v1.record_id()));

    network.notary.set_response_delay(None).expect("no delay");
    let v2 = alice.sell(v1.record_id(), parties(&[BOB])).await.expect("retry succeeds");
    assert_eq!(v2.sequence, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn early_signer_waits_out_a_slow_session_open_and_a_slow_signer() {
    // Each step stays under its own timeout, but together they outlast one signature plus one finality window.
    let timeout_ms = 500;
    let step = Duration::from_millis(400);
    let network = TestNetwork::builder(&[ALICE, BOB, CAROL])
        .coordination(coordination(timeout_ms))
        .open_delay(ALICE, CAROL, step)
        .hooks(CAROL, NodeHooks { observer: None, check: Some(Arc::new(SlowCheck(step))) })
        .start();
    network.notary.set_response_delay(Some(step)).expect("delay");

    let v1 = network
        .node(ALICE)
        .create(parties(&[ALICE]), parties(&[BOB, CAROL]), TEST_AREA, TEST_ADDRESS)
        .await
        .expect("every party records the new version");
    for name in [ALICE, BOB, CAROL] {
        assert_eq!(network.store(name).get_current(&v1.record_id()).expect("recorded"), v1, "{name}");
    }
}
