use crate::fixtures::{parties, party, RecordingObserver, TestNetwork, ALICE, BOB, CAROL, TEST_ADDRESS, TEST_AREA};
use estate_core::application::NodeHooks;
use estate_core::foundation::EstateError;
use estate_core::infrastructure::storage::RecordStore;
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn create_sell_rent_cancel_converges_on_every_participant() {
    let network = TestNetwork::start(&[ALICE, BOB, CAROL]);
    let alice = network.node(ALICE);
    let bob = network.node(BOB);

    let v1 = alice.create(parties(&[ALICE]), Vec::new(), TEST_AREA, TEST_ADDRESS).await.expect("create");
    assert_eq!(v1.sequence, 0);
    assert_eq!(v1.record.owners, parties(&[ALICE]));
    let record_id = v1.record_id();

    let v2 = alice.sell(record_id, parties(&[BOB])).await.expect("sell");
    assert_eq!(v2.sequence, 1);
    assert_eq!(v2.record.owners, parties(&[BOB]));
    assert_eq!(v2.record.area, TEST_AREA);
    assert_eq!(network.store(BOB).get_current(&record_id).expect("bob sees the sale"), v2);

    let v3 = bob.rent(record_id, parties(&[CAROL])).await.expect("rent");
    assert_eq!(v3.record.tenants, parties(&[CAROL]));
    assert_eq!(network.store(CAROL).get_current(&record_id).expect("carol sees the lease"), v3);

    let v4 = bob.cancel_rent(record_id, parties(&[CAROL])).await.expect("cancel rent");
    assert!(v4.record.tenants.is_empty());
    assert_eq!(v4.sequence, 3);
    assert_eq!(v4.record.with_tenants(Vec::new()), v3.record.with_tenants(Vec::new()));
    assert_ne!(v4.state_ref, v2.state_ref);

    for name in [BOB, CAROL] {
        assert_eq!(network.store(name).get_current(&record_id).expect("current"), v4);
    }
    let history = network.store(BOB).history(&record_id).expect("history");
    assert_eq!(history.iter().map(|version| version.sequence).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(network.store(ALICE).history(&record_id).expect("alice history").len(), 2);

    match bob.sell(record_id, Vec::new()).await {
        Err(EstateError::ValidationFailed(violations)) => assert!(violations.to_string().contains("owners non-empty")),
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert_eq!(network.store(BOB).get_current(&record_id).expect("unchanged"), v4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn finalized_transition_is_stored_with_every_signature() {
    let network = TestNetwork::start(&[ALICE, BOB]);
    let version = network.node(ALICE).create(parties(&[ALICE, BOB]), Vec::new(), TEST_AREA, TEST_ADDRESS).await.expect("create");

    for name in [ALICE, BOB] {
        let finalized = network
            .store(name)
            .get_transition(&version.state_ref.transition_id)
            .expect("lookup")
            .expect("recorded");
        assert!(finalized.signed.is_fully_signed());
        assert_eq!(finalized.notary(), &party(crate::fixtures::NOTARY));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn observers_see_the_protocol_steps() {
    let initiator_events = Arc::new(RecordingObserver::default());
    let responder_events = Arc::new(RecordingObserver::default());
    let network = TestNetwork::builder(&[ALICE, BOB])
        .hooks(ALICE, NodeHooks { observer: Some(initiator_events.clone()), check: None })
        .hooks(BOB, NodeHooks { observer: Some(responder_events.clone()), check: None })
        .start();

    let version = network.node(ALICE).create(parties(&[ALICE]), parties(&[BOB]), TEST_AREA, TEST_ADDRESS).await.expect("create");
    let id = version.state_ref.transition_id.short();

    assert_eq!(
        initiator_events.events(),
        vec![format!("built:{id}"), format!("signature:{id}"), format!("fully_signed:{id}"), format!("finalized:{id}")]
    );
    assert_eq!(responder_events.events(), vec![format!("signed:{id}"), format!("finalized:{id}")]);
}

#[tokio::test]
async fn sole_participant_create_needs_no_sessions() {
    let network = TestNetwork::builder(&[ALICE, BOB]).offline(BOB).start();
    let version = network.node(ALICE).create(parties(&[ALICE]), Vec::new(), TEST_AREA, TEST_ADDRESS).await.expect("create");
    assert_eq!(network.store(ALICE).get_current(&version.record_id()).expect("current"), version);
    assert!(network.store(BOB).list_current().expect("list").is_empty());
}
