use crate::fixtures::{coordination, identity, parties, party, TestNetwork, ALICE, BOB, DAVE, FAST_TIMEOUT_MS, NOTARY, TEST_ADDRESS, TEST_AREA};
use estate_core::application::{NodeServices, PropertyNode};
use estate_core::domain::hashes::signing_payload;
use estate_core::domain::{FinalizedTransition, RecordVersion, TransactionSignature};
use estate_core::foundation::{EstateError, RecordId, TransitionId};
use estate_core::infrastructure::keys::LocalSigningService;
use estate_core::infrastructure::storage::{MemoryRecordStore, RecordStore};
use estate_core::infrastructure::transport::{FlowSession, SessionMessage, SessionTransport};
use std::sync::Arc;

/// Reads work; recording a finalized transition always fails.
#[derive(Default)]
struct ReadOnlyStore {
    inner: MemoryRecordStore,
}

impl RecordStore for ReadOnlyStore {
    fn current_versions(&self, record_id: &RecordId) -> Result<Vec<RecordVersion>, EstateError> {
        self.inner.current_versions(record_id)
    }

    fn mark_finalized(&self, _finalized: &FinalizedTransition) -> Result<bool, EstateError> {
        Err(EstateError::StorageError { operation: "mark_finalized".to_string(), details: "disk full".to_string() })
    }

    fn history(&self, record_id: &RecordId) -> Result<Vec<RecordVersion>, EstateError> {
        self.inner.history(record_id)
    }

    fn list_current(&self) -> Result<Vec<RecordVersion>, EstateError> {
        self.inner.list_current()
    }

    fn get_transition(&self, transition_id: &TransitionId) -> Result<Option<FinalizedTransition>, EstateError> {
        self.inner.get_transition(transition_id)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn counterparty_that_never_confirms_is_named_in_the_error() {
    let network = TestNetwork::builder(&[ALICE]).coordination(coordination(FAST_TIMEOUT_MS)).start();
    let dave = network.hub.register(party(DAVE)).expect("register dave");
    let dave_key = identity(DAVE);
    network.directory.register(party(DAVE), dave_key.verifying_key()).expect("publish dave");

    let alice = network.node(ALICE);
    // Dave signs and receives the result but keeps the session open without confirming.
    let signs_but_stays_silent = async {
        let mut session = dave.accept().await.expect("session from alice");
        let proposal = match session.receive().await.expect("proposal") {
            SessionMessage::Proposal(proposal) => proposal,
            other => panic!("expected proposal, got {}", other.kind()),
        };
        let signature = dave_key.sign_payload(&signing_payload(&proposal.id));
        session.send(SessionMessage::Signature(TransactionSignature { signer: party(DAVE), signature })).await.expect("sign");
        assert!(matches!(session.receive().await.expect("result"), SessionMessage::Finalized(_)));
        (session, proposal.id)
    };
    let (result, (session, proposal_id)) =
        tokio::join!(alice.create(parties(&[ALICE]), parties(&[DAVE]), TEST_AREA, TEST_ADDRESS), signs_but_stays_silent);

    let err = result.expect_err("dave never confirms");
    match &err {
        EstateError::CommittedNotRecorded { transition_id, parties: unrecorded } => {
            assert_eq!(transition_id, &proposal_id);
            assert_eq!(unrecorded, &parties(&[DAVE]));
        }
        other => panic!("expected committed-not-recorded, got {other:?}"),
    }
    assert!(!err.is_retryable());
    assert_eq!(network.store(ALICE).list_current().expect("list").len(), 1);
    drop(session);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn local_store_failure_after_commit_still_reaches_counterparties() {
    let network = TestNetwork::start(&[BOB]);
    let signing = LocalSigningService::new(Arc::clone(&network.directory)).with_identity(identity(ALICE)).expect("signing service");
    let services = NodeServices {
        store: Arc::new(ReadOnlyStore::default()),
        signing: Arc::new(signing),
        transport: Arc::new(network.hub.register(party(ALICE)).expect("register alice")),
        finality: network.notary.clone(),
    };
    let alice = PropertyNode::new(party(ALICE), party(NOTARY), &coordination(FAST_TIMEOUT_MS), services);

    let err = alice.create(parties(&[ALICE]), parties(&[BOB]), TEST_AREA, TEST_ADDRESS).await.expect_err("alice cannot record");
    match &err {
        EstateError::CommittedNotRecorded { parties: unrecorded, .. } => assert_eq!(unrecorded, &parties(&[ALICE])),
        other => panic!("expected committed-not-recorded, got {other:?}"),
    }
    let recorded = network.store(BOB).list_current().expect("list");
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].record.tenants, parties(&[BOB]));
}
