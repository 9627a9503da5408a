use crate::fixtures::{identity, parties, party, sign_with, transition, RecordBuilder, TestNetwork, ALICE, BOB, CAROL, DAVE, NOTARY, TEST_ADDRESS, TEST_AREA};
use estate_core::application::{CollectedSignatures, FinalityCoordinator, NoopObserver};
use estate_core::domain::{CommandKind, RecordVersion, StateRef};
use estate_core::foundation::{EstateError, TransitionId};
use estate_core::infrastructure::finality::{FinalityOutcome, FinalityService, InMemoryNotary};
use estate_core::infrastructure::keys::{KeyDirectory, LocalSigningService};
use estate_core::infrastructure::storage::{MemoryRecordStore, RecordStore};
use std::sync::Arc;
use std::time::Duration;

fn notary_with_parties(names: &[&str]) -> Arc<InMemoryNotary> {
    let directory = Arc::new(KeyDirectory::new());
    for name in names {
        let id = identity(name);
        directory.register(id.party.clone(), id.verifying_key()).expect("register");
    }
    Arc::new(InMemoryNotary::new(identity(NOTARY), directory).expect("notary"))
}

async fn created_on(notary: &InMemoryNotary) -> RecordVersion {
    let mut create = transition(CommandKind::Create, Vec::new(), RecordBuilder::default().build(), ALICE);
    sign_with(&mut create, &[&identity(ALICE)]);
    match notary.submit(&create, &[]).await.expect("submit create") {
        FinalityOutcome::Accepted(finalized) => finalized.output_versions().remove(0),
        FinalityOutcome::Rejected { reason } => panic!("create rejected: {reason}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn conflicting_spends_accept_exactly_one() {
    let notary = notary_with_parties(&[ALICE, BOB, CAROL]);
    let v1 = created_on(&notary).await;

    let mut to_bob = transition(CommandKind::Sell, vec![v1.clone()], v1.record.with_owners(parties(&[BOB])), ALICE);
    sign_with(&mut to_bob, &[&identity(ALICE), &identity(BOB)]);
    let mut to_carol = transition(CommandKind::Sell, vec![v1.clone()], v1.record.with_owners(parties(&[CAROL])), ALICE);
    sign_with(&mut to_carol, &[&identity(ALICE), &identity(CAROL)]);

    let refs = [v1.state_ref];
    let (first, second) = tokio::join!(notary.submit(&to_bob, &refs), notary.submit(&to_carol, &refs));
    let outcomes = [first.expect("first"), second.expect("second")];
    let accepted: Vec<TransitionId> = outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            FinalityOutcome::Accepted(finalized) => Some(finalized.id()),
            FinalityOutcome::Rejected { .. } => None,
        })
        .collect();
    assert_eq!(accepted.len(), 1);
    assert!(outcomes.iter().any(|outcome| matches!(outcome, FinalityOutcome::Rejected { reason } if reason.contains("already consumed"))));
    assert_eq!(notary.consumed_by(&v1.state_ref).expect("lookup"), Some(accepted[0]));
}

#[tokio::test]
async fn resubmitting_a_finalized_transition_is_rejected() {
    let notary = notary_with_parties(&[ALICE, BOB]);
    let v1 = created_on(&notary).await;
    let mut sell = transition(CommandKind::Sell, vec![v1.clone()], v1.record.with_owners(parties(&[BOB])), ALICE);
    sign_with(&mut sell, &[&identity(ALICE), &identity(BOB)]);

    assert!(matches!(notary.submit(&sell, &[v1.state_ref]).await.expect("first"), FinalityOutcome::Accepted(_)));
    match notary.submit(&sell, &[v1.state_ref]).await.expect("replay") {
        FinalityOutcome::Rejected { reason } => assert!(reason.contains("already finalized")),
        FinalityOutcome::Accepted(_) => panic!("replay accepted"),
    }
}

#[tokio::test]
async fn notary_refuses_incomplete_or_misaddressed_requests() {
    let notary = notary_with_parties(&[ALICE, BOB]);
    let v1 = created_on(&notary).await;

    let mut unsigned_by_buyer = transition(CommandKind::Sell, vec![v1.clone()], v1.record.with_owners(parties(&[BOB])), ALICE);
    sign_with(&mut unsigned_by_buyer, &[&identity(ALICE)]);
    assert!(matches!(
        notary.submit(&unsigned_by_buyer, &[v1.state_ref]).await.expect("submit"),
        FinalityOutcome::Rejected { reason } if reason.contains("missing signature")
    ));

    let mut elsewhere = transition(CommandKind::Sell, vec![v1.clone()], v1.record.with_owners(parties(&[BOB])), ALICE);
    elsewhere.transition.notary = party(DAVE);
    let mut elsewhere = estate_core::domain::SignedTransition::new(elsewhere.transition).expect("rehash");
    sign_with(&mut elsewhere, &[&identity(ALICE), &identity(BOB)]);
    assert!(matches!(notary.submit(&elsewhere, &[v1.state_ref]).await.expect("submit"), FinalityOutcome::Rejected { .. }));

    let unknown = RecordBuilder::default().version(0, 9);
    let mut from_nowhere = transition(CommandKind::Sell, vec![unknown.clone()], unknown.record.with_owners(parties(&[BOB])), ALICE);
    sign_with(&mut from_nowhere, &[&identity(ALICE), &identity(BOB)]);
    let refs: Vec<StateRef> = from_nowhere.transition.consumed_refs();
    assert!(matches!(
        notary.submit(&from_nowhere, &refs).await.expect("submit"),
        FinalityOutcome::Rejected { reason } if reason.contains("unknown")
    ));

    // Nothing above consumed v1.
    assert_eq!(notary.consumed_by(&v1.state_ref).expect("lookup"), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn co_owners_selling_concurrently_commit_one_sale() {
    let network = TestNetwork::start(&[ALICE, BOB, CAROL, DAVE]);
    let alice = network.node(ALICE);
    let bob = network.node(BOB);
    let v1 = alice.create(parties(&[ALICE, BOB]), Vec::new(), TEST_AREA, TEST_ADDRESS).await.expect("create");
    let record_id = v1.record_id();

    let (by_alice, by_bob) = tokio::join!(alice.sell(record_id, parties(&[CAROL])), bob.sell(record_id, parties(&[DAVE])));
    let (winner, loser) = match (by_alice, by_bob) {
        (Ok(version), Err(err)) | (Err(err), Ok(version)) => (version, err),
        (first, second) => panic!("expected one sale to commit, got {first:?} and {second:?}"),
    };
    assert!(matches!(loser, EstateError::FinalityRejected { .. }), "unexpected error: {loser}");
    assert!(loser.is_retryable());

    for name in [ALICE, BOB] {
        assert_eq!(network.store(name).get_current(&record_id).expect("current"), winner);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn finality_coordinator_surfaces_replay_as_rejection() {
    let network = TestNetwork::start(&[ALICE, BOB]);
    let version = network.node(ALICE).create(parties(&[ALICE]), parties(&[BOB]), TEST_AREA, TEST_ADDRESS).await.expect("create");
    let finalized = network.store(ALICE).get_transition(&version.state_ref.transition_id).expect("lookup").expect("recorded");

    let coordinator = FinalityCoordinator::new(
        network.notary.clone(),
        Arc::new(LocalSigningService::new(Arc::clone(&network.directory))),
        Arc::new(MemoryRecordStore::new()),
        Arc::new(NoopObserver),
        Duration::from_secs(5),
        Duration::from_secs(5),
    );
    let err = coordinator
        .finalize(CollectedSignatures { signed: finalized.signed.clone(), sessions: Vec::new() })
        .await
        .expect_err("replay");
    assert!(matches!(err, EstateError::FinalityRejected { ref reason } if reason.contains("already finalized")));
}
