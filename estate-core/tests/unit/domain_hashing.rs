use crate::fixtures::{party, transition, RecordBuilder, ALICE, BOB, CAROL, NOTARY};
use estate_core::domain::hashes::{finality_payload, session_id, signing_payload};
use estate_core::domain::CommandKind;
use estate_core::foundation::EstateError;

#[test]
fn transition_id_is_deterministic_and_content_bound() {
    let input = RecordBuilder::default().version(0, 1);
    let output = input.record.with_owners(vec![party(BOB)]);
    let first = transition(CommandKind::Sell, vec![input.clone()], output.clone(), ALICE);
    let second = transition(CommandKind::Sell, vec![input.clone()], output, ALICE);
    assert!(first.id.ct_eq(&second.id));

    let other = transition(CommandKind::Sell, vec![input.clone()], input.record.with_owners(vec![party(CAROL)]), ALICE);
    assert_ne!(first.id, other.id);
}

#[test]
fn tampering_breaks_id_verification() {
    let input = RecordBuilder::default().version(0, 1);
    let mut signed = transition(CommandKind::Sell, vec![input.clone()], input.record.with_owners(vec![party(BOB)]), ALICE);
    signed.verify_id().expect("untouched");
    signed.transition.outputs[0].area += 1;
    match signed.verify_id() {
        Err(EstateError::TransitionIdMismatch { claimed, computed }) => {
            assert_eq!(claimed, signed.id);
            assert_ne!(computed, signed.id);
        }
        other => panic!("expected id mismatch, got {other:?}"),
    }
}

#[test]
fn sessions_are_bound_to_transition_and_counterparty() {
    let input = RecordBuilder::default().version(0, 1);
    let signed = transition(CommandKind::Sell, vec![input.clone()], input.record.with_owners(vec![party(BOB)]), ALICE);
    let to_bob = session_id(&signed.id, &party(ALICE), &party(BOB));
    let to_carol = session_id(&signed.id, &party(ALICE), &party(CAROL));
    let reversed = session_id(&signed.id, &party(BOB), &party(ALICE));
    assert_ne!(to_bob, to_carol);
    assert_ne!(to_bob, reversed);
}

#[test]
fn finality_payload_is_separated_from_signing_payload() {
    let input = RecordBuilder::default().version(0, 1);
    let signed = transition(CommandKind::Sell, vec![input.clone()], input.record.with_owners(vec![party(BOB)]), ALICE);
    assert_ne!(finality_payload(&signed.id, &party(NOTARY)), signing_payload(&signed.id));
    assert_ne!(finality_payload(&signed.id, &party(NOTARY)), finality_payload(&signed.id, &party(BOB)));
}
