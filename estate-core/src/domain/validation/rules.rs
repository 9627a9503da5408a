use super::types::{Violation, ViolationList};
use crate::domain::{CommandKind, Record, SignerPolicy, Transition};
use crate::foundation::{PartyId, MAX_ADDRESS_LENGTH};
use std::collections::BTreeSet;

/// The one field a command is allowed to change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mutable {
    Owners,
    Tenants,
}

/// Checks the record-level rules for `kind`.
///
/// Every violation is collected. When the input or output count is wrong the content rules are
/// skipped, since there is no single input/output pair to compare.
pub fn validate_transition(kind: CommandKind, inputs: &[Record], outputs: &[Record]) -> Result<(), ViolationList> {
    let mut violations = ViolationList::new();
    if inputs.len() != kind.expected_inputs() {
        violations.push(Violation::InputCount { kind, expected: kind.expected_inputs(), actual: inputs.len() });
    }
    if outputs.len() != kind.expected_outputs() {
        violations.push(Violation::OutputCount { kind, expected: kind.expected_outputs(), actual: outputs.len() });
    }
    if !violations.is_empty() {
        return Err(violations);
    }

    for output in outputs {
        check_distinct("owners", &output.owners, &mut violations);
        check_distinct("tenants", &output.tenants, &mut violations);
    }
    let output = &outputs[0];
    match kind {
        CommandKind::Create => {
            check_record_invariants(output, &mut violations);
        }
        CommandKind::Sell => {
            let input = &inputs[0];
            check_unchanged_except(input, output, Mutable::Owners, &mut violations);
            if output.owners.is_empty() {
                violations.push(Violation::OwnersEmpty);
            }
        }
        CommandKind::Rent => {
            let input = &inputs[0];
            let before = tenant_set(input);
            let after = tenant_set(output);
            if !after.is_superset(&before) {
                violations.push(Violation::TenantsNotRetained);
            }
            if after.len() <= before.len() {
                violations.push(Violation::TenantsNotGrown);
            }
            check_unchanged_except(input, output, Mutable::Tenants, &mut violations);
        }
        CommandKind::CancelRent => {
            let input = &inputs[0];
            let before = tenant_set(input);
            let after = tenant_set(output);
            if !before.is_superset(&after) {
                violations.push(Violation::TenantsNotSubset);
            }
            if before.len() <= after.len() {
                violations.push(Violation::TenantsNotShrunk);
            }
            check_unchanged_except(input, output, Mutable::Tenants, &mut violations);
        }
    }
    violations.into_result()
}

/// Checks the signer set a transition lists against what `policy` demands of its records.
pub fn check_signers(transition: &Transition, policy: SignerPolicy) -> Result<(), ViolationList> {
    let mut violations = ViolationList::new();
    let expected = policy.required_signers(transition.inputs.iter().map(|version| &version.record).chain(transition.outputs.iter()));

    for party in expected.difference(&transition.required_signers) {
        violations.push(Violation::MissingRequiredSigner { party: party.clone() });
    }
    for party in transition.required_signers.difference(&expected) {
        violations.push(Violation::UnexpectedSigner { party: party.clone() });
    }
    if !transition.required_signers.contains(&transition.initiator) {
        violations.push(Violation::InitiatorNotSigner { party: transition.initiator.clone() });
    }
    violations.into_result()
}

/// Record rules followed by signer rules; both sets of violations are reported together.
pub fn validate_proposal(transition: &Transition, policy: SignerPolicy) -> Result<(), ViolationList> {
    let mut violations = ViolationList::new();
    if let Err(found) = validate_transition(transition.kind, &transition.input_records(), &transition.outputs) {
        violations.extend(found);
    }
    if let Err(found) = check_signers(transition, policy) {
        violations.extend(found);
    }
    violations.into_result()
}

fn check_record_invariants(record: &Record, violations: &mut ViolationList) {
    if record.owners.is_empty() {
        violations.push(Violation::OwnersEmpty);
    }
    if record.area <= 0 {
        violations.push(Violation::AreaNotPositive { area: record.area });
    }
    if record.address.trim().is_empty() {
        violations.push(Violation::AddressEmpty);
    }
    if record.address.len() > MAX_ADDRESS_LENGTH {
        violations.push(Violation::AddressTooLong { length: record.address.len(), max: MAX_ADDRESS_LENGTH });
    }
}

fn check_unchanged_except(input: &Record, output: &Record, mutable: Mutable, violations: &mut ViolationList) {
    let mut require_same = |field: &'static str, same: bool| {
        if !same {
            violations.push(Violation::FieldChanged { field });
        }
    };
    require_same("record_id", input.record_id == output.record_id);
    require_same("constructed_at", input.constructed_at_nanos == output.constructed_at_nanos);
    require_same("area", input.area == output.area);
    require_same("address", input.address == output.address);
    if mutable != Mutable::Owners {
        require_same("owners", input.owners == output.owners);
    }
    if mutable != Mutable::Tenants {
        require_same("tenants", input.tenants == output.tenants);
    }
}

/// Each repeated party is reported once.
fn check_distinct(field: &'static str, parties: &[PartyId], violations: &mut ViolationList) {
    let mut seen = BTreeSet::new();
    let mut repeated = BTreeSet::new();
    for party in parties {
        if !seen.insert(party) && repeated.insert(party) {
            violations.push(Violation::DuplicateParty { field, party: party.clone() });
        }
    }
}

fn tenant_set(record: &Record) -> BTreeSet<&PartyId> {
    record.tenants.iter().collect()
}
