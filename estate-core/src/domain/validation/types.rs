//! Violation types reported by the transition rules (no logging in domain).

use crate::domain::CommandKind;
use crate::foundation::PartyId;
use std::fmt;

/// One broken transition rule. `Display` names the invariant that failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    InputCount { kind: CommandKind, expected: usize, actual: usize },
    OutputCount { kind: CommandKind, expected: usize, actual: usize },
    OwnersEmpty,
    AreaNotPositive { area: i64 },
    AddressEmpty,
    AddressTooLong { length: usize, max: usize },
    /// `party` appears more than once in `field`.
    DuplicateParty { field: &'static str, party: PartyId },
    /// A field other than the one the command may change differs between input and output.
    FieldChanged { field: &'static str },
    TenantsNotRetained,
    TenantsNotGrown,
    TenantsNotSubset,
    TenantsNotShrunk,
    MissingRequiredSigner { party: PartyId },
    UnexpectedSigner { party: PartyId },
    InitiatorNotSigner { party: PartyId },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::InputCount { kind, expected, actual } => write!(f, "{kind} consumes {expected} inputs (got {actual})"),
            Violation::OutputCount { kind, expected, actual } => write!(f, "{kind} produces {expected} outputs (got {actual})"),
            Violation::OwnersEmpty => f.write_str("owners non-empty"),
            Violation::AreaNotPositive { area } => write!(f, "area > 0 (got {area})"),
            Violation::AddressEmpty => f.write_str("address non-empty"),
            Violation::DuplicateParty { field, party } => write!(f, "{field} distinct ({party} listed twice)"),
            Violation::AddressTooLong { length, max } => write!(f, "address at most {max} bytes (got {length})"),
            Violation::FieldChanged { field } => write!(f, "{field} unchanged"),
            Violation::TenantsNotRetained => f.write_str("output tenants include input tenants"),
            Violation::TenantsNotGrown => f.write_str("tenants added"),
            Violation::TenantsNotSubset => f.write_str("input tenants include output tenants"),
            Violation::TenantsNotShrunk => f.write_str("tenants removed"),
            Violation::MissingRequiredSigner { party } => write!(f, "required signer {party} listed"),
            Violation::UnexpectedSigner { party } => write!(f, "signer {party} is a participant"),
            Violation::InitiatorNotSigner { party } => write!(f, "initiator {party} is a required signer"),
        }
    }
}

/// Every violation found in one validation pass, in rule order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViolationList(Vec<Violation>);

impl ViolationList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, violation: Violation) {
        self.0.push(violation);
    }

    pub fn extend(&mut self, other: ViolationList) {
        self.0.extend(other.0);
    }

    pub fn contains(&self, violation: &Violation) -> bool {
        self.0.contains(violation)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), ViolationList> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<Vec<Violation>> for ViolationList {
    fn from(violations: Vec<Violation>) -> Self {
        Self(violations)
    }
}

impl IntoIterator for ViolationList {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for ViolationList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, violation) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}
