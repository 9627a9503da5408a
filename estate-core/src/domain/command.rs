use crate::foundation::{PartyId, RecordId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-facing request: which change to make and the data it needs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Create { owners: Vec<PartyId>, tenants: Vec<PartyId>, area: i64, address: String },
    Sell { record_id: RecordId, new_owners: Vec<PartyId> },
    Rent { record_id: RecordId, new_tenants: Vec<PartyId> },
    CancelRent { record_id: RecordId, tenants_to_remove: Vec<PartyId> },
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Create { .. } => CommandKind::Create,
            Command::Sell { .. } => CommandKind::Sell,
            Command::Rent { .. } => CommandKind::Rent,
            Command::CancelRent { .. } => CommandKind::CancelRent,
        }
    }

    /// The record the command consumes; `None` for Create.
    pub fn record_id(&self) -> Option<RecordId> {
        match self {
            Command::Create { .. } => None,
            Command::Sell { record_id, .. } | Command::Rent { record_id, .. } | Command::CancelRent { record_id, .. } => Some(*record_id),
        }
    }
}

/// Tag carried inside a transition; the validator dispatches on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Create,
    Sell,
    Rent,
    CancelRent,
}

impl CommandKind {
    pub const fn expected_inputs(self) -> usize {
        match self {
            CommandKind::Create => 0,
            CommandKind::Sell | CommandKind::Rent | CommandKind::CancelRent => 1,
        }
    }

    pub const fn expected_outputs(self) -> usize {
        1
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            CommandKind::Create => "create",
            CommandKind::Sell => "sell",
            CommandKind::Rent => "rent",
            CommandKind::CancelRent => "cancel_rent",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
