//! Membership roster
//!
//! The ordered list of member names, fixed for the life of a ledger
//! generation. A participant's id is its position in this list. The
//! roster is agreed out of band and never travels inside the snapshot
//! interchange bytes; a replica receiving state supplies its own copy.

use crate::ids::ParticipantId;
use std::sync::Arc;

/// Ordered membership list shared by all snapshots of a generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    names: Arc<[String]>,
}

impl Roster {
    pub fn new(names: Vec<String>) -> Self {
        Self {
            names: names.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Display name of a member, if the id is in range.
    pub fn name(&self, id: ParticipantId) -> Option<&str> {
        self.names.get(id.index()).map(String::as_str)
    }

    pub fn contains(&self, id: ParticipantId) -> bool {
        id.index() < self.names.len()
    }

    /// All member ids in roster order.
    pub fn ids(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        (0..self.names.len() as u32).map(ParticipantId::new)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}
