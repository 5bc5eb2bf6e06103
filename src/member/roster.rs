use chrono::NaiveDateTime;
use tracing::{debug, info};

use super::model::{generate_id, validate, Member, MemberCandidate, MemberId, MembershipType};
use super::status::{status_of, Status};
use crate::csv;
use crate::error::{GymError, Result};
use crate::store::{KeyValueStore, MEMBERS_KEY};

/// Filters for the working view of the roster. `None` means "All".
#[derive(Debug, Clone, Default)]
pub struct MemberQuery {
    pub text: String,
    pub membership_type: Option<MembershipType>,
    pub status: Option<Status>,
}

impl MemberQuery {
    fn matches(&self, member: &Member, now: NaiveDateTime) -> bool {
        let text = self.text.trim().to_lowercase();
        if !text.is_empty()
            && !member.name.to_lowercase().contains(&text)
            && !member.phone.contains(&text)
        {
            return false;
        }
        if self
            .membership_type
            .is_some_and(|t| t != member.membership_type)
        {
            return false;
        }
        if self.status.is_some_and(|s| s != status_of(member, now)) {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RosterSummary {
    pub total: usize,
    pub active: usize,
    pub expired: usize,
}

/// Ordered member collection, newest first, written through to a store
/// after every change. Changes only take effect once the store write succeeds.
#[derive(Debug)]
pub struct Roster<S: KeyValueStore> {
    members: Vec<Member>,
    store: S,
}

impl<S: KeyValueStore> Roster<S> {
    /// Load the collection from the store; a missing key is an empty roster
    pub fn open(store: S) -> Result<Self> {
        let members = match store.get(MEMBERS_KEY)? {
            Some(raw) => serde_json::from_str(&raw).map_err(|source| GymError::Store {
                key: MEMBERS_KEY.to_string(),
                source,
            })?,
            None => Vec::new(),
        };
        let roster = Self { members, store };
        debug!("Loaded {} members", roster.len());
        Ok(roster)
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, id: &MemberId) -> Option<&Member> {
        self.members.iter().find(|m| &m.id == id)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate and prepend a new member
    pub fn add(&mut self, candidate: &MemberCandidate) -> Result<&Member> {
        let fields = validate(candidate)?;
        let member = Member::new(generate_id(), fields);
        info!(id = %member.id, "Adding member {}", member.name);
        let mut next = Vec::with_capacity(self.members.len() + 1);
        next.push(member);
        next.extend(self.members.iter().cloned());
        self.commit(next)?;
        Ok(&self.members[0])
    }

    /// Replace every field of an existing member, keeping its id and position
    pub fn update(&mut self, id: &MemberId, candidate: &MemberCandidate) -> Result<&Member> {
        let idx = self
            .members
            .iter()
            .position(|m| &m.id == id)
            .ok_or_else(|| GymError::NotFound(id.to_string()))?;
        let fields = validate(candidate)?;
        let mut next = self.members.clone();
        next[idx].apply(fields);
        info!(%id, "Updating member");
        self.commit(next)?;
        Ok(&self.members[idx])
    }

    /// Remove a member; an unknown id is not an error
    pub fn remove(&mut self, id: &MemberId) -> Result<Option<Member>> {
        let Some(idx) = self.members.iter().position(|m| &m.id == id) else {
            debug!(%id, "Nothing to remove");
            return Ok(None);
        };
        let mut next = self.members.clone();
        let removed = next.remove(idx);
        info!(%id, "Removing member {}", removed.name);
        self.commit(next)?;
        Ok(Some(removed))
    }

    /// Prepend already-validated members, keeping their order
    pub fn bulk_import(&mut self, members: Vec<Member>) -> Result<usize> {
        let count = members.len();
        if count == 0 {
            return Ok(0);
        }
        let mut next = members;
        next.extend(self.members.iter().cloned());
        info!("Importing {count} members");
        self.commit(next)?;
        Ok(count)
    }

    /// Filtered view sorted by end date; ties keep collection order
    pub fn query(&self, query: &MemberQuery, now: NaiveDateTime) -> Vec<&Member> {
        let mut view: Vec<&Member> = self
            .members
            .iter()
            .filter(|m| query.matches(m, now))
            .collect();
        view.sort_by_key(|m| m.end);
        view
    }

    pub fn summary(&self, now: NaiveDateTime) -> RosterSummary {
        let active = self
            .members
            .iter()
            .filter(|m| status_of(m, now) == Status::Active)
            .count();
        RosterSummary {
            total: self.members.len(),
            active,
            expired: self.members.len() - active,
        }
    }

    /// Whole collection as CSV text, in stored order
    pub fn export_csv(&self) -> String {
        csv::serialize(&self.members)
    }

    /// Write `next` to the store, then make it the in-memory collection.
    /// A failed write leaves the roster as it was.
    fn commit(&mut self, next: Vec<Member>) -> Result<()> {
        let raw = serde_json::to_string(&next).map_err(|source| GymError::Store {
            key: MEMBERS_KEY.to_string(),
            source,
        })?;
        self.store.set(MEMBERS_KEY, &raw)?;
        self.members = next;
        Ok(())
    }
}
