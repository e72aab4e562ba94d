//! In-process store.
//!
//! Holds everything behind one `RwLock`, which makes every call atomic. Tests
//! across the workspace run the services against it.

use async_trait::async_trait;
use chrono::Utc;
use clubhouse_core::{
    CategoryCounts, ClubError, ClubResult, CustomField, FieldId, Member, MemberDraft,
    MemberFilter, MemberId, NewCustomField,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::store::ClubStore;

#[derive(Debug, Default)]
struct State {
    members: BTreeMap<MemberId, Member>,
    fields: BTreeMap<FieldId, CustomField>,
    club_name: Option<String>,
    last_member_id: MemberId,
    last_field_id: FieldId,
}

/// [`ClubStore`] kept in memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
    offline: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with a connection error, as an unreachable
    /// database would.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> ClubResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ClubError::Connection("store is offline".into()));
        }
        Ok(())
    }

    fn read(&self) -> ClubResult<RwLockReadGuard<'_, State>> {
        self.check_online()?;
        self.state
            .read()
            .map_err(|e| ClubError::Database(format!("failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> ClubResult<RwLockWriteGuard<'_, State>> {
        self.check_online()?;
        self.state
            .write()
            .map_err(|e| ClubError::Database(format!("failed to acquire write lock: {}", e)))
    }
}

fn same_text(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[async_trait]
impl ClubStore for InMemoryStore {
    async fn insert_member(&self, draft: &MemberDraft) -> ClubResult<Member> {
        let mut state = self.write()?;
        for field_id in draft.attributes.keys() {
            if !state.fields.contains_key(field_id) {
                return Err(ClubError::field_not_found(*field_id));
            }
        }
        state.last_member_id += 1;
        let member = Member {
            id: state.last_member_id,
            first_name: draft.first_name.clone(),
            last_name: draft.last_name.clone(),
            phone: draft.phone.clone(),
            email: draft.email.clone(),
            status: draft.status,
            year: draft.year,
            details: draft.details.clone(),
            attributes: draft
                .attributes
                .iter()
                .filter(|(_, v)| !v.trim().is_empty())
                .map(|(k, v)| (*k, v.clone()))
                .collect(),
            created_at: Utc::now(),
        };
        state.members.insert(member.id, member.clone());
        Ok(member)
    }

    async fn update_member(&self, id: MemberId, draft: &MemberDraft) -> ClubResult<Member> {
        let mut state = self.write()?;
        for field_id in draft.attributes.keys() {
            if !state.fields.contains_key(field_id) {
                return Err(ClubError::field_not_found(*field_id));
            }
        }
        let category = draft.category();
        let inapplicable: Vec<FieldId> = state
            .fields
            .values()
            .filter(|f| !f.applies_to(category))
            .map(|f| f.id)
            .collect();
        let member = state
            .members
            .get_mut(&id)
            .ok_or_else(|| ClubError::member_not_found(id))?;

        member.first_name = draft.first_name.clone();
        member.last_name = draft.last_name.clone();
        member.phone = draft.phone.clone();
        member.email = draft.email.clone();
        member.status = draft.status;
        member.year = draft.year;
        member.details = draft.details.clone();
        for (field_id, value) in &draft.attributes {
            if value.trim().is_empty() {
                member.attributes.remove(field_id);
            } else {
                member.attributes.insert(*field_id, value.clone());
            }
        }
        for field_id in inapplicable {
            member.attributes.remove(&field_id);
        }
        Ok(member.clone())
    }

    async fn delete_member(&self, id: MemberId) -> ClubResult<()> {
        let mut state = self.write()?;
        state
            .members
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ClubError::member_not_found(id))
    }

    async fn get_member(&self, id: MemberId) -> ClubResult<Option<Member>> {
        Ok(self.read()?.members.get(&id).cloned())
    }

    async fn list_members(&self, filter: &MemberFilter) -> ClubResult<Vec<Member>> {
        let state = self.read()?;
        let mut members: Vec<Member> = state
            .members
            .values()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();
        members.sort_by(|a, b| {
            a.last_name
                .cmp(&b.last_name)
                .then_with(|| a.first_name.cmp(&b.first_name))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(members)
    }

    async fn category_counts(&self) -> ClubResult<CategoryCounts> {
        let state = self.read()?;
        let mut counts = CategoryCounts::default();
        for member in state.members.values() {
            counts.add(member.category(), 1);
        }
        Ok(counts)
    }

    async fn find_member(
        &self,
        first_name: &str,
        last_name: &str,
        email: Option<&str>,
    ) -> ClubResult<Option<Member>> {
        let state = self.read()?;
        Ok(state
            .members
            .values()
            .find(|m| {
                same_text(&m.first_name, first_name)
                    && same_text(&m.last_name, last_name)
                    && match (m.email.as_deref(), email) {
                        (Some(a), Some(b)) => same_text(a, b),
                        (None, None) => true,
                        _ => false,
                    }
            })
            .cloned())
    }

    async fn set_attribute(
        &self,
        member_id: MemberId,
        field_id: FieldId,
        value: Option<&str>,
    ) -> ClubResult<()> {
        let mut state = self.write()?;
        if !state.fields.contains_key(&field_id) {
            return Err(ClubError::field_not_found(field_id));
        }
        let member = state
            .members
            .get_mut(&member_id)
            .ok_or_else(|| ClubError::member_not_found(member_id))?;
        match value {
            Some(value) => {
                member.attributes.insert(field_id, value.to_string());
            }
            None => {
                member.attributes.remove(&field_id);
            }
        }
        Ok(())
    }

    async fn insert_field(&self, field: &NewCustomField) -> ClubResult<CustomField> {
        let mut state = self.write()?;
        if state.fields.values().any(|f| f.key == field.key) {
            return Err(ClubError::validation(
                "label",
                format!("a field named '{}' already exists", field.label),
            ));
        }
        state.last_field_id += 1;
        let created = CustomField {
            id: state.last_field_id,
            key: field.key.clone(),
            label: field.label.clone(),
            categories: field.categories.clone(),
            created_at: Utc::now(),
        };
        state.fields.insert(created.id, created.clone());
        Ok(created)
    }

    async fn delete_field(&self, id: FieldId) -> ClubResult<()> {
        let mut state = self.write()?;
        if state.fields.remove(&id).is_none() {
            return Err(ClubError::field_not_found(id));
        }
        for member in state.members.values_mut() {
            member.attributes.remove(&id);
        }
        Ok(())
    }

    async fn list_fields(&self) -> ClubResult<Vec<CustomField>> {
        Ok(self.read()?.fields.values().cloned().collect())
    }

    async fn get_field(&self, id: FieldId) -> ClubResult<Option<CustomField>> {
        Ok(self.read()?.fields.get(&id).cloned())
    }

    async fn club_name(&self) -> ClubResult<Option<String>> {
        Ok(self.read()?.club_name.clone())
    }

    async fn set_club_name(&self, name: &str) -> ClubResult<()> {
        self.write()?.club_name = Some(name.to_string());
        Ok(())
    }

    async fn ping(&self) -> ClubResult<()> {
        self.check_online()
    }
}
