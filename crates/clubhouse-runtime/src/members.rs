//! Member CRUD and queries.

use clubhouse_core::{
    Category, CategoryCounts, ClubError, ClubResult, CustomField, FieldId, Member, MemberDraft,
    MemberFilter, MemberId, MemberPatch,
};
use std::collections::BTreeMap;

use crate::store::SharedStore;

/// Validating front for member rows.
#[derive(Clone)]
pub struct MemberRepository {
    store: SharedStore,
}

impl MemberRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Validate and insert a member with its initial attribute values.
    pub async fn create(&self, draft: MemberDraft) -> ClubResult<Member> {
        let draft = draft.normalized();
        draft.validate()?;
        let fields = self.store.list_fields().await?;
        check_attributes(&fields, draft.category(), &draft.attributes)?;

        let member = self.store.insert_member(&draft).await?;
        tracing::info!(
            member_id = member.id,
            category = member.category().slug(),
            attributes = member.attributes.len(),
            "Member created"
        );
        Ok(member)
    }

    /// Apply `patch` to a stored member.
    ///
    /// When the category changes, values of fields that no longer apply are
    /// dropped in the same write.
    pub async fn update(&self, member_id: MemberId, patch: MemberPatch) -> ClubResult<Member> {
        let current = self.get(member_id).await?;
        let draft = patch.apply_to(&current).normalized();
        draft.validate()?;
        let fields = self.store.list_fields().await?;
        check_attributes(&fields, draft.category(), &draft.attributes)?;

        let member = self.store.update_member(member_id, &draft).await?;
        if current.category() != member.category() {
            tracing::info!(
                member_id,
                from = current.category().slug(),
                to = member.category().slug(),
                "Member changed category"
            );
        } else {
            tracing::debug!(member_id, "Member updated");
        }
        Ok(member)
    }

    pub async fn delete(&self, member_id: MemberId) -> ClubResult<()> {
        self.store.delete_member(member_id).await?;
        tracing::info!(member_id, "Member deleted");
        Ok(())
    }

    pub async fn get(&self, member_id: MemberId) -> ClubResult<Member> {
        self.store
            .get_member(member_id)
            .await?
            .ok_or_else(|| ClubError::member_not_found(member_id))
    }

    /// Members matching `filter`, ordered by last name, first name, id.
    pub async fn list(&self, filter: MemberFilter) -> ClubResult<Vec<Member>> {
        self.store.list_members(&filter.normalized()).await
    }

    pub async fn category_counts(&self) -> ClubResult<CategoryCounts> {
        self.store.category_counts().await
    }

    /// Existing member with the same names and email, ignoring case.
    pub async fn find_duplicate(
        &self,
        first_name: &str,
        last_name: &str,
        email: Option<&str>,
    ) -> ClubResult<Option<Member>> {
        let email = email.map(str::trim).filter(|e| !e.is_empty());
        self.store
            .find_member(first_name.trim(), last_name.trim(), email)
            .await
    }
}

/// Check that every non-empty value targets an existing field applicable to
/// `category`.
pub fn check_attributes(
    fields: &[CustomField],
    category: Category,
    attributes: &BTreeMap<FieldId, String>,
) -> ClubResult<()> {
    for (field_id, value) in attributes {
        if value.trim().is_empty() {
            continue;
        }
        let field = fields
            .iter()
            .find(|f| f.id == *field_id)
            .ok_or_else(|| ClubError::field_not_found(*field_id))?;
        if !field.applies_to(category) {
            return Err(ClubError::not_applicable());
        }
    }
    Ok(())
}
