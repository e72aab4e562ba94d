//! The storage seam.
//!
//! [`ClubStore`] is the single boundary between the services in this crate
//! and the database. Each method is one unit of work: implementations run
//! it inside one transaction, so a failed call leaves no partial rows.

use async_trait::async_trait;
use clubhouse_core::{
    CategoryCounts, ClubResult, CustomField, FieldId, Member, MemberDraft, MemberFilter,
    MemberId, NewCustomField,
};
use std::sync::Arc;

/// Persistence operations over the four tables.
///
/// Implementations do not check custom field applicability on their own;
/// [`crate::MemberRepository`] and [`crate::CustomFieldEngine`] do that
/// before calling in. They do keep the attribute invariant on category
/// change (see [`ClubStore::update_member`]).
#[async_trait]
pub trait ClubStore: Send + Sync {
    /// Insert a member and its non-empty attribute values.
    async fn insert_member(&self, draft: &MemberDraft) -> ClubResult<Member>;

    /// Overwrite the scalar columns of a member and apply the attribute
    /// changes in `draft.attributes` (empty value clears). Attribute values
    /// of fields that do not apply to the draft's category are removed.
    ///
    /// Returns `NotFound` if the member does not exist.
    async fn update_member(&self, id: MemberId, draft: &MemberDraft) -> ClubResult<Member>;

    /// Remove a member and its attribute values.
    async fn delete_member(&self, id: MemberId) -> ClubResult<()>;

    async fn get_member(&self, id: MemberId) -> ClubResult<Option<Member>>;

    /// Members matching `filter`, ordered by last name, first name, id.
    async fn list_members(&self, filter: &MemberFilter) -> ClubResult<Vec<Member>>;

    async fn category_counts(&self) -> ClubResult<CategoryCounts>;

    /// Member with the same names and email, compared case-insensitively.
    /// A missing email only matches a missing email.
    async fn find_member(
        &self,
        first_name: &str,
        last_name: &str,
        email: Option<&str>,
    ) -> ClubResult<Option<Member>>;

    /// Upsert one attribute value; `None` deletes it.
    async fn set_attribute(
        &self,
        member_id: MemberId,
        field_id: FieldId,
        value: Option<&str>,
    ) -> ClubResult<()>;

    /// Insert a field definition. A duplicate key is a validation error on
    /// `label`.
    async fn insert_field(&self, field: &NewCustomField) -> ClubResult<CustomField>;

    /// Remove a field definition and every value stored for it.
    async fn delete_field(&self, id: FieldId) -> ClubResult<()>;

    /// All field definitions in creation order.
    async fn list_fields(&self) -> ClubResult<Vec<CustomField>>;

    async fn get_field(&self, id: FieldId) -> ClubResult<Option<CustomField>>;

    async fn club_name(&self) -> ClubResult<Option<String>>;

    /// Replace the singleton settings row.
    async fn set_club_name(&self, name: &str) -> ClubResult<()>;

    /// Cheap round trip used by health checks.
    async fn ping(&self) -> ClubResult<()>;
}

/// Shared handle passed to every service.
pub type SharedStore = Arc<dyn ClubStore>;
