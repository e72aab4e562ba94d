//! Custom field definitions and their per-member values.

use clubhouse_core::{
    Category, ClubError, ClubResult, CustomField, FieldId, MemberId, NewCustomField,
};
use std::collections::BTreeSet;

use crate::store::SharedStore;

/// Defines fields, scopes them to categories and stores their values.
#[derive(Clone)]
pub struct CustomFieldEngine {
    store: SharedStore,
}

impl CustomFieldEngine {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Create a field applicable to `categories`.
    ///
    /// Fails with a validation error when the label is blank, the category
    /// set is empty, or a field with the same normalised label exists.
    pub async fn define_field(
        &self,
        label: &str,
        categories: BTreeSet<Category>,
    ) -> ClubResult<CustomField> {
        let new_field = NewCustomField::new(label, categories)?;
        let field = self.store.insert_field(&new_field).await?;
        tracing::info!(
            field_id = field.id,
            label = %field.label,
            categories = %field.categories_label(),
            "Custom field defined"
        );
        Ok(field)
    }

    /// Remove a field together with every value stored for it.
    pub async fn delete_field(&self, field_id: FieldId) -> ClubResult<()> {
        self.store.delete_field(field_id).await?;
        tracing::info!(field_id, "Custom field deleted");
        Ok(())
    }

    pub async fn list_fields(&self) -> ClubResult<Vec<CustomField>> {
        self.store.list_fields().await
    }

    pub async fn get_field(&self, field_id: FieldId) -> ClubResult<CustomField> {
        self.store
            .get_field(field_id)
            .await?
            .ok_or_else(|| ClubError::field_not_found(field_id))
    }

    /// Fields applicable to `category`, in creation order.
    pub async fn fields_for_category(&self, category: Category) -> ClubResult<Vec<CustomField>> {
        Ok(self
            .store
            .list_fields()
            .await?
            .into_iter()
            .filter(|f| f.applies_to(category))
            .collect())
    }

    /// Fields applicable to at least one of `categories`, in creation order.
    pub async fn fields_for_categories(
        &self,
        categories: &BTreeSet<Category>,
    ) -> ClubResult<Vec<CustomField>> {
        Ok(self
            .store
            .list_fields()
            .await?
            .into_iter()
            .filter(|f| f.categories.iter().any(|c| categories.contains(c)))
            .collect())
    }

    /// Store one value. A blank value clears the attribute.
    pub async fn set_value(
        &self,
        member_id: MemberId,
        field_id: FieldId,
        value: &str,
    ) -> ClubResult<()> {
        let member = self
            .store
            .get_member(member_id)
            .await?
            .ok_or_else(|| ClubError::member_not_found(member_id))?;
        let field = self.get_field(field_id).await?;
        if !field.applies_to(member.category()) {
            return Err(ClubError::not_applicable());
        }

        let value = value.trim();
        let value = (!value.is_empty()).then_some(value);
        self.store.set_attribute(member_id, field_id, value).await?;
        tracing::debug!(member_id, field_id, cleared = value.is_none(), "Attribute stored");
        Ok(())
    }
}
