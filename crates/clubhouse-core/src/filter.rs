//! Conjunctive member filters.

use serde::{Deserialize, Serialize};

use crate::model::{Category, FieldId, Member, MemberStatus};

/// Filter options for member listings. Every option that is set must hold;
/// unset options are no-ops.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberFilter {
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub status: Option<MemberStatus>,
    /// Inclusive lower bound on `year`.
    #[serde(default)]
    pub year_from: Option<i32>,
    /// Inclusive upper bound on `year`.
    #[serde(default)]
    pub year_to: Option<i32>,
    /// Case-insensitive substring of first or last name.
    #[serde(default)]
    pub name_contains: Option<String>,
    /// Case-insensitive substring of the email address.
    #[serde(default)]
    pub email_contains: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AttributePredicate>,
}

/// A predicate over one custom field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributePredicate {
    pub field_id: FieldId,
    pub condition: AttributeCondition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op", content = "value")]
pub enum AttributeCondition {
    /// Value equals the operand, ignoring case and surrounding whitespace.
    Equals(String),
    /// Value contains the operand, ignoring case.
    Contains(String),
    /// Any value is stored.
    IsSet,
}

impl MemberFilter {
    pub fn for_category(category: Category) -> Self {
        Self {
            category: Some(category),
            ..Default::default()
        }
    }

    /// Trim text options and drop the blank ones.
    pub fn normalized(self) -> Self {
        Self {
            name_contains: blank_to_none(self.name_contains),
            email_contains: blank_to_none(self.email_contains),
            attributes: self
                .attributes
                .into_iter()
                .filter_map(AttributePredicate::normalized)
                .collect(),
            ..self
        }
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.status.is_none()
            && self.year_from.is_none()
            && self.year_to.is_none()
            && self.name_contains.is_none()
            && self.email_contains.is_none()
            && self.attributes.is_empty()
    }

    /// Evaluate the filter against a loaded member.
    ///
    /// Storage adapters that push filtering into SQL must agree with this
    /// function.
    pub fn matches(&self, member: &Member) -> bool {
        if let Some(category) = self.category
            && member.category() != category
        {
            return false;
        }
        if let Some(status) = self.status
            && member.status != status
        {
            return false;
        }
        if self.year_from.is_some() || self.year_to.is_some() {
            let Some(year) = member.year else {
                return false;
            };
            if self.year_from.is_some_and(|from| year < from)
                || self.year_to.is_some_and(|to| year > to)
            {
                return false;
            }
        }
        if let Some(needle) = self.name_contains.as_deref() {
            let needle = needle.to_lowercase();
            if !member.first_name.to_lowercase().contains(&needle)
                && !member.last_name.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if let Some(needle) = self.email_contains.as_deref() {
            let needle = needle.to_lowercase();
            let hit = member
                .email
                .as_deref()
                .is_some_and(|email| email.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        self.attributes
            .iter()
            .all(|p| p.matches(member.attribute(p.field_id)))
    }
}

impl AttributePredicate {
    pub fn new(field_id: FieldId, condition: AttributeCondition) -> Self {
        Self {
            field_id,
            condition,
        }
    }

    fn normalized(self) -> Option<Self> {
        let condition = match self.condition {
            AttributeCondition::Equals(v) => AttributeCondition::Equals(non_blank(v)?),
            AttributeCondition::Contains(v) => AttributeCondition::Contains(non_blank(v)?),
            AttributeCondition::IsSet => AttributeCondition::IsSet,
        };
        Some(Self { condition, ..self })
    }

    pub fn matches(&self, value: Option<&str>) -> bool {
        let Some(value) = value else {
            return false;
        };
        match &self.condition {
            AttributeCondition::Equals(expected) => {
                value.trim().to_lowercase() == expected.trim().to_lowercase()
            }
            AttributeCondition::Contains(needle) => {
                value.to_lowercase().contains(&needle.to_lowercase())
            }
            AttributeCondition::IsSet => !value.trim().is_empty(),
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.and_then(non_blank)
}
