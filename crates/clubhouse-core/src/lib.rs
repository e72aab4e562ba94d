//! # clubhouse-core
//!
//! Shared domain model for the Clubhouse membership manager.
//!
//! This crate holds everything the other crates agree on:
//! - member records, keyed by [`Category`] through [`CategoryDetails`]
//! - custom field definitions and their applicable categories
//! - the [`MemberFilter`] used by list queries and exports
//! - the [`ClubError`] taxonomy surfaced by every operation
//! - YAML/environment configuration ([`ClubConfig`])

pub mod config;
pub mod error;
pub mod filter;
pub mod model;

pub use config::{ClubConfig, ConfigError, DashboardConfig, LoggingConfig, UpstreamConfig};
pub use error::{ClubError, ClubResult, FIELD_NOT_APPLICABLE};
pub use filter::{AttributeCondition, AttributePredicate, MemberFilter};
pub use model::{
    Category, CategoryCounts, CategoryDetails, CustomField, FieldId, Member, MemberDraft,
    MemberId, MemberPatch, MemberStatus, Month, NewCustomField,
};
