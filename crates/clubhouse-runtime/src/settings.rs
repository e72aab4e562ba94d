//! Club-wide settings.

use clubhouse_core::{ClubError, ClubResult};

use crate::store::SharedStore;

/// Longest accepted club name.
pub const MAX_CLUB_NAME_LEN: usize = 120;

#[derive(Clone)]
pub struct SettingsService {
    store: SharedStore,
}

impl SettingsService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// The club name, or `None` before first-run setup.
    pub async fn club_name(&self) -> ClubResult<Option<String>> {
        Ok(self
            .store
            .club_name()
            .await?
            .filter(|name| !name.trim().is_empty()))
    }

    pub async fn set_club_name(&self, name: &str) -> ClubResult<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClubError::validation("club_name", "club name is required"));
        }
        if name.chars().count() > MAX_CLUB_NAME_LEN {
            return Err(ClubError::validation(
                "club_name",
                format!("club name must be at most {} characters", MAX_CLUB_NAME_LEN),
            ));
        }
        self.store.set_club_name(name).await?;
        tracing::info!(club_name = name, "Club name saved");
        Ok(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_club_name_lifecycle() {
        let settings = SettingsService::new(Arc::new(InMemoryStore::new()));
        assert_eq!(settings.club_name().await.unwrap(), None);

        let err = settings.set_club_name("   ").await.unwrap_err();
        assert_eq!(err.field(), Some("club_name"));

        settings.set_club_name(" Athens Bridge Club ").await.unwrap();
        settings.set_club_name("Όμιλος Μπριτζ Αθηνών").await.unwrap();
        assert_eq!(
            settings.club_name().await.unwrap().as_deref(),
            Some("Όμιλος Μπριτζ Αθηνών")
        );
    }
}
