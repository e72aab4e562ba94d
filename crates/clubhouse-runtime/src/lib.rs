//! # clubhouse-runtime
//!
//! Services that sit between the presentation layer and storage:
//!
//! - [`ClubStore`]: the storage seam, implemented by the Postgres adapter
//!   and by [`InMemoryStore`]
//! - [`CustomFieldEngine`]: field definitions scoped to categories
//! - [`MemberRepository`]: validated member CRUD, filtering and counts
//! - [`SettingsService`]: the club name
//!
//! Services are cheap to clone; they share one `Arc<dyn ClubStore>`.

pub mod fields;
pub mod members;
pub mod memory;
pub mod settings;
pub mod store;

pub use fields::CustomFieldEngine;
pub use members::{MemberRepository, check_attributes};
pub use memory::InMemoryStore;
pub use settings::SettingsService;
pub use store::{ClubStore, SharedStore};

/// The three services built over one store.
#[derive(Clone)]
pub struct Services {
    pub members: MemberRepository,
    pub fields: CustomFieldEngine,
    pub settings: SettingsService,
    pub store: SharedStore,
}

impl Services {
    pub fn new(store: SharedStore) -> Self {
        Self {
            members: MemberRepository::new(store.clone()),
            fields: CustomFieldEngine::new(store.clone()),
            settings: SettingsService::new(store.clone()),
            store,
        }
    }
}
