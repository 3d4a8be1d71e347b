//! Screen-facing state for GeoQuest: view models, the logbook filter and the
//! position tracker, wired to one document store.

use std::sync::Arc;

use api::{GeoQuestConfig, UserRepository};
use store::{DocumentStore, LocationRepository, StoreError};

mod repo;
pub use repo::{make_store, AppStore};

pub mod location_vm;
pub use location_vm::{LocationViewModel, LocationsState};

pub mod user_vm;
pub use user_vm::{UserState, UserViewModel};

pub mod logbook;
pub use logbook::{DateFilter, LogbookController};

pub mod tracker;
pub use tracker::{Fix, LocationTracker};

/// Everything one app instance holds.
pub struct App<S: DocumentStore> {
    pub users: UserViewModel<S>,
    pub locations: Arc<LocationViewModel<S>>,
    pub logbook: LogbookController<S>,
    pub tracker: LocationTracker,
}

impl App<AppStore> {
    /// Build from settings, opening the configured store.
    pub fn from_config(config: &GeoQuestConfig) -> Result<Self, StoreError> {
        Self::with_store(make_store(&config.store), config)
    }
}

impl<S: DocumentStore + Clone> App<S> {
    pub fn with_store(store: S, config: &GeoQuestConfig) -> Result<Self, StoreError> {
        let week_start = config.logbook.week_start()?;
        let locations = Arc::new(LocationViewModel::new(LocationRepository::with_limits(
            store.clone(),
            config.query,
        )));
        Ok(Self {
            users: UserViewModel::new(UserRepository::with_config(store, config.auth.clone())),
            logbook: LogbookController::new(Arc::clone(&locations), week_start),
            locations,
            tracker: LocationTracker::new(config.tracking),
        })
    }

    /// Hand the current session to the logbook after a sign-in or sign-out.
    pub async fn sync_session(&mut self) {
        let session = self.users.session();
        if session.is_none() {
            self.locations.clear_locations();
        }
        self.logbook.set_session(session).await;
    }
}
