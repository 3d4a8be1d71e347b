//! # Location view model
//!
//! [`LocationViewModel`] owns the location list a screen shows and the
//! loading/error flags around it. Screens read a [`LocationsState`] snapshot
//! or subscribe to changes; they change it only by calling intent methods.
//!
//! ## Request lifecycle
//!
//! Every intent takes a fresh generation number and sets `is_loading`. When
//! the repository answers, the result is applied only if no newer request has
//! started since; otherwise it is dropped whole (data, error and loading flag),
//! and the newer request decides the final state.
//!
//! | Intent | On success |
//! |--------|-----------|
//! | `load_*` | replaces `locations` and `has_more`, remembered as the last read |
//! | [`add_location`](LocationViewModel::add_location) | re-runs the last read (or "all") |
//! | [`delete_location`](LocationViewModel::delete_location) | re-runs the last read (or "all") |
//! | [`load_more`](LocationViewModel::load_more) | appends the next page of the last read |
//!
//! [`clear_locations`](LocationViewModel::clear_locations) empties the list,
//! forgets the last read and invalidates every request still in flight.
//!
//! Failures set `error_message` to the error's text and leave `locations` as
//! they were. A later success does not clear the message; call
//! [`clear_error`](LocationViewModel::clear_error).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use store::{
    DateRange, DocumentStore, Listing, LocationRecord, LocationRepository, Page, StoreError,
    Visibility,
};
use tokio::sync::watch;
use tracing::{debug, warn};

/// What a location screen renders.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LocationsState {
    pub locations: Vec<LocationRecord>,
    pub is_loading: bool,
    pub error_message: Option<String>,
    pub has_more: bool,
}

/// A read intent, kept so writes can refresh the list the user is looking at.
#[derive(Clone, Debug, PartialEq)]
enum ReadRequest {
    All(Page),
    User(String, Page),
    UserRange(String, DateRange, Page),
    UserRangeVisibility(String, DateRange, Visibility, Page),
    PublicRange(DateRange, Page),
}

impl ReadRequest {
    fn page(&self) -> Page {
        match self {
            ReadRequest::All(page)
            | ReadRequest::User(_, page)
            | ReadRequest::UserRange(_, _, page)
            | ReadRequest::UserRangeVisibility(_, _, _, page)
            | ReadRequest::PublicRange(_, page) => *page,
        }
    }

    fn at(mut self, next: Page) -> Self {
        match &mut self {
            ReadRequest::All(page)
            | ReadRequest::User(_, page)
            | ReadRequest::UserRange(_, _, page)
            | ReadRequest::UserRangeVisibility(_, _, _, page)
            | ReadRequest::PublicRange(_, page) => *page = next,
        }
        self
    }
}

pub struct LocationViewModel<S: DocumentStore> {
    repo: LocationRepository<S>,
    state: watch::Sender<LocationsState>,
    generation: AtomicU64,
    last_read: Mutex<Option<ReadRequest>>,
}

impl<S: DocumentStore> LocationViewModel<S> {
    pub fn new(repo: LocationRepository<S>) -> Self {
        let (state, _) = watch::channel(LocationsState::default());
        Self {
            repo,
            state,
            generation: AtomicU64::new(0),
            last_read: Mutex::new(None),
        }
    }

    pub fn repository(&self) -> &LocationRepository<S> {
        &self.repo
    }

    /// Current state snapshot.
    pub fn state(&self) -> LocationsState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<LocationsState> {
        self.state.subscribe()
    }

    pub async fn load_all_locations(&self) {
        self.read(ReadRequest::All(Page::first())).await
    }

    pub async fn load_user_locations(&self, user_id: &str) {
        self.read(ReadRequest::User(user_id.to_string(), Page::first()))
            .await
    }

    pub async fn load_user_locations_by_date_range(&self, user_id: &str, range: DateRange) {
        self.read(ReadRequest::UserRange(user_id.to_string(), range, Page::first()))
            .await
    }

    pub async fn load_user_locations_by_date_range_and_visibility(
        &self,
        user_id: &str,
        range: DateRange,
        visibility: Visibility,
    ) {
        self.read(ReadRequest::UserRangeVisibility(
            user_id.to_string(),
            range,
            visibility,
            Page::first(),
        ))
        .await
    }

    pub async fn load_public_locations_by_date_range(&self, range: DateRange) {
        self.read(ReadRequest::PublicRange(range, Page::first()))
            .await
    }

    /// Fetch the rows after the loaded ones for the last read and append them.
    /// Does nothing when the last read reported no more rows.
    pub async fn load_more(&self) {
        let (loaded, has_more) = {
            let state = self.state.borrow();
            (state.locations.len(), state.has_more)
        };
        let Some(request) = self.remembered() else {
            return;
        };
        if !has_more {
            return;
        }

        let next = request.page().next(loaded);
        let generation = self.begin();
        let result = self.fetch(&request.at(next)).await;
        self.apply(generation, result, true);
    }

    /// Save a new record. Returns its id, or `None` with `error_message` set.
    pub async fn add_location(&self, record: &LocationRecord) -> Option<String> {
        let generation = self.begin();
        match self.repo.add_location(record).await {
            Ok(id) => {
                self.reload().await;
                Some(id)
            }
            Err(e) => {
                self.fail(generation, e);
                None
            }
        }
    }

    /// Delete a record by id. Returns whether the store accepted it.
    pub async fn delete_location(&self, id: &str) -> bool {
        let generation = self.begin();
        match self.repo.delete_location(id).await {
            Ok(()) => {
                self.reload().await;
                true
            }
            Err(e) => {
                self.fail(generation, e);
                false
            }
        }
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|s| s.error_message = None);
    }

    /// Empty the list and forget the last read, e.g. on logout. Requests
    /// still in flight are discarded when they answer.
    pub fn clear_locations(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_read.lock() {
            *last = None;
        }
        self.state.send_modify(|s| {
            s.locations.clear();
            s.has_more = false;
            s.is_loading = false;
        });
    }

    /// Replace the list with an error raised outside the repository.
    pub fn show_error(&self, error: StoreError) {
        warn!(error = %error, "location list unavailable");
        self.clear_locations();
        self.state
            .send_modify(|s| s.error_message = Some(error.to_string()));
    }

    async fn reload(&self) {
        let request = self
            .remembered()
            .unwrap_or(ReadRequest::All(Page::first()));
        self.read(request).await
    }

    async fn read(&self, request: ReadRequest) {
        let generation = self.begin();
        self.remember(&request);
        let result = self.fetch(&request).await;
        self.apply(generation, result, false);
    }

    fn apply(&self, generation: u64, result: Result<Listing, StoreError>, append: bool) {
        if !self.is_current(generation) {
            warn!(generation, "discarding stale location response");
            return;
        }
        match result {
            Ok(listing) => {
                debug!(generation, count = listing.locations.len(), append, "locations loaded");
                self.state.send_modify(|s| {
                    if append {
                        s.locations.extend(listing.locations);
                    } else {
                        s.locations = listing.locations;
                    }
                    s.has_more = listing.has_more;
                    s.is_loading = false;
                });
            }
            Err(e) => self.fail(generation, e),
        }
    }

    async fn fetch(&self, request: &ReadRequest) -> Result<Listing, StoreError> {
        match request {
            ReadRequest::All(page) => self.repo.get_all_locations(*page).await,
            ReadRequest::User(user_id, page) => self.repo.get_user_locations(user_id, *page).await,
            ReadRequest::UserRange(user_id, range, page) => {
                self.repo
                    .get_user_locations_by_date_range(user_id, *range, *page)
                    .await
            }
            ReadRequest::UserRangeVisibility(user_id, range, visibility, page) => {
                self.repo
                    .get_user_locations_by_date_range_and_visibility(
                        user_id,
                        *range,
                        *visibility,
                        *page,
                    )
                    .await
            }
            ReadRequest::PublicRange(range, page) => {
                self.repo
                    .get_public_locations_by_date_range(*range, *page)
                    .await
            }
        }
    }

    fn begin(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|s| s.is_loading = true);
        generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn fail(&self, generation: u64, error: StoreError) {
        if !self.is_current(generation) {
            warn!(generation, error = %error, "discarding stale location error");
            return;
        }
        warn!(generation, error = %error, "location request failed");
        self.state.send_modify(|s| {
            s.error_message = Some(error.to_string());
            s.is_loading = false;
        });
    }

    fn remember(&self, request: &ReadRequest) {
        if let Ok(mut last) = self.last_read.lock() {
            *last = Some(request.clone());
        }
    }

    fn remembered(&self) -> Option<ReadRequest> {
        self.last_read.lock().ok().and_then(|last| last.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::{Document, MemoryStore, Query, Snapshot};
    use tokio::sync::oneshot;

    const MAR_5: i64 = 1_709_596_800_000;
    const DAY: i64 = 86_400_000;

    fn vm() -> LocationViewModel<MemoryStore> {
        LocationViewModel::new(LocationRepository::new(MemoryStore::new()))
    }

    fn record(user: &str, name: &str, at: i64) -> LocationRecord {
        LocationRecord::new(user, name, -33.92, 18.42).added_at(at)
    }

    #[tokio::test]
    async fn test_load_replaces_list() {
        let vm = vm();
        vm.repository().add_location(&record("alice", "Muizenberg", MAR_5)).await.unwrap();
        vm.repository().add_location(&record("bob", "Kalk Bay", MAR_5)).await.unwrap();

        vm.load_user_locations("alice").await;
        let state = vm.state();
        assert_eq!(state.locations.len(), 1);
        assert_eq!(state.locations[0].name, "Muizenberg");
        assert!(!state.is_loading);
        assert!(state.error_message.is_none());

        vm.load_all_locations().await;
        assert_eq!(vm.state().locations.len(), 2);
    }

    #[tokio::test]
    async fn test_add_reloads_last_query() {
        let vm = vm();
        vm.repository().add_location(&record("alice", "Old", MAR_5)).await.unwrap();
        vm.repository().add_location(&record("bob", "Other", MAR_5)).await.unwrap();
        let march = DateRange::new(MAR_5 - DAY, MAR_5 + DAY).unwrap();
        vm.load_user_locations_by_date_range("alice", march).await;

        let id = vm.add_location(&record("alice", "New", MAR_5 + 1)).await.unwrap();
        let names: Vec<_> = vm.state().locations.iter().map(|l| l.name.clone()).collect();
        assert_eq!(names, ["New", "Old"]);

        assert!(vm.delete_location(&id).await);
        assert_eq!(vm.state().locations.len(), 1);
    }

    #[tokio::test]
    async fn test_write_without_prior_read_loads_all() {
        let vm = vm();
        vm.repository().add_location(&record("bob", "Other", MAR_5)).await.unwrap();
        vm.add_location(&record("alice", "Mine", MAR_5 + 1)).await.unwrap();
        assert_eq!(vm.state().locations.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_record_sets_error() {
        let vm = vm();
        let id = vm.add_location(&record("alice", "  ", MAR_5)).await;
        assert!(id.is_none());
        let state = vm.state();
        assert_eq!(state.error_message.as_deref(), Some("Please enter a location name"));
        assert!(!state.is_loading);

        vm.clear_error();
        assert!(vm.state().error_message.is_none());
    }

    #[tokio::test]
    async fn test_visibility_and_public_loads() {
        let vm = vm();
        let repo = vm.repository();
        repo.add_location(&record("alice", "Shared", MAR_5)).await.unwrap();
        repo.add_location(&record("alice", "Secret", MAR_5).with_visibility(Visibility::Private))
            .await
            .unwrap();
        repo.add_location(&record("bob", "Bob's", MAR_5)).await.unwrap();
        let range = DateRange::new(MAR_5, MAR_5).unwrap();

        vm.load_user_locations_by_date_range_and_visibility("alice", range, Visibility::Private)
            .await;
        assert_eq!(vm.state().locations[0].name, "Secret");
        assert_eq!(vm.state().locations.len(), 1);

        vm.load_public_locations_by_date_range(range).await;
        let state = vm.state();
        assert_eq!(state.locations.len(), 2);
        assert!(state.locations.iter().all(|l| l.is_public()));
    }

    #[tokio::test]
    async fn test_clear_locations() {
        let vm = vm();
        vm.repository().add_location(&record("alice", "A", MAR_5)).await.unwrap();
        vm.load_all_locations().await;
        vm.clear_locations();
        assert!(vm.state().locations.is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let vm = vm();
        let mut rx = vm.subscribe();
        vm.repository().add_location(&record("alice", "A", MAR_5)).await.unwrap();
        vm.load_all_locations().await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().locations.len(), 1);
    }

    #[tokio::test]
    async fn test_load_more_pages_through_everything() {
        let limits = store::config::QueryConfig {
            default_limit: 2,
            max_limit: 500,
        };
        let vm = LocationViewModel::new(LocationRepository::with_limits(MemoryStore::new(), limits));
        for i in 0..5 {
            vm.repository()
                .add_location(&record("alice", &format!("Stop {i}"), MAR_5 + i))
                .await
                .unwrap();
        }
        vm.repository().add_location(&record("bob", "Elsewhere", MAR_5)).await.unwrap();

        vm.load_user_locations("alice").await;
        assert_eq!(vm.state().locations.len(), 2);
        assert!(vm.state().has_more);

        vm.load_more().await;
        assert_eq!(vm.state().locations.len(), 4);
        assert!(vm.state().has_more);

        vm.load_more().await;
        let state = vm.state();
        let names: Vec<_> = state.locations.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Stop 4", "Stop 3", "Stop 2", "Stop 1", "Stop 0"]);
        assert!(!state.has_more);
        assert!(!state.is_loading);

        vm.load_more().await;
        assert_eq!(vm.state().locations.len(), 5);
    }

    #[tokio::test]
    async fn test_write_after_clear_does_not_rerun_previous_users_read() {
        let vm = vm();
        vm.repository().add_location(&record("alice", "Alice home", MAR_5)).await.unwrap();
        vm.load_user_locations("alice").await;
        vm.clear_locations();
        assert!(vm.state().locations.is_empty());

        vm.add_location(&record("bob", "Bob home", MAR_5 + 1)).await.unwrap();
        let state = vm.state();
        assert!(state.locations.iter().any(|l| l.name == "Bob home"));
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_show_error_replaces_list() {
        let vm = vm();
        vm.repository().add_location(&record("alice", "A", MAR_5)).await.unwrap();
        vm.load_all_locations().await;

        vm.show_error(StoreError::InvalidDate("no such local time".into()));
        let state = vm.state();
        assert!(state.locations.is_empty());
        assert_eq!(state.error_message.as_deref(), Some("invalid date: no such local time"));
        assert!(!state.is_loading);
    }

    /// Holds the first query until the gate opens.
    struct GatedStore {
        inner: MemoryStore,
        gate: Mutex<Option<oneshot::Receiver<()>>>,
    }

    impl DocumentStore for GatedStore {
        fn generate_id(&self) -> String {
            self.inner.generate_id()
        }

        async fn set(&self, collection: &str, id: &str, doc: Document) -> Result<(), StoreError> {
            self.inner.set(collection, id, doc).await
        }

        async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
            self.inner.get(collection, id).await
        }

        async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
            self.inner.delete(collection, id).await
        }

        async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Snapshot>, StoreError> {
            let gate = self.gate.lock().unwrap().take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            self.inner.query(collection, query).await
        }
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let (tx, rx) = oneshot::channel();
        let store = GatedStore {
            inner: MemoryStore::new(),
            gate: Mutex::new(Some(rx)),
        };
        let vm = LocationViewModel::new(LocationRepository::new(store));
        vm.repository().add_location(&record("alice", "Alice's", MAR_5)).await.unwrap();
        vm.repository().add_location(&record("bob", "Bob's", MAR_5)).await.unwrap();

        // alice's query is issued first but answers last
        tokio::join!(vm.load_user_locations("alice"), async {
            vm.load_user_locations("bob").await;
            tx.send(()).unwrap();
        });

        let state = vm.state();
        assert_eq!(state.locations.len(), 1);
        assert_eq!(state.locations[0].user_id, "bob");
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_clear_discards_read_in_flight() {
        let (tx, rx) = oneshot::channel();
        let store = GatedStore {
            inner: MemoryStore::new(),
            gate: Mutex::new(Some(rx)),
        };
        let vm = LocationViewModel::new(LocationRepository::new(store));
        vm.repository().add_location(&record("alice", "Alice's", MAR_5)).await.unwrap();

        tokio::join!(vm.load_user_locations("alice"), async {
            vm.clear_locations();
            tx.send(()).unwrap();
        });

        let state = vm.state();
        assert!(state.locations.is_empty());
        assert!(!state.is_loading);
    }
}
