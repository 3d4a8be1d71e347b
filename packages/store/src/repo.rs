//! # Repository: typed location queries on an abstract document store
//!
//! This module is the core of GeoQuest's storage layer. [`LocationRepository`]
//! turns typed query intents (by owner, by date window, by visibility, and
//! their combinations) into [`Query`]s against a [`DocumentStore`], so the same
//! logic runs against the in-memory store ([`crate::MemoryStore`]), the
//! filesystem store ([`crate::FileStore`]), or any future backend.
//!
//! ## [`DocumentStore`] trait
//!
//! An async interface over named collections of JSON documents: `set`/`get`/
//! `delete` by id, `query` with a [`Query`], and `generate_id` to reserve a key
//! for a new document. Deleting a missing id is not an error.
//!
//! ## Read path
//!
//! | Method | Predicates |
//! |--------|-----------|
//! | [`get_all_locations`](LocationRepository::get_all_locations) | none |
//! | [`get_user_locations`](LocationRepository::get_user_locations) | `userId =` |
//! | [`get_user_locations_by_date_range`](LocationRepository::get_user_locations_by_date_range) | `userId =`, `dateAdded` in range |
//! | [`get_user_locations_by_date_range_and_visibility`](LocationRepository::get_user_locations_by_date_range_and_visibility) | as above, `visibility =` |
//! | [`get_public_locations_by_date_range`](LocationRepository::get_public_locations_by_date_range) | `visibility = public`, `dateAdded` in range |
//! | [`get_user_locations_by_date`](LocationRepository::get_user_locations_by_date) | a calendar day turned into a range |
//!
//! Every query ends with a descending sort on `dateAdded` and is windowed by a
//! [`Page`]. The limit falls back to [`QueryConfig::default_limit`] and is
//! clamped to [`QueryConfig::max_limit`]; one extra row is fetched to fill
//! [`Listing::has_more`].
//!
//! ## Write path
//!
//! [`add_location`](LocationRepository::add_location) validates the record,
//! reserves an id, and writes the record with that id. Records are never
//! updated in place; [`delete_location`](LocationRepository::delete_location)
//! removes one by id.

use std::future::Future;

use chrono::{Local, TimeZone};
use tracing::{debug, info};

use crate::config::QueryConfig;
use crate::dates::{parse_calendar_date, DateRange};
use crate::document::{Direction, Document, Query, Snapshot};
use crate::error::StoreError;
use crate::models::{LocationRecord, Visibility};

/// Collection holding [`LocationRecord`]s.
pub const LOCATIONS: &str = "locations";

const USER_ID: &str = "userId";
const VISIBILITY: &str = "visibility";
const DATE_ADDED: &str = "dateAdded";

/// Async trait for storing and querying JSON documents by collection and id.
pub trait DocumentStore {
    /// Reserve a fresh, unique document id.
    fn generate_id(&self) -> String;
    fn set(
        &self,
        collection: &str,
        id: &str,
        doc: Document,
    ) -> impl Future<Output = Result<(), StoreError>>;
    fn get(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = Result<Option<Document>, StoreError>>;
    fn delete(&self, collection: &str, id: &str) -> impl Future<Output = Result<(), StoreError>>;
    fn query(
        &self,
        collection: &str,
        query: &Query,
    ) -> impl Future<Output = Result<Vec<Snapshot>, StoreError>>;
}

/// Offset/limit window for a list query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    /// `None` uses the configured default limit.
    pub limit: Option<usize>,
}

impl Page {
    pub fn first() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            offset: 0,
            limit: Some(limit),
        }
    }

    /// The page after this one, given how many rows this one returned.
    pub fn next(&self, returned: usize) -> Self {
        Self {
            offset: self.offset + returned,
            limit: self.limit,
        }
    }
}

/// One page of location records.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Listing {
    pub locations: Vec<LocationRecord>,
    /// More records match beyond this page.
    pub has_more: bool,
}

/// Location queries backed by a [`DocumentStore`].
pub struct LocationRepository<S: DocumentStore> {
    store: S,
    limits: QueryConfig,
}

impl<S: DocumentStore> LocationRepository<S> {
    pub fn new(store: S) -> Self {
        Self::with_limits(store, QueryConfig::default())
    }

    pub fn with_limits(store: S, limits: QueryConfig) -> Self {
        Self { store, limits }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate and save a new record. Returns the assigned id.
    pub async fn add_location(&self, record: &LocationRecord) -> Result<String, StoreError> {
        record.validate()?;
        let id = self.store.generate_id();
        let mut saved = record.clone();
        saved.id = id.clone();
        self.store.set(LOCATIONS, &id, saved.to_document()?).await?;
        info!(location_id = %id, user_id = %record.user_id, visibility = %record.visibility, "location added");
        Ok(id)
    }

    /// Remove a record. Succeeds whether or not the id exists.
    pub async fn delete_location(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(LOCATIONS, id).await?;
        info!(location_id = %id, "location deleted");
        Ok(())
    }

    pub async fn get_location(&self, id: &str) -> Result<Option<LocationRecord>, StoreError> {
        match self.store.get(LOCATIONS, id).await? {
            Some(data) => LocationRecord::from_snapshot(Snapshot {
                id: id.to_string(),
                data,
            })
            .map(Some),
            None => Ok(None),
        }
    }

    /// Every record, newest first.
    pub async fn get_all_locations(&self, page: Page) -> Result<Listing, StoreError> {
        self.run(Query::new(), page).await
    }

    /// One owner's records, newest first.
    pub async fn get_user_locations(&self, user_id: &str, page: Page) -> Result<Listing, StoreError> {
        self.run(Query::new().where_eq(USER_ID, user_id), page).await
    }

    /// One owner's records added within `range` (inclusive).
    pub async fn get_user_locations_by_date_range(
        &self,
        user_id: &str,
        range: DateRange,
        page: Page,
    ) -> Result<Listing, StoreError> {
        let query = in_range(Query::new().where_eq(USER_ID, user_id), range);
        self.run(query, page).await
    }

    pub async fn get_user_locations_by_date_range_and_visibility(
        &self,
        user_id: &str,
        range: DateRange,
        visibility: Visibility,
        page: Page,
    ) -> Result<Listing, StoreError> {
        let query = in_range(
            Query::new()
                .where_eq(USER_ID, user_id)
                .where_eq(VISIBILITY, visibility.as_str()),
            range,
        );
        self.run(query, page).await
    }

    /// Public records from any owner added within `range`.
    pub async fn get_public_locations_by_date_range(
        &self,
        range: DateRange,
        page: Page,
    ) -> Result<Listing, StoreError> {
        let query = in_range(
            Query::new().where_eq(VISIBILITY, Visibility::Public.as_str()),
            range,
        );
        self.run(query, page).await
    }

    /// One owner's records from a `YYYY-MM-DD` day in the local calendar.
    pub async fn get_user_locations_by_date(
        &self,
        user_id: &str,
        date: &str,
        page: Page,
    ) -> Result<Listing, StoreError> {
        self.get_user_locations_by_date_in(user_id, date, &Local, page)
            .await
    }

    /// As [`get_user_locations_by_date`](Self::get_user_locations_by_date), in an explicit zone.
    pub async fn get_user_locations_by_date_in<Tz: TimeZone>(
        &self,
        user_id: &str,
        date: &str,
        tz: &Tz,
        page: Page,
    ) -> Result<Listing, StoreError> {
        let day = DateRange::day(parse_calendar_date(date)?, tz)?;
        self.get_user_locations_by_date_range(user_id, day, page)
            .await
    }

    fn effective_limit(&self, page: Page) -> usize {
        page.limit
            .unwrap_or(self.limits.default_limit)
            .min(self.limits.max_limit)
            .max(1)
    }

    async fn run(&self, query: Query, page: Page) -> Result<Listing, StoreError> {
        let limit = self.effective_limit(page);
        let query = query
            .order_by(DATE_ADDED, Direction::Descending)
            .offset(page.offset)
            .limit(limit.saturating_add(1));
        debug!(
            collection = LOCATIONS,
            filters = query.filters().len(),
            offset = page.offset,
            limit,
            "querying locations"
        );

        let mut snapshots = self.store.query(LOCATIONS, &query).await?;
        let has_more = snapshots.len() > limit;
        snapshots.truncate(limit);
        let locations = snapshots
            .into_iter()
            .map(LocationRecord::from_snapshot)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Listing {
            locations,
            has_more,
        })
    }
}

fn in_range(query: Query, range: DateRange) -> Query {
    query
        .where_gte(DATE_ADDED, range.start())
        .where_lte(DATE_ADDED, range.end())
}
