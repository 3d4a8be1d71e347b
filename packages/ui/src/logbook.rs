//! Logbook screen logic: a user's own locations under a date filter.

use std::fmt;
use std::sync::Arc;

use api::Session;
use chrono::{DateTime, Local, TimeZone, Weekday};
use store::dates::{start_of_day, start_of_month, start_of_week};
use store::{DateRange, DocumentStore, StoreError};
use tracing::debug;

use crate::location_vm::LocationViewModel;

pub const EMPTY_MESSAGE: &str = "No locations found for this filter.\nTap the '+' button to add one!";

/// Named time window for the logbook.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DateFilter {
    #[default]
    All,
    Today,
    ThisWeek,
    ThisMonth,
}

impl DateFilter {
    pub const FILTERS: [DateFilter; 4] = [
        DateFilter::All,
        DateFilter::Today,
        DateFilter::ThisWeek,
        DateFilter::ThisMonth,
    ];

    /// Chip text.
    pub fn label(&self) -> &'static str {
        match self {
            DateFilter::All => "All",
            DateFilter::Today => "Today",
            DateFilter::ThisWeek => "This week",
            DateFilter::ThisMonth => "This month",
        }
    }

    pub fn empty_message(&self) -> &'static str {
        EMPTY_MESSAGE
    }

    /// The `[start, now]` window for this filter, `None` for [`DateFilter::All`].
    pub fn window<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
        week_start: Weekday,
    ) -> Result<Option<DateRange>, StoreError> {
        let start = match self {
            DateFilter::All => return Ok(None),
            DateFilter::Today => start_of_day(now)?,
            DateFilter::ThisWeek => start_of_week(now, week_start)?,
            DateFilter::ThisMonth => start_of_month(now)?,
        };
        DateRange::between(&start, now).map(Some)
    }
}

impl fmt::Display for DateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Drives a [`LocationViewModel`] from the selected filter and signed-in user.
pub struct LogbookController<S: DocumentStore> {
    locations: Arc<LocationViewModel<S>>,
    filter: DateFilter,
    session: Option<Session>,
    week_start: Weekday,
}

impl<S: DocumentStore> LogbookController<S> {
    pub fn new(locations: Arc<LocationViewModel<S>>, week_start: Weekday) -> Self {
        Self {
            locations,
            filter: DateFilter::default(),
            session: None,
            week_start,
        }
    }

    pub fn filter(&self) -> DateFilter {
        self.filter
    }

    pub fn locations(&self) -> &LocationViewModel<S> {
        &self.locations
    }

    /// Pick a filter and reload.
    pub async fn select(&mut self, filter: DateFilter) {
        self.filter = filter;
        self.refresh().await
    }

    /// Change the owning user and reload. `None` leaves the list untouched.
    pub async fn set_session(&mut self, session: Option<Session>) {
        self.session = session;
        self.refresh().await
    }

    pub async fn refresh(&self) {
        self.refresh_at(&Local::now()).await
    }

    /// Reload as of `now`, in `now`'s time zone.
    pub async fn refresh_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) {
        let Some(session) = &self.session else {
            return;
        };
        let user_id = session.user_id();
        if user_id.trim().is_empty() {
            return;
        }

        let window = self.filter.window(now, self.week_start);
        self.load_window(user_id, window).await
    }

    /// Next page of the current filter's entries.
    pub async fn load_more(&self) {
        self.locations.load_more().await
    }

    async fn load_window(&self, user_id: &str, window: Result<Option<DateRange>, StoreError>) {
        match window {
            Ok(None) => self.locations.load_user_locations(user_id).await,
            Ok(Some(range)) => {
                debug!(filter = %self.filter, start = range.start(), end = range.end(), "logbook window");
                self.locations
                    .load_user_locations_by_date_range(user_id, range)
                    .await
            }
            Err(e) => self.locations.show_error(e),
        }
    }
}
