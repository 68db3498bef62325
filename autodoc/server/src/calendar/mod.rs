use autodoc_core::calendar::{self, CalendarError, MonthGrid};
use chrono::NaiveDate;

use crate::store::{AssignmentFilter, ExternalStore};

pub mod web;

pub use web::create_calendar_router;

pub struct CalendarService<'a> {
    store: &'a dyn ExternalStore,
}

impl<'a> CalendarService<'a> {
    pub fn new(store: &'a dyn ExternalStore) -> Self {
        Self { store }
    }

    /// Builds the month grid for `year`/`month`.
    ///
    /// An unreachable store yields a grid without any marked days rather than
    /// an error.
    #[tracing::instrument(skip(self))]
    pub async fn month_grid(
        &self,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> Result<MonthGrid, CalendarError> {
        if calendar::month_name(month).is_none() {
            return Err(CalendarError::InvalidMonth(month));
        }

        let assignments = match self
            .store
            .list_assignments(AssignmentFilter::month(year, month))
            .await
        {
            Ok(assignments) => assignments,
            Err(err) => {
                tracing::warn!(year, month, error = %err, "Failed to fetch assignments for month, showing an empty calendar");
                Vec::new()
            }
        };
        tracing::info!(year, month, count = assignments.len(), "Fetched assignments for month");

        calendar::build_month_grid(year, month, &assignments, today)
    }
}
