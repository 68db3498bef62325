use std::sync::Arc;

use autodoc_core::calendar::month_name;
use autodoc_core::schedule::{AssignmentSummary, AssignmentWithWorks, aggregate_day};
use autodoc_core::{Assignment, References};
use chrono::{Datelike, NaiveDate};

use crate::references::ReferenceCache;
use crate::store::{AssignmentFilter, ExternalStore};

pub mod web;

pub use web::create_schedule_router;

/// Everything the day page shows.
#[derive(Debug, Clone)]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub month_name: &'static str,
    pub assignments: Vec<AssignmentSummary>,
    pub references: Arc<References>,
}

pub struct ScheduleService<'a> {
    store: &'a dyn ExternalStore,
    references: &'a ReferenceCache,
}

impl<'a> ScheduleService<'a> {
    pub fn new(store: &'a dyn ExternalStore, references: &'a ReferenceCache) -> Self {
        Self { store, references }
    }

    /// Collects the assignments of `date` with their works grouped by
    /// executor.
    ///
    /// Work items are fetched one assignment at a time. A failed fetch leaves
    /// that assignment with no works; it is still shown.
    #[tracing::instrument(skip(self))]
    pub async fn day(&self, date: NaiveDate) -> DaySchedule {
        let references = self.references.get_references().await;
        let filter = AssignmentFilter::day(date.year(), date.month(), date.day());
        let assignments: Vec<Assignment> = match self.store.list_assignments(filter).await {
            Ok(assignments) => assignments
                .into_iter()
                .filter(|assignment| assignment.day() == date)
                .collect(),
            Err(err) => {
                tracing::warn!(%date, error = %err, "Failed to fetch assignments for day, showing an empty day");
                Vec::new()
            }
        };

        let mut day = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            let works = match self.store.list_assignment_works(assignment.id).await {
                Ok(works) => works,
                Err(err) => {
                    tracing::warn!(
                        assignment_id = assignment.id,
                        error = %err,
                        "Failed to fetch work items, showing the assignment without works"
                    );
                    Vec::new()
                }
            };
            day.push(AssignmentWithWorks::new(assignment, works));
        }

        DaySchedule {
            date,
            month_name: month_name(date.month()).unwrap_or_default(),
            assignments: aggregate_day(&day, &references),
            references,
        }
    }
}
