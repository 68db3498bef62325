use std::ops::Range;

use askama::Template;
use axum::{
    Router,
    extract::{Path, State},
    response::Html,
    routing::get,
};
use chrono::{Datelike, NaiveDate};

use crate::schedule::{DaySchedule, ScheduleService};
use crate::web::{AppState, WebError};

/// Hours offered by the time picker of the assignment form.
const WORKDAY_HOURS: Range<u32> = 8..20;
const MINUTE_STEP: usize = 5;

#[derive(Template)]
#[template(path = "assignment_details.html")]
struct DayTemplate {
    schedule: DaySchedule,
    hours: Vec<String>,
    minutes: Vec<String>,
}

impl DayTemplate {
    pub fn new(schedule: DaySchedule) -> Self {
        Self {
            schedule,
            hours: WORKDAY_HOURS.map(|hour| format!("{hour:02}")).collect(),
            minutes: (0..60)
                .step_by(MINUTE_STEP)
                .map(|minute| format!("{minute:02}"))
                .collect(),
        }
    }

    fn heading(&self) -> String {
        format!(
            "{} {} {}",
            self.schedule.date.day(),
            self.schedule.month_name,
            self.schedule.date.year()
        )
    }

    /// `year/month/day` without zero padding, as used in the page routes.
    fn date_path(&self) -> String {
        let date = self.schedule.date;
        format!("{}/{}/{}", date.year(), date.month(), date.day())
    }
}

/// Handler for GET /details/{year}/{month}/{day} that renders one day.
#[tracing::instrument(skip(state))]
async fn day_handler(
    State(state): State<AppState>,
    Path((year, month, day)): Path<(i32, u32, u32)>,
) -> Result<Html<String>, WebError> {
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or(WebError::InvalidDate { year, month, day })?;

    let schedule = ScheduleService::new(state.store.as_ref(), &state.references)
        .day(date)
        .await;
    let template = DayTemplate::new(schedule);
    template.render().map(Html).map_err(WebError::from)
}

pub fn create_schedule_router(state: AppState) -> Router {
    Router::new()
        .route("/details/{year}/{month}/{day}", get(day_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use autodoc_core::schedule::{AssignmentSummary, ExecutorGroup, WorkEntry};
    use autodoc_core::{CatalogEntry, Person, References};

    fn schedule(assignments: Vec<AssignmentSummary>) -> DaySchedule {
        let mut retired = Person::new(2, "Boris");
        retired.is_active = false;
        DaySchedule {
            date: NaiveDate::from_ymd_opt(2024, 5, 15).unwrap(),
            month_name: "May",
            assignments,
            references: Arc::new(References::new(
                vec![CatalogEntry::new(1, "Golf")],
                vec![CatalogEntry::new(1, "Black")],
                vec![CatalogEntry::new(10, "Wash")],
                vec![Person::new(1, "Anna"), retired],
                vec![],
            )),
        }
    }

    #[test]
    fn can_offer_workday_times() {
        let template = DayTemplate::new(schedule(vec![]));

        assert_eq!(template.hours.first().map(String::as_str), Some("08"));
        assert_eq!(template.hours.last().map(String::as_str), Some("19"));
        assert_eq!(template.hours.len(), 12);
        assert_eq!(template.minutes.len(), 12);
        assert_eq!(template.minutes[1], "05");
        assert_eq!(template.minutes[11], "55");
    }

    #[test]
    fn can_render_day_page() {
        let summary = AssignmentSummary {
            id: 7,
            time: "09:30".to_string(),
            vin: "WVWZZZ1KZAW000001".to_string(),
            car_number: "A123BC".to_string(),
            car_name: "Golf".to_string(),
            color_name: "Black".to_string(),
            person_name: "Anna".to_string(),
            description: String::new(),
            executors: vec![ExecutorGroup {
                executor_id: None,
                executor_name: "Not assigned".to_string(),
                works: vec![WorkEntry {
                    work_item_id: 3,
                    work_id: 10,
                    work_name: "Wash".to_string(),
                    status: true,
                }],
            }],
        };

        let html = DayTemplate::new(schedule(vec![summary])).render().unwrap();

        assert!(html.contains("15 May 2024"));
        assert!(html.contains("09:30"));
        assert!(html.contains("Not assigned"));
        assert!(html.contains(r#"data-work-item-id="3""#));
        assert!(html.contains(r#"action="/create-assignment/2024/5/15""#));
    }

    #[test]
    fn can_offer_only_active_persons_as_executors() {
        let html = DayTemplate::new(schedule(vec![])).render().unwrap();

        assert!(html.contains("Anna"));
        assert!(!html.contains("Boris"));
    }
}
