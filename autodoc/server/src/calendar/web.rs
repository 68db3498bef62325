use askama::Template;
use autodoc_core::MonthGrid;
use chrono::Datelike;
use axum::{
    Router,
    extract::{Query, State},
    response::Html,
    routing::get,
};
use serde::Deserialize;

use crate::calendar::CalendarService;
use crate::web::{AppState, WebError};

/// Query string of `/calendar`. Missing values fall back to the current
/// month.
#[derive(Debug, Default, Deserialize)]
pub struct CalendarQuery {
    #[serde(default, deserialize_with = "crate::web::lenient::optional")]
    year: Option<i32>,
    #[serde(default, deserialize_with = "crate::web::lenient::optional")]
    month: Option<u32>,
}

/// One `<option>` of a picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "calendar.html")]
struct CalendarTemplate {
    grid: MonthGrid,
    month_options: Vec<PickerOption>,
    year_options: Vec<PickerOption>,
}

impl CalendarTemplate {
    pub fn new(grid: MonthGrid) -> Self {
        let month_options = grid
            .months
            .iter()
            .map(|(number, name)| PickerOption {
                value: number.to_string(),
                label: name.to_string(),
                selected: *number == grid.month,
            })
            .collect();
        let year_options = grid
            .years
            .iter()
            .map(|year| PickerOption {
                value: year.to_string(),
                label: year.to_string(),
                selected: *year == grid.year,
            })
            .collect();
        Self {
            grid,
            month_options,
            year_options,
        }
    }
}

/// Handler for GET /calendar that renders the month view.
#[tracing::instrument(skip(state))]
async fn calendar_handler(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> Result<Html<String>, WebError> {
    let today = chrono::Local::now().date_naive();
    let year = query.year.unwrap_or(today.year());
    let month = query.month.unwrap_or(today.month());

    let grid = CalendarService::new(state.store.as_ref())
        .month_grid(year, month, today)
        .await?;
    let template = CalendarTemplate::new(grid);
    template.render().map(Html).map_err(WebError::from)
}

pub fn create_calendar_router(state: AppState) -> Router {
    Router::new()
        .route("/calendar", get(calendar_handler))
        .with_state(state)
}
