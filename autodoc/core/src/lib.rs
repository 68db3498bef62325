//! Core domain models and scheduling logic for AutoDoc.
//!
//! Everything in this crate is pure: it never talks to the external store.
//! The server crate fetches rows, hands them to these functions and renders
//! whatever comes back.
pub mod calendar;
pub mod model;
pub mod mutation;
pub mod schedule;

pub use calendar::{CalendarError, DayCell, MonthGrid, YearMonth, build_month_grid};
pub use model::{Assignment, Car, CatalogEntry, Color, Id, Person, References, Role, WorkItem, WorkType};
pub use mutation::{
    AssignmentUpdate, CreateAssignment, NewAssignment, NewWorkLine, StatusBatch, StatusChange,
    UpdateAssignment, ValidationError, WorkLine, WorkSelection,
};
pub use schedule::{AssignmentSummary, AssignmentWithWorks, ExecutorGroup, WorkEntry, aggregate_day};
