//! Request schemas for changing assignments and the payloads they turn into.
//!
//! Each request type has a `validate` step that either rejects it with a
//! [`ValidationError`] or produces the exact body sent to the external store.

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::model::Id;

pub const DEFAULT_HOUR: u32 = 12;
pub const DEFAULT_MINUTE: u32 = 0;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Work entry #{0} is missing work_id")]
    MissingWorkId(usize),
    #[error("Invalid date or time: {year:04}-{month:02}-{day:02} {hour:02}:{minute:02}")]
    InvalidDateTime {
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
    },
}

/// A work selected on the assignment form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkSelection {
    pub work_id: Option<Id>,
    pub executor_id: Option<Id>,
    /// Only meaningful on update; creation always starts works as not done.
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateAssignment {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: Option<u32>,
    pub minute: Option<u32>,
    pub vin: Option<String>,
    pub car_number: Option<String>,
    pub car_id: Option<Id>,
    pub color_id: Option<Id>,
    pub person_id: Option<Id>,
    pub description: Option<String>,
    pub works: Vec<WorkSelection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct NewWorkLine {
    pub work_id: Id,
    pub executor_id: Option<Id>,
}

/// Body of `POST work-assignments`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct NewAssignment {
    pub date: NaiveDateTime,
    pub vin: String,
    pub car_number: String,
    pub car_id: Option<Id>,
    pub color_id: Id,
    pub person_id: Id,
    pub description: String,
    pub works: Vec<NewWorkLine>,
}

impl CreateAssignment {
    pub fn validate(self) -> Result<NewAssignment, ValidationError> {
        let color_id = self.color_id.ok_or(ValidationError::MissingField("color_id"))?;
        let person_id = self
            .person_id
            .ok_or(ValidationError::MissingField("person_id"))?;

        let hour = self.hour.unwrap_or(DEFAULT_HOUR);
        let minute = self.minute.unwrap_or(DEFAULT_MINUTE);
        let date = NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .and_then(|date| date.and_hms_opt(hour, minute, 0))
            .ok_or(ValidationError::InvalidDateTime {
                year: self.year,
                month: self.month,
                day: self.day,
                hour,
                minute,
            })?;

        let works = self
            .works
            .into_iter()
            .enumerate()
            .map(|(index, work)| {
                let work_id = work.work_id.ok_or(ValidationError::MissingWorkId(index))?;
                Ok(NewWorkLine {
                    work_id,
                    executor_id: work.executor_id,
                })
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        Ok(NewAssignment {
            date,
            vin: self.vin.unwrap_or_default(),
            car_number: self.car_number.unwrap_or_default(),
            car_id: self.car_id,
            color_id,
            person_id,
            description: self.description.unwrap_or_default(),
            works,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateAssignment {
    pub id: Option<Id>,
    pub date: Option<NaiveDateTime>,
    pub vin: Option<String>,
    pub car_number: Option<String>,
    pub color_id: Option<Id>,
    pub person_id: Option<Id>,
    pub car_id: Option<Id>,
    pub description: Option<String>,
    pub works: Vec<WorkSelection>,
}

/// A work line of an update. The store replaces the whole list with these.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct WorkLine {
    pub work_id: Id,
    pub executor_id: Option<Id>,
    pub status: bool,
}

/// Body of `PUT work-assignments/{id}`. Fields the caller left out are not
/// sent at all.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct AssignmentUpdate {
    #[cfg_attr(feature = "serde", serde(skip))]
    pub id: Id,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub date: Option<NaiveDateTime>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub vin: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub car_number: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub color_id: Option<Id>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub person_id: Option<Id>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub car_id: Option<Id>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub description: Option<String>,
    pub works: Vec<WorkLine>,
}

impl UpdateAssignment {
    pub fn validate(self) -> Result<AssignmentUpdate, ValidationError> {
        let id = self.id.ok_or(ValidationError::MissingField("id"))?;

        let works = self
            .works
            .into_iter()
            .enumerate()
            .map(|(index, work)| {
                let work_id = work.work_id.ok_or(ValidationError::MissingWorkId(index))?;
                Ok(WorkLine {
                    work_id,
                    executor_id: work.executor_id,
                    status: work.status.unwrap_or(false),
                })
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        Ok(AssignmentUpdate {
            id,
            date: self.date,
            vin: self.vin,
            car_number: self.car_number,
            color_id: self.color_id,
            person_id: self.person_id,
            car_id: self.car_id,
            description: self.description,
            works,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct StatusChange {
    pub work_item_id: Id,
    pub status: bool,
}

/// Body of `POST work-assignment-works/update-status/`. An empty batch is
/// still a valid request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct StatusBatch {
    pub assignment_id: Id,
    pub updates: Vec<StatusChange>,
}

impl StatusBatch {
    pub fn new(assignment_id: Id, updates: Vec<StatusChange>) -> Self {
        Self {
            assignment_id,
            updates,
        }
    }
}
