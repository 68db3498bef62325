//! Day view aggregation: assignments of one day with their work items
//! grouped by executor.

use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::model::{Assignment, Id, References, WorkItem};

pub const NOT_SPECIFIED: &str = "Not specified";
pub const UNKNOWN_WORK: &str = "Unknown work";
pub const NOT_ASSIGNED: &str = "Not assigned";
pub const UNKNOWN_EXECUTOR: &str = "Unknown executor";

/// An assignment paired with the work items fetched for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentWithWorks {
    pub assignment: Assignment,
    pub works: Vec<WorkItem>,
}

impl AssignmentWithWorks {
    pub fn new(assignment: Assignment, works: Vec<WorkItem>) -> Self {
        Self { assignment, works }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct WorkEntry {
    pub work_item_id: Id,
    pub work_id: Id,
    pub work_name: String,
    pub status: bool,
}

/// Works delegated to a single executor. `executor_id` is `None` for the
/// bucket of unassigned works.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ExecutorGroup {
    pub executor_id: Option<Id>,
    pub executor_name: String,
    pub works: Vec<WorkEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct AssignmentSummary {
    pub id: Id,
    /// Time of day, `HH:MM` on a 24-hour clock.
    pub time: String,
    pub vin: String,
    pub car_number: String,
    pub car_name: String,
    pub color_name: String,
    pub person_name: String,
    pub description: String,
    pub executors: Vec<ExecutorGroup>,
}

impl AssignmentSummary {
    pub fn work_count(&self) -> usize {
        self.executors.iter().map(|group| group.works.len()).sum()
    }

    pub fn done_count(&self) -> usize {
        self.executors
            .iter()
            .flat_map(|group| &group.works)
            .filter(|work| work.status)
            .count()
    }
}

/// Summarizes every assignment of the day, in input order.
pub fn aggregate_day(day: &[AssignmentWithWorks], references: &References) -> Vec<AssignmentSummary> {
    day.iter()
        .map(|entry| summarize_assignment(&entry.assignment, &entry.works, references))
        .collect()
}

pub fn summarize_assignment(
    assignment: &Assignment,
    works: &[WorkItem],
    references: &References,
) -> AssignmentSummary {
    let car_name = assignment
        .car
        .as_ref()
        .map(|car| car.name.clone())
        .or_else(|| {
            assignment
                .car_id
                .and_then(|id| references.car(id))
                .map(|car| car.name.clone())
        });
    let color_name = assignment
        .color
        .as_ref()
        .map(|color| color.name.clone())
        .or_else(|| {
            assignment
                .color_id
                .and_then(|id| references.color(id))
                .map(|color| color.name.clone())
        });
    let person_name = assignment
        .person
        .as_ref()
        .map(|person| person.full_name.clone())
        .or_else(|| {
            assignment
                .person_id
                .and_then(|id| references.person(id))
                .map(|person| person.full_name.clone())
        });

    AssignmentSummary {
        id: assignment.id,
        time: assignment.date.format("%H:%M").to_string(),
        vin: assignment.vin.clone().unwrap_or_default(),
        car_number: assignment.car_number.clone().unwrap_or_default(),
        car_name: car_name.unwrap_or_else(|| NOT_SPECIFIED.to_string()),
        color_name: color_name.unwrap_or_else(|| NOT_SPECIFIED.to_string()),
        person_name: person_name.unwrap_or_else(|| NOT_SPECIFIED.to_string()),
        description: assignment.description.clone().unwrap_or_default(),
        executors: group_by_executor(works, references),
    }
}

/// Buckets work items by executor, keeping executors in the order their
/// first work item appears and items in input order.
pub fn group_by_executor(works: &[WorkItem], references: &References) -> Vec<ExecutorGroup> {
    let mut groups: Vec<ExecutorGroup> = Vec::new();
    let mut positions: HashMap<Option<Id>, usize> = HashMap::new();

    for item in works {
        let position = *positions.entry(item.executor_id).or_insert_with(|| {
            groups.push(ExecutorGroup {
                executor_id: item.executor_id,
                executor_name: executor_name(item.executor_id, references),
                works: Vec::new(),
            });
            groups.len() - 1
        });

        let work_name = references
            .work(item.work_id)
            .map(|work| work.name.clone())
            .unwrap_or_else(|| UNKNOWN_WORK.to_string());
        groups[position].works.push(WorkEntry {
            work_item_id: item.id,
            work_id: item.work_id,
            work_name,
            status: item.status,
        });
    }

    groups
}

fn executor_name(executor_id: Option<Id>, references: &References) -> String {
    match executor_id {
        None => NOT_ASSIGNED.to_string(),
        Some(id) => references
            .person(id)
            .map(|person| person.full_name.clone())
            .unwrap_or_else(|| UNKNOWN_EXECUTOR.to_string()),
    }
}
