use super::{Car, Color, Id, Person, Role, WorkType};

#[cfg(feature = "serde")]
use serde::Serialize;

/// Snapshot of the slowly-changing lookup collections.
///
/// Lookups return `None` on a miss; callers decide which placeholder to show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct References {
    pub cars: Vec<Car>,
    pub colors: Vec<Color>,
    pub works: Vec<WorkType>,
    pub persons: Vec<Person>,
    pub roles: Vec<Role>,
    pub active_persons: Vec<Person>,
}

impl References {
    /// Builds a snapshot, deriving `active_persons` from `persons`.
    pub fn new(
        cars: Vec<Car>,
        colors: Vec<Color>,
        works: Vec<WorkType>,
        persons: Vec<Person>,
        roles: Vec<Role>,
    ) -> Self {
        let active_persons = persons.iter().filter(|p| p.is_active).cloned().collect();
        Self {
            cars,
            colors,
            works,
            persons,
            roles,
            active_persons,
        }
    }

    pub fn car(&self, id: Id) -> Option<&Car> {
        self.cars.iter().find(|car| car.id == id)
    }

    pub fn color(&self, id: Id) -> Option<&Color> {
        self.colors.iter().find(|color| color.id == id)
    }

    pub fn work(&self, id: Id) -> Option<&WorkType> {
        self.works.iter().find(|work| work.id == id)
    }

    /// Looks a person up among all persons, active or not, so that historical
    /// assignments still resolve their executors.
    pub fn person(&self, id: Id) -> Option<&Person> {
        self.persons.iter().find(|person| person.id == id)
    }

    pub fn role(&self, id: Id) -> Option<&Role> {
        self.roles.iter().find(|role| role.id == id)
    }
}
