// Department data access
// Departments are fixed at startup and only read afterwards

use std::collections::BTreeMap;

use crate::model::Department;

pub struct DepartmentDao {
    departments: BTreeMap<u32, Department>,
}

impl DepartmentDao {
    pub fn new(departments: impl IntoIterator<Item = Department>) -> Self {
        Self {
            departments: departments.into_iter().map(|d| (d.id, d)).collect(),
        }
    }

    /// The five demo departments, ids 101 through 105
    pub fn seeded() -> Self {
        Self::new([
            Department::new(101, "D-AA"),
            Department::new(102, "D-BB"),
            Department::new(103, "D-CC"),
            Department::new(104, "D-DD"),
            Department::new(105, "D-EE"),
        ])
    }

    /// All departments ordered by id
    pub fn get_departments(&self) -> Vec<Department> {
        self.departments.values().cloned().collect()
    }

    pub fn get_department(&self, id: u32) -> Option<&Department> {
        self.departments.get(&id)
    }
}
