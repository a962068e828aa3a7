// Employee data access
// In-memory employee table keyed by id, ids generated from a counter

use std::collections::BTreeMap;

use tokio::sync::RwLock;

use crate::model::{Employee, Gender};

const FIRST_GENERATED_ID: u32 = 1006;

struct EmployeeTable {
    rows: BTreeMap<u32, Employee>,
    next_id: u32,
}

pub struct EmployeeDao {
    table: RwLock<EmployeeTable>,
}

impl EmployeeDao {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(EmployeeTable {
                rows: BTreeMap::new(),
                next_id: FIRST_GENERATED_ID,
            }),
        }
    }

    /// Five demo employees, ids 1001 through 1005
    pub fn seeded() -> Self {
        let seed = [
            (1001, Employee::new("E-AA", "aa@163.com", Gender::Male, 101)),
            (1002, Employee::new("E-BB", "bb@163.com", Gender::Male, 102)),
            (1003, Employee::new("E-CC", "cc@163.com", Gender::Female, 103)),
            (1004, Employee::new("E-DD", "dd@163.com", Gender::Female, 104)),
            (1005, Employee::new("E-EE", "ee@163.com", Gender::Male, 105)),
        ];
        let rows = seed
            .into_iter()
            .map(|(id, mut employee)| {
                employee.id = Some(id);
                (id, employee)
            })
            .collect();

        Self {
            table: RwLock::new(EmployeeTable {
                rows,
                next_id: FIRST_GENERATED_ID,
            }),
        }
    }

    /// All employees ordered by id
    pub async fn get_all(&self) -> Vec<Employee> {
        self.table.read().await.rows.values().cloned().collect()
    }

    pub async fn get(&self, id: u32) -> Option<Employee> {
        self.table.read().await.rows.get(&id).cloned()
    }

    /// Insert or replace. An employee without id gets the next generated one.
    pub async fn save(&self, mut employee: Employee) -> Employee {
        let mut table = self.table.write().await;
        let id = match employee.id {
            Some(id) => id,
            None => {
                let id = table.next_id;
                table.next_id += 1;
                id
            }
        };
        if id >= table.next_id {
            table.next_id = id + 1;
        }
        employee.id = Some(id);
        table.rows.insert(id, employee.clone());
        employee
    }

    pub async fn delete(&self, id: u32) -> Option<Employee> {
        self.table.write().await.rows.remove(&id)
    }
}

impl Default for EmployeeDao {
    fn default() -> Self {
        Self::new()
    }
}
