//! Data access layer
//!
//! In-memory employee and department tables queried and mutated by the handlers.

mod department;
mod employee;

pub use department::DepartmentDao;
pub use employee::EmployeeDao;
