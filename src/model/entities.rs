// Domain entities: employees, departments and the demo user

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::binding::Bindable;
use crate::error::WebError;
use crate::http::Params;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Numeric form code: 1 for male, 0 for female
    pub const fn code(self) -> u8 {
        match self {
            Self::Male => 1,
            Self::Female => 0,
        }
    }
}

impl FromStr for Gender {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "m" | "male" => Ok(Self::Male),
            "0" | "f" | "female" => Ok(Self::Female),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Male => f.write_str("Male"),
            Self::Female => f.write_str("Female"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: u32,
    pub name: String,
}

impl Department {
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }
}

/// Employee record. A blank form-backing employee has every optional field unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Option<u32>,
    pub name: String,
    pub email: String,
    pub gender: Option<Gender>,
    pub department_id: Option<u32>,
}

impl Employee {
    pub fn new(name: &str, email: &str, gender: Gender, department_id: u32) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            email: email.to_string(),
            gender: Some(gender),
            department_id: Some(department_id),
        }
    }
}

impl Bindable for Employee {
    const MODEL_KEY: &'static str = "employee";

    fn bind(&mut self, params: &Params) -> Result<(), WebError> {
        if let Some(id) = params.parse_opt("id", "integer")? {
            self.id = Some(id);
        }
        if let Some(name) = params.get("name") {
            self.name = name.to_string();
        }
        if let Some(email) = params.get("email") {
            self.email = email.to_string();
        }
        if let Some(gender) = params.parse_opt("gender", "gender (0 or 1)")? {
            self.gender = Some(gender);
        }
        if let Some(department_id) = params.parse_opt("departmentId", "integer")? {
            self.department_id = Some(department_id);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub password: String,
    pub email: String,
    pub age: u32,
}

impl User {
    pub fn new(name: &str, password: &str, email: &str, age: u32) -> Self {
        Self {
            name: name.to_string(),
            password: password.to_string(),
            email: email.to_string(),
            age,
        }
    }
}

impl Bindable for User {
    const MODEL_KEY: &'static str = "user";

    fn bind(&mut self, params: &Params) -> Result<(), WebError> {
        if let Some(name) = params.get("name") {
            self.name = name.to_string();
        }
        if let Some(password) = params.get("password") {
            self.password = password.to_string();
        }
        if let Some(email) = params.get("email") {
            self.email = email.to_string();
        }
        if let Some(age) = params.parse_opt("age", "integer")? {
            self.age = age;
        }
        Ok(())
    }
}
