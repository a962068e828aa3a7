// Session attribute declarations
// A controller names the model keys, and optionally the value kinds, that live in the session

use serde_json::Value;

use crate::model::Model;

/// Model attributes a controller keeps in the session between requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionAttributes {
    names: &'static [&'static str],
    /// Promote every attribute whose value is a string
    string_values: bool,
}

impl SessionAttributes {
    pub const NONE: Self = Self::new(&[], false);

    pub const fn new(names: &'static [&'static str], string_values: bool) -> Self {
        Self {
            names,
            string_values,
        }
    }

    pub fn is_declared_name(&self, key: &str) -> bool {
        self.names.contains(&key)
    }

    fn is_session_attribute(&self, key: &str, value: &Value) -> bool {
        self.is_declared_name(key) || (self.string_values && value.is_string())
    }

    /// Copy declared attributes already held by the session into the model
    pub fn retrieve(&self, session: &Model, model: &mut Model) {
        for name in self.names {
            if model.contains(name) {
                continue;
            }
            if let Some(value) = session.get(name) {
                model.insert_value(*name, value.clone());
            }
        }
    }

    /// Promote matching model attributes into the session, returning how many were stored
    pub fn store(&self, model: &Model, session: &mut Model) -> usize {
        let mut stored = 0;
        for (key, value) in model.iter() {
            if self.is_session_attribute(key, value) {
                session.insert_value(key.clone(), value.clone());
                stored += 1;
            }
        }
        stored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::User;

    const DECLARED: SessionAttributes = SessionAttributes::new(&["user"], true);

    #[test]
    fn test_store_by_name_and_string_kind() {
        let mut model = Model::new();
        model.insert("user", &User::new("Tom", "123456", "tom@qq.com", 15)).unwrap();
        model.insert("school", "atguigu").unwrap();
        model.insert("names", &["Tom", "Jerry"]).unwrap();
        model.insert("count", &3).unwrap();

        let mut session = Model::new();
        assert_eq!(DECLARED.store(&model, &mut session), 2);
        assert!(session.contains("user"));
        assert!(session.contains("school"));
        assert!(!session.contains("names"));
        assert!(!session.contains("count"));
    }

    #[test]
    fn test_none_stores_nothing() {
        let mut model = Model::new();
        model.insert("school", "atguigu").unwrap();
        let mut session = Model::new();
        assert_eq!(SessionAttributes::NONE.store(&model, &mut session), 0);
        assert!(session.is_empty());
    }

    #[test]
    fn test_retrieve_only_declared_names_and_keeps_model_values() {
        let mut session = Model::new();
        session.insert("user", &User::new("Tom", "1", "a@b", 1)).unwrap();
        session.insert("school", "atguigu").unwrap();

        let mut model = Model::new();
        DECLARED.retrieve(&session, &mut model);
        assert!(model.contains("user"));
        assert!(!model.contains("school"));

        let mut model = Model::new();
        model.insert("user", &User::new("Jerry", "2", "c@d", 2)).unwrap();
        DECLARED.retrieve(&session, &mut model);
        assert_eq!(model.get_as::<User>("user").unwrap().unwrap().name, "Jerry");
    }
}
