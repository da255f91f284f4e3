use crate::model::user::{User, UserId};
use serde::{Deserialize, Serialize};

/// Users in arrival order, unique by id.
#[derive(Debug, Serialize, Deserialize, Clone, Default, Eq, PartialEq)]
pub struct Room {
    pub users: Vec<User>,
}

impl Room {
    pub fn new(users: Vec<User>) -> Self {
        Self { users }
    }

    pub fn position(&self, id: &UserId) -> Option<usize> {
        self.users.iter().position(|u| &u.id == id)
    }

    pub fn contains(&self, id: &UserId) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: &UserId) -> Option<&User> {
        self.users.iter().find(|u| &u.id == id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
