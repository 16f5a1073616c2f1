use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    BrowseEvents,
    EditEvents,
    ManageUsers,
}

impl Permission {
    pub fn as_int(self) -> i32 {
        match self {
            Permission::BrowseEvents => 1,
            Permission::EditEvents => 2,
            Permission::ManageUsers => 3,
        }
    }

    pub fn from_int(value: i32) -> Option<Self> {
        match value {
            1 => Some(Permission::BrowseEvents),
            2 => Some(Permission::EditEvents),
            3 => Some(Permission::ManageUsers),
            _ => None,
        }
    }
}

const ADMIN_PERMISSIONS: &[Permission] = &[
    Permission::BrowseEvents,
    Permission::EditEvents,
    Permission::ManageUsers,
];
const REGULAR_PERMISSIONS: &[Permission] = &[Permission::BrowseEvents];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    Admin,
    Regular,
}

impl UserRole {
    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            UserRole::Admin => ADMIN_PERMISSIONS,
            UserRole::Regular => REGULAR_PERMISSIONS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "Admin",
            UserRole::Regular => "Regular",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(UserRole::Admin),
            "regular" => Some(UserRole::Regular),
            _ => None,
        }
    }
}
