use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::display;
use super::enums::UserRole;

/// Staff account. The password hash never leaves the repository layer
/// in serialized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: UserRole,
    pub full_name: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

/// Create/update payload. On update an empty or missing password keeps
/// the stored one.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInput {
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    pub role: UserRole,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl User {
    pub fn display_role(&self) -> &'static str {
        self.role.label()
    }

    /// Inactive accounts hold no permissions.
    pub fn has_permission(&self, required: UserRole) -> bool {
        self.is_active && self.role.grants(required)
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            display_role: self.display_role(),
            display_status: display::active_label(self.is_active),
            user: self.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    #[serde(flatten)]
    pub user: User,
    pub display_role: &'static str,
    pub display_status: &'static str,
}
