use rocket::http::Status;
use serde::Serialize;

use crate::progress::ProgressEntry;

use super::{ApprovalStatus, Permission, Role};

/// The current user's profile, as adopted by the session gate. Constructed on
/// sign-in (created with defaults on first sign-in) and dropped on sign-out.
#[derive(Debug, Serialize, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub cpf: String,
    pub role: Role,
    pub status: ApprovalStatus,
    pub progress: Vec<ProgressEntry>,
    pub completion_percentage: f64,
    pub bonus_points: i64,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbProfile {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub cpf: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub progress: Option<String>,
    pub completion_percentage: Option<f64>,
    pub bonus_points: Option<i64>,
}

impl From<DbProfile> for User {
    fn from(profile: DbProfile) -> Self {
        Self {
            id: profile.id.unwrap_or_default(),
            name: profile.name.unwrap_or_default(),
            cpf: profile.cpf.unwrap_or_default(),
            role: Role::from_str(&profile.role.unwrap_or_default()).unwrap_or(Role::Student),
            status: ApprovalStatus::from_str(&profile.status.unwrap_or_default())
                .unwrap_or(ApprovalStatus::Pending),
            progress: profile
                .progress
                .as_deref()
                .and_then(|raw| serde_json::from_str(raw).ok())
                .unwrap_or_default(),
            completion_percentage: profile.completion_percentage.unwrap_or_default(),
            bonus_points: profile.bonus_points.unwrap_or_default(),
        }
    }
}

impl User {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role.has_permission(permission)
    }

    pub fn require_permission(&self, permission: Permission) -> Result<(), Status> {
        if self.role.has_permission(permission) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = %self.id,
                role = %self.role.as_str(),
                permission = ?permission,
                "Permission denied"
            );
            Err(Status::Forbidden)
        }
    }

    pub fn require_all_permissions(&self, permissions: &[Permission]) -> Result<(), Status> {
        if permissions.iter().all(|p| self.role.has_permission(*p)) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = %self.id,
                role = %self.role.as_str(),
                permissions = ?permissions,
                "Permission denied (require all)"
            );
            Err(Status::Forbidden)
        }
    }
}
