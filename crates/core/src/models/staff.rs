//! Staff and shift models

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Back-office role, ordered by authority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    /// Show-night helper: read-only views
    Usher = 1,
    /// Front desk: day-to-day booking handling
    BoxOffice = 2,
    /// Manager: approvals, shows, billing, reports
    Manager = 3,
    /// Owner: everything, including staff and settings
    Owner = 4,
}

impl StaffRole {
    pub fn display_name(&self) -> &'static str {
        match self {
            StaffRole::Usher => "Usher",
            StaffRole::BoxOffice => "Box Office",
            StaffRole::Manager => "Manager",
            StaffRole::Owner => "Owner",
        }
    }
}

/// A back-office account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub password_hash: String,
    pub role: StaffRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl StaffMember {
    pub fn new(name: String, username: String, password_hash: String, role: StaffRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            username,
            password_hash,
            role,
            is_active: true,
            created_at: Utc::now(),
            last_login: None,
        }
    }

    /// Hash a plaintext password for storage
    pub fn hash_password(plain: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plain.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| Error::Credentials(e.to_string()))
    }

    /// Verify a plaintext password against the stored hash
    pub fn verify_password(&self, plain: &str) -> bool {
        match PasswordHash::new(&self.password_hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(plain.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

/// A scheduled work shift for a staff member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledShift {
    pub id: Uuid,
    pub staff_id: Uuid,
    pub date: NaiveDate,
    pub starts: NaiveTime,
    pub ends: NaiveTime,
    /// Duty label shown on the rota ("box office", "floor", "bar")
    pub duty: String,
    pub notes: Option<String>,
}

impl ScheduledShift {
    pub fn new(staff_id: Uuid, date: NaiveDate, starts: NaiveTime, ends: NaiveTime, duty: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            staff_id,
            date,
            starts,
            ends,
            duty,
            notes: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_roundtrip() {
        let hash = StaffMember::hash_password("house-left-7").unwrap();
        let staff = StaffMember::new(
            "Jo Deskins".into(),
            "jo".into(),
            hash,
            StaffRole::BoxOffice,
        );
        assert!(staff.verify_password("house-left-7"));
        assert!(!staff.verify_password("house-right-7"));
    }

    #[test]
    fn test_garbage_hash_never_verifies() {
        let staff = StaffMember::new(
            "Jo Deskins".into(),
            "jo".into(),
            "not-a-phc-string".into(),
            StaffRole::BoxOffice,
        );
        assert!(!staff.verify_password("anything"));
    }

    #[test]
    fn test_role_ordering() {
        assert!(StaffRole::Owner > StaffRole::Manager);
        assert!(StaffRole::Manager > StaffRole::BoxOffice);
        assert!(StaffRole::BoxOffice > StaffRole::Usher);
    }
}
