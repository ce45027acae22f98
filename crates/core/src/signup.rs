//! The signup record — the single entity this demo answers questions about.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Whether a signup is still active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignupStatus {
    Active,
    Inactive,
}

impl SignupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignupStatus::Active => "active",
            SignupStatus::Inactive => "inactive",
        }
    }
}

impl std::fmt::Display for SignupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SignupStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(SignupStatus::Active),
            "inactive" => Ok(SignupStatus::Inactive),
            other => Err(format!("unknown signup status: {other}")),
        }
    }
}

/// A row in the `signups` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signup {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub signup_date: NaiveDate,
    pub week_number: Option<i64>,
    pub status: SignupStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_roundtrip() {
        assert_eq!(SignupStatus::from_str("active").unwrap(), SignupStatus::Active);
        assert_eq!(SignupStatus::from_str("INACTIVE").unwrap(), SignupStatus::Inactive);
        assert!(SignupStatus::from_str("pending").is_err());
        assert_eq!(SignupStatus::Active.to_string(), "active");
    }

    #[test]
    fn signup_serializes_status_lowercase() {
        let signup = Signup {
            id: 1,
            username: "Alice".into(),
            email: Some("alice@example.com".into()),
            signup_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            week_number: Some(1),
            status: SignupStatus::Active,
        };
        let json = serde_json::to_string(&signup).unwrap();
        assert!(json.contains("\"active\""));
        assert!(json.contains("2024-01-02"));
    }
}
