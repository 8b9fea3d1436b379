//! Shop model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::GeoPoint;

/// Moderation state of a shop listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Declined,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown approval status: {0}")]
pub struct UnknownApprovalStatus(pub String);

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "PENDING",
            ApprovalStatus::Approved => "APPROVED",
            ApprovalStatus::Declined => "DECLINED",
        }
    }
}

impl FromStr for ApprovalStatus {
    type Err = UnknownApprovalStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ApprovalStatus::Pending),
            "APPROVED" => Ok(ApprovalStatus::Approved),
            "DECLINED" => Ok(ApprovalStatus::Declined),
            other => Err(UnknownApprovalStatus(other.to_string())),
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discoverable business listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shop {
    pub id: i64,
    pub name: String,
    pub phone_number: String,
    pub email: String,
    pub approval_status: ApprovalStatus,
    pub location: String,
    pub coordinate: Option<GeoPoint>,
    pub thumbnail: Option<String>,
    pub photos: Vec<String>,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    pub created_by: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approval_status_round_trip() {
        for status in [
            ApprovalStatus::Pending,
            ApprovalStatus::Approved,
            ApprovalStatus::Declined,
        ] {
            assert_eq!(status.as_str().parse::<ApprovalStatus>(), Ok(status));
        }
        assert!("approved".parse::<ApprovalStatus>().is_err());
    }

    #[test]
    fn test_shop_wire_form_omits_created_at() {
        let shop = Shop {
            id: 3,
            name: "Bole Auto".to_string(),
            phone_number: "0911223344".to_string(),
            email: "bole@auto.et".to_string(),
            approval_status: ApprovalStatus::Approved,
            location: "Bole, Addis Ababa".to_string(),
            coordinate: Some(GeoPoint::new(38.79, 8.99).unwrap()),
            thumbnail: None,
            photos: vec!["a.jpg".to_string()],
            created_at: Utc::now(),
            created_by: 1,
        };

        let json = serde_json::to_value(&shop).unwrap();
        assert!(json.get("created_at").is_none());
        assert_eq!(json["approval_status"], "APPROVED");
        assert_eq!(json["coordinate"], "38.79 8.99");
        assert_eq!(json["thumbnail"], serde_json::Value::Null);
    }
}
