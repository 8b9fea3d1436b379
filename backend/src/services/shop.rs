//! Shop management service

use serde::Deserialize;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::models::{ApprovalStatus, Shop};
use crate::services::discovery::ShopRow;
use shared::types::GeoPoint;
use shared::validation::{
    validate_coordinate, validate_email, validate_phone_number, ValidationErrors,
};

const SHOP_RETURNING: &str = "1::int8 AS total_count, id, name, phone_number, email, location, \
     ST_AsText(coordinate) AS coordinate, thumbnail, photos, created_at, approval_status, created_by";

/// Shop service
#[derive(Clone)]
pub struct ShopService {
    db: PgPool,
}

/// Input for creating a shop
#[derive(Debug, Deserialize)]
pub struct CreateShopInput {
    pub name: String,
    pub phone_number: String,
    pub email: String,
    pub location: String,
    pub coordinate: Option<String>,
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub photos: Vec<String>,
}

/// Input for updating a shop; absent fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct UpdateShopInput {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    pub coordinate: Option<String>,
    pub thumbnail: Option<String>,
    pub photos: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateApprovalInput {
    pub approval_status: ApprovalStatus,
}

impl CreateShopInput {
    pub fn validate(&self) -> Result<Option<GeoPoint>, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(!self.name.trim().is_empty(), "name", "must be provided");
        errors.check(!self.location.trim().is_empty(), "location", "must be provided");
        if let Err(msg) = validate_phone_number(&self.phone_number) {
            errors.add("phone_number", msg);
        }
        if let Err(msg) = validate_email(&self.email) {
            errors.add("email", msg);
        }
        let coordinate = check_coordinate(self.coordinate.as_deref(), &mut errors);
        errors.into_result(coordinate)
    }
}

impl UpdateShopInput {
    pub fn validate(&self) -> Result<Option<GeoPoint>, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &self.name {
            errors.check(!name.trim().is_empty(), "name", "must be provided");
        }
        if let Some(location) = &self.location {
            errors.check(!location.trim().is_empty(), "location", "must be provided");
        }
        if let Some(Err(msg)) = self.phone_number.as_deref().map(validate_phone_number) {
            errors.add("phone_number", msg);
        }
        if let Some(Err(msg)) = self.email.as_deref().map(validate_email) {
            errors.add("email", msg);
        }
        let coordinate = check_coordinate(self.coordinate.as_deref(), &mut errors);
        errors.into_result(coordinate)
    }
}

fn check_coordinate(raw: Option<&str>, errors: &mut ValidationErrors) -> Option<GeoPoint> {
    match raw.map(validate_coordinate) {
        Some(Ok(point)) => Some(point),
        Some(Err(msg)) => {
            errors.add("coordinate", msg);
            None
        }
        None => None,
    }
}

impl ShopService {
    /// Create a new ShopService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get a shop by ID
    pub async fn get_shop(&self, shop_id: i64) -> AppResult<Shop> {
        let row = sqlx::query_as::<_, ShopRow>(&format!(
            "SELECT {SHOP_RETURNING} FROM shops WHERE id = $1"
        ))
        .bind(shop_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Shop".to_string()))?;

        Shop::try_from(row)
    }

    /// Create a new shop, pending approval
    pub async fn create_shop(&self, created_by: i64, input: CreateShopInput) -> AppResult<Shop> {
        let coordinate = input.validate()?;

        let row = sqlx::query_as::<_, ShopRow>(&format!(
            r#"
            INSERT INTO shops (name, phone_number, email, location, coordinate, thumbnail, photos,
                               approval_status, created_by)
            VALUES ($1, $2, $3, $4, ST_GeogFromText($5), $6, $7, $8, $9)
            RETURNING {SHOP_RETURNING}
            "#
        ))
        .bind(input.name.trim())
        .bind(&input.phone_number)
        .bind(&input.email)
        .bind(input.location.trim())
        .bind(coordinate.map(|p| p.to_ewkt()))
        .bind(&input.thumbnail)
        .bind(&input.photos)
        .bind(ApprovalStatus::default().as_str())
        .bind(created_by)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(shop_id = row.id, created_by, "Shop created");
        Shop::try_from(row)
    }

    /// Update a shop
    pub async fn update_shop(&self, shop_id: i64, input: UpdateShopInput) -> AppResult<Shop> {
        let coordinate = input.validate()?;

        let row = sqlx::query_as::<_, ShopRow>(&format!(
            r#"
            UPDATE shops SET
                name = COALESCE($2, name),
                phone_number = COALESCE($3, phone_number),
                email = COALESCE($4, email),
                location = COALESCE($5, location),
                coordinate = COALESCE(ST_GeogFromText($6), coordinate),
                thumbnail = COALESCE($7, thumbnail),
                photos = COALESCE($8, photos)
            WHERE id = $1
            RETURNING {SHOP_RETURNING}
            "#
        ))
        .bind(shop_id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(&input.phone_number)
        .bind(&input.email)
        .bind(input.location.as_deref().map(str::trim))
        .bind(coordinate.map(|p| p.to_ewkt()))
        .bind(&input.thumbnail)
        .bind(&input.photos)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Shop".to_string()))?;

        Shop::try_from(row)
    }

    /// Set the approval status of a shop
    pub async fn update_approval(&self, shop_id: i64, status: ApprovalStatus) -> AppResult<Shop> {
        let row = sqlx::query_as::<_, ShopRow>(&format!(
            "UPDATE shops SET approval_status = $1 WHERE id = $2 RETURNING {SHOP_RETURNING}"
        ))
        .bind(status.as_str())
        .bind(shop_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Shop".to_string()))?;

        tracing::info!(shop_id, status = %status, "Shop approval changed");
        Shop::try_from(row)
    }

    /// Delete a shop and its category links
    pub async fn delete_shop(&self, shop_id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM shops WHERE id = $1")
            .bind(shop_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Shop".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> CreateShopInput {
        CreateShopInput {
            name: "Bole Auto".to_string(),
            phone_number: "0911223344".to_string(),
            email: "bole@auto.et".to_string(),
            location: "Bole, Addis Ababa".to_string(),
            coordinate: Some("38.79 8.99".to_string()),
            thumbnail: None,
            photos: vec![],
        }
    }

    #[test]
    fn test_valid_create_input() {
        let point = input().validate().unwrap();
        assert_eq!(point, Some(GeoPoint::new(38.79, 8.99).unwrap()));
    }

    #[test]
    fn test_create_input_reports_every_field() {
        let errors = CreateShopInput {
            name: "  ".to_string(),
            phone_number: "0811223344".to_string(),
            email: "bole.auto.et".to_string(),
            location: String::new(),
            coordinate: Some("200 8.99".to_string()),
            ..input()
        }
        .validate()
        .unwrap_err();

        assert_eq!(errors.len(), 5);
        for field in ["name", "phone_number", "email", "location", "coordinate"] {
            assert!(errors.get(field).is_some(), "missing {}", field);
        }
    }

    #[test]
    fn test_update_input_checks_only_present_fields() {
        assert_eq!(UpdateShopInput::default().validate(), Ok(None));

        let errors = UpdateShopInput {
            email: Some("nope".to_string()),
            ..UpdateShopInput::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.get("email").is_some());
    }
}
