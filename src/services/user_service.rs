// src/services/user_service.rs
// DOCUMENTATION: Business logic for user accounts
// PURPOSE: Self-service profile operations and admin user management

use actix_multipart::Multipart;
use chrono::Utc;
use serde_json::Value;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::config::Config;
use crate::db::query::QueryOptions;
use crate::db::{UserRepository, USER_COLUMNS};
use crate::errors::ApiError;
use crate::models::{AdminUpdateUserRequest, UpdateMeRequest, UserResponse};
use crate::services::media;

pub struct UserService;

impl UserService {
    /// List accounts through the shared query grammar, with projection
    pub async fn list(
        pool: &PgPool,
        params: &HashMap<String, String>,
    ) -> Result<Vec<Value>, ApiError> {
        let opts = QueryOptions::from_params(params, &USER_COLUMNS)?;
        let users = UserRepository::list(pool, &opts).await?;

        let mut items = Vec::with_capacity(users.len());
        for user in &users {
            let value =
                serde_json::to_value(user.to_response()).map_err(|_| ApiError::InternalError)?;
            items.push(opts.project(value));
        }
        Ok(items)
    }

    pub async fn get(pool: &PgPool, id: Uuid) -> Result<UserResponse, ApiError> {
        Ok(UserRepository::get_by_id(pool, id).await?.to_response())
    }

    /// Self-service profile update; only name and email may change here
    pub async fn update_me(
        pool: &PgPool,
        user_id: Uuid,
        req: UpdateMeRequest,
    ) -> Result<UserResponse, ApiError> {
        if req.password.is_some() || req.password_confirm.is_some() {
            return Err(ApiError::InvalidInput(
                "This route is not for password updates. Please use /update-my-password"
                    .to_string(),
            ));
        }

        let user = UserRepository::update_profile(
            pool,
            user_id,
            req.name.as_deref(),
            req.email.as_deref(),
        )
        .await?;

        Ok(user.to_response())
    }

    /// Store a resized avatar and point the profile at it
    pub async fn upload_photo(
        pool: &PgPool,
        config: &Config,
        user_id: Uuid,
        payload: Multipart,
    ) -> Result<UserResponse, ApiError> {
        let uploads = media::collect_images(payload).await?;
        let upload = uploads
            .iter()
            .find(|u| u.field_name == "photo")
            .or_else(|| uploads.first())
            .ok_or_else(|| ApiError::InvalidInput("No photo in upload".to_string()))?;

        let (w, h) = media::USER_PHOTO_SIZE;
        let jpeg = media::resize_to_jpeg(&upload.data, w, h)?;

        let filename = format!("user-{}-{}.jpeg", user_id, Utc::now().timestamp_millis());
        let dir = format!("{}/img/users", config.upload_dir);
        media::save_image(&dir, &filename, &jpeg).await?;

        let user = UserRepository::update_photo(pool, user_id, &filename).await?;
        Ok(user.to_response())
    }

    /// Soft delete of the caller's own account
    pub async fn delete_me(pool: &PgPool, user_id: Uuid) -> Result<(), ApiError> {
        UserRepository::deactivate(pool, user_id).await
    }

    /// Admin update of profile fields and role
    pub async fn admin_update(
        pool: &PgPool,
        id: Uuid,
        req: AdminUpdateUserRequest,
    ) -> Result<UserResponse, ApiError> {
        let user = UserRepository::admin_update(
            pool,
            id,
            req.name.as_deref(),
            req.email.as_deref(),
            req.role,
        )
        .await?;

        Ok(user.to_response())
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
        UserRepository::delete_user(pool, id).await
    }
}
