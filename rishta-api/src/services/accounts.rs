use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use rishta_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{Gender, NewUser, NotificationSettings, PrivacySettings, User, UserChanges};
use crate::store::Store;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::internal(format!("invalid password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < 8 {
        return Err(AppError::new(ErrorCode::PasswordTooWeak, "password must be at least 8 characters"));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::new(ErrorCode::PasswordTooWeak, "password must contain at least one number"));
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::new(ErrorCode::PasswordTooWeak, "password must contain at least one letter"));
    }
    Ok(())
}

fn invalid(e: validator::ValidationErrors) -> AppError {
    AppError::new(ErrorCode::ValidationError, e.to_string())
}

fn settings_json<T: Serialize>(value: &T) -> AppResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.into()))
}

fn load_user<S: Store + ?Sized>(store: &S, user_id: Uuid) -> AppResult<User> {
    store
        .find_user(user_id)?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "user not found"))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
}

pub fn signup<S: Store + ?Sized>(store: &S, req: SignupRequest) -> AppResult<User> {
    req.validate().map_err(invalid)?;
    validate_password(&req.password)?;

    let new_user = NewUser {
        email: req.email.trim().to_lowercase(),
        password_hash: hash_password(&req.password)?,
        name: req.name.trim().to_string(),
        phone: req.phone,
        date_of_birth: req.date_of_birth,
        gender: req.gender,
        privacy_settings: settings_json(&PrivacySettings::default())?,
        notification_settings: settings_json(&NotificationSettings::default())?,
    };
    let user = store.insert_user(new_user)?;
    tracing::info!(user_id = %user.id, "account created");
    Ok(user)
}

#[derive(Debug, Serialize)]
pub struct AccountInfo {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct SettingsView {
    pub account: AccountInfo,
    pub privacy_settings: PrivacySettings,
    pub notification_settings: NotificationSettings,
}

impl From<&User> for SettingsView {
    fn from(user: &User) -> Self {
        Self {
            account: AccountInfo {
                id: user.id,
                name: user.name.clone(),
                email: user.email.clone(),
                phone: user.phone.clone(),
                date_of_birth: user.date_of_birth,
                gender: user.gender,
                is_active: user.is_active,
            },
            privacy_settings: user.privacy(),
            notification_settings: user.notifications(),
        }
    }
}

pub fn settings<S: Store + ?Sized>(store: &S, user_id: Uuid) -> AppResult<SettingsView> {
    Ok(SettingsView::from(&load_user(store, user_id)?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AccountUpdate {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "invalid email format"))]
    pub email: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
}

pub fn update_account<S: Store + ?Sized>(
    store: &S,
    user_id: Uuid,
    req: AccountUpdate,
) -> AppResult<SettingsView> {
    req.validate().map_err(invalid)?;
    let changes = UserChanges {
        name: req.name.map(|n| n.trim().to_string()),
        email: req.email.map(|e| e.trim().to_lowercase()),
        phone: req.phone,
        date_of_birth: req.date_of_birth,
        gender: req.gender,
        ..Default::default()
    };
    Ok(SettingsView::from(&store.update_user(user_id, changes)?))
}

#[derive(Debug, Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

pub fn change_password<S: Store + ?Sized>(store: &S, user_id: Uuid, req: PasswordChange) -> AppResult<()> {
    let user = load_user(store, user_id)?;
    if !verify_password(&req.current_password, &user.password_hash)? {
        return Err(AppError::new(ErrorCode::InvalidCredentials, "current password is incorrect"));
    }
    validate_password(&req.new_password)?;

    let changes = UserChanges {
        password_hash: Some(hash_password(&req.new_password)?),
        ..Default::default()
    };
    store.update_user(user_id, changes)?;
    tracing::info!(user_id = %user_id, "password changed");
    Ok(())
}

pub fn update_privacy<S: Store + ?Sized>(
    store: &S,
    user_id: Uuid,
    privacy: PrivacySettings,
) -> AppResult<PrivacySettings> {
    let changes = UserChanges {
        privacy_settings: Some(settings_json(&privacy)?),
        ..Default::default()
    };
    Ok(store.update_user(user_id, changes)?.privacy())
}

pub fn update_notifications<S: Store + ?Sized>(
    store: &S,
    user_id: Uuid,
    notifications: NotificationSettings,
) -> AppResult<NotificationSettings> {
    let changes = UserChanges {
        notification_settings: Some(settings_json(&notifications)?),
        ..Default::default()
    };
    Ok(store.update_user(user_id, changes)?.notifications())
}

/// Inactive accounts are hidden from every browse pool.
pub fn set_active<S: Store + ?Sized>(store: &S, user_id: Uuid, active: bool) -> AppResult<bool> {
    let changes = UserChanges { is_active: Some(active), ..Default::default() };
    let user = store.update_user(user_id, changes)?;
    tracing::info!(user_id = %user_id, active, "account activation changed");
    Ok(user.is_active)
}

pub fn delete_account<S: Store + ?Sized>(store: &S, user_id: Uuid) -> AppResult<()> {
    if !store.delete_user(user_id)? {
        return Err(AppError::new(ErrorCode::UserNotFound, "user not found"));
    }
    tracing::info!(user_id = %user_id, "account deleted");
    Ok(())
}
