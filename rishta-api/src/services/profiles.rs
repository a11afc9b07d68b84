use serde::Deserialize;
use uuid::Uuid;

use rishta_shared::errors::{AppError, AppResult, ErrorCode};
use rishta_shared::types::auth::UserRole;

use crate::format::{AssetUrls, BrowseCard};
use crate::models::{Gender, GenderPreference, Profile, ProfileFields, ProfileStatus};
use crate::store::Store;

const MIN_AGE: i32 = 18;

/// Interests arrive either as a list or as comma-separated text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum InterestsInput {
    List(Vec<String>),
    Text(String),
}

impl InterestsInput {
    fn into_text(self) -> Option<String> {
        let joined = match self {
            InterestsInput::List(items) => items
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
            InterestsInput::Text(text) => text.trim().to_string(),
        };
        (!joined.is_empty()).then_some(joined)
    }
}

/// Create-or-update payload. Everything is optional on the wire so that
/// missing required fields can be reported together.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileInput {
    pub full_name: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub is_muslim: Option<bool>,
    pub sect: Option<String>,
    pub city: Option<String>,
    pub education: Option<String>,
    pub profession: Option<String>,
    pub about: Option<String>,
    pub interests: Option<InterestsInput>,
    pub height_cm: Option<i32>,
    pub marital_status: Option<String>,
    /// Opaque photo reference; the previous one is kept when absent.
    pub image: Option<String>,
    pub gender_preference: Option<String>,
}

fn text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl ProfileInput {
    /// Checks required fields and value ranges, producing the columns to store.
    pub fn into_fields(self) -> AppResult<(ProfileFields, Option<String>)> {
        let full_name = text(self.full_name);
        let gender = text(self.gender);
        let city = text(self.city);
        let education = text(self.education);

        let mut missing = Vec::new();
        if full_name.is_none() {
            missing.push("full_name");
        }
        if gender.is_none() {
            missing.push("gender");
        }
        if self.age.is_none() {
            missing.push("age");
        }
        if city.is_none() {
            missing.push("city");
        }
        if education.is_none() {
            missing.push("education");
        }

        let (Some(full_name), Some(gender), Some(age), Some(city), Some(education)) =
            (full_name, gender, self.age, city, education)
        else {
            return Err(AppError::with_details(
                ErrorCode::ValidationError,
                format!("missing required fields: {}", missing.join(", ")),
                serde_json::json!({ "missing_fields": missing }),
            ));
        };

        let gender: Gender = gender
            .parse()
            .map_err(|_| AppError::new(ErrorCode::ValidationError, "gender must be male or female"))?;
        if age < MIN_AGE {
            return Err(AppError::new(
                ErrorCode::ValidationError,
                format!("age must be at least {MIN_AGE}"),
            ));
        }
        if self.height_cm.is_some_and(|h| !(50..=300).contains(&h)) {
            return Err(AppError::new(ErrorCode::ValidationError, "height must be between 50 and 300 cm"));
        }
        let gender_preference = match text(self.gender_preference) {
            Some(p) => p.parse::<GenderPreference>().map_err(|_| {
                AppError::new(ErrorCode::ValidationError, "gender_preference must be opposite, same or all")
            })?,
            None => GenderPreference::default(),
        };

        let fields = ProfileFields {
            full_name,
            gender,
            age,
            is_muslim: self.is_muslim.unwrap_or(true),
            sect: text(self.sect),
            city,
            education,
            profession: text(self.profession),
            about: text(self.about),
            interests: self.interests.and_then(InterestsInput::into_text),
            height_cm: self.height_cm,
            marital_status: text(self.marital_status),
            gender_preference,
        };
        Ok((fields, text(self.image)))
    }
}

/// Creates the caller's profile, or replaces it when one exists.
pub fn save_profile<S: Store + ?Sized>(
    store: &S,
    user_id: Uuid,
    input: ProfileInput,
) -> AppResult<(Profile, bool)> {
    let (fields, image) = input.into_fields()?;
    if store.find_user(user_id)?.is_none() {
        return Err(AppError::new(ErrorCode::UserNotFound, "user not found"));
    }
    let (profile, created) = store.upsert_profile(user_id, &fields, image)?;
    tracing::info!(user_id = %user_id, profile_id = %profile.id, created, "profile saved");
    Ok((profile, created))
}

pub fn my_profile<S: Store + ?Sized>(store: &S, user_id: Uuid) -> AppResult<Profile> {
    store
        .find_profile_by_user(user_id)?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))
}

pub fn delete_profile<S: Store + ?Sized>(store: &S, user_id: Uuid) -> AppResult<()> {
    if !store.delete_profile_by_user(user_id)? {
        return Err(AppError::new(ErrorCode::ProfileNotFound, "profile not found"));
    }
    tracing::info!(user_id = %user_id, "profile deleted");
    Ok(())
}

/// Profiles that passed moderation, newest first.
pub fn approved_profiles<S: Store + ?Sized>(
    store: &S,
    assets: &AssetUrls,
    limit: i64,
) -> AppResult<Vec<BrowseCard>> {
    Ok(store
        .profiles_by_status(ProfileStatus::Approved, limit)?
        .iter()
        .map(|p| BrowseCard::new(p, assets))
        .collect())
}

/// Moderation decision on a profile. Admins only.
pub fn set_profile_status<S: Store + ?Sized>(
    store: &S,
    role: UserRole,
    profile_id: Uuid,
    status: &str,
) -> AppResult<Profile> {
    if role != UserRole::Admin {
        return Err(AppError::forbidden("only admins can moderate profiles"));
    }
    let status: ProfileStatus = status.trim().parse().map_err(|_| {
        AppError::new(ErrorCode::ValidationError, "status must be pending, approved or rejected")
    })?;
    let profile = store.set_profile_status(profile_id, status)?;
    tracing::info!(profile_id = %profile_id, status = %status, "profile status changed");
    Ok(profile)
}

pub fn shortlist_add<S: Store + ?Sized>(store: &S, user_id: Uuid, profile_id: Uuid) -> AppResult<()> {
    let owner = my_profile(store, user_id)?;
    if owner.id == profile_id {
        return Err(AppError::new(ErrorCode::CannotShortlistSelf, "cannot shortlist your own profile"));
    }
    if store.find_profile(profile_id)?.is_none() {
        return Err(AppError::new(ErrorCode::ProfileNotFound, "profile not found"));
    }
    if !store.shortlist_add(owner.id, profile_id)? {
        return Err(AppError::new(ErrorCode::AlreadyShortlisted, "profile already in shortlist"));
    }
    Ok(())
}

/// Returns whether an entry was removed.
pub fn shortlist_remove<S: Store + ?Sized>(store: &S, user_id: Uuid, profile_id: Uuid) -> AppResult<bool> {
    let owner = my_profile(store, user_id)?;
    store.shortlist_remove(owner.id, profile_id)
}

pub fn shortlist<S: Store + ?Sized>(
    store: &S,
    assets: &AssetUrls,
    user_id: Uuid,
) -> AppResult<Vec<BrowseCard>> {
    let owner = my_profile(store, user_id)?;
    Ok(store
        .shortlist(owner.id)?
        .iter()
        .map(|p| BrowseCard::new(p, assets))
        .collect())
}
