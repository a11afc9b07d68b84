//! Response shapes for the read side, and photo URL resolution.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use rishta_shared::errors::AppResult;

use crate::engine::PairStatus;
use crate::models::{
    Gender, GenderPreference, Interest, InterestStatus, Match, Message, Profile, ProfileStatus, User,
};
use crate::store::Store;

const NOT_SPECIFIED: &str = "Not specified";

/// Turns stored photo references into absolute URLs under the public base URL.
#[derive(Debug, Clone)]
pub struct AssetUrls {
    base_url: String,
}

impl AssetUrls {
    pub fn new(base_url: &str) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_string() }
    }

    /// Absolute URLs pass through, relative references are joined onto the
    /// base URL, and a missing photo falls back to the avatar for `gender`.
    pub fn resolve(&self, image: Option<&str>, gender: Option<Gender>) -> String {
        match image.map(str::trim).filter(|i| !i.is_empty()) {
            None => self.default_avatar(gender),
            Some(i) if i.starts_with("http://") || i.starts_with("https://") => i.to_string(),
            Some(i) => format!("{}/{}", self.base_url, i.trim_start_matches('/')),
        }
    }

    pub fn default_avatar(&self, gender: Option<Gender>) -> String {
        let file = match gender {
            Some(Gender::Male) => "male-avatar.png",
            Some(Gender::Female) => "female-avatar.png",
            None => "default-avatar.png",
        };
        format!("{}/assets/{file}", self.base_url)
    }
}

/// Types carrying a user whose online flag is filled from presence.
pub trait Presence {
    fn presence_user(&self) -> Uuid;
    fn set_online(&mut self, online: bool);
}

/// Short summary of another user, embedded in match, feed and browse results.
#[derive(Debug, Clone, Serialize)]
pub struct PersonCard {
    pub user_id: Uuid,
    pub profile_id: Option<Uuid>,
    pub name: String,
    pub image: String,
    pub age: Option<i32>,
    pub city: Option<String>,
    pub profession: Option<String>,
    pub online: bool,
}

impl PersonCard {
    pub fn new(user: &User, profile: Option<&Profile>, assets: &AssetUrls) -> Self {
        let gender = profile.map(|p| p.gender).or(user.gender);
        Self {
            user_id: user.id,
            profile_id: profile.map(|p| p.id),
            name: profile.map_or_else(|| user.name.clone(), |p| p.full_name.clone()),
            image: assets.resolve(profile.and_then(|p| p.image.as_deref()), gender),
            age: profile.map(|p| p.age),
            city: profile.map(|p| p.city.clone()),
            profession: profile.and_then(|p| p.profession.clone()),
            online: false,
        }
    }
}

impl Presence for PersonCard {
    fn presence_user(&self) -> Uuid {
        self.user_id
    }

    fn set_online(&mut self, online: bool) {
        self.online = online;
    }
}

/// Users and profiles for a set of ids, loaded in two queries.
pub struct Directory {
    users: HashMap<Uuid, User>,
    profiles: HashMap<Uuid, Profile>,
}

impl Directory {
    pub fn load<S: Store + ?Sized>(store: &S, user_ids: &[Uuid]) -> AppResult<Self> {
        let users = store
            .find_users(user_ids)?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();
        let profiles = store
            .find_profiles_by_users(user_ids)?
            .into_iter()
            .map(|p| (p.user_id, p))
            .collect();
        Ok(Self { users, profiles })
    }

    /// `None` when the user no longer exists.
    pub fn card(&self, user_id: Uuid, assets: &AssetUrls) -> Option<PersonCard> {
        let user = self.users.get(&user_id)?;
        Some(PersonCard::new(user, self.profiles.get(&user_id), assets))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchView {
    pub id: Uuid,
    pub status: PairStatus,
    pub interest_sent_by: Vec<Uuid>,
    /// The viewer is among the senders.
    pub interest_sent: bool,
    pub is_mutual: bool,
    pub other_user: PersonCard,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MatchView {
    pub fn new(pair: &Match, viewer: Uuid, other_user: PersonCard) -> Self {
        Self {
            id: pair.id,
            status: PairStatus::of(pair),
            interest_sent_by: pair.interest_sent_by(),
            interest_sent: pair.has_sent(viewer),
            is_mutual: pair.is_mutual(),
            other_user,
            created_at: pair.created_at,
            updated_at: pair.updated_at,
        }
    }
}

impl Presence for MatchView {
    fn presence_user(&self) -> Uuid {
        self.other_user.user_id
    }

    fn set_online(&mut self, online: bool) {
        self.other_user.online = online;
    }
}

/// Candidate card in the browse pool.
#[derive(Debug, Clone, Serialize)]
pub struct BrowseCard {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub age: i32,
    pub gender: Gender,
    pub profession: String,
    pub location: String,
    pub education: String,
    pub religion: String,
    pub height: String,
    pub marital_status: String,
    pub about: String,
    pub interests: Vec<String>,
    pub image: String,
    pub verified: bool,
    pub online: bool,
}

fn or_not_specified(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(NOT_SPECIFIED)
        .to_string()
}

impl BrowseCard {
    pub fn new(profile: &Profile, assets: &AssetUrls) -> Self {
        Self {
            id: profile.id,
            user_id: profile.user_id,
            name: profile.full_name.clone(),
            age: profile.age,
            gender: profile.gender,
            profession: or_not_specified(profile.profession.as_deref()),
            location: or_not_specified(Some(profile.city.as_str())),
            education: or_not_specified(Some(profile.education.as_str())),
            religion: if profile.is_muslim {
                "Muslim".into()
            } else {
                NOT_SPECIFIED.into()
            },
            height: profile
                .height_cm
                .map_or_else(|| NOT_SPECIFIED.to_string(), |h| format!("{h} cm")),
            marital_status: or_not_specified(profile.marital_status.as_deref()),
            about: profile
                .about
                .clone()
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| "No description provided".into()),
            interests: profile.interest_list(),
            image: assets.resolve(profile.image.as_deref(), Some(profile.gender)),
            verified: profile.status == ProfileStatus::Approved,
            online: false,
        }
    }
}

impl Presence for BrowseCard {
    fn presence_user(&self) -> Uuid {
        self.user_id
    }

    fn set_online(&mut self, online: bool) {
        self.online = online;
    }
}

/// The owner's own profile with its photo resolved.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub gender: Gender,
    pub age: i32,
    pub is_muslim: bool,
    pub sect: Option<String>,
    pub city: String,
    pub education: String,
    pub profession: Option<String>,
    pub about: Option<String>,
    pub interests: Vec<String>,
    pub height_cm: Option<i32>,
    pub marital_status: Option<String>,
    pub image: String,
    pub has_photo: bool,
    pub gender_preference: GenderPreference,
    pub status: ProfileStatus,
    pub verified: bool,
    pub last_active: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileView {
    pub fn new(p: Profile, assets: &AssetUrls) -> Self {
        Self {
            image: assets.resolve(p.image.as_deref(), Some(p.gender)),
            has_photo: p.image.is_some(),
            interests: p.interest_list(),
            id: p.id,
            user_id: p.user_id,
            full_name: p.full_name,
            gender: p.gender,
            age: p.age,
            is_muslim: p.is_muslim,
            sect: p.sect,
            city: p.city,
            education: p.education,
            profession: p.profession,
            about: p.about,
            height_cm: p.height_cm,
            marital_status: p.marital_status,
            gender_preference: p.gender_preference,
            status: p.status,
            verified: p.status == ProfileStatus::Approved,
            last_active: p.last_active,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// A received interest in the notification feed.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub status: InterestStatus,
    pub from: PersonCard,
    pub message: String,
    /// Anything already answered counts as read.
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(interest: &Interest, from: PersonCard) -> Self {
        Self {
            id: interest.id,
            kind: "interest",
            status: interest.status,
            message: format!("{} sent you an interest", from.name),
            from,
            read: interest.status != InterestStatus::Pending,
            created_at: interest.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationFeed {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SentInterest {
    pub id: Uuid,
    pub status: InterestStatus,
    pub to: PersonCard,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    pub id: Uuid,
    pub match_id: Uuid,
    pub sender_id: Uuid,
    pub text: String,
    pub is_mine: bool,
    pub created_at: DateTime<Utc>,
}

impl MessageView {
    pub fn new(message: Message, viewer: Uuid) -> Self {
        Self {
            is_mine: message.sender_id == viewer,
            id: message.id,
            match_id: message.match_id,
            sender_id: message.sender_id,
            text: message.text,
            created_at: message.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationView {
    pub match_id: Uuid,
    pub other_user: PersonCard,
    pub last_message: Option<MessageView>,
    pub updated_at: DateTime<Utc>,
}

impl Presence for ConversationView {
    fn presence_user(&self) -> Uuid {
        self.other_user.user_id
    }

    fn set_online(&mut self, online: bool) {
        self.other_user.online = online;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures;

    #[test]
    fn resolve_handles_absolute_relative_and_missing() {
        let assets = AssetUrls::new("https://cdn.rishta.test/");
        assert_eq!(
            assets.resolve(Some("https://img.example/a.jpg"), None),
            "https://img.example/a.jpg"
        );
        assert_eq!(
            assets.resolve(Some("/uploads/a.jpg"), None),
            "https://cdn.rishta.test/uploads/a.jpg"
        );
        assert_eq!(
            assets.resolve(Some("uploads/a.jpg"), None),
            "https://cdn.rishta.test/uploads/a.jpg"
        );
        assert_eq!(
            assets.resolve(None, Some(Gender::Female)),
            "https://cdn.rishta.test/assets/female-avatar.png"
        );
        assert_eq!(
            assets.resolve(Some("  "), None),
            "https://cdn.rishta.test/assets/default-avatar.png"
        );
    }

    #[test]
    fn browse_card_fills_placeholders() {
        let assets = AssetUrls::new("http://localhost:3000");
        let mut profile = fixtures::profile(Uuid::new_v4(), Gender::Male, "Lahore");
        profile.profession = None;
        profile.height_cm = Some(178);
        profile.is_muslim = false;

        let card = BrowseCard::new(&profile, &assets);
        assert_eq!(card.profession, NOT_SPECIFIED);
        assert_eq!(card.religion, NOT_SPECIFIED);
        assert_eq!(card.height, "178 cm");
        assert_eq!(card.about, "No description provided");
        assert_eq!(card.interests, vec!["reading", "travel"]);
        assert_eq!(card.image, "http://localhost:3000/assets/male-avatar.png");
    }

    #[test]
    fn notification_is_read_once_answered() {
        let now = Utc::now();
        let mut interest = Interest {
            id: Uuid::new_v4(),
            from_user: Uuid::new_v4(),
            to_user: Uuid::new_v4(),
            status: InterestStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        let card = PersonCard {
            user_id: interest.from_user,
            profile_id: None,
            name: "Ali".into(),
            image: String::new(),
            age: None,
            city: None,
            profession: None,
            online: false,
        };
        let pending = Notification::new(&interest, card.clone());
        assert!(!pending.read);
        assert_eq!(pending.message, "Ali sent you an interest");

        interest.status = InterestStatus::Rejected;
        assert!(Notification::new(&interest, card).read);
    }
}
