//! Repository traits the engine and services are written against.
//!
//! Calls are synchronous, matching the diesel connection pool underneath;
//! handlers call them directly the same way they would issue a diesel query.

pub mod pg;

#[cfg(test)]
pub mod memory;

use uuid::Uuid;

use rishta_shared::errors::AppResult;
use rishta_shared::types::PaginationParams;

use crate::models::{
    Gender, Interest, InterestStatus, Match, Message, NewMessage, NewUser, Profile, ProfileFields,
    ProfileStatus, User, UserChanges,
};

pub use pg::PgStore;

pub trait AccountStore {
    /// Fails with `EmailAlreadyExists` when the email is taken.
    fn insert_user(&self, new: NewUser) -> AppResult<User>;
    fn find_user(&self, id: Uuid) -> AppResult<Option<User>>;
    fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;
    fn find_users(&self, ids: &[Uuid]) -> AppResult<Vec<User>>;
    fn update_user(&self, id: Uuid, changes: UserChanges) -> AppResult<User>;
    /// Removes the user and everything that references it.
    fn delete_user(&self, id: Uuid) -> AppResult<bool>;
}

pub trait ProfileStore {
    fn find_profile(&self, id: Uuid) -> AppResult<Option<Profile>>;
    fn find_profile_by_user(&self, user_id: Uuid) -> AppResult<Option<Profile>>;
    fn find_profiles_by_users(&self, user_ids: &[Uuid]) -> AppResult<Vec<Profile>>;
    /// Creates or replaces the user's profile. `image` is only written when
    /// present. Returns the row and whether it was created.
    fn upsert_profile(
        &self,
        user_id: Uuid,
        fields: &ProfileFields,
        image: Option<String>,
    ) -> AppResult<(Profile, bool)>;
    fn delete_profile_by_user(&self, user_id: Uuid) -> AppResult<bool>;
    fn touch_profile(&self, user_id: Uuid) -> AppResult<()>;
    fn browse_profiles(&self, query: &BrowseQuery) -> AppResult<Vec<Profile>>;
    /// Profiles in the given moderation state, newest first.
    fn profiles_by_status(&self, status: ProfileStatus, limit: i64) -> AppResult<Vec<Profile>>;
    /// Fails with `ProfileNotFound` for an unknown id.
    fn set_profile_status(&self, id: Uuid, status: ProfileStatus) -> AppResult<Profile>;

    /// `false` when the entry already existed.
    fn shortlist_add(&self, owner_profile_id: Uuid, profile_id: Uuid) -> AppResult<bool>;
    fn shortlist_remove(&self, owner_profile_id: Uuid, profile_id: Uuid) -> AppResult<bool>;
    fn shortlist(&self, owner_profile_id: Uuid) -> AppResult<Vec<Profile>>;
}

pub trait InterestStore {
    fn find_interest(&self, id: Uuid) -> AppResult<Option<Interest>>;
    /// Inserts a pending interest unless one already exists for the ordered
    /// pair. Returns the stored row and whether this call inserted it.
    fn insert_interest(&self, from: Uuid, to: Uuid) -> AppResult<(Interest, bool)>;
    fn set_interest_status(&self, id: Uuid, status: InterestStatus) -> AppResult<Interest>;
    /// Sets the status of the interests in both directions between `a` and `b`.
    fn set_pair_interest_status(&self, a: Uuid, b: Uuid, status: InterestStatus) -> AppResult<usize>;
    /// Deletes the `from -> to` interest only while it is still pending.
    fn delete_pending_interest(&self, from: Uuid, to: Uuid) -> AppResult<bool>;
    /// Received interests, newest first.
    fn interests_to(&self, user: Uuid) -> AppResult<Vec<Interest>>;
    /// Sent interests, newest first.
    fn interests_from(&self, user: Uuid) -> AppResult<Vec<Interest>>;
    fn count_pending_to(&self, user: Uuid) -> AppResult<i64>;
}

/// Result of removing a member from a match's sender set.
#[derive(Debug, Clone, PartialEq)]
pub enum Withdrawal {
    /// No match with that id.
    Missing,
    /// The user had not expressed interest on this match.
    NotSent,
    /// Both members have expressed interest; nothing was changed.
    Mutual(Match),
    /// The user was the only sender, so the match (and its messages) was deleted.
    Deleted(Match),
}

pub trait MatchStore {
    fn find_match(&self, id: Uuid) -> AppResult<Option<Match>>;
    fn find_match_by_pair(&self, a: Uuid, b: Uuid) -> AppResult<Option<Match>>;
    /// Every match containing `user`, most recently updated first.
    fn matches_for(&self, user: Uuid) -> AppResult<Vec<Match>>;
    /// Creates the match for `{a, b}` or adds `senders` to its sender set, in
    /// one atomic statement. `senders` must contain at least one member.
    fn add_interest_flags(&self, a: Uuid, b: Uuid, senders: &[Uuid]) -> AppResult<Match>;
    /// Removes `user` from the sender set under a row lock. A mutual match is
    /// left untouched and a set that would become empty deletes the match.
    fn withdraw_interest(&self, match_id: Uuid, user: Uuid) -> AppResult<Withdrawal>;
    /// Deletes the match and its messages in one transaction, optionally
    /// marking the pair's interests rejected in the same unit. Returns the
    /// number of messages removed.
    fn dissolve_match(&self, pair: &Match, reject_interests: bool) -> AppResult<usize>;
}

pub trait MessageStore {
    fn insert_message(&self, new: NewMessage) -> AppResult<Message>;
    fn find_message(&self, id: Uuid) -> AppResult<Option<Message>>;
    /// One page of a conversation, oldest first, with the total count.
    fn messages_for_match(
        &self,
        match_id: Uuid,
        page: &PaginationParams,
    ) -> AppResult<(Vec<Message>, u64)>;
    fn last_message(&self, match_id: Uuid) -> AppResult<Option<Message>>;
    fn delete_message(&self, id: Uuid) -> AppResult<bool>;
}

pub trait Store:
    AccountStore + ProfileStore + InterestStore + MatchStore + MessageStore + Send + Sync
{
    /// Storage health probe.
    fn ping(&self) -> AppResult<()>;
}

/// Candidate filter for the browse pool.
#[derive(Debug, Clone, Default)]
pub struct BrowseQuery {
    pub viewer: Uuid,
    /// `None` admits every gender.
    pub gender: Option<Gender>,
    pub exclude_users: Vec<Uuid>,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
    pub muslim_only: bool,
    pub city: Option<String>,
    pub education: Option<String>,
    pub profession: Option<String>,
    pub limit: i64,
}

#[cfg(test)]
impl BrowseQuery {
    /// Profile-level predicate; account activity is checked by the store.
    pub fn admits(&self, profile: &Profile) -> bool {
        profile.user_id != self.viewer
            && !self.exclude_users.contains(&profile.user_id)
            && self.gender.map_or(true, |g| profile.gender == g)
            && self.min_age.map_or(true, |min| profile.age >= min)
            && self.max_age.map_or(true, |max| profile.age <= max)
            && (!self.muslim_only || profile.is_muslim)
            && contains_ci(Some(&profile.city), self.city.as_deref())
            && contains_ci(Some(&profile.education), self.education.as_deref())
            && contains_ci(profile.profession.as_ref(), self.profession.as_deref())
    }
}

#[cfg(test)]
fn contains_ci(value: Option<&String>, needle: Option<&str>) -> bool {
    match needle {
        None => true,
        Some(needle) => value
            .map(|v| v.to_lowercase().contains(&needle.to_lowercase()))
            .unwrap_or(false),
    }
}

/// `%needle%` with LIKE wildcards in the needle escaped.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Lah"), "%Lah%");
        assert_eq!(like_pattern("50%_a\\b"), "%50\\%\\_a\\\\b%");
    }

    #[test]
    fn admits_applies_every_facet() {
        let viewer = Uuid::new_v4();
        let mut profile = fixtures::profile(Uuid::new_v4(), Gender::Female, "Lahore");
        profile.age = 26;
        profile.profession = Some("Software Engineer".into());

        let mut query = BrowseQuery {
            viewer,
            gender: Some(Gender::Female),
            min_age: Some(25),
            max_age: Some(30),
            muslim_only: true,
            city: Some("lah".into()),
            profession: Some("engineer".into()),
            limit: 100,
            ..Default::default()
        };
        assert!(query.admits(&profile));

        query.max_age = Some(25);
        assert!(!query.admits(&profile));
        query.max_age = None;

        query.gender = Some(Gender::Male);
        assert!(!query.admits(&profile));
        query.gender = None;

        query.exclude_users = vec![profile.user_id];
        assert!(!query.admits(&profile));
        query.exclude_users.clear();

        profile.profession = None;
        assert!(!query.admits(&profile));
    }

    #[test]
    fn admits_never_returns_the_viewer() {
        let profile = fixtures::profile(Uuid::new_v4(), Gender::Male, "Karachi");
        let query = BrowseQuery { viewer: profile.user_id, limit: 100, ..Default::default() };
        assert!(!query.admits(&profile));
    }
}
