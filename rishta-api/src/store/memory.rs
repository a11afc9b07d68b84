//! In-memory store used by the unit tests. Every operation runs under one mutex.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use rishta_shared::errors::{AppError, AppResult, ErrorCode};
use rishta_shared::types::PaginationParams;

use super::{
    AccountStore, BrowseQuery, InterestStore, MatchStore, MessageStore, ProfileStore, Store,
    Withdrawal,
};
use crate::models::{
    sorted_pair, Interest, InterestStatus, Match, Message, NewMatch, NewMessage, NewUser, Profile,
    ProfileFields, ProfileStatus, User, UserChanges,
};

#[derive(Default)]
struct State {
    ticks: i64,
    users: Vec<User>,
    profiles: Vec<Profile>,
    shortlist: Vec<(Uuid, Uuid)>,
    interests: Vec<Interest>,
    matches: Vec<Match>,
    messages: Vec<Message>,
}

impl State {
    /// Strictly increasing clock so "newest first" orderings are deterministic.
    fn now(&mut self) -> DateTime<Utc> {
        self.ticks += 1;
        DateTime::<Utc>::UNIX_EPOCH + Duration::days(20_000) + Duration::milliseconds(self.ticks)
    }

    fn remove_match(&mut self, id: Uuid) -> bool {
        let before = self.matches.len();
        self.matches.retain(|m| m.id != id);
        self.messages.retain(|msg| msg.match_id != id);
        self.matches.len() != before
    }

    fn remove_profile(&mut self, id: Uuid) {
        self.profiles.retain(|p| p.id != id);
        self.shortlist.retain(|(owner, saved)| *owner != id && *saved != id);
    }
}

type WithdrawHook = Box<dyn FnOnce(&MemoryStore) + Send>;

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    before_withdraw: Mutex<Option<WithdrawHook>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }

    /// Every persisted match, for invariant checks.
    pub fn all_matches(&self) -> Vec<Match> {
        self.with(|s| s.matches.clone())
    }

    pub fn all_interests(&self) -> Vec<Interest> {
        self.with(|s| s.interests.clone())
    }

    pub fn message_count(&self) -> usize {
        self.with(|s| s.messages.len())
    }

    /// Runs `f` once, right before the next `withdraw_interest` takes the lock,
    /// to interleave a concurrent writer.
    pub fn before_next_withdraw(&self, f: impl FnOnce(&MemoryStore) + Send + 'static) {
        *self.before_withdraw.lock().unwrap_or_else(|e| e.into_inner()) = Some(Box::new(f));
    }
}

impl AccountStore for MemoryStore {
    fn insert_user(&self, new: NewUser) -> AppResult<User> {
        self.with(|s| {
            if s.users.iter().any(|u| u.email == new.email) {
                return Err(AppError::new(ErrorCode::EmailAlreadyExists, "email already registered"));
            }
            let now = s.now();
            let user = User {
                id: Uuid::new_v4(),
                email: new.email,
                password_hash: new.password_hash,
                name: new.name,
                phone: new.phone,
                date_of_birth: new.date_of_birth,
                gender: new.gender,
                is_active: true,
                privacy_settings: new.privacy_settings,
                notification_settings: new.notification_settings,
                created_at: now,
                updated_at: now,
            };
            s.users.push(user.clone());
            Ok(user)
        })
    }

    fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.with(|s| s.users.iter().find(|u| u.id == id).cloned()))
    }

    fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let email = email.to_lowercase();
        Ok(self.with(|s| s.users.iter().find(|u| u.email == email).cloned()))
    }

    fn find_users(&self, ids: &[Uuid]) -> AppResult<Vec<User>> {
        Ok(self.with(|s| s.users.iter().filter(|u| ids.contains(&u.id)).cloned().collect()))
    }

    fn update_user(&self, id: Uuid, changes: UserChanges) -> AppResult<User> {
        self.with(|s| {
            if let Some(email) = &changes.email {
                if s.users.iter().any(|u| u.id != id && &u.email == email) {
                    return Err(AppError::new(ErrorCode::EmailAlreadyExists, "email already registered"));
                }
            }
            let now = s.now();
            let user = s
                .users
                .iter_mut()
                .find(|u| u.id == id)
                .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "user not found"))?;
            if let Some(v) = changes.email {
                user.email = v;
            }
            if let Some(v) = changes.password_hash {
                user.password_hash = v;
            }
            if let Some(v) = changes.name {
                user.name = v;
            }
            if let Some(v) = changes.phone {
                user.phone = Some(v);
            }
            if let Some(v) = changes.date_of_birth {
                user.date_of_birth = Some(v);
            }
            if let Some(v) = changes.gender {
                user.gender = Some(v);
            }
            if let Some(v) = changes.is_active {
                user.is_active = v;
            }
            if let Some(v) = changes.privacy_settings {
                user.privacy_settings = v;
            }
            if let Some(v) = changes.notification_settings {
                user.notification_settings = v;
            }
            user.updated_at = now;
            Ok(user.clone())
        })
    }

    fn delete_user(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.with(|s| {
            let before = s.users.len();
            s.users.retain(|u| u.id != id);
            if s.users.len() == before {
                return false;
            }
            let owned: Vec<Uuid> = s.profiles.iter().filter(|p| p.user_id == id).map(|p| p.id).collect();
            for profile_id in owned {
                s.remove_profile(profile_id);
            }
            s.interests.retain(|i| i.from_user != id && i.to_user != id);
            let matches: Vec<Uuid> = s.matches.iter().filter(|m| m.has_member(id)).map(|m| m.id).collect();
            for match_id in matches {
                s.remove_match(match_id);
            }
            s.messages.retain(|m| m.sender_id != id);
            true
        }))
    }
}

impl ProfileStore for MemoryStore {
    fn find_profile(&self, id: Uuid) -> AppResult<Option<Profile>> {
        Ok(self.with(|s| s.profiles.iter().find(|p| p.id == id).cloned()))
    }

    fn find_profile_by_user(&self, user_id: Uuid) -> AppResult<Option<Profile>> {
        Ok(self.with(|s| s.profiles.iter().find(|p| p.user_id == user_id).cloned()))
    }

    fn find_profiles_by_users(&self, user_ids: &[Uuid]) -> AppResult<Vec<Profile>> {
        Ok(self.with(|s| {
            s.profiles.iter().filter(|p| user_ids.contains(&p.user_id)).cloned().collect()
        }))
    }

    fn upsert_profile(
        &self,
        user_id: Uuid,
        fields: &ProfileFields,
        image: Option<String>,
    ) -> AppResult<(Profile, bool)> {
        Ok(self.with(|s| {
            let now = s.now();
            if let Some(p) = s.profiles.iter_mut().find(|p| p.user_id == user_id) {
                apply_fields(p, fields);
                if image.is_some() {
                    p.image = image;
                }
                p.last_active = now;
                p.updated_at = now;
                return (p.clone(), false);
            }
            let mut profile = Profile {
                id: Uuid::new_v4(),
                user_id,
                full_name: String::new(),
                gender: fields.gender,
                age: 0,
                is_muslim: true,
                sect: None,
                city: String::new(),
                education: String::new(),
                profession: None,
                about: None,
                interests: None,
                height_cm: None,
                marital_status: None,
                image,
                gender_preference: fields.gender_preference,
                status: ProfileStatus::Pending,
                last_active: now,
                created_at: now,
                updated_at: now,
            };
            apply_fields(&mut profile, fields);
            s.profiles.push(profile.clone());
            (profile, true)
        }))
    }

    fn delete_profile_by_user(&self, user_id: Uuid) -> AppResult<bool> {
        Ok(self.with(|s| {
            match s.profiles.iter().find(|p| p.user_id == user_id).map(|p| p.id) {
                Some(id) => {
                    s.remove_profile(id);
                    true
                }
                None => false,
            }
        }))
    }

    fn touch_profile(&self, user_id: Uuid) -> AppResult<()> {
        self.with(|s| {
            let now = s.now();
            if let Some(p) = s.profiles.iter_mut().find(|p| p.user_id == user_id) {
                p.last_active = now;
            }
        });
        Ok(())
    }

    fn browse_profiles(&self, query: &BrowseQuery) -> AppResult<Vec<Profile>> {
        Ok(self.with(|s| {
            let mut pool: Vec<Profile> = s
                .profiles
                .iter()
                .filter(|p| s.users.iter().any(|u| u.id == p.user_id && u.is_active))
                .filter(|p| query.admits(p))
                .cloned()
                .collect();
            pool.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            pool.truncate(query.limit.max(0) as usize);
            pool
        }))
    }

    fn profiles_by_status(&self, status: ProfileStatus, limit: i64) -> AppResult<Vec<Profile>> {
        Ok(self.with(|s| {
            let mut found: Vec<Profile> = s.profiles.iter().filter(|p| p.status == status).cloned().collect();
            found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            found.truncate(limit.max(0) as usize);
            found
        }))
    }

    fn set_profile_status(&self, id: Uuid, status: ProfileStatus) -> AppResult<Profile> {
        self.with(|s| {
            let now = s.now();
            let profile = s
                .profiles
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;
            profile.status = status;
            profile.updated_at = now;
            Ok(profile.clone())
        })
    }

    fn shortlist_add(&self, owner_profile_id: Uuid, profile_id: Uuid) -> AppResult<bool> {
        Ok(self.with(|s| {
            let entry = (owner_profile_id, profile_id);
            if s.shortlist.contains(&entry) {
                return false;
            }
            s.shortlist.push(entry);
            true
        }))
    }

    fn shortlist_remove(&self, owner_profile_id: Uuid, profile_id: Uuid) -> AppResult<bool> {
        Ok(self.with(|s| {
            let before = s.shortlist.len();
            s.shortlist.retain(|e| *e != (owner_profile_id, profile_id));
            s.shortlist.len() != before
        }))
    }

    fn shortlist(&self, owner_profile_id: Uuid) -> AppResult<Vec<Profile>> {
        Ok(self.with(|s| {
            let mut saved: Vec<Profile> = s
                .profiles
                .iter()
                .filter(|p| s.shortlist.contains(&(owner_profile_id, p.id)))
                .cloned()
                .collect();
            saved.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            saved
        }))
    }
}

fn apply_fields(p: &mut Profile, f: &ProfileFields) {
    p.full_name = f.full_name.clone();
    p.gender = f.gender;
    p.age = f.age;
    p.is_muslim = f.is_muslim;
    p.sect = f.sect.clone();
    p.city = f.city.clone();
    p.education = f.education.clone();
    p.profession = f.profession.clone();
    p.about = f.about.clone();
    p.interests = f.interests.clone();
    p.height_cm = f.height_cm;
    p.marital_status = f.marital_status.clone();
    p.gender_preference = f.gender_preference;
}

impl InterestStore for MemoryStore {
    fn find_interest(&self, id: Uuid) -> AppResult<Option<Interest>> {
        Ok(self.with(|s| s.interests.iter().find(|i| i.id == id).cloned()))
    }

    fn insert_interest(&self, from: Uuid, to: Uuid) -> AppResult<(Interest, bool)> {
        Ok(self.with(|s| {
            if let Some(existing) = s.interests.iter().find(|i| i.from_user == from && i.to_user == to) {
                return (existing.clone(), false);
            }
            let now = s.now();
            let interest = Interest {
                id: Uuid::new_v4(),
                from_user: from,
                to_user: to,
                status: InterestStatus::Pending,
                created_at: now,
                updated_at: now,
            };
            s.interests.push(interest.clone());
            (interest, true)
        }))
    }

    fn set_interest_status(&self, id: Uuid, status: InterestStatus) -> AppResult<Interest> {
        self.with(|s| {
            let now = s.now();
            let interest = s
                .interests
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or_else(|| AppError::new(ErrorCode::InterestNotFound, "interest not found"))?;
            interest.status = status;
            interest.updated_at = now;
            Ok(interest.clone())
        })
    }

    fn set_pair_interest_status(&self, a: Uuid, b: Uuid, status: InterestStatus) -> AppResult<usize> {
        Ok(self.with(|s| {
            let now = s.now();
            let mut changed = 0;
            for i in s.interests.iter_mut().filter(|i| {
                (i.from_user == a && i.to_user == b) || (i.from_user == b && i.to_user == a)
            }) {
                i.status = status;
                i.updated_at = now;
                changed += 1;
            }
            changed
        }))
    }

    fn delete_pending_interest(&self, from: Uuid, to: Uuid) -> AppResult<bool> {
        Ok(self.with(|s| {
            let before = s.interests.len();
            s.interests.retain(|i| {
                !(i.from_user == from && i.to_user == to && i.status == InterestStatus::Pending)
            });
            s.interests.len() != before
        }))
    }

    fn interests_to(&self, user: Uuid) -> AppResult<Vec<Interest>> {
        Ok(self.with(|s| {
            let mut found: Vec<Interest> = s.interests.iter().filter(|i| i.to_user == user).cloned().collect();
            found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            found
        }))
    }

    fn interests_from(&self, user: Uuid) -> AppResult<Vec<Interest>> {
        Ok(self.with(|s| {
            let mut found: Vec<Interest> = s.interests.iter().filter(|i| i.from_user == user).cloned().collect();
            found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            found
        }))
    }

    fn count_pending_to(&self, user: Uuid) -> AppResult<i64> {
        Ok(self.with(|s| {
            s.interests
                .iter()
                .filter(|i| i.to_user == user && i.status == InterestStatus::Pending)
                .count() as i64
        }))
    }
}

impl MatchStore for MemoryStore {
    fn find_match(&self, id: Uuid) -> AppResult<Option<Match>> {
        Ok(self.with(|s| s.matches.iter().find(|m| m.id == id).cloned()))
    }

    fn find_match_by_pair(&self, a: Uuid, b: Uuid) -> AppResult<Option<Match>> {
        let (low, high) = sorted_pair(a, b);
        Ok(self.with(|s| {
            s.matches.iter().find(|m| m.user_low == low && m.user_high == high).cloned()
        }))
    }

    fn matches_for(&self, user: Uuid) -> AppResult<Vec<Match>> {
        Ok(self.with(|s| {
            let mut found: Vec<Match> = s.matches.iter().filter(|m| m.has_member(user)).cloned().collect();
            found.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            found
        }))
    }

    fn add_interest_flags(&self, a: Uuid, b: Uuid, senders: &[Uuid]) -> AppResult<Match> {
        let row = NewMatch::for_senders(a, b, senders);
        if !row.low_sent && !row.high_sent {
            return Err(AppError::internal("match must have at least one sender"));
        }
        Ok(self.with(|s| {
            let now = s.now();
            if let Some(m) = s
                .matches
                .iter_mut()
                .find(|m| m.user_low == row.user_low && m.user_high == row.user_high)
            {
                m.low_sent |= row.low_sent;
                m.high_sent |= row.high_sent;
                m.updated_at = now;
                return m.clone();
            }
            let created = Match {
                id: Uuid::new_v4(),
                user_low: row.user_low,
                user_high: row.user_high,
                low_sent: row.low_sent,
                high_sent: row.high_sent,
                created_at: now,
                updated_at: now,
            };
            s.matches.push(created.clone());
            created
        }))
    }

    fn withdraw_interest(&self, match_id: Uuid, user: Uuid) -> AppResult<Withdrawal> {
        let hook = self.before_withdraw.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(hook) = hook {
            hook(self);
        }
        Ok(self.with(|s| {
            let Some(found) = s.matches.iter().find(|m| m.id == match_id).cloned() else {
                return Withdrawal::Missing;
            };
            if !found.has_sent(user) {
                return Withdrawal::NotSent;
            }
            if found.is_mutual() {
                return Withdrawal::Mutual(found);
            }
            s.remove_match(match_id);
            Withdrawal::Deleted(found)
        }))
    }

    fn dissolve_match(&self, pair: &Match, reject_interests: bool) -> AppResult<usize> {
        let [a, b] = pair.users();
        Ok(self.with(|s| {
            let before = s.messages.len();
            s.remove_match(pair.id);
            let removed = before - s.messages.len();
            if reject_interests {
                let now = s.now();
                for i in s.interests.iter_mut().filter(|i| {
                    (i.from_user == a && i.to_user == b) || (i.from_user == b && i.to_user == a)
                }) {
                    i.status = InterestStatus::Rejected;
                    i.updated_at = now;
                }
            }
            removed
        }))
    }
}

impl MessageStore for MemoryStore {
    fn insert_message(&self, new: NewMessage) -> AppResult<Message> {
        self.with(|s| {
            if !s.matches.iter().any(|m| m.id == new.match_id) {
                return Err(AppError::new(ErrorCode::MatchNotFound, "match not found"));
            }
            let message = Message {
                id: Uuid::new_v4(),
                match_id: new.match_id,
                sender_id: new.sender_id,
                text: new.text,
                created_at: s.now(),
            };
            s.messages.push(message.clone());
            Ok(message)
        })
    }

    fn find_message(&self, id: Uuid) -> AppResult<Option<Message>> {
        Ok(self.with(|s| s.messages.iter().find(|m| m.id == id).cloned()))
    }

    fn messages_for_match(
        &self,
        match_id: Uuid,
        page: &PaginationParams,
    ) -> AppResult<(Vec<Message>, u64)> {
        Ok(self.with(|s| {
            let mut all: Vec<Message> = s.messages.iter().filter(|m| m.match_id == match_id).cloned().collect();
            all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            let total = all.len() as u64;
            let items = all
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.limit() as usize)
                .collect();
            (items, total)
        }))
    }

    fn last_message(&self, match_id: Uuid) -> AppResult<Option<Message>> {
        Ok(self.with(|s| {
            s.messages
                .iter()
                .filter(|m| m.match_id == match_id)
                .max_by_key(|m| m.created_at)
                .cloned()
        }))
    }

    fn delete_message(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.with(|s| {
            let before = s.messages.len();
            s.messages.retain(|m| m.id != id);
            s.messages.len() != before
        }))
    }
}

impl Store for MemoryStore {
    fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

pub mod fixtures {
    use chrono::Utc;
    use uuid::Uuid;

    use super::MemoryStore;
    use crate::models::{
        Gender, GenderPreference, NewUser, NotificationSettings, PrivacySettings, Profile,
        ProfileFields, ProfileStatus,
    };
    use crate::store::{AccountStore, ProfileStore};

    pub fn new_user(email: &str, name: &str) -> NewUser {
        NewUser {
            email: email.to_lowercase(),
            password_hash: "unused".into(),
            name: name.into(),
            phone: None,
            date_of_birth: None,
            gender: None,
            privacy_settings: serde_json::to_value(PrivacySettings::default()).unwrap(),
            notification_settings: serde_json::to_value(NotificationSettings::default()).unwrap(),
        }
    }

    pub fn fields(name: &str, gender: Gender, city: &str) -> ProfileFields {
        ProfileFields {
            full_name: name.into(),
            gender,
            age: 28,
            is_muslim: true,
            sect: None,
            city: city.into(),
            education: "Bachelors".into(),
            profession: Some("Engineer".into()),
            about: None,
            interests: Some("reading, travel".into()),
            height_cm: None,
            marital_status: None,
            gender_preference: GenderPreference::Opposite,
        }
    }

    /// Detached profile value for predicate tests.
    pub fn profile(user_id: Uuid, gender: Gender, city: &str) -> Profile {
        let now = Utc::now();
        let f = fields("Someone", gender, city);
        Profile {
            id: Uuid::new_v4(),
            user_id,
            full_name: f.full_name,
            gender,
            age: f.age,
            is_muslim: f.is_muslim,
            sect: None,
            city: f.city,
            education: f.education,
            profession: f.profession,
            about: None,
            interests: f.interests,
            height_cm: None,
            marital_status: None,
            image: None,
            gender_preference: GenderPreference::Opposite,
            status: ProfileStatus::Pending,
            last_active: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Inserts a user without a profile.
    pub fn user(store: &MemoryStore, name: &str) -> Uuid {
        let email = format!("{}@example.com", name.to_lowercase());
        store.insert_user(new_user(&email, name)).unwrap().id
    }

    /// Inserts a user with a profile.
    pub fn member(store: &MemoryStore, name: &str, gender: Gender, city: &str) -> Uuid {
        let id = user(store, name);
        store.upsert_profile(id, &fields(name, gender, city), None).unwrap();
        id
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures;
    use super::*;
    use crate::models::Gender;

    #[test]
    fn add_flags_converges_on_one_row_per_pair() {
        let store = MemoryStore::new();
        let a = fixtures::user(&store, "a");
        let b = fixtures::user(&store, "b");

        let first = store.add_interest_flags(a, b, &[a]).unwrap();
        let second = store.add_interest_flags(b, a, &[b]).unwrap();

        assert_eq!(first.id, second.id);
        assert!(second.is_mutual());
        assert_eq!(store.all_matches().len(), 1);
    }

    #[test]
    fn add_flags_rejects_empty_sender_set() {
        let store = MemoryStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(store.add_interest_flags(a, b, &[]).is_err());
        assert!(store.all_matches().is_empty());
    }

    #[test]
    fn withdraw_deletes_one_sided_and_keeps_mutual() {
        let store = MemoryStore::new();
        let a = fixtures::user(&store, "a");
        let b = fixtures::user(&store, "b");

        let m = store.add_interest_flags(a, b, &[a]).unwrap();
        assert_eq!(store.withdraw_interest(m.id, b).unwrap(), Withdrawal::NotSent);
        assert!(matches!(store.withdraw_interest(m.id, a).unwrap(), Withdrawal::Deleted(_)));
        assert_eq!(store.withdraw_interest(m.id, a).unwrap(), Withdrawal::Missing);

        let m = store.add_interest_flags(a, b, &[a, b]).unwrap();
        assert!(matches!(store.withdraw_interest(m.id, a).unwrap(), Withdrawal::Mutual(_)));
        assert!(store.find_match(m.id).unwrap().is_some());
    }

    #[test]
    fn dissolve_removes_match_and_messages_in_one_step() {
        let store = MemoryStore::new();
        let a = fixtures::user(&store, "a");
        let b = fixtures::user(&store, "b");
        let c = fixtures::user(&store, "c");
        store.insert_interest(a, b).unwrap();
        store.insert_interest(b, a).unwrap();
        let m = store.add_interest_flags(a, b, &[a, b]).unwrap();
        let other = store.add_interest_flags(a, c, &[a]).unwrap();
        for text in ["salam", "hi"] {
            store.insert_message(NewMessage { match_id: m.id, sender_id: a, text: text.into() }).unwrap();
        }
        store.insert_message(NewMessage { match_id: other.id, sender_id: a, text: "x".into() }).unwrap();

        assert_eq!(store.dissolve_match(&m, false).unwrap(), 2);
        assert!(store.find_match(m.id).unwrap().is_none());
        assert_eq!(store.message_count(), 1);
        assert!(store.all_interests().iter().all(|i| i.status == InterestStatus::Pending));

        let m = store.add_interest_flags(a, b, &[a, b]).unwrap();
        assert_eq!(store.dissolve_match(&m, true).unwrap(), 0);
        assert!(store.all_interests().iter().all(|i| i.status == InterestStatus::Rejected));
        assert!(store.find_match(other.id).unwrap().is_some());
    }

    #[test]
    fn pending_delete_spares_resolved_interests() {
        let store = MemoryStore::new();
        let a = fixtures::user(&store, "a");
        let b = fixtures::user(&store, "b");
        let (interest, _) = store.insert_interest(a, b).unwrap();
        store.set_interest_status(interest.id, InterestStatus::Accepted).unwrap();

        assert!(!store.delete_pending_interest(a, b).unwrap());
        assert_eq!(store.all_interests().len(), 1);

        store.set_interest_status(interest.id, InterestStatus::Pending).unwrap();
        assert!(!store.delete_pending_interest(b, a).unwrap());
        assert!(store.delete_pending_interest(a, b).unwrap());
        assert!(store.all_interests().is_empty());
    }

    #[test]
    fn profiles_listed_by_moderation_status() {
        let store = MemoryStore::new();
        let a = fixtures::member(&store, "a", Gender::Male, "Lahore");
        fixtures::member(&store, "b", Gender::Female, "Karachi");
        let pa = store.find_profile_by_user(a).unwrap().unwrap();
        assert_eq!(pa.status, ProfileStatus::Pending);

        let approved = store.set_profile_status(pa.id, ProfileStatus::Approved).unwrap();
        assert_eq!(approved.status, ProfileStatus::Approved);
        let listed = store.profiles_by_status(ProfileStatus::Approved, 10).unwrap();
        assert_eq!(listed.iter().map(|p| p.id).collect::<Vec<_>>(), vec![pa.id]);
        assert_eq!(store.profiles_by_status(ProfileStatus::Pending, 10).unwrap().len(), 1);
        assert!(store.profiles_by_status(ProfileStatus::Pending, 0).unwrap().is_empty());

        let err = store.set_profile_status(Uuid::new_v4(), ProfileStatus::Rejected).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ProfileNotFound));
    }

    #[test]
    fn deleting_user_cascades() {
        let store = MemoryStore::new();
        let a = fixtures::member(&store, "a", Gender::Male, "Lahore");
        let b = fixtures::member(&store, "b", Gender::Female, "Lahore");
        let pa = store.find_profile_by_user(a).unwrap().unwrap();
        let pb = store.find_profile_by_user(b).unwrap().unwrap();
        store.shortlist_add(pb.id, pa.id).unwrap();
        store.insert_interest(a, b).unwrap();
        let m = store.add_interest_flags(a, b, &[a, b]).unwrap();
        store
            .insert_message(NewMessage { match_id: m.id, sender_id: b, text: "salam".into() })
            .unwrap();

        assert!(store.delete_user(a).unwrap());

        assert!(store.find_profile(pa.id).unwrap().is_none());
        assert!(store.shortlist(pb.id).unwrap().is_empty());
        assert!(store.all_interests().is_empty());
        assert!(store.all_matches().is_empty());
        assert_eq!(store.message_count(), 0);
        assert!(store.find_user(b).unwrap().is_some());
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        fixtures::user(&store, "dup");
        let err = store.insert_user(fixtures::new_user("dup@example.com", "again")).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::EmailAlreadyExists));
    }

    #[test]
    fn messages_page_oldest_first() {
        let store = MemoryStore::new();
        let a = fixtures::user(&store, "a");
        let b = fixtures::user(&store, "b");
        let m = store.add_interest_flags(a, b, &[a, b]).unwrap();
        for text in ["one", "two", "three"] {
            store.insert_message(NewMessage { match_id: m.id, sender_id: a, text: text.into() }).unwrap();
        }

        let page = PaginationParams { page: 1, per_page: 2 };
        let (items, total) = store.messages_for_match(m.id, &page).unwrap();
        assert_eq!(total, 3);
        assert_eq!(items.iter().map(|m| m.text.as_str()).collect::<Vec<_>>(), vec!["one", "two"]);
        assert_eq!(store.last_message(m.id).unwrap().unwrap().text, "three");
    }
}
