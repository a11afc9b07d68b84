use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::upsert::excluded;
use uuid::Uuid;

use rishta_shared::clients::db::{self, DbPool};
use rishta_shared::errors::{AppError, AppResult, ErrorCode};
use rishta_shared::types::PaginationParams;

use super::{
    like_pattern, AccountStore, BrowseQuery, InterestStore, MatchStore, MessageStore, ProfileStore,
    Store, Withdrawal,
};
use crate::models::{
    Interest, InterestStatus, Match, Message, NewInterest, NewMatch, NewMessage,
    NewShortlistEntry, NewUser, Profile, ProfileFields, ProfileStatus, User, UserChanges,
};
use crate::schema::{interests, matches, messages, profiles, shortlist_entries, users};

/// Postgres-backed store over an r2d2 pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn email_taken(err: DieselError) -> AppError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            AppError::new(ErrorCode::EmailAlreadyExists, "email already registered")
        }
        other => other.into(),
    }
}

impl AccountStore for PgStore {
    fn insert_user(&self, new: NewUser) -> AppResult<User> {
        let mut conn = db::checkout(&self.pool)?;
        diesel::insert_into(users::table)
            .values(&new)
            .get_result(&mut conn)
            .map_err(email_taken)
    }

    fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let mut conn = db::checkout(&self.pool)?;
        Ok(users::table.find(id).first(&mut conn).optional()?)
    }

    fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let mut conn = db::checkout(&self.pool)?;
        Ok(users::table
            .filter(users::email.eq(email.to_lowercase()))
            .first(&mut conn)
            .optional()?)
    }

    fn find_users(&self, ids: &[Uuid]) -> AppResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let mut conn = db::checkout(&self.pool)?;
        Ok(users::table.filter(users::id.eq_any(ids)).load(&mut conn)?)
    }

    fn update_user(&self, id: Uuid, changes: UserChanges) -> AppResult<User> {
        let mut conn = db::checkout(&self.pool)?;
        diesel::update(users::table.find(id))
            .set((&changes, users::updated_at.eq(Utc::now())))
            .get_result::<User>(&mut conn)
            .optional()
            .map_err(email_taken)?
            .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "user not found"))
    }

    fn delete_user(&self, id: Uuid) -> AppResult<bool> {
        let mut conn = db::checkout(&self.pool)?;
        // profiles, shortlist entries, interests, matches and messages cascade
        let deleted = diesel::delete(users::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }
}

impl ProfileStore for PgStore {
    fn find_profile(&self, id: Uuid) -> AppResult<Option<Profile>> {
        let mut conn = db::checkout(&self.pool)?;
        Ok(profiles::table.find(id).first(&mut conn).optional()?)
    }

    fn find_profile_by_user(&self, user_id: Uuid) -> AppResult<Option<Profile>> {
        let mut conn = db::checkout(&self.pool)?;
        Ok(profiles::table
            .filter(profiles::user_id.eq(user_id))
            .first(&mut conn)
            .optional()?)
    }

    fn find_profiles_by_users(&self, user_ids: &[Uuid]) -> AppResult<Vec<Profile>> {
        if user_ids.is_empty() {
            return Ok(vec![]);
        }
        let mut conn = db::checkout(&self.pool)?;
        Ok(profiles::table
            .filter(profiles::user_id.eq_any(user_ids))
            .load(&mut conn)?)
    }

    fn upsert_profile(
        &self,
        user_id: Uuid,
        fields: &ProfileFields,
        image: Option<String>,
    ) -> AppResult<(Profile, bool)> {
        let mut conn = db::checkout(&self.pool)?;
        let result = conn.transaction::<_, DieselError, _>(|conn| {
            let existing = profiles::table
                .filter(profiles::user_id.eq(user_id))
                .select(profiles::id)
                .for_update()
                .first::<Uuid>(conn)
                .optional()?;

            match existing {
                Some(id) => {
                    let now = Utc::now();
                    let profile = diesel::update(profiles::table.find(id))
                        .set((
                            fields,
                            image.map(|i| profiles::image.eq(i)),
                            profiles::last_active.eq(now),
                            profiles::updated_at.eq(now),
                        ))
                        .get_result::<Profile>(conn)?;
                    Ok((profile, false))
                }
                None => {
                    let profile = diesel::insert_into(profiles::table)
                        .values((
                            profiles::user_id.eq(user_id),
                            fields,
                            image.map(|i| profiles::image.eq(i)),
                        ))
                        .get_result::<Profile>(conn)?;
                    Ok((profile, true))
                }
            }
        })?;
        Ok(result)
    }

    fn delete_profile_by_user(&self, user_id: Uuid) -> AppResult<bool> {
        let mut conn = db::checkout(&self.pool)?;
        // shortlist entries on both sides cascade
        let deleted = diesel::delete(profiles::table.filter(profiles::user_id.eq(user_id)))
            .execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn touch_profile(&self, user_id: Uuid) -> AppResult<()> {
        let mut conn = db::checkout(&self.pool)?;
        diesel::update(profiles::table.filter(profiles::user_id.eq(user_id)))
            .set(profiles::last_active.eq(Utc::now()))
            .execute(&mut conn)?;
        Ok(())
    }

    fn browse_profiles(&self, q: &BrowseQuery) -> AppResult<Vec<Profile>> {
        let mut conn = db::checkout(&self.pool)?;

        let mut query = profiles::table
            .inner_join(users::table)
            .filter(users::is_active.eq(true))
            .filter(profiles::user_id.ne(q.viewer))
            .select(Profile::as_select())
            .into_boxed();

        if !q.exclude_users.is_empty() {
            query = query.filter(profiles::user_id.ne_all(q.exclude_users.clone()));
        }
        if let Some(gender) = q.gender {
            query = query.filter(profiles::gender.eq(gender));
        }
        if let Some(min) = q.min_age {
            query = query.filter(profiles::age.ge(min));
        }
        if let Some(max) = q.max_age {
            query = query.filter(profiles::age.le(max));
        }
        if q.muslim_only {
            query = query.filter(profiles::is_muslim.eq(true));
        }
        if let Some(city) = &q.city {
            query = query.filter(profiles::city.ilike(like_pattern(city)));
        }
        if let Some(education) = &q.education {
            query = query.filter(profiles::education.ilike(like_pattern(education)));
        }
        if let Some(profession) = &q.profession {
            query = query.filter(profiles::profession.ilike(like_pattern(profession)));
        }

        Ok(query
            .order(profiles::created_at.desc())
            .limit(q.limit)
            .load(&mut conn)?)
    }

    fn profiles_by_status(&self, status: ProfileStatus, limit: i64) -> AppResult<Vec<Profile>> {
        let mut conn = db::checkout(&self.pool)?;
        Ok(profiles::table
            .filter(profiles::status.eq(status))
            .order(profiles::created_at.desc())
            .limit(limit)
            .load(&mut conn)?)
    }

    fn set_profile_status(&self, id: Uuid, status: ProfileStatus) -> AppResult<Profile> {
        let mut conn = db::checkout(&self.pool)?;
        diesel::update(profiles::table.find(id))
            .set((profiles::status.eq(status), profiles::updated_at.eq(Utc::now())))
            .get_result(&mut conn)
            .optional()?
            .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))
    }

    fn shortlist_add(&self, owner_profile_id: Uuid, profile_id: Uuid) -> AppResult<bool> {
        let mut conn = db::checkout(&self.pool)?;
        let inserted = diesel::insert_into(shortlist_entries::table)
            .values(&NewShortlistEntry { owner_profile_id, profile_id })
            .on_conflict_do_nothing()
            .execute(&mut conn)?;
        Ok(inserted > 0)
    }

    fn shortlist_remove(&self, owner_profile_id: Uuid, profile_id: Uuid) -> AppResult<bool> {
        let mut conn = db::checkout(&self.pool)?;
        let deleted = diesel::delete(
            shortlist_entries::table
                .filter(shortlist_entries::owner_profile_id.eq(owner_profile_id))
                .filter(shortlist_entries::profile_id.eq(profile_id)),
        )
        .execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn shortlist(&self, owner_profile_id: Uuid) -> AppResult<Vec<Profile>> {
        let mut conn = db::checkout(&self.pool)?;
        let saved = shortlist_entries::table
            .filter(shortlist_entries::owner_profile_id.eq(owner_profile_id))
            .select(shortlist_entries::profile_id);
        Ok(profiles::table
            .filter(profiles::id.eq_any(saved))
            .order(profiles::created_at.desc())
            .load(&mut conn)?)
    }
}

impl InterestStore for PgStore {
    fn find_interest(&self, id: Uuid) -> AppResult<Option<Interest>> {
        let mut conn = db::checkout(&self.pool)?;
        Ok(interests::table.find(id).first(&mut conn).optional()?)
    }

    fn insert_interest(&self, from: Uuid, to: Uuid) -> AppResult<(Interest, bool)> {
        let mut conn = db::checkout(&self.pool)?;
        let inserted = diesel::insert_into(interests::table)
            .values(&NewInterest { from_user: from, to_user: to, status: InterestStatus::Pending })
            .on_conflict((interests::from_user, interests::to_user))
            .do_nothing()
            .get_result::<Interest>(&mut conn)
            .optional()?;

        match inserted {
            Some(interest) => Ok((interest, true)),
            None => {
                let existing = interests::table
                    .filter(interests::from_user.eq(from))
                    .filter(interests::to_user.eq(to))
                    .first::<Interest>(&mut conn)?;
                Ok((existing, false))
            }
        }
    }

    fn set_interest_status(&self, id: Uuid, status: InterestStatus) -> AppResult<Interest> {
        let mut conn = db::checkout(&self.pool)?;
        diesel::update(interests::table.find(id))
            .set((interests::status.eq(status), interests::updated_at.eq(Utc::now())))
            .get_result(&mut conn)
            .optional()?
            .ok_or_else(|| AppError::new(ErrorCode::InterestNotFound, "interest not found"))
    }

    fn set_pair_interest_status(&self, a: Uuid, b: Uuid, status: InterestStatus) -> AppResult<usize> {
        let mut conn = db::checkout(&self.pool)?;
        let between = interests::table.filter(
            interests::from_user
                .eq(a)
                .and(interests::to_user.eq(b))
                .or(interests::from_user.eq(b).and(interests::to_user.eq(a))),
        );
        Ok(diesel::update(between)
            .set((interests::status.eq(status), interests::updated_at.eq(Utc::now())))
            .execute(&mut conn)?)
    }

    fn delete_pending_interest(&self, from: Uuid, to: Uuid) -> AppResult<bool> {
        let mut conn = db::checkout(&self.pool)?;
        let deleted = diesel::delete(
            interests::table
                .filter(interests::from_user.eq(from))
                .filter(interests::to_user.eq(to))
                .filter(interests::status.eq(InterestStatus::Pending)),
        )
        .execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn interests_to(&self, user: Uuid) -> AppResult<Vec<Interest>> {
        let mut conn = db::checkout(&self.pool)?;
        Ok(interests::table
            .filter(interests::to_user.eq(user))
            .order(interests::created_at.desc())
            .load(&mut conn)?)
    }

    fn interests_from(&self, user: Uuid) -> AppResult<Vec<Interest>> {
        let mut conn = db::checkout(&self.pool)?;
        Ok(interests::table
            .filter(interests::from_user.eq(user))
            .order(interests::created_at.desc())
            .load(&mut conn)?)
    }

    fn count_pending_to(&self, user: Uuid) -> AppResult<i64> {
        let mut conn = db::checkout(&self.pool)?;
        Ok(interests::table
            .filter(interests::to_user.eq(user))
            .filter(interests::status.eq(InterestStatus::Pending))
            .count()
            .get_result(&mut conn)?)
    }
}

impl MatchStore for PgStore {
    fn find_match(&self, id: Uuid) -> AppResult<Option<Match>> {
        let mut conn = db::checkout(&self.pool)?;
        Ok(matches::table.find(id).first(&mut conn).optional()?)
    }

    fn find_match_by_pair(&self, a: Uuid, b: Uuid) -> AppResult<Option<Match>> {
        let mut conn = db::checkout(&self.pool)?;
        let (low, high) = crate::models::sorted_pair(a, b);
        Ok(matches::table
            .filter(matches::user_low.eq(low))
            .filter(matches::user_high.eq(high))
            .first(&mut conn)
            .optional()?)
    }

    fn matches_for(&self, user: Uuid) -> AppResult<Vec<Match>> {
        let mut conn = db::checkout(&self.pool)?;
        Ok(matches::table
            .filter(matches::user_low.eq(user).or(matches::user_high.eq(user)))
            .order(matches::updated_at.desc())
            .load(&mut conn)?)
    }

    fn add_interest_flags(&self, a: Uuid, b: Uuid, senders: &[Uuid]) -> AppResult<Match> {
        let mut conn = db::checkout(&self.pool)?;
        let row = NewMatch::for_senders(a, b, senders);

        // Concurrent creates for the same pair converge on one row and
        // OR their flags in.
        Ok(diesel::insert_into(matches::table)
            .values(&row)
            .on_conflict((matches::user_low, matches::user_high))
            .do_update()
            .set((
                matches::low_sent.eq(matches::low_sent.or(excluded(matches::low_sent))),
                matches::high_sent.eq(matches::high_sent.or(excluded(matches::high_sent))),
                matches::updated_at.eq(Utc::now()),
            ))
            .get_result(&mut conn)?)
    }

    fn withdraw_interest(&self, match_id: Uuid, user: Uuid) -> AppResult<Withdrawal> {
        let mut conn = db::checkout(&self.pool)?;
        let outcome = conn.transaction::<_, DieselError, _>(|conn| {
            let Some(found) = matches::table
                .find(match_id)
                .for_update()
                .first::<Match>(conn)
                .optional()?
            else {
                return Ok(Withdrawal::Missing);
            };

            if !found.has_sent(user) {
                return Ok(Withdrawal::NotSent);
            }
            if found.is_mutual() {
                return Ok(Withdrawal::Mutual(found));
            }

            // `user` is the only sender: clearing the flag would empty the set.
            diesel::delete(matches::table.find(match_id)).execute(conn)?;
            Ok(Withdrawal::Deleted(found))
        })?;
        Ok(outcome)
    }

    fn dissolve_match(&self, pair: &Match, reject_interests: bool) -> AppResult<usize> {
        let mut conn = db::checkout(&self.pool)?;
        let [a, b] = pair.users();
        let removed = conn.transaction::<_, DieselError, _>(|conn| {
            let removed = diesel::delete(messages::table.filter(messages::match_id.eq(pair.id)))
                .execute(conn)?;
            diesel::delete(matches::table.find(pair.id)).execute(conn)?;

            if reject_interests {
                let between = interests::table.filter(
                    interests::from_user
                        .eq(a)
                        .and(interests::to_user.eq(b))
                        .or(interests::from_user.eq(b).and(interests::to_user.eq(a))),
                );
                diesel::update(between)
                    .set((
                        interests::status.eq(InterestStatus::Rejected),
                        interests::updated_at.eq(Utc::now()),
                    ))
                    .execute(conn)?;
            }
            Ok(removed)
        })?;
        Ok(removed)
    }
}

impl MessageStore for PgStore {
    fn insert_message(&self, new: NewMessage) -> AppResult<Message> {
        let mut conn = db::checkout(&self.pool)?;
        Ok(diesel::insert_into(messages::table)
            .values(&new)
            .get_result(&mut conn)?)
    }

    fn find_message(&self, id: Uuid) -> AppResult<Option<Message>> {
        let mut conn = db::checkout(&self.pool)?;
        Ok(messages::table.find(id).first(&mut conn).optional()?)
    }

    fn messages_for_match(
        &self,
        match_id: Uuid,
        page: &PaginationParams,
    ) -> AppResult<(Vec<Message>, u64)> {
        let mut conn = db::checkout(&self.pool)?;

        let total: i64 = messages::table
            .filter(messages::match_id.eq(match_id))
            .count()
            .get_result(&mut conn)?;

        let items = messages::table
            .filter(messages::match_id.eq(match_id))
            .order(messages::created_at.asc())
            .offset(page.offset() as i64)
            .limit(page.limit() as i64)
            .load(&mut conn)?;

        Ok((items, total as u64))
    }

    fn last_message(&self, match_id: Uuid) -> AppResult<Option<Message>> {
        let mut conn = db::checkout(&self.pool)?;
        Ok(messages::table
            .filter(messages::match_id.eq(match_id))
            .order(messages::created_at.desc())
            .first(&mut conn)
            .optional()?)
    }

    fn delete_message(&self, id: Uuid) -> AppResult<bool> {
        let mut conn = db::checkout(&self.pool)?;
        Ok(diesel::delete(messages::table.find(id)).execute(&mut conn)? > 0)
    }
}

impl Store for PgStore {
    fn ping(&self) -> AppResult<()> {
        db::ping(&self.pool)
    }
}
