use std::io::Write;

use chrono::{DateTime, NaiveDate, Utc};
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{interests, matches, messages, profiles, shortlist_entries, users};

/// Lower-case text enums stored in VARCHAR columns.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok(Self::$variant),)+
                    other => Err(format!("unknown {}: {other}", stringify!($name))),
                }
            }
        }

        impl ToSql<Text, Pg> for $name {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
                out.write_all(self.as_str().as_bytes())?;
                Ok(IsNull::No)
            }
        }

        impl FromSql<Text, Pg> for $name {
            fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
                let raw = std::str::from_utf8(bytes.as_bytes())?;
                raw.parse().map_err(Into::into)
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

text_enum!(Gender { Male => "male", Female => "female" });

impl Gender {
    pub fn opposite(self) -> Self {
        match self {
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Male,
        }
    }
}

/// Which genders a profile wants to see while browsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum GenderPreference {
    #[default]
    Opposite,
    Same,
    All,
}

text_enum!(GenderPreference { Opposite => "opposite", Same => "same", All => "all" });

impl GenderPreference {
    /// The single gender admitted for a viewer, or `None` when every gender is.
    pub fn target_gender(self, viewer: Gender) -> Option<Gender> {
        match self {
            GenderPreference::Opposite => Some(viewer.opposite()),
            GenderPreference::Same => Some(viewer),
            GenderPreference::All => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum InterestStatus {
    Pending,
    Accepted,
    Rejected,
}

text_enum!(InterestStatus { Pending => "pending", Accepted => "accepted", Rejected => "rejected" });

/// Moderation state of a profile. New profiles start pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum ProfileStatus {
    Pending,
    Approved,
    Rejected,
}

text_enum!(ProfileStatus { Pending => "pending", Approved => "approved", Rejected => "rejected" });

// --- User ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacySettings {
    pub show_profile: bool,
    pub show_photos: bool,
    pub show_contact: bool,
    pub allow_messages: bool,
    pub show_last_seen: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            show_profile: true,
            show_photos: true,
            show_contact: false,
            allow_messages: true,
            show_last_seen: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub email_notifications: bool,
    pub new_matches: bool,
    pub messages: bool,
    pub interests: bool,
    pub promotions: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email_notifications: true,
            new_matches: true,
            messages: true,
            interests: true,
            promotions: false,
        }
    }
}

#[derive(Debug, Queryable, Selectable, Identifiable, Serialize, Clone)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub is_active: bool,
    pub privacy_settings: serde_json::Value,
    pub notification_settings: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn privacy(&self) -> PrivacySettings {
        serde_json::from_value(self.privacy_settings.clone()).unwrap_or_default()
    }

    pub fn notifications(&self) -> NotificationSettings {
        serde_json::from_value(self.notification_settings.clone()).unwrap_or_default()
    }
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub privacy_settings: serde_json::Value,
    pub notification_settings: serde_json::Value,
}

/// Partial update of account fields; `None` leaves a column untouched.
#[derive(Debug, AsChangeset, Default, Clone)]
#[diesel(table_name = users)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub is_active: Option<bool>,
    pub privacy_settings: Option<serde_json::Value>,
    pub notification_settings: Option<serde_json::Value>,
}

// --- Profile ---

#[derive(Debug, Queryable, Selectable, Identifiable, Serialize, Clone)]
#[diesel(table_name = profiles)]
pub struct Profile {
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
    pub interests: Option<String>,
    pub height_cm: Option<i32>,
    pub marital_status: Option<String>,
    pub image: Option<String>,
    pub gender_preference: GenderPreference,
    pub status: ProfileStatus,
    pub last_active: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Free-text interests split on commas, blanks dropped.
    pub fn interest_list(&self) -> Vec<String> {
        self.interests
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Every client-editable profile column except the photo reference.
/// Optional columns are written as NULL when absent.
#[derive(Debug, Insertable, AsChangeset, Clone)]
#[diesel(table_name = profiles, treat_none_as_null = true)]
pub struct ProfileFields {
    pub full_name: String,
    pub gender: Gender,
    pub age: i32,
    pub is_muslim: bool,
    pub sect: Option<String>,
    pub city: String,
    pub education: String,
    pub profession: Option<String>,
    pub about: Option<String>,
    pub interests: Option<String>,
    pub height_cm: Option<i32>,
    pub marital_status: Option<String>,
    pub gender_preference: GenderPreference,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = shortlist_entries)]
pub struct NewShortlistEntry {
    pub owner_profile_id: Uuid,
    pub profile_id: Uuid,
}

// --- Interest ---

#[derive(Debug, Queryable, Selectable, Identifiable, Serialize, Clone)]
#[diesel(table_name = interests)]
pub struct Interest {
    pub id: Uuid,
    pub from_user: Uuid,
    pub to_user: Uuid,
    pub status: InterestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = interests)]
pub struct NewInterest {
    pub from_user: Uuid,
    pub to_user: Uuid,
    pub status: InterestStatus,
}

// --- Match ---

/// Orders two user ids the way a match row stores them.
pub fn sorted_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a < b { (a, b) } else { (b, a) }
}

/// Undirected pair of users. `low_sent`/`high_sent` encode the
/// `interestSentBy` set, so it can never hold a non-member or more than two ids.
#[derive(Debug, Queryable, Selectable, Identifiable, Clone, PartialEq)]
#[diesel(table_name = matches)]
pub struct Match {
    pub id: Uuid,
    pub user_low: Uuid,
    pub user_high: Uuid,
    pub low_sent: bool,
    pub high_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Match {
    pub fn users(&self) -> [Uuid; 2] {
        [self.user_low, self.user_high]
    }

    pub fn has_member(&self, user: Uuid) -> bool {
        user == self.user_low || user == self.user_high
    }

    /// The member that is not `user`. Only meaningful when `user` is a member.
    pub fn other(&self, user: Uuid) -> Uuid {
        if user == self.user_low {
            self.user_high
        } else {
            self.user_low
        }
    }

    pub fn has_sent(&self, user: Uuid) -> bool {
        (user == self.user_low && self.low_sent) || (user == self.user_high && self.high_sent)
    }

    pub fn interest_sent_by(&self) -> Vec<Uuid> {
        let mut senders = Vec::with_capacity(2);
        if self.low_sent {
            senders.push(self.user_low);
        }
        if self.high_sent {
            senders.push(self.user_high);
        }
        senders
    }

    pub fn is_mutual(&self) -> bool {
        self.low_sent && self.high_sent
    }

    /// One-sided match where `user` is the member still waiting to reciprocate.
    pub fn is_request_for(&self, user: Uuid) -> bool {
        self.has_member(user) && !self.is_mutual() && !self.has_sent(user)
    }
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = matches)]
pub struct NewMatch {
    pub user_low: Uuid,
    pub user_high: Uuid,
    pub low_sent: bool,
    pub high_sent: bool,
}

impl NewMatch {
    /// Row for the pair `{a, b}` flagging every id of `senders` that is a member.
    pub fn for_senders(a: Uuid, b: Uuid, senders: &[Uuid]) -> Self {
        let (user_low, user_high) = sorted_pair(a, b);
        Self {
            user_low,
            user_high,
            low_sent: senders.contains(&user_low),
            high_sent: senders.contains(&user_high),
        }
    }
}

// --- Message ---

#[derive(Debug, Queryable, Selectable, Identifiable, Serialize, Clone)]
#[diesel(table_name = messages)]
pub struct Message {
    pub id: Uuid,
    pub match_id: Uuid,
    pub sender_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessage {
    pub match_id: Uuid,
    pub sender_id: Uuid,
    pub text: String,
}
