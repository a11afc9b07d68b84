pub mod accounts;
pub mod health;
pub mod interest;
pub mod matches;
pub mod messages;
pub mod presence;
pub mod profile;
pub mod settings;
