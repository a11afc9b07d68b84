pub mod accounts;
pub mod messaging;
pub mod profiles;
