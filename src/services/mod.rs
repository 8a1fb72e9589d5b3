pub mod attachments;
pub mod auth;
pub mod random_play;
