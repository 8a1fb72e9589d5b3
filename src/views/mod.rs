pub mod components;
pub mod homepage;
pub mod layout;
pub mod quizzes;
pub mod random_play;
pub mod session;
pub mod users;

// Re-export commonly used functions from layout
pub use layout::{page, render};
