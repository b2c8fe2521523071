pub mod auth;
pub mod company;
pub mod health;
pub mod nav;
pub mod public;
pub mod seeker;
