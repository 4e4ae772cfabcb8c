pub mod activity;
pub mod analytics;
pub mod comment;
pub mod contact;
pub mod like;
pub mod post;
pub mod project;
pub mod session;
pub mod tag;
pub mod user;
