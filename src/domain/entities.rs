pub mod admin;
pub mod contact_me;
pub mod image;
pub mod project;
pub mod token;
