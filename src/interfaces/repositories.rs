pub mod asset_store;
pub mod contact_me;
pub mod project;
pub mod sqlx_repo;
pub mod token;
