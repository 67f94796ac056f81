pub mod cache;
pub mod claims;
