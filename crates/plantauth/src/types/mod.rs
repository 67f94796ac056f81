//! Domain types shared by the remote authorities, the caches and the claims
//! pipeline.
//!
//! ## Domain Types
//!
//! - [`Person`] - A person known to the remote person authority
//! - [`AccessablePlant`] - One plant in a user's plant list
//! - [`AccessableProject`] - One project in a plant
//! - [`UserPlantPermissionData`] - Everything needed to authorize a user in a plant
//!
//! All types serialize with camelCase field names, matching the main API.

pub mod permission;
pub mod person;

pub use permission::{AccessablePlant, AccessableProject, UserPlantPermissionData};
pub use person::Person;
