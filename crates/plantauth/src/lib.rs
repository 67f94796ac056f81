//! # plantauth
//!
//! Plant-scoped authorization claims for authenticated principals.
//!
//! ## Overview
//!
//! After token validation, [`ClaimsAugmenter`] adds to the principal:
//!
//! - a person-exists marker and, for superusers, the `SUPERUSER` role
//! - for a plant request the user has access to: a role per permission,
//!   project claims and restriction-role claims
//!
//! The facts come from a remote authority (the main API) through the
//! [`PersonCache`] and [`PermissionCache`], which are cache-aside layers over
//! [`plantauth_cache`].
//!
//! ## Modules
//!
//! - [`api`] - Remote authority traits and main API implementations
//! - [`cache`] - Person and permission caches, cache keys
//! - [`claims`] - Claims model, augmentation and restriction-role checks
//! - [`config`] - Configuration types and loading
//! - [`error`] - Error types
//! - [`types`] - Domain types

pub mod api;
pub mod cache;
pub mod claims;
pub mod config;
pub mod error;
pub mod observability;
pub mod service;
pub mod types;

pub use cache::{PermissionCache, PersonCache, ProjectRef};
pub use claims::{
    ClaimSet, ClaimType, ClaimsAugmenter, ClaimsPrincipal, PlantProvider, RequestPlant,
    RestrictionRolesChecker,
};
pub use config::{AuthzConfig, load_config};
pub use error::{AuthzError, AuthzResult, ErrorCategory};
pub use service::PlantAuth;
pub use types::{AccessablePlant, AccessableProject, Person, UserPlantPermissionData};
