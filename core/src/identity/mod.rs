//! Identity mapping
//!
//! Turns verified Globus claims into a local account: checks the institutional
//! identity, derives the username from the EPPN, and finds or creates the
//! account and its profile.

mod claims;
mod mapper;
mod policy;
pub mod store;

pub use claims::{Claims, LinkedIdentity};
pub use mapper::IdentityMapper;
pub use policy::{username_from_eppn, IdentityPolicy, Principal};
pub use store::{AccountFilter, AccountStore, LocalAccount, LocalProfile, ProfileStore};
