//! Core domain types shared across the Mind workspace.
//!
//! Nothing in this crate touches the filesystem or the history store; it only
//! describes *who* saved something ([`Identity`]), *which* version it became
//! ([`Version`] plus the bump/ordering rules in [`version`]), and *what* a
//! project directory must contain ([`layout`]).

pub mod identity;
pub mod layout;
pub mod version;

pub use identity::{Identity, IdentityError};
pub use layout::{Member, MemberKind, CANONICAL_MEMBERS, DEFAULT_VARIANT, VERSIONING_DIR};
pub use version::{
    bump, bump_build, bump_major, bump_minor, bump_patch, bump_prerelease, is_base, newest,
    parse_tag, precedence, tag_name, Bump, Version, BASE_VERSION, TAG_PREFIX,
};
