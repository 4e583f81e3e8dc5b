//! Mind Operations Layer
//!
//! Packages a machine-learning project (code, weights, datasets,
//! hyperparameters) into a versioned unit called a Mind, and moves it between
//! a single mind-file and an expanded working directory.
//!
//! ## Architecture
//!
//! - **template**: creates the canonical project layout
//! - **archive**: packs a directory into a mind-file and back
//! - **resolver**: turns a mind-file and/or directory into one project directory
//! - **versioning**: commits and `v<semver>` tags on top of a history engine
//! - **Mind**: the handle composing all of the above
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mind_core::Identity;
//! use mind_ops::{Mind, MindSource};
//!
//! fn main() -> mind_ops::MindResult<()> {
//!     let mut mind = Mind::open(&MindSource::directory("my-model"), Identity::new("TC-J"))?;
//!     assert_eq!(mind.latest()?.to_string(), "0.0.0");
//!
//!     std::fs::write(mind.root().join("model.py"), "class Net: ...")?;
//!     let version = mind.save_prerelease(None)?;
//!     println!("saved {version}");
//!
//!     mind.export(Some(std::path::Path::new("my-model.mind")))?;
//!     Ok(())
//! }
//! ```

pub mod archive;
mod config;
mod directory;
mod error;
mod mind;
mod resolver;
mod scratch;
pub mod template;
mod versioning;

// Re-export public API
pub use config::{Config, MAX_COMPRESSION_LEVEL, MIN_COMPRESSION_LEVEL};
pub use directory::{Ownership, ProjectArchive, ProjectDirectory};
pub use error::{MindError, MindResult};
pub use mind::Mind;
pub use resolver::{resolve, MindSource, Resolution, Resolved};
pub use scratch::{remove_tree, ScratchDir};
pub use template::ensure_template;
pub use versioning::{VersionControl, BASE_MESSAGE};
