//! # Guidepost Core
//!
//! Domain types, traits, and error definitions for the Guidepost skill
//! routing core. This crate has **zero framework dependencies** beyond
//! serde and async-trait — it defines the domain model that all other
//! crates implement against.
//!
//! ## Design Philosophy
//!
//! The one external seam — where skill content actually comes from — is
//! defined as a trait here (`ContentStore`). Implementations live in the
//! loader crate. This enables:
//! - Swapping backing stores via configuration
//! - Easy testing with in-memory stores
//! - Clean dependency graph (all crates depend inward on core)

pub mod content;
pub mod error;
pub mod request;
pub mod skill;

// Re-export key types at crate root for ergonomics
pub use content::{ContentStore, ContentUnit};
pub use error::{ContentError, Error, MatchError, RegistryError, Result, RouterError};
pub use request::{CandidateSummary, ErrorInfo, ErrorKind, Request, Response, Status};
pub use skill::{ContentRef, ContentRole, SkillDef, SkillId, SkillNode, Trigger, TriggerKind};
