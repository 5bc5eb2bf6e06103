pub mod config;
pub mod csv;
pub mod error;
pub mod member;
pub mod store;

pub use config::{Config, DisplaySettings, ExportSettings, GymSettings, StorageSettings};
pub use error::{GymError, Result};
pub use member::{Member, MemberCandidate, MemberId, MemberQuery, MembershipType, Roster, Status};
pub use store::{FileStore, KeyValueStore, MemoryStore, MEMBERS_KEY};
