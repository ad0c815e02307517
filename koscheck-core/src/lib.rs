//! koscheck Core - Entity Types
//!
//! Pure data structures shared by every other crate in the workspace:
//! KOS records as returned by the remote list, resolution outcomes,
//! employment histories and the error taxonomy.

pub mod error;
pub mod history;
pub mod outcome;
pub mod record;

pub use error::{CacheError, KosError, KosResult, RemoteError, TailError};
pub use history::EmploymentHistory;
pub use outcome::ResolutionOutcome;
pub use record::{EntityKind, KosRecord, KosRecordSet};
