//! Repository Layer
//!
//! MongoDB repositories for all domain entities.

pub mod account;
pub mod todo;
pub mod indexes;

pub use account::AccountRepository;
pub use todo::TodoRepository;
pub use indexes::ensure_indexes;

use mongodb::error::{Error, ErrorKind, WriteFailure};

/// Duplicate key (unique index) violation. Uniqueness races lost at write
/// time surface through this rather than the pre-insert checks.
pub(crate) fn is_duplicate_key_error(err: &Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == 11000
    )
}
