//! Server error codes the mongodb crate exposes only as raw integers.

use mongodb::error::{Error as DbError, ErrorKind, WriteFailure};

/// Raised when an insert or update collides with a unique index.
pub const DUPLICATE_KEY: i32 = 11000;

/// Return true if the given result failed with a duplicate key write error.
pub fn is_duplicate_key_error<T>(result: Result<T, &DbError>) -> bool {
    if let Err(err) = result {
        if let ErrorKind::Write(WriteFailure::WriteError(ref e)) = *err.kind {
            return e.code == DUPLICATE_KEY;
        }
    }
    false
}
