//! Directory store backing the REST service
//!
//! Holds students, mentors, meeting requests and bearer tokens in memory.
//! Every operation that checks and then writes runs under one `&mut` borrow,
//! so callers holding the write lock see it as atomic. Password hashes are
//! computed by the caller before the lock is taken.

mod directory;
mod password;

pub use directory::Directory;
pub use password::{
    hash_password, hash_password_blocking, verify_password, verify_password_blocking,
};
