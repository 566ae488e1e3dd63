// SPDX-License-Identifier: MPL-2.0

//! System V semaphore sets.
//!
//! A semaphore set is a group of non-negative counters kept by the kernel and
//! shared by every process that knows its [`Key`]. Processes take units from a
//! counter ("P", [`SemaphoreSet::decrement`]) and give them back ("V",
//! [`SemaphoreSet::increment`]); a batch of such operations is applied
//! atomically with [`SemaphoreSet::operate`].
//!
//! ```no_run
//! use sysv_sem::{Key, SemFlags, SemaphoreSet};
//!
//! let key = Key::from_path("/tmp", 0x22)?;
//! let set = SemaphoreSet::get(key)?;
//! if set.decrement(0, SemFlags::NOWAIT | SemFlags::UNDO)? {
//!     // Critical section.
//!     set.increment(0, SemFlags::UNDO)?;
//! }
//! # Ok::<(), sysv_sem::Error>(())
//! ```
//!
//! Operations tagged with [`SemFlags::UNDO`] are reverted by the kernel when
//! the process exits, so a crashed holder does not leak a unit.

#![deny(unsafe_code)]

pub mod consts;
pub mod error;
mod flags;
mod guard;
mod key;
mod op;
mod options;
mod prelude;
mod sem_set;
#[expect(unsafe_code)]
mod sys;

pub use self::{
    error::{Errno, Error, ErrorKind},
    flags::{CreateFlags, PermissionMode, SemFlags},
    guard::SemGuard,
    key::Key,
    op::SemOp,
    options::{DEFAULT_INIT_TIMEOUT, SemOptions},
    sem_set::{SemSetInfo, SemaphoreSet},
};

pub type Result<T> = core::result::Result<T, Error>;
