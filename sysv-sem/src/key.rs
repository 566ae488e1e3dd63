// SPDX-License-Identifier: MPL-2.0

use std::{ffi::CString, fmt, os::unix::ffi::OsStrExt, path::Path};

use crate::{consts::IPC_PRIVATE, prelude::*, sys};

/// The key under which processes agree on a semaphore set.
///
/// The crate never looks inside a key; it only hands it to `semget`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key(i32);

impl Key {
    /// The key that always yields a new set, reachable only through its id.
    pub const PRIVATE: Key = Key(IPC_PRIVATE);

    pub const fn from_raw(raw: i32) -> Self {
        Key(raw)
    }

    pub const fn as_raw(&self) -> i32 {
        self.0
    }

    pub const fn is_private(&self) -> bool {
        self.0 == IPC_PRIVATE
    }

    /// Derives a key from an existing file and a project id with `ftok(3)`.
    ///
    /// Processes passing the same path and `proj_id` get the same key as long
    /// as the file is not replaced. Only the low 8 bits of `proj_id` are used,
    /// and `proj_id` must not be zero.
    pub fn from_path(path: impl AsRef<Path>, proj_id: u8) -> Result<Self> {
        if proj_id == 0 {
            return_errno_with_message!(Errno::EINVAL, "ftok project id must be non-zero");
        }
        let path = CString::new(path.as_ref().as_os_str().as_bytes())?;
        sys::ftok(&path, proj_id).map(Key)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({:#x})", self.0)
    }
}

impl From<i32> for Key {
    fn from(raw: i32) -> Self {
        Key(raw)
    }
}
