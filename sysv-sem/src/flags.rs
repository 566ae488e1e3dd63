// SPDX-License-Identifier: MPL-2.0

use bitflags::bitflags;

use crate::consts::{IPC_CREAT, IPC_EXCL, IPC_NOWAIT, SEM_UNDO};

bitflags! {
    /// Flags of a single semaphore operation (`sem_flg`).
    pub struct SemFlags: i16 {
        /// Fail with `EAGAIN` instead of blocking.
        const NOWAIT = IPC_NOWAIT as i16;
        /// Revert the adjustment when the process exits.
        const UNDO = SEM_UNDO as i16;
    }
}

bitflags! {
    /// Flags controlling how a set is resolved by its key.
    pub struct CreateFlags: i32 {
        /// Create the set if no set exists for the key.
        const CREATE = IPC_CREAT;
        /// Together with `CREATE`, fail if a set already exists.
        const EXCLUSIVE = IPC_EXCL;
    }
}

bitflags! {
    /// Access mode of a semaphore set.
    ///
    /// For semaphores the "write" bit of a file mode means "alter".
    pub struct PermissionMode: u16 {
        const OWNER_READ = 0o400;
        const OWNER_ALTER = 0o200;
        const GROUP_READ = 0o040;
        const GROUP_ALTER = 0o020;
        const OTHER_READ = 0o004;
        const OTHER_ALTER = 0o002;

        const OWNER_RW = Self::OWNER_READ.bits | Self::OWNER_ALTER.bits;
        /// `0o666`, the mode used when none is given.
        const ALL_RW = Self::OWNER_RW.bits
            | Self::GROUP_READ.bits
            | Self::GROUP_ALTER.bits
            | Self::OTHER_READ.bits
            | Self::OTHER_ALTER.bits;
    }
}

impl Default for PermissionMode {
    fn default() -> Self {
        PermissionMode::ALL_RW
    }
}

impl PermissionMode {
    /// Builds a mode from octal bits such as `0o600`, ignoring anything
    /// other than the nine permission bits.
    pub fn from_octal(mode: u16) -> Self {
        PermissionMode::from_bits_truncate(mode)
    }
}
