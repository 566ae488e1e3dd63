// SPDX-License-Identifier: MPL-2.0

//! Numeric codes understood by the System V semaphore syscalls.
//!
//! The IPC flag bits and the generic control commands are shared by every
//! supported platform. The `semctl` sub-commands are not: Linux numbers them
//! from 11, the BSD family (Darwin included) from 3. The right table is picked
//! at compile time.

use cfg_if::cfg_if;

/// Creates the set if the key does not exist.
pub const IPC_CREAT: i32 = 0o1000;
/// Fails if the key exists. Only meaningful together with `IPC_CREAT`.
pub const IPC_EXCL: i32 = 0o2000;
/// Returns an error instead of blocking.
pub const IPC_NOWAIT: i32 = 0o4000;
/// Asks the kernel to revert the adjustment when the process exits.
pub const SEM_UNDO: i32 = 0o10000;

/// Removes the identifier.
pub const IPC_RMID: i32 = 0;
/// Sets `ipc_perm` options.
pub const IPC_SET: i32 = 1;
/// Gets `ipc_perm` options.
pub const IPC_STAT: i32 = 2;

/// The key that always yields a fresh set.
pub const IPC_PRIVATE: i32 = 0;

cfg_if! {
    if #[cfg(target_os = "linux")] {
        mod linux;
        pub use self::linux::*;
    } else if #[cfg(any(
        target_os = "macos",
        target_os = "dragonfly",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd",
    ))] {
        mod bsd;
        pub use self::bsd::*;
    } else {
        compile_error!("System V semaphores are not supported on this target");
    }
}
