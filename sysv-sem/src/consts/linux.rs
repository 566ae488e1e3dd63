// SPDX-License-Identifier: MPL-2.0

//! `semctl` sub-commands as numbered by Linux (`include/uapi/linux/sem.h`).

/// Returns the pid of the last `semop` caller.
pub const GETPID: i32 = 11;
/// Returns the value of a counter.
pub const GETVAL: i32 = 12;
/// Copies all counter values into `arg.array`.
pub const GETALL: i32 = 13;
/// Returns the number of processes waiting for a counter to increase.
pub const GETNCNT: i32 = 14;
/// Returns the number of processes waiting for a counter to become zero.
pub const GETZCNT: i32 = 15;
/// Sets the value of a counter to `arg.val`.
pub const SETVAL: i32 = 16;
/// Sets all counter values from `arg.array`.
pub const SETALL: i32 = 17;

/// Maximum counter value.
pub const SEMVMX: i32 = 32767;
