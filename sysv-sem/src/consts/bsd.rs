// SPDX-License-Identifier: MPL-2.0

//! `semctl` sub-commands as numbered by the BSD family (`sys/sem.h`),
//! including Darwin.

/// Returns the number of processes waiting for a counter to increase.
pub const GETNCNT: i32 = 3;
/// Returns the pid of the last `semop` caller.
pub const GETPID: i32 = 4;
/// Returns the value of a counter.
pub const GETVAL: i32 = 5;
/// Copies all counter values into `arg.array`.
pub const GETALL: i32 = 6;
/// Returns the number of processes waiting for a counter to become zero.
pub const GETZCNT: i32 = 7;
/// Sets the value of a counter to `arg.val`.
pub const SETVAL: i32 = 8;
/// Sets all counter values from `arg.array`.
pub const SETALL: i32 = 9;

/// Maximum counter value.
pub const SEMVMX: i32 = 32767;
