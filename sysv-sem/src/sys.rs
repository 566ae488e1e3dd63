// SPDX-License-Identifier: MPL-2.0

//! The raw syscall boundary.
//!
//! This is the only module of the crate that touches `unsafe`. Every wrapper
//! follows the C convention of the underlying call: a return value of `-1`
//! means failure and only then is `errno` consulted.

use std::{ffi::CStr, mem::MaybeUninit};

use crate::{
    consts::{GETALL, IPC_RMID, IPC_SET, IPC_STAT, SETALL, SETVAL},
    prelude::*,
    sem_set::SemSetInfo,
};

/// Semaphore operation buffer passed to `semop`.
///
/// Mirrors `struct sembuf` field by field; the layout is checked against
/// `libc::sembuf` in the tests below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub(crate) struct SemBuf {
    /// Counter index
    pub(crate) sem_num: u16,
    /// Counter adjustment
    pub(crate) sem_op: i16,
    /// Operation flags
    pub(crate) sem_flg: i16,
}

/// The fourth argument of `semctl`. Callers must define it themselves.
#[repr(C)]
union Semun {
    val: libc::c_int,
    buf: *mut libc::semid_ds,
    array: *mut libc::c_ushort,
}

fn check(ret: libc::c_int) -> Result<libc::c_int> {
    if ret == -1 {
        return Err(Error::last_os_error());
    }
    Ok(ret)
}

pub(crate) fn semget(key: i32, nsems: i32, flags: i32) -> Result<i32> {
    debug!(
        "[semget] key = {:#x}, nsems = {}, flags = {:#o}",
        key, nsems, flags
    );
    // SAFETY: `semget` takes no pointers.
    check(unsafe { libc::semget(key, nsems, flags) })
}

pub(crate) fn semop(semid: i32, sops: &mut [SemBuf]) -> Result<()> {
    debug!("[semop] semid = {}, sops = {:?}", semid, sops);
    // SAFETY: `SemBuf` has the layout of `struct sembuf` and the kernel reads
    // exactly `sops.len()` entries.
    let ret = unsafe {
        libc::semop(
            semid,
            sops.as_mut_ptr().cast::<libc::sembuf>(),
            sops.len() as _,
        )
    };
    check(ret).map(|_| ())
}

/// Runs a `semctl` command whose result is the return value
/// (`GETVAL`, `GETPID`, `GETNCNT`, `GETZCNT`).
pub(crate) fn semctl_get(semid: i32, semnum: u16, cmd: i32) -> Result<i32> {
    debug!(
        "[semctl] semid = {}, semnum = {}, cmd = {}",
        semid, semnum, cmd
    );
    let arg = Semun { val: 0 };
    // SAFETY: the read commands ignore `arg`.
    check(unsafe { libc::semctl(semid, semnum as libc::c_int, cmd, arg) })
}

pub(crate) fn semctl_setval(semid: i32, semnum: u16, val: i32) -> Result<()> {
    debug!(
        "[semctl] semid = {}, semnum = {}, cmd = SETVAL, val = {}",
        semid, semnum, val
    );
    let arg = Semun { val };
    // SAFETY: `SETVAL` only reads `arg.val`.
    check(unsafe { libc::semctl(semid, semnum as libc::c_int, SETVAL, arg) }).map(|_| ())
}

/// Copies every counter into `values`, which must hold exactly as many
/// entries as the set has counters.
pub(crate) fn semctl_getall(semid: i32, values: &mut [u16]) -> Result<()> {
    debug!(
        "[semctl] semid = {}, cmd = GETALL, len = {}",
        semid,
        values.len()
    );
    let arg = Semun {
        array: values.as_mut_ptr(),
    };
    // SAFETY: the kernel writes `nsems` entries and the caller sized `values`
    // with the `nsems` reported by `IPC_STAT`.
    check(unsafe { libc::semctl(semid, 0, GETALL, arg) }).map(|_| ())
}

pub(crate) fn semctl_setall(semid: i32, values: &[u16]) -> Result<()> {
    debug!("[semctl] semid = {}, cmd = SETALL, values = {:?}", semid, values);
    let arg = Semun {
        array: values.as_ptr().cast_mut(),
    };
    // SAFETY: `SETALL` only reads `nsems` entries from `arg.array`, and the
    // caller checked that `values` is that long.
    check(unsafe { libc::semctl(semid, 0, SETALL, arg) }).map(|_| ())
}

fn stat_raw(semid: i32) -> Result<libc::semid_ds> {
    let mut ds = MaybeUninit::<libc::semid_ds>::zeroed();
    let arg = Semun {
        buf: ds.as_mut_ptr(),
    };
    // SAFETY: `IPC_STAT` fills the `semid_ds` pointed to by `arg.buf`.
    check(unsafe { libc::semctl(semid, 0, IPC_STAT, arg) })?;
    // SAFETY: a zeroed `semid_ds` is valid and the kernel has filled it in.
    Ok(unsafe { ds.assume_init() })
}

pub(crate) fn semctl_stat(semid: i32) -> Result<SemSetInfo> {
    debug!("[semctl] semid = {}, cmd = IPC_STAT", semid);
    let ds = stat_raw(semid)?;
    Ok(SemSetInfo {
        nsems: ds.sem_nsems as usize,
        mode: PermissionMode::from_octal(ds.sem_perm.mode as u16),
        uid: ds.sem_perm.uid,
        gid: ds.sem_perm.gid,
        cuid: ds.sem_perm.cuid,
        cgid: ds.sem_perm.cgid,
        otime: ds.sem_otime as i64,
        ctime: ds.sem_ctime as i64,
    })
}

/// Replaces the permission bits of the set, keeping the owner.
pub(crate) fn semctl_set_mode(semid: i32, mode: PermissionMode) -> Result<()> {
    debug!(
        "[semctl] semid = {}, cmd = IPC_SET, mode = {:#o}",
        semid,
        mode.bits()
    );
    let mut ds = stat_raw(semid)?;
    ds.sem_perm.mode = mode.bits() as _;
    let arg = Semun { buf: &mut ds };
    // SAFETY: `IPC_SET` reads the owner and mode out of `arg.buf`, which
    // points to a live `semid_ds`.
    check(unsafe { libc::semctl(semid, 0, IPC_SET, arg) }).map(|_| ())
}

pub(crate) fn semctl_rmid(semid: i32) -> Result<()> {
    debug!("[semctl] semid = {}, cmd = IPC_RMID", semid);
    let arg = Semun { val: 0 };
    // SAFETY: `IPC_RMID` ignores `arg`.
    check(unsafe { libc::semctl(semid, 0, IPC_RMID, arg) }).map(|_| ())
}

pub(crate) fn ftok(path: &CStr, proj_id: u8) -> Result<i32> {
    debug!("[ftok] path = {:?}, proj_id = {:#x}", path, proj_id);
    // SAFETY: `path` is a valid nul-terminated string for the whole call.
    check(unsafe { libc::ftok(path.as_ptr(), proj_id as libc::c_int) })
}
