// SPDX-License-Identifier: MPL-2.0

use crate::{
    consts::{GETNCNT, GETPID, GETVAL, GETZCNT, SEMVMX},
    flags::{CreateFlags, PermissionMode, SemFlags},
    guard::SemGuard,
    key::Key,
    op::SemOp,
    options::SemOptions,
    prelude::*,
    sys,
};

/// A handle to a kernel semaphore set.
///
/// The handle is only an id plus the number of counters. Dropping it leaves
/// the kernel object alone; [`remove`] destroys it for every process.
///
/// [`remove`]: Self::remove
#[derive(Debug)]
pub struct SemaphoreSet {
    /// Set identifier returned by `semget`
    semid: i32,
    /// Number of counters in the set
    nsems: usize,
    /// Whether blocking operations restart after `EINTR`
    retry_interrupted: bool,
}

/// Kernel bookkeeping of a set, as reported by `IPC_STAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemSetInfo {
    /// Number of counters
    pub nsems: usize,
    /// Permission bits
    pub mode: PermissionMode,
    /// Owner's user ID
    pub uid: u32,
    /// Owner's group ID
    pub gid: u32,
    /// Creator's user ID
    pub cuid: u32,
    /// Creator's group ID
    pub cgid: u32,
    /// Last `semop` time in seconds since the epoch, 0 if none yet
    pub otime: i64,
    /// Creation time or last change via `semctl`
    pub ctime: i64,
}

impl SemaphoreSet {
    pub(crate) fn new(semid: i32, nsems: usize, retry_interrupted: bool) -> Self {
        Self {
            semid,
            nsems,
            retry_interrupted,
        }
    }

    /// Looks up or creates the one-counter set of `key`, initialized to 1.
    ///
    /// An existing set that was never operated on through `semop` delays the
    /// call by [`DEFAULT_INIT_TIMEOUT`]; see [`SemOptions::init_timeout`] for
    /// opening it without the wait.
    ///
    /// [`DEFAULT_INIT_TIMEOUT`]: crate::DEFAULT_INIT_TIMEOUT
    pub fn get(key: Key) -> Result<Self> {
        SemOptions::new().open(key)
    }

    /// Looks up the set of `key`, or creates one with `count` counters when
    /// `flags` allow it.
    pub fn get_or_create(
        key: Key,
        count: usize,
        flags: CreateFlags,
        mode: PermissionMode,
    ) -> Result<Self> {
        SemOptions::new()
            .count(count)
            .flags(flags)
            .mode(mode)
            .open(key)
    }

    /// Wraps an id obtained elsewhere, e.g. from another process.
    pub fn from_id(semid: i32) -> Result<Self> {
        let info = sys::semctl_stat(semid)?;
        Ok(Self::new(semid, info.nsems, true))
    }

    pub fn id(&self) -> i32 {
        self.semid
    }

    pub fn nsems(&self) -> usize {
        self.nsems
    }

    pub fn retry_interrupted(&self) -> bool {
        self.retry_interrupted
    }

    /// Chooses whether a blocking operation interrupted by a signal restarts
    /// (the default) or fails with [`ErrorKind::Interrupted`].
    pub fn set_retry_interrupted(&mut self, retry: bool) {
        self.retry_interrupted = retry;
    }

    /// Destroys the set. Processes blocked on it wake up with an error.
    pub fn remove(self) -> Result<()> {
        sys::semctl_rmid(self.semid)
    }

    /// Applies `ops` as one atomic unit: either all of them take effect or
    /// none does.
    ///
    /// A no-wait operation that cannot proceed fails with
    /// [`ErrorKind::WouldBlock`].
    pub fn operate(&self, ops: &[SemOp]) -> Result<()> {
        if ops.is_empty() {
            return_errno_with_message!(Errno::EINVAL, "empty operation batch");
        }
        let mut sops = Vec::with_capacity(ops.len());
        for op in ops {
            self.check_index(op.index())?;
            sops.push(op.to_sem_buf());
        }

        loop {
            match sys::semop(self.semid, &mut sops) {
                Err(error) if error.error() == Errno::EINTR && self.retry_interrupted => {
                    trace!("[semop] semid = {} interrupted, restarting", self.semid);
                }
                result => return result,
            }
        }
    }

    /// Takes one unit from the counter at `index` ("P").
    ///
    /// Returns `Ok(false)` if `flags` contain [`SemFlags::NOWAIT`] and the
    /// counter is zero. Empty `flags` mean [`SemFlags::UNDO`].
    pub fn decrement(&self, index: u16, flags: SemFlags) -> Result<bool> {
        self.adjust(SemOp::decrement(index, or_undo(flags)))
    }

    /// Gives one unit back to the counter at `index` ("V").
    ///
    /// Empty `flags` mean [`SemFlags::UNDO`].
    pub fn increment(&self, index: u16, flags: SemFlags) -> Result<bool> {
        self.adjust(SemOp::increment(index, or_undo(flags)))
    }

    fn adjust(&self, op: SemOp) -> Result<bool> {
        match self.operate(&[op]) {
            Ok(()) => Ok(true),
            Err(error) if error.error() == Errno::EAGAIN => Ok(false),
            Err(error) => Err(error),
        }
    }

    /// Blocks until one unit of the counter at `index` is taken, and gives
    /// it back when the guard is dropped.
    pub fn acquire(&self, index: u16) -> Result<SemGuard<'_>> {
        self.decrement(index, SemFlags::UNDO)?;
        Ok(SemGuard::new(self, index))
    }

    /// Like [`acquire`], but returns `None` instead of blocking.
    ///
    /// [`acquire`]: Self::acquire
    pub fn try_acquire(&self, index: u16) -> Result<Option<SemGuard<'_>>> {
        let acquired = self.decrement(index, SemFlags::NOWAIT | SemFlags::UNDO)?;
        Ok(acquired.then(|| SemGuard::new(self, index)))
    }

    pub fn get_value(&self, index: u16) -> Result<i32> {
        self.query(index, GETVAL)
    }

    /// Overwrites the counter at `index`.
    ///
    /// This races with concurrent operations of other processes and is meant
    /// for initialization only.
    pub fn set_value(&self, index: u16, value: i32) -> Result<()> {
        self.check_index(index)?;
        if !(0..=SEMVMX).contains(&value) {
            return_errno_with_message!(Errno::ERANGE, "counter value out of range");
        }
        sys::semctl_setval(self.semid, index, value)
    }

    /// Returns the pid of the process that last operated on the counter.
    pub fn get_pid(&self, index: u16) -> Result<i32> {
        self.query(index, GETPID)
    }

    /// Returns how many processes wait for the counter to increase.
    pub fn get_ncnt(&self, index: u16) -> Result<usize> {
        self.query(index, GETNCNT).map(|count| count as usize)
    }

    /// Returns how many processes wait for the counter to become zero.
    pub fn get_zcnt(&self, index: u16) -> Result<usize> {
        self.query(index, GETZCNT).map(|count| count as usize)
    }

    pub fn get_all(&self) -> Result<Vec<u16>> {
        // The kernel writes as many values as the set has counters right now.
        let nsems = self.stat()?.nsems;
        let mut values = vec![0; nsems];
        sys::semctl_getall(self.semid, &mut values)?;
        Ok(values)
    }

    /// Overwrites every counter. `values` must have one entry per counter.
    pub fn set_all(&self, values: &[u16]) -> Result<()> {
        let nsems = self.stat()?.nsems;
        if values.len() != nsems {
            return_errno_with_message!(Errno::EINVAL, "one value per counter is required");
        }
        if values.iter().any(|&value| i32::from(value) > SEMVMX) {
            return_errno_with_message!(Errno::ERANGE, "counter value out of range");
        }
        sys::semctl_setall(self.semid, values)
    }

    pub fn stat(&self) -> Result<SemSetInfo> {
        sys::semctl_stat(self.semid)
    }

    /// Replaces the permission bits. Only the owner, the creator or a
    /// privileged process may do this.
    pub fn set_mode(&self, mode: PermissionMode) -> Result<()> {
        sys::semctl_set_mode(self.semid, mode)
    }

    fn query(&self, index: u16, cmd: i32) -> Result<i32> {
        self.check_index(index)?;
        sys::semctl_get(self.semid, index, cmd)
    }

    fn check_index(&self, index: u16) -> Result<()> {
        if usize::from(index) >= self.nsems {
            return_errno_with_message!(Errno::EINVAL, "counter index out of range");
        }
        Ok(())
    }
}

fn or_undo(flags: SemFlags) -> SemFlags {
    if flags.is_empty() {
        SemFlags::UNDO
    } else {
        flags
    }
}
