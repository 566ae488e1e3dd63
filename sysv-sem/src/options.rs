// SPDX-License-Identifier: MPL-2.0

use std::{
    thread,
    time::{Duration, Instant},
};

use crate::{
    consts::{IPC_CREAT, IPC_EXCL, SEMVMX},
    flags::{CreateFlags, PermissionMode, SemFlags},
    key::Key,
    op::SemOp,
    prelude::*,
    sem_set::{SemSetInfo, SemaphoreSet},
    sys::{self, SemBuf},
};

/// How long an opener waits for the creator to initialize the counters,
/// unless configured otherwise.
pub const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_secs(1);

const INIT_POLL_START: Duration = Duration::from_millis(1);
const INIT_POLL_MAX: Duration = Duration::from_millis(50);

/// Options for resolving a semaphore set by its key.
///
/// The defaults give a binary lock: one counter, mode `0o666`, created on
/// demand and initialized to 1.
///
/// ```no_run
/// use sysv_sem::{Key, SemOptions};
///
/// let key = Key::from_path("/tmp", 0x22)?;
/// let set = SemOptions::new().count(4).initial_value(2).open(key)?;
/// assert_eq!(set.nsems(), 4);
/// # Ok::<(), sysv_sem::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct SemOptions {
    count: usize,
    mode: PermissionMode,
    create: bool,
    exclusive: bool,
    initial_value: u16,
    init_timeout: Option<Duration>,
    retry_interrupted: bool,
}

impl Default for SemOptions {
    fn default() -> Self {
        Self {
            count: 1,
            mode: PermissionMode::default(),
            create: true,
            exclusive: false,
            initial_value: 1,
            init_timeout: Some(DEFAULT_INIT_TIMEOUT),
            retry_interrupted: true,
        }
    }
}

impl SemOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of counters in the set.
    ///
    /// When an existing set is found it must have at least this many
    /// counters.
    pub fn count(&mut self, count: usize) -> &mut Self {
        self.count = count;
        self
    }

    pub fn mode(&mut self, mode: PermissionMode) -> &mut Self {
        self.mode = mode;
        self
    }

    /// Whether to create the set when no set exists for the key.
    /// `create(false)` also clears `exclusive`.
    pub fn create(&mut self, create: bool) -> &mut Self {
        self.create = create;
        if !create {
            self.exclusive = false;
        }
        self
    }

    /// Whether creation must produce a new set. Implies `create(true)`.
    pub fn exclusive(&mut self, exclusive: bool) -> &mut Self {
        self.exclusive = exclusive;
        if exclusive {
            self.create = true;
        }
        self
    }

    /// Sets `create` and `exclusive` from the raw creation flags.
    pub fn flags(&mut self, flags: CreateFlags) -> &mut Self {
        self.create = flags.contains(CreateFlags::CREATE);
        self.exclusive = self.create && flags.contains(CreateFlags::EXCLUSIVE);
        self
    }

    /// Value given to every counter of a newly created set.
    pub fn initial_value(&mut self, value: u16) -> &mut Self {
        self.initial_value = value;
        self
    }

    /// How long to wait for another process to finish initializing a set
    /// it has just created. `None` disables the wait.
    ///
    /// Readiness is judged by the last operation time of the set, which only
    /// `semop` sets. A set that was given its values with `SETVAL`/`SETALL`
    /// and never operated on, or whose creator died before initializing it,
    /// looks uninitialized: every open of it waits out the full timeout. Pass
    /// `None` when the key is shared with programs that initialize that way.
    pub fn init_timeout(&mut self, timeout: Option<Duration>) -> &mut Self {
        self.init_timeout = timeout;
        self
    }

    /// Whether blocking operations restart after a signal interrupts them.
    pub fn retry_interrupted(&mut self, retry: bool) -> &mut Self {
        self.retry_interrupted = retry;
        self
    }

    /// Looks the set up, creating and initializing it if allowed.
    ///
    /// Concurrent callers with the same key converge on one set: only the
    /// caller whose exclusive creation succeeds initializes the counters, and
    /// a caller that loses the creation race looks the set up again.
    pub fn open(&self, key: Key) -> Result<SemaphoreSet> {
        self.check()?;
        let nsems = self.count as i32;
        let mode = i32::from(self.mode.bits());

        if key.is_private() {
            let semid = sys::semget(key.as_raw(), nsems, IPC_CREAT | mode)?;
            return self.initialize(semid);
        }

        loop {
            if !self.exclusive {
                match sys::semget(key.as_raw(), nsems, mode) {
                    Ok(semid) => return self.attach(semid),
                    Err(error) if error.error() == Errno::ENOENT && self.create => {}
                    Err(error) => return Err(error),
                }
            }

            match sys::semget(key.as_raw(), nsems, IPC_CREAT | IPC_EXCL | mode) {
                Ok(semid) => return self.initialize(semid),
                Err(error) if error.error() == Errno::EEXIST && !self.exclusive => {
                    debug!("{:?} was created concurrently, looking it up again", key);
                }
                Err(error) => return Err(error),
            }
        }
    }

    fn check(&self) -> Result<()> {
        if self.count == 0 {
            return_errno_with_message!(Errno::EINVAL, "a set needs at least one counter");
        }
        if self.count > usize::from(u16::MAX) {
            return_errno_with_message!(Errno::EINVAL, "too many counters");
        }
        if i32::from(self.initial_value) > SEMVMX {
            return_errno_with_message!(Errno::ERANGE, "initial value exceeds SEMVMX");
        }
        Ok(())
    }

    fn initialize(&self, semid: i32) -> Result<SemaphoreSet> {
        if let Err(error) = self.init_counters(semid) {
            warn!(
                "failed to initialize semaphore set {}: {}; removing it",
                semid, error
            );
            if let Err(rmid_error) = sys::semctl_rmid(semid) {
                error!("failed to remove semaphore set {}: {}", semid, rmid_error);
            }
            return Err(error);
        }
        Ok(SemaphoreSet::new(
            semid,
            self.count,
            self.retry_interrupted,
        ))
    }

    /// Gives every counter its initial value with `semop`, so that the last
    /// operation time of the set tells openers that initialization is done.
    ///
    /// Adding `initial_value` relies on the kernel zero-filling the counters
    /// of a new set. Linux and the BSDs do; POSIX leaves them unspecified. The
    /// `SETALL` fallback writes absolute values and does not depend on it.
    fn init_counters(&self, semid: i32) -> Result<()> {
        if self.initial_value == 0 {
            // The counters start at zero; a wait-for-zero only stamps the set.
            let mut stamp = [SemOp::wait_zero(0, SemFlags::NOWAIT).to_sem_buf()];
            return sys::semop(semid, &mut stamp);
        }

        let delta = self.initial_value as i16;
        let mut sops: Vec<SemBuf> = (0..self.count)
            .map(|index| SemOp::new(index as u16, delta, SemFlags::empty()).to_sem_buf())
            .collect();
        match sys::semop(semid, &mut sops) {
            // More counters than one `semop` call may carry (SEMOPM).
            Err(error) if error.error() == Errno::E2BIG => {
                let values = vec![self.initial_value; self.count];
                sys::semctl_setall(semid, &values)?;
                let mut stamp = [
                    SemOp::decrement(0, SemFlags::empty()).to_sem_buf(),
                    SemOp::increment(0, SemFlags::empty()).to_sem_buf(),
                ];
                sys::semop(semid, &mut stamp)
            }
            result => result,
        }
    }

    fn attach(&self, semid: i32) -> Result<SemaphoreSet> {
        let mut info = sys::semctl_stat(semid)?;
        if let Some(timeout) = self.init_timeout {
            info = wait_for_init(semid, info, timeout)?;
        }
        Ok(SemaphoreSet::new(
            semid,
            info.nsems,
            self.retry_interrupted,
        ))
    }
}

/// Polls the set until its creator has run the initializing `semop`.
fn wait_for_init(semid: i32, mut info: SemSetInfo, timeout: Duration) -> Result<SemSetInfo> {
    let deadline = Instant::now() + timeout;
    let mut backoff = INIT_POLL_START;
    while info.otime == 0 {
        let now = Instant::now();
        if now >= deadline {
            warn!(
                "semaphore set {} is still uninitialized after {:?}",
                semid, timeout
            );
            break;
        }
        thread::sleep(backoff.min(deadline - now));
        backoff = (backoff * 2).min(INIT_POLL_MAX);
        info = sys::semctl_stat(semid)?;
    }
    Ok(info)
}
