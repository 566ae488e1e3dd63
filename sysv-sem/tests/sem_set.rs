// SPDX-License-Identifier: MPL-2.0

mod common;

use std::{
    ffi::c_int,
    os::unix::thread::JoinHandleExt,
    sync::{
        Barrier,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use common::{init_logger, private_set, wait_until};
use nix::sys::{
    pthread::pthread_kill,
    signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction},
};
use sysv_sem::{
    CreateFlags, ErrorKind, Key, PermissionMode, SemFlags, SemOp, SemOptions, SemaphoreSet,
    consts::SEMVMX,
};

#[test]
fn try_lock_never_blocks() {
    let set = private_set(1, 0);

    let start = Instant::now();
    let acquired = set.decrement(0, SemFlags::NOWAIT | SemFlags::UNDO).unwrap();
    assert!(!acquired);
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(set.get_value(0).unwrap(), 0);

    set.remove().unwrap();
}

#[test]
fn decrement_then_increment() {
    let set = private_set(1, 1);

    assert!(set.decrement(0, SemFlags::NOWAIT | SemFlags::UNDO).unwrap());
    assert_eq!(set.get_value(0).unwrap(), 0);
    assert!(set.increment(0, SemFlags::NOWAIT | SemFlags::UNDO).unwrap());
    assert_eq!(set.get_value(0).unwrap(), 1);

    // Empty flags fall back to SEM_UNDO and still work.
    assert!(set.decrement(0, SemFlags::empty()).unwrap());
    assert!(set.increment(0, SemFlags::empty()).unwrap());
    assert_eq!(set.get_value(0).unwrap(), 1);

    set.remove().unwrap();
}

#[test]
fn mutual_exclusion() {
    let set = private_set(1, 1);
    let barrier = Barrier::new(2);

    let winners = thread::scope(|s| {
        let contenders: Vec<_> = (0..2)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    set.decrement(0, SemFlags::NOWAIT | SemFlags::UNDO).unwrap()
                })
            })
            .collect();
        contenders
            .into_iter()
            .map(|contender| contender.join().unwrap())
            .filter(|&acquired| acquired)
            .count()
    });
    assert_eq!(winners, 1);
    assert_eq!(set.get_value(0).unwrap(), 0);

    set.increment(0, SemFlags::UNDO).unwrap();
    set.remove().unwrap();
}

#[test]
fn release_unblocks_waiter() {
    let set = private_set(1, 0);
    let released = AtomicBool::new(false);

    thread::scope(|s| {
        let waiter = s.spawn(|| {
            let acquired = set.decrement(0, SemFlags::UNDO).unwrap();
            (acquired, released.load(Ordering::SeqCst))
        });

        wait_until(|| set.get_ncnt(0).unwrap() == 1);
        released.store(true, Ordering::SeqCst);
        assert!(set.increment(0, SemFlags::UNDO).unwrap());

        let (acquired, after_release) = waiter.join().unwrap();
        assert!(acquired);
        assert!(after_release);
    });
    assert_eq!(set.get_ncnt(0).unwrap(), 0);
    assert_eq!(set.get_value(0).unwrap(), 0);

    set.remove().unwrap();
}

#[test]
fn value_round_trip() {
    let set = private_set(2, 0);

    for value in [0, 1, 17, SEMVMX - 1, SEMVMX] {
        set.set_value(1, value).unwrap();
        assert_eq!(set.get_value(1).unwrap(), value);
    }
    assert_eq!(set.get_value(0).unwrap(), 0);

    let error = set.set_value(0, SEMVMX + 1).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidArgument);

    set.remove().unwrap();
}

#[test]
fn removal_invalidates() {
    let set = private_set(1, 1);
    let alias = SemaphoreSet::from_id(set.id()).unwrap();
    assert_eq!(alias.nsems(), 1);
    assert_eq!(alias.get_value(0).unwrap(), 1);

    set.remove().unwrap();

    let error = alias.get_value(0).unwrap_err();
    assert!(matches!(
        error.kind(),
        ErrorKind::NotFound | ErrorKind::InvalidArgument
    ));
    let error = SemaphoreSet::from_id(alias.id()).unwrap_err();
    assert!(matches!(
        error.kind(),
        ErrorKind::NotFound | ErrorKind::InvalidArgument
    ));
    // A second removal is an error, not a silent success.
    assert!(alias.remove().is_err());
}

#[test]
fn removal_wakes_blocked_waiter() {
    let set = private_set(1, 0);
    let alias = SemaphoreSet::from_id(set.id()).unwrap();

    thread::scope(|s| {
        let waiter = s.spawn(|| alias.decrement(0, SemFlags::UNDO));

        wait_until(|| set.get_ncnt(0).unwrap() == 1);
        set.remove().unwrap();

        let error = waiter.join().unwrap().unwrap_err();
        assert!(matches!(
            error.kind(),
            ErrorKind::NotFound | ErrorKind::InvalidArgument
        ));
    });
}

#[test]
fn batch_is_atomic() {
    let set = private_set(2, 0);
    set.set_all(&[1, 0]).unwrap();

    let error = set
        .operate(&[
            SemOp::decrement(0, SemFlags::NOWAIT),
            SemOp::decrement(1, SemFlags::NOWAIT),
        ])
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::WouldBlock);
    assert_eq!(set.get_all().unwrap(), vec![1, 0]);

    set.operate(&[
        SemOp::new(0, -1, SemFlags::NOWAIT),
        SemOp::new(1, 3, SemFlags::NOWAIT),
        SemOp::wait_zero(0, SemFlags::NOWAIT),
    ])
    .unwrap();
    assert_eq!(set.get_all().unwrap(), vec![0, 3]);

    set.remove().unwrap();
}

#[test]
fn set_all_and_get_all() {
    let set = private_set(3, 2);
    assert_eq!(set.get_all().unwrap(), vec![2, 2, 2]);

    set.set_all(&[0, 5, 9]).unwrap();
    assert_eq!(set.get_all().unwrap(), vec![0, 5, 9]);
    assert_eq!(set.get_value(2).unwrap(), 9);

    let error = set.set_all(&[1, 2]).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidArgument);

    set.remove().unwrap();
}

#[test]
fn auxiliary_queries() {
    init_logger();
    let set = SemOptions::new()
        .count(3)
        .mode(PermissionMode::OWNER_RW)
        .open(Key::PRIVATE)
        .unwrap();

    let info = set.stat().unwrap();
    assert_eq!(info.nsems, 3);
    assert_eq!(info.mode, PermissionMode::OWNER_RW);
    assert_ne!(info.otime, 0);

    assert!(set.decrement(1, SemFlags::NOWAIT | SemFlags::UNDO).unwrap());
    assert_eq!(set.get_pid(1).unwrap(), std::process::id() as i32);
    assert_eq!(set.get_ncnt(1).unwrap(), 0);
    assert_eq!(set.get_zcnt(1).unwrap(), 0);

    set.set_mode(PermissionMode::from_octal(0o640)).unwrap();
    assert_eq!(set.stat().unwrap().mode.bits(), 0o640);

    let error = set.get_value(3).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidArgument);

    set.remove().unwrap();
}

#[test]
fn create_then_get_is_idempotent() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let key = Key::from_path(dir.path(), 0x22).unwrap();
    let barrier = Barrier::new(8);

    let ids: Vec<i32> = thread::scope(|s| {
        let openers: Vec<_> = (0..8)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    SemaphoreSet::get_or_create(
                        key,
                        1,
                        CreateFlags::CREATE,
                        PermissionMode::default(),
                    )
                    .unwrap()
                    .id()
                })
            })
            .collect();
        openers
            .into_iter()
            .map(|opener| opener.join().unwrap())
            .collect()
    });
    assert!(ids.iter().all(|&id| id == ids[0]));

    // Initialized exactly once: a second initialization would have added 1.
    let set = SemaphoreSet::get(key).unwrap();
    assert_eq!(set.id(), ids[0]);
    assert_eq!(set.get_value(0).unwrap(), 1);

    set.remove().unwrap();
}

#[test]
fn exclusive_creation_conflicts() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let key = Key::from_path(dir.path(), 0x23).unwrap();
    let flags = CreateFlags::CREATE | CreateFlags::EXCLUSIVE;

    let set = SemaphoreSet::get_or_create(key, 2, flags, PermissionMode::default()).unwrap();
    assert_eq!(set.get_all().unwrap(), vec![1, 1]);

    let error = SemaphoreSet::get_or_create(key, 2, flags, PermissionMode::default()).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::AlreadyExists);

    // A plain lookup finds it, a lookup asking for more counters does not fit.
    let found =
        SemaphoreSet::get_or_create(key, 1, CreateFlags::empty(), PermissionMode::default())
            .unwrap();
    assert_eq!(found.id(), set.id());
    assert_eq!(found.nsems(), 2);
    let error = SemaphoreSet::get_or_create(key, 4, CreateFlags::empty(), PermissionMode::default())
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidArgument);

    set.remove().unwrap();
    let error = SemaphoreSet::get_or_create(key, 1, CreateFlags::empty(), PermissionMode::default())
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::NotFound);
}

#[test]
fn guard_releases_on_drop() {
    let set = private_set(1, 1);

    {
        let guard = set.try_acquire(0).unwrap().expect("counter is free");
        assert_eq!(guard.index(), 0);
        assert_eq!(set.get_value(0).unwrap(), 0);
        assert!(set.try_acquire(0).unwrap().is_none());
    }
    assert_eq!(set.get_value(0).unwrap(), 1);

    let guard = set.acquire(0).unwrap();
    assert_eq!(set.get_value(0).unwrap(), 0);
    drop(guard);
    assert_eq!(set.get_value(0).unwrap(), 1);

    set.remove().unwrap();
}

#[test]
fn large_set_is_initialized() {
    // More counters than one `semop` call accepts (SEMOPM), below the
    // per-set limit (SEMMSL) of each platform.
    let count = if cfg!(target_os = "linux") { 1000 } else { 200 };
    let set = private_set(count, 4);
    assert_eq!(set.nsems(), count);
    assert!(set.get_all().unwrap().iter().all(|&value| value == 4));
    assert_ne!(set.stat().unwrap().otime, 0);

    set.remove().unwrap();
}

/// Makes SIGUSR1 interrupt blocking calls instead of killing the process.
fn catch_sigusr1() {
    extern "C" fn ignore(_: c_int) {}

    let action = SigAction::new(
        SigHandler::Handler(ignore),
        SaFlags::empty(),
        SigSet::empty(),
    );
    // SAFETY: the handler does nothing, so it is async-signal-safe.
    unsafe { sigaction(Signal::SIGUSR1, &action) }.unwrap();
}

/// Blocks a thread on counter 0 of `set` and sends it SIGUSR1 while it waits.
fn interrupt_waiter(set: &SemaphoreSet, retry: bool) -> JoinHandle<sysv_sem::Result<bool>> {
    let semid = set.id();
    let waiter = thread::spawn(move || {
        let mut alias = SemaphoreSet::from_id(semid)?;
        alias.set_retry_interrupted(retry);
        alias.decrement(0, SemFlags::UNDO)
    });
    wait_until(|| set.get_ncnt(0).unwrap() == 1);
    pthread_kill(waiter.as_pthread_t(), Signal::SIGUSR1).unwrap();
    waiter
}

#[test]
fn interrupted_wait_fails_without_retry() {
    catch_sigusr1();
    let set = private_set(1, 0);

    let waiter = interrupt_waiter(&set, false);
    let error = waiter.join().unwrap().unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Interrupted);
    assert_eq!(set.get_ncnt(0).unwrap(), 0);
    assert_eq!(set.get_value(0).unwrap(), 0);

    set.remove().unwrap();
}

#[test]
fn interrupted_wait_restarts_with_retry() {
    init_logger();
    catch_sigusr1();
    let set = SemOptions::new()
        .initial_value(0)
        .retry_interrupted(true)
        .open(Key::PRIVATE)
        .unwrap();
    assert!(set.retry_interrupted());

    let waiter = interrupt_waiter(&set, true);
    thread::sleep(Duration::from_millis(50));
    wait_until(|| set.get_ncnt(0).unwrap() == 1);
    assert!(!waiter.is_finished());

    assert!(set.increment(0, SemFlags::UNDO).unwrap());
    assert!(waiter.join().unwrap().unwrap());
    assert_eq!(set.get_value(0).unwrap(), 0);

    set.remove().unwrap();
}
