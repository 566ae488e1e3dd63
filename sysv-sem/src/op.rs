// SPDX-License-Identifier: MPL-2.0

use crate::{flags::SemFlags, sys::SemBuf};

/// One requested change to a counter.
///
/// A positive `delta` adds to the counter and never blocks. A negative one
/// subtracts and blocks while the counter is smaller than `|delta|`. A zero
/// `delta` waits until the counter is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemOp {
    index: u16,
    delta: i16,
    flags: SemFlags,
}

impl SemOp {
    pub const fn new(index: u16, delta: i16, flags: SemFlags) -> Self {
        Self {
            index,
            delta,
            flags,
        }
    }

    /// Takes one unit from the counter at `index` ("P").
    pub const fn decrement(index: u16, flags: SemFlags) -> Self {
        Self::new(index, -1, flags)
    }

    /// Gives one unit back to the counter at `index` ("V").
    pub const fn increment(index: u16, flags: SemFlags) -> Self {
        Self::new(index, 1, flags)
    }

    /// Waits until the counter at `index` is zero.
    pub const fn wait_zero(index: u16, flags: SemFlags) -> Self {
        Self::new(index, 0, flags)
    }

    pub const fn index(&self) -> u16 {
        self.index
    }

    pub const fn delta(&self) -> i16 {
        self.delta
    }

    pub const fn flags(&self) -> SemFlags {
        self.flags
    }

    pub(crate) fn to_sem_buf(self) -> SemBuf {
        SemBuf {
            sem_num: self.index,
            sem_op: self.delta,
            sem_flg: self.flags.bits(),
        }
    }
}
