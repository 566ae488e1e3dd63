// SPDX-License-Identifier: MPL-2.0

use crate::{flags::SemFlags, prelude::*, sem_set::SemaphoreSet};

/// One unit of a counter, held until the guard is dropped.
///
/// Both the acquisition and the release are tagged with `SEM_UNDO`, so a
/// process that dies while holding the guard gives the unit back as well.
#[must_use = "the unit is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct SemGuard<'a> {
    set: &'a SemaphoreSet,
    index: u16,
}

impl<'a> SemGuard<'a> {
    pub(crate) fn new(set: &'a SemaphoreSet, index: u16) -> Self {
        Self { set, index }
    }

    pub fn index(&self) -> u16 {
        self.index
    }
}

impl Drop for SemGuard<'_> {
    fn drop(&mut self) {
        if let Err(error) = self.set.increment(self.index, SemFlags::UNDO) {
            error!(
                "failed to release counter {} of semaphore set {}: {}",
                self.index,
                self.set.id(),
                error
            );
        }
    }
}
