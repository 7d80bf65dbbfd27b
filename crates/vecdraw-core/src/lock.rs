//! Reader/writer lock guarding the shape document and the dynamic shapes.
//!
//! Acquisition waits on a condition variable for at most a timeout and then
//! gives up with [`LockError::Timeout`]; callers on the gesture path treat that
//! as "skip this step". Every released write (except [`LockIntent::Load`])
//! bumps a commit generation that observers poll with [`ShapeLock::take_changes`].

use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use thiserror::Error;

/// Default time to wait for a lock before giving up.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(200);

/// Why a lock is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockIntent {
    ReadOnly,
    Edit,
    Add,
    Remove,
    /// Bulk replace; exclusive like a write but does not count as a change.
    Load,
}

impl LockIntent {
    /// Bit reported in the change flags of [`ShapeLock::take_changes`].
    pub fn flag(self) -> u32 {
        match self {
            LockIntent::ReadOnly => 0,
            LockIntent::Edit => 1,
            LockIntent::Add => 2,
            LockIntent::Remove => 4,
            LockIntent::Load => 8,
        }
    }
}

/// Lock acquisition errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LockError {
    #[error("Timed out waiting for {intent:?} lock")]
    Timeout { intent: LockIntent },
    #[error("Lock poisoned")]
    Poisoned,
}

#[derive(Debug, Default)]
struct LockState {
    readers: usize,
    writer: bool,
    generation: u64,
    /// Generation last handed out by `take_changes`.
    reported: u64,
    /// Union of intent flags since the last `take_changes`.
    flags: u32,
}

/// A summary of writes committed since the previous poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitInfo {
    pub generation: u64,
    pub flags: u32,
}

/// Lock wrapping a value with intent-tagged, timed acquisition.
#[derive(Debug)]
pub struct ShapeLock<T> {
    state: Mutex<LockState>,
    cond: Condvar,
    data: RwLock<T>,
    timeout_ms: u64,
}

impl<T> ShapeLock<T> {
    pub fn new(value: T) -> Self {
        Self::with_timeout(value, DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_timeout(value: T, timeout: Duration) -> Self {
        Self {
            state: Mutex::new(LockState::default()),
            cond: Condvar::new(),
            data: RwLock::new(value),
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Acquire shared access, waiting up to the lock's timeout.
    pub fn read(&self) -> Result<ReadGuard<'_, T>, LockError> {
        self.read_timeout(self.timeout())
    }

    pub fn read_timeout(&self, timeout: Duration) -> Result<ReadGuard<'_, T>, LockError> {
        {
            let state = self.state.lock().map_err(|_| LockError::Poisoned)?;
            let (mut state, result) = self
                .cond
                .wait_timeout_while(state, timeout, |s| s.writer)
                .map_err(|_| LockError::Poisoned)?;
            if result.timed_out() && state.writer {
                log::debug!("Read lock timed out after {:?}", timeout);
                return Err(LockError::Timeout {
                    intent: LockIntent::ReadOnly,
                });
            }
            state.readers += 1;
        }
        match self.data.read() {
            Ok(guard) => Ok(ReadGuard { guard, lock: self }),
            Err(_) => {
                self.release_read();
                Err(LockError::Poisoned)
            }
        }
    }

    /// Acquire exclusive access for `intent`, waiting up to the lock's timeout.
    pub fn write(&self, intent: LockIntent) -> Result<WriteGuard<'_, T>, LockError> {
        self.write_timeout(intent, self.timeout())
    }

    pub fn write_timeout(
        &self,
        intent: LockIntent,
        timeout: Duration,
    ) -> Result<WriteGuard<'_, T>, LockError> {
        {
            let state = self.state.lock().map_err(|_| LockError::Poisoned)?;
            let (mut state, result) = self
                .cond
                .wait_timeout_while(state, timeout, |s| s.writer || s.readers > 0)
                .map_err(|_| LockError::Poisoned)?;
            if result.timed_out() && (state.writer || state.readers > 0) {
                log::debug!("{:?} lock timed out after {:?}", intent, timeout);
                return Err(LockError::Timeout { intent });
            }
            state.writer = true;
        }
        match self.data.write() {
            Ok(guard) => Ok(WriteGuard {
                guard,
                lock: self,
                intent,
                changed: true,
            }),
            Err(_) => {
                self.release_write(intent, false);
                Err(LockError::Poisoned)
            }
        }
    }

    /// Current commit generation.
    pub fn generation(&self) -> u64 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
    }

    /// Return the writes committed since the previous call, if any.
    pub fn take_changes(&self) -> Option<CommitInfo> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.generation == state.reported {
            return None;
        }
        state.reported = state.generation;
        let flags = std::mem::take(&mut state.flags);
        Some(CommitInfo {
            generation: state.generation,
            flags,
        })
    }

    /// Check whether any holder is active.
    pub fn is_locked(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.writer || state.readers > 0
    }

    fn release_read(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.readers = state.readers.saturating_sub(1);
        if state.readers == 0 {
            self.cond.notify_all();
        }
    }

    fn release_write(&self, intent: LockIntent, changed: bool) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.writer = false;
        if changed && intent != LockIntent::Load {
            state.generation += 1;
            state.flags |= intent.flag();
        }
        self.cond.notify_all();
    }
}

impl<T: Clone> ShapeLock<T> {
    /// Clone the protected value under a read lock.
    pub fn snapshot(&self) -> Result<T, LockError> {
        Ok(T::clone(&*self.read()?))
    }
}

/// Shared access token; released on drop.
pub struct ReadGuard<'a, T> {
    guard: RwLockReadGuard<'a, T>,
    lock: &'a ShapeLock<T>,
}

impl<T> Deref for ReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> Drop for ReadGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.release_read();
    }
}

/// Exclusive access token; released on drop, counting as a commit unless discarded.
pub struct WriteGuard<'a, T> {
    guard: RwLockWriteGuard<'a, T>,
    lock: &'a ShapeLock<T>,
    intent: LockIntent,
    changed: bool,
}

impl<T> WriteGuard<'_, T> {
    pub fn intent(&self) -> LockIntent {
        self.intent
    }

    /// Release without counting a change.
    pub fn discard(mut self) {
        self.changed = false;
    }
}

impl<T> Deref for WriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for WriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T> Drop for WriteGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.release_write(self.intent, self.changed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_readers_share() {
        let lock = ShapeLock::new(5);
        let a = lock.read().unwrap();
        let b = lock.read().unwrap();
        assert_eq!(*a + *b, 10);
    }

    #[test]
    fn test_writer_excludes_reader() {
        let lock = ShapeLock::new(0);
        let _w = lock.write(LockIntent::Edit).unwrap();
        let err = lock.read_timeout(Duration::from_millis(10)).err();
        assert_eq!(
            err,
            Some(LockError::Timeout {
                intent: LockIntent::ReadOnly
            })
        );
    }

    #[test]
    fn test_reader_blocks_writer_until_timeout() {
        let lock = ShapeLock::new(0);
        let _r = lock.read().unwrap();
        let err = lock.write_timeout(LockIntent::Add, Duration::from_millis(10)).err();
        assert_eq!(
            err,
            Some(LockError::Timeout {
                intent: LockIntent::Add
            })
        );
    }

    #[test]
    fn test_generation_counts_writes() {
        let lock = ShapeLock::new(Vec::<u32>::new());
        assert_eq!(lock.generation(), 0);
        lock.write(LockIntent::Add).unwrap().push(1);
        lock.write(LockIntent::Remove).unwrap().clear();
        assert_eq!(lock.generation(), 2);

        let info = lock.take_changes().unwrap();
        assert_eq!(info.generation, 2);
        assert_eq!(info.flags, LockIntent::Add.flag() | LockIntent::Remove.flag());
        assert!(lock.take_changes().is_none());
    }

    #[test]
    fn test_load_and_discard_do_not_count() {
        let lock = ShapeLock::new(0);
        *lock.write(LockIntent::Load).unwrap() = 7;
        lock.write(LockIntent::Edit).unwrap().discard();
        assert_eq!(lock.generation(), 0);
        assert_eq!(*lock.read().unwrap(), 7);
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_waiting_writer_proceeds_after_release() {
        let lock = Arc::new(ShapeLock::new(0));
        let guard = lock.write(LockIntent::Edit).unwrap();
        let other = Arc::clone(&lock);
        let handle = thread::spawn(move || {
            let mut w = other.write_timeout(LockIntent::Edit, Duration::from_secs(5)).unwrap();
            *w += 1;
        });
        thread::sleep(Duration::from_millis(20));
        drop(guard);
        handle.join().unwrap();
        assert_eq!(*lock.read().unwrap(), 1);
        assert_eq!(lock.generation(), 2);
    }

    #[test]
    fn test_snapshot_clones_and_releases() {
        let lock = ShapeLock::new(vec![1, 2]);
        lock.write(LockIntent::Add).unwrap().push(3);
        let copy = lock.snapshot().unwrap();
        assert_eq!(copy, vec![1, 2, 3]);
        assert!(!lock.is_locked());
        assert!(lock.write_timeout(LockIntent::Edit, Duration::ZERO).is_ok());
    }
}
