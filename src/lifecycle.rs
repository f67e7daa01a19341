//! Device context lifecycle with in-flight relay tracking.
//!
//! A relay may only start while the context is `Active`. Teardown moves the
//! context to `Removing`, which rejects new relays, and then waits for the
//! relays already running to drain before marking it `Removed`.
//!
//! State and in-flight count share one `AtomicU32` so that "is it active"
//! and "count me in" happen in a single CAS.
//!
//! Layout: `[state(8 bits) | in_flight(24 bits)]`
//!
//! Waiting never blocks on a scheduler primitive. A relay may sit in a
//! firmware call for a long time, so every wait here polls and calls a
//! [`RelaxStrategy`] between polls. The default is a CPU spin hint;
//! platforms with a scheduler pass one that yields.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use spin::relax::{RelaxStrategy, Spin};

/// Lifecycle states of a device context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ContextState {
    /// Armed channels are relayed.
    Active = 0,
    /// Teardown started; new relays are rejected.
    Removing = 1,
    /// Teardown finished; no relay is running.
    Removed = 2,
}

impl ContextState {
    fn from_raw(raw: u32) -> Self {
        match raw {
            0 => ContextState::Active,
            1 => ContextState::Removing,
            _ => ContextState::Removed,
        }
    }
}

struct StateAndCount(AtomicU32);

impl StateAndCount {
    const STATE_SHIFT: u32 = 24;
    const COUNT_MASK: u32 = (1 << Self::STATE_SHIFT) - 1;

    const fn new() -> Self {
        Self(AtomicU32::new((ContextState::Active as u32) << Self::STATE_SHIFT))
    }

    #[inline]
    fn state(&self) -> ContextState {
        ContextState::from_raw(self.0.load(Ordering::Acquire) >> Self::STATE_SHIFT)
    }

    #[inline]
    fn count(&self) -> u32 {
        self.0.load(Ordering::Acquire) & Self::COUNT_MASK
    }

    /// Increments the count if, and only if, the state is `Active`.
    fn try_acquire(&self) -> Result<(), ContextState> {
        let mut current = self.0.load(Ordering::Acquire);
        loop {
            let state = ContextState::from_raw(current >> Self::STATE_SHIFT);
            if state != ContextState::Active {
                return Err(state);
            }
            if current & Self::COUNT_MASK == Self::COUNT_MASK {
                return Err(state);
            }
            match self.0.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(()),
                Err(actual) => current = actual,
            }
        }
    }

    #[inline]
    fn release(&self) -> u32 {
        (self.0.fetch_sub(1, Ordering::AcqRel) & Self::COUNT_MASK) - 1
    }

    /// Moves `Active` to `Removing`, keeping the count. Fails in any other state.
    fn begin_removal(&self) -> bool {
        let mut current = self.0.load(Ordering::Acquire);
        loop {
            if current >> Self::STATE_SHIFT != ContextState::Active as u32 {
                return false;
            }
            let next = ((ContextState::Removing as u32) << Self::STATE_SHIFT) | (current & Self::COUNT_MASK);
            match self.0.compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    fn set_removed(&self) {
        self.0
            .store((ContextState::Removed as u32) << Self::STATE_SHIFT, Ordering::Release);
    }
}

/// Poll-then-relax waiter used while draining relays.
///
/// Each waiter polls its condition, then relaxes for a short burst unless
/// a notification arrived in the meantime.
struct IdleWaiter {
    waiters: AtomicUsize,
    notified: AtomicBool,
}

impl IdleWaiter {
    const RELAX_BURST: usize = 100;

    const fn new() -> Self {
        Self {
            waiters: AtomicUsize::new(0),
            notified: AtomicBool::new(false),
        }
    }

    fn wait_until<R, F>(&self, mut condition: F)
    where
        R: RelaxStrategy,
        F: FnMut() -> bool,
    {
        if condition() {
            return;
        }

        self.waiters.fetch_add(1, Ordering::AcqRel);
        while !condition() {
            if self.notified.swap(false, Ordering::AcqRel) {
                continue;
            }
            for _ in 0..Self::RELAX_BURST {
                R::relax();
            }
        }
        self.waiters.fetch_sub(1, Ordering::AcqRel);
    }

    fn notify_all(&self) {
        if self.waiters.load(Ordering::Acquire) > 0 {
            self.notified.store(true, Ordering::Release);
        }
    }
}

/// Lifecycle of one device context.
///
/// ```text
/// ┌────────┐  begin_removal()  ┌──────────┐  wait_idle()  ┌─────────┐
/// │ Active │ ────────────────> │ Removing │ ────────────> │ Removed │
/// └────────┘                   └──────────┘               └─────────┘
/// ```
pub struct ContextLifecycle {
    state_count: StateAndCount,
    idle: IdleWaiter,
}

impl ContextLifecycle {
    pub const fn new() -> Self {
        Self {
            state_count: StateAndCount::new(),
            idle: IdleWaiter::new(),
        }
    }

    #[inline]
    pub fn state(&self) -> ContextState {
        self.state_count.state()
    }

    /// Number of relays currently running.
    #[inline]
    pub fn in_flight(&self) -> usize {
        self.state_count.count() as usize
    }

    /// Enters a relay. Returns `None` once teardown has started.
    pub fn try_enter(&self) -> Option<RelayGuard<'_>> {
        self.state_count
            .try_acquire()
            .ok()
            .map(|()| RelayGuard { lifecycle: self })
    }

    fn exit(&self) {
        if self.state_count.release() == 0 {
            self.idle.notify_all();
        }
    }

    /// Starts teardown. Returns `false` if it was already started.
    pub fn begin_removal(&self) -> bool {
        self.state_count.begin_removal()
    }

    /// Blocks until no relay is running, spinning between polls.
    pub fn wait_idle(&self) {
        self.wait_idle_with::<Spin>();
    }

    /// Blocks until no relay is running, calling `R::relax()` between polls.
    pub fn wait_idle_with<R: RelaxStrategy>(&self) {
        self.idle.wait_until::<R, _>(|| self.state_count.count() == 0);
    }

    /// Blocks until whoever started teardown has completed it.
    ///
    /// Returns at once if teardown has not started: only a caller that
    /// observed a failed [`ContextLifecycle::begin_removal`] should wait here.
    pub fn wait_removed_with<R: RelaxStrategy>(&self) {
        self.idle
            .wait_until::<R, _>(|| self.state() != ContextState::Removing);
    }

    /// Marks teardown finished. Call only after [`ContextLifecycle::wait_idle`].
    pub fn complete_removal(&self) {
        self.state_count.set_removed();
        self.idle.notify_all();
    }
}

impl Default for ContextLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for ContextLifecycle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ContextLifecycle")
            .field("state", &self.state())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

/// Marks one running relay; leaving scope ends it.
pub struct RelayGuard<'a> {
    lifecycle: &'a ContextLifecycle,
}

impl Drop for RelayGuard<'_> {
    fn drop(&mut self) {
        self.lifecycle.exit();
    }
}
