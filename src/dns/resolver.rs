//! Bounded-wait hostname resolution.
//!
//! Legacy callers expect `hostByName(name, result, timeout)` to block until
//! the address is known or the timeout elapses. The native resolver instead
//! completes through a callback, and the platform has a single control
//! thread. [`HostResolver`] bridges the two with an explicit state machine:
//!
//! ```text
//! Idle -> Pending -> Resolved
//!                 -> TimedOut
//! ```
//!
//! A lookup arms a one-shot deadline timer and registers a [`Completion`]
//! with the native resolver. Whichever of the two fires first decides the
//! outcome; the loser finds the request no longer `Pending` and is
//! discarded. The answer is copied into the caller's output only by the
//! resolver itself, after the request has settled, so a late native
//! callback can never write into memory the caller no longer owns.
//!
//! Only one request may be outstanding per resolver; a second one fails
//! with [`CompatError::Busy`] instead of queueing.

use std::fmt;
use std::net::IpAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, warn};

use crate::error::CompatError;
use crate::native::{DeadlineTimer, EventLoop, LookupStart, NameResolver};

/// State of the resolver's single request slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupPhase {
    Idle,
    Pending,
    Resolved,
    TimedOut,
}

#[derive(Debug)]
struct LookupSlot {
    /// Bumped for every request so stale callbacks cannot settle a newer one.
    generation: u64,
    phase: LookupPhase,
    /// Resolver answer; `None` with `Resolved` means the name does not exist.
    answer: Option<IpAddr>,
}

type SharedSlot = Arc<Mutex<LookupSlot>>;

fn lock(slot: &SharedSlot) -> MutexGuard<'_, LookupSlot> {
    // The slot is plain data, a panic elsewhere cannot leave it inconsistent
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Callback handle given to the native resolver.
pub struct Completion {
    slot: SharedSlot,
    generation: u64,
}

impl Completion {
    /// Deliver the resolver's answer (`None` if the name does not exist).
    ///
    /// Returns `false` if the request already timed out or was replaced, in
    /// which case the answer is discarded.
    pub fn complete(self, answer: Option<IpAddr>) -> bool {
        let mut slot = lock(&self.slot);
        if slot.generation != self.generation || slot.phase != LookupPhase::Pending {
            warn!(
                "Discarding late resolver answer {:?} (request {} is {:?})",
                answer, self.generation, slot.phase
            );
            return false;
        }
        slot.phase = LookupPhase::Resolved;
        slot.answer = answer;
        debug!("Lookup {} resolved: {:?}", self.generation, answer);
        true
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Completion({})", self.generation)
    }
}

/// Callback handle given to the deadline timer.
pub struct Expiry {
    slot: SharedSlot,
    generation: u64,
}

impl Expiry {
    /// Signal that the deadline elapsed.
    ///
    /// Returns `false` if the request had already settled.
    pub fn fire(self) -> bool {
        expire(&self.slot, self.generation)
    }
}

impl fmt::Debug for Expiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expiry({})", self.generation)
    }
}

fn expire(slot: &SharedSlot, generation: u64) -> bool {
    let mut slot = lock(slot);
    if slot.generation != generation || slot.phase != LookupPhase::Pending {
        return false;
    }
    slot.phase = LookupPhase::TimedOut;
    debug!("Lookup {} timed out", generation);
    true
}

#[derive(Debug)]
struct ActiveLookup {
    name: String,
    generation: u64,
    deadline_ms: u64,
}

/// Single-slot hostname resolver with a deadline.
#[derive(Debug)]
pub struct HostResolver {
    slot: SharedSlot,
    active: Option<ActiveLookup>,
    /// Split-API request cut short by [`abandon`](Self::abandon), reported
    /// as a timeout on the next [`poll`](Self::poll).
    abandoned: Option<String>,
}

impl Default for HostResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl HostResolver {
    /// Create an idle resolver.
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(LookupSlot {
                generation: 0,
                phase: LookupPhase::Idle,
                answer: None,
            })),
            active: None,
            abandoned: None,
        }
    }

    /// Current phase of the request slot.
    pub fn phase(&self) -> LookupPhase {
        lock(&self.slot).phase
    }

    /// Name of the outstanding request, if any.
    pub fn pending_name(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.name.as_str())
    }

    /// Start a lookup without waiting for it.
    ///
    /// Returns `Ok(Some(addr))` when the answer is available immediately (IP
    /// literal or native cache hit) and `Ok(None)` when the request is now
    /// `Pending`; drive it with [`poll`](Self::poll). A timeout still held
    /// for an abandoned request is dropped.
    pub fn start<N>(
        &mut self,
        native: &mut N,
        name: &str,
        timeout: Duration,
    ) -> Result<Option<IpAddr>, CompatError>
    where
        N: NameResolver + DeadlineTimer + EventLoop + ?Sized,
    {
        let started = self.submit(native, name, timeout)?;
        if let Some(stale) = self.abandoned.take() {
            debug!("Dropping uncollected timeout for '{}'", stale);
        }
        Ok(started)
    }

    fn submit<N>(
        &mut self,
        native: &mut N,
        name: &str,
        timeout: Duration,
    ) -> Result<Option<IpAddr>, CompatError>
    where
        N: NameResolver + DeadlineTimer + EventLoop + ?Sized,
    {
        let generation = {
            let mut slot = lock(&self.slot);
            if slot.phase != LookupPhase::Idle {
                return Err(CompatError::Busy);
            }
            if name.is_empty() {
                return Err(CompatError::InvalidHostname);
            }
            if let Ok(addr) = name.parse::<IpAddr>() {
                return Ok(Some(addr));
            }
            slot.generation += 1;
            slot.phase = LookupPhase::Pending;
            slot.answer = None;
            slot.generation
        };

        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        let deadline_ms = native.now_ms().saturating_add(timeout_ms);
        debug!(
            "Lookup {} for '{}' started, timeout {} ms",
            generation, name, timeout_ms
        );

        let expiry = Expiry {
            slot: self.slot.clone(),
            generation,
        };
        if let Err(e) = native.arm(timeout, expiry) {
            self.reset();
            return Err(e.into());
        }

        let completion = Completion {
            slot: self.slot.clone(),
            generation,
        };
        match native.start_lookup(name, completion) {
            Ok(LookupStart::Ready(addr)) => {
                native.cancel();
                self.reset();
                Ok(Some(addr))
            }
            Ok(LookupStart::InProgress) => {
                self.active = Some(ActiveLookup {
                    name: name.to_string(),
                    generation,
                    deadline_ms,
                });
                Ok(None)
            }
            Err(e) => {
                native.cancel();
                self.reset();
                Err(e.into())
            }
        }
    }

    /// Check the outstanding request.
    ///
    /// Returns `None` while it is still pending (or if nothing was started).
    /// Once it settles the outcome is returned exactly once and the resolver
    /// is `Idle` again. An abandoned request reports its timeout first.
    pub fn poll<N>(&mut self, native: &mut N) -> Option<Result<IpAddr, CompatError>>
    where
        N: NameResolver + DeadlineTimer + EventLoop + ?Sized,
    {
        if let Some(name) = self.abandoned.take() {
            debug!("Reporting abandoned lookup of '{}'", name);
            return Some(Err(CompatError::Timeout));
        }
        self.poll_active(native)
    }

    fn poll_active<N>(&mut self, native: &mut N) -> Option<Result<IpAddr, CompatError>>
    where
        N: NameResolver + DeadlineTimer + EventLoop + ?Sized,
    {
        let active = self.active.as_ref()?;

        // Covers platforms whose timer callback is delayed behind the poll loop
        if native.now_ms() >= active.deadline_ms {
            expire(&self.slot, active.generation);
        }

        let (phase, answer) = {
            let slot = lock(&self.slot);
            (slot.phase, slot.answer)
        };

        let outcome = match phase {
            LookupPhase::Idle | LookupPhase::Pending => return None,
            LookupPhase::Resolved => {
                native.cancel();
                answer.ok_or_else(|| CompatError::HostNotFound(active.name.clone()))
            }
            LookupPhase::TimedOut => {
                native.cancel();
                if !native.cancel_lookup(&active.name) {
                    debug!("Native resolver cannot cancel '{}'", active.name);
                }
                Err(CompatError::Timeout)
            }
        };

        self.reset();
        Some(outcome)
    }

    /// Force a pending request to time out and free the slot.
    ///
    /// The deadline timer and the native lookup are cancelled and the
    /// resolver is `Idle` straight away. The owner of the request sees
    /// [`CompatError::Timeout`] on its next [`poll`](Self::poll). Returns
    /// `true` if a request was pending.
    pub fn abandon<N>(&mut self, native: &mut N) -> bool
    where
        N: NameResolver + DeadlineTimer + EventLoop + ?Sized,
    {
        let Some(active) = &self.active else {
            return false;
        };
        if !expire(&self.slot, active.generation) {
            return false;
        }
        native.cancel();
        if !native.cancel_lookup(&active.name) {
            debug!("Native resolver cannot cancel '{}'", active.name);
        }
        self.abandoned = Some(active.name.clone());
        self.reset();
        true
    }

    /// Resolve `name`, yielding to the native dispatcher until the answer
    /// arrives or `timeout` elapses. `out` is written only on success.
    pub fn host_by_name<N>(
        &mut self,
        native: &mut N,
        name: &str,
        out: &mut IpAddr,
        timeout: Duration,
    ) -> Result<(), CompatError>
    where
        N: NameResolver + DeadlineTimer + EventLoop + ?Sized,
    {
        if let Some(addr) = self.submit(native, name, timeout)? {
            *out = addr;
            return Ok(());
        }

        loop {
            if let Some(outcome) = self.poll_active(native) {
                *out = outcome?;
                return Ok(());
            }
            native.poll();
        }
    }

    fn reset(&mut self) {
        let mut slot = lock(&self.slot);
        slot.phase = LookupPhase::Idle;
        slot.answer = None;
        self.active = None;
    }
}
