// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

use crate::lock;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    Idle,
    Running,
    Done,
}

/// Outcome of [`OnceGate::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// This call ran the action and it succeeded.
    Ran,
    /// The action already completed, or another caller is running it.
    Skipped,
}

/// Device-wide one-shot action shared by both inputs.
///
/// The mutex is held only for the check-and-set. The caller that claims the
/// gate runs the action with no lock held. A successful action latches the
/// gate; a failed one releases it so the next trigger can retry.
#[derive(Debug)]
pub struct OnceGate {
    state: Mutex<GateState>,
}

impl Default for OnceGate {
    fn default() -> Self {
        OnceGate::new()
    }
}

impl OnceGate {
    pub const fn new() -> Self {
        OnceGate {
            state: Mutex::new(GateState::Idle),
        }
    }

    pub fn is_done(&self) -> bool {
        *lock(&self.state) == GateState::Done
    }

    /// Run `action` unless it has already run, or is running, elsewhere.
    pub fn run<E, F>(&self, action: F) -> Result<GateOutcome, E>
    where
        F: FnOnce() -> Result<(), E>,
    {
        {
            let mut state = lock(&self.state);
            if *state != GateState::Idle {
                return Ok(GateOutcome::Skipped);
            }
            *state = GateState::Running;
        }

        let result = action();

        let mut state = lock(&self.state);
        match result {
            Ok(()) => {
                *state = GateState::Done;
                Ok(GateOutcome::Ran)
            }
            Err(err) => {
                *state = GateState::Idle;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Barrier,
        },
        thread,
    };

    #[test]
    fn test_runs_once() {
        let gate = OnceGate::new();
        let mut count = 0;
        assert_eq!(
            gate.run(|| -> Result<(), ()> {
                count += 1;
                Ok(())
            }),
            Ok(GateOutcome::Ran)
        );
        assert_eq!(
            gate.run(|| -> Result<(), ()> {
                count += 1;
                Ok(())
            }),
            Ok(GateOutcome::Skipped)
        );
        assert_eq!(count, 1);
        assert!(gate.is_done());
    }

    #[test]
    fn test_failure_releases_gate() {
        let gate = OnceGate::new();
        assert_eq!(gate.run(|| Err(-5)), Err(-5));
        assert!(!gate.is_done());
        assert_eq!(gate.run(|| Ok::<(), i32>(())), Ok(GateOutcome::Ran));
        assert!(gate.is_done());
    }

    #[test]
    fn test_concurrent_callers() {
        let gate = Arc::new(OnceGate::new());
        let runs = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = gate.clone();
                let runs = runs.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    gate.run(|| {
                        runs.fetch_add(1, Ordering::SeqCst);
                        thread::yield_now();
                        Ok::<(), ()>(())
                    })
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
