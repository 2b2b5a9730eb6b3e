//! Start gate shared by the coordinator and its workers.
//!
//! The coordinator closes the gate by taking the exclusive side of a
//! reader/writer lock. Each worker signals arrival and then blocks on the
//! shared side. Releasing the exclusive hold lets every waiting worker through
//! at once.
//!
//! Arrival is signalled through a [`Ticket`]. A ticket that is dropped without
//! [`Ticket::arrive`] having been called (connect failure, panic) still counts
//! as arrived, so the coordinator never waits on a worker that will not come.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

pub struct StartGate {
    lock: RwLock<()>,
    arrived: AtomicUsize,
    workers: Vec<AtomicBool>,
    aborted: AtomicBool,
}

impl StartGate {
    /// Create a gate for `workers` participants.
    pub fn new(workers: usize) -> Self {
        Self {
            lock: RwLock::new(()),
            arrived: AtomicUsize::new(0),
            workers: (0..workers).map(|_| AtomicBool::new(false)).collect(),
            aborted: AtomicBool::new(false),
        }
    }

    /// Close the gate. Workers block in [`Ticket::arrive`] until the returned
    /// guard is dropped.
    pub fn close(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write()
    }

    /// Ticket for worker `index`.
    pub fn ticket(&self, index: usize) -> Ticket<'_> {
        Ticket {
            gate: self,
            index,
            arrived: false,
        }
    }

    /// Number of participants.
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    pub fn arrived(&self) -> usize {
        self.arrived.load(Ordering::Acquire)
    }

    /// Indices of workers that have not signalled arrival.
    pub fn missing(&self) -> Vec<usize> {
        self.workers
            .iter()
            .enumerate()
            .filter(|(_, arrived)| !arrived.load(Ordering::Acquire))
            .map(|(index, _)| index)
            .collect()
    }

    /// Poll until every worker has arrived.
    ///
    /// With a `timeout`, gives up once it elapses and returns the indices of
    /// the workers still missing.
    pub fn wait_for_arrivals(
        &self,
        poll_interval: Duration,
        timeout: Option<Duration>,
    ) -> Result<(), Vec<usize>> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        loop {
            if self.arrived() >= self.size() {
                return Ok(());
            }
            let sleep = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(self.missing());
                    }
                    poll_interval.min(deadline - now)
                }
                None => poll_interval,
            };
            thread::sleep(sleep);
        }
    }

    /// Mark the run as aborted. Workers passing the gate afterwards skip their
    /// timed loop.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::Release);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    fn mark_arrived(&self, index: usize) {
        let first = self
            .workers
            .get(index)
            .map_or(false, |flag| !flag.swap(true, Ordering::AcqRel));
        if first {
            self.arrived.fetch_add(1, Ordering::AcqRel);
        }
    }
}

/// One worker's pass through the gate.
pub struct Ticket<'a> {
    gate: &'a StartGate,
    index: usize,
    arrived: bool,
}

impl<'a> Ticket<'a> {
    /// Signal arrival and wait for the gate to open.
    ///
    /// Returns the shared hold to keep for the duration of the timed loop, or
    /// `None` if the run was aborted.
    pub fn arrive(&mut self) -> Option<RwLockReadGuard<'a, ()>> {
        self.gate.mark_arrived(self.index);
        self.arrived = true;
        if self.gate.is_aborted() {
            return None;
        }
        let hold = self.gate.lock.read();
        if self.gate.is_aborted() {
            return None;
        }
        Some(hold)
    }
}

impl Drop for Ticket<'_> {
    fn drop(&mut self) {
        if !self.arrived {
            self.gate.mark_arrived(self.index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_workers_block_until_release() {
        let gate = Arc::new(StartGate::new(3));
        let passed = Arc::new(AtomicUsize::new(0));
        let hold = gate.close();

        let handles: Vec<_> = (0..3)
            .map(|i| {
                let gate = Arc::clone(&gate);
                let passed = Arc::clone(&passed);
                thread::spawn(move || {
                    let mut ticket = gate.ticket(i);
                    if ticket.arrive().is_some() {
                        passed.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        gate.wait_for_arrivals(Duration::from_millis(5), None).unwrap();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(passed.load(Ordering::SeqCst), 0);

        drop(hold);
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(passed.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_dropped_ticket_counts_as_arrived() {
        let gate = StartGate::new(2);
        drop(gate.ticket(0));
        drop(gate.ticket(0));
        assert_eq!(gate.arrived(), 1);
        assert_eq!(gate.missing(), vec![1]);
    }

    #[test]
    fn test_wait_times_out_with_missing_workers() {
        let gate = StartGate::new(3);
        drop(gate.ticket(1));

        let missing = gate
            .wait_for_arrivals(Duration::from_millis(5), Some(Duration::from_millis(30)))
            .unwrap_err();
        assert_eq!(missing, vec![0, 2]);
    }

    #[test]
    fn test_aborted_gate_skips_loop() {
        let gate = StartGate::new(1);
        gate.abort();
        let mut ticket = gate.ticket(0);
        assert!(ticket.arrive().is_none());
        assert_eq!(gate.arrived(), 1);
    }
}
