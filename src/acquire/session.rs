use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::Error;

/// One captured sample and the counter value read right after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRecord {
    pub value: u32,
    pub timestamp: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Collecting,
    Complete,
}

/// What a single append did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Appended(usize),
    Completed,
    Ignored,
}

/// Reader-side view of the write cursor.
///
/// The writer stores the new count with `Release` after the record is in
/// place, so every index below an `Acquire`-loaded count is fully written.
#[derive(Debug, Clone)]
pub struct CaptureProgress {
    cursor: Arc<AtomicUsize>,
    capacity: usize,
}

impl CaptureProgress {
    pub fn count(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_complete(&self) -> bool {
        self.count() == self.capacity
    }
}

/// A one-shot, bounded capture buffer with its write cursor and state.
#[derive(Debug)]
pub struct CaptureSession {
    records: Vec<SampleRecord>,
    capacity: usize,
    state: SessionState,
    cursor: Arc<AtomicUsize>,
}

impl CaptureSession {
    /// Allocates the whole buffer up front; appends never reallocate.
    pub fn new(capacity: usize) -> Result<Self, Error> {
        if capacity < 2 {
            return Err(Error::InvalidArgs(format!(
                "capture needs at least 2 samples, got {}",
                capacity
            )));
        }
        Ok(Self {
            records: Vec::with_capacity(capacity),
            capacity,
            state: SessionState::Idle,
            cursor: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Arm the session. Only an idle session can start.
    pub fn start(&mut self) {
        if self.state == SessionState::Idle {
            self.state = SessionState::Collecting;
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_complete(&self) -> bool {
        self.state == SessionState::Complete
    }

    pub fn progress(&self) -> CaptureProgress {
        CaptureProgress {
            cursor: Arc::clone(&self.cursor),
            capacity: self.capacity,
        }
    }

    /// Append one record. A call outside `Collecting` is a silent no-op.
    pub fn append(&mut self, record: SampleRecord) -> TickOutcome {
        if self.state != SessionState::Collecting || self.records.len() >= self.capacity {
            return TickOutcome::Ignored;
        }

        let index = self.records.len();
        self.records.push(record);
        self.cursor.store(self.records.len(), Ordering::Release);

        if self.records.len() == self.capacity {
            self.state = SessionState::Complete;
            TickOutcome::Completed
        } else {
            TickOutcome::Appended(index)
        }
    }

    /// Hand the full buffer over for read-only analysis.
    pub fn into_completed(self) -> Result<CompletedCapture, Error> {
        if !self.is_complete() {
            return Err(Error::Capture(format!(
                "capture incomplete ({:?}): {}/{} samples",
                self.state(),
                self.records.len(),
                self.capacity
            )));
        }
        Ok(CompletedCapture {
            records: self.records,
        })
    }
}

/// A full capture buffer. Holds at least two records.
#[derive(Debug, Clone)]
pub struct CompletedCapture {
    records: Vec<SampleRecord>,
}

impl CompletedCapture {
    /// Rebuild a completed capture from exported records.
    pub fn from_records(records: Vec<SampleRecord>) -> Result<Self, Error> {
        if records.len() < 2 {
            return Err(Error::InvalidArgs(format!(
                "capture needs at least 2 samples, got {}",
                records.len()
            )));
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[SampleRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn values(&self) -> impl Iterator<Item = u32> + '_ {
        self.records.iter().map(|r| r.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(value: u32, timestamp: u32) -> SampleRecord {
        SampleRecord { value, timestamp }
    }

    fn full_session(n: usize) -> CaptureSession {
        let mut s = CaptureSession::new(n).unwrap();
        s.start();
        for i in 0..n {
            s.append(rec(i as u32, 1000 - i as u32));
        }
        s
    }

    #[test]
    fn test_rejects_tiny_capacity() {
        assert!(CaptureSession::new(0).is_err());
        assert!(CaptureSession::new(1).is_err());
        assert!(CaptureSession::new(2).is_ok());
    }

    #[test]
    fn test_idle_ignores_appends() {
        let mut s = CaptureSession::new(4).unwrap();
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.append(rec(1, 1)), TickOutcome::Ignored);
        assert_eq!(s.count(), 0);
    }

    #[test]
    fn test_fills_then_completes() {
        let mut s = CaptureSession::new(3).unwrap();
        s.start();
        assert_eq!(s.state(), SessionState::Collecting);
        assert_eq!(s.append(rec(10, 300)), TickOutcome::Appended(0));
        assert_eq!(s.append(rec(11, 200)), TickOutcome::Appended(1));
        assert!(!s.is_complete());
        assert_eq!(s.append(rec(12, 100)), TickOutcome::Completed);
        assert!(s.is_complete());
        assert_eq!(s.state(), SessionState::Complete);
    }

    #[test]
    fn test_count_monotonic_and_bounded() {
        let mut s = CaptureSession::new(5).unwrap();
        s.start();
        let mut last = 0;
        for i in 0..20 {
            s.append(rec(i, i));
            assert!(s.count() >= last);
            assert!(s.count() <= 5);
            last = s.count();
        }
        assert_eq!(s.count(), 5);
    }

    #[test]
    fn test_extra_trigger_is_noop() {
        let mut s = full_session(5);
        let before: Vec<SampleRecord> = s.records.clone();
        assert_eq!(s.append(rec(999, 999)), TickOutcome::Ignored);
        assert_eq!(s.count(), 5);
        assert_eq!(s.records, before);
        assert_eq!(s.progress().count(), 5);
    }

    #[test]
    fn test_start_after_complete_does_not_reopen() {
        let mut s = full_session(2);
        s.start();
        assert_eq!(s.state(), SessionState::Complete);
    }

    #[test]
    fn test_progress_tracks_cursor() {
        let mut s = CaptureSession::new(3).unwrap();
        let progress = s.progress();
        s.start();
        assert_eq!(progress.count(), 0);
        assert_eq!(progress.capacity(), 3);
        s.append(rec(1, 1));
        assert_eq!(progress.count(), 1);
        assert!(!progress.is_complete());
        s.append(rec(2, 2));
        s.append(rec(3, 3));
        assert!(progress.is_complete());
    }

    #[test]
    fn test_into_completed_requires_full_buffer() {
        let mut s = CaptureSession::new(3).unwrap();
        s.start();
        s.append(rec(1, 1));
        let err = s.into_completed().unwrap_err();
        assert!(format!("{}", err).contains("1/3"));

        let done = full_session(3).into_completed().unwrap();
        assert_eq!(done.len(), 3);
        assert_eq!(done.values().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(done.records()[2].timestamp, 998);
    }

    #[test]
    fn test_from_records_needs_two() {
        assert!(CompletedCapture::from_records(vec![rec(1, 1)]).is_err());
        let c = CompletedCapture::from_records(vec![rec(1, 1), rec(2, 2)]).unwrap();
        assert_eq!(c.records()[1], rec(2, 2));
    }
}
