pub mod clock;
pub mod session;
pub mod source;
pub mod trigger;

use std::thread;
use std::time::{Duration, Instant};

use crate::config::{CaptureConfig, CountDirection};
use crate::error::Error;

use clock::SampleClock;
use session::{CaptureProgress, CaptureSession, CompletedCapture, SampleRecord, TickOutcome};
use source::AnalogSource;
use trigger::{PeriodicTrigger, TickHandler, TriggerOptions, TriggerStats};

/// The trigger thread's half of a capture: the session plus the two
/// collaborators it samples on every tick.
pub struct CaptureTask<S, C> {
    session: CaptureSession,
    source: S,
    clock: C,
}

impl<S: AnalogSource, C: SampleClock> CaptureTask<S, C> {
    pub fn new(session: CaptureSession, source: S, clock: C) -> Self {
        Self {
            session,
            source,
            clock,
        }
    }

    pub fn into_session(self) -> CaptureSession {
        self.session
    }
}

impl<S: AnalogSource, C: SampleClock> TickHandler for CaptureTask<S, C> {
    fn on_tick(&mut self) {
        let value = self.source.read_sample();
        let timestamp = self.clock.now();
        match self.session.append(SampleRecord { value, timestamp }) {
            TickOutcome::Appended(index) => {
                log::trace!(target: "adcjitter::trigger", "#{}: {} @ {}", index, value, timestamp);
            }
            TickOutcome::Completed => {
                log::debug!(
                    target: "adcjitter::trigger",
                    "buffer full: {}/{}",
                    self.session.count(),
                    self.session.capacity(),
                );
            }
            TickOutcome::Ignored => {}
        }
    }
}

/// A finished capture, the counter its timestamps came from and how the
/// trigger behaved while producing it.
pub struct Acquisition {
    pub capture: CompletedCapture,
    pub direction: CountDirection,
    pub tick_hz: u64,
    pub trigger_stats: TriggerStats,
}

/// Run one capture session to completion.
pub fn run<S, C>(config: &CaptureConfig, source: S, clock: C) -> Result<Acquisition, Error>
where
    S: AnalogSource + Send + 'static,
    C: SampleClock + Send + 'static,
{
    let mut session = CaptureSession::new(config.samples)?;
    let progress = session.progress();
    session.start();

    let direction = clock.direction();
    let tick_hz = clock.tick_hz();
    log::info!(
        "sampling {} at {}Hz: {} samples, {}-counting clock at {}Hz",
        source.describe(),
        config.rate_hz,
        config.samples,
        direction.as_str(),
        tick_hz,
    );

    let options = TriggerOptions {
        realtime: config.realtime,
        spin_margin: Duration::from_micros(config.spin_margin_us),
    };
    let start = Instant::now();
    let trigger = PeriodicTrigger::start(
        config.rate_hz,
        options,
        CaptureTask::new(session, source, clock),
    )?;

    let waited = wait_for_completion(
        &progress,
        Duration::from_millis(config.poll_interval_ms),
        || trigger.is_running(),
    );
    let elapsed = start.elapsed();

    // Stop even when the wait failed so the thread is joined either way.
    let (task, trigger_stats) = trigger.stop()?;
    waited?;

    if trigger_stats.overruns > 0 {
        log::warn!(
            "trigger missed {} period(s); timing stats include the gaps",
            trigger_stats.overruns
        );
    }
    log::info!(
        "capture complete: {} samples in {:.2}s",
        progress.count(),
        elapsed.as_secs_f64()
    );

    let capture = task.into_session().into_completed()?;
    Ok(Acquisition {
        capture,
        direction,
        tick_hz,
        trigger_stats,
    })
}

/// Idle until the cursor reaches capacity, logging every tenth of the way.
///
/// Gives up if `writer_alive` reports the writer has gone away first.
fn wait_for_completion(
    progress: &CaptureProgress,
    poll: Duration,
    writer_alive: impl Fn() -> bool,
) -> Result<(), Error> {
    let step = (progress.capacity() / 10).max(1);
    let mut next_report = step;

    while !progress.is_complete() {
        if !writer_alive() {
            return Err(Error::Capture(format!(
                "trigger stopped after {}/{} samples",
                progress.count(),
                progress.capacity()
            )));
        }
        thread::sleep(poll);

        let count = progress.count();
        if count >= next_report && count < progress.capacity() {
            log::debug!("captured {}/{}", count, progress.capacity());
            next_report = (count / step + 1) * step;
        }
    }
    Ok(())
}
