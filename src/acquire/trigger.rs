use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::Error;

/// Receives one event per trigger period.
pub trait TickHandler {
    fn on_tick(&mut self);
}

#[derive(Debug, Clone, Copy)]
pub struct TriggerOptions {
    pub realtime: bool,
    pub spin_margin: Duration,
}

impl Default for TriggerOptions {
    fn default() -> Self {
        Self {
            realtime: false,
            spin_margin: Duration::from_micros(200),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriggerStats {
    pub ticks: u64,
    /// Periods skipped because the handler ran past the next deadline.
    pub overruns: u64,
}

/// Fixed-rate tick source running on its own thread.
///
/// The thread owns the handler until `stop` hands it back, so nothing else
/// can touch the handler's state while ticks are being delivered.
pub struct PeriodicTrigger<H> {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<(H, TriggerStats)>,
}

impl<H: TickHandler + Send + 'static> PeriodicTrigger<H> {
    pub fn start(rate_hz: u32, options: TriggerOptions, handler: H) -> Result<Self, Error> {
        if rate_hz == 0 {
            return Err(Error::InvalidArgs("trigger rate must be greater than 0".into()));
        }
        let period = Duration::from_nanos(1_000_000_000 / rate_hz as u64);
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("adcjitter-trigger".into())
            .spawn(move || {
                if options.realtime {
                    request_realtime_priority();
                }
                tick_loop(handler, period, options.spin_margin, &thread_stop)
            })?;

        log::debug!(
            target: "adcjitter::trigger",
            "started: {}Hz (period {:?}), realtime={}",
            rate_hz, period, options.realtime,
        );

        Ok(Self { stop, handle })
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop ticking and take the handler back.
    pub fn stop(self) -> Result<(H, TriggerStats), Error> {
        self.stop.store(true, Ordering::Release);
        let (handler, stats) = self
            .handle
            .join()
            .map_err(|_| Error::Capture("trigger thread panicked".into()))?;
        log::debug!(
            target: "adcjitter::trigger",
            "stopped after {} ticks ({} overruns)",
            stats.ticks, stats.overruns,
        );
        Ok((handler, stats))
    }
}

fn tick_loop<H: TickHandler>(
    mut handler: H,
    period: Duration,
    spin_margin: Duration,
    stop: &AtomicBool,
) -> (H, TriggerStats) {
    let mut stats = TriggerStats::default();
    let mut deadline = Instant::now() + period;

    while !stop.load(Ordering::Acquire) {
        wait_until(deadline, spin_margin);
        if stop.load(Ordering::Acquire) {
            break;
        }

        handler.on_tick();
        stats.ticks += 1;
        deadline += period;

        // A hardware timer keeps its phase; periods that pass while the
        // handler is still running are lost, not queued.
        let now = Instant::now();
        if now >= deadline {
            let behind = now.duration_since(deadline).as_nanos() / period.as_nanos();
            let missed = behind as u32 + 1;
            stats.overruns += missed as u64;
            deadline += period * missed;
        }
    }

    (handler, stats)
}

/// Sleep until shortly before `deadline`, then spin the rest of the way.
fn wait_until(deadline: Instant, spin_margin: Duration) {
    let now = Instant::now();
    if deadline <= now {
        return;
    }
    let remaining = deadline - now;
    if remaining > spin_margin {
        thread::sleep(remaining - spin_margin);
    }
    while Instant::now() < deadline {
        std::hint::spin_loop();
    }
}

fn request_realtime_priority() {
    let ret = unsafe {
        let mut param: libc::sched_param = std::mem::zeroed();
        param.sched_priority = libc::sched_get_priority_max(libc::SCHED_FIFO);
        libc::pthread_setschedparam(libc::pthread_self(), libc::SCHED_FIFO, &param)
    };
    if ret != 0 {
        log::warn!(
            target: "adcjitter::trigger",
            "SCHED_FIFO unavailable ({}); running with normal priority",
            std::io::Error::from_raw_os_error(ret),
        );
    } else {
        log::info!(target: "adcjitter::trigger", "running with SCHED_FIFO priority");
    }
}
