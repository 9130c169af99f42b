use crate::config::{ClockConfig, CountDirection};

/// Free-running timestamp counter. Never reset during a session.
pub trait SampleClock {
    fn now(&self) -> u32;
    fn direction(&self) -> CountDirection;
    fn tick_hz(&self) -> u64;
}

/// A 32-bit counter derived from CLOCK_MONOTONIC and scaled to `tick_hz`.
///
/// In `Down` mode it counts down from `reload`, like a periodic hardware
/// timer in down-count mode that is only ever read, never serviced.
pub struct MonotonicClock {
    origin_ns: u64,
    tick_hz: u64,
    direction: CountDirection,
    reload: u32,
}

impl MonotonicClock {
    pub fn new(config: &ClockConfig) -> Self {
        Self {
            origin_ns: clock_gettime_ns(),
            tick_hz: config.tick_hz,
            direction: config.direction,
            reload: config.reload,
        }
    }

    fn elapsed_ticks(&self) -> u32 {
        let elapsed_ns = clock_gettime_ns().wrapping_sub(self.origin_ns);
        let ticks = (elapsed_ns as u128 * self.tick_hz as u128) / 1_000_000_000;
        ticks as u32
    }
}

impl SampleClock for MonotonicClock {
    fn now(&self) -> u32 {
        let ticks = self.elapsed_ticks();
        match self.direction {
            CountDirection::Up => ticks,
            CountDirection::Down => self.reload.wrapping_sub(ticks),
        }
    }

    fn direction(&self) -> CountDirection {
        self.direction
    }

    fn tick_hz(&self) -> u64 {
        self.tick_hz
    }
}

fn clock_gettime_ns() -> u64 {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    unsafe {
        libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts);
    }
    (ts.tv_sec as u64)
        .wrapping_mul(1_000_000_000)
        .wrapping_add(ts.tv_nsec as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    fn clock(direction: CountDirection) -> MonotonicClock {
        MonotonicClock::new(&ClockConfig {
            tick_hz: 1_000_000,
            direction,
            reload: 0xFFFF_FFFE,
        })
    }

    #[test]
    fn test_up_counter_advances() {
        let c = clock(CountDirection::Up);
        let a = c.now();
        thread::sleep(Duration::from_millis(5));
        let b = c.now();
        // 5ms at 1 MHz is 5000 ticks
        assert!(b.wrapping_sub(a) >= 5000, "advanced only {} ticks", b.wrapping_sub(a));
    }

    #[test]
    fn test_down_counter_decreases_from_reload() {
        let c = clock(CountDirection::Down);
        let a = c.now();
        assert!(a <= 0xFFFF_FFFE);
        thread::sleep(Duration::from_millis(5));
        let b = c.now();
        assert!(a.wrapping_sub(b) >= 5000);
    }

    #[test]
    fn test_reports_configuration() {
        let c = clock(CountDirection::Down);
        assert_eq!(c.direction(), CountDirection::Down);
        assert_eq!(c.tick_hz(), 1_000_000);
    }
}
