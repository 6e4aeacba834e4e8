/*
 *  throttle.rs
 *
 *  wupws - backyard weather, worth the wait
 *	(c) 2020-26 Stuart Hunter
 *
 *	TODO:
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */
use std::time::{Duration, Instant};

/// Cooperative minimum-interval gate for the update cycle. A call arriving
/// before the deadline is a no-op for the caller: it keeps the cached
/// snapshot rather than queueing another fetch.
pub struct Throttle {
    next_deadline: Option<Instant>,
    interval: Duration,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self { next_deadline: None, interval }
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns true if a fetch should run now; if true, it also schedules the
    /// next deadline. The deadline advances whether or not the fetch that
    /// follows succeeds - failed cycles are retried on the next tick, never
    /// inside the window.
    #[inline]
    pub fn should_run(&mut self) -> bool {
        let now = Instant::now();
        match self.next_deadline {
            Some(deadline) if now < deadline => false,
            _ => {
                self.next_deadline = Some(now + self.interval);
                true
            }
        }
    }

    /// Forget the last deadline so the next call runs regardless of elapsed
    /// time. Used when the station configuration changes under us.
    #[allow(dead_code)]
    #[inline]
    pub fn reset(&mut self) {
        self.next_deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_call_runs() {
        let mut t = Throttle::new(Duration::from_secs(300));
        assert!(t.should_run());
    }

    #[test]
    fn test_second_call_within_interval_skips() {
        let mut t = Throttle::new(Duration::from_secs(300));
        assert!(t.should_run());
        assert!(!t.should_run());
        assert!(!t.should_run());
    }

    #[test]
    fn test_runs_again_after_interval() {
        let mut t = Throttle::new(Duration::from_millis(5));
        assert!(t.should_run());
        assert!(!t.should_run());
        std::thread::sleep(Duration::from_millis(10));
        assert!(t.should_run());
        assert!(!t.should_run());
    }

    #[test]
    fn test_reset_reopens_window() {
        let mut t = Throttle::new(Duration::from_secs(300));
        assert!(t.should_run());
        assert!(!t.should_run());
        t.reset();
        assert!(t.should_run());
    }
}
