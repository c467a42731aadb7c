//! Cooperative timer scheduler.
//!
//! The whole race runs on one logical timeline measured in server ticks.
//! Every periodic activity (the session countdown, the possession poll) and
//! every one-shot activity (trail decay, the delayed victory reward) is a
//! timer registered here. Timers carry a plain task value rather than a
//! closure; the owner pops due tasks and dispatches them itself, so each
//! handler runs to completion with full mutable access before the next one
//! is popped.
//!
//! # Ordering
//!
//! Due timers are popped in `(due tick, registration order)` order. A
//! repeating timer is re-armed *before* its task is handed out, so a handler
//! may cancel its own timer and the cancellation sticks. Cancelling a timer
//! that is due in the same tick but not yet popped prevents it from firing.

use std::collections::BTreeMap;

use relic_types::TimerId;

/// A timer that came due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<T> {
    /// The timer that fired.
    pub id: TimerId,
    /// Tick the timer was due at.
    pub due: u64,
    /// The task carried by the timer.
    pub task: T,
}

#[derive(Debug, Clone)]
struct Timer<T> {
    task: T,
    period: Option<u64>,
    key: (u64, u64),
}

/// Owner of every timer on the timeline.
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    now: u64,
    next_id: u64,
    next_seq: u64,
    queue: BTreeMap<(u64, u64), TimerId>,
    timers: BTreeMap<TimerId, Timer<T>>,
}

impl<T: Clone> Scheduler<T> {
    /// Create an empty scheduler at tick 0.
    pub const fn new() -> Self {
        Self {
            now: 0,
            next_id: 0,
            next_seq: 0,
            queue: BTreeMap::new(),
            timers: BTreeMap::new(),
        }
    }

    /// Current server tick.
    pub const fn now(&self) -> u64 {
        self.now
    }

    /// Move the timeline one tick forward. Returns the new tick.
    pub const fn advance(&mut self) -> u64 {
        self.now = self.now.saturating_add(1);
        self.now
    }

    /// Run `task` once, `delay` ticks from now. A delay of zero runs on the
    /// next tick.
    pub fn schedule_once(&mut self, delay: u64, task: T) -> TimerId {
        self.insert(delay, None, task)
    }

    /// Run `task` every `period` ticks, the first time `delay` ticks from
    /// now. A delay of zero runs on the next tick; a period of zero is
    /// treated as one.
    pub fn schedule_repeating(&mut self, delay: u64, period: u64, task: T) -> TimerId {
        self.insert(delay, Some(period.max(1)), task)
    }

    /// Cancel a timer. Returns whether it was still scheduled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let Some(timer) = self.timers.remove(&id) else {
            return false;
        };
        self.queue.remove(&timer.key);
        true
    }

    /// Whether the timer is still scheduled.
    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }

    /// Tick at which the timer fires next.
    pub fn due_at(&self, id: TimerId) -> Option<u64> {
        self.timers.get(&id).map(|t| t.key.0)
    }

    /// Number of scheduled timers.
    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    /// Pop the next timer due at or before the current tick.
    pub fn pop_due(&mut self) -> Option<Fired<T>> {
        loop {
            let (&key, &id) = self.queue.first_key_value()?;
            if key.0 > self.now {
                return None;
            }
            self.queue.remove(&key);

            let next_seq = self.next_seq;
            let Some(timer) = self.timers.get_mut(&id) else {
                continue;
            };
            if let Some(period) = timer.period {
                let next_key = (key.0.saturating_add(period), next_seq);
                timer.key = next_key;
                let task = timer.task.clone();
                self.next_seq = self.next_seq.saturating_add(1);
                self.queue.insert(next_key, id);
                return Some(Fired {
                    id,
                    due: key.0,
                    task,
                });
            }
            let timer = self.timers.remove(&id)?;
            return Some(Fired {
                id,
                due: key.0,
                task: timer.task,
            });
        }
    }

    fn insert(&mut self, delay: u64, period: Option<u64>, task: T) -> TimerId {
        self.next_id = self.next_id.saturating_add(1);
        let id = TimerId(self.next_id);
        let key = (self.now.saturating_add(delay.max(1)), self.next_seq);
        self.next_seq = self.next_seq.saturating_add(1);
        self.queue.insert(key, id);
        self.timers.insert(id, Timer { task, period, key });
        id
    }
}

impl<T: Clone> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn drain(s: &mut Scheduler<&'static str>) -> Vec<&'static str> {
        let mut out = Vec::new();
        while let Some(fired) = s.pop_due() {
            out.push(fired.task);
        }
        out
    }

    #[test]
    fn once_fires_after_delay_then_disappears() {
        let mut s = Scheduler::new();
        let id = s.schedule_once(3, "decay");
        s.advance();
        s.advance();
        assert!(drain(&mut s).is_empty());
        s.advance();
        assert_eq!(drain(&mut s), vec!["decay"]);
        assert!(!s.is_scheduled(id));
        s.advance();
        assert!(drain(&mut s).is_empty());
    }

    #[test]
    fn zero_delay_runs_next_tick() {
        let mut s = Scheduler::new();
        s.schedule_once(0, "now");
        assert!(drain(&mut s).is_empty());
        s.advance();
        assert_eq!(drain(&mut s), vec!["now"]);
    }

    #[test]
    fn repeating_fires_every_period() {
        let mut s = Scheduler::new();
        s.schedule_repeating(0, 20, "poll");
        let mut fired_at = Vec::new();
        for _ in 0..61 {
            let tick = s.advance();
            if !drain(&mut s).is_empty() {
                fired_at.push(tick);
            }
        }
        assert_eq!(fired_at, vec![1, 21, 41, 61]);
    }

    #[test]
    fn cancel_stops_repeating_timer() {
        let mut s = Scheduler::new();
        let id = s.schedule_repeating(0, 1, "tick");
        s.advance();
        assert_eq!(drain(&mut s), vec!["tick"]);
        assert!(s.cancel(id));
        assert!(!s.cancel(id));
        s.advance();
        assert!(drain(&mut s).is_empty());
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn handler_can_cancel_itself_and_same_tick_peers() {
        let mut s = Scheduler::new();
        let tick = s.schedule_repeating(0, 1, "tick");
        let poll = s.schedule_repeating(0, 1, "poll");
        s.advance();

        let first = s.pop_due().unwrap();
        assert_eq!(first.task, "tick");
        // The handler for "tick" cancels both timers before "poll" is popped.
        assert!(s.cancel(tick));
        assert!(s.cancel(poll));
        assert!(s.pop_due().is_none());
        s.advance();
        assert!(s.pop_due().is_none());
    }

    #[test]
    fn due_order_then_registration_order() {
        let mut s = Scheduler::new();
        s.schedule_once(2, "late");
        s.schedule_once(1, "first");
        s.schedule_once(1, "second");
        s.advance();
        s.advance();
        assert_eq!(drain(&mut s), vec!["first", "second", "late"]);
    }

    #[test]
    fn due_at_reports_next_fire() {
        let mut s = Scheduler::new();
        let id = s.schedule_repeating(5, 10, "x");
        assert_eq!(s.due_at(id), Some(5));
        for _ in 0..5 {
            s.advance();
        }
        let _ = drain(&mut s);
        assert_eq!(s.due_at(id), Some(15));
    }
}
