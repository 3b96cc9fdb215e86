use std::cmp::Reverse;
use std::collections::BinaryHeap;

use super::events::StationEvent;

#[derive(Debug)]
struct Pending {
    due_ms: u64,
    seq: u64,
    event: StationEvent,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key().cmp(&other.key())
    }
}

impl Pending {
    fn key(&self) -> (u64, u64) {
        (self.due_ms, self.seq)
    }
}

// Delayed self-messages. Nothing is ever removed early; cancellation is done
// by the watchdog generation check when the message is dispatched.
#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Reverse<Pending>>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn schedule(&mut self, due_ms: u64, event: StationEvent) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Pending { due_ms, seq, event }));
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.heap.peek().map(|Reverse(pending)| pending.due_ms)
    }

    // Same-deadline messages come out in scheduling order.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(u64, StationEvent)> {
        if self.next_deadline()? > now_ms {
            return None;
        }
        self.heap
            .pop()
            .map(|Reverse(pending)| (pending.due_ms, pending.event))
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
