use std::collections::VecDeque;

use log::trace;
use statig::blocking::IntoStateMachineExt as _;

use crate::collab::Collaborators;
use crate::config::StationPolicy;
use crate::types::{CallerIdentity, RequestId};

use super::diag;
use super::events::{Command, Reply, Request, StationEvent};
use super::machine::{DispatchContext, StationHsm};
use super::snapshot::StationSnapshot;
use super::state_id::{StateId, StateTrace};
use super::timers::TimerQueue;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    Handled,
    Deferred,
    Unhandled,
}

// Single-threaded driver around the state machine. Events are handled one at
// a time: deferred ones replay ahead of anything queued after a transition,
// posts go to the back, delayed posts wait in the timer queue.
pub struct StationEngine {
    machine: statig::blocking::StateMachine<StationHsm>,
    queue: VecDeque<StationEvent>,
    deferred: VecDeque<StationEvent>,
    timers: TimerQueue,
    replies: Vec<Reply>,
    now_ms: u64,
    next_request: u32,
}

impl StationEngine {
    pub fn new(policy: StationPolicy, services: Collaborators) -> Self {
        Self {
            machine: StationHsm::new(policy, services).state_machine(),
            queue: VecDeque::new(),
            deferred: VecDeque::new(),
            timers: TimerQueue::default(),
            replies: Vec::new(),
            now_ms: 0,
            next_request: RequestId::INTERNAL.0,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn submit(&mut self, caller: CallerIdentity, command: Command) -> RequestId {
        self.next_request = self.next_request.wrapping_add(1);
        if self.next_request == RequestId::INTERNAL.0 {
            self.next_request = 1;
        }
        let id = RequestId(self.next_request);
        self.post(StationEvent::Command(Request {
            id,
            caller,
            command,
        }));
        id
    }

    pub fn post(&mut self, event: StationEvent) {
        self.queue.push_back(event);
    }

    pub fn dispatch(&mut self, event: StationEvent) -> Disposition {
        let from = self.state();
        let mut context = DispatchContext::new(self.now_ms);
        self.machine.handle_with_context(&event, &mut context);
        let to = self.state();

        let disposition = if !context.deferred.is_empty() {
            diag::note_deferral();
            Disposition::Deferred
        } else if context.unhandled {
            diag::note_unhandled();
            Disposition::Unhandled
        } else {
            Disposition::Handled
        };
        trace!("station: {} in {} -> {:?}", event.label(), from.as_str(), disposition);

        self.deferred.extend(context.deferred);
        if context.entered > 0 {
            if from != to {
                diag::emit_transition(from, to, event.label(), self.now_ms);
            }
            while let Some(held) = self.deferred.pop_back() {
                self.queue.push_front(held);
            }
        }

        self.queue.extend(context.posts);
        for (delay_ms, delayed) in context.delayed {
            self.timers
                .schedule(self.now_ms.saturating_add(u64::from(delay_ms)), delayed);
        }
        self.replies.extend(
            context
                .replies
                .into_iter()
                .filter(|reply| !reply.id.is_internal()),
        );
        disposition
    }

    pub fn run_until_idle(&mut self) -> usize {
        let mut dispatched = 0;
        while let Some(event) = self.queue.pop_front() {
            self.dispatch(event);
            dispatched += 1;
        }
        dispatched
    }

    // Drains the queue, then fires every timer due at or before `now_ms` in
    // deadline order, draining again after each.
    pub fn advance_to(&mut self, now_ms: u64) {
        self.run_until_idle();
        while let Some((due_ms, event)) = self.timers.pop_due(now_ms) {
            self.now_ms = self.now_ms.max(due_ms);
            self.dispatch(event);
            self.run_until_idle();
        }
        self.now_ms = self.now_ms.max(now_ms);
    }

    pub fn advance_by(&mut self, delta_ms: u64) {
        self.advance_to(self.now_ms.saturating_add(delta_ms));
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn deferred(&self) -> usize {
        self.deferred.len()
    }

    pub fn take_replies(&mut self) -> Vec<Reply> {
        core::mem::take(&mut self.replies)
    }

    pub fn state(&self) -> StateId {
        self.machine.inner().leaf
    }

    pub fn trace(&self) -> StateTrace {
        self.machine.inner().trace
    }

    pub fn teardowns(&self) -> u32 {
        self.machine.inner().teardowns
    }

    pub fn snapshot(&self) -> StationSnapshot {
        StationSnapshot::capture(self.machine.inner(), self.now_ms)
    }
}
