use anyhow::Result;
use log::{info, warn};
use serde::Serialize;
use station_fsm::station::{Reply, ReplyValue, StationEvent};
use station_fsm::types::{NetworkId, RequestId};
use station_fsm::{Collaborators, StateId, StationEngine};

use crate::scenario::{Action, Scenario};
use crate::scripted::{LogObserver, ScriptedIp, ScriptedRadio, ScriptedStore};

#[derive(Debug, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub action: String,
    pub at_ms: u64,
    pub state: &'static str,
    pub replies: Vec<String>,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub scenario: String,
    pub steps: Vec<StepReport>,
    pub final_state: &'static str,
    pub teardowns: u32,
    pub radio_calls: Vec<String>,
    pub passed: bool,
}

pub fn reply_label(reply: &Reply) -> String {
    match &reply.outcome {
        Ok(ReplyValue::Done) => "done".into(),
        Ok(ReplyValue::Saved(id)) => format!("saved:{id}"),
        Ok(ReplyValue::WpsStarted { pin: Some(pin) }) => format!("wps_started:{pin}"),
        Ok(ReplyValue::WpsStarted { pin: None }) => "wps_started".into(),
        Ok(ReplyValue::WpsCompleted) => "wps_completed".into(),
        Err(err) => err.as_str().into(),
    }
}

fn action_label(action: &Action) -> String {
    match action {
        Action::Command(caller, command) => format!("{} uid={}", command.label(), caller.uid),
        Action::Notify(notification) => notification.label().to_string(),
        Action::Ip(event) => event.label().to_string(),
        Action::Advance(ms) => format!("advance {ms}ms"),
    }
}

// Replies to earlier requests (deferred commands answered now) carry their id.
fn describe_replies(replies: &[Reply], own: Option<RequestId>) -> Vec<String> {
    replies
        .iter()
        .map(|reply| {
            if Some(reply.id) == own {
                reply_label(reply)
            } else {
                format!("#{}:{}", reply.id.0, reply_label(reply))
            }
        })
        .collect()
}

pub fn build_engine(scenario: &Scenario) -> Result<(StationEngine, ScriptedRadio)> {
    let radio = ScriptedRadio::new(
        scenario.radio.fail.clone(),
        scenario.radio.signal.clone(),
        scenario.radio.hal_down,
    );
    let store = ScriptedStore::new();
    for entry in &scenario.networks {
        let id = NetworkId(entry.id);
        store.seed(id, entry.config()?, entry.channels.clone());
        if entry.disabled {
            store.disable(id);
        }
    }

    let services = Collaborators::new(radio.clone(), store, ScriptedIp, LogObserver);
    Ok((StationEngine::new(scenario.policy(), services), radio))
}

pub fn run_scenario(scenario: &Scenario) -> Result<ReplayReport> {
    let (mut engine, radio) = build_engine(scenario)?;
    let name = scenario.name.clone().unwrap_or_else(|| "unnamed".into());
    info!("replay: scenario {name}, {} steps", scenario.steps.len());

    let mut steps = Vec::with_capacity(scenario.steps.len());
    for (offset, step) in scenario.steps.iter().enumerate() {
        let index = offset + 1;
        let action = step.action()?;
        let label = action_label(&action);

        let own = match action {
            Action::Command(caller, command) => {
                let id = engine.submit(caller, command);
                engine.run_until_idle();
                Some(id)
            }
            Action::Notify(notification) => {
                engine.post(StationEvent::Supplicant(notification));
                engine.run_until_idle();
                None
            }
            Action::Ip(event) => {
                engine.post(StationEvent::Provisioning(event));
                engine.run_until_idle();
                None
            }
            Action::Advance(ms) => {
                engine.advance_by(ms);
                None
            }
        };

        let replies = engine.take_replies();
        let state = engine.state();
        let mut notes = Vec::new();

        if let Some(expected) = step.expected_state()? {
            if expected != state {
                notes.push(format!(
                    "expected state {}, got {}",
                    expected.as_str(),
                    state.as_str()
                ));
            }
        }
        if let Some(expected) = &step.expect_reply {
            let matched = replies
                .iter()
                .filter(|reply| own.is_none_or(|id| reply.id == id))
                .any(|reply| reply_label(reply) == *expected);
            if !matched {
                notes.push(format!("expected reply {expected}"));
            }
        }

        let ok = notes.is_empty();
        let replies = describe_replies(&replies, own);
        if ok {
            info!(
                "step {index}: {label} -> {} [{}]",
                state.as_str(),
                replies.join(", ")
            );
        } else {
            warn!(
                "step {index}: {label} -> {} [{}] FAILED: {}",
                state.as_str(),
                replies.join(", "),
                notes.join("; ")
            );
        }

        steps.push(StepReport {
            index,
            action: label,
            at_ms: engine.now_ms(),
            state: state.as_str(),
            replies,
            ok,
            note: (!ok).then(|| notes.join("; ")),
        });
    }

    let final_state = engine.state();
    let final_ok = match scenario.expected_final()? {
        Some(expected) if expected != final_state => {
            warn!(
                "replay: expected final state {}, got {}",
                expected.as_str(),
                final_state.as_str()
            );
            false
        }
        _ => true,
    };

    let passed = final_ok && steps.iter().all(|step| step.ok);
    Ok(ReplayReport {
        scenario: name,
        steps,
        final_state: final_state.as_str(),
        teardowns: engine.teardowns(),
        radio_calls: radio.calls(),
        passed,
    })
}

fn push_subtree(state: StateId, lines: &mut Vec<String>) {
    let kind = if state.is_leaf() { "" } else { " (superstate)" };
    lines.push(format!("{}{}{kind}", "  ".repeat(state.depth()), state.as_str()));
    for child in StateId::ALL
        .into_iter()
        .filter(|child| child.parent() == Some(state))
    {
        push_subtree(child, lines);
    }
}

// One line per state, indented under its parent.
pub fn state_tree() -> Vec<String> {
    let mut lines = Vec::with_capacity(StateId::COUNT);
    push_subtree(StateId::Default, &mut lines);
    lines
}
