use std::thread::{self, JoinHandle};

use embassy_futures::select::{select3, Either3};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer};
use log::{debug, info, warn};

use crate::station::{Notification, Reply, SharedSnapshot, StationEngine, StationEvent};

pub const STATION_INBOX_DEPTH: usize = 32;
pub const STATION_REPLY_DEPTH: usize = 16;

pub type StationInbox = Channel<CriticalSectionRawMutex, StationEvent, STATION_INBOX_DEPTH>;
pub type ReplyOutbox = Channel<CriticalSectionRawMutex, Reply, STATION_REPLY_DEPTH>;
pub type ShutdownSignal = Signal<CriticalSectionRawMutex, ()>;

// Blocking producer of lower-layer notifications, typically a monitor reading
// the supplicant control socket. `None` means the source is gone for good.
pub trait EventSource: Send {
    fn wait_for_event(&mut self) -> Option<Notification>;
}

pub fn spawn_listener(
    mut source: impl EventSource + 'static,
    inbox: &'static StationInbox,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("station-events".into())
        .spawn(move || {
            while let Some(notification) = source.wait_for_event() {
                debug!("station: event {}", notification.label());
                embassy_futures::block_on(inbox.send(StationEvent::Supplicant(notification)));
            }
            info!("station: event source closed");
        })
}

#[derive(Clone, Copy)]
pub struct StationIo<'a> {
    pub inbox: &'a StationInbox,
    pub replies: &'a ReplyOutbox,
    pub shutdown: &'a ShutdownSignal,
    pub snapshot: &'a SharedSnapshot,
}

// Owns the engine for the lifetime of the loop. Wakes on an inbound event,
// the earliest pending timer, or shutdown; returns the engine on shutdown.
pub async fn run_station(mut engine: StationEngine, io: StationIo<'_>) -> StationEngine {
    let started = Instant::now();
    info!("station: loop started");
    loop {
        engine.advance_to(started.elapsed().as_millis());
        for reply in engine.take_replies() {
            if io.replies.try_send(reply).is_err() {
                warn!("station: reply outbox full, dropping reply");
            }
        }
        io.snapshot.publish(engine.snapshot());

        let deadline = engine.next_deadline();
        let wake = async move {
            match deadline {
                Some(at_ms) => Timer::at(started + Duration::from_millis(at_ms)).await,
                None => core::future::pending::<()>().await,
            }
        };

        match select3(io.inbox.receive(), wake, io.shutdown.wait()).await {
            Either3::First(event) => engine.post(event),
            Either3::Second(()) => {}
            Either3::Third(()) => {
                info!("station: shutdown requested");
                break;
            }
        }
    }
    engine
}
