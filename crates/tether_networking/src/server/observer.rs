//! # Room Observers
//!
//! Synchronous notifications out of the room: peer membership changes and
//! the boundaries of each tick. Observers run inline on the tick thread,
//! in registration order.

use crossbeam_channel::{Sender, TrySendError};
use tether_core::Tick;
use tracing::warn;

use super::peers::PeerId;

/// Receives room notifications. Every method defaults to a no-op.
pub trait RoomObserver: Send {
    /// A peer was added to the room.
    fn on_client_joined(&mut self, _peer: PeerId) {}

    /// A peer was removed from the room.
    fn on_client_left(&mut self, _peer: PeerId) {}

    /// A tick is starting; the tick counter has already advanced.
    fn on_pre_tick(&mut self, _tick: Tick) {}

    /// A tick finished all lifecycle waves.
    fn on_post_tick(&mut self, _tick: Tick) {}
}

/// A room notification as a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoomNotification {
    /// See [`RoomObserver::on_client_joined`].
    ClientJoined(PeerId),
    /// See [`RoomObserver::on_client_left`].
    ClientLeft(PeerId),
    /// See [`RoomObserver::on_pre_tick`].
    PreTick(Tick),
    /// See [`RoomObserver::on_post_tick`].
    PostTick(Tick),
}

/// Forwards notifications into a channel for consumption off the tick thread.
///
/// Sending never blocks; when the channel is full or disconnected the
/// notification is dropped with a warning.
#[derive(Debug)]
pub struct ChannelObserver {
    sender: Sender<RoomNotification>,
}

impl ChannelObserver {
    /// Wraps `sender`.
    #[must_use]
    pub fn new(sender: Sender<RoomNotification>) -> Self {
        Self { sender }
    }

    fn forward(&self, notification: RoomNotification) {
        match self.sender.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                warn!(?dropped, "room notification channel full");
            }
            Err(TrySendError::Disconnected(dropped)) => {
                warn!(?dropped, "room notification channel disconnected");
            }
        }
    }
}

impl RoomObserver for ChannelObserver {
    fn on_client_joined(&mut self, peer: PeerId) {
        self.forward(RoomNotification::ClientJoined(peer));
    }

    fn on_client_left(&mut self, peer: PeerId) {
        self.forward(RoomNotification::ClientLeft(peer));
    }

    fn on_pre_tick(&mut self, tick: Tick) {
        self.forward(RoomNotification::PreTick(tick));
    }

    fn on_post_tick(&mut self, tick: Tick) {
        self.forward(RoomNotification::PostTick(tick));
    }
}
