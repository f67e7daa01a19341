//! Hot-plug device context.
//!
//! One [`HotplugDevice`] exists per attached device. It owns one slot per
//! [`Channel`]; a slot is either absent (firmware does not want the
//! channel) or armed (a signal line plus the IRQ requested for it).
//!
//! - Setup ([`HotplugDevice::setup`]) discovers capabilities and arms
//!   channels, all or nothing.
//! - Relay ([`HotplugDevice::handle_irq`]) forwards the level of a line to
//!   firmware on every edge, one call at a time per channel.
//! - Teardown ([`HotplugDevice::teardown`]) disables every armed IRQ and
//!   waits for running relays before returning.

mod relay;
mod setup;

use alloc::sync::Arc;
use core::fmt;

use arrayvec::ArrayVec;
use spin::mutex::TicketMutex;

use crate::channel::{Channel, ChannelMap, CHANNEL_COUNT};
use crate::config::HotplugConfig;
use crate::driver::DeviceId;
use crate::irq::{IrqNum, IrqRegistration};
use crate::lifecycle::{ContextLifecycle, ContextState};
use crate::platform::Platform;
use crate::stats::{DeviceStats, RelayStats};

/// Resources held for a channel firmware asked us to monitor.
///
/// The IRQ is declared first so it is freed before the line is released.
pub(crate) struct ArmedChannel<P: Platform> {
    irq: IrqRegistration<P>,
    line: P::Line,
}

/// Per-channel state of a device context.
pub(crate) struct ChannelSlot<P: Platform> {
    /// Serializes every notification of this channel in arrival order.
    ///
    /// Held across the firmware call; queued edges relax via `P::Relax`.
    lock: TicketMutex<(), P::Relax>,
    armed: Option<ArmedChannel<P>>,
    stats: RelayStats,
}

impl<P: Platform> ChannelSlot<P> {
    fn new(armed: Option<ArmedChannel<P>>) -> Self {
        Self {
            lock: TicketMutex::new(()),
            armed,
            stats: RelayStats::new(),
        }
    }

    #[inline]
    fn irq(&self) -> Option<IrqNum> {
        self.armed.as_ref().map(|armed| armed.irq.irq())
    }
}

/// State of one attached hot-plug device.
pub struct HotplugDevice<P: Platform> {
    id: DeviceId,
    channels: ChannelMap<ChannelSlot<P>>,
    lifecycle: ContextLifecycle,
    stats: DeviceStats,
    config: HotplugConfig,
    platform: Arc<P>,
}

impl<P: Platform> HotplugDevice<P> {
    #[inline]
    pub fn id(&self) -> DeviceId {
        self.id
    }

    #[inline]
    pub fn config(&self) -> &HotplugConfig {
        &self.config
    }

    #[inline]
    pub fn platform(&self) -> &Arc<P> {
        &self.platform
    }

    #[inline]
    pub fn state(&self) -> ContextState {
        self.lifecycle.state()
    }

    /// Whether `channel` has a line and an IRQ.
    #[inline]
    pub fn is_armed(&self, channel: Channel) -> bool {
        self.channels[channel].armed.is_some()
    }

    /// IRQ requested for `channel`, if armed.
    #[inline]
    pub fn irq(&self, channel: Channel) -> Option<IrqNum> {
        self.channels[channel].irq()
    }

    /// Armed channels in channel order.
    pub fn armed_channels(&self) -> ArrayVec<Channel, CHANNEL_COUNT> {
        self.armed().map(|(channel, _, _)| channel).collect()
    }

    /// Relay counters of `channel`.
    #[inline]
    pub fn channel_stats(&self, channel: Channel) -> &RelayStats {
        &self.channels[channel].stats
    }

    /// Counters for edges that never reached a channel.
    #[inline]
    pub fn stats(&self) -> &DeviceStats {
        &self.stats
    }

    fn armed(&self) -> impl Iterator<Item = (Channel, &ChannelSlot<P>, &ArmedChannel<P>)> {
        self.channels
            .iter()
            .filter_map(|(channel, slot)| slot.armed.as_ref().map(|armed| (channel, slot, armed)))
    }

    /// Stops all relaying for this device.
    ///
    /// Rejects new edges, disables every armed IRQ and waits for relays
    /// already running to complete. No firmware notification is issued for
    /// this device once this returns. Calling it again is a no-op.
    ///
    /// A concurrent caller that did not start teardown waits for the one
    /// that did before returning.
    ///
    /// Lines and IRQs stay owned until the context is dropped.
    pub fn teardown(&self) {
        if !self.lifecycle.begin_removal() {
            self.lifecycle.wait_removed_with::<P::Relax>();
            return;
        }

        for (channel, _, armed) in self.armed() {
            armed.irq.disable();
            debug!("{:?}: disabled irq {} ({})", self.id, armed.irq.irq(), channel);
        }

        self.lifecycle.wait_idle_with::<P::Relax>();
        self.lifecycle.complete_removal();
    }
}

impl<P: Platform> Drop for HotplugDevice<P> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<P: Platform> fmt::Debug for HotplugDevice<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotplugDevice")
            .field("id", &self.id)
            .field("lifecycle", &self.lifecycle)
            .field("armed", &self.armed_channels())
            .finish()
    }
}
