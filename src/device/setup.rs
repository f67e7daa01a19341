//! Capability discovery and channel arming.

use alloc::sync::Arc;

use super::{ArmedChannel, ChannelSlot, HotplugDevice};
use crate::channel::{Channel, ChannelMap};
use crate::config::HotplugConfig;
use crate::driver::DeviceId;
use crate::error::{HotplugError, HotplugResult};
use crate::firmware::DsmChannel;
use crate::gpio::SignalLine;
use crate::irq::{irq_name, Flags, IrqRegistration};
use crate::lifecycle::ContextLifecycle;
use crate::platform::Platform;
use crate::stats::DeviceStats;

impl<P: Platform> HotplugDevice<P> {
    /// Builds the device context for device `id`.
    ///
    /// Every channel firmware reports as implemented gets its line acquired
    /// and a threaded IRQ requested on both edges. Unsupported channels are
    /// left absent. The first failure aborts setup; everything acquired so
    /// far is released before the error is returned.
    ///
    /// The returned context has not sent anything to firmware yet; call
    /// [`HotplugDevice::synchronize`] once it can receive edges.
    ///
    /// # Errors
    ///
    /// - [`HotplugError::Resource`] if a line is missing, busy or has no IRQ.
    /// - [`HotplugError::Setup`] if the IRQ request is refused.
    pub fn setup(id: DeviceId, platform: Arc<P>, config: HotplugConfig) -> HotplugResult<Self> {
        let mut armed: ChannelMap<Option<ArmedChannel<P>>> = ChannelMap::from_fn(|_| None);

        for channel in Channel::ALL {
            armed[channel] = arm_channel(&platform, &config, id, channel).inspect_err(|err| {
                error!("{:?}: failed to set up IRQ {}: {}", id, channel.ordinal(), err);
            })?;
        }

        Ok(Self {
            id,
            channels: armed.map(ChannelSlot::new),
            lifecycle: ContextLifecycle::new(),
            stats: DeviceStats::new(),
            config,
            platform,
        })
    }
}

fn arm_channel<P: Platform>(
    platform: &Arc<P>,
    config: &HotplugConfig,
    id: DeviceId,
    channel: Channel,
) -> HotplugResult<Option<ArmedChannel<P>>> {
    let dsm = DsmChannel::new(platform.firmware(), &config.dsm);
    if !dsm.query_capability(channel.function_id()) {
        debug!("{:?}: {} not implemented by firmware, skipping", id, channel);
        return Ok(None);
    }

    let line = platform
        .acquire_line(&config.lines[channel])
        .map_err(|source| HotplugError::Resource { channel, source })?;
    let irq = line
        .to_irq()
        .map_err(|source| HotplugError::Resource { channel, source })?;

    let irq = IrqRegistration::request(
        Arc::clone(platform),
        irq,
        Flags::BOTH_EDGES_ONESHOT,
        &irq_name(channel),
        id,
    )
    .map_err(|source| HotplugError::Setup { channel, source })?;

    debug!("{:?}: set up irq {} as type {}", id, irq.irq(), channel.ordinal());
    Ok(Some(ArmedChannel { irq, line }))
}
