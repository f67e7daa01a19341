//! Edge relay: line level in, firmware notification out.

use super::{ArmedChannel, ChannelSlot, HotplugDevice};
use crate::channel::Channel;
use crate::error::{HotplugError, HotplugResult};
use crate::firmware::DsmChannel;
use crate::gpio::SignalLine;
use crate::irq::{IrqNum, IrqReturn};
use crate::platform::Platform;

impl<P: Platform> HotplugDevice<P> {
    /// Threaded handler body, run once per edge in a context that may sleep.
    ///
    /// Failures are logged and the edge is dropped; the next edge carries
    /// the then-current level anyway.
    pub fn handle_irq(&self, irq: IrqNum) -> IrqReturn {
        match self.relay(irq) {
            Ok(_) => {}
            Err(HotplugError::Removed) => trace!("{:?}: irq {} after teardown, ignored", self.id, irq),
            Err(err) => error!("{:?}: {}", self.id, err),
        }
        IrqReturn::Handled
    }

    /// Forwards the level of the line behind `irq` to firmware.
    ///
    /// Returns the forwarded level.
    ///
    /// # Errors
    ///
    /// - [`HotplugError::UnknownIrq`] if `irq` belongs to no armed channel.
    ///   This is a bug elsewhere (IRQ number reuse), never an expected outcome.
    /// - [`HotplugError::Removed`] once teardown has started.
    /// - [`HotplugError::Sampling`] / [`HotplugError::Forwarding`] if the
    ///   line read or the firmware call fails.
    pub fn relay(&self, irq: IrqNum) -> HotplugResult<bool> {
        let found = self
            .armed()
            .find(|(_, _, armed)| armed.irq.irq() == irq);

        match found {
            Some((channel, slot, armed)) => self.notify(channel, slot, armed),
            None => {
                self.stats.record_unknown_irq();
                Err(HotplugError::UnknownIrq(irq))
            }
        }
    }

    /// Forwards the current level of every armed channel.
    ///
    /// Covers transitions that happened before IRQs could be delivered.
    /// Failures are logged per channel. Returns how many channels firmware
    /// acknowledged.
    pub fn synchronize(&self) -> usize {
        let mut forwarded = 0;
        for (channel, slot, armed) in self.armed() {
            match self.notify(channel, slot, armed) {
                Ok(_) => forwarded += 1,
                Err(HotplugError::Removed) => break,
                Err(err) => error!("{:?}: {}", self.id, err),
            }
        }
        forwarded
    }

    fn notify(&self, channel: Channel, slot: &ChannelSlot<P>, armed: &ArmedChannel<P>) -> HotplugResult<bool> {
        let Some(_relay) = self.lifecycle.try_enter() else {
            self.stats.record_rejected();
            return Err(HotplugError::Removed);
        };
        let _guard = slot.lock.lock();

        let value = armed.line.get_value_cansleep().map_err(|source| {
            slot.stats.record_sampling_error();
            HotplugError::Sampling { channel, source }
        })?;

        debug!(
            "{:?}: IRQ notification via DSM (irq={}, value={})",
            self.id,
            channel.ordinal(),
            value as u8
        );

        DsmChannel::new(self.platform.firmware(), &self.config.dsm)
            .invoke(channel.function_id(), value)
            .map_err(|reason| {
                slot.stats.record_forwarding_error();
                HotplugError::Forwarding { channel, reason }
            })?;

        slot.stats.record_forwarded();
        Ok(value)
    }
}
