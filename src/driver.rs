//! Driver entry points: attach, detach and IRQ dispatch.
//!
//! The driver keeps every attached [`HotplugDevice`] under its
//! [`DeviceId`]. The id doubles as the cookie IRQs are requested with, so
//! the platform's threaded-IRQ worker hands `(cookie, irq)` to
//! [`HotplugDriver::dispatch`] and the driver routes it to the owning
//! device context.

use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use core::sync::atomic::{AtomicUsize, Ordering};

use axerrno::AxResult;
use spin::RwLock;

use crate::config::HotplugConfig;
use crate::device::HotplugDevice;
use crate::error::HotplugError;
use crate::irq::{IrqNum, IrqReturn};
use crate::platform::Platform;

/// Unique identifier of an attached device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceId(pub usize);

/// The hot-plug relay driver.
pub struct HotplugDriver<P: Platform> {
    config: HotplugConfig,
    /// Attached devices indexed by ID.
    devices: RwLock<BTreeMap<DeviceId, Arc<HotplugDevice<P>>>>,
    next_id: AtomicUsize,
}

impl<P: Platform> HotplugDriver<P> {
    /// Creates a driver that sets up devices with `config`.
    pub fn new(config: HotplugConfig) -> Self {
        Self {
            config,
            devices: RwLock::new(BTreeMap::new()),
            next_id: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub fn config(&self) -> &HotplugConfig {
        &self.config
    }

    /// Whether the driver binds to a device identified by `hid`.
    pub fn matches(&self, hid: &str) -> bool {
        self.config.matches(hid)
    }

    /// Attaches a device.
    ///
    /// Devices whose platform description declares no signal lines are
    /// rejected: the same identity is used on machines without a
    /// detachable GPU. Otherwise the device context is set up, published
    /// for [`HotplugDriver::dispatch`], and every armed channel's current
    /// level is forwarded once.
    ///
    /// # Errors
    ///
    /// `NotFound` for a device without lines, or the platform error that
    /// aborted setup.
    pub fn probe(&self, platform: Arc<P>) -> AxResult<DeviceId> {
        if platform.line_count() == 0 {
            debug!("no signal lines declared, not binding");
            return Err(HotplugError::NoDevice.into());
        }

        let id = DeviceId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let device = Arc::new(HotplugDevice::setup(id, platform, self.config.clone())?);
        self.devices.write().insert(id, Arc::clone(&device));

        // Edges that arrived before publication were not routed.
        device.synchronize();

        info!("{:?}: attached, armed {:?}", id, device.armed_channels().as_slice());
        Ok(id)
    }

    /// Detaches a device, returning once no notification for it can occur.
    ///
    /// # Errors
    ///
    /// `NotFound` if `id` is not attached.
    pub fn remove(&self, id: DeviceId) -> AxResult {
        let device = self
            .devices
            .write()
            .remove(&id)
            .ok_or_else(|| axerrno::ax_err_type!(NotFound, "hot-plug device not attached"))?;

        device.teardown();
        info!("{:?}: detached", id);
        Ok(())
    }

    /// Routes an edge to the device that requested `irq` with `cookie`.
    ///
    /// Runs in the platform's threaded-IRQ worker and may block.
    pub fn dispatch(&self, cookie: DeviceId, irq: IrqNum) -> IrqReturn {
        let device = self.devices.read().get(&cookie).cloned();
        match device {
            Some(device) => device.handle_irq(irq),
            None => {
                trace!("irq {} for unattached device {:?}", irq, cookie);
                IrqReturn::None
            }
        }
    }

    /// Gets an attached device.
    pub fn device(&self, id: DeviceId) -> Option<Arc<HotplugDevice<P>>> {
        self.devices.read().get(&id).cloned()
    }

    /// Number of attached devices.
    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }
}

impl<P: Platform> Default for HotplugDriver<P> {
    fn default() -> Self {
        Self::new(HotplugConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channel;
    use crate::lifecycle::ContextState;
    use crate::mock::MockPlatform;
    use alloc::vec;
    use axerrno::AxError;

    #[test]
    fn test_probe_without_lines_is_rejected() {
        let driver = HotplugDriver::default();
        let platform = Arc::new(MockPlatform::new().with_line_count(0));

        assert_eq!(driver.probe(Arc::clone(&platform)), Err(AxError::NotFound));
        assert!(platform.queried().is_empty());
        assert!(driver.is_empty());
    }

    #[test]
    fn test_probe_synchronizes_and_dispatches() {
        let driver = HotplugDriver::default();
        let platform = Arc::new(MockPlatform::new().with_supported(&[Channel::DevicePresence]));

        let id = driver.probe(Arc::clone(&platform)).unwrap();
        assert_eq!(driver.len(), 1);
        assert_eq!(platform.calls(), vec![(0x05, 0)]);

        platform.set_level(Channel::DevicePresence, true);
        let irq = MockPlatform::irq_of(Channel::DevicePresence);
        assert_eq!(driver.dispatch(id, irq), IrqReturn::Handled);
        assert_eq!(platform.calls(), vec![(0x05, 0), (0x05, 1)]);
    }

    #[test]
    fn test_probe_failure_leaves_nothing_attached() {
        let driver = HotplugDriver::default();
        let platform = Arc::new(MockPlatform::new().with_request_failure(Channel::DevicePresence));

        assert_eq!(driver.probe(Arc::clone(&platform)), Err(AxError::ResourceBusy));
        assert!(driver.is_empty());
        assert!(platform.calls().is_empty());
        assert!(!platform.owned(Channel::BasePresence));
    }

    #[test]
    fn test_remove_tears_down() {
        let driver = HotplugDriver::default();
        let platform = Arc::new(MockPlatform::new());
        let id = driver.probe(Arc::clone(&platform)).unwrap();

        let device = driver.device(id).unwrap();
        driver.remove(id).unwrap();
        assert_eq!(device.state(), ContextState::Removed);
        assert_eq!(platform.disabled().len(), 3);

        let before = platform.calls().len();
        assert_eq!(driver.dispatch(id, MockPlatform::irq_of(Channel::BasePresence)), IrqReturn::None);
        assert_eq!(platform.calls().len(), before);

        drop(device);
        assert!(!platform.owned(Channel::BasePresence));
    }

    #[test]
    fn test_remove_unknown_device() {
        let driver: HotplugDriver<MockPlatform> = HotplugDriver::default();
        assert_eq!(driver.remove(DeviceId(42)), Err(AxError::NotFound));
    }

    #[test]
    fn test_matches_identity() {
        let driver: HotplugDriver<MockPlatform> = HotplugDriver::default();
        assert!(driver.matches("MSHW0153"));
        assert!(!driver.matches("PNP0C0A"));
    }
}
