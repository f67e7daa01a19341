//! Interrupt plumbing: numbers, request flags, handler return values and
//! the registration guard that frees a requested IRQ on drop.

use alloc::sync::Arc;
use core::fmt::{self, Write};
use core::ops::BitOr;

use arrayvec::ArrayString;
use axerrno::AxResult;

use crate::channel::Channel;
use crate::driver::DeviceId;
use crate::platform::Platform;

/// Platform interrupt number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IrqNum(pub u32);

impl fmt::Display for IrqNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Flags passed when requesting an interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags(u32);

impl Flags {
    /// Trigger on rising edges.
    pub const TRIGGER_RISING: Flags = Flags(0x0000_0001);
    /// Trigger on falling edges.
    pub const TRIGGER_FALLING: Flags = Flags(0x0000_0002);
    /// Keep the line masked until the threaded handler has finished.
    pub const ONESHOT: Flags = Flags(0x0000_2000);

    /// Both edges, handled one at a time.
    pub const BOTH_EDGES_ONESHOT: Flags =
        Flags(Self::ONESHOT.0 | Self::TRIGGER_RISING.0 | Self::TRIGGER_FALLING.0);

    #[inline]
    pub const fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

/// Result of a threaded handler invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqReturn {
    /// The interrupt was not from this device.
    None,
    /// The interrupt was handled.
    Handled,
}

/// Maximum length of an IRQ name.
pub const IRQ_NAME_LEN: usize = 16;

/// Name an IRQ is requested under, e.g. `shps-irq-2`.
pub fn irq_name(channel: Channel) -> ArrayString<IRQ_NAME_LEN> {
    let mut name = ArrayString::new();
    // "shps-irq-" plus a single digit always fits.
    let _ = write!(name, "shps-irq-{}", channel.ordinal());
    name
}

/// Interrupt controller of the platform.
///
/// Handlers are threaded: the controller runs them in a context that may
/// sleep, and with [`Flags::ONESHOT`] keeps the line masked until the
/// handler returns. The handler for a requested IRQ is reached through the
/// owning driver's dispatch entry, keyed by `cookie`.
pub trait InterruptController: Send + Sync {
    /// Requests a threaded handler for `irq`.
    fn request_threaded_irq(&self, irq: IrqNum, flags: Flags, name: &str, cookie: DeviceId) -> AxResult;

    /// Disables `irq`. Must not return while a handler for it is running.
    fn disable_irq(&self, irq: IrqNum);

    /// Releases a previously requested `irq`.
    fn free_irq(&self, irq: IrqNum, cookie: DeviceId);
}

/// A requested IRQ. Dropping it frees the IRQ.
pub struct IrqRegistration<P: Platform> {
    platform: Arc<P>,
    irq: IrqNum,
    cookie: DeviceId,
}

impl<P: Platform> IrqRegistration<P> {
    /// Requests a threaded handler for `irq` on behalf of device `cookie`.
    pub fn request(platform: Arc<P>, irq: IrqNum, flags: Flags, name: &str, cookie: DeviceId) -> AxResult<Self> {
        platform
            .interrupts()
            .request_threaded_irq(irq, flags, name, cookie)?;
        Ok(Self {
            platform,
            irq,
            cookie,
        })
    }

    #[inline]
    pub fn irq(&self) -> IrqNum {
        self.irq
    }

    /// Disables the IRQ, waiting for a running handler to finish.
    pub fn disable(&self) {
        self.platform.interrupts().disable_irq(self.irq);
    }
}

impl<P: Platform> Drop for IrqRegistration<P> {
    fn drop(&mut self) {
        trace!("freeing irq {} of device {:?}", self.irq, self.cookie);
        self.platform.interrupts().free_irq(self.irq, self.cookie);
    }
}

impl<P: Platform> fmt::Debug for IrqRegistration<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IrqRegistration")
            .field("irq", &self.irq)
            .field("cookie", &self.cookie)
            .finish()
    }
}
