//! Error taxonomy of the hot-plug relay.
//!
//! Setup errors ([`HotplugError::Resource`], [`HotplugError::Setup`]) abort
//! the whole device attach. Relay errors are logged by the handler and
//! dropped; nothing is retried. A channel that firmware does not support is
//! not an error at all.

use core::fmt;

use axerrno::AxError;

use crate::channel::Channel;
use crate::firmware::ForwardingError;
use crate::irq::IrqNum;

/// Errors produced by setup and relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotplugError {
    /// The platform declares no signal lines for the device.
    NoDevice,
    /// A signal line could not be acquired or translated to an IRQ.
    Resource { channel: Channel, source: AxError },
    /// The edge handler could not be registered.
    Setup { channel: Channel, source: AxError },
    /// The line level could not be read.
    Sampling { channel: Channel, source: AxError },
    /// Firmware did not acknowledge a notification.
    Forwarding { channel: Channel, reason: ForwardingError },
    /// An IRQ fired that belongs to none of the device's channels.
    UnknownIrq(IrqNum),
    /// The device context is being torn down.
    Removed,
}

/// Result type of setup and relay operations.
pub type HotplugResult<T = ()> = Result<T, HotplugError>;

impl fmt::Display for HotplugError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HotplugError::NoDevice => write!(f, "no signal lines declared"),
            HotplugError::Resource { channel, source } => {
                write!(f, "failed to acquire line {}: {:?}", channel, source)
            }
            HotplugError::Setup { channel, source } => {
                write!(f, "failed to request irq for {}: {:?}", channel, source)
            }
            HotplugError::Sampling { channel, source } => {
                write!(f, "failed to get gpio {}: {:?}", channel, source)
            }
            HotplugError::Forwarding { channel, reason } => {
                write!(f, "IRQ notification via DSM failed for {}: {}", channel, reason)
            }
            HotplugError::UnknownIrq(irq) => write!(f, "invalid IRQ number: {}", irq),
            HotplugError::Removed => write!(f, "device is being removed"),
        }
    }
}

impl From<HotplugError> for AxError {
    fn from(err: HotplugError) -> Self {
        match err {
            HotplugError::NoDevice => AxError::NotFound,
            HotplugError::Resource { source, .. }
            | HotplugError::Setup { source, .. }
            | HotplugError::Sampling { source, .. } => source,
            HotplugError::Forwarding { .. } => AxError::InvalidData,
            HotplugError::UnknownIrq(_) | HotplugError::Removed => AxError::BadState,
        }
    }
}
