//! Physical signal lines.

use axerrno::AxResult;

use crate::channel::{Channel, ChannelMap};
use crate::irq::IrqNum;

/// An acquired, exclusively owned signal line.
///
/// Dropping the value releases the line.
pub trait SignalLine: Send + Sync {
    /// Reads the current logical level. May sleep.
    fn get_value_cansleep(&self) -> AxResult<bool>;

    /// Translates the line into the interrupt it raises on edges.
    fn to_irq(&self) -> AxResult<IrqNum>;
}

/// Where a named line lives in the device's platform description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMapping {
    /// Name the line is requested by.
    pub name: &'static str,
    /// Index of the GPIO resource in the device's resource list.
    pub resource: u32,
    /// Pin index inside that resource.
    pub pin: u32,
    /// Whether the line is active-low.
    pub active_low: bool,
}

impl LineMapping {
    /// The mapping used by the reference platform description: one
    /// single-pin, active-high resource per channel, in channel order.
    pub const fn for_channel(channel: Channel) -> Self {
        Self {
            name: channel.line_name(),
            resource: channel.ordinal() as u32,
            pin: 0,
            active_low: false,
        }
    }

    /// Default mappings for every channel.
    pub fn defaults() -> ChannelMap<LineMapping> {
        ChannelMap::from_fn(Self::for_channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mappings() {
        let lines = LineMapping::defaults();
        assert_eq!(
            lines[Channel::DevicePower],
            LineMapping {
                name: "device_power",
                resource: 1,
                pin: 0,
                active_low: false,
            }
        );
        assert_eq!(lines[Channel::DevicePresence].resource, 2);
    }
}
