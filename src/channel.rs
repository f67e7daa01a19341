//! Monitored signal channels.
//!
//! Each channel is one physical signal line that firmware wants to hear
//! about. The set is fixed, so per-channel state lives in a [`ChannelMap`]
//! rather than in a dynamically sized collection.

use core::fmt;
use core::ops::{Index, IndexMut};

/// Number of monitored channels.
pub const CHANNEL_COUNT: usize = 3;

/// First firmware capability function used for IRQ notifications.
///
/// The function for a channel is `DSM_FN_IRQ_BASE + ordinal`.
pub const DSM_FN_IRQ_BASE: u64 = 0x03;

/// A logical monitoring channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Channel {
    /// Presence of the detachable base.
    BasePresence = 0,
    /// Power state of the discrete GPU.
    DevicePower = 1,
    /// Presence of the discrete GPU on the expansion bus.
    DevicePresence = 2,
}

impl Channel {
    /// All channels, in setup order.
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel::BasePresence,
        Channel::DevicePower,
        Channel::DevicePresence,
    ];

    /// Position of this channel in [`Channel::ALL`].
    #[inline]
    pub const fn ordinal(self) -> usize {
        self as usize
    }

    /// Firmware capability function that receives this channel's events.
    #[inline]
    pub const fn function_id(self) -> u64 {
        DSM_FN_IRQ_BASE + self as u64
    }

    /// Label used to resolve the physical signal line.
    pub const fn line_name(self) -> &'static str {
        match self {
            Channel::BasePresence => "base_presence",
            Channel::DevicePower => "device_power",
            Channel::DevicePresence => "device_presence",
        }
    }

    /// Looks up a channel by ordinal.
    pub const fn from_ordinal(ordinal: usize) -> Option<Self> {
        match ordinal {
            0 => Some(Channel::BasePresence),
            1 => Some(Channel::DevicePower),
            2 => Some(Channel::DevicePresence),
            _ => None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.line_name())
    }
}

/// Fixed-size map with exactly one entry per [`Channel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMap<T>([T; CHANNEL_COUNT]);

impl<T> ChannelMap<T> {
    /// Builds a map from entries in [`Channel::ALL`] order.
    pub const fn from_array(entries: [T; CHANNEL_COUNT]) -> Self {
        Self(entries)
    }

    /// Builds a map by calling `f` once per channel, in order.
    pub fn from_fn<F>(mut f: F) -> Self
    where
        F: FnMut(Channel) -> T,
    {
        Self(core::array::from_fn(|i| f(Channel::ALL[i])))
    }

    /// Consumes the map, transforming every entry.
    pub fn map<U, F>(self, f: F) -> ChannelMap<U>
    where
        F: FnMut(T) -> U,
    {
        ChannelMap(self.0.map(f))
    }

    /// Iterates over `(channel, entry)` pairs in channel order.
    pub fn iter(&self) -> impl Iterator<Item = (Channel, &T)> {
        Channel::ALL.into_iter().zip(self.0.iter())
    }
}

impl<T: Default> Default for ChannelMap<T> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}

impl<T> Index<Channel> for ChannelMap<T> {
    type Output = T;

    #[inline]
    fn index(&self, channel: Channel) -> &T {
        &self.0[channel.ordinal()]
    }
}

impl<T> IndexMut<Channel> for ChannelMap<T> {
    #[inline]
    fn index_mut(&mut self, channel: Channel) -> &mut T {
        &mut self.0[channel.ordinal()]
    }
}
