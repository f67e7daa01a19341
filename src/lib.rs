#![no_std]

//! # Out-of-band Hot-plug Relay
//!
//! This crate relays hot-plug signals of a power-gated, detachable discrete
//! GPU to platform firmware. When the GPU is fully powered off it cannot
//! raise bus-level hot-plug interrupts itself; dedicated signal lines
//! report base presence, GPU power and GPU presence instead, and firmware
//! must be told about every change so it can drive the bus.
//!
//! It is designed for `no_std` environments and uses the `alloc` crate for
//! dynamic memory allocation.
//!
//! ## Architecture
//!
//! ### Channel Model
//! - [`Channel`]: The three monitored signals and their firmware function ids
//! - [`ChannelMap`]: Fixed-size per-channel storage
//!
//! ### Device Context
//! - [`HotplugDevice`]: Setup, relay and teardown for one attached device
//! - [`ContextLifecycle`]: Active/Removing/Removed with in-flight relay tracking
//! - [`RelayStats`]: Per-channel counters
//!
//! ### Platform Seams
//! - [`Firmware`]: Evaluates the notification method ([`DsmChannel`] wraps it)
//! - [`SignalLine`]: A sampled, IRQ-capable signal line
//! - [`InterruptController`]: Threaded IRQ requests
//! - [`Platform`]: Bundles the above for one device
//!
//! ### Driver
//! - [`HotplugDriver`]: Identity match, probe/remove, IRQ dispatch
//!
//! ## Concurrency
//!
//! Every edge is handled in a worker that may sleep. Each channel has its
//! own lock held across the line read and the firmware call, so a channel
//! never has two notifications in flight while different channels proceed
//! independently. There is no lock shared by all channels.
//!
//! The channel lock stays held while firmware runs, so waiters poll and
//! relax through [`Platform::Relax`]: a spin hint on bare metal, a yield
//! where a scheduler exists.
//!
//! ## Example
//!
//! ```rust,ignore
//! use axhotplug::{HotplugDriver, IrqNum};
//!
//! let driver = HotplugDriver::default();
//! if driver.matches(hid) {
//!     let id = driver.probe(platform)?;
//!
//!     // From the threaded-IRQ worker:
//!     driver.dispatch(cookie, IrqNum(irq));
//!
//!     // On detach:
//!     driver.remove(id)?;
//! }
//! ```

extern crate alloc;
#[macro_use]
extern crate log;

mod channel;
mod config;
mod device;
mod driver;
mod error;
mod firmware;
mod gpio;
mod irq;
mod lifecycle;
mod platform;
mod stats;

#[cfg(test)]
mod mock;

pub use channel::{CHANNEL_COUNT, Channel, ChannelMap, DSM_FN_IRQ_BASE};
pub use config::{HOTPLUG_ACPI_IDS, HotplugConfig};
pub use device::HotplugDevice;
pub use driver::{DeviceId, HotplugDriver};
pub use error::{HotplugError, HotplugResult};
pub use firmware::{
    AcpiObject, DsmChannel, DsmTarget, Firmware, ForwardingError, Guid, HOTPLUG_DSM_GUID,
    HOTPLUG_DSM_REVISION, ObjectType, check_response,
};
pub use gpio::{LineMapping, SignalLine};
pub use irq::{Flags, IRQ_NAME_LEN, InterruptController, IrqNum, IrqRegistration, IrqReturn, irq_name};
pub use lifecycle::{ContextLifecycle, ContextState, RelayGuard};
pub use platform::Platform;
pub use stats::{DeviceStats, RelayStats};

pub use spin::relax::{RelaxStrategy, Spin};
