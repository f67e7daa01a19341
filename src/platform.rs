//! Platform services a hot-plug device context is built on.

use axerrno::AxResult;
use spin::relax::RelaxStrategy;

use crate::firmware::Firmware;
use crate::gpio::{LineMapping, SignalLine};
use crate::irq::InterruptController;

/// Everything the platform provides for one attached device: its firmware
/// methods, its declared signal lines and the interrupt controller.
///
/// A device context keeps an `Arc` of its platform for its whole lifetime.
pub trait Platform: Send + Sync + 'static {
    /// Line handle handed out by [`Platform::acquire_line`].
    type Line: SignalLine;
    type Firmware: Firmware;
    type Interrupts: InterruptController;
    /// How to wait while a channel lock or teardown is held up by a
    /// firmware call. `spin::relax::Spin` on bare metal; a platform with a
    /// scheduler should yield instead.
    type Relax: RelaxStrategy;

    fn firmware(&self) -> &Self::Firmware;

    fn interrupts(&self) -> &Self::Interrupts;

    /// Number of signal line resources the platform description declares
    /// for the device.
    fn line_count(&self) -> usize;

    /// Acquires exclusive ownership of the line described by `mapping`.
    ///
    /// # Errors
    ///
    /// Fails if the line does not exist or is already owned.
    fn acquire_line(&self, mapping: &LineMapping) -> AxResult<Self::Line>;
}
