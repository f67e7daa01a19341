//! Single-threaded platform double for unit tests.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, Ordering};

use axerrno::{AxError, AxResult};
use spin::Mutex;

use crate::channel::{Channel, ChannelMap};
use crate::driver::DeviceId;
use crate::firmware::{AcpiObject, DsmTarget, Firmware};
use crate::gpio::{LineMapping, SignalLine};
use crate::irq::{Flags, InterruptController, IrqNum};
use crate::platform::Platform;

#[derive(Default)]
pub(crate) struct LineState {
    level: AtomicBool,
    fail_reads: AtomicBool,
    owned: AtomicBool,
}

pub(crate) struct MockLine {
    state: Arc<LineState>,
    irq: Option<IrqNum>,
}

impl SignalLine for MockLine {
    fn get_value_cansleep(&self) -> AxResult<bool> {
        if self.state.fail_reads.load(Ordering::SeqCst) {
            return Err(AxError::Io);
        }
        Ok(self.state.level.load(Ordering::SeqCst))
    }

    fn to_irq(&self) -> AxResult<IrqNum> {
        self.irq.ok_or(AxError::InvalidInput)
    }
}

impl Drop for MockLine {
    fn drop(&mut self) {
        self.state.owned.store(false, Ordering::SeqCst);
    }
}

pub(crate) struct MockPlatform {
    supported: Vec<Channel>,
    line_count: usize,
    missing_line: Option<Channel>,
    unmapped_irq: Option<Channel>,
    request_failure: Option<Channel>,
    lines: ChannelMap<Arc<LineState>>,
    responses: Mutex<BTreeMap<u64, Option<AcpiObject>>>,
    queried: Mutex<Vec<u64>>,
    calls: Mutex<Vec<(u64, u64)>>,
    requested: Mutex<BTreeMap<IrqNum, (Flags, String, DeviceId)>>,
    disabled: Mutex<Vec<IrqNum>>,
    freed: Mutex<Vec<IrqNum>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            supported: Channel::ALL.to_vec(),
            line_count: 3,
            missing_line: None,
            unmapped_irq: None,
            request_failure: None,
            lines: ChannelMap::default(),
            responses: Mutex::new(BTreeMap::new()),
            queried: Mutex::new(vec![]),
            calls: Mutex::new(vec![]),
            requested: Mutex::new(BTreeMap::new()),
            disabled: Mutex::new(vec![]),
            freed: Mutex::new(vec![]),
        }
    }

    pub fn irq_of(channel: Channel) -> IrqNum {
        IrqNum(40 + channel.ordinal() as u32)
    }

    pub fn with_supported(mut self, channels: &[Channel]) -> Self {
        self.supported = channels.to_vec();
        self
    }

    pub fn with_line_count(mut self, count: usize) -> Self {
        self.line_count = count;
        self
    }

    pub fn with_missing_line(mut self, channel: Channel) -> Self {
        self.missing_line = Some(channel);
        self
    }

    pub fn with_unmapped_irq(mut self, channel: Channel) -> Self {
        self.unmapped_irq = Some(channel);
        self
    }

    pub fn with_request_failure(mut self, channel: Channel) -> Self {
        self.request_failure = Some(channel);
        self
    }

    pub fn set_level(&self, channel: Channel, level: bool) {
        self.lines[channel].level.store(level, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, channel: Channel, fail: bool) {
        self.lines[channel].fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn respond(&self, channel: Channel, response: Option<AcpiObject>) {
        self.responses.lock().insert(channel.function_id(), response);
    }

    pub fn owned(&self, channel: Channel) -> bool {
        self.lines[channel].owned.load(Ordering::SeqCst)
    }

    pub fn queried(&self) -> Vec<u64> {
        self.queried.lock().clone()
    }

    pub fn calls(&self) -> Vec<(u64, u64)> {
        self.calls.lock().clone()
    }

    pub fn is_requested(&self, irq: IrqNum) -> bool {
        self.requested.lock().contains_key(&irq)
    }

    pub fn request_of(&self, irq: IrqNum) -> Option<(Flags, String, DeviceId)> {
        self.requested.lock().get(&irq).cloned()
    }

    pub fn disabled(&self) -> Vec<IrqNum> {
        self.disabled.lock().clone()
    }

    pub fn freed(&self) -> Vec<IrqNum> {
        self.freed.lock().clone()
    }

    fn channel_of_irq(irq: IrqNum) -> Option<Channel> {
        Channel::from_ordinal(irq.0.checked_sub(40)? as usize)
    }
}

impl Firmware for MockPlatform {
    fn check_dsm(&self, _target: &DsmTarget, functions: u64) -> bool {
        self.queried.lock().push(functions);
        self.supported
            .iter()
            .any(|channel| 1 << channel.function_id() == functions)
    }

    fn evaluate_dsm(&self, _target: &DsmTarget, function: u64, arg: AcpiObject) -> Option<AcpiObject> {
        let AcpiObject::Integer(value) = arg else {
            panic!("notification argument must be an integer");
        };
        self.calls.lock().push((function, value));
        self.responses
            .lock()
            .get(&function)
            .cloned()
            .unwrap_or(Some(AcpiObject::Buffer(vec![0])))
    }
}

impl InterruptController for MockPlatform {
    fn request_threaded_irq(&self, irq: IrqNum, flags: Flags, name: &str, cookie: DeviceId) -> AxResult {
        if self.request_failure.is_some() && Self::channel_of_irq(irq) == self.request_failure {
            return Err(AxError::ResourceBusy);
        }
        self.requested.lock().insert(irq, (flags, name.to_string(), cookie));
        Ok(())
    }

    fn disable_irq(&self, irq: IrqNum) {
        self.disabled.lock().push(irq);
    }

    fn free_irq(&self, irq: IrqNum, _cookie: DeviceId) {
        self.requested.lock().remove(&irq);
        self.freed.lock().push(irq);
    }
}

impl Platform for MockPlatform {
    type Line = MockLine;
    type Firmware = Self;
    type Interrupts = Self;
    type Relax = spin::relax::Spin;

    fn firmware(&self) -> &Self::Firmware {
        self
    }

    fn interrupts(&self) -> &Self::Interrupts {
        self
    }

    fn line_count(&self) -> usize {
        self.line_count
    }

    fn acquire_line(&self, mapping: &LineMapping) -> AxResult<MockLine> {
        let channel = Channel::ALL
            .into_iter()
            .find(|channel| channel.line_name() == mapping.name)
            .ok_or(AxError::NotFound)?;
        if self.missing_line == Some(channel) {
            return Err(AxError::NotFound);
        }

        let state = Arc::clone(&self.lines[channel]);
        if state.owned.swap(true, Ordering::SeqCst) {
            return Err(AxError::ResourceBusy);
        }
        Ok(MockLine {
            state,
            irq: (self.unmapped_irq != Some(channel)).then(|| Self::irq_of(channel)),
        })
    }
}
