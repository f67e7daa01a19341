//! Firmware capability protocol.
//!
//! Notifications are delivered through a device-specific method (`_DSM`)
//! identified by a GUID and a revision. Each channel owns one function of
//! that method. The platform implements [`Firmware`]; the relay only talks
//! to it through [`DsmChannel`], which adds the request encoding and the
//! response validation.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// A firmware method GUID, in its mixed-endian textual layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl Guid {
    pub const fn new(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self {
            data1,
            data2,
            data3,
            data4,
        }
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.data4;
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            self.data1, self.data2, self.data3, d[0], d[1], d[2], d[3], d[4], d[5], d[6], d[7]
        )
    }
}

/// GUID of the hot-plug notification method: `5515a847-ed55-4b27-8352-cd320e10360a`.
pub const HOTPLUG_DSM_GUID: Guid = Guid::new(
    0x5515_a847,
    0xed55,
    0x4b27,
    [0x83, 0x52, 0xcd, 0x32, 0x0e, 0x10, 0x36, 0x0a],
);

/// Revision of the hot-plug notification method.
pub const HOTPLUG_DSM_REVISION: u64 = 1;

/// Identity of a firmware method: namespace GUID plus revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DsmTarget {
    pub guid: Guid,
    pub revision: u64,
}

impl Default for DsmTarget {
    fn default() -> Self {
        Self {
            guid: HOTPLUG_DSM_GUID,
            revision: HOTPLUG_DSM_REVISION,
        }
    }
}

/// Type tag of an [`AcpiObject`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Integer,
    String,
    Buffer,
    Package,
}

/// A value returned by (or passed to) a firmware method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcpiObject {
    Integer(u64),
    String(String),
    Buffer(Vec<u8>),
    Package(Vec<AcpiObject>),
}

impl AcpiObject {
    /// Returns the type tag of this object.
    pub fn object_type(&self) -> ObjectType {
        match self {
            AcpiObject::Integer(_) => ObjectType::Integer,
            AcpiObject::String(_) => ObjectType::String,
            AcpiObject::Buffer(_) => ObjectType::Buffer,
            AcpiObject::Package(_) => ObjectType::Package,
        }
    }
}

/// Platform firmware able to evaluate device-specific methods.
///
/// Both calls may sleep. Implementations are expected to be stateless
/// request/response; no ordering between different functions is assumed.
pub trait Firmware: Send + Sync {
    /// Returns `true` if every function whose bit is set in `functions` is
    /// implemented by the method identified by `target`.
    fn check_dsm(&self, target: &DsmTarget, functions: u64) -> bool;

    /// Evaluates `function` of the method identified by `target` with a
    /// single argument. Returns `None` if evaluation produced no object.
    fn evaluate_dsm(&self, target: &DsmTarget, function: u64, arg: AcpiObject) -> Option<AcpiObject>;
}

/// Reasons a forwarded notification was not acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardingError {
    /// The method returned nothing.
    NoResult,
    /// The method returned something other than a buffer.
    UnexpectedType(ObjectType),
    /// The buffer was not exactly one zero byte.
    UnexpectedValue { len: usize, status: Option<u8> },
}

impl fmt::Display for ForwardingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForwardingError::NoResult => write!(f, "no result"),
            ForwardingError::UnexpectedType(ty) => write!(f, "unexpected result type {:?}", ty),
            ForwardingError::UnexpectedValue { len, status } => {
                write!(f, "unexpected result value (len={}, status={:?})", len, status)
            }
        }
    }
}

/// Validates the reply of a notification call.
///
/// The only accepted reply is a buffer holding a single `0` byte.
pub fn check_response(response: Option<AcpiObject>) -> Result<(), ForwardingError> {
    let bytes = match response.ok_or(ForwardingError::NoResult)? {
        AcpiObject::Buffer(bytes) => bytes,
        other => return Err(ForwardingError::UnexpectedType(other.object_type())),
    };

    match bytes.as_slice() {
        [0] => Ok(()),
        _ => Err(ForwardingError::UnexpectedValue {
            len: bytes.len(),
            status: bytes.first().copied(),
        }),
    }
}

/// Narrow view of the notification method used by setup and relay.
pub struct DsmChannel<'a, F: Firmware + ?Sized> {
    firmware: &'a F,
    target: &'a DsmTarget,
}

impl<'a, F: Firmware + ?Sized> DsmChannel<'a, F> {
    pub fn new(firmware: &'a F, target: &'a DsmTarget) -> Self {
        Self { firmware, target }
    }

    /// Asks firmware whether `function` is implemented.
    pub fn query_capability(&self, function: u64) -> bool {
        function < u64::BITS as u64 && self.firmware.check_dsm(self.target, 1 << function)
    }

    /// Forwards a line level to `function` and validates the reply.
    pub fn invoke(&self, function: u64, value: bool) -> Result<(), ForwardingError> {
        let arg = AcpiObject::Integer(value as u64);
        check_response(self.firmware.evaluate_dsm(self.target, function, arg))
    }
}
