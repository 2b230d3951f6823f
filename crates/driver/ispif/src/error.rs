//! Controller error types.

use core::fmt;

use ispif_core::InterfaceLane;

/// A clock port operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockError {
    /// Name of the clock that failed.
    pub clock: &'static str,
}

impl fmt::Display for ClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "clock {} failed", self.clock)
    }
}

impl std::error::Error for ClockError {}

/// Errors returned by controller commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IspifError {
    /// INIT issued while the device is already powered up.
    AlreadyUp,
    /// A command other than INIT issued while the device is powered down.
    NotUp,
    /// A handle was released with no open handles outstanding.
    NotOpen,
    /// INIT carried an unknown raw version code.
    UnsupportedVersion(u32),
    /// A lane, VFE instance or CSID index is not valid for the active version.
    InvalidInterface,
    /// A routing request violates its structural invariants.
    InvalidRequest(&'static str),
    /// The lane was not idle when it was about to be configured.
    Busy(InterfaceLane),
    /// The hardware did not report reset completion in time.
    ResetTimeout,
    /// The lane did not report idle in time after a disable command.
    Timeout(InterfaceLane),
    /// Enabling the version's clock set failed.
    Clock(ClockError),
    /// The register window could not be mapped.
    Map,
    /// The interrupt handler could not be installed.
    Irq,
}

impl fmt::Display for IspifError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyUp => f.write_str("device already powered up"),
            Self::NotUp => f.write_str("device not powered up"),
            Self::NotOpen => f.write_str("no open handle to release"),
            Self::UnsupportedVersion(code) => write!(f, "unsupported version code {code}"),
            Self::InvalidInterface => f.write_str("interface not valid for this version"),
            Self::InvalidRequest(reason) => write!(f, "invalid routing request: {reason}"),
            Self::Busy(lane) => write!(f, "{lane} is busy"),
            Self::ResetTimeout => f.write_str("reset timed out"),
            Self::Timeout(lane) => write!(f, "{lane} did not go idle"),
            Self::Clock(err) => write!(f, "{err}"),
            Self::Map => f.write_str("register window mapping failed"),
            Self::Irq => f.write_str("interrupt request failed"),
        }
    }
}

impl std::error::Error for IspifError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Clock(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ClockError> for IspifError {
    fn from(err: ClockError) -> Self {
        Self::Clock(err)
    }
}
