use crate::channel::ChannelMap;
use crate::firmware::DsmTarget;
use crate::gpio::LineMapping;

/// Firmware identities the driver binds to.
pub const HOTPLUG_ACPI_IDS: &[&str] = &["MSHW0153"];

/// The static configuration of a hot-plug device context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotplugConfig {
    /// The notification method
    pub dsm: DsmTarget,
    /// Line resource mapping, one entry per channel
    pub lines: ChannelMap<LineMapping>,
    /// Identity strings matched on attach
    pub acpi_ids: &'static [&'static str],
}

/// The implemention for HotplugConfig
impl HotplugConfig {
    /// The new function for HotplugConfig
    pub fn new(dsm: DsmTarget, lines: ChannelMap<LineMapping>) -> Self {
        Self {
            dsm,
            lines,
            acpi_ids: HOTPLUG_ACPI_IDS,
        }
    }

    /// Whether `hid` names a device this configuration applies to.
    pub fn matches(&self, hid: &str) -> bool {
        self.acpi_ids.iter().any(|id| id.eq_ignore_ascii_case(hid))
    }
}

impl Default for HotplugConfig {
    fn default() -> Self {
        Self::new(DsmTarget::default(), LineMapping::defaults())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channel;
    use crate::firmware::HOTPLUG_DSM_REVISION;

    #[test]
    fn test_default_config() {
        let config = HotplugConfig::default();
        assert_eq!(config.dsm.revision, HOTPLUG_DSM_REVISION);
        assert_eq!(config.lines[Channel::BasePresence].name, "base_presence");
        assert!(config.matches("MSHW0153"));
        assert!(!config.matches("MSHW0154"));
    }
}
