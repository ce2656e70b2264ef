//! Configuration type definitions

use serde::{Deserialize, Serialize};

use dmlink_hal::UartConfig;
use dmlink_protocol::{Checksum, FrameBuilder, ParserConfig};

use crate::select::InputSource;

/// Current binary configuration layout version
pub const CONFIG_VERSION: u8 = 1;

/// Maximum serialized config size (binary)
pub const MAX_CONFIG_SIZE: usize = 64;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Serialization failed (buffer too small)
    Serialize,
    /// Deserialization failed
    Deserialize,
    /// Config version mismatch
    VersionMismatch,
}

/// Input-select settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputSelectConfig {
    /// Adjuster id of the input selector on the DM board
    pub adjuster: u8,
    /// Adjuster value selecting the HDMI input
    pub hdmi_code: u8,
    /// Adjuster value selecting the DisplayPort input
    pub displayport_code: u8,
    /// Version queries sent after each switch request
    pub confirm_attempts: u8,
    /// Time to wait for each query's response
    pub response_timeout_ms: u16,
    /// Source assumed at startup
    pub initial: InputSource,
}

impl Default for InputSelectConfig {
    fn default() -> Self {
        Self {
            adjuster: 0x0A,
            hdmi_code: 27,
            displayport_code: 30,
            confirm_attempts: 3,
            response_timeout_ms: 100,
            initial: InputSource::Hdmi,
        }
    }
}

impl InputSelectConfig {
    /// Adjuster value for a source
    pub fn code_for(&self, source: InputSource) -> u8 {
        match source {
            InputSource::Hdmi => self.hdmi_code,
            InputSource::DisplayPort => self.displayport_code,
        }
    }
}

/// Link configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkConfig {
    /// Layout version (see [`CONFIG_VERSION`])
    pub version: u8,
    /// Address of the DM board
    pub node_address: u8,
    /// Checksum used for outbound packets (and inbound, if validated)
    pub checksum: Checksum,
    /// Verify the checksum byte of received frames
    pub validate_inbound: bool,
    /// Discard garbage when the receive ring saturates
    pub resync_on_full: bool,
    /// Serial port settings
    pub uart: UartConfig,
    /// Input-select settings
    pub input: InputSelectConfig,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            node_address: 0x01,
            checksum: Checksum::Xor8,
            validate_inbound: false,
            resync_on_full: true,
            uart: UartConfig::default(),
            input: InputSelectConfig::default(),
        }
    }
}

impl LinkConfig {
    /// Frame parser options implied by this configuration
    pub fn parser_config(&self) -> ParserConfig {
        ParserConfig {
            validate_checksum: self.validate_inbound.then_some(self.checksum),
        }
    }

    /// Packet builder using the configured checksum
    pub fn builder(&self) -> FrameBuilder {
        FrameBuilder::new(self.checksum)
    }

    /// Serialize into `buffer` with postcard
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, ConfigError> {
        let used = postcard::to_slice(self, buffer).map_err(|_| ConfigError::Serialize)?;
        Ok(used.len())
    }

    /// Deserialize from postcard bytes, rejecting other layout versions
    pub fn decode(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: LinkConfig =
            postcard::from_bytes(bytes).map_err(|_| ConfigError::Deserialize)?;

        if config.version != CONFIG_VERSION {
            return Err(ConfigError::VersionMismatch);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dmlink_hal::Parity;

    #[test]
    fn test_binary_roundtrip() {
        let mut config = LinkConfig::default();
        config.node_address = 7;
        config.checksum = Checksum::Crc8;
        config.uart.parity = Parity::Even;
        config.input.initial = InputSource::DisplayPort;

        let mut buffer = [0u8; MAX_CONFIG_SIZE];
        let len = config.encode(&mut buffer).unwrap();
        let decoded = LinkConfig::decode(&buffer[..len]).unwrap();

        assert_eq!(decoded, config);
    }

    #[test]
    fn test_version_mismatch() {
        let config = LinkConfig {
            version: 9,
            ..LinkConfig::default()
        };

        let mut buffer = [0u8; MAX_CONFIG_SIZE];
        let len = config.encode(&mut buffer).unwrap();
        assert_eq!(
            LinkConfig::decode(&buffer[..len]),
            Err(ConfigError::VersionMismatch)
        );
    }

    #[test]
    fn test_truncated_data() {
        let mut buffer = [0u8; MAX_CONFIG_SIZE];
        let len = LinkConfig::default().encode(&mut buffer).unwrap();
        assert_eq!(
            LinkConfig::decode(&buffer[..len - 3]),
            Err(ConfigError::Deserialize)
        );
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let mut buffer = [0u8; 2];
        assert_eq!(
            LinkConfig::default().encode(&mut buffer),
            Err(ConfigError::Serialize)
        );
    }

    #[test]
    fn test_parser_config_follows_validation_flag() {
        let mut config = LinkConfig::default();
        assert_eq!(config.parser_config().validate_checksum, None);

        config.validate_inbound = true;
        config.checksum = Checksum::Sum8;
        assert_eq!(config.parser_config().validate_checksum, Some(Checksum::Sum8));
    }

    #[test]
    fn test_code_for() {
        let input = InputSelectConfig::default();
        assert_eq!(input.code_for(InputSource::Hdmi), 27);
        assert_eq!(input.code_for(InputSource::DisplayPort), 30);
    }
}
