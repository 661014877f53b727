//! Parser contract for turning raw object bytes into configuration data.

use std::collections::HashMap;

use crate::error::ParseError;

/// Flat key/value mapping consumed by the hosting configuration system.
pub type ConfigData = HashMap<String, String>;

/// Converts the raw bytes of a fetched object into a flat key/value map.
///
/// Implementations must be deterministic, side-effect free, and total over
/// arbitrary input: malformed payloads are a [`ParseError`], never a panic.
/// The provider never inspects the wire format itself; everything it knows
/// about the payload goes through this trait.
pub trait ObjectParser: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> Result<ConfigData, ParseError>;
}
