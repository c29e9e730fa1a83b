//! Composite identifiers
//!
//! Entities nested under a parent scope are addressed by
//! `<parent>/.../<entity>`. Each id type knows its arity, and parsing
//! rejects anything that doesn't split into exactly that many non-empty
//! parts.

use crate::error::{ProviderError, Result};
use std::fmt;
use std::str::FromStr;

pub const ID_SEPARATOR: char = '/';

/// Split an id into exactly `N` non-empty parts
pub fn split_id<const N: usize>(id: &str) -> Result<[&str; N]> {
    let invalid = || ProviderError::InvalidId {
        id: id.to_string(),
        expected: N,
    };

    let parts: Vec<&str> = id.split(ID_SEPARATOR).collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(invalid());
    }
    <[&str; N]>::try_from(parts).map_err(|_| invalid())
}

/// Reject parts that would not survive a format/parse round trip
fn check_part(part: &str, what: &str) -> Result<String> {
    if part.is_empty() || part.contains(ID_SEPARATOR) {
        return Err(ProviderError::validation(format!(
            "{} {:?} must be non-empty and must not contain '{}'",
            what, part, ID_SEPARATOR
        )));
    }
    Ok(part.to_string())
}

/// `<instance_id>/<monitor_id>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorId {
    pub instance_id: String,
    pub monitor_id: String,
}

impl MonitorId {
    pub fn new(instance_id: &str, monitor_id: &str) -> Result<Self> {
        Ok(Self {
            instance_id: check_part(instance_id, "instance id")?,
            monitor_id: check_part(monitor_id, "monitor id")?,
        })
    }
}

impl FromStr for MonitorId {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self> {
        let [instance_id, monitor_id] = split_id::<2>(s)?;
        Self::new(instance_id, monitor_id)
    }
}

impl fmt::Display for MonitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.instance_id, ID_SEPARATOR, self.monitor_id)
    }
}

/// `<instance_id>/<zone_id>/<glb_id>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlbId {
    pub instance_id: String,
    pub zone_id: String,
    pub glb_id: String,
}

impl GlbId {
    pub fn new(instance_id: &str, zone_id: &str, glb_id: &str) -> Result<Self> {
        Ok(Self {
            instance_id: check_part(instance_id, "instance id")?,
            zone_id: check_part(zone_id, "zone id")?,
            glb_id: check_part(glb_id, "load balancer id")?,
        })
    }
}

impl FromStr for GlbId {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self> {
        let [instance_id, zone_id, glb_id] = split_id::<3>(s)?;
        Self::new(instance_id, zone_id, glb_id)
    }
}

impl fmt::Display for GlbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}",
            self.instance_id,
            self.zone_id,
            self.glb_id,
            sep = ID_SEPARATOR
        )
    }
}

/// Single-part id of a top-level entity (VPN gateway, registry namespace)
pub fn parse_simple_id(id: &str) -> Result<&str> {
    let [single] = split_id::<1>(id)?;
    Ok(single)
}
