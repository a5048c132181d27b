//! MIDI input selection rules.
//!
//! Device names come from the operating system's MIDI stack and are opaque to
//! PageTurn: we never generate them, only match against them.  Two matching
//! rules live here:
//!
//! - [`resolve_device_name`]: used when a viewer asks to switch input.
//!   Exact match first, then a case-insensitive substring match.
//! - [`select_initial_device`]: used once at startup to pick an input without
//!   any viewer involvement.  The order of its fallbacks encodes how common
//!   virtual MIDI drivers name their ports and must not be reordered.

use serde::{Deserialize, Serialize};

/// Default token identifying the preferred virtual driver port.
pub const DEFAULT_PREFERRED_TOKEN: &str = "Bus 2";

/// Default token identifying any port of the macOS IAC driver.
pub const DEFAULT_FALLBACK_TOKEN: &str = "IAC";

/// Snapshot of the server's device state, as shown to viewers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// Input names in registry order.
    pub available: Vec<String>,
    /// Canonical name of the connected input, if any.
    pub connected: Option<String>,
}

/// Name tokens consulted by the startup selection policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePreference {
    /// Checked first: a port whose name contains this token.
    pub preferred_token: String,
    /// Checked second: a port whose name contains this token.
    pub fallback_token: String,
}

impl Default for DevicePreference {
    fn default() -> Self {
        Self {
            preferred_token: DEFAULT_PREFERRED_TOKEN.to_string(),
            fallback_token: DEFAULT_FALLBACK_TOKEN.to_string(),
        }
    }
}

/// Resolves a viewer-supplied name to one of the `available` device names.
///
/// An exact match wins; otherwise the first name that contains `requested`
/// case-insensitively is returned.  An empty request never matches.
///
/// # Examples
///
/// ```rust
/// use pageturn_core::resolve_device_name;
///
/// let ports = vec!["IAC Driver Bus 1".to_string(), "USB MIDI".to_string()];
/// assert_eq!(resolve_device_name("usb", &ports), Some("USB MIDI"));
/// assert_eq!(resolve_device_name("Nope", &ports), None);
/// ```
pub fn resolve_device_name<'a>(requested: &str, available: &'a [String]) -> Option<&'a str> {
    if requested.trim().is_empty() {
        return None;
    }
    if let Some(exact) = available.iter().find(|name| name.as_str() == requested) {
        return Some(exact.as_str());
    }
    find_case_insensitive(requested, available)
}

/// Picks the device to open at startup.
///
/// Priority, evaluated once:
///
/// 1. `hint` (the launch argument), if it substring-matches a device
///    case-insensitively.
/// 2. A device whose name contains `preference.preferred_token`.
/// 3. A device whose name contains `preference.fallback_token`.
/// 4. The first device in registry order.
/// 5. Nothing: the server stays idle.
pub fn select_initial_device(
    hint: Option<&str>,
    available: &[String],
    preference: &DevicePreference,
) -> Option<String> {
    let hint = hint.map(str::trim).filter(|h| !h.is_empty());

    if let Some(hint) = hint {
        match find_case_insensitive(hint, available) {
            Some(name) => return Some(name.to_string()),
            None => tracing::warn!(
                "requested MIDI input \"{hint}\" not found; available inputs: {available:?}"
            ),
        }
    }

    let by_token = |token: &str| {
        if token.is_empty() {
            return None;
        }
        available.iter().find(|name| name.contains(token))
    };

    by_token(&preference.preferred_token)
        .or_else(|| by_token(&preference.fallback_token))
        .or_else(|| {
            let first = available.first();
            if let Some(name) = first {
                tracing::info!("no preferred driver found; defaulting to first input: {name}");
            }
            first
        })
        .cloned()
}

fn find_case_insensitive<'a>(needle: &str, available: &'a [String]) -> Option<&'a str> {
    let needle = needle.to_lowercase();
    available
        .iter()
        .find(|name| name.to_lowercase().contains(&needle))
        .map(String::as_str)
}
