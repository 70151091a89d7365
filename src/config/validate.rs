// src/config/validate.rs

use std::collections::BTreeSet;
use std::time::Duration;

use tracing::debug;

use crate::config::model::{Config, RawConfig};
use crate::errors::{Result, WatchfError};
use crate::types::EventName;
use crate::watch::filter::{EventMask, PatternFilter};

impl TryFrom<RawConfig> for Config {
    type Error = crate::errors::WatchfError;

    fn try_from(raw: RawConfig) -> std::result::Result<Self, Self::Error> {
        let mask = parse_event_mask(&raw.events)?;
        let pattern = PatternFilter::new(&raw.include_pattern)?;
        let min_interval = parse_duration(&raw.interval)?;
        let stabilize_timeout = raw
            .stabilize_timeout
            .as_deref()
            .map(parse_duration)
            .transpose()?;

        Ok(Config::new_unchecked(
            raw.recursive,
            mask,
            pattern,
            raw.commands,
            min_interval,
            raw.continue_on_error,
            stabilize_timeout,
        ))
    }
}

/// Validate a list of event names and turn it into an [`EventMask`].
///
/// Names are case-insensitive. `all` selects every event kind. An empty list
/// or an unknown name is rejected.
pub fn parse_event_mask<S: AsRef<str>>(events: &[S]) -> Result<EventMask> {
    if events.is_empty() {
        return Err(WatchfError::NoEvents);
    }

    let mut names = BTreeSet::new();
    let mut contains_all = false;

    for event in events {
        let lowered = event.as_ref().trim().to_lowercase();
        if lowered == "all" {
            contains_all = true;
            continue;
        }
        let name = lowered
            .parse::<EventName>()
            .map_err(|_| WatchfError::UnknownEvent(lowered.clone()))?;
        names.insert(name);
    }

    let mask = if contains_all {
        EventMask::all()
    } else {
        EventMask::from_names(names)
    };
    debug!(%mask, "validated watch events");
    Ok(mask)
}

/// Parse a duration such as `"20ms"`, `"1.5s"`, `"1m30s"` or `"0"`.
///
/// The input is one or more `<number><unit>` segments, where the number may
/// carry a decimal fraction. Supported units: `ns`, `us`, `ms`, `s`, `m`, `h`.
/// A bare `0` is accepted as "no duration".
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return Err(WatchfError::InvalidDuration(
            "empty duration string".to_string(),
        ));
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let invalid = |reason: String| WatchfError::InvalidDuration(format!("'{s}': {reason}"));
    let mut total: u128 = 0;
    let mut rest = s;

    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(num_len);
        if number.is_empty() {
            return Err(invalid("expected a number".to_string()));
        }

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_len);
        let unit_nanos: u128 = match unit.to_lowercase().as_str() {
            "ns" => 1,
            "us" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60_000_000_000,
            "h" => 3_600_000_000_000,
            "" => return Err(invalid(format!("'{number}' is missing a unit suffix"))),
            other => {
                return Err(invalid(format!(
                    "unsupported unit '{other}'; expected ns, us, ms, s, m or h"
                )));
            }
        };

        total = total.saturating_add(segment_nanos(number, unit_nanos).map_err(invalid)?);
        rest = next;
    }

    Ok(Duration::from_nanos(u64::try_from(total).unwrap_or(u64::MAX)))
}

/// `number` (digits with at most one `.`) scaled by `unit_nanos`.
fn segment_nanos(number: &str, unit_nanos: u128) -> std::result::Result<u128, String> {
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if (whole.is_empty() && fraction.is_empty()) || fraction.contains('.') {
        return Err(format!("invalid number '{number}'"));
    }

    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|e| format!("invalid number '{number}': {e}"))?
    };
    let mut nanos = whole.saturating_mul(unit_nanos);

    // Digits beyond nanosecond precision are dropped.
    let mut scale = unit_nanos;
    for digit in fraction.bytes() {
        scale /= 10;
        if scale == 0 {
            break;
        }
        nanos = nanos.saturating_add(u128::from(digit - b'0') * scale);
    }
    Ok(nanos)
}
