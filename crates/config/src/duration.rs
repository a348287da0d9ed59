// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Duration scalars: integer seconds, float seconds, or a compound
//! suffixed string like `"2m10s"`.

use std::time::Duration;

/// Parse a duration string: one or more `<number><unit>` groups where the
/// unit is `ms`, `s`, `m`, `h` or `d`. A bare trailing number is seconds.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let digits_end = rest
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit() && *c != '.')
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        if digits_end == 0 {
            return Err(format!("invalid duration: {s}"));
        }
        let (num_str, tail) = rest.split_at(digits_end);
        let num: f64 = num_str
            .parse()
            .map_err(|_| format!("invalid number in duration: {s}"))?;

        let unit_end = tail
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_end);

        let part = match unit {
            "ms" => Duration::from_secs_f64(num / 1000.0),
            "" | "s" => Duration::from_secs_f64(num),
            "m" => Duration::from_secs_f64(num * 60.0),
            "h" => Duration::from_secs_f64(num * 3600.0),
            "d" => Duration::from_secs_f64(num * 86400.0),
            other => return Err(format!("unknown duration suffix: {other}")),
        };
        total += part;
        rest = next;
    }
    Ok(total)
}

/// Compact rendering: `130s` becomes `2m10s`, `500ms` stays `500ms`.
/// Sub-millisecond remainders are dropped.
pub fn format_duration(d: Duration) -> String {
    let mut millis = d.as_millis();
    if millis == 0 {
        return "0s".to_string();
    }
    let mut out = String::new();
    for (unit, scale) in [("h", 3_600_000u128), ("m", 60_000), ("s", 1_000), ("ms", 1)] {
        let n = millis / scale;
        if n > 0 {
            out.push_str(&format!("{n}{unit}"));
            millis -= n * scale;
        }
    }
    out
}

/// Serde bridge for duration-valued config keys.
pub mod serde_duration {
    use super::*;
    use serde::de::{Deserializer, Error, Unexpected};
    use serde::ser::Serializer;
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Int(u64),
        Float(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        match Scalar::deserialize(d)? {
            Scalar::Int(secs) => Ok(Duration::from_secs(secs)),
            Scalar::Float(secs) if secs >= 0.0 => Ok(Duration::from_secs_f64(secs)),
            Scalar::Float(secs) => Err(D::Error::invalid_value(
                Unexpected::Float(secs),
                &"a non-negative number of seconds",
            )),
            Scalar::Text(s) => parse_duration(&s)
                .map_err(|e| D::Error::invalid_value(Unexpected::Str(&s), &e.as_str())),
        }
    }

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_duration(*d))
    }

    /// For `Option<Duration>` fragment fields.
    pub mod option {
        use super::*;

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
            super::deserialize(d).map(Some)
        }

        #[allow(clippy::ref_option)]
        pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
            match d {
                Some(d) => super::serialize(d, s),
                None => s.serialize_none(),
            }
        }
    }
}

#[cfg(test)]
#[path = "duration_tests.rs"]
mod tests;
