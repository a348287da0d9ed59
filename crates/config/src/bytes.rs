// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Byte-quantity scalars like `20Mi` or `4M`.

use std::fmt;

use serde::de::{Error as DeError, Unexpected};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A byte count parsed from a quantity string or a plain integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ByteSize(pub u64);

const BINARY_SUFFIXES: [(&str, u64); 3] = [
    ("Gi", 1 << 30),
    ("Mi", 1 << 20),
    ("Ki", 1 << 10),
];

const DECIMAL_SUFFIXES: [(&str, u64); 3] = [
    ("G", 1_000_000_000),
    ("M", 1_000_000),
    ("K", 1_000),
];

impl ByteSize {
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty quantity".to_string());
        }
        for (suffix, scale) in BINARY_SUFFIXES.iter().chain(DECIMAL_SUFFIXES.iter()) {
            if let Some(num) = s.strip_suffix(suffix) {
                let n: u64 = num
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid quantity: {s}"))?;
                return Ok(ByteSize(n * scale));
            }
        }
        s.parse::<u64>()
            .map(ByteSize)
            .map_err(|_| format!("invalid quantity: {s}"))
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (suffix, scale) in BINARY_SUFFIXES {
            if self.0 >= scale && self.0 % scale == 0 {
                return write!(f, "{}{}", self.0 / scale, suffix);
            }
        }
        write!(f, "{}", self.0)
    }
}

impl Serialize for ByteSize {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ByteSize {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Scalar {
            Int(u64),
            Text(String),
        }
        match Scalar::deserialize(d)? {
            Scalar::Int(n) => Ok(ByteSize(n)),
            Scalar::Text(s) => ByteSize::parse(&s)
                .map_err(|e| D::Error::invalid_value(Unexpected::Str(&s), &e.as_str())),
        }
    }
}

#[cfg(test)]
#[path = "bytes_tests.rs"]
mod tests;
