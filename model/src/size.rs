/*!

Conversions from Kubernetes quantity strings (e.g. `500Mi`, `1.5G`, `250m`) into the byte and
core counts that are recorded in machine attributes.

!*/

use crate::error::{self, Result};
use lazy_static::lazy_static;
use regex::Regex;
use snafu::{ensure, OptionExt};

lazy_static! {
    static ref MEMORY_SIZE: Regex = {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"^([0-9]+(?:\.[0-9]+)?)(?:[eE]([0-9]+)|([a-zA-Z]*))$").unwrap()
    };
    static ref CPU_SIZE: Regex = {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"^([0-9]+(?:\.[0-9]+)?)(m?)$").unwrap()
    };
}

/// Converts a memory quantity into a number of bytes. Decimal suffixes (`k`, `K`, `M`, `G`, `T`,
/// `P`, `E`) are powers of 1000, binary suffixes (`Ki`, `Mi`, ...) are powers of 1024 and an
/// `e<n>` exponent multiplies by `10^n`. Fractional bytes are truncated.
pub fn to_bytes<S: AsRef<str>>(value: S) -> Result<u64> {
    let value = value.as_ref().trim();
    ensure!(!value.is_empty(), error::EmptySizeSnafu { what: "memory" });
    let captures = MEMORY_SIZE
        .captures(value)
        .context(error::InvalidSizeSnafu {
            value,
            what: "memory size",
        })?;
    let number: f64 = captures[1].parse().ok().context(error::InvalidSizeSnafu {
        value,
        what: "memory size",
    })?;
    let multiplier = match (captures.get(2), captures.get(3)) {
        (Some(exponent), _) => {
            let exponent: i32 = exponent.as_str().parse().ok().context(
                error::InvalidSizeSnafu {
                    value,
                    what: "memory exponent",
                },
            )?;
            10f64.powi(exponent)
        }
        (None, Some(suffix)) => suffix_multiplier(value, suffix.as_str())?,
        (None, None) => 1.0,
    };
    let bytes = (number * multiplier).trunc();
    ensure!(
        bytes.is_finite() && bytes <= u64::MAX as f64,
        error::SizeOverflowSnafu {
            value,
            what: "64 bit byte count",
        }
    );
    Ok(bytes as u64)
}

/// Converts a cpu quantity into a number of cores, e.g. `250m` is `0.25` and `2` is `2.0`.
pub fn to_cores<S: AsRef<str>>(value: S) -> Result<f32> {
    let value = value.as_ref().trim();
    ensure!(!value.is_empty(), error::EmptySizeSnafu { what: "cpu" });
    let captures = CPU_SIZE.captures(value).context(error::InvalidSizeSnafu {
        value,
        what: "cpu size",
    })?;
    let number: f32 = captures[1].parse().ok().context(error::InvalidSizeSnafu {
        value,
        what: "cpu size",
    })?;
    let cores = if &captures[2] == "m" {
        number / 1000.0
    } else {
        number
    };
    ensure!(
        cores.is_finite(),
        error::SizeOverflowSnafu {
            value,
            what: "core count",
        }
    );
    Ok(cores)
}

fn suffix_multiplier(value: &str, suffix: &str) -> Result<f64> {
    let multiplier = match suffix {
        "" => 1.0,
        "k" | "K" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        "T" => 1e12,
        "P" => 1e15,
        "E" => 1e18,
        "Ki" => 1024.0,
        "Mi" => 1024f64.powi(2),
        "Gi" => 1024f64.powi(3),
        "Ti" => 1024f64.powi(4),
        "Pi" => 1024f64.powi(5),
        "Ei" => 1024f64.powi(6),
        _ => {
            return error::UnknownSizeSuffixSnafu { value, suffix }
                .fail()
                .map_err(Into::into)
        }
    };
    Ok(multiplier)
}
