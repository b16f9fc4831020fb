use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Score added for a word a label never emitted in training.
pub const DEFAULT_UNKNOWN_PENALTY: f64 = -1000.0;

/// How the decoder treats an active label that has no outgoing transitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DeadStatePolicy {
    /// Drop the label from the frontier.
    #[default]
    Skip,
    /// Let the label move to every known label with probability 1/L.
    Uniform,
}

impl FromStr for DeadStatePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "skip" => Ok(Self::Skip),
            "uniform" => Ok(Self::Uniform),
            _ => Err(Error::invalid_parameter("dead_state", format!("expected skip or uniform, got {s:?}"))),
        }
    }
}

impl Display for DeadStatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skip => write!(f, "skip"),
            Self::Uniform => write!(f, "uniform"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Emission score used when a (label, word) pair was never observed.
    pub unknown_penalty: f64,
    /// Lower-case words before counting. Training only: the model stores
    /// the setting and decoding always follows it.
    pub lowercase: bool,
    pub dead_state: DeadStatePolicy,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            unknown_penalty: DEFAULT_UNKNOWN_PENALTY,
            lowercase: true,
            dead_state: DeadStatePolicy::default(),
        }
    }
}

impl Params {
    /// Sets a parameter by name, e.g. `set("unknown_penalty", "-50")`.
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "unknown_penalty" => {
                let v: f64 = value
                    .parse()
                    .map_err(|_| Error::invalid_parameter(name, format!("expected a number, got {value:?}")))?;
                check_penalty(v)?;
                self.unknown_penalty = v;
            }
            "lowercase" => {
                self.lowercase = match value {
                    "1" | "true" => true,
                    "0" | "false" => false,
                    _ => return Err(Error::invalid_parameter(name, format!("expected a boolean, got {value:?}"))),
                };
            }
            "dead_state" => self.dead_state = value.parse()?,
            _ => return Err(Error::invalid_parameter(name, "no such parameter")),
        }
        log::debug!("set {name} = {value}");
        Ok(())
    }

    /// Checks values that may have been set through the public fields.
    pub fn validate(&self) -> Result<()> {
        check_penalty(self.unknown_penalty)
    }

    /// Applies `name=value` pairs in order.
    pub fn parse_pairs<S: AsRef<str>>(&mut self, pairs: &[S]) -> Result<()> {
        for pair in pairs {
            let pair = pair.as_ref();
            let (name, value) = pair
                .split_once('=')
                .ok_or_else(|| Error::invalid_parameter(pair, "expected name=value"))?;
            self.set(name.trim(), value.trim())?;
        }
        Ok(())
    }
}

fn check_penalty(v: f64) -> Result<()> {
    if !v.is_finite() || v > 0.0 {
        return Err(Error::invalid_parameter("unknown_penalty", "must be finite and not positive"));
    }
    Ok(())
}

impl Display for Params {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown_penalty={}, lowercase={}, dead_state={}",
            self.unknown_penalty, self.lowercase, self.dead_state
        )
    }
}
