//! Acceptance ranges for measurements

use serde::{ Deserialize, Serialize };
use std::fmt;

/// An inclusive `[min, max]` acceptance window in a fixed integer unit
///
/// The unit is implied by where the range is used: millivolts for pin voltages, microamps for
/// rail currents, hertz for frequencies. `min <= max` always holds; the only way to build a range
/// is through [`Range::new`] which rejects inverted bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "(i32, i32)", into = "(i32, i32)")]
pub struct Range
{
    min: i32,
    max: i32,
}

impl Range
{
    pub const fn new(min: i32, max: i32) -> Option<Self>
    {
        if min <= max {
            Some(Self { min: min, max: max })
        }
        else {
            None
        }
    }

    pub const fn min(&self) -> i32
    {
        self.min
    }

    pub const fn max(&self) -> i32
    {
        self.max
    }

    /// Returns whether `value` lies within the range, both bounds included
    pub const fn contains(&self, value: i32) -> bool
    {
        self.min <= value && value <= self.max
    }
}

impl fmt::Display for Range
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{} {}", self.min, self.max)
    }
}

#[derive(Debug)]
pub struct InvertedRangeErr
{
    pub min: i32,
    pub max: i32,
}

impl fmt::Display for InvertedRangeErr
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "Range minimum {} is greater than its maximum {}", self.min, self.max)
    }
}

impl std::error::Error for InvertedRangeErr {}

impl TryFrom<(i32, i32)> for Range
{
    type Error = InvertedRangeErr;

    fn try_from((min, max): (i32, i32)) -> Result<Self, Self::Error>
    {
        Self::new(min, max).ok_or(InvertedRangeErr { min: min, max: max })
    }
}

impl From<Range> for (i32, i32)
{
    fn from(this: Range) -> Self
    {
        (this.min, this.max)
    }
}

/// Expected idle current draw of a module on each of the three supply rails, in microamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerRailsCurrentRanges
{
    pub p12v: Range,
    pub p5v: Range,
    pub m12v: Range,
}

/// Current windows used to tell which of two mutually exclusive indicator lines is the active one
///
/// When a module has a mode switch with one LED per position, sinking each LED line in turn draws
/// a different current from the rail depending on whether that LED is the lit one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeCurrentRanges
{
    pub active: Range,
    pub inactive: Range,
}
