//! Integer physical quantities and their display
//!
//! Every quantity the test bed deals with is an integer count of some fixed sub-unit: the ADC
//! network reports millivolts, the current-sense amplifiers report microamps and the scope reports
//! whole hertz. Arithmetic is done on those integers only.
//! The types here exist so that reports and logs can print a value with a chosen prefix, e.g. a
//! `Microamp` of 2500 as `2.5mA`, without anybody converting through floating point.

use std::fmt::{ self, Write };

/// Defines a scalar prefix type for displaying units without changing the underlying value e.g.
/// "kilo-" or "micro-"
pub trait Scalar
{
    /// Return the power of 10 of this scalar
    ///
    /// For example, a prefix of "milli-" should return -3.
    fn magnitude() -> i32;

    /// Return this scalar's written shorthand notation
    ///
    /// For example, a prefix of "kilo-" should return "k"
    fn notation() -> &'static str;
}

macro_rules! impl_prefix
{
    { $name:ident, $magnitude:literal, $notation:literal } => {
        pub struct $name {}

        impl $name
        {
            pub const MAGNITUDE: i32 = $magnitude;
            pub const NOTATION: &'static str = $notation;
        }

        impl Scalar for $name
        {
            fn magnitude() -> i32
            {
                Self::MAGNITUDE
            }

            fn notation() -> &'static str
            {
                Self::NOTATION
            }
        }
    }
}

impl_prefix!{ Micro, -6, "u" }
impl_prefix!{ Milli, -3, "m" }
impl_prefix!{ Base, 0, "" }

pub struct UnitDisplay
{
    symbol: &'static str,
    notation: &'static str,
    /// Power of ten of the prefix being displayed
    magnitude: i32,
    /// Power of ten of one count of `value`
    native: i32,
    value: i64,
}

impl fmt::Display for UnitDisplay
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let shift = self.native - self.magnitude;
        let magnitude = self.value.unsigned_abs();

        if self.value < 0 {
            f.write_char('-')?;
        }

        // displaying in a smaller prefix than the native one never produces a fraction
        let (whole, mut fraction, mut divisor) = if shift >= 0 {
            (magnitude * 10u64.pow(shift as u32), 0, 1)
        }
        else {
            let divisor = 10u64.pow((-shift) as u32);
            (magnitude / divisor, magnitude % divisor, divisor)
        };

        write!(f, "{}", whole)?;

        if let Some(precision) = f.precision() {
            if precision != 0 {
                f.write_char('.')?;
            }

            for _index in 0..precision {
                if fraction == 0 || divisor <= 1 {
                    f.write_char('0')?;
                }
                else {
                    divisor /= 10;
                    let digit = fraction / divisor;
                    fraction = fraction % divisor;
                    f.write_char(char::from(b'0' + digit as u8))?;
                }
            }
        }
        else {
            if fraction != 0 {
                f.write_char('.')?;
            }
            while fraction != 0 {
                divisor /= 10;
                let digit = fraction / divisor;
                fraction = fraction % divisor;
                f.write_char(char::from(b'0' + digit as u8))?;
            }
        }

        f.write_str(self.notation)?;
        f.write_str(self.symbol)
    }
}

/// A voltage with millivolt resolution, as read back through the ADC sinks or driven on a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Millivolt
{
    value: i32,
}

/// A current with microamp resolution, as read from a rail's current-sense amplifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Microamp
{
    value: i32,
}

/// A frequency in whole hertz
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hertz
{
    value: i32,
}

macro_rules! impl_unit
{
    { $u:ident, $native:ident, $symbol:literal } => {
        impl $u
        {
            /// The written shorthand symbol
            pub const SYMBOL: &'static str = $symbol;

            pub const fn new(value: i32) -> Self
            {
                Self { value: value }
            }

            /// Displays the unit with a given scalar prefix
            pub fn display<S: Scalar>(&self) -> UnitDisplay
            {
                UnitDisplay {
                    symbol: Self::SYMBOL,
                    notation: S::notation(),
                    magnitude: S::magnitude(),
                    native: $native::MAGNITUDE,
                    value: self.value as i64,
                }
            }
        }

        impl fmt::Display for $u
        {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
            {
                fmt::Display::fmt(&self.display::<$native>(), f)
            }
        }
    }
}

impl_unit!{ Millivolt, Milli, "V" }
impl_unit!{ Microamp, Micro, "A" }
impl_unit!{ Hertz, Base, "Hz" }
