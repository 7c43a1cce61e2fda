//! Ready-made measurements for module tests that need more than one operation's worth of logic
//!
//! These work directly on a [`Bench`] rather than through an operation table. A module with a
//! mode switch, for instance, can only be checked by comparing two current readings with each
//! other, which a table of independent range checks cannot express.

use log::{ debug, info, warn };
use serde::Serialize;
use std::time::Duration;

use crate::{
    board::{ IoPin, IoState, PullDown, Rail, Sink },
    hal::Bench,
    range::{ ModeCurrentRanges, PowerRailsCurrentRanges, Range },
};

/// Settling time after switching a pull-down load before reading its sink
pub const PULLDOWN_SETTLE: Duration = Duration::from_millis(10);
/// How long both indicator lines are held low before the individual readings
pub const MODE_PRIME: Duration = Duration::from_millis(1);
/// Settling time for the rail current after sinking an indicator line
pub const MODE_SETTLE: Duration = Duration::from_millis(10);

/// A single reading checked against a range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Check
{
    pub passed: bool,
    pub measured: i32,
}

impl Check
{
    pub fn against(range: Range, measured: i32) -> Self
    {
        Self {
            passed: range.contains(measured),
            measured: measured,
        }
    }
}

pub fn check_current<B: Bench + ?Sized>(bench: &mut B, rail: Rail, range: Range) -> Check
{
    Check::against(range, bench.read_current(rail))
}

/// Idle current on each rail, in the order +12V, +5V, -12V
pub fn check_rail_currents<B: Bench + ?Sized>(bench: &mut B, ranges: &PowerRailsCurrentRanges) -> [Check; 3]
{
    [
        check_current(bench, Rail::P12V, ranges.p12v),
        check_current(bench, Rail::P5V, ranges.p5v),
        check_current(bench, Rail::M12V, ranges.m12v),
    ]
}

pub fn test_pin_range<B: Bench + ?Sized>(bench: &mut B, sink: Sink, range: Range) -> Check
{
    Check::against(range, bench.read_voltage(sink))
}

/// Readings of a pulldown-capable sink without and with its load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PulldownCheck
{
    /// Load disabled
    pub hiz: Check,
    /// Load enabled
    pub loaded: Check,
}

impl PulldownCheck
{
    pub fn passed(&self) -> bool
    {
        self.hiz.passed && self.loaded.passed
    }
}

/// Checks the output behind a pull-down sink both unloaded and loaded
///
/// The load is left disabled afterwards regardless of the outcome.
pub async fn test_pin_pd<B: Bench + ?Sized>(bench: &mut B, pulldown: PullDown, hiz_range: Range, pd_range: Range)
    -> PulldownCheck
{
    let sink = pulldown.sink();

    bench.set_pulldown(pulldown, false);
    tokio::time::sleep(PULLDOWN_SETTLE).await;
    let hiz = Check::against(hiz_range, bench.read_voltage(sink));

    bench.set_pulldown(pulldown, true);
    tokio::time::sleep(PULLDOWN_SETTLE).await;
    let loaded = Check::against(pd_range, bench.read_voltage(sink));

    bench.set_pulldown(pulldown, false);
    debug!("{}: {} mV unloaded, {} mV loaded", pulldown, hiz.measured, loaded.measured);

    PulldownCheck {
        hiz: hiz,
        loaded: loaded,
    }
}

/// Which of the two indicator lines passed to [`test_mode`] belongs to the selected mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActiveLine
{
    /// `pin_a`
    First,
    /// `pin_b`
    Second,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModeReading
{
    /// Rail current while sinking `pin_a`, microamps
    pub first: i32,
    /// Rail current while sinking `pin_b`, microamps
    pub second: i32,
    /// Both lines read low after the priming pulse was released
    pub initial_levels_ok: bool,
    /// `None` when the readings do not single out one line or a line did not read low
    pub mode: Option<ActiveLine>,
}

impl ModeReading
{
    pub fn classify(first: i32, second: i32, ranges: &ModeCurrentRanges) -> Self
    {
        let mode = if ranges.active.contains(first) && ranges.inactive.contains(second) {
            Some(ActiveLine::First)
        }
        else if ranges.inactive.contains(first) && ranges.active.contains(second) {
            Some(ActiveLine::Second)
        }
        else {
            None
        };

        Self {
            first: first,
            second: second,
            initial_levels_ok: true,
            mode: mode,
        }
    }

    /// Discards the mode when a line was not low before the readings were taken
    pub fn with_initial_levels(mut self, ok: bool) -> Self
    {
        self.initial_levels_ok = ok;

        if !ok {
            self.mode = None;
        }

        self
    }
}

/// Determines which of two mutually exclusive mode indicator lines is lit
///
/// Both lines are pulled low briefly and released, then each is sunk on its own while the current
/// on `rail` is read. The lit line draws a current in `ranges.active`, the other one in
/// `ranges.inactive`. Either line reading high after the priming pulse means no mode. Both lines
/// are released on return.
pub async fn test_mode<B: Bench + ?Sized>(
    bench: &mut B,
    pin_a: IoPin,
    pin_b: IoPin,
    rail: Rail,
    ranges: &ModeCurrentRanges,
)
    -> ModeReading
{
    bench.set_io(pin_a, IoState::Low);
    bench.set_io(pin_b, IoState::Low);
    tokio::time::sleep(MODE_PRIME).await;
    bench.set_io(pin_a, IoState::HiZ);
    bench.set_io(pin_b, IoState::HiZ);

    let levels = (bench.read_io(pin_a), bench.read_io(pin_b));

    if levels != (false, false) {
        warn!("Mode lines {}/{} not low after priming: {:?}", pin_a, pin_b, levels);
    }

    let first = sink_and_read(bench, pin_a, rail).await;
    let second = sink_and_read(bench, pin_b, rail).await;
    let reading = ModeReading::classify(first, second, ranges).with_initial_levels(levels == (false, false));

    info!("Mode lines {}/{} on {}: {} uA / {} uA -> {:?}", pin_a, pin_b, rail, first, second, reading.mode);
    reading
}

/// Sinks one indicator line and reads the rail current once it settles
async fn sink_and_read<B: Bench + ?Sized>(bench: &mut B, pin: IoPin, rail: Rail) -> i32
{
    bench.set_io(pin, IoState::Low);
    tokio::time::sleep(MODE_SETTLE).await;
    let current = bench.read_current(rail);
    bench.set_io(pin, IoState::HiZ);

    current
}
