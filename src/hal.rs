//! Hardware collaborator interfaces
//!
//! Nothing in this crate touches a peripheral directly. The interpreter, helpers and control loop
//! are handed a [`Bench`] (static I/O on the test bed) and a [`Scope`] (waveform acquisition) and
//! talk to the board only through them. Board support code implements these traits over the real
//! DACs, ADCs and expanders; tests implement them over plain data.
//!
//! All methods are synchronous. They are expected to return promptly: register writes, a filtered
//! ADC conversion, an expander read. Anything that takes wall-clock time, like waiting for a
//! capture to fill, is polled by the caller so that it can sleep cooperatively in between.

use serde::{ Deserialize, Serialize };

use crate::board::{ Indicator, IoPin, IoState, Net, PullDown, Rail, Sink };

/// Static electrical I/O of the test bed
pub trait Bench
{
    /// Voltage at a sink in millivolts
    fn read_voltage(&mut self, sink: Sink) -> i32;

    /// Current drawn from a rail in microamps
    ///
    /// The value is signed. Implementations subtracting a zero-current calibration offset should
    /// pass negative results through rather than clamp them, so drift stays visible in results.
    fn read_current(&mut self, rail: Rail) -> i32;

    /// Drive a net to a DC level in millivolts
    fn set_source(&mut self, net: Net, millivolts: i32);

    /// Start the periodic waveform generator on a net
    fn set_signal(&mut self, net: Net, hz: f32);

    /// Ask the waveform generator on a net to stop
    ///
    /// The generator runs from a timer callback, so it may take a little while to actually wind
    /// down. See [`Bench::signal_active`].
    fn stop_signal(&mut self, net: Net);

    /// Whether a waveform is still being generated on a net
    fn signal_active(&mut self, net: Net) -> bool;

    fn set_io(&mut self, pin: IoPin, state: IoState);

    /// Digital level currently seen on an IO line
    fn read_io(&mut self, pin: IoPin) -> bool;

    fn set_pulldown(&mut self, pulldown: PullDown, enabled: bool);

    /// Raw level of a rail's pass-through sense line
    ///
    /// This is the electrical level, not the interpretation: the -12V sense line reads low when
    /// the rail is connected. [`crate::power::RailMonitor`] takes care of that.
    fn read_rail_sense(&mut self, rail: Rail) -> bool;

    /// Raw state of the module ID encoder port; only the low five bits are meaningful
    fn read_module_id_bits(&mut self) -> u8;

    fn set_indicator(&mut self, indicator: Indicator, on: bool);
}

/// Statistics over the most recently captured waveform buffer
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScopeStats
{
    /// Millivolts
    pub min: i32,
    /// Millivolts
    pub max: i32,
    /// Millivolts
    pub avg: i32,
    /// Hertz, as computed for the sample rate the capture was started with
    pub frequency: f32,
}

/// Waveform acquisition and statistics engine
pub trait Scope
{
    /// Begin filling a buffer of `buffer_size` samples from `sink` at `sample_rate` samples per
    /// second. Returns whether the capture was accepted.
    fn start_capture(&mut self, sink: Sink, sample_rate: u32, buffer_size: u32) -> bool;

    fn is_ready(&mut self) -> bool;

    /// Statistics of the completed capture. Only meaningful once [`Scope::is_ready`] is true.
    fn stats(&mut self) -> ScopeStats;

    /// Abandon any capture in progress
    fn stop(&mut self);
}

impl <B: Bench + ?Sized> Bench for &mut B
{
    fn read_voltage(&mut self, sink: Sink) -> i32
    {
        (**self).read_voltage(sink)
    }

    fn read_current(&mut self, rail: Rail) -> i32
    {
        (**self).read_current(rail)
    }

    fn set_source(&mut self, net: Net, millivolts: i32)
    {
        (**self).set_source(net, millivolts)
    }

    fn set_signal(&mut self, net: Net, hz: f32)
    {
        (**self).set_signal(net, hz)
    }

    fn stop_signal(&mut self, net: Net)
    {
        (**self).stop_signal(net)
    }

    fn signal_active(&mut self, net: Net) -> bool
    {
        (**self).signal_active(net)
    }

    fn set_io(&mut self, pin: IoPin, state: IoState)
    {
        (**self).set_io(pin, state)
    }

    fn read_io(&mut self, pin: IoPin) -> bool
    {
        (**self).read_io(pin)
    }

    fn set_pulldown(&mut self, pulldown: PullDown, enabled: bool)
    {
        (**self).set_pulldown(pulldown, enabled)
    }

    fn read_rail_sense(&mut self, rail: Rail) -> bool
    {
        (**self).read_rail_sense(rail)
    }

    fn read_module_id_bits(&mut self) -> u8
    {
        (**self).read_module_id_bits()
    }

    fn set_indicator(&mut self, indicator: Indicator, on: bool)
    {
        (**self).set_indicator(indicator, on)
    }
}

impl <S: Scope + ?Sized> Scope for &mut S
{
    fn start_capture(&mut self, sink: Sink, sample_rate: u32, buffer_size: u32) -> bool
    {
        (**self).start_capture(sink, sample_rate, buffer_size)
    }

    fn is_ready(&mut self) -> bool
    {
        (**self).is_ready()
    }

    fn stats(&mut self) -> ScopeStats
    {
        (**self).stats()
    }

    fn stop(&mut self)
    {
        (**self).stop()
    }
}
