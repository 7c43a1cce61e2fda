//! Scriptable stand-ins for the bench and scope that record every call made to them

#![allow(dead_code)]

use std::collections::{ BTreeMap, VecDeque };

use microrack_tester::{
    board::{ Indicator, IoPin, IoState, Net, PullDown, Rail, Sink },
    power::PowerRailState,
    Bench,
    Scope,
    ScopeStats,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Call
{
    ReadVoltage(Sink),
    ReadCurrent(Rail),
    SetSource(Net, i32),
    SetSignal(Net, f32),
    StopSignal(Net),
    SetIo(IoPin, IoState),
    ReadIo(IoPin),
    SetPulldown(PullDown, bool),
    SetIndicator(Indicator, bool),
}

/// A bench whose readings come from per-channel queues
///
/// Each read takes the next queued value; once a queue is down to its last value that value is
/// returned forever. Unqueued channels read 0.
#[derive(Debug, Default)]
pub struct MockBench
{
    pub calls: Vec<Call>,
    pub voltages: BTreeMap<Sink, VecDeque<i32>>,
    pub currents: BTreeMap<Rail, VecDeque<i32>>,
    pub io_levels: BTreeMap<IoPin, bool>,
    /// Rail state seen by rail polls
    pub rails: Option<PowerRailState>,
    /// States taken one per rail poll before falling back to `rails`
    pub rail_script: VecDeque<PowerRailState>,
    pub rail_polls: usize,
    pub module_id_bits: u8,
    /// Nets with a waveform running and how many more `signal_active` calls they keep reporting
    /// it after being stopped
    pub signals: BTreeMap<Net, u32>,
    pub stopping: BTreeMap<Net, bool>,
}

impl MockBench
{
    pub fn new() -> Self
    {
        Self {
            rails: Some(PowerRailState::All),
            ..Self::default()
        }
    }

    pub fn with_voltages(mut self, sink: Sink, readings: &[i32]) -> Self
    {
        self.voltages.insert(sink, readings.iter().copied().collect());
        self
    }

    pub fn with_currents(mut self, rail: Rail, readings: &[i32]) -> Self
    {
        self.currents.insert(rail, readings.iter().copied().collect());
        self
    }

    pub fn with_rail_script(mut self, states: &[PowerRailState]) -> Self
    {
        self.rail_script = states.iter().copied().collect();
        self
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize
    {
        self.calls.iter().filter(|call| matches(call)).count()
    }

    fn next(queue: Option<&mut VecDeque<i32>>) -> i32
    {
        match queue {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(0),
            Some(queue) => queue.front().copied().unwrap_or(0),
            None => 0,
        }
    }

    fn rail_state(&self) -> PowerRailState
    {
        self.rails.unwrap_or(PowerRailState::None)
    }
}

impl Bench for MockBench
{
    fn read_voltage(&mut self, sink: Sink) -> i32
    {
        self.calls.push(Call::ReadVoltage(sink));
        Self::next(self.voltages.get_mut(&sink))
    }

    fn read_current(&mut self, rail: Rail) -> i32
    {
        self.calls.push(Call::ReadCurrent(rail));
        Self::next(self.currents.get_mut(&rail))
    }

    fn set_source(&mut self, net: Net, millivolts: i32)
    {
        self.calls.push(Call::SetSource(net, millivolts));
    }

    fn set_signal(&mut self, net: Net, hz: f32)
    {
        self.calls.push(Call::SetSignal(net, hz));
        self.signals.insert(net, 0);
        self.stopping.insert(net, false);
    }

    fn stop_signal(&mut self, net: Net)
    {
        self.calls.push(Call::StopSignal(net));
        self.stopping.insert(net, true);
    }

    fn signal_active(&mut self, net: Net) -> bool
    {
        let stopping = self.stopping.get(&net).copied().unwrap_or(false);

        match self.signals.get(&net).copied() {
            Some(0) if stopping => {
                self.signals.remove(&net);
                false
            },
            Some(remaining) => {
                if stopping {
                    self.signals.insert(net, remaining - 1);
                }
                true
            },
            None => false,
        }
    }

    fn set_io(&mut self, pin: IoPin, state: IoState)
    {
        self.calls.push(Call::SetIo(pin, state));
    }

    fn read_io(&mut self, pin: IoPin) -> bool
    {
        self.calls.push(Call::ReadIo(pin));
        self.io_levels.get(&pin).copied().unwrap_or(false)
    }

    fn set_pulldown(&mut self, pulldown: PullDown, enabled: bool)
    {
        self.calls.push(Call::SetPulldown(pulldown, enabled));
    }

    fn read_rail_sense(&mut self, rail: Rail) -> bool
    {
        if rail == Rail::P12V {
            self.rail_polls += 1;

            if let Some(state) = self.rail_script.pop_front() {
                self.rails = Some(state);
            }
        }

        let connected = match self.rail_state() {
            PowerRailState::All => true,
            PowerRailState::None => false,
            PowerRailState::Partial => rail != Rail::P5V,
        };

        // the -12V sense line is active low
        if rail == Rail::M12V { !connected } else { connected }
    }

    fn read_module_id_bits(&mut self) -> u8
    {
        self.module_id_bits
    }

    fn set_indicator(&mut self, indicator: Indicator, on: bool)
    {
        self.calls.push(Call::SetIndicator(indicator, on));
    }
}

/// A scope that becomes ready after a fixed number of `is_ready` polls
#[derive(Debug, Default)]
pub struct MockScope
{
    pub accept: bool,
    pub started: Vec<(Sink, u32, u32)>,
    pub stops: usize,
    /// `is_ready` polls left before the capture completes, `None` to never complete
    pub polls_until_ready: Option<u32>,
    pub ready_polls: u32,
    pub stats: ScopeStats,
}

impl MockScope
{
    pub fn new(stats: ScopeStats) -> Self
    {
        Self {
            accept: true,
            polls_until_ready: Some(0),
            stats: stats,
            ..Self::default()
        }
    }
}

impl Scope for MockScope
{
    fn start_capture(&mut self, sink: Sink, sample_rate: u32, buffer_size: u32) -> bool
    {
        self.started.push((sink, sample_rate, buffer_size));
        self.accept
    }

    fn is_ready(&mut self) -> bool
    {
        self.ready_polls += 1;

        match self.polls_until_ready.as_mut() {
            Some(0) => true,
            Some(remaining) => {
                *remaining -= 1;
                false
            },
            None => false,
        }
    }

    fn stats(&mut self) -> ScopeStats
    {
        self.stats
    }

    fn stop(&mut self)
    {
        self.stops += 1;
    }
}
