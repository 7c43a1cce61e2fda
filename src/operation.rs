//! Test operations, the instruction set of the interpreter

use serde::{ Deserialize, Serialize };
use std::fmt;

use crate::{
    board::{ IoPin, IoState, Level, Net, PullDown, Rail, Sink, Switch },
    range::Range,
    units::{ Base, Hertz, Microamp, Milli, Millivolt },
};

/// A statistic computed over a captured waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stat
{
    Min,
    Max,
    Avg,
    Frequency,
    /// `max - min`
    Amplitude,
}

impl Stat
{
    pub const ALL: [Stat; 5] = [Stat::Min, Stat::Max, Stat::Avg, Stat::Frequency, Stat::Amplitude];

    /// Script keyword
    pub fn keyword(&self) -> &'static str
    {
        match self {
            Self::Min => "min",
            Self::Max => "max",
            Self::Avg => "avg",
            Self::Frequency => "freq",
            Self::Amplitude => "amplitude",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OpKind
{
    /// Drive a net to a DC level
    SetSource { net: Net, millivolts: i32 },
    /// Start a periodic waveform on a net
    SetSignal { net: Net, hz: f32 },
    SetIo { pin: IoPin, state: IoState },
    SetPulldown { pulldown: PullDown, enabled: bool },
    /// Rail current within range, microamps
    CheckCurrent { rail: Rail, range: Range },
    /// Sink voltage within range, millivolts
    CheckPinVoltage { sink: Sink, range: Range },
    CheckIoLevel { pin: IoPin, expected: bool },
    /// Return every output of the bench to a neutral state
    Reset,
    StartScope { sink: Sink, sample_rate: u32, buffer_size: u32 },
    /// A statistic of the capture last started on `sink` within range
    CheckStat { stat: Stat, sink: Sink, range: Range },
    Delay { ms: u32 },
}

/// One instruction of a module's test sequence
///
/// A repeatable operation is retried for as long as it fails and the module stays fully powered,
/// which is what lets an operator turn a trimmer until a reading comes into range. A failure of a
/// non-repeatable operation ends the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Operation
{
    pub repeat: bool,
    pub kind: OpKind,
}

impl Operation
{
    pub fn new(kind: OpKind) -> Self
    {
        Self {
            repeat: false,
            kind: kind,
        }
    }

    /// Marks the operation as repeatable
    pub fn repeat(mut self) -> Self
    {
        self.repeat = true;
        self
    }

    /// Upper-case name used in reports and logs
    pub fn name(&self) -> &'static str
    {
        match self.kind {
            OpKind::SetSource { .. } => "SOURCE",
            OpKind::SetSignal { .. } => "SOURCE_SIG",
            OpKind::SetIo { .. } => "IO",
            OpKind::SetPulldown { .. } => "SINK_PD",
            OpKind::CheckCurrent { .. } => "CHECK_CURRENT",
            OpKind::CheckPinVoltage { .. } => "CHECK_PIN",
            OpKind::CheckIoLevel { .. } => "CHECK_IO",
            OpKind::Reset => "RESET",
            OpKind::StartScope { .. } => "SCOPE",
            OpKind::CheckStat { stat, .. } => match stat {
                Stat::Min => "CHECK_MIN",
                Stat::Max => "CHECK_MAX",
                Stat::Avg => "CHECK_AVG",
                Stat::Frequency => "CHECK_FREQ",
                Stat::Amplitude => "CHECK_AMPLITUDE",
            },
            OpKind::Delay { .. } => "DELAY",
        }
    }

    /// Formats a value measured by this operation with its unit
    pub fn display_measured(&self, value: i32) -> String
    {
        match self.kind {
            OpKind::CheckCurrent { .. } => format!("{}", Microamp::new(value).display::<Milli>()),
            OpKind::CheckPinVoltage { .. } => format!("{}", Millivolt::new(value).display::<Base>()),
            OpKind::CheckStat { stat: Stat::Frequency, .. } => format!("{}", Hertz::new(value)),
            OpKind::CheckStat { .. } => format!("{}", Millivolt::new(value).display::<Base>()),
            OpKind::CheckIoLevel { .. } => format!("{}", Level(value != 0)),
            _ => format!("{}", value),
        }
    }
}

impl From<OpKind> for Operation
{
    fn from(this: OpKind) -> Self
    {
        Self::new(this)
    }
}

/// Renders the operation as a script line that parses back to the same operation
impl fmt::Display for Operation
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self.kind {
            OpKind::SetSource { net, millivolts } => write!(f, "src {} {}", net, millivolts),
            OpKind::SetSignal { net, hz } => write!(f, "src_sig {} {}", net, hz),
            OpKind::SetIo { pin, state } => write!(f, "io {} {}", pin, state),
            OpKind::SetPulldown { pulldown, enabled } => write!(f, "pd {} {}", pulldown, Switch(enabled)),
            OpKind::CheckCurrent { rail, range } => write!(f, "i {} {}", rail, range),
            OpKind::CheckPinVoltage { sink, range } => write!(f, "v {} {}", sink, range),
            OpKind::CheckIoLevel { pin, expected } => write!(f, "iolevel {} {}", pin, Level(expected)),
            OpKind::Reset => f.write_str("reset"),
            OpKind::StartScope { sink, sample_rate, buffer_size } => {
                write!(f, "scope {} {} {}", sink, sample_rate, buffer_size)
            },
            OpKind::CheckStat { stat, sink, range } => write!(f, "{} {} {}", stat.keyword(), sink, range),
            OpKind::Delay { ms } => write!(f, "delay {}", ms),
        }?;

        if self.repeat {
            f.write_str(" +")
        }
        else {
            Ok(())
        }
    }
}
