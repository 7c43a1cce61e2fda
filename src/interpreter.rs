//! Execution of a module's operation table against the bench
//!
//! The interpreter walks the operations in order, performing each one and recording its outcome
//! in the slot of the results buffer with the same index. A failing operation ends the sequence
//! unless it is marked repeatable, in which case it is attempted again until it passes. Repeating
//! stops early if the module starts coming out of the socket: the rails are polled after every
//! failed attempt and anything short of [`PowerRailState::All`] interrupts the sequence.
//!
//! Every wait is a tokio sleep, so a sequence can share a current-thread runtime with anything
//! else the station does.

use log::{ debug, info, warn };
use std::{ fmt, time::Duration };
use tokio::time::{ sleep, Instant };

use crate::{
    board::{ IoPin, IoState, Net, PullDown, Sink },
    config::{ FrequencyScaling, StationConfig },
    hal::{ Bench, Scope },
    operation::{ OpKind, Operation, Stat },
    power::{ PowerRailState, RailMonitor },
    results::TestResult,
};

/// Polling period while waiting for the waveform generator to wind down
const SIGNAL_STOP_POLL: Duration = Duration::from_millis(1);

/// How a run through an operation table ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceOutcome
{
    /// Every operation passed
    Passed,
    /// The operation at `index` failed and was not repeatable
    Failed
    {
        index: usize,
    },
    /// The repeatable operation at `index` was still failing when the rails dropped
    Interrupted
    {
        index: usize,
    },
}

impl SequenceOutcome
{
    pub fn is_passed(&self) -> bool
    {
        *self == Self::Passed
    }

    /// Index of the operation the sequence stopped at, if it did not pass
    pub fn index(&self) -> Option<usize>
    {
        match self {
            Self::Passed => None,
            Self::Failed { index } | Self::Interrupted { index } => Some(*index),
        }
    }
}

impl fmt::Display for SequenceOutcome
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Self::Passed => f.write_str("passed"),
            Self::Failed { index } => write!(f, "failed at operation {}", index + 1),
            Self::Interrupted { index } => write!(f, "interrupted at operation {}", index + 1),
        }
    }
}

/// Runs operations against a bench and scope
///
/// Owns its collaborators for the duration of a test. Pass `&mut` references as `B` and `S` to
/// keep ownership outside, both traits are implemented for them.
pub struct Interpreter<B, S>
{
    bench: B,
    scope: S,
    config: StationConfig,
    /// Sink of the capture started in the current sequence, if any
    capture: Option<Sink>,
}

impl <B, S> Interpreter<B, S>
    where B: Bench,
          S: Scope
{
    pub fn new(bench: B, scope: S, config: StationConfig) -> Self
    {
        Self {
            bench: bench,
            scope: scope,
            config: config,
            capture: None,
        }
    }

    pub fn bench(&self) -> &B
    {
        &self.bench
    }

    pub fn bench_mut(&mut self) -> &mut B
    {
        &mut self.bench
    }

    pub fn scope(&self) -> &S
    {
        &self.scope
    }

    pub fn scope_mut(&mut self) -> &mut S
    {
        &mut self.scope
    }

    pub fn config(&self) -> &StationConfig
    {
        &self.config
    }

    pub fn into_parts(self) -> (B, S)
    {
        (self.bench, self.scope)
    }

    /// Runs `operations` in order, recording each attempt in the slot of `results` at the same
    /// index
    ///
    /// `results` must have at least as many slots as there are operations; slots beyond the last
    /// operation are left untouched. A shorter buffer fails the sequence at its first missing slot
    /// before anything runs. The buffer is not reset here. Running a sequence again on the same
    /// buffer keeps whatever earlier runs left in slots that are not reached this time.
    ///
    /// A capture started by an earlier sequence is forgotten, statistic checks only see captures
    /// started within this one.
    ///
    /// # Cancel Safety
    /// This function is not cancel safe. Dropping the future between attempts leaves the bench in
    /// whatever state the operations so far put it in and the current slot partially updated. A
    /// `Reset` operation, or the next sequence starting with one, restores a neutral bench.
    pub async fn execute_sequence(&mut self, operations: &[Operation], results: &mut [TestResult])
        -> SequenceOutcome
    {
        self.capture = None;

        if results.len() < operations.len() {
            warn!("{} result slot(s) for {} operation(s)", results.len(), operations.len());
            return SequenceOutcome::Failed { index: results.len() };
        }

        let retention = self.config.retention;
        let retry_delay = self.config.retry_delay();
        let inter_op_delay = self.config.inter_op_delay();

        for (index, (op, result)) in operations.iter().zip(results.iter_mut()).enumerate() {
            let mut attempts = 0u32;

            loop {
                attempts += 1;
                let start = Instant::now();
                let (ok, measured) = self.execute_single(op).await;
                let elapsed_ms = u32::try_from(start.elapsed().as_millis()).unwrap_or(u32::MAX);
                result.record(ok, measured, elapsed_ms, retention);

                debug!(
                    "op {} [{}] attempt {}: {} measured {} in {} ms",
                    index + 1, op, attempts, if ok { "pass" } else { "fail" }, measured, elapsed_ms
                );

                if ok {
                    break;
                }

                if !op.repeat {
                    info!("Sequence failed at op {} ({}): measured {}", index + 1, op.name(), op.display_measured(measured));
                    return SequenceOutcome::Failed { index: index };
                }

                let rails = RailMonitor::poll(&mut self.bench);

                if rails.state != PowerRailState::All {
                    info!("Sequence interrupted at op {} ({}): rails {}", index + 1, op.name(), rails.state);
                    return SequenceOutcome::Interrupted { index: index };
                }

                if attempts == 1 {
                    warn!("Op {} ({}) out of range, retrying until it passes", index + 1, op);
                }

                sleep(retry_delay).await;
            }

            sleep(inter_op_delay).await;
        }

        info!("Sequence passed, {} operation(s)", operations.len());
        SequenceOutcome::Passed
    }

    /// Performs one attempt of one operation
    ///
    /// Returns whether it passed and the value it measured. Operations that only drive outputs
    /// always pass and measure 0.
    pub async fn execute_single(&mut self, op: &Operation) -> (bool, i32)
    {
        match op.kind {
            OpKind::SetSource { net, millivolts } => {
                self.set_dc_level(net, millivolts).await;
                (true, 0)
            },
            OpKind::SetSignal { net, hz } => {
                self.bench.set_signal(net, hz);
                (true, 0)
            },
            OpKind::SetIo { pin, state } => {
                self.bench.set_io(pin, state);
                (true, 0)
            },
            OpKind::SetPulldown { pulldown, enabled } => {
                self.bench.set_pulldown(pulldown, enabled);
                (true, 0)
            },
            OpKind::CheckCurrent { rail, range } => {
                let measured = self.bench.read_current(rail);
                (range.contains(measured), measured)
            },
            OpKind::CheckPinVoltage { sink, range } => {
                let measured = self.bench.read_voltage(sink);
                (range.contains(measured), measured)
            },
            OpKind::CheckIoLevel { pin, expected } => {
                let level = self.bench.read_io(pin);
                (level == expected, level as i32)
            },
            OpKind::Reset => {
                self.reset().await;
                (true, 0)
            },
            OpKind::StartScope { sink, sample_rate, buffer_size } => {
                let accepted = self.scope.start_capture(sink, sample_rate, buffer_size);

                if accepted {
                    self.capture = Some(sink);
                }
                else {
                    warn!("Scope refused a capture on {} at {} S/s x {}", sink, sample_rate, buffer_size);
                    self.capture = None;
                }

                (accepted, 0)
            },
            OpKind::CheckStat { stat, sink, range } => match self.capture_stat(stat, sink).await {
                Some(measured) => (range.contains(measured), measured),
                None => (false, 0),
            },
            OpKind::Delay { ms } => {
                sleep(Duration::from_millis(ms as u64)).await;
                (true, 0)
            },
        }
    }

    /// Switches a net to a DC level, first stopping any waveform running on it
    ///
    /// The generator is given `signal_stop_timeout` to report idle. If it does not, the level is
    /// set anyway.
    async fn set_dc_level(&mut self, net: Net, millivolts: i32)
    {
        if self.bench.signal_active(net) {
            self.bench.stop_signal(net);
            let deadline = Instant::now() + self.config.signal_stop_timeout();

            while self.bench.signal_active(net) {
                if Instant::now() >= deadline {
                    warn!("Signal on net {} still running after {:?}", net, self.config.signal_stop_timeout());
                    break;
                }

                sleep(SIGNAL_STOP_POLL).await;
            }
        }

        self.bench.set_source(net, millivolts);
    }

    /// Returns every output of the bench to its idle state and forgets any capture
    async fn reset(&mut self)
    {
        for pin in IoPin::all() {
            self.bench.set_io(pin, IoState::HiZ);
        }

        for net in Net::ALL {
            self.set_dc_level(net, 0).await;
        }

        for pulldown in PullDown::ALL {
            self.bench.set_pulldown(pulldown, false);
        }

        self.scope.stop();
        self.capture = None;
    }

    /// Waits for the capture on `sink` to complete and extracts one statistic from it
    ///
    /// `None` when there is no capture on that sink or it does not complete within
    /// `scope_timeout`.
    async fn capture_stat(&mut self, stat: Stat, sink: Sink) -> Option<i32>
    {
        match self.capture {
            Some(captured) if captured == sink => {},
            Some(captured) => {
                warn!("Cannot check {} on {}: the last capture was started on {}", stat.keyword(), sink, captured);
                return None;
            },
            None => {
                warn!("Cannot check {} on {}: no capture was started", stat.keyword(), sink);
                return None;
            },
        }

        let deadline = Instant::now() + self.config.scope_timeout();

        while !self.scope.is_ready() {
            if Instant::now() >= deadline {
                warn!("Capture on {} not ready after {:?}", sink, self.config.scope_timeout());
                return None;
            }

            sleep(self.config.scope_poll()).await;
        }

        let stats = self.scope.stats();

        Some(match stat {
            Stat::Min => stats.min,
            Stat::Max => stats.max,
            Stat::Avg => stats.avg,
            Stat::Amplitude => stats.max.saturating_sub(stats.min),
            Stat::Frequency => scale_frequency(stats.frequency, self.config.frequency_scaling),
        })
    }
}

/// Rounds a frequency reported by the scope to whole hertz and applies the configured correction
pub fn scale_frequency(hz: f32, scaling: FrequencyScaling) -> i32
{
    // float to int casts saturate, NaN becomes 0
    let rounded = hz.round() as i32;

    match scaling {
        FrequencyScaling::Native => rounded,
        FrequencyScaling::Legacy => (rounded as i64 * 16384 / 20000) as i32,
    }
}
