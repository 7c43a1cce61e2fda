//! The station's top level loop: wait for a module, test it, keep testing it until it passes or
//! is pulled, then save what it did
//!
//! A failing module stays in the socket while the operator works on it, so a failed sequence is
//! run again after a short pause for as long as the module is fully powered. Reruns use the same
//! results buffer without resetting it. Removal has to last for `removal_debounce` before it
//! counts, after which the results are handed to the [`ResultStore`] exactly once.

use log::{ error, info, warn };
use std::fmt;
use tokio::time::{ sleep, Instant };

use crate::{
    board::{ Indicator, ModuleId },
    hal::{ Bench, Scope },
    interpreter::{ Interpreter, SequenceOutcome },
    power::{ PowerRailState, RailMonitor },
    registry::Registry,
    results::{ Report, ResultBuffer, ResultStore },
};

/// What happened to one inserted module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport
{
    pub id: ModuleId,
    /// `None` when the ID is not in the registry
    pub name: Option<String>,
    /// Outcome of the last run of the sequence
    pub outcome: Option<SequenceOutcome>,
    /// Number of times the sequence was run
    pub runs: u32,
    /// Whether the results reached the store
    pub saved: bool,
}

impl fmt::Display for CycleReport
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let (name, outcome) = match (&self.name, &self.outcome) {
            (Some(name), Some(outcome)) => (name, outcome),
            _ => return write!(f, "Unknown module ID {}, not tested", self.id),
        };

        write!(f, "{} (ID: {}) {} after {} run(s)", name, self.id, outcome, self.runs)?;

        if self.saved {
            f.write_str(", results saved")
        }
        else {
            f.write_str(", results NOT saved")
        }
    }
}

/// A test station: a bench, a scope, the known modules and somewhere to keep results
pub struct Station<B, S, R>
{
    interpreter: Interpreter<B, S>,
    registry: Registry,
    store: R,
    /// Module the buffer was allocated for and its results
    current: Option<(ModuleId, ResultBuffer)>,
}

impl <B, S, R> Station<B, S, R>
    where B: Bench,
          S: Scope,
          R: ResultStore
{
    pub fn new(interpreter: Interpreter<B, S>, registry: Registry, store: R) -> Self
    {
        Self {
            interpreter: interpreter,
            registry: registry,
            store: store,
            current: None,
        }
    }

    pub fn interpreter(&self) -> &Interpreter<B, S>
    {
        &self.interpreter
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter<B, S>
    {
        &mut self.interpreter
    }

    pub fn store(&self) -> &R
    {
        &self.store
    }

    /// Results of the module tested last
    pub fn results(&self) -> Option<&ResultBuffer>
    {
        self.current.as_ref().map(|(_id, buffer)| buffer)
    }

    /// Tests modules forever
    pub async fn run(&mut self)
    {
        info!("Station ready, {} module(s) known", self.registry.len());

        loop {
            let report = self.run_cycle().await;

            if report.outcome.map_or(false, |outcome| outcome.is_passed()) {
                info!("{}", report);
            }
            else {
                warn!("{}", report);
            }
        }
    }

    /// Handles one module from insertion to removal
    ///
    /// # Cancel Safety
    /// This function is not cancel safe. Cancelling mid-sequence leaves the bench outputs and the
    /// indicators as they were and the results unsaved.
    pub async fn run_cycle(&mut self) -> CycleReport
    {
        let poll = self.interpreter.config().rail_poll();
        RailMonitor::wait_for_state(self.interpreter.bench_mut(), PowerRailState::All, poll).await;

        let id = ModuleId::from_bits(self.interpreter.bench_mut().read_module_id_bits());
        set_indicators(self.interpreter.bench_mut(), false, false);

        let module = match self.registry.lookup(id) {
            Some(module) => module,
            None => {
                warn!("Module with ID {} is not known to this station", id);
                set_indicators(self.interpreter.bench_mut(), false, true);
                wait_for_removal(&mut self.interpreter).await;
                set_indicators(self.interpreter.bench_mut(), false, false);

                return CycleReport {
                    id: id,
                    name: None,
                    outcome: None,
                    runs: 0,
                    saved: false,
                };
            },
        };

        info!("Detected module {} (ID: {})", module.name, id);

        let mut buffer = match self.current.take() {
            Some((last_id, mut buffer)) if last_id == id => {
                buffer.reset();
                buffer
            },
            _ => ResultBuffer::for_module(module),
        };

        let rerun_delay = self.interpreter.config().rerun_delay();
        let mut runs = 0;

        let outcome = loop {
            runs += 1;
            let outcome = self.interpreter.execute_sequence(&module.operations, buffer.as_mut_slice()).await;

            match outcome {
                SequenceOutcome::Passed => {
                    set_indicators(self.interpreter.bench_mut(), true, false);
                    break outcome;
                },
                SequenceOutcome::Interrupted { .. } => {
                    set_indicators(self.interpreter.bench_mut(), false, true);
                    break outcome;
                },
                SequenceOutcome::Failed { .. } => {
                    set_indicators(self.interpreter.bench_mut(), false, true);
                    sleep(rerun_delay).await;

                    if RailMonitor::poll(self.interpreter.bench_mut()).state != PowerRailState::All {
                        break outcome;
                    }

                    info!("Running {} again ({} so far)", module.name, runs);
                },
            }
        };

        info!("{} {} after {} run(s)", module.name, outcome, runs);
        wait_for_removal(&mut self.interpreter).await;

        let saved = match self.store.save(module, &buffer) {
            Ok(()) => true,
            Err(io_err) => {
                error!("Failed to save results of {}. {}", module.name, io_err);
                false
            },
        };

        info!("{}\n{}", Report::new(module, &buffer), Report::new(module, &buffer).listing());
        set_indicators(self.interpreter.bench_mut(), false, false);

        let report = CycleReport {
            id: id,
            name: Some(module.name.clone()),
            outcome: Some(outcome),
            runs: runs,
            saved: saved,
        };

        self.current = Some((id, buffer));
        report
    }
}

/// Waits until the rails have read [`PowerRailState::None`] continuously for `removal_debounce`
async fn wait_for_removal<B: Bench, S: Scope>(interpreter: &mut Interpreter<B, S>)
{
    let poll = interpreter.config().rail_poll();
    let debounce = interpreter.config().removal_debounce();

    'removal: loop {
        RailMonitor::wait_for_state(interpreter.bench_mut(), PowerRailState::None, poll).await;
        let deadline = Instant::now() + debounce;

        while Instant::now() < deadline {
            sleep(poll.min(deadline.saturating_duration_since(Instant::now()))).await;

            if RailMonitor::poll(interpreter.bench_mut()).state != PowerRailState::None {
                continue 'removal;
            }
        }

        return;
    }
}

fn set_indicators<B: Bench + ?Sized>(bench: &mut B, pass: bool, fail: bool)
{
    bench.set_indicator(Indicator::Pass, pass);
    bench.set_indicator(Indicator::Fail, fail);
}
