//! **Microrack** module test station
//!
//! Drives a test bed that a Microrack synthesizer module plugs into. The station reads the
//! module's 5-bit ID off the socket, looks up the test sequence for that module type and runs it:
//! drive voltages, waveforms and IO lines, then check currents, voltages, logic levels and
//! waveform statistics against ranges. Operations can be marked repeatable so an operator can
//! trim a pot until a reading comes into range; pulling the module out interrupts them.
//!
//! Module sequences are written in a small line-oriented script, see [`script`]:
//!
//! ```text
//! module 9 mod-jacket
//! alias cv_in=out A
//! reset
//! src cv_in 2000
//! v pdA 120 190 +
//! i +12 0 20000
//! ```
//!
//! All hardware access goes through the [`hal::Bench`] and [`hal::Scope`] traits. The interpreter
//! and control loop are `async` and sleep through tokio's timer, so tests run them on a paused
//! clock against plain data.

pub mod board;
pub mod config;
pub mod controller;
pub mod hal;
pub mod helpers;
pub mod interpreter;
pub mod operation;
pub mod power;
pub mod range;
pub mod registry;
pub mod results;
pub mod script;
pub mod units;

pub use config::StationConfig;
pub use controller::{ CycleReport, Station };
pub use hal::{ Bench, Scope, ScopeStats };
pub use interpreter::{ Interpreter, SequenceOutcome };
pub use operation::{ OpKind, Operation, Stat };
pub use range::Range;
pub use registry::{ Module, Registry };
pub use results::{ FileStore, Report, ResultBuffer, ResultStore, TestResult };
