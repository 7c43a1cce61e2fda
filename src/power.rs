//! Supply rail presence detection
//!
//! A module is only considered inserted when all three rails pass through to it and only
//! considered removed when none do. Anything in between is [`PowerRailState::Partial`], which is
//! "not yet" for both insertion and removal, so a module being wiggled into the socket never
//! starts a test and a module half pulled out never ends one.

use serde::{ Deserialize, Serialize };
use std::{ fmt, time::Duration };

use crate::{ board::Rail, hal::Bench };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerRailState
{
    /// No rail connected
    None,
    /// Some but not all rails connected
    Partial,
    /// Every rail connected
    All,
}

impl PowerRailState
{
    pub fn classify(p12v: bool, p5v: bool, m12v: bool) -> Self
    {
        match [p12v, p5v, m12v].iter().filter(|connected| **connected).count() {
            0 => Self::None,
            3 => Self::All,
            _ => Self::Partial,
        }
    }
}

impl fmt::Display for PowerRailState
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(match self {
            Self::None => "none",
            Self::Partial => "partial",
            Self::All => "all",
        })
    }
}

/// One sample of the rail sense lines, already interpreted as "connected" flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RailReading
{
    pub state: PowerRailState,
    pub p12v: bool,
    pub p5v: bool,
    pub m12v: bool,
}

/// Reads the rail sense lines off a bench
///
/// Holds no state: every poll goes to the hardware.
pub struct RailMonitor;

impl RailMonitor
{
    pub fn poll<B: Bench + ?Sized>(bench: &mut B) -> RailReading
    {
        let p12v = bench.read_rail_sense(Rail::P12V);
        let p5v = bench.read_rail_sense(Rail::P5V);
        // the -12V pass-through sense line is active low
        let m12v = !bench.read_rail_sense(Rail::M12V);

        RailReading {
            state: PowerRailState::classify(p12v, p5v, m12v),
            p12v: p12v,
            p5v: p5v,
            m12v: m12v,
        }
    }

    /// Polls every `poll_interval` until the rails report exactly `target`
    ///
    /// # Cancel Safety
    /// This function is cancel safe. It holds nothing across its sleeps besides the bench borrow.
    pub async fn wait_for_state<B: Bench + ?Sized>(
        bench: &mut B,
        target: PowerRailState,
        poll_interval: Duration,
    )
        -> RailReading
    {
        loop {
            let reading = Self::poll(bench);

            if reading.state == target {
                return reading;
            }

            tokio::time::sleep(poll_interval).await;
        }
    }
}
