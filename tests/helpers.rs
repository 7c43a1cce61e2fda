mod common;

use common::{ Call, MockBench };
use microrack_tester::{
    board::{ IoPin, IoState, PullDown, Rail, Sink },
    helpers::{ check_rail_currents, test_mode, test_pin_pd, test_pin_range, ActiveLine },
    range::{ ModeCurrentRanges, PowerRailsCurrentRanges },
    Range,
};

fn mode_ranges() -> ModeCurrentRanges
{
    ModeCurrentRanges {
        active: Range::new(20_000, 25_000).unwrap(),
        inactive: Range::new(13_000, 18_000).unwrap(),
    }
}

async fn mode_for(first: i32, second: i32) -> Option<ActiveLine>
{
    let mut bench = MockBench::new().with_currents(Rail::P5V, &[first, second]);
    let reading = test_mode(&mut bench, IoPin::new(0).unwrap(), IoPin::new(1).unwrap(), Rail::P5V, &mode_ranges()).await;

    assert_eq!((reading.first, reading.second), (first, second));
    reading.mode
}

#[tokio::test(start_paused = true)]
async fn mode_follows_current_assignment()
{
    assert_eq!(mode_for(22_000, 15_000).await, Some(ActiveLine::First));
    assert_eq!(mode_for(15_000, 22_000).await, Some(ActiveLine::Second));
    assert_eq!(mode_for(22_000, 24_000).await, None);
    assert_eq!(mode_for(14_000, 17_000).await, None);
    assert_eq!(mode_for(19_000, 15_000).await, None);
}

#[tokio::test(start_paused = true)]
async fn mode_lines_sunk_one_at_a_time_and_released()
{
    let pin_a = IoPin::new(4).unwrap();
    let pin_b = IoPin::new(5).unwrap();
    let mut bench = MockBench::new().with_currents(Rail::P12V, &[22_000, 15_000]);
    test_mode(&mut bench, pin_a, pin_b, Rail::P12V, &mode_ranges()).await;

    assert_eq!(
        bench.calls,
        vec![
            Call::SetIo(pin_a, IoState::Low),
            Call::SetIo(pin_b, IoState::Low),
            Call::SetIo(pin_a, IoState::HiZ),
            Call::SetIo(pin_b, IoState::HiZ),
            Call::ReadIo(pin_a),
            Call::ReadIo(pin_b),
            Call::SetIo(pin_a, IoState::Low),
            Call::ReadCurrent(Rail::P12V),
            Call::SetIo(pin_a, IoState::HiZ),
            Call::SetIo(pin_b, IoState::Low),
            Call::ReadCurrent(Rail::P12V),
            Call::SetIo(pin_b, IoState::HiZ),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn mode_line_stuck_high_gives_no_mode()
{
    let pin_a = IoPin::new(0).unwrap();
    let pin_b = IoPin::new(1).unwrap();
    let mut bench = MockBench::new().with_currents(Rail::P5V, &[22_000, 15_000]);
    bench.io_levels.insert(pin_a, true);
    bench.io_levels.insert(pin_b, true);
    let reading = test_mode(&mut bench, pin_a, pin_b, Rail::P5V, &mode_ranges()).await;

    assert!(!reading.initial_levels_ok);
    assert_eq!(reading.mode, None);
    assert_eq!(bench.count(|call| matches!(call, Call::ReadIo(_))), 2);

    // one line is enough
    let mut bench = MockBench::new().with_currents(Rail::P5V, &[22_000, 15_000]);
    bench.io_levels.insert(pin_b, true);
    let reading = test_mode(&mut bench, pin_a, pin_b, Rail::P5V, &mode_ranges()).await;

    assert_eq!(reading.mode, None);
}

#[tokio::test(start_paused = true)]
async fn pulldown_checked_unloaded_and_loaded()
{
    let mut bench = MockBench::new().with_voltages(Sink::PdB, &[3000, 150]);
    let check = test_pin_pd(&mut bench, PullDown::B, Range::new(2900, 3100).unwrap(), Range::new(120, 190).unwrap()).await;

    assert!(check.passed());
    assert_eq!((check.hiz.measured, check.loaded.measured), (3000, 150));
    assert_eq!(bench.calls.last(), Some(&Call::SetPulldown(PullDown::B, false)));
}

#[tokio::test(start_paused = true)]
async fn pulldown_readings_judged_separately()
{
    let mut bench = MockBench::new().with_voltages(Sink::PdC, &[3000, 2900]);
    let check = test_pin_pd(&mut bench, PullDown::C, Range::new(2900, 3100).unwrap(), Range::new(120, 190).unwrap()).await;

    assert!(check.hiz.passed);
    assert!(!check.loaded.passed);
    assert!(!check.passed());
    assert_eq!(bench.calls.last(), Some(&Call::SetPulldown(PullDown::C, false)));
}

#[test]
fn idle_currents_per_rail()
{
    let mut bench = MockBench::new()
        .with_currents(Rail::P12V, &[10_000])
        .with_currents(Rail::P5V, &[-150])
        .with_currents(Rail::M12V, &[9_000]);
    let ranges = PowerRailsCurrentRanges {
        p12v: Range::new(5_000, 15_000).unwrap(),
        p5v: Range::new(0, 1_000).unwrap(),
        m12v: Range::new(5_000, 15_000).unwrap(),
    };
    let [p12v, p5v, m12v] = check_rail_currents(&mut bench, &ranges);

    assert!(p12v.passed);
    // negative drift is reported as measured, not clamped
    assert_eq!((p5v.passed, p5v.measured), (false, -150));
    assert!(m12v.passed);
}

#[test]
fn pin_range_reads_sink()
{
    let mut bench = MockBench::new().with_voltages(Sink::ZD, &[4_999]);
    let check = test_pin_range(&mut bench, Sink::ZD, Range::new(4_900, 5_100).unwrap());

    assert!(check.passed);
    assert_eq!(bench.calls, vec![Call::ReadVoltage(Sink::ZD)]);
}
