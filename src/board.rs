//! Typed identifiers for everything on the test bed a test can touch
//!
//! The board exposes four DAC driven source nets, twelve ADC sink points (six through 1k
//! resistors, three with switchable pull-downs, three high impedance), three supply rails with
//! current sensing, sixteen GPIO expander lines and two indicator LEDs. Each family gets its own
//! type so an operation can never, say, read a voltage off a rail.

use serde::{ Deserialize, Serialize };
use std::{ fmt, str::FromStr };

/// Implements the error plumbing for a unit-like "unrecognized token" error
///
/// The message lists the accepted spellings so that a script author can fix a typo without
/// opening the source.
macro_rules! impl_parse_enum_err
{
    { $name:ident, $err_str:literal } => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name {}

        impl $name
        {
            pub fn valid_str_variants() -> &'static str
            {
                $err_str
            }
        }

        impl fmt::Display for $name
        {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
            {
                f.write_str(Self::valid_str_variants())
            }
        }

        impl std::error::Error for $name {}
    }
}

impl_parse_enum_err!{ ParseNetErr, "Expected one of ['A', 'B', 'C', 'D'] (case sensitive)" }
impl_parse_enum_err!{ ParseSinkErr, "Expected one of ['A'..'F', 'pdA'..'pdC', 'zD'..'zF'] (case sensitive)" }
impl_parse_enum_err!{ ParseRailErr, "Expected one of ['+12', '+5', '-12']" }
impl_parse_enum_err!{ ParseIoPinErr, "Expected an IO number from 0 to 15" }
impl_parse_enum_err!{ ParseModuleIdErr, "Expected a module ID from 0 to 31" }
impl_parse_enum_err!{ ParseIoStateErr, "Expected one of ['h', 'l', 'z']" }
impl_parse_enum_err!{ ParseLevelErr, "Expected one of ['h', 'l']" }
impl_parse_enum_err!{ ParsePullDownErr, "Expected one of ['pdA', 'pdB', 'pdC'] (case sensitive)" }
impl_parse_enum_err!{ ParseSwitchErr, "Expected one of ['p', 'n']" }

/// One of the four analog nets the board drives from its DACs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Net
{
    A,
    B,
    C,
    D,
}

impl Net
{
    pub const ALL: [Net; 4] = [Net::A, Net::B, Net::C, Net::D];
}

impl FromStr for Net
{
    type Err = ParseNetErr;

    fn from_str(net_str: &str) -> Result<Self, Self::Err>
    {
        match net_str {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            _ => Err(ParseNetErr {}),
        }
    }
}

impl fmt::Display for Net
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        })
    }
}

/// An ADC read-back point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sink
{
    /// Sinks A to F are loaded with 1k to ground
    A,
    B,
    C,
    D,
    E,
    F,
    /// Sinks with a switchable pull-down, see [`PullDown`]
    PdA,
    PdB,
    PdC,
    /// High impedance sinks
    ZD,
    ZE,
    ZF,
}

impl Sink
{
    pub const ALL: [Sink; 12] = [
        Sink::A, Sink::B, Sink::C, Sink::D, Sink::E, Sink::F,
        Sink::PdA, Sink::PdB, Sink::PdC,
        Sink::ZD, Sink::ZE, Sink::ZF,
    ];
}

impl FromStr for Sink
{
    type Err = ParseSinkErr;

    fn from_str(sink_str: &str) -> Result<Self, Self::Err>
    {
        match sink_str {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            "E" => Ok(Self::E),
            "F" => Ok(Self::F),
            "pdA" => Ok(Self::PdA),
            "pdB" => Ok(Self::PdB),
            "pdC" => Ok(Self::PdC),
            "zD" => Ok(Self::ZD),
            "zE" => Ok(Self::ZE),
            "zF" => Ok(Self::ZF),
            _ => Err(ParseSinkErr {}),
        }
    }
}

impl fmt::Display for Sink
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::F => "F",
            Self::PdA => "pdA",
            Self::PdB => "pdB",
            Self::PdC => "pdC",
            Self::ZD => "zD",
            Self::ZE => "zE",
            Self::ZF => "zF",
        })
    }
}

/// A supply rail feeding the module under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rail
{
    P12V,
    P5V,
    M12V,
}

impl Rail
{
    pub const ALL: [Rail; 3] = [Rail::P12V, Rail::P5V, Rail::M12V];
}

impl FromStr for Rail
{
    type Err = ParseRailErr;

    fn from_str(rail_str: &str) -> Result<Self, Self::Err>
    {
        match rail_str {
            "+12" | "12" => Ok(Self::P12V),
            "+5" | "5" => Ok(Self::P5V),
            "-12" => Ok(Self::M12V),
            _ => Err(ParseRailErr {}),
        }
    }
}

impl fmt::Display for Rail
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(match self {
            Self::P12V => "+12",
            Self::P5V => "+5",
            Self::M12V => "-12",
        })
    }
}

/// A line on one of the two GPIO expanders, numbered 0 to 15
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct IoPin(u8);

impl IoPin
{
    pub const COUNT: u8 = 16;

    pub fn new(index: u8) -> Option<Self>
    {
        if index < Self::COUNT {
            Some(Self(index))
        }
        else {
            None
        }
    }

    pub fn index(&self) -> u8
    {
        self.0
    }

    pub fn all() -> impl Iterator<Item = IoPin>
    {
        (0..Self::COUNT).map(IoPin)
    }
}

impl TryFrom<u8> for IoPin
{
    type Error = ParseIoPinErr;

    fn try_from(index: u8) -> Result<Self, Self::Error>
    {
        IoPin::new(index).ok_or(ParseIoPinErr {})
    }
}

impl From<IoPin> for u8
{
    fn from(pin: IoPin) -> u8
    {
        pin.0
    }
}

impl FromStr for IoPin
{
    type Err = ParseIoPinErr;

    fn from_str(pin_str: &str) -> Result<Self, Self::Err>
    {
        pin_str
            .parse::<u8>()
            .ok()
            .and_then(IoPin::new)
            .ok_or(ParseIoPinErr {})
    }
}

impl fmt::Display for IoPin
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.0)
    }
}

/// Drive state of an IO line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IoState
{
    Low,
    High,
    /// Released to an input, i.e. not driven
    HiZ,
}

impl FromStr for IoState
{
    type Err = ParseIoStateErr;

    fn from_str(state_str: &str) -> Result<Self, Self::Err>
    {
        match state_str {
            "l" => Ok(Self::Low),
            "h" => Ok(Self::High),
            "z" => Ok(Self::HiZ),
            _ => Err(ParseIoStateErr {}),
        }
    }
}

impl fmt::Display for IoState
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(match self {
            Self::Low => "l",
            Self::High => "h",
            Self::HiZ => "z",
        })
    }
}

/// Expected digital level of an IO line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Level(pub bool);

impl FromStr for Level
{
    type Err = ParseLevelErr;

    fn from_str(level_str: &str) -> Result<Self, Self::Err>
    {
        match level_str {
            "h" => Ok(Self(true)),
            "l" => Ok(Self(false)),
            _ => Err(ParseLevelErr {}),
        }
    }
}

impl fmt::Display for Level
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(if self.0 { "h" } else { "l" })
    }
}

/// One of the switchable pull-down resistors sitting on the `pd` sinks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PullDown
{
    A,
    B,
    C,
}

impl PullDown
{
    pub const ALL: [PullDown; 3] = [PullDown::A, PullDown::B, PullDown::C];

    /// The sink this pull-down loads
    pub fn sink(&self) -> Sink
    {
        match self {
            Self::A => Sink::PdA,
            Self::B => Sink::PdB,
            Self::C => Sink::PdC,
        }
    }
}

impl FromStr for PullDown
{
    type Err = ParsePullDownErr;

    fn from_str(pd_str: &str) -> Result<Self, Self::Err>
    {
        match pd_str {
            "pdA" => Ok(Self::A),
            "pdB" => Ok(Self::B),
            "pdC" => Ok(Self::C),
            _ => Err(ParsePullDownErr {}),
        }
    }
}

impl fmt::Display for PullDown
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        fmt::Display::fmt(&self.sink(), f)
    }
}

/// Pull-down switch position in scripts: `p` engages the resistor, `n` releases it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Switch(pub bool);

impl FromStr for Switch
{
    type Err = ParseSwitchErr;

    fn from_str(switch_str: &str) -> Result<Self, Self::Err>
    {
        match switch_str {
            "p" => Ok(Self(true)),
            "n" => Ok(Self(false)),
            _ => Err(ParseSwitchErr {}),
        }
    }
}

impl fmt::Display for Switch
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(if self.0 { "p" } else { "n" })
    }
}

/// Operator facing status LEDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Indicator
{
    Pass,
    Fail,
}

/// Identity of a daughter module, read off five pull-up/pull-down encoded pins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ModuleId(u8);

impl ModuleId
{
    pub const BITS: u32 = 5;
    const MASK: u8 = (1 << Self::BITS) - 1;

    pub fn new(id: u8) -> Option<Self>
    {
        if id <= Self::MASK {
            Some(Self(id))
        }
        else {
            None
        }
    }

    /// Builds an ID from the raw encoder port, ignoring any bits above the fifth
    pub fn from_bits(raw: u8) -> Self
    {
        Self(raw & Self::MASK)
    }

    pub fn get(&self) -> u8
    {
        self.0
    }
}

impl TryFrom<u8> for ModuleId
{
    type Error = ParseModuleIdErr;

    fn try_from(id: u8) -> Result<Self, Self::Error>
    {
        ModuleId::new(id).ok_or(ParseModuleIdErr {})
    }
}

impl From<ModuleId> for u8
{
    fn from(id: ModuleId) -> u8
    {
        id.0
    }
}

impl fmt::Display for ModuleId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests
{
    use super::{ IoPin, ModuleId, PullDown, Rail, Sink };

    #[test]
    fn sink_labels_round_trip()
    {
        for sink in Sink::ALL.iter() {
            assert_eq!(sink.to_string().parse::<Sink>(), Ok(*sink));
        }
    }

    #[test]
    fn sink_labels_are_case_sensitive()
    {
        assert!("pda".parse::<Sink>().is_err());
        assert!("a".parse::<Sink>().is_err());
    }

    #[test]
    fn rail_accepts_signed_labels()
    {
        assert_eq!("+12".parse::<Rail>(), Ok(Rail::P12V));
        assert_eq!("+5".parse::<Rail>(), Ok(Rail::P5V));
        assert_eq!("-12".parse::<Rail>(), Ok(Rail::M12V));
        assert!("-5".parse::<Rail>().is_err());
    }

    #[test]
    fn io_pin_bounds()
    {
        assert_eq!("15".parse::<IoPin>().map(|pin| pin.index()), Ok(15));
        assert!("16".parse::<IoPin>().is_err());
        assert!("x".parse::<IoPin>().is_err());
        assert_eq!(IoPin::all().count(), 16);
    }

    #[test]
    fn pulldown_maps_to_its_sink()
    {
        assert_eq!(PullDown::B.sink(), Sink::PdB);
        assert_eq!(&PullDown::C.to_string(), "pdC");
    }

    #[test]
    fn module_id_is_five_bits()
    {
        assert_eq!(ModuleId::from_bits(0b1110_1001).get(), 0b0_1001);
        assert!(ModuleId::new(31).is_some());
        assert!(ModuleId::new(32).is_none());
    }

    #[test]
    fn deserializing_checks_bounds()
    {
        assert_eq!(serde_json::from_str::<IoPin>("15").ok(), IoPin::new(15));
        assert!(serde_json::from_str::<IoPin>("16").is_err());
        assert_eq!(serde_json::from_str::<ModuleId>("31").ok(), ModuleId::new(31));
        assert!(serde_json::from_str::<ModuleId>("32").is_err());
        assert_eq!(serde_json::to_string(&ModuleId::from_bits(9)).ok().as_deref(), Some("9"));
    }
}
