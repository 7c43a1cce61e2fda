//! Module test scripts
//!
//! # Format
//! Scripts are line oriented with one operation per line. The first token selects the operation
//! and a trailing `+`, either as its own token or stuck to the last one, marks the operation as
//! repeatable. Blank lines and lines starting with `#` are ignored.
//!
//! ```text
//! src <A|B|C|D> <mV>                 src_sig <net> <Hz>
//! io <pin#> <h|l|z>                  iolevel <pin#> <h|l>
//! pd <pdA|pdB|pdC> <p|n>             i <+12|+5|-12> <min_uA> <max_uA>
//! v <A..F|pdA..pdC|zD..zF> <min_mV> <max_mV>
//! reset                              scope <sink> <sample_freq> <buffer_size>
//! min|max|avg|freq|amplitude <sink> <min> <max>
//! delay <ms>
//! ```
//!
//! Two directives help with writing scripts for real modules:
//!
//!   - `alias <name>=<value>` names a board connection after the module's own jack or control.
//!     `out X` names source net `X`, `in X` names sink `X` and a bare number names an IO line,
//!     e.g. `alias a_jack=in A` lets a later line say `v a_jack 120 190`. An alias is only
//!     accepted where its kind of connection is expected.
//!   - `module <id> <name>` starts the operations of another module, which lets a whole
//!     configuration live in one file. Aliases do not carry over from one module to the next.
//!
//! # Errors
//! Parsing stops at the first problem. The error carries the line and token (both counted from 1)
//! so it can be pointed out to whoever wrote the script.

use std::{
    collections::{ HashMap, HashSet },
    error::Error,
    fmt,
    str::FromStr,
};

use crate::{
    board::{
        IoPin, IoState, Level, ModuleId, Net, ParseIoPinErr, ParseIoStateErr, ParseLevelErr, ParseModuleIdErr,
        ParseNetErr, ParsePullDownErr, ParseRailErr, ParseSinkErr, ParseSwitchErr, PullDown, Rail, Sink, Switch,
    },
    operation::{ OpKind, Operation, Stat },
    range::Range,
    registry::Module,
};

/// A description of the underlying cause of the parsing failure, if any
#[derive(Debug)]
pub enum FormatErrorCause
{
    /// The line ended before this token could be parsed
    Truncated,
    /// Expected an integer value
    InvalidInteger(std::num::ParseIntError),
    /// Expected a decimal value
    InvalidDecimal(std::num::ParseFloatError),
    /// Expected one of a fixed set of values
    ///
    /// The contained string describes which values were expected.
    InvalidEnum(&'static str),
    /// An alias was used where a different kind of connection is expected
    AliasMismatch
    {
        alias: String,
        found: AliasKind,
        expected: AliasKind,
    },
}

impl fmt::Display for FormatErrorCause
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Self::Truncated => f.write_str("No such token. Line ends before this could be parsed"),
            Self::InvalidInteger(int_err) => write!(f, "Caused by: {}", int_err),
            Self::InvalidDecimal(float_err) => write!(f, "Caused by: {}", float_err),
            Self::InvalidEnum(enum_err) => write!(f, "Unexpected or invalid variant. {}", enum_err),
            Self::AliasMismatch { alias, found, expected } => {
                write!(f, "Alias '{}' names {} but {} is expected here", alias, found, expected)
            },
        }
    }
}

impl From<std::num::ParseIntError> for FormatErrorCause
{
    fn from(this: std::num::ParseIntError) -> Self
    {
        Self::InvalidInteger(this)
    }
}

impl From<std::num::ParseFloatError> for FormatErrorCause
{
    fn from(this: std::num::ParseFloatError) -> Self
    {
        Self::InvalidDecimal(this)
    }
}

macro_rules! impl_enum_cause
{
    { $($name:ident),+ } => {
        $(
            impl From<$name> for FormatErrorCause
            {
                fn from(_this: $name) -> Self
                {
                    FormatErrorCause::InvalidEnum($name::valid_str_variants())
                }
            }
        )+
    }
}

impl_enum_cause!{
    ParseNetErr, ParseSinkErr, ParseRailErr, ParseIoPinErr, ParseIoStateErr, ParseLevelErr, ParsePullDownErr,
    ParseSwitchErr, ParseModuleIdErr
}

/// A parsing error caused by a script line of unexpected or invalid format
#[derive(Debug)]
pub struct FormatError
{
    /// The offending line as written in the script
    pub raw_line: String,
    /// The line number of the error. Indexed from 1
    pub line: usize,
    /// Which token the error occurred at. Indexed from 1
    ///
    /// Tokens are whitespace separated.
    pub token: usize,
    /// A message from the parsing routines about what went wrong
    pub mesg: &'static str,
    /// Some underlying cause, if any
    pub maybe_cause: Option<FormatErrorCause>,
}

impl fmt::Display for FormatError
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "At line {}, token {}: {}", self.line, self.token, self.mesg)?;

        if let Some(cause) = &self.maybe_cause {
            write!(f, ". {}", cause)?;
        }

        write!(f, "\n    {}", self.raw_line)
    }
}

impl Error for FormatError {}

/// An error describing a failure to load a script
#[derive(Debug)]
pub enum ParseError
{
    /// The script does not follow the expected format
    InvalidFormat(FormatError),
    /// The script could not be read
    Io(std::io::Error),
}

impl fmt::Display for ParseError
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Self::InvalidFormat(fmt_err) => write!(f, "Unable to interpret script. {}", fmt_err),
            Self::Io(io_err) => write!(f, "Failed to read script. {}", io_err),
        }
    }
}

impl Error for ParseError
{
    fn source(&self) -> Option<&(dyn Error + 'static)>
    {
        match self {
            Self::InvalidFormat(fmt_err) => Some(fmt_err),
            Self::Io(io_err) => Some(io_err),
        }
    }
}

impl From<std::io::Error> for ParseError
{
    fn from(this: std::io::Error) -> Self
    {
        ParseError::Io(this)
    }
}

impl From<FormatError> for ParseError
{
    fn from(this: FormatError) -> Self
    {
        ParseError::InvalidFormat(this)
    }
}

/// The kind of board connection an alias or a token position refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasKind
{
    /// `out X`
    Source,
    /// `in X`
    Sink,
    /// A bare IO line number
    Io,
    /// Anything else, accepted everywhere
    Value,
}

impl fmt::Display for AliasKind
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(match self {
            Self::Source => "a source net",
            Self::Sink => "a sink",
            Self::Io => "an IO line",
            Self::Value => "a value",
        })
    }
}

#[derive(Debug, Clone)]
struct Alias
{
    kind: AliasKind,
    token: String,
}

impl Alias
{
    fn parse(value: &str) -> Self
    {
        let mut words = value.split_whitespace();

        match (words.next(), words.next(), words.next()) {
            (Some("out"), Some(net), None) => Self { kind: AliasKind::Source, token: String::from(net) },
            (Some("in"), Some(sink), None) => Self { kind: AliasKind::Sink, token: String::from(sink) },
            (Some(pin), None, None) if pin.parse::<u8>().is_ok() => {
                Self { kind: AliasKind::Io, token: String::from(pin) }
            },
            _ => Self { kind: AliasKind::Value, token: String::from(value.trim()) },
        }
    }
}

type Aliases = HashMap<String, Alias>;

/// Cursor over the tokens of one script line
struct Tokens<'a>
{
    raw: &'a str,
    line: usize,
    tokens: Vec<&'a str>,
    /// Index of the next token to hand out
    next: usize,
    aliases: &'a Aliases,
}

impl <'a> Tokens<'a>
{
    fn new(raw: &'a str, line: usize, tokens: Vec<&'a str>, aliases: &'a Aliases) -> Self
    {
        Self {
            raw: raw,
            line: line,
            tokens: tokens,
            next: 0,
            aliases: aliases,
        }
    }

    fn error(&self, token: usize, mesg: &'static str, cause: Option<FormatErrorCause>) -> FormatError
    {
        FormatError {
            raw_line: String::from(self.raw),
            line: self.line,
            token: token,
            mesg: mesg,
            maybe_cause: cause,
        }
    }

    /// Takes the next token and resolves it through the alias table
    fn take(&mut self, kind: AliasKind, mesg: &'static str) -> Result<(usize, &'a str), FormatError>
    {
        let position = self.next + 1;
        let token = self.tokens
            .get(self.next)
            .copied()
            .ok_or_else(|| self.error(position, mesg, Some(FormatErrorCause::Truncated)))?;
        self.next += 1;
        let aliases: &'a Aliases = self.aliases;

        match aliases.get(token) {
            Some(alias) => {
                if alias.kind != kind && alias.kind != AliasKind::Value && kind != AliasKind::Value {
                    return Err(self.error(position, mesg, Some(FormatErrorCause::AliasMismatch {
                        alias: String::from(token),
                        found: alias.kind,
                        expected: kind,
                    })));
                }
                Ok((position, alias.token.as_str()))
            },
            None => Ok((position, token)),
        }
    }

    fn parse<T>(&mut self, kind: AliasKind, mesg: &'static str) -> Result<T, FormatError>
        where T: FromStr,
              FormatErrorCause: From<T::Err>,
    {
        let (position, token) = self.take(kind, mesg)?;

        token
            .parse::<T>()
            .map_err(|err| self.error(position, mesg, Some(FormatErrorCause::from(err))))
    }

    fn range(&mut self, mesg: &'static str) -> Result<Range, FormatError>
    {
        let position = self.next + 1;
        let min = self.parse::<i32>(AliasKind::Value, mesg)?;
        let max = self.parse::<i32>(AliasKind::Value, mesg)?;

        Range::new(min, max).ok_or_else(|| self.error(position, "range minimum is greater than its maximum", None))
    }

    fn finish(&self) -> Result<(), FormatError>
    {
        if self.next < self.tokens.len() {
            Err(self.error(self.next + 1, "unexpected trailing token", None))
        }
        else {
            Ok(())
        }
    }
}

/// Splits off the repeat marker, returning the remaining tokens
fn split_repeat(line: &str) -> (Vec<&str>, bool)
{
    let mut tokens: Vec<&str> = line.split_whitespace().collect();
    let mut repeat = false;

    if let Some(last) = tokens.last().copied() {
        if last == "+" {
            tokens.pop();
            repeat = true;
        }
        else if last.len() > 1 && last.ends_with('+') {
            let len = tokens.len();
            tokens[len - 1] = &last[..last.len() - 1];
            repeat = true;
        }
    }

    (tokens, repeat)
}

fn parse_operation(raw: &str, line: usize, aliases: &Aliases) -> Result<Operation, FormatError>
{
    let (tokens, repeat) = split_repeat(raw);
    let keyword = tokens.first().copied().unwrap_or("");
    let mut tokens = Tokens::new(raw, line, tokens, aliases);
    tokens.next = 1;

    let kind = match keyword {
        "src" => OpKind::SetSource {
            net: tokens.parse::<Net>(AliasKind::Source, "failed to parse source net")?,
            millivolts: tokens.parse::<i32>(AliasKind::Value, "failed to parse source millivolts")?,
        },
        "src_sig" => {
            let net = tokens.parse::<Net>(AliasKind::Source, "failed to parse source net")?;
            let hz = tokens.parse::<f32>(AliasKind::Value, "failed to parse signal frequency")?;

            if !(hz.is_finite() && hz > 0.0) {
                return Err(tokens.error(3, "signal frequency must be a positive number", None));
            }

            OpKind::SetSignal { net: net, hz: hz }
        },
        "io" => OpKind::SetIo {
            pin: tokens.parse::<IoPin>(AliasKind::Io, "failed to parse IO line")?,
            state: tokens.parse::<IoState>(AliasKind::Value, "failed to parse IO state")?,
        },
        "iolevel" => OpKind::CheckIoLevel {
            pin: tokens.parse::<IoPin>(AliasKind::Io, "failed to parse IO line")?,
            expected: tokens.parse::<Level>(AliasKind::Value, "failed to parse expected IO level")?.0,
        },
        "pd" => OpKind::SetPulldown {
            pulldown: tokens.parse::<PullDown>(AliasKind::Sink, "failed to parse pull-down sink")?,
            enabled: tokens.parse::<Switch>(AliasKind::Value, "failed to parse pull-down switch")?.0,
        },
        "i" => OpKind::CheckCurrent {
            rail: tokens.parse::<Rail>(AliasKind::Value, "failed to parse rail")?,
            range: tokens.range("failed to parse current range")?,
        },
        "v" => OpKind::CheckPinVoltage {
            sink: tokens.parse::<Sink>(AliasKind::Sink, "failed to parse sink")?,
            range: tokens.range("failed to parse voltage range")?,
        },
        "reset" => OpKind::Reset,
        "scope" => {
            let sink = tokens.parse::<Sink>(AliasKind::Sink, "failed to parse scope sink")?;
            let sample_rate = tokens.parse::<u32>(AliasKind::Value, "failed to parse scope sample rate")?;
            let buffer_size = tokens.parse::<u32>(AliasKind::Value, "failed to parse scope buffer size")?;

            if sample_rate == 0 || buffer_size == 0 {
                return Err(tokens.error(3, "scope sample rate and buffer size must be non-zero", None));
            }

            OpKind::StartScope { sink: sink, sample_rate: sample_rate, buffer_size: buffer_size }
        },
        "delay" => OpKind::Delay {
            ms: tokens.parse::<u32>(AliasKind::Value, "failed to parse delay milliseconds")?,
        },
        other => match Stat::ALL.iter().find(|stat| stat.keyword() == other) {
            Some(stat) => OpKind::CheckStat {
                stat: *stat,
                sink: tokens.parse::<Sink>(AliasKind::Sink, "failed to parse scope sink")?,
                range: tokens.range("failed to parse statistic range")?,
            },
            None => return Err(tokens.error(1, "unknown operation", None)),
        },
    };

    tokens.finish()?;

    Ok(Operation {
        repeat: repeat,
        kind: kind,
    })
}

/// What a single script line turned out to be
enum Directive<'a>
{
    Skip,
    Alias(&'a str, Alias),
    Module(ModuleId, String),
    Operation(Operation),
}

fn parse_directive<'a>(raw: &'a str, line: usize, aliases: &Aliases) -> Result<Directive<'a>, FormatError>
{
    let trimmed = raw.trim();

    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(Directive::Skip);
    }

    if let Some(definition) = trimmed.strip_prefix("alias ") {
        let error = |mesg| FormatError {
            raw_line: String::from(raw),
            line: line,
            token: 2,
            mesg: mesg,
            maybe_cause: None,
        };
        let (name, value) = definition.split_once('=').ok_or_else(|| error("expected 'alias <name>=<value>'"))?;
        let name = name.trim();

        if name.is_empty() || name.contains(char::is_whitespace) || value.trim().is_empty() {
            return Err(error("alias name and value must not be empty and the name must be one word"));
        }

        return Ok(Directive::Alias(name, Alias::parse(value)));
    }

    let mut words = trimmed.split_whitespace();

    if words.next() == Some("module") {
        let error = |token, mesg, cause| FormatError {
            raw_line: String::from(raw),
            line: line,
            token: token,
            mesg: mesg,
            maybe_cause: cause,
        };
        let id_str = words.next().ok_or_else(|| error(2, "failed to parse module id", Some(FormatErrorCause::Truncated)))?;
        let id = id_str
            .parse::<u8>()
            .map_err(|err| error(2, "failed to parse module id", Some(FormatErrorCause::from(err))))?;
        let id = ModuleId::try_from(id)
            .map_err(|err| error(2, "module id must fit in five bits", Some(FormatErrorCause::from(err))))?;
        let name = words.collect::<Vec<&str>>().join(" ");

        if name.is_empty() {
            return Err(error(3, "failed to parse module name", Some(FormatErrorCause::Truncated)));
        }

        return Ok(Directive::Module(id, name));
    }

    parse_operation(raw, line, aliases).map(Directive::Operation)
}

/// Parses one operation line with no aliases in scope
///
/// Returns `None` for blank and comment lines.
pub fn parse_line(line: &str) -> Result<Option<Operation>, FormatError>
{
    match parse_directive(line, 1, &Aliases::new())? {
        Directive::Operation(op) => Ok(Some(op)),
        Directive::Skip | Directive::Alias(..) => Ok(None),
        Directive::Module(..) => Err(FormatError {
            raw_line: String::from(line),
            line: 1,
            token: 1,
            mesg: "module header is not an operation",
            maybe_cause: None,
        }),
    }
}

/// Parses the operations of a single module
pub fn parse_operations(script: &str) -> Result<Vec<Operation>, FormatError>
{
    let mut aliases = Aliases::new();
    let mut operations = Vec::new();

    for (index, raw) in script.lines().enumerate() {
        match parse_directive(raw, index + 1, &aliases)? {
            Directive::Skip => {},
            Directive::Alias(name, alias) => {
                aliases.insert(String::from(name), alias);
            },
            Directive::Operation(op) => operations.push(op),
            Directive::Module(..) => {
                return Err(FormatError {
                    raw_line: String::from(raw),
                    line: index + 1,
                    token: 1,
                    mesg: "module header in a single module script",
                    maybe_cause: None,
                });
            },
        }
    }

    Ok(operations)
}

/// Parses a configuration holding any number of modules, each introduced by a `module` line
pub fn parse_modules(script: &str) -> Result<Vec<Module>, FormatError>
{
    let mut aliases = Aliases::new();
    let mut modules: Vec<Module> = Vec::new();
    let mut seen = HashSet::new();

    for (index, raw) in script.lines().enumerate() {
        match parse_directive(raw, index + 1, &aliases)? {
            Directive::Skip => {},
            Directive::Module(id, name) => {
                if !seen.insert(id) {
                    return Err(FormatError {
                        raw_line: String::from(raw),
                        line: index + 1,
                        token: 2,
                        mesg: "module id defined more than once",
                        maybe_cause: None,
                    });
                }

                aliases.clear();
                modules.push(Module::new(id, name, Vec::new()));
            },
            directive => {
                let module = modules.last_mut().ok_or_else(|| FormatError {
                    raw_line: String::from(raw),
                    line: index + 1,
                    token: 1,
                    mesg: "expected a 'module <id> <name>' line before the first operation",
                    maybe_cause: None,
                })?;

                match directive {
                    Directive::Alias(name, alias) => {
                        aliases.insert(String::from(name), alias);
                    },
                    Directive::Operation(op) => module.operations.push(op),
                    Directive::Skip | Directive::Module(..) => {},
                }
            },
        }
    }

    Ok(modules)
}

#[cfg(test)]
mod tests
{
    use super::{ parse_line, parse_modules, parse_operations, FormatErrorCause };
    use crate::{
        board::{ IoPin, IoState, Net, PullDown, Rail, Sink },
        operation::{ OpKind, Operation, Stat },
        range::Range,
    };

    fn op(line: &str) -> Operation
    {
        parse_line(line).unwrap().unwrap()
    }

    #[test]
    fn every_keyword_parses()
    {
        assert_eq!(op("src A 2000").kind, OpKind::SetSource { net: Net::A, millivolts: 2000 });
        assert_eq!(op("src D -5000").kind, OpKind::SetSource { net: Net::D, millivolts: -5000 });
        assert_eq!(op("src_sig B 440").kind, OpKind::SetSignal { net: Net::B, hz: 440.0 });
        assert_eq!(op("io 3 z").kind, OpKind::SetIo { pin: IoPin::new(3).unwrap(), state: IoState::HiZ });
        assert_eq!(op("iolevel 9 h").kind, OpKind::CheckIoLevel { pin: IoPin::new(9).unwrap(), expected: true });
        assert_eq!(op("pd pdB p").kind, OpKind::SetPulldown { pulldown: PullDown::B, enabled: true });
        assert_eq!(
            op("i -12 0 2000").kind,
            OpKind::CheckCurrent { rail: Rail::M12V, range: Range::new(0, 2000).unwrap() }
        );
        assert_eq!(
            op("v zE 4100 5100").kind,
            OpKind::CheckPinVoltage { sink: Sink::ZE, range: Range::new(4100, 5100).unwrap() }
        );
        assert_eq!(op("reset").kind, OpKind::Reset);
        assert_eq!(
            op("scope C 20000 1024").kind,
            OpKind::StartScope { sink: Sink::C, sample_rate: 20000, buffer_size: 1024 }
        );
        assert_eq!(
            op("amplitude C 900 1100").kind,
            OpKind::CheckStat { stat: Stat::Amplitude, sink: Sink::C, range: Range::new(900, 1100).unwrap() }
        );
        assert_eq!(op("delay 250").kind, OpKind::Delay { ms: 250 });
    }

    #[test]
    fn repeat_marker_forms()
    {
        assert!(!op("v A 120 190").repeat);
        assert!(op("v A 120 190 +").repeat);
        assert!(op("v A 120 190+").repeat);
        assert!(op("i +12 0 1000 +").repeat);
        assert_eq!(op("i +12 0 1000").kind, OpKind::CheckCurrent { rail: Rail::P12V, range: Range::new(0, 1000).unwrap() });
    }

    #[test]
    fn comments_and_blanks_skipped()
    {
        assert!(parse_line("").unwrap().is_none());
        assert!(parse_line("   ").unwrap().is_none());
        assert!(parse_line("# src A 0").unwrap().is_none());
    }

    #[test]
    fn display_parses_back()
    {
        for line in ["src B -2000", "src_sig C 100.5", "io 0 h", "pd pdC n", "v pdA 10 20 +", "freq A 430 450", "delay 5"] {
            assert_eq!(&op(line).to_string(), line);
        }
    }

    #[test]
    fn unknown_operation_reported_at_first_token()
    {
        let err = parse_line("frobnicate A 1").unwrap_err();
        assert_eq!(err.token, 1);
        assert_eq!(err.mesg, "unknown operation");
    }

    #[test]
    fn bad_token_position_reported()
    {
        let err = parse_operations("reset\n\nv A 120 x\n").unwrap_err();
        assert_eq!(err.line, 3);
        assert_eq!(err.token, 4);
        assert!(matches!(err.maybe_cause, Some(FormatErrorCause::InvalidInteger(_))));
    }

    #[test]
    fn truncated_line()
    {
        let err = parse_line("v A 120").unwrap_err();
        assert_eq!(err.token, 4);
        assert!(matches!(err.maybe_cause, Some(FormatErrorCause::Truncated)));
    }

    #[test]
    fn trailing_tokens_rejected()
    {
        let err = parse_line("reset now").unwrap_err();
        assert_eq!(err.token, 2);
    }

    #[test]
    fn inverted_range_rejected()
    {
        let err = parse_line("i +5 6000 2000").unwrap_err();
        assert_eq!(err.token, 3);
    }

    #[test]
    fn invalid_enum_lists_choices()
    {
        let err = parse_line("io 2 x").unwrap_err();
        assert!(matches!(err.maybe_cause, Some(FormatErrorCause::InvalidEnum(_))));
        assert!(err.to_string().contains("'z'"));
    }

    #[test]
    fn aliases_resolve_by_kind()
    {
        let script = "\
alias a_io=out A
alias a_gate=0
alias a_jack=in A
alias pot=in pdB
src a_io 2000
io a_gate h
v a_jack 120 190 +
pd pot p
";
        let ops = parse_operations(script).unwrap();

        assert_eq!(ops.len(), 4);
        assert_eq!(ops[0].kind, OpKind::SetSource { net: Net::A, millivolts: 2000 });
        assert_eq!(ops[1].kind, OpKind::SetIo { pin: IoPin::new(0).unwrap(), state: IoState::High });
        assert_eq!(ops[2].kind, OpKind::CheckPinVoltage { sink: Sink::A, range: Range::new(120, 190).unwrap() });
        assert!(ops[2].repeat);
        assert_eq!(ops[3].kind, OpKind::SetPulldown { pulldown: PullDown::B, enabled: true });
    }

    #[test]
    fn alias_of_wrong_kind_rejected()
    {
        let err = parse_operations("alias a_jack=in A\nsrc a_jack 100\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(matches!(err.maybe_cause, Some(FormatErrorCause::AliasMismatch { .. })));
    }

    #[test]
    fn multi_module_configuration()
    {
        let script = "\
# whole bench configuration
module 9 mod-jacket
alias a_jack=in A
src A 2000
v a_jack 120 190

module 10 mod-mix
reset
i +5 2000 6000
";
        let modules = parse_modules(script).unwrap();

        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0].id.get(), 9);
        assert_eq!(&modules[0].name, "mod-jacket");
        assert_eq!(modules[0].operations.len(), 2);
        assert_eq!(&modules[1].name, "mod-mix");
        assert_eq!(modules[1].operations.len(), 2);
    }

    #[test]
    fn aliases_do_not_leak_between_modules()
    {
        let script = "module 1 first\nalias j=in A\nv j 0 1\nmodule 2 second\nv j 0 1\n";
        let err = parse_modules(script).unwrap_err();
        assert_eq!(err.line, 5);
    }

    #[test]
    fn module_structure_errors()
    {
        assert_eq!(parse_modules("reset\n").unwrap_err().line, 1);
        let err = parse_modules("module 40 big\n").unwrap_err();
        assert_eq!(err.token, 2);
        assert!(err.to_string().contains("0 to 31"));
        assert_eq!(parse_modules("module 3 a\nmodule 3 b\n").unwrap_err().line, 2);
        assert_eq!(parse_modules("module 3\n").unwrap_err().token, 3);
        assert!(parse_operations("module 3 a\n").is_err());
    }
}
