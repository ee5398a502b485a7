//! Serial console command parser.
//!
//! Turns one line typed on the debug UART into an [`AppCommand`].  The
//! firmware reads lines on a helper thread and submits the parsed command
//! to the [`CommandInbox`](super::inbox::CommandInbox).
//!
//! ```text
//! pump on [ms]             pump off
//! cal capture <ch> <low|high>
//! cal set <ch> <low> <high>
//! cal save | cal load | cal reset | cal show
//! ```
//!
//! `<ch>` is one of `soil`, `light`, `reservoir`.

use crate::app::commands::AppCommand;
use crate::calibration::{CalibrationRefs, RefPoint};
use crate::sensors::Channel;

/// Why a console line was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    UnknownCommand,
    MissingArgument(&'static str),
    BadArgument(&'static str),
    TrailingInput,
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty line"),
            Self::UnknownCommand => write!(f, "unknown command"),
            Self::MissingArgument(what) => write!(f, "missing {}", what),
            Self::BadArgument(what) => write!(f, "invalid {}", what),
            Self::TrailingInput => write!(f, "unexpected trailing input"),
        }
    }
}

impl core::error::Error for ParseError {}

/// Parse one console line.  Keywords are case-insensitive.
pub fn parse_line(line: &str) -> Result<AppCommand, ParseError> {
    let mut words = line.split_whitespace();
    let head = words.next().ok_or(ParseError::Empty)?;

    let cmd = if head.eq_ignore_ascii_case("pump") {
        parse_pump(&mut words)?
    } else if head.eq_ignore_ascii_case("cal") {
        parse_cal(&mut words)?
    } else {
        return Err(ParseError::UnknownCommand);
    };

    if words.next().is_some() {
        return Err(ParseError::TrailingInput);
    }
    Ok(cmd)
}

fn parse_pump<'a>(words: &mut impl Iterator<Item = &'a str>) -> Result<AppCommand, ParseError> {
    let action = words.next().ok_or(ParseError::MissingArgument("on/off"))?;
    if action.eq_ignore_ascii_case("on") {
        let duration_ms = words
            .next()
            .map(|w| w.parse::<u32>().map_err(|_| ParseError::BadArgument("duration")))
            .transpose()?;
        Ok(AppCommand::Pump {
            on: true,
            duration_ms,
        })
    } else if action.eq_ignore_ascii_case("off") {
        Ok(AppCommand::Pump {
            on: false,
            duration_ms: None,
        })
    } else {
        Err(ParseError::BadArgument("on/off"))
    }
}

fn parse_cal<'a>(words: &mut impl Iterator<Item = &'a str>) -> Result<AppCommand, ParseError> {
    let action = words.next().ok_or(ParseError::MissingArgument("cal action"))?;
    match action.to_ascii_lowercase().as_str() {
        "save" => Ok(AppCommand::SaveCalibration),
        "load" => Ok(AppCommand::LoadCalibration),
        "reset" => Ok(AppCommand::ResetCalibration),
        "show" => Ok(AppCommand::ShowCalibration),
        "capture" => {
            let channel = parse_channel(words.next())?;
            let point = match words.next() {
                None => return Err(ParseError::MissingArgument("low/high")),
                Some(w) if w.eq_ignore_ascii_case("low") => RefPoint::Low,
                Some(w) if w.eq_ignore_ascii_case("high") => RefPoint::High,
                Some(_) => return Err(ParseError::BadArgument("low/high")),
            };
            Ok(AppCommand::CaptureReference { channel, point })
        }
        "set" => {
            let channel = parse_channel(words.next())?;
            let low = parse_raw(words.next(), "low reference")?;
            let high = parse_raw(words.next(), "high reference")?;
            Ok(AppCommand::SetCalibration {
                channel,
                refs: CalibrationRefs::new(low, high),
            })
        }
        _ => Err(ParseError::UnknownCommand),
    }
}

fn parse_channel(word: Option<&str>) -> Result<Channel, ParseError> {
    let word = word.ok_or(ParseError::MissingArgument("channel"))?;
    Channel::ALL
        .into_iter()
        .find(|c| word.eq_ignore_ascii_case(c.name()))
        .ok_or(ParseError::BadArgument("channel"))
}

fn parse_raw(word: Option<&str>, what: &'static str) -> Result<i32, ParseError> {
    word.ok_or(ParseError::MissingArgument(what))?
        .parse::<i32>()
        .map_err(|_| ParseError::BadArgument(what))
}
