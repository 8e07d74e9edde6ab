//! Line-oriented performance scripts.
//!
//! One step per line; blank lines and `#` comments are ignored.
//!
//! ```text
//! add osc                  # append an oscillator
//! add filter               # append a filter
//! mode mono                # poly | mono
//! gain 0.8                 # master gain
//! attack 0.02              # seconds; also release, portamento
//! waveform saw             # default for oscillators added later
//! osc 0 waveform square    # waveform | volume | semitone | detune
//!                          # | portamento | attack | release
//! filter 0 type bandpass   # type | frequency | gain | q
//! route osc0 filter0       # source destination
//! on 60 100                # note, optional velocity (default 100)
//! off 60
//! alloff
//! wait 0.5                 # advance the clock
//! ```

use std::str::FromStr;

use sonant_core::{FilterType, Waveform};
use sonant_engine::{Command, FilterChange, NodeRef, OscillatorChange};
use thiserror::Error;

/// Velocity used when `on` omits one.
pub const DEFAULT_VELOCITY: u8 = 100;

/// One parsed script line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Send a command to the engine.
    Command(Command),
    /// Let time pass, in seconds.
    Wait(f64),
}

/// A script line that could not be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// First word names no step.
    #[error("line {line}: unknown command '{word}'")]
    UnknownCommand {
        /// 1-based line number.
        line: usize,
        /// The offending word.
        word: String,
    },

    /// A required argument is absent.
    #[error("line {line}: missing {what}")]
    Missing {
        /// 1-based line number.
        line: usize,
        /// What was expected.
        what: &'static str,
    },

    /// An argument did not parse.
    #[error("line {line}: invalid {what} '{value}'")]
    Invalid {
        /// 1-based line number.
        line: usize,
        /// What was expected.
        what: &'static str,
        /// The offending text.
        value: String,
    },

    /// Extra words after a complete step.
    #[error("line {line}: unexpected '{extra}'")]
    Trailing {
        /// 1-based line number.
        line: usize,
        /// The first extra word.
        extra: String,
    },
}

/// Parse a whole script.
pub fn parse(source: &str) -> Result<Vec<Step>, ScriptError> {
    source
        .lines()
        .enumerate()
        .filter_map(|(i, raw)| {
            let text = raw.split('#').next().unwrap_or_default().trim();
            (!text.is_empty()).then(|| parse_line(i + 1, text))
        })
        .collect()
}

/// Parse a single non-empty line.
pub fn parse_line(line: usize, text: &str) -> Result<Step, ScriptError> {
    let mut words = Words {
        line,
        inner: text.split_whitespace(),
    };
    let head = words.next("command")?;

    let step = match head.to_ascii_lowercase().as_str() {
        "add" => match words.next("osc or filter")? {
            "osc" | "oscillator" => Step::Command(Command::AddOscillator),
            "filter" => Step::Command(Command::AddFilter),
            other => return Err(words.invalid("node kind", other)),
        },
        "mode" => Step::Command(Command::SetMode(words.parse("mode")?)),
        "gain" => Step::Command(Command::SetMasterGain(words.parse("gain")?)),
        "attack" => Step::Command(Command::SetAttack(words.parse("seconds")?)),
        "release" => Step::Command(Command::SetRelease(words.parse("seconds")?)),
        "portamento" | "glide" => Step::Command(Command::SetPortamento(words.parse("seconds")?)),
        "waveform" => Step::Command(Command::SetDefaultWaveform(parse_waveform(&mut words)?)),
        "osc" => {
            let index = words.parse("oscillator index")?;
            let change = parse_oscillator_change(&mut words)?;
            Step::Command(Command::Oscillator { index, change })
        }
        "filter" => {
            let index = words.parse("filter index")?;
            let change = parse_filter_change(&mut words)?;
            Step::Command(Command::Filter { index, change })
        }
        "route" => Step::Command(Command::SetRoute {
            source: words.parse::<NodeRef>("source")?,
            destination: words.parse::<NodeRef>("destination")?,
        }),
        "on" => {
            let note = words.parse("note")?;
            let velocity = words.parse_opt("velocity")?.unwrap_or(DEFAULT_VELOCITY);
            Step::Command(Command::NoteOn { note, velocity })
        }
        "off" => Step::Command(Command::NoteOff {
            note: words.parse("note")?,
        }),
        "alloff" | "panic" => Step::Command(Command::AllNotesOff),
        "wait" => {
            let secs: f64 = words.parse("seconds")?;
            if !secs.is_finite() || secs < 0.0 {
                return Err(words.invalid("seconds", &secs.to_string()));
            }
            Step::Wait(secs)
        }
        _ => {
            return Err(ScriptError::UnknownCommand {
                line,
                word: head.to_string(),
            });
        }
    };

    words.finish()?;
    Ok(step)
}

fn parse_oscillator_change(words: &mut Words<'_>) -> Result<OscillatorChange, ScriptError> {
    let change = match words.next("oscillator parameter")? {
        "waveform" | "type" => OscillatorChange::Waveform(parse_waveform(words)?),
        "volume" => OscillatorChange::Volume(words.parse("volume")?),
        "semitone" | "semitones" => OscillatorChange::SemitoneOffset(words.parse("semitones")?),
        "detune" => OscillatorChange::FineDetune(words.parse("cents")?),
        "portamento" | "glide" => OscillatorChange::Portamento(words.parse("seconds")?),
        "attack" => OscillatorChange::Attack(words.parse("seconds")?),
        "release" => OscillatorChange::Release(words.parse("seconds")?),
        other => return Err(words.invalid("oscillator parameter", other)),
    };
    Ok(change)
}

fn parse_filter_change(words: &mut Words<'_>) -> Result<FilterChange, ScriptError> {
    let change = match words.next("filter parameter")? {
        "type" => FilterChange::Type(words.parse::<FilterType>("filter type")?),
        "frequency" | "freq" | "cutoff" => FilterChange::Frequency(words.parse("frequency")?),
        "gain" => FilterChange::Gain(words.parse("gain")?),
        "q" => FilterChange::Q(words.parse("q")?),
        other => return Err(words.invalid("filter parameter", other)),
    };
    Ok(change)
}

/// Waveform names, accepting `saw` for sawtooth.
fn parse_waveform(words: &mut Words<'_>) -> Result<Waveform, ScriptError> {
    let word = words.next("waveform")?;
    if word.eq_ignore_ascii_case("saw") {
        return Ok(Waveform::Sawtooth);
    }
    word.parse().map_err(|_| words.invalid("waveform", word))
}

struct Words<'a> {
    line: usize,
    inner: std::str::SplitWhitespace<'a>,
}

impl<'a> Words<'a> {
    fn next(&mut self, what: &'static str) -> Result<&'a str, ScriptError> {
        self.inner.next().ok_or(ScriptError::Missing {
            line: self.line,
            what,
        })
    }

    fn parse<T: FromStr>(&mut self, what: &'static str) -> Result<T, ScriptError> {
        let word = self.next(what)?;
        word.parse().map_err(|_| self.invalid(what, word))
    }

    fn parse_opt<T: FromStr>(&mut self, what: &'static str) -> Result<Option<T>, ScriptError> {
        match self.inner.next() {
            Some(word) => word.parse().map(Some).map_err(|_| self.invalid(what, word)),
            None => Ok(None),
        }
    }

    fn invalid(&self, what: &'static str, value: &str) -> ScriptError {
        ScriptError::Invalid {
            line: self.line,
            what,
            value: value.to_string(),
        }
    }

    fn finish(mut self) -> Result<(), ScriptError> {
        match self.inner.next() {
            Some(extra) => Err(ScriptError::Trailing {
                line: self.line,
                extra: extra.to_string(),
            }),
            None => Ok(()),
        }
    }
}
