//! The closed command set and the channel that carries it.
//!
//! Every mutation the engine supports is one [`Command`] variant.
//! [`Synthesizer::dispatch`] applies a command synchronously; a
//! [`CommandBus`] lets other threads enqueue commands that the engine's
//! owner drains with [`CommandBus::pump`].
//!
//! ```rust
//! use sonant_core::SimBackend;
//! use sonant_engine::{Command, CommandBus, Synthesizer};
//!
//! let mut synth = Synthesizer::new(SimBackend::new()).unwrap();
//! let bus = CommandBus::new();
//!
//! let tx = bus.sender();
//! std::thread::spawn(move || {
//!     tx.send(Command::AddOscillator).unwrap();
//!     tx.send(Command::NoteOn { note: 60, velocity: 100 }).unwrap();
//! })
//! .join()
//! .unwrap();
//!
//! assert_eq!(bus.pump(&mut synth, usize::MAX), 2);
//! assert_eq!(synth.active_voice_count(), 1);
//! ```

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use sonant_core::{AudioBackend, Waveform};

use crate::error::{EngineError, Result};
use crate::filter::FilterChange;
use crate::oscillator::OscillatorChange;
use crate::router::NodeRef;
use crate::synth::{Mode, Synthesizer};

/// One engine mutation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Press a key.
    NoteOn {
        /// Note number, 0–127.
        note: u8,
        /// Strike velocity, 0–127.
        velocity: u8,
    },
    /// Release a key.
    NoteOff {
        /// Note number, 0–127.
        note: u8,
    },
    /// Append an oscillator.
    AddOscillator,
    /// Append a filter.
    AddFilter,
    /// Switch note priority mode.
    SetMode(Mode),
    /// Ramp the master gain.
    SetMasterGain(f32),
    /// Set the attack time everywhere.
    SetAttack(f32),
    /// Set the release time everywhere.
    SetRelease(f32),
    /// Set the glide time everywhere.
    SetPortamento(f32),
    /// Set the waveform of oscillators created from now on.
    SetDefaultWaveform(Waveform),
    /// Release every voice.
    AllNotesOff,
    /// Change one oscillator parameter.
    Oscillator {
        /// Oscillator index.
        index: usize,
        /// The change.
        change: OscillatorChange,
    },
    /// Change one filter parameter.
    Filter {
        /// Filter index.
        index: usize,
        /// The change.
        change: FilterChange,
    },
    /// Reroute a source.
    SetRoute {
        /// Oscillator or filter being rerouted.
        source: NodeRef,
        /// New destination.
        destination: NodeRef,
    },
}

/// What a successful command produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// Applied; nothing to report.
    Done,
    /// A new oscillator at this index.
    OscillatorAdded(usize),
    /// A new filter at this index.
    FilterAdded(usize),
    /// The source's destination before the change.
    Rerouted {
        /// Previous destination.
        previous: NodeRef,
    },
}

impl<B: AudioBackend> Synthesizer<B> {
    /// Apply one command.
    ///
    /// A rejected command leaves the engine unchanged.
    pub fn dispatch(&mut self, command: Command) -> Result<Dispatched> {
        let outcome = match command {
            Command::NoteOn { note, velocity } => self.note_on(note, velocity),
            Command::NoteOff { note } => self.note_off(note),
            Command::AddOscillator => return self.add_oscillator().map(Dispatched::OscillatorAdded),
            Command::AddFilter => return self.add_filter().map(Dispatched::FilterAdded),
            Command::SetMode(mode) => self.set_mode(mode),
            Command::SetMasterGain(gain) => self.set_master_gain(gain),
            Command::SetAttack(t) => self.set_attack(t),
            Command::SetRelease(t) => self.set_release(t),
            Command::SetPortamento(t) => self.set_portamento(t),
            Command::SetDefaultWaveform(w) => {
                self.set_default_waveform(w);
                Ok(())
            }
            Command::AllNotesOff => self.all_notes_off(),
            Command::Oscillator { index, change } => self.set_oscillator(index, change),
            Command::Filter { index, change } => self.set_filter(index, change),
            Command::SetRoute {
                source,
                destination,
            } => {
                return self
                    .set_route(source, destination)
                    .map(|previous| Dispatched::Rerouted { previous });
            }
        };
        outcome.map(|()| Dispatched::Done)
    }
}

/// Something the bus reports back to command senders.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// The engine refused a command.
    Rejected {
        /// The refused command.
        command: Command,
        /// Why.
        reason: EngineError,
    },
}

/// Most rejection notices held for readers. Later ones are dropped (they
/// are still logged) until the queue is drained.
pub const NOTICE_CAPACITY: usize = 64;

/// Command transport between any number of senders and the engine owner.
///
/// Commands are applied in the order they were sent, one at a time, on the
/// thread that calls [`pump`](Self::pump). Rejections are queued as
/// [`Notice`]s, at most [`NOTICE_CAPACITY`] of them; nobody has to read
/// them.
#[derive(Debug)]
pub struct CommandBus {
    command_tx: Sender<Command>,
    command_rx: Receiver<Command>,
    notice_tx: Sender<Notice>,
    notice_rx: Receiver<Notice>,
}

impl CommandBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        let (command_tx, command_rx) = unbounded();
        let (notice_tx, notice_rx) = bounded(NOTICE_CAPACITY);
        Self {
            command_tx,
            command_rx,
            notice_tx,
            notice_rx,
        }
    }

    /// A sender for enqueuing commands. Cheap to clone.
    pub fn sender(&self) -> Sender<Command> {
        self.command_tx.clone()
    }

    /// Enqueue a command (non-blocking).
    pub fn send(&self, command: Command) {
        // The bus owns a receiver, so the channel cannot be disconnected.
        let _ = self.command_tx.send(command);
    }

    /// A receiver for rejection notices.
    pub fn notices(&self) -> Receiver<Notice> {
        self.notice_rx.clone()
    }

    /// Number of commands waiting.
    pub fn pending(&self) -> usize {
        self.command_rx.len()
    }

    /// Dispatch up to `max` queued commands. Returns how many were taken off
    /// the queue, rejected ones included.
    pub fn pump<B: AudioBackend>(&self, synth: &mut Synthesizer<B>, max: usize) -> usize {
        let mut taken = 0;
        while taken < max {
            let Ok(command) = self.command_rx.try_recv() else {
                break;
            };
            taken += 1;
            if let Err(reason) = synth.dispatch(command) {
                tracing::warn!(?command, %reason, "command rejected");
                let _ = self.notice_tx.try_send(Notice::Rejected { command, reason });
            }
        }
        taken
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}
