//! Synthesizer snapshots: the persisted form of a patch.
//!
//! A [`Snapshot`] holds steady-state parameter targets only; ramps in flight
//! and sounding voices are not part of it. Capturing a synthesizer, restoring
//! the result and capturing again yields an equal snapshot.
//!
//! # Formats
//!
//! JSON is the exchange format of preset stores; TOML is the hand-editable
//! on-disk format. [`Snapshot::load`] and [`Snapshot::save`] pick the codec
//! from the file extension.
//!
//! ```toml
//! name = "Reese"
//! mode = "mono"
//! master_gain = 0.8
//! attack = 0.01
//! release = 0.3
//! portamento = 0.08
//! default_waveform = "sine"
//!
//! [[oscillators]]
//! type = "sawtooth"
//! volume = 0.75
//! semitone_offset = 0
//! fine_detune = -12.0
//! destination = "filter0"
//!
//! [[filters]]
//! type = "lowpass"
//! frequency = 1200.0
//! gain = 0.0
//! q = 4.0
//!
//! [[routes]]
//! source = "osc0"
//! destination = "filter0"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use sonant_core::{AudioBackend, FilterType, Waveform};
use sonant_engine::{
    DEFAULT_MASTER_GAIN, DEFAULT_VOLUME, FilterChange, FilterParams, Globals, Mode, NodeRef,
    OscillatorChange, Synthesizer,
};

use crate::error::ConfigError;
use crate::validation::validate_snapshot;

/// Codec selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `.json`
    Json,
    /// `.toml`
    Toml,
}

impl Format {
    /// Codec for `path`, by extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => Ok(Format::Json),
            Some("toml") => Ok(Format::Toml),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// One oscillator's stored settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct OscillatorSnapshot {
    /// Waveform.
    #[serde(rename = "type")]
    pub waveform: Waveform,
    /// Peak level, 0–1.
    pub volume: f32,
    /// Transposition in semitones.
    #[serde(default)]
    pub semitone_offset: i32,
    /// Fine pitch offset in cents.
    #[serde(default)]
    pub fine_detune: f32,
    /// Where the oscillator's output goes.
    #[serde(default = "master")]
    pub destination: NodeRef,
}

impl Default for OscillatorSnapshot {
    fn default() -> Self {
        Self {
            waveform: Waveform::default(),
            volume: DEFAULT_VOLUME,
            semitone_offset: 0,
            fine_detune: 0.0,
            destination: NodeRef::Master,
        }
    }
}

/// One filter's stored settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FilterSnapshot {
    /// Response type.
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    /// Cutoff or center frequency in Hz.
    pub frequency: f32,
    /// Shelf / peak gain in dB.
    #[serde(default)]
    pub gain: f32,
    /// Resonance.
    pub q: f32,
}

impl Default for FilterSnapshot {
    fn default() -> Self {
        FilterParams::default().into()
    }
}

impl From<FilterParams> for FilterSnapshot {
    fn from(p: FilterParams) -> Self {
        Self {
            filter_type: p.filter_type,
            frequency: p.frequency,
            gain: p.gain,
            q: p.q,
        }
    }
}

/// One routing table entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Route {
    /// Oscillator or filter.
    pub source: NodeRef,
    /// Filter or master.
    pub destination: NodeRef,
}

/// A complete patch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    /// Name of the patch; the key in a preset store.
    pub name: String,
    /// Note priority mode.
    #[serde(default)]
    pub mode: Mode,
    /// Master gain, 0–1.
    #[serde(default = "default_master_gain")]
    pub master_gain: f32,
    /// Envelope rise time in seconds.
    pub attack: f32,
    /// Envelope fall time in seconds.
    pub release: f32,
    /// Mono glide time in seconds.
    pub portamento: f32,
    /// Waveform for oscillators added after loading.
    #[serde(default)]
    pub default_waveform: Waveform,
    /// Oscillators in index order.
    #[serde(default)]
    pub oscillators: Vec<OscillatorSnapshot>,
    /// Filters in index order.
    #[serde(default)]
    pub filters: Vec<FilterSnapshot>,
    /// Routing table.
    #[serde(default)]
    pub routes: Vec<Route>,
}

fn master() -> NodeRef {
    NodeRef::Master
}

fn default_master_gain() -> f32 {
    DEFAULT_MASTER_GAIN
}

impl Snapshot {
    /// An empty patch with engine defaults.
    pub fn new(name: impl Into<String>) -> Self {
        let globals = Globals::default();
        Self {
            name: name.into(),
            mode: Mode::default(),
            master_gain: DEFAULT_MASTER_GAIN,
            attack: globals.attack,
            release: globals.release,
            portamento: globals.portamento,
            default_waveform: globals.waveform,
            oscillators: Vec::new(),
            filters: Vec::new(),
            routes: Vec::new(),
        }
    }

    /// Record the steady-state parameters of `synth`.
    pub fn capture<B: AudioBackend>(name: impl Into<String>, synth: &Synthesizer<B>) -> Self {
        let globals = synth.globals();
        let router = synth.router();
        let oscillators = synth
            .oscillators()
            .iter()
            .enumerate()
            .map(|(i, osc)| {
                let p = osc.params();
                OscillatorSnapshot {
                    waveform: p.waveform,
                    volume: p.volume,
                    semitone_offset: p.semitone_offset,
                    fine_detune: p.fine_detune,
                    destination: router
                        .destination(NodeRef::Oscillator(i))
                        .unwrap_or(NodeRef::Master),
                }
            })
            .collect();

        Self {
            name: name.into(),
            mode: synth.mode(),
            master_gain: synth.master_gain(),
            attack: globals.attack,
            release: globals.release,
            portamento: globals.portamento,
            default_waveform: globals.waveform,
            oscillators,
            filters: synth
                .filters()
                .iter()
                .map(|f| FilterSnapshot::from(*f.params()))
                .collect(),
            routes: router
                .routes()
                .map(|(source, destination)| Route {
                    source,
                    destination,
                })
                .collect(),
        }
    }

    /// Check the snapshot without applying it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Ok(validate_snapshot(self)?)
    }

    /// Build a synthesizer on `backend` from this snapshot.
    ///
    /// The snapshot is validated first; nothing is created when it refers
    /// to oscillators or filters it does not contain.
    pub fn restore<B: AudioBackend>(&self, backend: B) -> Result<Synthesizer<B>, ConfigError> {
        self.validate()?;

        let mut synth = Synthesizer::new(backend)?;
        synth.set_mode(self.mode)?;
        synth.set_master_gain(self.master_gain)?;
        synth.set_attack(self.attack)?;
        synth.set_release(self.release)?;
        synth.set_portamento(self.portamento)?;

        for filter in &self.filters {
            let index = synth.add_filter()?;
            for change in [
                FilterChange::Type(filter.filter_type),
                FilterChange::Frequency(filter.frequency),
                FilterChange::Gain(filter.gain),
                FilterChange::Q(filter.q),
            ] {
                synth.set_filter(index, change)?;
            }
        }

        for osc in &self.oscillators {
            synth.set_default_waveform(osc.waveform);
            let index = synth.add_oscillator()?;
            for change in [
                OscillatorChange::Volume(osc.volume),
                OscillatorChange::SemitoneOffset(osc.semitone_offset),
                OscillatorChange::FineDetune(osc.fine_detune),
            ] {
                synth.set_oscillator(index, change)?;
            }
            if osc.destination != NodeRef::Master {
                synth.set_route(NodeRef::Oscillator(index), osc.destination)?;
            }
        }
        synth.set_default_waveform(self.default_waveform);

        tracing::debug!(
            name = %self.name,
            oscillators = self.oscillators.len(),
            filters = self.filters.len(),
            "snapshot restored"
        );
        Ok(synth)
    }

    /// Parse from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from TOML.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load from a `.json` or `.toml` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        match format {
            Format::Json => Self::from_json(&content),
            Format::Toml => Self::from_toml(&content),
        }
    }

    /// Save to a `.json` or `.toml` file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = match Format::from_path(path)? {
            Format::Json => self.to_json()?,
            Format::Toml => self.to_toml()?,
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new("init")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonant_core::SimBackend;

    fn patch() -> Synthesizer<SimBackend> {
        let mut synth = Synthesizer::new(SimBackend::new()).unwrap();
        synth.set_mode(Mode::Mono).unwrap();
        synth.set_release(0.3).unwrap();
        let a = synth.add_oscillator().unwrap();
        synth.set_default_waveform(Waveform::Square);
        let b = synth.add_oscillator().unwrap();
        let f = synth.add_filter().unwrap();
        synth
            .set_oscillator(b, OscillatorChange::SemitoneOffset(-12))
            .unwrap();
        synth
            .set_oscillator(a, OscillatorChange::FineDetune(7.0))
            .unwrap();
        synth.set_filter(f, FilterChange::Frequency(800.0)).unwrap();
        synth
            .set_route(NodeRef::Oscillator(b), NodeRef::Filter(f))
            .unwrap();
        synth
    }

    #[test]
    fn test_capture_records_targets() {
        let snap = Snapshot::capture("bass", &patch());
        assert_eq!(snap.name, "bass");
        assert_eq!(snap.mode, Mode::Mono);
        assert_eq!(snap.release, 0.3);
        assert_eq!(snap.default_waveform, Waveform::Square);
        assert_eq!(snap.oscillators.len(), 2);
        assert_eq!(snap.oscillators[0].waveform, Waveform::Sine);
        assert_eq!(snap.oscillators[1].waveform, Waveform::Square);
        assert_eq!(snap.oscillators[1].destination, NodeRef::Filter(0));
        assert_eq!(snap.filters[0].frequency, 800.0);
        assert_eq!(
            snap.routes,
            vec![
                Route {
                    source: NodeRef::Oscillator(0),
                    destination: NodeRef::Master
                },
                Route {
                    source: NodeRef::Oscillator(1),
                    destination: NodeRef::Filter(0)
                },
                Route {
                    source: NodeRef::Filter(0),
                    destination: NodeRef::Master
                },
            ]
        );
    }

    #[test]
    fn test_capture_restore_capture_is_stable() {
        let first = Snapshot::capture("p", &patch());
        let restored = first.restore(SimBackend::new()).unwrap();
        assert_eq!(Snapshot::capture("p", &restored), first);
    }

    #[test]
    fn test_restore_rejects_dangling_route_before_building() {
        let mut snap = Snapshot::capture("p", &patch());
        snap.oscillators[0].destination = NodeRef::Filter(9);
        snap.routes.retain(|r| r.source != NodeRef::Oscillator(0));
        let err = snap.restore(SimBackend::new()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)), "got {err:?}");
    }

    #[test]
    fn test_text_codecs() {
        let snap = Snapshot::capture("p", &patch());
        assert_eq!(Snapshot::from_json(&snap.to_json().unwrap()).unwrap(), snap);
        assert_eq!(Snapshot::from_toml(&snap.to_toml().unwrap()).unwrap(), snap);

        let json = snap.to_json().unwrap();
        assert!(json.contains("\"destination\": \"filter0\""), "{json}");
        assert!(json.contains("\"mode\": \"mono\""), "{json}");
    }

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let snap = Snapshot::from_toml(
            r#"
name = "tiny"
attack = 0.02
release = 0.5
portamento = 0.0

[[oscillators]]
type = "triangle"
volume = 0.5
"#,
        )
        .unwrap();
        assert_eq!(snap.mode, Mode::Poly);
        assert_eq!(snap.master_gain, 1.0);
        assert_eq!(snap.oscillators[0].destination, NodeRef::Master);
        assert_eq!(snap.oscillators[0].semitone_offset, 0);
        assert!(snap.routes.is_empty());
        assert!(snap.validate().is_ok());
    }

    #[test]
    fn test_bad_node_name_fails_to_parse() {
        let err = Snapshot::from_json(
            r#"{"name":"x","attack":0,"release":0,"portamento":0,
                "routes":[{"source":"osc","destination":"master"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Format::from_path(Path::new("a/b.JSON")).unwrap(), Format::Json);
        assert_eq!(Format::from_path(Path::new("b.toml")).unwrap(), Format::Toml);
        assert!(matches!(
            Format::from_path(Path::new("b.yaml")),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }
}
