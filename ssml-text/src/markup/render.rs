//! Rendering of segments and standalone tags into SSML strings.

use log::{debug, warn};

use super::{MarkupSegment, TagKind};
use crate::error::{Result, TextError};
use crate::escape::escape;

const PHONEME_ALPHABET: &str = "bopomo";
const PHONEME_LANG: &str = "TW";

/// Upper bound for a pause, in milliseconds.
pub const MAX_BREAK_MS: i64 = 5000;

const RATE_DEFAULT: f64 = 1.0;
const RATE_MIN: f64 = 0.8;
const RATE_MAX: f64 = 1.2;
const PITCH_DEFAULT: i32 = 0;
const PITCH_MIN: i32 = -2;
const PITCH_MAX: i32 = 2;
const VOLUME_DEFAULT: f64 = 0.0;
const VOLUME_MIN: f64 = -6.0;
const VOLUME_MAX: f64 = 6.0;

/// Prosody parameters for a `<prosody>` tag.
///
/// Values outside the supported range are clamped when rendered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prosody {
    /// Speaking rate multiplier (0.8-1.2, default 1.0)
    pub rate: f64,
    /// Pitch shift in semitones (-2 to 2, default 0)
    pub pitch: i32,
    /// Volume change in dB (-6.0 to 6.0, default 0.0)
    pub volume: f64,
}

impl Default for Prosody {
    fn default() -> Self {
        Self {
            rate: RATE_DEFAULT,
            pitch: PITCH_DEFAULT,
            volume: VOLUME_DEFAULT,
        }
    }
}

impl Prosody {
    /// Create prosody parameters, rejecting NaN and infinite values.
    pub fn new(rate: f64, pitch: i32, volume: f64) -> Result<Self> {
        if !rate.is_finite() {
            return Err(TextError::InvalidArgument(format!("rate must be finite, got {rate}")));
        }
        if !volume.is_finite() {
            return Err(TextError::InvalidArgument(format!(
                "volume must be finite, got {volume}"
            )));
        }
        Ok(Self { rate, pitch, volume })
    }

    pub fn with_rate(self, rate: f64) -> Result<Self> {
        Self::new(rate, self.pitch, self.volume)
    }

    pub fn with_pitch(mut self, pitch: i32) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn with_volume(self, volume: f64) -> Result<Self> {
        Self::new(self.rate, self.pitch, volume)
    }

    pub fn is_default(&self) -> bool {
        self.rate == RATE_DEFAULT && self.pitch == PITCH_DEFAULT && self.volume == VOLUME_DEFAULT
    }

    /// Read `rate`, `pitch` (`st` suffix) and `volume` (`dB` suffix) from a
    /// segment. Missing attributes keep their defaults.
    fn from_segment(segment: &MarkupSegment) -> Result<Self> {
        let mut prosody = Self::default();

        if let Some(value) = segment.attribute("rate") {
            let number = value.trim();
            let number = number.strip_suffix('x').unwrap_or(number);
            prosody.rate =
                parse_finite(number).ok_or_else(|| invalid_attribute("prosody", "rate", value))?;
        }
        if let Some(value) = segment.attribute("pitch") {
            prosody.pitch = parse_pitch(value).ok_or_else(|| invalid_attribute("prosody", "pitch", value))?;
        }
        if let Some(value) = segment.attribute("volume") {
            let number = value.trim();
            let number = number.strip_suffix("dB").unwrap_or(number);
            prosody.volume =
                parse_finite(number).ok_or_else(|| invalid_attribute("prosody", "volume", value))?;
        }

        Ok(prosody)
    }
}

/// Render one segment into its SSML text.
///
/// Elements the renderer does not know (such as `speak`) render to an empty
/// string, dropping their leading text.
pub fn render(segment: &MarkupSegment) -> Result<String> {
    match &segment.kind {
        TagKind::Voice | TagKind::TrailingText => Ok(segment.text.clone()),
        TagKind::Phoneme => {
            let ph = segment
                .attribute("ph")
                .ok_or_else(|| missing_attribute("phoneme", "ph"))?;
            Ok(render_phoneme(&segment.text, &escape(ph)))
        }
        TagKind::Break => {
            let time = segment
                .attribute("time")
                .ok_or_else(|| missing_attribute("break", "time"))?;
            let ms = parse_break_time(time).ok_or_else(|| invalid_attribute("break", "time", time))?;
            Ok(render_break(ms))
        }
        TagKind::Prosody => {
            let prosody = Prosody::from_segment(segment)?;
            Ok(render_prosody(&segment.text, &prosody))
        }
        TagKind::Other(name) => {
            debug!("Skipping unsupported <{}> element", name);
            Ok(String::new())
        }
    }
}

/// Wrap already-escaped text in a phoneme tag.
pub fn render_phoneme(text: &str, ph: &str) -> String {
    format!(r#"<phoneme alphabet="{PHONEME_ALPHABET}" lang="{PHONEME_LANG}" ph="{ph}">{text}</phoneme>"#)
}

/// Render a pause, clamped to 0-5000 ms.
pub fn render_break(ms: i64) -> String {
    let clamped = ms.clamp(0, MAX_BREAK_MS);
    if clamped != ms {
        warn!("Break time {}ms out of range, using {}ms", ms, clamped);
    }
    format!(r#"<break time="{clamped}ms"/>"#)
}

/// Wrap already-escaped text in a prosody tag.
///
/// Only parameters that differ from their defaults are written; when all are
/// default the tag still carries `rate="1.0"`.
pub fn render_prosody(text: &str, prosody: &Prosody) -> String {
    let mut attributes = String::new();

    if prosody.rate != RATE_DEFAULT {
        let rate = clamp_logged("rate", prosody.rate, RATE_MIN, RATE_MAX);
        attributes.push_str(&format!(r#" rate="{rate:?}""#));
    }

    if prosody.pitch != PITCH_DEFAULT {
        let pitch = prosody.pitch.clamp(PITCH_MIN, PITCH_MAX);
        if pitch != prosody.pitch {
            warn!("Pitch {} out of range, using {}", prosody.pitch, pitch);
        }
        let sign = if pitch > 0 { "+" } else { "" };
        attributes.push_str(&format!(r#" pitch="{sign}{pitch}st""#));
    }

    if prosody.volume != VOLUME_DEFAULT {
        let volume = clamp_logged("volume", prosody.volume, VOLUME_MIN, VOLUME_MAX);
        let sign = if volume > 0.0 { "+" } else { "" };
        attributes.push_str(&format!(r#" volume="{sign}{volume:?}dB""#));
    }

    if attributes.is_empty() {
        attributes.push_str(r#" rate="1.0""#);
    }

    format!("<prosody{attributes}>{text}</prosody>")
}

fn clamp_logged(name: &str, value: f64, min: f64, max: f64) -> f64 {
    let clamped = value.clamp(min, max);
    if clamped != value {
        warn!("{} {} out of range, using {}", name, value, clamped);
    }
    clamped
}

/// Parse a break duration (`500ms`, `2s`, or bare milliseconds).
fn parse_break_time(value: &str) -> Option<i64> {
    let value = value.trim();
    let (number, scale) = if let Some(number) = value.strip_suffix("ms") {
        (number, 1.0)
    } else if let Some(number) = value.strip_suffix('s') {
        (number, 1000.0)
    } else {
        (value, 1.0)
    };
    parse_finite(number.trim()).map(|n| (n * scale) as i64)
}

/// Parse a pitch in whole semitones; fractional values are truncated.
fn parse_pitch(value: &str) -> Option<i32> {
    let number = value.trim();
    let number = number.strip_suffix("st").unwrap_or(number).trim();
    number
        .parse::<i64>()
        .ok()
        .or_else(|| parse_finite(number).map(|n| n as i64))
        .map(|n| n.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
}

fn parse_finite(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn missing_attribute(tag: &str, name: &str) -> TextError {
    TextError::MissingAttribute {
        tag: tag.to_string(),
        name: name.to_string(),
    }
}

fn invalid_attribute(tag: &str, name: &str, value: &str) -> TextError {
    TextError::InvalidAttribute {
        tag: tag.to_string(),
        name: name.to_string(),
        value: value.to_string(),
    }
}
