//! Variant, preview and download identifiers
//!
//! Every rendering of a mastered target is addressed by one of these keys, so
//! file names can be derived later without extra bookkeeping.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output sample format requested from the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BitDepth {
    Pcm16,
    Pcm24,
}

impl BitDepth {
    pub fn bits(&self) -> u16 {
        match self {
            BitDepth::Pcm16 => 16,
            BitDepth::Pcm24 => 24,
        }
    }
}

/// A mastered rendering that gets its own preview clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VariantKey {
    #[serde(rename = "limited")]
    Limited,
    #[serde(rename = "low")]
    Low,
    #[serde(rename = "high")]
    High,
    #[serde(rename = "nolimiter")]
    NoLimiter,
    #[serde(rename = "nolimiter_normalized")]
    NoLimiterNormalized,
}

impl VariantKey {
    pub const ALL: [VariantKey; 5] = [
        VariantKey::Limited,
        VariantKey::Low,
        VariantKey::High,
        VariantKey::NoLimiter,
        VariantKey::NoLimiterNormalized,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VariantKey::Limited => "limited",
            VariantKey::Low => "low",
            VariantKey::High => "high",
            VariantKey::NoLimiter => "nolimiter",
            VariantKey::NoLimiterNormalized => "nolimiter_normalized",
        }
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A preview clip: the untouched target or one of the variants
///
/// Serialized as its flat name (`original`, `limited`, ...) so it can key
/// JSON maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PreviewKey {
    Original,
    Variant(VariantKey),
}

impl PreviewKey {
    pub fn all() -> impl Iterator<Item = PreviewKey> {
        std::iter::once(PreviewKey::Original).chain(VariantKey::ALL.into_iter().map(PreviewKey::Variant))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PreviewKey::Original => "original",
            PreviewKey::Variant(variant) => variant.as_str(),
        }
    }
}

impl From<VariantKey> for PreviewKey {
    fn from(variant: VariantKey) -> Self {
        PreviewKey::Variant(variant)
    }
}

impl fmt::Display for PreviewKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PreviewKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PreviewKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

impl FromStr for PreviewKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PreviewKey::all()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("Unknown preview variant: {}", s))
    }
}

/// A downloadable mastered file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadFormat {
    Wav16,
    Wav24,
    Wav24Low,
    Wav24High,
    Wav24Nolimiter,
    Wav24NolimiterNormalized,
}

impl DownloadFormat {
    pub const ALL: [DownloadFormat; 6] = [
        DownloadFormat::Wav16,
        DownloadFormat::Wav24,
        DownloadFormat::Wav24Low,
        DownloadFormat::Wav24High,
        DownloadFormat::Wav24Nolimiter,
        DownloadFormat::Wav24NolimiterNormalized,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadFormat::Wav16 => "wav16",
            DownloadFormat::Wav24 => "wav24",
            DownloadFormat::Wav24Low => "wav24_low",
            DownloadFormat::Wav24High => "wav24_high",
            DownloadFormat::Wav24Nolimiter => "wav24_nolimiter",
            DownloadFormat::Wav24NolimiterNormalized => "wav24_nolimiter_normalized",
        }
    }

    pub fn bit_depth(&self) -> BitDepth {
        match self {
            DownloadFormat::Wav16 => BitDepth::Pcm16,
            _ => BitDepth::Pcm24,
        }
    }

    /// Variant this file is previewed as; the 16-bit master shares the
    /// limited preview and has none of its own
    pub fn preview_variant(&self) -> Option<VariantKey> {
        match self {
            DownloadFormat::Wav16 => None,
            DownloadFormat::Wav24 => Some(VariantKey::Limited),
            DownloadFormat::Wav24Low => Some(VariantKey::Low),
            DownloadFormat::Wav24High => Some(VariantKey::High),
            DownloadFormat::Wav24Nolimiter => Some(VariantKey::NoLimiter),
            DownloadFormat::Wav24NolimiterNormalized => Some(VariantKey::NoLimiterNormalized),
        }
    }

    /// Trailing part of the attachment name offered to the browser
    pub fn download_suffix(&self) -> &'static str {
        match self {
            DownloadFormat::Wav16 => " 16bit.wav",
            DownloadFormat::Wav24 => " 24bit.wav",
            DownloadFormat::Wav24Low => " 24bit Low Loudness.wav",
            DownloadFormat::Wav24High => " 24bit High Loudness.wav",
            DownloadFormat::Wav24Nolimiter => " 24bit No Limiter.wav",
            DownloadFormat::Wav24NolimiterNormalized => " 24bit No Limiter Normalized.wav",
        }
    }
}

impl fmt::Display for DownloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DownloadFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DownloadFormat::ALL
            .into_iter()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| {
                "Invalid format. Use wav16, wav24, wav24_low, wav24_high, wav24_nolimiter, or wav24_nolimiter_normalized"
                    .to_string()
            })
    }
}
