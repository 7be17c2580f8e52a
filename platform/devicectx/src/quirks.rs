// Copyright 2026 NGN Stack Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-model hardware quirk table.
//!
//! A handful of handsets ship audio or sensor firmware that misbehaves in
//! ways the engine has to route around. The table maps canonicalized model
//! strings (trimmed, ASCII-lowercased) to boolean workaround flags. The
//! shipped defaults cover the devices with field reports; deployments can
//! extend or override them from a TOML document:
//!
//! ```toml
//! [models."ZTE-U V880"]
//! set_mode_allowed = true
//! buggy_proximity_sensor = true
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading a quirk table.
#[derive(Debug, Error)]
pub enum QuirkError {
    /// The table file could not be read.
    #[error("failed to read quirk table {path}: {source}")]
    Read {
        /// Path of the file that failed to read.
        path: PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
    /// The document is not valid TOML or has the wrong shape.
    #[error("failed to parse quirk table: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Workaround flags for a single device model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuirkFlags {
    /// Loudspeaker routing only works after forcing the in-call audio mode.
    pub speaker_mode_hack: bool,
    /// The device tolerates an explicit audio mode switch around calls.
    pub set_mode_allowed: bool,
    /// Proximity readings misfire during calls.
    pub buggy_proximity_sensor: bool,
    /// Audio sessions must be torn down and rebuilt between calls.
    pub audio_recreate: bool,
}

impl QuirkFlags {
    /// True when at least one workaround flag is set.
    pub fn any(&self) -> bool {
        self.speaker_mode_hack
            || self.set_mode_allowed
            || self.buggy_proximity_sensor
            || self.audio_recreate
    }
}

/// Lookup table from canonical model names to workaround flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuirkTable {
    models: BTreeMap<String, QuirkFlags>,
}

impl QuirkTable {
    /// Table of known misbehaving handsets shipped with the engine.
    pub fn builtin() -> Self {
        let mut table = Self::default();
        // ZTE Blade, HTC EVO 4G, Huawei U8110/U8150.
        for model in ["blade", "htc_supersonic", "u8110", "u8150"] {
            table.models.insert(
                model.to_string(),
                QuirkFlags {
                    speaker_mode_hack: true,
                    ..QuirkFlags::default()
                },
            );
        }
        // ZTE-U V880.
        table.models.insert(
            "zte-u v880".to_string(),
            QuirkFlags {
                set_mode_allowed: true,
                buggy_proximity_sensor: true,
                ..QuirkFlags::default()
            },
        );
        table
    }

    /// Parses a table from a TOML document.
    pub fn parse_str(input: &str) -> Result<Self, QuirkError> {
        let raw: RawTable = toml::from_str(input)?;
        let mut table = Self::default();
        table.absorb(raw);
        Ok(table)
    }

    /// Reads and parses a table from a TOML file.
    pub fn load_path(path: &Path) -> Result<Self, QuirkError> {
        let data = fs::read_to_string(path).map_err(|source| QuirkError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_str(&data)
    }

    /// Folds `other` into `self`; entries in `other` win on collision.
    pub fn merge(&mut self, other: QuirkTable) {
        for (model, flags) in other.models {
            self.models.insert(model, flags);
        }
    }

    /// Flags for `model`, after canonicalization. Unknown models get defaults.
    pub fn flags(&self, model: &str) -> QuirkFlags {
        self.models
            .get(&canonical(model))
            .copied()
            .unwrap_or_default()
    }

    /// Number of models with an entry.
    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    fn absorb(&mut self, raw: RawTable) {
        for (model, flags) in raw.models {
            self.models.insert(
                canonical(&model),
                QuirkFlags {
                    speaker_mode_hack: flags.speaker_mode_hack,
                    set_mode_allowed: flags.set_mode_allowed,
                    buggy_proximity_sensor: flags.buggy_proximity_sensor,
                    audio_recreate: flags.audio_recreate,
                },
            );
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawTable {
    #[serde(default)]
    models: BTreeMap<String, RawFlags>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFlags {
    speaker_mode_hack: bool,
    set_mode_allowed: bool,
    buggy_proximity_sensor: bool,
    audio_recreate: bool,
}

fn canonical(input: &str) -> String {
    input.trim().to_ascii_lowercase()
}

/// True for Samsung handsets: models starting with `GT-`, `SGH-`, `SPH-`,
/// or `SCH-`, or containing `samsung`, case-insensitively.
pub fn is_samsung_model(model: &str) -> bool {
    let model = model.to_ascii_lowercase();
    model.starts_with("gt-")
        || model.contains("samsung")
        || model.starts_with("sgh-")
        || model.starts_with("sph-")
        || model.starts_with("sch-")
}

/// True for HTC handsets: models starting with `htc`, case-insensitively.
pub fn is_htc_model(model: &str) -> bool {
    model.to_ascii_lowercase().starts_with("htc")
}
