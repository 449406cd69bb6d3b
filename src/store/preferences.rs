// Preference store: user-tunable generation parameters.
//
// Sliders are clamped to 1..=10 on every write and again on load, so an
// out-of-range value can never reach the prompt compiler or the database.

use crate::db::{Database, PREFERENCES_KEY};
use serde::{Deserialize, Serialize};

pub const SLIDER_MIN: u8 = 1;
pub const SLIDER_MAX: u8 = 10;

pub fn clamp_slider(value: i64) -> u8 {
    value.clamp(SLIDER_MIN as i64, SLIDER_MAX as i64) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ExpertiseLevel {
    Beginner,
    #[default]
    Intermediate,
    Expert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceRestriction {
    Stock,
    MaxForLive,
    #[default]
    Suite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Creativity {
    #[default]
    Standard,
    Experimental,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OperatingSystem {
    #[default]
    Mac,
    Windows,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LiveVersion {
    #[serde(rename = "10")]
    Live10,
    #[serde(rename = "11")]
    Live11,
    #[default]
    #[serde(rename = "12")]
    Live12,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Tone {
    Casual,
    Professional,
    #[default]
    Encouraging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OutputLength {
    Concise,
    #[default]
    Balanced,
    Detailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    StepByStep,
    BulletPoints,
    Narrative,
}

/// Flat record of every generation parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub expertise: ExpertiseLevel,
    pub device_restriction: DeviceRestriction,
    pub creativity: Creativity,
    pub os: OperatingSystem,
    pub live_version: LiveVersion,
    pub tone: Tone,
    pub output_length: OutputLength,
    pub format: OutputFormat,
    // --- Sliders (1-10) ---
    pub sentence_complexity: u8,
    pub technical_jargon: u8,
    pub device_depth: u8,
    pub midi_complexity: u8,
    pub midi_musicality: u8,
    pub automation_detail: u8,
    // --- Toggles ---
    pub use_emojis: bool,
    pub use_analogies: bool,
    pub include_shortcuts: bool,
    pub include_troubleshooting: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            expertise: ExpertiseLevel::default(),
            device_restriction: DeviceRestriction::default(),
            creativity: Creativity::default(),
            os: OperatingSystem::default(),
            live_version: LiveVersion::default(),
            tone: Tone::default(),
            output_length: OutputLength::default(),
            format: OutputFormat::default(),
            sentence_complexity: 5,
            technical_jargon: 5,
            device_depth: 5,
            midi_complexity: 5,
            midi_musicality: 5,
            automation_detail: 5,
            use_emojis: false,
            use_analogies: true,
            include_shortcuts: true,
            include_troubleshooting: false,
        }
    }
}

impl Preferences {
    /// Force every slider into range.
    pub fn clamped(mut self) -> Self {
        for slider in [
            &mut self.sentence_complexity,
            &mut self.technical_jargon,
            &mut self.device_depth,
            &mut self.midi_complexity,
            &mut self.midi_musicality,
            &mut self.automation_detail,
        ] {
            *slider = clamp_slider(*slider as i64);
        }
        self
    }

    /// Apply a partial update. Slider values arrive as signed integers so
    /// that negative input clamps to the minimum instead of failing to parse.
    pub fn apply(&mut self, patch: &PreferencesPatch) {
        if let Some(v) = patch.expertise {
            self.expertise = v;
        }
        if let Some(v) = patch.device_restriction {
            self.device_restriction = v;
        }
        if let Some(v) = patch.creativity {
            self.creativity = v;
        }
        if let Some(v) = patch.os {
            self.os = v;
        }
        if let Some(v) = patch.live_version {
            self.live_version = v;
        }
        if let Some(v) = patch.tone {
            self.tone = v;
        }
        if let Some(v) = patch.output_length {
            self.output_length = v;
        }
        if let Some(v) = patch.format {
            self.format = v;
        }

        let sliders = [
            (patch.sentence_complexity, &mut self.sentence_complexity),
            (patch.technical_jargon, &mut self.technical_jargon),
            (patch.device_depth, &mut self.device_depth),
            (patch.midi_complexity, &mut self.midi_complexity),
            (patch.midi_musicality, &mut self.midi_musicality),
            (patch.automation_detail, &mut self.automation_detail),
        ];
        for (value, slot) in sliders {
            if let Some(v) = value {
                *slot = clamp_slider(v);
            }
        }

        let toggles = [
            (patch.use_emojis, &mut self.use_emojis),
            (patch.use_analogies, &mut self.use_analogies),
            (patch.include_shortcuts, &mut self.include_shortcuts),
            (patch.include_troubleshooting, &mut self.include_troubleshooting),
        ];
        for (value, slot) in toggles {
            if let Some(v) = value {
                *slot = v;
            }
        }
    }
}

/// Partial update from a UI control or HTTP PATCH body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferencesPatch {
    pub expertise: Option<ExpertiseLevel>,
    pub device_restriction: Option<DeviceRestriction>,
    pub creativity: Option<Creativity>,
    pub os: Option<OperatingSystem>,
    pub live_version: Option<LiveVersion>,
    pub tone: Option<Tone>,
    pub output_length: Option<OutputLength>,
    pub format: Option<OutputFormat>,
    pub sentence_complexity: Option<i64>,
    pub technical_jargon: Option<i64>,
    pub device_depth: Option<i64>,
    pub midi_complexity: Option<i64>,
    pub midi_musicality: Option<i64>,
    pub automation_detail: Option<i64>,
    pub use_emojis: Option<bool>,
    pub use_analogies: Option<bool>,
    pub include_shortcuts: Option<bool>,
    pub include_troubleshooting: Option<bool>,
}

/// In-memory preferences mirrored to the settings table on every change.
#[derive(Debug, Clone, Default)]
pub struct PreferenceStore {
    current: Preferences,
}

impl PreferenceStore {
    /// Load persisted preferences; corrupt or missing values yield defaults.
    pub fn load(db: &Database) -> Self {
        let stored: Preferences = db.load_json_or_default(PREFERENCES_KEY);
        PreferenceStore {
            current: stored.clamped(),
        }
    }

    pub fn get(&self) -> &Preferences {
        &self.current
    }

    /// Apply a patch. Memory only changes once the new record is saved.
    pub fn set(&mut self, db: &Database, patch: &PreferencesPatch) -> Result<Preferences, String> {
        let mut next = self.current.clone();
        next.apply(patch);
        db.save_json(PREFERENCES_KEY, &next)?;
        self.current = next;
        Ok(self.current.clone())
    }

    /// Restore defaults and persist them.
    pub fn reset(&mut self, db: &Database) -> Result<Preferences, String> {
        let defaults = Preferences::default();
        db.save_json(PREFERENCES_KEY, &defaults)?;
        self.current = defaults;
        Ok(self.current.clone())
    }
}
