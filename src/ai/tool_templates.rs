// Tool templates: named request builders with typed parameter slots.
//
// Each tool renders a domain paragraph that becomes the raw request fed into
// the prompt compiler. Adding a tool means adding data to `BUILTIN_TOOLS`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlotKind {
    Text {
        default: &'static str,
    },
    Integer {
        min: i64,
        max: i64,
        default: i64,
    },
    Choice {
        options: &'static [&'static str],
        default: &'static str,
    },
    /// Zero or more named options, rendered as a bulleted section under `header`.
    Toggles {
        header: &'static str,
        options: &'static [(&'static str, &'static str)],
    },
    /// Derived from another slot's resolved value; not settable by callers.
    Lookup {
        source: &'static str,
        table: &'static [(&'static str, &'static str)],
        fallback: &'static str,
    },
}

#[derive(Debug, Serialize)]
pub struct Slot {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: SlotKind,
}

#[derive(Debug, Serialize)]
pub struct ToolTemplate {
    pub id: &'static str,
    pub title: &'static str,
    #[serde(skip)]
    pub body: &'static str,
    pub slots: &'static [Slot],
    /// (low, high) integer slots that form a range; reversed input is swapped.
    #[serde(skip)]
    pub ranges: &'static [(&'static str, &'static str)],
}

/// A caller-supplied parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(i64),
    Text(String),
    Flags(Vec<String>),
}

pub type ToolParams = BTreeMap<String, ParamValue>;

impl ToolTemplate {
    /// Render the raw request text for this tool.
    pub fn render(&self, params: &ToolParams) -> Result<String, String> {
        for name in params.keys() {
            let settable = self
                .slots
                .iter()
                .any(|s| s.name == name.as_str() && !matches!(s.kind, SlotKind::Lookup { .. }));
            if !settable {
                return Err(format!("Unknown parameter '{}' for tool '{}'", name, self.id));
            }
        }

        let mut resolved: BTreeMap<&'static str, String> = BTreeMap::new();
        for slot in self.slots {
            if let Some(value) = resolve_slot(slot, params.get(slot.name))? {
                resolved.insert(slot.name, value);
            }
        }

        for (low, high) in self.ranges {
            let parsed = (
                resolved.get(low).and_then(|v| v.parse::<i64>().ok()),
                resolved.get(high).and_then(|v| v.parse::<i64>().ok()),
            );
            if let (Some(a), Some(b)) = parsed {
                if a > b {
                    resolved.insert(*low, b.to_string());
                    resolved.insert(*high, a.to_string());
                }
            }
        }

        // Lookups read from already-resolved slots
        for slot in self.slots {
            if let SlotKind::Lookup { source, table, fallback } = &slot.kind {
                let key = resolved.get(source).map(String::as_str).unwrap_or("");
                let value = table
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, v)| *v)
                    .unwrap_or(*fallback);
                resolved.insert(slot.name, value.to_string());
            }
        }

        Ok(fill_placeholders(self.body, &resolved))
    }
}

/// Substitute `{name}` placeholders in one pass. Inserted values are never
/// re-scanned, so braces in user text come through verbatim.
fn fill_placeholders(body: &str, values: &BTreeMap<&'static str, String>) -> String {
    let mut out = String::with_capacity(body.len() + 256);
    let mut rest = body;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let filled = after
            .find('}')
            .and_then(|close| values.get(&after[..close]).map(|value| (close, value)));
        match filled {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn resolve_slot(slot: &Slot, value: Option<&ParamValue>) -> Result<Option<String>, String> {
    let resolved = match (&slot.kind, value) {
        (SlotKind::Lookup { .. }, _) => return Ok(None),

        (SlotKind::Text { default }, None) => default.to_string(),
        (SlotKind::Text { default }, Some(ParamValue::Text(s))) => {
            let s = s.trim();
            if s.is_empty() {
                default.to_string()
            } else {
                s.to_string()
            }
        }
        (SlotKind::Text { .. }, Some(ParamValue::Number(n))) => n.to_string(),

        (SlotKind::Integer { default, .. }, None) => default.to_string(),
        (SlotKind::Integer { min, max, .. }, Some(ParamValue::Number(n))) => {
            (*n).clamp(*min, *max).to_string()
        }
        (SlotKind::Integer { min, max, .. }, Some(ParamValue::Text(s))) => {
            let n: i64 = s
                .trim()
                .parse()
                .map_err(|_| format!("'{}' expects a number, got '{}'", slot.label, s))?;
            n.clamp(*min, *max).to_string()
        }

        (SlotKind::Choice { default, .. }, None) => default.to_string(),
        (SlotKind::Choice { options, .. }, Some(ParamValue::Text(s))) => options
            .iter()
            .find(|o| o.eq_ignore_ascii_case(s.trim()))
            .map(|o| o.to_string())
            .ok_or_else(|| {
                format!(
                    "Invalid {} '{}'. Valid options: {}",
                    slot.label,
                    s,
                    options.join(", ")
                )
            })?,

        (SlotKind::Toggles { .. }, None) => String::new(),
        (SlotKind::Toggles { header, options }, Some(ParamValue::Flags(selected))) => {
            let mut lines = Vec::new();
            for (key, description) in options.iter() {
                if selected.iter().any(|s| s.eq_ignore_ascii_case(key)) {
                    lines.push(*description);
                }
            }
            if let Some(unknown) = selected
                .iter()
                .find(|s| !options.iter().any(|(k, _)| k.eq_ignore_ascii_case(s)))
            {
                return Err(format!("Unknown {} option '{}'", slot.label, unknown));
            }
            if lines.is_empty() {
                String::new()
            } else {
                format!("\n\n**{}**:\n- {}", header, lines.join("\n- "))
            }
        }

        (_, Some(other)) => {
            return Err(format!("Wrong value type for '{}': {:?}", slot.label, other));
        }
    };
    Ok(Some(resolved))
}

const KEYS: &[&str] = &["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
const SCALES: &[&str] = &["Major", "Minor", "Dorian", "Phrygian", "Lydian", "Mixolydian", "Locrian"];
const GENRES: &[&str] = &[
    "Techno", "House", "DnB", "Trance", "Dubstep", "HipHop", "Lo-Fi", "Ambient", "Pop",
];

const GENRE_TRANSITIONS: &[(&str, &str)] = &[
    ("Techno", "Focus on tension-building transitions like white noise risers, filtered rumble kicks, and snare rolls."),
    ("House", "Suggest transitions using reverse cymbals, filter sweeps on the master bus, and classic drum fills."),
    ("DnB", "Emphasize rapid breakbeat edits, silence gaps, and heavy impact FX."),
    ("Trance", "Use long white noise sweeps, filter opening on supersaws, and snare rolls building to a climax."),
    ("Dubstep", "Build tension with pitch risers and silence right before the drop. Heavy impact FX on the one."),
    ("HipHop", "Focus on beat drop-outs, vocal tags, and tape stop effects."),
    ("Lo-Fi", "Use vinyl spin-backs, tape stops, and foley textures (rain, keys) to transition."),
    ("Ambient", "Use slow reverb swells, delay feedback loops, and crossfading textures."),
    ("Pop", "Include standard pop transitions: reverse crashes, vocal chops, and clear drum fills."),
];

const ARRANGEMENT_SLOTS: &[Slot] = &[
    Slot { name: "genre", label: "Genre", kind: SlotKind::Choice { options: GENRES, default: "Techno" } },
    Slot {
        name: "structure",
        label: "Structure",
        kind: SlotKind::Choice {
            options: &["Club Extended", "Radio Edit", "Progressive", "Streaming", "Live Performance"],
            default: "Club Extended",
        },
    },
    Slot { name: "key", label: "Key", kind: SlotKind::Choice { options: KEYS, default: "F" } },
    Slot { name: "scale", label: "Scale", kind: SlotKind::Choice { options: SCALES, default: "Minor" } },
    Slot { name: "tempo_min", label: "Minimum Tempo", kind: SlotKind::Integer { min: 60, max: 200, default: 128 } },
    Slot { name: "tempo_max", label: "Maximum Tempo", kind: SlotKind::Integer { min: 60, max: 200, default: 132 } },
    Slot { name: "mood", label: "Mood", kind: SlotKind::Text { default: "Hypnotic & Driving" } },
    Slot {
        name: "energy",
        label: "Energy",
        kind: SlotKind::Choice {
            options: &["Peak Time", "Deep", "Radio", "Rollercoaster"],
            default: "Peak Time",
        },
    },
    Slot {
        name: "transition_intensity",
        label: "Transition Intensity",
        kind: SlotKind::Choice { options: &["Subtle", "Medium", "High"], default: "Medium" },
    },
    Slot {
        name: "variations",
        label: "Variations",
        kind: SlotKind::Toggles {
            header: "Requested Variations",
            options: &[
                ("intro", "Intro (e.g. rhythmic start vs atmospheric)"),
                ("breakdown", "Breakdown (e.g. harmonic shift vs stripping back)"),
                ("drop", "Drop/Chorus (e.g. variation in energy or rhythm)"),
                ("outro", "Outro (e.g. abrupt stop vs long fade)"),
            ],
        },
    },
    Slot {
        name: "transition_focus",
        label: "Transition Focus",
        kind: SlotKind::Lookup {
            source: "genre",
            table: GENRE_TRANSITIONS,
            fallback: "Include creative transition ideas suitable for the genre.",
        },
    },
];

const ARRANGEMENT_BODY: &str = "Create a complete arrangement structure guide for a {genre} track.
Structure Type: {structure}.
Key: {key} {scale}.
Tempo: {tempo_min}-{tempo_max} BPM.
Mood: {mood}.
Energy Vibe: {energy}.
Transition Intensity: {transition_intensity}.

Please provide:
1. **Structural Table**: a table with columns [Section Name | Bar Count | Key Elements | Energy (1-10)].
2. **Transition Strategy**: specific automation moves (e.g. \"Filter Cutoff 200Hz -> 20kHz\") or FX fills for {transition_intensity} intensity transitions between major sections. Name the Ableton Live devices (Auto Filter, Echo, Hybrid Reverb, Redux...) and the parameters to automate.
3. **Element Entry/Exit**: a timeline of when each element comes in or drops out.
**Transition Style**: {transition_focus}{variations}";

const MIDI_SLOTS: &[Slot] = &[
    Slot {
        name: "role",
        label: "Part",
        kind: SlotKind::Choice {
            options: &["Bassline", "Chords", "Lead", "Arpeggio", "Drums", "Pad"],
            default: "Bassline",
        },
    },
    Slot { name: "genre", label: "Genre", kind: SlotKind::Choice { options: GENRES, default: "Techno" } },
    Slot { name: "key", label: "Key", kind: SlotKind::Choice { options: KEYS, default: "A" } },
    Slot { name: "scale", label: "Scale", kind: SlotKind::Choice { options: SCALES, default: "Minor" } },
    Slot { name: "bars", label: "Length in Bars", kind: SlotKind::Integer { min: 1, max: 32, default: 4 } },
    Slot { name: "complexity", label: "Pattern Complexity", kind: SlotKind::Integer { min: 1, max: 10, default: 5 } },
    Slot { name: "musicality", label: "Musicality", kind: SlotKind::Integer { min: 1, max: 10, default: 5 } },
    Slot {
        name: "techniques",
        label: "Techniques",
        kind: SlotKind::Toggles {
            header: "Use These Live 12 MIDI Tools",
            options: &[
                ("seed", "Seed generator for the initial idea"),
                ("rhythm", "Rhythm generator for the groove"),
                ("shape", "Shape for velocity contours"),
                ("strum", "Strum to humanize chord onsets"),
                ("ornament", "Ornament for grace notes and flams"),
            ],
        },
    },
];

const MIDI_BODY: &str = "Write a {bars}-bar {genre} {role} MIDI pattern in {key} {scale}.
Pattern Complexity: {complexity}/10. Musicality: {musicality}/10.

Please provide:
1. **Note Grid**: every note as [Bar.Beat.Sixteenth | Pitch | Velocity | Length].
2. **Programming Steps**: how to enter or generate it in the MIDI Clip view, including Scale Awareness settings.
3. **Groove & Feel**: swing, groove pool and velocity suggestions.
4. **Variations**: two ways to evolve the pattern over the arrangement.{techniques}";

const EFFECT_RACK_SLOTS: &[Slot] = &[
    Slot { name: "source", label: "Source Material", kind: SlotKind::Text { default: "Drum Bus" } },
    Slot { name: "character", label: "Target Character", kind: SlotKind::Text { default: "Warm and punchy" } },
    Slot {
        name: "rack_type",
        label: "Rack Type",
        kind: SlotKind::Choice {
            options: &["Audio Effect Rack", "Instrument Rack", "MIDI Effect Rack", "Drum Rack"],
            default: "Audio Effect Rack",
        },
    },
    Slot { name: "macros", label: "Macro Count", kind: SlotKind::Integer { min: 1, max: 16, default: 8 } },
    Slot {
        name: "extras",
        label: "Extras",
        kind: SlotKind::Toggles {
            header: "Also Include",
            options: &[
                ("parallel", "Parallel chains with a dry/wet chain selector"),
                ("multiband", "A multiband split (low / mid / high chains)"),
                ("variations", "Macro Variations snapshots for performance"),
            ],
        },
    },
];

const EFFECT_RACK_BODY: &str = "Design an {rack_type} for {source} with a {character} character.

Please provide:
1. **Device Chain**: each device in order with its key parameter settings.
2. **Macro Mapping**: {macros} macros, each with the parameters it controls and their min/max ranges.
3. **Visual Feedback**: which device (Spectrum, LFO, Shaper) to watch while tweaking and what to look for.{extras}";

pub static BUILTIN_TOOLS: [ToolTemplate; 3] = [
    ToolTemplate {
        id: "arrangement",
        title: "Arrangement Architect",
        body: ARRANGEMENT_BODY,
        slots: ARRANGEMENT_SLOTS,
        ranges: &[("tempo_min", "tempo_max")],
    },
    ToolTemplate {
        id: "midi",
        title: "MIDI Generator",
        body: MIDI_BODY,
        slots: MIDI_SLOTS,
        ranges: &[],
    },
    ToolTemplate {
        id: "effect-rack",
        title: "Effect Rack Builder",
        body: EFFECT_RACK_BODY,
        slots: EFFECT_RACK_SLOTS,
        ranges: &[],
    },
];

pub fn find_tool(id: &str) -> Option<&'static ToolTemplate> {
    BUILTIN_TOOLS.iter().find(|t| t.id == id)
}
