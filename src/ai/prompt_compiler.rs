// Prompt compiler
//
// Renders the outbound instruction from the raw request, a preferences
// snapshot and an optional modifier. Pure: no I/O, no shared state, and the
// caller's preferences are never mutated (modifiers work on a local copy).

use crate::store::preferences::{
    Creativity, DeviceRestriction, ExpertiseLevel, LiveVersion, OperatingSystem, OutputFormat,
    OutputLength, Preferences, Tone,
};
use serde::{Deserialize, Serialize};

/// One-tap post-hoc instruction applied when regenerating a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Modifier {
    Longer,
    Professional,
    Shorter,
}

impl Modifier {
    fn instruction(self) -> &'static str {
        match self {
            Modifier::Longer => "Make this response much longer: expand every step with exact parameter values, alternatives and the reasoning behind each move.",
            Modifier::Professional => "Make this response much more professional: use precise studio terminology, no emojis and no analogies.",
            Modifier::Shorter => "Make this response much shorter: keep only the essential steps as concise bullet points.",
        }
    }

    /// Overrides applied to a copy of the preferences.
    fn apply(self, prefs: &mut Preferences) {
        match self {
            Modifier::Longer => {
                prefs.output_length = OutputLength::Detailed;
            }
            Modifier::Professional => {
                prefs.tone = Tone::Professional;
                prefs.use_emojis = false;
                prefs.use_analogies = false;
                prefs.technical_jargon = crate::store::preferences::SLIDER_MAX;
            }
            Modifier::Shorter => {
                prefs.output_length = OutputLength::Concise;
                prefs.format = OutputFormat::BulletPoints;
            }
        }
    }
}

fn expertise_label(value: ExpertiseLevel) -> &'static str {
    match value {
        ExpertiseLevel::Beginner => "Beginner (explain every step and where to find it)",
        ExpertiseLevel::Intermediate => "Intermediate (knows the basics of Live)",
        ExpertiseLevel::Expert => "Expert (skip the basics, focus on advanced technique)",
    }
}

fn device_restriction_label(value: DeviceRestriction) -> &'static str {
    match value {
        DeviceRestriction::Stock => "Stock Devices Only (no third-party plugins or Max for Live)",
        DeviceRestriction::MaxForLive => "Stock Devices plus Max for Live (no third-party plugins)",
        DeviceRestriction::Suite => "Full Live Suite (all included instruments, effects and packs)",
    }
}

fn creativity_label(value: Creativity) -> &'static str {
    match value {
        Creativity::Standard => "Standard (proven, reliable techniques)",
        Creativity::Experimental => "Experimental (unconventional routing and happy accidents welcome)",
    }
}

fn os_label(value: OperatingSystem) -> &'static str {
    match value {
        OperatingSystem::Mac => "macOS (use Cmd/Option shortcuts)",
        OperatingSystem::Windows => "Windows (use Ctrl/Alt shortcuts)",
    }
}

fn version_label(value: LiveVersion) -> &'static str {
    match value {
        LiveVersion::Live10 => "Ableton Live 10",
        LiveVersion::Live11 => "Ableton Live 11",
        LiveVersion::Live12 => "Ableton Live 12",
    }
}

fn tone_label(value: Tone) -> &'static str {
    match value {
        Tone::Casual => "Casual",
        Tone::Professional => "Professional",
        Tone::Encouraging => "Encouraging",
    }
}

fn length_label(value: OutputLength) -> &'static str {
    match value {
        OutputLength::Concise => "Concise",
        OutputLength::Balanced => "Balanced",
        OutputLength::Detailed => "Detailed",
    }
}

fn format_label(value: OutputFormat) -> &'static str {
    match value {
        OutputFormat::StepByStep => "Step-by-step numbered instructions",
        OutputFormat::BulletPoints => "Bullet points",
        OutputFormat::Narrative => "Narrative prose",
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

/// Render the constraints block, one `Label: value` line per preference in
/// a fixed order.
pub fn render_constraints(prefs: &Preferences) -> String {
    let lines: [(&str, String); 18] = [
        ("Expertise Level", expertise_label(prefs.expertise).to_string()),
        ("Device Restriction", device_restriction_label(prefs.device_restriction).to_string()),
        ("Creativity", creativity_label(prefs.creativity).to_string()),
        ("Operating System", os_label(prefs.os).to_string()),
        ("Target Version", version_label(prefs.live_version).to_string()),
        ("Tone", tone_label(prefs.tone).to_string()),
        ("Output Length", length_label(prefs.output_length).to_string()),
        ("Format", format_label(prefs.format).to_string()),
        ("Sentence Complexity", format!("{}/10", prefs.sentence_complexity)),
        ("Technical Jargon", format!("{}/10", prefs.technical_jargon)),
        ("Device Depth", format!("{}/10", prefs.device_depth)),
        ("MIDI Complexity", format!("{}/10", prefs.midi_complexity)),
        ("MIDI Musicality", format!("{}/10", prefs.midi_musicality)),
        ("Automation Detail", format!("{}/10", prefs.automation_detail)),
        ("Use Emojis", yes_no(prefs.use_emojis).to_string()),
        ("Use Analogies", yes_no(prefs.use_analogies).to_string()),
        ("Include Keyboard Shortcuts", yes_no(prefs.include_shortcuts).to_string()),
        ("Include Troubleshooting Tips", yes_no(prefs.include_troubleshooting).to_string()),
    ];

    let mut block = String::from("**Configuration Constraints**:");
    for (label, value) in lines {
        block.push_str("\n- ");
        block.push_str(label);
        block.push_str(": ");
        block.push_str(&value);
    }
    block
}

/// Compile the final prompt sent to the model.
pub fn compile(request: &str, prefs: &Preferences, modifier: Option<Modifier>) -> String {
    let mut effective = prefs.clone();
    if let Some(modifier) = modifier {
        modifier.apply(&mut effective);
    }

    let mut prompt = String::with_capacity(request.len() + 1024);
    prompt.push_str(request);
    if let Some(modifier) = modifier {
        prompt.push_str("\n\n");
        prompt.push_str(modifier.instruction());
    }
    prompt.push_str("\n\n");
    prompt.push_str(&render_constraints(&effective));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_is_deterministic() {
        let prefs = Preferences::default();
        for modifier in [None, Some(Modifier::Longer), Some(Modifier::Shorter)] {
            let a = compile("Make a Reese bass", &prefs, modifier);
            let b = compile("Make a Reese bass", &prefs, modifier);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_modifier_does_not_mutate_preferences() {
        let prefs = Preferences::default();
        let before = prefs.clone();
        let prompt = compile("Pad", &prefs, Some(Modifier::Shorter));

        assert_eq!(prefs, before);
        assert!(prompt.contains("Output Length: Concise"));
        assert!(prompt.contains("Format: Bullet points"));
    }

    #[test]
    fn test_every_slider_rendered_out_of_ten() {
        let prefs = Preferences {
            sentence_complexity: 1,
            technical_jargon: 2,
            device_depth: 3,
            midi_complexity: 7,
            midi_musicality: 8,
            automation_detail: 10,
            ..Default::default()
        };
        let prompt = compile("x", &prefs, None);
        for expected in [
            "Sentence Complexity: 1/10",
            "Technical Jargon: 2/10",
            "Device Depth: 3/10",
            "MIDI Complexity: 7/10",
            "MIDI Musicality: 8/10",
            "Automation Detail: 10/10",
        ] {
            assert!(prompt.contains(expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_dark_techno_bassline_scenario() {
        let prefs = Preferences {
            device_restriction: DeviceRestriction::Stock,
            technical_jargon: 9,
            ..Default::default()
        };
        let prompt = compile("Create a dark techno bassline", &prefs, None);

        assert!(prompt.starts_with("Create a dark techno bassline"));
        assert!(prompt.contains("Stock Devices Only"));
        assert!(prompt.contains("Technical Jargon: 9/10"));
    }

    #[test]
    fn test_professional_modifier_overrides() {
        let prefs = Preferences {
            use_emojis: true,
            use_analogies: true,
            technical_jargon: 3,
            ..Default::default()
        };
        let prompt = compile("Glue compression", &prefs, Some(Modifier::Professional));

        assert!(prompt.contains("Tone: Professional"));
        assert!(prompt.contains("Use Emojis: No"));
        assert!(prompt.contains("Use Analogies: No"));
        assert!(prompt.contains("Technical Jargon: 10/10"));
        assert!(prompt.contains("much more professional"));
    }

    #[test]
    fn test_override_sentence_sits_between_request_and_constraints() {
        let prompt = compile("Sidechain pumping", &Preferences::default(), Some(Modifier::Longer));
        let request_at = prompt.find("Sidechain pumping").unwrap();
        let override_at = prompt.find("much longer").unwrap();
        let constraints_at = prompt.find("**Configuration Constraints**").unwrap();

        assert!(request_at < override_at && override_at < constraints_at);
        assert!(prompt.contains("Output Length: Detailed"));
    }

    #[test]
    fn test_booleans_render_yes_no() {
        let prefs = Preferences {
            include_troubleshooting: true,
            include_shortcuts: false,
            ..Default::default()
        };
        let prompt = compile("x", &prefs, None);
        assert!(prompt.contains("Include Troubleshooting Tips: Yes"));
        assert!(prompt.contains("Include Keyboard Shortcuts: No"));
    }
}
