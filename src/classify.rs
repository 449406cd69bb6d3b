// Keyword classifier for response text
//
// Tags drive presentation only (accent colours, badges). Matching is a
// case-insensitive substring test.

use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualTag {
    Freeze,
    Modulation,
    Dynamics,
    Spectral,
    Generative,
}

const MODULATION_KEYWORDS: &[&str] = &["lfo", "envelope follower", "shaper"];
const DYNAMICS_KEYWORDS: &[&str] = &["compressor", "glue", "limiter", "sidechain"];
const SPECTRAL_KEYWORDS: &[&str] = &["spectral resonator", "spectral time", "spectrum"];
const GENERATIVE_KEYWORDS: &[&str] = &["seed", "rhythm generator", "arpeggiator"];

fn any_of(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| haystack.contains(k))
}

pub fn classify(text: &str) -> BTreeSet<VisualTag> {
    let lower = text.to_lowercase();
    let mut tags = BTreeSet::new();

    let frozen_reverb = lower.contains("hybrid reverb") && lower.contains("freeze");
    let infinite_drone = lower.contains("drone") && lower.contains("infinite");
    if frozen_reverb || infinite_drone {
        tags.insert(VisualTag::Freeze);
    }

    for (tag, keywords) in [
        (VisualTag::Modulation, MODULATION_KEYWORDS),
        (VisualTag::Dynamics, DYNAMICS_KEYWORDS),
        (VisualTag::Spectral, SPECTRAL_KEYWORDS),
        (VisualTag::Generative, GENERATIVE_KEYWORDS),
    ] {
        if any_of(&lower, keywords) {
            tags.insert(tag);
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freeze_needs_both_keywords() {
        assert!(classify("Hybrid Reverb with FREEZE engaged").contains(&VisualTag::Freeze));
        assert!(classify("an infinite DRONE").contains(&VisualTag::Freeze));

        assert!(!classify("Hybrid Reverb on a send").contains(&VisualTag::Freeze));
        assert!(!classify("freeze the track to save CPU").contains(&VisualTag::Freeze));
        assert!(!classify("a drone in D").contains(&VisualTag::Freeze));
    }

    #[test]
    fn test_multiple_tags() {
        let tags = classify("Put **Glue Compressor** after an **LFO** and watch **Spectrum**.");
        assert_eq!(
            tags.into_iter().collect::<Vec<_>>(),
            vec![VisualTag::Modulation, VisualTag::Dynamics, VisualTag::Spectral]
        );
    }

    #[test]
    fn test_plain_text_has_no_tags() {
        assert!(classify("Open a new MIDI track and record a few notes.").is_empty());
        assert!(classify("").is_empty());
    }

    #[test]
    fn test_generative_tag() {
        assert!(classify("Use the Seed generator").contains(&VisualTag::Generative));
    }
}
