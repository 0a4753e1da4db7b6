use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleGuidance {
    pub preferred_content: Vec<&'static str>,
    pub study_tips: Vec<&'static str>,
    pub avoid: Vec<&'static str>,
}

fn guidance(
    preferred_content: &[&'static str],
    study_tips: &[&'static str],
    avoid: &[&'static str],
) -> StyleGuidance {
    StyleGuidance {
        preferred_content: preferred_content.to_vec(),
        study_tips: study_tips.to_vec(),
        avoid: avoid.to_vec(),
    }
}

/// Content-format guidance per style. Unknown styles get a mixed plan.
pub fn style_guidance(style: &str) -> StyleGuidance {
    match style {
        "visual" => guidance(
            &["video", "infographic", "diagram", "slides"],
            &[
                "Use visual aids and charts",
                "Watch video tutorials",
                "Create mind maps",
                "Use color-coded notes",
            ],
            &["long audio recordings", "text-heavy materials"],
        ),
        "auditory" => guidance(
            &["audio", "podcast", "lecture", "discussion"],
            &[
                "Listen to audiobooks and podcasts",
                "Participate in discussions",
                "Use text-to-speech",
                "Record and replay lectures",
            ],
            &["silent reading", "isolated study"],
        ),
        "reading_writing" => guidance(
            &["text", "article", "book", "documentation"],
            &[
                "Take detailed notes",
                "Write summaries",
                "Create flashcards",
                "Read instructions thoroughly",
            ],
            &["video-only content", "hands-on without reading"],
        ),
        "kinesthetic" => guidance(
            &["interactive", "simulation", "lab", "practice"],
            &[
                "Hands-on practice exercises",
                "Role-playing and simulations",
                "Take frequent breaks",
                "Learn by doing",
            ],
            &["passive listening", "long reading sessions"],
        ),
        _ => guidance(&["mixed"], &["Use varied learning methods"], &[]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_styles_have_four_formats() {
        for style in ["visual", "auditory", "reading_writing", "kinesthetic"] {
            let g = style_guidance(style);
            assert_eq!(g.preferred_content.len(), 4);
            assert_eq!(g.study_tips.len(), 4);
            assert_eq!(g.avoid.len(), 2);
        }
        assert_eq!(style_guidance("kinesthetic").preferred_content[0], "interactive");
    }

    #[test]
    fn unknown_style_is_mixed() {
        let g = style_guidance("telepathic");
        assert_eq!(g.preferred_content, vec!["mixed"]);
        assert!(g.avoid.is_empty());
    }
}
