//! crates/agrivision_core/src/narration.rs
//!
//! Prepares generated advisory text for speech synthesis.

use std::sync::OnceLock;

use regex::Regex;

fn markdown_marks() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[#*`_]").expect("static pattern"))
}

fn emoji() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"[\x{1F600}-\x{1F64F}\x{1F300}-\x{1F5FF}\x{1F680}-\x{1F6FF}\x{2600}-\x{26FF}\x{2700}-\x{27BF}]",
        )
        .expect("static pattern")
    })
}

/// Strips markdown markers and emoji, then collapses whitespace so the speech
/// engine reads prose only.
pub fn clean_for_speech(text: &str) -> String {
    let text = markdown_marks().replace_all(text, "");
    let text = emoji().replace_all(&text, "");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_markdown_and_emoji() {
        let advisory = "### 1. Disease Overview\n\n**Soybean Rust** 🌱 is a _fungal_ disease. 🚜";
        assert_eq!(
            clean_for_speech(advisory),
            "1. Disease Overview Soybean Rust is a fungal disease."
        );
    }

    #[test]
    fn keeps_indic_script() {
        assert_eq!(clean_for_speech("## सोयाबीन  तांबेरा"), "सोयाबीन तांबेरा");
    }

    #[test]
    fn markdown_only_input_becomes_empty() {
        assert!(clean_for_speech("### ** __ `").is_empty());
    }
}
