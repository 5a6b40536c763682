//! Mapping spotted vocabulary labels to dialogue intents.

/// What a spotted answer means for a yes/no question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Affirmative,
    Negative,
    Unknown,
}

impl Intent {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "yes" | "yeah" | "ok" => Intent::Affirmative,
            "no" | "nope" => Intent::Negative,
            _ => Intent::Unknown,
        }
    }

    pub fn is_affirmative(self) -> bool {
        self == Intent::Affirmative
    }
}
