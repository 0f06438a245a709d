use crate::error::{AppError, AppResult};

/// A named default system instruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RolePreset {
    pub label: &'static str,
    pub instructions: &'static str,
}

pub const ROLE_PRESETS: &[RolePreset] = &[
    RolePreset {
        label: "🎬 Video Director",
        instructions: "You are a professional film director. Always analyze ideas in terms of visual storytelling: \
use camera movement, lighting, framing, and emotional tone. \
Give concrete, scene-based advice and, if appropriate, shot lists or blocking notes.",
    },
    RolePreset {
        label: "💃 Dance Instructor",
        instructions: "You are a dance instructor. Suggest movement choices, rhythm and dynamics, count structures, \
and how to express emotion through body language. Offer small exercises and step-by-step breakdowns.",
    },
    RolePreset {
        label: "👗 Fashion Stylist",
        instructions: "You are a fashion stylist. Explain color palettes, materials, silhouettes, and outfit layering \
suited to personality and context. Provide alternatives and reference ideas.",
    },
    RolePreset {
        label: "🎭 Acting Coach",
        instructions: "You are an acting coach. Teach natural emotion delivery, scene analysis, subtext, \
and exercises for authentic performance.",
    },
    RolePreset {
        label: "🖼️ Art Curator",
        instructions: "You are an art curator. Interpret artworks, reference art-historical parallels, \
suggest display and conceptual approaches, and ask thoughtful critical questions.",
    },
    RolePreset {
        label: "🧑‍🎨 Custom Role (editable)",
        instructions: "Describe the role behavior here. Be specific about tone, constraints, and what to avoid.",
    },
];

/// The currently selected preset plus the user's edit of its instructions.
///
/// Editing never touches `ROLE_PRESETS`; selecting a preset restores its
/// default text.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleSelection {
    index: usize,
    instructions: String,
}

impl Default for RoleSelection {
    fn default() -> Self {
        Self::preset(0)
    }
}

impl RoleSelection {
    /// Select preset `index`, falling back to the first preset when out of range.
    pub fn preset(index: usize) -> Self {
        let index = if index < ROLE_PRESETS.len() { index } else { 0 };
        Self {
            index,
            instructions: ROLE_PRESETS[index].instructions.to_string(),
        }
    }

    /// Parse a 1-based preset number as typed by the user.
    pub fn from_user_choice(choice: &str) -> AppResult<Self> {
        let n: usize = choice
            .trim()
            .parse()
            .map_err(|_| AppError::validation(format!("'{}' is not a role number", choice.trim())))?;
        if n == 0 || n > ROLE_PRESETS.len() {
            return Err(AppError::validation(format!(
                "Role number must be between 1 and {}",
                ROLE_PRESETS.len()
            )));
        }
        Ok(Self::preset(n - 1))
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn label(&self) -> &'static str {
        ROLE_PRESETS[self.index].label
    }

    pub fn set_instructions(&mut self, text: &str) {
        self.instructions = text.to_string();
    }

    pub fn is_edited(&self) -> bool {
        self.instructions != ROLE_PRESETS[self.index].instructions
    }

    /// The text used as the conversation's system message.
    pub fn system_prompt(&self) -> &str {
        &self.instructions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_six_presets_with_distinct_labels() {
        assert_eq!(ROLE_PRESETS.len(), 6);
        for (i, a) in ROLE_PRESETS.iter().enumerate() {
            assert!(!a.instructions.is_empty());
            for b in &ROLE_PRESETS[i + 1..] {
                assert_ne!(a.label, b.label);
            }
        }
    }

    #[test]
    fn test_every_preset_becomes_system_prompt() {
        for (i, preset) in ROLE_PRESETS.iter().enumerate() {
            let selection = RoleSelection::preset(i);
            assert_eq!(selection.system_prompt(), preset.instructions);
            assert!(!selection.is_edited());
        }
    }

    #[test]
    fn test_edit_does_not_touch_table() {
        let mut selection = RoleSelection::preset(2);
        selection.set_instructions("Be brutally honest about outfits.");
        assert!(selection.is_edited());
        assert_eq!(selection.system_prompt(), "Be brutally honest about outfits.");
        assert_ne!(ROLE_PRESETS[2].instructions, "Be brutally honest about outfits.");
        assert_eq!(RoleSelection::preset(2).system_prompt(), ROLE_PRESETS[2].instructions);
    }

    #[test]
    fn test_out_of_range_index_falls_back() {
        assert_eq!(RoleSelection::preset(42).index(), 0);
    }

    #[test]
    fn test_from_user_choice() {
        assert_eq!(RoleSelection::from_user_choice(" 4 ").unwrap().label(), "🎭 Acting Coach");
        assert!(RoleSelection::from_user_choice("0").is_err());
        assert!(RoleSelection::from_user_choice("7").is_err());
        assert!(RoleSelection::from_user_choice("director").is_err());
    }
}
