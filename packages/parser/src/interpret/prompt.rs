use crate::types::SectionId;

const SYSTEM_BASE_OFFENSE: &str = include_str!("../../prompts/base_offense.txt");
const SYSTEM_SOC: &str = include_str!("../../prompts/soc.txt");

/// System prompt for turning base offense text into a decision tree.
pub fn base_offense_system_prompt() -> &'static str {
    SYSTEM_BASE_OFFENSE
}

/// System prompt for turning SOC text into adjustments.
pub fn soc_system_prompt() -> &'static str {
    SYSTEM_SOC
}

/// User prompt carrying a section's base offense text.
pub fn build_base_offense_prompt(section: &SectionId, text: &str) -> String {
    format!("Section: §{section}\n\nBase Offense Level Text:\n{text}")
}

/// User prompt carrying a section's SOC text.
pub fn build_soc_prompt(section: &SectionId, text: &str) -> String {
    format!("Section: §{section}\n\nSpecific Offense Characteristics Text:\n{text}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_name_their_output_key() {
        assert!(base_offense_system_prompt().contains("\"baseOffenseQuestions\""));
        assert!(base_offense_system_prompt().contains("base_1"));
        assert!(soc_system_prompt().contains("\"specificOffenseCharacteristics\""));
    }

    #[test]
    fn test_user_prompt_format() {
        let section = SectionId::parse("2K2.1").unwrap();
        assert_eq!(
            build_base_offense_prompt(&section, "(a) Base Offense Level: 14"),
            "Section: §2K2.1\n\nBase Offense Level Text:\n(a) Base Offense Level: 14"
        );
        assert!(build_soc_prompt(&section, "(b)").starts_with("Section: §2K2.1\n\nSpecific"));
    }
}
