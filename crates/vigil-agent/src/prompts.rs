//! System prompt for the conversational collaborator.

/// Observation guidelines shipped with the crate.
pub const MEDICAL_INSTRUCTIONS: &str = include_str!("../prompts/medical_instructions.md");

/// Full system prompt: the guidelines plus the capability framing the
/// agent receives for a live session.
pub fn system_prompt() -> String {
    format!(
        "{MEDICAL_INSTRUCTIONS}\n\
         \n\
         ## Your Capabilities\n\
         \n\
         You are an AI-powered wellness video assistant. You receive a live\n\
         video feed of the participant along with pose-estimation keypoints\n\
         overlaid on each frame. Use the video and pose data to perform the\n\
         observation steps above, then answer in the output format given.\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_carries_the_guidelines_and_capabilities() {
        let prompt = system_prompt();
        assert!(prompt.contains("Wellness Observation Guidelines"));
        assert!(prompt.contains("## Your Capabilities"));
        assert!(prompt.contains("not a medical diagnosis"));
    }
}
