//! Prompt Assembler — turns the resolved topic, selections, memory and
//! examples into the system + user messages for one completion call.
//!
//! The system segment is an ordered list of constraints. Later blocks refer
//! back to earlier ones ("avoid the previous hook"), so block order is fixed.

use crate::generation::intent::ChangeIntent;
use crate::generation::variation::{Selections, Variation};
use crate::llm_client::ChatMessage;

/// Style directives present in every prompt.
pub const BASE_STYLE: &str = "You are an expert LinkedIn ghostwriter. \
    Write in a professional yet conversational tone, in the first person. \
    Keep the post under 1,300 characters, with short paragraphs and generous line breaks. \
    Be clear and specific: one idea per post, concrete details over generalities. \
    Avoid clichés, buzzwords and empty motivational phrases. \
    End with 3 to 5 relevant hashtags.";

/// Added for elevated-tier requests.
pub const ADVANCED_STRUCTURE: &str = "ADVANCED STRUCTURE:\n\
    - The post MUST open with a scroll-stopping hook and MUST close with a clear call to action.\n\
    - Build a narrative arc: tension, turning point, takeaway.\n\
    - Optimize the storytelling for dwell time: vary sentence length and end each paragraph with a reason to keep reading.";

/// The user segment. Every constraint lives in the system segment.
pub const USER_INSTRUCTION: &str = "Write the LinkedIn post now, honoring every instruction above. \
    Return only the post text, with no preamble or commentary.";

/// Everything the assembler reads. Empty `history` / `examples` omit their blocks.
#[derive(Debug, Clone)]
pub struct PromptInputs<'a> {
    pub topic: &'a str,
    pub selections: &'a Selections,
    pub intent: ChangeIntent,
    pub elevated: bool,
    pub history: &'a str,
    pub examples: &'a str,
}

/// Builds the ordered `[system, user]` messages.
pub fn assemble_prompt(inputs: &PromptInputs<'_>) -> Vec<ChatMessage> {
    let selections = inputs.selections;
    let mut blocks: Vec<String> = vec![BASE_STYLE.to_string()];

    if let Some(hook) = selections.hook.chosen() {
        blocks.push(format!(
            "Open the post with this exact hook, word for word, adapting only placeholders \
             such as {{topic}} to fit: \"{hook}\""
        ));
    }

    if inputs.elevated {
        blocks.push(ADVANCED_STRUCTURE.to_string());
    }

    if let Some(block) = requirement_block(
        "HOOK REQUIREMENT",
        "Use this hook",
        "hook",
        &selections.hook,
        inputs.intent.hook,
    ) {
        blocks.push(block);
    }

    if let Some(block) = requirement_block(
        "FRAMEWORK REQUIREMENT",
        "Structure the post using this narrative framework",
        "framework",
        &selections.framework,
        inputs.intent.framework,
    ) {
        blocks.push(block);
    }

    if let Some(block) = requirement_block(
        "CALL TO ACTION REQUIREMENT",
        "Close the post with this call to action, as the final line before the hashtags",
        "call to action",
        &selections.cta,
        inputs.intent.cta,
    ) {
        blocks.push(block);
    }

    blocks.push(format!("TOPIC: {}", inputs.topic.trim()));

    let history = inputs.history.trim();
    if !history.is_empty() {
        blocks.push(format!(
            "CLIENT HISTORY (recent posts for this client; do not repeat their angles or wording):\n{history}"
        ));
    }

    let examples = inputs.examples.trim();
    if !examples.is_empty() {
        blocks.push(format!(
            "SIMILAR POSTS (style references only; never copy them):\n{examples}"
        ));
    }

    vec![
        ChatMessage::system(blocks.join("\n\n")),
        ChatMessage::user(USER_INSTRUCTION),
    ]
}

/// Requirement block for one category, or `None` when nothing was selected.
fn requirement_block(
    title: &str,
    directive: &str,
    noun: &str,
    variation: &Variation,
    change_requested: bool,
) -> Option<String> {
    let chosen = variation.chosen()?;
    let mut block = format!("{title}:\n{directive}: \"{chosen}\"");
    if let Some(previous) = variation.distinct_previous() {
        block.push_str(&format!(
            "\nDo NOT reuse the previous {noun}: \"{previous}\""
        ));
    }
    if change_requested {
        block.push_str(&format!(
            "\nThe user explicitly asked for a new {noun}. Make it noticeably different from before."
        ));
    }
    Some(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::Role;

    fn variation(chosen: Option<&str>, previous: Option<&str>) -> Variation {
        Variation {
            chosen: chosen.map(str::to_string),
            previous: previous.map(str::to_string),
        }
    }

    fn full_selections() -> Selections {
        Selections {
            hook: variation(Some("Nobody talks about this:"), Some("I was wrong about {topic}.")),
            framework: variation(Some("Problem, Agitate, Solve"), None),
            cta: variation(Some("What would you add?"), Some("What would you add?")),
        }
    }

    fn system_text(messages: &[ChatMessage]) -> &str {
        assert_eq!(messages[0].role, Role::System);
        &messages[0].content
    }

    fn position(haystack: &str, needle: &str) -> usize {
        haystack
            .find(needle)
            .unwrap_or_else(|| panic!("{needle:?} missing from prompt"))
    }

    #[test]
    fn test_returns_system_then_fixed_user_segment() {
        let selections = Selections::default();
        let messages = assemble_prompt(&PromptInputs {
            topic: "remote work",
            selections: &selections,
            intent: ChangeIntent::default(),
            elevated: false,
            history: "",
            examples: "",
        });
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, USER_INSTRUCTION);
        let system = system_text(&messages);
        assert!(system.starts_with(BASE_STYLE));
        assert!(system.ends_with("TOPIC: remote work"));
        assert!(!system.contains("REQUIREMENT"));
        assert!(!system.contains("CLIENT HISTORY"));
        assert!(!system.contains("SIMILAR POSTS"));
        assert!(!system.contains("ADVANCED STRUCTURE"));
    }

    #[test]
    fn test_previous_hook_avoidance_and_block_order() {
        let selections = full_selections();
        let messages = assemble_prompt(&PromptInputs {
            topic: "leadership tips",
            selections: &selections,
            intent: ChangeIntent {
                hook: true,
                ..Default::default()
            },
            elevated: true,
            history: "1. Request: leadership tips",
            examples: "Example 1:\nGreat leaders listen.",
        });
        let system = system_text(&messages);

        assert!(system.contains("Use this hook: \"Nobody talks about this:\""));
        assert!(system.contains("Do NOT reuse the previous hook: \"I was wrong about {topic}.\""));
        assert!(system.contains("explicitly asked for a new hook"));

        let order = [
            position(system, BASE_STYLE),
            position(system, "Open the post with this exact hook"),
            position(system, "ADVANCED STRUCTURE"),
            position(system, "HOOK REQUIREMENT"),
            position(system, "FRAMEWORK REQUIREMENT"),
            position(system, "CALL TO ACTION REQUIREMENT"),
            position(system, "TOPIC: leadership tips"),
            position(system, "CLIENT HISTORY"),
            position(system, "SIMILAR POSTS"),
        ];
        assert!(order.windows(2).all(|w| w[0] < w[1]), "blocks out of order: {order:?}");
    }

    #[test]
    fn test_same_previous_is_not_flagged_for_avoidance() {
        let selections = full_selections();
        let messages = assemble_prompt(&PromptInputs {
            topic: "t",
            selections: &selections,
            intent: ChangeIntent::default(),
            elevated: false,
            history: "",
            examples: "",
        });
        let system = system_text(&messages);
        assert!(!system.contains("previous call to action"));
        assert!(!system.contains("previous framework"));
        assert!(!system.contains("explicitly asked"));
    }

    #[test]
    fn test_disabled_categories_are_omitted() {
        let selections = Selections {
            hook: variation(Some("Hot take:"), None),
            ..Default::default()
        };
        let messages = assemble_prompt(&PromptInputs {
            topic: "t",
            selections: &selections,
            intent: ChangeIntent::default(),
            elevated: false,
            history: "   ",
            examples: "",
        });
        let system = system_text(&messages);
        assert!(system.contains("HOOK REQUIREMENT"));
        assert!(!system.contains("FRAMEWORK REQUIREMENT"));
        assert!(!system.contains("CALL TO ACTION REQUIREMENT"));
        assert!(!system.contains("CLIENT HISTORY"));
    }
}
