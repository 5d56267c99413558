//! Builds the system instruction sent to the response generator.
//!
//! The instruction is a base persona, then one adaptive block per selected
//! profile (in catalog order), then the document context and the rule that the
//! answer must come from it.

use crate::profile::{
    FOCUS_AND_ORGANIZATION, MATH_AND_NUMERACY, READING_AND_LANGUAGE, STANDARD, SelectionState,
    VISION_AND_SCREEN_READER, WRITING_AND_EXPRESSION,
};

const BASE_PERSONA: &str = "You are an **Accessible Study Assistant** with expertise in \
    mathematics and pedagogy. Your primary goal is to answer the user's question clearly \
    and in a way that suits how they learn. ";

/// The answer given when the document does not cover the question.
pub const NOT_FOUND_ANSWER: &str = "I'm sorry, I could not find the answer in the provided document.";

const ADAPTIVE_BLOCKS: [(&str, &str); 6] = [
    (
        STANDARD,
        "Answer clearly and accurately, using standard academic language. \
         For math problems, provide a detailed, step-by-step solution.",
    ),
    (
        READING_AND_LANGUAGE,
        "The student needs reading and language support. \
         1. Simplify all complex sentences (use a maximum 8th-grade reading level). \
         2. **Bold** all key terms and operation words. \
         3. Use short paragraphs and clear visual spacing. \
         4. Maintain a friendly and encouraging tone.",
    ),
    (
        WRITING_AND_EXPRESSION,
        "The student needs writing and expression support. \
         1. Organize the answer as a short outline with headings. \
         2. Offer sentence starters the student can reuse in their own words. \
         3. Show one example of how to phrase the key idea.",
    ),
    (
        VISION_AND_SCREEN_READER,
        "The student uses a screen reader. \
         1. Write linear text that reads naturally aloud. \
         2. Do not use tables, ASCII art or emoji. \
         3. Describe any figure, graph or symbol in words. \
         4. Spell out mathematical notation the first time it appears.",
    ),
    (
        MATH_AND_NUMERACY,
        "The student needs math and numeracy support. Be a supportive math tutor: \
         1. Break down all explanations and solutions into a clear, numbered, step-by-step checklist. \
         2. Provide a simple, real-world analogy for the core concept. \
         3. Use bold text and bullet points to organize information. \
         4. Keep sentences direct and concise to manage cognitive load.",
    ),
    (
        FOCUS_AND_ORGANIZATION,
        "The student needs focus and organization support. Be a structured tutor: \
         1. Start with a brief, single-sentence summary of the answer. \
         2. Follow with a clear, numbered, step-by-step checklist. \
         3. Use short paragraphs and bold key terms. \
         4. Do not offer extraneous information; stay focused on the explicit question.",
    ),
];

/// Builds the instruction for `selection`, grounding it in `document_text` when given.
pub fn system_instruction(selection: &SelectionState, document_text: Option<&str>) -> String {
    let mut instruction = String::from(BASE_PERSONA);

    let blocks: Vec<&str> = ADAPTIVE_BLOCKS
        .iter()
        .filter(|(id, _)| selection.contains(id))
        .map(|(_, block)| *block)
        .collect();
    instruction.push_str(&blocks.join("\n\n"));

    match document_text.map(str::trim).filter(|t| !t.is_empty()) {
        Some(context) => {
            instruction.push_str("\n\n--- DOCUMENT CONTEXT START ---\n\n");
            instruction.push_str(context);
            instruction.push_str("\n\n--- DOCUMENT CONTEXT END ---\n\n");
            instruction.push_str(
                "**CRITICAL CONSTRAINT:** Answer the user's question *strictly* using the \
                 information in the 'DOCUMENT CONTEXT' above. Do not use external knowledge. \
                 If the context does not contain the answer, state: '",
            );
            instruction.push_str(NOT_FOUND_ANSWER);
            instruction.push_str("' Apply all accessibility rules to your final answer.");
        }
        None => {
            instruction.push_str("\n\nApply all accessibility rules to your final answer.");
        }
    }

    instruction
}
