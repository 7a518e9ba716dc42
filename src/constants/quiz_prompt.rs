use std::fmt::Write;

use crate::{models::domain::DifficultyLevel, services::generation::GeneratorPrompt};

/// Curriculum text is cut to this many characters before it goes into a prompt.
pub const MAX_MATERIAL_CHARS: usize = 3000;

/// At most this many mastered questions are listed as examples to avoid.
pub const MAX_AVOID_EXAMPLES: usize = 5;

pub const QUIZ_SYSTEM_PROMPT: &str = "You are an expert financial education teacher creating multiple-choice quiz questions for young learners. \
Return ONLY a JSON object with a \"questions\" array. Each question has \"question\", \"options\" (exactly 4 complete, distinct strings), \
\"correct_answer\" (the 0-based index of the correct option) and \"explanation\". No prose, no markdown, no extra keys.";

const GROUNDED_RULES: &str = "CRITICAL REQUIREMENTS:
1. ALL questions MUST be answerable ONLY from the curriculum content below
2. Do NOT create questions about information not in the curriculum
3. Do NOT use external knowledge or make up facts
4. Every answer option MUST be a complete sentence or value, never truncated
5. Every option must be plausible but only ONE correct
6. Vary the position of correct answers (use positions 0, 1, 2 and 3)
7. Make options distinct and clearly different from each other";

const GENERAL_RULES: &str = "REQUIREMENTS:
1. Make questions relatable to the student's age and interests
2. Stay focused on the requested topic
3. Correct answers should be spread across positions 0-3, NOT always position 0
4. Include diverse question types (calculations, concepts, scenarios, decisions)
5. Include clear, educational explanations
6. All questions must be engaging and age-appropriate";

const EASY_INSTRUCTIONS: &str = "EASY LEVEL - Foundational Understanding:
- Focus on simple concepts, definitions and basic applications
- Questions should test recall of key terms and straightforward facts
- Options should be clearly distinct (no subtle differences)
- Avoid complex scenarios or multi-step reasoning
- Use concrete examples rather than abstract concepts";

const MEDIUM_INSTRUCTIONS: &str = "MEDIUM LEVEL - Applied Understanding:
- Test comprehension and application of concepts
- Present realistic, practical scenarios
- Require connecting two or more ideas
- Options should be plausible but clearly different
- Focus on practical use cases and real-world application";

const HARD_INSTRUCTIONS: &str = "HARD LEVEL - Advanced Analysis & Synthesis:
- Require critical thinking and analysis
- Include complex scenarios requiring multi-step reasoning
- Options should be sophisticated and require careful consideration
- Ask \"why\" and \"how\" questions rather than \"what\"
- Test the ability to apply concepts to new situations";

pub fn difficulty_instructions(difficulty: DifficultyLevel) -> &'static str {
    match difficulty {
        DifficultyLevel::Easy => EASY_INSTRUCTIONS,
        DifficultyLevel::Medium => MEDIUM_INSTRUCTIONS,
        DifficultyLevel::Hard => HARD_INSTRUCTIONS,
    }
}

pub fn age_context(age: u8) -> &'static str {
    match age {
        0..=11 => "Beginner - basic concepts, definitions and simple applications",
        12..=13 => "Intermediate - relationships, comparisons and real-world applications",
        _ => "Advanced - critical thinking, analysis and complex problem-solving",
    }
}

pub fn vocabulary_level(age: u8) -> &'static str {
    match age {
        0..=11 => "simple, everyday, easy to understand",
        12..=13 => "intermediate, moderately technical with explanations",
        _ => "advanced, technical, formal financial terminology",
    }
}

/// Renders the user message for one generation call.
pub fn build_quiz_prompt(prompt: &GeneratorPrompt) -> String {
    let profile = &prompt.profile;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Generate {} multiple-choice questions about \"{}\" for financial education.\n",
        prompt.count, prompt.topic
    );
    out.push_str(if prompt.material.is_some() {
        GROUNDED_RULES
    } else {
        GENERAL_RULES
    });

    let _ = write!(
        out,
        "\n\nDIFFICULTY LEVEL: {}\n{}\n\nSTUDENT PROFILE:\n- Age: {} years old\n- Learning level: {}\n- Vocabulary: {}\n",
        prompt.difficulty.as_str().to_uppercase(),
        difficulty_instructions(prompt.difficulty),
        profile.age,
        age_context(profile.age),
        vocabulary_level(profile.age),
    );
    if !profile.interests.is_empty() {
        let _ = writeln!(
            out,
            "- Interests: {}\nWhere relevant, relate examples to their interests.",
            profile.interests_label()
        );
    }

    if !prompt.avoid.is_empty() {
        out.push_str("\nThe student has already mastered these questions. Generate NEW, DIFFERENT questions:\n");
        for question in prompt.avoid.iter().take(MAX_AVOID_EXAMPLES) {
            let _ = writeln!(out, "  * {}", truncate_chars(question, 100));
        }
    }

    if let Some(material) = &prompt.material {
        let _ = write!(
            out,
            "\nCURRICULUM CONTENT (your ONLY source for questions):\n---START CURRICULUM---\n{}\n---END CURRICULUM---\n",
            truncate_chars(material.trim(), MAX_MATERIAL_CHARS)
        );
    }

    let _ = write!(
        out,
        "\nReturn exactly {} questions as JSON. Each question needs 4 distinct options, the 0-based index of the correct option and an explanation.",
        prompt.count
    );
    out
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
