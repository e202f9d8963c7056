//! Prompt templates for grading and output repair.
//! Each service that needs LLM calls defines its own prompts.rs alongside it.

/// System prompt for grading calls. Enforces JSON-only output.
pub const GRADING_SYSTEM: &str = "You are a strict technical interviewer grading \
    a candidate's spoken answer. You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Grading prompt. The evaluator fills {topic}, {question}, and {answer};
/// the same inputs always produce the same prompt.
pub const GRADING_PROMPT_TEMPLATE: &str = r#"Grade the candidate's answer to an interview question.

Topic: {topic}
Question: {question}

Candidate answer:
{answer}

Score the answer from 0 (no relevant content) to 100 (complete, precise, well structured).
Respond with exactly this JSON shape:
{"score": <number 0-100>, "feedback": "<2-3 sentences of concrete feedback>"}"#;

/// System prompt for the repair round-trip.
pub const REPAIR_SYSTEM: &str = "You fix malformed JSON. You MUST respond with \
    valid JSON only, no markdown fences, no commentary.";

/// Repair prompt. {broken} is the unparseable grader output, verbatim.
pub const REPAIR_PROMPT_TEMPLATE: &str = r#"The following text was supposed to be a JSON object of the shape
{"score": <number 0-100>, "feedback": "<string>"} but does not parse.
Reconstruct the intended object from it. Output only the corrected JSON object.

{broken}"#;

/// Builds the deterministic grading prompt for one question/answer pair.
pub fn build_grading_prompt(topic: &str, question: &str, answer: &str) -> String {
    GRADING_PROMPT_TEMPLATE
        .replace("{topic}", topic)
        .replace("{question}", question)
        .replace("{answer}", answer)
}
