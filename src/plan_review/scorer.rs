use lazy_static::lazy_static;
use regex::Regex;

/// Messages shorter than this are conversational filler
/// ("Now let me write up the implementation plan." is 44 chars).
pub const MIN_PLAN_CHARS: usize = 50;

const HEADING_WEIGHT: u32 = 100;
const NUMBERED_LIST_WEIGHT: u32 = 20;
const CHECKLIST_WEIGHT: u32 = 20;
const PLAN_KEYWORD_WEIGHT: u32 = 10;
const STEP_KEYWORD_WEIGHT: u32 = 5;

lazy_static! {
    static ref PLAN_HEADING_RE: Regex =
        Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+.*(?:Plan|Implementation|Proposed Approach)")
            .expect("valid plan heading regex");
}

/// Heuristic plan-likeness of one assistant message. 0 means "not a plan".
///
/// Weights are additive: a planning heading dominates, list structure adds a
/// medium bump and bare keywords only break ties between unstructured text.
pub fn score_plan(content: &str) -> u32 {
    if content.chars().count() < MIN_PLAN_CHARS {
        return 0;
    }

    let mut score = 0;
    let lower = content.to_lowercase();

    if PLAN_HEADING_RE.is_match(content) {
        score += HEADING_WEIGHT;
    }

    if content.contains("1. ") && content.contains("2. ") {
        score += NUMBERED_LIST_WEIGHT;
    }
    if content.contains("- [ ]") || content.contains("- [x]") {
        score += CHECKLIST_WEIGHT;
    }

    if lower.contains("plan") {
        score += PLAN_KEYWORD_WEIGHT;
    }
    if lower.contains("step") {
        score += STEP_KEYWORD_WEIGHT;
    }

    score
}
