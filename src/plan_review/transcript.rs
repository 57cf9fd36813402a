//! Claude Code transcript (JSONL) reading and plan selection.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::scorer::score_plan;

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("failed to read transcript {path}: {source}")]
    ReadTranscript {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no plan content found in transcript")]
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    #[serde(other)]
    Other,
}

/// Message content is either a plain string or a list of content blocks.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TurnContent {
    Text(String),
    Blocks(Vec<serde_json::Value>),
}

impl TurnContent {
    /// Plain text of the turn; block text fields are joined with newlines.
    pub fn text(&self) -> String {
        match self {
            TurnContent::Text(s) => s.clone(),
            TurnContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: TurnContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanCandidate {
    pub text: String,
    pub score: u32,
}

#[derive(Deserialize)]
struct RawMessage {
    role: Role,
    #[serde(default)]
    content: Option<TurnContent>,
}

/// One transcript line. Claude Code nests the message under `message`;
/// bare `{role, content}` lines are accepted too.
#[derive(Deserialize)]
struct RawLine {
    #[serde(default)]
    message: Option<RawMessage>,
    #[serde(default)]
    role: Option<Role>,
    #[serde(default)]
    content: Option<TurnContent>,
}

/// Parse one JSONL line. Malformed or role-less lines yield `None`.
pub fn parse_turn(line: &str) -> Option<ConversationTurn> {
    let raw: RawLine = serde_json::from_str(line).ok()?;
    let (role, content) = match raw.message {
        Some(msg) => (msg.role, msg.content),
        None => (raw.role?, raw.content),
    };
    Some(ConversationTurn {
        role,
        content: content.unwrap_or(TurnContent::Text(String::new())),
    })
}

pub fn parse_transcript(data: &str) -> Vec<ConversationTurn> {
    data.lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(parse_turn)
        .collect()
}

/// Best plan among the assistant turns. On equal scores the later turn wins,
/// so a restated plan supersedes an earlier draft.
pub fn select_plan(turns: &[ConversationTurn]) -> Option<PlanCandidate> {
    let mut best: Option<PlanCandidate> = None;

    for turn in turns.iter().filter(|t| t.role == Role::Assistant) {
        let text = turn.content.text();
        let score = score_plan(&text);
        if score == 0 {
            continue;
        }
        let best_score = best.as_ref().map_or(0, |b| b.score);
        if score >= best_score {
            best = Some(PlanCandidate { text, score });
        }
    }

    best
}

pub fn extract_plan_from_transcript(path: &Path) -> Result<String, PlanError> {
    tracing::info!("Reading transcript from: {}", path.display());

    let data = std::fs::read_to_string(path).map_err(|source| PlanError::ReadTranscript {
        path: path.to_path_buf(),
        source,
    })?;

    let turns = parse_transcript(&data);
    tracing::debug!("Parsed {} transcript turns", turns.len());

    select_plan(&turns)
        .map(|c| {
            tracing::debug!("Selected plan candidate with score {}", c.score);
            c.text
        })
        .ok_or(PlanError::NotFound)
}
