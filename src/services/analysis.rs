//! Conversation analysis helpers.
//!
//! The voice agent tags interests inline as `[INTEREST: name]`. This module
//! extracts and strips those markers, and mines finished transcripts for
//! academic subjects, topics, and concepts via keyword tables. Everything
//! here is pure; persistence happens in `session_service`.

use crate::models::transcript::TranscriptEntry;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::OnceLock;

const MAX_TITLE_LEN: usize = 100;

/// Subjects/topics/concepts mined from a transcript.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ConversationAnalysis {
    pub subjects: Vec<String>,
    pub topics: Vec<String>,
    pub concepts: Vec<String>,
}

fn interest_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[INTEREST:\s*([^\]]+)\]").expect("interest marker regex"))
}

/// Extract interests marked with `[INTEREST: name]` from assistant text.
pub fn extract_interest_markers(text: &str) -> Vec<String> {
    interest_re()
        .captures_iter(text)
        .filter_map(|cap| {
            let name = cap[1].trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

/// Remove `[INTEREST: …]` markers and collapse whitespace, leaving text
/// suitable for storage and speech synthesis.
pub fn strip_interest_markers(text: &str) -> String {
    let stripped = interest_re().replace_all(text, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Generate a session title from the first user utterance, truncated to
/// 100 characters.
pub fn generate_title(entries: &[TranscriptEntry]) -> String {
    let first_user = entries
        .iter()
        .find(|e| e.speaker == "user")
        .map(|e| e.text.as_str())
        .unwrap_or("");

    if first_user.is_empty() {
        return "New Learning Thread".to_string();
    }
    if first_user.chars().count() > MAX_TITLE_LEN {
        let truncated: String = first_user.chars().take(MAX_TITLE_LEN - 3).collect();
        format!("{}...", truncated)
    } else {
        first_user.to_string()
    }
}

const SUBJECT_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Mathematics",
        &["math", "calculus", "algebra", "geometry", "statistics", "equation", "theorem"],
    ),
    (
        "Physics",
        &["physics", "force", "energy", "motion", "quantum", "gravity", "momentum"],
    ),
    (
        "Chemistry",
        &["chemistry", "chemical", "molecule", "reaction", "element", "compound", "atom"],
    ),
    (
        "Biology",
        &["biology", "cell", "dna", "evolution", "organism", "ecology", "genetics"],
    ),
    (
        "Computer Science",
        &["programming", "algorithm", "code", "software", "computer", "data structure"],
    ),
    (
        "History",
        &["history", "historical", "civilization", "war", "revolution", "ancient", "modern"],
    ),
    (
        "Literature",
        &["literature", "novel", "poetry", "writing", "author", "story", "narrative"],
    ),
    (
        "Psychology",
        &["psychology", "behavior", "mind", "cognitive", "emotion", "personality"],
    ),
    (
        "Economics",
        &["economics", "economy", "market", "finance", "trade", "supply", "demand"],
    ),
    (
        "Art",
        &["art", "painting", "sculpture", "drawing", "artistic", "gallery", "museum"],
    ),
];

const TOPIC_KEYWORDS: &[(&str, &[&str])] = &[
    ("Calculus", &["calculus", "derivative", "integral"]),
    ("Mechanics", &["physics", "motion", "force"]),
    ("Organic Chemistry", &["organic", "carbon", "compound"]),
    ("Genetics", &["gene", "dna", "heredity"]),
    ("Algorithms", &["algorithm", "sorting", "searching"]),
    ("World History", &["history", "civilization", "culture"]),
    ("Literary Analysis", &["literature", "theme", "character"]),
];

const CONCEPT_MAPPING: &[(&str, &[&str])] = &[
    ("calculus", &["Derivatives", "Integrals", "Limits"]),
    ("algebra", &["Equations", "Variables", "Functions"]),
    ("physics", &["Motion", "Forces", "Energy"]),
    ("chemistry", &["Reactions", "Bonds", "Elements"]),
    ("programming", &["Algorithms", "Data Structures", "Design Patterns"]),
    ("economics", &["Supply and Demand", "Market Theory", "Economic Models"]),
];

/// Mine the full transcript for academic subjects, topics, and concepts.
///
/// Keyword matching over the lowercased concatenated conversation. Falls
/// back to a `General Learning` subject when nothing matches.
pub fn analyze_conversation(entries: &[TranscriptEntry]) -> ConversationAnalysis {
    let text = entries
        .iter()
        .map(|e| e.text.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    let mut subjects = BTreeSet::new();
    for (subject, keywords) in SUBJECT_KEYWORDS {
        if keywords.iter().any(|kw| text.contains(kw)) {
            subjects.insert(subject.to_string());
        }
    }

    let mut topics = BTreeSet::new();
    for (topic, keywords) in TOPIC_KEYWORDS {
        if keywords.iter().any(|kw| text.contains(kw)) {
            topics.insert(topic.to_string());
        }
    }

    let mut concepts = BTreeSet::new();
    for (keyword, mapped) in CONCEPT_MAPPING {
        if text.contains(keyword) {
            concepts.extend(mapped.iter().map(|c| c.to_string()));
        }
    }

    if subjects.is_empty() {
        subjects.insert("General Learning".to_string());
    }

    ConversationAnalysis {
        subjects: subjects.into_iter().collect(),
        topics: topics.into_iter().collect(),
        concepts: concepts.into_iter().collect(),
    }
}
