//! Knowledge base: the fixed, ordered set of question/answer pairs.
//!
//! Entry identity is its position. The order defines the correspondence with
//! the embedding table and the tie-break order for equally scored matches.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Answer returned when no entry scores above the confidence threshold.
pub const FALLBACK_ANSWER: &str = "I'm sorry, I don't have information about that specific topic. Could you try rephrasing your question or ask about productivity, remote work, task prioritization, startup funding, or professional development?";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub question: String,
    pub answer: String,
}

impl KnowledgeEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("failed to read knowledge base {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("knowledge base {path} is malformed: {source}")]
    Parse {
        path: String,
        source: serde_yml::Error,
    },

    #[error("knowledge base entry #{0} has an empty question")]
    EmptyQuestion(usize),
}

/// Ordered, immutable sequence of entries plus the fallback message.
#[derive(Clone, Debug)]
pub struct KnowledgeBase {
    entries: Vec<KnowledgeEntry>,
    fallback_answer: String,
}

impl KnowledgeBase {
    pub fn new(entries: Vec<KnowledgeEntry>) -> Self {
        Self {
            entries,
            fallback_answer: FALLBACK_ANSWER.to_string(),
        }
    }

    pub fn with_fallback_answer(mut self, fallback_answer: impl Into<String>) -> Self {
        self.fallback_answer = fallback_answer.into();
        self
    }

    /// The 10-entry professional Q&A base shipped with the bot.
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_ENTRIES
                .iter()
                .map(|(question, answer)| KnowledgeEntry::new(*question, *answer))
                .collect(),
        )
    }

    /// Load entries from a YAML list of `{question, answer}` maps.
    ///
    /// An empty list is accepted here; rejecting it is the index's job.
    pub fn load(path: &Path) -> Result<Self, KnowledgeError> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| KnowledgeError::Io {
            path: display.clone(),
            source,
        })?;

        let entries: Vec<KnowledgeEntry> =
            serde_yml::from_str(&raw).map_err(|source| KnowledgeError::Parse {
                path: display,
                source,
            })?;

        if let Some(idx) = entries.iter().position(|e| e.question.trim().is_empty()) {
            return Err(KnowledgeError::EmptyQuestion(idx + 1));
        }

        Ok(Self::new(entries))
    }

    #[cfg(test)]
    pub(crate) fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn get(&self, idx: usize) -> Option<&KnowledgeEntry> {
        self.entries.get(idx)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn questions(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.question.clone()).collect()
    }

    pub fn fallback_answer(&self) -> &str {
        &self.fallback_answer
    }
}

const BUILTIN_ENTRIES: [(&str, &str); 10] = [
    (
        "How do I prioritize tasks effectively?",
        "Use the Eisenhower Matrix: categorize tasks by urgency and importance. Focus on important-urgent tasks first, schedule important-not urgent tasks, delegate urgent-not important tasks, and eliminate neither urgent nor important tasks.",
    ),
    (
        "What are the best practices for remote work productivity?",
        "Set up a dedicated workspace, maintain regular hours, take frequent breaks, communicate clearly with your team, use productivity tools like task managers, and establish boundaries between work and personal life.",
    ),
    (
        "How do I manage time better during busy periods?",
        "Use time-blocking to schedule focused work sessions, batch similar tasks together, minimize multitasking, set realistic deadlines, and regularly review and adjust your schedule based on what works best.",
    ),
    (
        "What should I consider when seeking startup funding?",
        "Prepare a solid business plan, know your market and competition, have clear financial projections, build a strong team, create a minimum viable product, and research different funding options like angel investors, VCs, or crowdfunding.",
    ),
    (
        "How do I handle work-life balance?",
        "Set clear boundaries between work and personal time, learn to say no to non-essential commitments, prioritize self-care and health, communicate your limits to colleagues, and regularly assess and adjust your workload.",
    ),
    (
        "What are effective communication strategies in the workplace?",
        "Practice active listening, be clear and concise in your messaging, choose the right communication channel for each situation, provide regular updates on projects, and ask clarifying questions when needed.",
    ),
    (
        "How do I stay motivated during challenging projects?",
        "Break large projects into smaller milestones, celebrate small wins, maintain a growth mindset, seek feedback and support from colleagues, and remind yourself of the project's purpose and impact.",
    ),
    (
        "What skills should I develop for career advancement?",
        "Focus on both technical skills relevant to your field and soft skills like leadership, communication, problem-solving, and adaptability. Stay updated with industry trends and consider pursuing relevant certifications.",
    ),
    (
        "How do I build a professional network effectively?",
        "Attend industry events and conferences, engage on professional social media platforms, offer help and value to others, maintain existing relationships, and follow up consistently with new connections.",
    ),
    (
        "What are the key elements of a successful presentation?",
        "Know your audience and tailor your content accordingly, have a clear structure with opening, body, and conclusion, use visual aids effectively, practice your delivery, engage with your audience, and prepare for questions.",
    ),
];
