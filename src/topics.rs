//! Known topics: display names, category types and the subject descriptions
//! fed into prompt compilation.

use std::collections::HashMap;
use std::sync::LazyLock;

const GENERAL_DESCRIPTION: &str = "General international student guidance";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TopicInfo {
  pub key: &'static str,
  pub display_name: &'static str,
  pub category: &'static str,
  /// Subject line for lesson prompts.
  pub lesson_subject: &'static str,
  /// Subject line for quiz prompts.
  pub quiz_subject: &'static str,
}

const TOPICS: &[TopicInfo] = &[
  TopicInfo {
    key: "campus-life",
    display_name: "Campus Life",
    category: "culture",
    lesson_subject: "Campus Life and Social Norms - Understanding campus culture, social interactions, and general mannerisms for international students",
    quiz_subject: "Campus Life and Social Norms for international students",
  },
  TopicInfo {
    key: "general-mannerisms",
    display_name: "General Mannerisms",
    category: "culture",
    lesson_subject: "General Mannerisms and Social Etiquette - Understanding social norms, communication styles, cultural behaviors, and proper etiquette for international students",
    quiz_subject: "General Mannerisms and Social Etiquette in North America",
  },
  TopicInfo {
    key: "banking",
    display_name: "Banking",
    category: "practical-skills",
    lesson_subject: "Banking and Financial Management - Setting up bank accounts, understanding credit, managing finances, and financial literacy",
    quiz_subject: "Banking and Financial Management for students",
  },
  TopicInfo {
    key: "transportation",
    display_name: "Transportation",
    category: "practical-skills",
    lesson_subject: "Transportation Systems - Using public transport, campus shuttles, ride-sharing services, and getting around the city",
    quiz_subject: "Transportation Systems and getting around campus/city",
  },
  TopicInfo {
    key: "housing",
    display_name: "Housing",
    category: "practical-skills",
    lesson_subject: "Housing and Accommodation - Finding housing, understanding leases, roommate dynamics, and accommodation options",
    quiz_subject: "Housing and Accommodation for international students",
  },
  TopicInfo {
    key: "healthcare",
    display_name: "Healthcare",
    category: "practical-skills",
    lesson_subject: "Healthcare and Insurance - Understanding health insurance, finding doctors, emergency procedures, and healthcare systems",
    quiz_subject: "Healthcare and Insurance systems for students",
  },
  TopicInfo {
    key: "terminology",
    display_name: "Terminology",
    category: "language",
    lesson_subject: "Modern Terminology and Slang - Gen Z slang, academic terminology, cultural references, and modern language usage",
    quiz_subject: "Modern Terminology, Slang, and Academic Language",
  },
  TopicInfo {
    key: "visa-status",
    display_name: "Visa Status",
    category: "legal-immigration",
    lesson_subject: "Maintaining Visa Status - Visa requirements, compliance, reporting obligations, and maintaining legal status",
    quiz_subject: "Maintaining Visa Status and immigration compliance",
  },
  TopicInfo {
    key: "campus-jobs",
    display_name: "Campus Jobs",
    category: "legal-immigration",
    lesson_subject: "Campus Employment - Work authorization, job opportunities, tax implications, and employment regulations",
    quiz_subject: "Campus Employment and work authorization",
  },
  TopicInfo {
    key: "laws",
    display_name: "Laws",
    category: "legal-immigration",
    lesson_subject: "Important Laws and Regulations - Legal requirements, rights and responsibilities, compliance, and legal awareness",
    quiz_subject: "Important Laws and Regulations for international students",
  },
  TopicInfo {
    key: "student-office",
    display_name: "Student Office",
    category: "legal-immigration",
    lesson_subject: "International Student Office Updates - Staying updated with requirements, paperwork, deadlines, and administrative processes",
    quiz_subject: "International Student Office procedures and requirements",
  },
];

static BY_KEY: LazyLock<HashMap<&'static str, &'static TopicInfo>> =
  LazyLock::new(|| TOPICS.iter().map(|t| (t.key, t)).collect());

pub fn lookup(topic: &str) -> Option<&'static TopicInfo> {
  BY_KEY.get(topic).copied()
}

pub fn lesson_subject(topic: &str) -> &'static str {
  lookup(topic).map(|t| t.lesson_subject).unwrap_or(GENERAL_DESCRIPTION)
}

pub fn quiz_subject(topic: &str) -> &'static str {
  lookup(topic).map(|t| t.quiz_subject).unwrap_or(GENERAL_DESCRIPTION)
}

/// Human label; unknown topics are shown by their key.
pub fn display_name(topic: &str) -> String {
  lookup(topic).map(|t| t.display_name.to_string()).unwrap_or_else(|| topic.to_string())
}

pub fn category(topic: &str) -> &'static str {
  lookup(topic).map(|t| t.category).unwrap_or("general")
}
