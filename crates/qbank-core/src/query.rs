//! Turns a parsed job-requirements record into retrieval input.

use crate::types::Requirements;

pub const MAX_SKILLS: usize = 5;
pub const MAX_TECHNOLOGIES: usize = 5;
pub const MAX_FOCUS_AREAS: usize = 3;

/// Space-joined query: job role, then the leading skills, technologies and
/// focus areas, in that order.
pub fn build_query(requirements: &Requirements) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if let Some(role) = requirements.job_role.as_deref().filter(|r| !r.is_empty()) {
        parts.push(role);
    }
    parts.extend(requirements.required_skills.iter().take(MAX_SKILLS).map(String::as_str));
    parts.extend(requirements.technologies.iter().take(MAX_TECHNOLOGIES).map(String::as_str));
    parts.extend(requirements.interview_focus_areas.iter().take(MAX_FOCUS_AREAS).map(String::as_str));
    parts.join(" ")
}

const CATEGORY_TRIGGERS: &[(&str, &[&str])] = &[
    ("Python", &["python", "java", "javascript", "c++"]),
    ("Data Structures & Algorithms", &["algorithm", "data structure", "leetcode", "coding"]),
    ("System Design", &["system design", "architecture", "scalability", "distributed"]),
    ("Machine Learning", &["machine learning", "ml", "ai", "model"]),
    ("Deep Learning", &["deep learning", "neural network", "tensorflow", "pytorch"]),
    ("NLP", &["nlp", "natural language", "text", "language model"]),
    ("SQL & Databases", &["sql", "database", "postgresql", "mysql", "mongodb"]),
    ("Cloud Computing", &["aws", "azure", "gcp", "cloud"]),
    ("DevOps", &["docker", "kubernetes", "ci/cd", "devops"]),
];

pub const ALWAYS_INCLUDED_CATEGORY: &str = "Behavioral";

/// Question categories worth drawing from for these requirements.
///
/// Requirement entries are compared whole and case-insensitively against
/// each category's trigger terms. Behavioral is always last.
pub fn relevant_categories(requirements: &Requirements) -> Vec<String> {
    let terms: Vec<String> = requirements
        .required_skills
        .iter()
        .chain(&requirements.technologies)
        .chain(&requirements.interview_focus_areas)
        .map(|s| s.to_lowercase())
        .collect();

    let mut categories: Vec<String> = CATEGORY_TRIGGERS
        .iter()
        .filter(|(_, triggers)| triggers.iter().any(|t| terms.iter().any(|term| term.as_str() == *t)))
        .map(|(category, _)| (*category).to_string())
        .collect();
    categories.push(ALWAYS_INCLUDED_CATEGORY.to_string());
    categories
}
