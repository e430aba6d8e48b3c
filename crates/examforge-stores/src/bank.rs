//! TOML question banks: the on-disk seed for the in-memory repository.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use examforge_core::model::{Question, QuestionType};

/// Bank-level metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankMeta {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A question bank as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionBank {
    pub bank: BankMeta,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl QuestionBank {
    /// Structural issues in this bank; empty means valid.
    pub fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for question in &self.questions {
            if !seen.insert(question.id.as_str()) {
                issues.push(format!("duplicate question id '{}'", question.id));
            }
            match question.question_type {
                QuestionType::SingleChoice | QuestionType::MultipleChoice
                | QuestionType::TrueFalse => {
                    if question.options.is_empty() {
                        issues.push(format!("question '{}' has no options", question.id));
                    }
                    if question.correct.is_empty() {
                        issues.push(format!("question '{}' has no correct answer", question.id));
                    }
                    for answer in &question.correct {
                        if !question.options.contains(answer) {
                            issues.push(format!(
                                "question '{}': correct answer '{answer}' is not an option",
                                question.id
                            ));
                        }
                    }
                }
            }
        }
        issues
    }
}

/// Load a single bank file.
pub fn load_bank(path: &Path) -> Result<QuestionBank> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading question bank {}", path.display()))?;
    let bank: QuestionBank = toml::from_str(&raw)
        .with_context(|| format!("parsing question bank {}", path.display()))?;
    Ok(bank)
}

/// Load a bank file, or every `.toml` bank in a directory.
pub fn load_banks(path: &Path) -> Result<Vec<QuestionBank>> {
    if path.is_file() {
        return Ok(vec![load_bank(path)?]);
    }
    let mut banks = Vec::new();
    let entries = std::fs::read_dir(path)
        .with_context(|| format!("reading bank directory {}", path.display()))?;
    for entry in entries {
        let entry = entry?;
        let file = entry.path();
        if file.extension().map(|e| e == "toml").unwrap_or(false) {
            banks.push(load_bank(&file)?);
        }
    }
    banks.sort_by(|a, b| a.bank.id.cmp(&b.bank.id));
    Ok(banks)
}
