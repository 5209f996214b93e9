//! Academic programs and the occupations they feed into.
//!
//! A program document carries a slim career list (code, title) rather than
//! full occupation records; job and wage data stay in the per-occupation
//! documents and are joined at read time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Slim career row kept inside a program document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramCareer {
    pub code: String,
    pub title: String,
}

/// An academic program and its linked occupation codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    /// Sequential program code, assigned by the store on creation.
    pub code: u32,
    pub title: String,
    /// Degrees or certificates offered under the program.
    pub degree_types: Vec<String>,
    pub careers: Vec<ProgramCareer>,
    pub last_updated: DateTime<Utc>,
}

impl Program {
    pub fn new(code: u32, title: impl Into<String>, degree_types: Vec<String>) -> Self {
        Self {
            code,
            title: title.into(),
            degree_types,
            careers: Vec::new(),
            last_updated: Utc::now(),
        }
    }

    pub fn has_career(&self, code: &str) -> bool {
        self.careers.iter().any(|c| c.code == code)
    }

    /// Attach occupation matches to the program, skipping duplicates and
    /// any code whose SOC major group (first two digits) is blacklisted.
    pub fn assign_careers<I>(&mut self, matches: I, blacklist: &[&str])
    where
        I: IntoIterator<Item = ProgramCareer>,
    {
        for career in matches {
            let major_group = career.code.get(..2).unwrap_or_default();
            if blacklist.contains(&major_group) {
                continue;
            }
            if self.has_career(&career.code) {
                continue;
            }
            self.careers.push(career);
        }
        self.last_updated = Utc::now();
    }
}
