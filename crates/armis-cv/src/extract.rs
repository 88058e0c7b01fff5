//! Heuristic CV text scraping.
//!
//! Best effort by contract: every function here is total, returns a
//! well-shaped [`DraftProfile`] for any input, and may find nothing. A human
//! reviews the draft before any of it is applied.
//!
//! | Field | Rule |
//! |-------|------|
//! | email | first address-shaped match |
//! | phone | first digit run with 9–15 digits |
//! | name | first short capitalised line among the first few lines; `Last, First` if comma-separated |
//! | education | lines with a degree keyword; the last 19xx/20xx on the line is the year |
//! | skills | text after a `Skills:` header up to the next blank line or header, split on `, ; | • · /` |

use std::{
  collections::HashSet,
  sync::{Arc, LazyLock},
};

use armis_core::draft::{DraftContact, DraftEducation, DraftPersonal, DraftProfile};
use regex::Regex;
use tracing::{debug, warn};

use crate::{document::DocumentTextExtractor, upload::DocumentKind};

const NAME_SCAN_LINES: usize = 5;
const NAME_MAX_CHARS: usize = 50;
const EDUCATION_MAX_CHARS: usize = 200;
const SKILL_MAX_CHARS: usize = 50;
const MAX_SKILLS: usize = 50;
const PHONE_DIGITS: std::ops::RangeInclusive<usize> = 9..=15;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(?:\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}")
    .expect("static email pattern")
});

static PHONE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\+?\d[\d \t().\-]{6,}\d").expect("static phone pattern"));

static NAME: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^[A-Z][A-Za-z'\-]+(?:,?\s+[A-Z][A-Za-z'\-.]*){1,3}$").expect("static name pattern")
});

static DEGREE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"(?i)\b(?:bachelor|master|diploma|degree|certificate|doctorate|phd|ph\.d|bsc|b\.sc|msc|m\.sc|mba|beng|b\.eng|grade 12|a[- ]level|o[- ]level)\b",
  )
  .expect("static degree pattern")
});

static YEAR: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").expect("static year pattern"));

static SKILLS_HEADER: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)^\s*(?:key\s+|technical\s+|core\s+)?skills?\b(?:\s*(?:&|and)\s*\w+)?\s*:?\s*(.*)$")
    .expect("static skills header pattern")
});

static SECTION_HEADER: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"(?i)^\s*(?:education|experience|employment|work history|references|qualifications|languages|hobbies|interests|certifications|training|awards|personal details|profile|summary)\s*:?\s*$",
  )
  .expect("static section header pattern")
});

static SKILL_SPLIT: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"[,;|•·/]").expect("static skill delimiter pattern"));

/// Words that mark a heading rather than a person's name.
const NOT_A_NAME: &[&str] = &[
  "curriculum", "vitae", "resume", "résumé", "profile", "personal", "details",
  "contact", "information", "summary", "education", "skills", "experience",
  "objective", "references",
];

// ─── Extractor service ───────────────────────────────────────────────────────

/// Document bytes in, draft out. Conversion failures are logged and yield an
/// empty draft.
#[derive(Clone)]
pub struct CvExtractor {
  documents: Arc<dyn DocumentTextExtractor>,
}

impl CvExtractor {
  pub fn new(documents: Arc<dyn DocumentTextExtractor>) -> Self { Self { documents } }

  pub fn extract(&self, kind: DocumentKind, bytes: &[u8]) -> DraftProfile {
    match self.documents.extract_text(kind, bytes) {
      Ok(text) => extract_draft(&text),
      Err(e) => {
        warn!(%kind, error = %e, "document text extraction failed");
        DraftProfile::default()
      }
    }
  }
}

// ─── Heuristics ──────────────────────────────────────────────────────────────

/// Lossy-decode `bytes` and scrape them.
pub fn extract_draft_bytes(bytes: &[u8]) -> DraftProfile {
  extract_draft(&String::from_utf8_lossy(bytes))
}

pub fn extract_draft(text: &str) -> DraftProfile {
  let lines: Vec<&str> = text.lines().map(str::trim).collect();
  let draft = DraftProfile {
    personal:  find_name(&lines),
    contact:   DraftContact { email: find_email(text), phone: find_phone(text) },
    education: find_education(&lines),
    skills:    find_skills(&lines),
  };
  debug!(
    name = draft.personal.full_name.is_some(),
    education = draft.education.len(),
    skills = draft.skills.len(),
    "cv text scraped"
  );
  draft
}

fn find_email(text: &str) -> Option<String> {
  EMAIL.find(text).map(|m| m.as_str().trim_end_matches('.').to_owned())
}

fn find_phone(text: &str) -> Option<String> {
  PHONE
    .find_iter(text)
    .map(|m| m.as_str().trim())
    .find(|candidate| PHONE_DIGITS.contains(&candidate.chars().filter(char::is_ascii_digit).count()))
    .map(str::to_owned)
}

fn find_name(lines: &[&str]) -> DraftPersonal {
  let candidate = lines
    .iter()
    .filter(|line| !line.is_empty())
    .take(NAME_SCAN_LINES)
    .find(|line| {
      line.chars().count() < NAME_MAX_CHARS
        && NAME.is_match(line)
        && !line
          .split(|c: char| c.is_whitespace() || c == ',')
          .any(|word| NOT_A_NAME.contains(&word.to_lowercase().as_str()))
    });

  let Some(line) = candidate else { return DraftPersonal::default() };

  let (first, last) = match line.split_once(',') {
    Some((last, first)) => (first.trim(), last.trim()),
    None => {
      let mut words = line.split_whitespace();
      let first = words.next().unwrap_or_default();
      (first, words.last().unwrap_or_default())
    }
  };

  DraftPersonal {
    full_name:  Some(format!("{first} {last}").trim().to_owned()),
    first_name: Some(first.to_owned()).filter(|s| !s.is_empty()),
    last_name:  Some(last.to_owned()).filter(|s| !s.is_empty()),
  }
}

fn find_education(lines: &[&str]) -> Vec<DraftEducation> {
  let mut seen = HashSet::new();
  lines
    .iter()
    .map(|line| strip_bullet(line))
    .filter(|line| line.chars().count() <= EDUCATION_MAX_CHARS && DEGREE.is_match(line))
    .filter(|line| seen.insert(line.to_lowercase()))
    .map(|line| DraftEducation {
      text: line.to_owned(),
      year: YEAR.find_iter(line).last().and_then(|m| m.as_str().parse().ok()),
    })
    .collect()
}

fn find_skills(lines: &[&str]) -> Vec<String> {
  let mut tokens = Vec::new();
  let mut in_section = false;

  for line in lines {
    if let Some(rest) = SKILLS_HEADER.captures(line).and_then(|c| c.get(1)) {
      in_section = true;
      tokens.extend(split_skills(rest.as_str()));
      continue;
    }
    if !in_section {
      continue;
    }
    if line.is_empty() || SECTION_HEADER.is_match(line) {
      in_section = false;
      continue;
    }
    tokens.extend(split_skills(line));
  }

  let mut seen = HashSet::new();
  tokens
    .into_iter()
    .filter(|skill| seen.insert(skill.to_lowercase()))
    .take(MAX_SKILLS)
    .collect()
}

fn split_skills(text: &str) -> Vec<String> {
  SKILL_SPLIT
    .split(text)
    .map(|token| strip_bullet(token).trim_end_matches('.').trim())
    .filter(|token| !token.is_empty() && token.chars().count() <= SKILL_MAX_CHARS)
    .map(str::to_owned)
    .collect()
}

fn strip_bullet(line: &str) -> &str {
  line.trim().trim_start_matches(['-', '*', '•', '·', '–']).trim_start()
}
