use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;
use tracing::info;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing portfolio JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("project #{position} has an empty id")]
    EmptyId { position: usize },
    #[error("duplicate project id \"{0}\"")]
    DuplicateId(String),
}

// ---------------------------------------------------------------------------
// CodeStyle / CodeSegment / CodeLine
// ---------------------------------------------------------------------------

/// Highlight class of one segment of a code-preview line.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CodeStyle {
    Keyword,
    Identifier,
    Punctuation,
    Key,
    Literal,
    #[default]
    Text,
    Bracket,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CodeSegment {
    pub text: String,
    #[serde(default)]
    pub style: CodeStyle,
}

impl CodeSegment {
    pub fn new(text: impl Into<String>, style: CodeStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// One display line of a project's code preview. Display-only.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CodeLine {
    #[serde(default)]
    pub indent: u8,
    pub segments: Vec<CodeSegment>,
}

impl CodeLine {
    /// Plain text of the line, without indentation.
    #[cfg(test)]
    pub fn plain_text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// Screenshot
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Screenshot {
    src: String,
    #[serde(default)]
    caption: String,
}

impl Screenshot {
    pub fn new(src: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            caption: caption.into(),
        }
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    /// Caption, or `"Preview"` when the record left it blank.
    pub fn caption(&self) -> &str {
        if self.caption.trim().is_empty() {
            "Preview"
        } else {
            &self.caption
        }
    }

    /// File name portion of `src`, used as a compact thumbnail label.
    pub fn file_name(&self) -> &str {
        self.src.rsplit('/').next().unwrap_or(&self.src)
    }
}

// ---------------------------------------------------------------------------
// ProjectRecord
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_url: Option<String>,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub badge: String,
    #[serde(default)]
    pub code_lines: Vec<CodeLine>,
    #[serde(default)]
    pub chips: Vec<String>,
    #[serde(default)]
    pub screenshots: Vec<Screenshot>,
}

impl ProjectRecord {
    /// Whether this project may be offered to the image viewer.
    pub fn has_screenshots(&self) -> bool {
        !self.screenshots.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Portfolio
// ---------------------------------------------------------------------------

/// The whole content document: page owner plus the showcased projects.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Portfolio {
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub projects: Vec<ProjectRecord>,
}

impl Portfolio {
    /// Parse and validate a portfolio from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ContentError> {
        let portfolio: Portfolio = serde_json::from_str(text)?;
        portfolio.validate()?;
        Ok(portfolio)
    }

    /// Load a portfolio from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ContentError> {
        let text = fs::read_to_string(path).map_err(|source| ContentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let portfolio = Self::from_json(&text)?;
        info!(
            path = %path.display(),
            projects = portfolio.projects.len(),
            "loaded portfolio"
        );
        Ok(portfolio)
    }

    /// Check that every project id is non-empty and unique.
    ///
    /// Projects without screenshots are accepted here; the gallery refuses to
    /// open them in the viewer instead.
    pub fn validate(&self) -> Result<(), ContentError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for (position, project) in self.projects.iter().enumerate() {
            if project.id.trim().is_empty() {
                return Err(ContentError::EmptyId { position });
            }
            if !seen.insert(project.id.as_str()) {
                return Err(ContentError::DuplicateId(project.id.clone()));
            }
        }
        Ok(())
    }

    /// Hand the records out as shared, read-only references.
    pub fn into_shared(self) -> Vec<Rc<ProjectRecord>> {
        self.projects.into_iter().map(Rc::new).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
