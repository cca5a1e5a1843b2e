//! Prompt library for the AI gateways
//!
//! Prompts are loaded with a two-layer resolution:
//! 1. Check for override in the prompts dir (~/.local/share/pennywise/prompts/overrides/)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Each prompt file carries YAML frontmatter followed by a `# System`
//! section (the fixed instruction) and a `# User` section (the templated
//! request body, with `{{var}}` placeholders).

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default prompts (compiled into binary)
mod defaults {
    pub const PARSE_TRANSACTION: &str = include_str!("../../../prompts/parse_transaction.md");
    pub const WEEKLY_SUMMARY: &str = include_str!("../../../prompts/weekly_summary.md");
}

/// Known prompt IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    /// Free text to a structured transaction
    ParseTransaction,
    /// Last week's transactions to coaching prose
    WeeklySummary,
}

impl PromptId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParseTransaction => "parse_transaction",
            Self::WeeklySummary => "weekly_summary",
        }
    }

    pub fn all() -> &'static [PromptId] {
        &[Self::ParseTransaction, Self::WeeklySummary]
    }

    fn default_content(&self) -> &'static str {
        match self {
            Self::ParseTransaction => defaults::PARSE_TRANSACTION,
            Self::WeeklySummary => defaults::WEEKLY_SUMMARY,
        }
    }
}

/// Prompt frontmatter metadata
#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    pub id: String,
    /// Version number for tracking changes
    pub version: u32,
    /// Kind of generation (structured_extraction, narrative)
    pub task_type: String,
}

/// A loaded prompt with metadata and content
#[derive(Debug, Clone)]
pub struct Prompt {
    pub metadata: PromptMetadata,
    /// The prompt content (system + user sections)
    pub content: String,
    /// Whether this came from an override file
    pub is_override: bool,
    pub override_path: Option<PathBuf>,
}

/// A prompt split into the instruction and the rendered request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn system_section(&self) -> Option<&str> {
        extract_section(&self.content, "# System")
    }

    pub fn user_section(&self) -> Option<&str> {
        extract_section(&self.content, "# User")
    }

    /// Render both sections with template variables replaced
    ///
    /// A prompt without a `# User` section is rendered whole as the user
    /// message with an empty system instruction.
    pub fn render(&self, vars: &HashMap<&str, &str>) -> RenderedPrompt {
        match (self.system_section(), self.user_section()) {
            (system, Some(user)) => RenderedPrompt {
                system: substitute(system.unwrap_or_default(), vars),
                user: substitute(user, vars),
            },
            (_, None) => RenderedPrompt {
                system: String::new(),
                user: substitute(&self.content, vars),
            },
        }
    }
}

/// Prompt library for loading and caching prompts
pub struct PromptLibrary {
    override_dir: Option<PathBuf>,
    cache: HashMap<PromptId, Prompt>,
}

impl PromptLibrary {
    /// Create a new prompt library with the default override path
    pub fn new() -> Self {
        Self {
            override_dir: default_prompts_dir(),
            cache: HashMap::new(),
        }
    }

    /// Create a prompt library with a custom override directory
    pub fn with_override_dir(path: PathBuf) -> Self {
        Self {
            override_dir: Some(path),
            cache: HashMap::new(),
        }
    }

    /// Create a prompt library with no override directory (embedded only)
    pub fn embedded_only() -> Self {
        Self {
            override_dir: None,
            cache: HashMap::new(),
        }
    }

    /// Get a prompt by ID, loading from override or default
    pub fn get(&mut self, id: PromptId) -> Result<&Prompt> {
        if !self.cache.contains_key(&id) {
            let prompt = self.load(id)?;
            self.cache.insert(id, prompt);
        }
        self.cache
            .get(&id)
            .ok_or_else(|| Error::InvalidData(format!("Prompt {} not cached", id.as_str())))
    }

    /// Load and render a prompt in one step
    pub fn render(&mut self, id: PromptId, vars: &HashMap<&str, &str>) -> Result<RenderedPrompt> {
        Ok(self.get(id)?.render(vars))
    }

    fn load(&self, id: PromptId) -> Result<Prompt> {
        if let Some(ref override_dir) = self.override_dir {
            let override_path = override_dir.join(format!("{}.md", id.as_str()));
            if override_path.exists() {
                let content = fs::read_to_string(&override_path)?;
                let (metadata, body) = parse_prompt(&content)?;
                tracing::info!(prompt = id.as_str(), path = %override_path.display(), "Using prompt override");
                return Ok(Prompt {
                    metadata,
                    content: body,
                    is_override: true,
                    override_path: Some(override_path),
                });
            }
        }

        let (metadata, body) = parse_prompt(id.default_content())?;
        Ok(Prompt {
            metadata,
            content: body,
            is_override: false,
            override_path: None,
        })
    }

    pub fn has_override(&self, id: PromptId) -> bool {
        self.override_dir
            .as_ref()
            .is_some_and(|dir| dir.join(format!("{}.md", id.as_str())).exists())
    }

    pub fn override_dir(&self) -> Option<&PathBuf> {
        self.override_dir.as_ref()
    }

    /// Clear the cache (useful after editing override files)
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Default prompts override directory
pub fn default_prompts_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("pennywise").join("prompts").join("overrides"))
}

/// Parse a prompt file into metadata and body
fn parse_prompt(content: &str) -> Result<(PromptMetadata, String)> {
    let content = content.trim();

    if !content.starts_with("---") {
        return Err(Error::InvalidData(
            "Prompt must start with YAML frontmatter (---)".into(),
        ));
    }

    let rest = &content[3..];
    let end = rest.find("---").ok_or_else(|| {
        Error::InvalidData("Prompt frontmatter not closed (missing second ---)".into())
    })?;

    let frontmatter = rest[..end].trim();
    let body = rest[end + 3..].trim();

    let metadata: PromptMetadata = serde_yaml::from_str(frontmatter)
        .map_err(|e| Error::InvalidData(format!("Invalid prompt frontmatter: {}", e)))?;

    Ok((metadata, body.to_string()))
}

/// Extract a section from the prompt content
fn extract_section<'a>(content: &'a str, header: &str) -> Option<&'a str> {
    let start = content.find(header)?;
    let after_header = &content[start + header.len()..];

    // Runs until the next top-level header
    let end = after_header.find("\n# ").unwrap_or(after_header.len());

    Some(after_header[..end].trim())
}

/// Simple mustache-style replacement: {{var}}
fn substitute(template: &str, vars: &HashMap<&str, &str>) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        let pattern = format!("{{{{{}}}}}", key);
        result = result.replace(&pattern, value);
    }
    result
}
