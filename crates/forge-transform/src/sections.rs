//! Header-driven text parsing
//!
//! A recognized header opens a section that collects every following line
//! up to the next header. Headers are Markdown headings (`#`..`######`) or
//! bare `Label:` lines whose label is in the alias table. Text before the
//! first header is preamble. An optional YAML frontmatter block at the very
//! top is split off first.

use forge_artifact::Complexity;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

static MARKDOWN_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.+?)\s*#*\s*$").expect("Valid heading regex"));

static LABEL_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z][A-Za-z0-9 /&_-]{0,48}?)\s*:\s*$").expect("Valid label regex")
});

static LIST_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:[-*+]|\d+[.)]|\[[ xX]\])\s+(.+?)\s*$").expect("Valid list item regex")
});

/// Canonical destination of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    /// Folded into the description
    Description,
    /// Objective
    Objective,
    /// Success criteria list
    SuccessCriteria,
    /// Context requirements list
    ContextRequirements,
    /// Validation checkpoints list
    ValidationCheckpoints,
    /// Requirement list, bucketed during enrichment
    Requirements,
    /// Implementation steps
    Implementation,
    /// Dependency ids
    Dependencies,
}

static ALIASES: Lazy<HashMap<&'static str, SectionKind>> = Lazy::new(|| {
    use SectionKind::*;
    [
        ("overview", Description),
        ("description", Description),
        ("summary", Description),
        ("background", Description),
        ("introduction", Description),
        ("about", Description),
        ("objective", Objective),
        ("objectives", Objective),
        ("goal", Objective),
        ("goals", Objective),
        ("purpose", Objective),
        ("aim", Objective),
        ("success criteria", SuccessCriteria),
        ("acceptance criteria", SuccessCriteria),
        ("definition of done", SuccessCriteria),
        ("done when", SuccessCriteria),
        ("outcomes", SuccessCriteria),
        ("context", ContextRequirements),
        ("context requirements", ContextRequirements),
        ("constraints", ContextRequirements),
        ("prerequisites", ContextRequirements),
        ("assumptions", ContextRequirements),
        ("environment", ContextRequirements),
        ("validation", ValidationCheckpoints),
        ("validation checkpoints", ValidationCheckpoints),
        ("checkpoints", ValidationCheckpoints),
        ("testing", ValidationCheckpoints),
        ("test plan", ValidationCheckpoints),
        ("verification", ValidationCheckpoints),
        ("requirements", Requirements),
        ("functional requirements", Requirements),
        ("non functional requirements", Requirements),
        ("technical requirements", Requirements),
        ("features", Requirements),
        ("scope", Requirements),
        ("implementation", Implementation),
        ("implementation plan", Implementation),
        ("steps", Implementation),
        ("tasks", Implementation),
        ("approach", Implementation),
        ("plan", Implementation),
        ("dependencies", Dependencies),
        ("depends on", Dependencies),
    ]
    .into_iter()
    .collect()
});

/// Map a header onto its canonical section
#[must_use]
pub fn classify(heading: &str) -> Option<SectionKind> {
    ALIASES.get(normalize_heading(heading).as_str()).copied()
}

fn normalize_heading(heading: &str) -> String {
    heading
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// One header and the lines under it
#[derive(Debug, Clone, PartialEq)]
pub struct RawSection {
    /// Header text as written
    pub heading: String,
    /// 1-6 for Markdown headings, 0 for `Label:` lines
    pub level: u8,
    /// Canonical destination, `None` for unrecognized headings
    pub kind: Option<SectionKind>,
    /// Lines under the header, trimmed of surrounding blank lines
    pub body: String,
}

/// Keys read from a YAML frontmatter block
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Frontmatter {
    /// Artifact id
    pub id: Option<String>,
    /// Artifact name
    #[serde(alias = "title")]
    pub name: Option<String>,
    /// Description
    pub description: Option<String>,
    /// Objective
    #[serde(alias = "goal")]
    pub objective: Option<String>,
    /// Success criteria
    #[serde(alias = "successCriteria")]
    pub success_criteria: Option<Vec<String>>,
    /// Context requirements
    #[serde(alias = "contextRequirements")]
    pub context_requirements: Option<Vec<String>>,
    /// Validation checkpoints
    #[serde(alias = "validationCheckpoints")]
    pub validation_checkpoints: Option<Vec<String>>,
    /// Dependency ids
    pub dependencies: Option<Vec<String>>,
    /// Complexity bucket
    pub complexity: Option<Complexity>,
    /// Everything else, kept verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// Parsed text document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedText {
    /// First unrecognized level-1 heading
    pub title: Option<String>,
    /// Text before the first header plus the body under the title
    pub preamble: String,
    /// Sections in source order
    pub sections: Vec<RawSection>,
    /// Frontmatter, when present and valid
    pub frontmatter: Option<Frontmatter>,
    /// Problems that did not stop parsing
    pub warnings: Vec<String>,
}

impl ParsedText {
    /// Parse a text document
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut parsed = Self::default();
        let body = match split_frontmatter(text) {
            Some((yaml, rest)) => {
                match serde_yaml::from_str::<Frontmatter>(yaml) {
                    Ok(frontmatter) => parsed.frontmatter = Some(frontmatter),
                    Err(err) => parsed
                        .warnings
                        .push(format!("frontmatter ignored: {err}")),
                }
                rest
            }
            None => text,
        };

        let mut preamble: Vec<&str> = Vec::new();
        let mut current: Option<(RawSection, Vec<&str>)> = None;
        let mut in_fence = false;

        for line in body.lines() {
            if line.trim_start().starts_with("```") {
                in_fence = !in_fence;
            }
            let header = if in_fence { None } else { detect_header(line) };

            match header {
                Some((level, heading)) => {
                    if let Some((section, lines)) = current.take() {
                        parsed.sections.push(finish(section, &lines));
                    }
                    let kind = classify(&heading);
                    if level == 1 && kind.is_none() && parsed.title.is_none() {
                        parsed.title = Some(heading);
                        continue;
                    }
                    current = Some((
                        RawSection {
                            heading,
                            level,
                            kind,
                            body: String::new(),
                        },
                        Vec::new(),
                    ));
                }
                None => match current.as_mut() {
                    Some((_, lines)) => lines.push(line),
                    None => preamble.push(line),
                },
            }
        }
        if let Some((section, lines)) = current.take() {
            parsed.sections.push(finish(section, &lines));
        }

        parsed.preamble = trim_blank_lines(&preamble);
        parsed
    }

    /// Sections mapped onto `kind`, in source order
    pub fn sections_of(&self, kind: SectionKind) -> impl Iterator<Item = &RawSection> {
        self.sections.iter().filter(move |s| s.kind == Some(kind))
    }

    /// Sections without a canonical home
    pub fn unrecognized(&self) -> impl Iterator<Item = &RawSection> {
        self.sections.iter().filter(|s| s.kind.is_none())
    }
}

fn detect_header(line: &str) -> Option<(u8, String)> {
    if let Some(caps) = MARKDOWN_HEADER.captures(line) {
        let level = u8::try_from(caps[1].len()).unwrap_or(6);
        return Some((level, caps[2].trim().to_string()));
    }
    let caps = LABEL_HEADER.captures(line)?;
    let label = caps[1].trim();
    classify(label).map(|_| (0, label.to_string()))
}

fn finish(mut section: RawSection, lines: &[&str]) -> RawSection {
    section.body = trim_blank_lines(lines);
    section
}

fn trim_blank_lines(lines: &[&str]) -> String {
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());
    match (start, end) {
        (Some(start), Some(end)) => lines[start..=end]
            .iter()
            .map(|l| l.trim_end())
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

/// Split a leading `---` delimited block from the rest
fn split_frontmatter(text: &str) -> Option<(&str, &str)> {
    let rest = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))?;
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }
    None
}

/// List items of a section body
///
/// Bullet, numbered and checkbox lines become items; an unmarked line
/// directly after an item continues it. Without any marker, every
/// non-empty line is an item.
#[must_use]
pub fn list_items(body: &str) -> Vec<String> {
    let has_markers = body.lines().any(|l| LIST_ITEM.is_match(l));
    if !has_markers {
        return body
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
    }

    let mut items: Vec<String> = Vec::new();
    let mut continuing = false;
    for line in body.lines() {
        if let Some(caps) = LIST_ITEM.captures(line) {
            items.push(caps[1].to_string());
            continuing = true;
        } else if line.trim().is_empty() {
            continuing = false;
        } else if continuing {
            if let Some(last) = items.last_mut() {
                last.push(' ');
                last.push_str(line.trim());
            }
        } else {
            items.push(line.trim().to_string());
        }
    }
    items
}

/// Section body as one line of prose
#[must_use]
pub fn paragraph(body: &str) -> String {
    list_items(body).join(" ")
}
