//! Export and import serializers for project + prompt data.
//!
//! Exports come in three formats. JSON and CSV carry every field needed to
//! import the data again; YAML is a read-friendly snapshot of the latest
//! version of each prompt. Imports accept JSON and CSV and are normalized to
//! the same [`ImportProject`] shape so the persistence side has one path.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};
use crate::versioning::{SemVer, INITIAL_VERSION};

// ---------------------------------------------------------------------------
// Formats
// ---------------------------------------------------------------------------

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
    Yaml,
}

impl ExportFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Csv => "text/csv; charset=utf-8",
            Self::Yaml => "application/x-yaml",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Json => "prompts_export.json",
            Self::Csv => "prompts_export.csv",
            Self::Yaml => "prompts_export.yaml",
        }
    }
}

/// Input format of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Json,
    Csv,
}

impl FromStr for ImportFormat {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(CoreError::Validation(format!(
                "Unsupported import format '{other}'"
            ))),
        }
    }
}

impl ImportFormat {
    /// Resolve the format from an explicit value, else from the file extension.
    pub fn detect(explicit: Option<&str>, file_name: Option<&str>) -> Result<Self, CoreError> {
        if let Some(format) = explicit.filter(|f| !f.trim().is_empty()) {
            return format.parse();
        }
        let extension = file_name
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext)
            .unwrap_or_default();
        extension.parse()
    }
}

// ---------------------------------------------------------------------------
// Export documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportTag {
    pub id: DbId,
    pub name: String,
    pub color: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportPrompt {
    pub id: DbId,
    pub name: String,
    pub version: String,
    pub content: String,
    pub description: String,
    pub category: Option<String>,
    pub tags: Vec<ExportTag>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportProject {
    pub id: DbId,
    pub name: String,
    pub description: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub prompts: Vec<ExportPrompt>,
}

/// Top-level JSON export document.
#[derive(Debug, Clone, Serialize)]
pub struct ExportDocument<'a> {
    pub export_time: Timestamp,
    pub projects: &'a [ExportProject],
}

/// Render projects in the requested format.
pub fn render(
    format: ExportFormat,
    projects: &[ExportProject],
    export_time: Timestamp,
) -> Result<String, CoreError> {
    match format {
        ExportFormat::Json => render_json(projects, export_time),
        ExportFormat::Csv => render_csv(projects),
        ExportFormat::Yaml => render_yaml(projects),
    }
}

fn render_json(projects: &[ExportProject], export_time: Timestamp) -> Result<String, CoreError> {
    let document = ExportDocument {
        export_time,
        projects,
    };
    serde_json::to_string_pretty(&document)
        .map_err(|e| CoreError::Internal(format!("JSON export failed: {e}")))
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Column order of CSV exports and imports.
pub const CSV_HEADERS: [&str; 11] = [
    "project_id",
    "project_name",
    "project_description",
    "prompt_id",
    "prompt_name",
    "version",
    "category",
    "content",
    "prompt_description",
    "tags",
    "created_at",
];

/// Separator between tag names in the `tags` column.
pub const CSV_TAG_SEPARATOR: &str = ";";

/// One CSV row. A row with an empty `prompt_id` describes a project without prompts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CsvRow {
    pub project_id: String,
    pub project_name: String,
    pub project_description: String,
    pub prompt_id: String,
    pub prompt_name: String,
    pub version: String,
    pub category: String,
    pub content: String,
    pub prompt_description: String,
    pub tags: String,
    pub created_at: String,
}

fn render_csv(projects: &[ExportProject]) -> Result<String, CoreError> {
    let csv_err = |e: csv::Error| CoreError::Internal(format!("CSV export failed: {e}"));

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADERS).map_err(csv_err)?;

    for project in projects {
        let base = CsvRow {
            project_id: project.id.to_string(),
            project_name: project.name.clone(),
            project_description: project.description.clone(),
            ..CsvRow::default()
        };

        if project.prompts.is_empty() {
            writer.serialize(&base).map_err(csv_err)?;
            continue;
        }

        for prompt in &project.prompts {
            let tags = prompt
                .tags
                .iter()
                .map(|t| t.name.as_str())
                .collect::<Vec<_>>()
                .join(CSV_TAG_SEPARATOR);
            let row = CsvRow {
                prompt_id: prompt.id.to_string(),
                prompt_name: prompt.name.clone(),
                version: prompt.version.clone(),
                category: prompt.category.clone().unwrap_or_default(),
                content: prompt.content.clone(),
                prompt_description: prompt.description.clone(),
                tags,
                created_at: prompt.created_at.to_rfc3339(),
                ..base.clone()
            };
            writer.serialize(&row).map_err(csv_err)?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CoreError::Internal(format!("CSV export failed: {e}")))?;
    String::from_utf8(bytes).map_err(|e| CoreError::Internal(format!("CSV export failed: {e}")))
}

// ---------------------------------------------------------------------------
// YAML
// ---------------------------------------------------------------------------

fn version_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<SemVer>(), b.parse::<SemVer>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => Ordering::Greater,
        (Err(_), Ok(_)) => Ordering::Less,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Latest version of each prompt name in a project, keyed by name.
pub fn latest_by_name(prompts: &[ExportPrompt]) -> BTreeMap<&str, &ExportPrompt> {
    let mut latest: BTreeMap<&str, &ExportPrompt> = BTreeMap::new();
    for prompt in prompts {
        latest
            .entry(prompt.name.as_str())
            .and_modify(|current| {
                if version_order(&prompt.version, &current.version) == Ordering::Greater {
                    *current = prompt;
                }
            })
            .or_insert(prompt);
    }
    latest
}

fn render_yaml(projects: &[ExportProject]) -> Result<String, CoreError> {
    let mut document: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();

    for project in projects {
        let key = if document.contains_key(&project.name) {
            format!("{} ({})", project.name, project.id)
        } else {
            project.name.clone()
        };
        let prompts = latest_by_name(&project.prompts)
            .into_iter()
            .map(|(name, prompt)| (name.to_string(), prompt.content.clone()))
            .collect();
        document.insert(key, prompts);
    }

    serde_yaml_ng::to_string(&document)
        .map_err(|e| CoreError::Internal(format!("YAML export failed: {e}")))
}

// ---------------------------------------------------------------------------
// Import documents
// ---------------------------------------------------------------------------

fn initial_version() -> String {
    INITIAL_VERSION.to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImportTag {
    #[serde(default, alias = "_id")]
    pub id: Option<DbId>,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImportPrompt {
    #[serde(default, alias = "_id")]
    pub id: Option<DbId>,
    #[serde(default)]
    pub name: String,
    #[serde(default = "initial_version")]
    pub version: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<ImportTag>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImportProject {
    #[serde(default, alias = "_id")]
    pub id: Option<DbId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
    #[serde(default)]
    pub prompts: Vec<ImportPrompt>,
}

#[derive(Debug, Deserialize)]
struct ImportDocument {
    #[serde(default)]
    projects: Vec<ImportProject>,
}

/// Projects parsed from an import file, plus per-row problems.
#[derive(Debug, Default)]
pub struct ParsedImport {
    pub projects: Vec<ImportProject>,
    /// Rows that could not be parsed at all.
    pub skipped: usize,
    pub errors: Vec<String>,
}

/// Parse an uploaded file in the given format.
pub fn parse_import(format: ImportFormat, bytes: &[u8]) -> Result<ParsedImport, CoreError> {
    match format {
        ImportFormat::Json => parse_json(bytes),
        ImportFormat::Csv => parse_csv(bytes),
    }
}

fn parse_json(bytes: &[u8]) -> Result<ParsedImport, CoreError> {
    let document: ImportDocument = serde_json::from_slice(bytes)
        .map_err(|e| CoreError::Validation(format!("Invalid JSON import file: {e}")))?;
    Ok(ParsedImport {
        projects: document.projects,
        ..ParsedImport::default()
    })
}

fn parse_csv(bytes: &[u8]) -> Result<ParsedImport, CoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| CoreError::Validation(format!("Invalid CSV import file: {e}")))?;
    if headers.is_empty() {
        return Err(CoreError::Validation("Empty CSV file".to_string()));
    }

    let mut parsed = ParsedImport::default();
    // Insertion order of projects is kept so the summary follows the file.
    let mut order: Vec<DbId> = Vec::new();
    let mut projects: BTreeMap<DbId, ImportProject> = BTreeMap::new();

    for (idx, record) in reader.deserialize::<CsvRow>().enumerate() {
        // Line 1 is the header.
        let line = idx + 2;
        let row = match record {
            Ok(row) => row,
            Err(e) => {
                parsed.skipped += 1;
                parsed.errors.push(format!("Line {line}: invalid row format ({e})"));
                continue;
            }
        };

        let Ok(project_id) = row.project_id.trim().parse::<DbId>() else {
            parsed.skipped += 1;
            parsed.errors.push(format!("Line {line}: missing or invalid project id"));
            continue;
        };

        let project = projects.entry(project_id).or_insert_with(|| {
            order.push(project_id);
            ImportProject {
                id: Some(project_id),
                name: row.project_name.clone(),
                description: row.project_description.clone(),
                created_at: None,
                updated_at: None,
                prompts: Vec::new(),
            }
        });

        if row.prompt_id.trim().is_empty() {
            continue;
        }
        let Ok(prompt_id) = row.prompt_id.trim().parse::<DbId>() else {
            parsed.skipped += 1;
            parsed.errors.push(format!("Line {line}: invalid prompt id"));
            continue;
        };

        let tags = row
            .tags
            .split(CSV_TAG_SEPARATOR)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| ImportTag {
                id: None,
                name: name.to_string(),
                color: None,
                created_at: None,
            })
            .collect();

        let created_at = chrono::DateTime::parse_from_rfc3339(row.created_at.trim())
            .ok()
            .map(|dt| dt.with_timezone(&chrono::Utc));

        project.prompts.push(ImportPrompt {
            id: Some(prompt_id),
            name: row.prompt_name,
            version: if row.version.trim().is_empty() {
                initial_version()
            } else {
                row.version
            },
            content: row.content,
            description: row.prompt_description,
            category: Some(row.category).filter(|c| !c.trim().is_empty()),
            tags,
            created_at,
        });
    }

    parsed.projects = order
        .into_iter()
        .filter_map(|id| projects.remove(&id))
        .collect();
    Ok(parsed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
