use crate::error::{CliError, CliResult};
use colored::Colorize;
use qa_edgematch::{FeatureKey, Issue};
use serde::Serialize;
use wkt::ToWkt;

#[derive(Serialize)]
struct InvolvedRow<'a> {
    class: &'a str,
    row_id: u64,
}

#[derive(Serialize)]
struct IssueRecord<'a> {
    code: &'a str,
    description: &'a str,
    involved: Vec<InvolvedRow<'a>>,
    geometry: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    affected_components: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    values: Vec<String>,
}

fn class_name<'a>(names: &'a [String], key: &FeatureKey) -> &'a str {
    names
        .get(key.class_index)
        .map(String::as_str)
        .unwrap_or("?")
}

/// One line per issue: code, description and involved rows.
pub fn format_text(issues: &[Issue], names: &[String]) -> Vec<String> {
    issues
        .iter()
        .map(|issue| {
            let involved = issue
                .involved
                .iter()
                .map(|key| format!("{}:{}", class_name(names, key), key.row_id))
                .collect::<Vec<_>>()
                .join(", ");
            let mut line = format!(
                "{} {} [{}]",
                issue.code.to_string().yellow().bold(),
                issue.description,
                involved
            );
            if let Some(fields) = &issue.affected_components {
                line.push_str(&format!(" fields: {fields}"));
            }
            line
        })
        .collect()
}

/// All issues as a pretty-printed JSON array, geometries as WKT.
pub fn format_json(issues: &[Issue], names: &[String]) -> CliResult<String> {
    let records: Vec<IssueRecord<'_>> = issues
        .iter()
        .map(|issue| IssueRecord {
            code: &issue.code.id,
            description: &issue.description,
            involved: issue
                .involved
                .iter()
                .map(|key| InvolvedRow {
                    class: class_name(names, key),
                    row_id: key.row_id,
                })
                .collect(),
            geometry: issue.geometry.wkt_string(),
            affected_components: issue.affected_components.as_deref(),
            values: issue.values.clone(),
        })
        .collect();
    serde_json::to_string_pretty(&records).map_err(CliError::from)
}
