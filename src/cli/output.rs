//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::config::{SchemaDocument, ValidationResult};
use crate::diag::{Diagnostic, Diagnostics, Severity};
use crate::planner::{ChangeKind, PlanResourceChangeResponse};
use crate::resource::Resource;
use crate::schema::Attribute;
use crate::value::{self, Value};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Attribute row for table display.
#[derive(Tabled)]
struct AttributeRow {
    #[tabled(rename = "Attribute")]
    path: String,
    #[tabled(rename = "Type")]
    type_name: String,
    #[tabled(rename = "Flags")]
    flags: String,
    #[tabled(rename = "Plan modifiers")]
    modifiers: String,
    #[tabled(rename = "Description")]
    description: String,
}

/// Diagnostic row for table display.
#[derive(Tabled)]
struct DiagnosticRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Summary")]
    summary: String,
    #[tabled(rename = "Attribute")]
    path: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a plan response for display.
    #[must_use]
    pub fn format_plan(
        &self,
        resource: &Resource,
        prior_state: &Value,
        response: &PlanResourceChangeResponse,
    ) -> String {
        let change = response.change_kind(prior_state);
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&PlanJson {
                resource_type: resource.type_name(),
                change: change.to_string(),
                response,
            })
            .unwrap_or_default(),
            OutputFormat::Text => Self::format_plan_text(resource, change, response),
        }
    }

    /// Formats a plan as text.
    fn format_plan_text(
        resource: &Resource,
        change: ChangeKind,
        response: &PlanResourceChangeResponse,
    ) -> String {
        let mut output = String::new();

        let _ = writeln!(
            output,
            "\nPlan for {}: {}",
            resource.type_name().bold(),
            Self::format_change_kind(change)
        );
        let _ = writeln!(
            output,
            "   Planned at: {}\n",
            response.planned_at.format("%Y-%m-%d %H:%M:%S UTC")
        );

        let planned = redact_sensitive(&response.planned_state, resource);
        let rendered = serde_json::to_string_pretty(&value::encode(&planned)).unwrap_or_default();
        output.push_str("Planned state:\n");
        for line in rendered.lines() {
            let _ = writeln!(output, "   {line}");
        }

        if !response.requires_replace.is_empty() {
            let _ = write!(output, "\n{} Requires replacement:\n", "!".red());
            for path in &response.requires_replace {
                let _ = writeln!(output, "   - {path}");
            }
        }

        if !response.diagnostics.is_empty() {
            output.push('\n');
            output.push_str(&Self::format_diagnostics_table(&response.diagnostics));
        }

        if response.has_error() {
            let _ = write!(output, "\n{} Plan has errors and must not be applied.\n", "✗".red());
        }

        output
    }

    /// Formats diagnostics for display.
    #[must_use]
    pub fn format_diagnostics(&self, diagnostics: &Diagnostics) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(diagnostics).unwrap_or_default(),
            OutputFormat::Text => Self::format_diagnostics_table(diagnostics),
        }
    }

    /// Formats diagnostics as a table.
    fn format_diagnostics_table(diagnostics: &Diagnostics) -> String {
        let rows: Vec<DiagnosticRow> = diagnostics.iter().map(DiagnosticRow::from).collect();
        let mut output = Table::new(rows).to_string();
        output.push('\n');
        output
    }

    /// Formats a validation result.
    #[must_use]
    pub fn format_validation(
        &self,
        document: &SchemaDocument,
        result: &ValidationResult,
        show_warnings: bool,
    ) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&ValidationJson {
                resource_type: &document.resource.type_name,
                version: document.resource.version,
                attributes: document.attribute_count(),
                valid: result.is_valid(),
                errors: result.errors.iter().map(ToString::to_string).collect(),
                warnings: &result.warnings,
            })
            .unwrap_or_default(),
            OutputFormat::Text => {
                let mut output = if result.is_valid() {
                    format!("{} Schema is valid!\n", "✓".green())
                } else {
                    let mut output = format!("{} Schema has {} errors:\n", "✗".red(), result.error_count());
                    for error in &result.errors {
                        let _ = writeln!(output, "   - {error}");
                    }
                    output
                };

                if show_warnings && !result.warnings.is_empty() {
                    let _ = write!(output, "\n{} Warnings:\n", "⚠".yellow());
                    for warning in &result.warnings {
                        let _ = writeln!(output, "   - {warning}");
                    }
                }

                output.push_str("\nSchema summary:\n");
                let _ = writeln!(output, "   Resource type: {}", document.resource.type_name);
                let _ = writeln!(output, "   Version: {}", document.resource.version);
                let _ = writeln!(output, "   Attributes: {}", document.attribute_count());

                output
            }
        }
    }

    /// Formats the attributes of a resource.
    #[must_use]
    pub fn format_schema(&self, resource: &Resource) -> String {
        let mut rows = Vec::new();
        collect_rows(
            resource.schema().attributes().iter(),
            "",
            &mut rows,
        );

        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&SchemaJson {
                resource_type: resource.type_name(),
                version: resource.schema().version(),
                attributes: rows
                    .into_iter()
                    .map(|row| AttributeJson {
                        path: row.path,
                        type_name: row.type_name,
                        flags: row.flags,
                        modifiers: row.modifiers,
                        description: row.description,
                    })
                    .collect(),
            })
            .unwrap_or_default(),
            OutputFormat::Text => {
                let mut output = format!(
                    "\nResource: {} (version {})\n",
                    resource.type_name().bold(),
                    resource.schema().version()
                );
                if let Some(description) = resource.schema().description() {
                    let _ = writeln!(output, "   {description}");
                }
                if let Some(message) = resource.schema().deprecation_message() {
                    let _ = writeln!(output, "   {} Deprecated: {message}", "⚠".yellow());
                }
                output.push('\n');
                output.push_str(&Table::new(rows).to_string());
                output.push('\n');
                output
            }
        }
    }

    /// Formats a change kind with color.
    fn format_change_kind(change: ChangeKind) -> String {
        match change {
            ChangeKind::Create => "+create".green().to_string(),
            ChangeKind::Update => "~update".yellow().to_string(),
            ChangeKind::Replace => "-/+replace".red().to_string(),
            ChangeKind::Delete => "-delete".red().to_string(),
            ChangeKind::Noop => "no-op".dimmed().to_string(),
        }
    }
}

/// Flattens nested attributes into dotted rows.
fn collect_rows<'a>(
    attributes: impl Iterator<Item = (&'a String, &'a Attribute)>,
    prefix: &str,
    rows: &mut Vec<AttributeRow>,
) {
    for (name, attribute) in attributes {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };

        let type_name = attribute.nested_attributes().map_or_else(
            || attribute.value_type().to_string(),
            |nested| format!("{} nested", nested.mode),
        );
        let modifiers = attribute
            .plan_modifiers()
            .iter()
            .map(|m| m.description())
            .collect::<Vec<_>>()
            .join("; ");

        rows.push(AttributeRow {
            path: path.clone(),
            type_name,
            flags: attribute.flags(),
            modifiers,
            description: truncate(attribute.description().unwrap_or_default(), 40),
        });

        if let Some(nested) = attribute.nested_attributes() {
            collect_rows(nested.attributes.iter(), &path, rows);
        }
    }
}

/// Replaces the values of sensitive top-level attributes with a marker.
fn redact_sensitive(value: &Value, resource: &Resource) -> Value {
    let Value::Object(attributes) = value else {
        return value.clone();
    };

    Value::Object(
        attributes
            .iter()
            .map(|(name, v)| {
                let sensitive = resource
                    .schema()
                    .attribute(name)
                    .is_some_and(Attribute::is_sensitive);
                let shown = if sensitive && v.is_known() {
                    Value::string("(sensitive)")
                } else {
                    v.clone()
                };
                (name.clone(), shown)
            })
            .collect(),
    )
}

/// Truncates a string to a maximum number of characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}

impl From<&Diagnostic> for DiagnosticRow {
    fn from(diagnostic: &Diagnostic) -> Self {
        let severity = match diagnostic.severity {
            Severity::Warning => "warning".yellow().to_string(),
            Severity::Error => "error".red().to_string(),
        };
        Self {
            severity,
            summary: diagnostic.summary.clone(),
            path: diagnostic
                .path
                .as_ref()
                .map_or_else(String::new, ToString::to_string),
            detail: truncate(diagnostic.detail.lines().next().unwrap_or_default(), 60),
        }
    }
}

// JSON serialization helpers

#[derive(Serialize)]
struct PlanJson<'a> {
    resource_type: &'a str,
    change: String,
    #[serde(flatten)]
    response: &'a PlanResourceChangeResponse,
}

#[derive(Serialize)]
struct ValidationJson<'a> {
    resource_type: &'a str,
    version: i64,
    attributes: usize,
    valid: bool,
    errors: Vec<String>,
    warnings: &'a [String],
}

#[derive(Serialize)]
struct SchemaJson<'a> {
    resource_type: &'a str,
    version: i64,
    attributes: Vec<AttributeJson>,
}

#[derive(Serialize)]
struct AttributeJson {
    path: String,
    #[serde(rename = "type")]
    type_name: String,
    flags: String,
    modifiers: String,
    description: String,
}
