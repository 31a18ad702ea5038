//! Member export (CSV or JSON) with a caller-chosen set of columns.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::adherent::Adherent;
use crate::adhesion::AdhesionStatus;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unknown export property: {0}")]
    UnknownProperty(String),

    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv encoding failed: {0}")]
    Csv(#[from] std::fmt::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    /// Unknown or missing formats fall back to CSV.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|f| f.trim().to_ascii_lowercase()).as_deref() {
            Some("json") => ExportFormat::Json,
            _ => ExportFormat::Csv,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// Exportable column. Declaration order is the column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExportProperty {
    #[serde(rename = "id")]
    Id,
    #[serde(rename = "nom")]
    LastName,
    #[serde(rename = "prenom")]
    FirstName,
    #[serde(rename = "estBenevole")]
    Volunteer,
    #[serde(rename = "adresse")]
    Address,
    #[serde(rename = "codePostal")]
    PostalCode,
    #[serde(rename = "ville")]
    City,
    #[serde(rename = "adhesions")]
    Adhesions,
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "telephone")]
    Phone,
}

impl ExportProperty {
    pub const ALL: [ExportProperty; 10] = [
        ExportProperty::Id,
        ExportProperty::LastName,
        ExportProperty::FirstName,
        ExportProperty::Volunteer,
        ExportProperty::Address,
        ExportProperty::PostalCode,
        ExportProperty::City,
        ExportProperty::Adhesions,
        ExportProperty::Email,
        ExportProperty::Phone,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ExportProperty::Id => "id",
            ExportProperty::LastName => "nom",
            ExportProperty::FirstName => "prenom",
            ExportProperty::Volunteer => "estBenevole",
            ExportProperty::Address => "adresse",
            ExportProperty::PostalCode => "codePostal",
            ExportProperty::City => "ville",
            ExportProperty::Adhesions => "adhesions",
            ExportProperty::Email => "email",
            ExportProperty::Phone => "telephone",
        }
    }

    /// CSV header label.
    pub fn label(&self) -> &'static str {
        match self {
            ExportProperty::Id => "ID",
            ExportProperty::LastName => "Nom",
            ExportProperty::FirstName => "Prénom",
            ExportProperty::Volunteer => "Bénévole",
            ExportProperty::Address => "Adresse",
            ExportProperty::PostalCode => "Code Postal",
            ExportProperty::City => "Ville",
            ExportProperty::Adhesions => "Date de dernière adhésion",
            ExportProperty::Email => "Email",
            ExportProperty::Phone => "Téléphone",
        }
    }

    pub fn parse(key: &str) -> Result<Self, ExportError> {
        Self::ALL
            .into_iter()
            .find(|p| p.key() == key)
            .ok_or_else(|| ExportError::UnknownProperty(key.to_string()))
    }

    /// Checked properties of a `{ "nom": true, ... }` selection, in column order.
    pub fn from_selection(selection: &BTreeMap<String, bool>) -> Result<Vec<Self>, ExportError> {
        let mut selected = Vec::new();
        for (key, checked) in selection {
            let property = Self::parse(key)?;
            if *checked {
                selected.push(property);
            }
        }
        selected.sort();
        Ok(selected)
    }
}

/// What to export.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExportRequest {
    pub format: ExportFormat,
    /// Empty means every property.
    pub properties: Vec<ExportProperty>,
    /// Only members currently in this status.
    pub status: Option<AdhesionStatus>,
}

impl ExportRequest {
    fn columns(&self) -> Vec<ExportProperty> {
        if self.properties.is_empty() {
            ExportProperty::ALL.to_vec()
        } else {
            self.properties.clone()
        }
    }
}

/// Rendered export document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exported {
    pub content_type: &'static str,
    pub file_name: String,
    pub body: String,
    pub rows: usize,
}

fn cell(adherent: &Adherent, property: ExportProperty) -> Option<String> {
    let contact = adherent.contact();
    match property {
        ExportProperty::Id => Some(adherent.id_typed().to_string()),
        ExportProperty::LastName => Some(adherent.last_name().to_string()),
        ExportProperty::FirstName => Some(adherent.first_name().to_string()),
        ExportProperty::Volunteer => Some(adherent.is_volunteer().to_string()),
        ExportProperty::Address => contact.and_then(|c| c.full_address()),
        ExportProperty::PostalCode => contact.and_then(|c| c.postal_code.clone()),
        ExportProperty::City => contact.and_then(|c| c.city.clone()),
        ExportProperty::Adhesions => adherent.latest_adhesion().map(|a| a.date.to_string()),
        ExportProperty::Email => contact.and_then(|c| c.email.clone()),
        ExportProperty::Phone => contact.and_then(|c| c.phone.clone()),
    }
}

fn json_value(adherent: &Adherent, property: ExportProperty) -> Option<Value> {
    match property {
        ExportProperty::Volunteer => Some(Value::Bool(adherent.is_volunteer())),
        ExportProperty::Adhesions => Some(json!(adherent.adhesions())),
        other => cell(adherent, other).map(Value::String),
    }
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn render_csv(rows: &[&Adherent], columns: &[ExportProperty]) -> Result<String, ExportError> {
    let mut out = String::new();
    let header: Vec<String> = columns.iter().map(|c| quote(c.label())).collect();
    writeln!(out, "{}", header.join(";"))?;
    for adherent in rows {
        let line: Vec<String> = columns
            .iter()
            .map(|c| quote(&cell(adherent, *c).unwrap_or_default()))
            .collect();
        writeln!(out, "{}", line.join(";"))?;
    }
    Ok(out)
}

fn render_json(rows: &[&Adherent], columns: &[ExportProperty]) -> Result<String, ExportError> {
    let documents: Vec<Value> = rows
        .iter()
        .map(|adherent| {
            let mut object = Map::new();
            for column in columns {
                // Absent values are omitted rather than written as null.
                if let Some(value) = json_value(adherent, *column) {
                    object.insert(column.key().to_string(), value);
                }
            }
            Value::Object(object)
        })
        .collect();
    Ok(serde_json::to_string_pretty(&documents)?)
}

/// Render `adherents` according to `request`, evaluating statuses on `today`.
pub fn render(
    adherents: &[Adherent],
    request: &ExportRequest,
    today: NaiveDate,
) -> Result<Exported, ExportError> {
    let rows: Vec<&Adherent> = adherents
        .iter()
        .filter(|a| request.status.is_none_or(|s| a.status(today) == s))
        .collect();
    let columns = request.columns();

    let body = match request.format {
        ExportFormat::Csv => render_csv(&rows, &columns)?,
        ExportFormat::Json => render_json(&rows, &columns)?,
    };

    Ok(Exported {
        content_type: request.format.content_type(),
        file_name: format!("adherents-{today}.{}", request.format.extension()),
        body,
        rows: rows.len(),
    })
}
