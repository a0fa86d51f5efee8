//! CSV export of the customer collection.

use crate::error::{RegistryError, RegistryResult};
use crate::models::Customer;
use chrono::SecondsFormat;

type Cell = fn(&Customer) -> String;

/// Exported columns, in order, with their header labels.
const COLUMNS: &[(&str, Cell)] = &[
    ("Nome", name_cell),
    ("CPF", doc_cell),
    ("Telefone", phone_cell),
    ("E-mail", email_cell),
    ("Criado em", created_cell),
];

fn name_cell(c: &Customer) -> String {
    c.name.clone()
}

fn doc_cell(c: &Customer) -> String {
    c.doc.as_str().to_string()
}

fn phone_cell(c: &Customer) -> String {
    c.contact.phone.clone().unwrap_or_default()
}

fn email_cell(c: &Customer) -> String {
    c.contact.email.clone().unwrap_or_default()
}

/// ISO 8601 with milliseconds, e.g. `2024-05-02T10:00:00.000Z`.
fn created_cell(c: &Customer) -> String {
    c.created_at
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

/// Render customers as CSV with a header row and `\n` line endings.
///
/// Rows are ordered by name. Fields containing a comma, quote or line break
/// are quoted with inner quotes doubled.
///
/// # Errors
///
/// `NotFound` when there is nothing to export.
pub fn customers_to_csv(customers: &[Customer]) -> RegistryResult<String> {
    if customers.is_empty() {
        return Err(RegistryError::NotFound("No data available".to_string()));
    }

    let mut sorted: Vec<&Customer> = customers.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(COLUMNS.iter().map(|(label, _)| *label))
        .map_err(csv_error)?;
    for customer in sorted {
        writer
            .write_record(COLUMNS.iter().map(|(_, cell)| cell(customer)))
            .map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| RegistryError::Other(format!("CSV flush failed: {}", e)))?;
    let mut csv = String::from_utf8(bytes)
        .map_err(|e| RegistryError::Other(format!("CSV is not UTF-8: {}", e)))?;

    // No trailing line break after the last row.
    if csv.ends_with('\n') {
        csv.pop();
    }
    Ok(csv)
}

fn csv_error(err: csv::Error) -> RegistryError {
    RegistryError::Other(format!("CSV write failed: {}", err))
}
