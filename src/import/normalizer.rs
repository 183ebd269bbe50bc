//! Maps raw spreadsheet rows onto the canonical vehicle record.

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::dates::{ISO_FORMAT, coerce_date};
use super::workbook::{CellValue, Row};

pub const DEFAULT_MODEL: &str = "Genérico";
pub const DEFAULT_FUEL: &str = "gasolina";
pub const ACTIVE_STATUS: &str = "active";

const PLATE_HEADERS: &[&str] = &["PLACA", "N° PLACA", "NRO PLACA", "PLACA VEHICULO"];
const MAKE_HEADERS: &[&str] = &["MARCA"];
const MODEL_HEADERS: &[&str] = &["MODELO"];
const YEAR_HEADERS: &[&str] = &["AÑO", "ANO", "ANIO", "AÑO FABRICACION", "AÑO DE FABRICACION"];
const FUEL_HEADERS: &[&str] = &["COMBUSTIBLE", "TIPO COMBUSTIBLE", "TIPO DE COMBUSTIBLE"];
const MILEAGE_HEADERS: &[&str] = &["KILOMETRAJE", "KM", "KILOMETRAJE ACTUAL"];

const INSPECTION_ISSUED_HEADERS: &[&str] = &["FECHA REVISION TECNICA", "EMISION REVISION TECNICA", "FECHA RT"];
const INSPECTION_EXPIRES_HEADERS: &[&str] = &["VENCIMIENTO REVISION TECNICA", "VENC REVISION TECNICA", "VENCIMIENTO RT"];
const INSURANCE_ISSUED_HEADERS: &[&str] = &["FECHA SOAT", "EMISION SOAT", "INICIO SOAT"];
const INSURANCE_EXPIRES_HEADERS: &[&str] = &["VENCIMIENTO SOAT", "VENC SOAT", "FIN SOAT"];
const POLICY_ISSUED_HEADERS: &[&str] = &["FECHA POLIZA", "EMISION POLIZA", "INICIO POLIZA"];
const POLICY_EXPIRES_HEADERS: &[&str] = &["VENCIMIENTO POLIZA", "VENC POLIZA", "FIN POLIZA"];
const CONTRACT_START_HEADERS: &[&str] = &["INICIO CONTRATO", "INICIO CONTRATO ALQUILER", "FECHA CONTRATO"];
const CONTRACT_END_HEADERS: &[&str] = &["FIN CONTRATO", "FIN CONTRATO ALQUILER", "VENCIMIENTO CONTRATO"];

/// Canonical header spellings, in template column order
pub const TEMPLATE_HEADERS: &[&str] = &[
    "PLACA",
    "MARCA",
    "MODELO",
    "AÑO",
    "COMBUSTIBLE",
    "KILOMETRAJE",
    "FECHA REVISION TECNICA",
    "VENCIMIENTO REVISION TECNICA",
    "FECHA SOAT",
    "VENCIMIENTO SOAT",
    "FECHA POLIZA",
    "VENCIMIENTO POLIZA",
    "INICIO CONTRATO",
    "FIN CONTRATO",
];

/// Issue and expiry dates of the regulatory and contractual documents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDates {
    #[serde(rename = "fecha_revision_tecnica")]
    pub inspection_issued: Option<String>,
    #[serde(rename = "vencimiento_revision_tecnica")]
    pub inspection_expires: Option<String>,
    #[serde(rename = "fecha_soat")]
    pub insurance_issued: Option<String>,
    #[serde(rename = "vencimiento_soat")]
    pub insurance_expires: Option<String>,
    #[serde(rename = "fecha_poliza")]
    pub policy_issued: Option<String>,
    #[serde(rename = "vencimiento_poliza")]
    pub policy_expires: Option<String>,
    #[serde(rename = "inicio_contrato_alquiler")]
    pub contract_start: Option<String>,
    #[serde(rename = "fin_contrato_alquiler")]
    pub contract_end: Option<String>,
}

/// A validated vehicle row ready to be inserted.
///
/// Serialized with the store's column names; absent dates serialize as
/// `null` so every record in a batch carries the same keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    #[serde(rename = "placa")]
    pub plate: String,
    #[serde(rename = "marca")]
    pub make: String,
    #[serde(rename = "modelo")]
    pub model: String,
    #[serde(rename = "anio")]
    pub year: i32,
    #[serde(rename = "tipo_combustible")]
    pub fuel_type: String,
    #[serde(rename = "kilometraje")]
    pub mileage: i64,
    #[serde(rename = "estado")]
    pub status: String,
    #[serde(rename = "fecha_ultimo_mantenimiento")]
    pub last_maintenance_date: String,
    #[serde(rename = "sede_id")]
    pub site_id: String,
    #[serde(flatten)]
    pub documents: DocumentDates,
}

impl NormalizedRecord {
    /// Identifying fields and site reference are all present
    pub fn is_valid(&self) -> bool {
        !self.plate.trim().is_empty() && !self.make.trim().is_empty() && !self.site_id.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    MissingPlateOrMake,
    MissingSite,
}

/// Why a row did not become a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRejection {
    pub sheet: String,
    pub reason: RejectionReason,
}

impl RowRejection {
    /// Operator-facing message; identical for every rejected row of the same sheet and reason
    pub fn message(&self) -> String {
        match self.reason {
            RejectionReason::MissingPlateOrMake => {
                format!("Sheet '{}': rows without PLACA or MARCA were skipped", self.sheet)
            }
            RejectionReason::MissingSite => {
                format!("Sheet '{}': no target site assigned", self.sheet)
            }
        }
    }
}

impl fmt::Display for RowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Values the normalizer falls back to that depend on the current date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeContext {
    pub today: NaiveDate,
}

impl NormalizeContext {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn current() -> Self {
        Self::new(Local::now().date_naive())
    }
}

/// Normalize one raw row for the sheet mapped to `site_id`
pub fn normalize_row(
    row: &Row,
    sheet_name: &str,
    site_id: &str,
    ctx: &NormalizeContext,
) -> Result<NormalizedRecord, RowRejection> {
    let site_id = site_id.trim();
    if site_id.is_empty() {
        return Err(RowRejection {
            sheet: sheet_name.to_string(),
            reason: RejectionReason::MissingSite,
        });
    }

    let fields = uppercase_keys(row);

    let plate = lookup_text(&fields, PLATE_HEADERS).to_uppercase();
    let make = lookup_text(&fields, MAKE_HEADERS);
    if plate.is_empty() || make.is_empty() {
        return Err(RowRejection {
            sheet: sheet_name.to_string(),
            reason: RejectionReason::MissingPlateOrMake,
        });
    }

    let model = non_empty_or(lookup_text(&fields, MODEL_HEADERS), DEFAULT_MODEL);
    let fuel_type = non_empty_or(lookup_text(&fields, FUEL_HEADERS).to_lowercase(), DEFAULT_FUEL);
    let year = lookup(&fields, YEAR_HEADERS)
        .and_then(parse_number)
        .filter(|n| *n >= i32::MIN as f64 && *n <= i32::MAX as f64)
        .map(|n| n.trunc() as i32)
        .unwrap_or_else(|| ctx.today.year());
    let mileage = lookup(&fields, MILEAGE_HEADERS)
        .and_then(parse_number)
        .filter(|n| n.abs() < 1e15)
        .map(|n| n.round() as i64)
        .unwrap_or(0);

    Ok(NormalizedRecord {
        plate,
        make,
        model,
        year,
        fuel_type,
        mileage,
        status: ACTIVE_STATUS.to_string(),
        last_maintenance_date: ctx.today.format(ISO_FORMAT).to_string(),
        site_id: site_id.to_string(),
        documents: DocumentDates {
            inspection_issued: lookup_date(&fields, INSPECTION_ISSUED_HEADERS),
            inspection_expires: lookup_date(&fields, INSPECTION_EXPIRES_HEADERS),
            insurance_issued: lookup_date(&fields, INSURANCE_ISSUED_HEADERS),
            insurance_expires: lookup_date(&fields, INSURANCE_EXPIRES_HEADERS),
            policy_issued: lookup_date(&fields, POLICY_ISSUED_HEADERS),
            policy_expires: lookup_date(&fields, POLICY_EXPIRES_HEADERS),
            contract_start: lookup_date(&fields, CONTRACT_START_HEADERS),
            contract_end: lookup_date(&fields, CONTRACT_END_HEADERS),
        },
    })
}

fn uppercase_keys(row: &Row) -> HashMap<String, &CellValue> {
    row.iter()
        .map(|(key, value)| (key.trim().to_uppercase(), value))
        .collect()
}

/// First non-blank cell among the accepted header spellings
fn lookup<'a>(fields: &HashMap<String, &'a CellValue>, headers: &[&str]) -> Option<&'a CellValue> {
    headers
        .iter()
        .filter_map(|header| fields.get(*header).copied())
        .find(|value| !value.is_blank())
}

fn lookup_text(fields: &HashMap<String, &CellValue>, headers: &[&str]) -> String {
    lookup(fields, headers)
        .map(|value| value.as_text().trim().to_string())
        .unwrap_or_default()
}

fn lookup_date(fields: &HashMap<String, &CellValue>, headers: &[&str]) -> Option<String> {
    lookup(fields, headers).and_then(coerce_date)
}

fn parse_number(value: &CellValue) -> Option<f64> {
    let number = match value {
        CellValue::Number(n) => *n,
        CellValue::Text(text) => text.trim().parse::<f64>().ok()?,
    };
    number.is_finite().then_some(number)
}

fn non_empty_or(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> NormalizeContext {
        NormalizeContext::new(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap())
    }

    fn row(cells: &[(&str, CellValue)]) -> Row {
        cells
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_full_row() {
        let raw = row(&[
            (" placa ", CellValue::from(" abc-123 ")),
            ("Marca", CellValue::from("Toyota")),
            ("MODELO", CellValue::from("Hilux")),
            ("Año", CellValue::Number(2019.0)),
            ("Combustible", CellValue::from("DIESEL")),
            ("Kilometraje", CellValue::Number(152340.6)),
            ("Vencimiento SOAT", CellValue::from("31/12/2025")),
            ("Fecha SOAT", CellValue::Number(45292.0)),
            ("Fin Contrato", CellValue::from("2026-01-31")),
        ]);

        let record = normalize_row(&raw, "SCP ICA", "site-2", &ctx()).unwrap();

        assert_eq!(record.plate, "ABC-123");
        assert_eq!(record.make, "Toyota");
        assert_eq!(record.model, "Hilux");
        assert_eq!(record.year, 2019);
        assert_eq!(record.fuel_type, "diesel");
        assert_eq!(record.mileage, 152341);
        assert_eq!(record.status, ACTIVE_STATUS);
        assert_eq!(record.last_maintenance_date, "2025-06-15");
        assert_eq!(record.site_id, "site-2");
        assert_eq!(record.documents.insurance_issued.as_deref(), Some("2024-01-01"));
        assert_eq!(record.documents.insurance_expires.as_deref(), Some("2025-12-31"));
        assert_eq!(record.documents.contract_end.as_deref(), Some("2026-01-31"));
        assert_eq!(record.documents.policy_expires, None);
        assert!(record.is_valid());
    }

    #[test]
    fn test_defaults() {
        let raw = row(&[
            ("PLACA", CellValue::from("XYZ789")),
            ("MARCA", CellValue::from("Nissan")),
            ("AÑO", CellValue::from("nuevo")),
            ("KILOMETRAJE", CellValue::from("")),
        ]);

        let record = normalize_row(&raw, "Lima", "1", &ctx()).unwrap();

        assert_eq!(record.model, DEFAULT_MODEL);
        assert_eq!(record.year, 2025);
        assert_eq!(record.fuel_type, DEFAULT_FUEL);
        assert_eq!(record.mileage, 0);
        assert_eq!(record.documents, DocumentDates::default());
    }

    #[test]
    fn test_textual_numbers_are_accepted() {
        let raw = row(&[
            ("PLACA", CellValue::from("XYZ789")),
            ("MARCA", CellValue::from("Nissan")),
            ("ANIO", CellValue::from(" 2018 ")),
            ("KM", CellValue::from("1200.4")),
        ]);

        let record = normalize_row(&raw, "Lima", "1", &ctx()).unwrap();
        assert_eq!(record.year, 2018);
        assert_eq!(record.mileage, 1200);
    }

    #[test]
    fn test_missing_make_is_rejected_with_sheet_name() {
        let raw = row(&[
            ("PLACA", CellValue::from("ABC123")),
            ("MARCA", CellValue::from("   ")),
        ]);

        let rejection = normalize_row(&raw, "SCP ICA", "2", &ctx()).unwrap_err();
        assert_eq!(rejection.reason, RejectionReason::MissingPlateOrMake);
        assert!(rejection.message().contains("SCP ICA"));
    }

    #[test]
    fn test_missing_plate_column_is_rejected() {
        let raw = row(&[("MARCA", CellValue::from("Toyota"))]);
        assert!(normalize_row(&raw, "Lima", "1", &ctx()).is_err());
    }

    #[test]
    fn test_blank_site_is_rejected() {
        let raw = row(&[
            ("PLACA", CellValue::from("ABC123")),
            ("MARCA", CellValue::from("Toyota")),
        ]);
        let rejection = normalize_row(&raw, "Lima", "  ", &ctx()).unwrap_err();
        assert_eq!(rejection.reason, RejectionReason::MissingSite);
    }

    #[test]
    fn test_bad_dates_do_not_reject_the_row() {
        let raw = row(&[
            ("PLACA", CellValue::from("ABC123")),
            ("MARCA", CellValue::from("Toyota")),
            ("VENCIMIENTO REVISION TECNICA", CellValue::from("pronto")),
            ("FECHA POLIZA", CellValue::Number(-4.0)),
            ("INICIO CONTRATO", CellValue::from("2024/01/01")),
        ]);

        let record = normalize_row(&raw, "Lima", "1", &ctx()).unwrap();
        assert_eq!(record.documents, DocumentDates::default());
    }

    #[test]
    fn test_out_of_range_serial_leaves_date_absent() {
        let raw = row(&[
            ("PLACA", CellValue::from("ABC123")),
            ("MARCA", CellValue::from("Toyota")),
            ("VENCIMIENTO SOAT", CellValue::Number(1e12)),
            ("FECHA SOAT", CellValue::Number(45292.0)),
        ]);

        let record = normalize_row(&raw, "Lima", "1", &ctx()).unwrap();
        assert_eq!(record.documents.insurance_expires, None);
        assert_eq!(record.documents.insurance_issued.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn test_serializes_with_store_column_names() {
        let raw = row(&[
            ("PLACA", CellValue::from("ABC123")),
            ("MARCA", CellValue::from("Toyota")),
        ]);
        let record = normalize_row(&raw, "Lima", "1", &ctx()).unwrap();
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["placa"], "ABC123");
        assert_eq!(json["sede_id"], "1");
        assert_eq!(json["estado"], ACTIVE_STATUS);
        assert!(json["vencimiento_soat"].is_null());
        assert_eq!(json.as_object().unwrap().len(), 17);
    }
}
