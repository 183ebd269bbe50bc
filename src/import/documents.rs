//! Expiry status of the documents every vehicle has to keep current.

use chrono::NaiveDate;
use serde::Serialize;

use super::dates::ISO_FORMAT;
use super::normalizer::NormalizedRecord;

pub const DEFAULT_WARNING_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DocumentKind {
    TechnicalInspection,
    Insurance,
    Policy,
    RentalContract,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 4] = [
        DocumentKind::TechnicalInspection,
        DocumentKind::Insurance,
        DocumentKind::Policy,
        DocumentKind::RentalContract,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::TechnicalInspection => "Revisión técnica",
            DocumentKind::Insurance => "SOAT",
            DocumentKind::Policy => "Póliza",
            DocumentKind::RentalContract => "Contrato de alquiler",
        }
    }

    /// The expiry date string recorded for this document
    pub fn expiry<'a>(&self, record: &'a NormalizedRecord) -> Option<&'a str> {
        let docs = &record.documents;
        match self {
            DocumentKind::TechnicalInspection => docs.inspection_expires.as_deref(),
            DocumentKind::Insurance => docs.insurance_expires.as_deref(),
            DocumentKind::Policy => docs.policy_expires.as_deref(),
            DocumentKind::RentalContract => docs.contract_end.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DocumentStatus {
    Missing,
    Expired { days_overdue: i64 },
    ExpiringSoon { days_left: i64 },
    Valid { days_left: i64 },
}

/// Classify an ISO expiry date relative to `today`
pub fn document_status(expiry: Option<&str>, today: NaiveDate, warning_days: i64) -> DocumentStatus {
    let Some(expiry) = expiry.and_then(|date| NaiveDate::parse_from_str(date, ISO_FORMAT).ok()) else {
        return DocumentStatus::Missing;
    };

    let days_left = (expiry - today).num_days();
    if days_left < 0 {
        DocumentStatus::Expired {
            days_overdue: -days_left,
        }
    } else if days_left <= warning_days {
        DocumentStatus::ExpiringSoon { days_left }
    } else {
        DocumentStatus::Valid { days_left }
    }
}

/// Counts of each status per document kind over a set of records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub missing: usize,
    pub expired: usize,
    pub expiring_soon: usize,
    pub valid: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub entries: Vec<(DocumentKind, StatusCounts)>,
}

impl DocumentSummary {
    pub fn compute(records: &[NormalizedRecord], today: NaiveDate, warning_days: i64) -> Self {
        let entries = DocumentKind::ALL
            .iter()
            .map(|kind| {
                let mut counts = StatusCounts::default();
                for record in records {
                    match document_status(kind.expiry(record), today, warning_days) {
                        DocumentStatus::Missing => counts.missing += 1,
                        DocumentStatus::Expired { .. } => counts.expired += 1,
                        DocumentStatus::ExpiringSoon { .. } => counts.expiring_soon += 1,
                        DocumentStatus::Valid { .. } => counts.valid += 1,
                    }
                }
                (*kind, counts)
            })
            .collect();

        Self { entries }
    }

    pub fn counts(&self, kind: DocumentKind) -> StatusCounts {
        self.entries
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, counts)| *counts)
            .unwrap_or_default()
    }

    /// Any document expired or about to expire
    pub fn needs_attention(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, counts)| counts.expired > 0 || counts.expiring_soon > 0)
    }
}
