//! Display models for the KPI cards and the bulk ranking table. Both are pure
//! functions of a service response; the front ends only copy the strings out.

use serde::Serialize;

use crate::severity::Severity;
use crate::wire::{BulkResultRow, PredictionResponse};

pub const KPI_CARD_CLASS: &str = "kpi-card";
pub const DEFAULT_REASON: &str = "Normal usage pattern";
pub const MISSING_TEXT: &str = "N/A";
pub const NO_REASON_PLACEHOLDER: &str = "-";

/// Everything the KPI row shows for one prediction.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct KpiView {
    pub probability_text: String,
    pub risk_text: String,
    pub severity: Severity,
    pub reason_text: String,
    pub suggestion_text: String,
    pub tip_text: String,
}

impl KpiView {
    pub fn render(response: &PredictionResponse) -> Self {
        let reason_text = response
            .reasons
            .as_ref()
            .and_then(|reasons| reasons.first())
            .cloned()
            .unwrap_or_else(|| DEFAULT_REASON.to_string());
        Self {
            probability_text: format_probability(response.probability),
            risk_text: response.risk.clone(),
            severity: Severity::of_label(&response.risk),
            reason_text,
            suggestion_text: or_missing(response.suggestion.as_deref()),
            tip_text: or_missing(response.tip.as_deref()),
        }
    }

    /// Full class list for the risk card. Rebuilt on every call so a previous
    /// severity can never linger.
    pub fn risk_card_class(&self) -> String {
        card_class(self.severity)
    }

    /// The probability card always mirrors the risk card.
    pub fn probability_card_class(&self) -> String {
        card_class(self.severity)
    }
}

fn card_class(severity: Severity) -> String {
    format!("{KPI_CARD_CLASS} {}", severity.css_class())
}

fn or_missing(value: Option<&str>) -> String {
    match value {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => MISSING_TEXT.to_string(),
    }
}

/// `82` → `"82%"`, `82.5` → `"82.5%"`.
pub fn format_probability(probability: f64) -> String {
    format!("{probability}%")
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BulkTableRow {
    pub rank: usize,
    pub customer_id: String,
    pub probability_text: String,
    pub risk: String,
    pub badge_color: &'static str,
    pub top_reason: String,
}

impl BulkTableRow {
    pub fn rank_label(&self) -> String {
        format!("#{}", self.rank)
    }
}

/// Ranked table for bulk mode. Rows keep the server's order; rank is position.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BulkTable {
    pub rows: Vec<BulkTableRow>,
}

impl BulkTable {
    pub fn render(results: &[BulkResultRow]) -> Self {
        let rows = results
            .iter()
            .enumerate()
            .map(|(index, row)| BulkTableRow {
                rank: index + 1,
                customer_id: row.customer_id.clone(),
                probability_text: format_probability(row.probability),
                risk: row.risk.clone(),
                badge_color: Severity::of_label(&row.risk).badge_color(),
                top_reason: row
                    .reasons
                    .first()
                    .filter(|reason| !reason.is_empty())
                    .cloned()
                    .unwrap_or_else(|| NO_REASON_PLACEHOLDER.to_string()),
            })
            .collect();
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// `ranking.csv` export of a rendered table.
pub fn ranking_csv(table: &BulkTable) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["rank", "customer_id", "probability", "risk", "top_reason"])?;
    for row in &table.rows {
        writer.write_record([
            row.rank.to_string(),
            row.customer_id.clone(),
            row.probability_text.trim_end_matches('%').to_string(),
            row.risk.clone(),
            row.top_reason.clone(),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(probability: f64, risk: &str, reasons: Option<Vec<&str>>) -> PredictionResponse {
        PredictionResponse {
            probability,
            risk: risk.to_string(),
            reasons: reasons.map(|r| r.into_iter().map(String::from).collect()),
            suggestion: None,
            tip: None,
        }
    }

    #[test]
    fn high_risk_with_no_reasons() {
        let view = KpiView::render(&response(82.0, "High", Some(vec![])));
        assert_eq!(view.probability_text, "82%");
        assert_eq!(view.risk_text, "High");
        assert_eq!(view.risk_card_class(), "kpi-card risk-high");
        assert_eq!(view.probability_card_class(), "kpi-card risk-high");
        assert_eq!(view.reason_text, "Normal usage pattern");
        assert_eq!(view.suggestion_text, "N/A");
        assert_eq!(view.tip_text, "N/A");
    }

    #[test]
    fn critical_gets_only_the_high_class() {
        let view = KpiView::render(&response(91.0, "Critical", None));
        let class = view.risk_card_class();
        assert!(class.contains("risk-high"));
        assert!(!class.contains("risk-medium"));
        assert!(!class.contains("risk-low"));
    }

    #[test]
    fn repeated_renders_do_not_accumulate_classes() {
        let first = KpiView::render(&response(91.0, "High", None));
        let second = KpiView::render(&response(20.0, "Low", None));
        assert_eq!(first.risk_card_class(), "kpi-card risk-high");
        assert_eq!(second.risk_card_class(), "kpi-card risk-low");
    }

    #[test]
    fn first_reason_and_text_fields_are_used() {
        let mut resp = response(
            45.5,
            "Medium",
            Some(vec!["High Monthly Charges", "Month-to-month Contract Risk"]),
        );
        resp.suggestion = Some("Suggest an upgrade to a better value plan.".into());
        resp.tip = Some(String::new());
        let view = KpiView::render(&resp);
        assert_eq!(view.probability_text, "45.5%");
        assert_eq!(view.reason_text, "High Monthly Charges");
        assert_eq!(view.severity, Severity::Medium);
        assert_eq!(
            view.suggestion_text,
            "Suggest an upgrade to a better value plan."
        );
        assert_eq!(view.tip_text, "N/A");
    }

    #[test]
    fn bulk_table_keeps_server_order() {
        let rows = vec![
            BulkResultRow {
                customer_id: "B".into(),
                probability: 40.0,
                risk: "Medium".into(),
                reasons: vec!["High Monthly Charges".into()],
            },
            BulkResultRow {
                customer_id: "A".into(),
                probability: 95.0,
                risk: "Critical".into(),
                reasons: vec![],
            },
            BulkResultRow {
                customer_id: "C".into(),
                probability: 5.0,
                risk: "Unrated".into(),
                reasons: vec!["New customer (Low Tenure)".into()],
            },
        ];
        let table = BulkTable::render(&rows);
        assert_eq!(table.len(), rows.len());
        for (index, row) in table.rows.iter().enumerate() {
            assert_eq!(row.rank, index + 1);
            assert_eq!(row.customer_id, rows[index].customer_id);
        }
        assert_eq!(table.rows[0].rank_label(), "#1");
        assert_eq!(table.rows[0].badge_color, "orange");
        assert_eq!(table.rows[1].badge_color, "red");
        assert_eq!(table.rows[1].top_reason, "-");
        assert_eq!(table.rows[2].badge_color, "green");
        assert_eq!(table.rows[2].probability_text, "5%");
    }

    #[test]
    fn empty_upload_renders_empty_table() {
        let table = BulkTable::render(&[]);
        assert!(table.is_empty());
    }

    #[test]
    fn ranking_export_quotes_fields() {
        let table = BulkTable::render(&[BulkResultRow {
            customer_id: "0001, A".into(),
            probability: 72.25,
            risk: "Critical".into(),
            reasons: vec!["High Monthly Charges".into()],
        }]);
        let csv = ranking_csv(&table).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("rank,customer_id,probability,risk,top_reason")
        );
        assert_eq!(
            lines.next(),
            Some("1,\"0001, A\",72.25,Critical,High Monthly Charges")
        );
    }
}
