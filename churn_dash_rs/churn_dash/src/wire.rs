//! Request and response bodies exchanged with the prediction service.

use serde::{Deserialize, Serialize};

/// Raw values of the six editable form controls, exactly as the controls
/// report them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormInputs {
    pub tenure: String,
    pub monthly_charges: String,
    pub total_charges: String,
    pub senior_citizen: String,
    pub contract: String,
    pub gender: String,
}

/// Full feature payload for `POST /predict`. Field order matches the order the
/// service documents; every key is always present.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PredictionRequest {
    pub tenure: i64,
    #[serde(rename = "MonthlyCharges")]
    pub monthly_charges: f64,
    #[serde(rename = "TotalCharges")]
    pub total_charges: f64,
    #[serde(rename = "SeniorCitizen")]
    pub senior_citizen: i64,
    #[serde(rename = "Contract")]
    pub contract: String,
    pub gender: String,
    #[serde(rename = "Partner")]
    pub partner: String,
    #[serde(rename = "Dependents")]
    pub dependents: String,
    #[serde(rename = "PhoneService")]
    pub phone_service: String,
    #[serde(rename = "MultipleLines")]
    pub multiple_lines: String,
    #[serde(rename = "InternetService")]
    pub internet_service: String,
    #[serde(rename = "OnlineSecurity")]
    pub online_security: String,
    #[serde(rename = "OnlineBackup")]
    pub online_backup: String,
    #[serde(rename = "DeviceProtection")]
    pub device_protection: String,
    #[serde(rename = "TechSupport")]
    pub tech_support: String,
    #[serde(rename = "StreamingTV")]
    pub streaming_tv: String,
    #[serde(rename = "StreamingMovies")]
    pub streaming_movies: String,
    #[serde(rename = "PaperlessBilling")]
    pub paperless_billing: String,
    #[serde(rename = "PaymentMethod")]
    pub payment_method: String,
}

impl PredictionRequest {
    /// Merge the form values with the fixed profile used for every attribute the
    /// form does not expose. Numbers are coerced leniently; categorical values
    /// pass through untouched.
    pub fn from_inputs(inputs: &FormInputs) -> Self {
        Self {
            tenure: parse_int_lenient(&inputs.tenure),
            monthly_charges: parse_float_lenient(&inputs.monthly_charges),
            total_charges: parse_float_lenient(&inputs.total_charges),
            senior_citizen: parse_int_lenient(&inputs.senior_citizen),
            contract: inputs.contract.clone(),
            gender: inputs.gender.clone(),
            partner: "No".to_string(),
            dependents: "No".to_string(),
            phone_service: "Yes".to_string(),
            multiple_lines: "No".to_string(),
            internet_service: "Fiber optic".to_string(),
            online_security: "No".to_string(),
            online_backup: "No".to_string(),
            device_protection: "No".to_string(),
            tech_support: "No".to_string(),
            streaming_tv: "No".to_string(),
            streaming_movies: "No".to_string(),
            paperless_billing: "Yes".to_string(),
            payment_method: "Electronic check".to_string(),
        }
    }
}

/// Body of a successful `POST /predict`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PredictionResponse {
    pub probability: f64,
    pub risk: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasons: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tip: Option<String>,
}

/// One element of the `POST /upload` response array.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BulkResultRow {
    pub customer_id: String,
    pub probability: f64,
    pub risk: String,
    #[serde(default)]
    pub reasons: Vec<String>,
}

/// A file picked for bulk upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Integer coercion in the manner of a browser `parseInt` without a radix:
/// leading whitespace is skipped, a `0x`/`0X` prefix switches to hexadecimal,
/// and the longest run of digits after an optional sign is used. Anything else
/// yields zero.
pub fn parse_int_lenient(raw: &str) -> i64 {
    let s = raw.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let (radix, rest) = match rest.get(..2) {
        Some("0x") | Some("0X") => (16, &rest[2..]),
        _ => (10, rest),
    };
    let digits = rest.chars().take_while(|c| c.is_digit(radix)).count();
    if digits == 0 {
        return 0;
    }
    let magnitude = i64::from_str_radix(&rest[..digits], radix).unwrap_or(i64::MAX);
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// Float coercion in the manner of a browser `parseFloat`: the longest decimal
/// prefix (with optional exponent) is used; no prefix or a non-finite value
/// yields zero.
pub fn parse_float_lenient(raw: &str) -> f64 {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'-') | Some(b'+')) {
        end = 1;
    }
    let int_digits = bytes[end..].iter().take_while(|b| b.is_ascii_digit()).count();
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = bytes[end + 1..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return 0.0;
    }
    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'-') | Some(b'+')) {
            exp_end += 1;
        }
        let exp_digits = bytes[exp_end.min(bytes.len())..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }
    match s[..end].parse::<f64>() {
        Ok(v) if v.is_finite() && v != 0.0 => v,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_form_yields_zeroes_and_raw_categoricals() {
        let inputs = FormInputs {
            contract: "Month-to-month".into(),
            gender: "Female".into(),
            ..FormInputs::default()
        };
        let req = PredictionRequest::from_inputs(&inputs);
        assert_eq!(req.tenure, 0);
        assert_eq!(req.monthly_charges, 0.0);
        assert_eq!(req.total_charges, 0.0);
        assert_eq!(req.senior_citizen, 0);
        assert_eq!(req.contract, "Month-to-month");
        assert_eq!(req.gender, "Female");
    }

    #[test]
    fn request_always_carries_nineteen_keys() {
        let req = PredictionRequest::from_inputs(&FormInputs::default());
        let value = serde_json::to_value(&req).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 19);
        for key in [
            "tenure",
            "MonthlyCharges",
            "TotalCharges",
            "SeniorCitizen",
            "Contract",
            "gender",
            "Partner",
            "Dependents",
            "PhoneService",
            "MultipleLines",
            "InternetService",
            "OnlineSecurity",
            "OnlineBackup",
            "DeviceProtection",
            "TechSupport",
            "StreamingTV",
            "StreamingMovies",
            "PaperlessBilling",
            "PaymentMethod",
        ] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert_eq!(obj["InternetService"], "Fiber optic");
        assert_eq!(obj["PaymentMethod"], "Electronic check");
        assert!(obj["tenure"].is_i64());
        assert!(obj["MonthlyCharges"].is_f64());
    }

    #[test]
    fn categorical_values_are_not_validated() {
        let inputs = FormInputs {
            contract: "  lifetime??".into(),
            gender: String::new(),
            ..FormInputs::default()
        };
        let req = PredictionRequest::from_inputs(&inputs);
        assert_eq!(req.contract, "  lifetime??");
        assert_eq!(req.gender, "");
    }

    #[test]
    fn lenient_integers() {
        assert_eq!(parse_int_lenient("12"), 12);
        assert_eq!(parse_int_lenient("  12 months"), 12);
        assert_eq!(parse_int_lenient("12.9"), 12);
        assert_eq!(parse_int_lenient("-3"), -3);
        assert_eq!(parse_int_lenient("abc"), 0);
        assert_eq!(parse_int_lenient(""), 0);
        assert_eq!(parse_int_lenient("-"), 0);
    }

    #[test]
    fn lenient_integers_accept_hex_prefix() {
        assert_eq!(parse_int_lenient("0x1A"), 26);
        assert_eq!(parse_int_lenient(" 0XfFz"), 255);
        assert_eq!(parse_int_lenient("-0x10"), -16);
        assert_eq!(parse_int_lenient("0x"), 0);
        assert_eq!(parse_int_lenient("0b101"), 0);
    }

    #[test]
    fn lenient_floats() {
        assert_eq!(parse_float_lenient("70.5"), 70.5);
        assert_eq!(parse_float_lenient("70.5$"), 70.5);
        assert_eq!(parse_float_lenient(" .5"), 0.5);
        assert_eq!(parse_float_lenient("5."), 5.0);
        assert_eq!(parse_float_lenient("1e3"), 1000.0);
        assert_eq!(parse_float_lenient("1e"), 1.0);
        assert_eq!(parse_float_lenient("-2.5e-1x"), -0.25);
        assert_eq!(parse_float_lenient("."), 0.0);
        assert_eq!(parse_float_lenient("n/a"), 0.0);
        assert_eq!(parse_float_lenient("1e999"), 0.0);
    }

    #[test]
    fn response_tolerates_missing_optional_fields() {
        let resp: PredictionResponse =
            serde_json::from_str(r#"{"probability": 82, "risk": "High"}"#).unwrap();
        assert_eq!(resp.probability, 82.0);
        assert_eq!(resp.reasons, None);
        assert_eq!(resp.suggestion, None);

        let resp: PredictionResponse =
            serde_json::from_str(r#"{"probability": 12.5, "risk": "Low", "reasons": null}"#)
                .unwrap();
        assert_eq!(resp.reasons, None);
    }

    #[test]
    fn absent_optional_fields_are_not_echoed_back() {
        let resp: PredictionResponse =
            serde_json::from_str(r#"{"probability": 82, "risk": "High", "tip": "Call soon"}"#)
                .unwrap();
        let value = serde_json::to_value(&resp).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 3);
        assert_eq!(obj["tip"], "Call soon");
        assert!(!obj.contains_key("reasons"));
        assert!(!obj.contains_key("suggestion"));
    }

    #[test]
    fn bulk_rows_decode_in_order() {
        let rows: Vec<BulkResultRow> = serde_json::from_str(
            r#"[
                {"customer_id": "7590-VHVEG", "probability": 91, "risk": "Critical", "reasons": ["High Monthly Charges"]},
                {"customer_id": "Row-2", "probability": 15, "risk": "Low", "reasons": []}
            ]"#,
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].customer_id, "7590-VHVEG");
        assert_eq!(rows[1].customer_id, "Row-2");
        assert!(rows[1].reasons.is_empty());
    }
}
