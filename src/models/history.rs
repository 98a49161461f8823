// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// A single (date, value) point of a currency history.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeriesPoint {
    #[serde(rename = "fecha")]
    pub date: String,
    #[serde(rename = "valor")]
    pub value: f64,
}

impl SeriesPoint {
    /// Date portion only; the service appends a time-of-day after the tenth character.
    pub fn day(&self) -> &str {
        match self.date.char_indices().nth(10) {
            Some((idx, _)) => &self.date[..idx],
            None => &self.date,
        }
    }
}

/// Chronologically ordered, as returned by the service.
pub type HistoricalSeries = Vec<SeriesPoint>;

/// Full body of `GET <base>/<code>`, kept as-is in the rate cache.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistoryResponse {
    #[serde(rename = "codigo", default)]
    pub code: Option<String>,
    #[serde(rename = "nombre", default)]
    pub name: Option<String>,
    #[serde(rename = "unidad_medida", default)]
    pub unit: Option<String>,
    #[serde(rename = "serie")]
    pub series: HistoricalSeries,
    // Add catch-all for other fields we don't care about
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_history_response() {
        let body = r#"{
            "version": "1.7.0",
            "autor": "mindicador.cl",
            "codigo": "dolar",
            "nombre": "Dólar observado",
            "unidad_medida": "Pesos",
            "serie": [
                {"fecha": "2024-05-10T04:00:00.000Z", "valor": 925.5},
                {"fecha": "2024-05-09T04:00:00.000Z", "valor": 930.1}
            ]
        }"#;

        let response: HistoryResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.code.as_deref(), Some("dolar"));
        assert_eq!(response.series.len(), 2);
        assert_eq!(response.series[0].value, 925.5);
        assert!(response.extra.contains_key("version"));
    }

    #[test]
    fn test_missing_serie_fails() {
        let body = r#"{"codigo": "dolar", "nombre": "Dólar observado"}"#;
        assert!(serde_json::from_str::<HistoryResponse>(body).is_err());
    }

    #[test]
    fn test_day_truncates_time() {
        let point = SeriesPoint {
            date: "2024-05-10T04:00:00.000Z".to_string(),
            value: 1.0,
        };
        assert_eq!(point.day(), "2024-05-10");

        let short = SeriesPoint {
            date: "2024-05".to_string(),
            value: 1.0,
        };
        assert_eq!(short.day(), "2024-05");
    }
}
