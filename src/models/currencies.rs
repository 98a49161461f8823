// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use crate::error::{AppError, Result};
use serde::Deserialize;
use serde_json::Value;

/// One row of the current-rates table.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyRecord {
    pub name: String,
    /// Current unit value; `None` when the service sent no usable number.
    pub value: Option<f64>,
    pub unit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawIndicator {
    nombre: String,
    #[serde(default)]
    valor: Option<Value>,
    #[serde(default)]
    unidad_medida: Option<String>,
}

/// Currency code -> current rate, in the order the root endpoint lists them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrencyTable {
    rows: Vec<(String, CurrencyRecord)>,
}

impl CurrencyTable {
    /// Build the table from the root endpoint body.
    ///
    /// The body mixes indicator objects with metadata keys such as `version`
    /// and `autor`; only objects carrying a `nombre` become rows.
    pub fn from_json(body: Value) -> Result<Self> {
        let Value::Object(map) = body else {
            return Err(AppError::Parse(
                "expected a JSON object of indicators".to_string(),
            ));
        };

        let rows = map
            .into_iter()
            .filter_map(|(code, entry)| {
                let raw: RawIndicator = serde_json::from_value(entry).ok()?;
                Some((
                    code,
                    CurrencyRecord {
                        name: raw.nombre,
                        value: raw.valor.as_ref().and_then(Value::as_f64),
                        unit: raw.unidad_medida,
                    },
                ))
            })
            .collect();

        Ok(Self { rows })
    }

    pub fn get(&self, code: &str) -> Option<&CurrencyRecord> {
        self.rows
            .iter()
            .find(|(key, _)| key == code)
            .map(|(_, record)| record)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CurrencyRecord)> {
        self.rows.iter().map(|(code, record)| (code, record))
    }

    /// Dropdown entries: (value = code, label = display name).
    pub fn options(&self) -> Vec<(String, String)> {
        self.rows
            .iter()
            .map(|(code, record)| (code.clone(), record.name.clone()))
            .collect()
    }
}

impl FromIterator<(String, CurrencyRecord)> for CurrencyTable {
    fn from_iter<I: IntoIterator<Item = (String, CurrencyRecord)>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}
