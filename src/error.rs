// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use thiserror::Error;

pub const MSG_INVALID_INPUT: &str = "Por favor ingresa un valor válido y selecciona una moneda.";
pub const MSG_RATE_UNAVAILABLE: &str = "Error al obtener el valor de la moneda.";
pub const MSG_CURRENCIES_FAILED: &str = "Error al cargar las monedas.";
pub const MSG_HISTORY_FAILED: &str = "Error al cargar los datos históricos";
pub const MSG_CHART_FAILED: &str = "Error al dibujar el gráfico histórico";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API request failed with status: {0}")]
    Status(reqwest::StatusCode),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No usable rate for currency: {0}")]
    RateUnavailable(String),
}

impl AppError {
    /// Text shown in the results panel in place of a result.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => MSG_INVALID_INPUT,
            AppError::RateUnavailable(_) => MSG_RATE_UNAVAILABLE,
            AppError::Network(_) | AppError::Status(_) | AppError::Parse(_) => {
                MSG_HISTORY_FAILED
            }
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, AppError::Network(_) | AppError::Status(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Parse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        assert_eq!(
            AppError::InvalidInput("-5".to_string()).user_message(),
            MSG_INVALID_INPUT
        );
        assert_eq!(
            AppError::RateUnavailable("usd".to_string()).user_message(),
            MSG_RATE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Parse("missing field `serie`".to_string()).user_message(),
            MSG_HISTORY_FAILED
        );
    }

    #[test]
    fn test_parse_error_from_serde() {
        let err = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        let app_err: AppError = err.into();
        assert!(matches!(app_err, AppError::Parse(_)));
        assert!(!app_err.is_network());
    }
}
