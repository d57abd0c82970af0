//! The uniform `{success, data, error}` wire wrapper.
//!
//! Inside the crate every operation returns a [`Result`]; the envelope only
//! exists at the edges: the HTTP backend decodes it, and the CLI's `--json`
//! output encodes it.

use crate::error::{LibrisError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Collapse the two failure channels (`success: false` and a missing
    /// payload) into one typed error.
    pub fn into_result(self) -> Result<T> {
        if !self.success {
            let message = self.error.unwrap_or_else(|| "Request failed".to_string());
            return Err(LibrisError::from_remote_message(&message));
        }
        self.data
            .ok_or_else(|| LibrisError::Network("response carried no data".to_string()))
    }
}

impl<T> From<Result<T>> for Envelope<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Envelope::ok(data),
            Err(err) => Envelope::failure(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Ack, EntityKind};

    #[test]
    fn success_envelope_yields_data() {
        let env: Envelope<Ack> =
            serde_json::from_str(r#"{"success":true,"data":{"success":true}}"#).unwrap();
        assert_eq!(env.into_result().unwrap(), Ack::ok());
    }

    #[test]
    fn failure_envelope_yields_typed_error() {
        let env: Envelope<Ack> =
            serde_json::from_str(r#"{"success":false,"data":null,"error":"Author not found"}"#)
                .unwrap();
        assert!(matches!(
            env.into_result(),
            Err(LibrisError::NotFound(EntityKind::Author))
        ));
    }

    #[test]
    fn success_without_data_is_an_error() {
        let env: Envelope<Ack> = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(matches!(env.into_result(), Err(LibrisError::Network(_))));
    }

    #[test]
    fn result_encodes_to_envelope() {
        let failed: Envelope<Ack> = Err(LibrisError::InvalidToken).into();
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": false, "data": null, "error": "Invalid token"})
        );
    }
}
