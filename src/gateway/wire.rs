//! Backend response decoding.
//!
//! Error responses come in two shapes:
//!
//! | Body | Meaning |
//! |------|---------|
//! | `{"detail": {"message": "...", "errors": [{"description": "..."}]}}` | structured validation rejection |
//! | `{"detail": "..."}` | plain failure message |
//!
//! Only the first shape is a hard rejection. A plain message starting with
//! `Scheduling failed` comes from the solver; a 404 is a missing record.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{GatewayError, GatewayResult};

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Detail,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Detail {
    Structured {
        #[serde(default)]
        message: Option<String>,
        errors: Vec<ErrorItem>,
    },
    Message(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorItem {
    Text(String),
    Object {
        #[serde(default, rename = "type")]
        kind: Option<String>,
        #[serde(default)]
        description: Option<String>,
    },
}

impl ErrorItem {
    fn into_message(self) -> String {
        match self {
            ErrorItem::Text(text) => text,
            ErrorItem::Object {
                description: Some(d),
                ..
            } => d,
            ErrorItem::Object { kind: Some(k), .. } => k,
            ErrorItem::Object { .. } => "unspecified error".to_string(),
        }
    }
}

const SOLVER_PREFIX: &str = "Scheduling failed";

/// Classifies a non-success response.
pub fn decode_error_body(status: u16, body: &str) -> GatewayError {
    let parsed: ErrorBody = match serde_json::from_str(body) {
        Ok(b) => b,
        Err(e) => {
            return GatewayError::Malformed(format!("HTTP {}: {}", status, e));
        }
    };

    match parsed.detail {
        Detail::Structured { message, errors } => {
            let mut errors: Vec<String> = errors.into_iter().map(ErrorItem::into_message).collect();
            if errors.is_empty() {
                errors.push(message.unwrap_or_else(|| "Validation failed".to_string()));
            }
            GatewayError::Rejected { errors }
        }
        Detail::Message(msg) if status == 404 => GatewayError::NotFound(msg),
        Detail::Message(msg) => match msg.strip_prefix(SOLVER_PREFIX) {
            Some(rest) => GatewayError::Solver(
                rest.trim_start_matches(|c: char| c == ':' || c.is_whitespace())
                    .to_string(),
            ),
            None => GatewayError::Transport(format!("HTTP {}: {}", status, msg)),
        },
    }
}

/// Decodes a success body.
pub fn decode_body<T: DeserializeOwned>(body: &str) -> GatewayResult<T> {
    serde_json::from_str(body).map_err(|e| GatewayError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Day, LectureBlock, RemoteBlockId};

    #[test]
    fn test_structured_rejection() {
        let body = r#"{"detail": {"message": "Validation failed", "errors": [
            {"type": "teacher_conflict", "description": "Teacher 3 is already teaching at MON 3"},
            {"type": "room_conflict"},
            "Room 2 is double booked"
        ]}}"#;
        match decode_error_body(400, body) {
            GatewayError::Rejected { errors } => {
                assert_eq!(
                    errors,
                    vec![
                        "Teacher 3 is already teaching at MON 3".to_string(),
                        "room_conflict".to_string(),
                        "Room 2 is double booked".to_string()
                    ]
                );
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_empty_error_list_keeps_message() {
        let body = r#"{"detail": {"message": "Validation failed", "errors": []}}"#;
        assert_eq!(
            decode_error_body(400, body),
            GatewayError::Rejected {
                errors: vec!["Validation failed".into()]
            }
        );
    }

    #[test]
    fn test_plain_messages() {
        assert_eq!(
            decode_error_body(404, r#"{"detail": "Group not found"}"#),
            GatewayError::NotFound("Group not found".into())
        );
        assert_eq!(
            decode_error_body(500, r#"{"detail": "Scheduling failed: no slot for math"}"#),
            GatewayError::Solver("no slot for math".into())
        );
        assert!(matches!(
            decode_error_body(500, r#"{"detail": "boom"}"#),
            GatewayError::Transport(_)
        ));
        assert!(matches!(
            decode_error_body(502, "<html>bad gateway</html>"),
            GatewayError::Malformed(_)
        ));
    }

    #[test]
    fn test_decode_block() {
        let body = r#"{"id": 9, "group_id": 2, "day": "TUE", "period": 4, "room_id": null, "is_fixed": false}"#;
        let block: LectureBlock = decode_body(body).unwrap();
        assert_eq!(block.id, RemoteBlockId(9));
        assert_eq!(block.day, Day::Tue);
        assert!(decode_body::<LectureBlock>("{}").is_err());
    }
}
