//! The structured error shape exchanged with servers.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// An application-level error reported by a server.
///
/// When a response is classified as an error and no custom
/// [`ErrorBodyHandler`](crate::ErrorBodyHandler) is configured, the response
/// body is decoded into this shape.
///
/// Two `ApiError`s are equal when their codes are equal; message and metadata
/// are ignored by comparison.
///
/// # Examples
///
/// ```
/// use wirecall::ApiError;
///
/// let a = ApiError::new(2, "a");
/// let b = ApiError::new(2, "b").with_meta(serde_json::json!({"x": 1}));
/// assert_eq!(a, b);
/// assert_ne!(a, ApiError::new(3, "a"));
///
/// assert_eq!(ApiError::new(2, "222").to_json_string(), r#"{"code":2,"message":"222"}"#);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Application error code.
    pub code: i64,

    /// Human readable message.
    pub message: String,

    /// Arbitrary extra data. Omitted from the serialized form when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl ApiError {
    /// Creates an error with no metadata.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            meta: None,
        }
    }

    /// Creates an error with optional metadata.
    pub fn new_with_meta(
        code: i64,
        message: impl Into<String>,
        meta: Option<serde_json::Value>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            meta,
        }
    }

    /// Attaches metadata to the error.
    pub fn with_meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Returns `true` if this error carries the given code.
    pub fn has_code(&self, code: i64) -> bool {
        self.code == code
    }

    /// Serializes the error to its JSON form.
    ///
    /// Falls back to the code and message alone if serialization fails.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"message":{:?}}}"#, self.code, self.message)
        })
    }
}

impl PartialEq for ApiError {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for ApiError {}

impl Hash for ApiError {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_equality_is_by_code_only() {
        let a = ApiError::new(2, "a");
        let b = ApiError::new_with_meta(2, "b", Some(json!({"x": 1})));
        let c = ApiError::new(3, "a");

        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<ApiError> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_serialization_omits_absent_meta() {
        let err = ApiError::new(2, "222");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"code": 2, "message": "222"})
        );
        assert_eq!(err.to_json_string(), r#"{"code":2,"message":"222"}"#);
    }

    #[test]
    fn test_serialization_includes_meta() {
        let err = ApiError::new(5, "bad").with_meta(json!({"field": "email"}));
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"code": 5, "message": "bad", "meta": {"field": "email"}})
        );
    }

    #[test]
    fn test_deserialize_without_meta() {
        let err: ApiError = serde_json::from_str(r#"{"code":2,"message":"222"}"#).unwrap();
        assert_eq!(err.code, 2);
        assert_eq!(err.message, "222");
        assert!(err.meta.is_none());
    }

    #[test]
    fn test_display_is_message() {
        assert_eq!(ApiError::new(9, "nope").to_string(), "nope");
        assert!(ApiError::new(9, "nope").has_code(9));
    }
}
