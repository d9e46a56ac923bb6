//! Error types for the checked settling APIs, plus thrown-value helpers.

use crate::value::Value;
use thiserror::Error;

/// Errors returned by the checked (`try_*`) settling operations.
///
/// The unchecked operations (`fulfill`, `reject`, `resolve`) treat the same
/// conditions as silent no-ops, per the idempotent-settle contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PromiseError {
    /// A resolving function for this promise was already called. The promise
    /// may still be pending (e.g. it is tracking a thenable), but its fate is
    /// no longer up to the caller.
    #[error("resolving function already called")]
    AlreadyResolved,

    /// The promise is already fulfilled or rejected.
    #[error("promise is already settled")]
    AlreadySettled,
}

/// Build a thrown TypeError value.
///
/// Thrown errors travel through the protocol as plain [`Value`]s; a TypeError
/// is represented as a string with a `TypeError:` prefix.
pub fn type_error(message: &str) -> Value {
    Value::string(format!("TypeError: {message}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_error_format() {
        let v = type_error("promise cannot resolve itself");
        assert_eq!(
            v.as_str(),
            Some("TypeError: promise cannot resolve itself")
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            PromiseError::AlreadySettled.to_string(),
            "promise is already settled"
        );
    }
}
