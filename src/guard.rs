/// Argument guards used at the façade boundary.
use crate::error::{RefDbError, RefDbResult};
use crate::value::Value;

/// Values that can be checked for presence before an operation runs.
pub trait Presence {
    /// Returns `true` if the value counts as supplied.
    fn is_present(&self) -> bool;
}

impl Presence for Value {
    fn is_present(&self) -> bool {
        !self.is_null()
    }
}

impl Presence for str {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl Presence for String {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl<T: Presence> Presence for Option<T> {
    fn is_present(&self) -> bool {
        self.as_ref().is_some_and(Presence::is_present)
    }
}

impl<T: Presence + ?Sized> Presence for &T {
    fn is_present(&self) -> bool {
        (**self).is_present()
    }
}

/// Fail with [`RefDbError::InvalidArgument`] when `value` is missing.
///
/// `Null` values, empty strings and `None` are all treated as missing.
///
/// # Example
///
/// ```ignore
/// not_null(path, "pathValue")?;
/// not_null(&data, "data")?;
/// ```
pub fn not_null<T: Presence + ?Sized>(value: &T, name: &str) -> RefDbResult<()> {
    if value.is_present() {
        Ok(())
    } else {
        Err(RefDbError::invalid_argument(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_null_accepts_present_values() {
        assert!(not_null("users", "pathValue").is_ok());
        assert!(not_null(&Value::from(0), "data").is_ok());
        assert!(not_null(&Value::from(false), "data").is_ok());
        assert!(not_null(&Some("id".to_string()), "id").is_ok());
    }

    #[test]
    fn test_not_null_rejects_missing_values() {
        assert!(matches!(
            not_null(&Value::Null, "data"),
            Err(RefDbError::InvalidArgument { name }) if name == "data"
        ));
        assert!(not_null("", "id").is_err());
        assert!(not_null(&None::<String>, "id").is_err());
    }
}
