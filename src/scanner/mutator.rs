//! Parameter set construction for a single probe

use super::form::Form;
use crate::error::ScannerError;

/// Value given to every field that is not under test
pub const PLACEHOLDER: &str = "test";

/// Ordered field/value pairs for one submission
pub type ParameterSet = Vec<(String, String)>;

/// Fill every field of `form`, putting `payload` into `target_field` and the
/// placeholder everywhere else.
pub fn build(form: &Form, target_field: &str, payload: &str) -> Result<ParameterSet, ScannerError> {
    if !form.has_field(target_field) {
        return Err(ScannerError::FieldNotInForm {
            field: target_field.to_string(),
            action: form.action.clone(),
        });
    }

    Ok(form
        .fields
        .iter()
        .map(|field| {
            let value = if field == target_field { payload } else { PLACEHOLDER };
            (field.clone(), value.to_string())
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::form::FormMethod;

    #[test]
    fn test_only_target_gets_payload() {
        let form = Form::new("/login", FormMethod::Post, ["user", "pass", "token"]);
        let params = build(&form, "pass", "' OR 1=1--").unwrap();

        assert_eq!(
            params,
            vec![
                ("user".to_string(), "test".to_string()),
                ("pass".to_string(), "' OR 1=1--".to_string()),
                ("token".to_string(), "test".to_string()),
            ]
        );
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let form = Form::new("/login", FormMethod::Post, ["user"]);
        let err = build(&form, "missing", "x").unwrap_err();
        assert!(matches!(err, ScannerError::FieldNotInForm { .. }));
    }
}
