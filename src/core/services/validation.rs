//! Input validation and response decoding shared by every operation.

use serde::de::DeserializeOwned;
use serde_json::error::Category;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use super::error::AppError;

/// Validate `input`, turning every violated rule into one `validation_error`.
pub fn validate_input<T: Validate>(input: &T, message: &str) -> Result<(), AppError> {
    input
        .validate()
        .map_err(|errors| AppError::validation(message, describe(&errors)))
}

/// `<field.path>: <message>` for every issue, sorted and joined with `; `.
///
/// Paths use the camelCase names the inputs carry on the wire, the same
/// names response decoding reports.
pub fn describe(errors: &ValidationErrors) -> String {
    let mut issues = Vec::new();
    collect_issues(errors, "", &mut issues);
    issues.sort();
    issues.join("; ")
}

fn collect_issues(errors: &ValidationErrors, prefix: &str, issues: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let field = wire_name(field);
        let path = if prefix.is_empty() {
            field
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed `{}` check", error.code));
                    issues.push(format!("{path}: {message}"));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_issues(nested, &path, issues),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_issues(nested, &format!("{path}.{index}"), issues);
                }
            }
        }
    }
}

/// `branch_infos` becomes `branchInfos`.
fn wire_name(field: &str) -> String {
    let mut name = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = !name.is_empty();
        } else if upper {
            name.extend(c.to_uppercase());
            upper = false;
        } else {
            name.push(c);
        }
    }
    name
}

/// Decode a backend payload.
///
/// Text that is not JSON at all is a backend fault; JSON of the wrong shape is
/// a `validation_error` naming the first offending path.
pub fn decode_response<T: DeserializeOwned>(raw: &str, message: &str) -> Result<T, AppError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let value = serde_path_to_error::deserialize::<_, T>(&mut deserializer).map_err(|err| {
        let path = err.path().to_string();
        let inner = err.into_inner();
        match inner.classify() {
            Category::Data => AppError::validation(message, format!("{path}: {inner}")),
            Category::Syntax | Category::Eof | Category::Io => AppError::malformed_response(inner),
        }
    })?;
    deserializer.end().map_err(AppError::malformed_response)?;
    Ok(value)
}
