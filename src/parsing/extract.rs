use std::collections::HashMap;

use regex::Regex;

use crate::error::IngestError;

/// One entry of a template's pattern table: a field name and a regex with
/// exactly one capture group. Optional fields yield an empty string when
/// unmatched; mandatory fields fail the whole extraction.
#[derive(Debug)]
pub struct FieldPattern {
    pub name: &'static str,
    pub pattern: Regex,
    pub optional: bool,
}

impl FieldPattern {
    pub fn required(name: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
            optional: false,
        })
    }

    pub fn optional(name: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
            optional: true,
        })
    }
}

pub fn extract_fields(
    text: &str,
    patterns: &[FieldPattern],
) -> Result<HashMap<&'static str, String>, IngestError> {
    let mut out = HashMap::with_capacity(patterns.len());

    for field in patterns {
        match field.pattern.captures(text).and_then(|caps| caps.get(1)) {
            Some(m) => {
                out.insert(field.name, m.as_str().to_owned());
            }
            None if field.optional => {
                out.insert(field.name, String::new());
            }
            None => return Err(IngestError::FieldNotFound(field.name)),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn captures_each_field() {
        let patterns = vec![
            FieldPattern::required("amount", r"\$([\d,]+\.\d{2})").unwrap(),
            FieldPattern::required("txdate", r"([A-Za-z]+ \d{1,2}, \d{4})").unwrap(),
        ];

        let fields =
            extract_fields("Amount: $1,234.56 on June 1, 2025", &patterns).expect("extract");
        assert_eq!(fields["amount"], "1,234.56");
        assert_eq!(fields["txdate"], "June 1, 2025");
    }

    #[test]
    fn missing_mandatory_field_names_the_field() {
        let patterns = vec![FieldPattern::required("amount", r"\$([\d,]+\.\d{2})").unwrap()];

        let err = extract_fields("no money here", &patterns).expect_err("should fail");
        assert!(matches!(err, IngestError::FieldNotFound("amount")));
    }

    #[test]
    fn missing_optional_field_is_empty() {
        let patterns = vec![FieldPattern::optional("account", r"(\*+\d+)").unwrap()];

        let fields = extract_fields("no account mentioned", &patterns).expect("extract");
        assert_eq!(fields["account"], "");
    }
}
