//! Identifier validation: names end up inside DDL and MERGE text, so only plain or
//! bracketed SQL identifiers are accepted.

use crate::config::resolved::Column;
use crate::error::ConfigError;
use regex::Regex;

const IDENTIFIER_PATTERN: &str = r"^(?:\[[^\[\]]+\]|[A-Za-z_][A-Za-z0-9_@$#]*)$";

fn identifier_regex() -> Result<Regex, ConfigError> {
    Regex::new(IDENTIFIER_PATTERN).map_err(|e| ConfigError::Validation(e.to_string()))
}

pub fn is_valid_identifier(name: &str) -> bool {
    identifier_regex().map(|re| re.is_match(name)).unwrap_or(false)
}

/// Checks table, schema and column names of a resolved entity.
pub fn validate_identifiers<E>(
    entity: &'static str,
    table_name: &str,
    schema: Option<&str>,
    columns: &[Column<E>],
) -> Result<(), ConfigError> {
    let re = identifier_regex()?;
    let check = |kind: &'static str, name: &str| {
        if re.is_match(name) {
            Ok(())
        } else {
            Err(ConfigError::InvalidIdentifier {
                entity,
                kind,
                name: name.to_string(),
            })
        }
    };
    check("table", table_name)?;
    if let Some(s) = schema {
        check("schema", s)?;
    }
    for c in columns {
        check("column", &c.name)?;
    }
    Ok(())
}
