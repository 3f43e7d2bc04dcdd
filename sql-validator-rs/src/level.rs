//! Security levels and the profile each one grants

use crate::errors::SqlSecurityError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named profile bounding accepted commands, functions and complexity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityLevel {
    Strict,
    Moderate,
    Permissive,
}

impl SecurityLevel {
    pub const ALL: [SecurityLevel; 3] = [
        SecurityLevel::Strict,
        SecurityLevel::Moderate,
        SecurityLevel::Permissive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityLevel::Strict => "STRICT",
            SecurityLevel::Moderate => "MODERATE",
            SecurityLevel::Permissive => "PERMISSIVE",
        }
    }

    /// Limits that apply at this level
    pub fn profile(&self) -> &'static SecurityProfile {
        match self {
            SecurityLevel::Strict => &STRICT_PROFILE,
            SecurityLevel::Moderate => &MODERATE_PROFILE,
            SecurityLevel::Permissive => &PERMISSIVE_PROFILE,
        }
    }
}

impl Default for SecurityLevel {
    fn default() -> Self {
        SecurityLevel::Moderate
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecurityLevel {
    type Err = SqlSecurityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "STRICT" => Ok(SecurityLevel::Strict),
            "MODERATE" => Ok(SecurityLevel::Moderate),
            "PERMISSIVE" => Ok(SecurityLevel::Permissive),
            other => Err(SqlSecurityError::InvalidConfiguration(format!(
                "Unknown security level: {}",
                other
            ))),
        }
    }
}

/// What a level accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityProfile {
    pub allowed_commands: &'static [&'static str],
    pub allowed_functions: &'static [&'static str],
    pub max_joins: usize,
    pub max_subqueries: usize,
    pub max_where_conditions: usize,
    pub max_order_by: usize,
    pub max_group_by: usize,
}

impl SecurityProfile {
    pub fn allows_command(&self, command: &str) -> bool {
        self.allowed_commands.iter().any(|c| c.eq_ignore_ascii_case(command))
    }

    pub fn allows_function(&self, function: &str) -> bool {
        self.allowed_functions.iter().any(|f| f.eq_ignore_ascii_case(function))
    }
}

const STRICT_FUNCTIONS: &[&str] = &["COUNT", "SUM", "AVG", "MIN", "MAX"];

const MODERATE_FUNCTIONS: &[&str] = &[
    "COUNT", "SUM", "AVG", "MIN", "MAX", "UPPER", "LOWER", "LENGTH", "SUBSTR", "SUBSTRING",
    "TRIM", "COALESCE", "IFNULL", "NULLIF", "ROUND", "ABS", "CAST", "DATE", "STRFTIME",
];

const PERMISSIVE_FUNCTIONS: &[&str] = &[
    "COUNT", "SUM", "AVG", "MIN", "MAX", "UPPER", "LOWER", "LENGTH", "SUBSTR", "SUBSTRING",
    "TRIM", "COALESCE", "IFNULL", "NULLIF", "ROUND", "ABS", "CAST", "DATE", "STRFTIME",
    "DATETIME", "JULIANDAY", "TIME", "REPLACE", "INSTR", "CONCAT", "EXTRACT", "DATE_TRUNC",
    "NOW", "GROUP_CONCAT", "STRING_AGG", "ROW_NUMBER", "RANK", "DENSE_RANK", "LAG", "LEAD",
];

static STRICT_PROFILE: SecurityProfile = SecurityProfile {
    allowed_commands: &["SELECT"],
    allowed_functions: STRICT_FUNCTIONS,
    max_joins: 2,
    max_subqueries: 1,
    max_where_conditions: 5,
    max_order_by: 2,
    max_group_by: 1,
};

static MODERATE_PROFILE: SecurityProfile = SecurityProfile {
    allowed_commands: &["SELECT", "WITH"],
    allowed_functions: MODERATE_FUNCTIONS,
    max_joins: 4,
    max_subqueries: 3,
    max_where_conditions: 10,
    max_order_by: 3,
    max_group_by: 2,
};

static PERMISSIVE_PROFILE: SecurityProfile = SecurityProfile {
    allowed_commands: &["SELECT", "WITH", "EXPLAIN"],
    allowed_functions: PERMISSIVE_FUNCTIONS,
    max_joins: 6,
    max_subqueries: 5,
    max_where_conditions: 20,
    max_order_by: 5,
    max_group_by: 3,
};

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_levels_nest() {
        let levels = SecurityLevel::ALL;
        for pair in levels.windows(2) {
            let (narrow, wide) = (pair[0].profile(), pair[1].profile());

            for command in narrow.allowed_commands {
                assert!(wide.allows_command(command), "{} lost at {}", command, pair[1]);
            }
            for function in narrow.allowed_functions {
                assert!(wide.allows_function(function), "{} lost at {}", function, pair[1]);
            }
            assert!(narrow.max_joins <= wide.max_joins);
            assert!(narrow.max_subqueries <= wide.max_subqueries);
            assert!(narrow.max_where_conditions <= wide.max_where_conditions);
            assert!(narrow.max_order_by <= wide.max_order_by);
            assert!(narrow.max_group_by <= wide.max_group_by);
        }
    }

    #[test_case("strict" => SecurityLevel::Strict ; "lower case")]
    #[test_case(" MODERATE " => SecurityLevel::Moderate ; "padded")]
    #[test_case("Permissive" => SecurityLevel::Permissive ; "mixed case")]
    fn test_parse_level(input: &str) -> SecurityLevel {
        input.parse().unwrap()
    }

    #[test]
    fn test_parse_unknown_level() {
        assert!(matches!(
            "PARANOID".parse::<SecurityLevel>(),
            Err(SqlSecurityError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_command_whitelists() {
        assert!(SecurityLevel::Strict.profile().allows_command("select"));
        assert!(!SecurityLevel::Strict.profile().allows_command("WITH"));
        assert!(SecurityLevel::Moderate.profile().allows_command("WITH"));
        assert!(!SecurityLevel::Moderate.profile().allows_command("EXPLAIN"));
        assert!(SecurityLevel::Permissive.profile().allows_command("EXPLAIN"));
    }
}
