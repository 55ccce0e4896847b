//! Registry of known SQL functions
//!
//! Built once per process on first use. Functions not listed here are
//! accepted as user-defined with any argument count.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Signature of a known function
#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub name: &'static str,
    pub min_args: usize,
    /// `None` for variadic functions
    pub max_args: Option<usize>,
    pub is_aggregate: bool,
}

impl FunctionDef {
    const fn scalar(name: &'static str, min_args: usize, max_args: Option<usize>) -> Self {
        Self {
            name,
            min_args,
            max_args,
            is_aggregate: false,
        }
    }

    const fn aggregate(name: &'static str, min_args: usize, max_args: Option<usize>) -> Self {
        Self {
            name,
            min_args,
            max_args,
            is_aggregate: true,
        }
    }

    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min_args && self.max_args.map_or(true, |max| count <= max)
    }

    /// Human-readable argument count, e.g. `2`, `1 to 3`, `at least 1`
    pub fn arity_description(&self) -> String {
        match self.max_args {
            Some(max) if max == self.min_args => max.to_string(),
            Some(max) => format!("{} to {}", self.min_args, max),
            None => format!("at least {}", self.min_args),
        }
    }
}

const BUILTINS: &[FunctionDef] = &[
    // aggregates
    FunctionDef::aggregate("COUNT", 1, Some(1)),
    FunctionDef::aggregate("SUM", 1, Some(1)),
    FunctionDef::aggregate("AVG", 1, Some(1)),
    FunctionDef::aggregate("MIN", 1, Some(1)),
    FunctionDef::aggregate("MAX", 1, Some(1)),
    FunctionDef::aggregate("TOTAL", 1, Some(1)),
    FunctionDef::aggregate("GROUP_CONCAT", 1, Some(2)),
    FunctionDef::aggregate("STRING_AGG", 2, Some(2)),
    FunctionDef::aggregate("ARRAY_AGG", 1, Some(1)),
    FunctionDef::aggregate("STDDEV", 1, Some(1)),
    FunctionDef::aggregate("VARIANCE", 1, Some(1)),
    FunctionDef::aggregate("BOOL_AND", 1, Some(1)),
    FunctionDef::aggregate("BOOL_OR", 1, Some(1)),
    // strings
    FunctionDef::scalar("LOWER", 1, Some(1)),
    FunctionDef::scalar("UPPER", 1, Some(1)),
    FunctionDef::scalar("LENGTH", 1, Some(1)),
    FunctionDef::scalar("SUBSTR", 2, Some(3)),
    FunctionDef::scalar("SUBSTRING", 2, Some(3)),
    FunctionDef::scalar("TRIM", 1, Some(2)),
    FunctionDef::scalar("LTRIM", 1, Some(2)),
    FunctionDef::scalar("RTRIM", 1, Some(2)),
    FunctionDef::scalar("REPLACE", 3, Some(3)),
    FunctionDef::scalar("CONCAT", 1, None),
    // null handling
    FunctionDef::scalar("COALESCE", 1, None),
    FunctionDef::scalar("IFNULL", 2, Some(2)),
    FunctionDef::scalar("NULLIF", 2, Some(2)),
    // math
    FunctionDef::scalar("ABS", 1, Some(1)),
    FunctionDef::scalar("ROUND", 1, Some(2)),
    FunctionDef::scalar("CEIL", 1, Some(1)),
    FunctionDef::scalar("FLOOR", 1, Some(1)),
    FunctionDef::scalar("SQRT", 1, Some(1)),
    FunctionDef::scalar("GREATEST", 1, None),
    FunctionDef::scalar("LEAST", 1, None),
    // time
    FunctionDef::scalar("NOW", 0, Some(0)),
    FunctionDef::scalar("DATE", 1, None),
    // sub-select predicates
    FunctionDef::scalar("EXISTS", 1, Some(1)),
];

static REGISTRY: LazyLock<HashMap<&'static str, &'static FunctionDef>> =
    LazyLock::new(|| BUILTINS.iter().map(|def| (def.name, def)).collect());

/// Look up a function by name, ignoring case
pub fn get_function(name: &str) -> Option<&'static FunctionDef> {
    REGISTRY.get(name.to_ascii_uppercase().as_str()).copied()
}

/// Check if a function is an aggregate
pub fn is_aggregate(name: &str) -> bool {
    get_function(name).is_some_and(|f| f.is_aggregate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_case() {
        assert!(get_function("count").is_some());
        assert!(get_function("Coalesce").is_some());
        assert!(get_function("my_udf").is_none());
    }

    #[test]
    fn test_aggregates() {
        assert!(is_aggregate("sum"));
        assert!(is_aggregate("COUNT"));
        assert!(!is_aggregate("lower"));
        assert!(!is_aggregate("unknown"));
    }

    #[test]
    fn test_arity() {
        let substr = get_function("substr").unwrap();
        assert!(!substr.accepts(1));
        assert!(substr.accepts(3));
        assert_eq!(substr.arity_description(), "2 to 3");
        assert_eq!(get_function("coalesce").unwrap().arity_description(), "at least 1");
        assert_eq!(get_function("now").unwrap().arity_description(), "0");
    }
}
