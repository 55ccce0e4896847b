//! Data types known to the catalog
//!
//! Placeholder and column types are written as free text (`int`, `gint`,
//! `varchar(20)`, `timestamp`...). [`DataType::from_name`] is the type table
//! turning such a name into a concrete type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// SQL Data Types
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    /// 16-bit integer
    SmallInt,
    /// 32-bit integer
    Integer,
    /// 64-bit integer
    BigInt,
    Float,
    Double,
    /// Fixed-point decimal with precision and scale
    Decimal(u8, u8),
    Char(usize),
    Varchar(usize),
    Text,
    Date,
    Time,
    Timestamp,
    Blob,
}

impl DataType {
    /// Resolve a type name, ignoring case and an optional `(n[,m])` suffix
    pub fn from_name(name: &str) -> Option<DataType> {
        let name = name.trim();
        let (base, args) = match name.find('(') {
            Some(open) => {
                let close = name.rfind(')')?;
                if close < open {
                    return None;
                }
                (&name[..open], Some(&name[open + 1..close]))
            }
            None => (name, None),
        };
        let base = base.trim().to_ascii_lowercase();
        let mut args = match args {
            Some(a) => a
                .split(',')
                .map(|p| p.trim().parse::<usize>())
                .collect::<Result<Vec<_>, _>>()
                .ok()?,
            None => Vec::new(),
        }
        .into_iter();

        let data_type = match base.as_str() {
            "bool" | "boolean" | "gboolean" => DataType::Boolean,
            "smallint" | "int2" | "gshort" | "gint16" => DataType::SmallInt,
            "int" | "integer" | "int4" | "gint" | "gint32" | "guint" | "serial" => {
                DataType::Integer
            }
            "bigint" | "int8" | "gint64" | "guint64" | "glong" | "bigserial" => DataType::BigInt,
            "float" | "real" | "float4" | "gfloat" => DataType::Float,
            "double" | "double precision" | "float8" | "gdouble" => DataType::Double,
            "numeric" | "decimal" | "gdanumeric" => {
                let precision = args.next().unwrap_or(18);
                let scale = args.next().unwrap_or(0);
                DataType::Decimal(
                    u8::try_from(precision).ok()?,
                    u8::try_from(scale).ok()?,
                )
            }
            "char" | "character" | "gchar" => DataType::Char(args.next().unwrap_or(1)),
            "varchar" | "character varying" | "string" | "gchararray" => {
                DataType::Varchar(args.next().unwrap_or(0))
            }
            "text" | "clob" => DataType::Text,
            "date" | "gdate" => DataType::Date,
            "time" | "gdatime" => DataType::Time,
            "timestamp" | "datetime" | "gdatimestamp" | "gdatetime" => DataType::Timestamp,
            "blob" | "bytea" | "binary" | "gdablob" | "gdabinary" => DataType::Blob,
            _ => return None,
        };
        Some(data_type)
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::SmallInt | DataType::Integer | DataType::BigInt
        )
    }

    /// Check if this type is numeric
    pub fn is_numeric(&self) -> bool {
        self.is_integer()
            || matches!(
                self,
                DataType::Float | DataType::Double | DataType::Decimal(_, _)
            )
    }

    /// Check if this type is a string type
    pub fn is_string(&self) -> bool {
        matches!(
            self,
            DataType::Char(_) | DataType::Varchar(_) | DataType::Text
        )
    }

    /// Canonical lower-case name, as written back into placeholder specs
    pub fn canonical_name(&self) -> String {
        match self {
            DataType::Boolean => "boolean".to_string(),
            DataType::SmallInt => "smallint".to_string(),
            DataType::Integer => "int".to_string(),
            DataType::BigInt => "bigint".to_string(),
            DataType::Float => "float".to_string(),
            DataType::Double => "double".to_string(),
            DataType::Decimal(p, s) => format!("numeric({},{})", p, s),
            DataType::Char(n) => format!("char({})", n),
            DataType::Varchar(0) => "varchar".to_string(),
            DataType::Varchar(n) => format!("varchar({})", n),
            DataType::Text => "text".to_string(),
            DataType::Date => "date".to_string(),
            DataType::Time => "time".to_string(),
            DataType::Timestamp => "timestamp".to_string(),
            DataType::Blob => "blob".to_string(),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Boolean => write!(f, "BOOLEAN"),
            DataType::SmallInt => write!(f, "SMALLINT"),
            DataType::Integer => write!(f, "INTEGER"),
            DataType::BigInt => write!(f, "BIGINT"),
            DataType::Float => write!(f, "FLOAT"),
            DataType::Double => write!(f, "DOUBLE"),
            DataType::Decimal(p, s) => write!(f, "DECIMAL({}, {})", p, s),
            DataType::Char(n) => write!(f, "CHAR({})", n),
            DataType::Varchar(0) => write!(f, "VARCHAR"),
            DataType::Varchar(n) => write!(f, "VARCHAR({})", n),
            DataType::Text => write!(f, "TEXT"),
            DataType::Date => write!(f, "DATE"),
            DataType::Time => write!(f, "TIME"),
            DataType::Timestamp => write!(f, "TIMESTAMP"),
            DataType::Blob => write!(f, "BLOB"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_aliases() {
        assert_eq!(DataType::from_name("int"), Some(DataType::Integer));
        assert_eq!(DataType::from_name("INTEGER"), Some(DataType::Integer));
        assert_eq!(DataType::from_name("gint"), Some(DataType::Integer));
        assert_eq!(DataType::from_name("string"), Some(DataType::Varchar(0)));
        assert_eq!(DataType::from_name("Timestamp"), Some(DataType::Timestamp));
        assert_eq!(DataType::from_name("nosuchtype"), None);
    }

    #[test]
    fn test_from_name_with_arguments() {
        assert_eq!(DataType::from_name("varchar(20)"), Some(DataType::Varchar(20)));
        assert_eq!(DataType::from_name("numeric(10, 2)"), Some(DataType::Decimal(10, 2)));
        assert_eq!(DataType::from_name("varchar(x)"), None);
        assert_eq!(DataType::from_name("numeric(999)"), None);
    }

    #[test]
    fn test_type_classes() {
        assert!(DataType::BigInt.is_integer());
        assert!(!DataType::Double.is_integer());
        assert!(DataType::Double.is_numeric());
        assert!(DataType::Text.is_string());
    }

    #[test]
    fn test_canonical_name_resolves_back() {
        for t in [DataType::Integer, DataType::Varchar(30), DataType::Decimal(8, 3)] {
            assert_eq!(DataType::from_name(&t.canonical_name()), Some(t.clone()));
        }
    }
}
