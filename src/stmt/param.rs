//! Parameter specifications
//!
//! Placeholders carry a small spec language:
//!
//! ```text
//! ##name[::type[::null|notnull]]
//! ## /* name:"name" type:int descr:"text" nullok:true */
//! ```
//!
//! The first form is parsed by [`parse_param_spec`], the keyword form by
//! [`parse_keyword_spec`]. Unknown type names are kept verbatim and only
//! resolved against the catalog during normalization.

use super::expr::{Expr, Literal};
use super::path::NodePath;
use super::visit::walk_exprs;
use super::Statement;
use crate::catalog::DataType;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_until, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{all_consuming, opt, rest},
    multi::separated_list0,
    sequence::{delimited, preceded, separated_pair, tuple},
    IResult,
};

/// Declared name, type and nullability of a placeholder
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    /// Parameter name, never empty
    pub name: String,
    /// Free-form description
    pub description: Option<String>,
    /// Type as written, empty when untyped
    pub declared_type: String,
    /// Type resolved against the catalog's type table
    pub resolved_type: Option<DataType>,
    /// Whether NULL is an acceptable value
    pub nullable: bool,
}

impl ParamSpec {
    /// Create an untyped, non-nullable spec
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::malformed(
                &NodePath::root(),
                "parameter name cannot be empty",
            ));
        }
        Ok(Self {
            name,
            description: None,
            declared_type: String::new(),
            resolved_type: None,
            nullable: false,
        })
    }

    /// Set the declared type
    pub fn with_type(mut self, declared_type: impl Into<String>) -> Self {
        self.declared_type = declared_type.into();
        self
    }

    /// Set nullable flag
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set description
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_typed(&self) -> bool {
        !self.declared_type.is_empty()
    }

    /// Resolved type, falling back to the built-in type table
    pub fn data_type(&self) -> Option<DataType> {
        self.resolved_type
            .clone()
            .or_else(|| DataType::from_name(&self.declared_type))
    }

    /// Same declaration, ignoring description and resolution state
    pub fn same_declaration(&self, other: &ParamSpec) -> bool {
        self.name == other.name
            && self.declared_type.eq_ignore_ascii_case(&other.declared_type)
            && self.nullable == other.nullable
    }
}

// ========== Positional form ==========

fn double_quoted(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), take_till(|c: char| c == '"'), char('"'))(input)
}

fn single_quoted(input: &str) -> IResult<&str, &str> {
    delimited(char('\''), take_till(|c: char| c == '\''), char('\''))(input)
}

fn field(input: &str) -> IResult<&str, &str> {
    alt((double_quoted, single_quoted, take_until("::"), rest))(input)
}

fn positional(input: &str) -> IResult<&str, (&str, Option<&str>, Option<&str>)> {
    all_consuming(tuple((
        field,
        opt(preceded(tag("::"), field)),
        opt(preceded(tag("::"), field)),
    )))(input)
}

/// Parse `name[::type[::null|notnull]]`
pub fn parse_param_spec(text: &str) -> Result<ParamSpec> {
    let path = NodePath::root();
    let (_, (name, declared_type, nullness)) = positional(text.trim())
        .map_err(|_| Error::malformed(&path, format!("invalid parameter spec '{}'", text)))?;

    let nullable = match nullness {
        None => false,
        Some(n) if n.eq_ignore_ascii_case("null") => true,
        Some(n) if n.eq_ignore_ascii_case("notnull") => false,
        Some(other) => {
            return Err(Error::malformed(
                &path,
                format!("expected 'null' or 'notnull' in parameter spec, got '{}'", other),
            ))
        }
    };

    Ok(ParamSpec::new(name)
        .map_err(|_| Error::malformed(&path, format!("missing parameter name in '{}'", text)))?
        .with_type(declared_type.unwrap_or(""))
        .nullable(nullable))
}

// ========== Keyword form ==========

fn keyword_value(input: &str) -> IResult<&str, &str> {
    alt((
        double_quoted,
        single_quoted,
        take_while1(|c: char| !c.is_whitespace()),
    ))(input)
}

fn keyword_pair(input: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        char(':'),
        keyword_value,
    )(input)
}

fn keyword_pairs(input: &str) -> IResult<&str, Vec<(&str, &str)>> {
    all_consuming(delimited(
        multispace0,
        separated_list0(multispace1, keyword_pair),
        multispace0,
    ))(input)
}

fn parse_bool(path: &NodePath, key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(Error::malformed(
            path,
            format!("'{}' expects a boolean, got '{}'", key, value),
        )),
    }
}

/// Parse the keyword form `name:"n" type:T descr:"d" nullok:true`
///
/// Surrounding `/* */` comment markers are accepted and ignored.
pub fn parse_keyword_spec(text: &str) -> Result<ParamSpec> {
    let path = NodePath::root();
    let body = text.trim();
    let body = body
        .strip_prefix("/*")
        .and_then(|b| b.strip_suffix("*/"))
        .unwrap_or(body);

    let (_, pairs) = keyword_pairs(body)
        .map_err(|_| Error::malformed(&path, format!("invalid parameter spec '{}'", text)))?;

    let mut name = None;
    let mut declared_type = String::new();
    let mut description = None;
    let mut nullable = false;
    for (key, value) in pairs {
        match key.to_ascii_lowercase().as_str() {
            "name" => name = Some(value.to_string()),
            "type" => declared_type = value.to_string(),
            "descr" => description = Some(value.to_string()),
            "nullok" | "null" => nullable = parse_bool(&path, key, value)?,
            _ => {
                return Err(Error::malformed(
                    &path,
                    format!("unknown parameter attribute '{}'", key),
                ))
            }
        }
    }

    let name = name.ok_or_else(|| {
        Error::malformed(&path, format!("missing parameter name in '{}'", text))
    })?;
    let mut spec = ParamSpec::new(name)
        .map_err(|_| Error::malformed(&path, "parameter name cannot be empty"))?
        .with_type(declared_type)
        .nullable(nullable);
    spec.description = description;
    Ok(spec)
}

// ========== Parameter sets ==========

/// Value bound to a parameter
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ParamValue {
    #[default]
    Unset,
    Value(Literal),
    /// Use the column's default
    UseDefault,
}

/// A declared parameter and its binding
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub spec: ParamSpec,
    pub value: ParamValue,
}

/// Parameters of one statement, in order of first appearance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSet {
    params: IndexMap<String, Param>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every placeholder of a statement
    pub fn from_statement(stmt: &Statement) -> Result<Self> {
        let mut set = Self::new();
        walk_exprs(stmt, &NodePath::root(), &mut |expr, path| {
            if let Expr::Placeholder(spec) = expr {
                set.declare_at(spec.clone(), path)?;
            }
            Ok(())
        })?;
        Ok(set)
    }

    /// Add a declaration; re-declaring a name is allowed only with the same type
    pub fn declare(&mut self, spec: ParamSpec) -> Result<()> {
        self.declare_at(spec, &NodePath::root())
    }

    fn declare_at(&mut self, spec: ParamSpec, path: &NodePath) -> Result<()> {
        if let Some(existing) = self.params.get(&spec.name) {
            if !existing.spec.same_declaration(&spec) {
                return Err(Error::malformed(
                    path,
                    format!(
                        "parameter '{}' declared twice with different type or nullability",
                        spec.name
                    ),
                ));
            }
            return Ok(());
        }
        self.params.insert(
            spec.name.clone(),
            Param {
                spec,
                value: ParamValue::Unset,
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Param> {
        self.params.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name).map(|p| &p.value)
    }

    fn param_mut(&mut self, name: &str) -> Result<&mut Param> {
        self.params.get_mut(name).ok_or_else(|| {
            Error::missing(&NodePath::root(), format!("missing parameter '{}'", name))
        })
    }

    /// Bind a value
    pub fn set_value(&mut self, name: &str, value: impl Into<Literal>) -> Result<()> {
        let value = value.into();
        let param = self.param_mut(name)?;
        if value.is_null() && !param.spec.nullable {
            return Err(Error::structure(
                &NodePath::root(),
                format!("parameter '{}' does not accept NULL", name),
            ));
        }
        param.value = ParamValue::Value(value);
        Ok(())
    }

    /// Mark a parameter as "use the column default"
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        self.param_mut(name)?.value = ParamValue::UseDefault;
        Ok(())
    }

    /// Remove any binding
    pub fn unset(&mut self, name: &str) -> Result<()> {
        self.param_mut(name)?.value = ParamValue::Unset;
        Ok(())
    }

    pub fn is_default(&self, name: &str) -> bool {
        matches!(self.value(name), Some(ParamValue::UseDefault))
    }

    pub fn is_bound_to_null(&self, name: &str) -> bool {
        matches!(self.value(name), Some(ParamValue::Value(Literal::Null)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.params.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    /// 1-based position of a parameter, for numbered placeholder styles
    pub fn position(&self, name: &str) -> Option<usize> {
        self.params.get_index_of(name).map(|i| i + 1)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::parse;

    #[test]
    fn test_parse_full_spec() {
        let spec = parse_param_spec("theid::int::null").unwrap();
        assert_eq!(spec.name, "theid");
        assert_eq!(spec.declared_type, "int");
        assert!(spec.nullable);
        assert_eq!(spec.description, None);
    }

    #[test]
    fn test_parse_name_only() {
        let spec = parse_param_spec("theid").unwrap();
        assert_eq!(spec.name, "theid");
        assert_eq!(spec.declared_type, "");
        assert!(!spec.nullable);
    }

    #[test]
    fn test_parse_quoted_fields() {
        let spec = parse_param_spec("\"my id\"::'int'::notnull").unwrap();
        assert_eq!(spec.name, "my id");
        assert_eq!(spec.declared_type, "int");
        assert!(!spec.nullable);
    }

    #[test]
    fn test_unknown_type_kept_verbatim() {
        let spec = parse_param_spec("x::geometry").unwrap();
        assert_eq!(spec.declared_type, "geometry");
        assert_eq!(spec.resolved_type, None);
    }

    #[test]
    fn test_empty_name_fails() {
        let err = parse_param_spec("::int").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::MalformedIdentifier);
        assert!(parse_param_spec("").is_err());
    }

    #[test]
    fn test_bad_nullness_fails() {
        assert!(parse_param_spec("a::int::maybe").is_err());
        assert!(parse_param_spec("a::int::null::extra").is_err());
    }

    #[test]
    fn test_keyword_spec() {
        let spec =
            parse_keyword_spec(r#"/* name:"id" type:gint descr:"row id" nullok:true */"#).unwrap();
        assert_eq!(spec.name, "id");
        assert_eq!(spec.declared_type, "gint");
        assert_eq!(spec.description.as_deref(), Some("row id"));
        assert!(spec.nullable);

        let spec = parse_keyword_spec("name:price type:numeric null:false").unwrap();
        assert_eq!(spec.name, "price");
        assert!(!spec.nullable);
    }

    #[test]
    fn test_keyword_spec_errors() {
        assert!(parse_keyword_spec("type:int").is_err());
        assert!(parse_keyword_spec("name:a color:red").is_err());
        assert!(parse_keyword_spec("name:a nullok:perhaps").is_err());
    }

    #[test]
    fn test_param_set_from_statement() {
        let stmt = parse("SELECT * FROM t WHERE a = ##a::int AND b = ##b::string AND c = ##a::int")
            .unwrap();
        let params = ParamSet::from_statement(&stmt).unwrap();
        assert_eq!(params.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(params.position("b"), Some(2));
    }

    #[test]
    fn test_conflicting_declarations() {
        let stmt = parse("SELECT * FROM t WHERE a = ##a::int OR a = ##a::string").unwrap();
        let err = ParamSet::from_statement(&stmt).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::MalformedIdentifier);
    }

    #[test]
    fn test_binding_values() {
        let mut params = ParamSet::new();
        params
            .declare(ParamSpec::new("id").unwrap().with_type("int"))
            .unwrap();
        params
            .declare(ParamSpec::new("name").unwrap().nullable(true))
            .unwrap();

        params.set_value("id", 12).unwrap();
        assert_eq!(params.value("id"), Some(&ParamValue::Value(Literal::Int64(12))));

        assert!(params.set_value("id", Literal::Null).is_err());
        params.set_value("name", Literal::Null).unwrap();
        assert!(params.is_bound_to_null("name"));

        params.set_default("name").unwrap();
        assert!(params.is_default("name"));
        assert!(params.set_default("nope").is_err());
    }
}
