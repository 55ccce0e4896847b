//! Statement renderers
//!
//! [`sql`] turns a statement back into SQL text, [`json`] produces the JSON
//! wire form.

pub mod json;
pub mod sql;

pub use json::{render_json, render_json_pretty, statement_to_json};
pub use sql::{render_expr, render_sql, render_sql_with_params};

use serde::{Deserialize, Serialize};

/// How placeholders appear in rendered SQL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderStyle {
    /// `##name::type[::NULL]`
    #[default]
    Spec,
    /// `## /* name:"n" type:T descr:"d" nullok:true */`
    Long,
    /// `:name`
    Colon,
    /// `$1`, `$2`, ...
    Dollar,
    /// `?1`, `?2`, ...
    QuestionNumbered,
    /// `?`
    Question,
    /// Bound values inlined as literals
    Values,
}

impl PlaceholderStyle {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().replace('-', "_").as_str() {
            "spec" => Some(PlaceholderStyle::Spec),
            "long" => Some(PlaceholderStyle::Long),
            "colon" => Some(PlaceholderStyle::Colon),
            "dollar" => Some(PlaceholderStyle::Dollar),
            "question_numbered" | "qmark_numbered" => Some(PlaceholderStyle::QuestionNumbered),
            "question" | "qmark" => Some(PlaceholderStyle::Question),
            "values" => Some(PlaceholderStyle::Values),
            _ => None,
        }
    }
}

/// When identifiers are quoted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotePolicy {
    /// Exactly as stored in the tree
    #[default]
    AsIs,
    /// Only identifiers that are keywords or not plain words
    WhenNeeded,
    /// Every identifier
    Always,
}

/// SQL rendering options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub placeholder_style: PlaceholderStyle,
    pub quote_policy: QuotePolicy,
    pub quote_char: char,
    /// Start each clause on its own line
    pub pretty: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            placeholder_style: PlaceholderStyle::default(),
            quote_policy: QuotePolicy::default(),
            quote_char: '"',
            pretty: false,
        }
    }
}

impl RenderOptions {
    pub fn placeholder_style(mut self, style: PlaceholderStyle) -> Self {
        self.placeholder_style = style;
        self
    }

    pub fn quote_policy(mut self, policy: QuotePolicy) -> Self {
        self.quote_policy = policy;
        self
    }

    pub fn quote_char(mut self, quote: char) -> Self {
        self.quote_char = quote;
        self
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}
