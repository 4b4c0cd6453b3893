// Statement classifier
// This module decides whether a raw query string may reach the store at all
// Only two kinds of statement are allowed through: reads and pragma introspection

use crate::error::{GateError, Result};
use serde::{Deserialize, Serialize};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Token, Tokenizer};

/// The kinds of statement the store is allowed to see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryClass {
    /// Anything containing SELECT
    ReadSelect,
    /// PRAGMA table_info(...) and friends
    PragmaIntrospection,
}

/// How strictly query text is classified
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationMode {
    /// Case-sensitive substring match: `SELECT` first, then `PRAGMA`
    ///
    /// This is the historical behaviour. It is easy to fool: a `DELETE` with a
    /// `SELECT` sub-clause is classified as a read, so the store handle should
    /// be opened read-only when this mode is used.
    #[default]
    Substring,
    /// Tokenize with the SQLite dialect and require the first keyword to be
    /// `SELECT` or `PRAGMA` (any case), with at most one statement
    Strict,
}

/// The statement classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryClassifier {
    mode: ClassificationMode,
}

impl QueryClassifier {
    pub fn new(mode: ClassificationMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ClassificationMode {
        self.mode
    }

    /// Classify a query string
    /// Fails with `UnsupportedQuery` for anything that must not reach the store
    pub fn classify(&self, sql: &str) -> Result<QueryClass> {
        match self.mode {
            ClassificationMode::Substring => Self::classify_substring(sql),
            ClassificationMode::Strict => Self::classify_strict(sql),
        }
    }

    fn classify_substring(sql: &str) -> Result<QueryClass> {
        // Precedence matters: a PRAGMA that mentions SELECT is still a read-select
        if sql.contains("SELECT") {
            Ok(QueryClass::ReadSelect)
        } else if sql.contains("PRAGMA") {
            Ok(QueryClass::PragmaIntrospection)
        } else {
            Err(GateError::UnsupportedQuery)
        }
    }

    fn classify_strict(sql: &str) -> Result<QueryClass> {
        let dialect = SQLiteDialect {};
        let tokens = Tokenizer::new(&dialect, sql)
            .tokenize()
            .map_err(|_| GateError::UnsupportedQuery)?;

        // Whitespace and comments carry no meaning here
        let mut significant = tokens
            .iter()
            .filter(|token| !matches!(token, Token::Whitespace(_)));

        let class = match significant.next() {
            Some(Token::Word(word)) if word.quote_style.is_none() => match word.keyword {
                Keyword::SELECT => QueryClass::ReadSelect,
                Keyword::PRAGMA => QueryClass::PragmaIntrospection,
                _ => return Err(GateError::UnsupportedQuery),
            },
            _ => return Err(GateError::UnsupportedQuery),
        };

        // A trailing semicolon is fine, a second statement is not
        let mut seen_semicolon = false;
        for token in significant {
            match token {
                Token::SemiColon => seen_semicolon = true,
                _ if seen_semicolon => return Err(GateError::UnsupportedQuery),
                _ => {}
            }
        }

        Ok(class)
    }
}
