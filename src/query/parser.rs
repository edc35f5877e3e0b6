use crate::core::ParseError;
use crate::query::element::QueryElement;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// Empty query string: select everything.
    None,
    Range,
    Nearest,
    Exact,
}

impl QueryKind {
    pub const fn name(self) -> &'static str {
        match self {
            QueryKind::None => "empty",
            QueryKind::Range => "range",
            QueryKind::Nearest => "nearest",
            QueryKind::Exact => "exact",
        }
    }
}

/// Separator character sets and keywords recognised by [`QueryParser`].
///
/// Separators are sets: any character in the string splits. Empty tokens
/// between adjacent separators are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    pub field_separators: String,
    pub range_separators: String,
    pub range_keyword: String,
    pub nearest_keyword: String,
    pub exact_keyword: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            field_separators: ",".to_string(),
            range_separators: ":".to_string(),
            range_keyword: "range".to_string(),
            nearest_keyword: "nearest".to_string(),
            exact_keyword: "at".to_string(),
        }
    }
}

/// A fully validated query: the operation tag and its elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    kind: QueryKind,
    elements: Vec<QueryElement>,
}

impl Query {
    /// Parses with the default configuration.
    pub fn parse(query: &str, ndims: usize) -> Result<Self, ParseError> {
        QueryParser::new(ndims).parse(query)
    }

    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    pub fn elements(&self) -> &[QueryElement] {
        &self.elements
    }

    pub fn element(&self, index: usize) -> Result<&QueryElement, ParseError> {
        self.elements.get(index).ok_or(ParseError::ElementIndex {
            index,
            len: self.elements.len(),
        })
    }

    /// Number of elements that carry coordinates (excludes the nearest count).
    pub fn num_coordinates(&self) -> usize {
        match self.kind {
            QueryKind::Nearest => self.elements.len().saturating_sub(1),
            _ => self.elements.len(),
        }
    }

    /// The `k` of a nearest query, taken from the trailing element.
    pub fn neighbor_count(&self) -> Result<usize, ParseError> {
        let index = self.elements.len().checked_sub(1).ok_or(ParseError::ElementIndex {
            index: 0,
            len: 0,
        })?;
        let elem = &self.elements[index];
        if elem.num_values() != 1 {
            return Err(ParseError::ValueCount {
                element: index,
                expected: 1,
                actual: elem.num_values(),
            });
        }
        if elem.is_value_empty(0)? {
            return Err(ParseError::MissingNeighborCount);
        }
        elem.value_as::<usize>(0)
    }
}

/// Turns query strings into [`Query`] values for a space of `ndims` axes.
#[derive(Debug, Clone)]
pub struct QueryParser {
    config: QueryConfig,
    ndims: usize,
}

impl QueryParser {
    pub fn new(ndims: usize) -> Self {
        Self::with_config(ndims, QueryConfig::default())
    }

    pub fn with_config(ndims: usize, config: QueryConfig) -> Self {
        Self { config, ndims }
    }

    pub fn ndims(&self) -> usize {
        self.ndims
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn parse(&self, query: &str) -> Result<Query, ParseError> {
        if query.is_empty() {
            return Ok(Query {
                kind: QueryKind::None,
                elements: Vec::new(),
            });
        }

        let tokens = split_any(query, &self.config.field_separators);
        let keyword = tokens[0];

        if keyword == self.config.range_keyword {
            self.check_arity(QueryKind::Range, self.ndims + 1, tokens.len())?;
            let mut elements = Vec::with_capacity(self.ndims);
            for (index, token) in tokens[1..].iter().enumerate() {
                let values: Vec<String> = split_any(token, &self.config.range_separators)
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                if values.len() != 2 {
                    return Err(ParseError::ValueCount {
                        element: index,
                        expected: 2,
                        actual: values.len(),
                    });
                }
                elements.push(QueryElement::new(values));
            }
            Ok(Query {
                kind: QueryKind::Range,
                elements,
            })
        } else if keyword == self.config.nearest_keyword {
            self.check_arity(QueryKind::Nearest, self.ndims + 2, tokens.len())?;
            if tokens[tokens.len() - 1].is_empty() {
                return Err(ParseError::MissingNeighborCount);
            }
            Ok(Query {
                kind: QueryKind::Nearest,
                elements: point_elements(&tokens[1..]),
            })
        } else if keyword == self.config.exact_keyword {
            self.check_arity(QueryKind::Exact, self.ndims + 1, tokens.len())?;
            Ok(Query {
                kind: QueryKind::Exact,
                elements: point_elements(&tokens[1..]),
            })
        } else {
            Err(ParseError::UnknownQuery(keyword.to_string()))
        }
    }

    fn check_arity(&self, kind: QueryKind, expected: usize, actual: usize) -> Result<(), ParseError> {
        if expected != actual {
            return Err(ParseError::TokenCount {
                kind: kind.name(),
                expected,
                actual,
            });
        }
        Ok(())
    }
}

fn point_elements(tokens: &[&str]) -> Vec<QueryElement> {
    tokens.iter().map(|token| QueryElement::single(token)).collect()
}

fn split_any<'a>(value: &'a str, separators: &str) -> Vec<&'a str> {
    value.split(|c: char| separators.contains(c)).collect()
}
