/**
 * search.rs
 * Filters, ordering, pagination and language selection for class searches
 */

use oxigraph::model::{Literal, Term};

use crate::errors::{MappingError, Result};
use crate::query::builder::ClassQueryBuilder;
use crate::query::pattern::WhereClause;
use crate::schema::PropertyMapping;
use crate::vocab;

/// Restriction on the instances a search returns, expressed on mapped fields.
///
/// A filter on a list field keeps instances with at least one matching value;
/// the instance is still loaded with all of its values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFilter {
    Equals { field: String, value: Term },
    In { field: String, values: Vec<Term> },
    /// Case-insensitive regex on the lexical form
    Regex { field: String, pattern: String },
    /// Raw SPARQL expression; fields are bound to `?<field>`
    Expression(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

/// Search parameters shared by select and count.
///
/// `limit` and `offset` page the instances, not the solution rows, so a page
/// always holds whole instances.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub filters: Vec<SearchFilter>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub lang: Option<String>,
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: SearchFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn equals(self, field: &str, value: impl Into<Term>) -> Self {
        self.filter(SearchFilter::Equals {
            field: field.to_string(),
            value: value.into(),
        })
    }

    pub fn one_of(self, field: &str, values: Vec<Term>) -> Self {
        self.filter(SearchFilter::In {
            field: field.to_string(),
            values,
        })
    }

    pub fn regex(self, field: &str, pattern: &str) -> Self {
        self.filter(SearchFilter::Regex {
            field: field.to_string(),
            pattern: pattern.to_string(),
        })
    }

    pub fn order_by(mut self, field: &str, descending: bool) -> Self {
        self.order_by.push(OrderBy {
            field: field.to_string(),
            descending,
        });
        self
    }

    pub fn asc(self, field: &str) -> Self {
        self.order_by(field, false)
    }

    pub fn desc(self, field: &str) -> Self {
        self.order_by(field, true)
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Zero-based page of `page_size` instances.
    pub fn page(self, page: usize, page_size: usize) -> Self {
        self.limit(page_size).offset(page * page_size)
    }

    /// Keeps string values tagged with `lang` (or untagged ones).
    pub fn lang(mut self, lang: &str) -> Self {
        self.lang = Some(lang.to_string());
        self
    }

    pub fn is_paged(&self) -> bool {
        self.limit.is_some() || self.offset.is_some()
    }

    /// Filters or paging need the instance set selected before values are loaded.
    pub(crate) fn needs_subquery(&self) -> bool {
        self.is_paged() || !self.filters.is_empty()
    }
}

/// One page of a search with the total over all pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        match self.limit {
            Some(limit) => self.offset + limit < self.total,
            None => false,
        }
    }
}

fn is_text_datatype(property: &PropertyMapping) -> bool {
    matches!(
        property.datatype().map(|d| d.as_str()),
        Some(vocab::XSD_STRING) | Some(vocab::RDF_LANG_STRING)
    )
}

pub(crate) fn lang_expression(variable: &str, lang: &str) -> String {
    format!(
        "lang(?{v}) = \"\" || langMatches(lang(?{v}), {tag})",
        v = variable,
        tag = Literal::new_simple_literal(lang)
    )
}

impl<'a> ClassQueryBuilder<'a> {
    /// Language filter for `property`, when one applies.
    pub(super) fn lang_filter(&self, property: &PropertyMapping, lang: Option<&str>) -> Option<String> {
        match lang {
            Some(lang) if is_text_datatype(property) => Some(lang_expression(property.variable(), lang)),
            _ => None,
        }
    }

    fn field_variable(&self, field: &str) -> Result<String> {
        if field == self.schema().uri_field() {
            return Ok(field.to_string());
        }
        self.schema()
            .property(field)
            .map(|p| p.variable().to_string())
            .ok_or_else(|| MappingError::UnknownField(format!("{} has no field {}", self.schema().type_name(), field)))
    }

    fn filter_expression(&self, filter: &SearchFilter) -> Result<String> {
        Ok(match filter {
            SearchFilter::Equals { field, value } => format!("?{} = {}", self.field_variable(field)?, value),
            SearchFilter::In { field, values } => {
                let terms: Vec<String> = values.iter().map(Term::to_string).collect();
                format!("?{} IN ({})", self.field_variable(field)?, terms.join(", "))
            }
            SearchFilter::Regex { field, pattern } => format!(
                "regex(str(?{}), {}, \"i\")",
                self.field_variable(field)?,
                Literal::new_simple_literal(pattern.as_str())
            ),
            SearchFilter::Expression(expression) => expression.clone(),
        })
    }

    pub(super) fn apply_filters(&self, clause: &mut WhereClause, filters: &[SearchFilter]) -> Result<()> {
        for filter in filters {
            clause.filter(self.filter_expression(filter)?);
        }
        Ok(())
    }

    /// `ORDER BY` with the URI as last key; empty without any ordering.
    pub(super) fn order_text(&self, options: &SearchOptions, force: bool) -> Result<String> {
        if options.order_by.is_empty() && !force {
            return Ok(String::new());
        }

        let mut keys = Vec::new();
        for order in &options.order_by {
            if self.schema().property(&order.field).map_or(false, |p| p.list) {
                return Err(MappingError::InvalidFieldValue(format!(
                    "cannot order by list field {}",
                    order.field
                )));
            }
            let variable = self.field_variable(&order.field)?;
            keys.push(if order.descending {
                format!("DESC(?{})", variable)
            } else {
                format!("?{}", variable)
            });
        }
        keys.push(format!("?{}", self.schema().uri_field()));
        Ok(format!("\nORDER BY {}", keys.join(" ")))
    }

    pub(super) fn slice_text(options: &SearchOptions) -> String {
        let mut out = String::new();
        if let Some(limit) = options.limit {
            out.push_str(&format!("\nLIMIT {}", limit));
        }
        if let Some(offset) = options.offset.filter(|o| *o > 0) {
            out.push_str(&format!("\nOFFSET {}", offset));
        }
        out
    }
}
