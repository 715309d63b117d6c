//! Query engine: filtering, pagination and free-text search
//!
//! Every function here works on a published [`TableSnapshot`] and never
//! takes a table section. Results keep the snapshot's insertion order.

use chrono::NaiveDate;
use serde::Serialize;

use clinicdb_core::{Error, Result, Row, TableSchema};
use clinicdb_storage::TableSnapshot;

// ============================================================================
// Filter
// ============================================================================

/// Row selection shared by `get_all` and `export_selection`
///
/// All conditions are conjunctive: foreign-key equalities plus an optional
/// inclusive range on the table's date column. Either end of the range may
/// be left open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    references: Vec<(String, i64)>,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
}

impl Filter {
    /// Filter matching every row
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep rows whose foreign key `column` equals `id`
    pub fn reference(mut self, column: impl Into<String>, id: i64) -> Self {
        self.references.push((column.into(), id));
        self
    }

    /// Keep rows dated within `[start, end]`
    pub fn between(self, start: NaiveDate, end: NaiveDate) -> Self {
        self.since(start).until(end)
    }

    /// Keep rows dated on or after `start`
    pub fn since(mut self, start: NaiveDate) -> Self {
        self.date_from = Some(start);
        self
    }

    /// Keep rows dated on or before `end`
    pub fn until(mut self, end: NaiveDate) -> Self {
        self.date_to = Some(end);
        self
    }

    /// Whether the filter selects every row
    pub fn is_empty(&self) -> bool {
        self.references.is_empty() && self.date_from.is_none() && self.date_to.is_none()
    }

    /// Foreign-key equalities
    pub fn references(&self) -> &[(String, i64)] {
        &self.references
    }

    /// Inclusive date bounds
    pub fn date_range(&self) -> (Option<NaiveDate>, Option<NaiveDate>) {
        (self.date_from, self.date_to)
    }

    /// Check the filter against a table schema
    ///
    /// # Errors
    ///
    /// `Validation` for a reference on a column that is not a foreign key,
    /// a date bound on a table without a date column, or a range whose
    /// start is after its end.
    pub fn validate(&self, schema: &TableSchema) -> Result<()> {
        for (column, _) in &self.references {
            if schema.foreign_key(column).is_none() {
                return Err(Error::validation(format!(
                    "{}.{} is not a foreign key",
                    schema.table, column
                )));
            }
        }
        if (self.date_from.is_some() || self.date_to.is_some()) && schema.date_column.is_none() {
            return Err(Error::validation(format!(
                "{} has no date column to filter on",
                schema.table
            )));
        }
        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(Error::validation(format!(
                    "date range start {} is after end {}",
                    from, to
                )));
            }
        }
        Ok(())
    }

    fn matches(&self, schema: &TableSchema, row: &Row) -> bool {
        let references_match = self
            .references
            .iter()
            .all(|(column, id)| row.get(column).as_int() == Some(*id));
        if !references_match {
            return false;
        }
        let Some(date_column) = schema.date_column else {
            return true;
        };
        if self.date_from.is_none() && self.date_to.is_none() {
            return true;
        }
        match row.get(date_column).as_date() {
            Some(date) => {
                self.date_from.map_or(true, |from| date >= from)
                    && self.date_to.map_or(true, |to| date <= to)
            }
            None => false,
        }
    }
}

/// Rows of `snapshot` selected by `filter`, in insertion order
pub fn filter_rows<'a>(snapshot: &'a TableSnapshot, filter: &Filter) -> Result<Vec<&'a Row>> {
    let schema = snapshot.schema();
    filter.validate(schema)?;
    if filter.is_empty() {
        return Ok(snapshot.iter().collect());
    }
    Ok(snapshot
        .iter()
        .filter(|row| filter.matches(schema, row))
        .collect())
}

// ============================================================================
// Pagination
// ============================================================================

/// Pagination metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    /// Rows matching the filter, across all pages
    pub total: usize,
    /// 1-based page number
    pub page: usize,
    /// Page size
    pub limit: usize,
    /// `ceil(total / limit)`
    pub total_pages: usize,
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Rows on this page
    pub items: Vec<T>,
    /// Pagination metadata
    #[serde(flatten)]
    pub info: PageInfo,
}

impl<T> Page<T> {
    /// Convert every item, keeping the metadata
    pub fn try_map<U, F>(self, f: F) -> Result<Page<U>>
    where
        F: FnMut(T) -> Result<U>,
    {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<Result<_>>()?,
            info: self.info,
        })
    }
}

/// Slice `items` to the 1-based `page` of size `limit`
///
/// A page past the end is empty and still reports the full total.
///
/// # Errors
///
/// `Validation` if `page` or `limit` is below 1.
pub fn paginate<T>(items: Vec<T>, page: usize, limit: usize) -> Result<Page<T>> {
    if page < 1 {
        return Err(Error::validation("page must be >= 1"));
    }
    if limit < 1 {
        return Err(Error::validation("limit must be >= 1"));
    }
    let total = items.len();
    let total_pages = total / limit + usize::from(total % limit != 0);
    let start = (page - 1).saturating_mul(limit);
    let items = if start >= total {
        Vec::new()
    } else {
        items.into_iter().skip(start).take(limit).collect()
    };
    Ok(Page {
        items,
        info: PageInfo {
            total,
            page,
            limit,
            total_pages,
        },
    })
}

// ============================================================================
// Search
// ============================================================================

/// Case-insensitive substring search over the table's search columns
///
/// Returns at most `limit` matches in insertion order. An empty (or
/// whitespace-only) query matches every row.
///
/// # Errors
///
/// `Validation` if `limit` is below 1 or the table has no search columns.
pub fn search_rows<'a>(snapshot: &'a TableSnapshot, query: &str, limit: usize) -> Result<Vec<&'a Row>> {
    let schema = snapshot.schema();
    if limit < 1 {
        return Err(Error::validation("limit must be >= 1"));
    }
    if schema.search_columns.is_empty() {
        return Err(Error::validation(format!(
            "{} does not support search",
            schema.table
        )));
    }
    let needle = query.trim().to_lowercase();
    Ok(snapshot
        .iter()
        .filter(|row| {
            needle.is_empty()
                || schema.search_columns.iter().any(|column| {
                    row.get(column)
                        .as_text()
                        .map(|text| text.to_lowercase().contains(&needle))
                        .unwrap_or(false)
                })
        })
        .take(limit)
        .collect())
}
