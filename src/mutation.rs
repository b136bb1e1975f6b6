// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Invalidation request passed to [`crate::TableCache::on_mutate`].
//!
//! Hosts often hold a single tag or table, sometimes a list; the builders
//! accept either so the cache only ever sees two flat lists.

/// Anything that names a backing table: `&str`, `String`, or a host's own
/// table handle.
pub trait TableRef {
    fn table_name(&self) -> &str;
}

impl TableRef for str {
    fn table_name(&self) -> &str {
        self
    }
}

impl TableRef for String {
    fn table_name(&self) -> &str {
        self
    }
}

impl<T: TableRef + ?Sized> TableRef for &T {
    fn table_name(&self) -> &str {
        (**self).table_name()
    }
}

/// Tags and tables touched by a mutation.
///
/// ```
/// use table_cache::MutationOption;
///
/// let m = MutationOption::new().table("users").tags(["report-cache", "daily"]);
/// assert_eq!(m.tables, vec!["users"]);
/// assert_eq!(m.tags.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationOption {
    pub tags: Vec<String>,
    pub tables: Vec<String>,
}

impl MutationOption {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn table<T: TableRef + ?Sized>(mut self, table: &T) -> Self {
        self.tables.push(table.table_name().to_string());
        self
    }

    #[must_use]
    pub fn tables<I>(mut self, tables: I) -> Self
    where
        I: IntoIterator,
        I::Item: TableRef,
    {
        self.tables.extend(tables.into_iter().map(|t| t.table_name().to_string()));
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.tables.is_empty()
    }
}
