//! Paginated, sorted and filtered searches.
//!
//! [`SearchOptions`] collects everything a caller may ask of a search in one value.
//! Repositories turn it into a backend [`Query`] plus a separate count, and answer with a
//! [`SearchResult`].

use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    config::StoreConfig,
    document::Record,
    page::{Page, PaginationParams},
    query::{Expr, Query, Sort},
};

/// Options of a repository search.
///
/// Deserializes from the usual request shape, where `sort` is a string such as
/// `"-created_at name"`:
///
/// ```ignore
/// let options: SearchOptions = serde_json::from_str(r#"{"sort": "-age", "page": 2}"#)?;
/// ```
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SearchOptions {
    /// Sort keys, applied in order.
    #[serde(deserialize_with = "deserialize_sort")]
    pub sort: Vec<Sort>,
    /// Requested page (1-indexed). Unset or zero means the first page.
    pub page: Option<i64>,
    /// Requested page size. Unset or non-positive means the configured default.
    pub limit: Option<i64>,
    /// Relation paths to expand on every returned document.
    pub expand: Vec<String>,
    /// Return the bare documents without the page envelope.
    pub list_only: bool,
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort(mut self, sort: impl IntoIterator<Item = Sort>) -> Self {
        self.sort = sort.into_iter().collect();
        self
    }

    /// Sets the sort keys from a `"-field other"` string.
    pub fn sort_by(self, spec: &str) -> Self {
        self.sort(Sort::parse(spec))
    }

    pub fn page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn expand(mut self, paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.expand = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn list_only(mut self, list_only: bool) -> Self {
        self.list_only = list_only;
        self
    }

    /// Normalized page and page size.
    pub fn pagination(&self, config: &StoreConfig) -> PaginationParams {
        PaginationParams::from_raw(self.page, self.limit, config.default_limit)
    }

    /// Backend query for the requested page. Collation only applies when sorting.
    pub fn to_query(&self, filter: Option<Expr>, config: &StoreConfig) -> Query {
        let params = self.pagination(config);

        let mut builder = Query::builder()
            .maybe_filter(filter)
            .sorts(self.sort.iter().cloned())
            .limit(usize::try_from(params.limit).unwrap_or(usize::MAX))
            .offset(usize::try_from(params.offset()).unwrap_or(usize::MAX));

        if !self.sort.is_empty() {
            builder = builder.collation(config.collation.clone());
        }

        builder.build()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSort {
    Spec(String),
    Keys(Vec<Sort>),
}

fn deserialize_sort<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Sort>, D::Error> {
    Ok(match Option::<RawSort>::deserialize(deserializer)? {
        Some(RawSort::Spec(spec)) => Sort::parse(&spec),
        Some(RawSort::Keys(keys)) => keys,
        None => Vec::new(),
    })
}

/// Result of a repository search.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum SearchResult<T = Record> {
    Page(Page<T>),
    List(Vec<T>),
}

impl<T> SearchResult<T> {
    /// The returned documents.
    pub fn data(&self) -> &[T] {
        match self {
            SearchResult::Page(page) => &page.data,
            SearchResult::List(data) => data,
        }
    }

    pub fn into_data(self) -> Vec<T> {
        match self {
            SearchResult::Page(page) => page.data,
            SearchResult::List(data) => data,
        }
    }

    pub fn as_page(&self) -> Option<&Page<T>> {
        match self {
            SearchResult::Page(page) => Some(page),
            SearchResult::List(_) => None,
        }
    }

    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<SearchResult<U>, E> {
        match self {
            SearchResult::Page(page) => {
                let Page { page, limit, count, pages, data } = page;
                Ok(SearchResult::Page(Page {
                    page,
                    limit,
                    count,
                    pages,
                    data: data.into_iter().map(f).collect::<Result<_, _>>()?,
                }))
            }
            SearchResult::List(data) => Ok(SearchResult::List(
                data.into_iter().map(f).collect::<Result<_, _>>()?,
            )),
        }
    }
}
