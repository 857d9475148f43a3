use itertools::Itertools;
use url::form_urlencoded;

use crate::logic::query::query_value;

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_PER_PAGE: usize = 100;

/// A validated pagination window. Construction coerces invalid input to the
/// defaults, so a window is always usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: usize,
    pub per_page: usize,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageWindow {
    /// Coerce raw pagination numbers: `page < 1` becomes 1,
    /// `per_page < 1` becomes 100.
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: if page < 1 { DEFAULT_PAGE } else { page as usize },
            per_page: if per_page < 1 {
                DEFAULT_PER_PAGE
            } else {
                per_page as usize
            },
        }
    }

    /// Read `page`/`per_page` from query pairs; unparsable values fall back
    /// to the defaults.
    pub fn from_query(pairs: &[(String, String)]) -> Self {
        let page = query_value(pairs, "page")
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(DEFAULT_PAGE as i64);
        let per_page = query_value(pairs, "per_page")
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(DEFAULT_PER_PAGE as i64);
        Self::new(page, per_page)
    }

    /// Offset of the first row in the window.
    pub fn skip(&self) -> usize {
        (self.page - 1) * self.per_page
    }

    pub fn limit(&self) -> usize {
        self.per_page
    }

    /// Index of the last page for a collection of `total` rows; an empty
    /// collection still has page 1.
    pub fn last_page(&self, total: usize) -> usize {
        std::cmp::max(1, total.div_ceil(self.per_page))
    }
}

/// Slice a collection to the window. Out-of-range windows yield an empty
/// slice, never an error. Returns the slice plus the pre-slice total.
pub fn paginate<T>(items: Vec<T>, window: PageWindow) -> (Vec<T>, usize) {
    let total = items.len();
    let sliced = items
        .into_iter()
        .skip(window.skip())
        .take(window.limit())
        .collect();
    (sliced, total)
}

/// Build the HTTP `Link` header for a collection response.
///
/// Every link reproduces the original query with `page`/`per_page`
/// overridden in place (appended when absent). Relations are emitted in the
/// order `first, last, [prev], [next]`: `prev` only when
/// `1 < page <= last`, `next` only when `page < last`. Consumers rely on
/// this exact order and omission behavior.
pub fn build_link_header(
    base_url: &str,
    window: PageWindow,
    total: usize,
    query: &[(String, String)],
) -> String {
    let last = window.last_page(total);

    let url = |page: usize| {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        let mut saw_page = false;
        let mut saw_per_page = false;
        for (key, value) in query {
            match key.as_str() {
                "page" => {
                    serializer.append_pair("page", &page.to_string());
                    saw_page = true;
                }
                "per_page" => {
                    serializer.append_pair("per_page", &window.per_page.to_string());
                    saw_per_page = true;
                }
                _ => {
                    serializer.append_pair(key, value);
                }
            }
        }
        if !saw_page {
            serializer.append_pair("page", &page.to_string());
        }
        if !saw_per_page {
            serializer.append_pair("per_page", &window.per_page.to_string());
        }
        format!("<{}?{}>", base_url, serializer.finish())
    };

    let mut links = vec![
        format!("{}; rel=\"first\"", url(1)),
        format!("{}; rel=\"last\"", url(last)),
    ];
    if window.page > 1 && window.page <= last {
        links.push(format!("{}; rel=\"prev\"", url(window.page - 1)));
    }
    if window.page < last {
        links.push(format!("{}; rel=\"next\"", url(window.page + 1)));
    }
    links.into_iter().join(", ")
}
