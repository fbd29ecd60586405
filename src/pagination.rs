use crate::error::AppError;
use serde::Serialize;

/// Page envelope returned by the list endpoints
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Resolved 1-based page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    /// Missing or zero `page_size` falls back to the default; oversized requests are clamped.
    pub fn new(page: Option<u64>, page_size: Option<u64>, default_size: u32, max_size: u32) -> Self {
        let page_size = match page_size {
            Some(size) if size > 0 => size.min(max_size as u64),
            _ => default_size as u64,
        };
        Self {
            page: page.unwrap_or(1),
            page_size,
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page.saturating_sub(1)).saturating_mul(self.page_size)
    }

    pub fn page_count(&self, total: u64) -> u64 {
        if total == 0 {
            1
        } else {
            total.div_ceil(self.page_size)
        }
    }

    /// Page 1 always exists; any other page must fall within the results
    pub fn validate(&self, total: u64) -> Result<(), AppError> {
        if self.page == 0 || self.page > self.page_count(total) {
            return Err(AppError::InvalidPage);
        }
        Ok(())
    }

    pub fn into_page<T>(self, total: u64, results: Vec<T>, path: &str, query: Option<&str>) -> Page<T> {
        let next = (self.page < self.page_count(total))
            .then(|| page_link(path, query, Some(self.page + 1)));
        let previous = (self.page > 1).then(|| {
            let target = self.page - 1;
            page_link(path, query, (target > 1).then_some(target))
        });

        Page {
            count: total,
            next,
            previous,
            results,
        }
    }
}

/// Rebuild the request link with `page` replaced, or dropped for page 1
fn page_link(path: &str, query: Option<&str>, page: Option<u64>) -> String {
    let mut pairs: Vec<String> = query
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| pair.split('=').next() != Some("page"))
        .map(str::to_string)
        .collect();
    if let Some(page) = page {
        pairs.push(format!("page={}", page));
    }

    if pairs.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, pairs.join("&"))
    }
}
