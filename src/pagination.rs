use serde::Serialize;

/// One page of a sorted collection.
///
/// `page` and `size` echo what the caller asked for, even when they were
/// clamped for slicing or point past the end of the collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
  pub page: i64,
  pub size: i64,
  pub total: usize,
  pub items: Vec<T>,
}

impl<T> Page<T> {
  pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
    Page {
      page: self.page,
      size: self.size,
      total: self.total,
      items: self.items.into_iter().map(f).collect(),
    }
  }
}

/// Slice `items` into the zero-based page `page` of `size` items.
///
/// Negative pages are read as page 0 and sizes below 1 as 1. Out-of-range
/// pages come back empty with the real `total`.
pub fn paginate<T>(items: Vec<T>, page: i64, size: i64) -> Page<T> {
  let total = items.len();

  let valid_page = usize::try_from(page.max(0)).unwrap_or(usize::MAX);
  let valid_size = usize::try_from(size.max(1)).unwrap_or(usize::MAX);
  let from = valid_page.saturating_mul(valid_size);

  let items = if from >= total {
    Vec::new()
  } else {
    let to = from.saturating_add(valid_size).min(total);
    items.into_iter().skip(from).take(to - from).collect()
  };

  Page {
    page,
    size,
    total,
    items,
  }
}
