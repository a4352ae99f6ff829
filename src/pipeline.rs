//! List Pipeline
//!
//! Pure client-side projection of a collection: text filter, then stable
//! sort, then fixed-size pagination. It is re-evaluated on every render and
//! never caches.

use crate::resource::Item;
use serde::Deserialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::ops::Range;

/// Field to sort by
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SortKey {
    /// The resource's natural order ([`DefaultOrder`])
    #[default]
    Default,
    Field(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Self::Ascending => "▲",
            Self::Descending => "▼",
        }
    }
}

/// Natural ordering used by [`SortKey::Default`]
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DefaultOrder {
    /// Order the server returned, with local appends at the end
    #[default]
    Insertion,
    /// Boolean field, `false` first (incomplete tasks before completed ones)
    Flag { field: String },
}

/// Inputs to [`project`]
#[derive(Debug, Clone)]
pub struct Query<'a> {
    pub display_field: &'a str,
    pub filter_text: &'a str,
    pub sort_key: &'a SortKey,
    pub sort_direction: SortDirection,
    pub default_order: &'a DefaultOrder,
    /// 1-based; the caller keeps it in range
    pub page: usize,
    pub page_size: usize,
}

/// Result of [`project`]
#[derive(Debug, Clone)]
pub struct Projection<'a> {
    /// Items on the requested page, in display order
    pub items: Vec<&'a Item>,
    /// Number of items that passed the filter
    pub total_matches: usize,
    pub total_pages: usize,
}

/// Run filter → sort → paginate over `items`
pub fn project<'a>(items: &'a [Item], query: &Query<'_>) -> Projection<'a> {
    let mut matched = filter_items(items, query.display_field, query.filter_text);
    sort_items(
        &mut matched,
        query.sort_key,
        query.sort_direction,
        query.default_order,
    );

    let total_matches = matched.len();
    let range = page_range(total_matches, query.page, query.page_size);
    let page_items = matched[range].to_vec();

    Projection {
        items: page_items,
        total_matches,
        total_pages: total_pages(total_matches, query.page_size),
    }
}

/// Case-insensitive substring match on the display field; empty matches all
pub fn filter_items<'a, I>(items: I, display_field: &str, filter_text: &str) -> Vec<&'a Item>
where
    I: IntoIterator<Item = &'a Item>,
{
    if filter_text.is_empty() {
        return items.into_iter().collect();
    }

    let needle = filter_text.to_lowercase();
    items
        .into_iter()
        .filter(|item| {
            item.field(display_field)
                .and_then(Value::as_str)
                .map(|title| title.to_lowercase().contains(&needle))
                .unwrap_or(false)
        })
        .collect()
}

/// Stable sort in place
pub fn sort_items(
    items: &mut [&Item],
    key: &SortKey,
    direction: SortDirection,
    default_order: &DefaultOrder,
) {
    let field = match (key, default_order) {
        (SortKey::Field(field), _) => Some(field.as_str()),
        (SortKey::Default, DefaultOrder::Flag { field }) => Some(field.as_str()),
        (SortKey::Default, DefaultOrder::Insertion) => None,
    };

    match field {
        Some(field) => items.sort_by(|a, b| {
            let cmp = compare_values(a.field(field), b.field(field));
            match direction {
                SortDirection::Ascending => cmp,
                SortDirection::Descending => cmp.reverse(),
            }
        }),
        None => {
            if direction == SortDirection::Descending {
                items.reverse();
            }
        }
    }
}

/// Ordering used for sort keys: missing/null first, then false < true,
/// numbers numerically, strings with [`locale_compare`]. Mixed types fall
/// back to comparing their display strings.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => locale_compare(x, y),
        (Some(x), Some(y)) => locale_compare(&x.to_string(), &y.to_string()),
    }
}

/// Approximates `localeCompare`: case-insensitive first, then lowercase
/// before uppercase for strings that differ only by case
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));

    folded.then_with(|| {
        a.chars()
            .zip(b.chars())
            .find(|(x, y)| x != y)
            .map(|(x, y)| match (x.is_lowercase(), y.is_lowercase()) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => x.cmp(&y),
            })
            .unwrap_or(Ordering::Equal)
    })
}

/// `ceil(len / page_size)`, never less than 1
pub fn total_pages(len: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    len.div_ceil(page_size).max(1)
}

/// Index range of `page` (1-based), clipped to `len`. Out-of-range pages
/// give an empty range.
pub fn page_range(len: usize, page: usize, page_size: usize) -> Range<usize> {
    let page_size = page_size.max(1);
    let start = page.saturating_sub(1).saturating_mul(page_size).min(len);
    let end = page.saturating_mul(page_size).min(len);
    start..end.max(start)
}
