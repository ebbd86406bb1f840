use std::cmp::Ordering;

use ahash::AHashMap;
use redeliver_common::MailStatus;
use serde::Deserialize;

/// Exact-match filter over status fields
///
/// Each entry maps a field name (see [`MailStatus::field`]) to the value it
/// must equal; all entries must match. An empty filter matches every record,
/// and a field missing from a record never matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct StatusFilter(AHashMap<String, String>);

impl StatusFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition on `field`
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl ToString) -> Self {
        self.0.insert(field.into(), value.to_string());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn matches(&self, status: &MailStatus) -> bool {
        self.0
            .iter()
            .all(|(field, expected)| status.field(field).is_some_and(|value| value == *expected))
    }
}

impl From<AHashMap<String, String>> for StatusFilter {
    fn from(conditions: AHashMap<String, String>) -> Self {
        Self(conditions)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StatusFilter {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Field a status query can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SortField {
    Timestamp,
    BatchId,
    MessageId,
    State,
}

impl SortField {
    fn compare(self, a: &MailStatus, b: &MailStatus) -> Ordering {
        match self {
            Self::Timestamp => a.timestamp.cmp(&b.timestamp),
            Self::BatchId => a.batch_id.cmp(&b.batch_id),
            Self::MessageId => a.message_id.cmp(&b.message_id),
            Self::State => a.state.cmp(&b.state),
        }
    }
}

/// Select one page of `records` (given in insertion order)
///
/// Records are filtered, then stably sorted by `sort` when given, then
/// reversed when `reverse` is set, and finally `offset`/`count` are applied.
pub(crate) fn select<'a>(
    records: impl IntoIterator<Item = &'a MailStatus>,
    filter: &StatusFilter,
    offset: usize,
    count: usize,
    sort: Option<SortField>,
    reverse: bool,
) -> Vec<MailStatus> {
    if count == 0 {
        return Vec::new();
    }

    let mut matched: Vec<&MailStatus> = records
        .into_iter()
        .filter(|status| filter.matches(status))
        .collect();

    if let Some(field) = sort {
        matched.sort_by(|a, b| field.compare(a, b));
    }

    if reverse {
        matched.reverse();
    }

    matched
        .into_iter()
        .skip(offset)
        .take(count)
        .cloned()
        .collect()
}
