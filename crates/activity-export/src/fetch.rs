use crate::records::{IssueOrPrRecord, ReviewRecord};
use crate::search::{SearchIssues, SearchNode};
use gqlient::{Paginate, Transport};
use std::num::NonZeroUsize;

/// Fetch every page of results for `search` and flatten each result with
/// `flatten`, in page order.
///
/// A failed request or undecodable page ends pagination: the failure is
/// logged and the records gathered from earlier pages are returned.
pub(crate) fn fetch_all<T, F, R>(transport: &T, search: SearchIssues, mut flatten: F) -> Vec<R>
where
    T: Transport,
    F: FnMut(SearchNode) -> R,
{
    let mut records = Vec::new();
    for result in transport.run(Paginate::new(search)) {
        match result {
            Ok(node) => records.push(flatten(node)),
            Err(e) => {
                let e = anyhow::Error::new(e);
                tracing::warn!(
                    fetched = records.len(),
                    "Stopping pagination early; export will be incomplete: {e:#}"
                );
                break;
            }
        }
    }
    records
}

pub(crate) fn fetch_issues_and_prs<T: Transport>(
    transport: &T,
    filter: String,
    page_size: NonZeroUsize,
) -> Vec<IssueOrPrRecord> {
    fetch_all(
        transport,
        SearchIssues::new(filter, page_size),
        IssueOrPrRecord::from,
    )
}

pub(crate) fn fetch_reviews<T: Transport>(
    transport: &T,
    filter: String,
    page_size: NonZeroUsize,
) -> Vec<ReviewRecord> {
    fetch_all(
        transport,
        SearchIssues::new(filter, page_size),
        ReviewRecord::from,
    )
}
