use chrono::{DateTime, Utc};
use gqlient::{Cursor, JsonMap, Page, Paginator, Query, Singleton, Variable};
use indoc::indoc;
use serde::Deserialize;
use std::fmt::{self, Write};
use std::num::NonZeroUsize;

/// A [`Paginator`] for retrieving the issues and pull requests matching a
/// GitHub search filter as pages of [`SearchNode`] values
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct SearchIssues {
    /// The search filter, e.g. `is:public author:octocat`
    filter: String,

    /// How many results to request per page
    page_size: NonZeroUsize,
}

impl SearchIssues {
    pub(crate) fn new(filter: String, page_size: NonZeroUsize) -> SearchIssues {
        SearchIssues { filter, page_size }
    }
}

impl Paginator for SearchIssues {
    type Item = SearchNode;
    type Query = SearchIssuesQuery;

    fn for_cursor(&self, cursor: Option<&Cursor>) -> SearchIssuesQuery {
        SearchIssuesQuery {
            filter: self.filter.clone(),
            cursor: cursor.cloned(),
            page_size: self.page_size,
        }
    }
}

/// A [`Query`] for retrieving one page of search results (as [`SearchNode`]
/// values) starting after a given cursor
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct SearchIssuesQuery {
    /// The search filter
    filter: String,

    /// The pagination cursor after which to retrieve results; `None` for the
    /// first page
    cursor: Option<Cursor>,

    /// How many results to request per page
    page_size: NonZeroUsize,
}

impl Query for SearchIssuesQuery {
    type Output = Page<SearchNode>;

    fn write_graphql<W: Write>(&self, mut s: W) -> fmt::Result {
        write!(
            s,
            indoc! {"
            search(query: $query, type: ISSUE, first: {page_size}, after: $cursor) {{
                issueCount
                pageInfo {{
                    endCursor
                    hasNextPage
                }}
                edges {{
                    node {{
                        ... on Issue {{
                            number
                            title
                            url
                            createdAt
                            repository {{
                                name
                                owner {{
                                    login
                                }}
                            }}
                        }}
                        ... on PullRequest {{
                            number
                            title
                            url
                            createdAt
                            merged
                            repository {{
                                name
                                owner {{
                                    login
                                }}
                            }}
                        }}
                    }}
                }}
            }}
        "},
            page_size = self.page_size,
        )
    }

    fn variables(&self) -> [(String, Variable); 2] {
        [
            (
                String::from("query"),
                Variable {
                    gql_type: String::from("String!"),
                    value: self.filter.clone().into(),
                },
            ),
            (
                String::from("cursor"),
                Variable {
                    gql_type: String::from("String"),
                    value: self.cursor.clone().into(),
                },
            ),
        ]
    }

    fn parse_response(&self, data: JsonMap) -> Result<Page<SearchNode>, serde_json::Error> {
        let Singleton(SearchResults { issue_count, page }) =
            serde_json::from_value::<Singleton<SearchResults>>(serde_json::Value::Object(data))?;
        tracing::debug!(
            issue_count,
            items = page.items.len(),
            has_next_page = page.has_next_page,
            end_cursor = page.end_cursor.as_ref().map(Cursor::as_str),
            "Received page of search results"
        );
        Ok(page)
    }
}

/// The `search` object of a response
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
struct SearchResults {
    /// Total number of matches across all pages
    issue_count: u64,

    #[serde(flatten)]
    page: Page<SearchNode>,
}

/// An issue or pull request returned by a search
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchNode {
    /// The issue or PR number within its repository
    pub(crate) number: u64,

    pub(crate) title: String,

    /// The HTTP URL to the web view for the item; PR URLs contain `/pull/`,
    /// issue URLs contain `/issues/`
    pub(crate) url: String,

    pub(crate) repository: Repository,

    pub(crate) created_at: DateTime<Utc>,

    /// Whether the pull request has been merged; always `false` for issues
    #[serde(default)]
    pub(crate) merged: bool,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub(crate) struct Repository {
    pub(crate) name: String,
    pub(crate) owner: RepositoryOwner,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub(crate) struct RepositoryOwner {
    pub(crate) login: String,
}
