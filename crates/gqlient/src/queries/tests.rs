use super::*;
use crate::{QueryError, Singleton, Transport};
use assert_matches::assert_matches;
use indoc::indoc;
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;

#[derive(Clone, Debug, Eq, PartialEq)]
struct GetStars {
    login: String,
}

impl Paginator for GetStars {
    type Item = String;
    type Query = GetStarsQuery;

    fn for_cursor(&self, cursor: Option<&Cursor>) -> GetStarsQuery {
        GetStarsQuery {
            login: self.login.clone(),
            cursor: cursor.cloned(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct GetStarsQuery {
    login: String,
    cursor: Option<Cursor>,
}

impl Query for GetStarsQuery {
    type Output = Page<String>;

    fn write_graphql<W: Write>(&self, mut s: W) -> fmt::Result {
        write!(
            s,
            indoc! {"
            user(login: $login) {{
                starredRepositories(first: 2, after: $cursor) {{
                    edges {{
                        node {{
                            nameWithOwner
                        }}
                    }}
                    pageInfo {{
                        endCursor
                        hasNextPage
                    }}
                }}
            }}
        "}
        )
    }

    fn variables(&self) -> [(String, Variable); 2] {
        [
            (
                String::from("login"),
                Variable {
                    gql_type: String::from("String!"),
                    value: self.login.clone().into(),
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

    fn parse_response(&self, data: JsonMap) -> Result<Page<String>, serde_json::Error> {
        let Singleton(Singleton(page)) = serde_json::from_value::<
            Singleton<Singleton<Page<Singleton<String>>>>,
        >(serde_json::Value::Object(data))?;
        Ok(Page {
            items: page.items.into_iter().map(|s| s.0).collect(),
            end_cursor: page.end_cursor,
            has_next_page: page.has_next_page,
        })
    }
}

fn stars_page(names: &[&str], end_cursor: Option<&str>, has_next_page: bool) -> JsonMap {
    let edges = names
        .iter()
        .map(|name| serde_json::json!({"node": {"nameWithOwner": name}}))
        .collect::<Vec<_>>();
    serde_json::from_value(serde_json::json!({
        "user": {
            "starredRepositories": {
                "edges": edges,
                "pageInfo": {
                    "endCursor": end_cursor,
                    "hasNextPage": has_next_page,
                }
            }
        }
    }))
    .unwrap()
}

fn machine() -> Paginate<GetStars> {
    Paginate::new(GetStars {
        login: String::from("octocat"),
    })
}

#[test]
fn first_query() {
    let mut machine = machine();
    let payload = machine.get_next_query().unwrap();
    assert_eq!(
        payload.query,
        indoc! {"
        query ($login: String!, $cursor: String) {
            user(login: $login) {
                starredRepositories(first: 2, after: $cursor) {
                    edges {
                        node {
                            nameWithOwner
                        }
                    }
                    pageInfo {
                        endCursor
                        hasNextPage
                    }
                }
            }
        }
        "}
    );
    assert_eq!(
        payload.variables,
        JsonMap::from_iter([
            ("login".into(), "octocat".into()),
            ("cursor".into(), serde_json::Value::Null),
        ])
    );
    assert_eq!(machine.get_output(), Vec::<String>::new());
}

#[test]
fn single_page() {
    let mut machine = machine();
    assert!(machine.get_next_query().is_some());
    assert!(
        machine
            .handle_response(stars_page(&["rust-lang/rust", "tokio-rs/tokio"], Some("c1"), false))
            .is_ok()
    );
    assert_eq!(
        machine.get_output(),
        vec![String::from("rust-lang/rust"), String::from("tokio-rs/tokio")]
    );
    assert_eq!(machine.get_next_query(), None);
    assert!(machine.done);
    assert_eq!(machine.pages, 1);
}

#[test]
fn follows_cursor_through_terminal_page() {
    let mut machine = machine();
    assert!(machine.get_next_query().is_some());
    machine
        .handle_response(stars_page(&["a/one", "a/two"], Some("c1"), true))
        .unwrap();
    let payload = machine.get_next_query().unwrap();
    assert_eq!(payload.variables.get("cursor"), Some(&serde_json::Value::from("c1")));
    machine
        .handle_response(stars_page(&["b/three", "b/four"], Some("c2"), true))
        .unwrap();
    let payload = machine.get_next_query().unwrap();
    assert_eq!(payload.variables.get("cursor"), Some(&serde_json::Value::from("c2")));
    machine
        .handle_response(stars_page(&["c/five"], Some("c3"), false))
        .unwrap();
    assert_eq!(machine.get_next_query(), None);
    assert_eq!(
        machine.get_output(),
        ["a/one", "a/two", "b/three", "b/four", "c/five"]
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>()
    );
    assert_eq!(machine.pages, 3);
}

#[test]
fn next_page_without_cursor_stops() {
    let mut machine = machine();
    assert!(machine.get_next_query().is_some());
    machine
        .handle_response(stars_page(&[], None, true))
        .unwrap();
    assert_eq!(machine.get_next_query(), None);
    assert!(machine.done);
}

#[test]
fn undecodable_response_stops() {
    let mut machine = machine();
    assert!(machine.get_next_query().is_some());
    let r = machine.handle_response(JsonMap::from_iter([(
        "user".into(),
        serde_json::json!({"starredRepositories": 42}),
    )]));
    assert!(r.is_err());
    assert_eq!(machine.get_next_query(), None);
    assert_eq!(machine.get_output(), Vec::<String>::new());
}

#[derive(Debug)]
struct ScriptedTransport {
    responses: RefCell<VecDeque<Result<JsonMap, QueryError>>>,
    requests: RefCell<Vec<QueryPayload>>,
}

impl ScriptedTransport {
    fn new<I: IntoIterator<Item = Result<JsonMap, QueryError>>>(responses: I) -> Self {
        ScriptedTransport {
            responses: RefCell::new(responses.into_iter().collect()),
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl Transport for ScriptedTransport {
    fn query(&self, payload: QueryPayload) -> Result<JsonMap, QueryError> {
        self.requests.borrow_mut().push(payload);
        self.responses
            .borrow_mut()
            .pop_front()
            .expect("no more scripted responses")
    }
}

#[test]
fn run_yields_items_in_page_order() {
    let transport = ScriptedTransport::new([
        Ok(stars_page(&["a/one"], Some("c1"), true)),
        Ok(stars_page(&["b/two", "b/three"], Some("c2"), false)),
    ]);
    let items = transport
        .run(machine())
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(items, ["a/one", "b/two", "b/three"]);
    assert_eq!(transport.requests.borrow().len(), 2);
}

#[test]
fn run_stops_after_error() {
    let transport = ScriptedTransport::new([
        Ok(stars_page(&["a/one"], Some("c1"), true)),
        Err(QueryError::Json(
            serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
        )),
        Ok(stars_page(&["never/seen"], None, false)),
    ]);
    let mut results = transport.run(machine());
    assert_matches!(results.next(), Some(Ok(s)) if s == "a/one");
    assert_matches!(results.next(), Some(Err(QueryError::Json(_))));
    assert_matches!(results.next(), None);
    assert_matches!(results.next(), None);
    assert_eq!(transport.requests.borrow().len(), 2);
}
