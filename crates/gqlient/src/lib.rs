mod queries;
mod types;
pub use crate::queries::*;
pub use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;
use ureq::{
    Agent, SendBody,
    http::{
        Request,
        header::{HeaderValue, InvalidHeaderValue},
    },
    middleware::MiddlewareNext,
};

pub static GRAPHQL_API_URL: &str = "https://api.github.com/graphql";

static USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Something that can submit a GraphQL request and hand back the `data`
/// member of the response
pub trait Transport {
    fn query(&self, payload: QueryPayload) -> Result<JsonMap, QueryError>;

    /// Drive `query` to completion, one request at a time, yielding its
    /// outputs as they become available
    fn run<Q: QueryMachine>(&self, query: Q) -> QueryResults<'_, Self, Q>
    where
        Self: Sized,
    {
        QueryResults::new(self, query)
    }
}

#[derive(Clone, Debug)]
pub struct Client {
    inner: Agent,
    api_url: String,
}

impl Client {
    pub fn new(token: &str) -> Result<Client, BuildClientError> {
        Ok(Client::build(Some(bearer(token)?)))
    }

    /// Create a client that sends no `Authorization` header.  GitHub rejects
    /// unauthenticated GraphQL requests, so every query made with such a
    /// client fails.
    pub fn anonymous() -> Client {
        Client::build(None)
    }

    pub fn new_with_local_token() -> Result<Client, BuildClientError> {
        let token = gh_token::get()?;
        Client::new(&token)
    }

    /// Send queries to `api_url` instead of the public GitHub endpoint
    pub fn with_api_url(mut self, api_url: String) -> Client {
        self.api_url = api_url;
        self
    }

    fn build(auth: Option<HeaderValue>) -> Client {
        let inner = Agent::config_builder()
            .https_only(true)
            .user_agent(USER_AGENT)
            .middleware(
                move |mut req: Request<SendBody<'_>>, next: MiddlewareNext<'_>| {
                    if let Some(ref auth) = auth {
                        let _ = req.headers_mut().insert("Authorization", auth.clone());
                    }
                    next.handle(req)
                },
            )
            .build()
            .into();
        Client {
            inner,
            api_url: String::from(GRAPHQL_API_URL),
        }
    }
}

fn bearer(token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!("Bearer {token}"))
}

impl Transport for Client {
    fn query(&self, payload: QueryPayload) -> Result<JsonMap, QueryError> {
        tracing::trace!(query = %payload.query, "Sending GraphQL request");
        let bytes = self
            .inner
            .post(self.api_url.as_str())
            .send_json(payload)
            .map_err(|e| QueryError::Http(Box::new(e)))?
            .into_body()
            .read_to_vec()
            .map_err(|e| QueryError::Read(Box::new(e)))?;
        tracing::debug!(bytes = bytes.len(), "Received GraphQL response");
        serde_json::from_slice::<Response>(&bytes)?
            .into_data()
            .map_err(Into::into)
    }
}

/// An iterator over the outputs of a [`QueryMachine`] as it is run against a
/// [`Transport`]
///
/// The first error ends the iteration: after yielding an `Err`, the iterator
/// only returns `None`.
#[derive(Debug)]
pub struct QueryResults<'a, T, Q: QueryMachine> {
    transport: &'a T,
    query: Q,
    query_done: bool,
    yielding: VecDeque<Q::Output>,
    payload: Option<QueryPayload>,
}

impl<'a, T: Transport, Q: QueryMachine> QueryResults<'a, T, Q> {
    fn new(transport: &'a T, query: Q) -> Self {
        QueryResults {
            transport,
            query,
            query_done: false,
            yielding: VecDeque::new(),
            payload: None,
        }
    }
}

impl<T: Transport, Q: QueryMachine> Iterator for QueryResults<'_, T, Q> {
    type Item = Result<Q::Output, QueryError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(value) = self.yielding.pop_front() {
                return Some(Ok(value));
            } else if self.query_done {
                return None;
            } else if let Some(payload) = self.payload.take() {
                let outcome = match self.transport.query(payload) {
                    Ok(data) => self.query.handle_response(data).map_err(QueryError::from),
                    Err(e) => Err(e),
                };
                if let Err(e) = outcome {
                    self.query_done = true;
                    return Some(Err(e));
                }
                self.yielding.extend(self.query.get_output());
            } else {
                if let Some(payload) = self.query.get_next_query() {
                    self.payload = Some(payload);
                } else {
                    self.query_done = true;
                }
                self.yielding.extend(self.query.get_output());
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum BuildClientError {
    #[error("invalid authorization token")]
    Auth(#[from] InvalidHeaderValue),
    #[error("failed to fetch GitHub access token")]
    GetToken(#[from] gh_token::Error),
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("failed to perform GraphQL request")]
    Http(#[source] Box<ureq::Error>),
    #[error("failed to read GraphQL response")]
    Read(#[source] Box<ureq::Error>),
    #[error("failed to deserialize GraphQL response")]
    Json(#[from] serde_json::Error),
    #[error("GraphQL server returned error response")]
    GraphQL(#[from] GqlError),
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct QueryPayload {
    pub query: String,
    pub variables: JsonMap,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
struct Response {
    // GitHub sends `"data": null` alongside some errors
    #[serde(default)]
    data: Option<JsonMap>,
    #[serde(default)]
    errors: GqlError,
}

impl Response {
    fn into_data(self) -> Result<JsonMap, GqlError> {
        if self.errors.is_empty() {
            Ok(self.data.unwrap_or_default())
        } else {
            Err(self.errors)
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(transparent)]
pub struct GqlError(Vec<GqlInnerError>);

impl GqlError {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for GqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Query errored:")?;
        let mut first = true;
        for e in &self.0 {
            if !std::mem::take(&mut first) {
                writeln!(f, "---")?;
            }
            if let Some(ref t) = e.err_type {
                writeln!(f, "    Type: {t}")?;
            }
            writeln!(f, "    Message: {}", e.message)?;
            if let Some(ref p) = e.path {
                write!(f, "    Path: ")?;
                for (i, segment) in p.iter().enumerate() {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    match segment {
                        serde_json::Value::String(s) => write!(f, "{s}")?,
                        other => write!(f, "{other}")?,
                    }
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for GqlError {}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
struct GqlInnerError {
    #[serde(default, rename = "type")]
    err_type: Option<String>,
    message: String,
    // Path segments are field names or list indices
    #[serde(default)]
    path: Option<Vec<serde_json::Value>>,
}
