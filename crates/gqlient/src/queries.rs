use crate::QueryPayload;
use crate::types::{Cursor, JsonMap, Page, Variable};
use indenter::indented;
use std::fmt::Write;

#[cfg(test)]
mod tests;

/// A single GraphQL query with its variables and a way to decode the `data`
/// member of the response
pub trait Query {
    type Output;

    /// Write the body of the query, i.e., the selection set that goes inside
    /// the outermost braces, referring to variables by `$name`
    fn write_graphql<W: Write>(&self, s: W) -> std::fmt::Result;

    fn variables(&self) -> impl IntoIterator<Item = (String, Variable)>;

    fn parse_response(&self, data: JsonMap) -> Result<Self::Output, serde_json::Error>;
}

pub trait Paginator {
    type Query: Query<Output = Page<Self::Item>>;
    type Item;

    fn for_cursor(&self, cursor: Option<&Cursor>) -> Self::Query;
}

pub trait QueryMachine {
    type Output;

    fn get_next_query(&mut self) -> Option<QueryPayload>;
    fn handle_response(&mut self, data: JsonMap) -> Result<(), serde_json::Error>;
    fn get_output(&mut self) -> Vec<Self::Output>;
}

/// A [`QueryMachine`] that follows one [`Paginator`] from its first page to
/// its last, requesting one page at a time and outputting each page's items
/// in order as soon as the page arrives
///
/// Pagination ends when a page reports no next page, when a page reports a
/// next page but no cursor for it, or when a response fails to decode.
#[allow(missing_debug_implementations)]
pub struct Paginate<P: Paginator> {
    paginator: P,
    cursor: Option<Cursor>,
    active: Option<P::Query>,
    items: Vec<P::Item>,
    pages: usize,
    done: bool,
}

impl<P: Paginator> Paginate<P> {
    pub fn new(paginator: P) -> Self {
        Paginate {
            paginator,
            cursor: None,
            active: None,
            items: Vec::new(),
            pages: 0,
            done: false,
        }
    }
}

impl<P: Paginator> QueryMachine for Paginate<P> {
    type Output = P::Item;

    fn get_next_query(&mut self) -> Option<QueryPayload> {
        if self.done {
            return None;
        }
        let query = self.paginator.for_cursor(self.cursor.as_ref());
        let payload = build_payload(&query);
        self.active = Some(query);
        Some(payload)
    }

    fn handle_response(&mut self, data: JsonMap) -> Result<(), serde_json::Error> {
        let Some(query) = self.active.take() else {
            tracing::warn!("Received a response with no query outstanding; ignoring");
            return Ok(());
        };
        let page = match query.parse_response(data) {
            Ok(page) => page,
            Err(e) => {
                self.done = true;
                return Err(e);
            }
        };
        self.pages += 1;
        self.items.extend(page.items);
        if !page.has_next_page {
            self.done = true;
        } else if page.end_cursor.is_none() {
            tracing::warn!(
                page = self.pages,
                "Server reported another page but no cursor for it; stopping"
            );
            self.done = true;
        } else {
            self.cursor = page.end_cursor;
        }
        Ok(())
    }

    fn get_output(&mut self) -> Vec<P::Item> {
        std::mem::take(&mut self.items)
    }
}

fn build_payload<Q: Query>(query: &Q) -> QueryPayload {
    let mut variables = JsonMap::new();
    let mut varstr = String::new();
    for (i, (name, Variable { gql_type, value })) in query.variables().into_iter().enumerate() {
        if i > 0 {
            varstr.push_str(", ");
        }
        write!(&mut varstr, "${name}: {gql_type}").expect("writing to a string should not fail");
        variables.insert(name, value);
    }
    let mut qstr = String::new();
    let mut qwrite = indented(&mut qstr).with_str("    ");
    query
        .write_graphql(&mut qwrite)
        .expect("writing to a string should not fail");
    QueryPayload {
        query: format!("query ({varstr}) {{\n{qstr}}}\n"),
        variables,
    }
}
