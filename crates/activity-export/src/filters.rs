use chrono::NaiveDate;
use std::fmt;

/// An inclusive range of creation dates, rendered in GitHub search syntax as
/// `FROM..TO`
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct DateRange {
    pub(crate) from: NaiveDate,
    pub(crate) to: NaiveDate,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}",
            self.from.format("%Y-%m-%d"),
            self.to.format("%Y-%m-%d")
        )
    }
}

/// Public, non-archived issues & PRs created in `created` that `login`
/// opened in repositories they do not own
pub(crate) fn authored_filter(login: &str, created: DateRange) -> String {
    format!("is:public created:{created} archived:false author:{login} -user:{login}")
}

/// Public, non-archived issues & PRs created in `created` that `login`
/// reviewed, optionally limited to repositories owned by `owner`
pub(crate) fn reviewed_filter(login: &str, created: DateRange, owner: Option<&str>) -> String {
    let filter = format!("is:public reviewed-by:{login} created:{created} archived:false");
    match owner {
        Some(owner) => format!("{filter} user:{owner}"),
        None => filter,
    }
}
