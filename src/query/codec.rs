//! Conversion between [`FeedQuery`] and the address-bar query string.
//!
//! Parameters: `limit`, `offset`, `sort` (`asc`|`desc`), `tags` (comma-joined),
//! `search`, `since`, `until` (RFC 3339). Decoding never fails; anything
//! malformed is treated as absent.

use chrono::{DateTime, SecondsFormat, Utc};
use url::form_urlencoded;

use super::{parse_timestamp, FeedQuery, SortOrder, DEFAULT_LIMIT};

/// The fields explicitly present (and valid) in a query string.
///
/// Numeric and timestamp fields stay textual: they are cursor tokens to both
/// the address bar and the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPatch {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub sort: Option<SortOrder>,
    pub tags: Option<Vec<String>>,
    pub search: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
}

impl QueryPatch {
    pub fn is_empty(&self) -> bool {
        *self == QueryPatch::default()
    }
}

/// Canonical query string holding only the non-default fields.
pub fn encode(query: &FeedQuery) -> String {
    serialize(query, false)
}

/// Query string sent to the backend.
///
/// Identical to [`encode`] except that `limit` is always pinned: the backend
/// applies its own default page size when the parameter is missing.
pub fn encode_request(query: &FeedQuery) -> String {
    serialize(query, true)
}

fn serialize(query: &FeedQuery, pin_limit: bool) -> String {
    let mut out = form_urlencoded::Serializer::new(String::new());

    if pin_limit || query.limit != DEFAULT_LIMIT {
        out.append_pair("limit", &query.limit.to_string());
    }
    if query.offset != 0 {
        out.append_pair("offset", &query.offset.to_string());
    }
    if query.sort != SortOrder::default() {
        out.append_pair("sort", query.sort.as_param());
    }
    if !query.tags().is_empty() {
        out.append_pair("tags", &query.tags().join(","));
    }
    if let Some(search) = query.search() {
        out.append_pair("search", search);
    }
    if let Some(since) = query.since {
        out.append_pair("since", &format_timestamp(since));
    }
    if let Some(until) = query.until {
        out.append_pair("until", &format_timestamp(until));
    }

    out.finish()
}

/// Parse a query string (with or without the leading `?`).
///
/// When a key repeats, the first occurrence wins.
pub fn decode(query_string: &str) -> QueryPatch {
    let raw = query_string.strip_prefix('?').unwrap_or(query_string);
    let mut patch = QueryPatch::default();
    let mut seen: Vec<String> = Vec::new();

    for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
        if seen.iter().any(|k| *k == key) {
            continue;
        }
        seen.push(key.to_string());

        if value.is_empty() {
            continue;
        }

        match key.as_ref() {
            "limit" => {
                patch.limit = canonical_number(&value).filter(|n| n != "0");
            }
            "offset" => {
                patch.offset = canonical_number(&value);
            }
            "sort" => {
                patch.sort = SortOrder::from_param(&value);
            }
            "tags" => {
                let mut tags: Vec<String> = Vec::new();
                for tag in value.split(',') {
                    let tag = tag.trim().to_lowercase();
                    if !tag.is_empty() && !tags.contains(&tag) {
                        tags.push(tag);
                    }
                }
                if !tags.is_empty() {
                    patch.tags = Some(tags);
                }
            }
            "search" => {
                patch.search = Some(value.into_owned());
            }
            "since" => {
                patch.since = parse_timestamp(&value).map(|_| value.into_owned());
            }
            "until" => {
                patch.until = parse_timestamp(&value).map(|_| value.into_owned());
            }
            other => {
                tracing::debug!("Ignoring unknown query parameter: {}", other);
            }
        }
    }

    patch
}

fn canonical_number(s: &str) -> Option<String> {
    s.trim().parse::<u32>().ok().map(|n| n.to_string())
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_query_encodes_empty() {
        assert_eq!(encode(&FeedQuery::default()), "");
    }

    #[test]
    fn test_request_encoding_pins_limit() {
        assert_eq!(encode_request(&FeedQuery::default()), "limit=10");
    }

    #[test]
    fn test_tags_and_sort_scenario() {
        let patch = decode("?tags=art,music&sort=asc");
        assert_eq!(
            patch.tags,
            Some(vec!["art".to_string(), "music".to_string()])
        );
        assert_eq!(patch.sort, Some(SortOrder::Ascending));

        let query = FeedQuery::from_patch(&patch);
        assert_eq!(encode(&query), "sort=asc&tags=art%2Cmusic");
    }

    #[test]
    fn test_round_trip_every_field() {
        let mut q = FeedQuery::default();
        q.limit = 25;
        q.offset = 50;
        q.sort = SortOrder::Ascending;
        q.add_tag("rust");
        q.add_tag("async");
        q.set_search("hello world & more");
        q.since = Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
        q.until = Some(Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap());

        let decoded = FeedQuery::from_patch(&decode(&encode(&q)));
        assert_eq!(decoded, q);
        assert_eq!(decoded.tags(), q.tags());
    }

    #[test]
    fn test_round_trip_tag_entered_with_comma() {
        let mut q = FeedQuery::default();
        q.add_tag("rock,roll");
        let encoded = encode(&q);
        assert_eq!(encoded, "tags=rock%2Croll");

        let decoded = FeedQuery::from_patch(&decode(&encoded));
        assert_eq!(decoded, q);
        assert_eq!(decoded.tags(), ["rock", "roll"]);
    }

    #[test]
    fn test_round_trip_partial() {
        let mut q = FeedQuery::default();
        q.set_search("cats");
        let s = encode(&q);
        assert_eq!(s, "search=cats");
        assert_eq!(FeedQuery::from_patch(&decode(&s)), q);
    }

    #[test]
    fn test_invalid_sort_dropped() {
        let patch = decode("sort=popular&limit=5");
        assert_eq!(patch.sort, None);
        assert_eq!(patch.limit.as_deref(), Some("5"));
    }

    #[test]
    fn test_malformed_fields_absent() {
        let patch = decode("limit=ten&offset=-3&since=yesterday&tags=,,&search=");
        assert!(patch.is_empty());
    }

    #[test]
    fn test_numbers_carried_canonically() {
        let patch = decode("limit=010&offset=0020");
        assert_eq!(patch.limit.as_deref(), Some("10"));
        assert_eq!(patch.offset.as_deref(), Some("20"));
    }

    #[test]
    fn test_first_occurrence_wins() {
        let patch = decode("sort=asc&sort=desc");
        assert_eq!(patch.sort, Some(SortOrder::Ascending));
    }

    #[test]
    fn test_tags_lowercased_on_decode() {
        let patch = decode("tags=Art,ART,Music");
        assert_eq!(
            patch.tags,
            Some(vec!["art".to_string(), "music".to_string()])
        );
    }

    #[test]
    fn test_garbage_does_not_panic() {
        let patch = decode("%%%&&==&=x&tags");
        assert!(patch.is_empty());
    }
}
