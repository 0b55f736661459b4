//! Column name to field name resolution.
//!
//! A snake_case column such as `user_id` maps to two candidate field names:
//! a plain camel-case form and one that spells common initialisms in upper
//! case (`http_url` → `HttpUrl` / `HTTPURL`).

/// Segments that are spelled in upper case in the initialism-aware candidate.
pub const COMMON_INITIALISMS: &[&str] = &[
    "ACL", "API", "ASCII", "CPU", "CSS", "DNS", "EOF", "GUID", "HTML", "HTTP", "HTTPS", "ID",
    "IP", "JSON", "LHS", "QPS", "RAM", "RHS", "RPC", "SLA", "SMTP", "SQL", "SSH", "TCP", "TLS",
    "TTL", "UDP", "UI", "UID", "UUID", "URI", "URL", "UTF8", "VM", "XML", "XMPP", "XSRF", "XSS",
];

/// Candidate field names for one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNames {
    pub plain: String,
    pub initialism: String,
}

/// Converts a column identifier into its plain and initialism-aware field names.
///
/// Segments are split on `_`; empty segments are dropped. Each segment keeps
/// its first character upper-cased and the rest lower-cased, except that an
/// `id` segment is always `ID`.
///
/// ```
/// use sqlx_osm::names::to_field_names;
///
/// let names = to_field_names("http_url_id");
/// assert_eq!(names.plain, "HttpUrlID");
/// assert_eq!(names.initialism, "HTTPURLID");
/// ```
pub fn to_field_names(column: &str) -> FieldNames {
    let mut plain = String::with_capacity(column.len());
    let mut initialism = String::with_capacity(column.len());

    for segment in column.split('_').filter(|s| !s.is_empty()) {
        let upper = segment.to_uppercase();
        let capitalized = capitalize(segment);

        if upper == "ID" {
            plain.push_str(&upper);
        } else {
            plain.push_str(&capitalized);
        }

        if COMMON_INITIALISMS.contains(&upper.as_str()) {
            initialism.push_str(&upper);
        } else {
            initialism.push_str(&capitalized);
        }
    }

    FieldNames { plain, initialism }
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.as_str().to_lowercase().chars())
            .collect(),
        None => String::new(),
    }
}
