//! Elasticsearch endpoint URL builders
//!
//! Helper functions to construct cluster API URLs.

/// Build the count endpoint URL for an index or pattern
pub fn count_url(base_url: &str, index: &str) -> String {
    format!("{}/{}/_count", base_url, index)
}

/// Build the search URL opening a scroll over an index or pattern
pub fn open_scroll_url(base_url: &str, index: &str, keepalive: &str) -> String {
    format!("{}/{}/_search?scroll={}", base_url, index, keepalive)
}

/// Build the scroll continuation URL
pub fn continue_scroll_url(base_url: &str) -> String {
    format!("{}/_search/scroll", base_url)
}

/// Build the scroll cleanup URL
pub fn clear_scroll_url(base_url: &str) -> String {
    format!("{}/_search/scroll", base_url)
}

/// Build the index listing URL for a pattern
pub fn cat_indices_url(base_url: &str, pattern: &str) -> String {
    format!("{}/_cat/indices/{}?format=json&bytes=b", base_url, pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_url() {
        let url = count_url("http://localhost:9200", "jobs-*");
        assert_eq!(url, "http://localhost:9200/jobs-*/_count");
    }

    #[test]
    fn test_open_scroll_url() {
        let url = open_scroll_url("http://localhost:9200", "jobs-2021-03", "5m");
        assert_eq!(url, "http://localhost:9200/jobs-2021-03/_search?scroll=5m");
    }

    #[test]
    fn test_continue_scroll_url() {
        let url = continue_scroll_url("http://localhost:9200");
        assert_eq!(url, "http://localhost:9200/_search/scroll");
    }

    #[test]
    fn test_cat_indices_url() {
        let url = cat_indices_url("http://localhost:9200", "jobs-*");
        assert_eq!(
            url,
            "http://localhost:9200/_cat/indices/jobs-*?format=json&bytes=b"
        );
    }
}
