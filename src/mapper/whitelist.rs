//! Origin system whitelist.

use regex::Regex;

/// Decides which publishing systems the mapper accepts events from.
///
/// The pattern is searched for anywhere in the origin identifier; anchor
/// it with `^...$` to require a full match.
#[derive(Debug, Clone)]
pub struct Whitelist {
    pattern: Regex,
}

impl Whitelist {
    /// Compiles a whitelist pattern.
    ///
    /// # Examples
    ///
    /// ```
    /// use annotation_mapper::mapper::Whitelist;
    ///
    /// let whitelist = Whitelist::new(r"http://cmdb\.ft\.com/systems/pac").unwrap();
    /// assert!(whitelist.is_allowed("http://cmdb.ft.com/systems/pac"));
    /// assert!(!whitelist.is_allowed("http://cmdb.ft.com/systems/methode-web-pub"));
    /// ```
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    /// Returns whether events from `origin_system_id` should be processed.
    pub fn is_allowed(&self, origin_system_id: &str) -> bool {
        self.pattern.is_match(origin_system_id)
    }

    /// The source pattern.
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}
