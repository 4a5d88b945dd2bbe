//! Session cookie handling
//!
//! A [`Session`] is the explicit authentication context threaded through every
//! authenticated call. Its cookie is kept as an ordered name/value mapping and
//! only serialized to the `cookie` header at the HTTP boundary.

use crate::error::AuthError;
use reqwest::header::HeaderValue;
use std::convert::Infallible;
use std::sync::RwLock;
use tracing::warn;
use zeroize::Zeroize;

/// Ordered mapping from cookie name to value
///
/// Names are unique. Inserting an existing name replaces its value but keeps
/// the position where the name was first seen, so merging fragments from
/// several responses serializes deterministically.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    entries: Vec<(String, String)>,
}

impl CookieJar {
    /// Create an empty jar
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a jar from raw `set-cookie` header values
    ///
    /// Each fragment is reduced to its leading `name=value` pair; attributes
    /// such as `path`, `domain` and `expires` are discarded. Fragments without
    /// a usable pair are skipped.
    pub fn from_set_cookie<'a>(fragments: impl IntoIterator<Item = &'a str>) -> Self {
        let mut jar = Self::new();
        for fragment in fragments {
            match parse_pair(fragment.split(';').next().unwrap_or_default()) {
                Some((name, value)) => jar.insert(name, value),
                None => warn!("Ignoring unparsable set-cookie fragment"),
            }
        }
        jar
    }

    /// Build a jar from `set-cookie` headers of a response
    pub fn from_headers(headers: &reqwest::header::HeaderMap) -> Result<Self, AuthError> {
        let fragments = headers
            .get_all(reqwest::header::SET_COOKIE)
            .iter()
            .map(|value| value.to_str().map_err(|_| AuthError::InvalidCookieHeader))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_set_cookie(fragments))
    }

    /// Parse a serialized `cookie` header (`a=b; c=d`)
    pub fn parse(header: &str) -> Self {
        let mut jar = Self::new();
        for (name, value) in header.split(';').filter_map(parse_pair) {
            jar.insert(name, value);
        }
        jar
    }

    /// Insert or replace a cookie
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Merge another jar into this one; values from `other` win
    pub fn merge(&mut self, mut other: CookieJar) {
        for (name, value) in std::mem::take(&mut other.entries) {
            self.insert(name, value);
        }
    }

    /// Look up a cookie value by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over `(name, value)` pairs in serialization order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize to the `cookie` header wire format
    pub fn to_header_string(&self) -> String {
        self.entries
            .iter()
            .map(|(n, v)| format!("{}={}", n, v))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Create a sensitive header value for this jar
    ///
    /// The temporary serialized string is zeroized after the header is built.
    pub(crate) fn header_value(&self) -> Result<HeaderValue, AuthError> {
        let mut cookie_string = self.to_header_string();
        let header_value = HeaderValue::from_bytes(cookie_string.as_bytes())
            .map_err(|_| AuthError::InvalidCookieHeader);
        cookie_string.zeroize();

        let mut sensitive_header = header_value?;
        sensitive_header.set_sensitive(true);
        Ok(sensitive_header)
    }
}

// Cookie values are secrets, never print them
impl std::fmt::Debug for CookieJar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(n, _)| n))
            .finish()
    }
}

impl Drop for CookieJar {
    fn drop(&mut self) {
        for (_, value) in &mut self.entries {
            value.zeroize();
        }
    }
}

fn parse_pair(segment: &str) -> Option<(&str, &str)> {
    let (name, value) = segment.trim().split_once('=')?;
    let (name, value) = (name.trim(), value.trim());
    if name.is_empty() || value.is_empty() {
        return None;
    }
    Some((name, value))
}

/// Authentication context for a single user
///
/// `cookie == None` means logged out. The cookie is only ever replaced as a
/// whole, never patched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    cookie: Option<CookieJar>,
}

impl Session {
    /// A logged-out session
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A session carrying the given cookie
    pub fn with_cookie(cookie: CookieJar) -> Self {
        Self {
            cookie: Some(cookie),
        }
    }

    /// Restore a session from a serialized cookie header
    pub fn from_cookie_string(cookie: &str) -> Self {
        let jar = CookieJar::parse(cookie);
        if jar.is_empty() {
            Self::anonymous()
        } else {
            Self::with_cookie(jar)
        }
    }

    pub fn cookie(&self) -> Option<&CookieJar> {
        self.cookie.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.cookie.is_some()
    }

    /// Replace the cookie with a freshly obtained one
    pub fn replace(&mut self, cookie: CookieJar) {
        self.cookie = Some(cookie);
    }

    /// Drop the cookie
    pub fn logout(&mut self) {
        self.cookie = None;
    }

    /// The cookie, or [`AuthError::NotLoggedIn`]
    pub fn require(&self) -> Result<&CookieJar, AuthError> {
        self.cookie.as_ref().ok_or(AuthError::NotLoggedIn)
    }
}

/// Storage contract for the serialized session cookie
///
/// Implementations must replace the stored value as a whole so readers never
/// observe a partial update.
pub trait SessionStore {
    type Error: std::error::Error;

    /// Read the stored cookie
    fn get(&self) -> Result<Option<String>, Self::Error>;

    /// Replace the stored cookie
    fn set(&self, cookie: &str) -> Result<(), Self::Error>;

    /// Remove the stored cookie
    fn clear(&self) -> Result<(), Self::Error>;

    /// Whether a cookie is stored
    fn exists(&self) -> Result<bool, Self::Error> {
        Ok(self.get()?.is_some())
    }

    /// Load the stored cookie as a [`Session`]
    fn load(&self) -> Result<Session, Self::Error> {
        Ok(self
            .get()?
            .map(|cookie| Session::from_cookie_string(&cookie))
            .unwrap_or_default())
    }

    /// Persist a [`Session`], clearing the store when it is logged out
    fn save(&self, session: &Session) -> Result<(), Self::Error> {
        match session.cookie() {
            Some(jar) => {
                let mut cookie = jar.to_header_string();
                let result = self.set(&cookie);
                cookie.zeroize();
                result
            }
            None => self.clear(),
        }
    }
}

/// Process-local session store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    cookie: RwLock<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    type Error = Infallible;

    fn get(&self) -> Result<Option<String>, Self::Error> {
        Ok(self
            .cookie
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    fn set(&self, cookie: &str) -> Result<(), Self::Error> {
        *self
            .cookie
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(cookie.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), Self::Error> {
        *self
            .cookie
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_set_cookie_attributes_are_discarded() {
        let jar = CookieJar::from_set_cookie([
            "JSESSIONID=ABC123; Path=/; HttpOnly",
            "39ce7=CFh7; expires=Fri, 01-Jan-2027 00:00:00 GMT; path=/; domain=.codeforces.com",
        ]);
        assert_eq!(jar.to_header_string(), "JSESSIONID=ABC123; 39ce7=CFh7");
    }

    #[test]
    fn test_unparsable_fragments_are_skipped() {
        let jar = CookieJar::from_set_cookie(["HttpOnly", "=orphan", "empty=; Path=/", "a=1"]);
        assert_eq!(jar.to_header_string(), "a=1");
    }

    #[test]
    fn test_merge_replaces_value_in_place() {
        let mut jar = CookieJar::from_set_cookie(["a=1", "b=2"]);
        jar.merge(CookieJar::from_set_cookie(["c=3", "a=9"]));
        assert_eq!(jar.to_header_string(), "a=9; b=2; c=3");
        assert_eq!(jar.get("a"), Some("9"));
    }

    #[test]
    fn test_parse_header_string() {
        let jar = CookieJar::parse("a=1; b=2;  c=3 ");
        assert_eq!(jar.len(), 3);
        assert_eq!(jar.get("c"), Some("3"));
    }

    #[test]
    fn test_debug_hides_values() {
        let jar = CookieJar::from_set_cookie(["secret=hunter2"]);
        let debug = format!("{:?}", jar);
        assert!(debug.contains("secret"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_header_value_is_sensitive() {
        let jar = CookieJar::from_set_cookie(["a=1"]);
        let header = jar.header_value().unwrap();
        assert!(header.is_sensitive());
        assert_eq!(header.to_str().unwrap(), "a=1");
    }

    #[test]
    fn test_session_lifecycle() {
        let mut session = Session::anonymous();
        assert!(!session.is_logged_in());
        assert_eq!(session.require(), Err(AuthError::NotLoggedIn));

        session.replace(CookieJar::parse("a=1"));
        assert!(session.is_logged_in());

        session.logout();
        assert!(session.cookie().is_none());
    }

    #[test]
    fn test_empty_cookie_string_is_anonymous() {
        assert!(!Session::from_cookie_string("").is_logged_in());
        assert!(!Session::from_cookie_string(" ; ").is_logged_in());
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemorySessionStore::new();
        assert!(!store.exists().unwrap());

        let session = Session::with_cookie(CookieJar::parse("a=1; b=2"));
        store.save(&session).unwrap();
        assert_eq!(store.get().unwrap().as_deref(), Some("a=1; b=2"));
        assert_eq!(store.load().unwrap(), session);

        store.save(&Session::anonymous()).unwrap();
        assert!(!store.exists().unwrap());
    }

    fn fragment_strategy() -> impl Strategy<Value = String> {
        ("[a-c]", "[a-z0-9]{1,6}", prop::option::of("; (Path=/|HttpOnly|domain=x)")).prop_map(
            |(name, value, attr)| format!("{}={}{}", name, value, attr.unwrap_or_default()),
        )
    }

    // Merging two stages and then deduplicating equals deduplicating each
    // stage first and merging the results.
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_merge_is_associative_across_stages(
            first in prop::collection::vec(fragment_strategy(), 0..6),
            second in prop::collection::vec(fragment_strategy(), 0..6),
        ) {
            let mut merged = CookieJar::from_set_cookie(first.iter().map(String::as_str));
            merged.merge(CookieJar::from_set_cookie(second.iter().map(String::as_str)));

            let flat = CookieJar::from_set_cookie(
                first.iter().chain(second.iter()).map(String::as_str),
            );

            prop_assert_eq!(merged.to_header_string(), flat.to_header_string());
        }

        #[test]
        fn prop_header_string_roundtrips(
            fragments in prop::collection::vec(fragment_strategy(), 0..6),
        ) {
            let jar = CookieJar::from_set_cookie(fragments.iter().map(String::as_str));
            prop_assert_eq!(CookieJar::parse(&jar.to_header_string()), jar);
        }
    }
}
