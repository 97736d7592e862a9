//! Request parameters.
//!
//! Every lookup is checked: a missing value or a failed conversion comes back
//! as a [`ParamError`], never as a default or a panic.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use thiserror::Error;

/// Failure looking up or converting a request parameter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("missing parameter `{name}`")]
    Missing { name: String },

    #[error("invalid value {value:?} for parameter `{name}`: {reason}")]
    Invalid {
        name: String,
        value: String,
        reason: String,
    },
}

/// Named string values collected from the query string, the body and the route.
///
/// Later inserts overwrite earlier ones, so the order the context fills the
/// map in (query, then body, then route bindings) is the precedence order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    values: BTreeMap<String, String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a URL query string. The first occurrence of a repeated key wins.
    pub fn from_query(query: &str) -> Self {
        let mut values = BTreeMap::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            values
                .entry(key.into_owned())
                .or_insert_with(|| value.into_owned());
        }
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn require(&self, name: &str) -> Result<&str, ParamError> {
        self.get(name).ok_or_else(|| ParamError::Missing {
            name: name.to_string(),
        })
    }

    /// Convert a parameter with `FromStr`, e.g. `params.parse::<u64>("id")`.
    pub fn parse<T>(&self, name: &str) -> Result<T, ParamError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.require(name)?;
        raw.parse::<T>().map_err(|e| ParamError::Invalid {
            name: name.to_string(),
            value: raw.to_string(),
            reason: e.to_string(),
        })
    }

    /// Read a boolean flag. Accepts true/false, 1/0, on/off and yes/no.
    pub fn flag(&self, name: &str) -> Result<bool, ParamError> {
        let raw = self.require(name)?;
        match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "on" | "yes" => Ok(true),
            "false" | "0" | "off" | "no" => Ok(false),
            _ => Err(ParamError::Invalid {
                name: name.to_string(),
                value: raw.to_string(),
                reason: "expected a boolean".to_string(),
            }),
        }
    }

    /// Insert a value, returning the one it replaced.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.values.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> Extend<(K, V)> for Params
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        params.extend(iter);
        params
    }
}
