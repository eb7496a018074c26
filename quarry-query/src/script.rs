//! Script references.

use crate::error::{DslError, Result};
use crate::json::{self, Object};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// An inline or stored script.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    /// Inline source.
    pub source: Option<String>,
    /// Stored script id.
    pub id: Option<String>,
    /// Script language, `painless` when unset.
    pub lang: Option<String>,
    /// Named parameters.
    pub params: Object,
}

impl Script {
    /// An inline script.
    pub fn source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::default()
        }
    }

    /// A stored script.
    pub fn stored(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Set the language.
    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    /// Add a parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Check that the script has a source or an id.
    pub fn validate(&self) -> Result<()> {
        let has = |s: &Option<String>| s.as_deref().is_some_and(|s| !s.is_empty());
        if has(&self.source) || has(&self.id) {
            Ok(())
        } else {
            Err(DslError::missing("source"))
        }
    }

    /// Encode to the object form.
    pub fn to_json(&self) -> Value {
        let mut obj = Object::new();
        json::put(&mut obj, "source", &self.source);
        json::put(&mut obj, "id", &self.id);
        json::put(&mut obj, "lang", &self.lang);
        if !self.params.is_empty() {
            obj.insert("params".to_string(), Value::Object(self.params.clone()));
        }
        Value::Object(obj)
    }

    /// Decode the object form or the bare-string shorthand.
    pub fn from_json(value: Value) -> Result<Self> {
        let script = match value {
            Value::String(source) => Self::source(source),
            other => {
                let mut obj = json::object(other, "script")?;
                let source = match json::take::<String>(&mut obj, "source")? {
                    Some(source) => Some(source),
                    None => json::take(&mut obj, "inline")?,
                };
                let script = Self {
                    source,
                    id: json::take(&mut obj, "id")?,
                    lang: json::take(&mut obj, "lang")?,
                    params: json::take(&mut obj, "params")?.unwrap_or_default(),
                };
                if let Some(key) = obj.keys().next() {
                    return Err(DslError::structural(format!("unknown script key `{}`", key)));
                }
                script
            }
        };
        script.validate()?;
        Ok(script)
    }
}

impl Serialize for Script {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Script {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Script::from_json(value).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_string_shorthand() {
        let script = Script::from_json(json!("doc['likes'].value * 2")).unwrap();
        assert_eq!(script.source.as_deref(), Some("doc['likes'].value * 2"));
        assert_eq!(script.to_json(), json!({"source": "doc['likes'].value * 2"}));
    }

    #[test]
    fn test_object_form() {
        let input = json!({"source": "Math.log(2 + doc[params.f].value)", "lang": "painless", "params": {"f": "likes"}});
        let script = Script::from_json(input.clone()).unwrap();
        assert_eq!(script.to_json(), input);
    }

    #[test]
    fn test_requires_source_or_id() {
        let err = Script::from_json(json!({"lang": "painless"})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequired);
        assert!(Script::stored("calculate-score").validate().is_ok());
    }
}
