//! Decode context.
//!
//! Carries the path of the element being decoded and the unknown-key
//! diagnostic. A context lives for exactly one decode invocation.

use crate::error::{DecodeError, DslError, Result};
use crate::json::Object;
use quarry_log::{debug, warn};
use serde_json::Value;

/// State local to a single decode invocation.
#[derive(Debug, Default)]
pub struct DecodeContext {
    path: Vec<String>,
    unknown_keys: Vec<String>,
}

impl DecodeContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current dotted path.
    pub fn path(&self) -> String {
        let mut out = String::new();
        for segment in &self.path {
            if !out.is_empty() && !segment.starts_with('[') {
                out.push('.');
            }
            out.push_str(segment);
        }
        out
    }

    /// Keys that were not understood so far.
    pub fn unknown_keys(&self) -> &[String] {
        &self.unknown_keys
    }

    /// Run `f` one path segment deeper; errors are located at that depth.
    pub(crate) fn scoped<T>(
        &mut self,
        segment: impl Into<String>,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.path.push(segment.into());
        let result = f(self).map_err(|e| e.at(self.path()));
        self.path.pop();
        result
    }

    /// Decode every element of `items`, collecting all failures.
    pub(crate) fn each<T>(
        &mut self,
        name: &str,
        items: Vec<Value>,
        mut f: impl FnMut(&mut Self, Value) -> Result<T>,
    ) -> Result<Vec<T>> {
        let mut decoded = Vec::with_capacity(items.len());
        let mut errors = Vec::new();

        for (index, item) in items.into_iter().enumerate() {
            let segment = if name.is_empty() {
                format!("[{}]", index)
            } else {
                format!("{}[{}]", name, index)
            };
            match self.scoped(segment, |ctx| f(ctx, item)) {
                Ok(value) => decoded.push(value),
                Err(e) => errors.push(e),
            }
        }

        if errors.is_empty() {
            Ok(decoded)
        } else {
            Err(DslError::many(errors))
        }
    }

    /// Record a key nobody consumed.
    pub(crate) fn unknown(&mut self, key: &str) {
        let path = self.path();
        let located = if path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", path, key)
        };
        debug!(target: "quarry::codec", "unknown key `{}`", located);
        self.unknown_keys.push(located);
    }

    /// Record every key left in `obj`.
    pub(crate) fn finish(&mut self, obj: Object) {
        for key in obj.keys() {
            self.unknown(key);
        }
    }

    /// Close the invocation: attach the diagnostic to a failure, log it on
    /// success.
    pub(crate) fn conclude<T>(self, what: &str, result: Result<T>) -> std::result::Result<T, DecodeError> {
        match result {
            Ok(value) => {
                if !self.unknown_keys.is_empty() {
                    warn!(
                        target: "quarry::codec",
                        "{}: ignored unknown keys [{}]",
                        what,
                        self.unknown_keys.join(", ")
                    );
                }
                Ok(value)
            }
            Err(e) => {
                debug!(target: "quarry::codec", "{} failed to decode: {}", what, e);
                Err(DecodeError::new(e, self.unknown_keys))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_path_rendering() {
        let mut ctx = DecodeContext::new();
        let path = ctx
            .scoped("bool", |ctx| ctx.scoped("must[0]", |ctx| Ok(ctx.path())))
            .unwrap();
        assert_eq!(path, "bool.must[0]");
        assert_eq!(ctx.path(), "");
    }

    #[test]
    fn test_scoped_locates_error() {
        let mut ctx = DecodeContext::new();
        let err = ctx
            .scoped("ids", |_| -> Result<()> { Err(DslError::missing("values")) })
            .unwrap_err();
        assert_eq!(err.path(), Some("ids"));
    }

    #[test]
    fn test_each_collects_every_failure() {
        let mut ctx = DecodeContext::new();
        let items = vec![json!(1), json!("x"), json!(2), json!("y")];
        let err = ctx
            .each("values", items, |_, v| {
                v.as_i64().ok_or_else(|| DslError::structural("not a number"))
            })
            .unwrap_err();
        let flat = err.flatten();
        assert_eq!(flat.len(), 2);
        assert_eq!(flat[0].path(), Some("values[1]"));
        assert_eq!(flat[1].path(), Some("values[3]"));
    }

    #[test]
    fn test_unknown_keys_are_located() {
        let mut ctx = DecodeContext::new();
        ctx.scoped("term", |ctx| {
            ctx.unknown("boots");
            Ok(())
        })
        .unwrap();
        assert_eq!(ctx.unknown_keys(), ["term.boots".to_string()]);
    }
}
