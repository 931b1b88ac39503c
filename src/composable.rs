//! Variable substitution for configuration inputs.
//!
//! String values inside `[[inputs]]` may reference variables as
//! `${env.NAME}` or `${env.NAME|fallback}`. An input referencing a variable
//! that is unset and has no fallback is dropped from the rendered document.
//!
//! The env provider can be switched off with:
//! ```toml
//! [providers.env]
//! enabled = false
//! ```

use std::collections::BTreeMap;

use thiserror::Error;

use crate::config::Document;

/// Errors raised while rendering variables.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ComposableError {
    #[error("`providers.env.enabled` must be a boolean")]
    InvalidProvider,

    #[error("unterminated variable reference in {0:?}")]
    Unterminated(String),

    #[error("unsupported variable {0:?}, expected env.<NAME>")]
    UnknownProvider(String),
}

#[derive(Debug, Clone)]
enum Vars {
    Disabled,
    Env,
    Static(BTreeMap<String, String>),
}

/// Resolves variable references in configuration inputs.
#[derive(Debug, Clone)]
pub struct VarsController {
    vars: Vars,
}

impl VarsController {
    /// Build a controller from the raw configuration's `[providers]` table.
    pub fn new(raw: &Document) -> Result<Self, ComposableError> {
        let enabled = match raw
            .get("providers")
            .and_then(|p| p.get("env"))
            .and_then(|env| env.get("enabled"))
        {
            None => true,
            Some(toml::Value::Boolean(enabled)) => *enabled,
            Some(_) => return Err(ComposableError::InvalidProvider),
        };

        let vars = if enabled { Vars::Env } else { Vars::Disabled };
        Ok(Self { vars })
    }

    /// Build a controller resolving `env.*` from a fixed map.
    pub fn from_map(vars: BTreeMap<String, String>) -> Self {
        Self {
            vars: Vars::Static(vars),
        }
    }

    /// Render every input, dropping inputs with unresolved variables.
    pub fn render(&self, mut doc: Document) -> Result<Document, ComposableError> {
        if matches!(self.vars, Vars::Disabled) {
            return Ok(doc);
        }
        let Some(toml::Value::Array(inputs)) = doc.remove("inputs") else {
            return Ok(doc);
        };

        let mut rendered = Vec::with_capacity(inputs.len());
        for mut input in inputs {
            if self.render_value(&mut input)? {
                rendered.push(input);
            } else {
                tracing::debug!(input = ?input.get("id"), "Input dropped, unresolved variable");
            }
        }
        doc.insert("inputs".to_string(), toml::Value::Array(rendered));
        Ok(doc)
    }

    /// Returns false when some variable could not be resolved.
    fn render_value(&self, value: &mut toml::Value) -> Result<bool, ComposableError> {
        match value {
            toml::Value::String(s) => match self.render_str(s)? {
                Some(resolved) => {
                    *s = resolved;
                    Ok(true)
                }
                None => Ok(false),
            },
            toml::Value::Array(items) => {
                for item in items {
                    if !self.render_value(item)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            toml::Value::Table(table) => {
                for (_, item) in table.iter_mut() {
                    if !self.render_value(item)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            _ => Ok(true),
        }
    }

    fn render_str(&self, s: &str) -> Result<Option<String>, ComposableError> {
        let mut out = String::with_capacity(s.len());
        let mut rest = s;

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after
                .find('}')
                .ok_or_else(|| ComposableError::Unterminated(s.to_string()))?;

            let (name, fallback) = match after[..end].split_once('|') {
                Some((name, fallback)) => (name.trim(), Some(fallback.trim())),
                None => (after[..end].trim(), None),
            };
            let key = name
                .strip_prefix("env.")
                .ok_or_else(|| ComposableError::UnknownProvider(name.to_string()))?;

            match self.lookup(key).or_else(|| fallback.map(str::to_string)) {
                Some(v) => out.push_str(&v),
                None => return Ok(None),
            }
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        Ok(Some(out))
    }

    fn lookup(&self, key: &str) -> Option<String> {
        match &self.vars {
            Vars::Disabled => None,
            Vars::Env => std::env::var(key).ok(),
            Vars::Static(map) => map.get(key).cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> VarsController {
        VarsController::from_map(BTreeMap::from([
            ("HOST".to_string(), "db.internal".to_string()),
            ("PORT".to_string(), "5432".to_string()),
        ]))
    }

    fn doc(s: &str) -> Document {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn test_substitutes_nested_values() {
        let rendered = controller()
            .render(doc(
                r#"
                [[inputs]]
                type = "postgres"
                hosts = ["${env.HOST}:${env.PORT}"]
                [inputs.tls]
                server_name = "${ env.HOST }"
                "#,
            ))
            .unwrap();

        let input = &rendered["inputs"].as_array().unwrap()[0];
        assert_eq!(input["hosts"][0].as_str(), Some("db.internal:5432"));
        assert_eq!(input["tls"]["server_name"].as_str(), Some("db.internal"));
    }

    #[test]
    fn test_fallback_and_dropped_inputs() {
        let rendered = controller()
            .render(doc(
                r#"
                [[inputs]]
                type = "a"
                path = "${env.MISSING|/var/log}"
                [[inputs]]
                type = "b"
                path = "${env.MISSING}"
                "#,
            ))
            .unwrap();

        let inputs = rendered["inputs"].as_array().unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0]["path"].as_str(), Some("/var/log"));
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            controller()
                .render(doc("[[inputs]]\ntype = \"${env.HOST\"\n"))
                .unwrap_err(),
            ComposableError::Unterminated("${env.HOST".into())
        );
        assert!(matches!(
            controller().render(doc("[[inputs]]\ntype = \"${host.name}\"\n")),
            Err(ComposableError::UnknownProvider(_))
        ));
    }

    #[test]
    fn test_disabled_provider_leaves_document_alone() {
        let raw = doc("[providers.env]\nenabled = false\n");
        let ctrl = VarsController::new(&raw).unwrap();
        let rendered = ctrl.render(doc("[[inputs]]\npath = \"${env.X}\"\n")).unwrap();
        assert_eq!(rendered["inputs"][0]["path"].as_str(), Some("${env.X}"));

        let bad = doc("[providers.env]\nenabled = \"no\"\n");
        assert_eq!(VarsController::new(&bad).unwrap_err(), ComposableError::InvalidProvider);
    }
}
