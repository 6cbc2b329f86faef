//! Route template compilation
//!
//! A route template like `/users/:id` is compiled once at registration time
//! into an anchored regular expression plus the ordered list of parameter
//! names. Segments beginning with `:` are named parameters restricted to the
//! character class `[A-Za-z0-9_-]`; every other segment is matched verbatim.
//!
//! Compilation fails fast: a malformed parameter token is a [`PatternError`]
//! at registration time, never a request-time surprise.

use std::collections::HashMap;

use http::Method;
use regex::Regex;
use thiserror::Error;

/// Character class a path parameter value (and name) must match
const PARAM_CLASS: &str = "[A-Za-z0-9_-]";

/// Errors raised while compiling a route template
#[derive(Debug, Error)]
pub enum PatternError {
    /// A `:` segment with nothing after the colon
    #[error("template {template:?}: parameter segment has an empty name")]
    EmptyParamName {
        /// The offending template
        template: String,
    },

    /// A parameter name containing a character outside `[A-Za-z0-9_-]`
    #[error("template {template:?}: invalid character {found:?} in parameter name {name:?}")]
    InvalidParamName {
        /// The offending template
        template: String,
        /// The parameter name as written
        name: String,
        /// The first character that is not allowed
        found: char,
    },

    /// The same parameter name used twice in one template
    #[error("template {template:?}: duplicate parameter name {name:?}")]
    DuplicateParamName {
        /// The offending template
        template: String,
        /// The repeated name
        name: String,
    },

    /// The assembled expression failed to compile
    #[error("template {template:?}: {source}")]
    Compile {
        /// The offending template
        template: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },
}

/// A compiled route template.
///
/// Owns the raw template, the matchable expression, and the parameter names
/// in declaration order. The expression is anchored over `method + path` and
/// accepts one optional trailing slash, so `/users/:id` registered for GET
/// matches both `GET /users/42` and `GET /users/42/`.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    template: String,
    regex: Regex,
    param_names: Vec<String>,
    literal_segments: usize,
}

impl RoutePattern {
    /// Compile a template for the given method.
    ///
    /// # Errors
    ///
    /// Returns a [`PatternError`] for an empty parameter name, an illegal
    /// character in a parameter name, or a duplicate parameter name.
    pub fn compile(method: &Method, template: &str) -> Result<Self, PatternError> {
        let mut param_names: Vec<String> = Vec::new();
        let mut literal_segments = 0;
        let mut expression = String::from("^");
        expression.push_str(&regex::escape(method.as_str()));

        for (index, segment) in template.split('/').enumerate() {
            if index > 0 {
                expression.push('/');
            }

            if let Some(name) = segment.strip_prefix(':') {
                if name.is_empty() {
                    return Err(PatternError::EmptyParamName {
                        template: template.to_string(),
                    });
                }
                if let Some(found) = name
                    .chars()
                    .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
                {
                    return Err(PatternError::InvalidParamName {
                        template: template.to_string(),
                        name: name.to_string(),
                        found,
                    });
                }
                if param_names.iter().any(|existing| existing == name) {
                    return Err(PatternError::DuplicateParamName {
                        template: template.to_string(),
                        name: name.to_string(),
                    });
                }
                param_names.push(name.to_string());
                expression.push('(');
                expression.push_str(PARAM_CLASS);
                expression.push_str("+)");
            } else {
                if !segment.is_empty() {
                    literal_segments += 1;
                }
                expression.push_str(&regex::escape(segment));
            }
        }

        expression.push_str("/?$");

        let regex = Regex::new(&expression).map_err(|source| PatternError::Compile {
            template: template.to_string(),
            source,
        })?;

        Ok(Self {
            template: template.to_string(),
            regex,
            param_names,
            literal_segments,
        })
    }

    /// The raw template this pattern was compiled from
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Parameter names in declaration order
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Number of literal (non-parameter) segments, used for match precedence
    pub fn literal_segments(&self) -> usize {
        self.literal_segments
    }

    /// Test whether the pattern matches the incoming method and path
    pub fn matches(&self, method: &Method, path: &str) -> bool {
        let target = [method.as_str(), path].concat();
        self.regex.is_match(&target)
    }

    /// Extract path parameters by aligning captured groups with the
    /// pattern's parameter names in declaration order.
    ///
    /// Returns an empty map when the pattern does not match.
    pub fn extract(&self, method: &Method, path: &str) -> HashMap<String, String> {
        let target = [method.as_str(), path].concat();
        let Some(captures) = self.regex.captures(&target) else {
            return HashMap::new();
        };

        self.param_names
            .iter()
            .enumerate()
            .filter_map(|(index, name)| {
                captures
                    .get(index + 1)
                    .map(|value| (name.clone(), value.as_str().to_string()))
            })
            .collect()
    }
}
