//! Compound-name and selector grammar shared across bridgekit
//!
//! This crate contains the name types the rename engine works with: compound
//! declaration names with argument labels on the Swift side, and
//! colon-separated selectors on the clang side. It is kept free of server
//! dependencies so both the engine and its tests can use it directly.

use std::fmt;

/// One parameter slot of a compound name: either a named argument label or
/// the wildcard (`_` or empty) that marks an unnamed argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parameter {
    Named(String),
    Wildcard,
}

impl Parameter {
    /// The label, if this parameter has one
    pub fn label(&self) -> Option<&str> {
        match self {
            Parameter::Named(label) => Some(label),
            Parameter::Wildcard => None,
        }
    }

    /// The spelling used at declaration sites: the label, or `_` when unnamed
    pub fn label_or_underscore(&self) -> &str {
        match self {
            Parameter::Named(label) => label,
            Parameter::Wildcard => "_",
        }
    }

    /// The spelling used at call sites: the label, or nothing when unnamed
    pub fn label_or_empty(&self) -> &str {
        match self {
            Parameter::Named(label) => label,
            Parameter::Wildcard => "",
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Parameter::Wildcard)
    }
}

/// A function-like name carrying ordered argument labels, written
/// `base(label1:label2:)`. A plain identifier is a compound name with no
/// parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundName {
    base_name: String,
    parameters: Vec<Parameter>,
}

impl CompoundName {
    pub fn new(base_name: impl Into<String>, parameters: Vec<Parameter>) -> Self {
        Self {
            base_name: base_name.into(),
            parameters,
        }
    }

    /// Parse a compound name. Total: any input yields a name.
    ///
    /// Without a `(` the whole string is the base name. Otherwise the base is
    /// the text before `(` and the parenthesized body splits on `:`, one
    /// parameter per label; the empty segment after the final `:` is dropped.
    /// Empty and `_` labels are wildcards.
    pub fn parse(input: &str) -> Self {
        let Some(open) = input.find('(') else {
            return Self {
                base_name: input.to_string(),
                parameters: Vec::new(),
            };
        };

        let base_name = input[..open].to_string();
        let body = &input[open + 1..];
        let body = body.strip_suffix(')').unwrap_or(body);

        if body.is_empty() {
            return Self {
                base_name,
                parameters: Vec::new(),
            };
        }

        let mut segments: Vec<&str> = body.split(':').collect();
        // The segment after the final colon is not a parameter.
        if segments.last() == Some(&"") {
            segments.pop();
        }

        let parameters = segments
            .into_iter()
            .map(|label| {
                if label.is_empty() || label == "_" {
                    Parameter::Wildcard
                } else {
                    Parameter::Named(label.to_string())
                }
            })
            .collect();

        Self {
            base_name,
            parameters,
        }
    }

    /// Reconstruct the textual form. Unnamed labels render as `_`; a name
    /// with no parameters renders as the bare base name.
    pub fn render(&self) -> String {
        if self.parameters.is_empty() {
            return self.base_name.clone();
        }
        let mut out = String::with_capacity(self.base_name.len() + self.parameters.len() * 4 + 2);
        out.push_str(&self.base_name);
        out.push('(');
        for parameter in &self.parameters {
            out.push_str(parameter.label_or_underscore());
            out.push(':');
        }
        out.push(')');
        out
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// The parameter at `index`, if the name has that many
    pub fn parameter(&self, index: usize) -> Option<&Parameter> {
        self.parameters.get(index)
    }
}

impl fmt::Display for CompoundName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Split a selector such as `doThing:with:` into its pieces, dropping the
/// empty trailing segment. A zero-argument selector yields a single piece.
pub fn selector_pieces(selector: &str) -> Vec<&str> {
    selector.split(':').filter(|piece| !piece.is_empty()).collect()
}

/// Whether a selector takes no arguments (carries no colon)
pub fn is_zero_arg_selector(selector: &str) -> bool {
    !selector.contains(':')
}
