use std::fmt;

use crate::errors::ParamParseError;

/// A `{X:Type}` generic parameter declared by a definition.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Generic {
    /// The placeholder name, referenced as `!X` by parameters.
    pub name: String,
    /// The bound, almost always `Type`.
    pub bound: String,
}

impl fmt::Display for Generic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.bound)
    }
}

impl Generic {
    /// Parses a `{X:Type}` or `{X:Type,Y:Type}` token.
    pub(crate) fn parse_list(token: &str) -> Result<Vec<Self>, ParamParseError> {
        let inner = token
            .strip_prefix('{')
            .and_then(|t| t.strip_suffix('}'))
            .ok_or(ParamParseError::InvalidTypeDef)?;

        inner
            .split(',')
            .map(|item| match item.trim().split_once(':') {
                Some((name, bound)) if !name.is_empty() && !bound.is_empty() => Ok(Self {
                    name: name.to_owned(),
                    bound: bound.to_owned(),
                }),
                _ => Err(ParamParseError::InvalidTypeDef),
            })
            .collect()
    }
}
