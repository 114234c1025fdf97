use std::fmt;
use std::str::FromStr;

use crate::errors::{ParamParseError, ParseErrorKind};
use crate::tl::{Category, Generic, Parameter, ParameterType, Type};
use crate::ParseOptions;

/// One declaration, constructor or method.
///
/// `messages.sendMessage#0d9d75a4 flags:# peer:InputPeer = Updates;` has
/// namespace `["messages"]`, name `sendMessage`, three parameters and type
/// `Updates`.
#[derive(Clone, Debug, PartialEq)]
pub struct Definition {
    /// Dotted prefix of the name; empty for the root namespace.
    pub namespace: Vec<String>,

    /// Name without the namespace.
    pub name: String,

    /// Explicit `#id`, or the hash of the declaration text.
    pub id: u32,

    /// `{X:Type}` generics, in declaration order.
    pub generics: Vec<Generic>,

    /// Parameters in wire order.
    pub params: Vec<Parameter>,

    /// Union type of a constructor, result type of a method.
    pub ty: Type,

    /// Section the declaration appeared in.
    pub category: Category,

    /// The `//` comment block directly above the declaration.
    pub comment: Option<String>,
}

impl Definition {
    /// Dotted name including namespace.
    pub fn full_name(&self) -> String {
        self.namespace
            .iter()
            .map(String::as_str)
            .chain([self.name.as_str()])
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Parses a single declaration (with or without the trailing `;`).
    pub fn parse(raw: &str, options: &ParseOptions) -> Result<Self, ParseErrorKind> {
        let raw = raw.trim().trim_end_matches(';').trim();
        if raw.is_empty() {
            return Err(ParseErrorKind::Empty);
        }

        let Some((lhs, rhs)) = raw.split_once('=') else {
            return Err(ParseErrorKind::MissingType);
        };
        let rhs = rhs.trim();
        if rhs.is_empty() {
            return Err(ParseErrorKind::MissingType);
        }
        let mut ty: Type = rhs.parse().map_err(|_| ParseErrorKind::MissingType)?;

        let mut tokens = lhs.split_whitespace();
        let head = tokens.next().ok_or(ParseErrorKind::MissingName)?;
        let (full_name, explicit_id) = match head.split_once('#') {
            Some((n, id)) => (n, Some(id)),
            None => (head, None),
        };

        let mut namespace: Vec<String> = full_name.split('.').map(str::to_owned).collect();
        if namespace.iter().any(String::is_empty) {
            return Err(ParseErrorKind::MissingName);
        }
        let name = namespace.pop().ok_or(ParseErrorKind::MissingName)?;

        let id = match (explicit_id, options.id_hasher) {
            (Some(hex), _) => u32::from_str_radix(hex.trim(), 16).map_err(ParseErrorKind::InvalidId)?,
            (None, Some(hasher)) => hasher(raw),
            (None, None) => return Err(ParseErrorKind::MissingId),
        };

        let mut generics: Vec<Generic> = Vec::new();
        let mut flag_defs: Vec<String> = Vec::new();
        let mut params: Vec<Parameter> = Vec::new();

        for token in tokens {
            if token.starts_with('{') {
                generics.extend(Generic::parse_list(token)?);
                continue;
            }

            let param: Parameter = token.parse()?;
            match &param.ty {
                ParameterType::Flags => flag_defs.push(param.name.clone()),
                ParameterType::Normal { ty, flag } => {
                    // flags words and generics must be declared before use
                    let flag_known = flag.as_ref().is_none_or(|f| flag_defs.contains(&f.name));
                    let mut refs = Vec::new();
                    ty.collect_generic_refs(&mut refs);
                    let generics_known = refs.iter().all(|r| generics.iter().any(|g| g.name == *r));
                    if !flag_known || !generics_known {
                        return Err(ParamParseError::MissingDef.into());
                    }
                }
            }
            params.push(param);
        }

        // `= X` where X is declared generic
        if generics.iter().any(|g| g.name == ty.name) {
            ty.generic_ref = true;
        }

        Ok(Definition {
            namespace,
            name,
            id,
            generics,
            params,
            ty,
            // set by the file iterator
            category: Category::Types,
            comment: None,
        })
    }
}

impl fmt::Display for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{:08x}", self.full_name(), self.id)?;
        if !self.generics.is_empty() {
            let list = self.generics.iter().map(Generic::to_string).collect::<Vec<_>>();
            write!(f, " {{{}}}", list.join(","))?;
        }
        for p in &self.params {
            write!(f, " {p}")?;
        }
        write!(f, " = {};", ReturnType(&self.ty))
    }
}

/// Return types are written without the `!` generic marker.
struct ReturnType<'a>(&'a Type);

impl fmt::Display for ReturnType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ty = self.0.clone();
        ty.generic_ref = false;
        write!(f, "{ty}")
    }
}

impl FromStr for Definition {
    type Err = ParseErrorKind;

    /// Parses with [`ParseOptions::default`], i.e. an explicit `#id` is required.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw, &ParseOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_canonical() {
        let src = "invokeWithLayer#da9b0d0d {X:Type} layer:int query:!X = X";
        let def: Definition = src.parse().unwrap();
        assert!(def.ty.generic_ref);
        assert_eq!(def.to_string(), format!("{src};"));
    }

    #[test]
    fn flag_must_be_declared_first() {
        let err = "a#1 x:flags.0?int flags:# = A".parse::<Definition>().unwrap_err();
        assert_eq!(err, ParseErrorKind::InvalidParam(ParamParseError::MissingDef));
    }

    #[test]
    fn undeclared_nested_generic_is_rejected() {
        let err = "a#1 x:Vector<!T> = A".parse::<Definition>().unwrap_err();
        assert_eq!(err, ParseErrorKind::InvalidParam(ParamParseError::MissingDef));
    }

    #[test]
    fn missing_id_without_hasher() {
        assert_eq!("a x:int = A".parse::<Definition>(), Err(ParseErrorKind::MissingId));
    }
}
