use std::fmt;
use std::str::FromStr;

use crate::errors::ParamParseError;

/// A type expression: `upload.File`, `Vector<%Message>`, `!X`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Type {
    /// Leading dotted parts, `["upload"]` for `upload.File`.
    pub namespace: Vec<String>,
    /// Last dotted part.
    pub name: String,
    /// Written lowercase or with `%`; encoded without a constructor id.
    pub bare: bool,
    /// Written with `!`: refers to a `{X:Type}` generic of the declaration.
    pub generic_ref: bool,
    /// `long` in `Vector<long>`.
    pub generic_arg: Option<Box<Type>>,
}

impl Type {
    /// Dotted name including namespace.
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            return self.name.clone();
        }
        format!("{}.{}", self.namespace.join("."), self.name)
    }

    pub(crate) fn collect_generic_refs<'a>(&'a self, output: &mut Vec<&'a str>) {
        let mut cur = Some(self);
        while let Some(ty) = cur {
            if ty.generic_ref {
                output.push(&ty.name);
            }
            cur = ty.generic_arg.as_deref();
        }
    }

    fn lowercase_name(&self) -> bool {
        self.name.starts_with(|c: char| c.is_ascii_lowercase())
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bang = if self.generic_ref { "!" } else { "" };
        let percent = if self.bare && !self.lowercase_name() { "%" } else { "" };
        write!(f, "{bang}{percent}{}", self.full_name())?;
        match &self.generic_arg {
            Some(arg) => write!(f, "<{arg}>"),
            None => Ok(()),
        }
    }
}

impl FromStr for Type {
    type Err = ParamParseError;

    /// ```
    /// use layer_tl_parser::tl::Type;
    /// assert!("Vector<long>".parse::<Type>().is_ok());
    /// assert!("!X".parse::<Type>().unwrap().generic_ref);
    /// assert!("%Message".parse::<Type>().unwrap().bare);
    /// ```
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut rest = raw;
        let generic_ref = rest.starts_with('!');
        if generic_ref {
            rest = &rest[1..];
        }
        let percent = rest.starts_with('%');
        if percent {
            rest = &rest[1..];
        }

        let generic_arg = match rest.find('<') {
            Some(open) => {
                let inner = rest[open + 1..]
                    .strip_suffix('>')
                    .ok_or(ParamParseError::InvalidGeneric)?;
                let arg = inner.parse::<Type>()?;
                rest = &rest[..open];
                Some(Box::new(arg))
            }
            None => None,
        };

        let mut parts: Vec<String> = rest.split('.').map(str::to_owned).collect();
        if parts.iter().any(String::is_empty) {
            return Err(ParamParseError::Empty);
        }
        let name = parts.pop().ok_or(ParamParseError::Empty)?;

        let mut ty = Self { namespace: parts, name, bare: percent, generic_ref, generic_arg };
        ty.bare |= ty.lowercase_name();
        Ok(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_marks_bare() {
        let ty: Type = "Vector<%Message>".parse().unwrap();
        assert!(!ty.bare);
        let arg = ty.generic_arg.unwrap();
        assert!(arg.bare);
        assert_eq!(arg.name, "Message");
        assert_eq!(arg.to_string(), "%Message");
    }

    #[test]
    fn lowercase_is_bare_without_percent() {
        let ty: Type = "vector<int>".parse().unwrap();
        assert!(ty.bare);
        assert_eq!(ty.to_string(), "vector<int>");
    }

    #[test]
    fn namespaces() {
        let ty: Type = "storage.FileType".parse().unwrap();
        assert_eq!(ty.namespace, vec!["storage"]);
        assert_eq!(ty.full_name(), "storage.FileType");
        assert_eq!("a..B".parse::<Type>(), Err(ParamParseError::Empty));
        assert_eq!("".parse::<Type>(), Err(ParamParseError::Empty));
    }

    #[test]
    fn nested_generic_refs() {
        let ty: Type = "Vector<!X>".parse().unwrap();
        let mut refs = Vec::new();
        ty.collect_generic_refs(&mut refs);
        assert_eq!(refs, ["X"]);
    }

    #[test]
    fn unclosed_generic_is_rejected() {
        assert_eq!("Vector<int".parse::<Type>(), Err(ParamParseError::InvalidGeneric));
    }
}
