use std::fmt;
use std::str::FromStr;

use crate::errors::ParamParseError;
use crate::tl::Type;

/// `flags.3` in `reply_to:flags.3?InputReplyTo`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Flag {
    /// Name of the `#` field holding the bit.
    pub name: String,
    /// Bit number, `0..32`.
    pub index: u32,
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.name, self.index)
    }
}

impl FromStr for Flag {
    type Err = ParamParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((name, bit)) = s.split_once('.') else {
            return Err(ParamParseError::InvalidFlag);
        };
        if name.is_empty() {
            return Err(ParamParseError::InvalidFlag);
        }
        match bit.parse::<u32>() {
            Ok(index) if index < 32 => Ok(Self { name: name.to_owned(), index }),
            Ok(index) => Err(ParamParseError::FlagBitOutOfRange(index)),
            Err(_) => Err(ParamParseError::InvalidFlag),
        }
    }
}

/// Right-hand side of a `name:...` parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParameterType {
    /// `#`: a flags word. Never set by callers; encoders derive it from the
    /// optional fields that point at it.
    Flags,
    /// Any other type, possibly behind a flag bit.
    Normal {
        /// The value type.
        ty: Type,
        /// Condition for the field to be present on the wire.
        flag: Option<Flag>,
    },
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flags => f.write_str("#"),
            Self::Normal { ty, flag: Some(flag) } => write!(f, "{flag}?{ty}"),
            Self::Normal { ty, flag: None } => write!(f, "{ty}"),
        }
    }
}

impl FromStr for ParameterType {
    type Err = ParamParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "#" {
            return Ok(Self::Flags);
        }
        let (flag, ty) = match s.split_once('?') {
            Some((cond, ty)) => (Some(cond.parse::<Flag>()?), ty),
            None => (None, s),
        };
        Ok(Self::Normal { ty: ty.parse()?, flag })
    }
}

/// One `name:type` pair of a declaration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Parameter {
    /// Field name.
    pub name: String,
    /// Field type.
    pub ty: ParameterType,
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.ty)
    }
}

impl FromStr for Parameter {
    type Err = ParamParseError;

    /// `{X:Type}` lists are not parameters; [`super::Definition`] parses
    /// those itself.
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        if token.starts_with('{') {
            return Err(ParamParseError::InvalidTypeDef);
        }
        match token.split_once(':') {
            Some((name, ty)) if !name.is_empty() && !ty.is_empty() => {
                Ok(Self { name: name.to_owned(), ty: ty.parse()? })
            }
            Some(_) => Err(ParamParseError::Empty),
            None => Err(ParamParseError::NotImplemented),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_bits() {
        assert_eq!("flags2.31".parse::<Flag>().unwrap().index, 31);
        assert_eq!("flags.32".parse::<Flag>(), Err(ParamParseError::FlagBitOutOfRange(32)));
        assert_eq!("flags".parse::<Flag>(), Err(ParamParseError::InvalidFlag));
        assert_eq!(".1".parse::<Flag>(), Err(ParamParseError::InvalidFlag));
        assert_eq!("flags.x".parse::<Flag>(), Err(ParamParseError::InvalidFlag));
    }

    #[test]
    fn conditional_parameter() {
        let p: Parameter = "reply_to:flags.3?InputReplyTo".parse().unwrap();
        match &p.ty {
            ParameterType::Normal { ty, flag: Some(flag) } => {
                assert_eq!(ty.name, "InputReplyTo");
                assert_eq!(flag.to_string(), "flags.3");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(p.to_string(), "reply_to:flags.3?InputReplyTo");
    }

    #[test]
    fn malformed_parameters() {
        assert_eq!("flags:#".parse::<Parameter>().unwrap().ty, ParameterType::Flags);
        assert_eq!("id".parse::<Parameter>(), Err(ParamParseError::NotImplemented));
        assert_eq!(":int".parse::<Parameter>(), Err(ParamParseError::Empty));
        assert_eq!("{X:Type}".parse::<Parameter>(), Err(ParamParseError::InvalidTypeDef));
    }
}
