/// Section of the file a [`super::Definition`] came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    /// Constructors: the start of the file, or after `---types---`.
    Types,
    /// Methods: after `---functions---`.
    Functions,
}

impl Category {
    /// The category a `---types---` / `---functions---` line switches to.
    pub fn from_separator(line: &str) -> Option<Self> {
        match line {
            "---types---" => Some(Self::Types),
            "---functions---" => Some(Self::Functions),
            _ => None,
        }
    }
}
