//! Conflict resolvers behind `tl merge --on-conflict`.

use std::io::{BufRead, Write};

use clap::ValueEnum;
use layer_tl_schema::{Conflict, ConflictResolver, Resolution};

/// What `tl merge` does when top-layer sources disagree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OnConflict {
    /// Abort the merge.
    Fail,
    /// Ask on the terminal.
    Prompt,
    /// Keep the definition from the first source listed.
    First,
    /// Leave the entry out.
    Drop,
}

/// Non-interactive policies.
pub struct Policy(pub OnConflict);

impl ConflictResolver for Policy {
    fn resolve(&mut self, conflict: &Conflict<'_>) -> Option<Resolution> {
        match self.0 {
            OnConflict::Fail | OnConflict::Prompt => None,
            OnConflict::First => conflict.top_candidates().next().cloned().map(Resolution::Keep),
            OnConflict::Drop => Some(Resolution::Drop),
        }
    }
}

/// Shows the candidates and reads the choice from `input`.
///
/// A number keeps that candidate, `d` drops the entry, anything else (or end
/// of input) leaves the conflict unresolved.
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, conflict: &Conflict<'_>) -> std::io::Result<Option<Resolution>> {
        writeln!(
            self.output,
            "conflict on {} `{}` ({}):",
            conflict.kind, conflict.name, conflict.reason
        )?;
        for (i, candidate) in conflict.candidates.iter().enumerate() {
            match candidate.entry {
                Some(entry) => writeln!(self.output, "  [{i}] layer {}: {entry}", candidate.layer)?,
                None => writeln!(self.output, "  [{i}] layer {}: (absent)", candidate.layer)?,
            }
        }
        write!(self.output, "keep which? [number / d = drop / q = abort] ")?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        let answer = line.trim();

        if answer.eq_ignore_ascii_case("d") {
            return Ok(Some(Resolution::Drop));
        }
        let picked = answer
            .parse::<usize>()
            .ok()
            .and_then(|i| conflict.candidates.get(i))
            .map(|c| match c.entry {
                Some(entry) => Resolution::Keep(entry.clone()),
                None => Resolution::Drop,
            });
        Ok(picked)
    }
}

impl<R: BufRead, W: Write> ConflictResolver for Prompt<R, W> {
    fn resolve(&mut self, conflict: &Conflict<'_>) -> Option<Resolution> {
        self.ask(conflict).unwrap_or_else(|e| {
            log::warn!("[tl-cli] prompt failed: {e}");
            None
        })
    }
}

#[cfg(test)]
mod tests {
    use layer_tl_parser::ParseOptions;
    use layer_tl_schema::{merge_schemas, LayeredSchema, MergeError, TlFullSchema};

    use super::*;

    fn sources() -> Vec<LayeredSchema> {
        let a = TlFullSchema::from_tl("user#00000001 id:int = User;", ParseOptions::default()).unwrap();
        let b = TlFullSchema::from_tl("user#00000002 id:int = User;", ParseOptions::default()).unwrap();
        vec![LayeredSchema::new(1, a), LayeredSchema::new(1, b)]
    }

    #[test]
    fn policies() {
        let first = merge_schemas(&sources(), &mut Policy(OnConflict::First)).unwrap();
        assert_eq!(first.schema.class("user").unwrap().id, 1);

        let dropped = merge_schemas(&sources(), &mut Policy(OnConflict::Drop)).unwrap();
        assert!(dropped.schema.entries().is_empty());

        let err = merge_schemas(&sources(), &mut Policy(OnConflict::Fail)).unwrap_err();
        assert!(matches!(err, MergeError::Conflict { .. }));
    }

    #[test]
    fn prompt_picks_candidate() {
        let mut out = Vec::new();
        let mut prompt = Prompt::new(&b"1\n"[..], &mut out);
        let merged = merge_schemas(&sources(), &mut prompt).unwrap();
        assert_eq!(merged.schema.class("user").unwrap().id, 2);

        let shown = String::from_utf8(out).unwrap();
        assert!(shown.contains("conflict on class `user` (id mismatch)"));
        assert!(shown.contains("[0] layer 1: user#00000001 id:int = User;"));
    }

    #[test]
    fn prompt_drop_and_abort() {
        let merged = merge_schemas(&sources(), &mut Prompt::new(&b"d\n"[..], Vec::new())).unwrap();
        assert!(merged.schema.class("user").is_none());

        assert!(merge_schemas(&sources(), &mut Prompt::new(&b"q\n"[..], Vec::new())).is_err());
        assert!(merge_schemas(&sources(), &mut Prompt::new(&b""[..], Vec::new())).is_err());
    }
}
