//! Tab completion over the registered command names.
//!
//! [`CompletionEngine`] is pure: every call recomputes candidates from the
//! [`CompletionIndex`] and the current buffer, holding no state between
//! keystrokes. [`CommandHelper`] adapts it to rustyline.

use std::sync::Arc;

use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

/// One command's contribution to completion: its name and the static
/// literals offered for its argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionEntry {
    pub name: String,
    pub options: Vec<String>,
}

/// Completion data for every registered command, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionIndex {
    entries: Vec<CompletionEntry>,
}

impl CompletionIndex {
    pub fn push(&mut self, name: impl Into<String>, options: &[String]) {
        self.entries.push(CompletionEntry {
            name: name.into(),
            options: options.to_vec(),
        });
    }

    pub fn entries(&self) -> &[CompletionEntry] {
        &self.entries
    }
}

/// A single suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Full text of the suggestion, e.g. `"echo world"`.
    pub display: String,
    /// Part of `display` after the caret; this is what gets inserted.
    pub suffix: String,
}

/// Result of one completion request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub candidates: Vec<Candidate>,
    /// Length of the prefix the candidates were matched against. Inside an
    /// argument region this is the remainder length plus one, for
    /// compatibility with readline-style completion consumers.
    pub length: usize,
}

impl Completion {
    pub fn suffixes(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.suffix.as_str()).collect()
    }
}

/// Computes completion candidates for an input buffer.
#[derive(Debug, Clone, Default)]
pub struct CompletionEngine {
    index: Arc<CompletionIndex>,
}

impl CompletionEngine {
    pub fn new(index: Arc<CompletionIndex>) -> Self {
        Self { index }
    }

    /// Complete `line` with the caret at byte offset `pos`.
    ///
    /// Only the text before the caret is considered.
    pub fn complete(&self, line: &str, pos: usize) -> Completion {
        let pos = pos.min(line.len());
        let buffer = line.get(..pos).unwrap_or(line);
        let lowered = buffer.to_lowercase();

        for entry in self.index.entries() {
            if let Some(remainder) = argument_region(buffer, &entry.name) {
                return Completion {
                    candidates: argument_candidates(entry, remainder, pos),
                    length: remainder.len() + 1,
                };
            }
        }

        let candidates = self
            .index
            .entries()
            .iter()
            .filter(|entry| entry.name.to_lowercase().starts_with(&lowered))
            .filter_map(|entry| candidate(&entry.name, pos))
            .collect();
        Completion {
            candidates,
            length: buffer.len(),
        }
    }
}

/// Text after `"<name> "` when `buffer` starts with it, ignoring case.
///
/// Offsets come from the buffer itself, since lower-casing can change a
/// name's byte length.
fn argument_region<'a>(buffer: &'a str, name: &str) -> Option<&'a str> {
    let name_lowered = name.to_lowercase();
    let mut offset = 0;
    for ch in buffer.chars() {
        if buffer[..offset].to_lowercase() == name_lowered {
            return buffer[offset..].strip_prefix(' ');
        }
        if buffer[..offset].to_lowercase().len() > name_lowered.len() {
            return None;
        }
        offset += ch.len_utf8();
    }
    None
}

fn argument_candidates(entry: &CompletionEntry, remainder: &str, pos: usize) -> Vec<Candidate> {
    let typed = remainder.to_lowercase();
    entry
        .options
        .iter()
        .filter(|option| option.to_lowercase().starts_with(&typed))
        .filter_map(|option| candidate(&format!("{} {}", entry.name, option), pos))
        .collect()
}

/// `full` keeps the registered casing, so a suffix may differ in case from
/// what was typed: `"echo WOR"` completes to `"echo WORld"`. This is intended.
fn candidate(full: &str, pos: usize) -> Option<Candidate> {
    let suffix = full.get(pos..)?;
    Some(Candidate {
        display: full.to_string(),
        suffix: suffix.to_string(),
    })
}

/// rustyline helper that routes tab completion through a [`CompletionEngine`].
#[derive(Default)]
pub(crate) struct CommandHelper {
    engine: CompletionEngine,
}

impl CommandHelper {
    pub(crate) fn new(engine: CompletionEngine) -> Self {
        Self { engine }
    }
}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let completion = self.engine.complete(line, pos);
        // Suffixes are inserted at the caret, so nothing before it is replaced.
        let pairs = completion
            .candidates
            .into_iter()
            .map(|c| Pair {
                display: c.display,
                replacement: c.suffix,
            })
            .collect();
        Ok((pos, pairs))
    }
}

impl Hinter for CommandHelper {
    type Hint = String;
}

impl Highlighter for CommandHelper {}

impl Validator for CommandHelper {}

impl Helper for CommandHelper {}
