//! Public API for relog - embeddable relational programming.
//!
//! The [`Engine`] owns the symbol and term stores and provides the host
//! surface: term builders, query drivers, and display formatting. Goals
//! themselves are built with the combinators in [`crate::goal`] (or the
//! `conj!`/`disj!`/`fresh!`/`conde!` macros) over terms minted here.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::goal::Goal;
use crate::reify::reify;
use crate::solve;
use crate::symbol::SymbolStore;
use crate::term::{format_term, Key, TermId, TermStore};

#[cfg(feature = "tracing")]
use crate::trace::debug_span;

/// The engine for building terms and executing relational queries.
///
/// One engine corresponds to one run's worth of identity: variables
/// minted here are unique for the engine's lifetime, and terms are
/// hash-consed so structural equality is id equality.
pub struct Engine {
    /// Symbol store for interning atom and string spellings.
    symbols: Arc<SymbolStore>,
    /// Term store for hashconsing terms and minting variables.
    terms: TermStore,
}

impl Engine {
    /// Create a new empty engine.
    pub fn new() -> Self {
        Self {
            symbols: Arc::new(SymbolStore::new()),
            terms: TermStore::new(),
        }
    }

    /// Get a reference to the symbol store.
    pub fn symbols(&self) -> &SymbolStore {
        &self.symbols
    }

    /// Get a reference to the term store.
    pub fn terms(&self) -> &TermStore {
        &self.terms
    }

    /// Create an atom term.
    pub fn sym(&self, name: &str) -> TermId {
        self.terms.sym(self.symbols.intern(name))
    }

    /// Create an integer term.
    pub fn int(&self, n: i64) -> TermId {
        self.terms.int(n)
    }

    /// Create a floating-point term.
    pub fn float(&self, x: f64) -> TermId {
        self.terms.float(x)
    }

    /// Create a boolean term.
    pub fn boolean(&self, b: bool) -> TermId {
        self.terms.boolean(b)
    }

    /// Create a string-constant term.
    pub fn string(&self, s: &str) -> TermId {
        self.terms.string(self.symbols.intern(s))
    }

    /// Create a sequence term.
    pub fn seq(&self, items: impl Into<SmallVec<[TermId; 4]>>) -> TermId {
        self.terms.seq(items.into())
    }

    /// Create a tuple term.
    pub fn tuple(&self, items: impl Into<SmallVec<[TermId; 4]>>) -> TermId {
        self.terms.tuple(items.into())
    }

    /// Create a map term from key/value entries.
    pub fn map(&self, entries: impl IntoIterator<Item = (Key, TermId)>) -> TermId {
        self.terms.map(entries)
    }

    /// An atom map key.
    pub fn sym_key(&self, name: &str) -> Key {
        Key::Sym(self.symbols.intern(name))
    }

    /// A string map key.
    pub fn str_key(&self, s: &str) -> Key {
        Key::Str(self.symbols.intern(s))
    }

    /// Mint a fresh logic variable with a display name.
    pub fn var(&self, name: &str) -> TermId {
        self.terms.fresh_var(name)
    }

    /// Mint a fresh anonymous logic variable.
    pub fn fresh(&self) -> TermId {
        self.terms.fresh_var("unnamed")
    }

    /// Run a goal, collecting at most `n` answers. Each answer is the
    /// query variables, as a sequence, reified against the answering
    /// substitution; answer order preserves stream order.
    pub fn run(&self, n: usize, query: &[TermId], goal: &Goal) -> Vec<TermId> {
        #[cfg(feature = "tracing")]
        let _span = debug_span!("run", limit = n).entered();

        let q = self.terms.seq(SmallVec::from_slice(query));
        solve::run_goal(n, goal, &self.terms)
            .iter()
            .map(|s| reify(q, s, &self.terms, &self.symbols))
            .collect()
    }

    /// Run a goal to exhaustion, reifying every answer. Terminates iff
    /// the goal's answer stream is finite.
    pub fn run_all(&self, query: &[TermId], goal: &Goal) -> Vec<TermId> {
        #[cfg(feature = "tracing")]
        let _span = debug_span!("run_all").entered();

        let q = self.terms.seq(SmallVec::from_slice(query));
        solve::run_all(goal, &self.terms)
            .iter()
            .map(|s| reify(q, s, &self.terms, &self.symbols))
            .collect()
    }

    /// Render a term for display.
    pub fn format(&self, term: TermId) -> Result<String, String> {
        format_term(term, &self.terms, &self.symbols)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/api.rs"]
mod tests;
