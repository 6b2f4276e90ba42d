use crate::symbol::SymbolStore;
use crate::term::{TermId, TermStore};
use smallvec::SmallVec;

pub(crate) fn setup() -> (SymbolStore, TermStore) {
    (SymbolStore::new(), TermStore::new())
}

/// Build a sequence of atoms from their names.
pub(crate) fn atom_seq(names: &[&str], symbols: &SymbolStore, terms: &TermStore) -> TermId {
    let items: SmallVec<[TermId; 4]> = names.iter().map(|n| terms.sym(symbols.intern(n))).collect();
    terms.seq(items)
}
