use lasso::{Spur, ThreadedRodeo};

/// A unique identifier for an interned atom or string constant.
/// Interning makes equality a key comparison.
pub type SymId = Spur;

/// Thread-safe store for interning atom names, string constants, and
/// reified placeholder names.
///
/// Guarantees:
/// - Same string always produces same SymId
/// - Different strings always produce different SymIds
/// - SymId can be resolved back to the original string
pub struct SymbolStore {
    rodeo: ThreadedRodeo,
}

impl SymbolStore {
    /// Create a new empty symbol store.
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::new(),
        }
    }

    /// Intern a string, returning its unique SymId.
    /// If the string was already interned, returns the existing SymId.
    pub fn intern(&self, name: &str) -> SymId {
        self.rodeo.get_or_intern(name)
    }

    /// Resolve a SymId back to its string.
    /// Returns None if the SymId was not created by this store.
    pub fn resolve(&self, id: SymId) -> Option<&str> {
        self.rodeo.try_resolve(&id)
    }

    /// Get the SymId for a string if it exists, without interning.
    pub fn get(&self, name: &str) -> Option<SymId> {
        self.rodeo.get(name)
    }
}

impl Default for SymbolStore {
    fn default() -> Self {
        Self::new()
    }
}
