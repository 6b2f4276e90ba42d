use crate::symbol::{SymId, SymbolStore};
use hashbrown::HashMap;
use lasso::Key as InternKey;
use parking_lot::RwLock;
use rustc_hash::FxHasher;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};

/// Unique identifier for a term in the term store.
/// TermIds are stable and can be compared for equality; hash-consing
/// guarantees structurally equal terms receive the same TermId.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(u32);

impl TermId {
    /// Get the raw u32 value (for debugging/display).
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Identity of a logic variable. Two variables are the same variable
/// iff their VarIds are equal; display names play no semantic role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(u32);

impl VarId {
    /// Get the raw u32 value (for debugging/display).
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// A numeric constant: integer or floating point.
/// Floats compare and hash by bit pattern, so `Num` is a well-behaved
/// map key for hash-consing. `Int(1)` and `Float(1.0)` are distinct.
#[derive(Debug, Clone, Copy)]
pub enum Num {
    Int(i64),
    Float(f64),
}

impl PartialEq for Num {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => a == b,
            (Num::Float(a), Num::Float(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for Num {}

impl Hash for Num {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Num::Int(n) => {
                state.write_u8(0);
                n.hash(state);
            }
            Num::Float(x) => {
                state.write_u8(1);
                x.to_bits().hash(state);
            }
        }
    }
}

/// A ground atomic map key. Restricting keys to atomic constants keeps
/// map canonicalization and domain comparison decidable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Bool(bool),
    Int(i64),
    Sym(SymId),
    Str(SymId),
}

impl Key {
    fn rank(&self) -> u8 {
        match self {
            Key::Bool(_) => 0,
            Key::Int(_) => 1,
            Key::Sym(_) => 2,
            Key::Str(_) => 3,
        }
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Key::Bool(a), Key::Bool(b)) => a.cmp(b),
            (Key::Int(a), Key::Int(b)) => a.cmp(b),
            (Key::Sym(a), Key::Sym(b)) | (Key::Str(a), Key::Str(b)) => {
                a.into_usize().cmp(&b.into_usize())
            }
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// A term is a logic variable, an atomic constant, or a composite.
///
/// `Seq` and `Tuple` never unify with each other; `Map` entries are kept
/// sorted by key so structurally equal maps hash-cons to the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// A logic variable, identified by its VarId.
    Var(VarId),
    /// An interned atom.
    Sym(SymId),
    /// A numeric constant.
    Num(Num),
    /// A boolean constant.
    Bool(bool),
    /// An interned string constant (distinct from `Sym`).
    Str(SymId),
    /// An ordered, finite sequence of terms.
    Seq(SmallVec<[TermId; 4]>),
    /// A fixed-arity tuple of terms.
    Tuple(SmallVec<[TermId; 4]>),
    /// A mapping from ground atomic keys to terms, sorted by key.
    Map(SmallVec<[(Key, TermId); 2]>),
}

/// Number of shards for hashcons maps (power of 2 for fast modulo).
const NUM_SHARDS: usize = 16;

/// Thread-safe term store with hashconsing, doubling as the variable
/// factory.
///
/// Guarantees:
/// - Structurally equal terms get the same TermId
/// - TermId can be resolved back to the term
/// - Every `fresh_var` call mints a VarId never seen before in this store
pub struct TermStore {
    /// Central storage of all terms, indexed by TermId.
    nodes: RwLock<Vec<Term>>,
    /// Sharded hashcons maps for reducing contention.
    shards: [RwLock<HashMap<Term, TermId>>; NUM_SHARDS],
    /// Counter for generating unique TermIds.
    next_id: AtomicU32,
    /// Display names of minted variables, indexed by VarId.
    var_names: RwLock<Vec<Box<str>>>,
}

impl TermStore {
    /// Create a new empty term store.
    pub fn new() -> Self {
        let shards = std::array::from_fn(|_| RwLock::new(HashMap::new()));
        Self {
            nodes: RwLock::new(Vec::new()),
            shards,
            next_id: AtomicU32::new(0),
            var_names: RwLock::new(Vec::new()),
        }
    }

    /// Intern a term, returning its TermId.
    /// If the term already exists, returns the existing TermId.
    fn intern(&self, term: Term) -> TermId {
        let shard_idx = Self::shard_index(&term);
        let shard = &self.shards[shard_idx];

        // Fast path: check if term exists (read lock)
        {
            let map = shard.read();
            if let Some(&id) = map.get(&term) {
                return id;
            }
        }

        // Slow path: need to insert (write lock)
        let mut map = shard.write();

        // Double-check after acquiring write lock
        if let Some(&id) = map.get(&term) {
            return id;
        }

        let id = TermId(self.next_id.fetch_add(1, AtomicOrdering::Relaxed));
        {
            let mut nodes = self.nodes.write();
            let idx = id.0 as usize;
            if nodes.len() <= idx {
                nodes.resize(idx + 1, Term::Bool(false)); // placeholder
            }
            nodes[idx] = term.clone();
        }
        map.insert(term, id);
        id
    }

    /// Mint a fresh logic variable with the given display name.
    /// The returned TermId wraps a VarId unique within this store.
    pub fn fresh_var(&self, name: &str) -> TermId {
        let var = {
            let mut names = self.var_names.write();
            let id = VarId(names.len() as u32);
            names.push(name.into());
            id
        };
        self.intern(Term::Var(var))
    }

    /// Get the display name a variable was minted with.
    pub fn var_name(&self, var: VarId) -> Option<String> {
        self.var_names
            .read()
            .get(var.0 as usize)
            .map(|n| n.to_string())
    }

    /// Create an atom term.
    pub fn sym(&self, id: SymId) -> TermId {
        self.intern(Term::Sym(id))
    }

    /// Create a numeric term.
    pub fn num(&self, n: Num) -> TermId {
        self.intern(Term::Num(n))
    }

    /// Create an integer term.
    pub fn int(&self, n: i64) -> TermId {
        self.num(Num::Int(n))
    }

    /// Create a floating-point term.
    pub fn float(&self, x: f64) -> TermId {
        self.num(Num::Float(x))
    }

    /// Create a boolean term.
    pub fn boolean(&self, b: bool) -> TermId {
        self.intern(Term::Bool(b))
    }

    /// Create a string-constant term.
    pub fn string(&self, id: SymId) -> TermId {
        self.intern(Term::Str(id))
    }

    /// Create a sequence term.
    pub fn seq(&self, items: SmallVec<[TermId; 4]>) -> TermId {
        self.intern(Term::Seq(items))
    }

    /// Create a tuple term.
    pub fn tuple(&self, items: SmallVec<[TermId; 4]>) -> TermId {
        self.intern(Term::Tuple(items))
    }

    /// Create a map term. Entries are canonicalized: duplicate keys
    /// resolve last-wins, then the entries are sorted by key, so maps
    /// built in any order hash-cons to the same id.
    pub fn map(&self, entries: impl IntoIterator<Item = (Key, TermId)>) -> TermId {
        let mut dedup: HashMap<Key, TermId> = HashMap::new();
        for (k, v) in entries {
            dedup.insert(k, v);
        }
        let mut pairs: SmallVec<[(Key, TermId); 2]> = dedup.into_iter().collect();
        pairs.sort_by(|(a, _), (b, _)| a.cmp(b));
        self.intern(Term::Map(pairs))
    }

    /// Resolve a TermId to its term.
    /// Returns None if the TermId is invalid.
    pub fn resolve(&self, id: TermId) -> Option<Term> {
        let nodes = self.nodes.read();
        nodes.get(id.0 as usize).cloned()
    }

    /// If the term is a variable, return its VarId.
    pub fn as_var(&self, id: TermId) -> Option<VarId> {
        match self.resolve(id)? {
            Term::Var(v) => Some(v),
            _ => None,
        }
    }

    /// Get the shard index for a term (for hashconsing distribution).
    fn shard_index(term: &Term) -> usize {
        let mut hasher = FxHasher::default();
        term.hash(&mut hasher);
        (hasher.finish() as usize) % NUM_SHARDS
    }
}

impl Default for TermStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a term for display. Sequences print as `[a b c]`, tuples as
/// `#[a b c]`, maps as `{k: v, ...}` in key order, variables as `?name`
/// (or `?<id>` when unnamed).
pub fn format_term(
    term: TermId,
    terms: &TermStore,
    symbols: &SymbolStore,
) -> Result<String, String> {
    fn render_key(key: &Key, symbols: &SymbolStore, out: &mut String) -> Result<(), String> {
        match key {
            Key::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Key::Int(n) => out.push_str(&n.to_string()),
            Key::Sym(id) => {
                let name = symbols
                    .resolve(*id)
                    .ok_or_else(|| format!("Unknown symbol for key {:?}", id))?;
                out.push_str(name);
            }
            Key::Str(id) => {
                let s = symbols
                    .resolve(*id)
                    .ok_or_else(|| format!("Unknown string for key {:?}", id))?;
                out.push_str(&format!("{:?}", s));
            }
        }
        Ok(())
    }

    fn render(
        term: TermId,
        terms: &TermStore,
        symbols: &SymbolStore,
        out: &mut String,
    ) -> Result<(), String> {
        match terms.resolve(term) {
            Some(Term::Var(v)) => {
                let name = terms
                    .var_name(v)
                    .ok_or_else(|| format!("Unknown variable id {:?}", v))?;
                out.push('?');
                if name == "unnamed" {
                    out.push_str(&v.raw().to_string());
                } else {
                    out.push_str(&name);
                }
                Ok(())
            }
            Some(Term::Sym(id)) => {
                let name = symbols
                    .resolve(id)
                    .ok_or_else(|| format!("Unknown symbol for id {:?}", id))?;
                out.push_str(name);
                Ok(())
            }
            Some(Term::Num(Num::Int(n))) => {
                out.push_str(&n.to_string());
                Ok(())
            }
            Some(Term::Num(Num::Float(x))) => {
                out.push_str(&x.to_string());
                Ok(())
            }
            Some(Term::Bool(b)) => {
                out.push_str(if b { "true" } else { "false" });
                Ok(())
            }
            Some(Term::Str(id)) => {
                let s = symbols
                    .resolve(id)
                    .ok_or_else(|| format!("Unknown string for id {:?}", id))?;
                out.push_str(&format!("{:?}", s));
                Ok(())
            }
            Some(Term::Seq(items)) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    render(*item, terms, symbols, out)?;
                }
                out.push(']');
                Ok(())
            }
            Some(Term::Tuple(items)) => {
                out.push_str("#[");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    render(*item, terms, symbols, out)?;
                }
                out.push(']');
                Ok(())
            }
            Some(Term::Map(pairs)) => {
                out.push('{');
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    render_key(k, symbols, out)?;
                    out.push_str(": ");
                    render(*v, terms, symbols, out)?;
                }
                out.push('}');
                Ok(())
            }
            None => Err(format!("Unknown term id {:?}", term)),
        }
    }

    let mut out = String::new();
    render(term, terms, symbols, &mut out)?;
    Ok(out)
}
