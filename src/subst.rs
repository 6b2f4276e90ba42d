use crate::term::{Term, TermId, TermStore, VarId};
use crate::unify::UnifyError;
use smallvec::SmallVec;

/// A substitution maps variable identities to terms.
///
/// Backed by a persistent hash-array-mapped trie: `extend` returns a new
/// substitution and leaves the original valid, so the branches of a
/// disjunction share structure instead of copying bindings. The no-cycle
/// invariant is maintained by `extend`, which is the only checked
/// mutator; once a variable is bound it is never rebound.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Subst {
    bindings: im::HashMap<VarId, TermId>,
}

impl Subst {
    /// The empty substitution (identity mapping).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Get the binding for a variable, if any.
    pub fn get(&self, var: VarId) -> Option<TermId> {
        self.bindings.get(&var).copied()
    }

    /// Number of bound variables.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if the substitution is empty (no bindings).
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Iterator over (variable, term) pairs for bound variables.
    pub fn iter(&self) -> impl Iterator<Item = (VarId, TermId)> + '_ {
        self.bindings.iter().map(|(v, t)| (*v, *t))
    }

    /// Unchecked persistent insert. Callers must guarantee the binding
    /// cannot introduce a cycle (the reifier binds ground placeholders).
    pub(crate) fn bind(&self, var: VarId, term: TermId) -> Subst {
        Subst {
            bindings: self.bindings.update(var, term),
        }
    }

    /// Shallow walk: follow variable-to-variable chains until reaching a
    /// non-variable term or an unbound variable. Does not descend into
    /// composites. Terminates because extensions are occurs-checked.
    pub fn walk(&self, term: TermId, terms: &TermStore) -> TermId {
        let mut current = term;
        loop {
            match terms.resolve(current) {
                Some(Term::Var(v)) => match self.get(v) {
                    Some(bound) => current = bound,
                    None => return current,
                },
                _ => return current,
            }
        }
    }

    /// Occurs check: does variable `var` occur in `term` under this
    /// substitution? Walks each visited term and descends into sequence
    /// and tuple elements and map values.
    ///
    /// Uses an explicit stack to avoid recursion.
    pub fn occurs(&self, var: VarId, term: TermId, terms: &TermStore) -> bool {
        let mut stack: SmallVec<[TermId; 16]> = SmallVec::new();
        stack.push(term);

        while let Some(t) = stack.pop() {
            let t = self.walk(t, terms);
            match terms.resolve(t) {
                Some(Term::Var(v)) => {
                    if v == var {
                        return true;
                    }
                }
                Some(Term::Seq(items)) | Some(Term::Tuple(items)) => {
                    stack.extend(items.iter().copied());
                }
                Some(Term::Map(pairs)) => {
                    stack.extend(pairs.iter().map(|(_, v)| *v));
                }
                _ => {}
            }
        }

        false
    }

    /// Extend the substitution with `var -> term`, rejecting the binding
    /// if it would create a cyclic term. Returns a new substitution; the
    /// receiver is unchanged.
    pub fn extend(
        &self,
        var: VarId,
        term: TermId,
        terms: &TermStore,
    ) -> Result<Subst, UnifyError> {
        if self.occurs(var, term, terms) {
            return Err(UnifyError::OccursCheck);
        }
        Ok(self.bind(var, term))
    }
}
