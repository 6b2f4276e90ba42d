use crate::subst::Subst;
use crate::term::{Term, TermId, TermStore};
use smallvec::SmallVec;
use thiserror::Error;

#[cfg(feature = "tracing")]
use crate::trace::{debug_span, trace};

/// Why two terms failed to unify.
///
/// Both cases mean the same thing to a goal: the branch produces no
/// answers. The distinction exists for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UnifyError {
    /// The terms have incompatible shapes.
    #[error("terms do not unify: structural mismatch")]
    Mismatch,
    /// Binding would create an infinite (cyclic) term.
    #[error("occurs check failed: variable would be bound to a term containing itself")]
    OccursCheck,
}

/// Unify two terms under a substitution, returning the extended
/// substitution on success. The input substitution is never modified;
/// bindings are only added, never rewritten.
///
/// Uses an explicit worklist to avoid recursion. The occurs check runs
/// on every variable binding, so `unify(x, [x], s)` fails rather than
/// building an infinite term.
pub fn unify(u: TermId, v: TermId, s: &Subst, terms: &TermStore) -> Result<Subst, UnifyError> {
    #[cfg(feature = "tracing")]
    let _span = debug_span!("unify", ?u, ?v).entered();

    let mut s = s.clone();
    let mut worklist: SmallVec<[(TermId, TermId); 16]> = SmallVec::new();
    worklist.push((u, v));

    while let Some((a, b)) = worklist.pop() {
        // Dereference variables through the substitution
        let a = s.walk(a, terms);
        let b = s.walk(b, terms);

        if a == b {
            // Hashconsing makes this the "identical at top level" case:
            // same variable, same atom, or structurally equal composites.
            continue;
        }

        match (terms.resolve(a), terms.resolve(b)) {
            (Some(Term::Var(x)), _) => match s.extend(x, b, terms) {
                Ok(next) => s = next,
                Err(err) => {
                    #[cfg(feature = "tracing")]
                    trace!(var = x.raw(), "unify_occurs_check_failed");
                    return Err(err);
                }
            },
            (_, Some(Term::Var(y))) => match s.extend(y, a, terms) {
                Ok(next) => s = next,
                Err(err) => {
                    #[cfg(feature = "tracing")]
                    trace!(var = y.raw(), "unify_occurs_check_failed");
                    return Err(err);
                }
            },
            (Some(Term::Seq(xs)), Some(Term::Seq(ys)))
            | (Some(Term::Tuple(xs)), Some(Term::Tuple(ys))) => {
                if xs.len() != ys.len() {
                    #[cfg(feature = "tracing")]
                    trace!("unify_arity_mismatch");
                    return Err(UnifyError::Mismatch);
                }
                // Reversed so elements unify left to right
                for (x, y) in xs.iter().zip(ys.iter()).rev() {
                    worklist.push((*x, *y));
                }
            }
            (Some(Term::Map(ps)), Some(Term::Map(qs))) => {
                if ps.len() != qs.len() {
                    #[cfg(feature = "tracing")]
                    trace!("unify_domain_mismatch");
                    return Err(UnifyError::Mismatch);
                }
                // Entries are canonically sorted, so equal domains pair
                // up positionally; values unify in key order.
                for ((k1, x), (k2, y)) in ps.iter().zip(qs.iter()).rev() {
                    if k1 != k2 {
                        #[cfg(feature = "tracing")]
                        trace!("unify_domain_mismatch");
                        return Err(UnifyError::Mismatch);
                    }
                    worklist.push((*x, *y));
                }
            }
            _ => {
                // Differing ground kinds, Seq vs Tuple, atom vs composite
                #[cfg(feature = "tracing")]
                trace!("unify_shape_mismatch");
                return Err(UnifyError::Mismatch);
            }
        }
    }

    #[cfg(feature = "tracing")]
    trace!(bindings = s.len(), "unify_success");

    Ok(s)
}
