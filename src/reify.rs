use crate::subst::Subst;
use crate::symbol::SymbolStore;
use crate::term::{Term, TermId, TermStore};
use smallvec::SmallVec;

/// Deep walk: resolve a term under a substitution, then rebuild every
/// composite with its children resolved too. Unbound variables stay as
/// variables.
///
/// Uses an explicit work stack plus a result stack instead of recursion;
/// composites are visited twice, once to schedule their children and
/// once to rebuild from the accumulated results.
pub fn walk_all(term: TermId, s: &Subst, terms: &TermStore) -> TermId {
    let mut work: Vec<(TermId, bool)> = vec![(term, false)];
    let mut results: Vec<TermId> = Vec::new();

    while let Some((tid, children_done)) = work.pop() {
        if children_done {
            // Children are resolved; rebuild this composite
            match terms.resolve(tid) {
                Some(Term::Seq(items)) => {
                    let n = items.len();
                    let rebuilt: SmallVec<[TermId; 4]> =
                        results.drain(results.len() - n..).collect();
                    results.push(terms.seq(rebuilt));
                }
                Some(Term::Tuple(items)) => {
                    let n = items.len();
                    let rebuilt: SmallVec<[TermId; 4]> =
                        results.drain(results.len() - n..).collect();
                    results.push(terms.tuple(rebuilt));
                }
                Some(Term::Map(pairs)) => {
                    let n = pairs.len();
                    let values: Vec<TermId> = results.drain(results.len() - n..).collect();
                    let rebuilt = pairs.iter().map(|(k, _)| *k).zip(values);
                    results.push(terms.map(rebuilt));
                }
                _ => unreachable!("only composites are revisited"),
            }
        } else {
            let walked = s.walk(tid, terms);
            match terms.resolve(walked) {
                Some(Term::Seq(items)) | Some(Term::Tuple(items)) if !items.is_empty() => {
                    work.push((walked, true));
                    for item in items.iter().rev() {
                        work.push((*item, false));
                    }
                }
                Some(Term::Map(pairs)) if !pairs.is_empty() => {
                    work.push((walked, true));
                    for (_, v) in pairs.iter().rev() {
                        work.push((*v, false));
                    }
                }
                _ => results.push(walked),
            }
        }
    }

    assert_eq!(results.len(), 1);
    results.pop().unwrap()
}

/// Display name for the k-th unbound variable met during reification.
pub fn reify_name(k: usize) -> String {
    format!("_{}", k)
}

/// Build the reification substitution for a term: every unbound variable
/// encountered, left to right, is mapped to a placeholder atom `_k`
/// where `k` is the number of placeholders assigned so far.
pub fn reify_s(term: TermId, r: &Subst, terms: &TermStore, symbols: &SymbolStore) -> Subst {
    let mut r = r.clone();
    let mut stack: SmallVec<[TermId; 16]> = SmallVec::new();
    stack.push(term);

    while let Some(t) = stack.pop() {
        let t = r.walk(t, terms);
        match terms.resolve(t) {
            Some(Term::Var(v)) => {
                let placeholder = terms.sym(symbols.intern(&reify_name(r.len())));
                // placeholders are ground atoms, no occurs check needed
                r = r.bind(v, placeholder);
            }
            Some(Term::Seq(items)) | Some(Term::Tuple(items)) => {
                for item in items.iter().rev() {
                    stack.push(*item);
                }
            }
            Some(Term::Map(pairs)) => {
                for (_, v) in pairs.iter().rev() {
                    stack.push(*v);
                }
            }
            _ => {}
        }
    }

    r
}

/// Reify a term under a substitution: the substitution-independent view
/// of the term, with `_0, _1, ...` standing in for variables that remain
/// unbound. The result is always ground.
pub fn reify(term: TermId, s: &Subst, terms: &TermStore, symbols: &SymbolStore) -> TermId {
    let resolved = walk_all(term, s, terms);
    let names = reify_s(resolved, &Subst::empty(), terms, symbols);
    walk_all(resolved, &names, terms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Key;
    use crate::test_utils::setup;
    use crate::unify::unify;
    use smallvec::smallvec;

    fn is_ground(term: TermId, terms: &TermStore) -> bool {
        let mut stack = vec![term];
        while let Some(t) = stack.pop() {
            match terms.resolve(t) {
                Some(Term::Var(_)) => return false,
                Some(Term::Seq(items)) | Some(Term::Tuple(items)) => {
                    stack.extend(items.iter().copied())
                }
                Some(Term::Map(pairs)) => stack.extend(pairs.iter().map(|(_, v)| *v)),
                _ => {}
            }
        }
        true
    }

    // ========== WALK_ALL ==========

    #[test]
    fn walk_all_resolves_nested_bindings() {
        let (_, terms) = setup();
        let x = terms.fresh_var("x");
        let y = terms.fresh_var("y");
        let one = terms.int(1);
        let two = terms.int(2);

        // x = [y, 1], y = 2  =>  walk_all(x) = [2, 1]
        let s = unify(x, terms.seq(smallvec![y, one]), &Subst::empty(), &terms).unwrap();
        let s = unify(y, two, &s, &terms).unwrap();

        assert_eq!(
            walk_all(x, &s, &terms),
            terms.seq(smallvec![two, one])
        );
    }

    #[test]
    fn walk_all_keeps_unbound_vars() {
        let (_, terms) = setup();
        let x = terms.fresh_var("x");
        let seq = terms.seq(smallvec![x, terms.int(1)]);
        assert_eq!(walk_all(seq, &Subst::empty(), &terms), seq);
    }

    #[test]
    fn walk_all_descends_into_tuples_and_maps() {
        let (symbols, terms) = setup();
        let x = terms.fresh_var("x");
        let olive = terms.sym(symbols.intern("olive"));
        let s = unify(x, olive, &Subst::empty(), &terms).unwrap();

        let tup = terms.tuple(smallvec![x]);
        assert_eq!(walk_all(tup, &s, &terms), terms.tuple(smallvec![olive]));

        let k = Key::Sym(symbols.intern("k"));
        let m = terms.map([(k, x)]);
        assert_eq!(walk_all(m, &s, &terms), terms.map([(k, olive)]));
    }

    #[test]
    fn walk_all_on_atoms_is_identity() {
        let (_, terms) = setup();
        let one = terms.int(1);
        assert_eq!(walk_all(one, &Subst::empty(), &terms), one);
        let nil = terms.seq(smallvec![]);
        assert_eq!(walk_all(nil, &Subst::empty(), &terms), nil);
    }

    // ========== REIFY ==========

    #[test]
    fn reify_names_unbound_vars_in_order() {
        let (symbols, terms) = setup();
        let x = terms.fresh_var("x");
        let y = terms.fresh_var("y");
        let seq = terms.seq(smallvec![x, terms.int(1), y]);

        let reified = reify(seq, &Subst::empty(), &terms, &symbols);
        let u0 = terms.sym(symbols.intern("_0"));
        let u1 = terms.sym(symbols.intern("_1"));
        assert_eq!(reified, terms.seq(smallvec![u0, terms.int(1), u1]));
    }

    #[test]
    fn reify_shares_placeholders_for_repeated_vars() {
        let (symbols, terms) = setup();
        let x = terms.fresh_var("x");
        let seq = terms.seq(smallvec![x, x]);

        let reified = reify(seq, &Subst::empty(), &terms, &symbols);
        let u0 = terms.sym(symbols.intern("_0"));
        assert_eq!(reified, terms.seq(smallvec![u0, u0]));
    }

    #[test]
    fn reify_is_ground_for_bound_and_unbound_mixes() {
        let (symbols, terms) = setup();
        let x = terms.fresh_var("x");
        let y = terms.fresh_var("y");
        let z = terms.fresh_var("z");
        let olive = terms.sym(symbols.intern("olive"));

        let s = unify(y, olive, &Subst::empty(), &terms).unwrap();
        let query = terms.seq(smallvec![x, y, terms.tuple(smallvec![z, x])]);

        let reified = reify(query, &s, &terms, &symbols);
        assert!(is_ground(reified, &terms), "reified terms must contain no variables");
    }

    #[test]
    fn reify_resolves_bindings_before_naming() {
        let (symbols, terms) = setup();
        let x = terms.fresh_var("x");
        let y = terms.fresh_var("y");

        // x = [y, 1], y = 2
        let s = unify(x, terms.seq(smallvec![y, terms.int(1)]), &Subst::empty(), &terms).unwrap();
        let s = unify(y, terms.int(2), &s, &terms).unwrap();

        let reified = reify(x, &s, &terms, &symbols);
        assert_eq!(reified, terms.seq(smallvec![terms.int(2), terms.int(1)]));
    }

    #[test]
    fn reify_name_format() {
        assert_eq!(reify_name(0), "_0");
        assert_eq!(reify_name(17), "_17");
    }

    #[test]
    fn reify_s_counts_from_current_size() {
        let (symbols, terms) = setup();
        let x = terms.fresh_var("x");
        let y = terms.fresh_var("y");

        let r = reify_s(x, &Subst::empty(), &terms, &symbols);
        assert_eq!(r.len(), 1);
        let r = reify_s(y, &r, &terms, &symbols);
        assert_eq!(r.len(), 2);
        assert_eq!(
            r.get(terms.as_var(y).unwrap()),
            Some(terms.sym(symbols.intern("_1")))
        );
    }
}
