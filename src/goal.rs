use crate::stream::Stream;
use crate::subst::Subst;
use crate::term::{TermId, TermStore};
use crate::unify::unify;
use std::fmt;
use std::sync::Arc;

/// A goal: a pure function from a substitution to a lazy stream of
/// substitutions. Goals are first-class, cheap to clone, and never
/// mutate their input; a failing goal is simply one whose stream is
/// empty.
///
/// The term store is threaded through application so that goals can
/// walk bindings and `call_with_fresh` can mint variables.
#[derive(Clone)]
pub struct Goal {
    run: Arc<dyn Fn(&TermStore, &Subst) -> Stream + Send + Sync>,
}

impl Goal {
    /// Build a goal from a raw function.
    pub fn new(f: impl Fn(&TermStore, &Subst) -> Stream + Send + Sync + 'static) -> Self {
        Goal { run: Arc::new(f) }
    }

    /// Apply the goal to a substitution.
    pub fn call(&self, terms: &TermStore, s: &Subst) -> Stream {
        (self.run)(terms, s)
    }
}

impl fmt::Debug for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Goal(..)")
    }
}

/// The goal that always succeeds, passing its substitution through.
pub fn succeed() -> Goal {
    Goal::new(|_, s| Stream::unit(s.clone()))
}

/// The goal that always fails.
pub fn fail() -> Goal {
    Goal::new(|_, _| Stream::empty())
}

/// The unification goal: succeeds with the extended substitution when
/// `u` and `v` unify, fails (empty stream) otherwise. Occurs-check
/// failures and structural mismatches are indistinguishable here.
pub fn eq(u: TermId, v: TermId) -> Goal {
    Goal::new(move |terms, s| match unify(u, v, s, terms) {
        Ok(next) => Stream::unit(next),
        Err(_) => Stream::empty(),
    })
}

/// Disjunction: answers from either goal, interleaved fairly whenever
/// one side suspends.
pub fn disj(g1: Goal, g2: Goal) -> Goal {
    Goal::new(move |terms, s| Stream::append(g1.call(terms, s), g2.call(terms, s)))
}

/// Conjunction: `g2` runs in every answer `g1` produces.
pub fn conj(g1: Goal, g2: Goal) -> Goal {
    Goal::new(move |terms, s| Stream::append_map(g2.clone(), g1.call(terms, s), terms))
}

/// Mint a fresh variable and hand it to the goal constructor. The
/// variable is created at application time, so every answer path gets
/// its own.
pub fn call_with_fresh<F>(name: impl Into<String>, f: F) -> Goal
where
    F: Fn(TermId) -> Goal + Send + Sync + 'static,
{
    let name = name.into();
    Goal::new(move |terms, s| f(terms.fresh_var(&name)).call(terms, s))
}

/// Wrap a goal so its application is deferred behind a suspension.
/// Recursive relations must go through this (or an equivalent
/// suspension) to keep disjunctions over them productive.
pub fn delay(g: Goal) -> Goal {
    Goal::new(move |_, s| {
        let g = g.clone();
        let s = s.clone();
        Stream::suspension(move |terms| g.call(terms, &s))
    })
}

/// N-ary conjunction, folded to the right. Empty folds to `succeed`.
pub fn all(goals: impl IntoIterator<Item = Goal>) -> Goal {
    let goals: Vec<Goal> = goals.into_iter().collect();
    goals
        .into_iter()
        .rev()
        .fold(None, |acc, g| {
            Some(match acc {
                None => g,
                Some(rest) => conj(g, rest),
            })
        })
        .unwrap_or_else(succeed)
}

/// N-ary disjunction, folded to the right. Empty folds to `fail`.
pub fn any(goals: impl IntoIterator<Item = Goal>) -> Goal {
    let goals: Vec<Goal> = goals.into_iter().collect();
    goals
        .into_iter()
        .rev()
        .fold(None, |acc, g| {
            Some(match acc {
                None => g,
                Some(rest) => disj(g, rest),
            })
        })
        .unwrap_or_else(fail)
}

/// `conde`: a disjunction of conjunctions, one per clause.
pub fn conde(clauses: impl IntoIterator<Item = Vec<Goal>>) -> Goal {
    any(clauses.into_iter().map(all))
}

/// Soft cut: if `g1` has any answer, behave as `conj(g1, g2)`;
/// otherwise behave as `g3`. Probing `g1` forces its stream to the
/// first committed shape.
pub fn ifte(g1: Goal, g2: Goal, g3: Goal) -> Goal {
    Goal::new(move |terms, s| {
        let mut probe = g1.call(terms, s);
        loop {
            match probe {
                Stream::Empty => return g3.call(terms, s),
                Stream::Cons(_, _) => return Stream::append_map(g2.clone(), probe, terms),
                Stream::Suspension(t) => probe = t.force(terms),
            }
        }
    })
}

/// Truncate a goal to its first answer.
pub fn once(g: Goal) -> Goal {
    Goal::new(move |terms, s| {
        let mut probe = g.call(terms, s);
        loop {
            match probe {
                Stream::Empty => return Stream::empty(),
                Stream::Cons(head, _) => return Stream::unit(head),
                Stream::Suspension(t) => probe = t.force(terms),
            }
        }
    })
}

/// Conjunction of a block of goals, folded to the right.
/// `conj!()` is `succeed()`.
#[macro_export]
macro_rules! conj {
    () => { $crate::goal::succeed() };
    ($g:expr $(,)?) => { $g };
    ($g0:expr, $($g:expr),+ $(,)?) => {
        $crate::goal::conj($g0, $crate::conj!($($g),+))
    };
}

/// Disjunction of a block of goals, folded to the right.
/// `disj!()` is `fail()`.
#[macro_export]
macro_rules! disj {
    () => { $crate::goal::fail() };
    ($g:expr $(,)?) => { $g };
    ($g0:expr, $($g:expr),+ $(,)?) => {
        $crate::goal::disj($g0, $crate::disj!($($g),+))
    };
}

/// Bind fresh variables over a conjunction:
/// `fresh!((x, y), eq(x, y))` nests one `call_with_fresh` per variable.
#[macro_export]
macro_rules! fresh {
    ((), $($g:expr),* $(,)?) => { $crate::conj!($($g),*) };
    (($x:ident $(, $rest:ident)*), $($g:expr),* $(,)?) => {
        $crate::goal::call_with_fresh(stringify!($x), move |$x| {
            $crate::fresh!(($($rest),*), $($g),*)
        })
    };
}

/// `conde!` clauses are bracketed conjunctions separated by `;`:
/// `conde!([g1, g2]; [g3])` is `disj(conj(g1, g2), g3)`.
#[macro_export]
macro_rules! conde {
    ($([$($g:expr),* $(,)?]);* $(;)?) => {
        $crate::disj!($($crate::conj!($($g),*)),*)
    };
}
