use crate::goal::Goal;
use crate::stream::Stream;
use crate::subst::Subst;
use crate::term::TermStore;

#[cfg(feature = "tracing")]
use crate::trace::trace;

/// Force a stream until `n` answers have been produced or it runs dry.
///
/// Suspensions are forced in a plain loop, never recursively: a chain of
/// suspensions of any depth costs constant stack. `take(0, ..)` returns
/// without forcing anything.
pub fn take(n: usize, stream: Stream, terms: &TermStore) -> Vec<Subst> {
    let mut out = Vec::new();
    if n == 0 {
        return out;
    }
    let mut stream = stream;
    loop {
        match stream {
            Stream::Empty => break,
            Stream::Cons(head, rest) => {
                out.push(head);
                if out.len() == n {
                    break;
                }
                stream = *rest;
            }
            Stream::Suspension(thunk) => stream = thunk.force(terms),
        }
    }

    #[cfg(feature = "tracing")]
    trace!(requested = n, produced = out.len(), "take_complete");

    out
}

/// Force a stream to exhaustion. Terminates iff the stream is finite.
pub fn take_all(stream: Stream, terms: &TermStore) -> Vec<Subst> {
    let mut out = Vec::new();
    let mut stream = stream;
    loop {
        match stream {
            Stream::Empty => break,
            Stream::Cons(head, rest) => {
                out.push(head);
                stream = *rest;
            }
            Stream::Suspension(thunk) => stream = thunk.force(terms),
        }
    }

    #[cfg(feature = "tracing")]
    trace!(produced = out.len(), "take_all_complete");

    out
}

/// Run a goal against the empty substitution, collecting at most `n`
/// answers.
pub fn run_goal(n: usize, goal: &Goal, terms: &TermStore) -> Vec<Subst> {
    take(n, goal.call(terms, &Subst::empty()), terms)
}

/// Run a goal against the empty substitution, collecting every answer.
pub fn run_all(goal: &Goal, terms: &TermStore) -> Vec<Subst> {
    take_all(goal.call(terms, &Subst::empty()), terms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goal::{disj, eq, succeed, Goal};
    use crate::test_utils::setup;

    /// A goal that suspends forever without ever answering.
    fn nevero() -> Goal {
        Goal::new(|_, s| {
            let s = s.clone();
            Stream::suspension(move |terms| nevero().call(terms, &s))
        })
    }

    /// A goal that succeeds, then suspends, then succeeds again, forever.
    fn alwayso() -> Goal {
        Goal::new(|_, s| {
            let s = s.clone();
            Stream::suspension(move |terms| disj(succeed(), alwayso()).call(terms, &s))
        })
    }

    // ========== TAKE ==========

    #[test]
    fn take_zero_forces_nothing() {
        let (_, terms) = setup();
        // even an endless stream is safe at n = 0
        let stream = nevero().call(&terms, &Subst::empty());
        assert!(take(0, stream, &terms).is_empty());
    }

    #[test]
    fn take_bounds_the_answer_count() {
        let (_, terms) = setup();
        let x = terms.fresh_var("x");
        let g = disj(eq(x, terms.int(1)), disj(eq(x, terms.int(2)), eq(x, terms.int(3))));

        let answers = take(2, g.call(&terms, &Subst::empty()), &terms);
        assert_eq!(answers.len(), 2);
    }

    #[test]
    fn take_more_than_available_returns_all() {
        let (_, terms) = setup();
        let x = terms.fresh_var("x");
        let g = disj(eq(x, terms.int(1)), eq(x, terms.int(2)));

        let answers = take(10, g.call(&terms, &Subst::empty()), &terms);
        assert_eq!(answers.len(), 2);
    }

    #[test]
    fn take_is_a_prefix_of_take_all() {
        let (_, terms) = setup();
        let x = terms.fresh_var("x");
        let g = disj(eq(x, terms.int(1)), disj(eq(x, terms.int(2)), eq(x, terms.int(3))));

        let some = run_goal(2, &g, &terms);
        let every = run_all(&g, &terms);
        assert_eq!(some[..], every[..2]);
    }

    // ========== INFINITE STREAMS ==========

    #[test]
    fn alwayso_yields_bounded_answers() {
        let (_, terms) = setup();
        let answers = run_goal(3, &alwayso(), &terms);
        assert_eq!(answers, vec![Subst::empty(); 3]);
    }

    #[test]
    fn fair_disj_escapes_an_endless_left_branch() {
        let (symbols, terms) = setup();
        let x = terms.fresh_var("x");
        let found = terms.sym(symbols.intern("found"));

        let g = disj(nevero(), eq(x, found));
        let answers = run_goal(1, &g, &terms);
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].get(terms.as_var(x).unwrap()), Some(found));
    }

    #[test]
    fn fair_disj_interleaves_with_alwayso() {
        let (symbols, terms) = setup();
        let x = terms.fresh_var("x");
        let tea = terms.sym(symbols.intern("tea"));

        // the right branch's single answer appears despite the endless left
        let g = disj(alwayso(), eq(x, tea));
        let answers = run_goal(3, &g, &terms);
        let xv = terms.as_var(x).unwrap();
        assert!(
            answers.iter().any(|s| s.get(xv) == Some(tea)),
            "the finite branch must surface within the first few answers"
        );
    }

    #[test]
    fn deep_suspension_chains_run_in_constant_stack() {
        // a tower of suspensions must be forced iteratively
        let (_, terms) = setup();
        fn tower(depth: usize) -> Stream {
            if depth == 0 {
                Stream::unit(Subst::empty())
            } else {
                Stream::suspension(move |_| tower(depth - 1))
            }
        }
        let answers = take_all(tower(100_000), &terms);
        assert_eq!(answers.len(), 1);
    }
}
