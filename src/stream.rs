use crate::goal::Goal;
use crate::subst::Subst;
use crate::term::TermStore;
use std::fmt;

/// A deferred tail of a stream. Forcing performs a bounded amount of
/// work and yields the next stream shape. Each thunk is forced at most
/// once; `FnOnce` makes that a type-level guarantee.
pub struct Thunk(Box<dyn FnOnce(&TermStore) -> Stream + Send>);

impl Thunk {
    /// Wrap a deferred computation.
    pub fn new(f: impl FnOnce(&TermStore) -> Stream + Send + 'static) -> Self {
        Thunk(Box::new(f))
    }

    /// Run the deferred computation.
    pub fn force(self, terms: &TermStore) -> Stream {
        (self.0)(terms)
    }
}

impl fmt::Debug for Thunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Thunk(..)")
    }
}

/// A lazy, possibly infinite sequence of substitutions.
///
/// Suspensions are the unit of cooperative scheduling: they are what
/// lets an infinite disjunct yield control so its sibling still gets to
/// produce answers.
#[derive(Debug)]
pub enum Stream {
    /// No answers.
    Empty,
    /// An answer followed by a lazy rest.
    Cons(Subst, Box<Stream>),
    /// A deferred stream.
    Suspension(Thunk),
}

impl Stream {
    /// The empty stream.
    pub fn empty() -> Self {
        Stream::Empty
    }

    /// A single-answer stream.
    pub fn unit(s: Subst) -> Self {
        Stream::Cons(s, Box::new(Stream::Empty))
    }

    /// Prepend an answer to a stream.
    pub fn cons(s: Subst, rest: Stream) -> Self {
        Stream::Cons(s, Box::new(rest))
    }

    /// Defer a stream computation.
    pub fn suspension(f: impl FnOnce(&TermStore) -> Stream + Send + 'static) -> Self {
        Stream::Suspension(Thunk::new(f))
    }

    /// Interleaving append. Ready answers from the left stream pass
    /// through in order, but when the left stream suspends, the operands
    /// swap: the right stream gets the next turn. The swap is what keeps
    /// a disjunction with an infinite branch fair.
    pub fn append(a: Stream, b: Stream) -> Stream {
        match a {
            Stream::Empty => b,
            Stream::Suspension(t) => {
                Stream::suspension(move |terms| Stream::append(b, t.force(terms)))
            }
            Stream::Cons(head, rest) => Stream::cons(head, Stream::append(*rest, b)),
        }
    }

    /// Monadic bind: apply `goal` to every answer in the stream and
    /// append the resulting streams. Suspensions are re-suspended, so a
    /// deferred producer keeps its laziness through a conjunction.
    pub fn append_map(goal: Goal, stream: Stream, terms: &TermStore) -> Stream {
        match stream {
            Stream::Empty => Stream::Empty,
            Stream::Suspension(t) => Stream::suspension(move |terms| {
                Stream::append_map(goal, t.force(terms), terms)
            }),
            Stream::Cons(head, rest) => {
                let applied = goal.call(terms, &head);
                let mapped = Stream::append_map(goal, *rest, terms);
                Stream::append(applied, mapped)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goal;
    use crate::test_utils::setup;

    fn marker(terms: &TermStore, tag: i64) -> Subst {
        // a distinguishable substitution: x -> tag
        let x = terms.fresh_var("x");
        let v = terms.as_var(x).unwrap();
        Subst::empty()
            .extend(v, terms.int(tag), terms)
            .unwrap()
    }

    fn collect(mut stream: Stream, terms: &TermStore) -> Vec<Subst> {
        let mut out = Vec::new();
        loop {
            match stream {
                Stream::Empty => return out,
                Stream::Cons(head, rest) => {
                    out.push(head);
                    stream = *rest;
                }
                Stream::Suspension(t) => stream = t.force(terms),
            }
        }
    }

    // ========== APPEND ==========

    #[test]
    fn append_empty_left_is_right() {
        let (_, terms) = setup();
        let b = Stream::unit(marker(&terms, 1));
        let got = collect(Stream::append(Stream::empty(), b), &terms);
        assert_eq!(got.len(), 1);
    }

    #[test]
    fn append_synchronous_preserves_order() {
        // with no suspensions, all left answers come before any right answer
        let (_, terms) = setup();
        let a1 = marker(&terms, 1);
        let a2 = marker(&terms, 2);
        let b1 = marker(&terms, 3);

        let left = Stream::cons(a1.clone(), Stream::unit(a2.clone()));
        let right = Stream::unit(b1.clone());

        let got = collect(Stream::append(left, right), &terms);
        assert_eq!(got, vec![a1, a2, b1]);
    }

    #[test]
    fn append_swaps_on_suspension() {
        let (_, terms) = setup();
        let a1 = marker(&terms, 1);
        let b1 = marker(&terms, 2);

        // left = suspension yielding [a1]; right = [b1]
        let left = {
            let a1 = a1.clone();
            Stream::suspension(move |_| Stream::unit(a1))
        };
        let right = Stream::unit(b1.clone());

        let got = collect(Stream::append(left, right), &terms);
        assert_eq!(
            got,
            vec![b1, a1],
            "forcing the suspended side must hand the turn to the other operand"
        );
    }

    #[test]
    fn append_interleaves_two_suspended_streams() {
        let (_, terms) = setup();
        let a1 = marker(&terms, 1);
        let a2 = marker(&terms, 2);
        let b1 = marker(&terms, 3);

        let left = {
            let (a1, a2) = (a1.clone(), a2.clone());
            Stream::suspension(move |_| {
                Stream::cons(a1, Stream::suspension(move |_| Stream::unit(a2)))
            })
        };
        let right = {
            let b1 = b1.clone();
            Stream::suspension(move |_| Stream::unit(b1))
        };

        let got = collect(Stream::append(left, right), &terms);
        assert_eq!(got, vec![b1, a1, a2]);
    }

    // ========== APPEND_MAP ==========

    #[test]
    fn append_map_over_empty_is_empty() {
        let (_, terms) = setup();
        let got = collect(
            Stream::append_map(goal::succeed(), Stream::empty(), &terms),
            &terms,
        );
        assert!(got.is_empty());
    }

    #[test]
    fn append_map_applies_goal_to_each_answer() {
        let (_, terms) = setup();
        let y = terms.fresh_var("y");
        let s1 = marker(&terms, 1);
        let s2 = marker(&terms, 2);
        let stream = Stream::cons(s1, Stream::unit(s2));

        let g = goal::eq(y, terms.int(9));
        let got = collect(Stream::append_map(g, stream, &terms), &terms);
        assert_eq!(got.len(), 2);
        let yv = terms.as_var(y).unwrap();
        for s in &got {
            assert_eq!(s.get(yv), Some(terms.int(9)));
        }
    }

    #[test]
    fn append_map_drops_failing_answers() {
        let (_, terms) = setup();
        let stream = Stream::unit(marker(&terms, 1));
        let got = collect(Stream::append_map(goal::fail(), stream, &terms), &terms);
        assert!(got.is_empty());
    }

    #[test]
    fn append_map_re_suspends() {
        let (_, terms) = setup();
        let s1 = marker(&terms, 1);
        let stream = {
            let s1 = s1.clone();
            Stream::suspension(move |_| Stream::unit(s1))
        };

        let mapped = Stream::append_map(goal::succeed(), stream, &terms);
        assert!(
            matches!(mapped, Stream::Suspension(_)),
            "a suspended producer must stay suspended through bind"
        );
        let got = collect(mapped, &terms);
        assert_eq!(got, vec![s1]);
    }
}
