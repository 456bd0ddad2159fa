// prologue - swi-prolog bindings for rust
// Copyright (C) 2025  Andrew Chi

// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE.

//! Running goals.
//!
//! Goals given as text go through `prologue_run/2`, which reads the goal text and unifies its
//! second argument with the list of `Name = Value` bindings of the goal's variables. Goals built as
//! terms are opened on their own predicate and report solutions through the variables they hold.

use {
    crate::{
        Error, Prolog,
        decode::Decoded,
        encode::{PutTerm, put_text},
        frame::Frame,
        functor::Functor,
        module::Module,
        sys::{
            PL_call, PL_clear_exception, PL_cut_query, PL_exception, PL_get_arg, PL_get_functor,
            PL_next_solution, PL_open_query, PL_pred, PL_predicate,
            PROLOGUE_REEXPORTS_PL_Q_CATCH_EXCEPTION, PROLOGUE_REEXPORTS_PL_Q_NODEBUG,
            PROLOGUE_REEXPORTS_PL_Q_NORMAL, PROLOGUE_REEXPORTS_PL_STRING, module_t, predicate_t,
            qid_t, term_t,
        },
        term::Term,
        utils::c_predicate,
        value::Value,
    },
    itertools::Itertools,
    std::{
        collections::BTreeMap,
        ffi::c_int,
        iter::FusedIterator,
        ptr,
        sync::OnceLock,
    },
};

/// Variable bindings of one solution.
pub type Solution = BTreeMap<String, Value>;

static BRIDGE: OnceLock<usize> = OnceLock::new();

fn bridge() -> predicate_t {
    let address = *BRIDGE.get_or_init(|| {
        unsafe { PL_predicate(c"prologue_run".as_ptr(), 2, c"user".as_ptr()) }.expose_provenance()
    });
    ptr::with_exposed_provenance_mut(address)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueryOptions {
    max_results: Option<usize>,
    catch_errors: bool,
}
impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            max_results: None,
            catch_errors: true,
        }
    }
}
impl QueryOptions {
    /// Stop after this many solutions.
    pub fn max_results(mut self, max_results: Option<usize>) -> Self {
        self.max_results = max_results;
        self
    }

    /// Catch exceptions raised by the goal and report them as [Error::Prolog] instead of letting
    /// the debugger handle them.
    pub fn catch_errors(mut self, catch_errors: bool) -> Self {
        self.catch_errors = catch_errors;
        self
    }

    fn flags(&self) -> c_int {
        unsafe {
            if self.catch_errors {
                PROLOGUE_REEXPORTS_PL_Q_NODEBUG | PROLOGUE_REEXPORTS_PL_Q_CATCH_EXCEPTION
            } else {
                PROLOGUE_REEXPORTS_PL_Q_NORMAL
            }
        }
    }
}

/// Engine query together with the frame holding its arguments.
///
/// At most one is open per thread and it is released exactly once.
struct OpenQuery<'p> {
    prolog: &'p Prolog,
    goal: String,
    qid: qid_t,
    remaining: Option<usize>,
    frame: Option<Frame<'p>>,
}
impl<'p> OpenQuery<'p> {
    /// Open `predicate` on the argument vector returned by `arguments`, which is made in the
    /// query's frame.
    fn open<F>(
        prolog: &'p Prolog,
        goal: String,
        module: module_t,
        options: QueryOptions,
        arguments: F,
    ) -> Result<Self, Error>
    where
        F: FnOnce(&Frame<'p>) -> Result<(predicate_t, term_t), Error>,
    {
        if prolog.is_query_open() {
            return Err(Error::NestedQuery);
        }

        let frame = Frame::open(prolog);
        let (predicate, args) = arguments(&frame)?;
        let qid = unsafe { PL_open_query(module, options.flags(), predicate, args) };
        if qid == 0 {
            return Err(Error::OpenQuery(goal));
        }
        prolog.query_open.set(true);
        tracing::debug!(goal, "opened query");

        Ok(Self {
            prolog,
            goal,
            qid,
            remaining: options.max_results,
            frame: Some(frame),
        })
    }

    fn is_closed(&self) -> bool {
        self.frame.is_none()
    }

    fn advance(&mut self) -> Result<bool, Error> {
        if self.is_closed() {
            return Ok(false);
        }
        if self.remaining == Some(0) {
            return self.finish().map(|_| false);
        }

        if c_predicate(|| unsafe { PL_next_solution(self.qid) }) {
            if let Some(remaining) = &mut self.remaining {
                *remaining -= 1;
            }
            Ok(true)
        } else {
            self.finish().map(|_| false)
        }
    }

    /// Close the query, reporting the exception it raised if any.
    fn finish(&mut self) -> Result<(), Error> {
        let exception = unsafe { PL_exception(self.qid) };
        let result = if exception == 0 {
            Ok(())
        } else {
            Err(Error::Prolog {
                query: self.goal.clone(),
                term: exception_value(exception),
            })
        };

        let released = self.release(false);
        result.and(released)
    }

    /// Cut the query and release its frame, keeping the bindings of the last solution if
    /// `keep_bindings` is set.
    ///
    /// An exception raised while cutting, as by a cleanup handler, is cleared and returned.
    fn release(&mut self, keep_bindings: bool) -> Result<(), Error> {
        let Some(frame) = self.frame.take() else {
            return Ok(());
        };

        let result = if c_predicate(|| unsafe { PL_cut_query(self.qid) }) {
            Ok(())
        } else {
            match unsafe { PL_exception(0) } {
                0 => Ok(()),
                exception => {
                    let term = exception_value(exception);
                    unsafe { PL_clear_exception() };
                    Err(Error::Prolog {
                        query: self.goal.clone(),
                        term,
                    })
                }
            }
        };

        if keep_bindings {
            frame.close();
        } else {
            drop(frame);
        }
        self.prolog.query_open.set(false);
        tracing::debug!(goal = self.goal, "closed query");
        result
    }

    fn abandon(&mut self) {
        if let Err(error) = self.release(false) {
            tracing::warn!(%error, "exception while closing query");
        }
    }
}
impl Drop for OpenQuery<'_> {
    fn drop(&mut self) {
        self.abandon()
    }
}

/// Open query, yielding one [Solution] per answer.
///
/// The query is closed when it runs out of solutions, fails with an error, or is dropped.
pub struct Query<'p> {
    /// Frame of the last raw solution, released before the query's own frame.
    solution: Option<Frame<'p>>,
    inner: OpenQuery<'p>,
    bindings: term_t,
}
impl<'p> Query<'p> {
    fn open(prolog: &'p Prolog, goal: &str, options: QueryOptions) -> Result<Self, Error> {
        let mut bindings = 0;
        let inner = OpenQuery::open(prolog, goal.to_owned(), ptr::null_mut(), options, |frame| {
            let args = frame.new_term_refs(2);
            let text = unsafe { Term::from_raw(args.as_raw()) };
            put_text(&text, unsafe { PROLOGUE_REEXPORTS_PL_STRING }, goal.as_bytes())?;
            bindings = args.as_raw() + 1;
            Ok((bridge(), args.as_raw()))
        })?;

        Ok(Self {
            solution: None,
            inner,
            bindings,
        })
    }

    pub fn goal(&self) -> &str {
        &self.inner.goal
    }

    /// Whether the query was closed.
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    fn advance(&mut self) -> Result<bool, Error> {
        self.solution = None;
        self.inner.advance()
    }

    /// Advance to the next solution and decode its binding list without normalizing it.
    ///
    /// The handles in the result stay valid until the query advances again. A binding list that
    /// cannot be decoded ends the query on the next call.
    pub fn next_raw(&mut self) -> Option<Result<Decoded<'_>, Error>> {
        match self.advance() {
            Ok(true) => {
                let frame = self.solution.insert(Frame::open(self.inner.prolog));
                let decoded = unsafe { Term::from_raw(self.bindings) }.decode(frame);
                if decoded.is_err() {
                    self.inner.remaining = Some(0);
                }
                Some(decoded)
            }
            Ok(false) => None,
            Err(error) => Some(Err(error)),
        }
    }

    fn solution(&self) -> Result<Solution, Error> {
        let bindings = unsafe { Term::from_raw(self.bindings) };
        self.inner
            .prolog
            .with_frame(|frame| match bindings.decode(frame)? {
                Decoded::List(bindings) => bindings.iter().map(binding).collect(),
                other => Err(Error::ArgumentType {
                    expected: "binding list",
                    found: other.type_name().to_owned(),
                }),
            })
    }

    /// Close the query before it runs out of solutions.
    pub fn close(mut self) -> Result<(), Error> {
        self.solution = None;
        self.inner.finish()
    }
}
impl Iterator for Query<'_> {
    type Item = Result<Solution, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(true) => {
                let solution = self.solution();
                if solution.is_err() {
                    self.inner.abandon();
                }
                Some(solution)
            }
            Ok(false) => None,
            Err(error) => Some(Err(error)),
        }
    }
}
impl FusedIterator for Query<'_> {}

/// Open query over goals built as terms.
///
/// Each item is one solution. Its bindings are read from the variables held by the goals and
/// last until the query advances or is closed, unless the query is [cut](TermQuery::cut).
pub struct TermQuery<'p> {
    inner: OpenQuery<'p>,
}
impl TermQuery<'_> {
    pub fn goal(&self) -> &str {
        &self.inner.goal
    }

    /// Whether the query was closed.
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Close the query, keeping the bindings of the last solution.
    pub fn cut(mut self) -> Result<(), Error> {
        self.inner.release(true)
    }

    /// Close the query, undoing its bindings.
    pub fn close(mut self) -> Result<(), Error> {
        self.inner.finish()
    }
}
impl Iterator for TermQuery<'_> {
    type Item = Result<(), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner.advance() {
            Ok(true) => Some(Ok(())),
            Ok(false) => None,
            Err(error) => Some(Err(error)),
        }
    }
}
impl FusedIterator for TermQuery<'_> {}

fn binding(decoded: &Decoded<'_>) -> Result<(String, Value), Error> {
    match decoded {
        Decoded::Compound(compound) if compound.name() == "=" && compound.arity() == 2 => {
            Ok((compound.args()[0].as_text()?, compound.args()[1].to_value()))
        }
        other => Err(Error::ArgumentType {
            expected: "binding",
            found: other.type_name().to_owned(),
        }),
    }
}

fn exception_value(exception: term_t) -> Value {
    unsafe { Term::from_raw(exception) }
        .value()
        .unwrap_or_else(|error| Value::Opaque(error.to_string()))
}

/// Build the conjunction of `goals` in `frame`.
fn conjunction<'f>(frame: &'f Frame<'_>, goals: &[Term<'_>]) -> Result<Term<'f>, Error> {
    let (last, init) = goals
        .split_last()
        .ok_or(Error::InvalidArgument("no goals to call"))?;

    let comma = Functor::intern(",", 2);
    let mut goal = frame.new_term_ref();
    goal.put(last)?;
    for left in init.iter().rev() {
        let pair = frame.new_term_ref();
        comma.cons_into(&pair, &[left as &dyn PutTerm, &goal])?;
        goal = pair;
    }
    Ok(goal)
}

impl Prolog {
    /// Run `goal` with the default [QueryOptions].
    ///
    /// # Examples
    ///
    /// ```
    /// # use prologue::{Value, with_prolog};
    /// # #[cfg(not(miri))]
    /// with_prolog(|prolog| {
    ///     let solutions = prolog
    ///         .query("member(X, [a, 1, \"s\"])")
    ///         .unwrap()
    ///         .map(|solution| solution.unwrap().remove("X").unwrap())
    ///         .collect::<Vec<_>>();
    ///     assert_eq!(
    ///         solutions,
    ///         [Value::Atom("a".into()), Value::Integer(1), Value::String("s".into())]
    ///     );
    /// })
    /// .unwrap();
    /// ```
    pub fn query(&self, goal: &str) -> Result<Query<'_>, Error> {
        Query::open(self, goal, QueryOptions::default())
    }

    pub fn query_with(&self, goal: &str, options: QueryOptions) -> Result<Query<'_>, Error> {
        Query::open(self, goal, options)
    }

    /// Query the conjunction of `goals` in `module` with the default [QueryOptions].
    ///
    /// # Examples
    ///
    /// ```
    /// # use prologue::{Value, Variable, with_prolog};
    /// # #[cfg(not(miri))]
    /// with_prolog(|prolog| {
    ///     prolog.with_frame(|frame| {
    ///         let x = Variable::new(frame);
    ///         let between = prolog.make_functor("between", 3);
    ///         let goal = between.construct(frame, &[&1, &3, &x]).unwrap();
    ///         let mut seen = Vec::new();
    ///         for solution in prolog.query_terms(&[goal], None).unwrap() {
    ///             solution.unwrap();
    ///             seen.push(x.value().unwrap());
    ///         }
    ///         assert_eq!(seen, [Value::Integer(1), Value::Integer(2), Value::Integer(3)]);
    ///     })
    /// })
    /// .unwrap();
    /// ```
    pub fn query_terms(
        &self,
        goals: &[Term<'_>],
        module: Option<&Module>,
    ) -> Result<TermQuery<'_>, Error> {
        self.query_terms_with(goals, module, QueryOptions::default())
    }

    /// Query the conjunction of `goals` in `module`, or the context module if none is given.
    ///
    /// The goals' frames cannot make new terms while the query is open.
    pub fn query_terms_with(
        &self,
        goals: &[Term<'_>],
        module: Option<&Module>,
        options: QueryOptions,
    ) -> Result<TermQuery<'_>, Error> {
        let module = module.map_or(ptr::null_mut(), Module::as_raw);
        let text = goals.iter().format(", ").to_string();

        OpenQuery::open(self, text, module, options, |frame| {
            let goal = conjunction(frame, goals)?;
            let mut handle = 0;
            if !c_predicate(|| unsafe { PL_get_functor(goal.as_raw(), &raw mut handle) }) {
                return Err(Error::InvalidType {
                    expected: "callable",
                });
            }
            let functor = unsafe { Functor::from_raw(handle) };

            let args = frame.new_term_refs(functor.arity());
            args.iter().zip(1..).for_each(|(arg, index)| unsafe {
                PL_get_arg(index, goal.as_raw(), arg.as_raw());
            });
            Ok((unsafe { PL_pred(functor.as_raw(), module) }, args.as_raw()))
        })
        .map(|inner| TermQuery { inner })
    }

    /// Call the conjunction of `goals` once, keeping the bindings it makes.
    ///
    /// An exception raised by the goals is cleared and returned as [Error::Exception].
    pub fn call(&self, goals: &[Term<'_>], module: Option<&Module>) -> Result<bool, Error> {
        if self.is_query_open() {
            return Err(Error::NestedQuery);
        }

        let frame = Frame::open(self);
        let goal = conjunction(&frame, goals)?;
        let module = module.map_or(ptr::null_mut(), Module::as_raw);
        let succeeded = c_predicate(|| unsafe { PL_call(goal.as_raw(), module) });

        let exception = unsafe { PL_exception(0) };
        if exception != 0 {
            let value = exception_value(exception);
            unsafe { PL_clear_exception() };
            return Err(Error::Exception(value));
        }

        frame.close();
        Ok(succeeded)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{term::TermType, variable::Variable, with_prolog},
        std::collections::HashSet,
    };

    #[cfg_attr(miri, ignore)]
    #[test]
    fn nested_query() {
        with_prolog(|prolog| {
            let outer = prolog.query("member(X, [1, 2])").unwrap();
            assert!(matches!(prolog.query("true"), Err(Error::NestedQuery)));
            drop(outer);
            assert_eq!(prolog.query("true").unwrap().count(), 1);

            let mut drained = prolog.query("member(X, [1, 2])").unwrap();
            assert_eq!(drained.by_ref().count(), 2);
            assert!(drained.is_closed());
            assert!(!prolog.is_query_open());
            assert_eq!(prolog.query("true").unwrap().count(), 1);
        })
        .unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn abandoned_query() {
        with_prolog(|prolog| {
            let mut query = prolog.query("between(1, inf, X)").unwrap();
            assert_eq!(query.next().unwrap().unwrap()["X"], Value::Integer(1));
            drop(query);
            assert!(!prolog.is_query_open());

            let query = prolog.query("between(1, inf, X)").unwrap();
            query.close().unwrap();
            assert!(!prolog.is_query_open());
            assert_eq!(prolog.query("X = 1").unwrap().count(), 1);
        })
        .unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn exception() {
        with_prolog(|prolog| {
            let mut query = prolog.query("undefined_in_query_tests(1)").unwrap();
            let Some(Err(error)) = query.next() else {
                panic!("expected an error");
            };
            assert!(matches!(&error, Error::Prolog { query, .. } if query == "undefined_in_query_tests(1)"));
            assert!(
                error
                    .to_string()
                    .starts_with("Caused by: 'undefined_in_query_tests(1)'. Returned: '")
            );
            assert!(error.to_string().contains("Does not exist: procedure"));
            assert!(query.next().is_none());
            assert!(!prolog.is_query_open());
        })
        .unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn solutions_as_a_set() {
        with_prolog(|prolog| {
            prolog.asserta("query_father(michael, john)").unwrap();
            prolog.asserta("query_father(michael, gina)").unwrap();

            let children = prolog
                .query("query_father(michael, X)")
                .unwrap()
                .map(|solution| solution.unwrap()["X"].to_string())
                .collect::<HashSet<_>>();
            assert_eq!(children, HashSet::from(["john".to_owned(), "gina".to_owned()]));
        })
        .unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn yes_no_queries() {
        with_prolog(|prolog| {
            let solutions = prolog.query("1 =:= 1").unwrap().collect::<Result<Vec<_>, _>>();
            assert_eq!(solutions.unwrap(), [Solution::new()]);
            assert_eq!(prolog.query("fail").unwrap().count(), 0);
        })
        .unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn max_results() {
        with_prolog(|prolog| {
            let options = QueryOptions::default().max_results(Some(3));
            let mut query = prolog.query_with("between(1, 10, X)", options).unwrap();
            assert_eq!(query.by_ref().count(), 3);
            assert!(query.is_closed());
            assert!(!prolog.is_query_open());

            let options = QueryOptions::default().max_results(Some(0));
            assert_eq!(prolog.query_with("true", options).unwrap().count(), 0);
        })
        .unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn lists_and_compounds() {
        with_prolog(|prolog| {
            let solution = prolog.query("X = [1, 2, 3]").unwrap().next().unwrap().unwrap();
            assert_eq!(
                solution["X"],
                Value::List(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)])
            );

            prolog.assertz("query_f([g(a, b), h(a, b, c)])").unwrap();
            let solution = prolog.query("query_f(L)").unwrap().next().unwrap().unwrap();
            assert_eq!(
                solution["L"]
                    .as_list()
                    .unwrap()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>(),
                ["g(a, b)", "h(a, b, c)"]
            );

            let solution = prolog
                .query("X = (a, b, c), Y = (k = 1)")
                .unwrap()
                .next()
                .unwrap()
                .unwrap();
            assert_eq!(solution["X"].to_string(), "(a, b, c)");
            assert_eq!(solution["Y"].to_string(), "_{k: 1}");
        })
        .unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn dicts() {
        with_prolog(|prolog| {
            let solution = prolog
                .query("X = _{key1: value1, key2: value2}, Y = _{}")
                .unwrap()
                .next()
                .unwrap()
                .unwrap();
            assert_eq!(
                solution["X"],
                Value::Dict(BTreeMap::from([
                    ("key1".into(), Value::Atom("value1".into())),
                    ("key2".into(), Value::Atom("value2".into())),
                ]))
            );
            assert_eq!(solution["Y"], Value::Dict(BTreeMap::new()));
        })
        .unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn raw_solutions() {
        with_prolog(|prolog| {
            let mut query = prolog.query("X = f(Y)").unwrap();
            {
                let Some(Ok(Decoded::List(bindings))) = query.next_raw() else {
                    panic!("expected a binding list");
                };
                assert_eq!(bindings.len(), 2);
                let Decoded::Compound(x) = &bindings[0] else {
                    panic!("expected a binding");
                };
                assert_eq!(x.name(), "=");
                assert!(matches!(&x.args()[1], Decoded::Compound(f) if f.name() == "f"));
            }
            assert!(query.next_raw().is_none());
        })
        .unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn call_terms() {
        with_prolog(|prolog| {
            prolog.with_frame(|frame| {
                let goal = frame.parse("member(X, [a, b])").unwrap();
                assert!(prolog.call(&[goal], None).unwrap());
                assert_eq!(goal.to_string(), "member(a,[a,b])");

                let first = frame.parse("atom(a)").unwrap();
                let second = frame.parse("integer(a)").unwrap();
                assert!(!prolog.call(&[first, second], None).unwrap());

                let unbound = frame.parse("atom_length(_, _)").unwrap();
                assert!(matches!(
                    prolog.call(&[unbound], Some(&Module::user(prolog))),
                    Err(Error::Exception(Value::Error(_)))
                ));
                assert_eq!(frame.new_term_ref().term_type(), TermType::Variable);

                assert!(matches!(
                    prolog.call(&[], None),
                    Err(Error::InvalidArgument(_))
                ));
            })
        })
        .unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn cleanup_exceptions_do_not_leak() {
        with_prolog(|prolog| {
            let goal = "setup_call_cleanup(true, member(X, [1, 2]), throw(query_cleanup))";
            let mut query = prolog.query(goal).unwrap();
            assert_eq!(query.next().unwrap().unwrap()["X"], Value::Integer(1));
            match query.close() {
                Ok(()) => {}
                Err(Error::Prolog { term, .. }) => {
                    assert_eq!(term, Value::Atom("query_cleanup".into()))
                }
                Err(error) => panic!("unexpected error: {error}"),
            }
            assert_eq!(unsafe { PL_exception(0) }, 0);
            assert!(!prolog.is_query_open());

            let mut query = prolog.query(goal).unwrap();
            assert!(query.next().unwrap().is_ok());
            drop(query);
            assert_eq!(unsafe { PL_exception(0) }, 0);
            assert_eq!(prolog.query("X = 1").unwrap().count(), 1);
        })
        .unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn raw_solution_handles_end_with_the_solution() {
        with_prolog(|prolog| {
            let mut query = prolog.query("member(X, [f(1), f(2)])").unwrap();
            let mut seen = Vec::new();
            while let Some(bindings) = query.next_raw() {
                let Decoded::List(bindings) = bindings.unwrap() else {
                    panic!("expected a binding list");
                };
                seen.push(bindings[0].to_string());
            }
            assert_eq!(seen, ["=(X, f(1))", "=(X, f(2))"]);
            assert!(query.is_closed());
            assert!(prolog.frames.borrow().is_empty());
        })
        .unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn term_queries() {
        with_prolog(|prolog| {
            prolog.assertz("term_father(michael, john)").unwrap();
            prolog.assertz("term_father(michael, gina)").unwrap();

            prolog.with_frame(|frame| {
                let x = Variable::new(frame);
                let michael = prolog.make_atom("michael");
                let father = prolog.make_functor("term_father", 2);
                let goal = father.construct(frame, &[&michael, &x]).unwrap();

                let mut query = prolog.query_terms(&[goal], None).unwrap();
                assert!(prolog.is_query_open());
                assert!(matches!(prolog.query("true"), Err(Error::NestedQuery)));
                let mut children = HashSet::new();
                while let Some(solution) = query.next() {
                    solution.unwrap();
                    children.insert(x.value().unwrap().to_string());
                }
                assert!(query.is_closed());
                assert!(!prolog.is_query_open());
                assert_eq!(children, HashSet::from(["john".to_owned(), "gina".to_owned()]));
                assert!(!x.is_bound());

                let y = Variable::new(frame);
                let between = prolog.make_functor("between", 3);
                let first = between.construct(frame, &[&1, &3, &x]).unwrap();
                let second = prolog.make_functor(">", 2).construct(frame, &[&x, &1]).unwrap();
                let third = prolog.make_functor("is", 2).construct(frame, &[&y, &x]).unwrap();
                let mut query = prolog.query_terms(&[first, second, third], None).unwrap();
                assert!(query.goal().starts_with("between(1,3,_"));
                query.next().unwrap().unwrap();
                query.cut().unwrap();
                assert_eq!(x.value().unwrap(), Value::Integer(2));
                assert_eq!(y.value().unwrap(), Value::Integer(2));
            })
        })
        .unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn term_queries_in_a_module() {
        with_prolog(|prolog| {
            let knowledge = prolog.make_module("term_query_knowledge");
            prolog.with_frame(|frame| {
                let parent = prolog.make_functor("term_parent", 2);
                let assertz = prolog.make_functor("assertz", 1);
                let fact = parent
                    .construct(frame, &[&prolog.make_atom("john"), &prolog.make_atom("bob")])
                    .unwrap();
                let clause = assertz.construct(frame, &[&fact]).unwrap();
                assert!(prolog.call(&[clause], Some(&knowledge)).unwrap());

                let x = Variable::new(frame);
                let goal = parent.construct(frame, &[&prolog.make_atom("john"), &x]).unwrap();
                let mut query = prolog.query_terms(&[goal], Some(&knowledge)).unwrap();
                query.next().unwrap().unwrap();
                assert_eq!(x.value().unwrap(), Value::Atom("bob".into()));
                assert!(query.next().is_none());

                let mut outside = prolog.query_terms(&[goal], None).unwrap();
                assert!(matches!(outside.next(), Some(Err(Error::Prolog { .. }))));
                assert!(outside.next().is_none());
                assert!(!prolog.is_query_open());

                let number = frame.new_term_ref();
                number.put(&1).unwrap();
                assert!(matches!(
                    prolog.query_terms(&[number], None),
                    Err(Error::InvalidType { .. })
                ));
                assert!(matches!(prolog.query_terms(&[], None), Err(Error::InvalidArgument(_))));
                assert!(!prolog.is_query_open());
            })
        })
        .unwrap();
    }
}
