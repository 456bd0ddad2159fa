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

//! Rust functions callable as prolog predicates.
//!
//! A [Predicate] is registered with [register]. Predicates registered before the engine is
//! initialized are queued and installed during [initialize](crate::initialize), after the bridge
//! predicate.
//!
//! Every predicate is installed with the same trampoline, which finds the rust callable by the
//! module, name and arity the engine reports for the call.
//!
//! # Examples
//!
//! ```
//! # use prologue::{Predicate, foreign, with_prolog};
//! foreign::register(Predicate::deterministic("shout", 2, |args| {
//!     let text = args[0].as_text()?.to_uppercase();
//!     args[1].as_variable_mut()?.unify(text.as_str())
//! }))
//! .unwrap();
//!
//! # #[cfg(not(miri))]
//! with_prolog(|prolog| {
//!     let solution = prolog.query("shout(hello, X)").unwrap().next().unwrap().unwrap();
//!     assert_eq!(solution["X"], "HELLO");
//! })
//! .unwrap();
//! ```

use {
    crate::{
        Error,
        atom::Atom,
        decode::Decoded,
        encode::put_text,
        engine::{self, with_prolog},
        frame::Frame,
        init,
        sys::{
            _PL_retry, _PL_retry_address, PL_foreign_context, PL_foreign_context_address,
            PL_foreign_context_predicate, PL_foreign_control, PL_module_name, PL_new_term_ref,
            PL_predicate_info, PL_raise_exception, PL_register_foreign_in_module,
            PROLOGUE_REEXPORTS_PL_FA_NONDETERMINISTIC, PROLOGUE_REEXPORTS_PL_FA_VARARGS,
            PROLOGUE_REEXPORTS_PL_PRUNED, PROLOGUE_REEXPORTS_PL_REDO,
            PROLOGUE_REEXPORTS_PL_STRING, control_t, foreign_t, term_t,
        },
        term::Term,
        utils::c_predicate,
        value::Value,
    },
    parking_lot::Mutex,
    std::{
        any::Any,
        collections::{BTreeMap, BTreeSet},
        ffi::{CString, c_int},
        fmt::{self, Debug, Formatter},
        mem,
        panic::{self, AssertUnwindSafe},
        ptr,
        sync::Arc,
    },
};

const TRUE: foreign_t = 1;
const FALSE: foreign_t = 0;

/// How the engine entered a foreign predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Control {
    FirstCall,
    /// Backtracking into the predicate with the context handed to [Outcome::Retry].
    Redo(isize),
    /// The choice point was cut, with the context of the last [Outcome::Retry]. What the
    /// predicate reports back is ignored.
    Pruned(isize),
}

/// What a foreign predicate reports back to the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    Fail,
    Succeed,
    /// Succeed and leave a choice point. Backtracking calls the predicate again with
    /// [Control::Redo] carrying this context.
    Retry(isize),
}

/// Return types of foreign predicates.
pub trait IntoOutcome {
    fn into_outcome(self) -> Result<Outcome, Error>;
}
impl IntoOutcome for () {
    fn into_outcome(self) -> Result<Outcome, Error> {
        Ok(Outcome::Succeed)
    }
}
impl IntoOutcome for bool {
    fn into_outcome(self) -> Result<Outcome, Error> {
        Ok(if self { Outcome::Succeed } else { Outcome::Fail })
    }
}
/// [None] counts as success.
impl IntoOutcome for Option<bool> {
    fn into_outcome(self) -> Result<Outcome, Error> {
        self.unwrap_or(true).into_outcome()
    }
}
impl IntoOutcome for Outcome {
    fn into_outcome(self) -> Result<Outcome, Error> {
        Ok(self)
    }
}
impl<T> IntoOutcome for Result<T, Error>
where
    T: IntoOutcome,
{
    fn into_outcome(self) -> Result<Outcome, Error> {
        self.and_then(T::into_outcome)
    }
}

/// Candidate argument tuples of a [Predicate::solutions] predicate.
pub type Solutions = Box<dyn Iterator<Item = Vec<Value>>>;

type Deterministic = Box<dyn for<'f> Fn(&mut [Decoded<'f>]) -> Result<Outcome, Error> + Send + Sync>;
type Nondeterministic =
    Box<dyn for<'f> Fn(&mut [Decoded<'f>], Control) -> Result<Outcome, Error> + Send + Sync>;
type Generator = Box<dyn for<'f> Fn(&mut [Decoded<'f>]) -> Result<Solutions, Error> + Send + Sync>;

enum Callable {
    Deterministic(Deterministic),
    Nondeterministic(Nondeterministic),
    Solutions(Generator),
}

/// Rust function to expose as `module:name/arity`.
pub struct Predicate {
    module: String,
    name: String,
    arity: usize,
    callable: Callable,
}
impl Predicate {
    fn new(name: &str, arity: usize, callable: Callable) -> Self {
        Self {
            module: "user".to_owned(),
            name: name.to_owned(),
            arity,
            callable,
        }
    }

    /// Predicate that succeeds at most once.
    pub fn deterministic<F, O>(name: &str, arity: usize, f: F) -> Self
    where
        F: for<'f> Fn(&mut [Decoded<'f>]) -> O + Send + Sync + 'static,
        O: IntoOutcome,
    {
        Self::new(
            name,
            arity,
            Callable::Deterministic(Box::new(move |args| f(args).into_outcome())),
        )
    }

    /// Predicate that drives its own choice points through [Control] and [Outcome::Retry].
    pub fn nondeterministic<F, O>(name: &str, arity: usize, f: F) -> Self
    where
        F: for<'f> Fn(&mut [Decoded<'f>], Control) -> O + Send + Sync + 'static,
        O: IntoOutcome,
    {
        Self::new(
            name,
            arity,
            Callable::Nondeterministic(Box::new(move |args, control| {
                f(args, control).into_outcome()
            })),
        )
    }

    /// Predicate whose solutions are the argument tuples yielded by `f`.
    ///
    /// Each tuple is unified with the call's arguments in turn and the ones that unify are
    /// solutions, in order.
    ///
    /// ```
    /// # use prologue::{Error, Predicate, Value, foreign, with_prolog};
    /// foreign::register(Predicate::solutions("square", 2, |_| {
    ///     Ok::<_, Error>((1..=3).map(|n| vec![Value::Integer(n), Value::Integer(n * n)]))
    /// }))
    /// .unwrap();
    ///
    /// # #[cfg(not(miri))]
    /// with_prolog(|prolog| {
    ///     let solution = prolog.query("square(X, 4)").unwrap().next().unwrap().unwrap();
    ///     assert_eq!(solution["X"], Value::Integer(2));
    /// })
    /// .unwrap();
    /// ```
    pub fn solutions<F, I>(name: &str, arity: usize, f: F) -> Self
    where
        F: for<'f> Fn(&mut [Decoded<'f>]) -> Result<I, Error> + Send + Sync + 'static,
        I: IntoIterator<Item = Vec<Value>>,
        I::IntoIter: 'static,
    {
        Self::new(
            name,
            arity,
            Callable::Solutions(Box::new(move |args| {
                f(args).map(|solutions| Box::new(solutions.into_iter()) as Solutions)
            })),
        )
    }

    /// Define the predicate in `module` instead of `user`.
    pub fn in_module<S>(mut self, module: S) -> Self
    where
        S: Into<String>,
    {
        self.module = module.into();
        self
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn is_nondeterministic(&self) -> bool {
        !matches!(self.callable, Callable::Deterministic(_))
    }

    fn key(&self) -> Key {
        (self.module.clone(), self.name.clone(), self.arity)
    }
}
impl Debug for Predicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_struct("Predicate")
            .field("module", &self.module)
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("nondeterministic", &self.is_nondeterministic())
            .finish_non_exhaustive()
    }
}

/// Result of [register].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Registration {
    /// Installed in the running engine.
    Registered,
    /// Queued until the engine is initialized.
    Deferred,
    /// A predicate with the same module, name and arity was registered before. The new one is
    /// ignored.
    AlreadyRegistered,
}

type Key = (String, String, usize);

enum Phase {
    Pending(Vec<Arc<Predicate>>),
    Live,
}

struct Registry {
    phase: Phase,
    keys: BTreeSet<Key>,
    installed: BTreeMap<Key, Arc<Predicate>>,
}

static REGISTRY: Mutex<Registry> = Mutex::new(Registry {
    phase: Phase::Pending(Vec::new()),
    keys: BTreeSet::new(),
    installed: BTreeMap::new(),
});

/// Make `predicate` callable from prolog.
pub fn register(predicate: Predicate) -> Result<Registration, Error> {
    let predicate = Arc::new(predicate);
    let key = predicate.key();

    {
        let mut registry = REGISTRY.lock();
        if !registry.keys.insert(key.clone()) {
            return Ok(Registration::AlreadyRegistered);
        }
        if let Phase::Pending(pending) = &mut registry.phase {
            tracing::debug!(?predicate, "deferring foreign predicate");
            pending.push(predicate);
            return Ok(Registration::Deferred);
        }
    }

    with_prolog(|_| install(&predicate))
        .and_then(|installed| installed)
        .map(|()| Registration::Registered)
        .inspect_err(|_| {
            REGISTRY.lock().keys.remove(&key);
        })
}

/// Install every queued predicate. Called once the engine is initialized.
pub(crate) fn flush_pending() -> Result<(), Error> {
    let pending = match mem::replace(&mut REGISTRY.lock().phase, Phase::Live) {
        Phase::Pending(pending) => pending,
        Phase::Live => return Ok(()),
    };
    tracing::debug!(count = pending.len(), "installing deferred foreign predicates");

    pending
        .iter()
        .map(|predicate| {
            install(predicate).inspect_err(|_| {
                REGISTRY.lock().keys.remove(&predicate.key());
            })
        })
        .fold(Ok(()), Result::and)
}

fn install(predicate: &Arc<Predicate>) -> Result<(), Error> {
    let module = CString::new(predicate.module.as_str())?;
    let name = CString::new(predicate.name.as_str())?;
    let registration_error = || Error::Registration {
        name: predicate.name.clone(),
        arity: predicate.arity,
    };
    let arity = c_int::try_from(predicate.arity).map_err(|_| registration_error())?;

    let flags = unsafe {
        if predicate.is_nondeterministic() {
            PROLOGUE_REEXPORTS_PL_FA_VARARGS | PROLOGUE_REEXPORTS_PL_FA_NONDETERMINISTIC
        } else {
            PROLOGUE_REEXPORTS_PL_FA_VARARGS
        }
    };

    // visible to the trampoline before the first call can happen
    REGISTRY
        .lock()
        .installed
        .insert(predicate.key(), Arc::clone(predicate));

    let registered = c_predicate(|| unsafe {
        PL_register_foreign_in_module(module.as_ptr(), name.as_ptr(), arity, dispatch, flags)
    });
    tracing::debug!(?predicate, registered, "installing foreign predicate");

    if registered {
        Ok(())
    } else {
        REGISTRY.lock().installed.remove(&predicate.key());
        Err(registration_error())
    }
}

/// Find the rust side of the predicate the engine is running.
fn lookup(context: control_t, arity: usize) -> Result<Arc<Predicate>, Error> {
    let mut name = 0;
    let mut module = ptr::null_mut();
    let found = c_predicate(|| unsafe {
        PL_predicate_info(
            PL_foreign_context_predicate(context),
            &raw mut name,
            ptr::null_mut(),
            &raw mut module,
        )
    });
    if !found {
        return Err(Error::Registration {
            name: "<unknown>".to_owned(),
            arity,
        });
    }

    let name = unsafe { Atom::from_raw(name) };
    let module = unsafe { Atom::from_raw(PL_module_name(module)) };
    let key = (module.name().to_owned(), name.name().to_owned(), arity);

    let predicate = REGISTRY.lock().installed.get(&key).cloned();
    predicate.ok_or(Error::Registration {
        name: key.1,
        arity,
    })
}

unsafe extern "C" fn dispatch(t0: term_t, arity: c_int, context: control_t) -> foreign_t {
    let arity = usize::try_from(arity).unwrap_or_default();
    let control = unsafe {
        match PL_foreign_control(context) {
            control if control == PROLOGUE_REEXPORTS_PL_REDO => {
                Control::Redo(PL_foreign_context(context))
            }
            control if control == PROLOGUE_REEXPORTS_PL_PRUNED => {
                Control::Pruned(PL_foreign_context(context))
            }
            _ => Control::FirstCall,
        }
    };

    let result = panic::catch_unwind(AssertUnwindSafe(|| invoke(t0, arity, context, control)))
        .unwrap_or_else(|payload| Err(Error::ForeignPanic(panic_message(payload))));
    match (result, control) {
        (Ok(reply), _) => reply,
        // a cut cannot fail, so nothing is raised while pruning
        (Err(error), Control::Pruned(_)) => {
            tracing::warn!(%error, "foreign predicate failed while its choice point was cut");
            TRUE
        }
        (Err(error), _) => raise(error),
    }
}

fn invoke(
    t0: term_t,
    arity: usize,
    context: control_t,
    control: Control,
) -> Result<foreign_t, Error> {
    let predicate = lookup(context, arity)?;

    match &predicate.callable {
        Callable::Deterministic(f) => {
            with_args(t0, arity, |args| f(args)).and_then(|outcome| match outcome {
                Outcome::Retry(_) => Err(Error::InvalidArgument(
                    "deterministic foreign predicates cannot leave a choice point",
                )),
                outcome => Ok(reply(outcome)),
            })
        }
        Callable::Nondeterministic(f) => match control {
            Control::Pruned(_) => with_args(t0, arity, |args| f(args, control)).map(|_| TRUE),
            _ => with_args(t0, arity, |args| f(args, control)).map(reply),
        },
        Callable::Solutions(f) => {
            let solutions = match control {
                Control::FirstCall => Box::new(with_args(t0, arity, |args| f(args))?),
                Control::Redo(_) => unsafe {
                    Box::from_raw(PL_foreign_context_address(context).cast::<Solutions>())
                },
                Control::Pruned(_) => {
                    drop(unsafe {
                        Box::from_raw(PL_foreign_context_address(context).cast::<Solutions>())
                    });
                    return Ok(TRUE);
                }
            };
            next_solution(t0, arity, solutions)
        }
    }
}

fn reply(outcome: Outcome) -> foreign_t {
    match outcome {
        Outcome::Fail => FALSE,
        Outcome::Succeed => TRUE,
        Outcome::Retry(context) => unsafe { _PL_retry(context) },
    }
}

/// Decode the arguments of a call and run `f` on them.
///
/// Bindings made by `f` are kept, unless decoding fails.
fn with_args<F, O>(t0: term_t, arity: usize, f: F) -> Result<O, Error>
where
    F: for<'f> FnOnce(&mut [Decoded<'f>]) -> Result<O, Error>,
{
    engine::with_current(|prolog| {
        let frame = Frame::open(prolog);
        let mut args = (0..arity)
            .map(|index| unsafe { Term::from_raw(t0 + index) }.decode(&frame))
            .collect::<Result<Vec<_>, _>>()?;

        let output = f(&mut args);
        drop(args);
        frame.close();
        output
    })
}

/// Unify the arguments with the next candidate that fits and keep the rest for backtracking.
fn next_solution(t0: term_t, arity: usize, mut solutions: Box<Solutions>) -> Result<foreign_t, Error> {
    engine::with_current(|prolog| {
        loop {
            let Some(candidate) = solutions.next() else {
                return Ok(FALSE);
            };
            if candidate.len() != arity {
                return Err(Error::ArityMismatch {
                    name: "solution".to_owned(),
                    arity,
                    found: candidate.len(),
                });
            }

            let frame = Frame::open(prolog);
            let mut unified = true;
            for (index, value) in candidate.iter().enumerate() {
                unified = unsafe { Term::from_raw(t0 + index) }.unify(value)?;
                if !unified {
                    break;
                }
            }
            if unified {
                frame.close();
                return Ok(unsafe { _PL_retry_address(Box::into_raw(solutions).cast()) });
            }
        }
    })
}

/// Hand `error` to the engine as an exception carrying its message.
fn raise(error: Error) -> foreign_t {
    tracing::debug!(%error, "raising from a foreign predicate");
    let term = unsafe { Term::from_raw(PL_new_term_ref()) };
    let kind = unsafe { PROLOGUE_REEXPORTS_PL_STRING };
    if put_text(&term, kind, error.to_string().as_bytes()).is_ok() {
        unsafe { PL_raise_exception(term.as_raw()) };
    }
    FALSE
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    payload
        .downcast::<String>()
        .map(|message| *message)
        .or_else(|payload| payload.downcast::<&'static str>().map(|message| (*message).to_owned()))
        .unwrap_or_else(|_| "unknown panic".to_owned())
}

/// Foreign predicate defined by a type, usually generated with
/// [foreign_predicate](crate::foreign_predicate).
///
/// ```
/// # use prologue::{Control, Decoded, Error, ForeignPredicate, Outcome, with_prolog};
/// struct Double;
/// impl ForeignPredicate for Double {
///     const NAME: &'static str = "double";
///     const ARITY: usize = 2;
///     const NONDETERMINISTIC: bool = false;
///
///     fn call(args: &mut [Decoded<'_>], _: Control) -> Result<Outcome, Error> {
///         let [n, doubled] = args else {
///             return Err(Error::InvalidArgument("double/2 takes 2 arguments"));
///         };
///         let n = n.as_i64()?;
///         doubled
///             .as_variable_mut()?
///             .unify(&(n * 2))
///             .map(|unified| if unified { Outcome::Succeed } else { Outcome::Fail })
///     }
/// }
///
/// Double::register().unwrap();
/// # #[cfg(not(miri))]
/// with_prolog(|prolog| {
///     let solution = prolog.query("double(21, X)").unwrap().next().unwrap().unwrap();
///     assert_eq!(solution["X"], prologue::Value::Integer(42));
/// })
/// .unwrap();
/// ```
pub trait ForeignPredicate: 'static {
    const MODULE: &'static str = "user";
    const NAME: &'static str;
    const ARITY: usize;
    const NONDETERMINISTIC: bool;

    fn call(args: &mut [Decoded<'_>], control: Control) -> Result<Outcome, Error>;

    fn predicate() -> Predicate {
        if Self::NONDETERMINISTIC {
            Predicate::nondeterministic(Self::NAME, Self::ARITY, Self::call)
        } else {
            Predicate::deterministic(Self::NAME, Self::ARITY, |args| {
                Self::call(args, Control::FirstCall)
            })
        }
        .in_module(Self::MODULE)
    }

    fn register() -> Result<Registration, Error> {
        register(Self::predicate())
    }
}

/// Whether `module:name/arity` was registered with [register].
pub fn is_registered(module: &str, name: &str, arity: usize) -> bool {
    REGISTRY
        .lock()
        .keys
        .contains(&(module.to_owned(), name.to_owned(), arity))
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{foreign_predicate, with_prolog},
        std::sync::atomic::{AtomicIsize, Ordering},
    };

    fn solutions(prolog: &crate::Prolog, goal: &str, variable: &str) -> Vec<Value> {
        prolog
            .query(goal)
            .unwrap()
            .map(|solution| solution.unwrap()[variable].clone())
            .collect()
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn deterministic() {
        register(Predicate::deterministic("ffi_hello", 1, |args| {
            Ok::<_, Error>(args[0].as_text()? == "world")
        }))
        .unwrap();

        with_prolog(|prolog| {
            assert_eq!(prolog.query("ffi_hello(world)").unwrap().count(), 1);
            assert_eq!(prolog.query("ffi_hello(moon)").unwrap().count(), 0);
        })
        .unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn unify_output() {
        register(Predicate::deterministic("ffi_greeting", 1, |args| {
            args[0].as_variable_mut()?.unify("hello")
        }))
        .unwrap();

        with_prolog(|prolog| {
            assert_eq!(solutions(prolog, "ffi_greeting(X)", "X"), ["hello"]);
            assert_eq!(prolog.query("ffi_greeting(\"bye\")").unwrap().count(), 0);
        })
        .unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn nondeterministic() {
        register(Predicate::nondeterministic(
            "ffi_digit",
            1,
            |args, control| -> Result<Outcome, Error> {
                let next = match control {
                    Control::FirstCall => 0,
                    Control::Redo(next) => next,
                    Control::Pruned(_) => return Ok(Outcome::Succeed),
                };
                if next >= 10 {
                    return Ok(Outcome::Fail);
                }

                args[0].as_variable_mut()?.unify(&next)?;
                Ok(Outcome::Retry(next + 1))
            },
        ))
        .unwrap();

        with_prolog(|prolog| {
            assert_eq!(
                solutions(prolog, "ffi_digit(X)", "X"),
                (0..10).map(Value::Integer).collect::<Vec<_>>()
            );
            assert_eq!(solutions(prolog, "once(ffi_digit(X))", "X"), [Value::Integer(0)]);
        })
        .unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn generated_solutions() {
        register(Predicate::solutions("ffi_square", 2, |_| {
            Ok::<_, Error>((1..=3).map(|n| vec![Value::Integer(n), Value::Integer(n * n)]))
        }))
        .unwrap();

        with_prolog(|prolog| {
            assert_eq!(
                solutions(prolog, "ffi_square(_, Y)", "Y"),
                [Value::Integer(1), Value::Integer(4), Value::Integer(9)]
            );
            assert_eq!(solutions(prolog, "ffi_square(X, 9)", "X"), [Value::Integer(3)]);
            assert_eq!(solutions(prolog, "once(ffi_square(X, _))", "X"), [Value::Integer(1)]);
            assert_eq!(prolog.query("ffi_square(4, _)").unwrap().count(), 0);
        })
        .unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn idempotent_registration() {
        let predicate = || Predicate::deterministic("ffi_twice", 0, |_| true);

        assert!(matches!(
            register(predicate()).unwrap(),
            Registration::Registered | Registration::Deferred
        ));
        assert_eq!(register(predicate()).unwrap(), Registration::AlreadyRegistered);
        assert!(is_registered("user", "ffi_twice", 0));
        assert!(!is_registered("user", "ffi_twice", 1));

        with_prolog(|prolog| assert_eq!(prolog.query("ffi_twice").unwrap().count(), 1)).unwrap();
        assert_eq!(register(predicate()).unwrap(), Registration::AlreadyRegistered);
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn errors_become_exceptions() {
        register(Predicate::deterministic("ffi_refuse", 0, |_| {
            Err::<bool, _>(Error::InvalidArgument("refused"))
        }))
        .unwrap();
        register(Predicate::deterministic("ffi_panic", 0, |_| -> bool {
            panic!("boom")
        }))
        .unwrap();

        with_prolog(|prolog| {
            let error = prolog.query("ffi_refuse").unwrap().next().unwrap().unwrap_err();
            assert!(
                matches!(&error, Error::Prolog { term, .. } if term.to_string().contains("refused")),
                "{error}"
            );

            let error = prolog.query("ffi_panic").unwrap().next().unwrap().unwrap_err();
            assert!(
                matches!(&error, Error::Prolog { term, .. } if term.to_string().contains("boom")),
                "{error}"
            );
            assert!(!prolog.is_query_open());
        })
        .unwrap();
    }

    #[foreign_predicate(name = "ffi_add", prologue_root = crate)]
    fn add(left: &Decoded<'_>, right: &Decoded<'_>, sum: &mut Decoded<'_>) -> Result<bool, Error> {
        sum.as_variable_mut()?.unify(&(left.as_i64()? + right.as_i64()?))
    }

    static BELOW_PRUNED_AT: AtomicIsize = AtomicIsize::new(-1);

    #[foreign_predicate(name = "ffi_below", prologue_root = crate)]
    fn below(
        limit: &Decoded<'_>,
        n: &mut Decoded<'_>,
        #[control] control: Control,
    ) -> Result<Outcome, Error> {
        let next = match control {
            Control::FirstCall => 0,
            Control::Redo(next) => next as i64,
            Control::Pruned(next) => {
                limit.as_i64()?;
                BELOW_PRUNED_AT.store(next, Ordering::SeqCst);
                return Ok(Outcome::Succeed);
            }
        };
        if next >= limit.as_i64()? {
            return Ok(Outcome::Fail);
        }

        n.as_variable_mut()?.unify(&next)?;
        Ok(Outcome::Retry(next as isize + 1))
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn macro_predicates() {
        assert_eq!(Add::NAME, "ffi_add");
        assert_eq!(Add::ARITY, 3);
        assert!(!Add::NONDETERMINISTIC);
        assert!(Below::NONDETERMINISTIC);
        assert!(add(&Decoded::Integer(1), &Decoded::Integer(1), &mut Decoded::Integer(2)).is_err());
        assert_eq!(Below::MODULE, "user");

        Add::register().unwrap();
        Below::register().unwrap();

        with_prolog(|prolog| {
            assert_eq!(solutions(prolog, "ffi_add(1, 2, X)", "X"), [Value::Integer(3)]);
            assert_eq!(
                solutions(prolog, "ffi_below(3, X)", "X"),
                [Value::Integer(0), Value::Integer(1), Value::Integer(2)]
            );

            assert_eq!(solutions(prolog, "once(ffi_below(3, X))", "X"), [Value::Integer(0)]);
            assert_eq!(BELOW_PRUNED_AT.swap(-1, Ordering::SeqCst), 1);

            let mut query = prolog.query("ffi_below(3, X)").unwrap();
            assert_eq!(query.next().unwrap().unwrap()["X"], Value::Integer(0));
            assert_eq!(query.next().unwrap().unwrap()["X"], Value::Integer(1));
            query.close().unwrap();
            assert_eq!(BELOW_PRUNED_AT.swap(-1, Ordering::SeqCst), 2);
            assert!(!prolog.is_query_open());
            assert_eq!(solutions(prolog, "ffi_below(2, X), X > 0", "X"), [Value::Integer(1)]);
        })
        .unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn failures_while_pruning_are_not_raised() {
        register(Predicate::nondeterministic(
            "ffi_fragile",
            1,
            |args, control| -> Result<Outcome, Error> {
                match control {
                    Control::FirstCall => {
                        args[0].as_variable_mut()?.unify(&1)?;
                        Ok(Outcome::Retry(1))
                    }
                    Control::Redo(_) => Ok(Outcome::Fail),
                    Control::Pruned(_) => Err(Error::InvalidArgument("fragile")),
                }
            },
        ))
        .unwrap();

        with_prolog(|prolog| {
            assert_eq!(solutions(prolog, "once(ffi_fragile(X))", "X"), [Value::Integer(1)]);

            let mut query = prolog.query("ffi_fragile(X)").unwrap();
            assert!(query.next().unwrap().is_ok());
            query.close().unwrap();
            assert_eq!(prolog.query("true").unwrap().count(), 1);
        })
        .unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn deterministic_predicates_cannot_retry() {
        register(Predicate::deterministic("ffi_stubborn", 0, |_| Outcome::Retry(1))).unwrap();

        with_prolog(|prolog| {
            let error = prolog.query("ffi_stubborn").unwrap().next().unwrap().unwrap_err();
            assert!(
                matches!(
                    &error,
                    Error::Prolog { term, .. } if term.to_string().contains("cannot leave a choice point")
                ),
                "{error}"
            );
            assert!(!prolog.is_query_open());
        })
        .unwrap();
    }
}
