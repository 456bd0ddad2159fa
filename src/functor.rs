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

use {
    crate::{
        Error, Prolog,
        atom::Atom,
        decode::{Decoded, decode_acyclic},
        encode::PutTerm,
        frame::Frame,
        sys::{
            PL_cons_functor_v, PL_functor_arity, PL_functor_name, PL_get_arg, PL_get_functor,
            PL_new_functor, PL_new_term_refs, functor_t,
        },
        term::Term,
        utils::c_predicate,
        value::{self, Value},
    },
    itertools::Itertools,
    std::fmt::{self, Display, Formatter},
};

impl Prolog {
    pub fn make_functor<S>(&self, name: &S, arity: usize) -> Functor
    where
        S: AsRef<str> + ?Sized,
    {
        Functor::intern(name.as_ref(), arity)
    }
}

/// Name and arity of a compound term.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Functor {
    handle: functor_t,
    name: Atom,
    arity: usize,
}
impl Functor {
    pub(crate) fn intern(name: &str, arity: usize) -> Self {
        let name = Atom::intern(name);

        Self {
            handle: unsafe { PL_new_functor(name.as_raw(), arity) },
            name,
            arity,
        }
    }

    /// # Safety
    ///
    /// `handle` must be a functor of the running engine.
    pub unsafe fn from_raw(handle: functor_t) -> Self {
        unsafe {
            Self {
                handle,
                name: Atom::from_raw(PL_functor_name(handle)),
                arity: PL_functor_arity(handle),
            }
        }
    }

    pub fn as_raw(&self) -> functor_t {
        self.handle
    }

    pub fn name(&self) -> &str {
        self.name.name()
    }

    pub fn atom(&self) -> &Atom {
        &self.name
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Build the compound term `name(args...)`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use prologue::{PutTerm, with_prolog};
    /// # #[cfg(not(miri))]
    /// with_prolog(|prolog| {
    ///     prolog.with_frame(|frame| {
    ///         let point = prolog.make_functor("point", 2);
    ///         let term = point.construct(frame, &[&1, &2]).unwrap();
    ///         assert_eq!(term.to_string(), "point(1,2)");
    ///         assert!(point.construct(frame, &[&1]).is_err());
    ///     })
    /// })
    /// .unwrap();
    /// ```
    pub fn construct<'f>(
        &self,
        frame: &'f Frame<'_>,
        args: &[&dyn PutTerm],
    ) -> Result<Term<'f>, Error> {
        let term = frame.new_term_ref();
        self.cons_into(&term, args).map(|_| term)
    }

    pub(crate) fn cons_into(&self, term: &Term<'_>, args: &[&dyn PutTerm]) -> Result<(), Error> {
        if args.len() != self.arity {
            return Err(Error::ArityMismatch {
                name: self.name().to_owned(),
                arity: self.arity,
                found: args.len(),
            });
        }

        let argv = unsafe { PL_new_term_refs(self.arity) };
        args.iter().enumerate().try_for_each(|(index, arg)| {
            arg.put_term(&unsafe { Term::from_raw(argv + index) })
        })?;

        c_predicate(|| unsafe { PL_cons_functor_v(term.as_raw(), self.handle, argv) })
            .then_some(())
            .ok_or(Error::Encode("compound"))
    }
}
impl Display for Functor {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}/{}", self.name, self.arity)
    }
}

/// Decoded compound term.
#[derive(Clone, Debug)]
pub struct Compound<'f> {
    functor: Functor,
    args: Vec<Decoded<'f>>,
}
impl<'f> Compound<'f> {
    pub(crate) fn decode(term: Term<'f>, frame: &'f Frame<'_>) -> Result<Self, Error> {
        let mut handle = 0;
        if !c_predicate(|| unsafe { PL_get_functor(term.as_raw(), &raw mut handle) }) {
            return Err(Error::InvalidType {
                expected: "compound",
            });
        }
        let functor = unsafe { Functor::from_raw(handle) };

        (1..=functor.arity)
            .map(|index| {
                let arg = frame.new_term_ref();
                unsafe { PL_get_arg(index, term.as_raw(), arg.as_raw()) };
                decode_acyclic(arg, frame)
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|args| Self { functor, args })
    }

    pub fn functor(&self) -> &Functor {
        &self.functor
    }

    pub fn name(&self) -> &str {
        self.functor.name()
    }

    pub fn arity(&self) -> usize {
        self.functor.arity
    }

    pub fn args(&self) -> &[Decoded<'f>] {
        &self.args
    }

    pub fn args_mut(&mut self) -> &mut [Decoded<'f>] {
        &mut self.args
    }

    pub fn into_args(self) -> Vec<Decoded<'f>> {
        self.args
    }

    /// Normalize the compound, applying the interpreter registered for its name and arity.
    pub fn to_value(&self) -> Value {
        value::interpret(
            self.name(),
            self.args.iter().map(Decoded::to_value).collect(),
        )
    }
}
impl Display for Compound<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        if self.args.is_empty() {
            f.write_str(self.name())
        } else {
            write!(f, "{}({})", self.name(), self.args.iter().format(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::with_prolog};

    #[cfg_attr(miri, ignore)]
    #[test]
    fn functor_identity() {
        with_prolog(|prolog| {
            let functor = prolog.make_functor("point", 2);
            assert_eq!(functor.name(), "point");
            assert_eq!(functor.arity(), 2);
            assert_eq!(functor.to_string(), "point/2");
            assert_eq!(functor, prolog.make_functor("point", 2));
            assert_ne!(functor, prolog.make_functor("point", 3));
            assert_eq!(unsafe { Functor::from_raw(functor.as_raw()) }, functor);
        })
        .unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn construct_nested() {
        with_prolog(|prolog| {
            prolog.with_frame(|frame| {
                let n = prolog.make_functor("n", 1);
                let np = prolog.make_functor("np", 2);
                let d = prolog.make_functor("d", 1);

                let the = d.construct(frame, &[&"the"]).unwrap();
                let bat = n.construct(frame, &[&"bat"]).unwrap();
                let phrase = np.construct(frame, &[&the, &bat]).unwrap();

                let Decoded::Compound(compound) = phrase.decode(frame).unwrap() else {
                    panic!("expected a compound");
                };
                assert_eq!(compound.name(), "np");
                assert_eq!(compound.arity(), 2);
                assert_eq!(compound.to_string(), "np(d(the), n(bat))");
            })
        })
        .unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn arity_mismatch() {
        with_prolog(|prolog| {
            prolog.with_frame(|frame| {
                assert!(matches!(
                    prolog.make_functor("f", 2).construct(frame, &[&1, &2, &3]),
                    Err(Error::ArityMismatch {
                        arity: 2,
                        found: 3,
                        ..
                    })
                ));
            })
        })
        .unwrap();
    }
}
