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

//! Conversions from rust values to terms.
//!
//! [PutTerm] overwrites a term reference with a new term. [Unify] unifies an existing term with
//! a value, so it can fail without being an error. Text is put as an atom but unified as a
//! string.

use {
    crate::{
        Error,
        atom::Atom,
        functor::Functor,
        sys::{
            PL_cons_list, PL_put_atom, PL_put_bool, PL_put_chars, PL_put_float, PL_put_functor,
            PL_put_int64, PL_put_nil, PL_put_term, PL_put_variable, PL_unify_atom,
            PL_unify_bool, PL_unify_chars, PL_unify_float, PL_unify_int64, PL_unify_list,
            PL_unify_nil, PROLOGUE_REEXPORTS_PL_ATOM, PROLOGUE_REEXPORTS_PL_STRING,
            PROLOGUE_REEXPORTS_REP_UTF8,
        },
        term::Term,
        utils::c_predicate,
        value::Value,
        variable::Variable,
    },
    std::ffi::c_int,
};

/// Types that can be written into a term reference.
pub trait PutTerm {
    fn put_term(&self, term: &Term<'_>) -> Result<(), Error>;
}

/// Types that can be unified with a term.
pub trait Unify {
    /// Returns `Ok(false)` if unification fails.
    fn unify_term(&self, term: &Term<'_>) -> Result<bool, Error>;
}

impl<'f> Term<'f> {
    /// Overwrite this reference with `value`.
    pub fn put<T>(&self, value: &T) -> Result<(), Error>
    where
        T: PutTerm + ?Sized,
    {
        value.put_term(self)
    }

    pub fn unify<T>(&self, value: &T) -> Result<bool, Error>
    where
        T: Unify + ?Sized,
    {
        value.unify_term(self)
    }
}

fn text_flags(kind: c_int) -> c_int {
    kind | unsafe { PROLOGUE_REEXPORTS_REP_UTF8 } as c_int
}

fn check(ok: bool, what: &'static str) -> Result<(), Error> {
    ok.then_some(()).ok_or(Error::Encode(what))
}

pub(crate) fn put_text(term: &Term<'_>, kind: c_int, bytes: &[u8]) -> Result<(), Error> {
    check(
        c_predicate(|| unsafe {
            PL_put_chars(
                term.as_raw(),
                text_flags(kind),
                bytes.len(),
                bytes.as_ptr().cast(),
            )
        }),
        "text",
    )
}

fn unify_text(term: &Term<'_>, kind: c_int, bytes: &[u8]) -> bool {
    c_predicate(|| unsafe {
        PL_unify_chars(
            term.as_raw(),
            text_flags(kind),
            bytes.len(),
            bytes.as_ptr().cast(),
        )
    })
}

impl<T> PutTerm for &T
where
    T: PutTerm + ?Sized,
{
    fn put_term(&self, term: &Term<'_>) -> Result<(), Error> {
        (**self).put_term(term)
    }
}
impl<T> Unify for &T
where
    T: Unify + ?Sized,
{
    fn unify_term(&self, term: &Term<'_>) -> Result<bool, Error> {
        (**self).unify_term(term)
    }
}

impl PutTerm for str {
    fn put_term(&self, term: &Term<'_>) -> Result<(), Error> {
        put_text(term, unsafe { PROLOGUE_REEXPORTS_PL_ATOM }, self.as_bytes())
    }
}
impl Unify for str {
    fn unify_term(&self, term: &Term<'_>) -> Result<bool, Error> {
        Ok(unify_text(
            term,
            unsafe { PROLOGUE_REEXPORTS_PL_STRING },
            self.as_bytes(),
        ))
    }
}
impl PutTerm for String {
    fn put_term(&self, term: &Term<'_>) -> Result<(), Error> {
        self.as_str().put_term(term)
    }
}
impl Unify for String {
    fn unify_term(&self, term: &Term<'_>) -> Result<bool, Error> {
        self.as_str().unify_term(term)
    }
}

fn to_i64<T>(value: T) -> Result<i64, Error>
where
    T: Copy + ToString,
    i64: TryFrom<T>,
{
    i64::try_from(value).map_err(|_| Error::ArgumentType {
        expected: "64-bit integer",
        found: value.to_string(),
    })
}

macro_rules! impl_encode_for_int {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl PutTerm for $ty {
                fn put_term(&self, term: &Term<'_>) -> Result<(), Error> {
                    let value = to_i64(*self)?;
                    check(
                        c_predicate(|| unsafe { PL_put_int64(term.as_raw(), value) }),
                        "integer",
                    )
                }
            }
            impl Unify for $ty {
                fn unify_term(&self, term: &Term<'_>) -> Result<bool, Error> {
                    let value = to_i64(*self)?;
                    Ok(c_predicate(|| unsafe { PL_unify_int64(term.as_raw(), value) }))
                }
            }
        )+
    };
}
impl_encode_for_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl PutTerm for bool {
    fn put_term(&self, term: &Term<'_>) -> Result<(), Error> {
        check(
            c_predicate(|| unsafe { PL_put_bool(term.as_raw(), c_int::from(*self)) }),
            "bool",
        )
    }
}
impl Unify for bool {
    fn unify_term(&self, term: &Term<'_>) -> Result<bool, Error> {
        Ok(c_predicate(|| unsafe {
            PL_unify_bool(term.as_raw(), c_int::from(*self))
        }))
    }
}

macro_rules! impl_encode_for_float {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl PutTerm for $ty {
                fn put_term(&self, term: &Term<'_>) -> Result<(), Error> {
                    check(
                        c_predicate(|| unsafe { PL_put_float(term.as_raw(), f64::from(*self)) }),
                        "float",
                    )
                }
            }
            impl Unify for $ty {
                fn unify_term(&self, term: &Term<'_>) -> Result<bool, Error> {
                    Ok(c_predicate(|| unsafe {
                        PL_unify_float(term.as_raw(), f64::from(*self))
                    }))
                }
            }
        )+
    };
}
impl_encode_for_float!(f32, f64);

impl<T> PutTerm for [T]
where
    T: PutTerm,
{
    fn put_term(&self, term: &Term<'_>) -> Result<(), Error> {
        check(
            c_predicate(|| unsafe { PL_put_nil(term.as_raw()) }),
            "list",
        )?;

        let head = term.fresh();
        self.iter().rev().try_for_each(|item| {
            item.put_term(&head)?;
            check(
                c_predicate(|| unsafe {
                    PL_cons_list(term.as_raw(), head.as_raw(), term.as_raw())
                }),
                "list",
            )
        })
    }
}
impl<T> Unify for [T]
where
    T: Unify,
{
    fn unify_term(&self, term: &Term<'_>) -> Result<bool, Error> {
        let mut tail = term.copy();
        for item in self {
            let head = tail.fresh();
            let rest = tail.fresh();
            if !c_predicate(|| unsafe {
                PL_unify_list(tail.as_raw(), head.as_raw(), rest.as_raw())
            }) || !item.unify_term(&head)?
            {
                return Ok(false);
            }
            tail = rest;
        }

        Ok(c_predicate(|| unsafe { PL_unify_nil(tail.as_raw()) }))
    }
}
impl<T> PutTerm for Vec<T>
where
    T: PutTerm,
{
    fn put_term(&self, term: &Term<'_>) -> Result<(), Error> {
        self.as_slice().put_term(term)
    }
}
impl<T> Unify for Vec<T>
where
    T: Unify,
{
    fn unify_term(&self, term: &Term<'_>) -> Result<bool, Error> {
        self.as_slice().unify_term(term)
    }
}

impl PutTerm for Term<'_> {
    fn put_term(&self, term: &Term<'_>) -> Result<(), Error> {
        check(
            c_predicate(|| unsafe { PL_put_term(term.as_raw(), self.as_raw()) }),
            "term",
        )
    }
}
impl Unify for Term<'_> {
    fn unify_term(&self, term: &Term<'_>) -> Result<bool, Error> {
        Ok(term.unify_with(self))
    }
}

impl PutTerm for Variable<'_> {
    fn put_term(&self, term: &Term<'_>) -> Result<(), Error> {
        self.term().put_term(term)
    }
}
impl Unify for Variable<'_> {
    fn unify_term(&self, term: &Term<'_>) -> Result<bool, Error> {
        self.term().unify_term(term)
    }
}

impl PutTerm for Atom {
    fn put_term(&self, term: &Term<'_>) -> Result<(), Error> {
        check(
            c_predicate(|| unsafe { PL_put_atom(term.as_raw(), self.as_raw()) }),
            "atom",
        )
    }
}
impl Unify for Atom {
    fn unify_term(&self, term: &Term<'_>) -> Result<bool, Error> {
        Ok(c_predicate(|| unsafe {
            PL_unify_atom(term.as_raw(), self.as_raw())
        }))
    }
}

impl PutTerm for Functor {
    /// Put a compound with fresh variables as arguments.
    fn put_term(&self, term: &Term<'_>) -> Result<(), Error> {
        check(
            c_predicate(|| unsafe { PL_put_functor(term.as_raw(), self.as_raw()) }),
            "compound",
        )
    }
}

fn put_compound(term: &Term<'_>, name: &str, args: &[Value]) -> Result<(), Error> {
    let argv = args.iter().map(|arg| arg as &dyn PutTerm).collect::<Vec<_>>();
    Functor::intern(name, args.len()).cons_into(term, &argv)
}

impl PutTerm for Value {
    fn put_term(&self, term: &Term<'_>) -> Result<(), Error> {
        match self {
            Self::None => check(
                c_predicate(|| unsafe { PL_put_nil(term.as_raw()) }),
                "nil",
            ),
            Self::Bool(value) => value.put_term(term),
            Self::Atom(name) => name.put_term(term),
            Self::String(text) => {
                put_text(term, unsafe { PROLOGUE_REEXPORTS_PL_STRING }, text)
            }
            Self::Integer(value) => value.put_term(term),
            Self::Float(value) => value.put_term(term),
            Self::List(items) => items.put_term(term),
            Self::Tuple(items) => match items.as_slice() {
                [] => Err(Error::Unsupported("an empty tuple")),
                [item] => item.put_term(term),
                [first, rest @ ..] => put_compound(
                    term,
                    ",",
                    &[first.clone(), Self::Tuple(rest.to_vec())],
                ),
            },
            Self::Compound { name, args } => put_compound(term, name, args),
            Self::Variable(_) => check(
                c_predicate(|| unsafe { PL_put_variable(term.as_raw()) }),
                "variable",
            ),
            Self::Dict(_) => Err(Error::Unsupported("a dict")),
            Self::Error(_) => Err(Error::Unsupported("an error object")),
            Self::Opaque(_) => Err(Error::Unsupported("opaque text")),
        }
    }
}
impl Unify for Value {
    fn unify_term(&self, term: &Term<'_>) -> Result<bool, Error> {
        match self {
            Self::None => Ok(c_predicate(|| unsafe { PL_unify_nil(term.as_raw()) })),
            Self::Bool(value) => value.unify_term(term),
            Self::Atom(name) => Ok(unify_text(
                term,
                unsafe { PROLOGUE_REEXPORTS_PL_ATOM },
                name.as_bytes(),
            )),
            Self::String(text) => Ok(unify_text(
                term,
                unsafe { PROLOGUE_REEXPORTS_PL_STRING },
                text,
            )),
            Self::Integer(value) => value.unify_term(term),
            Self::Float(value) => value.unify_term(term),
            Self::List(items) => items.unify_term(term),
            Self::Variable(_) => Ok(true),
            _ => {
                let scratch = term.fresh();
                self.put_term(&scratch)?;
                Ok(term.unify_with(&scratch))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{term::TermType, with_prolog},
        std::collections::BTreeMap,
    };

    #[cfg_attr(miri, ignore)]
    #[test]
    fn scalar_round_trip() {
        with_prolog(|prolog| {
            prolog.with_frame(|frame| {
                let term = frame.new_term_ref();

                term.put(&50).unwrap();
                assert_eq!(term.value().unwrap(), Value::Integer(50));

                term.put("gnu").unwrap();
                assert_eq!(term.term_type(), TermType::Atom);
                assert_eq!(term.value().unwrap(), "gnu");

                term.put(&2.5).unwrap();
                assert_eq!(term.value().unwrap(), Value::Float(2.5));

                term.put(&false).unwrap();
                assert_eq!(term.value().unwrap(), Value::Bool(false));

                term.put(&prolog.make_atom("an atom")).unwrap();
                assert_eq!(term.get_atom().unwrap().name(), "an atom");
            })
        })
        .unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn text_is_put_as_atom_but_unified_as_string() {
        with_prolog(|prolog| {
            prolog.with_frame(|frame| {
                let atom = frame.new_term_ref();
                atom.put("hello").unwrap();
                assert_eq!(atom.term_type(), TermType::Atom);
                assert!(!atom.unify("hello").unwrap());

                let string = frame.new_term_ref();
                assert!(string.unify("hello").unwrap());
                assert_eq!(string.term_type(), TermType::String);
            })
        })
        .unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn lists() {
        with_prolog(|prolog| {
            prolog.with_frame(|frame| {
                let term = frame.new_term_ref();
                term.put(&vec![1, 2, 3]).unwrap();
                assert_eq!(term.to_string(), "[1,2,3]");
                assert!(term.unify(&[1, 2, 3][..]).unwrap());
                assert!(!term.unify(&[1, 2][..]).unwrap());

                term.put(&Vec::<i64>::new()).unwrap();
                assert_eq!(term.term_type(), TermType::Nil);

                term.put(&vec![vec!["a"], vec!["b", "c"]]).unwrap();
                assert_eq!(term.to_string(), "[[a],[b,c]]");
            })
        })
        .unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn values() {
        with_prolog(|prolog| {
            prolog.with_frame(|frame| {
                let term = frame.new_term_ref();
                let compound = Value::Compound {
                    name: "f".into(),
                    args: vec![Value::Atom("a".into()), Value::List(vec![Value::Integer(1)])],
                };
                term.put(&compound).unwrap();
                assert_eq!(term.to_string(), "f(a,[1])");
                assert_eq!(term.value().unwrap(), compound);

                term.put(&Value::Tuple(vec![
                    Value::Integer(1),
                    Value::Integer(2),
                    Value::Integer(3),
                ]))
                .unwrap();
                assert_eq!(term.to_string(), "1,2,3");

                term.put(&Value::None).unwrap();
                assert_eq!(term.term_type(), TermType::Nil);

                assert!(matches!(
                    term.put(&Value::Dict(BTreeMap::new())),
                    Err(Error::Unsupported(_))
                ));
                assert!(matches!(
                    term.put(&Value::Tuple(Vec::new())),
                    Err(Error::Unsupported(_))
                ));

                let fresh = frame.new_term_ref();
                assert!(fresh.unify(&compound).unwrap());
                assert!(fresh.unify(&Value::Variable("_".into())).unwrap());
            })
        })
        .unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn integer_range() {
        with_prolog(|prolog| {
            prolog.with_frame(|frame| {
                let term = frame.new_term_ref();
                term.put(&u64::from(u32::MAX)).unwrap();
                assert_eq!(term.get_i64().unwrap(), i64::from(u32::MAX));
                assert!(matches!(
                    term.put(&u64::MAX),
                    Err(Error::ArgumentType {
                        expected: "64-bit integer",
                        ..
                    })
                ));
            })
        })
        .unwrap();
    }
}
