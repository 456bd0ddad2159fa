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

use syn::{FnArg, ItemFn, PatType, spanned::Spanned};

/// Shape of the arguments of a foreign predicate function.
pub struct FnArgs {
    /// Number of prolog arguments.
    pub arity: usize,
    /// Whether the last argument takes the `Control`, which makes the
    /// predicate nondeterministic.
    pub control: bool,
}
impl TryFrom<&ItemFn> for FnArgs {
    type Error = syn::Error;

    fn try_from(item: &ItemFn) -> Result<Self, syn::Error> {
        #[derive(Clone, Copy, Default, PartialEq)]
        enum State {
            #[default]
            Terms,
            Control,
        }

        item.sig
            .inputs
            .iter()
            .map(|arg| match arg {
                FnArg::Typed(arg) => Ok(arg),
                FnArg::Receiver(arg) => {
                    Err(syn::Error::new(arg.span(), "functions cannot be methods"))
                }
            })
            .try_fold(
                (State::default(), 0),
                |(state, arity), arg| {
                    arg.and_then(|PatType { attrs, ty, .. }| {
                        let control = attrs.iter().any(|attr| attr.path().is_ident("control"));
                        match (state, control) {
                            (State::Terms, false) => Ok((State::Terms, arity + 1)),
                            (State::Terms, true) => Ok((State::Control, arity)),
                            (State::Control, _) => Err(syn::Error::new(
                                ty.span(),
                                "no more arguments may appear after the `control` argument",
                            )),
                        }
                    })
                },
            )
            .map(|(state, arity)| Self {
                arity,
                control: state == State::Control,
            })
    }
}
