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
        Prolog,
        atom::Atom,
        sys::{PL_module_name, PL_new_module, module_t},
    },
    std::fmt::{self, Display, Formatter},
};

impl Prolog {
    /// Get a module or create it if it doesn't exist.
    ///
    /// # Examples
    ///
    /// ```
    /// # use prologue::with_prolog;
    /// # #[cfg(not(miri))]
    /// with_prolog(|prolog| {
    ///     assert_eq!(prolog.make_module("geometry").name(), "geometry");
    /// })
    /// .unwrap();
    /// ```
    pub fn make_module<S>(&self, name: &S) -> Module
    where
        S: AsRef<str> + ?Sized,
    {
        Module::intern(name.as_ref())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Module {
    handle: module_t,
    name: Atom,
}
impl Module {
    pub(crate) fn intern(name: &str) -> Self {
        let name = Atom::intern(name);

        Self {
            handle: unsafe { PL_new_module(name.as_raw()) },
            name,
        }
    }

    /// The `user` module.
    pub fn user(prolog: &Prolog) -> Self {
        prolog.make_module("user")
    }

    pub fn name(&self) -> &str {
        self.name.name()
    }

    pub(crate) fn as_raw(&self) -> module_t {
        self.handle
    }
}
impl Display for Module {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        Display::fmt(&self.name, f)
    }
}
