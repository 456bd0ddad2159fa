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

//! Helpers for editing the clause database.

use {
    crate::{
        Error, Prolog,
        query::QueryOptions,
        utils::{quote_atom, resolve_path},
    },
    std::path::Path,
};

impl Prolog {
    /// Run `goal` for its first solution, reporting whether there was one.
    fn run_once(&self, goal: &str) -> Result<bool, Error> {
        let options = QueryOptions::default()
            .catch_errors(true)
            .max_results(Some(1));
        let mut query = self.query_with(goal, options)?;

        match query.next() {
            Some(solution) => solution.map(|_| true),
            None => Ok(false),
        }
    }

    fn run_det(&self, goal: String) -> Result<(), Error> {
        if self.run_once(&goal)? {
            Ok(())
        } else {
            Err(Error::Failed { goal })
        }
    }

    /// Add `clause` as the first clause of its predicate.
    pub fn asserta(&self, clause: &str) -> Result<(), Error> {
        self.run_det(format!("asserta(({clause}))."))
    }

    /// Add `clause` as the last clause of its predicate.
    ///
    /// ```
    /// # use prologue::with_prolog;
    /// # #[cfg(not(miri))]
    /// with_prolog(|prolog| {
    ///     prolog.assertz("big(airplane)").unwrap();
    ///     prolog.assertz("small(mouse)").unwrap();
    ///     prolog.assertz("bigger(A, B) :- big(A), small(B)").unwrap();
    ///     assert_eq!(prolog.query("bigger(airplane, mouse)").unwrap().count(), 1);
    /// })
    /// .unwrap();
    /// ```
    pub fn assertz(&self, clause: &str) -> Result<(), Error> {
        self.run_det(format!("assertz(({clause}))."))
    }

    /// Declare predicates such as `person/1` as dynamic.
    pub fn dynamic(&self, indicators: &[&str]) -> Result<(), Error> {
        if indicators.is_empty() {
            return Err(Error::InvalidArgument(
                "at least one predicate indicator is needed",
            ));
        }
        self.run_det(format!("dynamic(({})).", indicators.join(", ")))
    }

    /// Remove the first clause unifying with `clause`, returning whether there was one.
    pub fn retract(&self, clause: &str) -> Result<bool, Error> {
        self.run_once(&format!("retract(({clause}))."))
    }

    /// Remove every clause whose head unifies with `head`.
    pub fn retractall(&self, head: &str) -> Result<(), Error> {
        self.run_det(format!("retractall(({head}))."))
    }

    /// Load a source file, resolving `path` against `relative_to` first.
    ///
    /// A file as `relative_to` makes `path` its sibling and a directory makes `path` its child.
    pub fn consult<P>(&self, path: P, relative_to: Option<&Path>) -> Result<(), Error>
    where
        P: AsRef<Path>,
    {
        let path = resolve_path(path.as_ref(), relative_to)?;
        let text = path.to_str().ok_or_else(|| Error::Path {
            path: path.clone(),
            reason: "path is not valid utf-8",
        })?;

        tracing::debug!(path = text, "consulting");
        self.run_det(format!("consult({}).", quote_atom(text)))
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{Value, with_prolog},
        std::{fs, io::Write},
    };

    #[cfg_attr(miri, ignore)]
    #[test]
    fn assert_order() {
        with_prolog(|prolog| {
            prolog.assertz("db_order(b)").unwrap();
            prolog.assertz("db_order(c)").unwrap();
            prolog.asserta("db_order(a)").unwrap();

            let order = prolog
                .query("db_order(X)")
                .unwrap()
                .map(|solution| solution.unwrap()["X"].to_string())
                .collect::<Vec<_>>();
            assert_eq!(order, ["a", "b", "c"]);
        })
        .unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn dynamic_and_retract() {
        with_prolog(|prolog| {
            assert!(matches!(prolog.dynamic(&[]), Err(Error::InvalidArgument(_))));
            prolog.dynamic(&["db_person/1", "db_pet/2"]).unwrap();
            assert_eq!(prolog.query("db_person(X)").unwrap().count(), 0);

            prolog.asserta("db_person(jane)").unwrap();
            prolog.asserta("db_person(joe)").unwrap();
            assert!(prolog.retract("db_person(jane)").unwrap());
            assert!(!prolog.retract("db_person(jane)").unwrap());

            let people = prolog
                .query("db_person(X)")
                .unwrap()
                .map(|solution| solution.unwrap()["X"].clone())
                .collect::<Vec<_>>();
            assert_eq!(people, [Value::Atom("joe".into())]);

            prolog.retractall("db_person(_)").unwrap();
            assert_eq!(prolog.query("db_person(X)").unwrap().count(), 0);
        })
        .unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn errors_are_reported() {
        with_prolog(|prolog| {
            assert!(matches!(
                prolog.asserta("foo :- 1"),
                Err(Error::Prolog { .. })
            ));
            assert!(!prolog.is_query_open());
        })
        .unwrap();
    }

    #[cfg_attr(miri, ignore)]
    #[test]
    fn consult_relative() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("run.rs");
        fs::File::create(&script).unwrap();
        fs::File::create(dir.path().join("db_facts.pl"))
            .and_then(|mut file| file.write_all(b"db_color(red).\ndb_color(blue).\n"))
            .unwrap();

        with_prolog(|prolog| {
            prolog.consult("db_facts.pl", Some(&script)).unwrap();
            assert_eq!(prolog.query("db_color(X)").unwrap().count(), 2);

            prolog.consult("db_facts.pl", Some(dir.path())).unwrap();
            assert_eq!(prolog.query("db_color(X)").unwrap().count(), 2);

            assert!(matches!(
                prolog.consult("db_facts.pl", Some(&dir.path().join("missing"))),
                Err(Error::Path { .. })
            ));
        })
        .unwrap();
    }
}
