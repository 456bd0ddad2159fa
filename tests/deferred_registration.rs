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

//! Registrations made before the engine starts are installed once it does.
//!
//! This runs in its own process, so nothing has initialized the engine before the test does.

use prologue::{
    Control, Decoded, Error, ForeignPredicate, Outcome, Predicate, Registration, Value, foreign,
    foreign_predicate, init, with_prolog,
};

#[foreign_predicate(name = "deferred_count")]
fn count(
    limit: &Decoded<'_>,
    n: &mut Decoded<'_>,
    #[control] control: Control,
) -> Result<Outcome, Error> {
    let next = match control {
        Control::FirstCall => 1,
        Control::Redo(next) => next as i64,
        Control::Pruned(_) => return Ok(Outcome::Succeed),
    };
    if next > limit.as_i64()? {
        return Ok(Outcome::Fail);
    }

    n.as_variable_mut()?.unify(&next)?;
    Ok(Outcome::Retry(next as isize + 1))
}

fn values(goal: &str, variable: &str) -> Vec<Value> {
    with_prolog(|prolog| {
        prolog
            .query(goal)
            .unwrap()
            .map(|solution| solution.unwrap()[variable].clone())
            .collect()
    })
    .unwrap()
}

#[cfg_attr(miri, ignore)]
#[test]
fn registrations_wait_for_the_engine() {
    let greeting = || {
        Predicate::deterministic("deferred_greeting", 1, |args| {
            args[0].as_variable_mut()?.unify("hello")
        })
    };
    let scoped =
        Predicate::deterministic("deferred_scoped", 0, |_| true).in_module("deferred_tests");

    assert!(!init::is_initialized());
    assert_eq!(foreign::register(greeting()).unwrap(), Registration::Deferred);
    assert_eq!(foreign::register(scoped).unwrap(), Registration::Deferred);
    assert_eq!(Count::register().unwrap(), Registration::Deferred);
    assert_eq!(
        foreign::register(greeting()).unwrap(),
        Registration::AlreadyRegistered
    );
    assert!(foreign::is_registered("user", "deferred_greeting", 1));
    assert!(!init::is_initialized());

    assert_eq!(values("deferred_greeting(X)", "X"), [Value::String("hello".into())]);
    assert!(init::is_initialized());
    assert_eq!(
        values("deferred_count(3, N)", "N"),
        [Value::Integer(1), Value::Integer(2), Value::Integer(3)]
    );
    assert_eq!(values("deferred_tests:deferred_scoped, X = 1", "X"), [Value::Integer(1)]);

    assert_eq!(
        foreign::register(greeting()).unwrap(),
        Registration::AlreadyRegistered
    );
    assert_eq!(Count::register().unwrap(), Registration::AlreadyRegistered);
    assert_eq!(
        foreign::register(Predicate::deterministic("deferred_late", 0, |_| true)).unwrap(),
        Registration::Registered
    );
    assert_eq!(values("deferred_late, X = done", "X"), [Value::Atom("done".into())]);
}
