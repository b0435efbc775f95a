use pyo3::prelude::*;

use crate::error::BridgeError;
use crate::namespace::{Namespace, is_reserved};

/// The user function selected as entry point.
pub struct ScriptCallable {
    /// Name the function was bound to in the namespace.
    pub binding: String,
    pub(crate) callable: Py<PyAny>,
}

/// Pick the first invocable, non-reserved binding in iteration order.
///
/// `bindings` is consumed lazily: values after the match are never pulled,
/// and every value looked at and rejected is dropped before the next one is
/// requested.
pub fn select_entry_point<V>(
    bindings: impl IntoIterator<Item = (String, V)>,
    is_invocable: impl Fn(&V) -> bool,
) -> Option<(String, V)> {
    for (name, value) in bindings {
        if is_reserved(&name) {
            drop(value);
            continue;
        }
        if is_invocable(&value) {
            return Some((name, value));
        }
        tracing::trace!(binding = %name, "Releasing non-invocable binding");
        drop(value);
    }
    None
}

/// Execute `code` in `namespace` and locate its entry point.
pub fn load(namespace: &Namespace, code: &str) -> Result<ScriptCallable, BridgeError> {
    namespace.run(code)?;

    Python::attach(|py| -> Result<ScriptCallable, BridgeError> {
        let bindings = namespace
            .globals(py)
            .iter()
            .filter_map(|(key, value)| match key.extract::<String>() {
                Ok(name) => Some((name, value)),
                Err(_) => {
                    tracing::warn!(key = %key, "Skipping non-string binding");
                    None
                }
            });

        let (binding, callable) = select_entry_point(bindings, |value| value.is_callable())
            .ok_or(BridgeError::NoFunctionDefined)?;

        tracing::debug!(binding = %binding, "Entry point selected");
        Ok(ScriptCallable {
            binding,
            callable: callable.unbind(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Value that records its own release.
    struct Tracked {
        name: &'static str,
        invocable: bool,
        released: Rc<RefCell<Vec<&'static str>>>,
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.released.borrow_mut().push(self.name);
        }
    }

    fn bindings(
        entries: &[(&'static str, bool)],
        released: &Rc<RefCell<Vec<&'static str>>>,
    ) -> Vec<(String, Tracked)> {
        entries.iter()
            .map(|&(name, invocable)| {
                (
                    name.to_string(),
                    Tracked {
                        name,
                        invocable,
                        released: Rc::clone(released),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn picks_the_only_function() {
        let released = Rc::new(RefCell::new(Vec::new()));
        let list = bindings(&[("x", false), ("f", true)], &released);

        let (name, _value) = select_entry_point(list, |v| v.invocable).unwrap();
        assert_eq!(name, "f");
    }

    #[test]
    fn first_in_definition_order_wins() {
        let released = Rc::new(RefCell::new(Vec::new()));
        let list = bindings(&[("first", true), ("second", true)], &released);

        let (name, _value) = select_entry_point(list, |v| v.invocable).unwrap();
        assert_eq!(name, "first");
    }

    #[test]
    fn reserved_names_are_never_selected() {
        let released = Rc::new(RefCell::new(Vec::new()));
        let list = bindings(&[("_asarray", true), ("__builtins__", true)], &released);

        assert!(select_entry_point(list, |v| v.invocable).is_none());
    }

    #[test]
    fn rejected_values_are_released_before_the_match_is_returned() {
        let released = Rc::new(RefCell::new(Vec::new()));
        let list = bindings(
            &[("_helper", true), ("x", false), ("f", true), ("g", true)],
            &released,
        );

        let mut iter = list.into_iter();
        let (name, selected) = select_entry_point(&mut iter, |v| v.invocable).unwrap();
        assert_eq!(name, "f");
        assert_eq!(*released.borrow(), vec!["_helper", "x"]);

        // `g` was never pulled from the iterator
        let rest: Vec<_> = iter.map(|(n, _)| n).collect();
        assert_eq!(rest, vec!["g"]);

        drop(selected);
        assert!(released.borrow().contains(&"f"));
    }

    #[test]
    fn nothing_invocable_releases_everything() {
        let released = Rc::new(RefCell::new(Vec::new()));
        let list = bindings(&[("x", false), ("y", false)], &released);

        assert!(select_entry_point(list, |v| v.invocable).is_none());
        assert_eq!(*released.borrow(), vec!["x", "y"]);
    }
}
