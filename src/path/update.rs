/*!
# Updater

In-place mutation of matched locations. The expression is evaluated first;
every recorded locator chain is then re-walked against the document as it
mutates, so a later application always sees the effect of earlier ones.
Chains that no longer resolve are skipped silently.
*/
use serde_json::Value;

use crate::error::Error;
use crate::path::ast::CompiledPath;
use crate::path::common::Locator;

impl CompiledPath {
    /// Replace every matched location with a copy of `replacement`.
    ///
    /// Returns the number of locations updated. An expression matching the
    /// document root replaces the whole document.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jsonpick::path::CompiledPath;
    /// use serde_json::json;
    ///
    /// let mut doc = json!({"items": [{"value": 1}, {"value": 2}]});
    /// let path = CompiledPath::compile("$.items[*].value").unwrap();
    /// assert_eq!(path.update(&mut doc, &json!(0)).unwrap(), 2);
    /// assert_eq!(doc, json!({"items": [{"value": 0}, {"value": 0}]}));
    /// ```
    ///
    /// # Errors
    ///
    /// Same conditions as [`CompiledPath::find`]; a chain that cannot be
    /// applied is skipped, never an error.
    pub fn update(&self, doc: &mut Value, replacement: &Value) -> Result<usize, Error> {
        self.update_with(doc, |_| replacement.clone())
    }

    /// Replace every matched location with `transform(old)`.
    ///
    /// Applications happen in evaluator order against the current document
    /// state. Returns the number of locations updated.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jsonpick::path::CompiledPath;
    /// use serde_json::json;
    ///
    /// let mut doc = json!({"count": 1});
    /// let path = CompiledPath::compile("$.count").unwrap();
    /// path.update_with(&mut doc, |old| json!(old.as_i64().unwrap_or(0) + 1))
    ///     .unwrap();
    /// assert_eq!(doc, json!({"count": 2}));
    /// ```
    ///
    /// # Errors
    ///
    /// Same conditions as [`CompiledPath::find`].
    pub fn update_with<F>(&self, doc: &mut Value, mut transform: F) -> Result<usize, Error>
    where
        F: FnMut(&Value) -> Value,
    {
        let chains: Vec<Vec<Locator>> = self
            .find(doc)?
            .into_iter()
            .map(|ptr| ptr.path)
            .collect();

        let mut applied = 0;
        for chain in &chains {
            if apply_at(doc, chain, &mut transform) {
                applied += 1;
            }
        }
        Ok(applied)
    }
}

/// Resolve a locator chain to its parent and assign the transformed value
/// at the final locator. Returns `false` when the chain no longer
/// resolves.
fn apply_at<F>(doc: &mut Value, chain: &[Locator], transform: &mut F) -> bool
where
    F: FnMut(&Value) -> Value,
{
    let Some((last, parents)) = chain.split_last() else {
        // an empty chain addresses the document root
        let new = transform(doc);
        *doc = new;
        return true;
    };

    let mut target = doc;
    for locator in parents {
        target = match (locator, target) {
            (Locator::Key(key), Value::Object(map)) => match map.get_mut(key) {
                Some(value) => value,
                None => return false,
            },
            (Locator::Index(idx), Value::Array(items)) => match items.get_mut(*idx) {
                Some(value) => value,
                None => return false,
            },
            _ => return false,
        };
    }

    match (last, target) {
        (Locator::Key(key), Value::Object(map)) => match map.get(key) {
            Some(old) => {
                let new = transform(old);
                map.insert(key.clone(), new);
                true
            }
            None => false,
        },
        (Locator::Index(idx), Value::Array(items)) => match items.get(*idx) {
            Some(old) => {
                let new = transform(old);
                items[*idx] = new;
                true
            }
            None => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(expr: &str) -> CompiledPath {
        CompiledPath::compile(expr).expect("path should compile")
    }

    #[test]
    fn update_single_value() {
        let mut doc = json!({"store": {"book": [{"price": 8.95}]}});
        let applied = path("$.store.book[0].price")
            .update(&mut doc, &json!(10.0))
            .unwrap();
        assert_eq!(applied, 1);
        assert_eq!(doc["store"]["book"][0]["price"], json!(10.0));
    }

    #[test]
    fn update_with_transform() {
        let mut doc = json!({"count": 1});
        path("$.count")
            .update_with(&mut doc, |old| json!(old.as_i64().unwrap() + 1))
            .unwrap();
        assert_eq!(doc, json!({"count": 2}));
    }

    #[test]
    fn update_root_replaces_document() {
        let mut doc = json!({"a": 1});
        path("$").update(&mut doc, &json!({"b": 2})).unwrap();
        assert_eq!(doc, json!({"b": 2}));
    }

    #[test]
    fn update_list_index() {
        let mut doc = json!([1, 2, 3]);
        path("$[1]").update(&mut doc, &json!(5)).unwrap();
        assert_eq!(doc, json!([1, 5, 3]));
    }

    #[test]
    fn update_every_wildcard_match() {
        let mut doc = json!({"items": [{"value": 1}, {"value": 2}, {"value": 3}]});
        path("$.items[*].value")
            .update_with(&mut doc, |old| json!(old.as_i64().unwrap() * 2))
            .unwrap();
        assert_eq!(
            doc,
            json!({"items": [{"value": 2}, {"value": 4}, {"value": 6}]})
        );
    }

    #[test]
    fn update_behind_filter_leaves_others_alone() {
        let mut doc = json!({"books": [
            {"price": 10, "title": "A"},
            {"price": 20, "title": "B"},
            {"price": 30, "title": "C"}
        ]});
        path("$.books[?(@.price > 15)].price")
            .update(&mut doc, &json!(0))
            .unwrap();
        assert_eq!(doc["books"][0]["price"], json!(10));
        assert_eq!(doc["books"][1]["price"], json!(0));
        assert_eq!(doc["books"][2]["price"], json!(0));
    }

    #[test]
    fn update_slice() {
        let mut doc = json!([0, 1, 2, 3, 4]);
        path("$[1:4]").update(&mut doc, &json!(9)).unwrap();
        assert_eq!(doc, json!([0, 9, 9, 9, 4]));
    }

    #[test]
    fn update_union_of_keys() {
        let mut doc = json!({"a": 1, "b": 2, "c": 3});
        path("$[a,b]").update(&mut doc, &json!(0)).unwrap();
        assert_eq!(doc, json!({"a": 0, "b": 0, "c": 3}));
    }

    #[test]
    fn update_recursive_descent() {
        let mut doc = json!({"store": {
            "book": [{"price": 8.95}, {"price": 12.99}],
            "bicycle": {"price": 19.95}
        }});
        path("$..price").update(&mut doc, &json!(10.0)).unwrap();
        assert_eq!(doc["store"]["book"][0]["price"], json!(10.0));
        assert_eq!(doc["store"]["book"][1]["price"], json!(10.0));
        assert_eq!(doc["store"]["bicycle"]["price"], json!(10.0));
    }

    #[test]
    fn update_special_keys() {
        let mut doc = json!({"complex.key": 1, "key with space": 2, "c\"d": 3});
        path("$['complex.key']").update(&mut doc, &json!(10)).unwrap();
        path("$['key with space']").update(&mut doc, &json!(20)).unwrap();
        path("$['c\"d']").update(&mut doc, &json!(30)).unwrap();
        assert_eq!(doc, json!({"complex.key": 10, "key with space": 20, "c\"d": 30}));
    }

    #[test]
    fn update_without_matches_is_a_no_op() {
        let mut doc = json!({"a": 1});
        let applied = path("$.b").update(&mut doc, &json!(2)).unwrap();
        assert_eq!(applied, 0);
        assert_eq!(doc, json!({"a": 1}));
    }

    #[test]
    fn updates_apply_in_evaluator_order_against_current_state() {
        // replacing an ancestor first makes the later, deeper chain
        // unresolvable; it is skipped silently
        let mut doc = json!({"a": {"b": 1}});
        let applied = path("$..b").update(&mut doc, &json!(2)).unwrap();
        assert_eq!(applied, 1);
        assert_eq!(doc, json!({"a": {"b": 2}}));
    }

    #[test]
    fn nested_array_updates() {
        let mut doc = json!({"a": [{"b": [1, 2]}, {"b": [3, 4]}]});
        path("$.a[*].b[1]").update(&mut doc, &json!(99)).unwrap();
        assert_eq!(doc, json!({"a": [{"b": [1, 99]}, {"b": [3, 99]}]}));
    }
}
