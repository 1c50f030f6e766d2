//! Dirty tracking across nested scopes.
//!
//! Anything that holds fields implements [`Dirty`]. Aggregates are dirty when
//! any member is, so fields nested in groups nested in lists compose without
//! special cases.

use std::collections::BTreeMap;

use crate::bag::{FieldBag, FieldNode};
use crate::base_list::BaseList;
use crate::dynamic_list::DynamicList;
use crate::field::Field;

/// A piece of form state that can differ from its baseline.
pub trait Dirty {
    /// Whether the current value differs from the baseline.
    fn is_dirty(&self) -> bool;
}

impl Dirty for Field {
    fn is_dirty(&self) -> bool {
        self.dirty()
    }
}

impl Dirty for FieldNode {
    fn is_dirty(&self) -> bool {
        match self {
            Self::Field(field) => field.is_dirty(),
            Self::Group(bag) => bag.is_dirty(),
            Self::List(items) => items.is_dirty(),
        }
    }
}

impl Dirty for FieldBag {
    fn is_dirty(&self) -> bool {
        self.iter().any(|(_, node)| node.is_dirty())
    }
}

impl Dirty for BaseList {
    fn is_dirty(&self) -> bool {
        self.dirty()
    }
}

impl Dirty for DynamicList {
    fn is_dirty(&self) -> bool {
        self.dirty()
    }
}

impl<T: Dirty> Dirty for BTreeMap<String, T> {
    fn is_dirty(&self) -> bool {
        self.values().any(Dirty::is_dirty)
    }
}

impl<T: Dirty> Dirty for [T] {
    fn is_dirty(&self) -> bool {
        self.iter().any(Dirty::is_dirty)
    }
}

impl<T: Dirty> Dirty for Vec<T> {
    fn is_dirty(&self) -> bool {
        self.as_slice().is_dirty()
    }
}

impl<T: Dirty> Dirty for Option<T> {
    fn is_dirty(&self) -> bool {
        self.as_ref().is_some_and(Dirty::is_dirty)
    }
}

impl<T: Dirty + ?Sized> Dirty for &T {
    fn is_dirty(&self) -> bool {
        (**self).is_dirty()
    }
}

/// Logical OR of the dirty state of every member.
pub fn compute_dirty<I>(members: I) -> bool
where
    I: IntoIterator,
    I::Item: Dirty,
{
    members.into_iter().any(|m| m.is_dirty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{item_to_fields, FieldDictionary};
    use serde_json::json;

    #[test]
    fn test_clean_aggregates() {
        let fields = vec![Field::new("a"), Field::new(1)];
        assert!(!fields.is_dirty());
        assert!(!compute_dirty(&fields));
        assert!(!compute_dirty(Vec::<Field>::new()));
    }

    #[test]
    fn test_one_dirty_member_wins() {
        let mut fields = vec![Field::new("a"), Field::new("b")];
        fields[1].on_change("c");
        assert!(compute_dirty(&fields));
    }

    #[test]
    fn test_nested_bag() {
        let mut bag = FieldBag::new().with(
            "variants",
            vec![FieldBag::new().with("options", FieldBag::new().with("size", Field::new("M")))],
        );
        assert!(!bag.is_dirty());

        bag.field_at_mut(&["variants", "0", "options", "size"])
            .unwrap()
            .on_change("L");
        assert!(bag.is_dirty());
        assert!(bag.get("variants").unwrap().is_dirty());
    }

    #[test]
    fn test_dictionaries_and_options() {
        let item = json!({"cvv": "422"}).as_object().unwrap().clone();
        let mut dict: FieldDictionary = item_to_fields(&item);
        assert!(!dict.is_dirty());
        dict.get_mut("cvv").unwrap().on_change("000");
        assert!(dict.is_dirty());

        let none: Option<Field> = None;
        assert!(!none.is_dirty());
        assert!(Some(dict).is_dirty());
    }
}
