//! Runtime-resizable lists.
//!
//! A [`DynamicList`] is a [`BaseList`] with an item factory. The factory
//! builds the items appended by [`DynamicList::add_item`] and may return
//! several items, or use an argument supplied by the caller.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use reform_rs_core::{ReformResult, ValidationTrigger};

use crate::base_list::{to_items, BaseList};
use crate::field::{FieldDictionary, Item};
use crate::list::ListAction;
use crate::validation::ValidationDictionary;

/// Builds the items appended by [`DynamicList::add_item`].
pub type ItemFactory = Arc<dyn Fn(Option<&Value>) -> Vec<Item> + Send + Sync>;

/// A [`BaseList`] that can grow, shrink, and reorder.
///
/// # Examples
///
/// ```
/// use reform_rs_forms::dynamic_list::DynamicList;
/// use serde_json::json;
///
/// let empty_card = || json!({"cardNumber": "", "cvv": ""}).as_object().unwrap().clone();
/// let mut cards = DynamicList::new(vec![], empty_card);
///
/// cards.add_item();
/// assert_eq!(cards.len(), 1);
/// assert!(cards.dirty());
/// ```
pub struct DynamicList {
    base: BaseList,
    factory: ItemFactory,
}

impl DynamicList {
    /// Creates a list whose [`add_item`](Self::add_item) appends one item
    /// built by `factory`.
    pub fn new<F>(items: Vec<Item>, factory: F) -> Self
    where
        F: Fn() -> Item + Send + Sync + 'static,
    {
        Self::with_factory(items, move |_| vec![factory()])
    }

    /// Creates a list with a factory that receives the optional argument
    /// passed to [`add_item_with`](Self::add_item_with).
    pub fn with_factory<F>(items: Vec<Item>, factory: F) -> Self
    where
        F: Fn(Option<&Value>) -> Vec<Item> + Send + Sync + 'static,
    {
        Self {
            base: BaseList::new(items),
            factory: Arc::new(factory),
        }
    }

    /// Creates a list from typed items.
    ///
    /// The factory is called once here, so a factory whose items are not
    /// objects is rejected before any [`add_item`](Self::add_item).
    ///
    /// # Errors
    ///
    /// Returns [`ReformError::ShapeMismatch`] if an item, or the factory's
    /// item, does not serialize to an object.
    ///
    /// [`ReformError::ShapeMismatch`]: reform_rs_core::ReformError::ShapeMismatch
    pub fn from_items<T, F>(items: &[T], factory: F) -> ReformResult<Self>
    where
        T: Serialize,
        F: Fn() -> T + Send + Sync + 'static,
    {
        to_items(&[factory()])?;
        let factory = move |_: Option<&Value>| {
            to_items(&[factory()]).unwrap_or_else(|err| {
                tracing::error!(%err, "item factory produced a non-object item");
                Vec::new()
            })
        };
        Ok(Self::with_factory(to_items(items)?, factory))
    }

    /// Attaches per-key item validation.
    #[must_use]
    pub fn with_validation(mut self, validates: ValidationDictionary) -> Self {
        self.base = self.base.with_validation(validates);
        self
    }

    /// Declares the values the validation closures depend on.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Vec<Value>) -> Self {
        self.base = self.base.with_dependencies(dependencies);
        self
    }

    /// Sets when item fields re-run validation on change.
    #[must_use]
    pub fn with_trigger(mut self, trigger: ValidationTrigger) -> Self {
        self.base = self.base.with_trigger(trigger);
        self
    }

    /// The wrapped list.
    pub const fn base(&self) -> &BaseList {
        &self.base
    }

    /// The wrapped list, mutably.
    pub fn base_mut(&mut self) -> &mut BaseList {
        &mut self.base
    }

    /// The current field dictionaries, in order.
    pub fn fields(&self) -> &[FieldDictionary] {
        self.base.fields()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.base.len()
    }

    /// Whether the list has no items.
    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    /// The plain values of every item.
    pub fn values(&self) -> Vec<Item> {
        self.base.values()
    }

    /// Appends whatever the factory builds with no argument.
    pub fn add_item(&mut self) {
        self.append((self.factory)(None));
    }

    /// Appends whatever the factory builds from `argument`.
    pub fn add_item_with(&mut self, argument: &Value) {
        self.append((self.factory)(Some(argument)));
    }

    /// Inserts `item` at `index`.
    ///
    /// # Errors
    ///
    /// Fails when `index` is greater than the length.
    pub fn insert_item(&mut self, index: usize, item: Item) -> ReformResult<()> {
        self.base.dispatch(ListAction::AddItem {
            items: vec![item],
            at: Some(index),
        })
    }

    /// Removes the item at `index`.
    ///
    /// # Errors
    ///
    /// Fails when `index` is out of range.
    pub fn remove_item(&mut self, index: usize) -> ReformResult<()> {
        self.base.dispatch(ListAction::RemoveItem(index))
    }

    /// Moves the item at `from` to `to`.
    ///
    /// # Errors
    ///
    /// Fails when either position is out of range.
    pub fn move_item(&mut self, from: usize, to: usize) -> ReformResult<()> {
        self.base.dispatch(ListAction::MoveItem { from, to })
    }

    /// Rebuilds every item from the baseline.
    pub fn reset(&mut self) {
        self.base.reset();
    }

    /// Whether the list differs from its baseline.
    pub fn dirty(&self) -> bool {
        self.base.dirty()
    }

    fn append(&mut self, items: Vec<Item>) {
        if items.is_empty() {
            return;
        }
        // Appending is always in range.
        if let Err(err) = self.base.dispatch(ListAction::AddItem { items, at: None }) {
            tracing::error!(%err, "append failed");
        }
    }
}

impl fmt::Debug for DynamicList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicList")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::not_empty;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Card {
        card_number: String,
        cvv: String,
    }

    fn empty_card() -> Card {
        Card {
            card_number: String::new(),
            cvv: String::new(),
        }
    }

    fn cards() -> DynamicList {
        DynamicList::from_items(
            &[Card {
                card_number: "4242".into(),
                cvv: "422".into(),
            }],
            empty_card,
        )
        .unwrap()
    }

    #[test]
    fn test_add_item_uses_factory() {
        let mut list = cards();
        list.add_item();
        assert_eq!(list.len(), 2);
        assert_eq!(list.values()[1]["cardNumber"], "");
        assert!(list.dirty());

        list.remove_item(1).unwrap();
        assert!(!list.dirty());
    }

    #[test]
    fn test_factory_with_argument_and_many_items() {
        let mut list = DynamicList::with_factory(vec![], |arg| {
            let count = arg.and_then(Value::as_u64).unwrap_or(1);
            (0..count)
                .map(|i| json!({ "position": i }).as_object().unwrap().clone())
                .collect()
        });
        list.add_item();
        list.add_item_with(&json!(3));
        assert_eq!(list.len(), 4);
        assert_eq!(list.values()[3]["position"], 2);
    }

    #[test]
    fn test_empty_factory_result_is_a_no_op() {
        let mut list = DynamicList::with_factory(vec![], |_| Vec::new());
        list.add_item();
        assert!(list.is_empty());
        assert!(!list.dirty());
    }

    #[test]
    fn test_insert_move_remove() {
        let mut list = cards();
        let item = json!({"cardNumber": "1111", "cvv": "111"})
            .as_object()
            .unwrap()
            .clone();
        list.insert_item(0, item).unwrap();
        assert_eq!(list.values()[0]["cardNumber"], "1111");

        list.move_item(0, 1).unwrap();
        assert_eq!(list.values()[1]["cardNumber"], "1111");
        assert_eq!(list.values()[0]["cardNumber"], "4242");

        assert!(list.insert_item(5, Item::new()).is_err());
        assert!(list.move_item(0, 2).is_err());
        assert!(list.remove_item(2).is_err());

        list.remove_item(1).unwrap();
        assert!(!list.dirty());
    }

    #[test]
    fn test_reset_restores_baseline_length() {
        let mut list = cards();
        list.add_item();
        list.add_item();
        list.remove_item(0).unwrap();
        list.reset();
        assert_eq!(list.len(), 1);
        assert!(!list.dirty());
    }

    #[test]
    fn test_factory_of_non_objects_is_rejected_up_front() {
        let items = [json!({"cardNumber": "4242", "cvv": "422"})];
        let err = DynamicList::from_items(&items, || json!(null)).unwrap_err();
        assert!(matches!(err, reform_rs_core::ReformError::ShapeMismatch(_)));

        let err = DynamicList::from_items::<u32, _>(&[], || 7).unwrap_err();
        assert!(matches!(err, reform_rs_core::ReformError::ShapeMismatch(_)));

        assert!(DynamicList::from_items(&items, || json!({"cardNumber": "", "cvv": ""})).is_ok());
    }

    #[test]
    fn test_validation_through_base() {
        let mut list = cards().with_validation(ValidationDictionary::from([(
            "cvv".to_string(),
            not_empty("CVV is required").into(),
        )]));
        list.add_item();
        let errors = list.base_mut().validate_all();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field_path().as_deref(), Some("1.cvv"));
    }
}
