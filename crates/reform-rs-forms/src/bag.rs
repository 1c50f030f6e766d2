//! Field bags: named trees of fields.
//!
//! A [`FieldBag`] maps names to [`FieldNode`]s. A node is a single field, a
//! nested group of fields, or a static list of groups, so the shape of a
//! bag can mirror any structured value. Validation, reset, make-clean, and
//! value projection all recurse through the tree.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use reform_rs_core::{ReformError, ReformResult};

use crate::field::Field;
use crate::submit::FormError;
use crate::validation::ValidationContext;

/// One entry of a [`FieldBag`].
#[derive(Debug, Clone)]
pub enum FieldNode {
    /// A single field.
    Field(Field),
    /// A nested dictionary of fields.
    Group(FieldBag),
    /// A static list of dictionaries.
    List(Vec<FieldBag>),
}

impl FieldNode {
    /// The plain value of this node.
    pub fn value(&self) -> Value {
        match self {
            Self::Field(field) => field.value().clone(),
            Self::Group(bag) => Value::Object(bag.values()),
            Self::List(items) => Value::Array(items.iter().map(|b| Value::Object(b.values())).collect()),
        }
    }

    fn reset(&mut self) {
        match self {
            Self::Field(field) => field.reset(),
            Self::Group(bag) => bag.reset(),
            Self::List(items) => items.iter_mut().for_each(FieldBag::reset),
        }
    }

    fn make_clean(&mut self) {
        match self {
            Self::Field(field) => field.make_clean(),
            Self::Group(bag) => bag.make_clean(),
            Self::List(items) => items.iter_mut().for_each(FieldBag::make_clean),
        }
    }
}

impl From<Field> for FieldNode {
    fn from(field: Field) -> Self {
        Self::Field(field)
    }
}

impl From<FieldBag> for FieldNode {
    fn from(bag: FieldBag) -> Self {
        Self::Group(bag)
    }
}

impl From<Vec<FieldBag>> for FieldNode {
    fn from(items: Vec<FieldBag>) -> Self {
        Self::List(items)
    }
}

/// A named tree of fields.
///
/// # Examples
///
/// ```
/// use reform_rs_forms::bag::FieldBag;
/// use reform_rs_forms::field::Field;
///
/// let bag = FieldBag::new()
///     .with("title", Field::new("Hat"))
///     .with("price", FieldBag::new().with("amount", Field::new(10)));
///
/// assert_eq!(bag.values()["price"]["amount"], 10);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FieldBag {
    nodes: BTreeMap<String, FieldNode>,
}

impl FieldBag {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, node: impl Into<FieldNode>) -> Self {
        self.insert(name, node);
        self
    }

    /// Adds or replaces a node.
    pub fn insert(&mut self, name: impl Into<String>, node: impl Into<FieldNode>) {
        self.nodes.insert(name.into(), node.into());
    }

    /// Returns a node by name.
    pub fn get(&self, name: &str) -> Option<&FieldNode> {
        self.nodes.get(name)
    }

    /// Returns a top-level field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        match self.nodes.get(name) {
            Some(FieldNode::Field(field)) => Some(field),
            _ => None,
        }
    }

    /// Returns a top-level field by name, mutably.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        match self.nodes.get_mut(name) {
            Some(FieldNode::Field(field)) => Some(field),
            _ => None,
        }
    }

    /// Resolves a path such as `["items", "0", "sku"]` to a field.
    pub fn field_at<S: AsRef<str>>(&self, path: &[S]) -> Option<&Field> {
        let (head, rest) = path.split_first()?;
        match (self.nodes.get(head.as_ref())?, rest) {
            (FieldNode::Field(field), []) => Some(field),
            (FieldNode::Group(bag), rest) if !rest.is_empty() => bag.field_at(rest),
            (FieldNode::List(items), [index, rest @ ..]) if !rest.is_empty() => {
                items.get(index.as_ref().parse::<usize>().ok()?)?.field_at(rest)
            }
            _ => None,
        }
    }

    /// Resolves a path to a field, mutably.
    pub fn field_at_mut<S: AsRef<str>>(&mut self, path: &[S]) -> Option<&mut Field> {
        let (head, rest) = path.split_first()?;
        match (self.nodes.get_mut(head.as_ref())?, rest) {
            (FieldNode::Field(field), []) => Some(field),
            (FieldNode::Group(bag), rest) if !rest.is_empty() => bag.field_at_mut(rest),
            (FieldNode::List(items), [index, rest @ ..]) if !rest.is_empty() => {
                items.get_mut(index.as_ref().parse::<usize>().ok()?)?.field_at_mut(rest)
            }
            _ => None,
        }
    }

    /// Iterates over the top-level nodes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldNode)> {
        self.nodes.iter()
    }

    /// Number of top-level nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the bag has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The plain values of the whole tree.
    pub fn values(&self) -> Map<String, Value> {
        self.nodes
            .iter()
            .map(|(name, node)| (name.clone(), node.value()))
            .collect()
    }

    /// Changes a top-level field, validating against its siblings when the
    /// field's trigger asks for it.
    pub fn change(&mut self, name: &str, value: impl Into<Value>) -> ReformResult<()> {
        let siblings = self.values();
        let field = self
            .field_mut(name)
            .ok_or_else(|| ReformError::UnknownField(name.to_string()))?;
        field.on_change_with(value, &ValidationContext::with_siblings(&siblings));
        Ok(())
    }

    /// Blurs a top-level field, validating against its siblings.
    pub fn blur(&mut self, name: &str) -> ReformResult<()> {
        let siblings = self.values();
        let field = self
            .field_mut(name)
            .ok_or_else(|| ReformError::UnknownField(name.to_string()))?;
        field.on_blur_with(&ValidationContext::with_siblings(&siblings));
        Ok(())
    }

    /// Validates every field in the tree, storing each field's error.
    ///
    /// Returns one [`FormError`] per failing field, with its path.
    pub fn validate_all(&mut self) -> Vec<FormError> {
        let mut errors = Vec::new();
        self.validate_into(&mut Vec::new(), &mut errors);
        errors
    }

    fn validate_into(&mut self, path: &mut Vec<String>, errors: &mut Vec<FormError>) {
        let siblings = self.values();
        for (name, node) in &mut self.nodes {
            path.push(name.clone());
            match node {
                FieldNode::Field(field) => {
                    if let Some(message) =
                        field.validate_with(&ValidationContext::with_siblings(&siblings))
                    {
                        errors.push(FormError::for_field(path.iter().cloned(), message));
                    }
                }
                FieldNode::Group(bag) => bag.validate_into(path, errors),
                FieldNode::List(items) => {
                    for (index, item) in items.iter_mut().enumerate() {
                        path.push(index.to_string());
                        item.validate_into(path, errors);
                        path.pop();
                    }
                }
            }
            path.pop();
        }
    }

    /// Writes the message of every error that names a field into that field.
    ///
    /// Errors without a path, or with a path that does not resolve, are
    /// left to the form-level error list.
    pub fn propagate_errors(&mut self, errors: &[FormError]) {
        for error in errors {
            if let Some(field) = error.field.as_deref().and_then(|p| self.field_at_mut(p)) {
                field.set_error(Some(error.message.clone()));
            }
        }
    }

    /// Resets every field in the tree.
    pub fn reset(&mut self) {
        self.nodes.values_mut().for_each(FieldNode::reset);
    }

    /// Rebases every field in the tree to its current value.
    pub fn make_clean(&mut self) {
        self.nodes.values_mut().for_each(FieldNode::make_clean);
    }
}
