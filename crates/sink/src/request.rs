// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Batch request and response model

/// An ordered group of write items submitted together
pub trait BulkRequest: Send + Sync {
    type Item: Send + Sync;

    fn items(&self) -> &[Self::Item];

    fn push(&mut self, item: Self::Item);

    fn into_items(self) -> Vec<Self::Item>;

    fn len(&self) -> usize {
        self.items().len()
    }

    fn is_empty(&self) -> bool {
        self.items().is_empty()
    }
}

/// Plain vector-backed request for sinks without per-request settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest<I> {
    items: Vec<I>,
}

impl<I> BatchRequest<I> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }
}

impl<I> Default for BatchRequest<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> From<Vec<I>> for BatchRequest<I> {
    fn from(items: Vec<I>) -> Self {
        Self { items }
    }
}

impl<I> FromIterator<I> for BatchRequest<I> {
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<I: Send + Sync> BulkRequest for BatchRequest<I> {
    type Item = I;

    fn items(&self) -> &[I] {
        &self.items
    }

    fn push(&mut self, item: I) {
        self.items.push(item);
    }

    fn into_items(self) -> Vec<I> {
        self.items
    }
}

/// Outcome of one item within a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemResponse<F> {
    Success,
    Failure(F),
}

impl<F> ItemResponse<F> {
    pub fn is_success(&self) -> bool {
        matches!(self, ItemResponse::Success)
    }
}

/// Per-item outcomes, positionally aligned with the submitted request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResponse<F> {
    items: Vec<ItemResponse<F>>,
}

impl<F> BatchResponse<F> {
    pub fn new(items: Vec<ItemResponse<F>>) -> Self {
        Self { items }
    }

    /// A response reporting success for `len` items
    pub fn all_success(len: usize) -> Self {
        Self {
            items: (0..len).map(|_| ItemResponse::Success).collect(),
        }
    }

    pub fn items(&self) -> &[ItemResponse<F>] {
        &self.items
    }

    pub fn into_items(self) -> Vec<ItemResponse<F>> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Count of items that did not succeed
    pub fn failure_count(&self) -> usize {
        self.items.iter().filter(|item| !item.is_success()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failure_count() > 0
    }
}

impl<F> FromIterator<ItemResponse<F>> for BatchResponse<F> {
    fn from_iter<T: IntoIterator<Item = ItemResponse<F>>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
