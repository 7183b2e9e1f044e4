//! Cart and wishlist lists kept in client-local storage.
//!
//! Both lists are JSON arrays of [`Pattern`] records stored under fixed keys
//! in a [`KeyValueStore`]. Nothing here talks to the server.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

mod pattern;
mod store;

pub use pattern::{Pattern, PhotoSize};
pub use store::{FileStore, KeyValueStore, MemoryStore, Update};

pub const CART_KEY: &str = "cartItems";
pub const WISHLIST_KEY: &str = "wishlist";

#[derive(Debug, Error)]
pub enum ShelfError {
    #[error("shelf io: {0}")]
    Io(#[from] std::io::Error),
    #[error("shelf json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("shelf store lock poisoned")]
    Poisoned,
}

#[derive(Clone)]
pub struct Shelf {
    store: Arc<dyn KeyValueStore>,
}

fn parse_list(raw: Option<&str>) -> Result<Vec<Pattern>, ShelfError> {
    match raw.map(str::trim) {
        Some(text) if !text.is_empty() && text != "null" => Ok(serde_json::from_str(text)?),
        _ => Ok(Vec::new()),
    }
}

impl Shelf {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn read(&self, key: &str) -> Result<Vec<Pattern>, ShelfError> {
        parse_list(self.store.get(key)?.as_deref())
    }

    /// Runs `f` on the list under the store's lock. The list is written back
    /// only when `f` reports a change.
    fn modify<R, F>(&self, key: &str, f: F) -> Result<R, ShelfError>
    where
        R: Default,
        F: FnOnce(&mut Vec<Pattern>) -> (R, bool),
    {
        let mut out = None;
        self.store.update(
            key,
            Box::new(|raw: Option<String>| -> Result<Option<String>, ShelfError> {
                let mut items = parse_list(raw.as_deref())?;
                let (result, changed) = f(&mut items);
                out = Some(result);
                if changed {
                    Ok(Some(serde_json::to_string(&items)?))
                } else {
                    Ok(None)
                }
            }),
        )?;
        Ok(out.unwrap_or_default())
    }

    pub fn cart_items(&self) -> Result<Vec<Pattern>, ShelfError> {
        self.read(CART_KEY)
    }

    pub fn wishlist(&self) -> Result<Vec<Pattern>, ShelfError> {
        self.read(WISHLIST_KEY)
    }

    /// Appends to the cart; the same pattern may appear more than once.
    pub fn add_to_cart(&self, pattern: Pattern) -> Result<(), ShelfError> {
        debug!(pattern_id = pattern.id, "add to cart");
        self.modify(CART_KEY, |items| {
            items.push(pattern);
            ((), true)
        })
    }

    /// Removes one cart entry for `pattern_id`.
    pub fn remove_from_cart(&self, pattern_id: i64) -> Result<bool, ShelfError> {
        let removed = self.modify(CART_KEY, |items| {
            match items.iter().position(|p| p.id == pattern_id) {
                Some(pos) => {
                    items.remove(pos);
                    (true, true)
                }
                None => (false, false),
            }
        })?;
        if removed {
            debug!(pattern_id, "removed from cart");
        }
        Ok(removed)
    }

    pub fn is_wishlisted(&self, pattern_id: i64) -> Result<bool, ShelfError> {
        Ok(self.wishlist()?.iter().any(|p| p.id == pattern_id))
    }

    /// Adds the pattern if absent, otherwise drops every entry with its id.
    /// Returns whether the pattern is wishlisted afterwards.
    pub fn toggle_wishlist(&self, pattern: Pattern) -> Result<bool, ShelfError> {
        self.modify(WISHLIST_KEY, |items| {
            let listed = items.iter().any(|p| p.id == pattern.id);
            if listed {
                items.retain(|p| p.id != pattern.id);
            } else {
                items.push(pattern);
            }
            (!listed, true)
        })
    }
}
