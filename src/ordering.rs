//! Ordered collections: append position and one-step moves by `sort_order` swap.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::db::{Store, Table};
use crate::error::ApiError;

/// Collections displayed by `sort_order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderedCollection {
    Experience,
    Education,
    Skills,
    Projects,
}

impl OrderedCollection {
    pub fn table(self) -> Table {
        match self {
            OrderedCollection::Experience => Table::Experience,
            OrderedCollection::Education => Table::Education,
            OrderedCollection::Skills => Table::Skills,
            OrderedCollection::Projects => Table::Projects,
        }
    }

    /// SQL ordering used both for listing and for locating neighbours.
    pub fn order_by(self) -> &'static str {
        match self {
            OrderedCollection::Skills => "sort_order ASC, name ASC",
            _ => "sort_order ASC, created_at DESC",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderedCollection::Experience => "experience",
            OrderedCollection::Education => "education",
            OrderedCollection::Skills => "skill",
            OrderedCollection::Projects => "project",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl std::str::FromStr for Direction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct OrderSlot {
    pub id: Uuid,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    NotFound,
    OutOfBounds,
}

/// Position for a newly created row: one past the current maximum.
pub fn next_sort_order(max: Option<i32>) -> i32 {
    max.map_or(1, |m| m.saturating_add(1))
}

/// Computes the writes that move `id` one step in `direction`.
///
/// `slots` must be in display order. With all values distinct the two rows
/// swap values. Any duplicate forces a renumbering to `1..=n`: a swap could
/// leave the pair unchanged or tie the moved row with a third one, and the
/// tie-break would then decide where it lands. Only changed rows are returned.
pub fn plan_move(
    slots: &[OrderSlot],
    id: Uuid,
    direction: Direction,
) -> Result<Vec<OrderSlot>, MoveError> {
    let current = slots
        .iter()
        .position(|slot| slot.id == id)
        .ok_or(MoveError::NotFound)?;

    let target = match direction {
        Direction::Up => current.checked_sub(1),
        Direction::Down => Some(current + 1).filter(|&i| i < slots.len()),
    }
    .ok_or(MoveError::OutOfBounds)?;

    let (moving, neighbour) = (slots[current], slots[target]);

    let mut seen = HashSet::with_capacity(slots.len());
    let all_distinct = slots.iter().all(|slot| seen.insert(slot.sort_order));

    if all_distinct {
        return Ok(vec![
            OrderSlot {
                id: moving.id,
                sort_order: neighbour.sort_order,
            },
            OrderSlot {
                id: neighbour.id,
                sort_order: moving.sort_order,
            },
        ]);
    }

    let mut reordered = slots.to_vec();
    reordered.swap(current, target);

    Ok(reordered
        .iter()
        .zip(1..)
        .filter_map(|(slot, position)| {
            let original = slots.iter().find(|s| s.id == slot.id)?;
            (original.sort_order != position).then_some(OrderSlot {
                id: slot.id,
                sort_order: position,
            })
        })
        .collect())
}

/// Sort order for the next appended row in `collection`.
pub async fn append_position(
    store: &dyn Store,
    collection: OrderedCollection,
) -> Result<i32, ApiError> {
    let max = store
        .max_sort_order(collection)
        .await
        .map_err(ApiError::store("Failed to determine sort order"))?;
    Ok(next_sort_order(max))
}

/// Moves one row up or down within its collection.
pub async fn move_item(
    store: &dyn Store,
    collection: OrderedCollection,
    id: Uuid,
    direction: Direction,
) -> Result<(), ApiError> {
    let slots = store
        .order_slots(collection)
        .await
        .map_err(ApiError::store("Failed to fetch items"))?;

    let updates = plan_move(&slots, id, direction).map_err(|e| match e {
        MoveError::NotFound => ApiError::not_found("Item not found"),
        MoveError::OutOfBounds => ApiError::bad_request("Cannot move item in that direction"),
    })?;

    store
        .apply_sort_orders(collection, &updates)
        .await
        .map_err(ApiError::store("Failed to reorder items"))?;

    tracing::info!(
        collection = collection.label(),
        id = %id,
        direction = ?direction,
        writes = updates.len(),
        "reordered item"
    );
    Ok(())
}
