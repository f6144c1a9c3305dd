//! Fractional sort keys for drag-and-drop reordering.
//!
//! Moving a task only rewrites the moved task's key: the new key is the
//! midpoint between the drop target and its neighbour on the side the task is
//! moving towards. Repeated drops into the same gap halve it every time, so
//! once a new key gets within [MIN_KEY_GAP] of another key the list should be
//! renumbered with [renumber_sort_keys] and the key allocated again.

use std::cmp::Ordering;

/// The distance used in place of a missing neighbour when dropping onto the
/// first or last item.
pub const EDGE_OFFSET: f64 = 1000.0;

/// The spacing between keys after renumbering a list.
pub const RENUMBER_STEP: f64 = 1000.0;

/// Keys closer than this are treated as colliding.
pub const MIN_KEY_GAP: f64 = 1e-9;

/// An item that has a position in an ordered list.
pub trait SortKeyed {
    /// The type used to identify items in the list.
    type Id: PartialEq;

    /// The identifier of the item.
    fn id(&self) -> &Self::Id;

    /// The position of the item, lower keys come first.
    fn sort_key(&self) -> f64;
}

/// Compute a new sort key for `moved_id` so that it lands next to `target_id`.
///
/// The direction of the move is taken from the positions of the two items in
/// `items` sorted by key. Moving down places the item right after the target,
/// moving up places it right before the target.
///
/// Returns `None` if either ID is missing from `items` or if both IDs are the
/// same item. Nothing should be written in that case.
pub fn allocate_sort_key<T: SortKeyed>(
    items: &[T],
    moved_id: &T::Id,
    target_id: &T::Id,
) -> Option<f64> {
    if moved_id == target_id {
        return None;
    }

    let sorted = sorted_by_key(items);
    let moved_index = sorted.iter().position(|item| item.id() == moved_id)?;
    let target_index = sorted.iter().position(|item| item.id() == target_id)?;
    let target_key = sorted[target_index].sort_key();

    let new_key = if moved_index < target_index {
        let next_key = sorted
            .get(target_index + 1)
            .map(|item| item.sort_key())
            .unwrap_or(target_key + EDGE_OFFSET);

        midpoint(target_key, next_key)
    } else {
        let previous_key = target_index
            .checked_sub(1)
            .map(|index| sorted[index].sort_key())
            .unwrap_or(target_key - EDGE_OFFSET);

        midpoint(previous_key, target_key)
    };

    Some(new_key)
}

/// Whether assigning `new_key` to `moved_id` would put it on top of another
/// item's key, i.e. the gap it was placed in has run out of precision.
pub fn key_collides<T: SortKeyed>(items: &[T], moved_id: &T::Id, new_key: f64) -> bool {
    items
        .iter()
        .filter(|item| item.id() != moved_id)
        .any(|item| (item.sort_key() - new_key).abs() < MIN_KEY_GAP)
}

/// Assign evenly spaced keys to `items` in their current order.
///
/// Keys start at [RENUMBER_STEP] and increase by [RENUMBER_STEP]. Items with
/// equal keys keep their relative order in `items`.
pub fn renumber_sort_keys<T>(items: &[T]) -> Vec<(T::Id, f64)>
where
    T: SortKeyed,
    T::Id: Clone,
{
    sorted_by_key(items)
        .into_iter()
        .enumerate()
        .map(|(index, item)| (item.id().clone(), (index + 1) as f64 * RENUMBER_STEP))
        .collect()
}

/// The key for a new item appended to the end of `items`.
pub fn next_sort_key<T: SortKeyed>(items: &[T]) -> f64 {
    items
        .iter()
        .map(|item| item.sort_key())
        .max_by(f64::total_cmp)
        .unwrap_or(0.0)
        + 1.0
}

fn sorted_by_key<T: SortKeyed>(items: &[T]) -> Vec<&T> {
    let mut sorted: Vec<&T> = items.iter().collect();
    // `sort_by` is stable, so ties keep the caller's order.
    sorted.sort_by(|a, b| compare_keys(a.sort_key(), b.sort_key()));
    sorted
}

fn compare_keys(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

fn midpoint(low: f64, high: f64) -> f64 {
    low + (high - low) / 2.0
}

#[cfg(test)]
mod tests {
    use super::{
        EDGE_OFFSET, SortKeyed, allocate_sort_key, key_collides, next_sort_key,
        renumber_sort_keys,
    };

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: &'static str,
        key: f64,
    }

    impl SortKeyed for Item {
        type Id = &'static str;

        fn id(&self) -> &Self::Id {
            &self.id
        }

        fn sort_key(&self) -> f64 {
            self.key
        }
    }

    fn items(keys: &[(&'static str, f64)]) -> Vec<Item> {
        keys.iter().map(|&(id, key)| Item { id, key }).collect()
    }

    /// Apply `new_key` to `moved` and return the IDs in key order.
    fn reorder(list: &[Item], moved: &'static str, new_key: f64) -> Vec<&'static str> {
        let mut list = list.to_vec();
        list.iter_mut()
            .filter(|item| item.id == moved)
            .for_each(|item| item.key = new_key);
        list.sort_by(|a, b| a.key.total_cmp(&b.key));
        list.into_iter().map(|item| item.id).collect()
    }

    #[test]
    fn moving_onto_last_item_uses_edge_offset() {
        let list = items(&[("A", 1.0), ("B", 2.0), ("C", 3.0)]);

        let key = allocate_sort_key(&list, &"A", &"C");

        assert_eq!(key, Some(503.0));
    }

    #[test]
    fn moving_down_places_item_after_target() {
        let list = items(&[("A", 1.0), ("B", 2.0), ("C", 3.0), ("D", 4.0)]);

        let key = allocate_sort_key(&list, &"A", &"B").unwrap();

        assert_eq!(key, 2.5);
        assert_eq!(reorder(&list, "A", key), vec!["B", "A", "C", "D"]);
    }

    #[test]
    fn moving_up_places_item_before_target() {
        let list = items(&[("A", 1.0), ("B", 2.0), ("C", 3.0), ("D", 4.0)]);

        let key = allocate_sort_key(&list, &"D", &"B").unwrap();

        assert_eq!(key, 1.5);
        assert_eq!(reorder(&list, "D", key), vec!["A", "D", "B", "C"]);
    }

    #[test]
    fn moving_onto_first_item_goes_below_first_key() {
        let list = items(&[("A", 1.0), ("B", 2.0), ("C", 3.0)]);

        let key = allocate_sort_key(&list, &"C", &"A").unwrap();

        assert_eq!(key, 1.0 - EDGE_OFFSET / 2.0);
        assert!(key < 1.0);
        assert_eq!(reorder(&list, "C", key), vec!["C", "A", "B"]);
    }

    #[test]
    fn moving_onto_last_item_goes_above_last_key() {
        let list = items(&[("A", 1.0), ("B", 2.0), ("C", 3.0)]);

        let key = allocate_sort_key(&list, &"B", &"C").unwrap();

        assert!(key > 3.0);
        assert_eq!(reorder(&list, "B", key), vec!["A", "C", "B"]);
    }

    #[test]
    fn direction_uses_key_order_not_slice_order() {
        // The slice is not sorted, C has the smallest key.
        let list = items(&[("A", 2.0), ("B", 3.0), ("C", 1.0)]);

        let key = allocate_sort_key(&list, &"C", &"A").unwrap();

        assert_eq!(key, 2.5);
        assert_eq!(reorder(&list, "C", key), vec!["A", "C", "B"]);
    }

    #[test]
    fn missing_moved_item_gives_no_key() {
        let list = items(&[("A", 1.0), ("B", 2.0)]);

        assert_eq!(allocate_sort_key(&list, &"Z", &"B"), None);
    }

    #[test]
    fn missing_target_item_gives_no_key() {
        let list = items(&[("A", 1.0), ("B", 2.0)]);

        assert_eq!(allocate_sort_key(&list, &"A", &"Z"), None);
    }

    #[test]
    fn dropping_onto_itself_gives_no_key() {
        let list = items(&[("A", 1.0), ("B", 2.0)]);

        assert_eq!(allocate_sort_key(&list, &"A", &"A"), None);
    }

    #[test]
    fn empty_list_gives_no_key() {
        let list: Vec<Item> = Vec::new();

        assert_eq!(allocate_sort_key(&list, &"A", &"B"), None);
    }

    #[test]
    fn tied_keys_do_not_panic() {
        let list = items(&[("A", 1.0), ("B", 1.0), ("C", 1.0)]);

        let key = allocate_sort_key(&list, &"A", &"C");

        assert_eq!(key, Some(501.0));
    }

    #[test]
    fn every_move_preserves_intended_placement() {
        let ids = ["A", "B", "C", "D", "E"];
        let list = items(&[("A", 1.0), ("B", 2.0), ("C", 3.0), ("D", 4.0), ("E", 5.0)]);

        for (moved_index, moved) in ids.iter().enumerate() {
            for (target_index, target) in ids.iter().enumerate() {
                if moved == target {
                    continue;
                }

                let key = allocate_sort_key(&list, moved, target).unwrap();
                let order = reorder(&list, moved, key);
                let moved_position = order.iter().position(|id| id == moved).unwrap();
                let target_position = order.iter().position(|id| id == target).unwrap();

                if moved_index < target_index {
                    assert_eq!(moved_position, target_position + 1, "{moved} onto {target}");
                } else {
                    assert_eq!(moved_position + 1, target_position, "{moved} onto {target}");
                }
            }
        }
    }

    #[test]
    fn repeated_drops_into_same_gap_eventually_collide() {
        let mut list = items(&[("A", 1.0), ("B", 2.0), ("C", 3.0)]);
        let mut collided = false;

        // Keep dropping the first item onto the second, which halves the gap
        // below the last item every time.
        for _ in 0..200 {
            let mut sorted = list.clone();
            sorted.sort_by(|a, b| a.key.total_cmp(&b.key));
            let moved = sorted[0].id;
            let target = sorted[1].id;
            let key = allocate_sort_key(&list, &moved, &target).unwrap();

            if key_collides(&list, &moved, key) {
                collided = true;
                break;
            }

            list.iter_mut()
                .filter(|item| item.id == moved)
                .for_each(|item| item.key = key);
        }

        assert!(collided, "the gap should run out of precision");
    }

    #[test]
    fn key_does_not_collide_with_its_own_old_key() {
        let list = items(&[("A", 1.0), ("B", 2.0)]);

        assert!(!key_collides(&list, &"A", 1.0));
        assert!(key_collides(&list, &"A", 2.0));
    }

    #[test]
    fn renumbering_spaces_keys_in_current_order() {
        let list = items(&[("A", 3.0), ("B", 1.0), ("C", 1.0 + 1e-12)]);

        let renumbered = renumber_sort_keys(&list);

        assert_eq!(
            renumbered,
            vec![("B", 1000.0), ("C", 2000.0), ("A", 3000.0)]
        );
    }

    #[test]
    fn next_key_is_one_past_largest() {
        let list = items(&[("A", 4.0), ("B", -2.0), ("C", 7.5)]);

        assert_eq!(next_sort_key(&list), 8.5);
        assert_eq!(next_sort_key::<Item>(&[]), 1.0);
    }
}
