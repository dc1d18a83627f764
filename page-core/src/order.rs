//! Component ordering.
//!
//! `order_index` must be unique after any edit. Documents that arrive with
//! duplicates or gaps are re-sequenced instead of rejected.

use pagecraft_types::ComponentInstance;

/// What [`normalize_order`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderReport {
    /// The list was not sorted by `order_index`.
    pub resorted: bool,
    /// Number of components whose `order_index` was rewritten.
    pub resequenced: usize,
}

impl OrderReport {
    /// Whether anything changed.
    pub fn changed(&self) -> bool {
        self.resorted || self.resequenced > 0
    }
}

/// Sort components by `order_index` (stable, so ties keep list order) and,
/// if the indices are not consecutive, rewrite them to `first..first+n`.
pub fn normalize_order(components: &mut [ComponentInstance]) -> OrderReport {
    let mut report = OrderReport::default();
    if components
        .windows(2)
        .any(|w| w[0].order_index > w[1].order_index)
    {
        components.sort_by_key(|c| c.order_index);
        report.resorted = true;
    }

    let Some(first) = components.first().map(|c| c.order_index) else {
        return report;
    };
    for (offset, component) in components.iter_mut().enumerate() {
        let expected = first + offset as i64;
        if component.order_index != expected {
            component.order_index = expected;
            report.resequenced += 1;
        }
    }
    report
}

/// Move the component at list position `from` to position `to`.
///
/// The document keeps its set of `order_index` values; identities are
/// permuted across them. Out-of-range positions leave the list untouched and
/// return `false`.
pub fn move_component(components: &mut Vec<ComponentInstance>, from: usize, to: usize) -> bool {
    if from >= components.len() || to >= components.len() {
        return false;
    }
    normalize_order(components);
    if from == to {
        return true;
    }
    let slots: Vec<i64> = components.iter().map(|c| c.order_index).collect();
    let moved = components.remove(from);
    components.insert(to, moved);
    for (component, slot) in components.iter_mut().zip(slots) {
        component.order_index = slot;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_types::{ComponentId, VariationRef};

    fn list(orders: &[(&str, i64)]) -> Vec<ComponentInstance> {
        orders
            .iter()
            .map(|(id, order)| {
                ComponentInstance::new(
                    ComponentId::parse(id).unwrap(),
                    VariationRef::new("cta", 1),
                    *order,
                )
            })
            .collect()
    }

    fn ids(components: &[ComponentInstance]) -> Vec<&str> {
        components.iter().map(|c| c.id.as_str()).collect()
    }

    fn orders(components: &[ComponentInstance]) -> Vec<i64> {
        components.iter().map(|c| c.order_index).collect()
    }

    // ===========================================
    // Normalize Tests
    // ===========================================

    #[test]
    fn consecutive_order_is_untouched() {
        let mut components = list(&[("a", 1), ("b", 2), ("c", 3)]);
        let report = normalize_order(&mut components);
        assert!(!report.changed());
        assert_eq!(orders(&components), vec![1, 2, 3]);
    }

    #[test]
    fn duplicates_are_resequenced_stably() {
        let mut components = list(&[("a", 2), ("b", 1), ("c", 2), ("d", 2)]);
        let report = normalize_order(&mut components);
        assert!(report.resorted);
        assert_eq!(ids(&components), vec!["b", "a", "c", "d"]);
        assert_eq!(orders(&components), vec![1, 2, 3, 4]);
        assert_eq!(report.resequenced, 2);
    }

    #[test]
    fn gaps_are_closed() {
        let mut components = list(&[("a", 0), ("b", 5), ("c", 9)]);
        normalize_order(&mut components);
        assert_eq!(orders(&components), vec![0, 1, 2]);
    }

    #[test]
    fn empty_list() {
        let mut components = Vec::new();
        assert!(!normalize_order(&mut components).changed());
    }

    // ===========================================
    // Move Tests
    // ===========================================

    #[test]
    fn swap_keeps_order_slots() {
        let mut components = list(&[("a", 1), ("b", 2), ("c", 3)]);
        assert!(move_component(&mut components, 1, 2));
        assert_eq!(ids(&components), vec!["a", "c", "b"]);
        assert_eq!(orders(&components), vec![1, 2, 3]);
    }

    #[test]
    fn move_to_front() {
        let mut components = list(&[("a", 1), ("b", 2), ("c", 3)]);
        move_component(&mut components, 2, 0);
        assert_eq!(ids(&components), vec!["c", "a", "b"]);
        assert_eq!(orders(&components), vec![1, 2, 3]);
    }

    #[test]
    fn out_of_range_is_rejected() {
        let mut components = list(&[("a", 1)]);
        assert!(!move_component(&mut components, 0, 3));
        assert!(!move_component(&mut components, 5, 0));
        assert_eq!(ids(&components), vec!["a"]);
    }
}
