use super::types::{CascadeRule, FilterKey, FilterPatch, FilterState};

/// Expand `patch` with the clears implied by the view's cascade rules.
///
/// A child is always cleared when its parent is cleared, even if the patch
/// sets the child. When the parent moves to a different concrete value the
/// child is cleared too, unless the patch sets that child itself. Clears
/// propagate down the whole chain (church -> fellowship -> cell).
pub fn resolve(previous: &FilterState, patch: &FilterPatch, rules: &[CascadeRule]) -> FilterPatch {
    let mut effective = patch.clone();
    // (key, cleared): cleared parents override explicit children, changed ones don't
    let mut invalidated: Vec<(FilterKey, bool)> = patch
        .iter()
        .filter_map(|(key, value)| match value {
            None => Some((key, true)),
            Some(v) if previous.get(key).is_some_and(|old| old != v) => Some((key, false)),
            Some(_) => None,
        })
        .collect();

    while let Some((parent, cleared)) = invalidated.pop() {
        for rule in rules.iter().filter(|r| r.parent == parent) {
            if effective.clears(rule.child) {
                continue;
            }
            if !cleared && effective.contains(rule.child) {
                continue;
            }
            tracing::debug!(child = %rule.child, parent = %parent, "cascading filter clear");
            effective.insert(rule.child, None);
            invalidated.push((rule.child, true));
        }
    }
    effective
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::types::ViewKind;

    fn workers(pairs: &[(FilterKey, &str)]) -> FilterState {
        pairs
            .iter()
            .fold(FilterState::new(ViewKind::Workers), |s, (k, v)| s.with(*k, *v))
    }

    #[test]
    fn clearing_parent_clears_child() {
        let prev = FilterState::new(ViewKind::Cells)
            .with(FilterKey::Church, "3")
            .with(FilterKey::Fellowship, "8");
        let patch = FilterPatch::new().clear(FilterKey::Church);
        let out = resolve(&prev, &patch, ViewKind::Cells.cascade_rules());
        assert!(out.clears(FilterKey::Fellowship));
    }

    #[test]
    fn clears_child_even_when_absent_from_state() {
        let prev = FilterState::new(ViewKind::Cells);
        let patch = FilterPatch::new().clear(FilterKey::Church);
        let out = resolve(&prev, &patch, ViewKind::Cells.cascade_rules());
        assert!(out.clears(FilterKey::Fellowship));
    }

    #[test]
    fn clearing_church_reaches_cell() {
        let prev = workers(&[
            (FilterKey::Church, "1"),
            (FilterKey::Fellowship, "2"),
            (FilterKey::Cell, "3"),
        ]);
        let out = resolve(
            &prev,
            &FilterPatch::new().clear(FilterKey::Church),
            ViewKind::Workers.cascade_rules(),
        );
        assert!(out.clears(FilterKey::Fellowship));
        assert!(out.clears(FilterKey::Cell));
    }

    #[test]
    fn changing_parent_value_clears_stale_children() {
        let prev = workers(&[(FilterKey::Fellowship, "2"), (FilterKey::Cell, "3")]);
        let out = resolve(
            &prev,
            &FilterPatch::new().set(FilterKey::Fellowship, "5"),
            ViewKind::Workers.cascade_rules(),
        );
        assert_eq!(out.get(FilterKey::Fellowship), Some(Some("5")));
        assert!(out.clears(FilterKey::Cell));
    }

    #[test]
    fn reselecting_same_parent_keeps_children() {
        let prev = workers(&[(FilterKey::Fellowship, "2"), (FilterKey::Cell, "3")]);
        let out = resolve(
            &prev,
            &FilterPatch::new().set(FilterKey::Fellowship, "2"),
            ViewKind::Workers.cascade_rules(),
        );
        assert!(!out.contains(FilterKey::Cell));
    }

    #[test]
    fn first_parent_selection_keeps_children() {
        let prev = workers(&[(FilterKey::Cell, "3")]);
        let out = resolve(
            &prev,
            &FilterPatch::new().set(FilterKey::Fellowship, "2"),
            ViewKind::Workers.cascade_rules(),
        );
        assert!(!out.contains(FilterKey::Cell));
    }

    #[test]
    fn explicit_child_in_patch_wins() {
        let prev = workers(&[(FilterKey::Church, "1"), (FilterKey::Fellowship, "2")]);
        let patch = FilterPatch::new()
            .set(FilterKey::Church, "4")
            .set(FilterKey::Fellowship, "9");
        let out = resolve(&prev, &patch, ViewKind::Workers.cascade_rules());
        assert_eq!(out.get(FilterKey::Fellowship), Some(Some("9")));
        // fellowship itself moved, so any cell under the old one goes too
        assert!(out.clears(FilterKey::Cell));
    }

    #[test]
    fn cleared_parent_overrides_explicit_child() {
        let prev = FilterState::new(ViewKind::Cells)
            .with(FilterKey::Church, "3")
            .with(FilterKey::Fellowship, "8");
        let patch = FilterPatch::new()
            .clear(FilterKey::Church)
            .set(FilterKey::Fellowship, "9");
        let out = resolve(&prev, &patch, ViewKind::Cells.cascade_rules());
        assert!(out.clears(FilterKey::Fellowship));
    }

    #[test]
    fn cleared_church_overrides_explicit_fellowship_and_cell() {
        let prev = workers(&[
            (FilterKey::Church, "1"),
            (FilterKey::Fellowship, "2"),
            (FilterKey::Cell, "3"),
        ]);
        let patch = FilterPatch::new()
            .clear(FilterKey::Church)
            .set(FilterKey::Fellowship, "5")
            .set(FilterKey::Cell, "6");
        let out = resolve(&prev, &patch, ViewKind::Workers.cascade_rules());
        assert!(out.clears(FilterKey::Fellowship));
        assert!(out.clears(FilterKey::Cell));
    }

    #[test]
    fn views_without_rules_pass_patch_through() {
        let prev = FilterState::new(ViewKind::Fellowships).with(FilterKey::Church, "1");
        let patch = FilterPatch::new().clear(FilterKey::Church);
        assert_eq!(resolve(&prev, &patch, ViewKind::Fellowships.cascade_rules()), patch);
    }
}
