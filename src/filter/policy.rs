use serde::Serialize;

use super::error::PolicyError;
use super::types::{FilterKey, FilterState, ViewKind};
use crate::types::{Role, UserScope};

/// Outcome of checking whether a role may open a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "access", content = "view")]
pub enum Access {
    Allow,
    Redirect(ViewKind),
}

/// Every role lands on its own cells when it has nowhere better to go.
pub fn default_view(_role: Role) -> ViewKind {
    ViewKind::Cells
}

pub fn can_view(role: Role, view: ViewKind) -> bool {
    match view {
        ViewKind::Churches => role.is_admin_tier(),
        ViewKind::Fellowships => role.is_admin_tier() || role == Role::ChurchPastor,
        ViewKind::Cells | ViewKind::Workers => true,
    }
}

pub fn authorize(role: Role, view: ViewKind) -> Access {
    if can_view(role, view) {
        Access::Allow
    } else {
        Access::Redirect(default_view(role))
    }
}

pub fn is_forced(role: Role, key: FilterKey) -> bool {
    role.forced_keys().contains(&key)
}

/// Filter keys the role may edit on a view, in view order.
pub fn visible_filters(role: Role, view: ViewKind) -> Vec<FilterKey> {
    view.keys()
        .iter()
        .copied()
        .filter(|k| !is_forced(role, *k))
        .collect()
}

/// Pin every forced key the view carries to the user's own scope,
/// overriding whatever was requested.
pub fn effective_filters(
    role: Role,
    scope: &UserScope,
    requested: &FilterState,
) -> Result<FilterState, PolicyError> {
    let mut effective = requested.clone();
    for key in role.forced_keys() {
        if !requested.view().accepts(*key) {
            continue;
        }
        let own = scope
            .id_for(*key)
            .ok_or(PolicyError::MissingScope { role, key: *key })?;
        if let Some(asked) = requested.get(*key) {
            if asked != own {
                tracing::warn!(%role, key = %key, requested = asked, "overriding out-of-scope filter");
            }
        }
        effective.set(*key, Some(own.to_string()));
    }
    Ok(effective)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> UserScope {
        UserScope {
            church: Some("1".into()),
            fellowship: Some("12".into()),
            cell: Some("120".into()),
        }
    }

    #[test]
    fn cell_leader_is_pinned_to_own_ids() {
        let out = effective_filters(Role::CellLeader, &scope(), &FilterState::new(ViewKind::Workers))
            .unwrap();
        assert_eq!(out.get(FilterKey::Church), Some("1"));
        assert_eq!(out.get(FilterKey::Fellowship), Some("12"));
        assert_eq!(out.get(FilterKey::Cell), Some("120"));
    }

    #[test]
    fn cell_leader_conflicting_ids_are_replaced() {
        let asked = FilterState::new(ViewKind::Workers)
            .with(FilterKey::Church, "9")
            .with(FilterKey::Fellowship, "99")
            .with(FilterKey::Cell, "999")
            .with(FilterKey::Gender, "female");
        let out = effective_filters(Role::CellLeader, &scope(), &asked).unwrap();
        assert_eq!(out.get(FilterKey::Church), Some("1"));
        assert_eq!(out.get(FilterKey::Fellowship), Some("12"));
        assert_eq!(out.get(FilterKey::Cell), Some("120"));
        assert_eq!(out.get(FilterKey::Gender), Some("female"));
    }

    #[test]
    fn conflicting_request_is_overridden() {
        let asked = FilterState::new(ViewKind::Cells)
            .with(FilterKey::Church, "99")
            .with(FilterKey::Name, "Kob")
            .with_page(3);
        let out = effective_filters(Role::FellowshipLeader, &scope(), &asked).unwrap();
        assert_eq!(out.get(FilterKey::Church), Some("1"));
        assert_eq!(out.get(FilterKey::Fellowship), Some("12"));
        assert_eq!(out.get(FilterKey::Name), Some("Kob"));
        assert_eq!(out.page(), 3);
    }

    #[test]
    fn admin_filters_pass_through() {
        let asked = FilterState::new(ViewKind::Workers).with(FilterKey::Church, "7");
        let out = effective_filters(Role::Admin, &UserScope::default(), &asked).unwrap();
        assert_eq!(out, asked);
    }

    #[test]
    fn church_pastor_only_church_is_forced() {
        let asked = FilterState::new(ViewKind::Cells).with(FilterKey::Fellowship, "44");
        let out = effective_filters(Role::ChurchPastor, &scope(), &asked).unwrap();
        assert_eq!(out.get(FilterKey::Church), Some("1"));
        assert_eq!(out.get(FilterKey::Fellowship), Some("44"));
        assert_eq!(
            visible_filters(Role::ChurchPastor, ViewKind::Cells),
            vec![FilterKey::Name, FilterKey::Fellowship]
        );
    }

    #[test]
    fn missing_scope_is_an_error() {
        let partial = UserScope {
            church: Some("1".into()),
            ..Default::default()
        };
        let err = effective_filters(Role::FellowshipLeader, &partial, &FilterState::new(ViewKind::Cells))
            .unwrap_err();
        assert_eq!(
            err,
            PolicyError::MissingScope { role: Role::FellowshipLeader, key: FilterKey::Fellowship }
        );
    }

    #[test]
    fn keys_outside_view_are_not_forced() {
        let out = effective_filters(Role::CellLeader, &scope(), &FilterState::new(ViewKind::Churches))
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn narrow_roles_are_redirected_from_wide_views() {
        assert_eq!(authorize(Role::FellowshipLeader, ViewKind::Fellowships), Access::Redirect(ViewKind::Cells));
        assert_eq!(authorize(Role::ChurchPastor, ViewKind::Fellowships), Access::Allow);
        assert_eq!(authorize(Role::ChurchPastor, ViewKind::Churches), Access::Redirect(ViewKind::Cells));
        assert_eq!(authorize(Role::Pastor, ViewKind::Churches), Access::Allow);
        assert_eq!(authorize(Role::Other, ViewKind::Cells), Access::Allow);
    }
}
