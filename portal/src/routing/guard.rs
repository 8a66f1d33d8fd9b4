use serde::Serialize;

use shared::types::{Identity, Role};

use crate::routing::menu::portal;

pub const SIGN_IN_ROUTE: &str = "/signin";
pub const LANDING_ROUTE: &str = "/";

/// Outcome of a navigation check. Never an error: every input maps to one of
/// these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "role", rename_all = "snake_case")]
pub enum RouteDecision {
    Allow,
    RedirectToSignIn,
    /// Authenticated with the wrong role; send them back to their own portal.
    RedirectToRoleHome(Role),
}

impl RouteDecision {
    /// Where the navigation ends up, or `None` when it is allowed through.
    pub fn redirect_target(&self) -> Option<&'static str> {
        match self {
            RouteDecision::Allow => None,
            RouteDecision::RedirectToSignIn => Some(SIGN_IN_ROUTE),
            RouteDecision::RedirectToRoleHome(role) => Some(role_home(*role)),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, RouteDecision::Allow)
    }
}

/// Fixed landing route per role.
pub fn role_home(role: Role) -> &'static str {
    portal(role).home
}

/// Landing route for a role name as it appears on the wire. Names outside
/// the three portals land on the public page.
pub fn home_for_role_name(name: &str) -> &'static str {
    name.parse::<Role>().map(role_home).unwrap_or(LANDING_ROUTE)
}

/// Decide whether `identity` may open a view guarded by `required`.
///
/// An empty `required` set admits any authenticated identity.
pub fn authorize_route(required: &[Role], identity: Option<&Identity>) -> RouteDecision {
    let Some(identity) = identity else {
        return RouteDecision::RedirectToSignIn;
    };

    if required.is_empty() || required.contains(&identity.role) {
        RouteDecision::Allow
    } else {
        RouteDecision::RedirectToRoleHome(identity.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::types::ProfileAttributes;

    fn identity(role: Role) -> Identity {
        Identity {
            id: 1,
            name: "Test".into(),
            email: "t@example.com".into(),
            role,
            profile: ProfileAttributes::default(),
        }
    }

    #[test]
    fn no_identity_goes_to_sign_in() {
        assert_eq!(authorize_route(&[], None), RouteDecision::RedirectToSignIn);
        assert_eq!(
            authorize_route(&[Role::Admin], None),
            RouteDecision::RedirectToSignIn
        );
    }

    #[test]
    fn empty_requirement_admits_everyone_signed_in() {
        for role in Role::ALL {
            assert!(authorize_route(&[], Some(&identity(role))).is_allowed());
        }
    }

    #[test]
    fn wrong_role_goes_home() {
        let doc = identity(Role::Doctor);
        let decision = authorize_route(&[Role::Patient], Some(&doc));
        assert_eq!(decision, RouteDecision::RedirectToRoleHome(Role::Doctor));
        assert_eq!(decision.redirect_target(), Some("/doctor/dashboard"));
    }

    #[test]
    fn multi_role_requirement() {
        let required = [Role::Admin, Role::Doctor];
        assert!(authorize_route(&required, Some(&identity(Role::Admin))).is_allowed());
        assert!(authorize_route(&required, Some(&identity(Role::Doctor))).is_allowed());
        assert!(!authorize_route(&required, Some(&identity(Role::Patient))).is_allowed());
    }

    #[test]
    fn unknown_role_name_lands_on_public_page() {
        assert_eq!(home_for_role_name("admin"), "/admin/dashboard");
        assert_eq!(home_for_role_name("nurse"), LANDING_ROUTE);
    }
}
