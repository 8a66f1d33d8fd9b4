use shared::types::{Identity, Role};
use tracing::debug;

use crate::routing::guard::{RouteDecision, authorize_route};
use crate::routing::menu::portal;

// ---------------------------------------------------------------------------
// RouteRule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    pub path: String,
    /// Empty means any authenticated identity.
    pub roles: Vec<Role>,
}

// ---------------------------------------------------------------------------
// RouteTable
// ---------------------------------------------------------------------------

/// Roles whose portal prefix (`/admin`, `/doctor`, `/patient`) is closed by
/// default.
static PORTAL_ROLES: [Role; 3] = Role::ALL;

/// Static path → required-roles mapping consulted on every navigation.
///
/// Paths are compared after [`normalize_path`]. A path that matches no rule
/// is public, unless it sits under a role's portal prefix, in which case it
/// belongs to that role.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Restrict `path` to exactly `roles`.
    pub fn protect(mut self, path: &str, roles: &[Role]) -> Self {
        self.rules.push(RouteRule {
            path: path.to_string(),
            roles: roles.to_vec(),
        });
        self
    }

    /// Require a signed-in identity of any role.
    pub fn authenticated(self, path: &str) -> Self {
        self.protect(path, &[])
    }

    /// Route table for the three portals: each menu entry and extra route is
    /// owned by its role, plus the shared profile page.
    pub fn portal_routes() -> Self {
        let mut table = Self::new();
        for role in Role::ALL {
            let owned = portal(role);
            for item in owned.menu {
                table = table.protect(item.path, &[role]);
            }
            for path in owned.extra_routes {
                table = table.protect(path, &[role]);
            }
        }
        table.authenticated("/profile")
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    /// Required roles for `path`, or `None` when the path is public.
    pub fn required_roles(&self, path: &str) -> Option<&[Role]> {
        let clean = normalize_path(path);
        self.rules
            .iter()
            .find(|rule| segments_match(&normalize_path(&rule.path), &clean))
            .map(|rule| rule.roles.as_slice())
            .or_else(|| portal_owner(&clean))
    }

    pub fn is_protected(&self, path: &str) -> bool {
        self.required_roles(path).is_some()
    }

    /// Authorize a navigation to `path`.
    pub fn authorize(&self, path: &str, identity: Option<&Identity>) -> RouteDecision {
        let decision = match self.required_roles(path) {
            Some(required) => authorize_route(required, identity),
            None => RouteDecision::Allow,
        };
        debug!("Route {} -> {:?}", path, decision);
        decision
    }

    // ── Path matching ─────────────────────────────────────────────────────────

    pub fn path_matches(route_path: &str, request_path: &str) -> bool {
        segments_match(&normalize_path(route_path), &normalize_path(request_path))
    }
}

/// Canonical form of a navigation path: query and fragment dropped, empty
/// segments collapsed, no trailing slash, ASCII lowercase. The root stays `/`.
pub fn normalize_path(path: &str) -> String {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let segments: Vec<String> = path[..end]
        .split('/')
        .filter(|seg| !seg.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();
    format!("/{}", segments.join("/"))
}

// Both sides already normalized.
fn segments_match(route_path: &str, request_path: &str) -> bool {
    if route_path == request_path {
        return true;
    }

    // Segment-by-segment matching for `:param` wildcards.
    // e.g.  "/admin/doctors/:id"  matches  "/admin/doctors/42"
    let route_segs: Vec<&str> = route_path.split('/').collect();
    let path_segs: Vec<&str> = request_path.split('/').collect();

    if route_segs.len() != path_segs.len() {
        return false;
    }

    route_segs
        .iter()
        .zip(path_segs.iter())
        .all(|(r, p)| (r.starts_with(':') && !p.is_empty()) || r == p)
}

fn portal_owner(clean: &str) -> Option<&'static [Role]> {
    let first = clean.trim_start_matches('/').split('/').next()?;
    PORTAL_ROLES
        .iter()
        .find(|role| role.as_str() == first)
        .map(std::slice::from_ref)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_and_param_matching() {
        assert!(RouteTable::path_matches("/admin/doctors", "/admin/doctors"));
        assert!(RouteTable::path_matches("/admin/doctors/:id", "/admin/doctors/42"));
        assert!(!RouteTable::path_matches("/admin/doctors/:id", "/admin/doctors/"));
        assert!(!RouteTable::path_matches("/admin/doctors/:id", "/admin/doctors"));
        assert!(RouteTable::path_matches(
            "/patient/my-bookings",
            "/patient/my-bookings?status=cancelled"
        ));
    }

    #[test]
    fn normalization_collapses_variants() {
        assert_eq!(normalize_path("/Admin//Dashboard/#x"), "/admin/dashboard");
        assert_eq!(normalize_path("/patient/billings?tab=1#top"), "/patient/billings");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("//"), "/");
    }

    #[test]
    fn altered_protected_paths_stay_protected() {
        let table = RouteTable::portal_routes();
        let patient = Identity {
            id: 3,
            name: "Patient".into(),
            email: "p@example.com".into(),
            role: Role::Patient,
            profile: Default::default(),
        };
        for path in [
            "/admin/dashboard/",
            "/admin//dashboard",
            "/admin/dashboard#x",
            "/Admin/Dashboard",
            "/ADMIN/doctors/42/",
        ] {
            assert_eq!(table.authorize(path, None), RouteDecision::RedirectToSignIn, "{}", path);
            assert_eq!(
                table.authorize(path, Some(&patient)),
                RouteDecision::RedirectToRoleHome(Role::Patient),
                "{}",
                path
            );
        }
    }

    #[test]
    fn unknown_paths_under_a_portal_belong_to_that_role() {
        let table = RouteTable::portal_routes();
        assert_eq!(table.required_roles("/doctor/no-such-page"), Some(&[Role::Doctor][..]));
        assert_eq!(table.required_roles("/admin"), Some(&[Role::Admin][..]));
        assert_eq!(table.required_roles("/patients-info"), None);
        assert_eq!(table.required_roles("/about"), None);
    }

    #[test]
    fn public_pages_are_not_in_the_table() {
        let table = RouteTable::portal_routes();
        for path in ["/", "/signin", "/signup", "/SignIn/", "/#top"] {
            assert!(!table.is_protected(path), "{} should be public", path);
        }
    }

    #[test]
    fn profile_is_open_to_any_role() {
        let table = RouteTable::portal_routes();
        assert_eq!(table.required_roles("/profile"), Some(&[][..]));
    }

    #[test]
    fn schedule_routes_are_role_owned() {
        let table = RouteTable::portal_routes();
        assert_eq!(table.required_roles("/admin/schedule"), Some(&[Role::Admin][..]));
        assert_eq!(table.required_roles("/doctor/schedule"), Some(&[Role::Doctor][..]));
    }

    #[test]
    fn public_path_is_allowed_without_identity() {
        let table = RouteTable::portal_routes();
        assert_eq!(table.authorize("/signin", None), RouteDecision::Allow);
        assert_eq!(
            table.authorize("/patient/billings", None),
            RouteDecision::RedirectToSignIn
        );
    }
}
