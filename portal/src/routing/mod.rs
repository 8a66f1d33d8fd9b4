pub mod guard;
pub mod menu;
pub mod routes;

pub use guard::{LANDING_ROUTE, RouteDecision, SIGN_IN_ROUTE, authorize_route, role_home};
pub use menu::{MenuEntry, menu_for_role};
pub use routes::{RouteRule, RouteTable, normalize_path};
