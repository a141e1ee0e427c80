// Client-side routes
// Declarative route table plus the guard consulted before each transition

mod guard;
mod navigation;

pub use guard::{GuardDecision, NavigationGuard, NavigationOutcome, ADMIN_ROLE, ADMIN_USERNAME};
pub use navigation::{Navigation, LOGIN_ROUTE};

pub const DASHBOARD_ROUTE: &str = "/";
pub const ADD_USER_ROUTE: &str = "/addUser";
pub const ACCESS_DENIED_ROUTE: &str = "/auth/access";
pub const ERROR_ROUTE: &str = "/auth/error";

/// One entry of the route table
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub path: &'static str,
    pub name: &'static str,
    /// Transition requires a valid session
    pub requires_auth: bool,
    /// Transition requires the admin role
    pub requires_admin: bool,
}

impl Route {
    const fn public(path: &'static str, name: &'static str) -> Self {
        Self {
            path,
            name,
            requires_auth: false,
            requires_admin: false,
        }
    }

    const fn protected(path: &'static str, name: &'static str, requires_admin: bool) -> Self {
        Self {
            path,
            name,
            requires_auth: true,
            requires_admin,
        }
    }
}

pub const ROUTES: &[Route] = &[
    Route::protected(DASHBOARD_ROUTE, "dashboard", false),
    Route::protected("/sales", "sales", false),
    Route::protected(ADD_USER_ROUTE, "addUser", true),
    Route::protected("/archive", "archive", true),
    Route::protected("/products", "products", true),
    Route::public(LOGIN_ROUTE, "login"),
    Route::public(ACCESS_DENIED_ROUTE, "accessDenied"),
    Route::public(ERROR_ROUTE, "error"),
];

/// Look up a route by path. A trailing slash is ignored.
pub fn find_route(path: &str) -> Option<&'static Route> {
    let normalized = match path.trim_end_matches('/') {
        "" => DASHBOARD_ROUTE,
        trimmed => trimmed,
    };
    ROUTES.iter().find(|route| route.path == normalized)
}

/// Look up a route by name
pub fn route_by_name(name: &str) -> Option<&'static Route> {
    ROUTES.iter().find(|route| route.name == name)
}
