use shared::domain::Role;

use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Identity is still being resolved; render a placeholder and decide later.
    Loading,
    Allow,
    RedirectToLogin,
    RedirectToLanding,
}

/// Admission check for a role-protected view.
pub fn guard(required: &Role, session: &Session) -> GuardDecision {
    match session {
        Session::Resolving => GuardDecision::Loading,
        Session::Anonymous => GuardDecision::RedirectToLogin,
        Session::Authenticated(user) if user.has_role(required) => GuardDecision::Allow,
        Session::Authenticated(_) => GuardDecision::RedirectToLanding,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Landing,
    Login,
    Signup,
    AdminDashboard,
    AdminProfile,
    AdminReports,
    AdminWarehouses,
    ManagerDashboard,
    ManagerProfile,
    EmployeeDashboard,
    EmployeeProfile,
}

impl Route {
    pub const ALL: [Route; 11] = [
        Route::Landing,
        Route::Login,
        Route::Signup,
        Route::AdminDashboard,
        Route::AdminProfile,
        Route::AdminReports,
        Route::AdminWarehouses,
        Route::ManagerDashboard,
        Route::ManagerProfile,
        Route::EmployeeDashboard,
        Route::EmployeeProfile,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Self::Landing => "/",
            Self::Login => "/login",
            Self::Signup => "/signup",
            Self::AdminDashboard => "/admin",
            Self::AdminProfile => "/admin/profile",
            Self::AdminReports => "/admin/reports",
            Self::AdminWarehouses => "/admin/warehouses",
            Self::ManagerDashboard => "/manager",
            Self::ManagerProfile => "/manager/profile",
            Self::EmployeeDashboard => "/employee",
            Self::EmployeeProfile => "/employee/profile",
        }
    }

    /// Trailing slashes are ignored; anything unknown is `None` (not found).
    pub fn parse(path: &str) -> Option<Self> {
        let trimmed = path.trim();
        let normalized = match trimmed.trim_end_matches('/') {
            "" => "/",
            other => other,
        };
        Self::ALL
            .into_iter()
            .find(|route| route.path() == normalized)
    }

    pub fn required_role(&self) -> Option<Role> {
        match self {
            Self::Landing | Self::Login | Self::Signup => None,
            Self::AdminDashboard | Self::AdminProfile | Self::AdminReports | Self::AdminWarehouses => {
                Some(Role::Admin)
            }
            Self::ManagerDashboard | Self::ManagerProfile => Some(Role::Manager),
            Self::EmployeeDashboard | Self::EmployeeProfile => Some(Role::Employee),
        }
    }
}

/// Dashboard a signed-in user lands on. Unknown roles have none.
pub fn home_route(role: &Role) -> Option<Route> {
    match role {
        Role::Admin => Some(Route::AdminDashboard),
        Role::Manager => Some(Route::ManagerDashboard),
        Role::Employee => Some(Route::EmployeeDashboard),
        Role::Other(_) => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Render(Route),
    Loading,
    Redirect(Route),
    NotFound,
}

/// Resolves a path against the route table and the current session.
pub fn navigate(path: &str, session: &Session) -> Navigation {
    let Some(route) = Route::parse(path) else {
        return Navigation::NotFound;
    };

    if let Some(required) = route.required_role() {
        return match guard(&required, session) {
            GuardDecision::Loading => Navigation::Loading,
            GuardDecision::Allow => Navigation::Render(route),
            GuardDecision::RedirectToLogin => Navigation::Redirect(Route::Login),
            GuardDecision::RedirectToLanding => Navigation::Redirect(Route::Landing),
        };
    }

    // Signed-in users skip the login and signup forms.
    if matches!(route, Route::Login | Route::Signup) {
        if let Some(home) = session.role().and_then(home_route) {
            return Navigation::Redirect(home);
        }
    }
    Navigation::Render(route)
}

#[cfg(test)]
#[path = "tests/guard_tests.rs"]
mod tests;
