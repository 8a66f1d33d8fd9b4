use serde::Serialize;

use shared::types::Role;

/// One sidebar entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
    pub label: &'static str,
    pub path: &'static str,
}

const fn entry(label: &'static str, path: &'static str) -> MenuEntry {
    MenuEntry { label, path }
}

/// Everything a role owns: landing route, sidebar, and the protected routes
/// that are reachable without appearing in the sidebar.
#[derive(Debug)]
pub struct RolePortal {
    pub role: Role,
    pub home: &'static str,
    pub menu: &'static [MenuEntry],
    pub extra_routes: &'static [&'static str],
}

static ADMIN: RolePortal = RolePortal {
    role: Role::Admin,
    home: "/admin/dashboard",
    menu: &[
        entry("Dashboard", "/admin/dashboard"),
        entry("Doctors", "/admin/doctors"),
        entry("Patients", "/admin/patients"),
        entry("Appointments", "/admin/appointments"),
        entry("Settings", "/admin/settings"),
    ],
    extra_routes: &["/admin/schedule", "/admin/doctors/:id", "/admin/patients/:id"],
};

static DOCTOR: RolePortal = RolePortal {
    role: Role::Doctor,
    home: "/doctor/dashboard",
    menu: &[
        entry("Dashboard", "/doctor/dashboard"),
        entry("My Patients", "/doctor/my-patients"),
        entry("Appointments", "/doctor/appointments"),
        entry("Settings", "/doctor/settings"),
    ],
    extra_routes: &["/doctor/schedule"],
};

static PATIENT: RolePortal = RolePortal {
    role: Role::Patient,
    home: "/patient/dashboard",
    menu: &[
        entry("Dashboard", "/patient/dashboard"),
        entry("Find Doctors", "/patient/find-doctors"),
        entry("Book Appointment", "/patient/book-appointments"),
        entry("My Bookings", "/patient/my-bookings"),
        entry("Medical Records", "/patient/medical-records"),
        entry("Billings", "/patient/billings"),
        entry("Settings", "/patient/settings"),
    ],
    extra_routes: &[],
};

pub fn portal(role: Role) -> &'static RolePortal {
    match role {
        Role::Admin => &ADMIN,
        Role::Doctor => &DOCTOR,
        Role::Patient => &PATIENT,
    }
}

/// Ordered sidebar for a role.
pub fn menu_for_role(role: Role) -> &'static [MenuEntry] {
    portal(role).menu
}
