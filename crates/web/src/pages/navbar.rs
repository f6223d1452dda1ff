//! Navigation bar view model.

use crate::services::Viewer;

/// A link in the navigation bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub href: &'static str,
    pub label: &'static str,
}

/// What the navigation bar shows for the current viewer.
#[derive(Debug, Clone, Default)]
pub struct Navbar {
    pub signed_in: bool,
    pub is_admin: bool,
    pub email: Option<String>,
}

impl Navbar {
    #[must_use]
    pub fn for_viewer(viewer: &Viewer) -> Self {
        Self {
            signed_in: viewer.is_signed_in(),
            is_admin: viewer.is_admin(),
            email: viewer.user().and_then(|u| u.email.clone()),
        }
    }

    /// Page links, in display order. Logout is a form, not a link.
    #[must_use]
    pub fn links(&self) -> Vec<NavLink> {
        let mut links = vec![NavLink {
            href: "/",
            label: "Home",
        }];
        if self.is_admin {
            links.push(NavLink {
                href: "/write",
                label: "Write",
            });
            links.push(NavLink {
                href: "/admin",
                label: "Admin",
            });
        }
        if !self.signed_in {
            links.push(NavLink {
                href: "/login",
                label: "Login",
            });
        }
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(navbar: &Navbar) -> Vec<&'static str> {
        navbar.links().iter().map(|l| l.label).collect()
    }

    #[test]
    fn test_anonymous_sees_login() {
        assert_eq!(labels(&Navbar::for_viewer(&Viewer::anonymous())), ["Home", "Login"]);
    }

    #[test]
    fn test_reader_sees_no_admin_links() {
        let navbar = Navbar {
            signed_in: true,
            is_admin: false,
            email: None,
        };
        assert_eq!(labels(&navbar), ["Home"]);
    }

    #[test]
    fn test_admin_sees_write_and_admin() {
        let navbar = Navbar {
            signed_in: true,
            is_admin: true,
            email: Some("admin@techlog.dev".into()),
        };
        assert_eq!(labels(&navbar), ["Home", "Write", "Admin"]);
    }
}
