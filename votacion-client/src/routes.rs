//! Route table, navigation guard and router.

use std::{collections::BTreeMap, fmt, sync::Arc};

use strum::{AsRefStr, Display, EnumIter};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::{
    error::{ClientError, ClientResult},
    stores::session::SessionStore,
};

/// Who may enter a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Visibility {
    /// Only for visitors without a session (login page).
    Public,
    /// Requires a session.
    Protected,
    /// Reachable in any state (voting page).
    Unrestricted,
}

/// Named client routes, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, Display, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum RouteName {
    /// Login page.
    Home,
    /// Template picker.
    Plantillas,
    /// Draft editor.
    CrearVotacion,
    /// Draft preview.
    Preeliminar,
    /// Share link of a saved survey.
    Compartir,
    /// Voting results.
    Resultados,
    /// Listing of the user's surveys.
    EncuestasRealizadas,
    /// Public voting page, `/votacion/:uuid`.
    Votacion,
}

/// Unauthenticated landing page.
pub const ENTRY_ROUTE: RouteName = RouteName::Home;
/// Default destination once authenticated.
pub const LANDING_ROUTE: RouteName = RouteName::Plantillas;

/// One entry of the route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteDescriptor {
    /// Path pattern; `:name` segments are parameters.
    pub path: &'static str,
    /// Route identifier.
    pub name: RouteName,
    /// View rendered for the route.
    pub view: &'static str,
    /// Who may enter.
    pub visibility: Visibility,
}

const fn route(
    path: &'static str,
    name: RouteName,
    view: &'static str,
    visibility: Visibility,
) -> RouteDescriptor {
    RouteDescriptor {
        path,
        name,
        view,
        visibility,
    }
}

/// Static route table, indexed by `RouteName as usize`.
pub static ROUTES: [RouteDescriptor; 8] = [
    route("/", RouteName::Home, "Login", Visibility::Public),
    route("/plantillas", RouteName::Plantillas, "Plantilla", Visibility::Protected),
    route(
        "/crear-votacion",
        RouteName::CrearVotacion,
        "CrearVotacion",
        Visibility::Protected,
    ),
    route(
        "/preeliminar",
        RouteName::Preeliminar,
        "VistaPreeliminar",
        Visibility::Protected,
    ),
    route("/compartir", RouteName::Compartir, "Enlace", Visibility::Protected),
    route("/resultados", RouteName::Resultados, "Resultados", Visibility::Protected),
    route(
        "/encuestas-realizadas",
        RouteName::EncuestasRealizadas,
        "EncuestasRealizadas",
        Visibility::Protected,
    ),
    route(
        "/votacion/:uuid",
        RouteName::Votacion,
        "Votacion",
        Visibility::Unrestricted,
    ),
];

impl RouteName {
    /// Table entry of this route.
    #[must_use]
    pub fn descriptor(self) -> &'static RouteDescriptor {
        &ROUTES[self as usize]
    }

    /// Who may enter this route.
    #[must_use]
    pub fn visibility(self) -> Visibility {
        self.descriptor().visibility
    }
}

/// A resolved route plus its path parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Matched route.
    pub name: RouteName,
    /// Values of the `:name` segments.
    pub params: BTreeMap<String, String>,
}

impl Location {
    /// Location of a route without parameters.
    #[must_use]
    pub fn new(name: RouteName) -> Self {
        Self {
            name,
            params: BTreeMap::new(),
        }
    }

    /// Adds a path parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Value of a path parameter.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Renders the path, substituting parameters that are known.
    #[must_use]
    pub fn path(&self) -> String {
        let pattern = self.name.descriptor().path;
        if pattern == "/" {
            return pattern.to_string();
        }
        pattern
            .split('/')
            .map(|segment| match segment.strip_prefix(':') {
                Some(key) => self.param(key).unwrap_or(segment),
                None => segment,
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Matches a path (query and fragment ignored) against the route table.
#[must_use]
pub fn resolve(path: &str) -> Option<Location> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    if !path.starts_with('/') {
        return None;
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return Some(Location::new(RouteName::Home));
    }

    let segments: Vec<&str> = trimmed.split('/').skip(1).collect();
    ROUTES.iter().find_map(|descriptor| {
        let pattern: Vec<&str> = descriptor.path.split('/').skip(1).collect();
        if pattern.len() != segments.len() || descriptor.path == "/" {
            return None;
        }
        let mut location = Location::new(descriptor.name);
        for (expected, actual) in pattern.iter().zip(&segments) {
            match expected.strip_prefix(':') {
                Some(_) if actual.is_empty() => return None,
                Some(key) => {
                    location.params.insert(key.to_string(), (*actual).to_string());
                }
                None if expected != actual => return None,
                None => {}
            }
        }
        Some(location)
    })
}

/// Whether a path names a known route. `/` always exists.
#[must_use]
pub fn route_exists(path: &str) -> bool {
    path == "/" || resolve(path).is_some()
}

/// Outcome of the navigation guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// The transition proceeds.
    Allow,
    /// The transition is replaced by one to this route.
    Redirect(RouteName),
}

/// Decides whether a transition to a route with `visibility` may proceed.
#[must_use]
pub fn guard(visibility: Visibility, authenticated: bool) -> GuardDecision {
    match visibility {
        Visibility::Unrestricted => GuardDecision::Allow,
        Visibility::Protected if !authenticated => GuardDecision::Redirect(ENTRY_ROUTE),
        Visibility::Public if authenticated => GuardDecision::Redirect(LANDING_ROUTE),
        Visibility::Protected | Visibility::Public => GuardDecision::Allow,
    }
}

/// Sink for programmatic redirects issued outside the router.
pub trait Navigator: Send + Sync {
    /// Moves to `route`, subject to the same guard as any navigation.
    fn redirect(&self, route: RouteName);
}

/// Owns the current location and runs the guard before every transition.
#[derive(Debug)]
pub struct Router {
    session: Arc<SessionStore>,
    current: watch::Sender<Location>,
}

impl Router {
    /// A router positioned on the entry route (the guard runs on first navigation).
    #[must_use]
    pub fn new(session: Arc<SessionStore>) -> Self {
        let (current, _) = watch::channel(Location::new(ENTRY_ROUTE));
        Self { session, current }
    }

    /// Navigates to `to`, or wherever the guard redirects, and returns the
    /// location actually reached.
    ///
    /// Authentication is read from the hydrated session (local storage only,
    /// no network).
    #[must_use]
    pub fn navigate(&self, to: Location) -> Location {
        let authenticated = self.session.check_auth();
        let target = match guard(to.name.visibility(), authenticated) {
            GuardDecision::Allow => to,
            GuardDecision::Redirect(name) => {
                info!(from = %to, to = %name, authenticated, "navigation redirected");
                Location::new(name)
            }
        };
        debug!(location = %target, "navigated");
        self.current.send_replace(target.clone());
        target
    }

    /// Resolves `path` and navigates to it.
    ///
    /// # Errors
    /// Returns [`ClientError::UnknownRoute`] when no route matches.
    pub fn push_path(&self, path: &str) -> ClientResult<Location> {
        let location = resolve(path).ok_or_else(|| ClientError::UnknownRoute(path.to_string()))?;
        Ok(self.navigate(location))
    }

    /// Location last reached.
    #[must_use]
    pub fn current(&self) -> Location {
        self.current.borrow().clone()
    }

    /// Receiver notified on every navigation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Location> {
        self.current.subscribe()
    }
}

impl Navigator for Router {
    fn redirect(&self, route: RouteName) {
        let _ = self.navigate(Location::new(route));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::HttpClient,
        storage::{KeyValueStorage, MemoryStorage, TOKEN_KEY},
    };
    use shared::config::Config;
    use strum::IntoEnumIterator;

    fn router(authenticated: bool) -> (Router, Arc<SessionStore>) {
        let storage = Arc::new(MemoryStorage::new());
        if authenticated {
            storage.set(TOKEN_KEY, "abc").unwrap();
        }
        let api = HttpClient::public(&Config::with_defaults()).unwrap();
        let session = Arc::new(SessionStore::new(storage, api));
        (Router::new(session.clone()), session)
    }

    #[test]
    fn test_table_is_indexed_by_route_name() {
        for name in RouteName::iter() {
            assert_eq!(name.descriptor().name, name);
        }
        assert_eq!(RouteName::CrearVotacion.to_string(), "crear-votacion");
        assert_eq!(RouteName::EncuestasRealizadas.as_ref(), "encuestas-realizadas");
    }

    #[test]
    fn test_guard_matrix() {
        for authenticated in [false, true] {
            assert_eq!(guard(Visibility::Unrestricted, authenticated), GuardDecision::Allow);
        }
        assert_eq!(
            guard(Visibility::Protected, false),
            GuardDecision::Redirect(ENTRY_ROUTE)
        );
        assert_eq!(guard(Visibility::Protected, true), GuardDecision::Allow);
        assert_eq!(
            guard(Visibility::Public, true),
            GuardDecision::Redirect(LANDING_ROUTE)
        );
        assert_eq!(guard(Visibility::Public, false), GuardDecision::Allow);
    }

    #[test]
    fn test_every_protected_route_redirects_anonymous_visitors() {
        let (router, _) = router(false);
        for name in RouteName::iter().filter(|name| name.visibility() == Visibility::Protected) {
            assert_eq!(router.navigate(Location::new(name)).name, ENTRY_ROUTE);
        }
    }

    #[test]
    fn test_public_routes_redirect_authenticated_users() {
        let (router, _) = router(true);
        assert_eq!(router.push_path("/").unwrap().name, LANDING_ROUTE);
        assert_eq!(router.push_path("/compartir").unwrap().name, RouteName::Compartir);
    }

    #[test]
    fn test_voting_page_reachable_in_any_state() {
        for authenticated in [false, true] {
            let (router, _) = router(authenticated);
            let location = router.push_path("/votacion/abc-123").unwrap();
            assert_eq!(location.name, RouteName::Votacion);
            assert_eq!(location.param("uuid"), Some("abc-123"));
            assert_eq!(router.current().path(), "/votacion/abc-123");
        }
    }

    #[test]
    fn test_logout_is_seen_by_next_navigation() {
        let (router, session) = router(true);
        assert_eq!(router.push_path("/resultados").unwrap().name, RouteName::Resultados);

        session.logout();
        assert_eq!(router.push_path("/resultados").unwrap().name, ENTRY_ROUTE);
    }

    #[test]
    fn test_redirect_publishes_location() {
        let (router, _) = router(false);
        let mut rx = router.subscribe();
        router.redirect(RouteName::Plantillas);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().name, ENTRY_ROUTE);
    }

    #[test]
    fn test_resolve_paths() {
        assert_eq!(resolve("/").unwrap().name, RouteName::Home);
        assert_eq!(resolve("/plantillas/").unwrap().name, RouteName::Plantillas);
        assert_eq!(
            resolve("/crear-votacion?from=plantillas").unwrap().name,
            RouteName::CrearVotacion
        );
        assert!(resolve("/votacion").is_none());
        assert!(resolve("/votacion/a/b").is_none());
        assert!(resolve("plantillas").is_none());
        assert!(resolve("/desconocida").is_none());
    }

    #[test]
    fn test_route_exists() {
        assert!(route_exists("/"));
        assert!(route_exists("/encuestas-realizadas"));
        assert!(route_exists("/votacion/xyz"));
        assert!(!route_exists("encuestas-realizadas"));
        assert!(!route_exists("/admin"));
    }

    #[test]
    fn test_unknown_path_is_an_error() {
        let (router, _) = router(true);
        assert!(matches!(
            router.push_path("/nope"),
            Err(ClientError::UnknownRoute(path)) if path == "/nope"
        ));
    }

    #[test]
    fn test_location_path_without_param_keeps_pattern() {
        assert_eq!(Location::new(RouteName::Votacion).path(), "/votacion/:uuid");
        assert_eq!(Location::new(RouteName::Home).path(), "/");
        assert_eq!(
            Location::new(RouteName::Votacion).with_param("uuid", "X").to_string(),
            "/votacion/X"
        );
    }
}
