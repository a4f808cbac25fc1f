//! Loading a session: server first, local files on any failure.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use campus_core::{authenticate, Catalog, Coordinator, CurrentUser, Role};
use campus_storage::{DataLayout, FlatFileStore};
use campus_sync_protocol::{Connection, ProtocolError, WireMessage};
use chrono::{DateTime, Local};
use tracing::{debug, error, info, warn};

/// Where the loader is in its failover sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing loaded yet.
    Unloaded,
    /// Fetching from the sync server.
    TryingServer,
    /// The last load came from the server.
    ServerLoaded,
    /// The server attempt failed; loading local files.
    FallingBackLocal,
    /// The last load came from local files.
    LocalLoaded,
}

impl LoadState {
    /// Returns true once a session is available.
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadState::ServerLoaded | LoadState::LocalLoaded)
    }
}

/// Origin of a session's catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Fetched from the sync server.
    Server,
    /// Rebuilt from local files.
    Local,
}

/// Everything the application sees after a reload.
///
/// A session is never patched by a reload; the loader builds a new one.
#[derive(Debug, Clone)]
pub struct Session {
    /// The loaded collections.
    pub catalog: Catalog,
    /// Where they came from.
    pub source: LoadSource,
    /// Logged-in user, carried across reloads.
    pub current_user: Option<CurrentUser>,
    /// When the load finished.
    pub loaded_at: DateTime<Local>,
}

/// Loads sessions with server-then-local failover.
#[derive(Debug)]
pub struct Loader {
    config: ClientConfig,
    store: FlatFileStore,
    layout: DataLayout,
    state: LoadState,
    session: Option<Session>,
}

impl Loader {
    /// Creates a loader. Nothing is loaded until [`Loader::reload_all`].
    pub fn new(config: ClientConfig) -> Self {
        let store = FlatFileStore::new(&config.data_root);
        let layout = DataLayout::new(&config.data_root);
        Self {
            config,
            store,
            layout,
            state: LoadState::Unloaded,
            session: None,
        }
    }

    /// Current failover state.
    pub fn state(&self) -> LoadState {
        self.state
    }

    /// The current session, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Local store used for fallback loads and local rewrites.
    pub fn store(&self) -> &FlatFileStore {
        &self.store
    }

    /// Local file layout.
    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    /// Configuration in use.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Replaces the session with a freshly loaded one.
    ///
    /// Tries the sync server first. Any failure there (refused, timed out,
    /// closed early, bad payload, wrong message order) is logged and the
    /// same collections are rebuilt from local files instead. After a
    /// server load, local relation and profile files are layered on top so
    /// approvals made on this machine stay visible.
    pub async fn reload_all(&mut self) -> &Session {
        let current_user = self.session.as_ref().and_then(|s| s.current_user);

        self.state = LoadState::TryingServer;
        let (catalog, source) = match self.fetch_from_server().await {
            Ok(mut catalog) => {
                let coordinator = Coordinator::new(&self.store, &self.layout);
                coordinator.apply_profiles(&mut catalog);
                coordinator.apply_relations(&mut catalog);
                self.state = LoadState::ServerLoaded;
                (catalog, LoadSource::Server)
            }
            Err(e) => {
                if e.triggers_fallback() {
                    warn!(
                        addr = %self.config.server_addr,
                        error = %e,
                        connect_failure = e.is_connect_failure(),
                        "server load failed, using local files"
                    );
                } else {
                    error!(
                        addr = %self.config.server_addr,
                        error = %e,
                        "unexpected error during server load, using local files"
                    );
                }
                self.state = LoadState::FallingBackLocal;
                let catalog = self.load_local();
                self.state = LoadState::LocalLoaded;
                (catalog, LoadSource::Local)
            }
        };

        info!(
            source = ?source,
            students = catalog.students.len(),
            teachers = catalog.teachers.len(),
            courses = catalog.courses.len(),
            "session loaded"
        );
        self.session.insert(Session {
            catalog,
            source,
            current_user,
            loaded_at: Local::now(),
        })
    }

    /// Rebuilds the catalog from local files only.
    pub fn load_local(&self) -> Catalog {
        Coordinator::new(&self.store, &self.layout).build()
    }

    /// Fetches the three collections from the sync server.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Protocol`] for connection failures, early
    /// close, and replies out of order.
    pub async fn fetch_from_server(&self) -> ClientResult<Catalog> {
        let mut conn =
            Connection::connect(self.config.server_addr, self.config.connect_timeout).await?;
        conn.send(&WireMessage::FetchAll).await?;

        let students = match conn.receive_required().await? {
            WireMessage::StudentCollection(list) => list,
            other => {
                return Err(ProtocolError::unexpected("StudentCollection", other.name()).into());
            }
        };
        let teachers = match conn.receive_required().await? {
            WireMessage::TeacherCollection(list) => list,
            other => {
                return Err(ProtocolError::unexpected("TeacherCollection", other.name()).into());
            }
        };
        let courses = match conn.receive_required().await? {
            WireMessage::CourseCollection(list) => list,
            other => {
                return Err(ProtocolError::unexpected("CourseCollection", other.name()).into());
            }
        };

        if let Err(e) = conn.close().await {
            debug!(error = %e, "close after fetch failed");
        }
        Ok(Catalog::from_parts(students, teachers, courses))
    }

    /// Checks a login against the current session and records the user.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotLoaded`] before the first reload.
    pub fn login(
        &mut self,
        role: Role,
        id: i64,
        password: &str,
    ) -> ClientResult<Option<CurrentUser>> {
        let session = self.session.as_mut().ok_or(ClientError::NotLoaded)?;
        let user = authenticate(&session.catalog, role, id, password, &self.config.admin);
        if let Some(user) = user {
            info!(role = %user.role, id = user.id, "logged in");
            session.current_user = Some(user);
        }
        Ok(user)
    }

    /// Forgets the logged-in user.
    pub fn logout(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.current_user = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_testkit::{unused_local_addr, TestDataRoot};

    #[tokio::test]
    async fn falls_back_when_server_is_down() {
        let root = TestDataRoot::seeded();
        let config = ClientConfig::new(root.path()).with_server_addr(unused_local_addr());
        let mut loader = Loader::new(config);
        assert_eq!(loader.state(), LoadState::Unloaded);

        let session = loader.reload_all().await;
        assert_eq!(session.source, LoadSource::Local);
        assert!(session.catalog.roster_is_consistent());
        assert_eq!(loader.state(), LoadState::LocalLoaded);
        assert!(loader.state().is_loaded());
    }

    #[tokio::test]
    async fn login_survives_reload() {
        let root = TestDataRoot::seeded();
        let config = ClientConfig::new(root.path()).with_server_addr(unused_local_addr());
        let mut loader = Loader::new(config);

        assert!(matches!(
            loader.login(Role::Student, 1001, "alicenew"),
            Err(ClientError::NotLoaded)
        ));
        loader.reload_all().await;
        let user = loader.login(Role::Student, 1001, "alicenew").unwrap();
        assert_eq!(user, Some(CurrentUser { role: Role::Student, id: 1001 }));
        assert!(loader.login(Role::Teacher, 2001, "wrong").unwrap().is_none());

        let session = loader.reload_all().await;
        assert_eq!(session.current_user, user);

        loader.logout();
        assert!(loader.session().unwrap().current_user.is_none());
    }
}
