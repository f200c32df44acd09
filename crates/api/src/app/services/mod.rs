//! Service layer: orchestration between the guard, the pure domain
//! transitions, and the store.

use std::sync::Arc;

use coursehub_store::{
    CourseStore, DraftStore, InviteStore, MemoryStore, OrganizationStore, PostgresStore,
    ProfileStore, UserStore,
};

pub mod admin;
pub mod advocates;
pub mod courses;
pub mod drafts;
pub mod identity;

pub use admin::AdminService;
pub use advocates::AdvocateService;
pub use courses::CourseService;
pub use drafts::DraftService;
pub use identity::IdentityService;

/// Dependency-injected store handles. One backend implements every trait;
/// services only see the trait they need.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub invites: Arc<dyn InviteStore>,
    pub organizations: Arc<dyn OrganizationStore>,
    pub courses: Arc<dyn CourseStore>,
    pub drafts: Arc<dyn DraftStore>,
    pub profiles: Arc<dyn ProfileStore>,
}

impl Stores {
    pub fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: UserStore
            + InviteStore
            + OrganizationStore
            + CourseStore
            + DraftStore
            + ProfileStore
            + 'static,
    {
        Self {
            users: backend.clone(),
            invites: backend.clone(),
            organizations: backend.clone(),
            courses: backend.clone(),
            drafts: backend.clone(),
            profiles: backend,
        }
    }
}

pub struct AppServices {
    pub identity: IdentityService,
    pub drafts: DraftService,
    pub courses: CourseService,
    pub advocates: AdvocateService,
    pub admin: AdminService,
}

impl AppServices {
    pub fn new(stores: Stores) -> Self {
        Self {
            identity: IdentityService::new(stores.clone()),
            drafts: DraftService::new(stores.clone()),
            courses: CourseService::new(stores.clone()),
            advocates: AdvocateService::new(stores.clone()),
            admin: AdminService::new(stores),
        }
    }
}

/// Wire services against the configured backend.
///
/// `USE_PERSISTENT_STORES=true` selects Postgres (`DATABASE_URL` required);
/// anything else runs on the in-memory store.
pub async fn build_services() -> anyhow::Result<AppServices> {
    let use_persistent = std::env::var("USE_PERSISTENT_STORES")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);

    let stores = if use_persistent {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set when USE_PERSISTENT_STORES=true"))?;
        let store = PostgresStore::connect(&database_url)
            .await
            .map_err(|e| anyhow::anyhow!("postgres connect failed: {e}"))?;
        tracing::info!("using postgres-backed stores");
        Stores::from_backend(Arc::new(store))
    } else {
        tracing::info!("using in-memory stores");
        Stores::from_backend(Arc::new(MemoryStore::new()))
    };

    Ok(AppServices::new(stores))
}
