use finshare_config::Settings;
use finshare_services::{
    AccessService, AuthService, InvitationService,
    dao::{
        access_grant::AccessGrantDao, invitation::InvitationDao, transaction::TransactionDao,
        user::UserDao,
    },
};
use mongodb::Database;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Settings,
    pub auth: Arc<AuthService>,
    pub users: Arc<UserDao>,
    pub access: Arc<AccessService>,
    pub invitations: Arc<InvitationService>,
    pub transactions: Arc<TransactionDao>,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> Self {
        let auth = Arc::new(AuthService::new(settings.jwt.clone()));
        let users = Arc::new(UserDao::new(&db));
        let grants = Arc::new(AccessGrantDao::new(&db));
        let invitation_store = Arc::new(InvitationDao::new(&db));
        let access = Arc::new(AccessService::new(grants.clone(), users.clone()));
        let invitations = Arc::new(InvitationService::new(
            db.client().clone(),
            users.clone(),
            invitation_store,
            grants,
        ));
        let transactions = Arc::new(TransactionDao::new(&db));

        Self {
            db,
            settings,
            auth,
            users,
            access,
            invitations,
            transactions,
        }
    }
}
