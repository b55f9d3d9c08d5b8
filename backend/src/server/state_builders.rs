//! Wire repositories into the domain services behind [`HttpState`].

use std::sync::Arc;

use mockable::Clock;

use helpdesk::domain::ports::{
    ComplaintRepository, MessageRepository, NotificationRepository, TechnicalTeamRepository,
    UserRepository,
};
use helpdesk::domain::{
    ComplaintService, MessagingService, NotificationService, Retrier, TechnicalTeamService,
    UserAccountService,
};
use helpdesk::inbound::http::state::HttpState;
use helpdesk::outbound::persistence::{
    DbPool, DieselComplaintRepository, DieselMessageRepository, DieselNotificationRepository,
    DieselTechnicalTeamRepository, DieselUserRepository,
};

/// One adapter per driven port.
pub struct Repositories<U, C, N, M, T> {
    pub users: Arc<U>,
    pub complaints: Arc<C>,
    pub notifications: Arc<N>,
    pub messages: Arc<M>,
    pub technical_team: Arc<T>,
}

pub type DieselRepositories = Repositories<
    DieselUserRepository,
    DieselComplaintRepository,
    DieselNotificationRepository,
    DieselMessageRepository,
    DieselTechnicalTeamRepository,
>;

impl DieselRepositories {
    pub fn from_pool(pool: &DbPool) -> Self {
        Self {
            users: Arc::new(DieselUserRepository::new(pool.clone())),
            complaints: Arc::new(DieselComplaintRepository::new(pool.clone())),
            notifications: Arc::new(DieselNotificationRepository::new(pool.clone())),
            messages: Arc::new(DieselMessageRepository::new(pool.clone())),
            technical_team: Arc::new(DieselTechnicalTeamRepository::new(pool.clone())),
        }
    }
}

/// Build the handler state. The account service is returned as well so the
/// caller can run the administrator bootstrap.
pub fn build_http_state<U, C, N, M, T>(
    repositories: Repositories<U, C, N, M, T>,
    clock: Arc<dyn Clock>,
    retrier: Retrier,
) -> (HttpState, Arc<UserAccountService<U>>)
where
    U: UserRepository + 'static,
    C: ComplaintRepository + 'static,
    N: NotificationRepository + 'static,
    M: MessageRepository + 'static,
    T: TechnicalTeamRepository + 'static,
{
    let Repositories {
        users,
        complaints,
        notifications,
        messages,
        technical_team,
    } = repositories;

    let accounts = Arc::new(UserAccountService::new(users.clone(), retrier.clone()));
    let complaint_service = Arc::new(ComplaintService::new(
        complaints,
        users.clone(),
        clock.clone(),
        retrier.clone(),
    ));
    let notification_service = Arc::new(NotificationService::new(
        notifications,
        users.clone(),
        clock.clone(),
        retrier.clone(),
    ));
    let messaging_service = Arc::new(MessagingService::new(
        messages,
        users.clone(),
        clock,
        retrier.clone(),
    ));
    let team_service = Arc::new(TechnicalTeamService::new(technical_team, users, retrier));

    let state = HttpState {
        login: accounts.clone(),
        accounts: accounts.clone(),
        complaints: complaint_service.clone(),
        complaint_query: complaint_service,
        notifications: notification_service,
        messaging: messaging_service,
        technical_team: team_service,
    };
    (state, accounts)
}
