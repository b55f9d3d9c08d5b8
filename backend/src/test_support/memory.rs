//! In-memory implementation of every repository port.
//!
//! One mutex guards all tables, so each port call is atomic in the same way a
//! database transaction is. Complaint commits apply the same
//! compare-and-swap guard as the PostgreSQL adapter.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{
    ComplaintRepository, ComplaintRepositoryError, MessageRepository, MessageRepositoryError,
    NotificationRepository, NotificationRepositoryError, StoredCredentials,
    TechnicalTeamRepository, TechnicalTeamRepositoryError, UserPersistenceError, UserRepository,
};
use crate::domain::{
    Complaint, ComplaintFilter, ComplaintId, ComplaintStatus, Message, Notification,
    NotificationId, PasswordDigest, PlannedTransition, TechnicalMember, User, UserDraft, UserId,
};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, (User, PasswordDigest)>,
    complaints: HashMap<ComplaintId, Complaint>,
    notifications: Vec<Notification>,
    messages: Vec<Message>,
    availability: HashMap<UserId, bool>,
}

impl Tables {
    fn email_taken(&self, email: &str) -> bool {
        self.users
            .values()
            .any(|(user, _)| user.email().as_ref() == email)
    }

    fn member(&self, user_id: &UserId) -> Option<TechnicalMember> {
        let available = *self.availability.get(user_id)?;
        let (user, _) = self.users.get(user_id)?;
        Some(TechnicalMember {
            user_id: *user_id,
            name: user.name().clone(),
            department: user.department()?.clone(),
            available,
        })
    }
}

/// Shared in-memory store for service and HTTP tests.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    failures: AtomicU32,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` port calls fail with a connection error.
    pub fn fail_next(&self, count: u32) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Seed an account directly, bypassing services.
    ///
    /// # Panics
    /// Panics if the password cannot be hashed.
    pub fn seed_user(&self, user: User, password: &str) {
        let digest = match PasswordDigest::derive(password) {
            Ok(digest) => digest,
            Err(error) => panic!("seed password digest: {error}"),
        };
        self.lock().users.insert(*user.id(), (user, digest));
    }

    /// Seed a technical user together with its roster row.
    ///
    /// # Panics
    /// Panics if the password cannot be hashed.
    pub fn seed_technical_member(&self, user: User, password: &str, available: bool) {
        let id = *user.id();
        self.seed_user(user, password);
        self.lock().availability.insert(id, available);
    }

    /// Current snapshot of a user.
    pub fn user(&self, id: &UserId) -> Option<User> {
        self.lock().users.get(id).map(|(user, _)| user.clone())
    }

    /// Every stored notification, in insertion order.
    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().notifications.clone()
    }

    /// Every stored message, in insertion order.
    pub fn messages(&self) -> Vec<Message> {
        self.lock().messages.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        match self.tables.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn injected_failure(&self) -> bool {
        self.failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
    }
}

const INJECTED: &str = "injected connection failure";

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert(&self, user: &User, digest: &PasswordDigest) -> Result<(), UserPersistenceError> {
        if self.injected_failure() {
            return Err(UserPersistenceError::connection(INJECTED));
        }
        let mut tables = self.lock();
        if tables.email_taken(user.email().as_ref()) {
            return Err(UserPersistenceError::duplicate_email(user.email().as_ref()));
        }
        tables
            .users
            .insert(*user.id(), (user.clone(), digest.clone()));
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        if self.injected_failure() {
            return Err(UserPersistenceError::connection(INJECTED));
        }
        Ok(self.user(id))
    }

    async fn find_credentials(
        &self,
        email: &str,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError> {
        if self.injected_failure() {
            return Err(UserPersistenceError::connection(INJECTED));
        }
        Ok(self
            .lock()
            .users
            .values()
            .find(|(user, _)| user.email().as_ref() == email)
            .map(|(user, digest)| StoredCredentials {
                user: user.clone(),
                digest: digest.clone(),
            }))
    }

    async fn update_profile(&self, user: &User) -> Result<bool, UserPersistenceError> {
        if self.injected_failure() {
            return Err(UserPersistenceError::connection(INJECTED));
        }
        let mut tables = self.lock();
        let Some((stored, _)) = tables.users.get_mut(user.id()) else {
            return Ok(false);
        };
        *stored = User::new(UserDraft {
            id: *stored.id(),
            name: user.name().clone(),
            email: stored.email().clone(),
            role: stored.role(),
            department: user.department().cloned(),
            points: stored.points(),
        })
        .map_err(|err| UserPersistenceError::query(err.to_string()))?;
        for complaint in tables.complaints.values_mut() {
            *complaint = complaint
                .clone()
                .with_volunteer_name(user.id(), user.name().as_ref());
        }
        Ok(true)
    }

    async fn leaderboard(&self, limit: i64) -> Result<Vec<User>, UserPersistenceError> {
        if self.injected_failure() {
            return Err(UserPersistenceError::connection(INJECTED));
        }
        let mut users: Vec<User> = self
            .lock()
            .users
            .values()
            .map(|(user, _)| user.clone())
            .collect();
        users.sort_by(|a, b| {
            b.points()
                .cmp(&a.points())
                .then_with(|| a.name().as_ref().cmp(b.name().as_ref()))
        });
        users.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(users)
    }
}

#[async_trait]
impl ComplaintRepository for InMemoryStore {
    async fn insert(&self, complaint: &Complaint) -> Result<(), ComplaintRepositoryError> {
        if self.injected_failure() {
            return Err(ComplaintRepositoryError::connection(INJECTED));
        }
        self.lock()
            .complaints
            .insert(complaint.id(), complaint.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &ComplaintId,
    ) -> Result<Option<Complaint>, ComplaintRepositoryError> {
        if self.injected_failure() {
            return Err(ComplaintRepositoryError::connection(INJECTED));
        }
        Ok(self.lock().complaints.get(id).cloned())
    }

    async fn list(
        &self,
        filter: &ComplaintFilter,
    ) -> Result<Vec<Complaint>, ComplaintRepositoryError> {
        if self.injected_failure() {
            return Err(ComplaintRepositoryError::connection(INJECTED));
        }
        let mut found: Vec<Complaint> = self
            .lock()
            .complaints
            .values()
            .filter(|complaint| filter.matches(complaint))
            .cloned()
            .collect();
        found.sort_by_key(|complaint| std::cmp::Reverse(complaint.created_at()));
        Ok(found)
    }

    async fn commit_transition(
        &self,
        plan: &PlannedTransition,
        notification: &Notification,
    ) -> Result<(), ComplaintRepositoryError> {
        if self.injected_failure() {
            return Err(ComplaintRepositoryError::connection(INJECTED));
        }
        let id = plan.complaint.id();
        let mut tables = self.lock();
        let stored = tables
            .complaints
            .get(&id)
            .ok_or_else(|| ComplaintRepositoryError::not_found(id.to_string()))?;
        if stored.status() != plan.expected_status
            || stored.volunteer_id() != plan.expected_volunteer.as_ref()
        {
            return Err(ComplaintRepositoryError::conflict(id.to_string()));
        }

        let awarded = match plan.award {
            Some(award) => {
                let (user, digest) = tables.users.get(&award.user_id).ok_or_else(|| {
                    ComplaintRepositoryError::query(format!("user {} not found", award.user_id))
                })?;
                let credited = User::new(UserDraft {
                    id: *user.id(),
                    name: user.name().clone(),
                    email: user.email().clone(),
                    role: user.role(),
                    department: user.department().cloned(),
                    points: user.points().saturating_add(award.points),
                })
                .map_err(|err| ComplaintRepositoryError::query(err.to_string()))?;
                Some((credited, digest.clone()))
            }
            None => None,
        };

        if let Some((user, digest)) = awarded {
            tables.users.insert(*user.id(), (user, digest));
        }
        tables.complaints.insert(id, plan.complaint.clone());
        tables.notifications.push(notification.clone());
        Ok(())
    }

    async fn update_details(
        &self,
        complaint: &Complaint,
        expected_status: ComplaintStatus,
    ) -> Result<(), ComplaintRepositoryError> {
        if self.injected_failure() {
            return Err(ComplaintRepositoryError::connection(INJECTED));
        }
        let id = complaint.id();
        let mut tables = self.lock();
        let stored = tables
            .complaints
            .get_mut(&id)
            .ok_or_else(|| ComplaintRepositoryError::not_found(id.to_string()))?;
        if stored.status() != expected_status {
            return Err(ComplaintRepositoryError::conflict(id.to_string()));
        }
        *stored = complaint.clone();
        Ok(())
    }

    async fn delete(&self, id: &ComplaintId) -> Result<bool, ComplaintRepositoryError> {
        if self.injected_failure() {
            return Err(ComplaintRepositoryError::connection(INJECTED));
        }
        let mut tables = self.lock();
        if tables.complaints.remove(id).is_none() {
            return Ok(false);
        }
        for notification in &mut tables.notifications {
            if notification.complaint_id.as_ref() == Some(id) {
                notification.complaint_id = None;
            }
        }
        for message in &mut tables.messages {
            if message.complaint_id.as_ref() == Some(id) {
                message.complaint_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl NotificationRepository for InMemoryStore {
    async fn insert(&self, notification: &Notification) -> Result<(), NotificationRepositoryError> {
        if self.injected_failure() {
            return Err(NotificationRepositoryError::connection(INJECTED));
        }
        self.lock().notifications.push(notification.clone());
        Ok(())
    }

    async fn list_for(
        &self,
        recipient: &UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        if self.injected_failure() {
            return Err(NotificationRepositoryError::connection(INJECTED));
        }
        let mut found: Vec<Notification> = self
            .lock()
            .notifications
            .iter()
            .filter(|n| &n.recipient == recipient && !(unread_only && n.read))
            .cloned()
            .collect();
        found.sort_by_key(|n| std::cmp::Reverse(n.created_at));
        Ok(found)
    }

    async fn find_by_id(
        &self,
        id: &NotificationId,
    ) -> Result<Option<Notification>, NotificationRepositoryError> {
        if self.injected_failure() {
            return Err(NotificationRepositoryError::connection(INJECTED));
        }
        Ok(self
            .lock()
            .notifications
            .iter()
            .find(|n| &n.id == id)
            .cloned())
    }

    async fn mark_read(&self, id: &NotificationId) -> Result<(), NotificationRepositoryError> {
        if self.injected_failure() {
            return Err(NotificationRepositoryError::connection(INJECTED));
        }
        if let Some(found) = self
            .lock()
            .notifications
            .iter_mut()
            .find(|n| &n.id == id)
        {
            found.read = true;
        }
        Ok(())
    }

    async fn mark_all_read(&self, recipient: &UserId) -> Result<u64, NotificationRepositoryError> {
        if self.injected_failure() {
            return Err(NotificationRepositoryError::connection(INJECTED));
        }
        let mut changed = 0_u64;
        for n in &mut self.lock().notifications {
            if &n.recipient == recipient && !n.read {
                n.read = true;
                changed += 1;
            }
        }
        Ok(changed)
    }
}

#[async_trait]
impl MessageRepository for InMemoryStore {
    async fn send(
        &self,
        message: &Message,
        notification: &Notification,
    ) -> Result<(), MessageRepositoryError> {
        if self.injected_failure() {
            return Err(MessageRepositoryError::connection(INJECTED));
        }
        let mut tables = self.lock();
        if !tables.users.contains_key(&message.receiver) {
            return Err(MessageRepositoryError::missing_reference(format!(
                "receiver {} not found",
                message.receiver
            )));
        }
        if let Some(complaint) = message
            .complaint_id
            .filter(|id| !tables.complaints.contains_key(id))
        {
            return Err(MessageRepositoryError::missing_reference(format!(
                "complaint {complaint} not found"
            )));
        }
        tables.messages.push(message.clone());
        tables.notifications.push(notification.clone());
        Ok(())
    }

    async fn conversation(
        &self,
        first: &UserId,
        second: &UserId,
    ) -> Result<Vec<Message>, MessageRepositoryError> {
        if self.injected_failure() {
            return Err(MessageRepositoryError::connection(INJECTED));
        }
        let mut found: Vec<Message> = self
            .lock()
            .messages
            .iter()
            .filter(|m| m.is_between(first, second))
            .cloned()
            .collect();
        found.sort_by_key(|m| m.created_at);
        Ok(found)
    }

    async fn mark_conversation_read(
        &self,
        reader: &UserId,
        sender: &UserId,
    ) -> Result<u64, MessageRepositoryError> {
        if self.injected_failure() {
            return Err(MessageRepositoryError::connection(INJECTED));
        }
        let mut changed = 0_u64;
        for m in &mut self.lock().messages {
            if &m.receiver == reader && &m.sender == sender && !m.read {
                m.read = true;
                changed += 1;
            }
        }
        Ok(changed)
    }
}

#[async_trait]
impl TechnicalTeamRepository for InMemoryStore {
    async fn create_member(
        &self,
        user: &User,
        digest: &PasswordDigest,
        available: bool,
    ) -> Result<TechnicalMember, TechnicalTeamRepositoryError> {
        if self.injected_failure() {
            return Err(TechnicalTeamRepositoryError::connection(INJECTED));
        }
        let mut tables = self.lock();
        if tables.email_taken(user.email().as_ref()) {
            return Err(TechnicalTeamRepositoryError::duplicate_email(
                user.email().as_ref(),
            ));
        }
        tables
            .users
            .insert(*user.id(), (user.clone(), digest.clone()));
        tables.availability.insert(*user.id(), available);
        tables.member(user.id()).ok_or_else(|| {
            TechnicalTeamRepositoryError::query("technical member has no department")
        })
    }

    async fn list(&self) -> Result<Vec<TechnicalMember>, TechnicalTeamRepositoryError> {
        if self.injected_failure() {
            return Err(TechnicalTeamRepositoryError::connection(INJECTED));
        }
        let tables = self.lock();
        let mut members: Vec<TechnicalMember> = tables
            .availability
            .keys()
            .filter_map(|id| tables.member(id))
            .collect();
        members.sort_by(|a, b| {
            a.department
                .as_ref()
                .cmp(b.department.as_ref())
                .then_with(|| a.name.as_ref().cmp(b.name.as_ref()))
        });
        Ok(members)
    }

    async fn toggle_availability(
        &self,
        user_id: &UserId,
    ) -> Result<Option<TechnicalMember>, TechnicalTeamRepositoryError> {
        if self.injected_failure() {
            return Err(TechnicalTeamRepositoryError::connection(INJECTED));
        }
        let mut tables = self.lock();
        let Some(available) = tables.availability.get_mut(user_id) else {
            return Ok(None);
        };
        *available = !*available;
        Ok(tables.member(user_id))
    }
}
