//! In-memory stores for tests.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering as AtomicOrdering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;

use crate::directory::{
    Directory, DirectoryError, Office, OfficeService, Operator, Organization, Service,
    ServiceCategory, ServicePoint,
};
use crate::schedule::Schedule;
use crate::sequence::{ClaimResult, CounterError, CounterStore};
use crate::ticket::{Ticket, TicketError, TicketFilter, TicketOrder, TicketStatus, TicketStore};

#[derive(Debug, Default)]
struct MemoryState {
    tickets: BTreeMap<String, Ticket>,
    counters: HashMap<(String, NaiveDate), u32>,
    organizations: HashMap<String, Organization>,
    offices: HashMap<String, Office>,
    services: HashMap<String, Service>,
    office_services: HashMap<String, Vec<OfficeService>>,
    categories: Vec<ServiceCategory>,
    service_points: HashMap<String, ServicePoint>,
    operators: BTreeMap<String, Operator>,
    schedules: HashMap<String, Schedule>,
}

/// Implements [`TicketStore`], [`CounterStore`] and [`Directory`] in memory.
///
/// Provides controllable behavior for testing:
/// - Inject conflicts into the next counter writes
/// - Make schedule loads fail
/// - Seed reference data with `add_*` methods
///
/// # Example
///
/// ```rust,ignore
/// use cherga_core::testing::MemoryStore;
///
/// let store = MemoryStore::new();
/// store.fail_next_counter_writes(2);
/// // The next two counter claims see a conflict and are retried.
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    counter_failures: AtomicU32,
    fail_schedule_loads: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// The next `n` conditional counter writes report a conflict.
    pub fn fail_next_counter_writes(&self, n: u32) {
        self.counter_failures.store(n, AtomicOrdering::SeqCst);
    }

    /// Make every schedule load return an error until reset.
    pub fn fail_schedule_loads(&self, fail: bool) {
        self.fail_schedule_loads.store(fail, AtomicOrdering::SeqCst);
    }

    fn take_injected_conflict(&self) -> bool {
        self.counter_failures
            .fetch_update(AtomicOrdering::SeqCst, AtomicOrdering::SeqCst, |n| {
                n.checked_sub(1)
            })
            .is_ok()
    }

    /// Current `last_number` for a counter key.
    pub fn counter_value(&self, office_id: &str, date: NaiveDate) -> Option<u32> {
        self.read()
            .counters
            .get(&(office_id.to_string(), date))
            .copied()
    }

    /// A stored ticket, bypassing the trait.
    pub fn ticket(&self, id: &str) -> Option<Ticket> {
        self.read().tickets.get(id).cloned()
    }

    /// Every stored ticket, ordered by id.
    pub fn all_tickets(&self) -> Vec<Ticket> {
        self.read().tickets.values().cloned().collect()
    }

    pub fn add_organization(&self, organization: Organization) {
        self.write()
            .organizations
            .insert(organization.id.clone(), organization);
    }

    pub fn add_office(&self, office: Office) {
        self.write().offices.insert(office.id.clone(), office);
    }

    pub fn add_service(&self, service: Service) {
        self.write().services.insert(service.id.clone(), service);
    }

    /// Replace an office's service assignments, keeping slice order.
    pub fn set_office_services(&self, office_id: &str, assignments: Vec<OfficeService>) {
        self.write()
            .office_services
            .insert(office_id.to_string(), assignments);
    }

    pub fn add_category(&self, category: ServiceCategory) {
        let mut state = self.write();
        state.categories.retain(|c| c.id != category.id);
        state.categories.push(category);
    }

    pub fn add_service_point(&self, point: ServicePoint) {
        self.write().service_points.insert(point.id.clone(), point);
    }

    pub fn add_operator(&self, operator: Operator) {
        self.write().operators.insert(operator.id.clone(), operator);
    }

    pub fn add_schedule(&self, schedule: Schedule) {
        self.write().schedules.insert(schedule.id.clone(), schedule);
    }
}

fn compare(order: TicketOrder, a: &Ticket, b: &Ticket) -> Ordering {
    match order {
        TicketOrder::Queue => b
            .priority
            .cmp(&a.priority)
            .then(a.issue_time.cmp(&b.issue_time))
            .then(a.sequence.cmp(&b.sequence))
            .then(a.id.cmp(&b.id)),
        TicketOrder::LatestActivity => b
            .last_activity()
            .cmp(&a.last_activity())
            .then(a.id.cmp(&b.id)),
        TicketOrder::RecentlyUpdated => b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)),
    }
}

impl TicketStore for MemoryStore {
    fn insert(&self, ticket: &Ticket) -> Result<(), TicketError> {
        let mut state = self.write();
        if state.tickets.contains_key(&ticket.id) {
            return Err(TicketError::Duplicate(ticket.id.clone()));
        }
        state.tickets.insert(ticket.id.clone(), ticket.clone());
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Ticket>, TicketError> {
        Ok(self.read().tickets.get(id).cloned())
    }

    fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketError> {
        let state = self.read();
        let mut tickets: Vec<Ticket> = state
            .tickets
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        tickets.sort_by(|a, b| compare(filter.order, a, b));

        let offset = usize::try_from(filter.offset).unwrap_or(0);
        let limit = usize::try_from(filter.limit).unwrap_or(0);
        Ok(tickets.into_iter().skip(offset).take(limit).collect())
    }

    fn count(&self, filter: &TicketFilter) -> Result<i64, TicketError> {
        let count = self
            .read()
            .tickets
            .values()
            .filter(|t| filter.matches(t))
            .count();
        Ok(count as i64)
    }

    fn update_if_unchanged(
        &self,
        ticket: &Ticket,
        expected_status: TicketStatus,
        expected_version: i64,
    ) -> Result<bool, TicketError> {
        let mut state = self.write();
        match state.tickets.get_mut(&ticket.id) {
            Some(stored) if stored.status == expected_status && stored.version == expected_version => {
                *stored = ticket.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl CounterStore for MemoryStore {
    fn get(&self, office_id: &str, date: NaiveDate) -> Result<Option<u32>, CounterError> {
        Ok(self.counter_value(office_id, date))
    }

    fn try_create(
        &self,
        office_id: &str,
        date: NaiveDate,
        first: u32,
    ) -> Result<ClaimResult, CounterError> {
        if self.take_injected_conflict() {
            return Ok(ClaimResult::Conflict);
        }
        let mut state = self.write();
        let key = (office_id.to_string(), date);
        if state.counters.contains_key(&key) {
            return Ok(ClaimResult::Conflict);
        }
        state.counters.insert(key, first);
        Ok(ClaimResult::Committed)
    }

    fn compare_and_set(
        &self,
        office_id: &str,
        date: NaiveDate,
        expected: u32,
        next: u32,
    ) -> Result<ClaimResult, CounterError> {
        if self.take_injected_conflict() {
            return Ok(ClaimResult::Conflict);
        }
        let mut state = self.write();
        match state.counters.get_mut(&(office_id.to_string(), date)) {
            Some(last) if *last == expected => {
                *last = next;
                Ok(ClaimResult::Committed)
            }
            _ => Ok(ClaimResult::Conflict),
        }
    }
}

impl Directory for MemoryStore {
    fn organization(&self, id: &str) -> Result<Option<Organization>, DirectoryError> {
        Ok(self.read().organizations.get(id).cloned())
    }

    fn office(&self, id: &str) -> Result<Option<Office>, DirectoryError> {
        Ok(self.read().offices.get(id).cloned())
    }

    fn service(&self, id: &str) -> Result<Option<Service>, DirectoryError> {
        Ok(self.read().services.get(id).cloned())
    }

    fn office_services(&self, office_id: &str) -> Result<Vec<OfficeService>, DirectoryError> {
        Ok(self
            .read()
            .office_services
            .get(office_id)
            .cloned()
            .unwrap_or_default())
    }

    fn service_categories(&self) -> Result<Vec<ServiceCategory>, DirectoryError> {
        let mut categories = self.read().categories.clone();
        categories.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(categories)
    }

    fn service_point(&self, id: &str) -> Result<Option<ServicePoint>, DirectoryError> {
        Ok(self.read().service_points.get(id).cloned())
    }

    fn operator(&self, id: &str) -> Result<Option<Operator>, DirectoryError> {
        Ok(self.read().operators.get(id).cloned())
    }

    fn active_operator_for_user(&self, user_id: &str) -> Result<Option<Operator>, DirectoryError> {
        Ok(self
            .read()
            .operators
            .values()
            .find(|o| o.user_id == user_id && o.is_active)
            .cloned())
    }

    fn schedule(&self, id: &str) -> Result<Option<Schedule>, DirectoryError> {
        if self.fail_schedule_loads.load(AtomicOrdering::SeqCst) {
            return Err(DirectoryError::InvalidData {
                entity: "schedule",
                id: id.to_string(),
                reason: "injected load failure".to_string(),
            });
        }
        Ok(self.read().schedules.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ticket(seq: u32, priority: i32, minute: u32) -> Ticket {
        let at = Utc.with_ymd_and_hms(2025, 3, 10, 9, minute, 0).unwrap();
        Ticket::waiting(format!("T-K-20250310-{:04}", seq), seq, "o1", "svc", at)
            .with_priority(priority)
    }

    #[test]
    fn test_list_uses_queue_order_and_limit() {
        let store = MemoryStore::new();
        store.insert(&ticket(1, 0, 0)).unwrap();
        store.insert(&ticket(2, 1, 5)).unwrap();
        store.insert(&ticket(3, 0, 1)).unwrap();

        let listed = store.list(&TicketFilter::new().with_limit(2)).unwrap();
        let order: Vec<u32> = listed.iter().map(|t| t.sequence).collect();
        assert_eq!(order, vec![2, 1]);
    }

    #[test]
    fn test_injected_conflicts_are_consumed() {
        let store = MemoryStore::new();
        let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        store.fail_next_counter_writes(1);

        assert_eq!(store.try_create("o1", day, 1).unwrap(), ClaimResult::Conflict);
        assert_eq!(store.try_create("o1", day, 1).unwrap(), ClaimResult::Committed);
        assert_eq!(store.counter_value("o1", day), Some(1));
    }

    #[test]
    fn test_update_if_unchanged_mismatch_writes_nothing() {
        let store = MemoryStore::new();
        let original = ticket(1, 0, 0);
        store.insert(&original).unwrap();

        let mut changed = original.clone();
        changed.status = TicketStatus::Called;
        changed.version = 1;
        assert!(!store.update_if_unchanged(&changed, TicketStatus::Serving, 0).unwrap());
        assert!(!store.update_if_unchanged(&changed, TicketStatus::Waiting, 7).unwrap());
        assert_eq!(store.ticket(&original.id).unwrap().status, TicketStatus::Waiting);

        assert!(store.update_if_unchanged(&changed, TicketStatus::Waiting, 0).unwrap());
        assert_eq!(store.ticket(&original.id).unwrap().version, 1);
    }
}
