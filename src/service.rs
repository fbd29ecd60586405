use crate::config::{Config, DefaultsConfig, PaginationConfig};
use crate::db::Database;
use crate::enrichment::{referenced_ids, to_view};
use crate::error::{AppError, StorageResult};
use crate::models::{
    ActivityEvent, ActivityEventView, AllActivityData, DailyActivityCount, FirstTouchpoint,
    Person, PersonSummary,
};
use crate::pagination::{Page, PageRequest};
use crate::projections;
use crate::repository::{EventFilter, Repository, SortOrder};
use axum::http::Uri;
use std::collections::HashMap;
use tracing::debug;

/// Most recent events shipped with the initial-load bundle
pub const INITIAL_LOAD_LIMIT: usize = 500;
pub const RANDOM_EVENT_SAMPLE: u32 = 10;
pub const RANDOM_PERSON_SAMPLE: u32 = 5;

/// Where a paginated response is being served from, for building links
#[derive(Debug, Clone, Default)]
pub struct PageLocation {
    pub path: String,
    pub query: Option<String>,
}

impl PageLocation {
    pub fn from_uri(uri: &Uri) -> Self {
        Self {
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
        }
    }
}

/// Read-only queries over events and persons
#[derive(Clone)]
pub struct ActivityQueryService {
    db: Database,
    pagination: PaginationConfig,
    defaults: DefaultsConfig,
}

impl ActivityQueryService {
    pub fn new(db: Database, config: &Config) -> Self {
        Self {
            db,
            pagination: config.pagination.clone(),
            defaults: config.defaults.clone(),
        }
    }

    fn repo(&self) -> Repository<'_> {
        Repository::new(&self.db)
    }

    pub fn page_request(&self, page: Option<u64>, page_size: Option<u64>) -> PageRequest {
        PageRequest::new(
            page,
            page_size,
            self.pagination.default_page_size,
            self.pagination.max_page_size,
        )
    }

    pub fn list_activities(
        &self,
        filter: &EventFilter,
        request: PageRequest,
        location: &PageLocation,
    ) -> Result<Page<ActivityEventView>, AppError> {
        let repo = self.repo();
        let total = repo.count_events(filter)?;
        request.validate(total)?;

        let events = repo.find_events(
            filter,
            SortOrder::Descending,
            Some(request.page_size),
            request.offset(),
        )?;
        let views = self.enrich(events)?;
        debug!(total, returned = views.len(), page = request.page, "listed activities");

        Ok(request.into_page(total, views, &location.path, location.query.as_deref()))
    }

    pub fn list_persons(
        &self,
        customer_org_id: Option<&str>,
        request: PageRequest,
        location: &PageLocation,
    ) -> Result<Page<PersonSummary>, AppError> {
        let repo = self.repo();
        let total = repo.count_persons(customer_org_id)?;
        request.validate(total)?;

        let persons = repo
            .find_persons(customer_org_id, Some(request.page_size), request.offset())?
            .into_iter()
            .map(PersonSummary::from)
            .collect();

        Ok(request.into_page(total, persons, &location.path, location.query.as_deref()))
    }

    pub fn daily_counts(
        &self,
        customer_org_id: Option<String>,
        account_id: Option<String>,
    ) -> StorageResult<Vec<DailyActivityCount>> {
        self.repo()
            .daily_inbound_counts(&EventFilter::scoped(customer_org_id, account_id))
    }

    pub fn first_touchpoints(
        &self,
        customer_org_id: Option<String>,
        account_id: Option<String>,
    ) -> StorageResult<Vec<FirstTouchpoint>> {
        let candidates = self.candidate_persons(customer_org_id.as_deref())?;
        let filter = EventFilter::scoped(customer_org_id, account_id);
        let events = self
            .repo()
            .find_events(&filter, SortOrder::Ascending, None, 0)?;
        Ok(projections::first_touchpoints(&events, &candidates))
    }

    /// Everything the timeline needs on first paint, scoped to one account
    pub fn all_activity_data(
        &self,
        customer_org_id: Option<String>,
        account_id: Option<String>,
    ) -> StorageResult<AllActivityData> {
        let customer_org_id =
            customer_org_id.unwrap_or_else(|| self.defaults.default_org_id.clone());
        let account_id = account_id.unwrap_or_else(|| self.defaults.default_account_id.clone());
        let filter = EventFilter::scoped(Some(customer_org_id.clone()), Some(account_id));

        let repo = self.repo();
        let daily_counts = repo.daily_inbound_counts(&filter)?;
        let mut events = repo.find_events(&filter, SortOrder::Ascending, None, 0)?;
        let candidates = self.candidate_persons(Some(&customer_org_id))?;
        let first_touchpoints = projections::first_touchpoints(&events, &candidates);

        let total_count = events.len() as u64;
        events.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| a.touchpoint_id.cmp(&b.touchpoint_id))
        });
        events.truncate(INITIAL_LOAD_LIMIT);
        let activities = self.enrich(events)?;

        debug!(
            customer_org_id = %customer_org_id,
            total_count,
            returned = activities.len(),
            "built initial activity load"
        );

        Ok(AllActivityData {
            activities,
            daily_counts,
            first_touchpoints,
            total_count,
        })
    }

    pub fn random_events(
        &self,
        customer_org_id: &str,
        account_id: &str,
    ) -> StorageResult<Vec<ActivityEvent>> {
        self.repo()
            .random_events(customer_org_id, account_id, RANDOM_EVENT_SAMPLE)
    }

    pub fn random_persons(&self, customer_org_id: &str) -> StorageResult<Vec<Person>> {
        self.repo()
            .random_persons(customer_org_id, RANDOM_PERSON_SAMPLE)
    }

    fn candidate_persons(
        &self,
        customer_org_id: Option<&str>,
    ) -> StorageResult<HashMap<String, Person>> {
        Ok(self
            .repo()
            .find_persons(customer_org_id, None, 0)?
            .into_iter()
            .map(|person| (person.id.clone(), person))
            .collect())
    }

    fn enrich(&self, events: Vec<ActivityEvent>) -> StorageResult<Vec<ActivityEventView>> {
        let lookup = self.repo().persons_by_ids(&referenced_ids(&events))?;
        Ok(events
            .into_iter()
            .map(|event| to_view(event, &lookup))
            .collect())
    }
}
