//! Product listing controller: query state, result list, and loading flag
//! behind one lock, refreshed from a [`CatalogSource`].

use std::sync::Arc;

use shared::{
    domain::{QueryState, SortField, SortOrder},
    protocol::Product,
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::api::CatalogSource;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryChange {
    SearchTerm(String),
    SortBy(SortField),
    SortOrder(SortOrder),
    ToggleOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPhase {
    #[default]
    Idle,
    Loading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListingSnapshot {
    pub query: QueryState,
    pub products: Vec<Product>,
    pub phase: FetchPhase,
    pub last_outcome: Option<FetchOutcome>,
    /// Latest request token issued, zero before the first refresh.
    pub latest_token: u64,
}

impl ListingSnapshot {
    pub fn is_loading(&self) -> bool {
        self.phase == FetchPhase::Loading
    }
}

#[derive(Debug, Clone)]
pub enum ListingEvent {
    LoadingStarted {
        token: u64,
        query: QueryState,
    },
    ResultsReady {
        token: u64,
        query: QueryState,
        count: usize,
    },
    FetchFailed {
        token: u64,
        query: QueryState,
        reason: String,
    },
    StaleResponseDropped {
        token: u64,
        latest_token: u64,
    },
}

#[derive(Default)]
struct ListingInner {
    query: QueryState,
    products: Vec<Product>,
    phase: FetchPhase,
    last_outcome: Option<FetchOutcome>,
    latest_token: u64,
}

impl ListingInner {
    fn snapshot(&self) -> ListingSnapshot {
        ListingSnapshot {
            query: self.query.clone(),
            products: self.products.clone(),
            phase: self.phase,
            last_outcome: self.last_outcome,
            latest_token: self.latest_token,
        }
    }

    /// Returns the new query when the change actually moved it.
    fn apply(&mut self, change: QueryChange) -> Option<QueryState> {
        let before = self.query.clone();
        match change {
            QueryChange::SearchTerm(term) => self.query.search_term = term,
            QueryChange::SortBy(field) => self.query.sort_by = field,
            QueryChange::SortOrder(order) => self.query.sort_order = order,
            QueryChange::ToggleOrder => self.query.sort_order = self.query.sort_order.toggled(),
        }
        (self.query != before).then(|| self.query.clone())
    }
}

/// Drives the product listing. Every refresh takes a fresh request token;
/// only the response carrying the latest token may touch the stored results,
/// so a slow stale response never overwrites a newer one.
pub struct ProductListing {
    source: Arc<dyn CatalogSource>,
    inner: Mutex<ListingInner>,
    events: broadcast::Sender<ListingEvent>,
}

impl ProductListing {
    pub fn new(source: Arc<dyn CatalogSource>) -> Arc<Self> {
        Self::with_query(source, QueryState::default())
    }

    pub fn with_query(source: Arc<dyn CatalogSource>, query: QueryState) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            source,
            inner: Mutex::new(ListingInner {
                query,
                ..ListingInner::default()
            }),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ListingEvent> {
        self.events.subscribe()
    }

    pub async fn query(&self) -> QueryState {
        self.inner.lock().await.query.clone()
    }

    pub async fn snapshot(&self) -> ListingSnapshot {
        self.inner.lock().await.snapshot()
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.lock().await.phase == FetchPhase::Loading
    }

    pub async fn apply(&self, change: QueryChange) -> Option<QueryState> {
        self.inner.lock().await.apply(change)
    }

    /// Applies `change` and, when the query moved, starts a refresh in the
    /// background. In-flight refreshes are not cancelled.
    pub async fn handle(
        self: &Arc<Self>,
        change: QueryChange,
    ) -> Option<JoinHandle<ListingSnapshot>> {
        let query = self.apply(change).await?;
        debug!(
            search_term = %query.search_term,
            sort_by = %query.sort_by,
            sort_order = %query.sort_order,
            "query changed"
        );
        Some(self.spawn_refresh())
    }

    pub fn spawn_refresh(self: &Arc<Self>) -> JoinHandle<ListingSnapshot> {
        let listing = Arc::clone(self);
        tokio::spawn(async move { listing.refresh().await })
    }

    /// Fetches products for the current query. Failures are logged and leave
    /// an empty list; nothing is returned to the caller but the final state.
    pub async fn refresh(&self) -> ListingSnapshot {
        let (token, query) = {
            let mut guard = self.inner.lock().await;
            guard.latest_token += 1;
            guard.phase = FetchPhase::Loading;
            (guard.latest_token, guard.query.clone())
        };
        let _ = self.events.send(ListingEvent::LoadingStarted {
            token,
            query: query.clone(),
        });
        info!(
            token,
            search_term = %query.search_term,
            sort_by = %query.sort_by,
            sort_order = %query.sort_order,
            "fetching products"
        );

        let result = self.source.search_products(&query).await;

        let mut guard = self.inner.lock().await;
        if token != guard.latest_token {
            debug!(
                token,
                latest_token = guard.latest_token,
                "dropping stale product response"
            );
            let _ = self.events.send(ListingEvent::StaleResponseDropped {
                token,
                latest_token: guard.latest_token,
            });
            return guard.snapshot();
        }

        match result {
            Ok(page) => {
                let count = page.products.len();
                guard.products = page.products;
                guard.last_outcome = Some(FetchOutcome::Succeeded);
                info!(token, count, "products loaded");
                let _ = self
                    .events
                    .send(ListingEvent::ResultsReady { token, query, count });
            }
            Err(error) => {
                warn!(token, kind = error.kind(), %error, "failed to fetch products");
                guard.products.clear();
                guard.last_outcome = Some(FetchOutcome::Failed);
                let _ = self.events.send(ListingEvent::FetchFailed {
                    token,
                    query,
                    reason: error.to_string(),
                });
            }
        }
        guard.phase = FetchPhase::Idle;
        guard.snapshot()
    }
}
