use super::*;
use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use shared::{
    domain::{PostId, ProductId, QueryState, SortField, SortOrder},
    protocol::{Post, PostPage, Product, ProductPage, Reactions},
};
use tokio::sync::{oneshot, Mutex};

enum Scripted {
    Page { delay: Duration, page: ProductPage },
    Fail { delay: Duration },
    Gate(oneshot::Receiver<ProductPage>),
}

#[derive(Default)]
struct StubSource {
    scripted: Mutex<HashMap<String, Scripted>>,
    requests: Arc<Mutex<Vec<QueryState>>>,
    posts: Vec<Post>,
    post_requests: Arc<Mutex<Vec<PostId>>>,
}

impl StubSource {
    fn with_posts(posts: Vec<Post>) -> Self {
        Self {
            posts,
            ..Self::default()
        }
    }

    async fn script(&self, term: &str, scripted: Scripted) {
        self.scripted.lock().await.insert(term.to_string(), scripted);
    }

    async fn respond(&self, term: &str, products: Vec<Product>) {
        self.script(
            term,
            Scripted::Page {
                delay: Duration::ZERO,
                page: page_of(products),
            },
        )
        .await;
    }
}

#[async_trait]
impl CatalogSource for StubSource {
    async fn search_products(&self, query: &QueryState) -> ClientResult<ProductPage> {
        self.requests.lock().await.push(query.clone());
        let scripted = self.scripted.lock().await.remove(&query.search_term);
        match scripted {
            Some(Scripted::Page { delay, page }) => {
                tokio::time::sleep(delay).await;
                // Keep the same answer for repeated identical queries.
                self.script(
                    &query.search_term,
                    Scripted::Page {
                        delay,
                        page: page.clone(),
                    },
                )
                .await;
                Ok(page)
            }
            Some(Scripted::Fail { delay }) => {
                tokio::time::sleep(delay).await;
                Err(ClientError::Status {
                    url: format!("stub://products/search?q={}", query.search_term),
                    status: 503,
                })
            }
            Some(Scripted::Gate(rx)) => rx.await.map_err(|_| ClientError::Status {
                url: "stub://gate".to_string(),
                status: 499,
            }),
            None => Ok(ProductPage::default()),
        }
    }

    async fn list_posts(&self) -> ClientResult<PostPage> {
        Ok(PostPage {
            posts: self.posts.clone(),
            ..PostPage::default()
        })
    }

    async fn fetch_post(&self, id: PostId) -> ClientResult<Post> {
        self.post_requests.lock().await.push(id);
        self.posts
            .iter()
            .find(|post| post.id == id)
            .cloned()
            .ok_or_else(|| ClientError::Status {
                url: format!("stub://posts/{id}"),
                status: 404,
            })
    }
}

fn product(id: i64, title: &str, price: f64, rating: f64) -> Product {
    Product {
        id: ProductId(id),
        title: title.to_string(),
        price,
        rating,
        extra: Default::default(),
    }
}

fn post(id: i64, title: &str) -> Post {
    Post {
        id: PostId(id),
        title: title.to_string(),
        body: format!("body of {title}"),
        views: 10,
        reactions: Reactions {
            likes: 1,
            dislikes: 0,
        },
        tags: vec!["misc".to_string()],
        extra: Default::default(),
    }
}

fn page_of(products: Vec<Product>) -> ProductPage {
    ProductPage {
        products,
        ..ProductPage::default()
    }
}

async fn wait_for_requests(requests: &Arc<Mutex<Vec<QueryState>>>, count: usize) {
    while requests.lock().await.len() < count {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn refresh_stores_products_for_current_query() {
    let source = Arc::new(StubSource::default());
    source
        .respond("phone", vec![product(1, "iPhone", 999.0, 4.5)])
        .await;
    let requests = source.requests.clone();
    let listing = ProductListing::with_query(
        source,
        QueryState::new("phone", SortField::Price, SortOrder::Asc),
    );

    let snapshot = listing.refresh().await;

    assert_eq!(snapshot.products, vec![product(1, "iPhone", 999.0, 4.5)]);
    assert!(!snapshot.is_loading());
    assert_eq!(snapshot.last_outcome, Some(FetchOutcome::Succeeded));
    assert_eq!(
        *requests.lock().await,
        vec![QueryState::new("phone", SortField::Price, SortOrder::Asc)]
    );
}

#[tokio::test]
async fn loading_flag_brackets_the_request() {
    let source = Arc::new(StubSource::default());
    let (release, gate) = oneshot::channel();
    source.script("", Scripted::Gate(gate)).await;
    let requests = source.requests.clone();
    let listing = ProductListing::new(source);

    assert!(!listing.is_loading().await);
    assert_eq!(listing.snapshot().await.phase, FetchPhase::Idle);

    let handle = listing.spawn_refresh();
    wait_for_requests(&requests, 1).await;
    assert!(listing.is_loading().await);
    assert!(listing.snapshot().await.products.is_empty());

    release
        .send(page_of(vec![product(2, "Lamp", 20.0, 3.9)]))
        .expect("release gate");
    let snapshot = handle.await.expect("refresh task");

    assert!(!snapshot.is_loading());
    assert!(!listing.is_loading().await);
    assert_eq!(snapshot.products.len(), 1);
}

#[tokio::test]
async fn failed_request_leaves_empty_list_and_clears_loading() {
    let source = Arc::new(StubSource::default());
    source
        .respond("lamp", vec![product(2, "Lamp", 20.0, 3.9)])
        .await;
    source
        .script(
            "broken",
            Scripted::Fail {
                delay: Duration::ZERO,
            },
        )
        .await;
    let listing = ProductListing::with_query(
        source,
        QueryState::new("lamp", SortField::Title, SortOrder::Asc),
    );
    assert_eq!(listing.refresh().await.products.len(), 1);

    listing
        .apply(QueryChange::SearchTerm("broken".to_string()))
        .await
        .expect("term changed");
    let snapshot = listing.refresh().await;

    assert!(snapshot.products.is_empty());
    assert!(!snapshot.is_loading());
    assert_eq!(snapshot.last_outcome, Some(FetchOutcome::Failed));
}

#[tokio::test(start_paused = true)]
async fn stale_slow_response_never_overwrites_newer_results() {
    let source = Arc::new(StubSource::default());
    source
        .script(
            "slow",
            Scripted::Page {
                delay: Duration::from_millis(300),
                page: page_of(vec![product(1, "Stale", 1.0, 1.0)]),
            },
        )
        .await;
    source
        .script(
            "fast",
            Scripted::Page {
                delay: Duration::from_millis(10),
                page: page_of(vec![product(2, "Fresh", 2.0, 2.0)]),
            },
        )
        .await;
    let requests = source.requests.clone();
    let listing = ProductListing::new(source);
    let mut events = listing.subscribe_events();

    let slow = listing
        .handle(QueryChange::SearchTerm("slow".to_string()))
        .await
        .expect("slow refresh");
    wait_for_requests(&requests, 1).await;
    let fast = listing
        .handle(QueryChange::SearchTerm("fast".to_string()))
        .await
        .expect("fast refresh");

    let fast_snapshot = fast.await.expect("fast task");
    assert_eq!(fast_snapshot.products[0].title, "Fresh");
    let after_stale = slow.await.expect("slow task");

    assert_eq!(after_stale.products, vec![product(2, "Fresh", 2.0, 2.0)]);
    assert_eq!(after_stale.query.search_term, "fast");
    assert!(!after_stale.is_loading());

    let mut dropped = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let ListingEvent::StaleResponseDropped {
            token,
            latest_token,
        } = event
        {
            dropped.push((token, latest_token));
        }
    }
    assert_eq!(dropped, vec![(1, 2)]);
}

#[tokio::test(start_paused = true)]
async fn earlier_response_does_not_end_loading_of_newer_request() {
    let source = Arc::new(StubSource::default());
    source
        .script(
            "first",
            Scripted::Page {
                delay: Duration::from_millis(10),
                page: page_of(vec![product(1, "First", 1.0, 1.0)]),
            },
        )
        .await;
    let (release, gate) = oneshot::channel();
    source.script("second", Scripted::Gate(gate)).await;
    let requests = source.requests.clone();
    let listing = ProductListing::new(source);

    let first = listing
        .handle(QueryChange::SearchTerm("first".to_string()))
        .await
        .expect("first refresh");
    wait_for_requests(&requests, 1).await;
    let second = listing
        .handle(QueryChange::SearchTerm("second".to_string()))
        .await
        .expect("second refresh");
    wait_for_requests(&requests, 2).await;

    let snapshot = first.await.expect("first task");
    assert!(snapshot.is_loading());
    assert!(snapshot.products.is_empty());

    release
        .send(page_of(vec![product(3, "Second", 3.0, 3.0)]))
        .expect("release gate");
    let snapshot = second.await.expect("second task");
    assert!(!snapshot.is_loading());
    assert_eq!(snapshot.products[0].title, "Second");
}

#[tokio::test]
async fn identical_refreshes_are_idempotent() {
    let source = Arc::new(StubSource::default());
    source
        .respond(
            "chair",
            vec![
                product(4, "Chair", 50.0, 4.0),
                product(5, "Armchair", 150.0, 4.8),
            ],
        )
        .await;
    let listing = ProductListing::with_query(
        source,
        QueryState::new("chair", SortField::Rating, SortOrder::Desc),
    );

    let first = listing.refresh().await;
    let second = listing.refresh().await;

    assert_eq!(first.products, second.products);
    assert_eq!(second.latest_token, 2);
}

#[tokio::test]
async fn only_real_query_changes_trigger_a_request() {
    let source = Arc::new(StubSource::default());
    let requests = source.requests.clone();
    let listing = ProductListing::new(source);

    assert!(listing.handle(QueryChange::SortBy(SortField::Title)).await.is_none());
    assert!(listing
        .handle(QueryChange::SearchTerm(String::new()))
        .await
        .is_none());
    assert!(listing
        .handle(QueryChange::SortOrder(SortOrder::Asc))
        .await
        .is_none());
    assert!(requests.lock().await.is_empty());

    listing
        .handle(QueryChange::SortBy(SortField::Price))
        .await
        .expect("sort changed")
        .await
        .expect("refresh task");
    listing
        .handle(QueryChange::ToggleOrder)
        .await
        .expect("order changed")
        .await
        .expect("refresh task");

    assert_eq!(
        *requests.lock().await,
        vec![
            QueryState::new("", SortField::Price, SortOrder::Asc),
            QueryState::new("", SortField::Price, SortOrder::Desc),
        ]
    );
}

#[tokio::test]
async fn refresh_emits_loading_then_results() {
    let source = Arc::new(StubSource::default());
    source.respond("", vec![product(1, "Desk", 80.0, 4.1)]).await;
    let listing = ProductListing::new(source);
    let mut events = listing.subscribe_events();

    listing.refresh().await;

    match events.recv().await.expect("loading event") {
        ListingEvent::LoadingStarted { token, query } => {
            assert_eq!(token, 1);
            assert_eq!(query, QueryState::default());
        }
        other => panic!("unexpected event: {other:?}"),
    }
    match events.recv().await.expect("results event") {
        ListingEvent::ResultsReady { token, count, .. } => {
            assert_eq!(token, 1);
            assert_eq!(count, 1);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn failure_is_reported_as_event_with_reason() {
    let source = Arc::new(StubSource::default());
    source
        .script(
            "",
            Scripted::Fail {
                delay: Duration::ZERO,
            },
        )
        .await;
    let listing = ProductListing::new(source);
    let mut events = listing.subscribe_events();

    listing.refresh().await;

    let _loading = events.recv().await.expect("loading event");
    match events.recv().await.expect("failure event") {
        ListingEvent::FetchFailed { reason, .. } => assert!(reason.contains("503"), "{reason}"),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn static_params_use_post_ids_as_slugs() {
    let source = StubSource::with_posts(vec![post(1, "One"), post(7, "Seven")]);

    let params = posts::static_params(&source).await.expect("params");

    let slugs: Vec<&str> = params.iter().map(|param| param.slug.as_str()).collect();
    assert_eq!(slugs, vec!["1", "7"]);
}

#[tokio::test]
async fn load_post_fetches_by_slug_and_rejects_bad_slugs() {
    let source = StubSource::with_posts(vec![post(7, "Seven")]);

    let loaded = posts::load_post(&source, "7").await.expect("post");
    assert_eq!(loaded.title, "Seven");

    let err = posts::load_post(&source, "seven").await.expect_err("bad slug");
    assert!(err.to_string().contains("invalid post slug"), "{err}");

    let err = posts::load_post(&source, "8").await.expect_err("missing post");
    assert!(format!("{err:#}").contains("404"), "{err:#}");

    assert_eq!(*source.post_requests.lock().await, vec![PostId(7), PostId(8)]);
}
