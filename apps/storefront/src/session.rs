//! Input loop: search box text goes through the debouncer, sort controls go
//! straight to the listing, and every listing event re-renders the view.

use std::{io::Write, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use client_core::{Debouncer, ListingEvent, ListingSnapshot, ProductListing, QueryChange};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    sync::{broadcast, mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, warn};

use crate::{
    input::{self, InputCommand},
    view,
};

/// Runs until `/quit` or end of input and hands the output sink back.
///
/// At end of input the pending search is flushed and the last refresh is
/// awaited, so the final query is always rendered. `/quit` discards both.
pub async fn run_session<R, W>(
    input: R,
    listing: Arc<ProductListing>,
    debounce: Duration,
    out: W,
) -> Result<W>
where
    R: AsyncBufRead + Unpin,
    W: Write + Send + 'static,
{
    let (stop_renderer, renderer_stopped) = oneshot::channel();
    let renderer = spawn_renderer(listing.clone(), out, renderer_stopped);

    let (change_tx, mut change_rx) = mpsc::unbounded_channel::<QueryChange>();
    let search_tx = change_tx.clone();
    let debouncer = Debouncer::new(debounce, move |term: String| {
        let _ = search_tx.send(QueryChange::SearchTerm(term));
    });

    let mut last_refresh = listing.spawn_refresh();
    let mut lines = input.lines();
    let mut quit = false;

    while !quit {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read input")? else {
                    break;
                };
                match input::parse_line(&line) {
                    InputCommand::Search(term) => debouncer.call(term),
                    InputCommand::Sort(field) => {
                        let _ = change_tx.send(QueryChange::SortBy(field));
                    }
                    InputCommand::Toggle => {
                        let _ = change_tx.send(QueryChange::ToggleOrder);
                    }
                    InputCommand::Quit => {
                        debouncer.cancel();
                        quit = true;
                    }
                    InputCommand::Invalid(reason) => warn!(%reason, "ignoring input"),
                }
            }
            Some(change) = change_rx.recv() => {
                if let Some(handle) = listing.handle(change).await {
                    last_refresh = handle;
                }
            }
        }
    }

    if !quit {
        debouncer.flush().await;
    }
    drop(debouncer);
    drop(change_tx);
    while let Some(change) = change_rx.recv().await {
        if quit {
            continue;
        }
        if let Some(handle) = listing.handle(change).await {
            last_refresh = handle;
        }
    }
    if !quit {
        last_refresh.await.context("refresh task panicked")?;
    }

    let _ = stop_renderer.send(());
    renderer.await.context("renderer task panicked")
}

fn spawn_renderer<W>(
    listing: Arc<ProductListing>,
    mut out: W,
    mut stop: oneshot::Receiver<()>,
) -> JoinHandle<W>
where
    W: Write + Send + 'static,
{
    let mut events = listing.subscribe_events();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(event) => render_event(&listing, event, &mut out).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "renderer lagged behind listing events");
                        write_snapshot(&mut out, &listing.snapshot().await);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = &mut stop => {
                    while let Ok(event) = events.try_recv() {
                        render_event(&listing, event, &mut out).await;
                    }
                    break;
                }
            }
        }
        out
    })
}

async fn render_event<W: Write>(listing: &ProductListing, event: ListingEvent, out: &mut W) {
    match event {
        ListingEvent::LoadingStarted { .. }
        | ListingEvent::ResultsReady { .. }
        | ListingEvent::FetchFailed { .. } => write_snapshot(out, &listing.snapshot().await),
        ListingEvent::StaleResponseDropped { .. } => {}
    }
}

fn write_snapshot<W: Write>(out: &mut W, snapshot: &ListingSnapshot) {
    let written = writeln!(out, "\n{}", view::render_listing(snapshot)).and_then(|_| out.flush());
    if let Err(error) = written {
        warn!(%error, "failed to write listing");
    }
}
