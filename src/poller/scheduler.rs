use chrono::{DateTime, Utc};
use futures::future::LocalBoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::commands::Command;
use crate::config::{is_valid_timeframe, Config};
use crate::data::dashboard_api::{DashboardApi, EVENT_LIMIT, EXPORT_LIMIT};
use crate::data::error::FetchError;
use crate::data::types::{FeedData, LiveState, MarketData, Selection};
use crate::poller::feed::EventFeed;
use crate::poller::sequence::SequenceGuard;
use crate::render::{RenderTarget, Renderer};
use crate::view::builder::build;

/// A finished request, tagged with what it was issued for.
#[derive(Debug)]
pub enum Completion {
    Market {
        seq: u64,
        selection: Selection,
        result: Result<MarketData, FetchError>,
    },
    Feed {
        seq: u64,
        result: Result<FeedData, FetchError>,
    },
    Scanner {
        running: bool,
        result: Result<(), FetchError>,
    },
    Backtest {
        selection: Selection,
        result: Result<Value, FetchError>,
    },
    Export {
        symbol: String,
        result: Result<PathBuf, FetchError>,
    },
    Advice {
        result: Result<Value, FetchError>,
    },
}

/// An in-flight request. All of them run inside the poller's task.
pub type Pending = LocalBoxFuture<'static, Completion>;

#[derive(Debug, Clone)]
pub struct PollerSettings {
    pub interval: Duration,
    pub symbols: Vec<String>,
    pub selection: Selection,
    pub export_dir: PathBuf,
}

impl PollerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            interval: config.poll_interval(),
            symbols: config.dashboard.symbols.clone(),
            selection: Selection::new(&config.initial_symbol(), &config.dashboard.default_timeframe),
            export_dir: config.output.export_dir.clone(),
        }
    }
}

pub struct Poller<A: DashboardApi, T: RenderTarget> {
    api: A,
    renderer: Renderer<T>,
    settings: PollerSettings,
    selection: Selection,
    market_seq: SequenceGuard,
    feed_seq: SequenceGuard,
    feed: EventFeed,
}

impl<A: DashboardApi, T: RenderTarget> Poller<A, T> {
    pub fn new(api: A, renderer: Renderer<T>, settings: PollerSettings) -> Self {
        let selection = settings.selection.clone();

        Self {
            api,
            renderer,
            settings,
            selection,
            market_seq: SequenceGuard::new(),
            feed_seq: SequenceGuard::new(),
            feed: EventFeed::new(),
        }
    }

    #[cfg(test)]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    #[cfg(test)]
    pub fn feed(&self) -> &EventFeed {
        &self.feed
    }

    #[cfg(test)]
    pub fn renderer(&self) -> &Renderer<T> {
        &self.renderer
    }

    /// Drive the refresh cycle until `shutdown` resolves.
    pub async fn run(
        &mut self,
        mut commands: mpsc::Receiver<Command>,
        mut live: mpsc::Receiver<LiveState>,
        shutdown: impl Future<Output = ()>,
    ) {
        tokio::pin!(shutdown);

        let mut ticker = tokio::time::interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut inflight: FuturesUnordered<Pending> = FuturesUnordered::new();
        let mut commands_open = true;
        let mut live_open = true;

        info!("Polling {} every {:?}", self.selection, self.settings.interval);

        loop {
            let spawned: Vec<Pending> = tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    debug!("Poll cycle for {}", self.selection);
                    vec![self.refresh_market(), self.refresh_feed()]
                }
                cmd = commands.recv(), if commands_open => match cmd {
                    Some(cmd) => self.dispatch(cmd),
                    None => {
                        commands_open = false;
                        Vec::new()
                    }
                },
                state = live.recv(), if live_open => match state {
                    Some(state) => {
                        self.apply_live(&state);
                        Vec::new()
                    }
                    None => {
                        live_open = false;
                        Vec::new()
                    }
                },
                Some(done) = inflight.next(), if !inflight.is_empty() => self.apply(done),
            };

            inflight.extend(spawned);
        }

        if !inflight.is_empty() {
            info!("Dropping {} in-flight requests", inflight.len());
        }
    }

    /// Start a market-group fetch for the current selection.
    pub fn refresh_market(&mut self) -> Pending {
        let seq = self.market_seq.issue();
        let selection = self.selection.clone();
        let api = self.api.clone();

        async move {
            let result = api.fetch_market(&selection).await;
            Completion::Market { seq, selection, result }
        }
        .boxed_local()
    }

    /// Start a feed-group fetch (events + scanner status).
    pub fn refresh_feed(&mut self) -> Pending {
        let seq = self.feed_seq.issue();
        let api = self.api.clone();

        async move {
            let result = api.fetch_feed().await;
            Completion::Feed { seq, result }
        }
        .boxed_local()
    }

    /// Command dispatch table: one handler per user action.
    pub fn dispatch(&mut self, cmd: Command) -> Vec<Pending> {
        match cmd {
            Command::SelectSymbol(symbol) => {
                if !self.settings.symbols.contains(&symbol) {
                    warn!("Unknown symbol {}, expected one of {:?}", symbol, self.settings.symbols);
                    return Vec::new();
                }
                let selection = Selection::new(&symbol, &self.selection.timeframe);
                self.select(selection)
            }
            Command::SelectTimeframe(timeframe) => {
                if !is_valid_timeframe(&timeframe) {
                    warn!("Invalid timeframe {}", timeframe);
                    return Vec::new();
                }
                let selection = Selection::new(&self.selection.symbol, &timeframe);
                self.select(selection)
            }
            Command::PauseScanner => vec![self.set_scanner_running(false)],
            Command::ResumeScanner => vec![self.set_scanner_running(true)],
            Command::RunBacktest => vec![self.run_backtest()],
            Command::ExportHistory => vec![self.export_history()],
            Command::Advise(fields) => vec![self.advise(fields)],
        }
    }

    fn select(&mut self, selection: Selection) -> Vec<Pending> {
        if selection == self.selection {
            debug!("Selection unchanged: {}", selection);
            return Vec::new();
        }

        info!("Selection changed: {} -> {}", self.selection, selection);
        self.selection = selection;

        // In-flight requests for the old selection are left to finish and
        // are dropped on arrival.
        vec![self.refresh_market(), self.refresh_feed()]
    }

    fn set_scanner_running(&self, running: bool) -> Pending {
        let api = self.api.clone();

        async move {
            let result = api.set_scanner_running(running).await;
            Completion::Scanner { running, result }
        }
        .boxed_local()
    }

    fn run_backtest(&self) -> Pending {
        let api = self.api.clone();
        let selection = self.selection.clone();
        info!("Running backtest for {}", selection);

        async move {
            let result = api.run_backtest(&selection).await;
            Completion::Backtest { selection, result }
        }
        .boxed_local()
    }

    fn export_history(&self) -> Pending {
        let api = self.api.clone();
        let symbol = self.selection.symbol.clone();
        let dir = self.settings.export_dir.clone();

        async move {
            let result = async {
                let body = api.export_history(&symbol, EXPORT_LIMIT).await?;
                tokio::fs::create_dir_all(&dir).await?;
                let path = dir.join(export_file_name(&symbol, Utc::now()));
                tokio::fs::write(&path, body).await?;
                Ok::<PathBuf, FetchError>(path)
            }
            .await;

            Completion::Export { symbol, result }
        }
        .boxed_local()
    }

    fn advise(&self, fields: BTreeMap<String, String>) -> Pending {
        let api = self.api.clone();

        async move {
            let result = api.advise(&fields).await;
            Completion::Advice { result }
        }
        .boxed_local()
    }

    /// Apply a finished request. Returns follow-up requests to start.
    pub fn apply(&mut self, done: Completion) -> Vec<Pending> {
        match done {
            Completion::Market { seq, selection, result } => {
                self.apply_market(seq, &selection, result);
                Vec::new()
            }
            Completion::Feed { seq, result } => {
                self.apply_feed(seq, result);
                Vec::new()
            }
            Completion::Scanner { running, result } => {
                let action = if running { "resume" } else { "pause" };
                match result {
                    Ok(()) => info!("Scanner {} accepted", action),
                    Err(e) => warn!("Scanner {} failed: {}", action, e),
                }
                vec![self.refresh_feed()]
            }
            Completion::Backtest { selection, result } => {
                match result {
                    Ok(report) => {
                        info!("Backtest for {} finished", selection);
                        self.feed.prepend_backtest(report);
                        if let Err(e) = self.renderer.render_events(self.feed.events()) {
                            warn!("Failed to render events: {}", e);
                        }
                    }
                    Err(e) => warn!("Backtest for {} failed: {}", selection, e),
                }
                Vec::new()
            }
            Completion::Export { symbol, result } => {
                match result {
                    Ok(path) => info!("Exported {} history to {}", symbol, path.display()),
                    Err(e) => warn!("History export for {} failed: {}", symbol, e),
                }
                Vec::new()
            }
            Completion::Advice { result } => {
                match result {
                    Ok(advice) => {
                        if let Err(e) = self.renderer.render_advice(&advice) {
                            warn!("Failed to render advice: {}", e);
                        }
                    }
                    Err(e) => warn!("Advisor request failed: {}", e),
                }
                Vec::new()
            }
        }
    }

    fn apply_market(&mut self, seq: u64, selection: &Selection, result: Result<MarketData, FetchError>) {
        if *selection != self.selection {
            debug!("Dropping #{} for {}: selection is now {}", seq, selection, self.selection);
            return;
        }

        let data = match result {
            Ok(data) => data,
            Err(e) if e.is_not_ready() => {
                debug!("Snapshot #{} for {} not ready", seq, selection);
                return;
            }
            Err(e) => {
                warn!("Snapshot #{} for {} failed: {}", seq, selection, e);
                return;
            }
        };

        if !self.market_seq.admit(seq) {
            debug!(
                "Dropping stale snapshot #{} for {} (#{} already shown)",
                seq,
                selection,
                self.market_seq.last_applied()
            );
            return;
        }

        let Some(vm) = build(Some(&data.snapshot), &data.history, &data.stats) else {
            return;
        };

        if let Err(e) = self.renderer.render(&vm) {
            warn!("Failed to render {}: {}", selection, e);
        }
        debug!("Rendered snapshot #{} for {} ({})", seq, selection, vm.pattern);
    }

    fn apply_feed(&mut self, seq: u64, result: Result<FeedData, FetchError>) {
        let data = match result {
            Ok(data) => data,
            Err(e) => {
                warn!("Feed refresh #{} failed: {}", seq, e);
                return;
            }
        };

        if !self.feed_seq.admit(seq) {
            debug!("Dropping stale feed #{}", seq);
            return;
        }

        let mut events = data.events;
        events.truncate(EVENT_LIMIT);
        self.feed.replace(events, data.status);

        if let Err(e) = self.renderer.render_events(self.feed.events()) {
            warn!("Failed to render events: {}", e);
        }
        if let Some(status) = self.feed.status() {
            if let Err(e) = self.renderer.render_scanner(status) {
                warn!("Failed to render scanner status: {}", e);
            }
        }
    }

    pub fn apply_live(&mut self, state: &LiveState) {
        if let Err(e) = self.renderer.render_live(state) {
            warn!("Failed to render live state: {}", e);
        }
    }
}

pub fn export_file_name(symbol: &str, at: DateTime<Utc>) -> String {
    format!("{}_signals_{}.csv", symbol, at.format("%Y%m%d_%H%M%S"))
}
