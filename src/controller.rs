// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};

use crate::api::RatesApi;
use crate::chart::{ChartData, ChartState, ChartSurface, Legend, LineChart};
use crate::conversion::{convert, format_result, parse_amount};
use crate::error::{AppError, MSG_CHART_FAILED, MSG_CURRENCIES_FAILED, MSG_HISTORY_FAILED};
use crate::models::{CurrencyTable, HistoryResponse};
use crate::rates::RateService;

/// Events fed to the controller, one at a time.
#[derive(Debug)]
pub enum Command {
    CurrenciesLoaded(Result<CurrencyTable, AppError>),
    InputChanged(String),
    SelectionChanged(Option<String>),
    ActionTriggered,
    /// Outcome of the history read started by action number `request`.
    HistoryLoaded {
        request: u64,
        code: String,
        result: Result<HistoryResponse, AppError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No usable selection or amount yet.
    #[default]
    Idle,
    /// Amount entered and a currency selected; the button is enabled. Also
    /// the phase while a converted value waits for its history.
    Ready,
    /// Last conversion succeeded and the chart is current.
    Result,
    /// Last conversion, fetch or chart draw failed, or the currency list never loaded.
    Error,
}

/// Everything the screen shows, published after every command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct View {
    pub phase: Phase,
    /// Dropdown entries as (code, display name).
    pub options: Vec<(String, String)>,
    pub selected: Option<String>,
    pub amount: String,
    pub button_enabled: bool,
    pub results: Option<String>,
    pub legend: Option<Legend>,
    pub chart: Option<LineChart>,
    /// The latest action's history read has not come back yet.
    pub history_pending: bool,
    /// Set when the currency list failed to load; there is no retry short of a restart.
    pub currencies_failed: bool,
}

/// Per-session state: current rates, history cache and the chart.
pub struct Session {
    pub currencies: CurrencyTable,
    pub rates: RateService,
    pub chart: ChartState,
}

impl Session {
    pub fn new(api: Arc<dyn RatesApi>) -> Self {
        Self {
            currencies: CurrencyTable::default(),
            rates: RateService::new(api),
            chart: ChartState::new(),
        }
    }
}

/// A history read on a cache miss, run outside the command loop.
pub struct HistoryRequest {
    id: u64,
    code: String,
    fetch: BoxFuture<'static, Result<HistoryResponse, AppError>>,
}

impl HistoryRequest {
    pub async fn run(self) -> Command {
        Command::HistoryLoaded {
            request: self.id,
            code: self.code,
            result: self.fetch.await,
        }
    }
}

pub struct Controller {
    session: Session,
    surface: Box<dyn ChartSurface>,
    view: View,
    view_tx: watch::Sender<View>,
    /// Id of the newest accepted action. Reads started by older actions
    /// still fill the cache but no longer touch the view.
    latest_request: u64,
}

impl Controller {
    pub fn new(api: Arc<dyn RatesApi>, surface: Box<dyn ChartSurface>) -> Self {
        let (view_tx, _) = watch::channel(View::default());
        Self {
            session: Session::new(api),
            surface,
            view: View::default(),
            view_tx,
            latest_request: 0,
        }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn subscribe(&self) -> watch::Receiver<View> {
        self.view_tx.subscribe()
    }

    /// Fetch the currency list and feed the outcome back as a command.
    pub async fn load_currencies(&mut self) {
        let result = self.session.rates.list_currencies().await;
        self.apply(Command::CurrenciesLoaded(result));
    }

    /// Apply a command and, if it starts a history read, wait for that read
    /// before returning.
    pub async fn handle(&mut self, command: Command) {
        if let Some(request) = self.apply(command) {
            let loaded = request.run().await;
            self.apply(loaded);
        }
    }

    /// Apply a command without waiting on the network. A cache miss comes
    /// back as a `HistoryRequest` whose outcome must be applied later.
    pub fn apply(&mut self, command: Command) -> Option<HistoryRequest> {
        let mut request = None;
        match command {
            Command::CurrenciesLoaded(Ok(table)) => self.on_currencies_loaded(table),
            Command::CurrenciesLoaded(Err(e)) => self.on_currencies_failed(e),
            Command::InputChanged(amount) => {
                self.view.amount = amount;
                self.refresh_enablement();
            }
            Command::SelectionChanged(code) => {
                self.view.selected = code.filter(|c| !c.is_empty());
                self.refresh_enablement();
            }
            Command::ActionTriggered => {
                if self.view.button_enabled {
                    request = self.on_action();
                } else {
                    log::debug!("Action ignored: button disabled");
                }
            }
            Command::HistoryLoaded {
                request: id,
                code,
                result,
            } => self.on_history_loaded(id, &code, result),
        }
        self.publish();
        request
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.view.clone());
    }

    fn on_currencies_loaded(&mut self, table: CurrencyTable) {
        log::info!("Loaded {} currencies", table.len());
        self.view.options = table.options();
        if let Some(code) = &self.view.selected {
            if !table.contains(code) {
                self.view.selected = None;
            }
        }
        self.session.currencies = table;
        self.view.currencies_failed = false;
        self.view.phase = Phase::Idle;
        self.refresh_enablement();
    }

    fn on_currencies_failed(&mut self, e: AppError) {
        log::error!("Failed to load currencies: {}", e);
        self.view.options.clear();
        self.view.selected = None;
        self.view.currencies_failed = true;
        self.view.results = Some(MSG_CURRENCIES_FAILED.to_string());
        self.view.phase = Phase::Error;
        self.refresh_enablement();
    }

    /// Only presence is checked here; numeric validation happens on action.
    fn refresh_enablement(&mut self) {
        self.view.button_enabled = !self.view.amount.is_empty() && self.view.selected.is_some();
        if self.view.currencies_failed {
            return;
        }
        self.view.phase = if self.view.button_enabled {
            Phase::Ready
        } else {
            Phase::Idle
        };
    }

    fn on_action(&mut self) -> Option<HistoryRequest> {
        self.latest_request += 1;
        self.view.history_pending = false;
        let code = self.view.selected.clone().unwrap_or_default();

        let converted = parse_amount(&self.view.amount)
            .and_then(|amount| convert(amount, &code, &self.session.currencies));
        let value = match converted {
            Ok(value) => value,
            Err(e) => {
                log::debug!("Conversion failed: {}", e);
                self.view.results = Some(e.user_message().to_string());
                self.view.phase = Phase::Error;
                return None;
            }
        };

        let name = self
            .session
            .currencies
            .get(&code)
            .map(|record| record.name.clone())
            .unwrap_or_else(|| code.clone());
        self.view.results = Some(format_result(value, &name));
        self.view.phase = Phase::Ready;

        if let Some(history) = self.session.rates.cached_history(&code) {
            log::debug!("History cache hit for {}", code);
            self.show_history(&code, &history);
            return None;
        }

        // The result is visible before the history request goes out.
        self.view.history_pending = true;
        self.publish();
        Some(HistoryRequest {
            id: self.latest_request,
            fetch: self.session.rates.history_request(&code),
            code,
        })
    }

    fn on_history_loaded(
        &mut self,
        request: u64,
        code: &str,
        result: Result<HistoryResponse, AppError>,
    ) {
        let history = result.map(|response| self.session.rates.store_history(code, response));

        if request != self.latest_request {
            log::debug!("History for {} arrived after a newer action, cached only", code);
            return;
        }
        self.view.history_pending = false;

        match history {
            Ok(history) => self.show_history(code, &history),
            Err(e) => {
                if e.is_network() {
                    log::warn!("History for {} unreachable: {}", code, e);
                } else {
                    log::error!("Failed to fetch history for {}: {}", code, e);
                }
                self.view.legend = Some(Legend::Message(MSG_HISTORY_FAILED.to_string()));
                self.view.phase = Phase::Error;
            }
        }
    }

    fn show_history(&mut self, code: &str, history: &HistoryResponse) {
        let Some(data) = ChartData::from_series(&history.series) else {
            log::warn!("History for {} has an empty series, chart left as is", code);
            self.view.phase = Phase::Result;
            return;
        };

        let rendered = self.session.chart.render(data, self.surface.as_mut());
        self.view.chart = self.session.chart.chart().cloned();
        match rendered {
            Ok(outcome) => {
                log::debug!("Chart {:?} for {}", outcome, code);
                self.view.legend = Some(Legend::standard());
                self.view.phase = Phase::Result;
            }
            Err(e) => {
                log::error!("Failed to draw chart for {}: {:#}", code, e);
                self.view.legend = Some(Legend::Message(MSG_CHART_FAILED.to_string()));
                self.view.phase = Phase::Error;
            }
        }
    }

    /// Move the controller onto its own task. Commands are applied in
    /// arrival order and the currency list is loaded first; history reads run
    /// alongside so edits keep being applied while one is outstanding.
    pub fn spawn(mut self) -> ControllerHandle {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let view = self.subscribe();

        let task = tokio::spawn(async move {
            self.load_currencies().await;
            let mut pending = JoinSet::new();
            loop {
                tokio::select! {
                    command = rx.recv() => match command {
                        Some(command) => {
                            if let Some(request) = self.apply(command) {
                                pending.spawn(request.run());
                            }
                        }
                        None => break,
                    },
                    Some(joined) = pending.join_next() => match joined {
                        Ok(loaded) => {
                            self.apply(loaded);
                        }
                        Err(e) => log::error!("History task failed: {}", e),
                    },
                }
            }
            log::debug!("Controller queue closed");
        });

        ControllerHandle { tx, view, task }
    }
}

pub struct ControllerHandle {
    tx: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<View>,
    task: JoinHandle<()>,
}

impl ControllerHandle {
    pub fn send(&self, command: Command) -> anyhow::Result<()> {
        self.tx
            .send(command)
            .map_err(|_| anyhow::anyhow!("controller task has stopped"))
    }

    pub fn view(&self) -> watch::Receiver<View> {
        self.view.clone()
    }

    /// Closes the queue; history reads still outstanding are aborted.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        drop(self.tx);
        self.task.await?;
        Ok(())
    }
}
