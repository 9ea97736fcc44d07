//! Application state and main loop

use crate::action::Action;
use crate::components::{Component, WizardComponent};
use crate::tui::{self, Tui};
use color_eyre::Result;
use crossterm::event::{self, Event, KeyEventKind};
use std::time::Duration;
use storage_k8s::{Inventory, KubeClusterApi, create_client, load};
use storage_pilot_core::{PilotConfig, ProviderRegistry, SubmissionPlan, execute_with_progress};
use tokio::sync::mpsc;

/// Results from background tasks
#[derive(Debug)]
enum AsyncResult {
    InventoryLoaded(std::result::Result<Inventory, String>),
    Progress { index: usize, operation: String },
    /// Failure carries the index of the operation that failed
    Submitted(std::result::Result<(), (usize, String)>),
}

/// Main application state
pub struct App {
    should_quit: bool,
    wizard: WizardComponent,
    /// Tick rate for the spinner (ms)
    tick_rate: Duration,
    action_rx: mpsc::UnboundedReceiver<AsyncResult>,
    action_tx: mpsc::UnboundedSender<AsyncResult>,
}

impl App {
    pub fn new(config: PilotConfig, registry: ProviderRegistry) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        Self {
            should_quit: false,
            wizard: WizardComponent::new(config, registry),
            tick_rate: Duration::from_millis(100),
            action_rx,
            action_tx,
        }
    }

    /// Run the application
    pub async fn run(&mut self) -> Result<()> {
        tui::install_panic_hook();
        let mut terminal = tui::init()?;
        let result = self.main_loop(&mut terminal).await;
        tui::restore()?;
        result
    }

    async fn main_loop(&mut self, terminal: &mut Tui) -> Result<()> {
        self.load_inventory();

        loop {
            terminal.draw(|frame| {
                let area = frame.area();
                let _ = self.wizard.draw(frame, area);
            })?;

            // Handle events with timeout
            if event::poll(self.tick_rate)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        if let Some(action) = self.wizard.handle_key_event(key)? {
                            self.handle_action(action).await?;
                        }
                    }
                    Event::Resize(w, h) => {
                        self.handle_action(Action::Resize(w, h)).await?;
                    }
                    _ => {}
                }
            } else {
                self.handle_action(Action::Tick).await?;
            }

            // Check async results (non-blocking)
            while let Ok(result) = self.action_rx.try_recv() {
                match result {
                    AsyncResult::InventoryLoaded(result) => self.wizard.set_inventory(result),
                    AsyncResult::Progress { index, operation } => {
                        self.wizard.set_progress(index, operation);
                    }
                    AsyncResult::Submitted(result) => {
                        match &result {
                            Ok(()) => tracing::info!("Storage system submitted"),
                            Err((index, e)) => {
                                tracing::error!("Submission stopped at operation {}: {}", index, e)
                            }
                        }
                        self.wizard.set_submit_result(result);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    async fn handle_action(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Quit => {
                self.should_quit = true;
            }
            Action::Resize(_w, _h) => {
                // Terminal will automatically resize on next draw
            }
            Action::Refresh => {
                tracing::info!("Refresh requested");
                self.load_inventory();
            }
            Action::Submit => match self.wizard.plan() {
                Ok(plan) => self.submit(plan),
                Err(e) => {
                    tracing::error!("Failed to build submission plan: {}", e);
                    self.wizard.set_submit_result(Err((0, e.to_string())));
                }
            },
            Action::Tick => {
                if let Some(next_action) = self.wizard.update(Action::Tick)? {
                    Box::pin(self.handle_action(next_action)).await?;
                }
            }
        }
        Ok(())
    }

    fn load_inventory(&mut self) {
        self.wizard.set_loading();
        let config = self.wizard.config().clone();
        let tx = self.action_tx.clone();

        tokio::spawn(async move {
            let result = async {
                let client = create_client(config.kube_context.as_deref()).await?;
                load(&client, &config).await
            }
            .await
            .map_err(|e| e.to_string());
            let _ = tx.send(AsyncResult::InventoryLoaded(result));
        });
    }

    fn submit(&mut self, plan: SubmissionPlan) {
        tracing::info!(operations = plan.len(), "Submitting storage system");
        self.wizard.set_progress(0, String::new());

        let context = self.wizard.config().kube_context.clone();
        let registry = self.wizard.wizard().registry().clone();
        let tx = self.action_tx.clone();

        tokio::spawn(async move {
            let client = match create_client(context.as_deref()).await {
                Ok(client) => client,
                Err(e) => {
                    let _ = tx.send(AsyncResult::Submitted(Err((0, e.to_string()))));
                    return;
                }
            };
            let api = KubeClusterApi::new(client);
            let progress = tx.clone();
            let result = execute_with_progress(&plan, &api, &registry, move |index, operation| {
                let _ = progress.send(AsyncResult::Progress {
                    index,
                    operation: operation.to_string(),
                });
            })
            .await
            .map_err(|e| (e.index, e.to_string()));
            let _ = tx.send(AsyncResult::Submitted(result));
        });
    }
}
