//! Wizard component - the create storage system flow
//!
//! Renders the step sidebar, the form of the current step and the footer
//! navigation. Cluster work (inventory loading and submission) is done by
//! the app; results are fed back through the `set_*` methods.

use crate::action::Action;
use crate::components::Component;
use crate::components::forms::{Edit, FormRow, rows_for};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, Paragraph, Row, Table, TableState},
};
use storage_k8s::Inventory;
use storage_pilot_core::{
    AsyncState, BackingStorageType, CoreError, PilotConfig, ProviderRegistry, StepName,
    SubmissionPlan, Wizard, WizardContext, plan_submission,
};

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Add a hint to API errors users commonly hit
fn format_submit_error(error: &str) -> String {
    if error.contains("already exists") {
        format!("{}\n\nA resource from a previous attempt is still present. Remove it and retry.", error)
    } else if error.contains("forbidden") {
        format!("{}\n\nThe current kubeconfig user lacks permission for this operation.", error)
    } else if error.contains("timed out") {
        format!("{}\n\nThe vendor operator did not install its CRD in time.", error)
    } else {
        error.to_string()
    }
}

/// Progress of the final submission
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Idle,
    Running { index: usize, operation: String },
    Done,
    /// Operations before `index` were applied and are not rolled back
    Failed { index: usize, error: String },
}

pub struct WizardComponent {
    wizard: Wizard,
    config: PilotConfig,
    inventory: AsyncState<Inventory>,
    table_state: TableState,
    /// Text buffer while a field is being edited
    editing: Option<String>,
    status: Option<String>,
    submission: Submission,
    /// Plan shown on the review step, built when the step is entered
    plan: Option<Result<SubmissionPlan, String>>,
    spinner_frame: usize,
}

impl WizardComponent {
    pub fn new(config: PilotConfig, registry: ProviderRegistry) -> Self {
        let mut table_state = TableState::default();
        table_state.select(Some(0));
        Self {
            wizard: Wizard::new(WizardContext::default(), registry),
            config,
            inventory: AsyncState::Loading,
            table_state,
            editing: None,
            status: None,
            submission: Submission::Idle,
            plan: None,
            spinner_frame: 0,
        }
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    pub fn config(&self) -> &PilotConfig {
        &self.config
    }

    pub fn submission(&self) -> &Submission {
        &self.submission
    }

    pub fn set_loading(&mut self) {
        self.inventory = AsyncState::Loading;
    }

    pub fn set_inventory(&mut self, result: std::result::Result<Inventory, String>) {
        match result {
            Ok(inventory) => {
                tracing::info!(
                    nodes = inventory.nodes.len(),
                    storage_classes = inventory.storage_classes.len(),
                    devices = inventory.devices.len(),
                    "inventory loaded"
                );
                self.wizard.set_context(inventory.context());
                self.inventory = AsyncState::Loaded(inventory);
                self.refresh_local_volume_set();
            }
            Err(e) => {
                tracing::error!("Failed to load inventory: {}", e);
                self.inventory = AsyncState::Error(e);
            }
        }
    }

    /// Plan for the current state; the app submits it
    pub fn plan(&self) -> std::result::Result<SubmissionPlan, CoreError> {
        plan_submission(
            self.wizard.state(),
            self.wizard.context(),
            self.wizard.registry(),
            &self.config,
        )
    }

    pub fn set_progress(&mut self, index: usize, operation: String) {
        self.submission = Submission::Running { index, operation };
    }

    pub fn set_submit_result(&mut self, result: std::result::Result<(), (usize, String)>) {
        self.submission = match result {
            Ok(()) => Submission::Done,
            Err((index, error)) => Submission::Failed { index, error },
        };
    }

    fn empty_inventory() -> &'static Inventory {
        static EMPTY: std::sync::OnceLock<Inventory> = std::sync::OnceLock::new();
        EMPTY.get_or_init(Inventory::default)
    }

    fn inventory(&self) -> &Inventory {
        self.inventory
            .loaded()
            .unwrap_or_else(|| Self::empty_inventory())
    }

    fn rows(&self) -> Vec<FormRow> {
        rows_for(self.wizard.current_step().name, &self.wizard, self.inventory())
    }

    fn selected_row(&self) -> usize {
        self.table_state.selected().unwrap_or(0)
    }

    fn select_prev(&mut self) {
        let len = self.rows().len();
        if len > 0 {
            let i = self.selected_row();
            let new_i = if i == 0 { len - 1 } else { i - 1 };
            self.table_state.select(Some(new_i));
        }
    }

    fn select_next(&mut self) {
        let len = self.rows().len();
        if len > 0 {
            let i = self.selected_row();
            self.table_state.select(Some((i + 1) % len));
        }
    }

    /// Local PV count and matching nodes follow the disk filter
    fn refresh_local_volume_set(&mut self) {
        if self.wizard.state().backing_storage.kind != BackingStorageType::LocalDevices {
            return;
        }
        if let Some(inventory) = self.inventory.loaded() {
            let nodes = inventory.node_names();
            let devices = inventory.devices.clone();
            self.wizard.refresh_local_volume_set(&nodes, &devices);
        }
    }

    fn dispatch_all(&mut self, actions: Vec<storage_pilot_core::Action>) {
        for action in actions {
            tracing::debug!(action = action.tag(), "dispatch");
            self.wizard.dispatch(action);
        }
        self.refresh_local_volume_set();
        self.status = None;
        let len = self.rows().len();
        if self.selected_row() >= len {
            self.table_state.select(Some(len.saturating_sub(1)));
        }
    }

    fn on_step_changed(&mut self) {
        self.table_state.select(Some(0));
        self.editing = None;
        self.plan = (self.wizard.current_step().name == StepName::ReviewAndCreate)
            .then(|| self.plan().map_err(|e| e.to_string()));
    }

    fn go_next(&mut self) {
        match self.wizard.next() {
            Ok(_) => {
                self.status = None;
                self.on_step_changed();
            }
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    fn go_back(&mut self) {
        self.wizard.back();
        self.status = None;
        self.on_step_changed();
    }

    fn jump(&mut self, id: u32) {
        match self.wizard.jump_to(id) {
            Ok(_) => {
                self.status = None;
                self.on_step_changed();
            }
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    fn activate_row(&mut self) -> Option<Action> {
        let rows = self.rows();
        let Some(row) = rows.get(self.selected_row()) else {
            return None;
        };
        match &row.edit {
            Edit::Activate(actions) => {
                let actions = actions.clone();
                self.dispatch_all(actions);
                None
            }
            Edit::Text { value, .. } => {
                self.editing = Some(value.clone());
                None
            }
            Edit::ReadOnly if self.wizard.current_step().name == StepName::ReviewAndCreate => {
                Some(Action::Submit)
            }
            Edit::ReadOnly => None,
        }
    }

    fn commit_edit(&mut self, buffer: String) {
        let rows = self.rows();
        let actions = match rows.get(self.selected_row()).map(|r| &r.edit) {
            Some(Edit::Text { apply, .. }) => apply(&buffer),
            _ => None,
        };
        match actions {
            Some(actions) => self.dispatch_all(actions),
            None => self.status = Some(format!("invalid value: {}", buffer)),
        }
    }

    fn handle_editing_key(&mut self, key: KeyEvent, mut buffer: String) {
        match key.code {
            KeyCode::Enter => {
                self.commit_edit(buffer);
                return;
            }
            KeyCode::Esc => return,
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Char(c) => buffer.push(c),
            _ => {}
        }
        self.editing = Some(buffer);
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
            KeyCode::Char('r') => Some(Action::Refresh),
            KeyCode::Up | KeyCode::Char('k') => {
                self.select_prev();
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.select_next();
                None
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.activate_row(),
            KeyCode::Tab | KeyCode::Right | KeyCode::Char('n') => {
                self.go_next();
                None
            }
            KeyCode::BackTab | KeyCode::Left | KeyCode::Char('p') => {
                self.go_back();
                None
            }
            KeyCode::Char(c) if c.is_ascii_digit() && c != '0' => {
                self.jump(c.to_digit(10).unwrap_or(1));
                None
            }
            _ => None,
        }
    }

    fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()]
    }
}

impl Component for WizardComponent {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if let Some(buffer) = self.editing.take() {
            self.handle_editing_key(key, buffer);
            return Ok(None);
        }

        let action = match self.submission {
            Submission::Running { .. } => match key.code {
                KeyCode::Char('q') => Some(Action::Quit),
                _ => None,
            },
            Submission::Done => match key.code {
                KeyCode::Enter | KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
                _ => None,
            },
            Submission::Failed { .. } => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
                _ => None,
            },
            Submission::Idle => self.handle_form_key(key),
        };
        Ok(action)
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        if let Action::Tick = action {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES.len();
        }
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let layout = Layout::vertical([
            Constraint::Length(2), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

        self.draw_header(frame, layout[0]);

        let content = Layout::horizontal([
            Constraint::Length(30), // Steps
            Constraint::Fill(1),    // Form
        ])
        .split(layout[1]);
        self.draw_steps(frame, content[0]);

        if self.wizard.current_step().name == StepName::ReviewAndCreate {
            let review = Layout::vertical([Constraint::Percentage(45), Constraint::Fill(1)])
                .split(content[1]);
            self.draw_form(frame, review[0]);
            self.draw_plan(frame, review[1]);
        } else {
            self.draw_form(frame, content[1]);
        }

        self.draw_footer(frame, layout[2]);
        Ok(())
    }
}

impl WizardComponent {
    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let steps = self.wizard.steps();
        let step = self.wizard.current_step();

        let status = match &self.inventory {
            AsyncState::Loaded(_) => Span::raw(" ● ").fg(Color::Green),
            AsyncState::Loading | AsyncState::Idle => {
                Span::raw(format!(" {} ", self.spinner())).fg(Color::Yellow)
            }
            AsyncState::Error(_) => Span::raw(" ✗ ").fg(Color::Red),
        };
        let status_text = match &self.inventory {
            AsyncState::Loaded(inventory) => format!("{} nodes", inventory.nodes.len()),
            AsyncState::Loading | AsyncState::Idle => "Loading cluster...".to_string(),
            AsyncState::Error(e) => e.clone(),
        };

        let header = Paragraph::new(Line::from(vec![
            Span::styled(
                " Create StorageSystem ",
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                format!("Step {} of {}: ", step.id, steps.len()),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(step.name.title(), Style::default().fg(Color::White)),
            Span::raw("  "),
            status,
            Span::raw(status_text).dim(),
        ]))
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        frame.render_widget(header, area);
    }

    fn draw_steps(&self, frame: &mut Frame, area: Rect) {
        let current = self.wizard.current_step();
        let items: Vec<ListItem> = self
            .wizard
            .steps()
            .iter()
            .map(|step| {
                let style = if step.id == current.id {
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else if self.wizard.can_jump_to(step.id) {
                    Style::default().fg(Color::White)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                let marker = if step.id == current.id { "▸" } else { " " };
                ListItem::new(Line::styled(
                    format!("{} {}. {}", marker, step.id, step.name.title()),
                    style,
                ))
            })
            .collect();

        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Steps ")
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        frame.render_widget(list, area);
    }

    fn draw_form(&mut self, frame: &mut Frame, area: Rect) {
        let rows = self.rows();
        let selected = self.selected_row();

        let table_rows: Vec<Row> = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let value = match (&self.editing, &row.edit) {
                    (Some(buffer), Edit::Text { secret, .. }) if i == selected => {
                        let shown = if *secret {
                            "*".repeat(buffer.chars().count())
                        } else {
                            buffer.clone()
                        };
                        Cell::from(format!("{}_", shown)).style(Style::default().fg(Color::Yellow))
                    }
                    _ => Cell::from(row.display.clone()),
                };
                let label_style = if row.is_editable() {
                    Style::default().fg(Color::White)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                Row::new(vec![Cell::from(row.label.clone()).style(label_style), value])
            })
            .collect();

        let table = Table::new(table_rows, [Constraint::Length(32), Constraint::Fill(1)])
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} ", self.wizard.current_step().name.title())),
            )
            .row_highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            );

        frame.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn draw_plan(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title(" Operations ");
        let plan = match &self.plan {
            Some(Ok(plan)) => plan,
            Some(Err(e)) => {
                let text = Paragraph::new(Line::styled(format!("  {}", e), Style::default().fg(Color::Red)))
                    .block(block);
                frame.render_widget(text, area);
                return;
            }
            None => {
                frame.render_widget(Paragraph::new("").block(block), area);
                return;
            }
        };

        let items: Vec<ListItem> = plan
            .operations
            .iter()
            .enumerate()
            .map(|(i, operation)| {
                let (marker, color) = match &self.submission {
                    Submission::Idle => ("·".to_string(), Color::White),
                    Submission::Done => ("✓".to_string(), Color::Green),
                    Submission::Running { index, .. } if i < *index => ("✓".to_string(), Color::Green),
                    Submission::Running { index, .. } if i == *index => {
                        (self.spinner().to_string(), Color::Yellow)
                    }
                    Submission::Failed { index, .. } if i < *index => ("✓".to_string(), Color::Green),
                    Submission::Failed { index, .. } if i == *index => ("✗".to_string(), Color::Red),
                    _ => ("·".to_string(), Color::DarkGray),
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!(" {} ", marker), Style::default().fg(color)),
                    Span::raw(operation.to_string()),
                ]))
            })
            .collect();

        frame.render_widget(List::new(items).block(block), area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let message = match &self.submission {
            Submission::Running { operation, .. } => {
                Line::styled(format!(" {} {}", self.spinner(), operation), Style::default().fg(Color::Yellow))
            }
            Submission::Done => Line::styled(
                " Storage system created. Press Enter to exit.",
                Style::default().fg(Color::Green),
            ),
            Submission::Failed { error, .. } => Line::styled(
                format!(" {}", format_submit_error(error).replace('\n', " ")),
                Style::default().fg(Color::Red),
            ),
            Submission::Idle => match (&self.status, self.wizard.blocking_reason()) {
                (Some(status), _) => Line::styled(format!(" {}", status), Style::default().fg(Color::Red)),
                (None, Some(reason)) => Line::styled(format!(" {}", reason), Style::default().fg(Color::Yellow)),
                (None, None) => Line::raw(""),
            },
        };

        let help = if self.editing.is_some() {
            Line::from(vec![
                Span::raw(" [Enter]").fg(Color::Yellow),
                Span::raw(" save").dim(),
                Span::raw("  "),
                Span::raw("[Esc]").fg(Color::Yellow),
                Span::raw(" cancel").dim(),
            ])
        } else if self.wizard.is_last_step() {
            Line::from(vec![
                Span::raw(" [Enter]").fg(Color::Green),
                Span::raw(" create").dim(),
                Span::raw("  "),
                Span::raw("[p]").fg(Color::Yellow),
                Span::raw(" back").dim(),
                Span::raw("  "),
                Span::raw("[q]").fg(Color::Yellow),
                Span::raw(" quit").dim(),
            ])
        } else {
            Line::from(vec![
                Span::raw(" [↑↓/jk]").fg(Color::Yellow),
                Span::raw(" navigate").dim(),
                Span::raw("  "),
                Span::raw("[Enter]").fg(Color::Yellow),
                Span::raw(" edit").dim(),
                Span::raw("  "),
                Span::raw("[n/p]").fg(if self.wizard.can_go_next() {
                    Color::Green
                } else {
                    Color::DarkGray
                }),
                Span::raw(" next/back").dim(),
                Span::raw("  "),
                Span::raw("[1-9]").fg(Color::Yellow),
                Span::raw(" jump").dim(),
                Span::raw("  "),
                Span::raw("[r]").fg(Color::Yellow),
                Span::raw(" reload").dim(),
                Span::raw("  "),
                Span::raw("[q]").fg(Color::Yellow),
                Span::raw(" quit").dim(),
            ])
        };

        let footer = Paragraph::new(vec![message, help]).block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        frame.render_widget(footer, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use storage_pilot_core::WizardNode;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn component() -> WizardComponent {
        let mut component = WizardComponent::new(PilotConfig::default(), ProviderRegistry::with_builtins());
        component.set_inventory(Ok(Inventory {
            nodes: ["a", "b", "c"]
                .iter()
                .map(|name| WizardNode {
                    name: name.to_string(),
                    cpu: 16.0,
                    memory: 64 << 30,
                    ..Default::default()
                })
                .collect(),
            storage_classes: vec![storage_k8s::StorageClassInfo {
                name: "gp3-csi".to_string(),
                provisioner: "ebs.csi.aws.com".to_string(),
                is_default: true,
            }],
            ..Default::default()
        }));
        component
    }

    #[test]
    fn test_next_is_refused_with_reason() {
        let mut component = component();
        component.handle_key_event(key(KeyCode::Char('n'))).unwrap();
        assert_eq!(component.wizard().current_step().id, 1);
        assert!(component.status.as_deref().unwrap().contains("storage class"));
    }

    #[test]
    fn test_select_storage_class_then_advance() {
        let mut component = component();
        // Backing storage, Deployment, Storage class
        component.handle_key_event(key(KeyCode::Down)).unwrap();
        component.handle_key_event(key(KeyCode::Down)).unwrap();
        component.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert_eq!(component.wizard().state().storage_class.name, "gp3-csi");

        component.handle_key_event(key(KeyCode::Char('n'))).unwrap();
        assert_eq!(
            component.wizard().current_step().name,
            StepName::CapacityAndNodes
        );
        assert_eq!(component.selected_row(), 0);
    }

    #[test]
    fn test_text_edit_commits_on_enter_and_cancels_on_esc() {
        let mut component = component();
        component.wizard.dispatch(storage_pilot_core::Action::UseExternalPostgres(true));
        let username = component
            .rows()
            .iter()
            .position(|r| r.label == "  Username")
            .unwrap();
        component.table_state.select(Some(username));

        component.handle_key_event(key(KeyCode::Enter)).unwrap();
        for c in "noobaa".chars() {
            component.handle_key_event(key(KeyCode::Char(c))).unwrap();
        }
        component.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert_eq!(
            component.wizard().state().backing_storage.external_postgres.username,
            "noobaa"
        );

        component.handle_key_event(key(KeyCode::Enter)).unwrap();
        component.handle_key_event(key(KeyCode::Char('x'))).unwrap();
        component.handle_key_event(key(KeyCode::Esc)).unwrap();
        assert!(component.editing.is_none());
        assert_eq!(
            component.wizard().state().backing_storage.external_postgres.username,
            "noobaa"
        );
    }

    #[test]
    fn test_quit_while_idle() {
        let mut component = component();
        let action = component.handle_key_event(key(KeyCode::Char('q'))).unwrap();
        assert_eq!(action, Some(Action::Quit));
    }

    #[test]
    fn test_failed_submission_keeps_failing_index() {
        let mut component = component();
        component.set_progress(2, "create StorageCluster/ocs-storagecluster".to_string());
        component.set_submit_result(Err((2, "already exists".to_string())));
        assert_eq!(
            component.submission(),
            &Submission::Failed {
                index: 2,
                error: "already exists".to_string()
            }
        );
        // Navigation is frozen once submission started
        component.handle_key_event(key(KeyCode::Char('p'))).unwrap();
        assert_eq!(component.wizard().current_step().id, 1);
    }

    #[test]
    fn test_format_submit_error_adds_hints() {
        assert!(format_submit_error("storageclusters \"x\" already exists").contains("previous attempt"));
        assert_eq!(format_submit_error("boom"), "boom");
    }
}
