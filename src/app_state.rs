use crate::catalog::{apply_filters, price_bounds, providers, sort_plans, FilterState, Plan, SortKey};
use crate::commands::{AppCommand, USAGE};
use crate::compare::store::RestoredComparison;
use crate::compare::{ClinicRoster, ComparisonRenderer, ComparisonSet, MAX_COMPARE};
use crate::remote::RequestTracker;
use crate::storage::repository::QuoteSummary;
use crossterm::event::KeyCode;
use ratatui::widgets::ListState;
use std::str::FromStr;
use tokio::sync::mpsc;

pub const MENU_ITEMS: [&str; 4] = ["Resultados", "Comparar", "Cartilla", "Historial"];

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum ViewMode {
    Results,
    Comparison,
    Cartilla,
    History,
}

impl ViewMode {
    fn from_menu(idx: usize) -> Self {
        match idx {
            1 => ViewMode::Comparison,
            2 => ViewMode::Cartilla,
            3 => ViewMode::History,
            _ => ViewMode::Results,
        }
    }

    fn menu_index(self) -> usize {
        match self {
            ViewMode::Results => 0,
            ViewMode::Comparison => 1,
            ViewMode::Cartilla => 2,
            ViewMode::History => 3,
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum InputMode {
    Normal,
    Command,
}

#[derive(PartialEq, Debug, Clone)]
pub enum FocusArea {
    Menu,
    MainView,
}

#[derive(Debug)]
pub enum AppEvent {
    Log(String),
    Message(String),
    Error(String),
    Plans {
        generation: u64,
        plans: Vec<Plan>,
        code: Option<String>,
        message: Option<String>,
    },
    Restored {
        comparison: RestoredComparison,
        code: Option<String>,
    },
    History(Vec<QuoteSummary>),
}

pub struct App {
    pub view_mode: ViewMode,
    pub input_mode: InputMode,
    pub focus_area: FocusArea,
    pub menu_selected_index: usize,
    /// Repositorio: última respuesta del cotizador
    pub plans: Vec<Plan>,
    /// Resultado de filtros + orden
    pub results: Vec<Plan>,
    pub filter: FilterState,
    pub sort: SortKey,
    pub comparison: ComparisonSet,
    pub region: Option<String>,
    pub quote_code: Option<String>,
    pub history: Vec<QuoteSummary>,
    pub selected_index: usize,
    pub results_state: ListState,
    pub detail_scroll: u16,
    pub command_input: String,
    pub command_cursor: usize,
    pub command_history: Vec<String>,
    pub command_history_index: Option<usize>,
    pub log_messages: Vec<String>,
    pub tracker: RequestTracker,
    pub cmd_tx: mpsc::UnboundedSender<AppCommand>,
    pub evt_rx: Option<mpsc::UnboundedReceiver<AppEvent>>,
}

impl App {
    pub fn new(
        startup_info: Vec<String>,
        tracker: RequestTracker,
        cmd_tx: mpsc::UnboundedSender<AppCommand>,
        evt_rx: mpsc::UnboundedReceiver<AppEvent>,
    ) -> App {
        let mut log_messages = vec!["aplicación iniciada".to_string()];
        log_messages.extend(startup_info);

        App {
            view_mode: ViewMode::Results,
            input_mode: InputMode::Normal,
            focus_area: FocusArea::Menu,
            menu_selected_index: 0,
            plans: Vec::new(),
            results: Vec::new(),
            filter: FilterState::default(),
            sort: SortKey::Default,
            comparison: ComparisonSet::new(),
            region: None,
            quote_code: None,
            history: Vec::new(),
            selected_index: 0,
            results_state: {
                let mut s = ListState::default();
                s.select(Some(0));
                s
            },
            detail_scroll: 0,
            command_input: String::new(),
            command_cursor: 0,
            command_history: Vec::new(),
            command_history_index: None,
            log_messages,
            tracker,
            cmd_tx,
            evt_rx: Some(evt_rx),
        }
    }

    pub fn add_log(&mut self, msg: String) {
        self.log_messages.push(msg);
    }

    pub fn get_completion_hint(&self) -> Option<String> {
        let commands = [
            "quote", "filter", "sort", "compare", "region", "export", "history", "session", "help",
            "quit",
        ];
        let input = self.command_input.trim_start();
        if input.is_empty() {
            return None;
        }

        let parts: Vec<&str> = input.split_whitespace().collect();
        let subs: &[&str] = match parts[0] {
            "quote" => &["recover"],
            "filter" => &["price", "provider", "rating", "clinic", "clear"],
            "sort" => &["default", "price-asc", "price-desc", "name-asc"],
            "compare" => &["add", "remove", "toggle", "clear"],
            "session" => &["new"],
            _ => &[],
        };

        if parts.len() == 1 && !input.ends_with(' ') {
            return commands
                .iter()
                .find(|c| c.starts_with(parts[0]) && **c != parts[0])
                .map(|c| c[parts[0].len()..].to_string());
        }
        let cur = if parts.len() == 1 { "" } else { parts[1] };
        if parts.len() > 2 {
            return None;
        }
        subs.iter()
            .find(|s| s.starts_with(cur) && **s != cur)
            .map(|s| s[cur.len()..].to_string())
    }

    /// Reemplaza el repositorio. Los filtros vuelven al rango observado y la
    /// selección pierde los ids que ya no existen.
    pub fn set_plans(&mut self, plans: Vec<Plan>) {
        self.plans = plans;
        self.filter.reset(price_bounds(&self.plans));
        if self.comparison.retain_known(&self.plans) {
            self.persist_selection();
        }
        self.selected_index = 0;
        self.apply_filters();
    }

    pub fn apply_filters(&mut self) {
        let filtered = apply_filters(&self.plans, &self.filter);
        self.results = sort_plans(&filtered, self.sort)
            .into_iter()
            .cloned()
            .collect();
        self.clamp_selection();
    }

    pub fn clamp_selection(&mut self) {
        if self.selected_index >= self.results.len() {
            self.selected_index = self.results.len().saturating_sub(1);
        }
        self.results_state.select(Some(self.selected_index));
    }

    pub fn compared_plans(&self) -> Vec<&Plan> {
        self.comparison.selected(&self.plans)
    }

    pub fn roster(&self) -> ClinicRoster {
        ClinicRoster::build(&self.compared_plans())
    }

    fn persist_selection(&self) {
        let _ = self
            .cmd_tx
            .send(AppCommand::PersistSelection(self.comparison.ids().to_vec()));
    }

    fn compare_add(&mut self, id: &str) {
        if !self.plans.iter().any(|p| p.id == id) {
            self.add_log(format!("no existe el plan {}", id));
        } else if self.comparison.contains(id) {
            self.add_log(format!("{} ya está en la comparación", id));
        } else if self.comparison.is_full() {
            self.add_log(format!("se pueden comparar hasta {} planes", MAX_COMPARE));
        } else if self.comparison.add(id) {
            self.persist_selection();
        }
    }

    fn compare_remove(&mut self, id: &str) {
        if self.comparison.remove(id) {
            self.persist_selection();
        }
    }

    /// Agrega o quita el plan marcado en la grilla de resultados
    pub fn toggle_selected(&mut self) {
        let Some(id) = self.results.get(self.selected_index).map(|p| p.id.clone()) else {
            return;
        };
        if self.comparison.contains(&id) {
            self.compare_remove(&id);
        } else {
            self.compare_add(&id);
        }
    }

    /// Vuelve al estado de arranque: sin planes, filtros, selección ni
    /// código. Las respuestas en vuelo quedan viejas.
    fn reset_session(&mut self) {
        self.tracker.begin();
        self.plans.clear();
        self.filter = FilterState::default();
        self.comparison = ComparisonSet::new();
        self.region = None;
        self.quote_code = None;
        self.detail_scroll = 0;
        self.selected_index = 0;
        self.apply_filters();
        self.add_log("sesión nueva: se descartó la comparación guardada".to_string());
    }

    /// Pasa a la siguiente región de la cartilla (todas → r1 → r2 → todas)
    pub fn cycle_region(&mut self) {
        let regions = self.roster().regions().to_vec();
        self.region = match &self.region {
            None => regions.first().cloned(),
            Some(cur) => regions
                .iter()
                .position(|r| r == cur)
                .and_then(|i| regions.get(i + 1).cloned()),
        };
    }

    pub fn export_command(&self, path: Option<std::path::PathBuf>) -> Option<AppCommand> {
        let plans = self.compared_plans();
        if plans.len() < 2 {
            return None;
        }
        let title = match &self.quote_code {
            Some(code) => format!("Comparación de planes (cotización {})", code),
            None => "Comparación de planes".to_string(),
        };
        let html = ComparisonRenderer::new(plans)
            .title(title)
            .region(self.region.clone())
            .render();
        Some(AppCommand::RenderPdf { html, path })
    }

    /// Ejecuta un comando ya parseado. Devuelve true si hay que salir.
    pub fn dispatch(&mut self, cmd: AppCommand) -> bool {
        if !cmd.is_local() {
            if let AppCommand::Unknown(msg) = &cmd {
                self.add_log(msg.clone());
            } else if cmd == AppCommand::Help {
                self.add_log(USAGE.to_string());
            } else if cmd == AppCommand::SessionNew {
                self.reset_session();
                let _ = self.cmd_tx.send(cmd);
            } else {
                let _ = self.cmd_tx.send(cmd);
            }
            return false;
        }

        match cmd {
            AppCommand::FilterPrice { lo, hi } => {
                self.filter.set_price_range(lo, hi);
                self.apply_filters();
            }
            AppCommand::FilterProvider(names) => {
                let known = providers(&self.plans);
                self.filter.providers = names
                    .into_iter()
                    .map(|n| {
                        known
                            .iter()
                            .find(|k| k.to_lowercase() == n.to_lowercase())
                            .cloned()
                            .unwrap_or(n)
                    })
                    .collect();
                self.apply_filters();
            }
            AppCommand::FilterRating(n) => {
                self.filter.min_rating = n;
                self.apply_filters();
            }
            AppCommand::FilterClinic(ids) => {
                self.filter.clinics = ids.into_iter().collect();
                self.apply_filters();
            }
            AppCommand::FilterClear => {
                self.filter.reset(price_bounds(&self.plans));
                self.apply_filters();
            }
            AppCommand::Sort(key) => {
                self.sort = key;
                self.add_log(format!("orden: {}", key.as_str()));
                self.apply_filters();
            }
            AppCommand::CompareAdd(id) => self.compare_add(&id),
            AppCommand::CompareRemove(id) => self.compare_remove(&id),
            AppCommand::CompareToggle(id) => {
                if self.comparison.contains(&id) {
                    self.compare_remove(&id);
                } else {
                    self.compare_add(&id);
                }
            }
            AppCommand::CompareClear => {
                if self.comparison.clear() {
                    self.persist_selection();
                }
            }
            AppCommand::Region(region) => {
                if let Some(r) = &region {
                    if !self.roster().regions().iter().any(|x| x == r) {
                        self.add_log(format!("ningún plan comparado tiene clínicas en {}", r));
                    }
                }
                self.region = region;
            }
            AppCommand::Export { path } => match self.export_command(path) {
                Some(cmd) => {
                    let _ = self.cmd_tx.send(cmd);
                }
                None => self.add_log("elegí al menos 2 planes para exportar".to_string()),
            },
            AppCommand::Quit => return true,
            _ => {}
        }
        false
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Log(msg) | AppEvent::Message(msg) | AppEvent::Error(msg) => {
                self.log_messages.push(msg)
            }
            AppEvent::Plans {
                generation,
                plans,
                code,
                message,
            } => {
                if !self.tracker.is_current(generation) {
                    self.add_log(format!("respuesta vieja descartada (#{})", generation));
                    return;
                }
                let n = plans.len();
                self.set_plans(plans);
                if let Some(code) = code {
                    self.add_log(format!("✓ cotización {}: {} planes", code, n));
                    self.quote_code = Some(code);
                }
                if let Some(msg) = message {
                    self.add_log(msg);
                }
                let _ = self.cmd_tx.send(AppCommand::History);
            }
            AppEvent::Restored { comparison, code } => {
                // una cotización que ya llegó gana sobre lo restaurado
                if !self.plans.is_empty() {
                    return;
                }
                self.plans = comparison.plans;
                self.filter.reset(price_bounds(&self.plans));
                self.comparison = comparison.selection;
                self.quote_code = code;
                self.apply_filters();
                if !self.plans.is_empty() {
                    self.add_log(format!(
                        "sesión restaurada: {} planes, {} en comparación",
                        self.plans.len(),
                        self.comparison.len()
                    ));
                }
            }
            AppEvent::History(rows) => {
                self.history = rows;
            }
        }
    }

    fn submit_command_line(&mut self) -> bool {
        let cmd_owned = self.command_input.trim().to_string();
        self.command_input.clear();
        self.command_cursor = 0;
        self.input_mode = InputMode::Normal;
        if cmd_owned.is_empty() {
            return false;
        }

        self.command_history.push(cmd_owned.clone());
        self.command_history_index = None;
        let cmd = AppCommand::from_str(&cmd_owned).unwrap_or(AppCommand::Unknown(cmd_owned));
        self.dispatch(cmd)
    }

    pub fn handle_key_event(&mut self, key: KeyCode) -> bool {
        if self.input_mode == InputMode::Command {
            match key {
                KeyCode::Enter => return self.submit_command_line(),
                KeyCode::Esc => {
                    self.command_input.clear();
                    self.command_cursor = 0;
                    self.input_mode = InputMode::Normal;
                }
                KeyCode::Tab => {
                    if let Some(hint) = self.get_completion_hint() {
                        let insert = format!("{} ", hint);
                        self.command_input.insert_str(self.command_cursor, &insert);
                        self.command_cursor += insert.len();
                    }
                }
                KeyCode::Up => {
                    if self.command_history.is_empty() {
                        return false;
                    }
                    let next = match self.command_history_index {
                        None => self.command_history.len().saturating_sub(1),
                        Some(i) => i.saturating_sub(1),
                    };
                    self.command_history_index = Some(next);
                    if let Some(cmd) = self.command_history.get(next) {
                        self.command_input = cmd.clone();
                        self.command_cursor = self.command_input.len();
                    }
                }
                KeyCode::Down => {
                    let Some(i) = self.command_history_index else {
                        return false;
                    };
                    let next = i + 1;
                    if next >= self.command_history.len() {
                        self.command_history_index = None;
                        self.command_input.clear();
                        self.command_cursor = 0;
                    } else {
                        self.command_history_index = Some(next);
                        self.command_input = self.command_history[next].clone();
                        self.command_cursor = self.command_input.len();
                    }
                }
                KeyCode::Backspace => {
                    if let Some((idx, _)) = self.command_input[..self.command_cursor]
                        .char_indices()
                        .next_back()
                    {
                        self.command_input.remove(idx);
                        self.command_cursor = idx;
                    }
                }
                KeyCode::Delete => {
                    if self.command_cursor < self.command_input.len() {
                        self.command_input.remove(self.command_cursor);
                    }
                }
                KeyCode::Left => {
                    if let Some((idx, _)) = self.command_input[..self.command_cursor]
                        .char_indices()
                        .next_back()
                    {
                        self.command_cursor = idx;
                    }
                }
                KeyCode::Right => {
                    if let Some(c) = self.command_input[self.command_cursor..].chars().next() {
                        self.command_cursor += c.len_utf8();
                    }
                }
                KeyCode::Home => self.command_cursor = 0,
                KeyCode::End => self.command_cursor = self.command_input.len(),
                KeyCode::Char(c) => {
                    self.command_input.insert(self.command_cursor, c);
                    self.command_cursor += c.len_utf8();
                }
                _ => {}
            }
            return false;
        }

        match key {
            KeyCode::Char('/') | KeyCode::Char(':') => {
                self.input_mode = InputMode::Command;
                self.command_input.clear();
                self.command_cursor = 0;
            }
            KeyCode::Char('q') => return true,
            KeyCode::Left => self.focus_area = FocusArea::Menu,
            KeyCode::Right => self.focus_area = FocusArea::MainView,
            KeyCode::Up => {
                if self.focus_area == FocusArea::Menu {
                    self.menu_selected_index = self.menu_selected_index.saturating_sub(1);
                } else if self.view_mode == ViewMode::Results {
                    if self.selected_index > 0 {
                        self.selected_index -= 1;
                    }
                    self.results_state.select(Some(self.selected_index));
                } else {
                    self.detail_scroll = self.detail_scroll.saturating_sub(1);
                }
            }
            KeyCode::Down => {
                if self.focus_area == FocusArea::Menu {
                    if self.menu_selected_index < MENU_ITEMS.len() - 1 {
                        self.menu_selected_index += 1;
                    }
                } else if self.view_mode == ViewMode::Results {
                    if self.selected_index < self.results.len().saturating_sub(1) {
                        self.selected_index += 1;
                    }
                    self.results_state.select(Some(self.selected_index));
                } else {
                    self.detail_scroll = self.detail_scroll.saturating_add(1);
                }
            }
            KeyCode::Enter => {
                if self.focus_area == FocusArea::Menu {
                    self.view_mode = ViewMode::from_menu(self.menu_selected_index);
                    self.detail_scroll = 0;
                    if self.view_mode == ViewMode::History {
                        let _ = self.cmd_tx.send(AppCommand::History);
                    }
                    self.focus_area = FocusArea::MainView;
                } else if self.view_mode == ViewMode::Results {
                    self.toggle_selected();
                }
            }
            KeyCode::Char(' ') => {
                if self.view_mode == ViewMode::Results {
                    self.toggle_selected();
                }
            }
            KeyCode::Char('c') => {
                self.view_mode = ViewMode::Comparison;
                self.menu_selected_index = self.view_mode.menu_index();
                self.detail_scroll = 0;
                self.focus_area = FocusArea::MainView;
            }
            KeyCode::Char('x') => {
                if self.view_mode != ViewMode::Results {
                    self.view_mode = ViewMode::Results;
                    self.menu_selected_index = 0;
                }
            }
            KeyCode::Char('s') => {
                return self.dispatch(AppCommand::Sort(self.sort.next()));
            }
            KeyCode::Char('r') => {
                if self.view_mode == ViewMode::Cartilla {
                    self.cycle_region();
                }
            }
            KeyCode::Char('e') => return self.dispatch(AppCommand::Export { path: None }),
            _ => {}
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::model::Clinica;

    fn app() -> (App, mpsc::UnboundedReceiver<AppCommand>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (_evt_tx, evt_rx) = mpsc::unbounded_channel();
        (App::new(Vec::new(), RequestTracker::new(), cmd_tx, evt_rx), cmd_rx)
    }

    fn plans() -> Vec<Plan> {
        vec![
            Plan::new("A", "OSDE", 1000.0, 4.5)
                .with_clinica(Clinica::new("C1", "Sanatorio Güemes").at("CABA", "Almagro")),
            Plan::new("B", "Galeno", 5000.0, 3.0)
                .with_clinica(Clinica::new("C2", "Clínica Olivos").at("GBA Norte", "Olivos")),
            Plan::new("C", "Swiss Medical", 3000.0, 4.0),
            Plan::new("D", "Omint", 4000.0, 3.5),
            Plan::new("E", "Medifé", 2000.0, 2.0),
        ]
    }

    fn run(app: &mut App, line: &str) -> bool {
        app.dispatch(AppCommand::from_str(line).unwrap())
    }

    fn ids(app: &App) -> Vec<&str> {
        app.results.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn filters_and_sort_drive_the_results() {
        let (mut app, _rx) = app();
        app.set_plans(plans());
        assert_eq!(app.results.len(), 5);

        run(&mut app, "filter price 0 3000");
        run(&mut app, "sort price-desc");
        assert_eq!(ids(&app), ["C", "E", "A"]);

        run(&mut app, "filter provider osde, galeno");
        assert_eq!(ids(&app), ["A"]);

        run(&mut app, "filter clear");
        assert_eq!(app.results.len(), 5);
        assert!(app.filter.is_noop(&app.plans));
    }

    #[test]
    fn comparison_caps_at_four_and_persists() {
        let (mut app, mut rx) = app();
        app.set_plans(plans());
        for id in ["A", "B", "C", "D", "E"] {
            run(&mut app, &format!("compare add {}", id));
        }
        assert_eq!(app.comparison.ids(), ["A", "B", "C", "D"]);

        let mut persisted = Vec::new();
        while let Ok(cmd) = rx.try_recv() {
            if let AppCommand::PersistSelection(ids) = cmd {
                persisted.push(ids);
            }
        }
        assert_eq!(persisted.len(), 4);
        assert_eq!(persisted.last().unwrap().len(), 4);

        run(&mut app, "compare add nope");
        run(&mut app, "compare remove B");
        assert_eq!(app.comparison.ids(), ["A", "C", "D"]);
    }

    #[test]
    fn stale_plans_are_ignored() {
        let (mut app, _rx) = app();
        let old = app.tracker.begin();
        let new = app.tracker.begin();
        app.handle_event(AppEvent::Plans {
            generation: old,
            plans: plans(),
            code: Some("OLD".to_string()),
            message: None,
        });
        assert!(app.plans.is_empty());

        app.handle_event(AppEvent::Plans {
            generation: new,
            plans: plans()[..2].to_vec(),
            code: Some("NEW".to_string()),
            message: None,
        });
        assert_eq!(app.plans.len(), 2);
        assert_eq!(app.quote_code.as_deref(), Some("NEW"));
    }

    #[test]
    fn new_plans_prune_the_selection() {
        let (mut app, mut rx) = app();
        app.set_plans(plans());
        run(&mut app, "compare add A");
        run(&mut app, "compare add E");
        while rx.try_recv().is_ok() {}

        app.set_plans(plans()[..3].to_vec());
        assert_eq!(app.comparison.ids(), ["A"]);
        assert!(matches!(rx.try_recv(), Ok(AppCommand::PersistSelection(ids)) if ids == ["A"]));
    }

    #[test]
    fn export_needs_two_plans() {
        let (mut app, mut rx) = app();
        app.set_plans(plans());
        run(&mut app, "compare add A");
        while rx.try_recv().is_ok() {}
        run(&mut app, "export");
        assert!(rx.try_recv().is_err());

        run(&mut app, "compare add B");
        run(&mut app, "region CABA");
        run(&mut app, "export");
        let mut html = None;
        while let Ok(cmd) = rx.try_recv() {
            if let AppCommand::RenderPdf { html: h, .. } = cmd {
                html = Some(h);
            }
        }
        let html = html.unwrap();
        assert!(html.contains("Sanatorio Güemes"));
        assert!(!html.contains("Clínica Olivos"));
    }

    #[test]
    fn region_cycles_through_the_roster() {
        let (mut app, _rx) = app();
        app.set_plans(plans());
        run(&mut app, "compare add A");
        run(&mut app, "compare add B");
        app.cycle_region();
        assert_eq!(app.region.as_deref(), Some("CABA"));
        app.cycle_region();
        assert_eq!(app.region.as_deref(), Some("GBA Norte"));
        app.cycle_region();
        assert_eq!(app.region, None);
    }

    #[test]
    fn command_line_and_keys() {
        let (mut app, mut rx) = app();
        app.set_plans(plans());
        app.handle_key_event(KeyCode::Char('/'));
        for c in "quote recover".chars() {
            app.handle_key_event(KeyCode::Char(c));
        }
        assert!(!app.handle_key_event(KeyCode::Enter));
        assert_eq!(rx.try_recv().unwrap(), AppCommand::QuoteRecover);
        assert_eq!(app.command_history, ["quote recover"]);

        app.focus_area = FocusArea::MainView;
        app.handle_key_event(KeyCode::Char(' '));
        assert_eq!(app.comparison.ids(), ["A"]);
        app.handle_key_event(KeyCode::Char('s'));
        assert_eq!(app.sort, SortKey::PriceAsc);
        assert!(app.handle_key_event(KeyCode::Char('q')));
    }

    #[test]
    fn completion_hints() {
        let (mut app, _rx) = app();
        app.command_input = "comp".to_string();
        assert_eq!(app.get_completion_hint().as_deref(), Some("are"));
        app.command_input = "filter pri".to_string();
        assert_eq!(app.get_completion_hint().as_deref(), Some("ce"));
        app.command_input = "sort ".to_string();
        assert_eq!(app.get_completion_hint().as_deref(), Some("default"));
    }

    fn restored(ids: &[&str], plans: Vec<Plan>) -> RestoredComparison {
        let mut selection = ComparisonSet::new();
        for id in ids {
            selection.add(*id);
        }
        RestoredComparison { plans, selection }
    }

    #[test]
    fn restored_session_fills_an_empty_app() {
        let (mut app, _rx) = app();
        app.handle_event(AppEvent::Restored {
            comparison: restored(&["B", "D"], plans()),
            code: Some("AB12CD34".to_string()),
        });
        assert_eq!(app.plans.len(), 5);
        assert_eq!(app.results.len(), 5);
        assert_eq!(app.comparison.ids(), ["B", "D"]);
        assert_eq!(app.quote_code.as_deref(), Some("AB12CD34"));
        assert_eq!(app.filter.price_range, (1000.0, 5000.0));
        assert!(app.filter.is_noop(&app.plans));
    }

    #[test]
    fn restored_session_never_overwrites_a_fresh_quote() {
        let (mut app, _rx) = app();
        let gen = app.tracker.begin();
        app.handle_event(AppEvent::Plans {
            generation: gen,
            plans: plans()[..2].to_vec(),
            code: Some("NEW".to_string()),
            message: None,
        });
        app.handle_event(AppEvent::Restored {
            comparison: restored(&["C"], plans()),
            code: Some("OLD".to_string()),
        });
        assert_eq!(app.plans.len(), 2);
        assert!(app.comparison.ids().is_empty());
        assert_eq!(app.quote_code.as_deref(), Some("NEW"));
    }

    #[test]
    fn session_new_resets_and_reaches_the_actor() {
        let (mut app, mut rx) = app();
        let gen = app.tracker.begin();
        app.handle_event(AppEvent::Plans {
            generation: gen,
            plans: plans(),
            code: Some("AB12CD34".to_string()),
            message: None,
        });
        run(&mut app, "compare add A");
        run(&mut app, "filter rating 4");
        while rx.try_recv().is_ok() {}

        run(&mut app, "session new");
        assert!(app.plans.is_empty());
        assert!(app.results.is_empty());
        assert!(app.comparison.ids().is_empty());
        assert!(app.quote_code.is_none());
        assert_eq!(app.filter.min_rating, 0.0);
        assert!(!app.tracker.is_current(gen));
        assert_eq!(rx.try_recv().unwrap(), AppCommand::SessionNew);

        // una respuesta pedida antes de la sesión nueva no vuelve a cargar planes
        app.handle_event(AppEvent::Plans {
            generation: gen,
            plans: plans(),
            code: Some("AB12CD34".to_string()),
            message: None,
        });
        assert!(app.plans.is_empty());
    }

    #[test]
    fn export_title_carries_the_quote_code() {
        let (mut app, mut rx) = app();
        let gen = app.tracker.begin();
        app.handle_event(AppEvent::Plans {
            generation: gen,
            plans: plans(),
            code: Some("AB12CD34".to_string()),
            message: None,
        });
        run(&mut app, "compare add A");
        run(&mut app, "compare add C");
        match app.export_command(None) {
            Some(AppCommand::RenderPdf { html, .. }) => {
                assert!(html.contains("<h1>Comparación de planes (cotización AB12CD34)</h1>"));
            }
            other => panic!("unexpected command {:?}", other),
        }
        while rx.try_recv().is_ok() {}
        app.command_input = "sess".to_string();
        assert_eq!(app.get_completion_hint().as_deref(), Some("ion"));
    }
}
