use crate::app_state::{App, FocusArea, InputMode, ViewMode, MENU_ITEMS};
use crate::catalog::Plan;
use crate::compare::{format_price, plan_includes_clinic, AttributeCatalog};
use chrono::{Local, TimeZone};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, Paragraph, Row, Table},
    Frame,
};

pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Min(8),
        ])
        .split(f.size());

    render_top_bar(f, chunks[0], app);

    let middle_chunks = Layout::default()
        .direction(ratatui::layout::Direction::Horizontal)
        .constraints([Constraint::Length(20), Constraint::Min(0)])
        .split(chunks[1]);

    render_left_menu(f, middle_chunks[0], app);
    render_main_view(f, middle_chunks[1], app);
    render_bottom_bar(f, chunks[2], app);
}

fn focus_style(app: &App) -> Style {
    if app.focus_area == FocusArea::MainView {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::White)
    }
}

fn render_top_bar(f: &mut Frame, area: Rect, app: &App) {
    let title = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Cyan));

    let mut spans = vec![
        Span::styled(
            " Comparador de prepagas ",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            " - {} planes, {} en comparación",
            app.plans.len(),
            app.comparison.len()
        )),
    ];
    if let Some(code) = &app.quote_code {
        spans.push(Span::styled(
            format!("  [cotización {}]", code),
            Style::default().fg(Color::Yellow),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .block(title)
        .alignment(ratatui::layout::Alignment::Center);
    f.render_widget(paragraph, area);
}

fn render_left_menu(f: &mut Frame, area: Rect, app: &App) {
    let active_index = match app.view_mode {
        ViewMode::Results => 0,
        ViewMode::Comparison => 1,
        ViewMode::Cartilla => 2,
        ViewMode::History => 3,
    };
    let menu_items: Vec<ListItem> = MENU_ITEMS
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let is_selected = i == app.menu_selected_index;
            let is_active = i == active_index;

            let style = if is_selected {
                if app.focus_area == FocusArea::Menu {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Magenta)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD)
                }
            } else if is_active {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };

            let prefix = if is_active { "● " } else { "○ " };
            ListItem::new(format!("{}{}", prefix, text)).style(style)
        })
        .collect();

    let title = if app.focus_area == FocusArea::Menu {
        "Menú (Enter)"
    } else {
        "Menú (←)"
    };

    let menu =
        List::new(menu_items).block(Block::default().borders(Borders::ALL).title(title).style(
            if app.focus_area == FocusArea::Menu {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::White)
            },
        ));
    f.render_widget(menu, area);
}

fn render_main_view(f: &mut Frame, area: Rect, app: &mut App) {
    match app.view_mode {
        ViewMode::Results => render_results(f, area, app),
        ViewMode::Comparison => render_comparison(f, area, app),
        ViewMode::Cartilla => render_cartilla(f, area, app),
        ViewMode::History => render_history(f, area, app),
    }
}

fn render_results(f: &mut Frame, area: Rect, app: &mut App) {
    let items: Vec<ListItem> = app
        .results
        .iter()
        .map(|plan| {
            let in_compare = app.comparison.contains(&plan.id);
            let mark = if in_compare {
                Span::styled("[x] ", Style::default().fg(Color::Green))
            } else {
                Span::raw("[ ] ")
            };
            let content = Line::from(vec![
                mark,
                Span::styled(
                    format!("{:>12} ", format_price(plan.price)),
                    Style::default().fg(Color::Yellow),
                ),
                Span::styled(format!("★{:.1} ", plan.rating), Style::default().fg(Color::Cyan)),
                Span::styled(
                    format!("{:<16}", plan.provider),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(plan_label(plan)),
            ]);
            ListItem::new(content)
        })
        .collect();

    let (lo, hi) = app.filter.price_range;
    let mut facets = format!("precio {}–{}", format_price(lo), format_price(hi));
    if !app.filter.providers.is_empty() {
        let names: Vec<&str> = app.filter.providers.iter().map(|s| s.as_str()).collect();
        facets.push_str(&format!(", prestador {}", names.join("/")));
    }
    if app.filter.min_rating > 0.0 {
        facets.push_str(&format!(", ★≥{:.1}", app.filter.min_rating));
    }
    if !app.filter.clinics.is_empty() {
        facets.push_str(&format!(", {} clínicas", app.filter.clinics.len()));
    }

    let title = if app.focus_area == FocusArea::MainView {
        format!(
            "Resultados {}/{} [{}] [orden: {}] (espacio comparar, s orden, c ver comparación)",
            app.results.len(),
            app.plans.len(),
            facets,
            app.sort.as_str()
        )
    } else {
        format!(
            "Resultados {}/{} [{}] [orden: {}]",
            app.results.len(),
            app.plans.len(),
            facets,
            app.sort.as_str()
        )
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .style(focus_style(app)),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");
    app.results_state.select(Some(app.selected_index));
    f.render_stateful_widget(list, area, &mut app.results_state);
}

fn plan_label(plan: &Plan) -> String {
    match (plan.name.is_empty(), plan.line.is_empty()) {
        (false, false) => format!("{} · {}", plan.name, plan.line),
        (false, true) => plan.name.clone(),
        (true, false) => plan.line.clone(),
        (true, true) => plan.id.clone(),
    }
}

fn yes_no(b: bool) -> String {
    let s = if b { "Sí" } else { "No" };
    s.to_string()
}

fn render_comparison(f: &mut Frame, area: Rect, app: &App) {
    let plans = app.compared_plans();
    let catalog = AttributeCatalog::build(&plans);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(
            "Comparación ({} planes, {} atributos) (↑↓ desplazar, e exportar PDF, x volver)",
            plans.len(),
            catalog.attribute_count()
        ))
        .style(focus_style(app));

    if plans.len() < 2 {
        let hint = Paragraph::new(vec![
            Line::from("Elegí entre 2 y 4 planes en Resultados (espacio) para compararlos."),
            Line::from(format!("Seleccionados: {}", app.comparison.ids().join(", "))),
        ])
        .block(block);
        f.render_widget(hint, area);
        return;
    }

    let header = Row::new(
        std::iter::once(Cell::from(""))
            .chain(plans.iter().map(|p| Cell::from(p.provider.clone())))
            .collect::<Vec<_>>(),
    )
    .style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let mut rows: Vec<Row> = Vec::new();
    let summary: [(&str, fn(&Plan) -> String); 5] = [
        ("Plan", plan_label),
        ("Precio", |p| format_price(p.price)),
        ("Calificación", |p| format!("{:.1}", p.rating)),
        ("Copagos", |p| yes_no(p.copays)),
        ("Habitación individual", |p| yes_no(p.private_room)),
    ];
    for (label, cell) in summary {
        rows.push(Row::new(
            std::iter::once(Cell::from(label))
                .chain(plans.iter().map(|p| Cell::from(cell(p))))
                .collect::<Vec<_>>(),
        ));
    }

    let mut current_group: Option<String> = None;
    for row in catalog.rows(&plans) {
        if current_group.as_deref() != Some(row.group.as_str()) {
            rows.push(
                Row::new(vec![Cell::from(row.group.clone())]).style(
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD),
                ),
            );
            current_group = Some(row.group.clone());
        }
        rows.push(Row::new(
            std::iter::once(Cell::from(format!("  {}", row.name)))
                .chain(row.values.into_iter().map(Cell::from))
                .collect::<Vec<_>>(),
        ));
    }

    let visible: Vec<Row> = rows.into_iter().skip(app.detail_scroll as usize).collect();
    let mut widths = vec![Constraint::Length(26)];
    widths.extend(plans.iter().map(|_| Constraint::Min(14)));
    let table = Table::new(visible, widths).header(header).block(block);
    f.render_widget(table, area);
}

fn render_cartilla(f: &mut Frame, area: Rect, app: &App) {
    let plans = app.compared_plans();
    let roster = app.roster();
    let region_label = app.region.as_deref().unwrap_or("todas");
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(
            "Cartilla [{}] región: {} (r cambiar región, ↑↓ desplazar)",
            roster.len(),
            region_label
        ))
        .style(focus_style(app));

    if roster.is_empty() {
        let p = Paragraph::new("Los planes en comparación no informan clínicas.").block(block);
        f.render_widget(p, area);
        return;
    }

    let clinics = match app.region.as_deref() {
        Some(region) => roster.clinics_by_region(region),
        None => roster.clinics().iter().collect(),
    };

    let mut lines = Vec::new();
    if let Some(region) = app.region.as_deref() {
        let barrios = roster.barrios(region);
        if !barrios.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("Barrios: {}", barrios.join(", ")),
                Style::default().fg(Color::DarkGray),
            )));
        }
    } else if !roster.regions().is_empty() {
        lines.push(Line::from(Span::styled(
            format!("Regiones: {}", roster.regions().join(", ")),
            Style::default().fg(Color::DarkGray),
        )));
    }

    for clinic in clinics {
        let mut spans = vec![Span::styled(
            format!("{:<32}", clinic.entity),
            Style::default().add_modifier(Modifier::BOLD),
        )];
        for plan in &plans {
            let (mark, color) = if plan_includes_clinic(plan, &clinic.id) {
                ("✓", Color::Green)
            } else {
                ("–", Color::DarkGray)
            };
            spans.push(Span::styled(
                format!(" {} {:<10}", mark, plan.provider),
                Style::default().fg(color),
            ));
        }
        lines.push(Line::from(spans));

        let places: Vec<String> = clinic
            .locations
            .iter()
            .filter(|u| app.region.as_deref().map_or(true, |r| u.region == r))
            .map(|u| {
                if u.barrio.is_empty() {
                    u.region.clone()
                } else {
                    format!("{}, {}", u.barrio, u.region)
                }
            })
            .collect();
        if !places.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("    {}", places.join(" / ")),
                Style::default().fg(Color::Gray),
            )));
        }
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((app.detail_scroll, 0));
    f.render_widget(paragraph, area);
}

fn render_history(f: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .history
        .iter()
        .map(|h| {
            let when = Local
                .timestamp_opt(h.created_at, 0)
                .single()
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string());
            let who = h
                .form
                .as_ref()
                .map(|form| format!("{:?}, {} años", form.group, form.age))
                .unwrap_or_else(|| "(formulario ilegible)".to_string());
            let is_current = app.quote_code.as_deref() == Some(h.code.as_str());
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{} ", h.code),
                    if is_current {
                        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(Color::Yellow)
                    },
                ),
                Span::raw(format!("{}  {:>3} planes  {}", when, h.plan_count, who)),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(
                "Historial de cotizaciones ({}) (/history <código> detalle, /session new limpia)",
                app.history.len()
            ))
            .style(focus_style(app)),
    );
    f.render_widget(list, area);
}

fn render_bottom_bar(f: &mut Frame, area: Rect, app: &App) {
    let bottom_chunks = Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);

    let command_prompt = if app.input_mode == InputMode::Command {
        let mut spans = vec![Span::styled(
            "Comando: ",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )];
        let cur = app.command_cursor.min(app.command_input.len());
        let (left, right) = app.command_input.split_at(cur);
        spans.push(Span::raw(left));
        spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(right));

        if let Some(hint) = app.get_completion_hint() {
            spans.push(Span::styled(hint, Style::default().fg(Color::DarkGray)));
        }

        vec![
            Line::from(spans),
            Line::from("Enter ejecutar  Esc cancelar  Tab completar  ↑↓ historial"),
        ]
    } else {
        vec![
            Line::from(vec![
                Span::styled("Comando: ", Style::default().fg(Color::Yellow)),
                Span::raw("(/ para escribir un comando, /help para la lista)"),
            ]),
            Line::from("←→ foco  ↑↓ navegar  espacio comparar  s orden  c comparar  e PDF  x volver  q salir"),
        ]
    };
    let command_paragraph = Paragraph::new(command_prompt).block(
        Block::default()
            .borders(Borders::ALL)
            .title(if app.input_mode == InputMode::Command {
                "Modo comando"
            } else {
                "Comando"
            })
            .style(if app.input_mode == InputMode::Command {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::White)
            }),
    );
    f.render_widget(command_paragraph, bottom_chunks[0]);

    let log_items: Vec<ListItem> = app
        .log_messages
        .iter()
        .rev()
        .take(20)
        .map(|msg| {
            let style = if msg.starts_with("✓") {
                Style::default().fg(Color::Green)
            } else if msg.starts_with("✗") {
                Style::default().fg(Color::Red)
            } else if msg.starts_with("⚠") {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(msg.as_str()).style(style)
        })
        .collect();

    let log = List::new(log_items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Registro ({})", app.log_messages.len()))
            .style(Style::default().fg(Color::White)),
    );
    f.render_widget(log, bottom_chunks[1]);
}
