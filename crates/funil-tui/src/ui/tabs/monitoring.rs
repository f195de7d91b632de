use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use funil_core::utils::{format_date, truncate_string};

use crate::app::{App, Focus};
use crate::ui::styles;

use super::detail_line;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_visitor_list(frame, app, chunks[0]);
    render_visitor_detail(frame, app, chunks[1]);
}

fn render_visitor_list(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new([
        Cell::from(""),
        Cell::from("IP"),
        Cell::from("Etapa"),
        Cell::from("Origem"),
        Cell::from("Tempo"),
        Cell::from("Eventos"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = app
        .visitors
        .iter()
        .enumerate()
        .map(|(i, visitor)| {
            let style = if i == app.visitor_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            let online = if visitor.is_online {
                Cell::from("●").style(styles::success_style())
            } else {
                Cell::from("○").style(styles::muted_style())
            };

            Row::new(vec![
                online,
                Cell::from(visitor.ip_address.clone().unwrap_or_else(|| "-".to_string())),
                Cell::from(visitor.step_display().to_string()),
                Cell::from(visitor.utm_source.clone().unwrap_or_else(|| "direto".to_string())),
                Cell::from(visitor.time_on_site_display()),
                Cell::from(visitor.events_count.to_string()),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(1),
        Constraint::Length(15),
        Constraint::Fill(1),
        Constraint::Length(12),
        Constraint::Length(8),
        Constraint::Length(7),
    ];

    let online = app.visitors.iter().filter(|v| v.is_online).count();
    let title = format!(" Visitantes ({}, {} online) ", app.visitors.len(), online);

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(app.focus == Focus::List)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !app.visitors.is_empty() {
        state.select(Some(app.visitor_selection));
    }

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_visitor_detail(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![];

    match app.selected_visitor() {
        Some(visitor) => {
            lines.push(Line::from(Span::styled(
                format!("Visitante #{}", visitor.id),
                styles::title_style(),
            )));
            lines.push(Line::from(""));
            lines.push(detail_line(
                "UTM:",
                visitor.utm_display().unwrap_or_else(|| "-".to_string()),
            ));
            lines.push(detail_line("Primeira visita:", format_date(visitor.first_visit)));
            lines.push(detail_line("Última ação:", format_date(visitor.last_activity)));
            if let Some(ref agent) = visitor.user_agent {
                lines.push(detail_line("Navegador:", truncate_string(agent, 40)));
            }
            lines.push(Line::from(""));

            match app.visitor_events.as_ref() {
                Some((id, events)) if *id == visitor.id => {
                    lines.push(Line::from(Span::styled(
                        format!("Eventos ({})", events.len()),
                        styles::highlight_style(),
                    )));
                    for event in events {
                        lines.push(Line::from(vec![
                            Span::styled(format_date(event.created_at), styles::muted_style()),
                            Span::raw("  "),
                            Span::raw(event.event_type.clone()),
                            Span::styled(
                                event
                                    .step_name
                                    .as_ref()
                                    .map(|s| format!(" ({})", s))
                                    .unwrap_or_default(),
                                styles::muted_style(),
                            ),
                        ]));
                    }
                }
                _ => lines.push(Line::from(Span::styled(
                    "Pressione Enter para ver os eventos",
                    styles::muted_style(),
                ))),
            }
        }
        None => lines.push(Line::from(Span::styled(
            "Nenhum visitante registrado",
            styles::muted_style(),
        ))),
    }

    let block = Block::default()
        .title(" Jornada ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(app.focus == Focus::Detail));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
