use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use funil_core::utils::{format_count, format_date};

use crate::app::App;
use crate::ui::styles;

use super::detail_line;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    render_funnel_list(frame, app, chunks[0]);
    render_funnel_detail(frame, app, chunks[1]);
}

fn render_funnel_list(frame: &mut Frame, app: &App, area: Rect) {
    let header_cells = [
        Cell::from("Nome"),
        Cell::from("Status"),
        Cell::from("Visitantes"),
        Cell::from("Conversões"),
        Cell::from("Taxa"),
    ];
    let header = Row::new(header_cells)
        .style(styles::title_style())
        .height(1);

    let rows: Vec<Row> = app
        .funnels
        .iter()
        .enumerate()
        .map(|(i, funnel)| {
            let style = if i == app.funnel_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };

            Row::new(vec![
                Cell::from(funnel.name.as_str()),
                Cell::from(funnel.status_label()).style(styles::badge_style(funnel.is_active)),
                Cell::from(format_count(funnel.total_visitors)),
                Cell::from(format_count(funnel.total_conversions)),
                Cell::from(funnel.conversion_rate_display()),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Fill(1),
        Constraint::Length(8),
        Constraint::Length(11),
        Constraint::Length(11),
        Constraint::Length(7),
    ];

    let title = format!(" Funis ({}) ", app.funnels.len());

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !app.funnels.is_empty() {
        state.select(Some(app.funnel_selection));
    }

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_funnel_detail(frame: &mut Frame, app: &App, area: Rect) {
    let content = match app.selected_funnel() {
        Some(funnel) => {
            let mut lines = vec![
                Line::from(Span::styled(funnel.name.clone(), styles::title_style())),
                Line::from(Span::styled(
                    funnel.status_label(),
                    styles::badge_style(funnel.is_active),
                )),
                Line::from(""),
                detail_line("Slug:", funnel.slug.clone().unwrap_or_else(|| "-".to_string())),
                detail_line("Nicho:", funnel.niche.clone().unwrap_or_else(|| "-".to_string())),
                detail_line(
                    "Etapas:",
                    format!("{} ({} ativas)", funnel.steps_count, funnel.active_steps_count),
                ),
                detail_line("Criado em:", format_date(funnel.created_at)),
                detail_line("Atualizado em:", format_date(funnel.updated_at)),
                Line::from(""),
            ];
            let description_style = if funnel.description_display() == "Sem descrição" {
                styles::muted_style()
            } else {
                styles::list_item_style()
            };
            lines.push(Line::from(Span::styled(
                funnel.description_display().to_string(),
                description_style,
            )));
            lines
        }
        None => vec![Line::from(Span::styled(
            "Nenhum funil cadastrado",
            styles::muted_style(),
        ))],
    };

    let block = Block::default()
        .title(" Detalhes ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}
