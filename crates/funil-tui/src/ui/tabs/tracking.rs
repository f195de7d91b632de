use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::Span,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::{App, Focus};
use crate::ui::styles;

use super::render_funnel_picker;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);

    let loaded = app.pixels.as_ref().map(|(id, _)| *id);
    render_funnel_picker(frame, app, chunks[0], app.focus == Focus::List, loaded);
    render_pixels(frame, app, chunks[1]);
}

fn render_pixels(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Detail;
    let block = Block::default()
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    let Some((_, pixels)) = app.pixels.as_ref() else {
        let hint = Paragraph::new(Span::styled(
            "Selecione um funil e pressione Enter",
            styles::muted_style(),
        ))
        .block(block.title(" Pixels "));
        frame.render_widget(hint, area);
        return;
    };

    let header = Row::new([
        Cell::from("Plataforma"),
        Cell::from("Pixel ID"),
        Cell::from("Evento"),
        Cell::from("Escopo"),
        Cell::from("Status"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = pixels
        .iter()
        .enumerate()
        .map(|(i, pixel)| {
            let style = if focused && i == app.pixel_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            let status = if pixel.is_active { "Ativo" } else { "Pausado" };

            Row::new(vec![
                Cell::from(pixel.platform_label()),
                Cell::from(pixel.pixel_id.clone()),
                Cell::from(pixel.event_name.clone().unwrap_or_else(|| "-".to_string())),
                Cell::from(pixel.scope_display()),
                Cell::from(status).style(styles::badge_style(pixel.is_active)),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(11),
        Constraint::Fill(1),
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Length(8),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block.title(format!(" Pixels ({}) ", pixels.len())))
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if focused && !pixels.is_empty() {
        state.select(Some(app.pixel_selection));
    }

    frame.render_stateful_widget(table, area, &mut state);
}
