//! Per-view rendering, one module per sidebar entry.

pub mod checkout;
pub mod credentials;
pub mod dashboard;
pub mod funnels;
pub mod monitoring;
pub mod tracking;

use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::ui::styles;

/// `Label:    value` line used by the detail panes
pub(crate) fn detail_line(label: &str, value: impl Into<String>) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<18}", label), styles::muted_style()),
        Span::raw(value.into()),
    ])
}

/// Funnel list used as the left pane of the checkout and tracking views.
/// `loaded` marks the funnel whose detail is on the right.
pub(crate) fn render_funnel_picker(
    frame: &mut Frame,
    app: &App,
    area: Rect,
    focused: bool,
    loaded: Option<i64>,
) {
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
            let marker = if loaded == Some(funnel.id) { "●" } else { " " };
            Row::new(vec![
                Cell::from(marker).style(styles::highlight_style()),
                Cell::from(funnel.name.as_str()),
                Cell::from(funnel.status_label()).style(styles::badge_style(funnel.is_active)),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(8),
    ];

    let title = format!(" Funis ({}) ", app.funnels.len());
    let table = Table::new(rows, widths)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !app.funnels.is_empty() {
        state.select(Some(app.funnel_selection));
    }

    frame.render_stateful_widget(table, area, &mut state);
}
