use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use funil_core::utils::format_date;

use crate::app::App;
use crate::ui::styles;

use super::detail_line;

/// Characters of an API key shown before it is masked
const KEY_PREFIX_LEN: usize = 8;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    render_credential_list(frame, app, chunks[0]);
    render_credential_detail(frame, app, chunks[1]);
}

fn render_credential_list(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new([
        Cell::from("Nome"),
        Cell::from("Tipo"),
        Cell::from("Atualizada"),
        Cell::from("Status"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = app
        .credentials
        .iter()
        .enumerate()
        .map(|(i, credential)| {
            let style = if i == app.credential_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };

            Row::new(vec![
                Cell::from(credential.name.as_str()),
                Cell::from(credential.kind.as_str()),
                Cell::from(credential.updated_display()),
                Cell::from(credential.status_label())
                    .style(styles::badge_style(credential.is_active)),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Fill(1),
        Constraint::Length(12),
        Constraint::Length(11),
        Constraint::Length(8),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(format!(" Credenciais ({}) ", app.credentials.len()))
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !app.credentials.is_empty() {
        state.select(Some(app.credential_selection));
    }

    frame.render_stateful_widget(table, area, &mut state);
}

/// Show at most half of a key, capped at `KEY_PREFIX_LEN` characters
fn mask_key(key: Option<&str>) -> String {
    match key {
        Some(key) if !key.is_empty() => {
            let shown = KEY_PREFIX_LEN.min(key.chars().count() / 2);
            format!("{}****", key.chars().take(shown).collect::<String>())
        }
        _ => "-".to_string(),
    }
}

fn render_credential_detail(frame: &mut Frame, app: &App, area: Rect) {
    let content = match app.selected_credential() {
        Some(credential) => vec![
            Line::from(Span::styled(credential.name.clone(), styles::title_style())),
            Line::from(Span::styled(
                credential.status_label(),
                styles::badge_style(credential.is_active),
            )),
            Line::from(""),
            detail_line("Tipo:", credential.kind.clone()),
            detail_line("API key:", mask_key(credential.api_key.as_deref())),
            detail_line(
                "API URL:",
                credential.api_url.clone().unwrap_or_else(|| "-".to_string()),
            ),
            detail_line("Criada em:", format_date(credential.created_at)),
            detail_line("Atualizada em:", format_date(credential.updated_at)),
        ],
        None => vec![Line::from(Span::styled(
            "Nenhuma credencial cadastrada",
            styles::muted_style(),
        ))],
    };

    let block = Block::default()
        .title(" Detalhes ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(Paragraph::new(content).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key(None), "-");
        assert_eq!(mask_key(Some("")), "-");
        assert_eq!(mask_key(Some("sk_live_abcdefghijkl")), "sk_live_****");
        assert_eq!(mask_key(Some("abcd")), "ab****");
    }
}
