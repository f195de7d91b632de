use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use funil_core::utils::{format_count, format_currency, format_date, format_percentage};

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    // Vertical layout:
    // 1. Stat cards (full width)
    // 2. Online visitors | Active funnels (50/50)
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(6)])
        .split(area);

    render_stat_cards(frame, app, main_chunks[0]);

    let bottom_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(main_chunks[1]);

    render_online_visitors(frame, app, bottom_chunks[0]);
    render_active_funnels(frame, app, bottom_chunks[1]);
}

fn render_stat_cards(frame: &mut Frame, app: &App, area: Rect) {
    let stats = &app.stats;
    let cards = [
        ("Visitantes", format_count(stats.visitors)),
        ("Conversões", format_count(stats.conversions)),
        (
            "Taxa de Conversão",
            format!("{}%", format_percentage(stats.conversion_rate_or_derived())),
        ),
        ("Receita", format_currency(stats.revenue_total(), "BRL")),
    ];

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    for ((label, value), chunk) in cards.into_iter().zip(chunks.iter()) {
        let lines = vec![
            Line::from(Span::styled(label, styles::muted_style())),
            Line::from(Span::styled(value, styles::title_style())),
        ];
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(styles::border_style(false));
        frame.render_widget(Paragraph::new(lines).block(block), *chunk);
    }
}

fn render_online_visitors(frame: &mut Frame, app: &App, area: Rect) {
    let visitors = &app.stats.online_visitors;
    let mut lines = vec![];

    if visitors.is_empty() {
        lines.push(Line::from(Span::styled(
            "Nenhum visitante online",
            styles::muted_style(),
        )));
    }

    for visitor in visitors {
        lines.push(Line::from(vec![
            Span::styled("● ", styles::success_style()),
            Span::styled(visitor.step_display().to_string(), styles::highlight_style()),
        ]));
        lines.push(Line::from(Span::styled(
            format!(
                "  IP: {}  {}",
                visitor.ip_address.as_deref().unwrap_or("-"),
                visitor.time_on_site_display()
            ),
            styles::muted_style(),
        )));
    }

    let count = app.stats.online_visitors_count.max(visitors.len() as u64);
    let block = Block::default()
        .title(format!(" Visitantes em Tempo Real ({}) ", count))
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_active_funnels(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![];
    let active: Vec<_> = app.funnels.iter().filter(|f| f.is_active).collect();

    if active.is_empty() {
        let empty = if app.funnels.is_empty() {
            "Nenhum funil cadastrado"
        } else {
            "Nenhum funil ativo"
        };
        lines.push(Line::from(Span::styled(empty, styles::muted_style())));
    }

    for funnel in &active {
        lines.push(Line::from(vec![
            Span::styled(funnel.name.clone(), styles::list_item_style()),
            Span::raw("  "),
            Span::styled(funnel.status_label(), styles::badge_style(funnel.is_active)),
        ]));
        lines.push(Line::from(Span::styled(
            format!(
                "  Última atualização: {}",
                format_date(funnel.updated_at.or(funnel.created_at))
            ),
            styles::muted_style(),
        )));
    }

    let block = Block::default()
        .title(format!(" Funis Ativos ({}) ", active.len()))
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use funil_core::auth::MemoryTokenStore;
    use funil_core::config::Config;
    use funil_core::models::Funnel;
    use ratatui::{backend::TestBackend, Terminal};

    use super::*;

    fn funnel(id: i64, name: &str, active: bool) -> Funnel {
        serde_json::from_value(serde_json::json!({
            "id": id, "name": name, "is_active": active,
        }))
        .unwrap()
    }

    fn dashboard_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|f| render(f, app, f.area())).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn app() -> App {
        App::new(Config::default(), Arc::new(MemoryTokenStore::new())).unwrap()
    }

    #[test]
    fn test_active_panel_skips_paused_funnels() {
        let mut app = app();
        app.funnels = vec![
            funnel(1, "Funil Empréstimo", true),
            funnel(2, "Funil Cartão", false),
        ];

        let text = dashboard_text(&app);
        assert!(text.contains("Funis Ativos (1)"));
        assert!(text.contains("Funil Empréstimo"));
        assert!(!text.contains("Funil Cartão"));
        assert!(!text.contains("Pausado"));
    }

    #[test]
    fn test_active_panel_empty_states() {
        let mut app = app();
        assert!(dashboard_text(&app).contains("Nenhum funil cadastrado"));

        app.funnels = vec![funnel(2, "Funil Cartão", false)];
        let text = dashboard_text(&app);
        assert!(text.contains("Nenhum funil ativo"));
        assert!(text.contains("Funis Ativos (0)"));
    }
}
