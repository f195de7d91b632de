use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use funil_core::utils::{format_count, format_date};

use crate::app::{App, CheckoutView, Focus};
use crate::ui::styles;

use super::{detail_line, render_funnel_picker};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);

    let loaded = app.checkout.as_ref().map(|c| c.funnel_id);
    render_funnel_picker(frame, app, chunks[0], app.focus == Focus::List, loaded);

    let focused = app.focus == Focus::Detail;
    match app.checkout.as_ref() {
        Some(view) => render_checkout(frame, view, chunks[1], focused),
        None => {
            let block = Block::default()
                .title(" Checkout ")
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused));
            let hint = Paragraph::new(Span::styled(
                "Selecione um funil e pressione Enter",
                styles::muted_style(),
            ))
            .block(block);
            frame.render_widget(hint, chunks[1]);
        }
    }
}

fn render_checkout(frame: &mut Frame, view: &CheckoutView, area: Rect, focused: bool) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(4)])
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[0]);

    let config_lines = match view.config.as_ref() {
        Some(config) => vec![
            Line::from(Span::styled(config.product_name.clone(), styles::title_style())),
            detail_line("Preço:", config.price_display()),
            detail_line("Pagamento:", config.payment_methods_display()),
            detail_line(
                "Etapa:",
                config
                    .step_id
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            detail_line("Atualizado em:", format_date(config.updated_at)),
        ],
        None => vec![Line::from(Span::styled(
            "Nenhum checkout configurado",
            styles::muted_style(),
        ))],
    };
    let config_block = Block::default()
        .title(" Configuração ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));
    frame.render_widget(Paragraph::new(config_lines).block(config_block), top[0]);

    let revenue = &view.revenue;
    let revenue_lines = vec![
        detail_line("Receita total:", revenue.revenue_display()),
        detail_line("Transações:", format_count(revenue.total_transactions)),
        detail_line("Ticket médio:", revenue.average_ticket_display()),
    ];
    let revenue_block = Block::default()
        .title(" Receita ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));
    frame.render_widget(Paragraph::new(revenue_lines).block(revenue_block), top[1]);

    render_payments(frame, view, chunks[1], focused);
}

fn render_payments(frame: &mut Frame, view: &CheckoutView, area: Rect, focused: bool) {
    let header = Row::new([
        Cell::from("Data"),
        Cell::from("Cliente"),
        Cell::from("Método"),
        Cell::from("Valor"),
        Cell::from("Status"),
    ])
    .style(styles::title_style());

    let rows: Vec<Row> = view
        .payments
        .iter()
        .map(|payment| {
            let status_style = match payment.status.as_str() {
                "paid" => styles::success_style(),
                "failed" | "cancelled" => styles::error_style(),
                _ => styles::muted_style(),
            };
            Row::new(vec![
                Cell::from(format_date(payment.created_at)),
                Cell::from(payment.customer_email().unwrap_or("-").to_string()),
                Cell::from(payment.payment_method.clone().unwrap_or_else(|| "-".to_string())),
                Cell::from(payment.amount_display()),
                Cell::from(payment.status.clone()).style(status_style),
            ])
            .style(styles::list_item_style())
        })
        .collect();

    let widths = [
        Constraint::Length(16),
        Constraint::Fill(1),
        Constraint::Length(12),
        Constraint::Length(14),
        Constraint::Length(10),
    ];

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(format!(" Pagamentos ({}) ", view.payments.len()))
            .title_style(styles::muted_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(focused)),
    );

    frame.render_widget(table, area);
}
