use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, AppState, Focus, LoginFocus, Tab};

use super::styles;
use super::tabs::{checkout, credentials, dashboard, funnels, monitoring, tracking};

/// Width of the login text fields, in characters
const FIELD_WIDTH: usize = 24;

pub fn render(frame: &mut Frame, app: &App) {
    if matches!(app.state, AppState::Loading) {
        render_loading(frame);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::LoggingIn => render_login_overlay(frame, app),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::ConfirmingDelete => render_delete_overlay(frame, app),
        _ => {}
    }
}

/// Full-screen placeholder shown while the stored session is checked
fn render_loading(frame: &mut Frame) {
    let area = centered_rect_fixed(30, 6, frame.area());
    let lines = vec![
        Line::from(Span::styled("  Funil Digital", styles::title_style())),
        Line::from(""),
        Line::from(Span::styled("  Carregando...", styles::muted_style())),
        Line::from(Span::styled("  [q] sair", styles::muted_style())),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  Funil Digital";
    let right = match app.greeting() {
        Some(greeting) => format!("{}  [l] Sair  [?] Ajuda", greeting),
        None => "[?] Ajuda".to_string(),
    };
    let used = title.chars().count() + right.chars().count() + 4;

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat((area.width as usize).saturating_sub(used))),
        Span::styled(right, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    for (i, tab) in Tab::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let label = format!("[{}] {}", i + 1, tab.title());
        if *tab == app.current_tab {
            spans.push(Span::styled(label, styles::tab_style(true)));
        } else {
            spans.push(Span::styled(label, styles::muted_style()));
        }
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_tab {
        Tab::Dashboard => dashboard::render(frame, app, area),
        Tab::Funnels => funnels::render(frame, app, area),
        Tab::Credentials => credentials::render(frame, app, area),
        Tab::Checkout => checkout::render(frame, app, area),
        Tab::Monitoring => monitoring::render(frame, app, area),
        Tab::Tracking => tracking::render(frame, app, area),
    }
}

/// Action keys for the current view, shown on the right of the status bar
fn shortcuts(app: &App) -> &'static str {
    match (app.current_tab, app.focus) {
        (Tab::Funnels, _) => "[t] ativar/pausar [c] clonar [x] excluir | [u] atualizar | [q] sair",
        (Tab::Credentials, _) => "[t] ativar/desativar [x] excluir | [u] atualizar | [q] sair",
        (Tab::Checkout, _) => "[Enter] carregar | [u] atualizar | [q] sair",
        (Tab::Monitoring, _) => "[Enter] eventos | [u] atualizar | [q] sair",
        (Tab::Tracking, Focus::List) => "[Enter] carregar [Tab] pixels | [u] atualizar | [q] sair",
        (Tab::Tracking, Focus::Detail) => "[t] ativar/pausar [Tab] funis | [u] atualizar | [q] sair",
        (Tab::Dashboard, _) => "[u] atualizar | [q] sair",
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (left_text, left_style) = if let Some(ref msg) = app.status_message {
        (format!(" {} ", msg), styles::highlight_style())
    } else if app.is_fetching() {
        (" Carregando... ".to_string(), styles::muted_style())
    } else {
        (format!(" {} ", app.config.api_base_url()), styles::muted_style())
    };

    let right_text = format!(" {} ", shortcuts(app));

    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());
    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 24, frame.area());

    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled("  Funil Digital", styles::title_style())),
        Line::from(Span::styled(
            format!("  versão {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navegação", styles::highlight_style())),
        help_line("1-6", "Trocar de tela"),
        help_line("←/→", "Tela anterior/próxima"),
        help_line("Tab", "Alternar foco (lista ↔ detalhe)"),
        help_line("↑/↓ j/k", "Mover seleção"),
        help_line("PgUp/PgDn", "Mover uma página"),
        help_line("Enter", "Carregar detalhe da seleção"),
        Line::from(""),
        Line::from(Span::styled(" Ações", styles::highlight_style())),
        help_line("t", "Ativar/pausar item selecionado"),
        help_line("c", "Clonar funil"),
        help_line("x", "Excluir funil ou credencial"),
        help_line("u", "Atualizar dados do servidor"),
        help_line("l", "Sair da conta"),
        help_line("q", "Fechar o programa"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Pressione ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" ou ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" para fechar", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

/// One labelled input box of the login form
fn login_field<'a>(label: &'a str, value: String, focused: bool) -> Line<'a> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let cursor = if focused { "▌" } else { "" };
    Line::from(vec![
        Span::raw("   "),
        Span::styled(label, styles::muted_style()),
        Span::styled(format!("{:<width$}{}", value, cursor, width = FIELD_WIDTH), style),
        Span::styled("]", styles::muted_style()),
    ])
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let height = if app.login_error.is_some() { 12 } else { 10 };
    let area = centered_rect_fixed(46, height, frame.area());

    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(Span::styled("   Funil Digital", styles::title_style())),
        Line::from(Span::styled("   Painel administrativo", styles::muted_style())),
        Line::from(""),
    ];

    // Show the tail of long emails so the cursor stays visible
    let email: String = {
        let chars: Vec<char> = app.login_email.chars().collect();
        let start = chars.len().saturating_sub(FIELD_WIDTH);
        chars[start..].iter().collect()
    };
    lines.push(login_field(
        "Email: [",
        email,
        app.login_focus == LoginFocus::Email,
    ));
    lines.push(login_field(
        "Senha: [",
        "*".repeat(app.login_password.chars().count().min(FIELD_WIDTH)),
        app.login_focus == LoginFocus::Password,
    ));

    let button_focused = app.login_focus == LoginFocus::Button;
    let button_style = if button_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let button_label = if button_focused {
        " ▶ Entrar ◀ "
    } else {
        "   Entrar   "
    };
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("              ["),
        Span::styled(button_label, button_style),
        Span::raw("]"),
    ]));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

/// Yes/no dialog shared by the quit and delete confirmations
fn render_confirm(frame: &mut Frame, question: String, confirm_label: &'static str) {
    let width = (question.chars().count() as u16 + 8).clamp(46, 70);
    let area = centered_rect_fixed(width, 7, frame.area());

    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!("   {}", question), styles::highlight_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Pressione ", styles::muted_style()),
            Span::styled("[S]", styles::help_key_style()),
            Span::styled(format!(" para {}, ", confirm_label), styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" para cancelar", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_quit_overlay(frame: &mut Frame) {
    render_confirm(frame, "Deseja realmente sair?".to_string(), "sair");
}

fn render_delete_overlay(frame: &mut Frame, app: &App) {
    if let Some(ref pending) = app.pending_delete {
        render_confirm(frame, pending.prompt(), "excluir");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use funil_core::auth::MemoryTokenStore;
    use funil_core::config::Config;
    use ratatui::{backend::TestBackend, Terminal};

    use super::*;

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
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
    fn test_loading_screen() {
        let text = screen_text(&app());
        assert!(text.contains("Carregando..."));
        assert!(text.contains("[q] sair"));
        assert!(!text.contains("Entrar"));
    }

    #[test]
    fn test_login_overlay_masks_password() {
        let mut app = app();
        app.start_login();
        app.login_email = "admin@funil.com".to_string();
        app.login_password = "segredo".to_string();
        app.login_error = Some("Email ou senha inválidos".to_string());

        let text = screen_text(&app);
        assert!(text.contains("Email: [admin@funil.com"));
        assert!(text.contains("Senha: [*******"));
        assert!(!text.contains("segredo"));
        assert!(text.contains("Entrar"));
        assert!(text.contains("Email ou senha inválidos"));
    }

    #[test]
    fn test_tabs_are_numbered() {
        let mut app = app();
        app.state = AppState::Normal;
        let text = screen_text(&app);
        assert!(text.contains("[1] Dashboard"));
        assert!(text.contains("[6] Tracking"));
        assert!(text.contains("[u] atualizar | [q] sair"));
    }

    #[test]
    fn test_quit_confirmation() {
        let mut app = app();
        app.state = AppState::ConfirmingQuit;
        assert!(screen_text(&app).contains("Deseja realmente sair?"));
    }
}
