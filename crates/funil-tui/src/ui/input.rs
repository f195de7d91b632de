//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{
    can_add_email_char, can_add_password_char, App, AppState, Focus, LoginFocus, Tab,
    PAGE_SCROLL_SIZE,
};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        // Session restore still running in the background
        AppState::Loading => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('q')) {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            return Ok(false);
        }
        AppState::LoggingIn => return handle_login_input(app, key).await,
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y' | 'Y' | 's' | 'S') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n' | 'N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::ConfirmingDelete => {
            match key.code {
                KeyCode::Char('y' | 'Y' | 's' | 'S') | KeyCode::Enter => app.confirm_delete(),
                KeyCode::Char('n' | 'N') | KeyCode::Esc => app.cancel_delete(),
                _ => {}
            }
            return Ok(false);
        }
        AppState::Quitting => return Ok(true),
        AppState::Normal => {}
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
        }
        KeyCode::Char('l') => {
            app.logout();
        }
        KeyCode::Char('u') => {
            app.refresh_current_tab();
        }
        KeyCode::Char(c @ '1'..='9') => {
            if let Some(tab) = Tab::from_digit(c) {
                app.activate_tab(tab);
            }
        }
        KeyCode::Left => {
            app.activate_tab(app.current_tab.prev());
        }
        KeyCode::Right => {
            app.activate_tab(app.current_tab.next());
        }
        KeyCode::Tab | KeyCode::BackTab => {
            app.toggle_focus();
        }
        KeyCode::Down | KeyCode::Char('j') => app.select_next(1),
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(1),
        KeyCode::PageDown => app.select_next(PAGE_SCROLL_SIZE),
        KeyCode::PageUp => app.select_prev(PAGE_SCROLL_SIZE),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),
        _ => handle_view_input(app, key),
    }

    Ok(false)
}

/// Keys whose meaning depends on the current view
fn handle_view_input(app: &mut App, key: KeyEvent) {
    match (app.current_tab, key.code) {
        (Tab::Funnels | Tab::Credentials, KeyCode::Char('t')) => app.toggle_selected(),
        (Tab::Tracking, KeyCode::Char('t')) if app.focus == Focus::Detail => app.toggle_selected(),
        (Tab::Funnels, KeyCode::Char('c')) => app.clone_selected_funnel(),
        (Tab::Funnels | Tab::Credentials, KeyCode::Char('x') | KeyCode::Delete) => {
            app.request_delete()
        }
        (Tab::Checkout, KeyCode::Enter) => app.load_selected_funnel(),
        (Tab::Tracking, KeyCode::Enter) if app.focus == Focus::List => {
            app.load_selected_funnel();
            app.focus = Focus::Detail;
        }
        (Tab::Monitoring, KeyCode::Enter) => app.load_selected_visitor_events(),
        _ => {}
    }
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            // Quit if on login screen
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Email => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Email,
            };
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Email => LoginFocus::Button,
                LoginFocus::Password => LoginFocus::Email,
                LoginFocus::Button => LoginFocus::Password,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Email => {
                app.login_focus = LoginFocus::Password;
            }
            LoginFocus::Password | LoginFocus::Button => {
                // On failure login_error is set and the form stays up
                let _ = app.attempt_login().await;
            }
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Email => {
                app.login_email.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Email => {
                if can_add_email_char(app.login_email.chars().count(), c) {
                    app.login_email.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.chars().count(), c) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button => {}
        },
        _ => {}
    }
    Ok(false)
}
