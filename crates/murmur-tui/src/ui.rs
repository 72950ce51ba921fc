//! Frame layout: status bar, conversation, input bar and the help overlay.

use ratatui::{
    layout::{Constraint, Layout},
    Frame,
};

use crate::app::App;
use crate::conversation::{input_placeholder, ConversationPane};
use crate::widgets::{HelpOverlay, InputBar, StatusBar, StatusBarContent};

/// Smallest terminal the layout is drawn in.
const MIN_WIDTH: u16 = 20;
const MIN_HEIGHT: u16 = 6;

/// Draw the whole screen.
pub fn draw(frame: &mut Frame<'_>, app: &mut App) {
    let area = frame.area();
    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        frame.render_widget(
            ratatui::widgets::Paragraph::new("Terminal too small"),
            area,
        );
        return;
    }

    let input_height =
        InputBar::height_for(app.input(), area.width).min(area.height.saturating_sub(4));
    let [status_area, conversation_area, input_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(input_height),
    ])
    .areas(area);

    // Borders take two columns
    app.set_content_width(usize::from(conversation_area.width.saturating_sub(2)));

    let status = StatusBarContent {
        phase: app.phase(),
        endpoint: app.config().chat_url(),
        scrolled: !app.scroll().is_following(),
    };
    frame.render_widget(StatusBar::new(&status, app.theme()), status_area);

    let placeholder = input_placeholder(app.phase());
    frame.render_widget(
        InputBar::new(app.input(), app.theme())
            .enabled(app.input_enabled())
            .placeholder(placeholder),
        input_area,
    );

    let tick = app.tick_count();
    let (session, theme, scroll) = app.pane_parts();
    let pane = ConversationPane::new(session.conversation(), session.config(), theme).tick(tick);
    frame.render_stateful_widget(pane, conversation_area, scroll);

    if app.show_help {
        frame.render_widget(HelpOverlay::new(app.theme()), area);
    }
}
