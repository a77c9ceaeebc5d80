pub mod app;
pub mod event;
pub mod layout;
pub mod render;

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::app::{AppContext, Result};

use self::app::TuiApp;
use self::event::{AppEvent, EventHandler};

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Run the interactive client starting at `location` (for example
/// `/explore?tags=art`).
pub async fn run(ctx: Arc<AppContext>, location: &str) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, ctx, location).await;
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn run_app(terminal: &mut Tui, ctx: Arc<AppContext>, location: &str) -> Result<()> {
    let config = ctx.config.clone();
    let mut tui_app = TuiApp::new(ctx, location);
    let event_handler = EventHandler::new(Duration::from_millis(100));

    loop {
        terminal.draw(|frame| layout::render(frame, &mut tui_app, &config.colors))?;

        // Crossterm polling blocks, so keep it off the runtime workers that
        // deliver fetch results.
        let next = tokio::task::block_in_place(|| event_handler.next())?;
        if let AppEvent::Key(key) = next {
            tui_app.handle_key(key, &config.keybindings);
        }
        tui_app.tick();

        if tui_app.should_quit {
            break;
        }
    }

    Ok(())
}
