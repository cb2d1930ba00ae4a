use crate::app::{App, Focus, Gesture};
use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};

pub const WINDOW_TITLE: &str = "Advanced Task Manager";
// 800x600 px at an 8x16 px cell
const WINDOW_WIDTH: u16 = 100;
const WINDOW_HEIGHT: u16 = 37;

/// Screen regions from the last draw, used to route mouse clicks.
#[derive(Debug, Default, Clone, Copy)]
pub struct HitAreas {
    pub title: Rect,
    pub description: Rect,
    pub add_button: Rect,
    pub delete_button: Rect,
    pub table_rows: Rect,
    pub table_offset: usize,
    pub dialog: Option<Rect>,
}

pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let mut areas = HitAreas::default();
    while app.is_running() {
        terminal.draw(|f| areas = draw(f, app))?;

        let gesture = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => key_gesture(app, key),
            Event::Mouse(mouse) => mouse_gesture(app, &areas, mouse),
            _ => None,
        };
        if let Some(gesture) = gesture {
            app.handle(gesture)?;
        }
    }
    Ok(())
}

fn key_gesture(app: &App, key: KeyEvent) -> Option<Gesture> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Gesture::Close);
    }
    if app.warning().is_some() {
        return match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => Some(Gesture::Dismiss),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Esc => Some(Gesture::Close),
        KeyCode::Tab => Some(Gesture::FocusNext),
        KeyCode::BackTab => Some(Gesture::FocusPrev),
        KeyCode::Enter => Some(Gesture::Activate),
        KeyCode::Char(' ') if !app.focus.is_input() => Some(Gesture::Activate),
        KeyCode::Char(c)
            if app.focus.is_input()
                && key.modifiers.difference(KeyModifiers::SHIFT).is_empty() =>
        {
            Some(Gesture::Type(c))
        }
        KeyCode::Backspace if app.focus.is_input() => Some(Gesture::Erase),
        KeyCode::Up if app.focus == Focus::Table => Some(Gesture::SelectPrev),
        KeyCode::Down if app.focus == Focus::Table => Some(Gesture::SelectNext),
        KeyCode::Home if app.focus == Focus::Table => Some(Gesture::SelectFirst),
        KeyCode::End if app.focus == Focus::Table => Some(Gesture::SelectLast),
        _ => None,
    }
}

fn mouse_gesture(app: &App, areas: &HitAreas, mouse: MouseEvent) -> Option<Gesture> {
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
        return None;
    }
    let at = Position::new(mouse.column, mouse.row);
    if app.warning().is_some() {
        return areas
            .dialog
            .filter(|dialog| dialog.contains(at))
            .map(|_| Gesture::Dismiss);
    }
    if areas.title.contains(at) {
        Some(Gesture::Focus(Focus::Title))
    } else if areas.description.contains(at) {
        Some(Gesture::Focus(Focus::Description))
    } else if areas.add_button.contains(at) {
        Some(Gesture::Add)
    } else if areas.delete_button.contains(at) {
        Some(Gesture::Delete)
    } else if areas.table_rows.contains(at) {
        let row = (at.y - areas.table_rows.y) as usize + areas.table_offset;
        Some(Gesture::SelectRow(row))
    } else {
        None
    }
}

/// The window rectangle: a fixed size, centered and clamped to `area`.
fn window_rect(area: Rect) -> Rect {
    centered(area, WINDOW_WIDTH, WINDOW_HEIGHT)
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

pub fn draw(f: &mut Frame, app: &App) -> HitAreas {
    let window = window_rect(f.area());
    let frame = Block::default()
        .title(WINDOW_TITLE)
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL);
    let inner = frame.inner(window);
    f.render_widget(Clear, window);
    f.render_widget(frame, window);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(inner);

    draw_input(f, chunks[0], &app.title, "Task title", app.focus == Focus::Title);
    draw_input(
        f,
        chunks[1],
        &app.description,
        "Description (optional)",
        app.focus == Focus::Description,
    );
    draw_button(f, chunks[2], "+ Add Task", Color::Green, app.focus == Focus::AddButton);
    draw_button(
        f,
        chunks[3],
        "x Delete Selected",
        Color::Red,
        app.focus == Focus::DeleteButton,
    );
    let (table_rows, table_offset) = draw_table(f, chunks[4], app);

    let help = Paragraph::new(Line::from(vec![
        Span::styled("Tab", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" next field  "),
        Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" activate  "),
        Span::styled("Up/Down", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" select  "),
        Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" quit"),
    ]))
    .style(Style::default().fg(Color::DarkGray));
    f.render_widget(help, chunks[5]);

    let dialog = app.warning().map(|warning| {
        let area = centered(window, 44, 6);
        let body = Paragraph::new(vec![
            Line::from(warning.message()),
            Line::from(""),
            Line::from(Span::styled("[ OK ]", Style::default().add_modifier(Modifier::BOLD))),
        ])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .title("Error")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        );
        f.render_widget(Clear, area);
        f.render_widget(body, area);
        area
    });

    HitAreas {
        title: chunks[0],
        description: chunks[1],
        add_button: chunks[2],
        delete_button: chunks[3],
        table_rows,
        table_offset,
        dialog,
    }
}

/// The end of `value` that fits in `width` columns with one column left for
/// the cursor.
fn visible_tail(value: &str, width: u16) -> &str {
    let room = usize::from(width.saturating_sub(1));
    let len = value.chars().count();
    if len <= room {
        return value;
    }
    match value.char_indices().nth(len - room) {
        Some((start, _)) => &value[start..],
        None => "",
    }
}

fn draw_input(f: &mut Frame, area: Rect, value: &str, placeholder: &str, focused: bool) {
    let shown = visible_tail(value, area.width.saturating_sub(2));
    let text = if value.is_empty() {
        Span::styled(placeholder, Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(shown)
    };
    let input = Paragraph::new(Line::from(text)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style(focused)),
    );
    f.render_widget(input, area);

    if focused {
        let offset = u16::try_from(shown.chars().count()).unwrap_or(u16::MAX);
        let x = (area.x + 1).saturating_add(offset).min(area.right().saturating_sub(2));
        f.set_cursor_position(Position::new(x, area.y + 1));
    }
}

fn draw_button(f: &mut Frame, area: Rect, label: &str, color: Color, focused: bool) {
    let mut style = Style::default().fg(Color::White).bg(color);
    if focused {
        style = style.add_modifier(Modifier::BOLD);
    }
    let button = Paragraph::new(label)
        .alignment(Alignment::Center)
        .style(style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style(focused)),
        );
    f.render_widget(button, area);
}

/// Returns the area holding data rows and the scroll offset used.
fn draw_table(f: &mut Frame, area: Rect, app: &App) -> (Rect, usize) {
    let header = Row::new(vec!["ID", "Title", "Description"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = app
        .tasks()
        .iter()
        .map(|t| {
            Row::new(vec![
                Cell::from(t.id.to_string()).style(Style::default().fg(Color::DarkGray)),
                Cell::from(t.title.as_str()),
                Cell::from(t.description.as_str()),
            ])
        })
        .collect();

    let block = Block::default()
        .title("Tasks")
        .borders(Borders::ALL)
        .border_style(border_style(app.focus == Focus::Table));
    let inner = block.inner(area);

    let table = Table::new(
        rows,
        [
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ],
    )
    .header(header)
    .block(block)
    .row_highlight_style(Style::default().bg(Color::Blue).fg(Color::White));

    let mut state = TableState::default().with_selected(app.selected());
    f.render_stateful_widget(table, area, &mut state);

    let body = Rect {
        y: inner.y.saturating_add(1),
        height: inner.height.saturating_sub(1),
        ..inner
    };
    (body, state.offset())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task_store::TaskStore;
    use crossterm::event::KeyEventState;
    use ratatui::backend::TestBackend;
    use tempfile::TempDir;

    fn app_with(titles: &[(&str, &str)]) -> (TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        let store = TaskStore::new(dir.path().join("tareas.db"));
        store.initialize().unwrap();
        for (title, description) in titles {
            store.create(title, description).unwrap();
        }
        (dir, App::new(store).unwrap())
    }

    fn render(app: &App, width: u16, height: u16) -> (String, HitAreas) {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        let mut areas = HitAreas::default();
        terminal.draw(|f| areas = draw(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        let text = buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|line| line.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n");
        (text, areas)
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn click(x: u16, y: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: x,
            row: y,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn window_renders_title_headers_and_rows() {
        let (_dir, app) = app_with(&[("Buy milk", ""), ("Clean house", "weekly")]);
        let (text, _) = render(&app, 120, 40);

        assert!(text.contains(WINDOW_TITLE));
        assert!(text.contains("Task title"));
        assert!(text.contains("Description (optional)"));
        assert!(text.contains("+ Add Task"));
        assert!(text.contains("x Delete Selected"));
        assert!(text.contains("ID"));
        assert!(text.contains("Buy milk"));
        assert!(text.contains("Clean house"));
        assert!(text.contains("weekly"));
    }

    #[test]
    fn window_is_fixed_size_and_centered() {
        assert_eq!(window_rect(Rect::new(0, 0, 120, 41)), Rect::new(10, 2, 100, 37));
        assert_eq!(window_rect(Rect::new(0, 0, 80, 24)), Rect::new(0, 0, 80, 24));
    }

    #[test]
    fn warning_dialog_is_drawn() {
        let (_dir, mut app) = app_with(&[]);
        app.handle(Gesture::Add).unwrap();
        let (text, areas) = render(&app, 120, 40);

        assert!(text.contains("Error"));
        assert!(text.contains("Title is required!"));
        assert!(areas.dialog.is_some());
    }

    #[test]
    fn keys_map_to_gestures_by_focus() {
        let (_dir, mut app) = app_with(&[]);
        assert_eq!(key_gesture(&app, press(KeyCode::Char('a'))), Some(Gesture::Type('a')));
        assert_eq!(key_gesture(&app, press(KeyCode::Char(' '))), Some(Gesture::Type(' ')));
        assert_eq!(key_gesture(&app, press(KeyCode::Enter)), Some(Gesture::Activate));
        assert_eq!(key_gesture(&app, press(KeyCode::Up)), None);

        app.focus = Focus::Table;
        assert_eq!(key_gesture(&app, press(KeyCode::Char('a'))), None);
        assert_eq!(key_gesture(&app, press(KeyCode::Down)), Some(Gesture::SelectNext));

        app.focus = Focus::AddButton;
        assert_eq!(key_gesture(&app, press(KeyCode::Char(' '))), Some(Gesture::Activate));
        assert_eq!(key_gesture(&app, press(KeyCode::Esc)), Some(Gesture::Close));
    }

    #[test]
    fn keys_only_dismiss_while_warning_shown() {
        let (_dir, mut app) = app_with(&[]);
        app.handle(Gesture::Delete).unwrap();

        assert_eq!(key_gesture(&app, press(KeyCode::Char('a'))), None);
        assert_eq!(key_gesture(&app, press(KeyCode::Tab)), None);
        assert_eq!(key_gesture(&app, press(KeyCode::Esc)), Some(Gesture::Dismiss));
        let ctrl_c = KeyEvent {
            modifiers: KeyModifiers::CONTROL,
            ..press(KeyCode::Char('c'))
        };
        assert_eq!(key_gesture(&app, ctrl_c), Some(Gesture::Close));
    }

    #[test]
    fn clicks_hit_buttons_and_rows() {
        let (_dir, mut app) = app_with(&[("first", ""), ("second", "")]);
        let (_, areas) = render(&app, 120, 40);

        let add = areas.add_button;
        assert_eq!(mouse_gesture(&app, &areas, click(add.x + 2, add.y + 1)), Some(Gesture::Add));
        let delete = areas.delete_button;
        assert_eq!(
            mouse_gesture(&app, &areas, click(delete.x + 2, delete.y + 1)),
            Some(Gesture::Delete)
        );
        let rows = areas.table_rows;
        assert_eq!(
            mouse_gesture(&app, &areas, click(rows.x + 1, rows.y + 1)),
            Some(Gesture::SelectRow(1))
        );
        assert_eq!(mouse_gesture(&app, &areas, click(0, 0)), None);

        app.handle(Gesture::SelectRow(1)).unwrap();
        app.handle(Gesture::Delete).unwrap();
        assert_eq!(app.tasks().len(), 1);
        assert_eq!(app.tasks()[0].title, "first");
    }

    #[test]
    fn only_clicks_on_the_dialog_dismiss_it() {
        let (_dir, mut app) = app_with(&[]);
        app.handle(Gesture::Delete).unwrap();
        let (_, areas) = render(&app, 120, 40);

        let add = areas.add_button;
        assert_eq!(mouse_gesture(&app, &areas, click(add.x + 2, add.y + 1)), None);
        let dialog = areas.dialog.unwrap();
        assert_eq!(
            mouse_gesture(&app, &areas, click(dialog.x + 2, dialog.y + 2)),
            Some(Gesture::Dismiss)
        );
    }

    #[test]
    fn modified_letters_are_not_typed() {
        let (_dir, app) = app_with(&[]);
        let with = |modifiers, c| KeyEvent {
            modifiers,
            ..press(KeyCode::Char(c))
        };

        assert_eq!(key_gesture(&app, with(KeyModifiers::ALT, 'x')), None);
        assert_eq!(key_gesture(&app, with(KeyModifiers::CONTROL, 'u')), None);
        assert_eq!(
            key_gesture(&app, with(KeyModifiers::SHIFT, 'X')),
            Some(Gesture::Type('X'))
        );
    }

    #[test]
    fn visible_tail_keeps_the_end() {
        assert_eq!(visible_tail("short", 10), "short");
        assert_eq!(visible_tail("abcdef", 4), "def");
        assert_eq!(visible_tail("ééééé", 3), "éé");
        assert_eq!(visible_tail("abc", 0), "");
    }

    #[test]
    fn long_input_scrolls_to_its_end() {
        let (_dir, mut app) = app_with(&[]);
        let long = format!("START{}END", "x".repeat(150));
        for c in long.chars() {
            app.handle(Gesture::Type(c)).unwrap();
        }
        let (text, _) = render(&app, 120, 40);

        assert!(text.contains("xxxEND"));
        assert!(!text.contains("START"));
    }
}
