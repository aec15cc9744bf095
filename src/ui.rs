use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::Line,
    widgets::{Block, BorderType, Borders, Clear, LineGauge, Paragraph},
};

use crate::menu::Menu;

pub const LOGO: [&str; 6] = [
    "  _   _      _   _             ",
    " | \\ | |    | | | |            ",
    " |  \\| | ___| |_| | __ _ _ __  ",
    " | . ` |/ _ \\ __| |/ _` | '_ \\ ",
    " | |\\  |  __/ |_| | (_| | | | |",
    " |_| \\_|\\___|\\__|_|\\__,_|_| |_|",
];

pub const TAGLINE: &str = "A Vim-Style Network Manager";

pub const POPUP_WIDTH: u16 = 70;
const POPUP_MIN_HEIGHT: u16 = 10;
const HOME_MENU_WIDTH: u16 = 35;
const MENU_COLUMN_WIDTH: u16 = 40;
const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

/// The view that stays on screen between overlays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layer {
    /// Banner with a compact menu window below it.
    Home(Menu),
    /// Full screen menu window.
    Menu(Menu),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    Popup(Popup),
    List(Menu),
    Progress(Progress),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Popup {
    pub title: String,
    pub body: String,
    pub footer: Option<String>,
}

impl Popup {
    pub fn acknowledge(title: &str, body: &str) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
            footer: Some("Press any key to continue...".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub title: String,
    pub message: String,
    pub tick: usize,
    pub elapsed: Duration,
    pub timeout: Duration,
}

pub fn render(frame: &mut Frame, base: Option<&Layer>, overlay: Option<&Overlay>) {
    match base {
        Some(Layer::Home(menu)) => render_home(frame, menu),
        Some(Layer::Menu(menu)) => render_menu(frame, menu, frame.area()),
        None => {}
    }

    match overlay {
        Some(Overlay::Popup(popup)) => render_popup(frame, popup),
        Some(Overlay::List(list)) => render_list(frame, list),
        Some(Overlay::Progress(progress)) => render_progress(frame, progress),
        None => {}
    }
}

/// Cuts `text` to at most `max` characters. Popups never wrap, whatever
/// does not fit the box is dropped.
pub fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// A `width` x `height` rectangle centered in `area`, shrunk to fit.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn window(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Thick)
        .border_style(Style::default().fg(Color::Green))
        .title(title)
        .title_alignment(Alignment::Center)
        .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
}

fn menu_lines(menu: &Menu, width: usize) -> Vec<Line<'static>> {
    menu.items
        .iter()
        .enumerate()
        .map(|(index, label)| {
            if index == menu.highlight() {
                Line::from(truncate(&format!(" > {label} "), width))
                    .style(Style::default().fg(Color::Black).bg(Color::Cyan))
            } else {
                Line::from(truncate(&format!("   {label} "), width))
            }
        })
        .collect()
}

fn render_window(frame: &mut Frame, menu: &Menu, area: Rect, item_area: Rect) {
    let area = area.intersection(frame.area());
    frame.render_widget(Clear, area);
    frame.render_widget(window(&menu.title), area);

    let item_area = item_area.intersection(area);
    frame.render_widget(
        Paragraph::new(menu_lines(menu, item_area.width as usize)),
        item_area,
    );

    if let Some(hint) = &menu.hint
        && area.height > 3
    {
        let hint_area = Rect::new(
            area.x + 2,
            area.y + area.height - 2,
            area.width.saturating_sub(4),
            1,
        )
        .intersection(area);
        frame.render_widget(Paragraph::new(hint.as_str()).dim(), hint_area);
    }
}

pub fn render_menu(frame: &mut Frame, menu: &Menu, area: Rect) {
    let rows = menu.len() as u16;
    let item_area = centered(area, MENU_COLUMN_WIDTH, rows);
    render_window(frame, menu, area, item_area);
}

pub fn render_home(frame: &mut Frame, menu: &Menu) {
    let area = frame.area();
    frame.render_widget(Clear, area);

    let logo: Vec<Line> = LOGO.iter().map(|line| Line::from(*line)).collect();
    let logo_height = LOGO.len() as u16;
    let logo_area = Rect::new(area.x, area.y + 2, area.width, logo_height).intersection(area);
    frame.render_widget(
        Paragraph::new(logo)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        logo_area,
    );

    let tagline_area = Rect::new(area.x, area.y + logo_height + 3, area.width, 1).intersection(area);
    frame.render_widget(
        Paragraph::new(TAGLINE).alignment(Alignment::Center).dim(),
        tagline_area,
    );

    let height = menu.len() as u16 + 4;
    let width = HOME_MENU_WIDTH.min(area.width);
    let window_area = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + logo_height + 5,
        width,
        height,
    );
    let item_area = Rect::new(
        window_area.x + 3,
        window_area.y + 2,
        window_area.width.saturating_sub(4),
        menu.len() as u16,
    );
    render_window(frame, menu, window_area, item_area);
}

/// List selection window, inset by two cells from every edge.
pub fn render_list(frame: &mut Frame, list: &Menu) {
    let area = frame.area();
    let window_area = Rect::new(
        area.x + 2,
        area.y + 2,
        area.width.saturating_sub(4),
        area.height.saturating_sub(4),
    )
    .intersection(area);

    // leave room for the title above and the hint below
    let visible = (window_area.height.saturating_sub(6) as usize).max(1);
    let offset = (list.highlight() + 1).saturating_sub(visible);
    let mut window = list.clone();
    window.items = list.items.iter().skip(offset).take(visible).cloned().collect();
    window.select(list.highlight() - offset);

    let item_area = Rect::new(
        window_area.x + 4,
        window_area.y + 3,
        window_area.width.saturating_sub(6),
        visible as u16,
    );
    render_window(frame, &window, window_area, item_area);
}

pub fn render_popup(frame: &mut Frame, popup: &Popup) {
    let body: Vec<&str> = popup.body.lines().collect();
    let wanted = (body.len() as u16 + 6).max(POPUP_MIN_HEIGHT);
    let area = centered(frame.area(), POPUP_WIDTH, wanted);

    frame.render_widget(Clear, area);
    frame.render_widget(window(&popup.title), area);

    let inner_width = area.width.saturating_sub(4) as usize;
    let body_rows = area.height.saturating_sub(6) as usize;
    let lines: Vec<Line> = body
        .iter()
        .take(body_rows.max(1))
        .map(|line| Line::from(truncate(line, inner_width)))
        .collect();

    let body_area = Rect::new(
        area.x + 2,
        area.y + 3,
        inner_width as u16,
        body_rows.max(1) as u16,
    )
    .intersection(area);
    frame.render_widget(Paragraph::new(lines), body_area);

    if let Some(footer) = &popup.footer
        && area.height >= 4
    {
        let footer_area =
            Rect::new(area.x + 2, area.y + area.height - 3, inner_width as u16, 1).intersection(area);
        frame.render_widget(Paragraph::new(truncate(footer, inner_width)), footer_area);
    }
}

pub fn render_progress(frame: &mut Frame, progress: &Progress) {
    let area = centered(frame.area(), POPUP_WIDTH, POPUP_MIN_HEIGHT);
    let inner_width = area.width.saturating_sub(4);

    frame.render_widget(Clear, area);
    frame.render_widget(window(&progress.title), area);

    let spinner = SPINNER[progress.tick % SPINNER.len()];
    let status = format!(
        "{spinner} {} ({}s)",
        progress.message,
        progress.elapsed.as_secs()
    );
    let status_area = Rect::new(area.x + 2, area.y + 3, inner_width, 1).intersection(area);
    frame.render_widget(
        Paragraph::new(truncate(&status, inner_width as usize)),
        status_area,
    );

    let ratio = if progress.timeout.is_zero() {
        1.0
    } else {
        (progress.elapsed.as_secs_f64() / progress.timeout.as_secs_f64()).clamp(0.0, 1.0)
    };
    let gauge_area = Rect::new(area.x + 2, area.y + 5, inner_width, 1).intersection(area);
    frame.render_widget(
        LineGauge::default()
            .filled_style(Style::default().fg(Color::Cyan))
            .ratio(ratio),
        gauge_area,
    );
}
