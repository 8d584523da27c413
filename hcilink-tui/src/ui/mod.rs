/*!
 * HCILINK TUI Interface
 * Device list, service status and result dialogs
 */

use hcilink_core::ServiceStatus;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{Activity, App, Severity};

// Conservative color palette
const BLUE: Color = Color::Rgb(100, 149, 237);
const GRAY: Color = Color::Rgb(128, 128, 128);
const WHITE: Color = Color::Rgb(255, 255, 255);
const GREEN: Color = Color::Rgb(34, 139, 34);
const YELLOW: Color = Color::Rgb(218, 165, 32);
const RED: Color = Color::Rgb(220, 20, 60);

pub fn render_ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(60), // Devices
            Constraint::Percentage(40), // Services + actions
        ])
        .split(f.area());

    render_devices_panel(f, chunks[0], app);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Min(9)])
        .split(chunks[1]);

    render_services_panel(f, side[0], app);
    render_actions_panel(f, side[1], app);

    if let Some(dialog) = &app.dialog {
        let color = match dialog.severity {
            Severity::Info => GREEN,
            Severity::Warning => YELLOW,
            Severity::Error => RED,
        };
        let area = centered_rect(60, 30, f.area());
        let paragraph = Paragraph::new(vec![
            Line::from(dialog.message.as_str()),
            Line::from(""),
            Line::from(Span::styled("[Esc] Dismiss", Style::default().fg(GRAY))),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(dialog.title.as_str())
                .border_style(Style::default().fg(color)),
        )
        .wrap(Wrap { trim: false });

        f.render_widget(Clear, area);
        f.render_widget(paragraph, area);
    }
}

fn render_devices_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Bluetooth Devices")
        .border_style(Style::default().fg(BLUE));

    let Some(devices) = app.devices.as_ref() else {
        let hint = match app.activity {
            Some(Activity::Scanning) => "Scanning...",
            _ => "No scan yet, press [s] to scan",
        };
        let paragraph = Paragraph::new(hint)
            .style(Style::default().fg(GRAY))
            .block(block)
            .alignment(Alignment::Center);
        f.render_widget(paragraph, area);
        return;
    };

    if devices.is_empty() {
        let paragraph = Paragraph::new("No devices found")
            .style(Style::default().fg(GRAY))
            .block(block)
            .alignment(Alignment::Center);
        f.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = devices
        .iter()
        .enumerate()
        .map(|(i, device)| {
            let prefix = if i == app.selected_device { "▶ " } else { "  " };
            let is_connected = app.connected.as_ref() == Some(device);
            let indicator = if is_connected { "●" } else { "○" };
            let indicator_color = if is_connected { GREEN } else { GRAY };

            let content = Line::from(vec![
                Span::raw(prefix),
                Span::styled(indicator, Style::default().fg(indicator_color)),
                Span::raw(" "),
                Span::styled(device.label(), Style::default().fg(WHITE)),
            ]);

            if i == app.selected_device {
                ListItem::new(content).style(Style::default().bg(BLUE).fg(WHITE))
            } else {
                ListItem::new(content)
            }
        })
        .collect();

    f.render_widget(List::new(items).block(block), area);
}

fn render_services_panel(f: &mut Frame, area: Rect, app: &App) {
    let mut content = Vec::new();
    for (name, status) in &app.services {
        let (indicator, color) = match status {
            ServiceStatus::Running => ("●", GREEN),
            ServiceStatus::Stopped => ("○", RED),
            ServiceStatus::Unknown => ("?", GRAY),
        };
        content.push(Line::from(vec![
            Span::styled(indicator, Style::default().fg(color)),
            Span::raw(" "),
            Span::styled(format!("{:<12}", name), Style::default().fg(WHITE)),
            Span::styled(status.to_string(), Style::default().fg(color)),
        ]));
    }
    if content.is_empty() {
        content.push(Line::from(Span::styled("Probing...", Style::default().fg(GRAY))));
    }

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Services")
            .border_style(Style::default().fg(GRAY)),
    );
    f.render_widget(paragraph, area);
}

fn render_actions_panel(f: &mut Frame, area: Rect, app: &App) {
    let activity = match app.activity {
        Some(Activity::Scanning) => Span::styled("Scanning...", Style::default().fg(BLUE)),
        Some(Activity::Connecting) => Span::styled("Connecting...", Style::default().fg(BLUE)),
        None => Span::styled("Idle", Style::default().fg(GRAY)),
    };

    let selected = app
        .get_selected_device()
        .map(|d| match (&d.address, &d.name) {
            (Some(address), Some(name)) => format!("{} ({})", name, address),
            (Some(address), None) => address.to_string(),
            _ => d.raw.clone(),
        })
        .unwrap_or_else(|| "None".to_string());

    let content = vec![
        Line::from(vec![
            Span::styled("Status: ", Style::default().fg(GRAY)),
            activity,
        ]),
        Line::from(vec![
            Span::styled("Selected: ", Style::default().fg(GRAY)),
            Span::styled(selected, Style::default().fg(WHITE).add_modifier(Modifier::BOLD)),
        ]),
        Line::from(""),
        Line::from("[s] Scan for Devices"),
        Line::from("[Enter] Connect"),
        Line::from("[r] Refresh Services"),
        Line::from("[q] Quit"),
    ];

    let paragraph = Paragraph::new(content)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Bluetooth Manager")
                .border_style(Style::default().fg(GRAY)),
        )
        .alignment(Alignment::Left);
    f.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
