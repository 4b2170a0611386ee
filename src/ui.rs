use crate::app::{App, HoverInfo, Tooltip};
use crate::data::model::{Year, FIRST_YEAR, LAST_YEAR};
use crate::format;
use crate::map::{DisplaySettings, Layer, MapLayers};
use crate::scale::BLACK;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Clear, Dataset as ChartDataset, GraphType, Paragraph, Widget},
    Frame,
};

const SIDE_PANEL_WIDTH: u16 = 34;

/// Split the screen into side panel, map and status bar
fn layout(area: Rect) -> (Rect, Rect, Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Panel + map
            Constraint::Length(1), // Status bar
        ])
        .split(area);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDE_PANEL_WIDTH), Constraint::Min(20)])
        .split(rows[0]);
    (cols[0], cols[1], rows[1])
}

fn map_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Electricity Access Map ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

/// Map drawing area (inside the border) for a terminal of the given size
pub fn map_inner(area: Rect) -> Rect {
    let (_, map, _) = layout(area);
    map_block().inner(map)
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let (panel, map, status) = layout(frame.area());

    render_map(frame, app, map);
    render_side_panel(frame, app, panel);
    render_status_bar(frame, app, status);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = map_block();
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut viewport = app.viewport.clone();
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let layers = app.map_renderer.render(
        &app.data,
        inner.width as usize,
        inner.height as usize,
        &viewport,
        &app.paint_state(),
    );
    frame.render_widget(MapWidget { layers }, inner);

    render_legend(frame, app, inner);
    if let Some(hover) = &app.hover {
        render_tooltip(frame, hover, inner);
    }
}

/// Fills as cell backgrounds with braille line work and labels on top
struct MapWidget {
    layers: MapLayers,
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let layers = &self.layers;
        let rows = (area.height as usize).min(layers.rows);
        let cols = (area.width as usize).min(layers.cols);

        for row in 0..rows {
            for col in 0..cols {
                let cell = &mut buf[(area.x + col as u16, area.y + row as u16)];
                let fill = layers.fill_at(col, row);
                if let Some(bg) = fill {
                    cell.set_bg(bg.into());
                }

                // Front to back: markers, country borders, district outlines
                if let Some(ch) = layers.markers.glyph(col, row) {
                    cell.set_char(ch).set_fg(Color::Red);
                } else if let Some(ch) = layers.borders.glyph(col, row) {
                    cell.set_char(ch).set_fg(Color::DarkGray);
                } else if let Some(ch) = layers.district_outlines.glyph(col, row) {
                    let fg = fill.map_or(Color::Gray, |c| c.blend(BLACK, 0.4).into());
                    cell.set_char(ch).set_fg(fg);
                }
            }
        }

        for (lx, ly, text) in &layers.labels {
            if *ly as usize >= rows {
                continue;
            }
            let y = area.y + *ly;
            for (i, ch) in text.chars().enumerate() {
                let col = *lx as usize + i;
                if col >= cols {
                    break;
                }
                let fg = match layers.fill_at(col, *ly as usize) {
                    Some(c) if c.luminance() < 110.0 => Color::White,
                    _ => Color::Black,
                };
                buf[(area.x + col as u16, y)]
                    .set_char(ch)
                    .set_fg(fg)
                    .set_style(Style::default().add_modifier(Modifier::BOLD));
            }
        }
    }
}

fn legend_label(layer: Layer, value: f64) -> String {
    match layer {
        Layer::NoAccess => format::people(value),
        Layer::AccessPct | Layer::LowWealth => format!("{value}%"),
    }
}

fn render_legend(frame: &mut Frame, app: &App, map: Rect) {
    let rows = app.layer.scale().legend(|v| legend_label(app.layer, v));
    let mut lines: Vec<Line> = rows
        .iter()
        .map(|(label, color)| {
            Line::from(vec![
                Span::styled("██ ", Style::default().fg(Color::from(*color))),
                Span::raw(label.clone()),
            ])
        })
        .collect();
    if app.highlight_threshold < 100.0 {
        lines.push(Line::from(vec![
            Span::styled("██ ", Style::default().fg(Color::White)),
            Span::raw(format!("> {}%", app.highlight_threshold)),
        ]));
    }

    let title = format!(" {} ", app.layer.title());
    let width = lines
        .iter()
        .map(Line::width)
        .max()
        .unwrap_or(0)
        .max(title.chars().count()) as u16
        + 2;
    let height = lines.len() as u16 + 2;
    if width > map.width || height > map.height {
        return;
    }
    let area = Rect::new(map.x, map.bottom() - height, width, height);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(title),
        ),
        area,
    );
}

/// Tooltip box position: left of the cursor in the right half of the map,
/// right of it otherwise, kept inside the map
pub fn tooltip_rect(col: u16, row: u16, width: u16, height: u16, map: Rect) -> Rect {
    let width = width.min(map.width);
    let height = height.min(map.height);
    let x = if col > map.x + map.width / 2 {
        col.saturating_sub(width + 1).max(map.x)
    } else {
        (col + 2).min(map.right() - width)
    };
    let y = (row + 1).min(map.bottom() - height).max(map.y);
    Rect::new(x, y, width, height)
}

fn tooltip_lines(tooltip: &Tooltip) -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    match tooltip {
        Tooltip::Area {
            city,
            country,
            pct,
            no_access,
        } => {
            let mut lines = Vec::with_capacity(4);
            match city {
                Some(city) => {
                    lines.push(Line::from(Span::styled(city.clone(), bold)));
                    lines.push(Line::from(Span::styled(
                        country.clone(),
                        Style::default().fg(Color::DarkGray),
                    )));
                }
                None => lines.push(Line::from(Span::styled(country.clone(), bold))),
            }
            lines.push(Line::from(vec![
                Span::raw("Percent Electricity Access: "),
                Span::styled(format::pct(*pct), bold),
            ]));
            lines.push(Line::from(vec![
                Span::raw("No. Of People Without Electricity: "),
                Span::styled(format::people_short(*no_access), bold),
            ]));
            lines
        }
        Tooltip::Project { text } => vec![
            Line::from(Span::styled("Project", bold)),
            Line::from(format!("Lead country: {text}")),
        ],
    }
}

fn render_tooltip(frame: &mut Frame, hover: &HoverInfo, map: Rect) {
    let lines = tooltip_lines(&hover.tooltip);
    let width = lines.iter().map(Line::width).max().unwrap_or(0) as u16 + 2;
    let height = lines.len() as u16 + 2;
    let area = tooltip_rect(hover.col, hover.row, width, height, map);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Gray)),
        ),
        area,
    );
}

fn label(text: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(text.into(), Style::default().fg(Color::DarkGray)))
}

fn value(text: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(
        format!("  {}", text.into()),
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    ))
}

fn world_lines(app: &App) -> Vec<Line<'static>> {
    let data = &app.data;
    let year = app.year();
    vec![
        Line::from(Span::styled(
            "World",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        label(format!("Data is calculated for {} countries", data.country_count())),
        Line::default(),
        label(format!("Percent Electricity Access ({})", year.get())),
        value(format::pct(data.world.pct_access(year))),
        label("No. Of People Without Electricity"),
        value(format::people(data.world.no_access(year))),
        label(format!("Low-wealth districts (RWI < {})", data.rwi_cutoff)),
        value(format!(
            "{} access, {} without",
            format::pct(data.world_low_rwi.pct_access(year)),
            format::people(data.world_low_rwi.no_access(year))
        )),
    ]
}

fn country_lines(app: &App, iso: &str, name: &str) -> Vec<Line<'static>> {
    let data = &app.data;
    let year = app.year();
    let mut lines = vec![
        Line::from(Span::styled(
            name.to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        label("<- Back to Global View [Backspace]"),
        Line::default(),
    ];

    let latest = data.series_point(name, LAST_YEAR);
    lines.push(label(format!("Percent Electricity Access ({LAST_YEAR})")));
    lines.push(value(format::pct(latest.map(|p| p.pct))));
    lines.push(label("No. Of People Without Electricity"));
    lines.push(value(
        latest.map_or_else(|| "NA".to_string(), |p| format::people(p.no_access())),
    ));

    if let Some(c) = data.country(iso) {
        lines.push(label(format!("{} districts in {}", c.districts, year.get())));
        lines.push(value(format!(
            "{} access, {} without",
            format::pct(c.pct_access(year)),
            format::people(c.no_access(year))
        )));
        lines.push(label(format!("Low-wealth districts (RWI < {})", data.rwi_cutoff)));
        lines.push(value(format::pct(c.low_rwi.pct_access(year))));
    }

    if let Some(idx) = app.selected_district {
        let shape = &data.district_shapes[idx];
        let district = &data.districts[idx];
        lines.push(Line::default());
        lines.push(label(format!(
            "District: {}",
            shape.props.display_name().unwrap_or("Unnamed")
        )));
        lines.push(value(format!(
            "{} access, {} without",
            format::pct(district.pct_access),
            format::people_short(district.no_access)
        )));
    }

    if let Some(s) = data.project_summary(name) {
        lines.push(Line::default());
        lines.push(label(format!("Projects: {}", s.projects)));
        lines.push(value(format!(
            "${} granted, ${} spent",
            format::si(s.grant_amount, 3, true),
            format::si(s.expenses, 3, true)
        )));
    }
    lines
}

fn render_side_panel(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Overview ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let selected = app
        .selected_country
        .as_deref()
        .map(|iso| (iso, app.data.taxonomy.name_of(iso)));
    let lines = match selected {
        Some((iso, name)) => country_lines(app, iso, name),
        None => world_lines(app),
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(lines.len() as u16 + 1), Constraint::Min(0)])
        .split(inner);
    frame.render_widget(Paragraph::new(lines), chunks[0]);

    if let Some((_, name)) = selected {
        render_series_chart(frame, app, name, chunks[1]);
    }
}

fn render_series_chart(frame: &mut Frame, app: &App, country: &str, area: Rect) {
    if area.height < 5 {
        return;
    }
    let series = app.data.series_for(country);
    if series.is_empty() {
        frame.render_widget(
            Paragraph::new(vec![label("Access over time"), value("NA")]),
            area,
        );
        return;
    }

    let pct: Vec<(f64, f64)> = series.iter().map(|p| (p.year as f64, p.pct)).collect();
    let low: Vec<(f64, f64)> = series
        .iter()
        .filter_map(|p| p.pct_low.map(|v| (p.year as f64, v)))
        .collect();
    let high: Vec<(f64, f64)> = series
        .iter()
        .filter_map(|p| p.pct_high.map(|v| (p.year as f64, v)))
        .collect();
    let current = [(app.year().get() as f64, 0.0), (app.year().get() as f64, 100.0)];

    let band = Style::default().fg(Color::DarkGray);
    let datasets = vec![
        ChartDataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(band)
            .data(&low),
        ChartDataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(band)
            .data(&high),
        ChartDataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Blue))
            .data(&current),
        ChartDataset::default()
            .name("% access")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Yellow))
            .data(&pct),
    ];

    let chart = Chart::new(datasets)
        .block(Block::default().title(Span::styled(
            "Access over time",
            Style::default().fg(Color::DarkGray),
        )))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([FIRST_YEAR as f64, LAST_YEAR as f64])
                .labels([FIRST_YEAR.to_string(), LAST_YEAR.to_string()]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, 100.0])
                .labels(["0", "50", "100"]),
        );
    frame.render_widget(chart, area);
}

/// Key hint that is green while its layer is on
fn toggle(on: bool, text: &'static str) -> Span<'static> {
    Span::styled(
        text,
        Style::default().fg(if on { Color::Green } else { Color::DarkGray }),
    )
}

fn layer_toggles(settings: &DisplaySettings) -> [Span<'static>; 3] {
    [
        toggle(settings.show_projects, "[P]rojects "),
        toggle(settings.show_labels, "[L]abels "),
        toggle(settings.show_district_outlines, "[O]utlines "),
    ]
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);
    let year = app.year();

    let mut status = vec![
        Span::styled(" Zoom: ", dim),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" Layer: ", dim),
        Span::styled(app.layer.number().to_string(), Style::default().fg(Color::Magenta)),
        Span::styled(" Year: ", dim),
        Span::styled(year_label(year), Style::default().fg(Color::Yellow)),
        Span::styled(" Highlight: ", dim),
        Span::styled(
            format!("{}% ", app.highlight_threshold),
            Style::default().fg(Color::Yellow),
        ),
    ];
    status.extend(layer_toggles(&app.map_renderer.settings));
    status.extend([
        Span::styled("| ", dim),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(
            " | hjkl:pan +/-:zoom 1-3:layer </>:year [/]:highlight bksp:world q:quit",
            dim,
        ),
    ]);
    frame.render_widget(Paragraph::new(Line::from(status)), area);
}

fn year_label(year: Year) -> String {
    format!("{} ({FIRST_YEAR}-{LAST_YEAR})", year.get())
}
