//! Terminal output for coinprice
//!
//! Reports are ratatui widgets rendered into an off-screen buffer and then
//! written to stdout line by line, so output scrolls like any other command
//! and can be piped. Styling is only emitted when stdout is a terminal.

pub mod format;
pub mod price_table;
pub mod trend_table;
pub mod widgets;

pub use format::PriceFormatter;
pub use price_table::PriceReport;
pub use trend_table::TrendReport;

use std::io::{self, Write};

use crossterm::style::{Attribute, Color as TermColor, ContentStyle, StyledContent, Stylize};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier},
    widgets::Widget,
};

use crate::cache::CachedPrices;
use crate::data::{display_symbol, CoinId, PriceMap, PricePoint};

/// Blank columns between table columns
pub(crate) const COLUMN_SPACING: u16 = 2;

/// Prices sorted by market cap, largest first; coins without one go last
pub(crate) fn ordered(prices: &PriceMap) -> Vec<&PricePoint> {
    let mut points: Vec<&PricePoint> = prices.values().collect();
    points.sort_by(|a, b| match (a.market_cap, b.market_cap) {
        (Some(x), Some(y)) => y.cmp(&x).then_with(|| a.coin.cmp(&b.coin)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.coin.cmp(&b.coin),
    });
    points
}

/// Width of each column: the widest of its header and cells
pub(crate) fn column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<u16> {
    headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0) as u16
        })
        .collect()
}

/// Renders `widget` into a `width` x `height` buffer and writes it to `out`
pub fn write_widget<W: Widget>(
    widget: W,
    width: u16,
    height: u16,
    styled: bool,
    out: &mut impl Write,
) -> io::Result<()> {
    let area = Rect::new(0, 0, width, height);
    let mut buffer = Buffer::empty(area);
    widget.render(area, &mut buffer);
    write_buffer(&buffer, styled, out)
}

/// Writes a buffer as text lines, trimming trailing blanks
///
/// Consecutive cells with the same style are written as one styled run.
pub fn write_buffer(buffer: &Buffer, styled: bool, out: &mut impl Write) -> io::Result<()> {
    let area = buffer.area;

    for y in area.top()..area.bottom() {
        let cells: Vec<_> = (area.left()..area.right())
            .filter_map(|x| buffer.cell((x, y)))
            .collect();
        let end = cells
            .iter()
            .rposition(|cell| !cell.symbol().trim().is_empty())
            .map_or(0, |i| i + 1);

        let mut runs: Vec<(ContentStyle, String)> = Vec::new();
        for cell in &cells[..end] {
            let style = if styled {
                content_style(cell.fg, cell.bg, cell.modifier)
            } else {
                ContentStyle::new()
            };
            match runs.last_mut() {
                Some((last, text)) if *last == style => text.push_str(cell.symbol()),
                _ => runs.push((style, cell.symbol().to_string())),
            }
        }

        for (style, text) in runs {
            write!(out, "{}", StyledContent::new(style, text))?;
        }
        writeln!(out)?;
    }

    Ok(())
}

fn content_style(fg: Color, bg: Color, modifier: Modifier) -> ContentStyle {
    let mut style = ContentStyle::new();
    style.foreground_color = to_crossterm(fg);
    style.background_color = to_crossterm(bg);
    if modifier.contains(Modifier::BOLD) {
        style.attributes.set(Attribute::Bold);
    }
    if modifier.contains(Modifier::DIM) {
        style.attributes.set(Attribute::Dim);
    }
    if modifier.contains(Modifier::UNDERLINED) {
        style.attributes.set(Attribute::Underlined);
    }
    style
}

/// Maps a ratatui color onto crossterm; `Reset` means "leave as is"
fn to_crossterm(color: Color) -> Option<TermColor> {
    let mapped = match color {
        Color::Reset => return None,
        Color::Black => TermColor::Black,
        Color::Red => TermColor::DarkRed,
        Color::Green => TermColor::DarkGreen,
        Color::Yellow => TermColor::DarkYellow,
        Color::Blue => TermColor::DarkBlue,
        Color::Magenta => TermColor::DarkMagenta,
        Color::Cyan => TermColor::DarkCyan,
        Color::Gray => TermColor::Grey,
        Color::DarkGray => TermColor::DarkGrey,
        Color::LightRed => TermColor::Red,
        Color::LightGreen => TermColor::Green,
        Color::LightYellow => TermColor::Yellow,
        Color::LightBlue => TermColor::Blue,
        Color::LightMagenta => TermColor::Magenta,
        Color::LightCyan => TermColor::Cyan,
        Color::White => TermColor::White,
        Color::Rgb(r, g, b) => TermColor::Rgb { r, g, b },
        Color::Indexed(i) => TermColor::AnsiValue(i),
    };
    Some(mapped)
}

/// One-line summary for quiet mode, e.g. `BTC: $50,000.00 (+2.35%)`
///
/// Shows bitcoin when it was requested, otherwise the largest coin.
pub fn quiet_line(prices: &CachedPrices, formatter: &PriceFormatter, styled: bool) -> Option<String> {
    let bitcoin = CoinId::new("bitcoin").ok();
    let point = bitcoin
        .and_then(|id| prices.prices.get(&id))
        .or_else(|| ordered(&prices.prices).into_iter().next())?;

    let change = formatter.percent(point.change_24h);
    let change = match (styled, to_crossterm(formatter.change_color(point.change_24h))) {
        (true, Some(color)) => change.with(color).to_string(),
        _ => change,
    };

    let mut line = format!(
        "{}: {} ({})",
        display_symbol(&point.coin, &point.symbol),
        formatter.price(Some(point.price)),
        change
    );
    if prices.is_stale {
        let marker = " (stale)";
        if styled && formatter.colored() {
            line.push_str(&marker.yellow().to_string());
        } else {
            line.push_str(marker);
        }
    }
    Some(line)
}
