//! Current price table
//!
//! Renders a title line with the fetch time (and a staleness marker when the
//! prices come from a failed refresh) followed by one row per coin.

use chrono::Local;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, Widget},
};

use super::format::PriceFormatter;
use super::{column_widths, ordered, COLUMN_SPACING};
use crate::cache::CachedPrices;
use crate::data::display_symbol;

const BASIC_HEADERS: [&str; 3] = ["Coin", "Price", "24h Change"];
const VERBOSE_HEADERS: [&str; 5] = ["Coin", "Price", "24h Change", "Market Cap", "24h Volume"];

/// Title plus price table, sized by `width()` and `height()`
pub struct PriceReport<'a> {
    prices: &'a CachedPrices,
    formatter: &'a PriceFormatter,
    verbose: bool,
}

impl<'a> PriceReport<'a> {
    pub fn new(prices: &'a CachedPrices, formatter: &'a PriceFormatter) -> Self {
        Self {
            prices,
            formatter,
            verbose: false,
        }
    }

    /// Adds market cap and volume columns
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn headers(&self) -> &'static [&'static str] {
        if self.verbose {
            &VERBOSE_HEADERS
        } else {
            &BASIC_HEADERS
        }
    }

    /// Cell text and change color for each row, in display order
    fn rows(&self) -> Vec<(Vec<String>, Color)> {
        ordered(&self.prices.prices)
            .into_iter()
            .map(|point| {
                let mut cells = vec![
                    display_symbol(&point.coin, &point.symbol),
                    self.formatter.price(Some(point.price)),
                    self.formatter.percent(point.change_24h),
                ];
                if self.verbose {
                    cells.push(self.formatter.billions(point.market_cap));
                    cells.push(self.formatter.millions(point.volume));
                }
                (cells, self.formatter.change_color(point.change_24h))
            })
            .collect()
    }

    fn title(&self) -> Line<'static> {
        let time = self
            .prices
            .fetched_at
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string();

        let mut spans = vec![Span::styled(
            "Crypto Prices",
            Style::default().add_modifier(Modifier::BOLD),
        )];
        if self.prices.is_stale {
            let mut style = Style::default().add_modifier(Modifier::BOLD);
            if self.formatter.colored() {
                style = style.fg(Color::Yellow);
            }
            spans.push(Span::styled(" (stale)", style));
        }
        spans.push(Span::raw(format!(" @ {}", time)));
        Line::from(spans)
    }

    pub fn width(&self) -> u16 {
        let rows: Vec<Vec<String>> = self.rows().into_iter().map(|(cells, _)| cells).collect();
        let table: u16 = column_widths(self.headers(), &rows).iter().sum::<u16>()
            + COLUMN_SPACING * (self.headers().len() as u16 - 1);
        table.max(self.title().width() as u16)
    }

    pub fn height(&self) -> u16 {
        2 + self.prices.prices.len() as u16
    }
}

impl Widget for PriceReport<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [title_area, table_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(area);

        Paragraph::new(self.title()).render(title_area, buf);

        let rows = self.rows();
        let texts: Vec<Vec<String>> = rows.iter().map(|(cells, _)| cells.clone()).collect();
        let widths = column_widths(self.headers(), &texts);

        let header = Row::new(self.headers().iter().copied())
            .style(Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED));

        let body = rows.into_iter().map(|(cells, color)| {
            Row::new(cells.into_iter().enumerate().map(|(i, text)| {
                // Change column
                if i == 2 {
                    Cell::from(text).style(Style::default().fg(color))
                } else {
                    Cell::from(text)
                }
            }))
        });

        Table::new(body, widths.into_iter().map(Constraint::Length))
            .header(header)
            .column_spacing(COLUMN_SPACING)
            .render(table_area, buf);
    }
}
