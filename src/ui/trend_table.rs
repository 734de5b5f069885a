//! Price history table with one sparkline per coin

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Cell, Paragraph, Row, Table, Widget},
};

use super::format::PriceFormatter;
use super::widgets::PriceSparkline;
use super::{column_widths, ordered, COLUMN_SPACING};
use crate::data::{display_symbol, PriceHistory, PriceMap, PricePoint};
use crate::settings::GraphStyle;

/// Title plus a Coin / Trend / Price / Change table
pub struct TrendReport<'a> {
    prices: &'a PriceMap,
    history: &'a PriceHistory,
    formatter: &'a PriceFormatter,
    days: u32,
    graph_width: usize,
    style: GraphStyle,
}

impl<'a> TrendReport<'a> {
    pub fn new(prices: &'a PriceMap, history: &'a PriceHistory, formatter: &'a PriceFormatter) -> Self {
        Self {
            prices,
            history,
            formatter,
            days: 7,
            graph_width: 20,
            style: GraphStyle::Unicode,
        }
    }

    pub fn days(mut self, days: u32) -> Self {
        self.days = days;
        self
    }

    pub fn graph_width(mut self, width: usize) -> Self {
        self.graph_width = width;
        self
    }

    pub fn style(mut self, style: GraphStyle) -> Self {
        self.style = style;
        self
    }

    /// Coins with both a current price and a history, in display order
    fn charted(&self) -> Vec<(&'a PricePoint, Vec<f64>)> {
        ordered(self.prices)
            .into_iter()
            .filter_map(|point| {
                let samples = self.history.get(&point.coin)?;
                Some((point, samples.iter().map(|s| s.price).collect()))
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.charted().is_empty()
    }

    fn headers(&self) -> [String; 4] {
        [
            "Coin".to_string(),
            format!("{}-Day Price Trend", self.days),
            "Current Price".to_string(),
            "24h Change".to_string(),
        ]
    }

    fn texts(&self, charted: &[(&PricePoint, Vec<f64>)]) -> Vec<Vec<String>> {
        charted
            .iter()
            .map(|(point, _)| {
                vec![
                    display_symbol(&point.coin, &point.symbol),
                    " ".repeat(self.graph_width),
                    self.formatter.price(Some(point.price)),
                    self.formatter.percent(point.change_24h),
                ]
            })
            .collect()
    }

    fn title(&self) -> String {
        format!("{}-Day Price History", self.days)
    }

    pub fn width(&self) -> u16 {
        let headers = self.headers();
        let headers: Vec<&str> = headers.iter().map(String::as_str).collect();
        let widths = column_widths(&headers, &self.texts(&self.charted()));
        let table = widths.iter().sum::<u16>() + COLUMN_SPACING * 3;
        table.max(self.title().len() as u16)
    }

    pub fn height(&self) -> u16 {
        2 + self.charted().len() as u16
    }
}

impl Widget for TrendReport<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [title_area, table_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(area);

        Paragraph::new(Line::styled(
            self.title(),
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .render(title_area, buf);

        let charted = self.charted();
        let headers = self.headers();
        let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();
        let widths = column_widths(&header_refs, &self.texts(&charted));

        let header = Row::new(headers)
            .style(Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED));

        let rows = charted.iter().map(|(point, prices)| {
            let sparkline = PriceSparkline::new(prices, self.graph_width)
                .style(self.style)
                .colored(self.formatter.colored());
            Row::new(vec![
                Cell::from(display_symbol(&point.coin, &point.symbol)),
                Cell::from(sparkline.to_span()),
                Cell::from(self.formatter.price(Some(point.price))),
                Cell::from(self.formatter.percent(point.change_24h))
                    .style(Style::default().fg(self.formatter.change_color(point.change_24h))),
            ])
        });

        Table::new(rows, widths.into_iter().map(Constraint::Length))
            .header(header)
            .column_spacing(COLUMN_SPACING)
            .render(table_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CoinId, HistorySample};
    use chrono::{Duration, Utc};
    use ratatui::{backend::TestBackend, style::Color, Terminal};
    use rust_decimal::Decimal;

    fn point(coin: &str, price: i64, change: i64) -> PricePoint {
        PricePoint {
            coin: CoinId::new(coin).unwrap(),
            symbol: coin[..3].to_string(),
            name: coin.to_string(),
            price: Decimal::from(price),
            change_24h: Some(Decimal::from(change)),
            market_cap: Some(Decimal::from(price * 1000)),
            volume: None,
            observed_at: Utc::now(),
        }
    }

    fn samples(prices: &[f64]) -> Vec<HistorySample> {
        let start = Utc::now() - Duration::days(prices.len() as i64);
        prices
            .iter()
            .enumerate()
            .map(|(i, &price)| HistorySample {
                at: start + Duration::days(i as i64),
                price,
            })
            .collect()
    }

    fn fixtures() -> (PriceMap, PriceHistory) {
        let prices: PriceMap = [point("bitcoin", 50000, 2), point("ethereum", 3000, -1), point("solana", 150, 0)]
            .into_iter()
            .map(|p| (p.coin.clone(), p))
            .collect();

        let mut history = PriceHistory::new();
        history.insert(CoinId::new("bitcoin").unwrap(), samples(&[1.0, 2.0, 3.0, 8.0]));
        history.insert(CoinId::new("ethereum").unwrap(), samples(&[5.0, 4.0]));
        (prices, history)
    }

    #[test]
    fn test_only_coins_with_history_are_charted() {
        let (prices, history) = fixtures();
        let formatter = PriceFormatter::default();
        let report = TrendReport::new(&prices, &history, &formatter);

        assert_eq!(report.height(), 4);
        assert!(!report.is_empty());
    }

    #[test]
    fn test_empty_when_no_overlap() {
        let (prices, _) = fixtures();
        let history = PriceHistory::new();
        let formatter = PriceFormatter::default();

        assert!(TrendReport::new(&prices, &history, &formatter).is_empty());
    }

    #[test]
    fn test_render_shows_sparklines() {
        let (prices, history) = fixtures();
        let formatter = PriceFormatter::default();
        let report = TrendReport::new(&prices, &history, &formatter)
            .days(7)
            .graph_width(10);
        let (width, height) = (report.width(), report.height());

        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| f.render_widget(report, f.area())).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|cell| cell.symbol()).collect();
        assert!(text.contains("7-Day Price History"));
        assert!(text.contains("7-Day Price Trend"));
        assert!(text.contains("▁"));
        assert!(text.contains("█▁▁▁▁▁▁▁▁▁"), "falling series padded with its last level");
        assert!(text.contains("BTC"));
        assert!(!text.contains("SOL"));

        let red_block = buffer
            .content()
            .iter()
            .any(|cell| cell.symbol() == "█" && cell.fg == Color::Red);
        assert!(red_block, "falling series should be red");
    }
}
