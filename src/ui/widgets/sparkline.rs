//! Price trend sparkline for table cells

use ratatui::{
    style::{Color, Style},
    text::Span,
};

use crate::settings::GraphStyle;

/// Block characters for the eight price levels
const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// ASCII stand-ins for terminals without block glyphs
const ASCII_LEVELS: [char; 8] = ['_', '.', '-', '=', '+', '*', '#', '@'];

/// Drawn when there is no movement to show
const FLAT: char = '─';

/// Direction of a price series, first sample against last
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    pub fn color(self) -> Color {
        match self {
            Trend::Up => Color::Green,
            Trend::Down => Color::Red,
            Trend::Flat => Color::Reset,
        }
    }
}

/// A one-line sparkline of prices, sized to a fixed number of characters
pub struct PriceSparkline<'a> {
    prices: &'a [f64],
    width: usize,
    style: GraphStyle,
    colored: bool,
}

impl<'a> PriceSparkline<'a> {
    pub fn new(prices: &'a [f64], width: usize) -> Self {
        Self {
            prices,
            width,
            style: GraphStyle::Unicode,
            colored: true,
        }
    }

    pub fn style(mut self, style: GraphStyle) -> Self {
        self.style = style;
        self
    }

    /// When false the sparkline keeps the default color whatever the trend
    pub fn colored(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    pub fn trend(&self) -> Trend {
        match (self.prices.first(), self.prices.last()) {
            (Some(first), Some(last)) if last > first => Trend::Up,
            (Some(first), Some(last)) if last < first => Trend::Down,
            _ => Trend::Flat,
        }
    }

    /// Renders the sparkline as plain characters, exactly `width` long
    pub fn render_text(&self) -> String {
        if self.prices.len() < 2 {
            return FLAT.to_string().repeat(self.width);
        }

        let (min, max) = self
            .prices
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &p| (lo.min(p), hi.max(p)));
        if min == max {
            return FLAT.to_string().repeat(self.width);
        }

        let levels = match self.style {
            GraphStyle::Unicode => &BLOCKS,
            GraphStyle::Ascii => &ASCII_LEVELS,
        };

        self.sample()
            .into_iter()
            .map(|price| {
                let index = (((price - min) / (max - min)) * 7.0) as usize;
                levels[index.min(7)]
            })
            .collect()
    }

    /// Renders the sparkline colored by its trend
    pub fn to_span(&self) -> Span<'static> {
        let color = if self.colored {
            self.trend().color()
        } else {
            Color::Reset
        };
        Span::styled(self.render_text(), Style::default().fg(color))
    }

    /// Every n-th price so the series fits the width, padded with the last one
    fn sample(&self) -> Vec<f64> {
        let step = (self.prices.len() / self.width.max(1)).max(1);
        let mut sampled: Vec<f64> = self
            .prices
            .iter()
            .step_by(step)
            .take(self.width)
            .copied()
            .collect();

        if let Some(&last) = sampled.last() {
            sampled.resize(self.width, last);
        }
        sampled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_series_is_flat_line() {
        assert_eq!(PriceSparkline::new(&[], 5).render_text(), "─────");
        assert_eq!(PriceSparkline::new(&[42.0], 3).render_text(), "───");
    }

    #[test]
    fn test_constant_series_is_flat_line() {
        let sparkline = PriceSparkline::new(&[7.0, 7.0, 7.0], 4);
        assert_eq!(sparkline.render_text(), "────");
        assert_eq!(sparkline.trend(), Trend::Flat);
    }

    #[test]
    fn test_min_and_max_map_to_extreme_blocks() {
        let sparkline = PriceSparkline::new(&[1.0, 2.0, 3.0, 8.0], 4);
        let text: Vec<char> = sparkline.render_text().chars().collect();

        assert_eq!(text[0], '▁');
        assert_eq!(text[3], '█');
    }

    #[test]
    fn test_short_series_is_padded_with_last_value() {
        let sparkline = PriceSparkline::new(&[1.0, 2.0], 5);
        assert_eq!(sparkline.render_text(), "▁████");
    }

    #[test]
    fn test_long_series_is_sampled_to_width() {
        let prices: Vec<f64> = (0..40).map(f64::from).collect();
        let sparkline = PriceSparkline::new(&prices, 10);

        assert_eq!(sparkline.render_text().chars().count(), 10);
    }

    #[test]
    fn test_ascii_style() {
        let sparkline = PriceSparkline::new(&[1.0, 8.0], 2).style(GraphStyle::Ascii);
        assert_eq!(sparkline.render_text(), "_@");
    }

    #[test]
    fn test_trend_colors() {
        assert_eq!(PriceSparkline::new(&[1.0, 2.0], 2).trend(), Trend::Up);
        assert_eq!(PriceSparkline::new(&[2.0, 1.0], 2).trend(), Trend::Down);
        assert_eq!(Trend::Up.color(), Color::Green);
        assert_eq!(Trend::Down.color(), Color::Red);

        let span = PriceSparkline::new(&[2.0, 1.0], 2).to_span();
        assert_eq!(span.style.fg, Some(Color::Red));
    }

    #[test]
    fn test_uncolored_sparkline() {
        let span = PriceSparkline::new(&[2.0, 1.0], 2).colored(false).to_span();
        assert_eq!(span.style.fg, Some(Color::Reset));
    }
}
