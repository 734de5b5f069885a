//! Number formatting for prices, percentages and large amounts

use ratatui::style::Color;
use rust_decimal::Decimal;

use crate::settings::{ColorScheme, Settings, SymbolPosition};

/// Placeholder for values the API did not report
pub const NOT_AVAILABLE: &str = "N/A";

/// Prices below 1 unit get this many decimals regardless of settings
const SUB_UNIT_DECIMALS: u32 = 6;

/// Formats amounts in the configured currency
#[derive(Debug, Clone, PartialEq)]
pub struct PriceFormatter {
    symbol: String,
    position: SymbolPosition,
    price_decimals: u32,
    percent_decimals: u32,
    colored: bool,
}

impl Default for PriceFormatter {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl PriceFormatter {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            symbol: settings.currency.symbol.clone(),
            position: settings.currency.symbol_position,
            price_decimals: settings.display.price_decimals,
            percent_decimals: settings.display.percent_decimals,
            colored: settings.graph.color_scheme == ColorScheme::Default,
        }
    }

    /// False for the monochrome scheme
    pub fn colored(&self) -> bool {
        self.colored
    }

    /// Color for a change under the configured scheme
    pub fn change_color(&self, value: Option<Decimal>) -> Color {
        if self.colored {
            change_color(value)
        } else {
            Color::Reset
        }
    }

    /// Formats a price, scaling the precision to its magnitude
    ///
    /// Prices of 1000 and above get thousands separators, prices below 1 get
    /// six decimals so that small coins stay readable.
    pub fn price(&self, value: Option<Decimal>) -> String {
        let Some(value) = value else {
            return NOT_AVAILABLE.to_string();
        };

        let thousand = Decimal::from(1000);
        let amount = if value.abs() >= thousand {
            group_thousands(&fixed(value, self.price_decimals))
        } else if value.abs() >= Decimal::ONE {
            fixed(value, self.price_decimals)
        } else {
            fixed(value, SUB_UNIT_DECIMALS)
        };

        self.with_symbol(&amount)
    }

    /// Formats a percentage change, always signed when positive
    pub fn percent(&self, value: Option<Decimal>) -> String {
        match value {
            None => NOT_AVAILABLE.to_string(),
            Some(v) if v > Decimal::ZERO => format!("+{}%", fixed(v, self.percent_decimals)),
            Some(v) => format!("{}%", fixed(v, self.percent_decimals)),
        }
    }

    /// Formats a market cap in billions (e.g. `$980.00B`)
    pub fn billions(&self, value: Option<Decimal>) -> String {
        self.compact(value, Decimal::from(1_000_000_000u64), "B")
    }

    /// Formats a volume in millions (e.g. `$35.20M`)
    pub fn millions(&self, value: Option<Decimal>) -> String {
        self.compact(value, Decimal::from(1_000_000u64), "M")
    }

    fn compact(&self, value: Option<Decimal>, unit: Decimal, suffix: &str) -> String {
        match value {
            None => NOT_AVAILABLE.to_string(),
            Some(v) => self.with_symbol(&format!("{}{}", fixed(v / unit, 2), suffix)),
        }
    }

    fn with_symbol(&self, amount: &str) -> String {
        match self.position {
            SymbolPosition::Prefix => format!("{}{}", self.symbol, amount),
            SymbolPosition::Suffix => format!("{} {}", amount, self.symbol),
        }
    }
}

/// Color for a change: green when up, red when down
pub fn change_color(value: Option<Decimal>) -> Color {
    match value {
        Some(v) if v > Decimal::ZERO => Color::Green,
        Some(v) if v < Decimal::ZERO => Color::Red,
        _ => Color::Reset,
    }
}

/// Rounds half away from zero and pads to exactly `decimals` places
fn fixed(value: Decimal, decimals: u32) -> String {
    let rounded = value.round_dp_with_strategy(
        decimals,
        rust_decimal::RoundingStrategy::MidpointAwayFromZero,
    );
    format!("{:.*}", decimals as usize, rounded)
}

/// Inserts `,` between groups of three digits in the integer part
fn group_thousands(number: &str) -> String {
    let (sign, digits) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };
    let (integer, fraction) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, c) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match fraction {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Option<Decimal> {
        Some(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn test_price_large_values_are_grouped() {
        let f = PriceFormatter::default();
        assert_eq!(f.price(dec("50000.5")), "$50,000.50");
        assert_eq!(f.price(dec("1234567.891")), "$1,234,567.89");
        assert_eq!(f.price(dec("1000")), "$1,000.00");
    }

    #[test]
    fn test_price_mid_values() {
        let f = PriceFormatter::default();
        assert_eq!(f.price(dec("999.999")), "$1000.00");
        assert_eq!(f.price(dec("3.5")), "$3.50");
        assert_eq!(f.price(dec("1")), "$1.00");
    }

    #[test]
    fn test_price_sub_unit_values_use_six_decimals() {
        let f = PriceFormatter::default();
        assert_eq!(f.price(dec("0.5")), "$0.500000");
        assert_eq!(f.price(dec("0.00001234")), "$0.000012");
    }

    #[test]
    fn test_price_missing_is_na() {
        assert_eq!(PriceFormatter::default().price(None), "N/A");
    }

    #[test]
    fn test_price_suffix_symbol_and_decimals() {
        let mut settings = Settings::default();
        settings.currency.symbol = "€".to_string();
        settings.currency.symbol_position = SymbolPosition::Suffix;
        settings.display.price_decimals = 0;

        let f = PriceFormatter::from_settings(&settings);
        assert_eq!(f.price(dec("2500.4")), "2,500 €");
    }

    #[test]
    fn test_percent_signs() {
        let f = PriceFormatter::default();
        assert_eq!(f.percent(dec("2.345")), "+2.35%");
        assert_eq!(f.percent(dec("-1.2")), "-1.20%");
        assert_eq!(f.percent(dec("0")), "0.00%");
        assert_eq!(f.percent(None), "N/A");
    }

    #[test]
    fn test_compact_amounts() {
        let f = PriceFormatter::default();
        assert_eq!(f.billions(dec("980000000000")), "$980.00B");
        assert_eq!(f.millions(dec("35200000")), "$35.20M");
        assert_eq!(f.billions(None), "N/A");
    }

    #[test]
    fn test_change_color() {
        assert_eq!(change_color(dec("1.5")), Color::Green);
        assert_eq!(change_color(dec("-0.1")), Color::Red);
        assert_eq!(change_color(dec("0")), Color::Reset);
        assert_eq!(change_color(None), Color::Reset);
    }

    #[test]
    fn test_monochrome_scheme_has_no_change_colors() {
        let mut settings = Settings::default();
        settings.graph.color_scheme = ColorScheme::Monochrome;

        let f = PriceFormatter::from_settings(&settings);
        assert!(!f.colored());
        assert_eq!(f.change_color(dec("1.5")), Color::Reset);
        assert_eq!(PriceFormatter::default().change_color(dec("1.5")), Color::Green);
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("123"), "123");
        assert_eq!(group_thousands("1234.50"), "1,234.50");
        assert_eq!(group_thousands("-1234567"), "-1,234,567");
    }
}
