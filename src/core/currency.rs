use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Ngn,
    Usd,
    Gbp,
    Eur,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unsupported currency: {0}")]
pub struct UnknownCurrency(pub String);

impl Currency {
    pub fn code(self) -> &'static str {
        match self {
            Currency::Ngn => "NGN",
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
            Currency::Eur => "EUR",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Ngn => "\u{20A6}",
            Currency::Usd => "$",
            Currency::Gbp => "\u{00A3}",
            Currency::Eur => "\u{20AC}",
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NGN" => Ok(Currency::Ngn),
            "USD" => Ok(Currency::Usd),
            "GBP" => Ok(Currency::Gbp),
            "EUR" => Ok(Currency::Eur),
            _ => Err(UnknownCurrency(s.to_string())),
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Format with symbol, thousands separators and two decimals, e.g. `-₦1,250,000.00`.
pub fn format_amount(amount: Decimal, currency: Currency) -> String {
    let rounded = amount.round_dp(2);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let digits = format!("{:.2}", rounded.abs());
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));
    format!("{sign}{}{}.{fraction}", currency.symbol(), group_thousands(whole))
}

fn group_thousands(whole: &str) -> String {
    let mut out = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub type SubscriptionId = usize;

/// The display currency for a session.
///
/// Holders read `current()` and pass it to formatting functions explicitly;
/// anything that caches formatted output subscribes to hear about changes.
pub struct CurrencyContext {
    current: Currency,
    next_id: SubscriptionId,
    subscribers: Vec<(SubscriptionId, Box<dyn Fn(Currency)>)>,
}

impl CurrencyContext {
    pub fn new(current: Currency) -> Self {
        CurrencyContext {
            current,
            next_id: 0,
            subscribers: Vec::new(),
        }
    }

    pub fn current(&self) -> Currency {
        self.current
    }

    pub fn subscribe(&mut self, listener: impl Fn(Currency) + 'static) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    /// Switch currency and notify subscribers. Publishing the current value is a no-op.
    pub fn publish(&mut self, currency: Currency) {
        if currency == self.current {
            return;
        }
        log::debug!("display currency {} -> {}", self.current, currency);
        self.current = currency;
        for (_, listener) in &self.subscribers {
            listener(currency);
        }
    }

    pub fn format(&self, amount: Decimal) -> String {
        format_amount(amount, self.current)
    }
}

impl Default for CurrencyContext {
    fn default() -> Self {
        CurrencyContext::new(Currency::default())
    }
}

impl std::fmt::Debug for CurrencyContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrencyContext")
            .field("current", &self.current)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
