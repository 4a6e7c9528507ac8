//! Intent classification and replies.

use serde::{Deserialize, Serialize};
use sitebook_shared::types::format_inr;

use crate::dashboard::MonthOverview;

/// What the operator asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Hello.
    Greeting,
    /// Net profit for the month.
    Profit,
    /// Income for the month.
    Income,
    /// Expenses for the month.
    Expense,
    /// Money still owed by clients.
    Receivables,
    /// Items to reorder.
    LowStock,
    /// Vehicles due for service.
    ServiceDue,
    /// What the assistant can answer.
    Help,
    /// Not understood.
    Unknown,
}

/// An assistant answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantReply {
    /// Classified intent.
    pub intent: Intent,
    /// Reply text.
    pub text: String,
}

/// Checked in order; the first rule with a matching keyword wins.
const RULES: &[(Intent, &[&str])] = &[
    (Intent::Help, &["help", "what can you"]),
    (Intent::Profit, &["profit", "net", "margin"]),
    (Intent::Receivables, &["outstanding", "pending bill", "due from", "receivable", "owe", "balance"]),
    (Intent::Income, &["income", "earning", "revenue", "received", "collection"]),
    (Intent::Expense, &["expense", "spent", "spend", "cost"]),
    (Intent::LowStock, &["stock", "inventory", "reorder"]),
    (Intent::ServiceDue, &["service", "maintenance", "servicing"]),
    (Intent::Greeting, &["hello", "hi", "namaste", "hey"]),
];

/// Rule-based assistant.
pub struct AssistantService;

impl AssistantService {
    /// Classifies a message by keyword.
    #[must_use]
    pub fn classify(message: &str) -> Intent {
        let text = message.to_lowercase();
        let words: Vec<&str> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        RULES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| matches_keyword(&text, &words, k)))
            .map_or(Intent::Unknown, |(intent, _)| *intent)
    }

    /// Answers a message from the month overview.
    #[must_use]
    pub fn respond(message: &str, overview: &MonthOverview, business: &str) -> AssistantReply {
        let intent = Self::classify(message);
        let month = overview.month.as_str();

        let text = match intent {
            Intent::Greeting => format!("Namaste! I keep the books for {business}. Ask me about profit, income, expenses, dues, stock or servicing."),
            Intent::Help => "I can tell you this month's profit, income, expenses, outstanding client dues, low-stock items and vehicles due for service.".to_string(),
            Intent::Profit => {
                let verdict = if overview.net.is_sign_negative() && !overview.net.is_zero() { "loss" } else { "profit" };
                format!(
                    "Net cash {verdict} for {month} is {} (income {} less expenses {}).",
                    format_inr(overview.net.abs()),
                    format_inr(overview.income),
                    format_inr(overview.expense)
                )
            }
            Intent::Income => format!("Income recorded for {month} is {}.", format_inr(overview.income)),
            Intent::Expense => format!("Expenses recorded for {month} are {}.", format_inr(overview.expense)),
            Intent::Receivables => format!(
                "Clients owe {} across all invoices. Unpaid fleet work for {month} is {}.",
                format_inr(overview.outstanding),
                format_inr(overview.unpaid_work)
            ),
            Intent::LowStock => match overview.low_stock_count {
                0 => "All stock is above reorder level.".to_string(),
                1 => "1 item is at or below its reorder level.".to_string(),
                n => format!("{n} items are at or below their reorder level."),
            },
            Intent::ServiceDue => {
                if overview.service_due.is_empty() {
                    "No vehicle is due for service.".to_string()
                } else {
                    format!("Due for service: {}.", overview.service_due.join(", "))
                }
            }
            Intent::Unknown => "Sorry, I did not understand. Type 'help' to see what I can answer.".to_string(),
        };

        AssistantReply { intent, text }
    }
}

/// Multi-word keywords match as substrings; single words must match a whole word.
fn matches_keyword(text: &str, words: &[&str], keyword: &str) -> bool {
    if keyword.contains(' ') {
        text.contains(keyword)
    } else {
        words.iter().any(|w| w.starts_with(keyword))
    }
}
