//! # Command Parser
//!
//! One operator command per stdin line. Words are whitespace separated;
//! trailing free text (reasons, descriptions, search queries) keeps its
//! spaces. Line numbers are 1-based as printed in the order summary.
//!
//! ```text
//! scan <barcode> [qty]            add <product_id> [qty]
//! search <text>                   page <n>            low-stock
//! qty <line> <qty>                remove <line>       void
//! discount <pct>% | <amount> | off
//! tax on|off                      customer <id> | none
//! find-customer <text>
//! pay <amount>                    abort               commit
//! cancel | new                    show                receipt <number>
//! payment|credit|debit <customer_id> <amount> [description]
//! history <customer_id>
//! stock in|out|set <product_id> <units> <reason>
//! movements [product_id] [from YYYY-MM-DD] [to YYYY-MM-DD]
//! help                            quit
//! ```

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use till_core::{Money, Quantity, StockChange, TransactionType};

use crate::error::{TerminalError, TerminalResult};

/// A parsed operator command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Scan { barcode: String, quantity: Quantity },
    Add { product_id: i64, quantity: Quantity },
    Search { query: String },
    Page { page: u32 },
    LowStock,
    SetQuantity { line: usize, quantity: Quantity },
    Remove { line: usize },
    Void,
    DiscountPercent(Decimal),
    DiscountFixed(Money),
    DiscountOff,
    Tax(bool),
    AttachCustomer(i64),
    DetachCustomer,
    FindCustomer { query: String },
    Pay(Money),
    Abort,
    Commit,
    Cancel,
    NewOrder,
    Show,
    Receipt { receipt_number: String },
    Post {
        transaction_type: TransactionType,
        customer_id: i64,
        amount: Money,
        description: Option<String>,
    },
    History { customer_id: i64 },
    Stock {
        product_id: i64,
        change: StockChange,
        reason: String,
    },
    Movements {
        product_id: Option<i64>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = TerminalError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match verb.to_ascii_lowercase().as_str() {
            "scan" => Command::Scan {
                barcode: required(&args, 0, "barcode")?.to_string(),
                quantity: optional_quantity(&args, 1)?,
            },
            "add" => Command::Add {
                product_id: parse_id(required(&args, 0, "product id")?)?,
                quantity: optional_quantity(&args, 1)?,
            },
            "search" => Command::Search {
                query: rest.to_string(),
            },
            "page" => Command::Page {
                page: parse_page(required(&args, 0, "page")?)?,
            },
            "low-stock" => Command::LowStock,
            "qty" => Command::SetQuantity {
                line: parse_line(required(&args, 0, "line")?)?,
                quantity: required(&args, 1, "quantity")?.parse()?,
            },
            "remove" => Command::Remove {
                line: parse_line(required(&args, 0, "line")?)?,
            },
            "void" => Command::Void,
            "discount" => parse_discount(required(&args, 0, "discount")?)?,
            "tax" => match required(&args, 0, "on|off")? {
                "on" => Command::Tax(true),
                "off" => Command::Tax(false),
                other => return Err(TerminalError::validation(format!("tax {}: expected on|off", other))),
            },
            "customer" => match required(&args, 0, "customer id")? {
                "none" | "off" => Command::DetachCustomer,
                id => Command::AttachCustomer(parse_id(id)?),
            },
            "find-customer" => Command::FindCustomer {
                query: rest.to_string(),
            },
            "pay" => Command::Pay(required(&args, 0, "amount")?.parse()?),
            "abort" => Command::Abort,
            "commit" => Command::Commit,
            "cancel" => Command::Cancel,
            "new" => Command::NewOrder,
            "show" => Command::Show,
            "receipt" => Command::Receipt {
                receipt_number: required(&args, 0, "receipt number")?.to_string(),
            },
            "payment" => parse_post(TransactionType::Payment, rest)?,
            "credit" => parse_post(TransactionType::Credit, rest)?,
            "debit" => parse_post(TransactionType::Debit, rest)?,
            "history" => Command::History {
                customer_id: parse_id(required(&args, 0, "customer id")?)?,
            },
            "stock" => parse_stock(rest)?,
            "movements" => parse_movements(&args)?,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            "" => return Err(TerminalError::unknown_command("Empty command")),
            other => {
                return Err(TerminalError::unknown_command(format!(
                    "Unknown command '{}', try 'help'",
                    other
                )))
            }
        };

        Ok(command)
    }
}

/// Help text printed by `help`.
pub const HELP: &str = "\
scan <barcode> [qty] | add <product_id> [qty] | search <text> | page <n> | low-stock
qty <line> <qty> | remove <line> | void
discount <pct>% | discount <amount> | discount off | tax on|off
customer <id> | customer none | find-customer <text>
pay <amount> | abort | commit | cancel | new | show | receipt <number>
payment|credit|debit <customer_id> <amount> [description] | history <customer_id>
stock in|out|set <product_id> <units> <reason> | movements [product_id] [from DATE] [to DATE]
help | quit";

fn required<'a>(args: &[&'a str], index: usize, name: &str) -> TerminalResult<&'a str> {
    args.get(index)
        .copied()
        .ok_or_else(|| TerminalError::validation(format!("Missing {}", name)))
}

fn optional_quantity(args: &[&str], index: usize) -> TerminalResult<Quantity> {
    match args.get(index) {
        Some(raw) => Ok(raw.parse()?),
        None => Ok(Quantity::from_units(1)),
    }
}

fn parse_id(raw: &str) -> TerminalResult<i64> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| TerminalError::validation(format!("'{}' is not a valid id", raw)))
}

/// Operator line numbers are 1-based; returns the 0-based index.
fn parse_line(raw: &str) -> TerminalResult<usize> {
    raw.parse::<usize>()
        .ok()
        .filter(|n| *n >= 1)
        .map(|n| n - 1)
        .ok_or_else(|| TerminalError::validation(format!("'{}' is not a line number", raw)))
}

/// Pages are 1-based like line numbers; returns the 0-based page.
fn parse_page(raw: &str) -> TerminalResult<u32> {
    raw.parse::<u32>()
        .ok()
        .filter(|n| *n >= 1)
        .map(|n| n - 1)
        .ok_or_else(|| TerminalError::validation(format!("'{}' is not a page number", raw)))
}

/// Splits off the first `n` words. The remainder keeps its inner spacing.
fn leading_words(rest: &str, n: usize) -> (Vec<&str>, &str) {
    let mut words = Vec::with_capacity(n);
    let mut tail = rest.trim_start();

    while words.len() < n && !tail.is_empty() {
        let end = tail.find(char::is_whitespace).unwrap_or(tail.len());
        words.push(&tail[..end]);
        tail = tail[end..].trim_start();
    }

    (words, tail.trim_end())
}

fn parse_discount(raw: &str) -> TerminalResult<Command> {
    if raw.eq_ignore_ascii_case("off") {
        return Ok(Command::DiscountOff);
    }

    if let Some(pct) = raw.strip_suffix('%') {
        let pct = Decimal::from_str(pct)
            .map_err(|_| TerminalError::validation(format!("'{}' is not a percentage", raw)))?;
        return Ok(Command::DiscountPercent(pct));
    }

    Ok(Command::DiscountFixed(raw.parse()?))
}

fn parse_post(transaction_type: TransactionType, rest: &str) -> TerminalResult<Command> {
    let (words, tail) = leading_words(rest, 2);
    let customer_id = parse_id(required(&words, 0, "customer id")?)?;
    let amount = required(&words, 1, "amount")?.parse()?;
    let description = Some(tail).filter(|d| !d.is_empty()).map(str::to_string);

    Ok(Command::Post {
        transaction_type,
        customer_id,
        amount,
        description,
    })
}

fn parse_stock(rest: &str) -> TerminalResult<Command> {
    let (words, reason) = leading_words(rest, 3);
    let kind = required(&words, 0, "in|out|set")?;
    let product_id = parse_id(required(&words, 1, "product id")?)?;
    let raw_units = required(&words, 2, "units")?;
    let units = raw_units
        .parse::<i64>()
        .map_err(|_| TerminalError::validation(format!("'{}' is not a whole number", raw_units)))?;
    let reason = reason.to_string();

    let change = match kind {
        "in" => StockChange::StockIn(units),
        "out" => StockChange::StockOut(units),
        "set" => StockChange::SetTo(units),
        other => {
            return Err(TerminalError::validation(format!(
                "stock {}: expected in|out|set",
                other
            )))
        }
    };

    Ok(Command::Stock {
        product_id,
        change,
        reason,
    })
}

fn parse_movements(args: &[&str]) -> TerminalResult<Command> {
    let mut product_id = None;
    let mut from = None;
    let mut to = None;

    let mut i = 0;
    while i < args.len() {
        match args[i] {
            "from" => {
                from = Some(parse_date(required(args, i + 1, "from date")?)?);
                i += 1;
            }
            "to" => {
                to = Some(parse_date(required(args, i + 1, "to date")?)?);
                i += 1;
            }
            id => product_id = Some(parse_id(id)?),
        }
        i += 1;
    }

    Ok(Command::Movements {
        product_id,
        from,
        to,
    })
}

fn parse_date(raw: &str) -> TerminalResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| TerminalError::validation(format!("'{}' is not a YYYY-MM-DD date", raw)))
}
