use chrono::NaiveDate;

use fx_dashboard_core::models::currency;
use fx_dashboard_core::models::event::UiEvent;
use fx_dashboard_core::models::historical::DateRange;

pub const HELP: &str = "\
Commands:
  from <CODE>             set the input currency
  to <CODE>               set the output currency
  range <START> [<END>]   set the historical range (YYYY-MM-DD; END defaults to today)
  refresh                 re-fetch live rates
  currencies              list selectable currencies
  help                    show this help
  quit                    exit";

#[derive(Debug, PartialEq)]
pub enum Command {
    Event(UiEvent),
    Currencies,
    Help,
    Quit,
    Empty,
}

/// Parse one line of user input.
pub fn parse(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(Command::Empty);
    };
    let args: Vec<&str> = words.collect();

    match (verb.to_lowercase().as_str(), args.as_slice()) {
        ("from", [code]) => Ok(Command::Event(UiEvent::SetInputCurrency(code.to_string()))),
        ("to", [code]) => Ok(Command::Event(UiEvent::SetOutputCurrency(code.to_string()))),
        ("range", [start]) => {
            let start = parse_date(start)?;
            Ok(Command::Event(UiEvent::SetDateRange(DateRange::until_today(start))))
        }
        ("range", [start, end]) => {
            let range = DateRange::new(parse_date(start)?, parse_date(end)?);
            Ok(Command::Event(UiEvent::SetDateRange(range)))
        }
        ("refresh", []) => Ok(Command::Event(UiEvent::Refresh)),
        ("currencies", []) => Ok(Command::Currencies),
        ("help" | "?", []) => Ok(Command::Help),
        ("quit" | "exit" | "q", []) => Ok(Command::Quit),
        _ => Err(format!("Unrecognized command: '{}' (type 'help')", line.trim())),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| format!("Invalid date '{raw}', expected YYYY-MM-DD"))
}

pub fn print_currencies() {
    for (code, name) in currency::all() {
        println!("{code}  {name}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_currency_commands() {
        assert_eq!(
            parse("from eur").unwrap(),
            Command::Event(UiEvent::SetInputCurrency("eur".into()))
        );
        assert_eq!(
            parse("  TO JPY ").unwrap(),
            Command::Event(UiEvent::SetOutputCurrency("JPY".into()))
        );
    }

    #[test]
    fn parses_range() {
        let d = |s| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        assert_eq!(
            parse("range 2020-01-02 2020-01-04").unwrap(),
            Command::Event(UiEvent::SetDateRange(DateRange::new(d("2020-01-02"), d("2020-01-04"))))
        );
        assert!(parse("range 2020-13-01").is_err());
    }

    #[test]
    fn blank_and_unknown_lines() {
        assert_eq!(parse("   ").unwrap(), Command::Empty);
        assert_eq!(parse("quit").unwrap(), Command::Quit);
        assert!(parse("from").is_err());
        assert!(parse("convert 10").is_err());
    }
}
