use std::{
    io::{self, Write},
    str::FromStr,
};

use log::*;
use order_index::{
    board::{BoardView, OrderDetail},
    order_types::OrderId,
    DashboardView,
};

use crate::formatting::{format_board, format_detail};

pub const OPERATOR_HELP: &str = "\
Commands:
  open <id>          show an order's details
  close              close the detail view
  confirm [comment]  confirm the open order
  cancel <reason>    cancel the open order
  board              redraw the board
  help               show this message
  quit               exit";

/// Draws the dashboard as plain text on any writer (stdout in the binary).
pub struct TerminalView<W> {
    out: W,
    detail_open: bool,
}

impl TerminalView<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self { out, detail_open: false }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn is_detail_open(&self) -> bool {
        self.detail_open
    }

    /// Informational line that is not tied to the dashboard's state.
    pub fn notice(&mut self, message: &str) {
        self.write(&format!("{message}\n"));
    }

    fn write(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            error!("🖥️ Could not write to the terminal. {e}");
        }
    }
}

impl<W: Write> DashboardView for TerminalView<W> {
    fn render_board(&mut self, board: &BoardView) {
        self.write(&format!("{}\n", format_board(board)));
    }

    fn show_detail(&mut self, detail: &OrderDetail) {
        self.detail_open = true;
        self.write(&format_detail(detail));
    }

    fn close_detail(&mut self) {
        if self.detail_open {
            self.write("Detail view closed.\n");
        }
        self.detail_open = false;
    }

    fn show_error(&mut self, message: &str) {
        self.write(&format!("Error: {message}\n"));
    }

    /// Operator input is always read as a command, so the prompt points at the command to retype.
    fn prompt(&mut self, message: &str) {
        self.write(&format!("{message} Use `cancel <reason>`.\n"));
    }
}

/// One line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    Open(OrderId),
    Close,
    Confirm(Option<String>),
    Cancel(String),
    Board,
    Help,
    Quit,
    /// Blank line
    Nothing,
}

impl FromStr for OperatorCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        match word.to_ascii_lowercase().as_str() {
            "" => Ok(Self::Nothing),
            "open" | "o" if rest.is_empty() => Err("Usage: open <id>".to_string()),
            "open" | "o" => Ok(Self::Open(OrderId::new(rest.trim_start_matches('#')))),
            "close" | "c" => Ok(Self::Close),
            "confirm" => Ok(Self::Confirm(Some(rest.to_string()).filter(|s| !s.is_empty()))),
            // The reason is validated by the dashboard, which prompts for it when blank
            "cancel" => Ok(Self::Cancel(rest.to_string())),
            "board" | "b" => Ok(Self::Board),
            "help" | "h" | "?" => Ok(Self::Help),
            "quit" | "q" | "exit" => Ok(Self::Quit),
            other => Err(format!("Unknown command '{other}'. Type `help` for the list of commands.")),
        }
    }
}

#[cfg(test)]
mod test {
    use order_index::{
        order_types::{DashboardSnapshot, Order, OrderStatus},
        Dashboard,
    };

    use super::*;

    #[test]
    fn parse_operator_commands() {
        assert_eq!("open 12".parse(), Ok(OperatorCommand::Open(OrderId::from("12"))));
        assert_eq!("  open   #12 ".parse(), Ok(OperatorCommand::Open(OrderId::from("12"))));
        assert!("open".parse::<OperatorCommand>().is_err());
        assert_eq!("confirm".parse(), Ok(OperatorCommand::Confirm(None)));
        assert_eq!("confirm leave at reception".parse(), Ok(OperatorCommand::Confirm(Some("leave at reception".into()))));
        assert_eq!("cancel".parse(), Ok(OperatorCommand::Cancel(String::new())));
        assert_eq!("CANCEL no stock".parse(), Ok(OperatorCommand::Cancel("no stock".into())));
        assert_eq!("".parse(), Ok(OperatorCommand::Nothing));
        assert_eq!("q".parse(), Ok(OperatorCommand::Quit));
        assert!("frobnicate".parse::<OperatorCommand>().is_err());
    }

    #[test]
    fn terminal_output() {
        let mut dashboard = Dashboard::new(TerminalView::new(Vec::<u8>::new()));
        let snapshot = DashboardSnapshot::from_orders(vec![Order::new(3u64, OrderStatus::New).with_customer("Ada")]);
        dashboard.load_snapshot(snapshot);
        assert!(dashboard.open_order(&OrderId::from(3u64)));
        assert!(dashboard.view().is_detail_open());
        dashboard.close_detail();
        assert!(!dashboard.view().is_detail_open());
        dashboard.view_mut().show_error("Order not found");
        let text = String::from_utf8(dashboard.into_view().into_inner()).unwrap();
        assert!(text.contains("NEW (1)"));
        assert!(text.contains("Order #3 (NEW)"));
        assert!(text.contains("Detail view closed."));
        assert!(text.ends_with("Error: Order not found\n"));
    }

    #[test]
    fn missing_reason_prompt_names_the_command() {
        let mut view = TerminalView::new(Vec::<u8>::new());
        view.prompt(order_index::MISSING_REASON_PROMPT);
        let text = String::from_utf8(view.into_inner()).unwrap();
        assert_eq!(text, "Please describe why the order is canceled. Use `cancel <reason>`.\n");
        // What the operator types next is parsed as a command, not as the reason
        assert!("out of stock".parse::<OperatorCommand>().is_err());
        assert_eq!("cancel out of stock".parse(), Ok(OperatorCommand::Cancel("out of stock".into())));
    }
}
