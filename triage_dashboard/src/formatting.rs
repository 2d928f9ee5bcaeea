use std::fmt::Write;

use chrono::{DateTime, NaiveDateTime};
use order_index::board::{BoardView, ColumnEntries, OrderCard, OrderDetail};
use prettytable::{
    format::{LinePosition, LineSeparator, TableFormat},
    row,
    Cell,
    Row,
    Table,
};

fn markdown_format() -> TableFormat {
    prettytable::format::FormatBuilder::new()
        .column_separator('|')
        .borders('|')
        .separator(LinePosition::Title, LineSeparator::new('-', '|', '|', '|'))
        .padding(1, 1)
        .build()
}

fn markdown_style(table: &mut Table) {
    table.set_format(markdown_format());
}

fn card_text(card: &OrderCard) -> String {
    let name = if card.customer_name.is_empty() { "(no name)" } else { card.customer_name.as_str() };
    format!("{} {name}\n{}", card.id, card.summary())
}

/// The board as one table, one column per status. Cards are laid out top to bottom in bucket order.
pub fn format_board(board: &BoardView) -> String {
    let mut table = Table::new();
    let titles = board
        .columns
        .iter()
        .map(|c| Cell::new(&format!("{} ({})", c.status, c.cards().len())))
        .collect::<Vec<_>>();
    table.set_titles(Row::new(titles));
    let depth = board
        .columns
        .iter()
        .map(|c| match &c.entries {
            ColumnEntries::Placeholder(_) => 1,
            ColumnEntries::Cards(cards) => cards.len(),
        })
        .max()
        .unwrap_or_default();
    for i in 0..depth {
        let cells = board
            .columns
            .iter()
            .map(|c| {
                let text = match &c.entries {
                    ColumnEntries::Placeholder(text) if i == 0 => text.to_string(),
                    ColumnEntries::Placeholder(_) => String::default(),
                    ColumnEntries::Cards(cards) => cards.get(i).map(card_text).unwrap_or_default(),
                };
                Cell::new(&text)
            })
            .collect::<Vec<_>>();
        table.add_row(Row::new(cells));
    }
    markdown_style(&mut table);
    format!("{table}")
}

/// Server timestamps arrive as ISO-8601, with or without an offset. Anything else is shown as sent.
pub fn format_timestamp(value: &str) -> String {
    if value.is_empty() {
        return String::default();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    match NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => value.to_string(),
    }
}

pub fn format_detail(detail: &OrderDetail) -> String {
    let mut f = String::new();
    let _ = write_detail(&mut f, detail);
    f
}

fn write_detail(f: &mut String, detail: &OrderDetail) -> std::fmt::Result {
    writeln!(f, "===============================================================================")?;
    writeln!(f, "Order {} ({})", detail.id, detail.status)?;
    writeln!(f, "===============================================================================")?;
    writeln!(f, "Customer: {}", detail.customer_name)?;
    writeln!(f, "Email:    {}", detail.email)?;
    writeln!(f, "Phone:    {}", detail.phone)?;
    writeln!(f, "Address:  {}, {}", detail.address, detail.city)?;
    writeln!(f, "Delivery: {}", detail.delivery_method)?;
    writeln!(f, "Payment:  {}", detail.payment_method)?;
    writeln!(f, "Created:  {}", format_timestamp(&detail.created_at))?;
    if let Some(notes) = &detail.notes {
        writeln!(f, "Notes:    {notes}")?;
    }
    if let Some(reason) = &detail.cancellation_reason {
        writeln!(f, "Cancellation reason: {reason}")?;
    }
    let mut table = Table::new();
    table.set_titles(row!["Product", "Quantity", "Subtotal"]);
    for item in &detail.items {
        table.add_row(row![item.product_name, item.quantity, item.subtotal]);
    }
    markdown_style(&mut table);
    writeln!(f, "{table}")?;
    writeln!(f, "Total: {} • {} items", detail.total, detail.total_quantity)?;
    if detail.actionable {
        writeln!(f, "Actions: `confirm [comment]` or `cancel <reason>`")?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use order_index::{
        order_types::{Order, OrderItem, OrderStatus},
        OrderStatusIndex,
    };
    use otd_common::Money;

    use super::*;

    #[test]
    fn board_table() {
        let mut index = OrderStatusIndex::new();
        index.apply_update(
            Order::new(1u64, OrderStatus::New)
                .with_customer("Ada")
                .with_item(OrderItem::new("Gear", 2, Money::from_cents(2000))),
        );
        index.apply_update(Order::new(2u64, OrderStatus::New).with_customer("Grace"));
        let text = format_board(&index.render_all());
        assert!(text.contains("NEW (2)"));
        assert!(text.contains("CONFIRMED (0)"));
        assert!(text.contains("#1 Ada"));
        assert!(text.contains("Total: $20.00 • 2 items"));
        assert!(text.contains("No orders"));
        assert!(text.find("#1 Ada").unwrap() < text.find("#2 Grace").unwrap());
    }

    #[test]
    fn timestamps() {
        assert_eq!(format_timestamp("2024-05-01T10:15:30"), "2024-05-01 10:15");
        assert_eq!(format_timestamp("2024-05-01T10:15:30.123456"), "2024-05-01 10:15");
        assert_eq!(format_timestamp("2024-05-01T10:15:30Z"), "2024-05-01 10:15");
        assert_eq!(format_timestamp("yesterday"), "yesterday");
        assert_eq!(format_timestamp(""), "");
    }

    #[test]
    fn detail_sections() {
        let mut order = Order::new("x1", OrderStatus::Canceled)
            .with_customer("Lin")
            .with_item(OrderItem::new("Lever", 1, Money::from_cents(2250)));
        order.cancellation_reason = Some("Customer request".into());
        let text = format_detail(&OrderDetail::from(&order));
        assert!(text.contains("Order #x1 (CANCELED)"));
        assert!(text.contains("Cancellation reason: Customer request"));
        assert!(text.contains("Lever"));
        assert!(text.contains("$22.50"));
        assert!(!text.contains("Actions:"));
        let text = format_detail(&OrderDetail::from(&order.with_status(OrderStatus::New)));
        assert!(!text.contains("Cancellation reason"));
        assert!(text.contains("Actions:"));
    }
}
