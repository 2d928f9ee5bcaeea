use admin_client::{push, AdminApi};
use log::*;
use order_index::{order_types::OrderId, Dashboard, OrderStatusIndex};
use tokio::io::{self, AsyncBufReadExt, BufReader};

use crate::{
    config::DashboardConfig,
    errors::DashboardError,
    formatting::format_board,
    terminal::{OperatorCommand, TerminalView, OPERATOR_HELP},
};

type TerminalDashboard = Dashboard<TerminalView<std::io::Stdout>>;
type QuietDashboard = Dashboard<TerminalView<std::io::Sink>>;

enum Flow {
    Continue,
    Quit,
}

/// Loads the board, then follows the update feed and operator input until one of them ends.
pub async fn watch(config: DashboardConfig, open: Option<OrderId>) -> Result<(), DashboardError> {
    let api = AdminApi::new(config.api.clone())?;
    let snapshot = api.fetch_snapshot().await?;
    let mut feed = push::subscribe(&config.push).await?;
    let mut dashboard = Dashboard::new(TerminalView::stdout());
    dashboard.load_snapshot(snapshot);
    if let Some(id) = open {
        if !dashboard.open_order(&id) {
            dashboard.view_mut().notice(&format!("Order {id} is not on the board."));
        }
    }
    dashboard.view_mut().notice("Watching for order updates. Type `help` for commands.");
    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        tokio::select! {
            update = feed.next_update() => match update {
                Some(order) => {
                    dashboard.apply_update(order);
                },
                None => {
                    warn!("🖥️ Update feed ended");
                    dashboard.view_mut().notice("The update feed has ended. Restart the dashboard to reconnect.");
                    break;
                },
            },
            line = lines.next_line() => match line? {
                Some(line) => {
                    if let Flow::Quit = handle_line(&mut dashboard, &api, &line).await {
                        break;
                    }
                },
                None => {
                    debug!("🖥️ Operator input closed");
                    break;
                },
            },
            _ = tokio::signal::ctrl_c() => {
                debug!("🖥️ Interrupted");
                break;
            },
        }
    }
    feed.close();
    info!("🖥️ Dashboard closed");
    Ok(())
}

async fn handle_line(dashboard: &mut TerminalDashboard, api: &AdminApi, line: &str) -> Flow {
    let command = match line.parse::<OperatorCommand>() {
        Ok(c) => c,
        Err(msg) => {
            dashboard.view_mut().notice(&msg);
            return Flow::Continue;
        },
    };
    match command {
        OperatorCommand::Open(id) => {
            if !dashboard.open_order(&id) {
                dashboard.view_mut().notice(&format!("Order {id} is not on the board."));
            }
        },
        OperatorCommand::Close => dashboard.close_detail(),
        OperatorCommand::Confirm(comment) => match dashboard.active_order_id().cloned() {
            // Failures have already been shown by the view
            Some(id) => {
                let _ = dashboard.confirm(api, &id, comment.as_deref()).await;
            },
            None => dashboard.view_mut().notice("Open an order first."),
        },
        OperatorCommand::Cancel(reason) => match dashboard.active_order_id().cloned() {
            Some(id) => {
                let _ = dashboard.cancel(api, &id, &reason).await;
            },
            None => dashboard.view_mut().notice("Open an order first."),
        },
        OperatorCommand::Board => dashboard.render(),
        OperatorCommand::Help => dashboard.view_mut().notice(OPERATOR_HELP),
        OperatorCommand::Quit => return Flow::Quit,
        OperatorCommand::Nothing => {},
    }
    Flow::Continue
}

pub async fn print_snapshot(config: DashboardConfig, json: bool) -> Result<(), DashboardError> {
    let api = AdminApi::new(config.api)?;
    let snapshot = api.fetch_snapshot().await?;
    let mut index = OrderStatusIndex::new();
    index.load_snapshot(snapshot);
    let board = index.render_all();
    if json {
        println!("{}", serde_json::to_string_pretty(&board)?);
    } else {
        println!("{}", format_board(&board));
    }
    Ok(())
}

/// One-shot confirm. The board is loaded first so that orders that are no longer new are refused locally.
pub async fn confirm_order(
    config: DashboardConfig,
    id: OrderId,
    comment: Option<String>,
) -> Result<(), DashboardError> {
    let (api, mut dashboard) = load_quietly(config).await?;
    dashboard.confirm(&api, &id, comment.as_deref()).await?;
    println!("Order {id} confirmed. The board will show it once the update arrives.");
    Ok(())
}

pub async fn cancel_order(config: DashboardConfig, id: OrderId, reason: String) -> Result<(), DashboardError> {
    let (api, mut dashboard) = load_quietly(config).await?;
    dashboard.cancel(&api, &id, &reason).await?;
    println!("Order {id} canceled. The board will show it once the update arrives.");
    Ok(())
}

/// Errors are returned to the caller rather than drawn, so the view writes nowhere.
async fn load_quietly(config: DashboardConfig) -> Result<(AdminApi, QuietDashboard), DashboardError> {
    let api = AdminApi::new(config.api)?;
    let snapshot = api.fetch_snapshot().await?;
    let mut dashboard = Dashboard::new(TerminalView::new(std::io::sink()));
    dashboard.load_snapshot(snapshot);
    Ok((api, dashboard))
}
