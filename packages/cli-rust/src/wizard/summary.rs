//! Summary display
//!
//! Shows the collected parameters before confirmation and the outcome of a
//! finished deployment.

use comfy_table::{Cell, Table};
use console::style;
use dockship_core::DeployParams;
use dockship_core::deploy::{DeploymentReport, ProbeOutcome};

/// Rows of the confirmation table, token masked
pub fn summary_rows(params: &DeployParams) -> Vec<(&'static str, String)> {
    vec![
        ("Repository:", params.repository_url.clone()),
        ("Access token:", "********".to_string()),
        ("Branch:", params.branch.clone()),
        ("Server:", params.target.destination()),
        ("SSH key:", params.target.identity_file.display().to_string()),
        ("Application port:", params.app_port.to_string()),
        ("Project:", params.project.to_string()),
        ("Container:", params.project.container_name()),
        ("Remote directory:", params.project.remote_dir(&params.target)),
    ]
}

fn print_table(rows: Vec<(&'static str, String)>) {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::NOTHING);
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    println!("{table}");
}

/// Display deployment summary
pub fn display_summary(params: &DeployParams) {
    println!();
    println!("{}", style("Deployment Summary").bold());
    println!("{}", style("-".repeat(18)).dim());
    print_table(summary_rows(params));
    println!();
}

/// Display the result of a finished deployment
pub fn display_report(report: &DeploymentReport) {
    let probe = match report.probe {
        ProbeOutcome::Reachable { port, .. } => format!("responding on port {port}"),
        ProbeOutcome::Unreachable { attempts } => {
            format!("no response after {attempts} attempts")
        }
    };

    println!();
    println!("{}", style("Deployment Complete").green().bold());
    println!("{}", style("-".repeat(19)).dim());
    print_table(vec![
        ("Container:", report.container_name.clone()),
        ("Build:", report.strategy.to_string()),
        ("Remote directory:", report.remote_dir.clone()),
        ("Health:", probe),
        ("URL:", report.access_url.clone()),
    ]);
    if !report.proxy_configured {
        println!(
            "{}",
            style("The container publishes port 80 itself; host Nginx was stopped and no proxy was configured.").dim()
        );
    }
    println!();
}
