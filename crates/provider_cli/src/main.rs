//! Command-line probe for the provider core.
//!
//! # Responsibility
//! - Verify `provider_core` linkage without starting the HTTP server.
//! - Print a per-master load report for an existing database.

use clap::{Parser, Subcommand};
use provider_core::db::open_db;
use provider_core::{Master, MasterService, SqliteUnitOfWork};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "provider_cli")]
#[command(about = "Inspect provider_core and its databases")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the core health-check reply
    Ping,
    /// Print the core crate version
    Version,
    /// Print assigned/max complexity for every master
    Report {
        #[arg(long)]
        db_path: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("provider_cli: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Option<Command>) -> Result<(), Box<dyn Error>> {
    match command {
        Some(Command::Ping) => println!("provider_core ping={}", provider_core::ping()),
        Some(Command::Version) => {
            println!("provider_core version={}", provider_core::core_version())
        }
        Some(Command::Report { db_path }) => {
            let mut conn = open_db(&db_path)?;
            let masters = MasterService::new(SqliteUnitOfWork::try_new(&mut conn)?).list_masters()?;
            for line in report_lines(&masters) {
                println!("{line}");
            }
        }
        None => {
            println!("provider_core ping={}", provider_core::ping());
            println!("provider_core version={}", provider_core::core_version());
        }
    }
    Ok(())
}

fn report_lines(masters: &[Master]) -> Vec<String> {
    if masters.is_empty() {
        return vec!["no masters".to_string()];
    }
    masters
        .iter()
        .map(|master| {
            let flag = if master.is_over_capacity() { " OVER" } else { "" };
            format!(
                "{} {} load={}/{} applications={}{flag}",
                master.id,
                master.name,
                master.assigned_total(),
                master.max_complexity,
                master.applications.len(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::report_lines;
    use provider_core::{Application, Master};
    use uuid::Uuid;

    fn master(max: i64, complexities: &[i64]) -> Master {
        let id = Uuid::new_v4();
        Master {
            id,
            name: "Alice".to_string(),
            max_complexity: max,
            applications: complexities
                .iter()
                .map(|complexity| Application {
                    id: Uuid::new_v4(),
                    master_id: id,
                    address: "A".to_string(),
                    complexity: *complexity,
                })
                .collect(),
        }
    }

    #[test]
    fn empty_store_reports_no_masters() {
        assert_eq!(report_lines(&[]), vec!["no masters".to_string()]);
    }

    #[test]
    fn report_shows_load_against_ceiling() {
        let lines = report_lines(&[master(10, &[3, 4])]);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("Alice load=7/10 applications=2"));
    }

    #[test]
    fn over_capacity_master_is_flagged() {
        let lines = report_lines(&[master(5, &[3, 4])]);
        assert!(lines[0].ends_with(" OVER"));
    }
}
