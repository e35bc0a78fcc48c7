// Entry point and CLI flow.
//
// - `view <name>` runs one dashboard view and prints it.
// - `domain <dataset> <field>` lists the values a view's selector accepts.
// - `menu` (or no command) is an interactive loop: pick a view, pick its
//   district/year from the live domain, read the result, repeat. A failing
//   view reports its error and the menu keeps going.
use berlin_ems::loader::LoadReport;
use berlin_ems::output;
use berlin_ems::{Config, Dashboard, Dataset, Field, ParsePolicy, Value, View, ViewParams};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// Berlin fire/EMS emergency-response dashboard
#[derive(Parser)]
#[command(name = "berlin-ems", version, about, long_about = None)]
struct Cli {
    /// TOML config file (default: berlin-ems.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Mission export CSV
    #[arg(long, global = true)]
    missions: Option<PathBuf>,

    /// Regional export CSV
    #[arg(long, global = true)]
    regional: Option<PathBuf>,

    /// Abort loading on the first unparseable cell instead of nulling it
    #[arg(long, global = true)]
    strict: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single view
    View {
        /// overview, mission-mix, time-patterns, mission-types, location-trends,
        /// location-incidents, regional-capacity, regional-time-goals, demand-landscape
        name: View,

        #[arg(short, long)]
        district: Option<String>,

        #[arg(short, long)]
        year: Option<i32>,

        /// Number of areas kept by ranked regional views
        #[arg(long)]
        top: Option<usize>,

        /// Maximum table rows printed
        #[arg(long)]
        rows: Option<usize>,

        /// Write <view>.csv and <view>.json into this directory
        #[arg(long, value_name = "DIR")]
        export: Option<PathBuf>,
    },

    /// Print the selectable values of a column
    Domain {
        /// missions or regional
        dataset: Dataset,
        /// district, year, hour, weekday, day_type, mission_type, mission_type_raw
        field: Field,
    },

    /// Interactive view picker
    Menu,
}

fn init_logger(verbose: bool) {
    let filters = match std::env::var("RUST_LOG") {
        Ok(f) => f,
        Err(_) if verbose => "debug".to_string(),
        Err(_) => "warn".to_string(),
    };
    pretty_env_logger::formatted_builder()
        .parse_filters(&filters)
        .init();
}

fn build_config(cli: &Cli) -> berlin_ems::Result<Config> {
    let mut config = Config::resolve(cli.config.as_deref())?;
    if let Some(p) = &cli.missions {
        config.missions_path = p.clone();
    }
    if let Some(p) = &cli.regional {
        config.regional_path = p.clone();
    }
    if cli.strict {
        config.parse_policy = ParsePolicy::Reject;
    }
    Ok(config)
}

/// Read one trimmed line after printing `prompt`. `None` on end of input.
fn read_line(prompt: &str) -> Option<String> {
    print!("{prompt}");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Ask the user whether to go back to the view menu.
fn prompt_back_to_menu() -> bool {
    loop {
        let Some(resp) = read_line("Back to view selection (Y/N): ") else {
            return false;
        };
        match resp.to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// List the domain and let the user pick by number. Empty input keeps the
/// first value, like a select box.
fn choose(dashboard: &mut Dashboard, dataset: Dataset, field: Field) -> berlin_ems::Result<Option<Value>> {
    let values = dashboard.domain(dataset, field)?;
    if values.is_empty() {
        println!("No {field} values available.");
        return Ok(None);
    }
    println!("\nSelect {field}:");
    for (i, v) in values.iter().enumerate() {
        println!("[{}] {}", i + 1, v);
    }
    loop {
        let Some(input) = read_line("Enter choice (blank for first): ") else {
            return Ok(values.into_iter().next());
        };
        if input.is_empty() {
            return Ok(values.into_iter().next());
        }
        match input.parse::<usize>() {
            Ok(n) if (1..=values.len()).contains(&n) => return Ok(values.into_iter().nth(n - 1)),
            _ => println!("Invalid choice. Please enter 1-{}.", values.len()),
        }
    }
}

/// Print the load report of `dataset` unless it is the one already shown.
fn show_load_report(dashboard: &Dashboard, dataset: Dataset, shown: &mut Option<LoadReport>) {
    if let Some(report) = dashboard.load_report(dataset) {
        if shown.as_ref() != Some(report) {
            println!("{}", output::render_load_report(dataset.name(), report));
            *shown = Some(report.clone());
        }
    }
}

fn run_interactive_view(
    dashboard: &mut Dashboard,
    view: View,
    shown: &mut [Option<LoadReport>; 2],
) -> berlin_ems::Result<()> {
    let mut params = ViewParams {
        top_n: dashboard.config().top_n,
        ..ViewParams::default()
    };
    if view.needs_district() {
        params.district = choose(dashboard, view.dataset(), Field::District)?.map(|v| v.to_string());
    }
    if view.needs_year() {
        params.year = choose(dashboard, view.dataset(), Field::Year)?
            .and_then(|v| v.as_int())
            .and_then(|y| i32::try_from(y).ok());
    }
    let out = dashboard.run(view, &params)?;
    let slot = match view.dataset() {
        Dataset::Missions => &mut shown[0],
        Dataset::Regional => &mut shown[1],
    };
    println!();
    show_load_report(dashboard, view.dataset(), slot);
    println!("{}", output::render_view(&out, None));
    Ok(())
}

fn menu(dashboard: &mut Dashboard) {
    let mut shown = [None, None];
    loop {
        println!("Select a view:");
        for (i, v) in View::ALL.iter().enumerate() {
            println!("[{}] {} - {}", i + 1, v, v.title());
        }
        println!("[0] Exit\n");
        let Some(choice) = read_line("Enter choice: ") else {
            break;
        };
        let view = match choice.parse::<usize>() {
            Ok(0) => break,
            Ok(n) if n <= View::ALL.len() => View::ALL[n - 1],
            _ => {
                println!("Invalid choice. Please enter 0-{}.\n", View::ALL.len());
                continue;
            }
        };
        if let Err(e) = run_interactive_view(dashboard, view, &mut shown) {
            eprintln!("{view} failed: {e}\n");
        }
        if !prompt_back_to_menu() {
            break;
        }
        println!();
    }
    println!("Exiting the program.");
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let config = match build_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let mut dashboard = Dashboard::new(config);

    let result = match cli.command {
        None | Some(Commands::Menu) => {
            menu(&mut dashboard);
            Ok(())
        }
        Some(Commands::Domain { dataset, field }) => dashboard.domain(dataset, field).map(|values| {
            for v in values {
                println!("{v}");
            }
        }),
        Some(Commands::View {
            name,
            district,
            year,
            top,
            rows,
            export,
        }) => {
            let params = ViewParams {
                district,
                year,
                top_n: top.unwrap_or(dashboard.config().top_n),
            };
            dashboard.run(name, &params).and_then(|out| {
                show_load_report(&dashboard, name.dataset(), &mut None);
                println!("{}", output::render_view(&out, rows));
                match export {
                    Some(dir) => output::export_view(&dir, &out).map(|_| ()),
                    None => Ok(()),
                }
            })
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
