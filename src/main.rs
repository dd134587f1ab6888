use log::*;
use relegationsurvival::input::{self, InputError, Instance};
use relegationsurvival::report::{format_failure, format_scenario, format_verdict};
use relegationsurvival::{Analyst, Encoding, MicroLp};
use std::path::PathBuf;
use std::time::Duration;
use structopt::*;

#[derive(StructOpt, Debug)]
struct Opt {
    /// One XML instance, or a standings CSV followed by a fixtures CSV.
    #[structopt(required = true, name = "FILE", parse(from_os_str))]
    files: Vec<PathBuf>,

    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,

    #[structopt(long)]
    quiet: bool,

    /// Analyse only this team.
    #[structopt(short, long)]
    team: Option<String>,

    #[structopt(long)]
    table_relegations: Option<usize>,

    #[structopt(long)]
    average_relegations: Option<usize>,

    /// Replaces every big-M constant derived from the league.
    #[structopt(long)]
    big_m: Option<f64>,

    #[structopt(long)]
    average_epsilon: Option<f64>,

    /// Seconds allowed per team before giving up.
    #[structopt(long)]
    timeout: Option<f32>,

    /// Print the worst-case end of season for every team that can go down.
    #[structopt(short, long)]
    scenario: bool,
}

fn main() {
    let options = Opt::from_args();

    if let Err(e) = stderrlog::StdErrLog::new()
        .verbosity(usize::from(options.verbose))
        .quiet(options.quiet)
        .module(module_path!())
        .show_module_names(true)
        .color(stderrlog::ColorChoice::Auto)
        .init()
    {
        eprintln!("cannot initialise logging: {}", e);
    }

    info!("Arguments {:#?}", options);

    match run(&options) {
        Ok(0) => {}
        Ok(failures) => {
            error!("{} teams could not be analysed", failures);
            std::process::exit(2);
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}

fn load(files: &[PathBuf]) -> Result<Instance, InputError> {
    match files {
        [xml] => input::load_xml(xml),
        [standings, fixtures] => input::load_csv(standings, fixtures),
        _ => Err(InputError::Missing("one XML file or two CSV files".to_string())),
    }
}

/// Returns the number of teams whose solve did not conclude.
fn run(options: &Opt) -> Result<usize, InputError> {
    let instance = load(&options.files)?;
    let league = instance.league()?;
    info!("teams {} fixtures {} rounds {:?}", league.teams().len(), league.fixtures().len(), league.rounds());
    debug!("remaining calendar\n{}", league.fixture_summary());

    let mut rules = instance.rules.unwrap_or_default();
    if let Some(n) = options.table_relegations {
        rules.table_relegations = n;
    }
    if let Some(n) = options.average_relegations {
        rules.average_relegations = n;
    }
    info!("{:?}", rules);

    let encoding = Encoding {
        big_m: options.big_m,
        average_epsilon: options.average_epsilon,
        time_limit: options.timeout.filter(|t| t.is_finite() && *t > 0.0).map(Duration::from_secs_f32),
    };
    let backend = MicroLp::new(encoding.time_limit);
    let analyst = Analyst::new(&league, rules, &encoding, backend)?;

    let targets = match options.team.as_ref() {
        Some(name) => {
            vec![league.find(name).ok_or_else(|| InputError::Missing(format!("team {:?} in the standings", name)))?]
        }
        None => league.team_ids().collect(),
    };

    let mut failures = 0;
    for target in targets {
        match analyst.analyse(target) {
            Ok(analysis) => {
                println!("{}", format_verdict(&league, &analysis));
                if options.scenario {
                    if let Some(s) = analysis.scenario.as_ref() {
                        match format_scenario(&league, s) {
                            Ok(table) => println!("{}", table),
                            Err(e) => warn!("cannot format scenario: {}", e),
                        }
                    }
                }
            }
            Err(e) => {
                warn!("{} not analysed: {}", league.team(target).name, e);
                println!("{}", format_failure(&league, target, &e));
                failures += 1;
            }
        }
    }

    Ok(failures)
}
