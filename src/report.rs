use crate::league::League;
use crate::scenario::Scenario;
use crate::solver::SolveError;
use crate::survival::{Analysis, Verdict};
use itertools::*;
use std::fmt::Write;

pub fn format_verdict(league: &League, analysis: &Analysis) -> String {
    let name = &league.team(analysis.team).name;
    match analysis.verdict {
        Verdict::Safe => format!("{}: safe, no combination of results relegates it", name),
        Verdict::NeedsPoints { threshold, additional } => format!(
            "{}: needs at least {} points ({} more) to be safe",
            name, threshold, additional
        ),
        Verdict::CannotSelfSave => format!("{}: cannot save itself", name),
    }
}

pub fn format_failure(league: &League, team: usize, error: &SolveError) -> String {
    format!("{}: unknown, {}", league.team(team).name, error)
}

/// Relegation table of a solved scenario, fewest points first.
pub fn format_scenario(league: &League, scenario: &Scenario) -> Result<String, std::fmt::Error> {
    let width = 100;
    let mut out = String::new();

    writeln!(&mut out, "{}", "=".repeat(width))?;
    writeln!(&mut out, "{:^width$}", "RELEGATION TABLE", width = width)?;
    writeln!(&mut out, "{}", "=".repeat(width))?;
    writeln!(
        &mut out,
        "{:<22}{:>13}{:>13}{:>13}{:>13}{:>13}{:>13}",
        "Team", "Before", "Final", "New", "Average", "By table", "By average"
    )?;
    writeln!(&mut out, "{}", "-".repeat(width))?;

    for t in scenario.ascending() {
        writeln!(
            &mut out,
            "{:<22}{:>13}{:>13}{:>13}{:>13.3}{:>13}{:>13}",
            league.team(t.team).name,
            t.points_before,
            t.total,
            t.new_points,
            t.average,
            if t.by_table { "yes" } else { "" },
            if t.by_average { "yes" } else { "" },
        )?;
    }
    writeln!(&mut out, "{}", "=".repeat(width))?;

    let names = |ids: Vec<usize>| ids.into_iter().map(|t| league.team(t).name.clone()).join(", ");
    writeln!(&mut out, "Relegated by table: {}", names(scenario.relegated_by_table()))?;
    writeln!(&mut out, "Relegated by average: {}", names(scenario.relegated_by_average()))?;
    writeln!(&mut out, "Results: {}", scenario.results_summary(league))?;

    Ok(out)
}
