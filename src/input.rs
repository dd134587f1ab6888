//! Readers for league instances.
//!
//! Two layouts are understood: a single XML document
//!
//! ```xml
//! <League>
//!   <Rules tableRelegations="2" averageRelegations="2"/>
//!   <Teams>
//!     <Team name="Boca" points="45" historicalPoints="160" historicalPlayed="80"/>
//!   </Teams>
//!   <Fixtures>
//!     <Match home="Boca" away="Lanus" round="24"/>
//!   </Fixtures>
//! </League>
//! ```
//!
//! or a pair of CSV files, standings (`team,points,historical_points,historical_played`)
//! and fixtures (`home,away,round`). The Spanish headers of the promedios
//! spreadsheets are accepted as well: `Equipo,24,Pts,PJ` and
//! `local,visitante,fecha`, where `24` is the current season's points.

use crate::config::Rules;
use crate::league::{FixtureRecord, League, LeagueError, Standing};
use log::*;
use std::convert::TryFrom;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("cannot read {path:?}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("malformed xml: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("expected a <{expected}> document, found <{found}>")]
    Root { expected: &'static str, found: String },
    #[error("missing {0}")]
    Missing(String),
    #[error("{what}: {value:?} is not a whole number in range")]
    Number { what: String, value: String },
    #[error(transparent)]
    League(#[from] LeagueError),
}

/// Raw records of one instance, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub standings: Vec<Standing>,
    pub fixtures: Vec<FixtureRecord>,
    /// Rules stated in the instance itself, if any.
    pub rules: Option<Rules>,
}

impl Instance {
    pub fn league(&self) -> Result<League, LeagueError> {
        League::new(self.standings.clone(), self.fixtures.clone())
    }
}

fn number(what: impl Into<String>, value: &str) -> Result<i64, InputError> {
    let value = value.trim();
    if let Ok(n) = value.parse::<i64>() {
        return Ok(n);
    }
    // Spreadsheet exports write rounds as 24.0
    match value.parse::<f64>() {
        Ok(x) if x.fract() == 0.0 && x.abs() < i64::MAX as f64 => Ok(x as i64),
        _ => Err(InputError::Number { what: what.into(), value: value.to_string() }),
    }
}

fn count(what: &str, value: &str) -> Result<usize, InputError> {
    let n = number(what, value)?;
    usize::try_from(n).map_err(|_| InputError::Number { what: what.to_string(), value: value.trim().to_string() })
}

pub fn load_xml(path: &Path) -> Result<Instance, InputError> {
    info!("Loading xml {:?}", path);
    let text = std::fs::read_to_string(path).map_err(|source| InputError::Io { path: path.to_path_buf(), source })?;
    info!("Loaded {} chars", text.len());
    parse_xml(&text)
}

pub fn parse_xml(text: &str) -> Result<Instance, InputError> {
    let doc = roxmltree::Document::parse(text)?;
    let root = doc.root_element();
    if root.tag_name().name() != "League" {
        return Err(InputError::Root { expected: "League", found: root.tag_name().name().to_string() });
    }

    let section = |name: &str| root.children().find(|n| n.tag_name().name() == name);
    let attribute = |node: &roxmltree::Node, name: &str| -> Result<String, InputError> {
        node.attribute(name)
            .map(|s| s.to_string())
            .ok_or_else(|| InputError::Missing(format!("attribute {} on <{}>", name, node.tag_name().name())))
    };
    let int_attribute = |node: &roxmltree::Node, name: &str| -> Result<i64, InputError> {
        number(format!("attribute {} on <{}>", name, node.tag_name().name()), &attribute(node, name)?)
    };

    let rules = match section("Rules") {
        Some(r) => {
            let mut rules = Rules::default();
            if let Some(v) = r.attribute("tableRelegations") {
                rules.table_relegations = count("tableRelegations", v)?;
            }
            if let Some(v) = r.attribute("averageRelegations") {
                rules.average_relegations = count("averageRelegations", v)?;
            }
            Some(rules)
        }
        None => None,
    };

    let teams = section("Teams").ok_or_else(|| InputError::Missing("<Teams>".to_string()))?;
    let mut standings = Vec::new();
    for team in teams.children().filter(|n| n.is_element()) {
        standings.push(Standing {
            name: attribute(&team, "name")?,
            points: int_attribute(&team, "points")?,
            historical_points: int_attribute(&team, "historicalPoints")?,
            historical_played: int_attribute(&team, "historicalPlayed")?,
        });
    }
    info!("teams: {:?}", standings.iter().map(|s| &s.name).collect::<Vec<_>>());

    let mut fixtures = Vec::new();
    if let Some(matches) = section("Fixtures") {
        for m in matches.children().filter(|n| n.is_element()) {
            fixtures.push(FixtureRecord {
                home: attribute(&m, "home")?,
                away: attribute(&m, "away")?,
                round: int_attribute(&m, "round")?,
            });
        }
    }
    info!("{} fixtures left", fixtures.len());

    Ok(Instance { standings, fixtures, rules })
}

pub fn load_csv(standings: &Path, fixtures: &Path) -> Result<Instance, InputError> {
    info!("Loading csv {:?} and {:?}", standings, fixtures);
    let open = |path: &Path| std::fs::File::open(path).map_err(|source| InputError::Io { path: path.to_path_buf(), source });
    parse_csv(open(standings)?, open(fixtures)?)
}

pub fn parse_csv(standings: impl Read, fixtures: impl Read) -> Result<Instance, InputError> {
    let rows = read_rows(standings, STANDINGS_COLUMNS)?;
    let standings = rows
        .into_iter()
        .map(|r| -> Result<Standing, InputError> {
            Ok(Standing {
                name: r[0].clone(),
                points: number(format!("points of {}", r[0]), &r[1])?,
                historical_points: number(format!("historical_points of {}", r[0]), &r[2])?,
                historical_played: number(format!("historical_played of {}", r[0]), &r[3])?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let rows = read_rows(fixtures, FIXTURE_COLUMNS)?;
    let fixtures = rows
        .into_iter()
        .map(|r| -> Result<FixtureRecord, InputError> {
            let round = number(format!("round of {}-{}", r[0], r[1]), &r[2])?;
            Ok(FixtureRecord { home: r[0].clone(), away: r[1].clone(), round })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Instance { standings, fixtures, rules: None })
}

/// Accepted headers per column, the canonical name first.
const STANDINGS_COLUMNS: &[&[&str]] =
    &[&["team", "Equipo"], &["points", "24"], &["historical_points", "Pts"], &["historical_played", "PJ"]];
const FIXTURE_COLUMNS: &[&[&str]] = &[&["home", "local"], &["away", "visitante"], &["round", "fecha"]];

/// Reads the named columns of every record, in the order given.
fn read_rows(input: impl Read, columns: &[&[&str]]) -> Result<Vec<Vec<String>>, InputError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
    let headers = reader.headers()?.clone();
    let positions = columns
        .iter()
        .map(|names| {
            headers
                .iter()
                .position(|h| names.contains(&h))
                .ok_or_else(|| InputError::Missing(format!("csv column {}", names[0])))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row = positions
            .iter()
            .zip(columns)
            .map(|(p, names)| {
                record
                    .get(*p)
                    .map(|s| s.to_string())
                    .ok_or_else(|| InputError::Missing(format!("csv column {}", names[0])))
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"
<League>
  <Rules tableRelegations="1" averageRelegations="1"/>
  <Teams>
    <Team name="Norte" points="30" historicalPoints="100" historicalPlayed="60"/>
    <Team name="Sur" points="25" historicalPoints="90" historicalPlayed="60"/>
    <Team name="Este" points="20" historicalPoints="95" historicalPlayed="60"/>
  </Teams>
  <Fixtures>
    <Match home="Norte" away="Sur" round="27"/>
  </Fixtures>
</League>"#;

    #[test]
    fn xml_instance_is_read() {
        let inst = parse_xml(XML).unwrap();
        assert_eq!(inst.rules, Some(Rules { table_relegations: 1, average_relegations: 1 }));
        assert_eq!(inst.standings.len(), 3);
        assert_eq!(inst.standings[2].historical_points, 95);
        assert_eq!(inst.fixtures[0], FixtureRecord { home: "Norte".into(), away: "Sur".into(), round: 27 });
        let league = inst.league().unwrap();
        assert_eq!(league.rounds(), &[27]);
    }

    #[test]
    fn xml_errors_are_typed() {
        assert!(matches!(parse_xml("<Schedule/>"), Err(InputError::Root { .. })));
        assert!(matches!(parse_xml("<League><Teams>"), Err(InputError::Xml(_))));
        let missing = parse_xml(r#"<League><Teams><Team name="X" points="1"/></Teams></League>"#);
        assert!(matches!(missing, Err(InputError::Missing(_))));
        let bad = parse_xml(r#"<League><Teams><Team name="X" points="lots" historicalPoints="1" historicalPlayed="1"/></Teams></League>"#);
        assert!(matches!(bad, Err(InputError::Number { .. })));
    }

    #[test]
    fn csv_pair_is_read() {
        let standings = "team, points, historical_points, historical_played\nNorte,30,100,60\nSur,25,90,60\n";
        let fixtures = "round,home,away\n27.0,Norte,Sur\n";
        let inst = parse_csv(standings.as_bytes(), fixtures.as_bytes()).unwrap();
        assert_eq!(inst.rules, None);
        assert_eq!(inst.standings[1].points, 25);
        assert_eq!(inst.fixtures, vec![FixtureRecord { home: "Norte".into(), away: "Sur".into(), round: 27 }]);
    }

    #[test]
    fn negative_or_huge_relegation_counts_are_rejected() {
        for value in &["-1", "-3.0", "99999999999999999999"] {
            let xml = format!(
                r#"<League><Rules tableRelegations="{}"/><Teams><Team name="X" points="1" historicalPoints="1" historicalPlayed="1"/></Teams></League>"#,
                value
            );
            match parse_xml(&xml) {
                Err(InputError::Number { what, .. }) => assert_eq!(what, "tableRelegations"),
                other => panic!("{}: {:?}", value, other),
            }
        }
        let xml = r#"<League><Rules averageRelegations="2.0"/><Teams><Team name="X" points="1" historicalPoints="1" historicalPlayed="1"/></Teams></League>"#;
        assert_eq!(parse_xml(xml).unwrap().rules, Some(Rules { table_relegations: 2, average_relegations: 2 }));
    }

    #[test]
    fn promedios_headers_are_understood() {
        let standings = "Equipo,Pts,PJ,Promedio,24\nNorte,100,60,1.667,30\nSur,90,60,1.5,25\n";
        let fixtures = "local,visitante,fecha\nSur,Norte,27\n";
        let inst = parse_csv(standings.as_bytes(), fixtures.as_bytes()).unwrap();
        assert_eq!(inst.standings[0], Standing { name: "Norte".into(), points: 30, historical_points: 100, historical_played: 60 });
        assert_eq!(inst.standings[1].points, 25);
        assert_eq!(inst.fixtures, vec![FixtureRecord { home: "Sur".into(), away: "Norte".into(), round: 27 }]);
    }

    #[test]
    fn csv_missing_column_is_reported() {
        let standings = "team,points\nNorte,30\n";
        let err = parse_csv(standings.as_bytes(), "home,away,round\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("historical_points"));
    }
}
